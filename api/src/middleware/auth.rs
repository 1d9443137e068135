//! Session guard middleware for protecting API endpoints.
//!
//! Reads the credential cookies (or a bearer access token), runs the
//! session authenticator and injects the resulting [`AuthContext`] into the
//! request. When the authenticator rotated the session, the new pair is
//! appended to the response as cookies.
//!
//! The guard works in two modes:
//! 1. Required: any authentication failure becomes the error response
//! 2. Optional: failures are swallowed and the request proceeds anonymously

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    task::{Context, Poll},
};

use pa_core::{authorize, AuthError, DomainError, Principal};

use crate::config::AppState;
use crate::cookies::{pair_cookies, Credentials};
use crate::handlers::ApiError;

/// Authenticated identity injected into requests
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Principal,
    /// Access token the identity was established from
    pub access_token: String,
}

impl AuthContext {
    /// Reject unless the principal holds one of `roles`
    pub fn authorize(&self, roles: &[&str]) -> Result<(), ApiError> {
        authorize(&self.principal, roles).map_err(ApiError::login)
    }
}

/// Session guard middleware factory
#[derive(Debug, Clone, Copy)]
pub struct SessionGuard {
    required: bool,
}

impl SessionGuard {
    /// Reject requests that cannot be authenticated
    pub fn required() -> Self {
        Self { required: true }
    }

    /// Authenticate when possible, never reject
    pub fn optional() -> Self {
        Self { required: false }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionGuardMiddleware {
            service: Rc::new(service),
            required: self.required,
        }))
    }
}

/// Session guard middleware service
pub struct SessionGuardMiddleware<S> {
    service: Rc<S>,
    required: bool,
}

impl<S, B> Service<ServiceRequest> for SessionGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required = self.required;

        Box::pin(async move {
            let state = match req.app_data::<web::Data<AppState>>() {
                Some(state) => state.clone(),
                None => {
                    tracing::error!("Session guard mounted without application state");
                    let error = ApiError::login(DomainError::Internal {
                        message: "application state missing".to_string(),
                    });
                    return Ok(req.into_response(error.error_response()).map_into_right_body());
                }
            };

            let credentials = Credentials::from_request(req.request(), &state.cookies);
            let outcome = state
                .auth_service
                .authenticate(credentials.access(), credentials.refresh())
                .await;

            let authentication = match outcome {
                Ok(authentication) => Some(authentication),
                Err(error) if required => {
                    let error = ApiError::session(error, &state.cookies);
                    return Ok(req.into_response(error.error_response()).map_into_right_body());
                }
                Err(error) => {
                    if !matches!(error.as_auth(), Some(AuthError::Unauthenticated)) {
                        tracing::debug!(error = %error, "Optional authentication failed");
                    }
                    None
                }
            };

            let rotated = authentication.as_ref().and_then(|a| a.rotated.clone());
            if let Some(authentication) = authentication {
                req.extensions_mut().insert(AuthContext {
                    principal: authentication.principal,
                    access_token: authentication.access_token,
                });
            }

            let mut res = service.call(req).await?;

            if let Some(pair) = rotated {
                // Cookies the handler set itself (e.g. logout removals) take precedence
                let handler_set: Vec<String> = res.response().cookies().map(|c| c.name().to_string()).collect();
                for cookie in pair_cookies(&pair, &state.cookies) {
                    if handler_set.iter().any(|name| name == cookie.name()) {
                        continue;
                    }
                    if let Err(e) = res.response_mut().add_cookie(&cookie) {
                        tracing::error!(error = %e, "Failed to attach rotated session cookie");
                    }
                }
            }

            Ok(res.map_into_left_body())
        })
    }
}

/// Extractor for required authentication
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ApiError::login(AuthError::Unauthenticated).into());

        ready(result)
    }
}

/// Extractor for optional authentication
pub struct OptionalAuth(pub Option<AuthContext>);

impl FromRequest for OptionalAuth {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let auth = req.extensions().get::<AuthContext>().cloned();
        ready(Ok(OptionalAuth(auth)))
    }
}
