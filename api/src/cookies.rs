//! Credential transport
//!
//! The access token travels in the `jwt` cookie and the refresh token in
//! `refreshToken`. Both are `HttpOnly`, `Path=/`, `SameSite` from config and
//! `Secure` in production, with `Max-Age` equal to the token lifetime. The
//! access token is also accepted from an `Authorization: Bearer` header.

use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{HttpMessage, HttpRequest, HttpResponseBuilder};
use chrono::{DateTime, Utc};

use pa_core::TokenPair;
use pa_shared::config::CookieConfig;

/// Tokens presented with a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// Read both tokens; the cookie wins over the bearer header for access.
    pub fn from_request(req: &HttpRequest, config: &CookieConfig) -> Self {
        let access_token = cookie_value(req, &config.access_cookie_name).or_else(|| bearer_token(req));
        let refresh_token = cookie_value(req, &config.refresh_cookie_name);
        Self {
            access_token,
            refresh_token,
        }
    }

    pub fn access(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

fn cookie_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.cookie(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Extract the token from an `Authorization: Bearer …` header
pub fn bearer_token<R: HttpMessage>(req: &R) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn same_site(config: &CookieConfig) -> SameSite {
    match config.same_site.to_ascii_lowercase().as_str() {
        "strict" => SameSite::Strict,
        "none" => SameSite::None,
        _ => SameSite::Lax,
    }
}

fn base_cookie(name: String, value: String, config: &CookieConfig) -> Cookie<'static> {
    Cookie::build(name, value)
        .http_only(config.http_only)
        .secure(config.secure)
        .same_site(same_site(config))
        .path(config.path.clone())
        .finish()
}

/// Cookie that lives until `expires_at`
pub fn session_cookie(
    name: &str,
    value: &str,
    expires_at: DateTime<Utc>,
    config: &CookieConfig,
) -> Cookie<'static> {
    let seconds = (expires_at - Utc::now()).num_seconds().max(0);
    let mut cookie = base_cookie(name.to_string(), value.to_string(), config);
    cookie.set_max_age(time::Duration::seconds(seconds));
    cookie
}

/// Expired cookie that makes the browser drop `name`
pub fn removal_cookie(name: &str, config: &CookieConfig) -> Cookie<'static> {
    let mut cookie = base_cookie(name.to_string(), String::new(), config);
    cookie.make_removal();
    cookie
}

/// Both credential cookies for a freshly issued pair
pub fn pair_cookies(pair: &TokenPair, config: &CookieConfig) -> [Cookie<'static>; 2] {
    [
        session_cookie(
            &config.access_cookie_name,
            &pair.access_token,
            pair.access_expires_at,
            config,
        ),
        session_cookie(
            &config.refresh_cookie_name,
            &pair.refresh_token,
            pair.refresh_expires_at,
            config,
        ),
    ]
}

/// Removal cookies for both credentials
pub fn removal_cookies(config: &CookieConfig) -> [Cookie<'static>; 2] {
    [
        removal_cookie(&config.access_cookie_name, config),
        removal_cookie(&config.refresh_cookie_name, config),
    ]
}

pub fn set_session_cookies(builder: &mut HttpResponseBuilder, pair: &TokenPair, config: &CookieConfig) {
    for cookie in pair_cookies(pair, config) {
        builder.cookie(cookie);
    }
}

pub fn clear_session_cookies(builder: &mut HttpResponseBuilder, config: &CookieConfig) {
    for cookie in removal_cookies(config) {
        builder.cookie(cookie);
    }
}
