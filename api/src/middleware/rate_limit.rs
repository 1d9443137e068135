//! Rate limiting middleware for the auth endpoints
//!
//! A GCRA limiter from `actix-governor`, keyed per client IP. The client IP
//! is the TCP peer; `X-Forwarded-For` / `Forwarded` are only believed when
//! the peer is one of the configured trusted proxies. The limiter state is
//! shared by every worker, so the limit applies to the whole process. Over
//! the limit the request is answered with `429` and `Retry-After`.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};

use actix_governor::{Governor, GovernorConfig, GovernorConfigBuilder, KeyExtractor};
use actix_web::{
    dev::ServiceRequest, http::header::RETRY_AFTER, middleware::Condition, HttpResponse,
    HttpResponseBuilder,
};
use governor::{
    clock::{Clock, DefaultClock, QuantaInstant},
    middleware::StateInformationMiddleware,
    NotUntil,
};

use pa_shared::config::{ConfigError, RateLimitConfig};

use crate::dto::ErrorResponse;

/// Resolves the address a request is counted against
#[derive(Debug, Clone)]
pub struct ClientIpKeyExtractor {
    trusted_proxies: Arc<[IpAddr]>,
    window_minutes: u64,
}

impl ClientIpKeyExtractor {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            trusted_proxies: config.trusted_proxies.clone().into(),
            window_minutes: config.window_minutes,
        }
    }

    /// Peer address, or the forwarded client when the peer is a trusted proxy.
    ///
    /// Requests without a peer (in-process test requests) share the
    /// unspecified address.
    pub fn client_ip(&self, req: &ServiceRequest) -> IpAddr {
        let Some(peer) = req.peer_addr().map(|addr| addr.ip()) else {
            return IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        };

        if !self.trusted_proxies.contains(&peer) {
            return peer;
        }

        req.connection_info()
            .realip_remote_addr()
            .and_then(parse_ip)
            .unwrap_or(peer)
    }
}

fn parse_ip(addr: &str) -> Option<IpAddr> {
    addr.parse::<IpAddr>()
        .ok()
        .or_else(|| addr.parse::<SocketAddr>().ok().map(|socket| socket.ip()))
}

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;
    type KeyExtractionError = std::convert::Infallible;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        Ok(self.client_ip(req))
    }

    fn exceed_rate_limit_response(
        &self,
        negative: &NotUntil<QuantaInstant>,
        mut response: HttpResponseBuilder,
    ) -> HttpResponse {
        let wait = negative.wait_time_from(DefaultClock::default().now());
        tracing::warn!(retry_after_secs = wait.as_secs(), "Rate limit exceeded");

        let body = ErrorResponse::new(
            "rate_limit_exceeded",
            format!(
                "Too many requests from this IP, please try again after {} minutes",
                self.window_minutes
            ),
        );

        response
            .insert_header((RETRY_AFTER, wait.as_secs().max(1).to_string()))
            .json(body)
    }
}

/// Rate limiter shared by every worker
#[derive(Clone)]
pub struct RateLimiter {
    enabled: bool,
    governor: Arc<GovernorConfig<ClientIpKeyExtractor, StateInformationMiddleware>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Result<Self, ConfigError> {
        // A disabled limiter still needs a well-formed governor for `Condition`.
        let effective = if config.enabled {
            config.validate()?;
            config.clone()
        } else {
            RateLimitConfig {
                enabled: false,
                trusted_proxies: config.trusted_proxies.clone(),
                ..RateLimitConfig::default()
            }
        };

        let governor = GovernorConfigBuilder::default()
            .period(effective.replenish_interval())
            .burst_size(effective.max_requests)
            .key_extractor(ClientIpKeyExtractor::new(&effective))
            .use_headers()
            .finish()
            .ok_or_else(|| {
                ConfigError::Validation("rate limit period and burst must be positive".to_string())
            })?;

        tracing::debug!(
            enabled = config.enabled,
            max_requests = effective.max_requests,
            window_minutes = effective.window_minutes,
            trusted_proxies = effective.trusted_proxies.len(),
            "Rate limiter configured"
        );

        Ok(Self {
            enabled: config.enabled,
            governor: Arc::new(governor),
        })
    }

    /// Middleware for one worker's app; all of them count into the same limiter.
    pub fn middleware(
        &self,
    ) -> Condition<Governor<ClientIpKeyExtractor, StateInformationMiddleware>> {
        Condition::new(self.enabled, Governor::new(&self.governor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App};

    fn extractor(trusted: &[&str]) -> ClientIpKeyExtractor {
        let config = RateLimitConfig::new(2, 1)
            .with_trusted_proxies(trusted.iter().map(|ip| ip.parse().unwrap()).collect());
        ClientIpKeyExtractor::new(&config)
    }

    #[::core::prelude::v1::test]
    fn test_untrusted_peer_ignores_forwarded_header() {
        let req = test::TestRequest::default()
            .peer_addr("198.51.100.7:5000".parse().unwrap())
            .insert_header(("x-forwarded-for", "203.0.113.9"))
            .to_srv_request();

        assert_eq!(
            extractor(&[]).client_ip(&req),
            "198.51.100.7".parse::<IpAddr>().unwrap()
        );
    }

    #[::core::prelude::v1::test]
    fn test_trusted_proxy_forwards_client() {
        let req = test::TestRequest::default()
            .peer_addr("10.0.0.1:5000".parse().unwrap())
            .insert_header(("x-forwarded-for", "203.0.113.9, 10.0.0.1"))
            .to_srv_request();

        assert_eq!(
            extractor(&["10.0.0.1"]).client_ip(&req),
            "203.0.113.9".parse::<IpAddr>().unwrap()
        );
    }

    #[::core::prelude::v1::test]
    fn test_trusted_proxy_without_header_counts_as_itself() {
        let req = test::TestRequest::default()
            .peer_addr("10.0.0.1:5000".parse().unwrap())
            .to_srv_request();

        assert_eq!(
            extractor(&["10.0.0.1"]).client_ip(&req),
            "10.0.0.1".parse::<IpAddr>().unwrap()
        );
    }

    #[::core::prelude::v1::test]
    fn test_missing_peer_uses_unspecified_address() {
        let req = test::TestRequest::default().to_srv_request();
        assert_eq!(
            extractor(&[]).client_ip(&req),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }

    #[::core::prelude::v1::test]
    fn test_rejects_empty_budget() {
        assert!(RateLimiter::new(&RateLimitConfig::new(0, 15)).is_err());

        let mut disabled = RateLimitConfig::new(0, 0);
        disabled.enabled = false;
        assert!(RateLimiter::new(&disabled).is_ok());
    }

    #[actix_web::test]
    async fn test_rotating_forwarded_header_is_still_limited() {
        let limiter = RateLimiter::new(&RateLimitConfig::new(2, 15)).unwrap();
        let app = test::init_service(
            App::new()
                .wrap(limiter.middleware())
                .route("/", web::post().to(HttpResponse::Ok)),
        )
        .await;

        let mut statuses = Vec::new();
        for i in 0..5 {
            let req = test::TestRequest::post()
                .uri("/")
                .peer_addr("198.51.100.7:40000".parse().unwrap())
                .insert_header(("x-forwarded-for", format!("203.0.113.{}", i)))
                .to_request();
            let resp = test::call_service(&app, req).await;
            if resp.status() == StatusCode::TOO_MANY_REQUESTS {
                assert!(resp.headers().contains_key(RETRY_AFTER));
            }
            statuses.push(resp.status());
        }

        assert_eq!(&statuses[..2], &[StatusCode::OK, StatusCode::OK]);
        assert!(statuses[2..]
            .iter()
            .all(|status| *status == StatusCode::TOO_MANY_REQUESTS));
    }

    #[actix_web::test]
    async fn test_disabled_limiter_passes_everything() {
        let mut config = RateLimitConfig::new(1, 15);
        config.enabled = false;
        let limiter = RateLimiter::new(&config).unwrap();
        let app = test::init_service(
            App::new()
                .wrap(limiter.middleware())
                .route("/", web::post().to(HttpResponse::Ok)),
        )
        .await;

        for _ in 0..5 {
            let req = test::TestRequest::post().uri("/").to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }
    }
}
