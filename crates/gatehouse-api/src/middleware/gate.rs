//! Gate middleware: runs the request gate before the handler.
//!
//! Attached per route group with `route_layer`, so path parameters are
//! already matched when it runs.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{ConnectInfo, RawPathParams, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use gatehouse_auth::{AccessRule, GateRequest, UnitParam};

use crate::error::ApiError;
use crate::state::AppState;

/// Header reporting the window budget on admitted responses.
pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
/// Header reporting points left in the window on admitted responses.
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Middleware state: the app plus the rule of the route group.
#[derive(Debug, Clone)]
pub struct GateLayerState {
    app: AppState,
    rule: Arc<AccessRule>,
    unit_param: Option<&'static str>,
}

impl GateLayerState {
    /// Gate for routes without a unit in the path.
    pub fn new(app: AppState, rule: AccessRule) -> Self {
        Self {
            app,
            rule: Arc::new(rule),
            unit_param: None,
        }
    }

    /// Scopes permission checks to the unit in path parameter `name`.
    pub fn with_unit_param(mut self, name: &'static str) -> Self {
        self.unit_param = Some(name);
        self
    }
}

/// Rate limits, authenticates, and authorizes the request.
///
/// On admission the claims are inserted as a request extension and the
/// response gains the rate-limit headers.
pub async fn enforce(
    State(layer): State<GateLayerState>,
    params: Result<RawPathParams, RawPathParamsRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client_key = client_key(
        request.headers(),
        request.extensions().get::<ConnectInfo<SocketAddr>>(),
        layer.app.config.server.trust_forwarded_for,
    );
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let unit = layer.unit_param.map(|name| UnitParam {
        name,
        raw: params
            .as_ref()
            .ok()
            .and_then(|params| params.iter().find(|(key, _)| *key == name))
            .map(|(_, value)| value),
    });

    let admission = layer
        .app
        .gate
        .admit(GateRequest {
            client_key: &client_key,
            authorization: authorization.as_deref(),
            rule: &layer.rule,
            unit,
            cost: 1,
        })
        .await?;

    if let Some(claims) = admission.claims {
        request.extensions_mut().insert(claims);
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(admission.quota.limit));
    headers.insert(
        X_RATELIMIT_REMAINING,
        HeaderValue::from(admission.quota.remaining),
    );
    Ok(response)
}

/// Rate-limit key of the client.
///
/// `X-Forwarded-For` is honoured only behind a trusted proxy; otherwise the
/// peer address is used.
pub fn client_key(
    headers: &HeaderMap,
    peer: Option<&ConnectInfo<SocketAddr>>,
    trust_forwarded_for: bool,
) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    peer.map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(forwarded: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_str(forwarded).unwrap());
        headers
    }

    #[test]
    fn test_forwarded_for_only_when_trusted() {
        let peer = ConnectInfo(SocketAddr::from(([192, 168, 1, 9], 4000)));
        let headers = headers("203.0.113.7, 10.0.0.1");

        assert_eq!(client_key(&headers, Some(&peer), true), "203.0.113.7");
        assert_eq!(client_key(&headers, Some(&peer), false), "192.168.1.9");
    }

    #[test]
    fn test_unknown_without_peer() {
        assert_eq!(client_key(&HeaderMap::new(), None, true), "unknown");
    }
}
