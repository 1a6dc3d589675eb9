//! Access gate middleware
//!
//! Runs ahead of every protected route. A valid `authCookie` passes straight
//! through; otherwise the Basic-Auth header is checked and, on success, the
//! persistent cookie is issued with the response.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, info, warn};
use trafficnet_common::api::GateError;

use crate::AppState;

const CHALLENGE: &str = r#"Basic realm="TrafficNet""#;

pub async fn gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // Header borrows must end before the request moves into `next.run`
    let (from_cookie, from_basic) = {
        let headers = request.headers();
        let header_str =
            |name: header::HeaderName| headers.get(name).and_then(|v| v.to_str().ok());
        (
            header_str(header::COOKIE).map(|c| state.gate.verify_cookie_header(c)),
            header_str(header::AUTHORIZATION).map(|a| state.gate.verify_basic_header(a)),
        )
    };

    let cookie_error = match from_cookie {
        Some(Ok(identity)) => {
            debug!(user = %identity.username, "Authenticated by cookie");
            request.extensions_mut().insert(identity);
            return next.run(request).await;
        }
        Some(Err(e)) => Some(e),
        None => None,
    };

    match from_basic {
        Some(Ok(identity)) => {
            info!(user = %identity.username, "Reviewer signed in");
            let cookie = state.gate.set_cookie_header(&identity);
            request.extensions_mut().insert(identity);

            let mut response = next.run(request).await;
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => warn!(error = %e, "Auth cookie is not a valid header value"),
            }
            response
        }
        Some(Err(e)) => challenge(Some(e)),
        None => challenge(cookie_error),
    }
}

fn challenge(reason: Option<GateError>) -> Response {
    match reason {
        Some(e) => warn!(error = %e, "Access denied"),
        None => debug!("No credentials presented"),
    }
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, CHALLENGE)],
        "Authentication required",
    )
        .into_response()
}
