//! HTTP middleware stack for the launch dispatcher.
//!
//! Builds the Tower middleware pipeline applied to all HTTP requests.
//! Middleware ordering follows the outer-to-inner convention: the first
//! layer listed is the outermost (processes the request first on the way
//! in, and the response last on the way out).

use axum::http::header::{HeaderName, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::config::NetworkConfig;
use super::error::ApiError;

const X_REQUEST_ID: &str = "x-request-id";

/// The composed Tower layer type produced by [`build_http_layers`].
///
/// This type alias keeps the function signature readable. Each layer
/// wraps the next in a `Stack`, from outermost (first applied) to
/// innermost (last applied).
type HttpLayers = tower::layer::util::Stack<
    PropagateRequestIdLayer,
    tower::layer::util::Stack<
        TimeoutLayer,
        tower::layer::util::Stack<
            CorsLayer,
            tower::layer::util::Stack<
                CompressionLayer,
                tower::layer::util::Stack<
                    TraceLayer<
                        tower_http::classify::SharedClassifier<
                            tower_http::classify::ServerErrorsAsFailures,
                        >,
                    >,
                    tower::layer::util::Stack<
                        SetRequestIdLayer<MakeRequestUuid>,
                        tower::layer::util::Identity,
                    >,
                >,
            >,
        >,
    >,
>;

/// Builds the HTTP-level Tower middleware stack from the network configuration.
///
/// **Middleware ordering (outermost to innermost):**
/// 1. `SetRequestId` -- assigns a UUID v4 `X-Request-Id` to every incoming request
/// 2. `Tracing` -- logs request/response with structured trace spans
/// 3. `Compression` -- gzip response compression for bandwidth savings
/// 4. `CORS` -- Cross-Origin Resource Sharing based on configured origins
/// 5. `Timeout` -- enforces a maximum request processing duration
/// 6. `PropagateRequestId` -- copies `X-Request-Id` from the request to the response
///
/// The body size cap is not a tower layer: `router()` installs axum's
/// `DefaultBodyLimit`, which the `Bytes` extractor enforces with 413.
/// Bare 408/413 responses are rewritten into the JSON error envelope by
/// [`envelope_bare_errors`], applied outside this stack.
///
/// This is transport-level middleware only. Dispatch-level middleware (metrics,
/// load shedding) lives in `service::middleware`.
#[must_use]
pub fn build_http_layers(config: &NetworkConfig) -> HttpLayers {
    let x_request_id = HeaderName::from_static(X_REQUEST_ID);

    let cors = build_cors_layer(&config.cors_origins);

    ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            x_request_id.clone(),
            MakeRequestUuid,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(PropagateRequestIdLayer::new(x_request_id))
        .into_inner()
}

/// Rewrites framework-generated 408 and 413 responses into the
/// `{"error": {"message": ...}}` envelope.
///
/// Responses that already carry JSON are passed through untouched, and the
/// `x-request-id` header survives the rewrite.
pub async fn envelope_bare_errors(response: Response) -> Response {
    let message = match response.status() {
        StatusCode::REQUEST_TIMEOUT => "request timed out",
        StatusCode::PAYLOAD_TOO_LARGE => "request body is too large",
        _ => return response,
    };
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        return response;
    }

    let request_id = response.headers().get(X_REQUEST_ID).cloned();
    let mut rewritten = ApiError::with_status(response.status(), message).into_response();
    if let Some(id) = request_id {
        rewritten.headers_mut().insert(X_REQUEST_ID, id);
    }
    rewritten
}

/// Builds the CORS layer from the configured list of allowed origins.
///
/// A wildcard `"*"` in the origins list allows any origin. Otherwise,
/// each origin string is parsed and added to an explicit allowlist.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}
