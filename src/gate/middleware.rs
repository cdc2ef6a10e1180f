use super::render::{loading_page, maintenance_page};
use super::server::GateState;
use super::view::GateView;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use std::time::Duration;
use tracing::{debug, trace};

/// Admission control for everything behind the gate.
///
/// Reads the status store and either runs the inner service or answers with
/// a 503 page. Never calls the status API itself.
pub async fn site_gate(State(gate): State<GateState>, request: Request, next: Next) -> Response {
    let status = gate.store.status();

    match GateView::evaluate(&status, &gate.default_notice) {
        GateView::Admit => next.run(request).await,
        GateView::Loading => {
            trace!("Site status still loading, holding {}", request.uri().path());
            unavailable(loading_page(), Duration::from_secs(1))
        }
        GateView::Blocked { message } => {
            debug!("Site in maintenance, blocking {}", request.uri().path());
            unavailable(maintenance_page(&message), gate.retry_after)
        }
    }
}

fn unavailable(body: String, retry_after: Duration) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [
            (header::RETRY_AFTER, retry_after.as_secs().max(1).to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        Html(body),
    )
        .into_response()
}
