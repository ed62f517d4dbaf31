use axum::{extract::State, response::IntoResponse};

use crate::api::AppState;

/// Prometheus metrics endpoint
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let info = format!(
        "# HELP guestbook_info Guestbook topology info\n\
         # TYPE guestbook_info gauge\n\
         guestbook_info{{version=\"{}\",minikube=\"{}\"}} 1\n",
        env!("CARGO_PKG_VERSION"),
        state.config.is_minikube
    );

    // Recorder is only installed by the binary
    let body = match &state.metrics {
        Some(handle) => format!("{}{}", info, handle.render()),
        None => info,
    };

    ([("content-type", "text/plain; charset=utf-8")], body)
}
