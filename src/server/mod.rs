//! HTTP endpoint for program upload/download plus the embedded control page.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use log::{info, warn};
use rust_embed::RustEmbed;
use tokio::sync::{Mutex, Notify};

use crate::program::MAX_PROGRAM_LEN;
use crate::scheduler::Machine;

#[derive(RustEmbed)]
#[folder = "static/"]
struct Asset;

#[derive(Clone)]
pub struct AppState {
    pub machine: Arc<Mutex<Machine>>,
    /// Wakes the scheduler out of its idle sleep after an install.
    pub wake: Arc<Notify>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ops.txt", get(ops_reference))
        .route("/bytecode.bin", get(download).put(upload))
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(addr: &str, state: AppState) -> Result<(), anyhow::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("control server listening on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn index() -> Response {
    asset_response("index.html", "text/html")
}

async fn ops_reference() -> Response {
    asset_response("ops.txt", "text/plain")
}

fn asset_response(name: &str, content_type: &str) -> Response {
    match Asset::get(name) {
        Some(file) => (
            [(header::CONTENT_TYPE, content_type)],
            file.data.into_owned(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// The active program bytes verbatim: checksum, mode, stream, sentinel.
async fn download(State(state): State<AppState>) -> Response {
    let machine = state.machine.lock().await;

    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        machine.program.bytes().to_vec(),
    )
        .into_response()
}

/// Install an uploaded program. Validation completes before the response is
/// sent; on success the scheduler is woken so the new program starts without
/// waiting out the current period.
async fn upload(State(state): State<AppState>, body: Bytes) -> Response {
    if body.len() > MAX_PROGRAM_LEN {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            "Exceeded max bytecode length",
        )
            .into_response();
    }

    let result = {
        let mut machine = state.machine.lock().await;
        machine.install(&body, true)
    };

    match result {
        Ok(()) => {
            info!("installed uploaded program ({} bytes)", body.len());
            state.wake.notify_one();
            (StatusCode::OK, "Updated bytecode successfully").into_response()
        }
        Err(err) => {
            warn!("rejected uploaded program: {}", err);
            (
                StatusCode::BAD_REQUEST,
                "Bytecode checksum verification fail",
            )
                .into_response()
        }
    }
}
