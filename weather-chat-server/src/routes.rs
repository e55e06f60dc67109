//! HTTP surface: `POST /chat`, `GET /` and `GET /health`.

use serde::Serialize;
use std::{convert::Infallible, sync::Arc};
use warp::{
    Filter, Rejection, Reply,
    http::StatusCode,
    reply::{Json, WithStatus},
};
use weather_chat_core::{ChatError, ChatOrchestrator, ChatRequest, HealthStatus, ServiceStatus};

/// Largest accepted chat body. Bodies must declare a `Content-Length`.
const MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

fn error_reply(status: StatusCode, detail: impl Into<String>) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&ErrorBody { detail: detail.into() }), status)
}

pub fn routes(
    orchestrator: Arc<ChatOrchestrator>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    // Paths are matched before methods so an unknown path rejects as
    // not-found rather than method-not-allowed.
    let root = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::json(&ServiceStatus::online()));

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&HealthStatus::healthy()));

    let chat = warp::path("chat")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<ChatRequest>())
        .and(warp::any().map(move || orchestrator.clone()))
        .and_then(chat);

    root.or(health)
        .or(chat)
        .recover(handle_rejection)
        .with(warp::trace::request())
}

async fn chat(
    request: ChatRequest,
    orchestrator: Arc<ChatOrchestrator>,
) -> Result<WithStatus<Json>, Infallible> {
    // Run the pipeline in its own task so a panic is caught here and the
    // work finishes even if the client hangs up.
    let task = tokio::spawn(async move { orchestrator.handle_chat(&request.message).await });

    let result = match task.await {
        Ok(result) => result,
        Err(join_err) => Err(ChatError::Internal(join_err.to_string())),
    };

    Ok(match result {
        Ok(response) => warp::reply::with_status(warp::reply::json(&response), StatusCode::OK),
        Err(err) => {
            let status = if err.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                tracing::error!(error = %err, "chat request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            };
            error_reply(status, err.user_message())
        }
    })
}

async fn handle_rejection(rejection: Rejection) -> Result<WithStatus<Json>, Infallible> {
    let reply = if rejection.is_not_found() {
        error_reply(StatusCode::NOT_FOUND, "Not Found")
    } else if let Some(err) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        error_reply(StatusCode::UNPROCESSABLE_ENTITY, format!("Invalid request body: {err}"))
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        error_reply(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
    } else if rejection.find::<warp::reject::UnsupportedMediaType>().is_some() {
        error_reply(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Expected a JSON body")
    } else if rejection.find::<warp::reject::LengthRequired>().is_some() {
        error_reply(StatusCode::LENGTH_REQUIRED, "Content-Length header is required")
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        error_reply(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    } else {
        tracing::error!(?rejection, "unhandled rejection");
        error_reply(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    };

    Ok(reply)
}
