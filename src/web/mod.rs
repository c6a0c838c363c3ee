//! HTTP surface: routes, extractors and the mapping of handler replies to responses.

pub mod auth;
pub mod flash;

use crate::error::AppError;
use crate::handlers::{Flash, FlashKind, ListingHandlers, Reply};
use crate::models::ListingSubmission;
use auth::CurrentUser;
use axum::extract::{Path, Query, State};
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_cookies::{CookieManagerLayer, Cookies};
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub handlers: ListingHandlers,
}

/// Build the router with all listing routes
pub fn build_app(handlers: ListingHandlers) -> Router {
    Router::new()
        .route("/listings", get(index).post(create))
        .route("/listings/new", get(new_form))
        .route("/listings/search", get(search))
        .route("/listings/filter/:tag", get(filter))
        .route("/listings/:id", get(show).put(update).delete(destroy))
        .route("/listings/:id/edit", get(edit_form))
        .route("/listings/:id/reserve", post(reserve))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { handlers })
}

/// Turn a handler reply into an HTTP response.
///
/// Rendered pages consume the pending flash; redirects store their own.
pub fn respond(reply: Reply, cookies: &Cookies) -> Response {
    match reply {
        Reply::Render { page, notice } => {
            let pending = flash::take(cookies);
            let mut success = Vec::new();
            let mut error = Vec::new();
            for Flash { kind, message } in pending.into_iter().chain(notice) {
                match kind {
                    FlashKind::Success => success.push(message),
                    FlashKind::Error => error.push(message),
                }
            }

            Json(json!({
                "view": page.view(),
                "data": page,
                "success": success,
                "error": error,
            }))
            .into_response()
        }
        Reply::Redirect { to, flash } => {
            if let Some(flash) = flash {
                flash::store(cookies, &flash);
            }
            (StatusCode::SEE_OTHER, [(LOCATION, to)]).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

async fn index(State(state): State<AppState>, cookies: Cookies) -> Result<Response, AppError> {
    let reply = state.handlers.index().await?;
    Ok(respond(reply, &cookies))
}

async fn new_form(
    State(state): State<AppState>,
    _user: CurrentUser,
    cookies: Cookies,
) -> Response {
    respond(state.handlers.new_form(), &cookies)
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    cookies: Cookies,
) -> Result<Response, AppError> {
    let reply = state.handlers.show(&id).await?;
    Ok(respond(reply, &cookies))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    cookies: Cookies,
    Json(submission): Json<ListingSubmission>,
) -> Result<Response, AppError> {
    let reply = state.handlers.create(owner, submission).await?;
    Ok(respond(reply, &cookies))
}

async fn edit_form(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    cookies: Cookies,
) -> Result<Response, AppError> {
    let reply = state.handlers.edit_form(&id).await?;
    Ok(respond(reply, &cookies))
}

async fn update(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    cookies: Cookies,
    Json(submission): Json<ListingSubmission>,
) -> Result<Response, AppError> {
    let reply = state.handlers.update(&id, submission).await?;
    Ok(respond(reply, &cookies))
}

async fn filter(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    cookies: Cookies,
) -> Result<Response, AppError> {
    let reply = state.handlers.filter(&tag).await?;
    Ok(respond(reply, &cookies))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    cookies: Cookies,
) -> Result<Response, AppError> {
    let reply = state.handlers.search(params.q.as_deref()).await?;
    Ok(respond(reply, &cookies))
}

async fn destroy(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    cookies: Cookies,
) -> Result<Response, AppError> {
    let reply = state.handlers.destroy(&id).await?;
    Ok(respond(reply, &cookies))
}

async fn reserve(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    cookies: Cookies,
) -> Response {
    respond(state.handlers.reserve(&id), &cookies)
}
