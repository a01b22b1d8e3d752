//! Session Routes
//!
//! - GET / - Dashboard page, or the sign-in page when signed out
//! - POST /login - Password sign-in
//! - POST /logout - Sign out and clear the view

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use std::sync::Arc;

use crate::api::dto::LoginForm;
use crate::api::error::ApiResult;
use crate::api::html;
use crate::api::state::{apply_session, AppState};

/// GET /
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let snapshot = state.view.lock().await.snapshot();
    Html(html::dashboard_page(&snapshot, state.config.demo))
}

/// POST /login
///
/// A rejected sign-in re-renders the form with the auth service's message.
pub async fn login(State(state): State<Arc<AppState>>, Form(form): Form<LoginForm>) -> Response {
    let email = form.email.trim();

    match state.auth.sign_in_with_password(email, &form.password).await {
        Ok(session) => {
            tracing::info!(email = %email, "Signed in");
            apply_session(&state.view, Some(session)).await;
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!(email = %email, error = %e, "Sign-in failed");
            let page = html::login_page(Some(&e.message()), state.config.demo);
            (StatusCode::UNAUTHORIZED, Html(page)).into_response()
        }
    }
}

/// POST /logout
pub async fn logout(State(state): State<Arc<AppState>>) -> ApiResult<Redirect> {
    state.view.lock().await.sign_out().await?;
    Ok(Redirect::to("/"))
}
