//! Load Routes
//!
//! - POST /refresh - Reload the list
//! - GET /loads/:id/edit - Open the edit modal
//! - POST /loads/:id - Submit the edit modal
//! - POST /edit/close - Close the edit modal
//! - GET /api/v1/dashboard - JSON snapshot of the view

use axum::{
    extract::{Path, State},
    response::Redirect,
    Form, Json,
};
use std::sync::Arc;

use crate::api::dto::EditLoadForm;
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::dashboard::{DashboardError, DashboardSnapshot};

/// Back to the dashboard for outcomes the page itself displays
///
/// Failed updates and invalid input show as the modal's alert, failed
/// fetches as the page notice, and a missing session as the sign-in page.
fn back_to_dashboard(result: Result<(), DashboardError>) -> ApiResult<Redirect> {
    match result {
        Ok(())
        | Err(DashboardError::NotAuthenticated)
        | Err(DashboardError::Edit(_))
        | Err(DashboardError::Store(_)) => Ok(Redirect::to("/")),
        Err(e) => Err(e.into()),
    }
}

/// POST /refresh
///
/// The view lock is released while the list request is in flight.
pub async fn refresh(State(state): State<Arc<AppState>>) -> ApiResult<Redirect> {
    let ticket = state.view.lock().await.begin_fetch();

    let result = match ticket {
        Ok(ticket) => {
            let loads = ticket.run().await;
            state.view.lock().await.finish_fetch(loads).map(|_| ())
        }
        Err(e) => Err(e),
    };

    back_to_dashboard(result)
}

/// GET /loads/:id/edit
pub async fn open_editor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Redirect> {
    let result = state.view.lock().await.select(&id).map(|_| ());
    back_to_dashboard(result)
}

/// POST /loads/:id
///
/// Opens the editor on `id` first if another load (or none) is open.
pub async fn update_load(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<EditLoadForm>,
) -> ApiResult<Redirect> {
    let mut view = state.view.lock().await;

    let editing_other = view.editing().map(|f| f.id != id).unwrap_or(true);
    if editing_other {
        if let Err(e) = view.select(&id) {
            return back_to_dashboard(Err(e));
        }
    }

    let editor = view.editing_mut().ok_or(DashboardError::NotEditing)?;
    editor.set_load_reference(form.load_reference);
    editor.set_rate_input(form.rate_amount);
    editor.set_commodity(form.commodity);

    let result = view.submit_update().await;
    back_to_dashboard(result)
}

/// POST /edit/close
pub async fn close_editor(State(state): State<Arc<AppState>>) -> Redirect {
    state.view.lock().await.close_editor();
    Redirect::to("/")
}

/// GET /api/v1/dashboard
pub async fn dashboard_json(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    Json(state.view.lock().await.snapshot())
}
