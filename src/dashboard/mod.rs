//! Load Dashboard
//!
//! The session-gated view over the loads table: listing, summary stats,
//! and in-place editing of reference, rate and commodity.

mod edit;
mod render;
mod view;

pub use edit::{EditError, EditForm};
pub use render::{render_card, render_dashboard, LoadCard};
pub use view::{DashboardError, DashboardPhase, DashboardSnapshot, DashboardView, FetchTicket};
