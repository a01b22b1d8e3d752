//! Freight Loads
//!
//! Data model for rows of the `loads` table and the values the dashboard
//! derives from them.
//!
//! ## Components
//!
//! - **types**: `Load`, `Stop`, `LoadStatus`, `LoadPatch`
//! - **route**: pickup/drop derivation and date formatting
//! - **stats**: revenue and count summaries

mod route;
mod stats;
mod types;

pub use route::{
    commodity_label, format_date, RouteSummary, StopView, DEFAULT_COMMODITY, UNKNOWN_CITY,
    UNKNOWN_DATE,
};
pub use stats::{format_amount, format_rate, DashboardStats};
pub use types::{Load, LoadPatch, LoadStatus, Stop, PUSHED_TO_TMS};

/// Table the dashboard reads and patches
pub const LOADS_TABLE: &str = "loads";
