//! Dashboard summary statistics

use serde::Serialize;

use super::types::Load;

/// Summary figures shown above the load list
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DashboardStats {
    /// Sum of all rates in the current list
    pub pending_revenue: f64,
    /// Number of loads in the current list
    pub active_loads: usize,
}

impl DashboardStats {
    pub fn from_loads(loads: &[Load]) -> Self {
        Self {
            pending_revenue: loads.iter().map(Load::rate_or_zero).sum(),
            active_loads: loads.len(),
        }
    }

    /// Revenue formatted for display
    pub fn revenue_display(&self) -> String {
        format_amount(self.pending_revenue)
    }
}

impl std::fmt::Display for DashboardStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pending Revenue: ${}, Active Loads: {}",
            self.revenue_display(),
            self.active_loads
        )
    }
}

/// Format an amount with thousands separators and at most three decimals
pub fn format_amount(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let negative = amount < 0.0;
    let fixed = format!("{:.3}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative && (int_part != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Format a single load rate the way the card badge shows it
pub fn format_rate(rate: Option<f64>) -> String {
    rate.map(|r| r.to_string()).unwrap_or_default()
}
