//! Terminal rendering of the dashboard

use serde::Serialize;
use std::fmt::Write;

use super::view::{DashboardPhase, DashboardSnapshot};
use crate::loads::{commodity_label, format_rate, Load, RouteSummary};

/// Display values for one load card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadCard {
    pub id: String,
    pub load_reference: String,
    pub rate: String,
    pub commodity: String,
    pub status_label: String,
    pub status_class: String,
    pub route: RouteSummary,
}

impl LoadCard {
    pub fn from_load(load: &Load) -> Self {
        Self {
            id: load.id.clone(),
            load_reference: load.load_reference.clone(),
            rate: format_rate(load.rate_amount),
            commodity: commodity_label(load).to_string(),
            status_label: load.status.label().to_string(),
            status_class: load.status.css_class().to_string(),
            route: RouteSummary::for_load(load),
        }
    }
}

/// Render the whole dashboard as plain text
pub fn render_dashboard(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();

    if snapshot.phase == DashboardPhase::Unauthenticated {
        out.push_str("RateCon Ripper\n\n");
        out.push_str("Not signed in. Run `ratecon-cli login` first.\n");
        return out;
    }

    let _ = writeln!(out, "RateCon Ripper [BETA]");
    if let Some(user) = &snapshot.user {
        let _ = writeln!(out, "Signed in as {}", user);
    }
    out.push('\n');

    let _ = writeln!(out, "{:<20} {}", "Pending Revenue", format!("${}", snapshot.revenue_display));
    let _ = writeln!(out, "{:<20} {}", "Active Loads", snapshot.stats.active_loads);
    out.push('\n');

    if let Some(error) = &snapshot.last_fetch_error {
        let _ = writeln!(out, "Last sync failed: {}", error);
        out.push('\n');
    }

    out.push_str("Recent Activity\n");
    let _ = writeln!(out, "{}", "-".repeat(60));

    if snapshot.loading {
        out.push_str("Syncing secure feed...\n");
    } else if snapshot.cards.is_empty() {
        out.push_str("No loads found for this account.\n");
    } else {
        for card in &snapshot.cards {
            out.push_str(&render_card(card));
            let _ = writeln!(out, "{}", "-".repeat(60));
        }
    }

    out
}

/// Render one load card
pub fn render_card(card: &LoadCard) -> String {
    let mut out = String::new();
    let pickup = &card.route.pickup;
    let drop = &card.route.drop;

    let _ = writeln!(out, "#{:<28} ${}", card.load_reference, card.rate);
    let _ = writeln!(
        out,
        "  PICKUP {} {} ({})  ->  DROP {} {} ({})",
        pickup.city, pickup.state, pickup.date, drop.city, drop.state, drop.date
    );
    let _ = writeln!(out, "  {:<28} {}", card.commodity, card.status_label);
    let _ = writeln!(out, "  id: {}", card.id);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardView;
    use crate::loads::{LoadStatus, Stop};
    use crate::store::{MemoryStore, Session, SessionUser};
    use std::sync::Arc;

    #[test]
    fn test_card_values() {
        let load = Load::new("1")
            .reference("RC-9")
            .rate(1500.0)
            .status(LoadStatus::PushedToTms)
            .stops(vec![Stop::new("Omaha", "NE", "2024-08-01")]);

        let card = LoadCard::from_load(&load);
        assert_eq!(card.rate, "1500");
        assert_eq!(card.commodity, "General Freight");
        assert_eq!(card.status_label, "Synced to TMS");
        assert_eq!(card.status_class, "success");
        assert_eq!(card.route.pickup.city, "Omaha");
        assert_eq!(card.route.drop.date, "Aug 1");

        let text = render_card(&card);
        assert!(text.contains("PICKUP Omaha NE (Aug 1)"));
        assert!(text.contains("DROP Omaha NE (Aug 1)"));
    }

    #[tokio::test]
    async fn test_render_states() {
        let store = Arc::new(MemoryStore::new());
        let mut view = DashboardView::new(store.clone(), store.clone());

        let text = render_dashboard(&view.snapshot());
        assert!(text.contains("Not signed in"));

        let session = Session::new(
            "t",
            SessionUser {
                id: "u".into(),
                email: None,
            },
        );
        view.apply_session(Some(session)).await.unwrap();
        let text = render_dashboard(&view.snapshot());
        assert!(text.contains("No loads found for this account."));
        assert!(text.contains("Active Loads         0"));

        store
            .set_rows(vec![Load::new("a").reference("RC-1").rate(500.0)])
            .await;
        view.refresh().await.unwrap();
        let text = render_dashboard(&view.snapshot());
        assert!(text.contains("#RC-1"));
        assert!(text.contains("Pending Revenue      $500"));
        assert!(text.contains("PICKUP Unknown  (TBD)"));
    }
}
