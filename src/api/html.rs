//! HTML pages
//!
//! Server-rendered login page and dashboard. Every value taken from the
//! store or the user goes through [`escape`].

use std::fmt::Write;

use crate::dashboard::{DashboardPhase, DashboardSnapshot, EditForm, LoadCard};
use crate::loads::StopView;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #f1f5f9; margin: 0; color: #0f172a; }
.app-container { max-width: 480px; margin: 0 auto; padding: 16px; }
.header { display: flex; justify-content: space-between; align-items: center; }
.logo-area { display: flex; align-items: center; gap: 8px; }
.badge-beta { background: #0f172a; color: white; font-size: 10px; padding: 2px 6px; border-radius: 4px; }
.actions form { display: inline; }
.btn-refresh { border: 1px solid #cbd5e1; background: white; border-radius: 8px; padding: 6px 10px; cursor: pointer; }
.stats-container { display: grid; grid-template-columns: 1fr 1fr; gap: 12px; margin: 16px 0; }
.stat-card { background: white; border-radius: 12px; padding: 14px; }
.stat-label { font-size: 12px; color: #64748b; }
.stat-value { font-size: 24px; font-weight: 700; }
.feed-label { font-size: 12px; font-weight: 600; color: #64748b; text-transform: uppercase; margin: 8px 0; }
.load-card { display: block; background: white; border-radius: 12px; padding: 14px; margin-bottom: 12px; color: inherit; text-decoration: none; }
.card-top, .card-footer, .route-container { display: flex; justify-content: space-between; align-items: center; }
.route-container { margin: 12px 0; }
.stop.right { text-align: right; }
.stop-label { display: block; font-size: 10px; color: #94a3b8; }
.city { font-weight: 600; }
.date-pill { font-size: 11px; color: #475569; }
.rate-badge { font-weight: 700; color: #15803d; }
.status-dot.success { color: #15803d; }
.status-dot.pending { color: #b45309; }
.loading-state, .empty-state { text-align: center; color: #64748b; padding: 32px 0; }
.alert { background: #fee2e2; color: #991b1b; border-radius: 8px; padding: 10px; margin: 12px 0; }
.notice { background: #fef9c3; color: #854d0e; border-radius: 8px; padding: 10px; margin: 12px 0; }
.modal-overlay { position: fixed; inset: 0; background: rgba(15, 23, 42, 0.5); display: flex; align-items: flex-end; justify-content: center; }
.modal-content { background: white; width: 100%; max-width: 480px; border-radius: 16px 16px 0 0; padding: 20px; }
.modal-header { display: flex; justify-content: space-between; align-items: center; }
.input-group { margin-bottom: 12px; }
.input-group label { display: block; font-size: 12px; color: #64748b; margin-bottom: 4px; }
.input-group input { width: 100%; box-sizing: border-box; padding: 10px; border: 1px solid #cbd5e1; border-radius: 8px; }
.save-btn { width: 100%; padding: 12px; border: 0; border-radius: 8px; background: #0f172a; color: white; font-weight: 600; }
.close-btn { border: 0; background: none; font-size: 20px; cursor: pointer; }
.login-box { max-width: 400px; margin: 10vh auto; background: white; padding: 40px; border-radius: 12px; box-shadow: 0 4px 6px rgba(0,0,0,0.1); }
"#;

/// Escape text for use in element content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>RateCon Ripper</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        STYLE, body
    )
}

/// Email/password sign-in page
pub fn login_page(error: Option<&str>, demo: bool) -> String {
    let mut body = String::from("<div class=\"login-box\">\n<h1>RateCon Ripper</h1>\n");

    if let Some(error) = error {
        let _ = writeln!(body, "<div class=\"alert\">{}</div>", escape(error));
    }
    if demo {
        body.push_str("<div class=\"notice\">Demo mode: sign in as demo@ratecon.dev / demo</div>\n");
    }

    body.push_str(
        "<form method=\"post\" action=\"/login\">\n\
         <div class=\"input-group\"><label for=\"email\">Email address</label>\
         <input id=\"email\" name=\"email\" type=\"email\" required></div>\n\
         <div class=\"input-group\"><label for=\"password\">Password</label>\
         <input id=\"password\" name=\"password\" type=\"password\" required></div>\n\
         <button class=\"save-btn\" type=\"submit\">Sign in</button>\n\
         </form>\n</div>",
    );

    page(&body)
}

/// The dashboard page, or the login page when signed out
pub fn dashboard_page(snapshot: &DashboardSnapshot, demo: bool) -> String {
    if snapshot.phase == DashboardPhase::Unauthenticated {
        return login_page(None, demo);
    }

    let mut body = String::from("<div class=\"app-container\">\n");

    body.push_str(
        "<header class=\"header\">\n\
         <div class=\"logo-area\"><h1>RateCon Ripper</h1><span class=\"badge-beta\">BETA</span></div>\n\
         <div class=\"actions\">\
         <form method=\"post\" action=\"/refresh\"><button class=\"btn-refresh\" title=\"Refresh\">&#x21bb;</button></form> \
         <form method=\"post\" action=\"/logout\"><button class=\"btn-refresh\" title=\"Sign out\">&#x23fb;</button></form>\
         </div>\n</header>\n",
    );

    if let Some(user) = &snapshot.user {
        let _ = writeln!(body, "<div class=\"stat-label\">Signed in as {}</div>", escape(user));
    }

    let _ = write!(
        body,
        "<div class=\"stats-container\">\n\
         <div class=\"stat-card revenue\"><span class=\"stat-label\">Pending Revenue</span>\
         <div class=\"stat-value\">${}</div></div>\n\
         <div class=\"stat-card count\"><span class=\"stat-label\">Active Loads</span>\
         <div class=\"stat-value\">{}</div></div>\n</div>\n",
        escape(&snapshot.revenue_display),
        snapshot.stats.active_loads
    );

    if let Some(error) = &snapshot.last_fetch_error {
        let _ = writeln!(
            body,
            "<div class=\"notice\">Could not refresh loads: {}</div>",
            escape(error)
        );
    }

    body.push_str("<div class=\"feed-label\">Recent Activity</div>\n<div class=\"load-list\">\n");
    if snapshot.loading {
        body.push_str("<div class=\"loading-state\">Syncing secure feed...</div>\n");
    } else if snapshot.cards.is_empty() {
        body.push_str("<div class=\"empty-state\">No loads found for this account.</div>\n");
    } else {
        for card in &snapshot.cards {
            body.push_str(&card_html(card));
        }
    }
    body.push_str("</div>\n");

    if let Some(form) = &snapshot.editing {
        body.push_str(&edit_modal(form, snapshot.alert.as_deref()));
    } else if let Some(alert) = &snapshot.alert {
        let _ = writeln!(body, "<div class=\"alert\">{}</div>", escape(alert));
    }

    body.push_str("</div>");
    page(&body)
}

fn stop_html(label: &str, stop: &StopView, right: bool) -> String {
    format!(
        "<div class=\"stop{}\"><span class=\"stop-label\">{}</span>\
         <span class=\"city\">{}</span> <span class=\"state\">{}</span>\
         <div class=\"date-pill\">{}</div></div>",
        if right { " right" } else { "" },
        label,
        escape(&stop.city),
        escape(&stop.state),
        escape(&stop.date)
    )
}

/// One load card, linking to its editor
pub fn card_html(card: &LoadCard) -> String {
    format!(
        "<a class=\"load-card\" href=\"/loads/{id}/edit\">\n\
         <div class=\"card-top\"><div class=\"ref-badge\"># {reference}</div>\
         <div class=\"rate-badge\">${rate}</div></div>\n\
         <div class=\"route-container\">{pickup}<div class=\"route-arrow\">&rarr;</div>{drop}</div>\n\
         <div class=\"card-footer\"><span class=\"commodity\">{commodity}</span>\
         <span class=\"status-dot {class}\">{status}</span></div>\n</a>\n",
        id = urlencoding::encode(&card.id),
        reference = escape(&card.load_reference),
        rate = escape(&card.rate),
        pickup = stop_html("PICKUP", &card.route.pickup, false),
        drop = stop_html("DROP", &card.route.drop, true),
        commodity = escape(&card.commodity),
        class = card.status_class,
        status = card.status_label,
    )
}

/// The edit modal over the open form
pub fn edit_modal(form: &EditForm, alert: Option<&str>) -> String {
    let mut out = String::from(
        "<div class=\"modal-overlay\">\n<div class=\"modal-content\">\n\
         <div class=\"modal-header\"><h2>Edit Load Details</h2>\
         <form method=\"post\" action=\"/edit/close\"><button class=\"close-btn\" title=\"Close\">&times;</button></form>\
         </div>\n",
    );

    if let Some(alert) = alert {
        let _ = writeln!(out, "<div class=\"alert\">{}</div>", escape(alert));
    }

    let _ = write!(
        out,
        "<form method=\"post\" action=\"/loads/{id}\">\n\
         <div class=\"input-group\"><label for=\"load_reference\">Reference Number</label>\
         <input id=\"load_reference\" name=\"load_reference\" value=\"{reference}\"></div>\n\
         <div class=\"input-group\"><label for=\"rate_amount\">Rate ($)</label>\
         <input id=\"rate_amount\" name=\"rate_amount\" inputmode=\"decimal\" value=\"{rate}\"></div>\n\
         <div class=\"input-group\"><label for=\"commodity\">Commodity</label>\
         <input id=\"commodity\" name=\"commodity\" value=\"{commodity}\"></div>\n\
         <button class=\"save-btn\" type=\"submit\">Update Load</button>\n\
         </form>\n</div>\n</div>\n",
        id = urlencoding::encode(&form.id),
        reference = escape(&form.load_reference),
        rate = escape(&form.rate_input),
        commodity = escape(&form.commodity),
    );

    out
}
