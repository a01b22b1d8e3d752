//! SupabaseClient against a local stand-in for the PostgREST and GoTrue APIs

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use ratecon::dashboard::{DashboardPhase, DashboardView};
use ratecon::loads::{LoadPatch, LoadStatus};
use ratecon::store::{
    AuthClient, OrderBy, RecordStore, Session, SessionStore, SessionUser, StoreError,
    SupabaseClient, SupabaseConfig,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    query: String,
    apikey: Option<String>,
    authorization: Option<String>,
    prefer: Option<String>,
    body: String,
}

type Log = Arc<Mutex<Vec<Recorded>>>;

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn token(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": refresh,
        "user": {"id": "user-1", "email": "ops@carrier.com"}
    })
}

async fn backend(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let recorded = Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        apikey: header(&headers, "apikey"),
        authorization: header(&headers, "authorization"),
        prefer: header(&headers, "prefer"),
        body: String::from_utf8_lossy(&body).to_string(),
    };
    log.lock().unwrap().push(recorded.clone());

    let body: serde_json::Value = serde_json::from_slice(&body).unwrap_or(json!({}));
    let signed_in = recorded.authorization.as_deref() != Some("Bearer anon-key");

    match (method, recorded.path.as_str()) {
        (Method::GET, "/rest/v1/loads") if signed_in => Json(json!([
            {
                "id": "a1",
                "created_at": "2024-05-02T10:00:00+00:00",
                "load_reference": "RC-100",
                "rate_amount": 1200,
                "commodity": null,
                "status": "PUSHED_TO_TMS",
                "raw_data": {"stops": [
                    {"city": "Tulsa", "state": "OK", "date": "2024-05-03"},
                    {"city": "Denver", "state": "CO"}
                ]}
            },
            {
                "id": "b2",
                "created_at": "2024-05-01T10:00:00+00:00",
                "load_reference": "RC-99",
                "rate_amount": null,
                "commodity": "Steel coils",
                "status": "PARSED",
                "raw_data": null
            }
        ]))
        .into_response(),
        // Row-level security hides every row from the anonymous role
        (Method::GET, "/rest/v1/loads") => Json(json!([])).into_response(),
        (Method::GET, _) => (
            StatusCode::NOT_FOUND,
            Json(json!({"code": "42P01", "message": "relation \"public.trucks\" does not exist"})),
        )
            .into_response(),
        (Method::PATCH, "/rest/v1/loads") if recorded.query == "id=eq.locked" => (
            StatusCode::FORBIDDEN,
            Json(json!({"code": "42501", "message": "new row violates row-level security policy"})),
        )
            .into_response(),
        (Method::PATCH, "/rest/v1/loads") => StatusCode::NO_CONTENT.into_response(),
        (Method::POST, "/auth/v1/token") if recorded.query == "grant_type=password" => {
            if body["password"] == "secret" {
                Json(token("at-1", "rt-1")).into_response()
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
                )
                    .into_response()
            }
        }
        (Method::POST, "/auth/v1/token") => {
            if body["refresh_token"] == "rt-1" {
                Json(token("at-2", "rt-2")).into_response()
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"code": 400, "msg": "Invalid Refresh Token: Refresh Token Not Found"})),
                )
                    .into_response()
            }
        }
        (Method::POST, "/auth/v1/logout") => StatusCode::NO_CONTENT.into_response(),
        _ => (StatusCode::BAD_GATEWAY, "upstream exploded\n").into_response(),
    }
}

async fn start_backend() -> (String, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().fallback(backend).with_state(Arc::clone(&log));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/", addr), log)
}

fn client(url: &str) -> SupabaseClient {
    SupabaseClient::new(SupabaseConfig::new(url, "anon-key")).unwrap()
}

fn last(log: &Log) -> Recorded {
    log.lock().unwrap().last().cloned().unwrap()
}

fn expired_session(refresh: &str) -> Session {
    let mut session = Session::new(
        "at-old",
        SessionUser {
            id: "user-1".into(),
            email: Some("ops@carrier.com".into()),
        },
    )
    .refresh_token(refresh);
    session.expires_at = Some(0);
    session
}

#[tokio::test]
async fn test_sign_in_then_list() {
    let (url, log) = start_backend().await;
    let client = client(&url);

    let session = client
        .sign_in_with_password("ops@carrier.com", "secret")
        .await
        .unwrap();
    assert_eq!(session.access_token, "at-1");
    assert_eq!(session.display_name(), "ops@carrier.com");

    let sign_in = last(&log);
    assert_eq!(sign_in.method, Method::POST);
    assert_eq!(sign_in.path, "/auth/v1/token");
    assert_eq!(sign_in.query, "grant_type=password");
    assert_eq!(sign_in.apikey.as_deref(), Some("anon-key"));
    let body: serde_json::Value = serde_json::from_str(&sign_in.body).unwrap();
    assert_eq!(body, json!({"email": "ops@carrier.com", "password": "secret"}));

    let loads = client.list("loads", &OrderBy::newest_first()).await.unwrap();
    let request = last(&log);
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.path, "/rest/v1/loads");
    assert_eq!(request.query, "select=*&order=created_at.desc");
    assert_eq!(request.apikey.as_deref(), Some("anon-key"));
    assert_eq!(request.authorization.as_deref(), Some("Bearer at-1"));

    assert_eq!(loads.len(), 2);
    assert_eq!(loads[0].rate_amount, Some(1200.0));
    assert_eq!(loads[0].commodity, "");
    assert_eq!(loads[0].status, LoadStatus::PushedToTms);
    assert_eq!(loads[0].route_stops().len(), 2);
    assert_eq!(loads[1].rate_amount, None);
    assert!(!loads[1].status.is_synced());
}

#[tokio::test]
async fn test_list_without_session_uses_anon_key() {
    let (url, log) = start_backend().await;
    let client = client(&url);

    let loads = client.list("loads", &OrderBy::newest_first()).await.unwrap();
    assert!(loads.is_empty());
    assert_eq!(last(&log).authorization.as_deref(), Some("Bearer anon-key"));
}

#[tokio::test]
async fn test_bad_credentials_message() {
    let (url, _log) = start_backend().await;
    let client = client(&url);

    let err = client
        .sign_in_with_password("ops@carrier.com", "wrong")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.message(), "Invalid login credentials");
    assert!(client.current_session().await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_sends_patch() {
    let (url, log) = start_backend().await;
    let client = client(&url);
    client
        .sign_in_with_password("ops@carrier.com", "secret")
        .await
        .unwrap();

    let patch = LoadPatch {
        rate_amount: Some(1350.25),
        load_reference: "RC-100A".into(),
        commodity: "Frozen poultry".into(),
    };
    client.update("loads", "a1", &patch).await.unwrap();

    let request = last(&log);
    assert_eq!(request.method, Method::PATCH);
    assert_eq!(request.path, "/rest/v1/loads");
    assert_eq!(request.query, "id=eq.a1");
    assert_eq!(request.prefer.as_deref(), Some("return=minimal"));
    assert_eq!(request.authorization.as_deref(), Some("Bearer at-1"));

    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(
        body,
        json!({"rate_amount": 1350.25, "load_reference": "RC-100A", "commodity": "Frozen poultry"})
    );
}

#[tokio::test]
async fn test_store_error_messages_surface() {
    let (url, _log) = start_backend().await;
    let client = client(&url);

    let patch = LoadPatch {
        rate_amount: None,
        load_reference: "X".into(),
        commodity: String::new(),
    };
    let err = client.update("loads", "locked", &patch).await.unwrap_err();
    assert!(matches!(err, StoreError::Api { status: 403, .. }));
    assert_eq!(err.message(), "new row violates row-level security policy");

    let err = client
        .list("trucks", &OrderBy::newest_first())
        .await
        .unwrap_err();
    assert_eq!(err.message(), "relation \"public.trucks\" does not exist");
}

#[tokio::test]
async fn test_unreachable_store() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = client(&url)
        .list("loads", &OrderBy::newest_first())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Unavailable));
}

#[tokio::test]
async fn test_expired_session_is_refreshed_and_persisted() {
    let (url, log) = start_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let sessions = SessionStore::new(dir.path().join("session.json"));
    sessions.save(&expired_session("rt-1")).unwrap();

    let client = client(&url).with_session_store(sessions.clone());
    let session = client.current_session().await.unwrap().unwrap();

    assert_eq!(session.access_token, "at-2");
    let refresh = last(&log);
    assert_eq!(refresh.query, "grant_type=refresh_token");
    assert_eq!(sessions.load().unwrap().unwrap().access_token, "at-2");
    assert_eq!(
        client.subscribe().borrow().as_ref().map(|s| s.access_token.clone()),
        Some("at-2".to_string())
    );
}

#[tokio::test]
async fn test_rejected_refresh_signs_out() {
    let (url, _log) = start_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let sessions = SessionStore::new(dir.path().join("session.json"));
    sessions.save(&expired_session("revoked")).unwrap();

    let client = client(&url).with_session_store(sessions.clone());

    assert!(client.current_session().await.unwrap().is_none());
    assert!(sessions.load().unwrap().is_none());
}

#[tokio::test]
async fn test_list_refreshes_expired_session_first() {
    let (url, log) = start_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let sessions = SessionStore::new(dir.path().join("session.json"));
    sessions.save(&expired_session("rt-1")).unwrap();

    let client = client(&url).with_session_store(sessions.clone());
    let rows = client.list("loads", &OrderBy::newest_first()).await.unwrap();
    assert_eq!(rows.len(), 2);

    let requests = log.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/auth/v1/token");
    assert_eq!(requests[0].query, "grant_type=refresh_token");
    assert_eq!(requests[1].path, "/rest/v1/loads");
    assert_eq!(requests[1].authorization.as_deref(), Some("Bearer at-2"));
    assert_eq!(sessions.load().unwrap().unwrap().access_token, "at-2");
}

#[tokio::test]
async fn test_update_refreshes_expired_session_first() {
    let (url, log) = start_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let sessions = SessionStore::new(dir.path().join("session.json"));
    sessions.save(&expired_session("rt-1")).unwrap();

    let client = client(&url).with_session_store(sessions);
    let patch = LoadPatch {
        rate_amount: Some(1250.0),
        load_reference: "RC-100".into(),
        commodity: "Lumber".into(),
    };
    client.update("loads", "a1", &patch).await.unwrap();

    let requests = log.lock().unwrap().clone();
    assert!(requests.iter().any(|r| r.query == "grant_type=refresh_token"));
    let patch = last(&log);
    assert_eq!(patch.method, Method::PATCH);
    assert!(requests
        .iter()
        .all(|r| r.authorization.as_deref() != Some("Bearer at-old")));
    assert_eq!(patch.authorization.as_deref(), Some("Bearer at-2"));
}

#[tokio::test]
async fn test_list_after_rejected_refresh_uses_anon_key() {
    let (url, log) = start_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let sessions = SessionStore::new(dir.path().join("session.json"));
    sessions.save(&expired_session("revoked")).unwrap();

    let client = client(&url).with_session_store(sessions);

    let rows = client.list("loads", &OrderBy::newest_first()).await.unwrap();

    assert!(rows.is_empty());
    assert_eq!(last(&log).authorization.as_deref(), Some("Bearer anon-key"));
    assert!(client.subscribe().borrow().is_none());
}

#[tokio::test]
async fn test_sign_out_clears_session_file() {
    let (url, log) = start_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let sessions = SessionStore::new(dir.path().join("nested").join("session.json"));

    let client = client(&url).with_session_store(sessions.clone());
    client
        .sign_in_with_password("ops@carrier.com", "secret")
        .await
        .unwrap();
    assert!(sessions.load().unwrap().is_some());

    client.sign_out().await.unwrap();

    let logout = last(&log);
    assert_eq!(logout.path, "/auth/v1/logout");
    assert_eq!(logout.authorization.as_deref(), Some("Bearer at-1"));
    assert!(sessions.load().unwrap().is_none());
    assert!(client.current_session().await.unwrap().is_none());
}

#[tokio::test]
async fn test_dashboard_over_rest() {
    let (url, _log) = start_backend().await;
    let client = Arc::new(client(&url));
    client
        .sign_in_with_password("ops@carrier.com", "secret")
        .await
        .unwrap();

    let mut view = DashboardView::new(client.clone(), client.clone());
    view.mount().await.unwrap();

    assert_eq!(view.phase(), DashboardPhase::Idle);
    assert_eq!(view.stats().pending_revenue, 1200.0);
    assert_eq!(view.stats().active_loads, 2);

    view.select("a1").unwrap().set_rate_input("1400");
    view.submit_update().await.unwrap();
    assert_eq!(view.loads()[0].rate_amount, Some(1400.0));

    view.sign_out().await.unwrap();
    assert_eq!(view.phase(), DashboardPhase::Unauthenticated);
    assert!(view.loads().is_empty());
}
