use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339, macros::time};
use tower::ServiceExt;
use uuid::Uuid;

use footychat_back::{
    config::AppConfig,
    dao::memory::MemoryStore,
    routes,
    state::{AppState, SharedState},
};

async fn app() -> Router {
    let state: SharedState =
        AppState::with_store(AppConfig::default(), Arc::new(MemoryStore::new())).await;
    routes::router(state)
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header("x-user-id", user);
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn register(app: &Router, phone: &str, name: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/api/users",
        None,
        Some(json!({ "phone_number": phone, "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_owned()
}

fn field_payload() -> Value {
    let schedule: Vec<Value> = (0..7)
        .map(|day| json!({ "day_of_week": day, "open_time": "00:00", "close_time": "23:59" }))
        .collect();
    json!({
        "name": "Arena Norte",
        "location": { "address": "Rua do Campo 1", "city": "Porto" },
        "sizes": [{ "name": "7v7", "quantity": 1 }],
        "pricing": [{
            "size": "7v7",
            "periods": [{
                "name": "Normal",
                "hourly_rate": 60.0,
                "time_slots": [{ "days_of_week": [0, 1, 2, 3, 4, 5, 6], "start_time": "00:00", "end_time": "23:59" }]
            }]
        }],
        "schedule": schedule
    })
}

#[tokio::test]
async fn health_reports_store_state() {
    let (status, body) = call(&app().await, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let degraded = routes::router(AppState::new(AppConfig::default()));
    let (status, body) = call(&degraded, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");

    let (status, _) = call(
        &degraded,
        "POST",
        "/api/users",
        None,
        Some(json!({ "phone_number": "912345678", "name": "Ana" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn registration_validates_and_rejects_duplicates() {
    let app = app().await;
    register(&app, "+351 912 345 678", "Ana").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({ "phone_number": "912345678", "name": "Outra Ana" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].is_string());

    let (status, body) = call(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({ "phone_number": "812345678", "name": "Rui" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("validation"));
}

#[tokio::test]
async fn protected_routes_need_a_known_caller() {
    let app = app().await;
    let (status, _) = call(&app, "GET", "/api/groups", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, "GET", "/api/groups", Some("not-a-uuid"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let stranger = Uuid::new_v4().to_string();
    let (status, _) = call(&app, "GET", "/api/groups", Some(&stranger), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let ana = register(&app, "912000001", "Ana").await;
    let (status, body) = call(&app, "GET", "/api/groups", Some(&ana), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn groups_are_private_to_their_members() {
    let app = app().await;
    let ana = register(&app, "912000001", "Ana").await;
    let rui = register(&app, "912000002", "Rui").await;

    let (status, group) = call(
        &app,
        "POST",
        "/api/groups",
        Some(&ana),
        Some(json!({ "name": "Quintas" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let group_uri = format!("/api/groups/{}", group["id"].as_str().unwrap());

    let (status, _) = call(&app, "GET", &group_uri, Some(&rui), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, invite) = call(&app, "POST", &format!("{group_uri}/invite"), Some(&ana), None).await;
    assert_eq!(status, StatusCode::OK);
    let code = invite["invite_code"].as_str().unwrap().to_lowercase();

    let (status, joined) = call(
        &app,
        "POST",
        "/api/groups/join",
        Some(&rui),
        Some(json!({ "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["members"].as_array().unwrap().len(), 2);

    let (status, _) = call(&app, "DELETE", &format!("{group_uri}/leave"), Some(&ana), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(&app, "DELETE", &format!("{group_uri}/leave"), Some(&rui), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn games_are_booked_priced_and_confirmed() {
    let app = app().await;
    let ana = register(&app, "912000001", "Ana").await;
    let rui = register(&app, "912000002", "Rui").await;

    let (_, group) = call(&app, "POST", "/api/groups", Some(&ana), Some(json!({ "name": "Quintas" }))).await;
    let group_id = group["id"].as_str().unwrap().to_owned();
    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/groups/{group_id}/members"),
        Some(&ana),
        Some(json!({ "phone_number": "912000002" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, field) = call(&app, "POST", "/api/fields", Some(&ana), Some(field_payload())).await;
    assert_eq!(status, StatusCode::CREATED, "{field}");
    let field_id = field["id"].as_str().unwrap().to_owned();

    let (status, fields) = call(&app, "GET", "/api/fields?city=Porto", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fields.as_array().unwrap().len(), 1);

    let kick_off = (OffsetDateTime::now_utc() + Duration::days(7))
        .replace_time(time!(12:00))
        .format(&Rfc3339)
        .unwrap();
    let (status, quote) = call(
        &app,
        "GET",
        &format!("/api/fields/{field_id}/price?size=7v7&start={}", kick_off.replace('+', "%2B")),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{quote}");
    assert_eq!(quote["final_price"], 90.0);

    let game_request = json!({
        "group_id": group_id,
        "field_id": field_id,
        "date_time": kick_off,
        "min_players": 4,
        "max_players": 10
    });
    let (status, created) = call(&app, "POST", "/api/games", Some(&ana), Some(game_request.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let game_id = created["games"][0]["id"].as_str().unwrap().to_owned();

    // The only 7v7 pitch is now taken.
    let (status, _) = call(&app, "POST", "/api/games", Some(&ana), Some(game_request)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, outcome) = call(&app, "POST", &format!("/api/games/{game_id}/confirm"), Some(&rui), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["status"], "confirmed");
    assert_eq!(outcome["game"]["cost"]["per_player"], 45.0);

    let (status, games) = call(
        &app,
        "GET",
        &format!("/api/games?group_id={group_id}&upcoming=true"),
        Some(&rui),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(games.as_array().unwrap().len(), 1);

    let (status, inbox) = call(&app, "GET", "/api/users/notifications/count", Some(&rui), None).await;
    assert_eq!(status, StatusCode::OK);
    // Group welcome plus the game invitation.
    assert_eq!(inbox["count"], 2);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (status, doc) = call(&app().await, "GET", "/api-doc/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/games/{id}/confirm"].is_object());
}
