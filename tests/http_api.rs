use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use movie_night_back::{
    config::{AppConfig, StorageConfig, UserCredential},
    dao::{game_store::memory::MemoryGameStore, metadata::FixedMetadataProvider},
    routes,
    state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let config = AppConfig::default()
        .with_storage(StorageConfig::Memory)
        .with_users(
            ["alice", "bob"]
                .into_iter()
                .map(|name| UserCredential {
                    username: name.into(),
                    password: format!("{name}-pw"),
                })
                .collect(),
        );
    let state = AppState::new(
        config,
        Arc::new(MemoryGameStore::new()),
        Arc::new(FixedMetadataProvider::new()),
    );
    routes::router(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn login(app: &Router, name: &str) -> String {
    let request = Request::post("/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={name}&password={name}-pw")))
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_owned()
}

fn post_json(uri: &str, token: &str, payload: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn round_can_be_played_over_http() {
    let app = app();
    let alice = login(&app, "alice").await;
    let bob = login(&app, "bob").await;

    for (token, name) in [(&alice, "alice"), (&bob, "bob")] {
        let (status, body) = send(&app, post_json("/users", token, json!({"name": name}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], name);
    }

    let (status, body) = send(&app, post_json("/round", &alice, json!({"prompt": "heists"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"state": "SubmissionState", "player_state": "open"}));

    let (status, heat) = send(
        &app,
        post_json("/submissions", &alice, json!({"name": "Heat", "comment": "classic"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(heat["submitting_user"]["name"], "alice");
    assert_eq!(heat["movie"]["requested_name"], "Heat");
    assert_eq!(heat["comments"][0]["text"], "classic");

    let (_, body) = send(&app, get("/state", &alice)).await;
    assert_eq!(body, json!({"state": "SubmissionState", "player_state": "closed"}));

    let (status, ronin) = send(&app, post_json("/submissions", &bob, json!({"name": "Ronin"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/state", &bob)).await;
    assert_eq!(body, json!({"state": "VotingState", "player_state": "open"}));

    let heat_id = heat["id"].as_u64().unwrap();
    let ronin_id = ronin["id"].as_u64().unwrap();
    let (status, body) = send(
        &app,
        post_json(
            "/vote",
            &alice,
            json!({"submission_id": ronin_id, "all_comments": {(ronin_id.to_string()): "nice"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"state": "VotingState", "player_state": "closed"}));

    let (_, body) = send(
        &app,
        post_json("/vote", &bob, json!({"submission_id": heat_id, "all_comments": {}})),
    )
    .await;
    assert_eq!(body, json!({"state": "OverviewState", "player_state": null}));

    let (status, round) = send(&app, get("/round", &bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(round["prompt"], "heists");
    assert_eq!(round["submissions"][0]["voting_users"][0]["name"], "bob");
    assert_eq!(round["submissions"][1]["comments"][0]["text"], "nice");

    let (status, rounds) = send(&app, get("/rounds", &bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rounds.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn errors_map_to_http_statuses() {
    let app = app();

    let (status, _) = send(&app, get("/state", "not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::post("/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=alice&password=wrong"))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let alice = login(&app, "alice").await;

    let (status, _) = send(&app, get("/round", &alice)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, post_json("/users", &alice, json!({"name": "bob"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, post_json("/round", &alice, json!({"prompt": " "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, post_json("/submissions", &alice, json!({"name": "Heat"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("Submission"));
}

#[tokio::test]
async fn public_routes_need_no_token() {
    let app = app();

    let (status, body) = send(&app, Request::get("/healthcheck").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["state"], "OverviewState");

    let (status, body) = send(
        &app,
        Request::get("/api-doc/openapi.json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/submissions"].is_object());
}
