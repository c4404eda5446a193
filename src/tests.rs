//! Integration tests for the GreenGen client.
//!
//! The fixture stands up an in-process mock of the hosted backend (auth,
//! tables, object storage) on a random port and points a real `AppState`
//! at it. Every request is counted so local-rejection paths can assert
//! that nothing went over the wire.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::flows::PostImage;
use crate::AppState;

#[derive(Debug, Clone)]
struct MockUser {
    id: Uuid,
    email: String,
    password: String,
    confirmed: bool,
}

#[derive(Default)]
struct MockBackend {
    users: Vec<MockUser>,
    /// access token -> user id
    sessions: HashMap<String, Uuid>,
    tables: HashMap<String, Vec<Value>>,
    /// stored object paths within the bucket
    objects: HashSet<String>,
    /// total requests served, including rejected ones
    requests: usize,
    recovers: Vec<String>,
    resends: Vec<String>,
    /// force the next membership insert to fail
    fail_membership_insert: bool,
}

type Shared = Arc<Mutex<MockBackend>>;

const MEMBERSHIP_TABLES: &[&str] = &["community_members", "challenge_participants"];
const UPSERT_TABLES: &[&str] = &["profiles", "user_settings"];

fn mock_router(mock: Shared) -> Router {
    Router::new()
        .route("/auth/v1/signup", post(auth_signup))
        .route("/auth/v1/token", post(auth_token))
        .route("/auth/v1/user", get(auth_get_user).put(auth_update_user))
        .route("/auth/v1/logout", post(auth_logout))
        .route("/auth/v1/recover", post(auth_recover))
        .route("/auth/v1/resend", post(auth_resend))
        .route(
            "/rest/v1/{table}",
            get(rest_select).post(rest_insert).patch(rest_update),
        )
        .route("/storage/v1/object/{bucket}/{*path}", post(storage_upload))
        .layer(middleware::from_fn_with_state(mock.clone(), count_requests))
        .with_state(mock)
}

async fn count_requests(State(mock): State<Shared>, req: Request, next: Next) -> Response {
    mock.lock().unwrap().requests += 1;
    next.run(req).await
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

fn identity_json(user: &MockUser) -> Value {
    json!({
        "id": user.id,
        "email": user.email,
        "email_confirmed_at": if user.confirmed {
            Some(Utc::now().to_rfc3339())
        } else {
            None
        },
    })
}

async fn auth_signup(State(mock): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut db = mock.lock().unwrap();
    let user = MockUser {
        id: Uuid::new_v4(),
        email: body["email"].as_str().unwrap_or_default().to_string(),
        password: body["password"].as_str().unwrap_or_default().to_string(),
        confirmed: false,
    };
    let resp = Json(identity_json(&user)).into_response();
    db.users.push(user);
    resp
}

async fn auth_token(State(mock): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut db = mock.lock().unwrap();
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let Some(user) = db
        .users
        .iter()
        .find(|u| u.email == email && u.password == password)
        .cloned()
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error_description": "Invalid login credentials" })),
        )
            .into_response();
    };

    let token = Uuid::new_v4().to_string();
    db.sessions.insert(token.clone(), user.id);
    Json(json!({
        "access_token": token,
        "refresh_token": Uuid::new_v4().to_string(),
        "user": identity_json(&user),
    }))
    .into_response()
}

fn session_user(db: &MockBackend, headers: &HeaderMap) -> Option<MockUser> {
    let token = bearer(headers)?;
    let user_id = db.sessions.get(&token)?;
    db.users.iter().find(|u| u.id == *user_id).cloned()
}

async fn auth_get_user(State(mock): State<Shared>, headers: HeaderMap) -> Response {
    let db = mock.lock().unwrap();
    match session_user(&db, &headers) {
        Some(user) => Json(identity_json(&user)).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "msg": "invalid token" })),
        )
            .into_response(),
    }
}

async fn auth_update_user(
    State(mock): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut db = mock.lock().unwrap();
    let Some(user) = session_user(&db, &headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "msg": "invalid token" })),
        )
            .into_response();
    };
    if let Some(password) = body["password"].as_str() {
        if let Some(stored) = db.users.iter_mut().find(|u| u.id == user.id) {
            stored.password = password.to_string();
        }
    }
    Json(identity_json(&user)).into_response()
}

async fn auth_logout(State(mock): State<Shared>, headers: HeaderMap) -> StatusCode {
    let mut db = mock.lock().unwrap();
    if let Some(token) = bearer(&headers) {
        db.sessions.remove(&token);
    }
    StatusCode::NO_CONTENT
}

async fn auth_recover(State(mock): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut db = mock.lock().unwrap();
    db.recovers
        .push(body["email"].as_str().unwrap_or_default().to_string());
    Json(json!({}))
}

async fn auth_resend(State(mock): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut db = mock.lock().unwrap();
    db.resends
        .push(body["email"].as_str().unwrap_or_default().to_string());
    Json(json!({}))
}

fn field_str(row: &Value, column: &str) -> String {
    match row.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn row_matches(row: &Value, params: &HashMap<String, String>) -> bool {
    for (column, condition) in params {
        if matches!(column.as_str(), "select" | "order" | "limit") {
            continue;
        }
        if let Some(wanted) = condition.strip_prefix("eq.") {
            if field_str(row, column) != wanted {
                return false;
            }
        } else if let Some(pattern) = condition.strip_prefix("ilike.") {
            let needle = pattern.trim_matches('*').to_lowercase();
            if !field_str(row, column).to_lowercase().contains(&needle) {
                return false;
            }
        }
    }
    true
}

/// Resolve the embedded-resource joins the client asks for in `select`.
fn apply_embeds(db: &MockBackend, select: &str, mut row: Value) -> Value {
    if select.contains("profiles(") {
        let author = db
            .tables
            .get("profiles")
            .and_then(|rows| {
                rows.iter()
                    .find(|p| field_str(p, "user_id") == field_str(&row, "user_id"))
            })
            .map(|p| json!({ "green_name": p.get("green_name").cloned().unwrap_or(Value::Null) }))
            .unwrap_or(Value::Null);
        row["profiles"] = author;
    }
    if select.contains("challenges:challenge_id(") {
        let challenge = db
            .tables
            .get("challenges")
            .and_then(|rows| {
                rows.iter()
                    .find(|c| field_str(c, "id") == field_str(&row, "challenge_id"))
            })
            .cloned()
            .unwrap_or(Value::Null);
        row["challenges"] = challenge;
    }
    row
}

async fn rest_select(
    State(mock): State<Shared>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let db = mock.lock().unwrap();
    let select = params.get("select").cloned().unwrap_or_default();

    let mut rows: Vec<Value> = db
        .tables
        .get(&table)
        .map(|rows| {
            rows.iter()
                .filter(|row| row_matches(row, &params))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    if let Some(order) = params.get("order") {
        let column = order.split('.').next().unwrap_or_default().to_string();
        rows.sort_by(|a, b| field_str(b, &column).cmp(&field_str(a, &column)));
    }

    let total = rows.len();
    if let Some(limit) = params.get("limit").and_then(|l| l.parse::<usize>().ok()) {
        rows.truncate(limit);
    }

    let rows: Vec<Value> = rows
        .into_iter()
        .map(|row| apply_embeds(&db, &select, row))
        .collect();

    let content_range = format!("0-{}/{}", rows.len(), total);
    ([("content-range", content_range)], Json(rows)).into_response()
}

async fn rest_insert(
    State(mock): State<Shared>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut db = mock.lock().unwrap();
    let prefer = headers
        .get("prefer")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let mut row = body;
    if row.get("id").is_none() {
        row["id"] = json!(Uuid::new_v4());
    }
    if row.get("created_at").is_none() {
        row["created_at"] = json!(Utc::now().to_rfc3339());
    }

    if MEMBERSHIP_TABLES.contains(&table.as_str()) {
        if db.fail_membership_insert {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "forced membership failure" })),
            )
                .into_response();
        }
        let fk = if table == "community_members" {
            "community_id"
        } else {
            "challenge_id"
        };
        let duplicate = db.tables.get(&table).is_some_and(|rows| {
            rows.iter().any(|existing| {
                field_str(existing, fk) == field_str(&row, fk)
                    && field_str(existing, "user_id") == field_str(&row, "user_id")
            })
        });
        if duplicate {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "message": "duplicate key value violates unique constraint" })),
            )
                .into_response();
        }
    }

    if prefer.contains("resolution=merge-duplicates") && UPSERT_TABLES.contains(&table.as_str()) {
        let rows = db.tables.entry(table).or_default();
        let existing = rows
            .iter()
            .position(|existing| field_str(existing, "user_id") == field_str(&row, "user_id"));
        match existing {
            // Merge keyed on user_id: incoming keys win, others survive.
            Some(index) => {
                if let (Some(target), Some(incoming)) =
                    (rows[index].as_object_mut(), row.as_object())
                {
                    for (key, value) in incoming {
                        if matches!(key.as_str(), "id" | "created_at") {
                            continue;
                        }
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
            None => rows.push(row),
        }
        return StatusCode::CREATED.into_response();
    }

    let representation = prefer.contains("return=representation");
    let response = if representation {
        Json(json!([row])).into_response()
    } else {
        StatusCode::CREATED.into_response()
    };
    db.tables.entry(table).or_default().push(row);
    response
}

async fn rest_update(
    State(mock): State<Shared>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let mut db = mock.lock().unwrap();
    if let Some(rows) = db.tables.get_mut(&table) {
        for row in rows.iter_mut().filter(|row| row_matches(row, &params)) {
            if let (Some(target), Some(patch)) = (row.as_object_mut(), body.as_object()) {
                for (key, value) in patch {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn storage_upload(
    State(mock): State<Shared>,
    Path((_bucket, path)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let mut db = mock.lock().unwrap();
    let upsert = headers
        .get("x-upsert")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "true")
        .unwrap_or(false);

    if db.objects.contains(&path) && !upsert {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "The resource already exists" })),
        )
            .into_response();
    }
    db.objects.insert(path.clone());
    Json(json!({ "Key": path })).into_response()
}

/// Test fixture for integration tests.
struct TestFixture {
    state: AppState,
    mock: Shared,
}

impl TestFixture {
    async fn new() -> Self {
        let mock: Shared = Arc::new(Mutex::new(MockBackend::default()));
        let app = mock_router(Arc::clone(&mock));

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let config = Config {
            backend_url: format!("http://{}", addr),
            anon_key: "test-anon-key".to_string(),
            storage_bucket: "images".to_string(),
            log_level: "warn".to_string(),
        };

        TestFixture {
            state: AppState::new(config),
            mock,
        }
    }

    fn requests(&self) -> usize {
        self.mock.lock().unwrap().requests
    }

    fn rows(&self, table: &str) -> Vec<Value> {
        self.mock
            .lock()
            .unwrap()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn seed(&self, table: &str, row: Value) {
        self.mock
            .lock()
            .unwrap()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Sign up and sign in a fresh account; returns its user id.
    async fn sign_in(&self, email: &str) -> Uuid {
        self.state
            .account
            .sign_up(email, "password123")
            .await
            .expect("signup failed");
        let snapshot = self
            .state
            .account
            .sign_in(email, "password123")
            .await
            .expect("sign-in failed");
        snapshot.identity.expect("no identity after sign-in").id
    }
}

#[tokio::test]
async fn test_fresh_session_resolves_logged_out_without_calls() {
    let fixture = TestFixture::new().await;

    let snapshot = fixture.state.session.resolve().await;
    assert!(!snapshot.signed_in());
    assert_eq!(snapshot.green_name, "");
    assert!(!snapshot.email_verified);
    assert_eq!(fixture.requests(), 0);
}

#[tokio::test]
async fn test_sign_in_resolves_profile_name() {
    let fixture = TestFixture::new().await;

    fixture
        .state
        .account
        .sign_up("eco@example.com", "password123")
        .await
        .unwrap();
    let signup_id = fixture.mock.lock().unwrap().users[0].id;
    fixture.seed(
        "profiles",
        json!({ "user_id": signup_id, "green_name": "EcoWarrior" }),
    );

    let snapshot = fixture
        .state
        .account
        .sign_in("eco@example.com", "password123")
        .await
        .unwrap();
    assert!(snapshot.signed_in());
    assert_eq!(snapshot.green_name, "EcoWarrior");
    assert!(!snapshot.email_verified);
}

#[tokio::test]
async fn test_sign_in_without_profile_leaves_name_empty() {
    let fixture = TestFixture::new().await;

    fixture.sign_in("new@example.com").await;
    let snapshot = fixture.state.session.snapshot();
    assert!(snapshot.signed_in());
    assert_eq!(snapshot.green_name, "");
}

#[tokio::test]
async fn test_auth_watcher_re_resolves_on_state_change() {
    let fixture = TestFixture::new().await;
    let _watcher = fixture.state.session.spawn_watcher();

    fixture
        .state
        .account
        .sign_up("watch@example.com", "password123")
        .await
        .unwrap();
    fixture
        .state
        .client
        .sign_in("watch@example.com", "password123")
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(fixture.state.session.snapshot().signed_in());

    fixture.state.client.sign_out().await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!fixture.state.session.snapshot().signed_in());
}

#[tokio::test]
async fn test_blank_community_name_rejected_locally() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("maker@example.com").await;

    let before = fixture.requests();
    let result = fixture.state.communities.create("   ", "desc").await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(fixture.requests(), before);
}

#[tokio::test]
async fn test_blank_challenge_title_rejected_locally() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("setter@example.com").await;

    let before = fixture.requests();
    let result = fixture.state.challenges.create("   ", "desc").await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(fixture.requests(), before);
}

#[tokio::test]
async fn test_create_community_records_owner_membership() {
    let fixture = TestFixture::new().await;
    let user_id = fixture.sign_in("owner@example.com").await;

    let id = fixture
        .state
        .communities
        .create("  Beach Cleanup Crew ", " Weekly shore cleanups ")
        .await
        .unwrap();

    let communities = fixture.rows("communities");
    assert_eq!(communities.len(), 1);
    assert_eq!(communities[0]["name"], "Beach Cleanup Crew");
    assert_eq!(communities[0]["description"], "Weekly shore cleanups");
    assert_eq!(communities[0]["created_by"], json!(user_id));

    let members = fixture.rows("community_members");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["community_id"], json!(id));
    assert_eq!(members[0]["user_id"], json!(user_id));
    assert_eq!(members[0]["role"], "owner");
}

#[tokio::test]
async fn test_community_search_matches_case_insensitive_substring() {
    let fixture = TestFixture::new().await;
    fixture.seed(
        "communities",
        json!({
            "id": Uuid::new_v4(),
            "name": "Beach Cleanup Crew",
            "description": null,
            "created_at": "2026-08-01T10:00:00Z",
        }),
    );
    fixture.seed(
        "communities",
        json!({
            "id": Uuid::new_v4(),
            "name": "Mountain Hikers",
            "description": null,
            "created_at": "2026-08-02T10:00:00Z",
        }),
    );

    let results = fixture.state.communities.search("beach").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "Beach Cleanup Crew");
}

#[tokio::test]
async fn test_community_search_empty_query_short_circuits() {
    let fixture = TestFixture::new().await;
    fixture.seed(
        "communities",
        json!({
            "id": Uuid::new_v4(),
            "name": "Urban Gardeners",
            "description": null,
            "created_at": "2026-08-01T10:00:00Z",
        }),
    );

    let before = fixture.requests();
    let results = fixture.state.communities.search("   ").await.unwrap();
    assert!(results.is_empty());
    assert_eq!(fixture.requests(), before);
}

#[tokio::test]
async fn test_challenge_search_empty_query_browses_newest_first() {
    let fixture = TestFixture::new().await;
    fixture.seed(
        "challenges",
        json!({
            "id": Uuid::new_v4(),
            "title": "Zero Waste Week",
            "description": null,
            "created_at": "2026-08-01T10:00:00Z",
        }),
    );
    fixture.seed(
        "challenges",
        json!({
            "id": Uuid::new_v4(),
            "title": "Bike to Work",
            "description": null,
            "created_at": "2026-08-05T10:00:00Z",
        }),
    );

    let results = fixture.state.challenges.search("").await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, "Bike to Work");
    assert_eq!(results[1].title, "Zero Waste Week");
}

#[tokio::test]
async fn test_duplicate_join_rejected_remotely() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("joiner@example.com").await;

    let community_id = Uuid::new_v4();
    fixture.seed(
        "communities",
        json!({
            "id": community_id,
            "name": "Solar Co-op",
            "description": null,
            "created_at": "2026-08-01T10:00:00Z",
        }),
    );

    fixture.state.communities.join(community_id).await.unwrap();
    let second = fixture.state.communities.join(community_id).await;
    match second {
        Err(AppError::Remote { status, .. }) => assert_eq!(status, 409),
        other => panic!("expected remote conflict, got {:?}", other.err()),
    }
    assert_eq!(fixture.rows("community_members").len(), 1);
}

#[tokio::test]
async fn test_membership_failure_leaves_entity_row() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("unlucky@example.com").await;
    fixture.mock.lock().unwrap().fail_membership_insert = true;

    let result = fixture
        .state
        .communities
        .create("Compost Collective", "")
        .await;
    assert!(matches!(result, Err(AppError::Remote { .. })));

    // First insert landed, second failed, nothing is rolled back.
    assert_eq!(fixture.rows("communities").len(), 1);
    assert!(fixture.rows("community_members").is_empty());
}

#[tokio::test]
async fn test_challenge_complete_stamps_completion() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("runner@example.com").await;

    let id = fixture
        .state
        .challenges
        .create("Plastic-Free July", "")
        .await
        .unwrap();

    let mine = fixture.state.challenges.list_mine().await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].status.as_str(), "joined");
    assert!(mine[0].completed_at.is_none());
    assert_eq!(
        mine[0].challenges.as_ref().unwrap().title,
        "Plastic-Free July"
    );

    fixture.state.challenges.complete(id).await.unwrap();
    let mine = fixture.state.challenges.list_mine().await.unwrap();
    assert_eq!(mine[0].status.as_str(), "completed");
    let first_stamp = mine[0].completed_at.expect("completed_at not stamped");

    // Completing again re-stamps; the status stays completed.
    fixture.state.challenges.complete(id).await.unwrap();
    let mine = fixture.state.challenges.list_mine().await.unwrap();
    assert_eq!(mine[0].status.as_str(), "completed");
    assert!(mine[0].completed_at.unwrap() >= first_stamp);
}

#[tokio::test]
async fn test_post_requires_caption_or_image() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("poster@example.com").await;

    let before = fixture.requests();
    let result = fixture.state.feed.create_post("   ", None).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(fixture.requests(), before);
}

#[tokio::test]
async fn test_caption_only_post_has_no_image() {
    let fixture = TestFixture::new().await;
    let user_id = fixture.sign_in("poster@example.com").await;

    fixture
        .state
        .feed
        .create_post("Planted a tree today", None)
        .await
        .unwrap();

    let posts = fixture.rows("posts");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["caption"], "Planted a tree today");
    assert_eq!(posts[0]["image_url"], Value::Null);
    assert_eq!(posts[0]["user_id"], json!(user_id));
}

#[tokio::test]
async fn test_image_post_uploads_and_links_public_url() {
    let fixture = TestFixture::new().await;
    let user_id = fixture.sign_in("photographer@example.com").await;

    let image = PostImage {
        file_name: "my.leaf.png".to_string(),
        content_type: "image/png".to_string(),
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
    };
    fixture.state.feed.create_post("", Some(image)).await.unwrap();

    let posts = fixture.rows("posts");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["caption"], Value::Null);

    let url = posts[0]["image_url"].as_str().unwrap();
    let prefix = format!(
        "{}/storage/v1/object/public/images/{}/",
        fixture.state.config.backend_url, user_id
    );
    assert!(url.starts_with(&prefix), "unexpected image url {}", url);
    assert!(url.ends_with(".png"));

    let objects = fixture.mock.lock().unwrap().objects.clone();
    assert_eq!(objects.len(), 1);
}

#[tokio::test]
async fn test_feed_joins_author_name_with_anonymous_fallback() {
    let fixture = TestFixture::new().await;
    let named = Uuid::new_v4();
    fixture.seed("profiles", json!({ "user_id": named, "green_name": "Sprout" }));
    fixture.seed(
        "posts",
        json!({
            "id": Uuid::new_v4(),
            "user_id": named,
            "caption": "Composting!",
            "image_url": null,
            "created_at": "2026-08-02T10:00:00Z",
        }),
    );
    fixture.seed(
        "posts",
        json!({
            "id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "caption": "No profile yet",
            "image_url": null,
            "created_at": "2026-08-03T10:00:00Z",
        }),
    );

    let posts = fixture.state.feed.list_posts().await.unwrap();
    assert_eq!(posts.len(), 2);
    // Newest first
    assert_eq!(posts[0].author_name(), "Anonymous");
    assert_eq!(posts[1].author_name(), "Sprout");
}

#[tokio::test]
async fn test_change_password_mismatch_rejected_locally() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("careless@example.com").await;

    let before = fixture.requests();
    let result = fixture.state.account.change_password("newpass", "other").await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(fixture.requests(), before);
}

#[tokio::test]
async fn test_change_password_takes_effect() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("rotator@example.com").await;

    fixture
        .state
        .account
        .change_password("fresh-secret", "fresh-secret")
        .await
        .unwrap();

    fixture
        .state
        .account
        .sign_in("rotator@example.com", "fresh-secret")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reset_password_requires_both_fields() {
    let fixture = TestFixture::new().await;

    let before = fixture.requests();
    assert!(matches!(
        fixture.state.account.reset_password("", "").await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        fixture.state.account.reset_password("abc", "def").await,
        Err(AppError::Validation(_))
    ));
    assert_eq!(fixture.requests(), before);
}

#[tokio::test]
async fn test_password_reset_request_is_recorded() {
    let fixture = TestFixture::new().await;

    fixture
        .state
        .account
        .request_password_reset("forgetful@example.com")
        .await
        .unwrap();

    let recovers = fixture.mock.lock().unwrap().recovers.clone();
    assert_eq!(recovers, vec!["forgetful@example.com"]);
}

#[tokio::test]
async fn test_resend_verification_uses_session_email() {
    let fixture = TestFixture::new().await;

    assert!(matches!(
        fixture.state.account.resend_verification().await,
        Err(AppError::Unauthorized(_))
    ));

    fixture.sign_in("unverified@example.com").await;
    fixture.state.account.resend_verification().await.unwrap();

    let resends = fixture.mock.lock().unwrap().resends.clone();
    assert_eq!(resends, vec!["unverified@example.com"]);
}

#[tokio::test]
async fn test_settings_default_then_roundtrip() {
    let fixture = TestFixture::new().await;
    let user_id = fixture.sign_in("tuner@example.com").await;

    let settings = fixture.state.settings.load().await.unwrap();
    assert_eq!(settings.user_id, user_id);
    assert!(settings.email_notifications);
    assert!(!settings.push_notifications);

    fixture.state.settings.save(false, true).await.unwrap();
    let settings = fixture.state.settings.load().await.unwrap();
    assert!(!settings.email_notifications);
    assert!(settings.push_notifications);

    // Saving again updates the single row instead of adding another.
    fixture.state.settings.save(true, true).await.unwrap();
    assert_eq!(fixture.rows("user_settings").len(), 1);
}

#[tokio::test]
async fn test_feedback_validation_and_attribution() {
    let fixture = TestFixture::new().await;

    let before = fixture.requests();
    assert!(matches!(
        fixture.state.settings.submit_feedback("  ").await,
        Err(AppError::Validation(_))
    ));
    assert_eq!(fixture.requests(), before);

    // Anonymous feedback carries no user id.
    fixture
        .state
        .settings
        .submit_feedback("Love the app")
        .await
        .unwrap();
    let rows = fixture.rows("feedback");
    assert_eq!(rows[0]["user_id"], Value::Null);
    assert_eq!(rows[0]["content"], "Love the app");

    // Signed-in feedback is attributed.
    let user_id = fixture.sign_in("fan@example.com").await;
    fixture
        .state
        .settings
        .submit_feedback("Even better now")
        .await
        .unwrap();
    let rows = fixture.rows("feedback");
    assert_eq!(rows[1]["user_id"], json!(user_id));

    // The text is stored exactly as entered, surrounding whitespace included.
    fixture
        .state
        .settings
        .submit_feedback("  dark mode please \n")
        .await
        .unwrap();
    let rows = fixture.rows("feedback");
    assert_eq!(rows[2]["content"], "  dark mode please \n");
}

#[tokio::test]
async fn test_account_deletion_is_local_stub() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("leaver@example.com").await;

    let before = fixture.requests();
    let message = fixture.state.account.request_account_deletion();
    assert!(message.contains("not yet available"));
    assert_eq!(fixture.requests(), before);
}

#[tokio::test]
async fn test_profile_overview_counts_posts() {
    let fixture = TestFixture::new().await;
    let user_id = fixture.sign_in("gardener@example.com").await;
    fixture.seed(
        "profiles",
        json!({ "user_id": user_id, "green_name": "Gardener", "bio": "Soil nerd" }),
    );

    fixture.state.feed.create_post("First", None).await.unwrap();
    fixture.state.feed.create_post("Second", None).await.unwrap();

    let overview = fixture.state.profile.load().await.unwrap();
    assert_eq!(overview.green_name, "Gardener");
    assert_eq!(overview.bio, "Soil nerd");
    assert_eq!(overview.posts_count, 2);
}

#[tokio::test]
async fn test_save_bio_preserves_green_name() {
    let fixture = TestFixture::new().await;
    let user_id = fixture.sign_in("writer@example.com").await;
    fixture.seed(
        "profiles",
        json!({ "user_id": user_id, "green_name": "Writer" }),
    );

    fixture
        .state
        .profile
        .save_bio("  Love composting  ")
        .await
        .unwrap();

    let profiles = fixture.rows("profiles");
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0]["green_name"], "Writer");
    assert_eq!(profiles[0]["bio"], "Love composting");
}

#[tokio::test]
async fn test_sign_out_resets_session() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("transient@example.com").await;
    assert!(fixture.state.session.snapshot().signed_in());

    let snapshot = fixture.state.account.sign_out().await;
    assert!(!snapshot.signed_in());
    assert!(fixture.state.client.session_identity().is_none());
}

#[tokio::test]
async fn test_operations_require_sign_in() {
    let fixture = TestFixture::new().await;

    assert!(matches!(
        fixture.state.communities.create("Name", "").await,
        Err(AppError::Unauthorized(_))
    ));
    assert!(matches!(
        fixture.state.challenges.join(Uuid::new_v4()).await,
        Err(AppError::Unauthorized(_))
    ));
    assert!(matches!(
        fixture.state.feed.create_post("hi", None).await,
        Err(AppError::Unauthorized(_))
    ));
    assert!(matches!(
        fixture.state.settings.load().await,
        Err(AppError::Unauthorized(_))
    ));
    assert!(matches!(
        fixture.state.profile.load().await,
        Err(AppError::Unauthorized(_))
    ));
    assert_eq!(fixture.requests(), 0);
}
