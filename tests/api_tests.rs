use std::sync::Arc;

use arcade_back::{
    config::AppConfig,
    dao::arcade_store::memory::MemoryArcadeStore,
    routes,
    state::AppState,
};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpListener;

const PASSWORD: &str = "Str0ng!pw";

struct TestApp {
    base: String,
    client: Client,
}

impl TestApp {
    async fn spawn() -> Self {
        let state = AppState::new(AppConfig::default());
        state.set_store(Arc::new(MemoryArcadeStore::new())).await;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, routes::app(state)).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut request = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            request = request.header("X-Session-Token", token);
        }
        let response = request.send().await.unwrap();
        (response.status(), response.json().await.unwrap())
    }

    async fn put(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .client
            .put(self.url(path))
            .header("X-Session-Token", token)
            .json(&body)
            .send()
            .await
            .unwrap();
        (response.status(), response.json().await.unwrap())
    }

    async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        let response = request.send().await.unwrap();
        (response.status(), response.json().await.unwrap())
    }

    /// Sign up and log in, returning `(uid, token)`.
    async fn register(&self, username: &str, email: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/signup",
                None,
                json!({"username": username, "email": email, "password": PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let (status, body) = self
            .post("/login", None, json!({"email": email, "password": PASSWORD}))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        (
            body["data"]["uid"].as_str().unwrap().to_owned(),
            body["data"]["token"].as_str().unwrap().to_owned(),
        )
    }
}

#[tokio::test]
async fn signup_then_login_flow() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post(
            "/signup",
            None,
            json!({"username": "ann", "email": "a@x.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Signup successful");
    let uid = body["data"]["uid"].as_str().unwrap().to_owned();
    assert!(uid.starts_with("ann#"));

    let (status, body) = app
        .post("/login", None, json!({"email": "a@x.com", "password": "wrong-pass"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid password");

    let (status, body) = app
        .post("/login", None, json!({"email": "a@x.com", "password": PASSWORD}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["data"]["uid"], uid.as_str());
    let token = body["data"]["token"].as_str().unwrap().to_owned();

    let (status, body) = app.get("/is-authenticated", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["uid"], uid.as_str());

    let (status, body) = app.get("/login", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Already logged in");

    let (status, body) = app.post("/logout", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logout successful");

    let (status, body) = app.get("/is-authenticated", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authenticated");
}

#[tokio::test]
async fn missing_fields_are_reported_uniformly() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post("/signup", None, json!({"username": "ann", "email": "a@x.com"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields");

    let (status, body) = app
        .post(
            "/signup",
            None,
            json!({"username": "ann", "email": "a@x.com", "password": ""}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields");
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get("/friend", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authenticated");

    let (status, _) = app.get("/chess/leaderboard", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bot_match_updates_player_counters() {
    let app = TestApp::spawn().await;
    let (uid, token) = app.register("ann", "a@x.com").await;

    let (status, body) = app
        .post(
            "/pong/games",
            Some(&token),
            json!({
                "player1_uid": uid,
                "player2_uid": "AM",
                "mode": "bot",
                "p1_score": 5,
                "p2_score": 3
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Match saved successfully");
    assert_eq!(body["data"]["bot_name"], "AM");
    assert!(body["data"]["player2_uid"].is_null());

    let encoded = uid.replace('#', "%23");
    let (status, body) = app
        .get(&format!("/pong/info?uid={encoded}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Pong player info retrieved");
    let stats = &body["data"];
    assert_eq!(stats["PVEP"], 1);
    assert_eq!(stats["PVEW"], 1);
    assert_eq!(stats["TOTP"], 1);
    assert_eq!(stats["TOTW"], 1);
    assert_eq!(stats["PVPP"], 0);

    let (status, body) = app.get("/pong/games", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Pong matches retrieved");
    assert_eq!(body["data"][0]["player2_name"], "AM");

    let (status, body) = app.get("/tris/games", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No Tris matches found");
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn friend_requests_cannot_be_duplicated() {
    let app = TestApp::spawn().await;
    let (ann, ann_token) = app.register("ann", "a@x.com").await;
    let (bob, bob_token) = app.register("bob", "b@x.com").await;

    let (status, body) = app
        .post(
            "/friend/request",
            Some(&ann_token),
            json!({"emitter-uid": ann, "receiver-uid": bob}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Friend request sent");

    let (status, body) = app
        .post(
            "/friend/request",
            Some(&bob_token),
            json!({"emitter-uid": bob, "receiver-uid": ann}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Friend request already exists");

    let (status, body) = app
        .put(
            "/friend/request",
            &bob_token,
            json!({"emitter-uid": ann, "status": "accepted"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Friend request updated to accepted");

    let (_, body) = app.get("/friend", Some(&ann_token)).await;
    assert_eq!(body["data"][0]["uid"], bob.as_str());
    let (_, body) = app.get("/friend", Some(&bob_token)).await;
    assert_eq!(body["data"][0]["uid"], ann.as_str());

    let (_, body) = app.get("/friend/request", Some(&ann_token)).await;
    assert_eq!(body["message"], "No friend requests found");
}

#[tokio::test]
async fn leaderboard_is_public_and_sorted() {
    let app = TestApp::spawn().await;
    let (ann, ann_token) = app.register("ann", "a@x.com").await;
    let (bob, _) = app.register("bob", "b@x.com").await;

    let (_, body) = app.get("/tris/leaderboard", None).await;
    assert_eq!(body["message"], "No players found for Tris leaderboard");

    for (p1, p2) in [(1, 2), (0, 3), (4, 1)] {
        let (status, body) = app
            .post(
                "/tris/games",
                Some(&ann_token),
                json!({
                    "player1_uid": ann,
                    "player2_uid": bob,
                    "mode": "local",
                    "p1_score": p1,
                    "p2_score": p2
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (status, body) = app.get("/tris/leaderboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Tris leaderboard retrieved");
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["player_uid"], bob.as_str());
    assert_eq!(entries[0]["TOTW"], 2);
    assert_eq!(entries[1]["TOTW"], 1);
    assert_eq!(entries[1]["TOTP"], 3);
}

#[tokio::test]
async fn healthcheck_reports_ok_with_memory_store() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get("/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn login_with_open_session_ignores_the_body() {
    let app = TestApp::spawn().await;
    let (uid, token) = app.register("ann", "a@x.com").await;

    let (status, body) = app.post("/login", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Already logged in");
    assert_eq!(body["data"]["uid"], uid.as_str());
    assert_eq!(body["data"]["token"], token.as_str());

    let (status, body) = app.post("/login", None, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields");
}

#[tokio::test]
async fn user_info_update_reports_image_changes() {
    let app = TestApp::spawn().await;
    let (uid, token) = app.register("ann", "a@x.com").await;

    let (status, body) = app
        .put("/user-info", &token, json!({"image": "images/cat.png"}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "User image updated successfully");
    assert_eq!(body["data"]["image_url"], "images/cat.png");

    let (status, body) = app
        .put("/user-info", &token, json!({"description": "likes pong"}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "User info updated successfully");
    assert!(body.get("data").is_none());

    let encoded = uid.replace('#', "%23");
    let (_, body) = app
        .get(&format!("/user-info?uid={encoded}"), Some(&token))
        .await;
    assert_eq!(body["data"]["image"], "images/cat.png");
    assert_eq!(body["data"]["description"], "likes pong");
}

#[tokio::test]
async fn guest_login_accepts_only_another_account() {
    let app = TestApp::spawn().await;
    let (_, ann_token) = app.register("ann", "a@x.com").await;
    let (bob, _) = app.register("bob", "b@x.com").await;

    let (status, body) = app
        .post(
            "/login-guest",
            Some(&ann_token),
            json!({"email": "b@x.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Guest login successful");
    assert_eq!(body["data"]["uid"], bob.as_str());

    let (status, body) = app
        .post(
            "/login-guest",
            Some(&ann_token),
            json!({"email": "a@x.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot log in as yourself");

    let (status, body) = app
        .post(
            "/login-guest",
            Some(&ann_token),
            json!({"email": "nobody@x.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Invalid email");

    let (status, _) = app
        .post(
            "/login-guest",
            None,
            json!({"email": "b@x.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn player_search_excludes_the_caller() {
    let app = TestApp::spawn().await;
    let (_, ann_token) = app.register("ann", "a@x.com").await;
    let (anabel, _) = app.register("anabel", "an@x.com").await;
    app.register("bob", "b@x.com").await;

    let (status, body) = app.get("/search-player?username=AN", Some(&ann_token)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Players found");
    assert_eq!(body["data"], json!([{"uid": anabel}]));

    let (status, body) = app.get("/search-player", Some(&ann_token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username is required");
}

#[tokio::test]
async fn tournament_win_needs_an_existing_profile() {
    let app = TestApp::spawn().await;
    let (uid, token) = app.register("ann", "a@x.com").await;

    let (status, body) = app.post("/pong/info", Some(&token), json!({"uid": uid})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Pong player not found");

    let encoded = uid.replace('#', "%23");
    let (status, _) = app
        .get(&format!("/pong/info?uid={encoded}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post("/pong/info", Some(&token), json!({"uid": uid})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Tournament win recorded successfully");
    assert_eq!(body["data"]["TW"], 1);
    assert_eq!(body["data"]["TOTP"], 0);
}
