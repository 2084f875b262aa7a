//! End-to-end tests: the real router on an ephemeral port, backed by the
//! in-memory store

use common::{
    memory::MemoryStore,
    models::{AuthUser, CaptionRecord, ImageRecord, RecordId, Session, VoteValue},
};
use reqwest::{StatusCode, header::LOCATION, redirect::Policy};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;
use views::voting::{SIGN_IN_TO_VOTE, VOTE_FAILED, VOTE_RECORDED};

use crate::{
    auth::{
        cookies::{ACCESS_COOKIE, REFRESH_COOKIE, VERIFIER_COOKIE},
        relay::RELAY_COOKIE,
    },
    captions::DeckResponse,
    config::WebConfig,
    gallery::ImagePage,
    routes::create_router,
    state::AppState,
};

const SITE: &str = "http://localhost:3000";

struct TestServer {
    base: String,
    http: reqwest::Client,
}

impl TestServer {
    async fn start(store: &MemoryStore) -> Self {
        let settings = WebConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            site_url: SITE.to_string(),
            session_cookie_max_age_secs: 3600,
        };
        let state = AppState {
            auth: Arc::new(store.clone()),
            data: Arc::new(store.clone()),
            verifier: None,
            settings: Arc::new(settings),
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, create_router(state)).await.unwrap();
        });

        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .unwrap();

        Self {
            base: format!("http://{addr}"),
            http,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.get(format!("{}{}", self.base, path))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.post(format!("{}{}", self.base, path))
    }
}

fn rater() -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        email: Some("rater@example.com".to_string()),
    }
}

fn session_cookie(session: &Session) -> String {
    format!(
        "{ACCESS_COOKIE}={}; {REFRESH_COOKIE}={}",
        session.access_token, session.refresh_token
    )
}

fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

fn cookies_named<'a>(cookies: &'a [String], name: &str) -> Vec<&'a str> {
    let prefix = format!("{name}=");
    cookies
        .iter()
        .filter(|cookie| cookie.starts_with(&prefix))
        .map(String::as_str)
        .collect()
}

fn location(response: &reqwest::Response) -> &str {
    response.headers()[LOCATION].to_str().unwrap()
}

fn assert_cleared(cookies: &[String], name: &str) {
    let written = cookies_named(cookies, name);
    assert_eq!(written.len(), 1, "{name} written {} times", written.len());
    assert!(written[0].starts_with(&format!("{name}=;")), "{}", written[0]);
    assert!(written[0].contains("Max-Age=0"), "{}", written[0]);
}

async fn seed_captions(store: &MemoryStore) {
    store
        .add_image(ImageRecord {
            id: RecordId::from(1),
            url: "https://cdn/1.png".to_string(),
            image_description: Some("A black CAT sleeping".to_string()),
        })
        .await;
    for id in ["c1", "c2"] {
        store
            .add_caption(
                CaptionRecord {
                    id: RecordId::from(id),
                    content: Some(format!("caption {id}")),
                    image_id: Some(RecordId::from(1)),
                },
                None,
            )
            .await;
    }
}

#[tokio::test]
async fn health() {
    let store = MemoryStore::new();
    let server = TestServer::start(&store).await;

    let response = server.get("/health").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn bad_code_goes_back_to_login_and_clears_relay() {
    let store = MemoryStore::new();
    let server = TestServer::start(&store).await;

    let response = server
        .get("/auth/callback?code=BAD")
        .header("Cookie", format!("{RELAY_COOKIE}=/list; {VERIFIER_COOKIE}=v"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("{SITE}/login"));

    let cookies = set_cookies(&response);
    assert_cleared(&cookies, RELAY_COOKIE);
    assert_cleared(&cookies, VERIFIER_COOKIE);
    assert!(cookies_named(&cookies, ACCESS_COOKIE).is_empty());
}

#[tokio::test]
async fn good_code_sets_session_and_prefers_query_target() {
    let store = MemoryStore::new();
    store.issue_code("good", rater()).await;
    let server = TestServer::start(&store).await;

    let response = server
        .get("/auth/callback?code=good&next=/list")
        .header(
            "Cookie",
            format!("{RELAY_COOKIE}=/from-cookie; {VERIFIER_COOKIE}=v"),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("{SITE}/list"));

    let cookies = set_cookies(&response);
    let access = cookies_named(&cookies, ACCESS_COOKIE);
    assert_eq!(access.len(), 1);
    assert!(access[0].contains("HttpOnly"));
    assert_eq!(cookies_named(&cookies, REFRESH_COOKIE).len(), 1);
    assert_cleared(&cookies, RELAY_COOKIE);
    assert_cleared(&cookies, VERIFIER_COOKIE);
}

#[tokio::test]
async fn callback_without_code_follows_cookie_target() {
    let store = MemoryStore::new();
    let server = TestServer::start(&store).await;

    let response = server
        .get("/auth/callback")
        .header("Cookie", format!("{RELAY_COOKIE}=/list"))
        .send()
        .await
        .unwrap();

    assert_eq!(location(&response), format!("{SITE}/list"));
    assert_cleared(&set_cookies(&response), RELAY_COOKIE);
}

#[tokio::test]
async fn offsite_targets_fall_back_to_protected() {
    let store = MemoryStore::new();
    let server = TestServer::start(&store).await;

    let response = server
        .get("/auth/callback?next=https://evil.example")
        .send()
        .await
        .unwrap();

    assert_eq!(location(&response), format!("{SITE}/protected"));
}

#[tokio::test]
async fn login_starts_pkce_sign_in() {
    let store = MemoryStore::new();
    let server = TestServer::start(&store).await;

    let response = server.get("/auth/login?next=/list").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let target = location(&response).to_string();
    assert!(target.starts_with("https://auth.test/authorize?provider=google"));
    assert!(target.contains(&format!("redirect_to={SITE}/auth/callback")));
    assert!(target.contains("code_challenge="));

    let cookies = set_cookies(&response);
    let relay = cookies_named(&cookies, RELAY_COOKIE);
    assert_eq!(relay.len(), 1);
    assert!(relay[0].contains("Max-Age=600"));
    assert!(relay[0].contains("SameSite=Lax"));
    assert!(!relay[0].contains("Secure"));
    assert_eq!(cookies_named(&cookies, VERIFIER_COOKIE).len(), 1);
}

#[tokio::test]
async fn login_status_reports_session() {
    let store = MemoryStore::new();
    let session = store.issue_session(rater()).await;
    let server = TestServer::start(&store).await;

    let anonymous: Value = server
        .get("/login?next=elsewhere")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        anonymous,
        json!({ "signed_in": false, "email": null, "next": "/protected" })
    );

    let signed_in: Value = server
        .get("/login")
        .header("Cookie", session_cookie(&session))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(signed_in["signed_in"], true);
    assert_eq!(signed_in["email"], "rater@example.com");
}

#[tokio::test]
async fn protected_redirects_anonymous_users() {
    let store = MemoryStore::new();
    let server = TestServer::start(&store).await;

    let response = server.get("/protected").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("{SITE}/login?next=/protected"));
}

#[tokio::test]
async fn protected_serves_signed_in_users() {
    let store = MemoryStore::new();
    let session = store.issue_session(rater()).await;
    let server = TestServer::start(&store).await;

    let response = server
        .get("/protected")
        .header("Cookie", session_cookie(&session))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "rater@example.com");
}

#[tokio::test]
async fn guard_refreshes_expired_access_token() {
    let store = MemoryStore::new();
    let session = store.issue_session(rater()).await;
    store.expire_access_token(&session.access_token).await;
    let server = TestServer::start(&store).await;

    let response = server
        .get("/protected")
        .header("Cookie", session_cookie(&session))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    let access = cookies_named(&cookies, ACCESS_COOKIE);
    assert_eq!(access.len(), 1);
    assert!(!access[0].contains(&session.access_token));

    let rotated = access[0]
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value.to_string())
        .unwrap();
    assert!(store.is_active(&rotated).await);
}

#[tokio::test]
async fn guard_clears_unusable_session() {
    let store = MemoryStore::new();
    let server = TestServer::start(&store).await;

    let response = server
        .get("/protected")
        .header(
            "Cookie",
            format!("{ACCESS_COOKIE}=stale; {REFRESH_COOKIE}=revoked"),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    let cookies = set_cookies(&response);
    assert_cleared(&cookies, ACCESS_COOKIE);
    assert_cleared(&cookies, REFRESH_COOKIE);
}

#[tokio::test]
async fn static_assets_skip_the_guard() {
    let store = MemoryStore::new();
    let server = TestServer::start(&store).await;

    let response = server
        .get("/static/app.css")
        .header("Cookie", format!("{ACCESS_COOKIE}=stale"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn logout_revokes_and_clears_once() {
    let store = MemoryStore::new();
    let session = store.issue_session(rater()).await;
    let server = TestServer::start(&store).await;

    let response = server
        .post("/auth/logout")
        .header("Cookie", session_cookie(&session))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("{SITE}/login"));
    let cookies = set_cookies(&response);
    assert_cleared(&cookies, ACCESS_COOKIE);
    assert_cleared(&cookies, REFRESH_COOKIE);
    assert!(!store.is_active(&session.access_token).await);
}

#[tokio::test]
async fn images_require_a_session() {
    let store = MemoryStore::new();
    let server = TestServer::start(&store).await;

    let response = server.get("/api/images").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn images_are_paged_and_searchable() {
    let store = MemoryStore::new();
    for id in 1..=25 {
        let description = if id == 3 {
            "A black CAT sleeping".to_string()
        } else {
            format!("A dog {id}")
        };
        store
            .add_image(ImageRecord {
                id: RecordId::from(id),
                url: format!("https://cdn/{id}.png"),
                image_description: Some(description),
            })
            .await;
    }
    let session = store.issue_session(rater()).await;
    let server = TestServer::start(&store).await;

    let first: ImagePage = server
        .get("/api/images")
        .header("Cookie", session_cookie(&session))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first.items.len(), 20);
    assert_eq!(first.items[0].id, RecordId::from(25));
    assert!(first.has_more);

    let second: ImagePage = server
        .get("/api/images?offset=20&search=cat")
        .header("Cookie", session_cookie(&session))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second.offset, 20);
    assert!(!second.has_more);
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].description(), "A black CAT sleeping");
}

#[tokio::test]
async fn images_reject_offsets_past_the_last_row_index() {
    let store = MemoryStore::new();
    let session = store.issue_session(rater()).await;
    let server = TestServer::start(&store).await;

    let response = server
        .get(&format!("/api/images?offset={}", usize::MAX))
        .header("Cookie", session_cookie(&session))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], format!("offset {} is out of range", usize::MAX));

    let last_row = server
        .get(&format!("/api/images?offset={}&limit=1", usize::MAX))
        .header("Cookie", session_cookie(&session))
        .send()
        .await
        .unwrap();
    assert_eq!(last_row.status(), StatusCode::OK);
}

#[tokio::test]
async fn deck_falls_back_to_id_order() {
    let store = MemoryStore::new();
    seed_captions(&store).await;
    store.drop_created_column().await;
    let session = store.issue_session(rater()).await;
    let server = TestServer::start(&store).await;

    let deck: DeckResponse = server
        .get("/api/captions/deck")
        .header("Cookie", session_cookie(&session))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let ids: Vec<&str> = deck.captions.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c2", "c1"]);
    assert_eq!(deck.captions[0].image_url.as_deref(), Some("https://cdn/1.png"));
    assert_eq!(deck.cursor, 0);
    assert_eq!(deck.remaining, 2);
}

#[tokio::test]
async fn revote_keeps_one_row() {
    let store = MemoryStore::new();
    seed_captions(&store).await;
    let session = store.issue_session(rater()).await;
    let server = TestServer::start(&store).await;

    for value in [1, -1] {
        let response = server
            .post("/api/captions/c1/vote")
            .header("Cookie", session_cookie(&session))
            .json(&json!({ "vote_value": value }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], VOTE_RECORDED);
    }

    let votes = store.votes().await;
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].caption_id, RecordId::from("c1"));
    assert_eq!(votes[0].vote_value, VoteValue::Down);
    assert!(votes[0].modified_datetime_utc.is_some());

    let deck: DeckResponse = server
        .get("/api/captions/deck")
        .header("Cookie", session_cookie(&session))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deck.remaining, 1);
    assert_eq!(deck.cursor, 1);
}

#[tokio::test]
async fn repeating_a_vote_is_idempotent() {
    let store = MemoryStore::new();
    seed_captions(&store).await;
    let session = store.issue_session(rater()).await;
    let server = TestServer::start(&store).await;

    for _ in 0..2 {
        let response = server
            .post("/api/captions/c2/vote")
            .header("Cookie", session_cookie(&session))
            .json(&json!({ "vote_value": 1 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let votes = store.votes().await;
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].profile_id, session.user.id);
    assert_eq!(votes[0].caption_id, RecordId::from("c2"));
    assert_eq!(votes[0].vote_value, VoteValue::Up);
    assert_eq!(store.upsert_calls().await, 2);
}

#[tokio::test]
async fn voting_requires_sign_in() {
    let store = MemoryStore::new();
    seed_captions(&store).await;
    let server = TestServer::start(&store).await;

    let response = server
        .post("/api/captions/c1/vote")
        .json(&json!({ "vote_value": 1 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], SIGN_IN_TO_VOTE);
    assert_eq!(store.upsert_calls().await, 0);
}

#[tokio::test]
async fn failed_vote_reports_retry_message() {
    let store = MemoryStore::new();
    seed_captions(&store).await;
    let session = store.issue_session(rater()).await;
    let server = TestServer::start(&store).await;

    let response = server
        .post("/api/captions/missing/vote")
        .header("Cookie", session_cookie(&session))
        .json(&json!({ "vote_value": 1 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], VOTE_FAILED);
    assert!(store.votes().await.is_empty());
}
