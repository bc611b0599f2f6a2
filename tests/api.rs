//! API endpoint integration tests

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use mini_brain::dialogue::PipelineOptions;
use mini_brain::dialogue::reply::templates;
use mini_brain::{ApiServerBuilder, ConversationRepo, LanguageChoice, LanguageTag};

mod common;
use common::{BrokenSynthesizer, ToneSynthesizer, pipeline_builder, setup_test_db};

/// Build a test API router around a deterministic pipeline
fn build_test_router(dir: &tempfile::TempDir) -> axum::Router {
    ApiServerBuilder::new(pipeline_builder(dir).build())
        .build()
        .router()
}

fn post_api(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_root_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = ApiServerBuilder::new(pipeline_builder(&dir).build())
        .voice_profile("friday_female_uk")
        .build()
        .router();

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["voice_profile"], "friday_female_uk");
    assert!(json["status"].is_string());
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_api_time_query() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(&dir);

    let response = app
        .oneshot(post_api(&json!({"input": "What time is it?", "lang": "auto"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["reply"], "The current time is 03:07 PM.");
    assert_eq!(json["mood"], "neutral");
    assert_eq!(json["lang"], "en");
    assert!(json["audio_url"].is_null());
    assert_eq!(json["voice_profile"], "friday_female_uk");
}

#[tokio::test]
async fn test_api_sad_input() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(&dir);

    let response = app
        .oneshot(post_api(&json!({"input": "I am so sad today"})))
        .await
        .unwrap();

    let json = json_body(response).await;
    assert_eq!(json["mood"], "sad");
    assert_eq!(json["reply"], templates::SAD.en);
}

#[tokio::test]
async fn test_api_missing_lang_uses_configured_default() {
    let dir = tempfile::tempdir().unwrap();
    let app = ApiServerBuilder::new(pipeline_builder(&dir).build())
        .default_language(LanguageChoice::Explicit(LanguageTag::Hi))
        .build()
        .router();

    let response = app
        .oneshot(post_api(&json!({"input": "how are you"})))
        .await
        .unwrap();

    let json = json_body(response).await;
    assert_eq!(json["lang"], "hi");
    assert_eq!(json["reply"], templates::HOW_ARE_YOU.hi);
}

#[tokio::test]
async fn test_api_unknown_lang_falls_back_to_detection() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(&dir);

    let response = app
        .oneshot(post_api(&json!({"input": "tell me a joke", "lang": "fr"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["lang"], "en");
    assert_eq!(json["reply"], templates::JOKES[0].en);
}

#[tokio::test]
async fn test_api_empty_input_rejected() {
    let dir = tempfile::tempdir().unwrap();

    for body in [json!({"input": ""}), json!({"input": "   "}), json!({})] {
        let response = build_test_router(&dir)
            .oneshot(post_api(&body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "invalid_input");
    }
}

#[tokio::test]
async fn test_api_malformed_body_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(&dir);

    let request = Request::builder()
        .method("POST")
        .uri("/api")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "invalid_input");
}

#[tokio::test]
async fn test_audio_round_trip_through_http() {
    let dir = tempfile::tempdir().unwrap();
    let app = ApiServerBuilder::new(
        pipeline_builder(&dir)
            .synthesizer(Arc::new(ToneSynthesizer))
            .build(),
    )
    .build()
    .router();

    let response = app
        .clone()
        .oneshot(post_api(&json!({"input": "sing"})))
        .await
        .unwrap();
    let json = json_body(response).await;
    let audio_url = json["audio_url"].as_str().expect("audio_url present");
    assert!(audio_url.starts_with("/audio/"));

    let response = app.oneshot(get(audio_url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], templates::SING.en.as_bytes());
}

#[tokio::test]
async fn test_audio_url_uses_public_base() {
    let dir = tempfile::tempdir().unwrap();
    let app = ApiServerBuilder::new(
        pipeline_builder(&dir)
            .synthesizer(Arc::new(ToneSynthesizer))
            .build(),
    )
    .public_base_url("https://mini.example.com")
    .build()
    .router();

    let response = app
        .oneshot(post_api(&json!({"input": "hello"})))
        .await
        .unwrap();
    let json = json_body(response).await;
    assert!(
        json["audio_url"]
            .as_str()
            .unwrap()
            .starts_with("https://mini.example.com/audio/")
    );
}

#[tokio::test]
async fn test_audio_unknown_or_invalid_id() {
    let dir = tempfile::tempdir().unwrap();

    for uri in ["/audio/1700000000000-missing", "/audio/name.mp3", "/audio/..%2F..%2Fetc"] {
        let response = build_test_router(&dir).oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri {uri}");
        assert_eq!(json_body(response).await["error"]["code"], "not_found");
    }
}

#[tokio::test]
async fn test_synthesis_failure_still_replies() {
    let dir = tempfile::tempdir().unwrap();
    let app = ApiServerBuilder::new(
        pipeline_builder(&dir)
            .synthesizer(Arc::new(BrokenSynthesizer))
            .build(),
    )
    .build()
    .router();

    let response = app
        .oneshot(post_api(&json!({"input": "who are you"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["reply"], templates::IDENTITY.en);
    assert!(json["audio_url"].is_null());
}

#[tokio::test]
async fn test_strict_synthesis_failure_is_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let app = ApiServerBuilder::new(
        pipeline_builder(&dir)
            .synthesizer(Arc::new(BrokenSynthesizer))
            .options(PipelineOptions {
                audio_enabled: true,
                strict_synthesis: true,
            })
            .build(),
    )
    .build()
    .router();

    let response = app
        .oneshot(post_api(&json!({"input": "who are you"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["error"]["code"], "synthesis_failed");
}

#[tokio::test]
async fn test_health_without_collaborators() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(&dir);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["persistence"], false);
    assert_eq!(json["synthesis"], false);
}

#[tokio::test]
async fn test_health_with_collaborators() {
    let dir = tempfile::tempdir().unwrap();
    let repo = ConversationRepo::new(setup_test_db());
    let app = ApiServerBuilder::new(
        pipeline_builder(&dir)
            .synthesizer(Arc::new(ToneSynthesizer))
            .conversation_store(Arc::new(repo.clone()))
            .build(),
    )
    .repo(repo)
    .build()
    .router();

    let json = json_body(app.oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(json["persistence"], true);
    assert_eq!(json["synthesis"], true);
}

#[tokio::test]
async fn test_conversation_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let repo = ConversationRepo::new(setup_test_db());
    let app = ApiServerBuilder::new(
        pipeline_builder(&dir)
            .conversation_store(Arc::new(repo.clone()))
            .build(),
    )
    .build()
    .router();

    let response = app
        .oneshot(post_api(&json!({"input": "what is the date"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The write happens in the background
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while repo.count().unwrap() == 0 {
        assert!(tokio::time::Instant::now() < deadline, "conversation not persisted");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let rows = repo.recent(1).unwrap();
    assert_eq!(rows[0].utterance, "what is the date");
    assert_eq!(rows[0].reply, "Today's date is Monday, October 19, 2026.");
    assert_eq!(rows[0].language, "en");
    assert_eq!(rows[0].mood, "neutral");
}
