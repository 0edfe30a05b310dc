use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};
use staff_cell::router::staff_routes;

async fn create_test_app(mock_server: &MockServer) -> (Router, String) {
    let mut config: AppConfig = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::staff("frontdesk@udipsai.test");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    (staff_routes(Arc::new(config)), token)
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn get_professional_returns_the_record() {
    let mock_server = MockServer::start().await;
    let (app, token) = create_test_app(&mock_server).await;

    let professional_id = Uuid::new_v4();
    let specialty_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/profesionales"))
        .and(query_param("id", format!("eq.{}", professional_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::specialist_response(
                &professional_id.to_string(),
                &specialty_id.to_string(),
                "Dr. Test",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri(format!("/professionals/{}", professional_id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["kind"], json!("specialist"));
    assert_eq!(body["full_name"], json!("Dr. Test"));
}

#[tokio::test]
async fn unknown_professional_is_a_404() {
    let mock_server = MockServer::start().await;
    let (app, token) = create_test_app(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profesionales"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri(format!("/professionals/{}", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn professional_search_filters_by_kind() {
    let mock_server = MockServer::start().await;
    let (app, token) = create_test_app(&mock_server).await;

    let specialty_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/profesionales"))
        .and(query_param("kind", "eq.intern"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::intern_response(
                &Uuid::new_v4().to_string(),
                &specialty_id.to_string(),
                "Intern Test",
                "2025-01-01",
                "2025-06-30",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/professionals/search?kind=intern")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["professionals"][0]["kind"], json!("intern"));
}

#[tokio::test]
async fn specialties_listing_returns_active_areas() {
    let mock_server = MockServer::start().await;
    let (app, token) = create_test_app(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/especialidades"))
        .and(query_param("active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::specialty_response(&Uuid::new_v4().to_string(), "Fonoaudiologia"),
            MockSupabaseResponses::specialty_response(&Uuid::new_v4().to_string(), "Psicologia"),
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/specialties")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}
