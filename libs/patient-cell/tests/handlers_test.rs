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

use patient_cell::router::patient_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

async fn create_test_app(mock_server: &MockServer, user: &TestUser) -> (Router, String) {
    let mut config: AppConfig = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let token = JwtTestUtils::create_test_token(user, &config.supabase_jwt_secret, Some(24));

    (patient_routes(Arc::new(config)), token)
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_patient_succeeds_for_new_cedula() {
    let mock_server = MockServer::start().await;
    let user = TestUser::staff("frontdesk@udipsai.test");
    let (app, token) = create_test_app(&mock_server, &user).await;

    let patient_id = Uuid::new_v4();

    // Cedula pre-check finds nothing.
    Mock::given(method("GET"))
        .and(path("/rest/v1/pacientes"))
        .and(query_param("cedula", "eq.0912345678"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/pacientes"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::patient_response(
                &patient_id.to_string(),
                "0912345678",
                "New Patient",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "cedula": "0912345678",
                "full_name": "New Patient",
                "birth_date": "2015-03-10",
                "guardian_name": "Test Guardian"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["patient"]["cedula"], json!("0912345678"));
}

#[tokio::test]
async fn create_patient_with_existing_cedula_is_a_conflict() {
    let mock_server = MockServer::start().await;
    let user = TestUser::staff("frontdesk@udipsai.test");
    let (app, token) = create_test_app(&mock_server, &user).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/pacientes"))
        .and(query_param("cedula", "eq.0912345678"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_response(
                &Uuid::new_v4().to_string(),
                "0912345678",
                "Existing Patient",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "cedula": "0912345678",
                "full_name": "New Patient"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn get_patient_by_cedula_returns_the_record() {
    let mock_server = MockServer::start().await;
    let user = TestUser::staff("frontdesk@udipsai.test");
    let (app, token) = create_test_app(&mock_server, &user).await;

    let patient_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/pacientes"))
        .and(query_param("cedula", "eq.0912345678"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_response(
                &patient_id.to_string(),
                "0912345678",
                "Test Patient",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/by-cedula/0912345678")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["id"], json!(patient_id.to_string()));
}

#[tokio::test]
async fn unknown_patient_is_a_404() {
    let mock_server = MockServer::start().await;
    let user = TestUser::staff("frontdesk@udipsai.test");
    let (app, token) = create_test_app(&mock_server, &user).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/pacientes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri(format!("/{}", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_admins_may_deactivate_patients() {
    let mock_server = MockServer::start().await;
    let user = TestUser::staff("frontdesk@udipsai.test");
    let (app, token) = create_test_app(&mock_server, &user).await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/{}", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deactivation_is_a_logical_delete() {
    let mock_server = MockServer::start().await;
    let user = TestUser::admin("admin@udipsai.test");
    let (app, token) = create_test_app(&mock_server, &user).await;

    let patient_id = Uuid::new_v4();
    let mut deactivated =
        MockSupabaseResponses::patient_response(&patient_id.to_string(), "0912345678", "Test Patient");
    deactivated["active"] = json!(false);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/pacientes"))
        .and(query_param("id", format!("eq.{}", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([deactivated])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/{}", patient_id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["patient"]["active"], json!(false));
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let mock_server = MockServer::start().await;
    let user = TestUser::staff("frontdesk@udipsai.test");
    let (app, _token) = create_test_app(&mock_server, &user).await;

    let config = TestConfig::default();
    let expired = JwtTestUtils::create_expired_token(&user, &config.jwt_secret);

    let request = Request::builder()
        .method("GET")
        .uri(format!("/{}", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", expired))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
