use axum::extract::FromRequestParts;
use axum::http::{Request, StatusCode};
use learnhub_api::middleware::error_handling::AppError;
use learnhub_api::middleware::identity::CallerId;
use learnhub_core::errors::LearnError;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case(LearnError::NotFound("event 7".to_string()), StatusCode::NOT_FOUND)]
#[case(LearnError::Validation("bad dates".to_string()), StatusCode::BAD_REQUEST)]
#[case(LearnError::Forbidden("admin only".to_string()), StatusCode::FORBIDDEN)]
#[case(LearnError::Conflict("already registered".to_string()), StatusCode::CONFLICT)]
#[case(LearnError::Database(eyre::eyre!("pool closed")), StatusCode::INTERNAL_SERVER_ERROR)]
fn test_error_status_mapping(#[case] error: LearnError, #[case] expected: StatusCode) {
    use axum::response::IntoResponse;

    let response = AppError(error).into_response();
    assert_eq!(response.status(), expected);
}

#[test]
fn test_eyre_reports_convert_to_internal_errors() {
    use axum::response::IntoResponse;

    let report = eyre::eyre!("connection refused");
    let response = AppError::from(report).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

async fn extract_caller(header: Option<&str>) -> Result<CallerId, AppError> {
    let mut builder = Request::builder().uri("/api/events");
    if let Some(value) = header {
        builder = builder.header("X-User-Id", value);
    }
    let (mut parts, ()) = builder.body(()).unwrap().into_parts();
    CallerId::from_request_parts(&mut parts, &()).await
}

#[tokio::test]
async fn test_caller_id_parses_the_header() {
    let caller = extract_caller(Some("42")).await.unwrap();
    assert_eq!(caller, CallerId(42));
}

#[tokio::test]
async fn test_caller_id_trims_whitespace() {
    let caller = extract_caller(Some(" 7 ")).await.unwrap();
    assert_eq!(caller, CallerId(7));
}

#[tokio::test]
async fn test_missing_header_is_rejected() {
    assert!(extract_caller(None).await.is_err());
}

#[rstest]
#[case("zero")]
#[case("0")]
#[case("-9")]
#[case("4.5")]
#[tokio::test]
async fn test_invalid_header_values_are_rejected(#[case] value: &str) {
    assert!(extract_caller(Some(value)).await.is_err());
}
