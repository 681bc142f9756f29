//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no router needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use taskapi_api::error::{status_for, AppError};
use taskapi_api::services::ServiceError;
use taskapi_core::error::{CoreError, ErrorKind};
use taskapi_db::store::StoreError;

/// Convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[test]
fn every_kind_has_one_status() {
    assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
    assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
    assert_eq!(status_for(ErrorKind::NotImplemented), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(status_for(ErrorKind::Internal), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn not_found_error_returns_404_envelope() {
    let (status, json) = error_to_response(AppError::Core(CoreError::NotFound {
        entity: "Role",
        id: 42,
    }))
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Role not found");
    assert_eq!(json["errors"][0], "No role exists with id 42");
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn validation_error_lists_every_message() {
    let err = AppError::Core(CoreError::Validation(vec![
        "Email is required".into(),
        "Password is required".into(),
    ]));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid input data");
    assert_eq!(json["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_name_returns_409() {
    let err = AppError::Service(ServiceError::DuplicateName("Support".into()));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "Data conflict");
    assert_eq!(json["errors"][0], "A role named 'Support' already exists");
}

#[tokio::test]
async fn not_implemented_returns_501() {
    let err = AppError::Service(ServiceError::NotImplemented("User deletion"));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Method not implemented");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::Service(ServiceError::Internal(
        "secret database credentials leaked".into(),
    ));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        !json.to_string().contains("secret"),
        "Internal error response must not leak sensitive details"
    );
    assert_eq!(json["message"], "Internal server error");
    assert_eq!(json["errors"][0], "Contact the system administrator");
}

#[tokio::test]
async fn trigger_conflict_escaping_a_service_is_internal() {
    let err = AppError::Service(ServiceError::Storage(StoreError::TriggerConflict(
        "trg_users_audit blocked OUTPUT".into(),
    )));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!json.to_string().contains("trg_users_audit"));
}

#[tokio::test]
async fn raw_unique_violation_is_a_generic_conflict() {
    let err = AppError::Store(StoreError::UniqueViolation {
        constraint: "uq_users_email".into(),
    });
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(!json.to_string().contains("uq_users_email"));
}
