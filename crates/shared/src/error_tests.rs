use super::*;

#[test]
fn test_app_error_status_codes() {
    assert_eq!(AppError::NotFound("test".into()).status_code(), 404);
    assert_eq!(AppError::Validation("test".into()).status_code(), 400);
    assert_eq!(AppError::BadRequest("test".into()).status_code(), 400);
    assert_eq!(AppError::Database("test".into()).status_code(), 500);
    assert_eq!(AppError::Internal("test".into()).status_code(), 500);
}

#[test]
fn test_app_error_error_codes() {
    assert_eq!(AppError::NotFound("test".into()).error_code(), "NOT_FOUND");
    assert_eq!(
        AppError::Validation("test".into()).error_code(),
        "VALIDATION_ERROR"
    );
    assert_eq!(AppError::BadRequest("test".into()).error_code(), "BAD_REQUEST");
    assert_eq!(
        AppError::Database("test".into()).error_code(),
        "DATABASE_ERROR"
    );
    assert_eq!(
        AppError::Internal("test".into()).error_code(),
        "INTERNAL_ERROR"
    );
}

#[test]
fn test_app_error_display() {
    assert_eq!(
        AppError::NotFound("account 42".into()).to_string(),
        "Not found: account 42"
    );
    assert_eq!(
        AppError::Validation("amount is zero".into()).to_string(),
        "Validation error: amount is zero"
    );
    assert_eq!(
        AppError::BadRequest("bad uuid".into()).to_string(),
        "Bad request: bad uuid"
    );
    assert_eq!(
        AppError::Database("locked".into()).to_string(),
        "Database error: locked"
    );
    assert_eq!(
        AppError::Internal("boom".into()).to_string(),
        "Internal error: boom"
    );
}

#[test]
fn test_server_error_classification() {
    assert!(AppError::Database(String::new()).is_server_error());
    assert!(AppError::Internal(String::new()).is_server_error());
    assert!(!AppError::NotFound(String::new()).is_server_error());
    assert!(!AppError::Validation(String::new()).is_server_error());
    assert!(!AppError::BadRequest(String::new()).is_server_error());
}
