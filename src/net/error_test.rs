use super::*;

fn unpack(err: ApiError) -> (u16, String, Option<Value>) {
    match err {
        ApiError::Http { status, message, details } => (status, message, details),
        other => panic!("expected Http error, got {other:?}"),
    }
}

// =============================================================================
// http_error
// =============================================================================

#[test]
fn json_envelope_message_and_details() {
    let body = r#"{"error":{"message":"Invalid credentials","details":{"field":"password"},"code":401}}"#;
    let (status, message, details) = unpack(http_error(401, "Unauthorized", "application/json", body));
    assert_eq!(status, 401);
    assert_eq!(message, "Invalid credentials");
    assert_eq!(details, Some(serde_json::json!({ "field": "password" })));
}

#[test]
fn json_content_type_with_charset_still_parsed() {
    let body = r#"{"error":{"message":"User already exists"}}"#;
    let (_, message, details) = unpack(http_error(409, "Conflict", "application/json; charset=utf-8", body));
    assert_eq!(message, "User already exists");
    assert_eq!(details, None);
}

#[test]
fn json_without_envelope_uses_status_text() {
    let (_, message, _) = unpack(http_error(500, "Internal Server Error", "application/json", r#"{"oops":true}"#));
    assert_eq!(message, "Internal Server Error");
}

#[test]
fn json_non_string_message_uses_status_text() {
    let body = r#"{"error":{"message":42}}"#;
    let (_, message, _) = unpack(http_error(400, "Bad Request", "application/json", body));
    assert_eq!(message, "Bad Request");
}

#[test]
fn json_null_details_dropped() {
    let body = r#"{"error":{"message":"nope","details":null}}"#;
    let (_, _, details) = unpack(http_error(400, "Bad Request", "application/json", body));
    assert_eq!(details, None);
}

#[test]
fn malformed_json_uses_status_text() {
    let (status, message, details) = unpack(http_error(502, "Bad Gateway", "application/json", "<html>"));
    assert_eq!(status, 502);
    assert_eq!(message, "Bad Gateway");
    assert_eq!(details, None);
}

#[test]
fn text_body_becomes_message() {
    let (_, message, _) = unpack(http_error(503, "Service Unavailable", "text/plain", "maintenance window"));
    assert_eq!(message, "maintenance window");
}

#[test]
fn empty_text_body_uses_status_text() {
    let (_, message, _) = unpack(http_error(404, "Not Found", "", ""));
    assert_eq!(message, "Not Found");
}

// =============================================================================
// classification
// =============================================================================

#[test]
fn status_only_for_http_errors() {
    assert_eq!(http_error(418, "I'm a teapot", "", "").status(), Some(418));
    assert_eq!(ApiError::Network("refused".into()).status(), None);
}

#[test]
fn unauthorized_detection() {
    assert!(http_error(401, "Unauthorized", "", "").is_unauthorized());
    assert!(!http_error(403, "Forbidden", "", "").is_unauthorized());
}

#[test]
fn error_codes() {
    assert_eq!(http_error(401, "", "", "").error_code(), "E_UNAUTHORIZED");
    assert_eq!(http_error(403, "", "", "").error_code(), "E_FORBIDDEN");
    assert_eq!(http_error(409, "", "", "").error_code(), "E_HTTP");
    assert_eq!(ApiError::Network(String::new()).error_code(), "E_NETWORK");
    assert_eq!(ApiError::Decode(String::new()).error_code(), "E_DECODE");
}

#[test]
fn retryable_covers_network_throttle_and_server_errors() {
    assert!(ApiError::Network("reset".into()).retryable());
    assert!(http_error(429, "", "", "").retryable());
    assert!(http_error(503, "", "", "").retryable());
    assert!(!http_error(401, "", "", "").retryable());
    assert!(!ApiError::Decode("eof".into()).retryable());
}

#[test]
fn display_includes_status() {
    let err = http_error(401, "Unauthorized", "text/plain", "Missing token");
    assert_eq!(err.to_string(), "Missing token (HTTP 401)");
}
