//! Shared response envelope for API handlers.
//!
//! Every API response, success or failure, is an [`ApiResponse`]:
//!
//! ```json
//! { "success": true, "message": "...", "data": { ... } }
//! { "success": false, "message": "...", "errors": ["..."], "data": null }
//! ```
//!
//! `errors` is omitted when there are none.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful envelope carrying `data`.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: None,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Failure envelope with `data: null`. An empty `errors` list is dropped.
    pub fn error(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: (!errors.is_empty()).then_some(errors),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_errors() {
        let json = serde_json::to_value(ApiResponse::ok(vec![1, 2], "Loaded 2 items")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "message": "Loaded 2 items",
                "data": [1, 2],
            })
        );
    }

    #[test]
    fn error_envelope_has_null_data() {
        let json =
            serde_json::to_value(ApiResponse::error("Role not found", vec!["no id 9".into()]))
                .unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0], "no id 9");
        assert!(json["data"].is_null());
    }

    #[test]
    fn empty_error_list_is_omitted() {
        let json = serde_json::to_value(ApiResponse::error("Nope", Vec::new())).unwrap();
        assert!(json.get("errors").is_none());
    }
}
