//! Loosely-typed API response model
//!
//! The experiment-tracking service is consumed through a small explicit result
//! type instead of per-endpoint response structs: callers inspect the status
//! code and the JSON body shape themselves, and malformed bodies are carried
//! as raw text rather than rejected at the transport layer.

use serde_json::Value;

/// A response from the experiment-tracking service
///
/// Holds the HTTP status code and the body, parsed as JSON when possible.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: ResponseBody,
}

/// Response body: parsed JSON, or the raw text when the body is not JSON
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ApiResponse {
    /// Builds a response from a status code and raw body text
    ///
    /// The body is parsed as JSON when possible and kept as text otherwise.
    pub fn from_payload(status_code: u16, text: String) -> Self {
        let body = match serde_json::from_str::<Value>(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        };
        Self { status_code, body }
    }

    /// Builds a response with a JSON body
    pub fn json(status_code: u16, value: Value) -> Self {
        Self {
            status_code,
            body: ResponseBody::Json(value),
        }
    }

    /// Whether the status code is in the accepted success range (200-299)
    pub fn is_ok(&self) -> bool {
        (200..=299).contains(&self.status_code)
    }

    /// The body as a JSON value, if it parsed as JSON
    pub fn body_json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    /// The body as a JSON array, if it is one
    pub fn body_array(&self) -> Option<&[Value]> {
        self.body_json().and_then(Value::as_array).map(Vec::as_slice)
    }

    /// The body rendered for display: pretty-printed JSON or the raw text
    pub fn pretty_body(&self) -> String {
        match &self.body {
            ResponseBody::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            ResponseBody::Text(text) => text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_range() {
        assert!(ApiResponse::json(200, json!({})).is_ok());
        assert!(ApiResponse::json(299, json!({})).is_ok());
        assert!(!ApiResponse::json(199, json!({})).is_ok());
        assert!(!ApiResponse::json(300, json!({})).is_ok());
        assert!(!ApiResponse::json(500, json!({})).is_ok());
    }

    #[test]
    fn test_from_payload_parses_json() {
        let response = ApiResponse::from_payload(200, r#"[{"job_id": "j1"}]"#.to_string());
        assert_eq!(
            response.body,
            ResponseBody::Json(json!([{"job_id": "j1"}]))
        );
        assert_eq!(response.body_array().map(<[Value]>::len), Some(1));
    }

    #[test]
    fn test_from_payload_keeps_text() {
        let response = ApiResponse::from_payload(502, "Bad Gateway".to_string());
        assert_eq!(response.body, ResponseBody::Text("Bad Gateway".to_string()));
        assert!(response.body_json().is_none());
        assert!(response.body_array().is_none());
        assert_eq!(response.pretty_body(), "Bad Gateway");
    }

    #[test]
    fn test_body_array_rejects_non_list() {
        let response = ApiResponse::json(200, json!({"job_id": "j1"}));
        assert!(response.body_array().is_none());
    }
}
