//! Response envelopes of the admin surface.
//!
//! Form submissions answer with a [`FlashRedirect`]: where the client should
//! navigate next and the messages to show there. JSON endpoints answer with
//! either a [`StatusResponse`] or an [`ApiResponse`].

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub messages: Vec<String>,
}

/// Outcome of a form submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashRedirect {
    pub redirect_to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<Flash>,
    /// Submitted values echoed back after a rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<Value>,
    /// Extra payload for the next view, e.g. invited users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl FlashRedirect {
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            redirect_to: path.into(),
            flash: None,
            form: None,
            data: None,
        }
    }

    pub fn success(self, message: impl Into<String>) -> Self {
        self.flash(FlashLevel::Success, vec![message.into()])
    }

    pub fn error(self, message: impl Into<String>) -> Self {
        self.flash(FlashLevel::Error, vec![message.into()])
    }

    pub fn errors(self, messages: Vec<String>) -> Self {
        self.flash(FlashLevel::Error, messages)
    }

    fn flash(mut self, level: FlashLevel, messages: Vec<String>) -> Self {
        self.flash = Some(Flash { level, messages });
        self
    }

    pub fn with_form(mut self, form: Value) -> Self {
        self.form = Some(form);
        self
    }

    pub fn with_data<T: Serialize>(mut self, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => self.data = Some(value),
            Err(e) => tracing::error!(error = %e, "Failed to serialize redirect payload"),
        }
        self
    }
}

impl IntoResponse for FlashRedirect {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `{status, message?}` answer of settings and importer endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: true,
            message: None,
            url: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: Some(message.into()),
            url: None,
        }
    }
}

impl IntoResponse for StatusResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `{ok: true, ...data}` or `{ok: false, error}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse(Value);

impl ApiResponse {
    pub fn success() -> Self {
        let mut body = Map::new();
        body.insert("ok".to_string(), Value::Bool(true));
        Self(Value::Object(body))
    }

    /// Success with the fields of `data` merged into the body. Non-object
    /// payloads are placed under `data`.
    pub fn success_with<T: Serialize>(data: &T) -> Self {
        let mut body = Map::new();
        body.insert("ok".to_string(), Value::Bool(true));
        match serde_json::to_value(data) {
            Ok(Value::Object(fields)) => body.extend(fields),
            Ok(other) => {
                body.insert("data".to_string(), other);
            }
            Err(e) => return Self::error(e.to_string()),
        }
        Self(Value::Object(body))
    }

    pub fn error(message: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("ok".to_string(), Value::Bool(false));
        body.insert("error".to_string(), Value::String(message.into()));
        Self(Value::Object(body))
    }

    pub fn body(&self) -> &Value {
        &self.0
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flash_redirect_serialization() {
        let redirect = FlashRedirect::to("/admin/users").success("Updated");
        let json = serde_json::to_value(&redirect).unwrap();
        assert_eq!(
            json,
            json!({
                "redirectTo": "/admin/users",
                "flash": { "level": "success", "messages": ["Updated"] }
            })
        );
    }

    #[test]
    fn test_flash_redirect_without_flash_omits_fields() {
        let json = serde_json::to_value(FlashRedirect::to("/admin")).unwrap();
        assert_eq!(json, json!({ "redirectTo": "/admin" }));
    }

    #[test]
    fn test_flash_redirect_echoes_form() {
        let redirect = FlashRedirect::to("/admin/markdown")
            .errors(vec!["a".into(), "b".into()])
            .with_form(json!({ "markdown:xss:option": 9 }));
        let json = serde_json::to_value(&redirect).unwrap();
        assert_eq!(json["flash"]["level"], "error");
        assert_eq!(json["flash"]["messages"], json!(["a", "b"]));
        assert_eq!(json["form"]["markdown:xss:option"], 9);
    }

    #[test]
    fn test_status_response() {
        assert_eq!(
            serde_json::to_value(StatusResponse::ok()).unwrap(),
            json!({ "status": true })
        );
        assert_eq!(
            serde_json::to_value(StatusResponse::failed("nope")).unwrap(),
            json!({ "status": false, "message": "nope" })
        );
    }

    #[test]
    fn test_api_response_merges_object_payload() {
        let response = ApiResponse::success_with(&json!({ "updatePost": { "id": 1 } }));
        assert_eq!(response.body(), &json!({ "ok": true, "updatePost": { "id": 1 } }));
    }

    #[test]
    fn test_api_response_wraps_non_object_payload() {
        let response = ApiResponse::success_with(&vec![1, 2]);
        assert_eq!(response.body(), &json!({ "ok": true, "data": [1, 2] }));
    }

    #[test]
    fn test_api_response_error() {
        assert_eq!(
            ApiResponse::error("ElasticSearch Integration is not set up.").body(),
            &json!({ "ok": false, "error": "ElasticSearch Integration is not set up." })
        );
    }
}
