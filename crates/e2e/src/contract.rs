//! Response contracts for the four endpoints
//!
//! A contract names the endpoint and the top-level keys it must return,
//! and carries a validator that reports every missing or mistyped field
//! rather than stopping at the first one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::payload::{ImageType, RenderKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

/// Result of validating a decoded body against a contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCheck {
    pub missing: Vec<String>,
    pub invalid: Vec<String>,
}

impl ContractCheck {
    pub fn passed(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }

    /// One line per problem, for the outcome details
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.missing.is_empty() {
            lines.push(format!("missing fields: {}", self.missing.join(", ")));
        }
        if !self.invalid.is_empty() {
            lines.push(format!("invalid fields: {}", self.invalid.join(", ")));
        }
        lines
    }
}

/// Shape an endpoint must satisfy for a call to pass
#[derive(Debug, Clone, Copy)]
pub struct EndpointContract {
    pub name: &'static str,
    pub method: Method,
    pub path: &'static str,
    pub required_keys: &'static [&'static str],
    pub validator: fn(&Value) -> ContractCheck,
}

impl EndpointContract {
    pub fn validate(&self, body: &Value) -> ContractCheck {
        (self.validator)(body)
    }
}

pub const HEALTH: EndpointContract = EndpointContract {
    name: "health",
    method: Method::Get,
    path: "/health",
    required_keys: &["status", "timestamp"],
    validator: validate_health,
};

pub const CONFIG: EndpointContract = EndpointContract {
    name: "config",
    method: Method::Get,
    path: "/config",
    required_keys: &["imageStyles", "imageTypes"],
    validator: validate_config,
};

pub const RENDER_USER_INFO: EndpointContract = EndpointContract {
    name: "render-user-info",
    method: Method::Post,
    path: "/render-user-info",
    required_keys: &["success"],
    validator: validate_render,
};

pub const RENDER_ADMIN_LIST: EndpointContract = EndpointContract {
    name: "render-admin-list",
    method: Method::Post,
    path: "/render-admin-list",
    required_keys: &["success"],
    validator: validate_render,
};

pub fn render_contract(kind: RenderKind) -> &'static EndpointContract {
    match kind {
        RenderKind::UserInfo => &RENDER_USER_INFO,
        RenderKind::AdminList => &RENDER_ADMIN_LIST,
    }
}

const RENDER_DATA_KEYS: [&str; 3] = ["imageBase64", "imageType", "timestamp"];

fn missing_keys(body: &Value, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter(|key| body.get(**key).is_none())
        .map(|key| key.to_string())
        .collect()
}

/// `status` and `timestamp` present; `status == "ok"` is judged by the verifier
pub fn validate_health(body: &Value) -> ContractCheck {
    let mut check = ContractCheck {
        missing: missing_keys(body, HEALTH.required_keys),
        ..Default::default()
    };
    if body.get("status").is_some_and(|s| !s.is_string()) {
        check.invalid.push("status".to_string());
    }
    check
}

/// `imageStyles` and `imageTypes` present, both arrays
pub fn validate_config(body: &Value) -> ContractCheck {
    let mut check = ContractCheck {
        missing: missing_keys(body, CONFIG.required_keys),
        ..Default::default()
    };
    for key in CONFIG.required_keys {
        if body.get(*key).is_some_and(|v| !v.is_array()) {
            check.invalid.push(key.to_string());
        }
    }
    check
}

/// Boolean `success`; when true a `data` object with image, type and timestamp
pub fn validate_render(body: &Value) -> ContractCheck {
    let mut check = ContractCheck::default();

    let success = match body.get("success") {
        None => {
            check.missing.push("success".to_string());
            return check;
        }
        Some(Value::Bool(success)) => *success,
        Some(_) => {
            check.invalid.push("success".to_string());
            return check;
        }
    };
    if !success {
        return check;
    }

    let data = match body.get("data") {
        None => {
            check.missing.push("data".to_string());
            return check;
        }
        Some(data) if data.is_object() => data,
        Some(_) => {
            check.invalid.push("data".to_string());
            return check;
        }
    };

    for key in RENDER_DATA_KEYS {
        if data.get(key).is_none() {
            check.missing.push(format!("data.{}", key));
        }
    }
    if data.get("imageBase64").is_some_and(|v| !v.is_string()) {
        check.invalid.push("data.imageBase64".to_string());
    }
    if let Some(image_type) = data.get("imageType") {
        if image_type.as_str().and_then(ImageType::parse).is_none() {
            check.invalid.push("data.imageType".to_string());
        }
    }
    check
}

/// Image payload of a successful render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderData {
    pub image_base64: String,
    pub image_type: ImageType,
    /// ISO-8601 string from the service, kept as-is
    pub timestamp: Value,
}

/// Decoded render response, after the contract has been checked
#[derive(Debug, Clone, PartialEq)]
pub enum RenderResponse {
    Success(RenderData),
    Failure {
        error: Option<String>,
        message: Option<String>,
    },
}

impl RenderResponse {
    /// Decode a body that passed [`validate_render`]. `None` if it does not fit.
    pub fn from_value(body: &Value) -> Option<Self> {
        if body.get("success")?.as_bool()? {
            let data: RenderData = serde_json::from_value(body.get("data")?.clone()).ok()?;
            return Some(RenderResponse::Success(data));
        }
        Some(RenderResponse::Failure {
            error: body.get("error").and_then(Value::as_str).map(str::to_string),
            message: body.get("message").and_then(Value::as_str).map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_pass() {
        let body = json!({
            "success": true,
            "data": { "imageBase64": "iVBORw0KGgo=", "imageType": "png", "timestamp": 123 }
        });
        assert!(RENDER_USER_INFO.validate(&body).passed());

        match RenderResponse::from_value(&body) {
            Some(RenderResponse::Success(data)) => {
                assert_eq!(data.image_type, ImageType::Png);
                assert_eq!(data.timestamp, json!(123));
            }
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[test]
    fn test_validator_and_decoder_agree_on_image_type_case() {
        let body = json!({
            "success": true,
            "data": { "imageBase64": "iVBORw0KGgo=", "imageType": "WebP", "timestamp": "t" }
        });
        assert!(RENDER_ADMIN_LIST.validate(&body).passed());
        match RenderResponse::from_value(&body) {
            Some(RenderResponse::Success(data)) => assert_eq!(data.image_type, ImageType::Webp),
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[test]
    fn test_render_empty_data_lists_three_fields() {
        let check = validate_render(&json!({ "success": true, "data": {} }));
        assert!(!check.passed());
        assert_eq!(
            check.missing,
            vec!["data.imageBase64", "data.imageType", "data.timestamp"]
        );
    }

    #[test]
    fn test_render_shape_problems() {
        assert_eq!(validate_render(&json!({})).missing, vec!["success"]);
        assert_eq!(validate_render(&json!({ "success": "yes" })).invalid, vec!["success"]);
        assert_eq!(validate_render(&json!({ "success": true })).missing, vec!["data"]);

        let check = validate_render(&json!({
            "success": true,
            "data": { "imageBase64": 5, "imageType": "gif", "timestamp": "t" }
        }));
        assert_eq!(check.invalid, vec!["data.imageBase64", "data.imageType"]);
    }

    #[test]
    fn test_render_failure_decodes() {
        let body = json!({ "success": false, "error": "Internal server error", "message": "boom" });
        assert!(validate_render(&body).passed());
        assert_eq!(
            RenderResponse::from_value(&body),
            Some(RenderResponse::Failure {
                error: Some("Internal server error".to_string()),
                message: Some("boom".to_string()),
            })
        );
    }

    #[test]
    fn test_health_and_config() {
        let health = json!({ "status": "ok", "timestamp": "2024-01-01T00:00:00Z" });
        assert!(HEALTH.validate(&health).passed());
        assert_eq!(HEALTH.validate(&json!({ "status": "ok" })).missing, vec!["timestamp"]);

        let config = json!({ "imageStyles": ["A", "B"], "imageTypes": ["png"] });
        assert!(CONFIG.validate(&config).passed());
        let check = CONFIG.validate(&json!({ "imageStyles": "A" }));
        assert_eq!(check.missing, vec!["imageTypes"]);
        assert_eq!(check.invalid, vec!["imageStyles"]);
        assert_eq!(
            check.describe(),
            vec!["missing fields: imageTypes", "invalid fields: imageStyles"]
        );
    }
}
