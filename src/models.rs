use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Stored waitlist record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Signup request body, read field by field from a JSON object
#[derive(Debug, Default)]
pub struct WaitlistRequest {
    pub email: Option<Value>,
    pub honeypot: Option<Value>,
    // the page's hidden field is named "website"
    pub website: Option<Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object")]
    NotAnObject,
}

impl WaitlistRequest {
    /// Parse a request body. Repeated keys resolve to the last occurrence.
    pub fn from_slice(body: &[u8]) -> Result<Self, BodyError> {
        let Value::Object(mut fields) = serde_json::from_slice::<Value>(body)? else {
            return Err(BodyError::NotAnObject);
        };

        Ok(Self {
            email: fields.remove("email"),
            honeypot: fields.remove("honeypot"),
            website: fields.remove("website"),
        })
    }

    /// The email, when present as a non-empty JSON string.
    pub fn email(&self) -> Option<&str> {
        match &self.email {
            Some(Value::String(email)) if !email.is_empty() => Some(email.as_str()),
            _ => None,
        }
    }

    /// Whether either hidden field carries anything a person would not have typed.
    pub fn honeypot_filled(&self) -> bool {
        is_truthy(self.honeypot.as_ref()) || is_truthy(self.website.as_ref())
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

// 201 body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistResponse {
    pub success: bool,
    pub message: String,
}

// 4xx / 5xx body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<u64>,
    pub analytics: bool,
    pub timestamp: String,
}
