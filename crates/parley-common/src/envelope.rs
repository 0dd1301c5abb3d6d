//! Wire shapes shared by every API response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of every API response: `{status, code, msg, data}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: T,
}

impl Envelope {
    /// An envelope for a body that wasn't JSON: the raw text becomes the
    /// message and there is no payload.
    pub fn from_raw(body: &[u8]) -> Self {
        Self {
            msg: String::from_utf8_lossy(body).trim().to_string(),
            ..Self::default()
        }
    }
}

/// One entry of a field-level validation error list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrorItem {
    pub error_field: String,
    pub error_msg: String,
}

/// The `data` of an error response, as far as classification needs it.
///
/// The server sends either an object (`type`, `err_type`, `key`, `value`)
/// or a bare list of field errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list: Vec<FieldErrorItem>,
}

impl ErrorPayload {
    /// Read whatever structure `data` has. Anything unrecognised yields an
    /// empty payload.
    pub fn from_data(data: &Value) -> Self {
        match data {
            Value::Array(_) => Self {
                list: serde_json::from_value(data.clone()).unwrap_or_default(),
                ..Self::default()
            },
            Value::Object(_) => serde_json::from_value(data.clone()).unwrap_or_else(|err| {
                tracing::debug!(error = %err, "unrecognised error payload");
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn is_field_error(&self) -> bool {
        self.key.is_some() || !self.list.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Validation errors handed to the calling form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub list: Vec<FieldErrorItem>,
}

impl FieldErrors {
    /// Build from a 400 payload; `msg` fills in a keyed error without a
    /// `value`.
    pub fn from_payload(payload: ErrorPayload, msg: &str) -> Self {
        let value = match (&payload.key, payload.value) {
            (Some(_), None) if !msg.is_empty() => Some(msg.to_string()),
            (_, value) => value,
        };
        Self {
            is_error: true,
            key: payload.key,
            value,
            list: payload.list,
        }
    }

    /// Every `(field, message)` pair, the keyed error first.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let keyed = self
            .key
            .as_deref()
            .map(|key| (key, self.value.as_deref().unwrap_or_default()));
        keyed
            .into_iter()
            .chain(
                self.list
                    .iter()
                    .map(|item| (item.error_field.as_str(), item.error_msg.as_str())),
            )
            .collect()
    }

    pub fn summary(&self) -> String {
        self.entries()
            .iter()
            .map(|(field, _)| *field)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
