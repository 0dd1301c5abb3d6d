//! Response classification.
//!
//! [`classify`] is a pure mapping from an HTTP status and the decoded
//! envelope to the single [`Outcome`] the client acts on. Side effects
//! (toasts, navigation, clearing the session) happen in the client, never
//! here.

use serde_json::Value;

use crate::envelope::{Envelope, ErrorPayload, FieldErrors};

/// Why a confirmation modal is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalReason {
    /// The server asked for a modal.
    Requested,
    /// A 400 arrived without any payload we recognise. The raw message is
    /// shown in a modal rather than guessing at field errors.
    Unstructured,
}

/// Account-policy rejections that send the user to an explanatory page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyRedirect {
    Inactive,
    UrlExpired,
    Suspended,
}

impl PolicyRedirect {
    pub fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "inactive" => Some(Self::Inactive),
            "url_expired" => Some(Self::UrlExpired),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Hand `data` to the caller.
    Resolve(Value),
    /// Success without a body (HTTP 204 or an envelope `status: 204`).
    NoContent,
    Toast(String),
    Modal { msg: String, reason: ModalReason },
    /// Validation errors for the calling form. Nothing is shown globally.
    Field(FieldErrors),
    /// Session is gone: clear it and go to login.
    Unauthorized,
    Redirect(PolicyRedirect),
}

impl Outcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolve(_) | Self::NoContent)
    }
}

pub fn classify(http_status: u16, envelope: Envelope) -> Outcome {
    if (200..300).contains(&http_status) {
        if http_status == 204 || envelope.status == Some(204) {
            return Outcome::NoContent;
        }
        return Outcome::Resolve(envelope.data);
    }

    let payload = ErrorPayload::from_data(&envelope.data);
    match http_status {
        400 => classify_bad_request(payload, envelope.msg),
        401 => Outcome::Unauthorized,
        403 => match payload.kind.as_deref().and_then(PolicyRedirect::from_type) {
            Some(redirect) => Outcome::Redirect(redirect),
            None => status_toast(http_status, &envelope.msg),
        },
        _ => status_toast(http_status, &envelope.msg),
    }
}

fn classify_bad_request(payload: ErrorPayload, msg: String) -> Outcome {
    if payload.err_type.as_deref() == Some("toast") {
        return Outcome::Toast(msg);
    }
    if payload.kind.as_deref() == Some("modal") || payload.err_type.as_deref() == Some("modal") {
        return Outcome::Modal {
            msg,
            reason: ModalReason::Requested,
        };
    }
    if payload.is_field_error() {
        return Outcome::Field(FieldErrors::from_payload(payload, &msg));
    }
    Outcome::Modal {
        msg,
        reason: ModalReason::Unstructured,
    }
}

fn status_toast(status: u16, msg: &str) -> Outcome {
    Outcome::Toast(format!("statusCode: {status}; {msg}"))
}
