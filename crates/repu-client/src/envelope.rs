//! Inbound stage: turns a raw response into plain data or a classified error.

use repu_core::Envelope;
use repu_error::{RepuError, Result};
use serde_json::Value;

use crate::transport::RawResponse;

pub use repu_core::NON_INTEGER_CODE;

/// Unwrap a response body.
///
/// An object with a `code` key is an envelope whatever the HTTP status:
/// `code == 0` yields `data` (or `null`), anything else is an error carrying
/// `msg`. Other bodies pass through unchanged on 2xx and are transport
/// errors otherwise. Business objects with a top-level `code` field are
/// read as envelopes too.
pub fn unwrap_response(resp: &RawResponse) -> Result<Value> {
    let parsed = if resp.body.trim().is_empty() {
        Some(Value::Null)
    } else {
        serde_json::from_str::<Value>(&resp.body).ok()
    };

    match parsed {
        Some(Value::Object(map)) if map.contains_key("code") => {
            unwrap_envelope(serde_json::from_value(Value::Object(map))?)
        }
        _ if !resp.is_success() => Err(RepuError::HttpStatus {
            status: resp.status,
            body: resp.body.clone(),
        }),
        Some(value) => Ok(value),
        None => Ok(Value::String(resp.body.clone())),
    }
}

fn unwrap_envelope(envelope: Envelope) -> Result<Value> {
    if envelope.is_success() {
        return Ok(envelope.into_data());
    }

    let message = envelope.message().to_string();
    if envelope.is_unauthorized() {
        return Err(RepuError::Authentication { message });
    }

    Err(RepuError::Business {
        code: envelope.code(),
        message,
    })
}
