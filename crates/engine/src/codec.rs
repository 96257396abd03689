//! Opaque check-in codes.
//!
//! A code is the base64 encoding of a small JSON payload naming the event and
//! the registered user. The front end renders it as a 2-D barcode; this
//! module only cares about the string round-trip. Decoding is strict: any
//! payload that is not well-formed JSON with both ids positive is rejected,
//! which is what makes casual tampering evident.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use learnhub_core::checkin::CheckInCode;

pub fn encode(code: &CheckInCode) -> String {
    // Serializing a two-field struct cannot fail.
    let json = serde_json::to_vec(code).expect("check-in payload serialization");
    STANDARD.encode(json)
}

/// Returns `None` for anything other than a well-formed payload with
/// positive ids.
pub fn decode(raw: &str) -> Option<CheckInCode> {
    let bytes = STANDARD.decode(raw.trim()).ok()?;
    let code: CheckInCode = serde_json::from_slice(&bytes).ok()?;
    if code.event_id <= 0 || code.user_id <= 0 {
        return None;
    }
    Some(code)
}
