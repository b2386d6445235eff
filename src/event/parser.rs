//! Event parser
//!
//! Turns one line of JSON into an incoming event.

use serde_json::Value;

use crate::event::{IncomingEvent, OutputEvent};

/// Event `type` names the gateway consumes.
pub const SUPPORTED_KINDS: [&str; 3] = ["create_directory", "write_to_file", "delete_file"];

/// Parse a JSON event.
///
/// A well-formed object whose `type` is not one of [`SUPPORTED_KINDS`] is
/// returned as [`IncomingEvent::Unsupported`] so the gateway can refuse it.
pub fn parse_event(line: &str) -> Result<IncomingEvent, serde_json::Error> {
    let value: Value = serde_json::from_str(line)?;
    let kind = value.get("type").and_then(Value::as_str).unwrap_or("<untyped>");

    if !SUPPORTED_KINDS.contains(&kind) {
        return Ok(IncomingEvent::Unsupported(kind.to_string()));
    }

    serde_json::from_value::<OutputEvent>(value).map(IncomingEvent::Storage)
}
