//! Telemetry payload normalization
//!
//! Payloads arrive in several shapes: JSON text, an envelope whose `v` field
//! holds JSON text again (the upstream transport double-encodes), or an
//! already structured object. [`RawPayload::decode`] resolves the shape once,
//! then [`Normalizer::normalize`] copies the recognized fields into the
//! canonical record. Fields missing from the payload are never touched.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::parser::numeric::{parse_float, parse_int, NumericPolicy};
use crate::types::CanonicalTelemetry;

/// Envelope key wrapping the real payload
pub const ENVELOPE_KEY: &str = "v";

/// Float fields copied from a payload, in update order
pub const FLOAT_FIELDS: [&str; 4] = ["lat", "lon", "alt", "spd"];

/// Resolved shape of an inbound payload
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// JSON text decoding to the telemetry object
    StringEncoded(Map<String, Value>),
    /// Envelope whose `v` field was JSON text decoding to the telemetry object
    DoubleEncoded(Map<String, Value>),
    /// Structured object, either bare or as the `v` field of an envelope
    Object(Map<String, Value>),
    /// Anything that does not resolve to an object (garbage text, numbers, ...)
    Opaque(Value),
}

impl RawPayload {
    /// Resolve the payload shape, unwrapping at most one `v` envelope
    pub fn decode(raw: &Value) -> RawPayload {
        let (parsed, from_text) = match raw {
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(value) => (value, true),
                Err(e) => {
                    debug!("payload is not JSON text, keeping literal string: {e}");
                    return RawPayload::Opaque(raw.clone());
                }
            },
            other => (other.clone(), false),
        };

        let mut object = match parsed {
            Value::Object(object) => object,
            other => return RawPayload::Opaque(other),
        };

        match object.remove(ENVELOPE_KEY) {
            Some(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
                Ok(Value::Object(inner_object)) => RawPayload::DoubleEncoded(inner_object),
                Ok(other) => RawPayload::Opaque(other),
                Err(e) => {
                    debug!("envelope value is not JSON text, keeping literal string: {e}");
                    RawPayload::Opaque(Value::String(inner))
                }
            },
            Some(Value::Object(inner_object)) => RawPayload::Object(inner_object),
            Some(other) => RawPayload::Opaque(other),
            None if from_text => RawPayload::StringEncoded(object),
            None => RawPayload::Object(object),
        }
    }

    /// Telemetry fields of the payload, if it resolved to an object
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        match self {
            RawPayload::StringEncoded(m) | RawPayload::DoubleEncoded(m) | RawPayload::Object(m) => {
                Some(m)
            }
            RawPayload::Opaque(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RawPayload::StringEncoded(_) => "string-encoded",
            RawPayload::DoubleEncoded(_) => "double-encoded",
            RawPayload::Object(_) => "object",
            RawPayload::Opaque(_) => "opaque",
        }
    }
}

/// Copies payload fields into the canonical telemetry record
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    pub policy: NumericPolicy,
}

impl Normalizer {
    pub fn new(policy: NumericPolicy) -> Self {
        Self { policy }
    }

    /// Apply `raw` to `into`, returning the names of the fields that changed
    ///
    /// Never fails: unresolvable payloads are logged and leave `into` as is.
    pub fn normalize(&self, raw: &Value, into: &mut CanonicalTelemetry) -> Vec<&'static str> {
        let payload = RawPayload::decode(raw);
        let Some(fields) = payload.fields() else {
            debug!("ignoring {} payload without telemetry fields", payload.kind());
            return Vec::new();
        };

        let mut updated = Vec::new();

        for (name, slot) in [
            (FLOAT_FIELDS[0], &mut into.lat),
            (FLOAT_FIELDS[1], &mut into.lon),
            (FLOAT_FIELDS[2], &mut into.alt),
            (FLOAT_FIELDS[3], &mut into.spd),
        ] {
            if let Some(value) = fields.get(name) {
                if let Some(parsed) = self.coerce_float(name, value) {
                    *slot = parsed;
                    updated.push(name);
                }
            }
        }

        if let Some(value) = fields.get("sat") {
            match parse_int(value) {
                Some(sat) => {
                    into.sat = sat;
                    updated.push("sat");
                }
                None => warn!("ignoring non-numeric sat value {value}"),
            }
        }

        if let Some(value) = fields.get("temp") {
            if value.is_null() {
                into.temp = None;
                updated.push("temp");
            } else if let Some(temp) = self.coerce_float("temp", value) {
                into.temp = Some(temp);
                updated.push("temp");
            }
        }

        debug!("{} payload updated {:?}", payload.kind(), updated);
        updated
    }

    fn coerce_float(&self, name: &str, value: &Value) -> Option<f64> {
        match (parse_float(value), self.policy) {
            (Some(v), _) => Some(v),
            (None, NumericPolicy::Permissive) => {
                warn!("non-numeric {name} value {value}, storing NaN");
                Some(f64::NAN)
            }
            (None, NumericPolicy::Strict) => {
                warn!("rejecting non-numeric {name} value {value}");
                None
            }
        }
    }
}

/// Normalize with the default (strict) numeric policy
pub fn normalize(raw: &Value, into: &mut CanonicalTelemetry) -> Vec<&'static str> {
    Normalizer::default().normalize(raw, into)
}

/// Cheap check for string values shaped like a JSON object
pub fn looks_like_json_object(value: &Value) -> bool {
    value
        .as_str()
        .map(|s| s.trim_start().starts_with('{'))
        .unwrap_or(false)
}
