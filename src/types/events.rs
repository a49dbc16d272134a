//! Events delivered by the telemetry widget
//!
//! The widget SDK reports three kinds of callbacks. They are modelled as one
//! tagged enum so a session can be fed from a single channel (and so recorded
//! sessions can be replayed from JSON lines).

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One realtime channel declared by the widget configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    #[serde(deserialize_with = "deserialize_channel_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// Configuration callback: ordered realtime channels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationEvent {
    #[serde(default)]
    pub realtime: Vec<ChannelDescriptor>,
}

/// Value envelope `{ "value": ... }` for one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueEnvelope {
    #[serde(default)]
    pub value: Value,
}

impl ValueEnvelope {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Channel id -> value envelope, in the order the widget delivered them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelValues(pub Vec<(String, ValueEnvelope)>);

impl ChannelValues {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<Value>) {
        let id = id.into();
        let envelope = ValueEnvelope::new(value);
        match self.0.iter_mut().find(|(k, _)| *k == id) {
            Some((_, existing)) => *existing = envelope,
            None => self.0.push((id, envelope)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ValueEnvelope> {
        self.0.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueEnvelope)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for ChannelValues {
    fn from(map: Map<String, Value>) -> Self {
        let entries = map
            .into_iter()
            .map(|(id, raw)| {
                // the SDK wraps every value as { value }, a bare value is accepted as is
                let envelope = match raw {
                    Value::Object(mut obj) if obj.contains_key("value") => ValueEnvelope {
                        value: obj.remove("value").unwrap_or(Value::Null),
                    },
                    other => ValueEnvelope { value: other },
                };
                (id, envelope)
            })
            .collect();
        Self(entries)
    }
}

impl<'de> Deserialize<'de> for ChannelValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(map.into())
    }
}

impl Serialize for ChannelValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, envelope) in &self.0 {
            map.serialize_entry(id, envelope)?;
        }
        map.end()
    }
}

/// Values callback
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuesEvent {
    #[serde(default)]
    pub values: ChannelValues,
}

/// One history stream; samples are kept raw and interpreted by the history parser
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStream {
    #[serde(default)]
    pub data: Vec<Value>,
}

/// Histories callback: ordered streams
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoriesEvent {
    #[serde(default)]
    pub streams: Vec<HistoryStream>,
}

/// Any callback the widget can deliver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetEvent {
    Configuration(ConfigurationEvent),
    Values(ValuesEvent),
    Histories(HistoriesEvent),
}

impl WidgetEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            WidgetEvent::Configuration(_) => "configuration",
            WidgetEvent::Values(_) => "values",
            WidgetEvent::Histories(_) => "histories",
        }
    }
}

/// Channel ids arrive as strings or numbers depending on the widget backend
fn deserialize_channel_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "channel id must be a string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_values_keep_delivery_order_and_unwrap_envelopes() {
        let event: WidgetEvent = serde_json::from_value(json!({
            "type": "values",
            "values": {
                "zeta": { "value": "1" },
                "alpha": { "value": "{\"lat\":1}" },
                "bare": 42
            }
        }))
        .unwrap();

        let WidgetEvent::Values(values) = event else {
            panic!("expected values event");
        };
        let ids: Vec<&str> = values.values.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "bare"]);
        assert_eq!(values.values.get("zeta").unwrap().value, json!("1"));
        assert_eq!(values.values.get("bare").unwrap().value, json!(42));
    }

    #[test]
    fn test_numeric_channel_ids() {
        let event: WidgetEvent = serde_json::from_value(json!({
            "type": "configuration",
            "realtime": [{ "id": 17 }, { "id": "btn", "name": "Button" }]
        }))
        .unwrap();

        let WidgetEvent::Configuration(config) = event else {
            panic!("expected configuration event");
        };
        assert_eq!(config.realtime[0].id, "17");
        assert_eq!(config.realtime[1].name.as_deref(), Some("Button"));
    }

    #[test]
    fn test_values_event_serializes_like_the_widget() {
        let mut values = ChannelValues::new();
        values.insert("json", "{}");
        values.insert("btn", 1);
        let event = WidgetEvent::Values(ValuesEvent { values });

        let text = serde_json::to_string(&event).unwrap();
        assert_eq!(
            text,
            r#"{"type":"values","values":{"json":{"value":"{}"},"btn":{"value":1}}}"#
        );
        let back: WidgetEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_channel_values_insert_replaces() {
        let mut values = ChannelValues::new();
        values.insert("a", 1);
        values.insert("b", 2);
        values.insert("a", 3);
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("a").unwrap().value, json!(3));
    }
}
