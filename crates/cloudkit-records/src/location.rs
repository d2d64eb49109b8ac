use crate::timestamp;
use serde_json::{Map, Value};
use std::time::SystemTime;

/// Geographic fix stored in a LOCATION field.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub horizontal_accuracy: Option<f64>,
    pub vertical_accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
    pub course: Option<f64>,
    pub timestamp: Option<SystemTime>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            horizontal_accuracy: None,
            vertical_accuracy: None,
            altitude: None,
            speed: None,
            course: None,
            timestamp: None,
        }
    }

    pub fn to_document(&self) -> Value {
        let mut document = Map::new();
        document.insert("latitude".to_string(), Value::from(self.latitude));
        document.insert("longitude".to_string(), Value::from(self.longitude));
        let optional = [
            ("horizontalAccuracy", self.horizontal_accuracy),
            ("verticalAccuracy", self.vertical_accuracy),
            ("altitude", self.altitude),
            ("speed", self.speed),
            ("course", self.course),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                document.insert(key.to_string(), Value::from(value));
            }
        }
        if let Some(time) = self.timestamp {
            document.insert(
                "timestamp".to_string(),
                Value::from(timestamp::to_millis(time)),
            );
        }
        Value::Object(document)
    }

    /// `latitude` and `longitude` are required; everything else is optional.
    pub fn from_document(document: &Value) -> Option<Self> {
        let number = |key: &str| document.get(key).and_then(Value::as_f64);
        Some(Self {
            latitude: number("latitude")?,
            longitude: number("longitude")?,
            horizontal_accuracy: number("horizontalAccuracy"),
            vertical_accuracy: number("verticalAccuracy"),
            altitude: number("altitude"),
            speed: number("speed"),
            course: number("course"),
            timestamp: document.get("timestamp").and_then(timestamp::from_json),
        })
    }
}
