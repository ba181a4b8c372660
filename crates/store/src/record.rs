use std::fmt;

use chrono::Local;
use serde::{Deserialize, Deserializer, Serialize};

/// Format of the server-assigned timestamp (`YYYY-MM-DD HH:MM:SS`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Field names every payload must carry, in wire order.
pub const REQUIRED_FIELDS: [&str; 4] = ["device_name", "device_type", "ip_address", "routing_type"];

/// Device description as sent by callers.
///
/// Missing and `null` fields decode as empty strings so that presence is
/// checked by [`DeviceInfo::validate`] rather than by the decoder. Unknown
/// fields, including a caller-supplied `timestamp`, are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub device_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub device_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ip_address: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub routing_type: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl DeviceInfo {
    pub fn new(
        device_name: impl Into<String>,
        device_type: impl Into<String>,
        ip_address: impl Into<String>,
        routing_type: impl Into<String>,
    ) -> Self {
        Self {
            device_name: device_name.into(),
            device_type: device_type.into(),
            ip_address: ip_address.into(),
            routing_type: routing_type.into(),
        }
    }

    /// Checks that all four fields are present and non-empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let values = [
            &self.device_name,
            &self.device_type,
            &self.ip_address,
            &self.routing_type,
        ];

        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .zip(values)
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { missing })
        }
    }
}

/// Raised when a payload lacks one or more required fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required fields: {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

/// A device entry as persisted, with the time it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub info: DeviceInfo,
    pub timestamp: String,
}

impl DeviceRecord {
    pub fn stamp(info: DeviceInfo, clock: &dyn Clock) -> Self {
        Self {
            info,
            timestamp: clock.timestamp(),
        }
    }

    /// Renders the record as one newline-terminated log line.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] Пристрій: {}, Тип: {}, IP: {}, Маршрутизація: {}",
            self.timestamp,
            self.info.device_name,
            self.info.device_type,
            self.info.ip_address,
            self.info.routing_type
        )
    }
}

/// Source of write-time timestamps.
pub trait Clock: Send + Sync {
    fn timestamp(&self) -> String;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn timestamp(&self) -> String {
        Local::now().format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock(pub String);

impl Clock for FixedClock {
    fn timestamp(&self) -> String {
        self.0.clone()
    }
}
