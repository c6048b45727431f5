//! Raw schedule records as stored by the timetable database.
//!
//! These types map directly to the stored documents. They use defaults
//! liberally because older documents omit fields rather than storing
//! nulls.

use serde::{Deserialize, Serialize};

/// One service document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Public service number.
    pub train_number: u32,

    /// Display name (e.g. "Mumbai Rajdhani").
    #[serde(default)]
    pub name: String,

    /// Free-text category label (e.g. "Rajdhani", "SF", "Passenger").
    #[serde(default, rename = "type")]
    pub service_type: String,

    /// Fare classes offered.
    #[serde(default)]
    pub classes: Vec<String>,

    /// Ordered stops.
    #[serde(default)]
    pub schedule: Vec<StopRecord>,
}

/// One stop within a service document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopRecord {
    /// Station code.
    pub station: String,

    /// Station display name, when stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_name: Option<String>,

    /// "HH:MM", or a placeholder such as "Source" at the origin.
    #[serde(default)]
    pub arrival: String,

    /// "HH:MM", or a placeholder such as "Destination" at the terminus.
    #[serde(default)]
    pub departure: String,

    /// Running day, 1 on the day the service leaves its origin.
    #[serde(default)]
    pub day: u16,

    /// Cumulative distance from the origin, in km.
    #[serde(default)]
    pub distance: f64,

    /// Platform number/letter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}
