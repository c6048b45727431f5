//! Conversion from stored schedule records to domain types.
//!
//! Validation happens here so the graph builder only ever sees services
//! whose stops are in running order.

use crate::domain::{
    InvalidStationCode, Service, ServiceCategory, ServiceNumber, StationCode, Stop, StopTime,
};

use super::types::{ScheduleRecord, StopRecord};

/// Error during record to domain conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// A stop carries an unusable station code
    #[error("stop {index}: {source}")]
    InvalidStation {
        index: usize,
        #[source]
        source: InvalidStationCode,
    },

    /// Cumulative distance goes backwards
    #[error("stop {index}: distance decreases from {previous} to {current} km")]
    DistanceDecreasing {
        index: usize,
        previous: f64,
        current: f64,
    },

    /// Distance is not a finite, non-negative number
    #[error("stop {index}: invalid distance {value}")]
    InvalidDistance { index: usize, value: f64 },

    /// Running day goes backwards
    #[error("stop {index}: running day decreases from {previous} to {current}")]
    DayDecreasing {
        index: usize,
        previous: u16,
        current: u16,
    },
}

/// Convert a stored record into a `Service`.
///
/// Running days are rebased so the first stop is day offset 0. Stop times
/// are kept as read; unreadable ones surface later when segments are
/// derived.
pub fn convert_record(record: &ScheduleRecord) -> Result<Service, ConversionError> {
    let first_day = record.schedule.first().map(|s| s.day).unwrap_or(0);

    let mut stops = Vec::with_capacity(record.schedule.len());
    let mut previous: Option<&StopRecord> = None;

    for (index, raw) in record.schedule.iter().enumerate() {
        if !raw.distance.is_finite() || raw.distance < 0.0 {
            return Err(ConversionError::InvalidDistance {
                index,
                value: raw.distance,
            });
        }

        if let Some(prev) = previous {
            if raw.distance < prev.distance {
                return Err(ConversionError::DistanceDecreasing {
                    index,
                    previous: prev.distance,
                    current: raw.distance,
                });
            }
            if raw.day < prev.day {
                return Err(ConversionError::DayDecreasing {
                    index,
                    previous: prev.day,
                    current: raw.day,
                });
            }
        }

        stops.push(convert_stop(index, raw, first_day)?);
        previous = Some(raw);
    }

    Ok(Service {
        number: ServiceNumber(record.train_number),
        name: record.name.trim().to_string(),
        category: ServiceCategory::from_label(&record.service_type),
        category_label: record.service_type.clone(),
        classes: record.classes.clone(),
        stops,
    })
}

fn convert_stop(index: usize, raw: &StopRecord, first_day: u16) -> Result<Stop, ConversionError> {
    let station = StationCode::parse(&raw.station)
        .map_err(|source| ConversionError::InvalidStation { index, source })?;

    let platform = raw
        .platform
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "-" && *p != "--")
        .map(str::to_string);

    let station_name = raw
        .station_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    Ok(Stop {
        station,
        station_name,
        arrival: StopTime::parse(&raw.arrival),
        departure: StopTime::parse(&raw.departure),
        platform,
        distance_km: raw.distance,
        day_offset: raw.day.saturating_sub(first_day),
    })
}
