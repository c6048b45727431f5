//! Scheduled service types.
//!
//! A `Service` is one timetabled run (a train) with its ordered stops.
//! Services are built once at ingestion and shared behind `Arc` by every
//! segment derived from them.

use std::fmt;

use super::{ClockTime, DomainError, StationCode, StopTime};

/// Public service number (e.g. 12951).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceNumber(pub u32);

impl fmt::Display for ServiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05}", self.0)
    }
}

/// Service category, used for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceCategory {
    VandeBharat,
    Rajdhani,
    Shatabdi,
    Duronto,
    Tejas,
    GaribRath,
    JanShatabdi,
    Superfast,
    MailExpress,
    Passenger,
    Unclassified,
}

impl ServiceCategory {
    /// Classify a free-text type label from the timetable.
    ///
    /// # Examples
    ///
    /// ```
    /// use interchange_engine::domain::ServiceCategory;
    ///
    /// assert_eq!(ServiceCategory::from_label("RAJ"), ServiceCategory::Rajdhani);
    /// assert_eq!(ServiceCategory::from_label("Superfast Express"), ServiceCategory::Superfast);
    /// assert_eq!(ServiceCategory::from_label("???"), ServiceCategory::Unclassified);
    /// ```
    pub fn from_label(label: &str) -> Self {
        let l = label.trim().to_ascii_lowercase();
        let has = |needle: &str| l.contains(needle);

        if has("vande") || l == "vb" {
            ServiceCategory::VandeBharat
        } else if has("rajdhani") || l == "raj" {
            ServiceCategory::Rajdhani
        } else if has("jan shatabdi") || l == "js" || l == "jshtb" {
            ServiceCategory::JanShatabdi
        } else if has("shatabdi") || l == "shtb" {
            ServiceCategory::Shatabdi
        } else if has("duronto") || l == "drnt" {
            ServiceCategory::Duronto
        } else if has("tejas") {
            ServiceCategory::Tejas
        } else if has("garib") || l == "gr" {
            ServiceCategory::GaribRath
        } else if has("superfast") || l == "sf" {
            ServiceCategory::Superfast
        } else if has("mail") || has("express") || l == "exp" {
            ServiceCategory::MailExpress
        } else if has("passenger") || has("memu") || has("demu") || has("local") {
            ServiceCategory::Passenger
        } else {
            ServiceCategory::Unclassified
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::VandeBharat => "vande-bharat",
            ServiceCategory::Rajdhani => "rajdhani",
            ServiceCategory::Shatabdi => "shatabdi",
            ServiceCategory::Duronto => "duronto",
            ServiceCategory::Tejas => "tejas",
            ServiceCategory::GaribRath => "garib-rath",
            ServiceCategory::JanShatabdi => "jan-shatabdi",
            ServiceCategory::Superfast => "superfast",
            ServiceCategory::MailExpress => "mail-express",
            ServiceCategory::Passenger => "passenger",
            ServiceCategory::Unclassified => "unclassified",
        }
    }
}

/// Index of a stop within a service's stop sequence.
///
/// Used instead of the station code so services that call at the same
/// station twice (loops, reversals) stay unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopIndex(pub usize);

impl StopIndex {
    pub fn next(self) -> Self {
        StopIndex(self.0 + 1)
    }
}

/// A scheduled station visit.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub station: StationCode,
    /// Display name, when the feed provides one.
    pub station_name: Option<String>,
    pub arrival: StopTime,
    pub departure: StopTime,
    pub platform: Option<String>,
    /// Cumulative distance from the origin, in km.
    pub distance_km: f64,
    /// Days since the service left its origin (0 on the first day).
    pub day_offset: u16,
}

impl Stop {
    pub fn new(station: StationCode, arrival: StopTime, departure: StopTime) -> Self {
        Self {
            station,
            station_name: None,
            arrival,
            departure,
            platform: None,
            distance_km: 0.0,
            day_offset: 0,
        }
    }

    /// Time the service reaches this stop.
    ///
    /// Origins have no arrival, so the departure stands in for it.
    pub fn arrival_clock(&self) -> Result<ClockTime, DomainError> {
        resolve(&self.arrival, &self.departure, self.station)
    }

    /// Time the service leaves this stop.
    ///
    /// Termini have no departure, so the arrival stands in for it.
    pub fn departure_clock(&self) -> Result<ClockTime, DomainError> {
        resolve(&self.departure, &self.arrival, self.station)
    }

    /// Running day of the departure.
    ///
    /// A halt that spans midnight arrives on `day_offset` and leaves the
    /// next day.
    pub fn departure_day(&self) -> u16 {
        match (self.arrival.clock(), self.departure.clock()) {
            (Some(arrival), Some(departure)) if departure < arrival => self.day_offset + 1,
            _ => self.day_offset,
        }
    }
}

fn resolve(
    primary: &StopTime,
    fallback: &StopTime,
    station: StationCode,
) -> Result<ClockTime, DomainError> {
    match (primary, fallback) {
        (StopTime::At(t), _) => Ok(*t),
        (StopTime::NotApplicable, StopTime::At(t)) => Ok(*t),
        (StopTime::Malformed(raw), _) | (StopTime::NotApplicable, StopTime::Malformed(raw)) => {
            Err(DomainError::UnreadableTime {
                station,
                raw: raw.clone(),
            })
        }
        (StopTime::NotApplicable, StopTime::NotApplicable) => {
            Err(DomainError::MissingTime(station))
        }
    }
}

/// A scheduled run with its ordered stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub number: ServiceNumber,
    pub name: String,
    pub category: ServiceCategory,
    /// Raw type label as given by the timetable.
    pub category_label: String,
    /// Fare classes offered (e.g. "1A", "2A", "SL").
    pub classes: Vec<String>,
    pub stops: Vec<Stop>,
}

impl Service {
    /// Find the first stop at `station` at or after `after`.
    pub fn find_stop(&self, station: &StationCode, after: StopIndex) -> Option<StopIndex> {
        self.stops
            .iter()
            .enumerate()
            .skip(after.0)
            .find(|(_, stop)| &stop.station == station)
            .map(|(i, _)| StopIndex(i))
    }

    /// Index of the final stop, if there are any stops.
    pub fn last_index(&self) -> Option<StopIndex> {
        self.stops.len().checked_sub(1).map(StopIndex)
    }
}
