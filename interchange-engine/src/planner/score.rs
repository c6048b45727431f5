//! Route quality scores.
//!
//! A leg scores on speed, distance covered and service category. A route
//! averages its legs and then loses score for waiting and for every change.
//! Scores are clamped to `[0, 1]`; only their order matters.

use chrono::Duration;

use crate::domain::{RouteResult, RouteSegment, ServiceCategory};

/// Average speed that earns a full speed score (km/h).
pub const REFERENCE_SPEED_KMH: f64 = 130.0;

/// Distance that earns a full distance score (km).
pub const MAX_DISTANCE_KM: f64 = 3000.0;

const SPEED_WEIGHT: f64 = 0.5;
const DISTANCE_WEIGHT: f64 = 0.3;
const TYPE_WEIGHT: f64 = 0.2;

/// Penalty for waiting the whole of the maximum window once.
const WAIT_PENALTY: f64 = 0.25;

/// Penalty per change of service.
const INTERCHANGE_PENALTY: f64 = 0.1;

/// Fixed preference by service category.
pub fn type_score(category: ServiceCategory) -> f64 {
    match category {
        ServiceCategory::VandeBharat | ServiceCategory::Rajdhani => 1.0,
        ServiceCategory::Shatabdi | ServiceCategory::Tejas => 0.95,
        ServiceCategory::Duronto => 0.9,
        ServiceCategory::JanShatabdi => 0.8,
        ServiceCategory::GaribRath => 0.75,
        ServiceCategory::Superfast => 0.7,
        ServiceCategory::MailExpress => 0.6,
        ServiceCategory::Passenger => 0.5,
        ServiceCategory::Unclassified => 0.4,
    }
}

fn speed_score(distance_km: f64, duration: Duration) -> f64 {
    let minutes = duration.num_minutes();
    if minutes <= 0 {
        return 0.0;
    }
    let kmh = distance_km / (minutes as f64 / 60.0);
    (kmh / REFERENCE_SPEED_KMH).clamp(0.0, 1.0)
}

fn distance_score(distance_km: f64) -> f64 {
    (distance_km / MAX_DISTANCE_KM).clamp(0.0, 1.0)
}

/// Score of riding a single segment.
pub fn leg_score(leg: &RouteSegment) -> f64 {
    let distance = leg.distance_km();
    SPEED_WEIGHT * speed_score(distance, leg.duration())
        + DISTANCE_WEIGHT * distance_score(distance)
        + TYPE_WEIGHT * type_score(leg.category())
}

/// Score of a whole route.
///
/// `max_wait` is the upper end of the legal waiting window; total waiting is
/// measured against it.
pub fn route_score(route: &RouteResult, max_wait: Duration) -> f64 {
    let legs = route.legs();
    if legs.is_empty() {
        return 0.0;
    }
    let average = legs.iter().map(leg_score).sum::<f64>() / legs.len() as f64;

    let max_wait_mins = max_wait.num_minutes();
    let wait_ratio = if max_wait_mins > 0 {
        route.total_wait().num_minutes() as f64 / max_wait_mins as f64
    } else {
        0.0
    };

    let penalty =
        WAIT_PENALTY * wait_ratio + INTERCHANGE_PENALTY * route.interchange_count() as f64;
    (average - penalty).clamp(0.0, 1.0)
}
