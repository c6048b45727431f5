//! Route segment type.
//!
//! A `RouteSegment` is "ride this service from stop i to stop j". It keeps
//! an `Arc<Service>` plus the two indices, so the all-pairs schedule graph
//! holds millions of these cheaply.

use std::sync::Arc;

use chrono::Duration;

use super::{
    ClockTime, DomainError, Service, ServiceCategory, ServiceNumber, StationCode, Stop, StopIndex,
    elapsed_minutes,
};

/// Identity of a segment: service plus board and alight positions.
pub type SegmentKey = (ServiceNumber, StopIndex, StopIndex);

/// One leg on a single service.
///
/// # Invariants
///
/// - `alight_idx > board_idx`
/// - Both indices are valid for the service's stops
/// - Departure at the board stop and arrival at the alight stop resolve to
///   clock times
#[derive(Debug, Clone)]
pub struct RouteSegment {
    service: Arc<Service>,
    board_idx: StopIndex,
    alight_idx: StopIndex,
    departure: ClockTime,
    arrival: ClockTime,
    duration: Duration,
}

impl RouteSegment {
    /// Construct a segment, validating indices and times.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use interchange_engine::domain::{
    ///     RouteSegment, Service, ServiceCategory, ServiceNumber, StationCode, Stop, StopIndex,
    ///     StopTime,
    /// };
    ///
    /// let stop = |code: &str, arr: &str, dep: &str, km: f64| {
    ///     let mut s = Stop::new(
    ///         StationCode::parse(code).unwrap(),
    ///         StopTime::parse(arr),
    ///         StopTime::parse(dep),
    ///     );
    ///     s.distance_km = km;
    ///     s
    /// };
    ///
    /// let service = Arc::new(Service {
    ///     number: ServiceNumber(12001),
    ///     name: "Shatabdi".into(),
    ///     category: ServiceCategory::Shatabdi,
    ///     category_label: "Shatabdi".into(),
    ///     classes: vec!["CC".into()],
    ///     stops: vec![
    ///         stop("NDLS", "Source", "06:00", 0.0),
    ///         stop("AGC", "07:50", "07:55", 195.0),
    ///         stop("GWL", "09:20", "09:25", 313.0),
    ///     ],
    /// });
    ///
    /// let seg = RouteSegment::new(service, StopIndex(0), StopIndex(2)).unwrap();
    /// assert_eq!(seg.duration().num_minutes(), 200);
    /// assert_eq!(seg.distance_km(), 313.0);
    /// ```
    pub fn new(
        service: Arc<Service>,
        board_idx: StopIndex,
        alight_idx: StopIndex,
    ) -> Result<Self, DomainError> {
        if alight_idx.0 <= board_idx.0 {
            return Err(DomainError::InvalidSegment(
                "alight index must be after board index",
            ));
        }

        let board = service
            .stops
            .get(board_idx.0)
            .ok_or(DomainError::InvalidStopIndex)?;
        let alight = service
            .stops
            .get(alight_idx.0)
            .ok_or(DomainError::InvalidStopIndex)?;

        let departure = board.departure_clock()?;
        let arrival = alight.arrival_clock()?;
        let minutes = elapsed_minutes(departure, board.departure_day(), arrival, alight.day_offset);

        Ok(Self {
            service,
            board_idx,
            alight_idx,
            departure,
            arrival,
            duration: Duration::minutes(minutes),
        })
    }

    /// The same ride, alighting earlier at `alight_idx`.
    pub fn truncated_at(&self, alight_idx: StopIndex) -> Result<Self, DomainError> {
        Self::new(self.service.clone(), self.board_idx, alight_idx)
    }

    pub fn service(&self) -> &Arc<Service> {
        &self.service
    }

    pub fn service_number(&self) -> ServiceNumber {
        self.service.number
    }

    pub fn service_name(&self) -> &str {
        &self.service.name
    }

    pub fn category(&self) -> ServiceCategory {
        self.service.category
    }

    pub fn classes(&self) -> &[String] {
        &self.service.classes
    }

    pub fn board_idx(&self) -> StopIndex {
        self.board_idx
    }

    pub fn alight_idx(&self) -> StopIndex {
        self.alight_idx
    }

    pub fn key(&self) -> SegmentKey {
        (self.service.number, self.board_idx, self.alight_idx)
    }

    pub fn board_stop(&self) -> &Stop {
        // Safe: validated at construction
        &self.service.stops[self.board_idx.0]
    }

    pub fn alight_stop(&self) -> &Stop {
        // Safe: validated at construction
        &self.service.stops[self.alight_idx.0]
    }

    pub fn board_station(&self) -> &StationCode {
        &self.board_stop().station
    }

    pub fn alight_station(&self) -> &StationCode {
        &self.alight_stop().station
    }

    pub fn departure_time(&self) -> ClockTime {
        self.departure
    }

    pub fn arrival_time(&self) -> ClockTime {
        self.arrival
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Distance covered, in km. Never negative.
    pub fn distance_km(&self) -> f64 {
        (self.alight_stop().distance_km - self.board_stop().distance_km).max(0.0)
    }

    pub fn board_platform(&self) -> Option<&str> {
        self.board_stop().platform.as_deref()
    }

    pub fn alight_platform(&self) -> Option<&str> {
        self.alight_stop().platform.as_deref()
    }

    /// Every stop on this ride, board and alight inclusive.
    pub fn stops(&self) -> &[Stop] {
        &self.service.stops[self.board_idx.0..=self.alight_idx.0]
    }

    /// Number of stops on this ride, board and alight inclusive.
    pub fn stop_count(&self) -> usize {
        self.alight_idx.0 - self.board_idx.0 + 1
    }
}

impl PartialEq for RouteSegment {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for RouteSegment {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopTime;

    fn code(s: &str) -> StationCode {
        StationCode::parse(s).unwrap()
    }

    fn make_service() -> Arc<Service> {
        let mut stops = vec![
            Stop::new(code("AAA"), StopTime::parse("Source"), StopTime::parse("10:00")),
            Stop::new(code("BBB"), StopTime::parse("10:30"), StopTime::parse("10:32")),
            Stop::new(code("CCC"), StopTime::parse("11:15"), StopTime::parse("Destination")),
        ];
        stops[0].platform = Some("1".into());
        stops[1].distance_km = 40.0;
        stops[2].distance_km = 95.5;
        stops[2].platform = Some("4".into());

        Arc::new(Service {
            number: ServiceNumber(12345),
            name: "Test Express".into(),
            category: ServiceCategory::MailExpress,
            category_label: "Express".into(),
            classes: vec!["SL".into(), "3A".into()],
            stops,
        })
    }

    #[test]
    fn segment_construction_valid() {
        let seg = RouteSegment::new(make_service(), StopIndex(0), StopIndex(2)).unwrap();

        assert_eq!(seg.departure_time().to_string(), "10:00");
        assert_eq!(seg.arrival_time().to_string(), "11:15");
        assert_eq!(seg.duration(), Duration::minutes(75));
        assert_eq!(seg.distance_km(), 95.5);
        assert_eq!(seg.board_station(), &code("AAA"));
        assert_eq!(seg.alight_station(), &code("CCC"));
        assert_eq!(seg.board_platform(), Some("1"));
        assert_eq!(seg.alight_platform(), Some("4"));
        assert_eq!(seg.service_number(), ServiceNumber(12345));
        assert_eq!(seg.classes(), &["SL".to_string(), "3A".to_string()]);
    }

    #[test]
    fn segment_itinerary() {
        let seg = RouteSegment::new(make_service(), StopIndex(1), StopIndex(2)).unwrap();
        let stops = seg.stops();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].station, code("BBB"));
        assert_eq!(stops[1].station, code("CCC"));
        assert_eq!(seg.stop_count(), 2);
        assert_eq!(seg.distance_km(), 55.5);
        assert_eq!(seg.duration(), Duration::minutes(43));
    }

    #[test]
    fn truncation_keeps_boarding() {
        let seg = RouteSegment::new(make_service(), StopIndex(0), StopIndex(2)).unwrap();
        let short = seg.truncated_at(StopIndex(1)).unwrap();
        assert_eq!(short.board_idx(), StopIndex(0));
        assert_eq!(short.alight_station(), &code("BBB"));
        assert_eq!(short.duration(), Duration::minutes(30));
    }

    #[test]
    fn rejects_backwards_and_out_of_bounds() {
        let service = make_service();
        assert!(matches!(
            RouteSegment::new(service.clone(), StopIndex(2), StopIndex(1)),
            Err(DomainError::InvalidSegment(_))
        ));
        assert!(matches!(
            RouteSegment::new(service.clone(), StopIndex(1), StopIndex(1)),
            Err(DomainError::InvalidSegment(_))
        ));
        assert!(matches!(
            RouteSegment::new(service, StopIndex(0), StopIndex(9)),
            Err(DomainError::InvalidStopIndex)
        ));
    }

    #[test]
    fn overnight_duration_uses_day_offset() {
        let mut stops = vec![
            Stop::new(code("NDLS"), StopTime::NotApplicable, StopTime::parse("22:00")),
            Stop::new(code("BPL"), StopTime::parse("06:30"), StopTime::NotApplicable),
        ];
        stops[1].day_offset = 1;
        stops[1].distance_km = 700.0;
        let service = Arc::new(Service {
            number: ServiceNumber(12002),
            name: "Night".into(),
            category: ServiceCategory::Rajdhani,
            category_label: "Rajdhani".into(),
            classes: vec![],
            stops,
        });

        let seg = RouteSegment::new(service, StopIndex(0), StopIndex(1)).unwrap();
        assert_eq!(seg.duration(), Duration::minutes(510));
    }

    #[test]
    fn boarding_at_a_midnight_halt() {
        let mut stops = vec![
            Stop::new(code("AAA"), StopTime::NotApplicable, StopTime::parse("22:00")),
            Stop::new(code("BBB"), StopTime::parse("23:55"), StopTime::parse("00:05")),
            Stop::new(code("CCC"), StopTime::parse("01:00"), StopTime::NotApplicable),
        ];
        stops[2].day_offset = 1;
        let service = Arc::new(Service {
            number: ServiceNumber(12424),
            name: "Late".into(),
            category: ServiceCategory::Rajdhani,
            category_label: "Rajdhani".into(),
            classes: vec![],
            stops,
        });

        let through = RouteSegment::new(service.clone(), StopIndex(0), StopIndex(2)).unwrap();
        let from_halt = RouteSegment::new(service.clone(), StopIndex(1), StopIndex(2)).unwrap();
        let to_halt = RouteSegment::new(service, StopIndex(0), StopIndex(1)).unwrap();
        assert_eq!(through.duration(), Duration::minutes(180));
        assert_eq!(from_halt.duration(), Duration::minutes(55));
        assert_eq!(to_halt.duration(), Duration::minutes(115));
    }

    #[test]
    fn equality_by_key() {
        let service = make_service();
        let a = RouteSegment::new(service.clone(), StopIndex(0), StopIndex(1)).unwrap();
        let b = RouteSegment::new(service.clone(), StopIndex(0), StopIndex(1)).unwrap();
        let c = RouteSegment::new(service, StopIndex(0), StopIndex(2)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
