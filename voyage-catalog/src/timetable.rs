use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use voyage_core::search::{format_duration, Train, TrainClass, TrainSearchQuery};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// A calling point, with offsets measured from departure at the origin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub station: String,
    pub arrival_offset_min: i64,
    pub departure_offset_min: i64,
    pub distance_km: i64,
}

/// Seat class with distance-based fare
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassFare {
    pub code: String,
    pub name: String,
    pub capacity: i32,
    pub rate_per_km_cents: i64,
    pub min_fare_cents: i64,
}

impl ClassFare {
    pub fn fare_for(&self, distance_km: i64) -> i64 {
        (distance_km * self.rate_per_km_cents).max(self.min_fare_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainRoute {
    pub number: String,
    pub name: String,
    pub origin_departure: NaiveTime,
    pub stops: Vec<Stop>,
    /// Weekdays on which the train leaves its origin
    pub runs_on: Vec<Weekday>,
    pub classes: Vec<ClassFare>,
    pub currency: String,
}

impl TrainRoute {
    fn stop_index(&self, station: &str) -> Option<usize> {
        self.stops.iter().position(|s| s.station == station)
    }

    /// The query date is local to the boarding stop; walk back to the date the train left its origin.
    pub fn origin_date(&self, boarding: &Stop, date: NaiveDate) -> NaiveDate {
        let origin_minutes = i64::from(self.origin_departure.num_seconds_from_midnight()) / 60;
        let day_shift = (origin_minutes + boarding.departure_offset_min) / MINUTES_PER_DAY;
        date - Duration::days(day_shift)
    }

    /// Builds the search result for one leg of this route, if it serves the query.
    pub fn leg(&self, query: &TrainSearchQuery) -> Option<Train> {
        let from_idx = self.stop_index(&query.from)?;
        let to_idx = self.stop_index(&query.to)?;
        if from_idx >= to_idx {
            return None;
        }
        let from = &self.stops[from_idx];
        let to = &self.stops[to_idx];

        let origin_date = self.origin_date(from, query.date);
        if !self.runs_on.contains(&origin_date.weekday()) {
            return None;
        }

        let origin_start = NaiveDateTime::new(origin_date, self.origin_departure);
        let departure_time = origin_start + Duration::minutes(from.departure_offset_min);
        let arrival_time = origin_start + Duration::minutes(to.arrival_offset_min);
        let duration_minutes = to.arrival_offset_min - from.departure_offset_min;
        let distance = to.distance_km - from.distance_km;

        let classes = self
            .classes
            .iter()
            .map(|class| TrainClass {
                class_code: class.code.clone(),
                class_name: class.name.clone(),
                available_seats: class.capacity,
                price_cents: class.fare_for(distance),
                currency: self.currency.clone(),
            })
            .collect();

        Some(Train {
            train_number: self.number.clone(),
            train_name: self.name.clone(),
            from: from.station.clone(),
            to: to.station.clone(),
            departure_time,
            arrival_time,
            duration_minutes,
            duration: format_duration(duration_minutes),
            classes,
        })
    }
}

/// Static timetable of routes
#[derive(Debug, Clone, Default)]
pub struct Timetable {
    routes: Vec<TrainRoute>,
}

impl Timetable {
    pub fn new(routes: Vec<TrainRoute>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[TrainRoute] {
        &self.routes
    }

    /// Every route calling at `from` before `to` on the requested date, earliest departure first.
    pub fn search(&self, query: &TrainSearchQuery) -> Vec<Train> {
        let mut trains: Vec<Train> = self
            .routes
            .iter()
            .filter_map(|route| route.leg(query))
            .collect();
        trains.sort_by(|a, b| a.departure_time.cmp(&b.departure_time));
        trains
    }
}

fn stop(station: &str, arrival: i64, departure: i64, distance_km: i64) -> Stop {
    Stop {
        station: station.to_string(),
        arrival_offset_min: arrival,
        departure_offset_min: departure,
        distance_km,
    }
}

fn class(code: &str, name: &str, capacity: i32, rate: i64, min_fare: i64) -> ClassFare {
    ClassFare {
        code: code.to_string(),
        name: name.to_string(),
        capacity,
        rate_per_km_cents: rate,
        min_fare_cents: min_fare,
    }
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

const DAILY: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Seed timetable used by the in-memory train repository.
pub fn default_routes() -> Vec<TrainRoute> {
    let sleeper_classes = || {
        vec![
            class("1A", "First AC", 24, 350, 150_000),
            class("2A", "AC 2 Tier", 48, 210, 90_000),
            class("3A", "AC 3 Tier", 64, 150, 60_000),
        ]
    };
    let chair_classes = || {
        vec![
            class("CC", "AC Chair Car", 78, 130, 40_000),
            class("EC", "Executive Chair Car", 52, 260, 80_000),
        ]
    };

    vec![
        TrainRoute {
            number: "12951".to_string(),
            name: "Mumbai Rajdhani".to_string(),
            origin_departure: time(17, 0),
            stops: vec![
                stop("BCT", 0, 0, 0),
                stop("ST", 160, 163, 263),
                stop("BRC", 250, 260, 392),
                stop("RTM", 440, 443, 653),
                stop("KOTA", 640, 650, 918),
                stop("NDLS", 932, 932, 1384),
            ],
            runs_on: DAILY.to_vec(),
            classes: sleeper_classes(),
            currency: "INR".to_string(),
        },
        TrainRoute {
            number: "12952".to_string(),
            name: "New Delhi Rajdhani".to_string(),
            origin_departure: time(16, 55),
            stops: vec![
                stop("NDLS", 0, 0, 0),
                stop("KOTA", 283, 293, 466),
                stop("RTM", 490, 493, 731),
                stop("BRC", 660, 670, 992),
                stop("ST", 780, 785, 1121),
                stop("BCT", 935, 935, 1384),
            ],
            runs_on: DAILY.to_vec(),
            classes: sleeper_classes(),
            currency: "INR".to_string(),
        },
        TrainRoute {
            number: "12002".to_string(),
            name: "Bhopal Shatabdi".to_string(),
            origin_departure: time(6, 0),
            stops: vec![
                stop("NDLS", 0, 0, 0),
                stop("AGC", 118, 120, 195),
                stop("GWL", 190, 193, 313),
                stop("JHS", 260, 265, 411),
                stop("BPL", 450, 450, 702),
            ],
            runs_on: DAILY.iter().copied().filter(|d| *d != Weekday::Fri).collect(),
            classes: chair_classes(),
            currency: "INR".to_string(),
        },
        TrainRoute {
            number: "12050".to_string(),
            name: "Gatimaan Express".to_string(),
            origin_departure: time(8, 10),
            stops: vec![
                stop("NDLS", 0, 0, 0),
                stop("AGC", 100, 105, 188),
                stop("GWL", 180, 182, 306),
                stop("JHS", 265, 265, 403),
            ],
            runs_on: DAILY.iter().copied().filter(|d| *d != Weekday::Fri).collect(),
            classes: chair_classes(),
            currency: "INR".to_string(),
        },
        TrainRoute {
            number: "22439".to_string(),
            name: "Vande Bharat Express".to_string(),
            origin_departure: time(6, 0),
            stops: vec![
                stop("NDLS", 0, 0, 0),
                stop("UMB", 120, 122, 199),
                stop("LDH", 179, 181, 312),
                stop("JAT", 390, 392, 577),
                stop("SVDK", 480, 480, 655),
            ],
            runs_on: DAILY.iter().copied().filter(|d| *d != Weekday::Tue).collect(),
            classes: chair_classes(),
            currency: "INR".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(from: &str, to: &str, date: NaiveDate) -> TrainSearchQuery {
        TrainSearchQuery {
            from: from.to_string(),
            to: to.to_string(),
            date,
        }
    }

    #[test]
    fn test_search_finds_intermediate_leg() {
        let timetable = Timetable::new(default_routes());
        let date = NaiveDate::from_ymd_opt(2026, 12, 2).unwrap(); // Wednesday

        let trains = timetable.search(&query("ST", "KOTA", date));
        assert_eq!(trains.len(), 1);

        let train = &trains[0];
        assert_eq!(train.train_number, "12951");
        assert_eq!(train.departure_time, date.and_hms_opt(19, 43, 0).unwrap());
        assert_eq!(train.duration_minutes, 477);
        assert_eq!(train.duration, "7h 57m");

        // 655 km at 150/km in 3A
        let third_ac = train.classes.iter().find(|c| c.class_code == "3A").unwrap();
        assert_eq!(third_ac.price_cents, 98_250);
        assert_eq!(third_ac.available_seats, 64);
    }

    #[test]
    fn test_direction_matters() {
        let timetable = Timetable::new(default_routes());
        let date = NaiveDate::from_ymd_opt(2026, 12, 2).unwrap();

        let northbound = timetable.search(&query("BCT", "NDLS", date));
        assert_eq!(northbound.len(), 1);
        assert_eq!(northbound[0].train_number, "12951");

        let southbound = timetable.search(&query("NDLS", "BCT", date));
        assert_eq!(southbound[0].train_number, "12952");
    }

    #[test]
    fn test_overnight_boarding_uses_origin_weekday() {
        let timetable = Timetable::new(default_routes());
        let route = &timetable.routes()[1];

        // 12952 reaches ST at 06:00 the day after it leaves NDLS
        let boarding = NaiveDate::from_ymd_opt(2026, 12, 3).unwrap();
        let surat = route.stops.iter().find(|s| s.station == "ST").unwrap();
        let origin = route.origin_date(surat, boarding);
        assert_eq!(origin, NaiveDate::from_ymd_opt(2026, 12, 2).unwrap());

        let trains = timetable.search(&query("ST", "BCT", boarding));
        assert_eq!(trains.len(), 1);
        assert_eq!(trains[0].departure_time, boarding.and_hms_opt(6, 0, 0).unwrap());
    }

    #[test]
    fn test_running_days() {
        let timetable = Timetable::new(default_routes());
        let friday = NaiveDate::from_ymd_opt(2026, 12, 4).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2026, 12, 5).unwrap();

        assert!(timetable.search(&query("NDLS", "BPL", friday)).is_empty());

        let trains = timetable.search(&query("NDLS", "BPL", saturday));
        assert_eq!(trains.len(), 1);
        let ec = trains[0].classes.iter().find(|c| c.class_code == "EC").unwrap();
        assert_eq!(ec.available_seats, 52);
    }

    #[test]
    fn test_results_sorted_by_departure() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 2).unwrap();

        // Seed order lists the 08:10 train ahead of the 06:00 one
        let mut routes = default_routes();
        routes.reverse();
        let timetable = Timetable::new(routes);

        let trains = timetable.search(&query("NDLS", "AGC", date));
        let numbers: Vec<&str> = trains.iter().map(|t| t.train_number.as_str()).collect();
        assert_eq!(numbers, vec!["12002", "12050"]);
        assert_eq!(trains[0].departure_time, date.and_hms_opt(6, 0, 0).unwrap());
        assert_eq!(trains[1].departure_time, date.and_hms_opt(8, 10, 0).unwrap());
    }
}
