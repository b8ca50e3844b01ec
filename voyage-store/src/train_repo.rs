use async_trait::async_trait;
use tracing::debug;
use voyage_catalog::timetable::default_routes;
use voyage_catalog::Timetable;
use voyage_core::search::{Train, TrainSearchQuery};
use voyage_core::CoreResult;

use crate::repository::TrainRepository;

/// Train search over a static timetable held in process
pub struct TimetableTrainRepository {
    timetable: Timetable,
}

impl TimetableTrainRepository {
    pub fn new(timetable: Timetable) -> Self {
        Self { timetable }
    }

    pub fn with_default_routes() -> Self {
        Self::new(Timetable::new(default_routes()))
    }
}

#[async_trait]
impl TrainRepository for TimetableTrainRepository {
    async fn search(&self, query: &TrainSearchQuery) -> CoreResult<Vec<Train>> {
        let trains = self.timetable.search(query);
        debug!("{} train(s) from {} to {} on {}", trains.len(), query.from, query.to, query.date);
        Ok(trains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn query(from: &str, to: &str, date: NaiveDate) -> TrainSearchQuery {
        TrainSearchQuery {
            from: from.to_string(),
            to: to.to_string(),
            date,
        }
    }

    #[tokio::test]
    async fn test_search_reports_seats_and_fares_per_class() {
        let repo = TimetableTrainRepository::with_default_routes();
        let date = NaiveDate::from_ymd_opt(2026, 12, 2).unwrap();

        let trains = repo.search(&query("BCT", "NDLS", date)).await.unwrap();
        assert_eq!(trains.len(), 1);

        let third_ac = trains[0].classes.iter().find(|c| c.class_code == "3A").unwrap();
        assert_eq!(third_ac.available_seats, 64);
        // 1384 km at 150/km
        assert_eq!(third_ac.price_cents, 207_600);
        assert_eq!(third_ac.currency, "INR");
    }

    #[tokio::test]
    async fn test_unknown_stations_find_nothing() {
        let repo = TimetableTrainRepository::with_default_routes();
        let date = NaiveDate::from_ymd_opt(2026, 12, 2).unwrap();

        assert!(repo.search(&query("XYZ", "NDLS", date)).await.unwrap().is_empty());
        assert!(repo.search(&query("SVDK", "NDLS", date)).await.unwrap().is_empty());
    }
}
