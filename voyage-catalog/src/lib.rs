pub mod esim;
pub mod pricing;
pub mod timetable;

pub use esim::{EsimPlan, PlanFilter};
pub use pricing::{PriceBreakdown, PricingEngine, PricingRules};
pub use timetable::{Timetable, TrainRoute};
