pub mod models;
pub mod manager;
pub mod finance;
pub mod provisioning;
pub mod orchestrator;

pub use models::{Booking, BookingDetails, BookingStatus, BookingType, EsimOrder, EsimStatus, FlightDetails, HotelDetails};
pub use manager::{BookingError, BookingManager};
pub use finance::RefundPolicy;
pub use provisioning::EsimProvisioner;
pub use orchestrator::{MockPaymentAdapter, PaymentOrchestrator};
