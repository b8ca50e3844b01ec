use std::sync::Arc;
use tracing::{error, warn};
use voyage_catalog::PricingEngine;
use voyage_core::identity::TokenIssuer;
use voyage_order::{BookingManager, EsimProvisioner, MockPaymentAdapter, PaymentOrchestrator};
use voyage_store::app_config::{BusinessRules, Config};
use voyage_store::memory::{
    InMemoryBookingRepository, InMemoryEsimRepository, InMemorySessionStore, InMemoryUserRepository,
};
use voyage_store::{
    BookingRepository, EsimRepository, SessionStore, TimetableTrainRepository, TrainRepository,
    UserRepository,
};

/// The storage backends the API runs against
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub esims: Arc<dyn EsimRepository>,
    pub trains: Arc<dyn TrainRepository>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            bookings: Arc::new(InMemoryBookingRepository::new()),
            esims: Arc::new(InMemoryEsimRepository::default()),
            trains: Arc::new(TimetableTrainRepository::with_default_routes()),
            sessions: Arc::new(InMemorySessionStore::new()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub esims: Arc<dyn EsimRepository>,
    pub trains: Arc<dyn TrainRepository>,
    pub sessions: Arc<dyn SessionStore>,
    pub tokens: Arc<TokenIssuer>,
    pub booking_manager: Arc<BookingManager>,
    pub payments: Arc<PaymentOrchestrator>,
    pub provisioner: Arc<EsimProvisioner>,
    pub business_rules: BusinessRules,
}

impl AppState {
    /// `rules` may differ from `config.business_rules` once database overrides are applied.
    pub fn new(config: &Config, rules: BusinessRules, stores: Stores) -> Self {
        let booking_manager = BookingManager::new(
            PricingEngine::new(rules.pricing_rules()),
            rules.refund_policy(),
        );

        Self {
            users: stores.users,
            bookings: stores.bookings,
            esims: stores.esims,
            trains: stores.trains,
            sessions: stores.sessions,
            tokens: Arc::new(TokenIssuer::new(
                config.auth.jwt_secret.clone(),
                config.auth.jwt_expiration_seconds,
            )),
            booking_manager: Arc::new(booking_manager),
            payments: Arc::new(PaymentOrchestrator::new(Arc::new(MockPaymentAdapter))),
            provisioner: Arc::new(EsimProvisioner::new(config.esim.smdp_host.clone())),
            business_rules: rules,
        }
    }

    /// Gives a charge back in full when the record it paid for could not be saved.
    pub async fn refund_unsaved_charge(&self, payment_reference: Option<&str>, amount_cents: i64) {
        let Some(reference) = payment_reference else {
            return;
        };
        match self.payments.refund(Some(reference), amount_cents).await {
            Ok(_) => warn!("Refunded charge {} after failing to save its record", reference),
            Err(err) => error!("Charge {} was not saved and could not be refunded: {}", reference, err),
        }
    }
}
