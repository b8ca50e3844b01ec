use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;
use voyage_catalog::{PriceBreakdown, PricingEngine};
use voyage_core::{CoreError, CoreResult};

/// Hotels hand over rooms at this time (UTC) on the check-in date
pub const HOTEL_CHECK_IN_HOUR: u32 = 14;
pub const MAX_FLIGHT_PASSENGERS: u32 = 9;

fn default_currency() -> String {
    "USD".to_string()
}

fn default_cabin() -> String {
    "ECONOMY".to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingType {
    Hotel,
    Flight,
}

impl BookingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingType::Hotel => "HOTEL",
            BookingType::Flight => "FLIGHT",
        }
    }
}

/// Type-specific booking payload. Tagging on `type` makes every booking exactly one kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "bookingData", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingDetails {
    Hotel(HotelDetails),
    Flight(FlightDetails),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HotelDetails {
    pub hotel_id: Option<String>,
    pub hotel_name: String,
    pub city: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub rooms: u32,
    pub guests: u32,
    pub nightly_rate_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlightDetails {
    pub airline: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_at: DateTime<Utc>,
    pub return_at: Option<DateTime<Utc>>,
    pub passengers: u32,
    #[serde(default = "default_cabin")]
    pub cabin_class: String,
    pub fare_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn require(condition: bool, message: &str) -> CoreResult<()> {
    if condition {
        Ok(())
    } else {
        Err(CoreError::ValidationError(message.to_string()))
    }
}

fn validate_currency(currency: &str) -> CoreResult<()> {
    require(
        currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()),
        "currency must be a 3-letter ISO code",
    )
}

impl HotelDetails {
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    fn validate(&self) -> CoreResult<()> {
        require(!self.hotel_name.trim().is_empty(), "hotelName is required")?;
        require(!self.city.trim().is_empty(), "city is required")?;
        require(self.check_out > self.check_in, "checkOut must be after checkIn")?;
        require(self.rooms >= 1, "at least one room is required")?;
        require(self.guests >= self.rooms, "every room needs at least one guest")?;
        require(self.nightly_rate_cents > 0, "nightlyRateCents must be positive")?;
        validate_currency(&self.currency)
    }
}

impl FlightDetails {
    fn validate(&self) -> CoreResult<()> {
        require(!self.airline.trim().is_empty(), "airline is required")?;
        require(!self.flight_number.trim().is_empty(), "flightNumber is required")?;
        require(
            !self.origin.trim().is_empty() && !self.destination.trim().is_empty(),
            "origin and destination are required",
        )?;
        require(
            !self.origin.trim().eq_ignore_ascii_case(self.destination.trim()),
            "origin and destination must differ",
        )?;
        require(
            (1..=MAX_FLIGHT_PASSENGERS).contains(&self.passengers),
            "passengers must be between 1 and 9",
        )?;
        if let Some(return_at) = self.return_at {
            require(return_at > self.departure_at, "returnAt must be after departureAt")?;
        }
        require(self.fare_cents > 0, "fareCents must be positive")?;
        validate_currency(&self.currency)
    }
}

impl BookingDetails {
    pub fn booking_type(&self) -> BookingType {
        match self {
            BookingDetails::Hotel(_) => BookingType::Hotel,
            BookingDetails::Flight(_) => BookingType::Flight,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        match self {
            BookingDetails::Hotel(hotel) => hotel.validate(),
            BookingDetails::Flight(flight) => flight.validate(),
        }
    }

    /// When the booked service begins; cancellation windows are measured against it.
    pub fn service_start(&self) -> DateTime<Utc> {
        match self {
            BookingDetails::Hotel(hotel) => {
                let check_in_time = NaiveTime::from_hms_opt(HOTEL_CHECK_IN_HOUR, 0, 0).unwrap_or_default();
                hotel.check_in.and_time(check_in_time).and_utc()
            }
            BookingDetails::Flight(flight) => flight.departure_at,
        }
    }

    pub fn quote(&self, pricing: &PricingEngine) -> CoreResult<PriceBreakdown> {
        match self {
            BookingDetails::Hotel(hotel) => pricing.quote_stay(
                hotel.nights(),
                hotel.rooms,
                hotel.nightly_rate_cents,
                &hotel.currency,
            ),
            BookingDetails::Flight(flight) => {
                pricing.quote_fare(flight.passengers, flight.fare_cents, &flight.currency)
            }
        }
    }

    /// One-line summary for payment descriptors and logs
    pub fn describe(&self) -> String {
        match self {
            BookingDetails::Hotel(h) => format!("{} ({} nights)", h.hotel_name, h.nights()),
            BookingDetails::Flight(f) => format!("{} {} {}-{}", f.airline, f.flight_number, f.origin, f.destination),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Confirmed => write!(f, "CONFIRMED"),
            BookingStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(CoreError::StorageError(format!("Unknown booking status: {}", other))),
        }
    }
}

/// A user-owned reservation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub reference: String,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub details: BookingDetails,
    pub status: BookingStatus,
    pub price: PriceBreakdown,
    pub payment_reference: Option<String>,
    pub refund_cents: Option<i64>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EsimStatus {
    Active,
    Expired,
}

impl fmt::Display for EsimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EsimStatus::Active => write!(f, "ACTIVE"),
            EsimStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

impl FromStr for EsimStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(EsimStatus::Active),
            "EXPIRED" => Ok(EsimStatus::Expired),
            other => Err(CoreError::StorageError(format!("Unknown eSIM status: {}", other))),
        }
    }
}

/// A purchased data plan with its activation material
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EsimOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: String,
    pub plan_name: String,
    pub status: EsimStatus,
    pub iccid: String,
    pub activation_code: String,
    pub qr_code: String,
    pub data_mb: i64,
    pub price_cents: i64,
    pub currency: String,
    pub payment_reference: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl EsimOrder {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Stored status, downgraded to EXPIRED once the validity window has passed
    pub fn effective_status(&self, now: DateTime<Utc>) -> EsimStatus {
        if now >= self.expires_at {
            EsimStatus::Expired
        } else {
            self.status
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voyage_catalog::PricingRules;

    fn hotel_json() -> serde_json::Value {
        serde_json::json!({
            "type": "HOTEL",
            "bookingData": {
                "hotelName": "Grand Budapest",
                "city": "Zubrowka",
                "checkIn": "2026-12-20",
                "checkOut": "2026-12-23",
                "rooms": 1,
                "guests": 2,
                "nightlyRateCents": 15000
            }
        })
    }

    #[test]
    fn test_booking_details_tagging() {
        let details: BookingDetails = serde_json::from_value(hotel_json()).unwrap();
        assert_eq!(details.booking_type(), BookingType::Hotel);
        assert!(details.validate().is_ok());

        if let BookingDetails::Hotel(hotel) = &details {
            assert_eq!(hotel.nights(), 3);
            assert_eq!(hotel.currency, "USD");
        }

        // Unknown discriminators are rejected at the boundary
        let bad = serde_json::json!({ "type": "CRUISE", "bookingData": {} });
        assert!(serde_json::from_value::<BookingDetails>(bad).is_err());
    }

    #[test]
    fn test_hotel_validation() {
        let mut value = hotel_json();
        value["bookingData"]["checkOut"] = serde_json::json!("2026-12-20");
        let details: BookingDetails = serde_json::from_value(value).unwrap();
        assert!(details.validate().is_err());
    }

    #[test]
    fn test_flight_validation_and_quote() {
        let details: BookingDetails = serde_json::from_value(serde_json::json!({
            "type": "FLIGHT",
            "bookingData": {
                "airline": "Oceanic",
                "flightNumber": "OA815",
                "origin": "SYD",
                "destination": "LAX",
                "departureAt": "2026-12-22T10:00:00Z",
                "passengers": 2,
                "fareCents": 45000
            }
        }))
        .unwrap();
        assert!(details.validate().is_ok());
        assert_eq!(details.service_start().to_rfc3339(), "2026-12-22T10:00:00+00:00");

        let quote = details.quote(&PricingEngine::new(PricingRules::default())).unwrap();
        assert_eq!(quote.base_cents, 90_000);

        if let BookingDetails::Flight(mut flight) = details {
            flight.destination = "syd".to_string();
            assert!(BookingDetails::Flight(flight).validate().is_err());
        }
    }

    #[test]
    fn test_booking_serializes_flat() {
        let details: BookingDetails = serde_json::from_value(hotel_json()).unwrap();
        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            reference: "VYABC234".to_string(),
            user_id: Uuid::new_v4(),
            price: details.quote(&PricingEngine::new(PricingRules::default())).unwrap(),
            details,
            status: BookingStatus::Confirmed,
            payment_reference: None,
            refund_cents: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        };

        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["type"], "HOTEL");
        assert_eq!(json["bookingData"]["hotelName"], "Grand Budapest");
        assert_eq!(json["status"], "CONFIRMED");
        assert_eq!(json["price"]["baseCents"], 45_000);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("CANCELLED".parse::<BookingStatus>().unwrap(), BookingStatus::Cancelled);
        assert!("PENDING".parse::<BookingStatus>().is_err());
        assert_eq!(EsimStatus::Active.to_string(), "ACTIVE");
    }
}
