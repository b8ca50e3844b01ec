use crate::models::{EsimOrder, EsimStatus};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use uuid::Uuid;
use voyage_catalog::EsimPlan;

/// ICCIDs start with the telecom industry prefix 89 and our issuer code
const ICCID_PREFIX: &str = "8988";
const ICCID_LEN: usize = 19;
const MATCHING_ID_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ0123456789";

/// Issues eSIM profiles: ICCID, LPA activation code and QR payload
pub struct EsimProvisioner {
    smdp_host: String,
}

impl EsimProvisioner {
    pub fn new(smdp_host: impl Into<String>) -> Self {
        Self {
            smdp_host: smdp_host.into(),
        }
    }

    /// Build the order for a paid plan
    pub fn provision(
        &self,
        user_id: Uuid,
        plan: &EsimPlan,
        payment_reference: Option<String>,
        now: DateTime<Utc>,
    ) -> EsimOrder {
        let activation_code = self.activation_code(&generate_matching_id());

        EsimOrder {
            id: Uuid::new_v4(),
            user_id,
            plan_id: plan.id.clone(),
            plan_name: plan.name.clone(),
            status: EsimStatus::Active,
            iccid: generate_iccid(),
            qr_code: activation_code.clone(),
            activation_code,
            data_mb: plan.data_mb,
            price_cents: plan.price_cents,
            currency: plan.currency.clone(),
            payment_reference,
            expires_at: now + Duration::days(i64::from(plan.validity_days)),
            created_at: now,
        }
    }

    /// GSMA SGP.22 activation code: LPA:1$<SM-DP+ address>$<matching id>
    pub fn activation_code(&self, matching_id: &str) -> String {
        format!("LPA:1${}${}", self.smdp_host, matching_id)
    }
}

fn generate_matching_id() -> String {
    let mut rng = rand::thread_rng();
    (0..4)
        .map(|_| {
            (0..5)
                .map(|_| MATCHING_ID_CHARSET[rng.gen_range(0..MATCHING_ID_CHARSET.len())] as char)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn generate_iccid() -> String {
    let mut rng = rand::thread_rng();
    let mut digits = String::from(ICCID_PREFIX);
    while digits.len() < ICCID_LEN - 1 {
        digits.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    let check = luhn_check_digit(&digits);
    digits.push(char::from(b'0' + check));
    digits
}

/// Luhn (mod 10) check digit for a string of ASCII digits
pub fn luhn_check_digit(payload: &str) -> u8 {
    let sum: u32 = payload
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    ((10 - (sum % 10)) % 10) as u8
}
