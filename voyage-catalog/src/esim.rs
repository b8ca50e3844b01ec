use serde::{Deserialize, Serialize};

/// A prepaid mobile data plan sold as an eSIM
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EsimPlan {
    pub id: String,
    pub name: String,
    pub region: String,
    /// ISO 3166-1 alpha-2 codes covered by the plan
    pub countries: Vec<String>,
    pub data_mb: i64,
    pub validity_days: i32,
    pub price_cents: i64,
    pub currency: String,
    pub is_active: bool,
}

impl EsimPlan {
    pub fn covers(&self, country: &str) -> bool {
        self.countries.iter().any(|c| c.eq_ignore_ascii_case(country))
    }
}

/// Query filters for plan listing. Empty filter matches every active plan.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanFilter {
    pub country: Option<String>,
    pub region: Option<String>,
}

impl PlanFilter {
    pub fn matches(&self, plan: &EsimPlan) -> bool {
        if !plan.is_active {
            return false;
        }
        if let Some(country) = self.country.as_deref().filter(|c| !c.is_empty()) {
            if !plan.covers(country) {
                return false;
            }
        }
        if let Some(region) = self.region.as_deref().filter(|r| !r.is_empty()) {
            if !plan.region.eq_ignore_ascii_case(region) {
                return false;
            }
        }
        true
    }
}

fn plan(
    id: &str,
    name: &str,
    region: &str,
    countries: &[&str],
    data_gb: i64,
    validity_days: i32,
    price_cents: i64,
) -> EsimPlan {
    EsimPlan {
        id: id.to_string(),
        name: name.to_string(),
        region: region.to_string(),
        countries: countries.iter().map(|c| c.to_string()).collect(),
        data_mb: data_gb * 1024,
        validity_days,
        price_cents,
        currency: "USD".to_string(),
        is_active: true,
    }
}

/// Seed catalog used by the in-memory store and the initial migration.
pub fn default_plans() -> Vec<EsimPlan> {
    const EUROPE: [&str; 10] = ["FR", "DE", "ES", "IT", "PT", "NL", "BE", "AT", "CH", "GB"];
    const ASIA: [&str; 6] = ["IN", "TH", "SG", "MY", "VN", "ID"];

    vec![
        plan("eu-3gb-7d", "Europe Lite", "Europe", &EUROPE, 3, 7, 799),
        plan("eu-10gb-30d", "Europe Traveller", "Europe", &EUROPE, 10, 30, 1999),
        plan("asia-5gb-15d", "Asia Explorer", "Asia", &ASIA, 5, 15, 1299),
        plan("in-2gb-7d", "India Starter", "Asia", &["IN"], 2, 7, 499),
        plan("us-5gb-30d", "USA Unlimited Calls + 5GB", "North America", &["US"], 5, 30, 1599),
        plan("global-20gb-30d", "Global Roamer", "Global", &["US", "GB", "FR", "DE", "IN", "JP", "AU", "AE"], 20, 30, 4999),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_by_country_and_region() {
        let plans = default_plans();

        let fr = PlanFilter { country: Some("fr".to_string()), region: None };
        let ids: Vec<_> = plans.iter().filter(|p| fr.matches(p)).map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["eu-3gb-7d", "eu-10gb-30d", "global-20gb-30d"]);

        let asia_in = PlanFilter { country: Some("IN".to_string()), region: Some("asia".to_string()) };
        assert_eq!(plans.iter().filter(|p| asia_in.matches(p)).count(), 2);
    }

    #[test]
    fn test_inactive_plans_never_match() {
        let mut p = default_plans().remove(0);
        p.is_active = false;
        assert!(!PlanFilter::default().matches(&p));
    }
}
