use serde::Deserialize;
use std::env;
use voyage_catalog::PricingRules;
use voyage_order::RefundPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
    pub esim: EsimConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub tax_rate: f64,
    pub service_fee_cents: i64,
    pub full_refund_hours: i64,
    pub partial_refund_hours: i64,
    pub partial_refund_percent: u8,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: i64,
}

fn default_rate_limit() -> i64 { 100 }

impl BusinessRules {
    pub fn pricing_rules(&self) -> PricingRules {
        PricingRules {
            tax_rate: self.tax_rate,
            service_fee_cents: self.service_fee_cents,
        }
    }

    pub fn refund_policy(&self) -> RefundPolicy {
        RefundPolicy {
            full_refund_hours: self.full_refund_hours,
            partial_refund_hours: self.partial_refund_hours,
            partial_refund_percent: self.partial_refund_percent,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

fn default_host() -> String { "0.0.0.0".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// When unset the API runs on in-memory stores
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: None, max_connections: default_max_connections() }
    }
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RedisConfig {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EsimConfig {
    pub smdp_host: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment, e.g. `VOYAGE_SERVER__PORT=8080`
            .add_source(config::Environment::with_prefix("VOYAGE").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Build from inline TOML, layering `overrides` on top of `base`
    pub fn from_toml(base: &str, overrides: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(base, config::FileFormat::Toml));
        if let Some(extra) = overrides {
            builder = builder.add_source(config::File::from_str(extra, config::FileFormat::Toml));
        }
        builder.build()?.try_deserialize()
    }
}
