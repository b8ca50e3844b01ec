pub mod auth;
pub mod rate_limit;
pub mod reporting;

pub use auth::auth_middleware;
pub use rate_limit::rate_limit_middleware;
pub use reporting::error_reporting_middleware;
