use serde::{Serialize, Deserialize, Serializer};
use std::fmt;

/// Replacement text for any value that must not reach logs or error reports.
pub const REDACTED: &str = "[REDACTED]";

const SENSITIVE_HEADERS: [&str; 5] = [
    "authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "proxy-authorization",
];

const SENSITIVE_PARAM_FRAGMENTS: [&str; 7] = [
    "password", "token", "secret", "key", "auth", "card", "cvv",
];

/// A wrapper for sensitive data that masks its value in Debug output and can be customized for Serialization.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // API responses carry the real value; only formatting is masked.
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T> From<T> for Masked<T> {
    fn from(value: T) -> Self {
        Masked(value)
    }
}

/// True for request/response headers whose values carry credentials.
pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// True for query/body parameter names that look like credentials or payment data.
pub fn is_sensitive_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SENSITIVE_PARAM_FRAGMENTS
        .iter()
        .any(|fragment| lower.contains(fragment))
}

/// Rewrites a raw query string, replacing the value of every sensitive
/// parameter with [`REDACTED`]. Pair order and all other pairs are kept verbatim.
pub fn redact_query(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }

    query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if is_sensitive_param(name) => format!("{}={}", name, REDACTED),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_hides_value_in_logs() {
        let email = Masked("jane@example.com".to_string());
        assert_eq!(format!("{:?}", email), "********");
        assert_eq!(format!("{}", email), "********");
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"jane@example.com\"");
    }

    #[test]
    fn test_sensitive_headers_are_case_insensitive() {
        assert!(is_sensitive_header("Authorization"));
        assert!(is_sensitive_header("COOKIE"));
        assert!(!is_sensitive_header("content-type"));
    }

    #[test]
    fn test_redact_query_keeps_safe_pairs() {
        let redacted = redact_query("country=FR&api_key=abc123&page=2&access_token=xyz");
        assert_eq!(redacted, "country=FR&api_key=[REDACTED]&page=2&access_token=[REDACTED]");
    }

    #[test]
    fn test_redact_query_handles_flags_and_empty() {
        assert_eq!(redact_query(""), "");
        assert_eq!(redact_query("verbose&password=hunter2"), "verbose&password=[REDACTED]");
    }
}
