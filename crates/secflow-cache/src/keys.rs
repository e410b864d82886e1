//! Key generation for everything this service writes to Redis.

/// Namespace all keys are built under, so several deployments can share
/// one Redis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new("secflow")
    }
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn build(&self, parts: &[&str]) -> String {
        format!("{}:{}", self.prefix, parts.join(":"))
    }

    /// Key for one refresh token.
    pub fn refresh_token(&self, subject: &str, jti: &str) -> String {
        self.build(&["refresh", subject, jti])
    }

    /// Prefix shared by every refresh token of a subject.
    pub fn refresh_prefix(&self, subject: &str) -> String {
        format!("{}:", self.build(&["refresh", subject]))
    }

    /// SCAN pattern matching every refresh token of a subject.
    pub fn refresh_pattern(&self, subject: &str) -> String {
        format!("{}*", self.refresh_prefix(subject))
    }

    /// Counter key for one client in one window of a rate-limit scope.
    pub fn rate_limit(&self, scope: &str, client: &str, window_index: u64) -> String {
        self.build(&["ratelimit", scope, client, &window_index.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_token_key() {
        let keys = KeySpace::default();
        assert_eq!(keys.refresh_token("u1", "abc"), "secflow:refresh:u1:abc");
    }

    #[test]
    fn test_refresh_pattern_covers_token_keys() {
        let keys = KeySpace::new("app");
        let pattern = keys.refresh_pattern("u1");
        assert_eq!(pattern, "app:refresh:u1:*");
        assert!(keys.refresh_token("u1", "x").starts_with(&keys.refresh_prefix("u1")));
    }

    #[test]
    fn test_subject_prefix_does_not_match_longer_subject() {
        let keys = KeySpace::default();
        assert!(!keys.refresh_token("u10", "x").starts_with(&keys.refresh_prefix("u1")));
    }

    #[test]
    fn test_rate_limit_key() {
        let keys = KeySpace::default();
        assert_eq!(
            keys.rate_limit("auth", "10.0.0.1", 42),
            "secflow:ratelimit:auth:10.0.0.1:42"
        );
    }
}
