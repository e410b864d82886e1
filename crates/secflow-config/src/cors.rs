use std::env;

/// Allowed CORS origins.
///
/// `ALLOWED_ORIGINS` is a comma separated list. A `*` entry allows any
/// origin, in which case credentialed requests are not allowed.
#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: parse_origins("http://localhost:3000,http://localhost:8080"),
        }
    }
}

impl CorsConfig {
    pub fn from_env() -> Self {
        match env::var("ALLOWED_ORIGINS") {
            Ok(raw) => Self {
                allowed_origins: parse_origins(&raw),
            },
            Err(_) => Self::default(),
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
