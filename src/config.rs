//! Process configuration from environment variables

/// Port used when PORT is unset or unparseable
const DEFAULT_PORT: u16 = 8080;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the server listens on
    pub port: u16,
    /// Supabase project URL (None = persistence disabled)
    pub supabase_url: Option<String>,
    /// Supabase API key
    pub supabase_key: Option<String>,
}

impl Config {
    /// Load config from environment variables
    /// SUPABASE_URL and SUPABASE_KEY must both be set to enable persistence
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let supabase_url = std::env::var("SUPABASE_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let supabase_key = std::env::var("SUPABASE_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if supabase_url.is_some() != supabase_key.is_some() {
            tracing::warn!("SUPABASE_URL and SUPABASE_KEY must both be set to enable persistence");
        }

        Self {
            port,
            supabase_url,
            supabase_key,
        }
    }

    /// Supabase connection parameters, when both are configured
    pub fn supabase(&self) -> Option<(&str, &str)> {
        match (&self.supabase_url, &self.supabase_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }
}
