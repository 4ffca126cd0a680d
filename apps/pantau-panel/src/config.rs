use std::collections::HashMap;
use std::env;

/// Runtime configuration, loaded once from the environment (.env via
/// dotenvy in main). Every knob has a development default so `pantau
/// serve` works out of the box.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_port: u16,
    /// brand -> API key for the external report path.
    pub api_keys: HashMap<String, String>,
    pub allowed_origins: Vec<String>,
    pub session_timeout: chrono::Duration,
    pub users_file: String,
}

impl AppConfig {
    pub fn load() -> Self {
        let mut api_keys = HashMap::new();
        api_keys.insert(
            "slot603".to_string(),
            env::var("SLOT603_API_KEY").unwrap_or_else(|_| "SLOT603-KEY".to_string()),
        );
        api_keys.insert(
            "netpro".to_string(),
            env::var("NETPRO_API_KEY").unwrap_or_else(|_| "NETPRO-KEY".to_string()),
        );

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:8501,http://127.0.0.1:8501".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let timeout_hours: i64 = env::var("SESSION_TIMEOUT_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4);

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://pantau.db".to_string()),
            listen_port: env::var("PANEL_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            api_keys,
            allowed_origins,
            session_timeout: chrono::Duration::hours(timeout_hours),
            users_file: env::var("USERS_FILE").unwrap_or_else(|_| "users.json".to_string()),
        }
    }

    /// Brands allowed on the write paths. The whitelist is exactly the set
    /// of brands that have an API key configured.
    pub fn valid_brands(&self) -> Vec<String> {
        let mut brands: Vec<String> = self.api_keys.keys().cloned().collect();
        brands.sort();
        brands
    }

    pub fn key_for_brand(&self, brand: &str) -> Option<&str> {
        self.api_keys.get(brand).map(|s| s.as_str())
    }
}
