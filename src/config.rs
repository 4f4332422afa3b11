use std::{env, str::FromStr, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub cart: CartSettings,
}

#[derive(Debug, Clone, Copy)]
pub struct CartSettings {
    /// How many times a mutation is re-applied after losing a version race.
    pub max_attempts: u32,
    /// Deadline for recomputing one cart total against the catalog.
    pub catalog_timeout: Duration,
}

impl Default for CartSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            catalog_timeout: Duration::from_millis(5000),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);
        let jwt_ttl_hours = parse_or("JWT_TTL_HOURS", 24);

        let defaults = CartSettings::default();
        let cart = CartSettings {
            max_attempts: parse_or("CART_MAX_ATTEMPTS", defaults.max_attempts).max(1),
            catalog_timeout: Duration::from_millis(parse_or(
                "CATALOG_TIMEOUT_MS",
                defaults.catalog_timeout.as_millis() as u64,
            )),
        };

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            jwt_ttl_hours,
            cart,
        })
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
