use crate::services::leveling::DEFAULT_BASE_XP_PER_LEVEL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Experience needed per level. Values ≤ 0 are replaced by the default
    /// when the leveling service is built.
    pub base_xp_per_level: i64,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_env("PORT", 3001),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "progression.db".into()),
            base_xp_per_level: parse_env("BASE_XP_PER_LEVEL", DEFAULT_BASE_XP_PER_LEVEL),
            log_format,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| parse_or_warn(key, &raw))
        .unwrap_or(default)
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(key, value = raw, "unparsable config value, using default");
    }
    parsed
}
