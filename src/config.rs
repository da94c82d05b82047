use std::{env, fmt, str::FromStr};

use anyhow::{Context, Result};
use dotenvy::dotenv;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Logging
    pub log_dir: String,
    pub log_level: String,

    pub run_migrations: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("server_addr", &self.server_addr)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("rate_login_per_min", &self.rate_login_per_min)
            .field("rate_protected_per_min", &self.rate_protected_per_min)
            .field("api_prefix", &self.api_prefix)
            .field("log_dir", &self.log_dir)
            .field("log_level", &self.log_level)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed_or("ACCESS_TOKEN_TTL", 900)?, // default 15 min

            rate_login_per_min: parsed_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            run_migrations: parsed_or("RUN_MIGRATIONS", true)?,
        })
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "mysql://localhost/performance360_test".to_string(),
        jwt_secret: "test-secret-key-for-testing-only-32chars".to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        access_token_ttl: 900,
        rate_login_per_min: 60,
        rate_protected_per_min: 1000,
        api_prefix: "/api".to_string(),
        log_dir: "logs".to_string(),
        log_level: "debug".to_string(),
        run_migrations: false,
    }
}
