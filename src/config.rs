use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    pub default_users: bool,
    pub admin_password: String,
    pub teacher_password: String,
    pub demo_data: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub backend: LedgerBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub seed: SeedConfig,
}

/// Seven days.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 7 * 24 * 60;
/// One leap year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 366 * 24 * 60;

/// `JWT_TTL_MINUTES` falls back to the default when unset and is clamped to
/// `1..=MAX_TOKEN_TTL_MINUTES`.
pub fn token_ttl_minutes(raw: Option<i64>) -> i64 {
    raw.unwrap_or(DEFAULT_TOKEN_TTL_MINUTES)
        .clamp(1, MAX_TOKEN_TTL_MINUTES)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match std::env::var("LEDGER_BACKEND")
            .unwrap_or_else(|_| "postgres".into())
            .to_lowercase()
            .as_str()
        {
            "postgres" => LedgerBackend::Postgres,
            "memory" => LedgerBackend::Memory,
            other => bail!("unknown LEDGER_BACKEND '{other}' (expected postgres or memory)"),
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if backend == LedgerBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL is required when LEDGER_BACKEND=postgres");
        }

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is required")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "gradebook".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "gradebook-users".into()),
            ttl_minutes: token_ttl_minutes(env_parse("JWT_TTL_MINUTES")),
        };

        let seed = SeedConfig {
            default_users: env_flag("SEED_DEFAULT_USERS"),
            admin_password: std::env::var("SEED_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "admin123".into()),
            teacher_password: std::env::var("SEED_TEACHER_PASSWORD")
                .unwrap_or_else(|_| "teacher123".into()),
            demo_data: env_flag("SEED_DEMO_DATA"),
        };

        Ok(Self {
            backend,
            database_url,
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS").unwrap_or(10),
            jwt,
            seed,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
