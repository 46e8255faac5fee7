use std::sync::Arc;

use tracing::info;

use crate::config::{AppConfig, LedgerBackend};
use crate::ledger::{LedgerStore, MemoryLedger, PgLedger};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn LedgerStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let ledger = match (config.backend, config.database_url.as_deref()) {
            (LedgerBackend::Postgres, Some(url)) => {
                let pg = PgLedger::connect(url, config.max_connections).await?;
                pg.initialize().await?;
                info!("using postgres ledger");
                Arc::new(pg) as Arc<dyn LedgerStore>
            }
            (LedgerBackend::Postgres, None) => {
                anyhow::bail!("DATABASE_URL is required when LEDGER_BACKEND=postgres")
            }
            (LedgerBackend::Memory, _) => {
                info!("using in-memory ledger; data is lost on exit");
                Arc::new(MemoryLedger::new()) as Arc<dyn LedgerStore>
            }
        };

        Ok(Self::from_parts(ledger, config))
    }

    pub fn from_parts(ledger: Arc<dyn LedgerStore>, config: Arc<AppConfig>) -> Self {
        Self { ledger, config }
    }

    /// Memory-backed state with a fixed test signing key.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{JwtConfig, SeedConfig, DEFAULT_TOKEN_TTL_MINUTES};

        let config = Arc::new(AppConfig {
            backend: LedgerBackend::Memory,
            database_url: None,
            max_connections: 1,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            },
            seed: SeedConfig {
                default_users: false,
                admin_password: "admin123".into(),
                teacher_password: "teacher123".into(),
                demo_data: false,
            },
        });

        Self::from_parts(Arc::new(MemoryLedger::new()), config)
    }
}
