use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::settings::Settings;
use chrono::Duration;
use sqlx::{MySql, Pool};
use std::sync::Arc;

pub struct Server {
    pub session_service: Arc<dyn SessionService>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        // The signing key is an explicitly constructed value owned here,
        // never ambient mutable state.
        let signing_key = std::env::var("JWT_SIGNING_KEY")
            .unwrap_or_else(|_| "my-dev-secret-key".to_string())
            .into_bytes();
        let codec = Arc::new(TokenCodec::new(TokenCodecConfig {
            signing_key,
            access_ttl: Duration::seconds(settings.session.access_ttl_secs),
            refresh_ttl: Duration::seconds(settings.session.refresh_ttl_secs),
        }));
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);

        let session_service: Arc<dyn SessionService> = match settings.session.backend.as_str() {
            "fake" => Arc::new(FakeSessionService::new()),
            "memory" => {
                let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
                let accounts: Arc<dyn AccountStore> = Arc::new(MemoryAccountStore::new());
                let ledger: Arc<dyn RefreshLedger> = Arc::new(MemoryRefreshLedger::new());
                Arc::new(RealSessionService::new(
                    accounts,
                    ledger,
                    SessionCache::new(kv, codec),
                    credential_hasher,
                    settings.session.revoke_concurrency,
                ))
            }
            "real" => {
                let redis_client = redis::Client::open(settings.redis.dsn.as_str())?;
                let redis_manager = redis_client.get_connection_manager().await?;
                let kv: Arc<dyn KvStore> = Arc::new(RedisKvStore::new(
                    redis_manager,
                    settings.redis.prefix.clone(),
                    settings.session.refresh_ttl_secs.max(0) as u64,
                ));

                let pool = Pool::<MySql>::connect(&settings.mysql.dsn).await?;
                let accounts: Arc<dyn AccountStore> =
                    Arc::new(MySqlAccountStore::new(pool.clone()));
                let ledger: Arc<dyn RefreshLedger> = Arc::new(MySqlRefreshLedger::new(pool));

                Arc::new(RealSessionService::new(
                    accounts,
                    ledger,
                    SessionCache::new(kv, codec),
                    credential_hasher,
                    settings.session.revoke_concurrency,
                ))
            }
            other => return Err(anyhow::anyhow!("Unknown session backend: {}", other)),
        };

        Ok(Server { session_service })
    }
}
