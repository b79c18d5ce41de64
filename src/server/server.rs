use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::settings::Settings;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub account_service: Arc<dyn AccountService>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let (user_repo, session_store): (Arc<dyn UserRepo>, Arc<dyn SessionStore>) =
            match settings.database.backend.as_str() {
                "mysql" => {
                    let pool = MySqlPool::connect(&settings.database.dsn).await?;
                    (
                        Arc::new(MySqlUserRepo::new(pool.clone())),
                        Arc::new(MySqlSessionStore::new(pool)),
                    )
                }
                "memory" => {
                    let store = Arc::new(MemoryStore::new());
                    (store.clone(), store)
                }
                other => return Err(anyhow::anyhow!("Unknown database backend: {}", other)),
            };

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtCodec::new(JwtConfig {
            issuer: settings.auth.issuer.clone(),
            access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
            refresh_ttl: Duration::from_secs(settings.auth.refresh_ttl_secs),
            access_secret: settings.auth.access_secret(),
            refresh_secret: settings.auth.refresh_secret(),
        }));

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            user_repo.clone(),
            session_store,
            credential_hasher.clone(),
            token_codec,
        ));
        let account_service: Arc<dyn AccountService> =
            Arc::new(RealAccountService::new(user_repo, credential_hasher));

        Ok(Server {
            auth_service,
            account_service,
        })
    }
}
