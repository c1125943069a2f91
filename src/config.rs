use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::AppError;
use crate::remote::{DisabledMirror, FirestoreClient, FirestoreConfig, RemoteMirror};

const DEFAULT_DATABASE_URL: &str = "sqlite://yoga_admin.db";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub auto_sync_interval: Option<Duration>,
    pub firestore: Option<FirestoreConfig>,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let raw_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|_| AppError::Config(format!("BIND_ADDR is not a socket address: {}", raw_addr)))?;

        let auto_sync_interval = match env::var("AUTO_SYNC_INTERVAL_SECS") {
            Ok(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    AppError::Config(format!("AUTO_SYNC_INTERVAL_SECS is not a number: {}", raw))
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        Ok(Self {
            database_url,
            bind_addr,
            auto_sync_interval,
            firestore: FirestoreConfig::new_from_env()?,
        })
    }

    /// The configured mirror, or a disabled one when none is set up.
    pub fn remote_mirror(&self) -> Result<Arc<dyn RemoteMirror>, AppError> {
        match &self.firestore {
            Some(config) => {
                info!("remote mirror: Firestore project {}", config.project_id);
                Ok(Arc::new(FirestoreClient::new(config.clone())?))
            }
            None => {
                warn!("FIRESTORE_PROJECT_ID is not set; remote sync is disabled");
                Ok(Arc::new(DisabledMirror))
            }
        }
    }
}
