//! Process-wide service handles.
//!
//! `CoreState` owns the database and exposes it through the two seams the
//! HTTP layer needs: the medicine store and the identity provider. It is
//! built once by [`init`]; later calls return the same instance.

use std::sync::{Arc, Mutex, OnceLock};

use crate::api::ApiContext;
use crate::config::ServerConfig;
use crate::db::{Database, MedicineStore, StoreError};
use crate::identity::{IdentityProvider, TokenIdentityProvider};

pub struct CoreState {
    pub database: Arc<Database>,
    pub store: Arc<dyn MedicineStore>,
    pub identity: Arc<TokenIdentityProvider>,
}

static CORE: OnceLock<Arc<CoreState>> = OnceLock::new();
static INIT_LOCK: Mutex<()> = Mutex::new(());

impl CoreState {
    /// Open the configured database and wire the services over it.
    pub fn open(config: &ServerConfig) -> Result<Self, StoreError> {
        Ok(Self::from_database(Arc::new(Database::open(&config.database_path)?)))
    }

    pub fn from_database(database: Arc<Database>) -> Self {
        Self {
            store: database.clone(),
            identity: Arc::new(TokenIdentityProvider::new(database.clone())),
            database,
        }
    }

    /// Handles for the request handlers.
    pub fn api_context(&self) -> ApiContext {
        let identity: Arc<dyn IdentityProvider> = self.identity.clone();
        ApiContext::new(self.store.clone(), identity)
    }
}

/// Initialize the shared state once. Subsequent calls return the existing
/// instance and ignore `config`. Concurrent first calls open exactly one
/// database; a failed open leaves the state unset for the next caller.
pub fn init(config: &ServerConfig) -> Result<Arc<CoreState>, StoreError> {
    if let Some(core) = CORE.get() {
        return Ok(core.clone());
    }
    let _guard = INIT_LOCK.lock().map_err(|_| StoreError::LockPoisoned)?;
    if let Some(core) = CORE.get() {
        return Ok(core.clone());
    }
    let core = Arc::new(CoreState::open(config)?);
    tracing::info!(db = %config.database_path.display(), "Core state initialized");
    Ok(CORE.get_or_init(|| core).clone())
}

/// The shared state, if [`init`] has run.
pub fn get() -> Option<Arc<CoreState>> {
    CORE.get().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn config_at(path: std::path::PathBuf) -> ServerConfig {
        ServerConfig {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            database_path: path,
        }
    }

    // The only test touching the process-wide state.
    #[test]
    fn concurrent_init_opens_one_database() {
        let dir = tempfile::tempdir().unwrap();
        let barrier = std::sync::Barrier::new(8);

        let cores: Vec<Arc<CoreState>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let config = config_at(dir.path().join(format!("db{i}")).join("medbook.db"));
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        init(&config).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(cores.iter().all(|core| Arc::ptr_eq(core, &cores[0])));
        assert!(Arc::ptr_eq(&cores[0], &get().unwrap()));

        let opened = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(opened, 1);

        let later = init(&config_at(dir.path().join("late").join("medbook.db"))).unwrap();
        assert!(Arc::ptr_eq(&later, &cores[0]));
        assert!(!dir.path().join("late").exists());
    }

    #[test]
    fn services_share_one_database() {
        let core = CoreState::from_database(Arc::new(Database::open_in_memory().unwrap()));
        let token = core.identity.issue_token("alice", None).unwrap();

        let ctx = core.api_context();
        assert_eq!(ctx.identity.verify_token(&token).unwrap().user_id, "alice");
    }
}
