use crate::error::{ErrorType, IntoResult};
use crate::model::Identity;
use crate::seed::Seeder;
use crate::session::{AuthProvider, Gate, LocalAuth, MemoryAuth, Session};
use crate::store::{self, MemoryStore, Mode, Store};
use crate::{Config, Result};
use anyhow::anyhow;
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs: the configuration, the store, the authentication provider and the
/// seeder. Cloning is cheap and clones share the store, the provider and the seeder's lock.
#[derive(Clone)]
pub struct Ledger {
    config: Config,
    store: Arc<dyn Store>,
    auth: Arc<dyn AuthProvider>,
    seeder: Seeder,
}

impl Ledger {
    pub fn new(config: Config, store: Arc<dyn Store>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            config,
            store,
            auth,
            seeder: Seeder::new(),
        }
    }

    /// Opens the store and the authentication provider for `mode`.
    ///
    /// In `Mode::Test` the store is in memory and holds demo records, and the demo farmer is
    /// signed in.
    pub async fn open(config: Config, mode: Mode) -> Result<Self> {
        let store = store::open(&config, mode)
            .await
            .pub_result(ErrorType::Store)?;
        let auth: Arc<dyn AuthProvider> = match mode {
            Mode::Live => Arc::new(LocalAuth::load(config.identity_path()).await),
            Mode::Test => Arc::new(MemoryAuth::signed_in(MemoryStore::demo_identity())),
        };
        Ok(Self::new(config, store, auth))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn auth(&self) -> &dyn AuthProvider {
        self.auth.as_ref()
    }

    pub fn seeder(&self) -> &Seeder {
        &self.seeder
    }

    /// Starts a session that follows this ledger's provider.
    pub fn session(&self) -> Session {
        Session::init(self.auth(), self.config.login_url())
    }

    /// The signed-in identity. When nobody is signed in the error points at the login entry point.
    pub async fn require_identity(&self) -> Result<Identity> {
        let mut session = self.session();
        let gate = session.wait_ready().await;
        session.teardown();
        let login_url = match gate {
            Gate::Ready(identity) => {
                debug!("Running as {}", identity.uid);
                return Ok(identity);
            }
            Gate::Redirect(login_url) => login_url,
            Gate::Pending => self.config.login_url().to_string(),
        };
        Err(anyhow!(
            "Nobody is signed in. Sign in at {login_url} or with 'ledger login --email <EMAIL>'"
        ))
        .pub_result(ErrorType::Auth)
    }
}
