//! Tracks who is signed in.
//!
//! An `AuthProvider` owns the signed-in identity and publishes changes to it on a
//! `tokio::sync::watch` channel. A `Session` subscribes to a provider when it is created with
//! `Session::init` and mirrors the provider's state until `Session::teardown`. Commands that need
//! a user ask the session for a `Gate`.
//!
//! There are two providers:
//! - `LocalAuth` keeps the identity in a JSON file under `$LEDGER_HOME/.secrets`.
//! - `MemoryAuth` keeps it in memory, for test mode and tests.

mod local;
mod memory;

pub use local::LocalAuth;
pub use memory::MemoryAuth;

use crate::model::Identity;
use crate::Result;
use std::fmt::{Display, Formatter};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// What the provider knows about the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// The provider has not yet determined whether anyone is signed in.
    #[default]
    Resolving,
    SignedOut,
    SignedIn(Identity),
}

impl AuthState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }
}

impl Display for AuthState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthState::Resolving => f.write_str("resolving"),
            AuthState::SignedOut => f.write_str("signed out"),
            AuthState::SignedIn(identity) => write!(f, "signed in as {}", identity.email),
        }
    }
}

/// The authentication provider seam.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// The signed-in identity, if the provider has one right now.
    fn current_identity(&self) -> Option<Identity>;

    /// A receiver that sees every sign-in and sign-out.
    fn subscribe(&self) -> watch::Receiver<AuthState>;

    async fn sign_in(&self, identity: Identity) -> Result<()>;

    async fn sign_out(&self) -> Result<()>;
}

/// The sending half shared by the providers.
#[derive(Debug)]
pub(crate) struct AuthChannel {
    tx: watch::Sender<AuthState>,
}

impl AuthChannel {
    pub(crate) fn new(state: AuthState) -> Self {
        let (tx, _) = watch::channel(state);
        Self { tx }
    }

    pub(crate) fn current_identity(&self) -> Option<Identity> {
        self.tx.borrow().identity().cloned()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    pub(crate) fn set(&self, state: AuthState) {
        trace!("Auth state changed to {state}");
        self.tx.send_replace(state);
    }
}

/// What a command that needs a user should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// Still resolving. Do not assume that nobody is signed in.
    Pending,
    /// Nobody is signed in. Send the user to the login entry point.
    Redirect(String),
    Ready(Identity),
}

/// The current user as seen by the rest of the program. Create one with `init`, pass it to
/// whatever needs it, and `teardown` when done.
#[derive(Debug)]
pub struct Session {
    login_url: String,
    state: watch::Receiver<AuthState>,
    watcher: Option<JoinHandle<()>>,
}

impl Session {
    /// Subscribes to `provider`. Must be called from within a tokio runtime.
    pub fn init(provider: &dyn AuthProvider, login_url: impl Into<String>) -> Self {
        let mut upstream = provider.subscribe();
        let initial = upstream.borrow_and_update().clone();
        debug!("Session starts {initial}");
        let (tx, state) = watch::channel(initial);

        let watcher = tokio::spawn(async move {
            while upstream.changed().await.is_ok() {
                let next = upstream.borrow_and_update().clone();
                debug!("Session is now {next}");
                if tx.send(next).is_err() {
                    break;
                }
            }
        });

        Self {
            login_url: login_url.into(),
            state,
            watcher: Some(watcher),
        }
    }

    /// Stops following the provider. The last known state is kept.
    pub fn teardown(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
            debug!("Session torn down");
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.state.borrow(), AuthState::Resolving)
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    pub fn gate(&self) -> Gate {
        gate_for(&self.state.borrow(), &self.login_url)
    }

    /// Waits until the provider has resolved, then returns the gate. If the session is torn down
    /// while still resolving, nobody is considered signed in.
    pub async fn wait_ready(&mut self) -> Gate {
        let resolved = self
            .state
            .wait_for(|s| !matches!(s, AuthState::Resolving))
            .await
            .map(|state| gate_for(&state, &self.login_url));
        match resolved {
            Ok(gate) => gate,
            Err(_) => {
                debug!("Session closed before it resolved");
                Gate::Redirect(self.login_url.clone())
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn gate_for(state: &AuthState, login_url: &str) -> Gate {
    match state {
        AuthState::Resolving => Gate::Pending,
        AuthState::SignedOut => Gate::Redirect(login_url.to_string()),
        AuthState::SignedIn(identity) => Gate::Ready(identity.clone()),
    }
}
