use crate::model::Identity;
use crate::session::{AuthChannel, AuthProvider, AuthState};
use crate::{utils, Result};
use anyhow::Context;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// An `AuthProvider` that remembers the signed-in identity in a JSON file.
///
/// The file is readable only by its owner on Unix. A missing or unreadable file means nobody is
/// signed in.
#[derive(Debug)]
pub struct LocalAuth {
    path: PathBuf,
    channel: AuthChannel,
}

impl LocalAuth {
    /// A provider for the identity file at `path`. It stays `Resolving` until `resolve` is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            channel: AuthChannel::new(AuthState::Resolving),
        }
    }

    /// Creates the provider and reads the identity file.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let auth = Self::new(path);
        auth.resolve().await;
        auth
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the identity file and publishes the result.
    pub async fn resolve(&self) {
        let state = if !self.path.is_file() {
            debug!("No identity file at {}", self.path.display());
            AuthState::SignedOut
        } else {
            match utils::deserialize::<Identity>(&self.path).await {
                Ok(identity) => AuthState::SignedIn(identity),
                Err(e) => {
                    warn!("Ignoring the identity file: {e:#}");
                    AuthState::SignedOut
                }
            }
        };
        self.channel.set(state);
    }
}

#[async_trait::async_trait]
impl AuthProvider for LocalAuth {
    fn current_identity(&self) -> Option<Identity> {
        self.channel.current_identity()
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.channel.subscribe()
    }

    async fn sign_in(&self, identity: Identity) -> Result<()> {
        let data =
            serde_json::to_string_pretty(&identity).context("Unable to serialize identity")?;
        utils::write(&self.path, data).await?;
        utils::restrict_permissions(&self.path)?;
        info!("Signed in as {}", identity.email);
        self.channel.set(AuthState::SignedIn(identity));
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        if self.path.is_file() {
            utils::remove(&self.path).await?;
        }
        info!("Signed out");
        self.channel.set(AuthState::SignedOut);
        Ok(())
    }
}
