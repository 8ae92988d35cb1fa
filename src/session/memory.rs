use crate::model::Identity;
use crate::session::{AuthChannel, AuthProvider, AuthState};
use crate::Result;
use tokio::sync::watch;

/// An `AuthProvider` that holds the identity in memory.
#[derive(Debug)]
pub struct MemoryAuth {
    channel: AuthChannel,
}

impl MemoryAuth {
    /// A provider that has not yet decided whether anyone is signed in. Finish with `resolve`.
    pub fn resolving() -> Self {
        Self {
            channel: AuthChannel::new(AuthState::Resolving),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            channel: AuthChannel::new(AuthState::SignedOut),
        }
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            channel: AuthChannel::new(AuthState::SignedIn(identity)),
        }
    }

    pub fn resolve(&self, identity: Option<Identity>) {
        self.channel.set(match identity {
            Some(identity) => AuthState::SignedIn(identity),
            None => AuthState::SignedOut,
        });
    }
}

#[async_trait::async_trait]
impl AuthProvider for MemoryAuth {
    fn current_identity(&self) -> Option<Identity> {
        self.channel.current_identity()
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.channel.subscribe()
    }

    async fn sign_in(&self, identity: Identity) -> Result<()> {
        self.channel.set(AuthState::SignedIn(identity));
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        self.channel.set(AuthState::SignedOut);
        Ok(())
    }
}
