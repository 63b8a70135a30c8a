use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::credentials::{AllowedCredentials, CredentialKind, CredentialOffer};

/// Environment variable through which a running SSH agent is reachable.
pub const SSH_AUTH_SOCK: &str = "SSH_AUTH_SOCK";

/// Chooses a credential (or declines) for one negotiation round.
///
/// The transport may call this repeatedly for the same connection with a
/// narrowed allowed set after rejecting an offer. Every round is decided from
/// its inputs alone.
pub trait CredentialNegotiator: Send + Sync {
    /// Returns `None` to decline the round.
    fn negotiate(
        &self,
        url: &str,
        username_hint: Option<&str>,
        allowed: AllowedCredentials,
    ) -> Option<CredentialOffer>;
}

/// Location of the caller's SSH agent, if one is running.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SshAgent {
    socket: Option<PathBuf>,
}

impl SshAgent {
    /// Discover the agent from `SSH_AUTH_SOCK`.
    pub fn from_env() -> Self {
        Self::from_socket_var(std::env::var_os(SSH_AUTH_SOCK))
    }

    /// An agent is only considered available if its socket path exists.
    pub fn from_socket_var(value: Option<OsString>) -> Self {
        let socket = value
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .filter(|p| p.exists());
        Self { socket }
    }

    pub fn at(socket: impl Into<PathBuf>) -> Self {
        Self {
            socket: Some(socket.into()),
        }
    }

    pub fn unavailable() -> Self {
        Self { socket: None }
    }

    pub fn is_available(&self) -> bool {
        self.socket.is_some()
    }

    pub fn socket(&self) -> Option<&Path> {
        self.socket.as_deref()
    }
}

/// Offers agent-backed SSH keys and declines everything else.
///
/// Policy, checked in this order against the round's allowed set:
///
/// 1. plaintext username/password allowed: decline
/// 2. SSH key allowed: offer the agent key for the username hint, or decline
///    when there is no agent or no username
/// 3. custom SSH credential allowed: decline
/// 4. default credential allowed: decline
/// 5. otherwise: decline
#[derive(Clone, Debug, Default)]
pub struct AgentNegotiator {
    agent: SshAgent,
}

impl AgentNegotiator {
    pub fn new(agent: SshAgent) -> Self {
        Self { agent }
    }

    pub fn from_env() -> Self {
        Self::new(SshAgent::from_env())
    }
}

impl CredentialNegotiator for AgentNegotiator {
    fn negotiate(
        &self,
        url: &str,
        username_hint: Option<&str>,
        allowed: AllowedCredentials,
    ) -> Option<CredentialOffer> {
        if allowed.allows(CredentialKind::UserPassPlaintext) {
            debug!(url, %allowed, "declining: plaintext credentials are never offered");
            return None;
        }
        if allowed.allows(CredentialKind::SshKeyFromAgent) {
            if !self.agent.is_available() {
                debug!(url, "declining: no ssh agent reachable");
                return None;
            }
            let Some(username) = username_hint.filter(|u| !u.is_empty()) else {
                debug!(url, "declining: no username for ssh key authentication");
                return None;
            };
            debug!(url, username, "offering ssh agent key");
            return Some(CredentialOffer::ssh_agent(username));
        }
        if allowed.allows(CredentialKind::SshCustom) {
            debug!(url, "declining: no custom ssh credential source");
            return None;
        }
        if allowed.allows(CredentialKind::Default) {
            debug!(url, "declining: default credentials unsupported");
            return None;
        }
        debug!(url, %allowed, "declining: nothing acceptable");
        None
    }
}
