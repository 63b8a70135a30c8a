use std::fmt;

/// Credential mechanisms a git transport may ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    /// Username and password sent in the clear to the transport.
    UserPassPlaintext,
    /// SSH public-key authentication backed by the running agent.
    SshKeyFromAgent,
    /// Transport-specific custom SSH signing.
    SshCustom,
    /// The transport's default (e.g. NTLM/Negotiate) credential.
    Default,
}

impl CredentialKind {
    pub const ALL: [CredentialKind; 4] = [
        Self::UserPassPlaintext,
        Self::SshKeyFromAgent,
        Self::SshCustom,
        Self::Default,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::UserPassPlaintext => "userpass-plaintext",
            Self::SshKeyFromAgent => "ssh-key-from-agent",
            Self::SshCustom => "ssh-custom",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The set of credential kinds the remote accepts in one negotiation round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AllowedCredentials {
    pub userpass_plaintext: bool,
    pub ssh_key: bool,
    pub ssh_custom: bool,
    pub default: bool,
}

impl AllowedCredentials {
    pub const NONE: Self = Self {
        userpass_plaintext: false,
        ssh_key: false,
        ssh_custom: false,
        default: false,
    };

    pub fn only(kind: CredentialKind) -> Self {
        Self::NONE.with(kind)
    }

    pub fn with(mut self, kind: CredentialKind) -> Self {
        match kind {
            CredentialKind::UserPassPlaintext => self.userpass_plaintext = true,
            CredentialKind::SshKeyFromAgent => self.ssh_key = true,
            CredentialKind::SshCustom => self.ssh_custom = true,
            CredentialKind::Default => self.default = true,
        }
        self
    }

    pub fn allows(&self, kind: CredentialKind) -> bool {
        match kind {
            CredentialKind::UserPassPlaintext => self.userpass_plaintext,
            CredentialKind::SshKeyFromAgent => self.ssh_key,
            CredentialKind::SshCustom => self.ssh_custom,
            CredentialKind::Default => self.default,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

impl FromIterator<CredentialKind> for AllowedCredentials {
    fn from_iter<I: IntoIterator<Item = CredentialKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

impl fmt::Display for AllowedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = CredentialKind::ALL
            .iter()
            .filter(|k| self.allows(**k))
            .map(CredentialKind::display_name)
            .collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// A credential the negotiator is willing to hand to the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialOffer {
    pub kind: CredentialKind,
    /// Principal the credential authenticates as.
    pub username: String,
}

impl CredentialOffer {
    pub fn ssh_agent(username: impl Into<String>) -> Self {
        Self {
            kind: CredentialKind::SshKeyFromAgent,
            username: username.into(),
        }
    }
}
