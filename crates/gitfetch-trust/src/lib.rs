//! Transport trust for gitfetch.
//!
//! Every connection a fetch opens is subject to two decisions made here:
//! whether the certificate or host key the remote presents is acceptable, and
//! which credential (if any) to hand over when the remote asks for one.
//!
//! Both decisions are synchronous and stateless. They are invoked from inside
//! a blocking transport handshake, so they never spawn work and never cache a
//! result across connection attempts.
//!
//! # Modules
//!
//! - [`fingerprint`] — MD5/SHA-1 host-key digests and full-length comparison
//! - [`verifier`] — The [`TrustVerifier`] trait and [`StrictVerifier`]
//! - [`credentials`] — Credential kinds, allowed-type sets, and offers
//! - [`negotiator`] — The [`CredentialNegotiator`] trait and [`AgentNegotiator`]

pub mod credentials;
pub mod error;
pub mod fingerprint;
pub mod negotiator;
pub mod verifier;

pub use credentials::{AllowedCredentials, CredentialKind, CredentialOffer};
pub use error::{TrustError, TrustResult};
pub use fingerprint::{digests_match, HostKeyDigests};
pub use negotiator::{AgentNegotiator, CredentialNegotiator, SshAgent};
pub use verifier::{
    HostKeyMaterial, PresentedCredential, StrictVerifier, TrustDecision, TrustVerifier,
};
