//! Glue between git2's transport callbacks and the trust decisions in
//! `gitfetch-trust`.

use git2::{
    CertificateCheckStatus, Cred, CredentialType, Error, ErrorClass, ErrorCode, RemoteCallbacks,
};
use gitfetch_trust::{
    AllowedCredentials, CredentialKind, CredentialNegotiator, CredentialOffer, HostKeyMaterial,
    PresentedCredential, TrustDecision, TrustVerifier,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::types::FetchFailure;

/// Describe the certificate git2 hands to `certificate_check`.
pub fn presented_credential<'a>(cert: &'a git2::cert::Cert<'_>) -> PresentedCredential<'a> {
    if let Some(x509) = cert.as_x509() {
        return PresentedCredential::X509 { der: x509.data() };
    }
    if let Some(hostkey) = cert.as_hostkey() {
        return PresentedCredential::HostKey(HostKeyMaterial {
            key: hostkey.hostkey(),
            advertised_md5: hostkey.hash_md5().map(|h| &h[..]),
            advertised_sha1: hostkey.hash_sha1().map(|h| &h[..]),
        });
    }
    PresentedCredential::Unsupported { kind: "unrecognized certificate type" }
}

pub fn allowed_credentials(allowed: CredentialType) -> AllowedCredentials {
    AllowedCredentials {
        userpass_plaintext: allowed.contains(CredentialType::USER_PASS_PLAINTEXT),
        ssh_key: allowed.contains(CredentialType::SSH_KEY),
        ssh_custom: allowed.contains(CredentialType::SSH_CUSTOM),
        default: allowed.contains(CredentialType::DEFAULT),
    }
}

/// Turn an accepted offer into a git2 credential.
pub fn credential_for(offer: &CredentialOffer) -> Result<Cred, Error> {
    match offer.kind {
        CredentialKind::SshKeyFromAgent => Cred::ssh_key_from_agent(&offer.username),
        other => Err(auth_error(format!("{other} credentials are not supported"))),
    }
}

fn auth_error(message: String) -> Error {
    Error::new(ErrorCode::Auth, ErrorClass::Callback, message)
}

/// Map a failed fetch to the reason reported for the branch.
///
/// A callback abort after cancellation surfaces from libgit2 as a generic
/// callback error, so any callback-class failure seen once the token has
/// fired counts as cancelled.
pub fn classify_failure(err: &Error, cancel: &CancellationToken) -> FetchFailure {
    let message = err.message().to_string();
    match err.code() {
        ErrorCode::Certificate => FetchFailure::TrustRejected(message),
        ErrorCode::Auth => FetchFailure::AuthenticationFailed(message),
        _ if cancel.is_cancelled()
            && (err.class() == ErrorClass::Callback || err.code() == ErrorCode::User) =>
        {
            FetchFailure::Cancelled
        }
        _ => FetchFailure::Transport(message),
    }
}

/// Body of the `certificate_check` callback.
///
/// X.509 chains still go through the transport's own CA validation, so an
/// accepted certificate is passed through rather than forced OK.
pub fn check_certificate(
    verifier: &dyn TrustVerifier,
    presented: &PresentedCredential<'_>,
    host: &str,
) -> Result<CertificateCheckStatus, Error> {
    match verifier.verify_certificate(host, presented) {
        TrustDecision::Accept => match presented {
            PresentedCredential::X509 { .. } => Ok(CertificateCheckStatus::CertificatePassthrough),
            _ => Ok(CertificateCheckStatus::CertificateOk),
        },
        TrustDecision::Reject => Err(Error::new(
            ErrorCode::Certificate,
            ErrorClass::Callback,
            format!("refusing untrusted identity presented by {host}"),
        )),
    }
}

/// Body of the `credentials` callback: one negotiation round.
///
/// `rounds` counts the rounds already taken on this connection; once it
/// exceeds `max_rounds` every further request fails.
pub fn next_credential(
    negotiator: &dyn CredentialNegotiator,
    rounds: &mut u32,
    max_rounds: u32,
    url: &str,
    username_from_url: Option<&str>,
    allowed: CredentialType,
) -> Result<Cred, Error> {
    *rounds += 1;
    if *rounds > max_rounds {
        warn!(url, rounds = max_rounds, "credential rounds exhausted");
        return Err(auth_error(format!("credentials rejected after {max_rounds} attempts")));
    }
    if allowed.contains(CredentialType::USERNAME) {
        debug!(url, "transport asked for a username only; put the user in the remote URL");
    }
    let offered = allowed_credentials(allowed);
    match negotiator.negotiate(url, username_from_url, offered) {
        Some(offer) => credential_for(&offer),
        None => Err(auth_error(format!("no acceptable credential for {url} ({offered})"))),
    }
}

/// Build the callbacks for one fetch operation.
///
/// Certificate checks and credential rounds are forwarded to the verifier and
/// negotiator; this layer only translates types and caps credential rounds at
/// `max_auth_rounds` per connection.
pub fn remote_callbacks<'cb>(
    verifier: &'cb dyn TrustVerifier,
    negotiator: &'cb dyn CredentialNegotiator,
    max_auth_rounds: u32,
    cancel: &'cb CancellationToken,
) -> RemoteCallbacks<'cb> {
    let mut callbacks = RemoteCallbacks::new();

    callbacks.certificate_check(move |cert, host| {
        check_certificate(verifier, &presented_credential(cert), host)
    });

    let mut rounds = 0u32;
    callbacks.credentials(move |url, username_from_url, allowed| {
        next_credential(negotiator, &mut rounds, max_auth_rounds, url, username_from_url, allowed)
    });

    callbacks.transfer_progress(move |_| !cancel.is_cancelled());

    callbacks.sideband_progress(|data| {
        let line = String::from_utf8_lossy(data);
        let line = line.trim_end();
        if !line.is_empty() {
            debug!(remote = line, "progress");
        }
        true
    });

    callbacks
}
