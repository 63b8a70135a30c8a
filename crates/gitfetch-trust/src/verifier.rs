use rustls_pki_types::{CertificateDer, ServerName};
use tracing::{debug, warn};

use crate::error::{TrustError, TrustResult};
use crate::fingerprint::{colon_hex, digests_match, HostKeyDigests};

/// Outcome of verifying one connection attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrustDecision {
    Accept,
    Reject,
}

impl TrustDecision {
    pub fn is_accept(self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Host-key material an SSH transport hands over during its handshake.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostKeyMaterial<'a> {
    /// The server's public key in SSH wire encoding, when the transport exposes it.
    pub key: Option<&'a [u8]>,
    /// MD5 fingerprint advertised by the transport.
    pub advertised_md5: Option<&'a [u8]>,
    /// SHA-1 fingerprint advertised by the transport.
    pub advertised_sha1: Option<&'a [u8]>,
}

/// Credential material presented by a remote during a handshake.
#[derive(Clone, Copy, Debug)]
pub enum PresentedCredential<'a> {
    /// DER-encoded X.509 certificate from a TLS transport.
    X509 { der: &'a [u8] },
    /// Host key from an SSH transport.
    HostKey(HostKeyMaterial<'a>),
    /// Anything else the transport reports. Never trusted.
    Unsupported { kind: &'a str },
}

/// Decides whether a presented certificate or host key is acceptable.
///
/// Called synchronously from inside the transport handshake, once per
/// connection attempt. Implementations must return promptly and must not
/// remember earlier decisions.
pub trait TrustVerifier: Send + Sync {
    fn verify_certificate(
        &self,
        hostname: &str,
        presented: &PresentedCredential<'_>,
    ) -> TrustDecision;
}

/// Fail-closed verifier.
///
/// - X.509: accept iff the certificate is valid for `hostname`.
/// - Host key: accept iff an advertised MD5 or SHA-1 fingerprint equals the
///   digest recomputed from the raw key.
/// - Anything else: reject.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrictVerifier;

impl StrictVerifier {
    pub fn check(&self, hostname: &str, presented: &PresentedCredential<'_>) -> TrustResult<()> {
        match presented {
            PresentedCredential::X509 { der } => check_x509(hostname, der),
            PresentedCredential::HostKey(material) => check_host_key(material),
            PresentedCredential::Unsupported { kind } => {
                Err(TrustError::UnsupportedCredential((*kind).to_string()))
            }
        }
    }
}

impl TrustVerifier for StrictVerifier {
    fn verify_certificate(
        &self,
        hostname: &str,
        presented: &PresentedCredential<'_>,
    ) -> TrustDecision {
        match self.check(hostname, presented) {
            Ok(()) => {
                debug!(hostname, "remote identity accepted");
                TrustDecision::Accept
            }
            Err(e) => {
                warn!(hostname, error = %e, "remote identity rejected");
                TrustDecision::Reject
            }
        }
    }
}

fn check_x509(hostname: &str, der: &[u8]) -> TrustResult<()> {
    let name = ServerName::try_from(hostname)
        .map_err(|e| TrustError::InvalidHostname(format!("{hostname}: {e}")))?;
    let der = CertificateDer::from(der);
    let cert = webpki::EndEntityCert::try_from(&der)
        .map_err(|e| TrustError::CertificateParse(format!("{e:?}")))?;
    cert.verify_is_valid_for_subject_name(&name)
        .map_err(|e| TrustError::HostnameMismatch {
            hostname: hostname.to_string(),
            reason: format!("{e:?}"),
        })
}

fn check_host_key(material: &HostKeyMaterial<'_>) -> TrustResult<()> {
    if material.advertised_md5.is_none() && material.advertised_sha1.is_none() {
        return Err(TrustError::NoFingerprint);
    }
    let key = material.key.ok_or(TrustError::MissingHostKey)?;
    let digests = HostKeyDigests::compute(key);

    let md5_ok = material
        .advertised_md5
        .is_some_and(|fp| digests_match(fp, &digests.md5));
    let sha1_ok = material
        .advertised_sha1
        .is_some_and(|fp| digests_match(fp, &digests.sha1));

    if md5_ok || sha1_ok {
        debug!(md5 = %digests.md5_hex(), sha1 = %digests.sha1_hex(), "host key fingerprint verified");
        return Ok(());
    }
    Err(TrustError::FingerprintMismatch {
        md5: material.advertised_md5.map(colon_hex).unwrap_or_else(|| "-".into()),
        sha1: material.advertised_sha1.map(colon_hex).unwrap_or_else(|| "-".into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const KEY: &[u8] = b"\x00\x00\x00\x0bssh-ed25519\x00\x00\x00\x20abcdefghijklmnopqrstuvwxyz012345";

    fn host_key<'a>(
        key: Option<&'a [u8]>,
        md5: Option<&'a [u8]>,
        sha1: Option<&'a [u8]>,
    ) -> PresentedCredential<'a> {
        PresentedCredential::HostKey(HostKeyMaterial {
            key,
            advertised_md5: md5,
            advertised_sha1: sha1,
        })
    }

    fn verify(hostname: &str, presented: &PresentedCredential<'_>) -> TrustDecision {
        StrictVerifier.verify_certificate(hostname, presented)
    }

    #[test]
    fn md5_only_match_accepts() {
        let d = HostKeyDigests::compute(KEY);
        let p = host_key(Some(KEY), Some(&d.md5), None);
        assert_eq!(verify("github.com", &p), TrustDecision::Accept);
    }

    #[test]
    fn sha1_only_match_accepts() {
        let d = HostKeyDigests::compute(KEY);
        let p = host_key(Some(KEY), None, Some(&d.sha1));
        assert_eq!(verify("github.com", &p), TrustDecision::Accept);
    }

    #[test]
    fn one_good_fingerprint_is_enough() {
        let d = HostKeyDigests::compute(KEY);
        let bad = [0u8; 20];
        let p = host_key(Some(KEY), Some(&d.md5), Some(&bad));
        assert_eq!(verify("h", &p), TrustDecision::Accept);
    }

    #[test]
    fn no_fingerprints_rejects() {
        let p = host_key(Some(KEY), None, None);
        assert_eq!(verify("h", &p), TrustDecision::Reject);
        assert_eq!(StrictVerifier.check("h", &p), Err(TrustError::NoFingerprint));
    }

    #[test]
    fn missing_raw_key_rejects() {
        let d = HostKeyDigests::compute(KEY);
        let p = host_key(None, Some(&d.md5), Some(&d.sha1));
        assert_eq!(StrictVerifier.check("h", &p), Err(TrustError::MissingHostKey));
    }

    #[test]
    fn truncated_fingerprint_rejects() {
        let d = HostKeyDigests::compute(KEY);
        let p = host_key(Some(KEY), Some(&d.md5[..8]), Some(&d.sha1[..8]));
        assert_eq!(verify("h", &p), TrustDecision::Reject);
    }

    #[test]
    fn fingerprint_of_other_key_rejects() {
        let other = HostKeyDigests::compute(b"another key entirely");
        let p = host_key(Some(KEY), Some(&other.md5), Some(&other.sha1));
        assert!(matches!(
            StrictVerifier.check("h", &p),
            Err(TrustError::FingerprintMismatch { .. })
        ));
    }

    #[test]
    fn unsupported_material_rejects() {
        let p = PresentedCredential::Unsupported { kind: "strarray" };
        assert_eq!(verify("h", &p), TrustDecision::Reject);
    }

    #[test]
    fn x509_matching_hostname_accepts() {
        let certified = rcgen::generate_simple_self_signed(vec!["git.example.com".into()]).unwrap();
        let der = certified.cert.der().to_vec();
        let p = PresentedCredential::X509 { der: &der };
        assert_eq!(verify("git.example.com", &p), TrustDecision::Accept);
    }

    #[test]
    fn x509_other_hostname_rejects() {
        let certified = rcgen::generate_simple_self_signed(vec!["git.example.com".into()]).unwrap();
        let der = certified.cert.der().to_vec();
        let p = PresentedCredential::X509 { der: &der };
        assert_eq!(verify("evil.example.net", &p), TrustDecision::Reject);
        assert!(matches!(
            StrictVerifier.check("evil.example.net", &p),
            Err(TrustError::HostnameMismatch { .. })
        ));
    }

    #[test]
    fn x509_wildcard_covers_one_label() {
        let certified = rcgen::generate_simple_self_signed(vec!["*.example.com".into()]).unwrap();
        let der = certified.cert.der().to_vec();
        let p = PresentedCredential::X509 { der: &der };
        assert_eq!(verify("git.example.com", &p), TrustDecision::Accept);
        assert_eq!(verify("a.b.example.com", &p), TrustDecision::Reject);
    }

    #[test]
    fn x509_garbage_rejects() {
        let p = PresentedCredential::X509 { der: b"not a certificate" };
        assert!(matches!(
            StrictVerifier.check("git.example.com", &p),
            Err(TrustError::CertificateParse(_))
        ));
    }

    #[test]
    fn x509_invalid_hostname_rejects() {
        let certified = rcgen::generate_simple_self_signed(vec!["git.example.com".into()]).unwrap();
        let der = certified.cert.der().to_vec();
        let p = PresentedCredential::X509 { der: &der };
        assert!(matches!(
            StrictVerifier.check("bad host name", &p),
            Err(TrustError::InvalidHostname(_))
        ));
    }

    #[test]
    fn decision_helpers() {
        assert!(TrustDecision::Accept.is_accept());
        assert!(!TrustDecision::Reject.is_accept());
    }

    proptest! {
        #[test]
        fn accept_iff_some_advertised_digest_equals_computed(
            key in proptest::collection::vec(any::<u8>(), 1..64),
            md5 in proptest::option::of(proptest::collection::vec(any::<u8>(), 0..20)),
            sha1 in proptest::option::of(proptest::collection::vec(any::<u8>(), 0..24)),
            use_real_md5 in any::<bool>(),
            use_real_sha1 in any::<bool>(),
        ) {
            let d = HostKeyDigests::compute(&key);
            let md5 = md5.map(|m| if use_real_md5 { d.md5.to_vec() } else { m });
            let sha1 = sha1.map(|s| if use_real_sha1 { d.sha1.to_vec() } else { s });
            let expected = md5.as_deref() == Some(&d.md5[..]) || sha1.as_deref() == Some(&d.sha1[..]);

            let p = host_key(Some(&key), md5.as_deref(), sha1.as_deref());
            prop_assert_eq!(verify("h", &p).is_accept(), expected);
        }
    }
}
