use thiserror::Error;

/// Reasons a presented certificate or host key is not trusted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrustError {
    #[error("invalid hostname: {0}")]
    InvalidHostname(String),

    #[error("certificate could not be parsed: {0}")]
    CertificateParse(String),

    #[error("certificate is not valid for {hostname}: {reason}")]
    HostnameMismatch { hostname: String, reason: String },

    #[error("transport did not expose the raw host key")]
    MissingHostKey,

    #[error("remote advertised no host-key fingerprint")]
    NoFingerprint,

    #[error("host-key fingerprint mismatch (md5 {md5}, sha1 {sha1})")]
    FingerprintMismatch { md5: String, sha1: String },

    #[error("unsupported credential material: {0}")]
    UnsupportedCredential(String),
}

pub type TrustResult<T> = Result<T, TrustError>;
