use md5::Md5;
use sha1::{Digest, Sha1};

/// MD5 and SHA-1 digests of a host key's wire encoding.
///
/// SSH transports advertise one or both of these fingerprints for the key the
/// server presented. Recomputing them from the raw key lets the verifier
/// confirm that what was advertised really describes the key on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostKeyDigests {
    pub md5: [u8; 16],
    pub sha1: [u8; 20],
}

impl HostKeyDigests {
    /// Digest a wire-encoded public key.
    pub fn compute(key: &[u8]) -> Self {
        let mut md5 = [0u8; 16];
        md5.copy_from_slice(&Md5::digest(key));
        let mut sha1 = [0u8; 20];
        sha1.copy_from_slice(&Sha1::digest(key));
        Self { md5, sha1 }
    }

    /// Colon-separated hex MD5 fingerprint, as `ssh-keygen -E md5` prints it.
    pub fn md5_hex(&self) -> String {
        colon_hex(&self.md5)
    }

    /// Colon-separated hex SHA-1 fingerprint.
    pub fn sha1_hex(&self) -> String {
        colon_hex(&self.sha1)
    }
}

/// Compare an advertised fingerprint against a computed digest.
///
/// Lengths must be equal, and every byte is compared without early exit so
/// the comparison always walks the full digest. A shorter advertised value
/// that happens to be a prefix of the digest is a mismatch.
pub fn digests_match(advertised: &[u8], computed: &[u8]) -> bool {
    if advertised.len() != computed.len() {
        return false;
    }
    advertised
        .iter()
        .zip(computed)
        .fold(0u8, |acc, (a, c)| acc | (a ^ c))
        == 0
}

pub(crate) fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(":")
}
