//! Checksum signatures (SHA-256, SHA-1, MD5) published next to artifacts.

use depot_core::descriptor::Signature;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Signature kinds that are plain digests, strongest first.
pub const DIGEST_KINDS: &[&str] = &["sha256", "sha1", "md5"];

/// Compute the hex digest of `data` for a digest signature kind.
///
/// Returns `None` for kinds that are not digests (e.g. `asc`).
pub fn digest(kind: &str, data: &[u8]) -> Option<String> {
    match kind.to_ascii_lowercase().as_str() {
        "sha256" => Some(hex_sha256(data)),
        "sha1" => Some(hex_sha1(data)),
        "md5" => Some(hex_md5(data)),
        _ => None,
    }
}

/// Check `data` against a digest signature.
///
/// `None` means the signature kind cannot be checked locally.
pub fn verify(signature: &Signature, data: &[u8]) -> Option<bool> {
    let actual = digest(&signature.kind, data)?;
    let expected = extract_hash(&signature.content);
    Some(actual.eq_ignore_ascii_case(&expected))
}

/// Extract the hex hash from a checksum file.
///
/// Maven checksum files may contain just the hash, or `hash  filename`.
pub fn extract_hash(content: &str) -> String {
    content.split_whitespace().next().unwrap_or("").to_string()
}

fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn hex_sha1(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn hex_md5(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_hash_simple() {
        assert_eq!(extract_hash("abc123\n"), "abc123");
    }

    #[test]
    fn extract_hash_with_filename() {
        assert_eq!(extract_hash("abc123  my-lib-1.0.jar\n"), "abc123");
    }

    #[test]
    fn sha256_computation() {
        assert_eq!(
            digest("sha256", b"hello world").unwrap(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn sha1_computation() {
        assert_eq!(
            digest("SHA1", b"hello world").unwrap(),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
    }

    #[test]
    fn md5_computation() {
        assert_eq!(
            digest("md5", b"hello world").unwrap(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[test]
    fn verify_matching_and_mismatching_signatures() {
        let good = Signature::new("md5", "5EB63BBBE01EEED093CB22BB8F5ACDC3  file.pom");
        assert_eq!(verify(&good, b"hello world"), Some(true));
        let bad = Signature::new("md5", "00000000000000000000000000000000");
        assert_eq!(verify(&bad, b"hello world"), Some(false));
    }

    #[test]
    fn pgp_signatures_cannot_be_checked_locally() {
        let asc = Signature::new("asc", "-----BEGIN PGP SIGNATURE-----");
        assert_eq!(verify(&asc, b"hello world"), None);
    }
}
