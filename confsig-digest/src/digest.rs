//! Digest naming.
//!
//! ## Per-descriptor protocol
//!
//! 1. Stream the referenced file through CRC-32 (IEEE).
//! 2. Render the checksum as unsigned decimal, no padding.
//! 3. Compute `remaining = 64 - len(static_prefix)` in characters; a negative value is a
//!    configuration error, never a truncation.
//! 4. Right-truncate the decimal text to `remaining` characters if longer.
//! 5. Bind the result under the descriptor's digest variable.
//!
//! Identical content always yields the same checksum, and truncation depends
//! only on the checksum and the prefix length, so re-running on unchanged
//! files yields the same bindings.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use confsig_core::{
    ConfigDescriptor, ConfigKey, DescriptorSource, NameTemplate, Namespace, MAX_CONFIG_NAME_LEN,
};

use crate::bindings::{DigestBinding, DigestBindings};
use crate::error::{io_err, DigestError};

// ---------------------------------------------------------------------------
// Checksum
// ---------------------------------------------------------------------------

/// CRC-32 (IEEE) of `bytes` as unsigned decimal text.
pub fn checksum(bytes: &[u8]) -> String {
    crc32fast::hash(bytes).to_string()
}

/// Stream `path` through CRC-32 (IEEE) and return the decimal text.
pub fn checksum_file(path: &Path) -> Result<String, DigestError> {
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = [0u8; 8 * 1024];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(DigestError::Checksum {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_string())
}

// ---------------------------------------------------------------------------
// Truncation
// ---------------------------------------------------------------------------

/// Fit `digest` into the space `template`'s prefix leaves under the name
/// ceiling, dropping trailing characters.
///
/// Fails with [`DigestError::PrefixTooLong`] when the prefix alone is over
/// the ceiling.
pub fn fit_digest(
    key: &ConfigKey,
    template: &NameTemplate,
    digest: &str,
) -> Result<String, DigestError> {
    let Some(remaining) = template.remaining() else {
        return Err(DigestError::PrefixTooLong {
            key: key.clone(),
            prefix_len: template.prefix_len(),
            limit: MAX_CONFIG_NAME_LEN,
        });
    };
    if digest.len() <= remaining {
        return Ok(digest.to_owned());
    }
    // Decimal digits are ASCII, so byte slicing is char slicing.
    tracing::debug!(
        "truncating digest for '{key}' from {} to {remaining} characters",
        digest.len()
    );
    Ok(digest[..remaining].to_owned())
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Checksum and bind every templated descriptor.
///
/// Descriptors without a [`NameTemplate`] are not digest-managed and are
/// skipped. Processing stops at the first error.
pub fn bind_digests(descriptors: &[ConfigDescriptor]) -> Result<DigestBindings, DigestError> {
    let mut bindings = DigestBindings::default();
    for descriptor in descriptors {
        let Some(template) = descriptor.template.as_ref() else {
            tracing::debug!("config '{}' has no digest marker, skipping", descriptor.key);
            continue;
        };

        let full = checksum_file(&descriptor.file)?;
        let digest = fit_digest(&descriptor.key, template, &full)?;
        tracing::debug!(
            "config '{}': {} = {digest} ({})",
            descriptor.key,
            template.digest_variable,
            descriptor.file.display()
        );

        bindings.insert(DigestBinding {
            key: descriptor.key.clone(),
            variable: template.digest_variable.clone(),
            static_prefix: template.static_prefix.clone(),
            checksum: full,
            digest,
        })?;
    }
    Ok(bindings)
}

/// Resolve `manifests` through `source`, then [`bind_digests`].
pub fn compute_digests<S>(
    source: &S,
    namespace: &Namespace,
    manifests: &[PathBuf],
) -> Result<DigestBindings, DigestError>
where
    S: DescriptorSource + ?Sized,
{
    let descriptors = source.resolve(namespace, manifests)?;
    bind_digests(&descriptors)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn template(prefix_len: usize) -> NameTemplate {
        NameTemplate {
            static_prefix: "p".repeat(prefix_len),
            digest_variable: "CFG_HASH".into(),
        }
    }

    #[rstest]
    #[case(b"123456789".as_slice(), "3421780262")]
    #[case(b"hello world".as_slice(), "222957957")]
    #[case(b"".as_slice(), "0")]
    fn checksum_is_crc32_ieee_decimal(#[case] input: &[u8], #[case] expected: &str) {
        assert_eq!(checksum(input), expected);
    }

    #[rstest]
    #[case(60, "1234567890", "1234")]
    #[case(54, "1234567890", "1234567890")]
    #[case(55, "1234567890", "123456789")]
    #[case(64, "1234567890", "")]
    #[case(0, "1234567890", "1234567890")]
    fn fit_digest_right_truncates(
        #[case] prefix_len: usize,
        #[case] digest: &str,
        #[case] expected: &str,
    ) {
        let key = ConfigKey::from("cfg");
        let bound = fit_digest(&key, &template(prefix_len), digest).unwrap();
        assert_eq!(bound, expected);
        assert!(prefix_len + bound.len() <= MAX_CONFIG_NAME_LEN);
        assert!(digest.starts_with(&bound));
    }

    #[test]
    fn fit_digest_rejects_prefix_over_ceiling() {
        let key = ConfigKey::from("cfg");
        let err = fit_digest(&key, &template(65), "1234").unwrap_err();
        match err {
            DigestError::PrefixTooLong {
                prefix_len, limit, ..
            } => {
                assert_eq!(prefix_len, 65);
                assert_eq!(limit, 64);
            }
            other => panic!("expected PrefixTooLong, got {other:?}"),
        }
    }

    #[test]
    fn checksum_file_matches_in_memory_checksum() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        let content: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &content).unwrap();
        assert_eq!(checksum_file(&path).unwrap(), checksum(&content));
    }

    #[test]
    fn checksum_file_missing_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = checksum_file(&dir.path().join("absent.conf")).unwrap_err();
        assert!(matches!(err, DigestError::Io { .. }), "got: {err}");
        assert!(err.to_string().contains("absent.conf"));
    }
}
