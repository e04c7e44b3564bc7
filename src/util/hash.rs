//! SHA-256 digests for skipping unchanged files.

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Hex SHA-256 of a byte slice.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Hex SHA-256 of a file, streamed from disk.
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {} for hashing", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("failed to read {} for hashing", path.display()))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Whether `a` and `b` are both regular files with identical contents.
///
/// Differing sizes short-circuit the digest; any I/O error means "differs".
pub fn same_contents(a: &Path, b: &Path) -> bool {
    let size = |p: &Path| std::fs::metadata(p).ok().filter(|m| m.is_file()).map(|m| m.len());
    match (size(a), size(b)) {
        (Some(sa), Some(sb)) if sa == sb => {}
        _ => return false,
    }
    matches!((file_sha256(a), file_sha256(b)), (Ok(da), Ok(db)) if da == db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_file_digest_matches_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("libweb.so");
        fs::write(&path, b"hello").unwrap();
        assert_eq!(
            file_sha256(&path).unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(sha256_hex(b"hello"), file_sha256(&path).unwrap());
    }

    #[test]
    fn test_same_contents() {
        let tmp = TempDir::new().unwrap();
        let write = |name: &str, data: &[u8]| {
            let path = tmp.path().join(name);
            fs::write(&path, data).unwrap();
            path
        };
        let sdk = write("sdk.so", b"v1");
        let copy = write("copy.so", b"v1");
        let stale = write("stale.so", b"v0");
        let longer = write("longer.so", b"v1.1");

        assert!(same_contents(&sdk, &copy));
        assert!(!same_contents(&sdk, &stale));
        assert!(!same_contents(&sdk, &longer));
        assert!(!same_contents(&sdk, &tmp.path().join("missing.so")));
        assert!(!same_contents(tmp.path(), tmp.path()));
    }
}
