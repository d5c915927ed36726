//! MD5 checksums for the rip log's verification section.

use std::fs::File;
use std::io;
use std::path::Path;

use md5::{Digest, Md5};

/// Hex MD5 digest of a file's contents.
pub fn md5_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_md5_known_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"abc").unwrap();
        drop(f);
        // RFC 1321 test vector for "abc"
        assert_eq!(md5_file(&path).unwrap(), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_md5_missing_file() {
        assert!(md5_file(Path::new("/no/such/file")).is_err());
    }
}
