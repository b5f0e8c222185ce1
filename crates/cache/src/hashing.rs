use lampsmith_core::{constants::HASH_CHUNK_SIZE, Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Hash a file's content using streaming so large scripts are never loaded whole
pub fn hash_file(file_path: &Path) -> Result<String> {
    let file = File::open(file_path)
        .map_err(|e| Error::file_system(file_path, "open file for hashing", e))?;

    let mut reader = BufReader::with_capacity(HASH_CHUNK_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| Error::file_system(file_path, "read file chunk for hashing", e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Hash a script, yielding `None` when it cannot be read
///
/// A `None` digest never matches a cached one, which forces a re-run.
pub fn script_digest(file_path: &Path) -> Option<String> {
    match hash_file(file_path) {
        Ok(hash) => {
            tracing::debug!(path = %file_path.display(), hash = %hash, "hashed script");
            Some(hash)
        }
        Err(e) => {
            tracing::warn!(path = %file_path.display(), error = %e, "could not hash script");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_hash_is_stable_for_same_content() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.py");
        let b = temp_dir.path().join("b.py");
        fs::write(&a, "import bpy\n").unwrap();
        fs::write(&b, "import bpy\n").unwrap();

        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn test_hash_changes_with_content() {
        let temp_dir = TempDir::new().unwrap();
        let script = temp_dir.path().join("lamp_base.py");
        fs::write(&script, "SHADE_SIZE = 200\n").unwrap();
        let before = hash_file(&script).unwrap();

        fs::write(&script, "SHADE_SIZE = 210\n").unwrap();
        let after = hash_file(&script).unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn test_known_sha256_of_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let empty = temp_dir.path().join("empty.py");
        fs::write(&empty, "").unwrap();

        assert_eq!(
            hash_file(&empty).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_content_spanning_several_chunks() {
        let temp_dir = TempDir::new().unwrap();
        let big = temp_dir.path().join("big.py");
        let content = "x".repeat(HASH_CHUNK_SIZE * 3 + 17);
        fs::write(&big, &content).unwrap();

        let expected = format!("{:x}", Sha256::digest(content.as_bytes()));
        assert_eq!(hash_file(&big).unwrap(), expected);
    }

    #[test]
    fn test_missing_file_has_no_digest() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone.py");

        assert!(script_digest(&missing).is_none());
        assert!(matches!(hash_file(&missing), Err(Error::FileSystem { .. })));
    }
}
