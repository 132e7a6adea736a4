//! Storage key generation.
//!
//! A storage key names one version's payload inside the blob store:
//!
//! ```text
//! {prefix}_{document_id}_v{version_number}_{token}{.ext}
//! ```
//!
//! The token carries 128 random bits, so keys for the same document and
//! version number never collide even when two uploads race for the number.

use rand::Rng;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::DocumentId;

/// Longest accepted original file name, in bytes.
pub const MAX_FILE_NAME_BYTES: usize = 255;

/// Produces collision-free storage keys.
#[derive(Debug, Clone)]
pub struct StorageKeyGenerator {
    prefix: String,
}

impl StorageKeyGenerator {
    /// Create a generator that stamps every key with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The configured key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Build a fresh key for `version_number` of `document_id`.
    ///
    /// Fails with `InvalidFileName` when the original name is unsafe. Only
    /// the extension of the original name ends up in the key.
    pub fn generate(
        &self,
        document_id: DocumentId,
        version_number: i32,
        original_file_name: &str,
    ) -> AppResult<String> {
        validate_file_name(original_file_name)?;
        let token = random_token();
        let key = match extension(original_file_name) {
            Some(ext) => format!(
                "{}_{}_v{}_{}.{}",
                self.prefix, document_id, version_number, token, ext
            ),
            None => format!(
                "{}_{}_v{}_{}",
                self.prefix, document_id, version_number, token
            ),
        };
        Ok(key)
    }
}

impl Default for StorageKeyGenerator {
    fn default() -> Self {
        Self::new("doc")
    }
}

/// Reject file names that are empty, oversized, or attempt traversal.
pub fn validate_file_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::invalid_file_name("File name must not be empty"));
    }
    if name.len() > MAX_FILE_NAME_BYTES {
        return Err(AppError::invalid_file_name(format!(
            "File name exceeds {MAX_FILE_NAME_BYTES} bytes"
        )));
    }
    if name.contains('\0') {
        return Err(AppError::invalid_file_name(
            "File name must not contain NUL bytes",
        ));
    }
    if name.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(AppError::invalid_file_name(format!(
            "File name contains a parent directory reference: {name}"
        )));
    }
    Ok(())
}

/// Extension of the final path segment, if it is plain ASCII alphanumerics.
///
/// A leading dot (`.bashrc`) marks a hidden file, not an extension.
pub fn extension(name: &str) -> Option<&str> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let dot = base.rfind('.')?;
    if dot == 0 {
        return None;
    }
    let ext = &base[dot + 1..];
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

fn random_token() -> String {
    let mut rng = rand::thread_rng();
    let bits: u128 = rng.r#gen();
    format!("{bits:032x}")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use docvault_core::error::ErrorKind;

    use super::*;

    #[test]
    fn test_key_layout() {
        let generator = StorageKeyGenerator::new("doc");
        let document_id = DocumentId::new();
        let key = generator
            .generate(document_id, 3, "report.final.pdf")
            .unwrap();

        let expected_head = format!("doc_{document_id}_v3_");
        assert!(key.starts_with(&expected_head));
        assert!(key.ends_with(".pdf"));

        let token = &key[expected_head.len()..key.len() - ".pdf".len()];
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_no_extension() {
        let generator = StorageKeyGenerator::default();
        let key = generator.generate(DocumentId::new(), 1, "README").unwrap();
        assert!(!key.contains('.'));

        let key = generator.generate(DocumentId::new(), 1, ".bashrc").unwrap();
        assert!(!key.contains('.'));
    }

    #[test]
    fn test_keys_are_unique() {
        let generator = StorageKeyGenerator::default();
        let document_id = DocumentId::new();
        let keys: HashSet<String> = (0..500)
            .map(|_| generator.generate(document_id, 1, "a.txt").unwrap())
            .collect();
        assert_eq!(keys.len(), 500);
    }

    #[test]
    fn test_rejects_traversal() {
        let generator = StorageKeyGenerator::default();
        for name in ["../etc/passwd", "a/../../b.txt", "..\\secret.txt", ".."] {
            let err = generator.generate(DocumentId::new(), 1, name).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidFileName, "{name}");
        }
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("   ").is_err());
        assert!(validate_file_name("a\0b.txt").is_err());
        assert!(validate_file_name(&"x".repeat(256)).is_err());
        assert!(validate_file_name(&"x".repeat(255)).is_ok());
    }

    #[test]
    fn test_dots_inside_names_are_allowed() {
        assert!(validate_file_name("v1..2.txt").is_ok());
        assert!(validate_file_name("notes.../x.md").is_ok());
    }

    #[test]
    fn test_extension_rules() {
        assert_eq!(extension("photo.JPG"), Some("JPG"));
        assert_eq!(extension("dir.v2/file"), None);
        assert_eq!(extension("archive.tar.gz"), Some("gz"));
        assert_eq!(extension("trailing."), None);
        assert_eq!(extension("weird.p_d f"), None);
        assert_eq!(extension("C:\\docs\\memo.docx"), Some("docx"));
    }
}
