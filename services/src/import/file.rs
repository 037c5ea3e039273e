//! Uploaded import file handle.

use std::path::Path;

/// UTF-8 BOM bytes.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// An uploaded file, consumed once by the importer.
#[derive(Debug, Clone)]
pub struct ImportFile {
    original_name: String,
    /// `None` when the upload could not be read.
    contents: Option<Vec<u8>>,
}

impl ImportFile {
    pub fn new(original_name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            original_name: original_name.into(),
            contents: Some(contents.into()),
        }
    }

    /// An upload whose temporary contents could not be read.
    pub fn unreadable(original_name: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            contents: None,
        }
    }

    /// Reads a file from disk. A read failure yields an unreadable handle so
    /// the importer reports it the same way as a broken upload.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        match std::fs::read(path) {
            Ok(contents) => Self::new(name, contents),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read import file");
                Self::unreadable(name)
            }
        }
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Text after the last dot of the name, empty when there is none.
    pub fn extension(&self) -> &str {
        self.original_name
            .rsplit_once('.')
            .map(|(_, extension)| extension)
            .unwrap_or_default()
    }

    /// The contents split into lines, without line terminators.
    ///
    /// Returns `None` when the upload is unreadable or not valid UTF-8.
    /// A leading BOM is dropped.
    pub fn lines(&self) -> Option<Vec<&str>> {
        let contents = self.contents.as_deref()?;
        let contents = contents.strip_prefix(UTF8_BOM).unwrap_or(contents);
        let text = std::str::from_utf8(contents).ok()?;
        Some(text.lines().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(ImportFile::new("users.csv", "").extension(), "csv");
        assert_eq!(ImportFile::new("users.backup.txt", "").extension(), "txt");
        assert_eq!(ImportFile::new("users", "").extension(), "");
    }

    #[test]
    fn test_lines_strip_bom_and_crlf() {
        let mut contents = UTF8_BOM.to_vec();
        contents.extend_from_slice(b"uname,pass\r\nalice,secret\r\n");
        let file = ImportFile::new("users.csv", contents);
        assert_eq!(file.lines().unwrap(), vec!["uname,pass", "alice,secret"]);
    }

    #[test]
    fn test_lines_of_empty_file() {
        assert!(ImportFile::new("users.csv", "").lines().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_unreadable() {
        let file = ImportFile::new("users.csv", vec![0xFF, 0xFE, 0x00]);
        assert!(file.lines().is_none());
        assert!(ImportFile::unreadable("users.csv").lines().is_none());
    }

    #[test]
    fn test_from_missing_path() {
        let file = ImportFile::from_path("/nonexistent/dir/users.csv");
        assert_eq!(file.original_name(), "users.csv");
        assert!(file.lines().is_none());
    }
}
