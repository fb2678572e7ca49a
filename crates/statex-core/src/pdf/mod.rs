//! Text sources: turn a document on disk into ordered page text.

mod extractor;
mod plain;

pub use extractor::PdfTextSource;
pub use plain::PlainTextSource;

use std::path::Path;

use crate::error::DocumentError;
use crate::models::RawDocument;
use crate::models::config::SourceConfig;

/// Result type for text source operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Trait for page text providers.
pub trait TextSource: Send + Sync {
    /// Load a document's pages. `password` is tried for encrypted documents.
    fn load(&self, path: &Path, password: Option<&str>) -> Result<RawDocument>;
}

/// The identifier records carry for a document: its file name.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Pick a text source by file extension.
pub fn source_for(path: &Path, config: &SourceConfig) -> Result<Box<dyn TextSource>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => Ok(Box::new(
            PdfTextSource::new().with_empty_password(config.try_empty_password),
        )),
        "txt" | "text" => Ok(Box::new(PlainTextSource::new())),
        _ => Err(DocumentError::UnsupportedSource(path.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_name_is_file_name() {
        assert_eq!(source_name(Path::new("/data/2021/MHBAN999_2021.pdf")), "MHBAN999_2021.pdf");
        assert_eq!(source_name(Path::new("note.txt")), "note.txt");
    }

    #[test]
    fn test_source_for_extension() {
        let config = SourceConfig::default();
        assert!(source_for(Path::new("a.PDF"), &config).is_ok());
        assert!(source_for(Path::new("a.txt"), &config).is_ok());
        assert!(matches!(
            source_for(Path::new("a.xlsx"), &config),
            Err(DocumentError::UnsupportedSource(_))
        ));
    }
}
