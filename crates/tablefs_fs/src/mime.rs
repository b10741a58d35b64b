//! MIME type detection

/// Injected MIME detection capability
pub trait MimeTypeDetector: Send + Sync {
    /// Detect from the path and the contents about to be stored
    fn detect_mime_type(&self, path: &str, contents: &[u8]) -> Option<String>;

    /// Detect from the path alone
    fn detect_mime_type_from_path(&self, path: &str) -> Option<String>;
}

/// Sniffs magic bytes first, then falls back to the file extension
///
/// Plain-text formats carry no signature, so for those the extension decides.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMimeTypeDetector;

impl DefaultMimeTypeDetector {
    pub fn new() -> Self {
        Self
    }
}

impl MimeTypeDetector for DefaultMimeTypeDetector {
    fn detect_mime_type(&self, path: &str, contents: &[u8]) -> Option<String> {
        infer::get(contents)
            .map(|kind| kind.mime_type().to_string())
            .or_else(|| self.detect_mime_type_from_path(path))
    }

    fn detect_mime_type_from_path(&self, path: &str) -> Option<String> {
        mime_guess::from_path(path).first_raw().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    #[test]
    fn test_detect_by_extension() {
        let detector = DefaultMimeTypeDetector::new();
        assert_eq!(
            detector.detect_mime_type("a/b/c.txt", b"hello").as_deref(),
            Some("text/plain")
        );
        assert_eq!(
            detector.detect_mime_type_from_path("photo.JPG").as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(
            detector.detect_mime_type_from_path("docs/report.docx").as_deref(),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        );
    }

    #[test]
    fn test_detect_by_contents() {
        let detector = DefaultMimeTypeDetector::new();
        assert_eq!(
            detector.detect_mime_type("uploads/photo", PNG_HEADER).as_deref(),
            Some("image/png")
        );
        // the signature wins over a misleading extension
        assert_eq!(
            detector.detect_mime_type("image.txt", PNG_HEADER).as_deref(),
            Some("image/png")
        );
        // path-only detection cannot see it
        assert_eq!(detector.detect_mime_type_from_path("uploads/photo"), None);
    }

    #[test]
    fn test_unknown() {
        let detector = DefaultMimeTypeDetector::new();
        assert_eq!(detector.detect_mime_type_from_path("README"), None);
        assert_eq!(detector.detect_mime_type_from_path(".env"), None);
        assert_eq!(detector.detect_mime_type_from_path("data.unknownext"), None);
        assert_eq!(detector.detect_mime_type_from_path("dir.d/file"), None);
        assert_eq!(detector.detect_mime_type("notes", b"plain words"), None);
    }
}
