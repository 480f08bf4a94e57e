//! Pluggable text extraction.

/// Turns raw document bytes into text, or `None` for non-text content.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Option<String>;
}

/// Accepts strictly valid UTF-8 without NUL bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Utf8TextExtractor;

impl TextExtractor for Utf8TextExtractor {
    fn extract(&self, bytes: &[u8]) -> Option<String> {
        let text = std::str::from_utf8(bytes).ok()?;
        if text.contains('\0') || text.trim().is_empty() {
            return None;
        }
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_text_is_extracted() {
        assert_eq!(
            Utf8TextExtractor.extract("héllo world".as_bytes()).as_deref(),
            Some("héllo world")
        );
    }

    #[test]
    fn binary_and_blank_content_is_not_text() {
        assert!(Utf8TextExtractor.extract(&[0xff, 0xfe, 0x00]).is_none());
        assert!(Utf8TextExtractor.extract(b"abc\0def").is_none());
        assert!(Utf8TextExtractor.extract(b"  \n\t ").is_none());
        assert!(Utf8TextExtractor.extract(b"").is_none());
    }
}
