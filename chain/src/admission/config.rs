use super::fingerprint::FingerprintScheme;
use super::policy::DEFAULT_BLACKLIST;

/// Admission tuning.
#[derive(Clone, Debug)]
pub struct AdmissionConfig {
    /// Fingerprint scheme used for new documents.
    pub scheme: FingerprintScheme,
    /// Similarity at or above which a document is a near duplicate.
    pub similarity_threshold: f64,
    /// Content-policy keywords.
    pub blacklist: Vec<String>,
    /// Largest accepted document, in raw bytes.
    pub max_document_bytes: usize,
}

/// Default cap on raw document size (16 MiB).
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 16 * 1024 * 1024;

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            scheme: FingerprintScheme::MinHash,
            similarity_threshold: 0.65,
            blacklist: DEFAULT_BLACKLIST.iter().map(|k| k.to_string()).collect(),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}
