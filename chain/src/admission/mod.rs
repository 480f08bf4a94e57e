//! Admission controller: fingerprinting, content policy, near-duplicate
//! detection and the quorum vote that gates new documents.

pub mod config;
pub mod controller;
pub mod extract;
pub mod fingerprint;
pub mod policy;

pub use config::{AdmissionConfig, DEFAULT_MAX_DOCUMENT_BYTES};
pub use controller::{AdmissionController, Candidate, Decision, NearDuplicate};
pub use extract::{TextExtractor, Utf8TextExtractor};
pub use fingerprint::{Fingerprint, FingerprintScheme, normalize, shingles, similarity};
pub use policy::{ContentPolicy, DEFAULT_BLACKLIST};
