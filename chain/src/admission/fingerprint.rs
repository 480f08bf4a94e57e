//! Similarity fingerprints of normalized document text.
//!
//! Two schemes are supported:
//!
//! - MinHash over word 3-shingles, 128 slots, wire form is the slots as
//!   comma-separated decimal `u32`s. Similarity is the fraction of equal
//!   slots, an estimate of the Jaccard similarity of the shingle sets.
//! - SimHash over character 4-grams, 64 bits, wire form is a decimal `u64`.
//!   Similarity is `1 - hamming / 64`.
//!
//! Both are deterministic across nodes: slot permutations come from a fixed
//! seed and every feature is hashed with SHA-256.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use sha2::{Digest, Sha256};

/// Number of MinHash slots.
pub const MINHASH_PERMUTATIONS: usize = 128;

/// Width of a SimHash fingerprint in bits.
pub const SIMHASH_BITS: u32 = 64;

const MERSENNE_PRIME: u64 = (1 << 61) - 1;
const MAX_HASH: u64 = (1 << 32) - 1;
const PERMUTATION_SEED: u64 = 1;
const SHINGLE_WORDS: usize = 3;
const SIMHASH_GRAM: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FingerprintScheme {
    #[default]
    MinHash,
    SimHash,
}

impl FromStr for FingerprintScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minhash" => Ok(FingerprintScheme::MinHash),
            "simhash" => Ok(FingerprintScheme::SimHash),
            other => Err(format!("unknown fingerprint scheme: {other}")),
        }
    }
}

impl fmt::Display for FingerprintScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FingerprintScheme::MinHash => f.write_str("minhash"),
            FingerprintScheme::SimHash => f.write_str("simhash"),
        }
    }
}

/// Lowercases, drops everything but word characters and whitespace, and
/// collapses whitespace runs into single spaces.
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Word 3-shingles of normalized text. Shorter texts form one shingle.
pub fn shingles(normalized: &str) -> Vec<String> {
    let words: Vec<&str> = normalized.split_whitespace().collect();
    match words.len() {
        0 => Vec::new(),
        n if n < SHINGLE_WORDS => vec![words.join(" ")],
        _ => words.windows(SHINGLE_WORDS).map(|w| w.join(" ")).collect(),
    }
}

fn digest(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

fn hash32(data: &[u8]) -> u64 {
    let d = digest(data);
    u64::from(u32::from_le_bytes([d[0], d[1], d[2], d[3]]))
}

fn hash64(data: &[u8]) -> u64 {
    let d = digest(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&d[..8]);
    u64::from_le_bytes(bytes)
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// `(a, b)` pairs of the universal hash `(a * h + b) mod p`, one per slot.
fn permutations() -> &'static [(u64, u64)] {
    static PERMUTATIONS: OnceLock<Vec<(u64, u64)>> = OnceLock::new();
    PERMUTATIONS.get_or_init(|| {
        let mut state = PERMUTATION_SEED;
        (0..MINHASH_PERMUTATIONS)
            .map(|_| {
                let a = 1 + splitmix64(&mut state) % (MERSENNE_PRIME - 1);
                let b = splitmix64(&mut state) % MERSENNE_PRIME;
                (a, b)
            })
            .collect()
    })
}

/// MinHash signature of a shingle set; `None` if there are no shingles.
pub fn minhash(shingles: &[String]) -> Option<Vec<u32>> {
    if shingles.is_empty() {
        return None;
    }
    let mut signature = vec![MAX_HASH; MINHASH_PERMUTATIONS];
    for shingle in shingles {
        let h = u128::from(hash32(shingle.as_bytes()));
        for (slot, (a, b)) in signature.iter_mut().zip(permutations()) {
            let permuted = (u128::from(*a) * h + u128::from(*b)) % u128::from(MERSENNE_PRIME);
            let value = permuted as u64 & MAX_HASH;
            if value < *slot {
                *slot = value;
            }
        }
    }
    Some(signature.into_iter().map(|v| v as u32).collect())
}

/// SimHash of normalized text over character 4-grams (whitespace removed).
pub fn simhash(normalized: &str) -> Option<u64> {
    let chars: Vec<char> = normalized.chars().filter(|c| !c.is_whitespace()).collect();
    if chars.is_empty() {
        return None;
    }

    let mut features: BTreeMap<String, i64> = BTreeMap::new();
    if chars.len() < SIMHASH_GRAM {
        features.insert(chars.iter().collect(), 1);
    } else {
        for gram in chars.windows(SIMHASH_GRAM) {
            *features.entry(gram.iter().collect()).or_default() += 1;
        }
    }

    let mut weights = [0i64; SIMHASH_BITS as usize];
    for (feature, weight) in &features {
        let h = hash64(feature.as_bytes());
        for (bit, acc) in weights.iter_mut().enumerate() {
            if (h >> bit) & 1 == 1 {
                *acc += weight;
            } else {
                *acc -= weight;
            }
        }
    }

    Some(
        weights
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > 0)
            .fold(0u64, |acc, (bit, _)| acc | (1 << bit)),
    )
}

/// A parsed fingerprint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fingerprint {
    MinHash(Vec<u32>),
    SimHash(u64),
}

impl Fingerprint {
    /// Fingerprints `text` with `scheme`; `None` for empty text.
    pub fn of_text(text: &str, scheme: FingerprintScheme) -> Option<Self> {
        let normalized = normalize(text);
        match scheme {
            FingerprintScheme::MinHash => minhash(&shingles(&normalized)).map(Fingerprint::MinHash),
            FingerprintScheme::SimHash => simhash(&normalized).map(Fingerprint::SimHash),
        }
    }

    /// Parses the wire form. A comma marks a MinHash signature.
    pub fn parse(wire: &str) -> Option<Self> {
        let wire = wire.trim();
        if wire.contains(',') {
            wire.split(',')
                .map(|slot| slot.trim().parse::<u32>().ok())
                .collect::<Option<Vec<_>>>()
                .map(Fingerprint::MinHash)
        } else {
            wire.parse::<u64>().ok().map(Fingerprint::SimHash)
        }
    }

    /// Similarity in `[0, 1]`; fingerprints of different kinds or sizes
    /// compare as `0.0`.
    pub fn similarity(&self, other: &Fingerprint) -> f64 {
        match (self, other) {
            (Fingerprint::MinHash(a), Fingerprint::MinHash(b)) if a.len() == b.len() && !a.is_empty() => {
                let equal = a.iter().zip(b).filter(|(x, y)| x == y).count();
                equal as f64 / a.len() as f64
            }
            (Fingerprint::SimHash(a), Fingerprint::SimHash(b)) => {
                1.0 - f64::from((a ^ b).count_ones()) / f64::from(SIMHASH_BITS)
            }
            _ => 0.0,
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fingerprint::MinHash(slots) => {
                let mut first = true;
                for slot in slots {
                    if !first {
                        f.write_str(",")?;
                    }
                    write!(f, "{slot}")?;
                    first = false;
                }
                Ok(())
            }
            Fingerprint::SimHash(bits) => write!(f, "{bits}"),
        }
    }
}

/// Similarity of two wire-form fingerprints; unparseable input gives `0.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    match (Fingerprint::parse(a), Fingerprint::parse(b)) {
        (Some(a), Some(b)) => a.similarity(&b),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text(swap_at: Option<usize>) -> String {
        (0..200)
            .map(|i| {
                if Some(i) == swap_at {
                    "changed".to_string()
                } else {
                    format!("token{i}")
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn wire(text: &str, scheme: FingerprintScheme) -> String {
        Fingerprint::of_text(text, scheme)
            .expect("text has content")
            .to_string()
    }

    #[test]
    fn normalize_strips_punctuation_and_collapses_whitespace() {
        assert_eq!(normalize("  Hello,\n\tWORLD!!  foo_bar "), "hello world foo_bar");
        assert_eq!(normalize("...!?"), "");
    }

    #[test]
    fn short_texts_form_a_single_shingle() {
        assert!(shingles("").is_empty());
        assert_eq!(shingles("one two"), vec!["one two"]);
        assert_eq!(shingles("a b c d"), vec!["a b c", "b c d"]);
    }

    #[test]
    fn minhash_wire_form_has_128_slots() {
        let fp = wire("the quick brown fox jumps", FingerprintScheme::MinHash);
        assert_eq!(fp.split(',').count(), MINHASH_PERMUTATIONS);
        assert_eq!(similarity(&fp, &fp), 1.0);
    }

    #[test]
    fn minhash_tracks_jaccard_similarity() {
        let base = wire(&long_text(None), FingerprintScheme::MinHash);
        let edited = wire(&long_text(Some(100)), FingerprintScheme::MinHash);
        let unrelated = wire(
            &(0..200).map(|i| format!("other{i}")).collect::<Vec<_>>().join(" "),
            FingerprintScheme::MinHash,
        );

        assert!(similarity(&base, &edited) >= 0.65);
        assert!(similarity(&base, &unrelated) < 0.65);
    }

    #[test]
    fn fingerprints_ignore_case_and_punctuation() {
        for scheme in [FingerprintScheme::MinHash, FingerprintScheme::SimHash] {
            let a = wire("Hello, World! This is a test.", scheme);
            let b = wire("hello world this is a test", scheme);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn simhash_is_a_decimal_u64_close_for_small_edits() {
        let base = wire(&long_text(None), FingerprintScheme::SimHash);
        let edited = wire(&long_text(Some(100)), FingerprintScheme::SimHash);

        assert!(base.parse::<u64>().is_ok());
        assert_eq!(similarity(&base, &base), 1.0);
        assert!(similarity(&base, &edited) > 0.8);
    }

    #[test]
    fn empty_text_has_no_fingerprint() {
        assert!(Fingerprint::of_text("  ...  ", FingerprintScheme::MinHash).is_none());
        assert!(Fingerprint::of_text("", FingerprintScheme::SimHash).is_none());
    }

    #[test]
    fn mismatched_or_garbage_fingerprints_compare_as_zero() {
        let minhash = wire("some words here", FingerprintScheme::MinHash);
        let simhash = wire("some words here", FingerprintScheme::SimHash);

        assert_eq!(similarity(&minhash, &simhash), 0.0);
        assert_eq!(similarity(&minhash, "1,2,3"), 0.0);
        assert_eq!(similarity("not a fingerprint", &simhash), 0.0);
        assert_eq!(similarity("", ""), 0.0);
    }

    #[test]
    fn scheme_parses_from_config_strings() {
        assert_eq!("MinHash".parse(), Ok(FingerprintScheme::MinHash));
        assert_eq!(" simhash ".parse(), Ok(FingerprintScheme::SimHash));
        assert!("sha1".parse::<FingerprintScheme>().is_err());
        assert_eq!(FingerprintScheme::SimHash.to_string(), "simhash");
    }
}
