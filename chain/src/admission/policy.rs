//! Keyword blacklist applied to extracted document text.

use crate::error::NodeError;

use super::fingerprint::normalize;

/// Keywords rejected when no list is configured.
pub const DEFAULT_BLACKLIST: &[&str] = &["offensive", "inappropriate", "hate", "violence", "illegal"];

/// Case-insensitive whole-word keyword scan.
#[derive(Clone, Debug)]
pub struct ContentPolicy {
    keywords: Vec<String>,
}

impl Default for ContentPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BLACKLIST.iter().copied())
    }
}

impl ContentPolicy {
    /// Builds a policy from keywords; blank entries are ignored. Keywords
    /// may span several words.
    pub fn new<I, T>(keywords: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| normalize(k.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Fails with the first blacklisted keyword found in `text`.
    pub fn check(&self, text: &str) -> Result<(), NodeError> {
        let padded = format!(" {} ", normalize(text));
        match self
            .keywords
            .iter()
            .find(|k| padded.contains(&format!(" {k} ")))
        {
            Some(keyword) => Err(NodeError::ContentPolicy {
                keyword: keyword.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;

    #[test]
    fn default_list_rejects_keyword_in_any_case() {
        let err = ContentPolicy::default()
            .check("This report is ILLEGAL, frankly.")
            .expect_err("keyword present");
        assert_eq!(err.class(), ErrorClass::Validation);
        assert!(err.to_string().contains("illegal"));
    }

    #[test]
    fn only_whole_words_match() {
        let policy = ContentPolicy::default();
        assert!(policy.check("whatever happens, stay calm").is_ok());
        assert!(policy.check("I hate mondays").is_err());
    }

    #[test]
    fn custom_lists_support_phrases_and_skip_blanks() {
        let policy = ContentPolicy::new(["  ", "Top Secret"]);
        assert_eq!(policy.keywords(), &["top secret".to_string()]);
        assert!(policy.check("this is top   secret material").is_err());
        assert!(policy.check("top of the secret list").is_ok());
    }
}
