use shopbot_core::config::ChatbotConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    Deny { reason_code: &'static str },
}

/// Keyword policy deciding whether a message is about the shop at all.
///
/// Matching is a case-insensitive substring test. Diacritics are significant, so
/// `cena` does not match `cēna`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicGate {
    enabled: bool,
    keywords: Vec<String>,
}

impl TopicGate {
    pub fn new<I, S>(enabled: bool, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|keyword| keyword.as_ref().trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        Self { enabled, keywords }
    }

    pub fn from_config(config: &ChatbotConfig) -> Self {
        Self::new(config.topic_gate, &config.topic_keywords)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Keyword membership, independent of whether the gate is enforced.
    pub fn is_in_scope(&self, message: &str) -> bool {
        contains_any(&message.to_lowercase(), &self.keywords)
    }

    pub fn evaluate(&self, message: &str) -> GuardrailDecision {
        if !self.enabled || self.is_in_scope(message) {
            GuardrailDecision::Allow
        } else {
            GuardrailDecision::Deny { reason_code: "off_topic" }
        }
    }
}

/// `haystack` must already be lowercased.
pub(crate) fn contains_any<S: AsRef<str>>(haystack: &str, needles: &[S]) -> bool {
    !haystack.is_empty()
        && needles.iter().map(AsRef::as_ref).any(|needle| !needle.is_empty() && haystack.contains(needle))
}
