//! Language preference and translation capability.
//!
//! Catalog loading and rendering belong to the presentation layer; this
//! module only carries the preferred language tag on chat requests and the
//! optional translation seam.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported interface languages.
///
/// Detection falls back to Portuguese, matching the product default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LanguageTag {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en-US")]
    EnUs,
}

impl LanguageTag {
    /// The BCP 47 tag sent to the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PtBr => "pt-BR",
            Self::EnUs => "en-US",
        }
    }

    /// Parses a tag by its language prefix (`pt-BR`, `pt`, `en-US`, ...).
    pub fn parse(tag: &str) -> Option<Self> {
        let lowered = tag.trim().to_lowercase();
        if lowered.starts_with("pt") {
            Some(Self::PtBr)
        } else if lowered.starts_with("en") {
            Some(Self::EnUs)
        } else {
            None
        }
    }

    /// Detects the language from the process locale (`LC_ALL`, then `LANG`),
    /// falling back to `pt-BR`.
    pub fn detect() -> Self {
        ["LC_ALL", "LANG"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find_map(|value| Self::parse(&value))
            .unwrap_or_default()
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional translation collaborator.
///
/// Components that produce user-facing strings receive a `Translator`;
/// absence of a real catalog is represented by [`IdentityTranslator`], never
/// by probing for one at runtime.
pub trait Translator: Send + Sync {
    /// Resolves a dotted catalog key (e.g. `messages.welcome`) to display
    /// text. Unknown keys resolve to the key itself.
    fn translate(&self, key: &str) -> String;
}

/// No-op translator: every key resolves to itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, key: &str) -> String {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_matches_on_language_prefix() {
        assert_eq!(LanguageTag::parse("pt-BR"), Some(LanguageTag::PtBr));
        assert_eq!(LanguageTag::parse("pt_PT.UTF-8"), Some(LanguageTag::PtBr));
        assert_eq!(LanguageTag::parse("en-US"), Some(LanguageTag::EnUs));
        assert_eq!(LanguageTag::parse("fr-FR"), None);
    }

    #[test]
    fn wire_form_is_the_bcp47_tag() {
        assert_eq!(
            serde_json::to_value(LanguageTag::PtBr).unwrap(),
            serde_json::json!("pt-BR")
        );
    }

    #[test]
    fn identity_translator_returns_the_key() {
        assert_eq!(
            IdentityTranslator.translate("messages.welcome"),
            "messages.welcome"
        );
    }
}
