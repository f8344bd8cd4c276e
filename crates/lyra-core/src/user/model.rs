//! UserProfile domain model.
//!
//! Mirrors the backend user record. The profile held locally is an advisory
//! cache of the last-known server state, never authoritative.

use serde::{Deserialize, Deserializer, Serialize};

/// User profile domain model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub account_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Interest tags, normalized to lowercase on read. The backend may send
    /// these as a list, a JSON-encoded string of a list, or a comma-separated
    /// string.
    #[serde(default, deserialize_with = "deserialize_interests")]
    pub interests: Vec<String>,
    /// Direct image reference (URL), when an avatar has been uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Birth date in `YYYY-MM-DD` form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

impl UserProfile {
    /// Name to display: nickname when set, full name otherwise.
    pub fn display_name(&self) -> &str {
        match self.nickname.as_deref() {
            Some(nickname) if !nickname.is_empty() => nickname,
            _ => &self.full_name,
        }
    }

    /// Uppercase initial used when no avatar image is set.
    pub fn initial(&self) -> char {
        self.full_name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

/// Accepts the three wire forms of `interests` and normalizes them to a
/// trimmed, lowercase list.
fn deserialize_interests<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Text(String),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(match raw {
        None => Vec::new(),
        Some(Raw::List(items)) => normalize(items),
        Some(Raw::Text(text)) => match serde_json::from_str::<Vec<String>>(&text) {
            Ok(items) => normalize(items),
            Err(_) => normalize(text.split(',').map(str::to_string).collect()),
        },
    })
}

fn normalize(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with_interests(value: serde_json::Value) -> UserProfile {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "email": "ana@example.com",
            "full_name": "Ana Souza",
            "account_type": "student",
            "interests": value
        }))
        .unwrap()
    }

    #[test]
    fn interests_accepts_a_plain_list() {
        let profile = profile_with_interests(serde_json::json!(["Math", " History "]));
        assert_eq!(profile.interests, vec!["math", "history"]);
    }

    #[test]
    fn interests_accepts_a_json_encoded_string() {
        let profile = profile_with_interests(serde_json::json!("[\"Math\",\"Physics\"]"));
        assert_eq!(profile.interests, vec!["math", "physics"]);
    }

    #[test]
    fn interests_accepts_a_comma_separated_string() {
        let profile = profile_with_interests(serde_json::json!("Math, History,  "));
        assert_eq!(profile.interests, vec!["math", "history"]);
    }

    #[test]
    fn interests_defaults_to_empty_when_absent_or_null() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "id": 1,
            "email": "ana@example.com",
            "full_name": "Ana Souza",
            "account_type": "student",
            "interests": null
        }))
        .unwrap();
        assert!(profile.interests.is_empty());
    }

    #[test]
    fn display_name_prefers_nickname() {
        let mut profile = profile_with_interests(serde_json::json!([]));
        assert_eq!(profile.display_name(), "Ana Souza");
        profile.nickname = Some("Aninha".to_string());
        assert_eq!(profile.display_name(), "Aninha");
        assert_eq!(profile.initial(), 'A');
    }
}
