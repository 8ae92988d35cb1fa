use serde::{Deserialize, Serialize};

/// Shown on the profile when the identity has no display name.
const DEFAULT_DISPLAY_NAME: &str = "Farmer";

/// The signed-in user, as established by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            display_name: None,
            photo_url: None,
        }
    }

    /// The display name, or `Farmer` if there is none.
    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    /// The part of the email before the `@`, used to greet the user on the home screen.
    pub fn short_name(&self) -> &str {
        self.email.split('@').next().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_default() {
        let mut id = Identity::new("u1", "wanjiku@example.com");
        assert_eq!(id.display_name(), "Farmer");
        id.display_name = Some("  ".into());
        assert_eq!(id.display_name(), "Farmer");
        id.display_name = Some("Wanjiku".into());
        assert_eq!(id.display_name(), "Wanjiku");
    }

    #[test]
    fn test_short_name() {
        assert_eq!(Identity::new("u", "otieno@farm.co.ke").short_name(), "otieno");
        assert_eq!(Identity::new("u", "no-at-sign").short_name(), "no-at-sign");
    }

    #[test]
    fn test_photo_url_field_name() {
        let mut id = Identity::new("u1", "a@b.c");
        id.photo_url = Some("https://img".into());
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json["photoURL"], "https://img");
        assert!(json.get("displayName").is_none());
    }
}
