use serde::{Deserialize, Serialize};

/// The signed-in user's profile as returned by `GET /api/users/me`.
///
/// This is the session's Identity: it only exists while a credential is
/// stored and the last fetch with that credential succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub nickname: Option<String>,
    pub email: String,
    #[serde(rename = "profilePicture")]
    pub profile_picture: Option<String>,
}

impl UserProfile {
    /// Name shown in the header; falls back to "Profile" like the web client.
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("Profile")
    }
}

/// Payload for `POST /api/users/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub nickname: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "profilePicture", skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

/// Account returned by a successful registration (password stripped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: Option<String>,
    pub nickname: Option<String>,
    pub email: String,
    #[serde(rename = "profilePicture")]
    pub profile_picture: Option<String>,
}

/// Payload for `PUT /api/users/me`.
///
/// An empty nickname leaves the nickname unchanged; an empty picture clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub nickname: String,
    #[serde(rename = "profilePicture")]
    pub profile_picture: String,
}

impl ProfileUpdate {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            nickname: profile.nickname.clone().unwrap_or_default(),
            profile_picture: profile.profile_picture.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile() {
        let json = r#"{"id":"u1","nickname":"neo","email":"a@b.com","profilePicture":null}"#;
        let profile: UserProfile = serde_json::from_str(json).expect("profile json");
        assert_eq!(profile.display_name(), "neo");
        assert_eq!(profile.email, "a@b.com");
    }

    #[test]
    fn test_display_name_fallback() {
        let profile = UserProfile {
            id: "u1".to_string(),
            nickname: Some(String::new()),
            email: "a@b.com".to_string(),
            profile_picture: None,
        };
        assert_eq!(profile.display_name(), "Profile");
    }

    #[test]
    fn test_registration_omits_missing_picture() {
        let reg = Registration {
            nickname: "neo".to_string(),
            email: "a@b.com".to_string(),
            password: "x".to_string(),
            profile_picture: None,
        };
        let value = serde_json::to_value(&reg).expect("serialize");
        assert!(value.get("profilePicture").is_none());
        assert_eq!(value["nickname"], "neo");
    }

    #[test]
    fn test_profile_update_from_profile() {
        let profile = UserProfile {
            id: "u1".to_string(),
            nickname: Some("neo".to_string()),
            email: "a@b.com".to_string(),
            profile_picture: None,
        };
        let update = ProfileUpdate::from_profile(&profile);
        assert_eq!(update.nickname, "neo");
        assert_eq!(update.profile_picture, "");
    }
}
