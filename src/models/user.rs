use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Read-only snapshot of an Aitu Passport user, taken from a single
/// `/api/user/me` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

impl UserProfile {
    pub fn from_response(body: &Value) -> Result<Self> {
        serde_json::from_value(body.clone())
            .map_err(|e| Error::api(200, format!("malformed user profile: {}", e)))
    }

    /// Name and surname joined, whichever of the two is present.
    pub fn full_name(&self) -> Option<String> {
        match (&self.name, &self.surname) {
            (Some(name), Some(surname)) => Some(format!("{} {}", name, surname)),
            (Some(name), None) => Some(name.clone()),
            (None, Some(surname)) => Some(surname.clone()),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_from_response() {
        let profile = UserProfile::from_response(&json!({
            "id": "8a61e2c2-7c42-4ab2-9bd2-7f3e7b9c0001",
            "name": "Aigerim",
            "surname": "Bekova",
            "email": "aigerim@example.kz",
            "is_verified": true
        }))
        .unwrap();

        assert_eq!(profile.full_name().as_deref(), Some("Aigerim Bekova"));
        assert!(profile.is_verified);
        assert!(profile.phone.is_none());
    }

    #[test]
    fn test_profile_without_id_is_rejected() {
        assert!(UserProfile::from_response(&json!({"name": "NoId"})).is_err());
    }

    #[test]
    fn test_full_name_partial() {
        let profile = UserProfile::from_response(&json!({"id": "x", "surname": "Bekova"})).unwrap();
        assert_eq!(profile.full_name().as_deref(), Some("Bekova"));
    }
}
