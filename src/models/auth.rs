use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Role {
    #[serde(rename = "Super Admin")]
    #[strum(serialize = "Super Admin")]
    SuperAdmin,
    #[serde(rename = "Showroom Admin")]
    #[strum(serialize = "Showroom Admin")]
    ShowroomAdmin,
    Employee,
}

/// Signed-in user, never carrying a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showroom_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub role: Option<Role>,
    pub showroom_id: Option<String>,
}

impl AuthState {
    pub fn signed_in(user: User) -> Self {
        Self {
            is_authenticated: true,
            role: Some(user.role),
            showroom_id: user.showroom_id.clone(),
            user: Some(user),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_out_state_serializes_nulls() {
        let json = serde_json::to_value(AuthState::signed_out()).unwrap();
        assert_eq!(json["isAuthenticated"], false);
        assert!(json["user"].is_null());
        assert!(json["role"].is_null());
        assert!(json["showroomId"].is_null());
    }

    #[test]
    fn role_uses_display_names() {
        assert_eq!(
            serde_json::to_string(&Role::ShowroomAdmin).unwrap(),
            "\"Showroom Admin\""
        );
        assert_eq!("Super Admin".parse::<Role>().unwrap(), Role::SuperAdmin);
    }
}
