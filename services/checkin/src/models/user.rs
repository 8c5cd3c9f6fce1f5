//! User model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User entity
///
/// `username` is the student id and doubles as the key under which check-in
/// records and stored content are filed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub department: String,
    pub contact: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub department: String,
    pub contact: String,
}

/// Login payload
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Admin password-change payload
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePassword {
    pub username: String,
    pub new_password: String,
}

/// The set of user fields an administrator may edit in place
///
/// Replaces dynamic field-name dispatch with an enumerated set mapped to
/// typed UPDATE statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditableField {
    Name,
    Department,
    Contact,
}

impl EditableField {
    /// Column name backing this field
    pub fn column(&self) -> &'static str {
        match self {
            EditableField::Name => "name",
            EditableField::Department => "department",
            EditableField::Contact => "contact",
        }
    }
}

impl std::str::FromStr for EditableField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(EditableField::Name),
            "department" => Ok(EditableField::Department),
            "contact" => Ok(EditableField::Contact),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editable_field_parses_known_names() {
        let field: EditableField = serde_json::from_str("\"name\"").unwrap();
        assert_eq!(field, EditableField::Name);
        let field: EditableField = serde_json::from_str("\"department\"").unwrap();
        assert_eq!(field, EditableField::Department);
        let field: EditableField = serde_json::from_str("\"contact\"").unwrap();
        assert_eq!(field, EditableField::Contact);
    }

    #[test]
    fn test_editable_field_rejects_unknown_names() {
        assert!(serde_json::from_str::<EditableField>("\"password_hash\"").is_err());
        assert!(serde_json::from_str::<EditableField>("\"is_admin\"").is_err());
    }

    #[test]
    fn test_editable_field_from_str() {
        assert_eq!("name".parse::<EditableField>(), Ok(EditableField::Name));
        assert_eq!(
            "department".parse::<EditableField>(),
            Ok(EditableField::Department)
        );
        assert!("username".parse::<EditableField>().is_err());
        assert!("Name".parse::<EditableField>().is_err());
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: 1,
            username: "202500010001".to_string(),
            name: "Test".to_string(),
            department: "Engineering".to_string(),
            contact: "12345".to_string(),
            password_hash: "secret".to_string(),
            is_admin: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
    }
}
