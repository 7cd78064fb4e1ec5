use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::constants::MAX_EMAIL_LEN;

/// User model for API responses
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Loose e-mail shape check: one `@`, non-empty local part, dotted domain
    pub fn validate_email(email: &str) -> bool {
        if email.is_empty() || email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace)
        {
            return false;
        }
        match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(User::validate_email("mapper@example.com"));
        assert!(User::validate_email("a.b+c@sub.example.org"));

        assert!(!User::validate_email(""));
        assert!(!User::validate_email("mapper"));
        assert!(!User::validate_email("@example.com"));
        assert!(!User::validate_email("mapper@localhost"));
        assert!(!User::validate_email("mapper@.com"));
        assert!(!User::validate_email("map per@example.com"));
        assert!(!User::validate_email("a@b@example.com"));

        let long = format!("{}@example.com", "a".repeat(MAX_EMAIL_LEN));
        assert!(!User::validate_email(&long));
    }
}
