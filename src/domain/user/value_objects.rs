use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::team::errors::TeamError;

/// Email value object used to address invites
///
/// # Invariants
/// - Trimmed and lower-cased on construction
/// - Must contain a single '@' with text on both sides
/// - Is immutable after construction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Creates a normalized Email value object
    ///
    /// # Returns
    /// * `Ok(Email)` - If email is valid
    /// * `Err(TeamError::InvalidEmail)` - If email is invalid
    ///
    /// # Example
    /// ```
    /// use prompt_teams_api::domain::user::value_objects::Email;
    ///
    /// let email = Email::new("  Bob@Example.COM ").expect("valid email");
    /// assert_eq!(email.as_str(), "bob@example.com");
    /// ```
    pub fn new(email: impl AsRef<str>) -> Result<Self, TeamError> {
        let normalized = email.as_ref().trim().to_lowercase();
        if Self::is_valid(&normalized) {
            Ok(Email(normalized))
        } else {
            Err(TeamError::InvalidEmail(email.as_ref().to_string()))
        }
    }

    fn is_valid(email: &str) -> bool {
        match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            }
            None => false,
        }
    }

    /// Returns the email as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
