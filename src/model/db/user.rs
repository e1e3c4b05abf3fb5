use std::ops::{Deref, DerefMut};

use mongodb::{bson::doc, error::Error as DbError};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::user::Role,
    mongodb::{Coll, Id},
};
use crate::Config;

/// Core user account data.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCore {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl UserCore {
    /// Create an account with the given credentials, hashing the password.
    pub fn new(email: String, password: &str, role: Role) -> Self {
        let salt: [u8; 16] = rand::random();
        let password_hash =
            argon2::hash_encoded(password.as_bytes(), &salt, &argon2::Config::default())
                .expect("Hashing with the default config does not fail");
        Self {
            email,
            password_hash,
            role,
        }
    }

    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // Unwrap safe because the only way to create a UserCore is via
        // `UserCore::new`, so the hash is always well-formed.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap()
    }
}

/// A user without an ID.
pub type NewUser = UserCore;

/// A user account from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub user: UserCore,
}

impl Deref for User {
    type Target = UserCore;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl DerefMut for User {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.user
    }
}

/// Ensure there is at least one coordinator account, creating the default
/// one from the config if needed.
///
/// This operation is idempotent.
pub async fn ensure_coordinator_exists(
    users: &Coll<NewUser>,
    config: &Config,
) -> Result<(), DbError> {
    let filter = doc! {
        "role": Role::Coordinator,
    };
    if users.find_one(filter, None).await?.is_none() {
        info!(
            "No coordinator account found, creating {}",
            config.coordinator_email()
        );
        let coordinator = NewUser::new(
            config.coordinator_email().to_string(),
            config.coordinator_password(),
            Role::Coordinator,
        );
        users.insert_one(coordinator, None).await?;
    }
    Ok(())
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl UserCore {
        pub fn example_coordinator() -> Self {
            Self::new(
                "coordinator@example.com".to_string(),
                "password123",
                Role::Coordinator,
            )
        }

        pub fn example_respondent() -> Self {
            Self::new(
                "respondent@example.com".to_string(),
                "password123",
                Role::Respondent,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let user = UserCore::example_coordinator();
        assert!(user.verify_password("password123"));
        assert!(!user.verify_password("password124"));
        assert!(!user.verify_password(""));
    }

    #[test]
    fn distinct_salts() {
        let a = UserCore::example_respondent();
        let b = UserCore::example_respondent();
        assert_ne!(a.password_hash, b.password_hash);
    }
}
