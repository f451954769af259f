use argon2::Config;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::db::admin::NewAdmin;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Raw admin credentials, received from a user. These are never stored directly,
/// since the password is in plaintext.
#[derive(Clone, Deserialize, Serialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl TryFrom<AdminCredentials> for NewAdmin {
    type Error = String;

    /// Convert [`AdminCredentials`] to a new admin by hashing the password.
    /// This enforces that the username is non-empty, and the password meets minimum length.
    fn try_from(cred: AdminCredentials) -> Result<Self, Self::Error> {
        if cred.username.trim().is_empty() {
            return Err("Admin username must not be empty".to_string());
        }
        if cred.password.len() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "Admin password must be at least {MIN_PASSWORD_LENGTH} characters"
            ));
        }

        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(cred.password.as_bytes(), &salt, &Config::default())
                .map_err(|err| err.to_string())?;
        Ok(Self {
            username: cred.username,
            password_hash,
        })
    }
}
