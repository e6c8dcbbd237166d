//! Random credentials.

use rand::{distributions::Alphanumeric, Rng};

/// Length of generated initial and reset passwords.
pub const GENERATED_PASSWORD_LENGTH: usize = 12;

/// Generates a password for invited users and administrator resets.
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_charset() {
        let password = generate_password();
        assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generated_passwords_differ() {
        assert_ne!(generate_password(), generate_password());
    }
}
