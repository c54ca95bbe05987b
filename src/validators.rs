/// Input validators
/// 1. E-mail format and length limits for registration
/// 2. Password length limits (bcrypt only reads the first 72 bytes)
/// 3. Chirp body length and profanity masking

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
/// bcrypt ignores everything past this many bytes
pub const MAX_PASSWORD_BYTES: usize = 72;
pub const MAX_CHIRP_LENGTH: usize = 140;

const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const PROFANITY_MASK: &str = "****";

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates an e-mail address, returning it trimmed
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    Ok(trimmed.to_string())
}

/// Validates a new password
///
/// Longer passwords would be silently truncated by bcrypt, so they are refused.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_BYTES));
    }

    Ok(())
}

/// Validates a chirp body and masks profane words
///
/// Length is counted in characters. Words are split on single spaces and
/// matched case-insensitively; punctuation attached to a word prevents a match.
pub fn validate_chirp(body: &str) -> Result<String, ValidationError> {
    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ValidationError::TooLong("chirp", MAX_CHIRP_LENGTH));
    }

    Ok(mask_profanity(body))
}

fn mask_profanity(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            let lowered = word.to_lowercase();
            if PROFANE_WORDS.contains(&lowered.as_str()) {
                PROFANITY_MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
        assert_eq!(is_valid_email("  a@x.com ").unwrap(), "a@x.com");
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());
        assert!(is_valid_email("a@b").is_err());
        assert_eq!(is_valid_email(""), Err(ValidationError::EmptyField("email")));
    }

    #[test]
    fn test_password_limits() {
        assert!(is_valid_password("secret").is_ok());
        assert_eq!(is_valid_password(""), Err(ValidationError::EmptyField("password")));
        assert!(is_valid_password(&"a".repeat(MAX_PASSWORD_BYTES)).is_ok());
        assert!(is_valid_password(&"a".repeat(MAX_PASSWORD_BYTES + 1)).is_err());
    }

    #[test]
    fn test_chirp_too_long() {
        let body = "a".repeat(MAX_CHIRP_LENGTH + 1);
        assert_eq!(
            validate_chirp(&body),
            Err(ValidationError::TooLong("chirp", MAX_CHIRP_LENGTH))
        );
        assert!(validate_chirp(&"a".repeat(MAX_CHIRP_LENGTH)).is_ok());
    }

    #[test]
    fn test_chirp_length_counts_characters() {
        let body = "é".repeat(MAX_CHIRP_LENGTH);
        assert!(validate_chirp(&body).is_ok());
    }

    #[test]
    fn test_profanity_is_masked() {
        assert_eq!(
            validate_chirp("This is a kerfuffle opinion I need to share with the world").unwrap(),
            "This is a **** opinion I need to share with the world"
        );
        assert_eq!(
            validate_chirp("I hear Mastodon is better than Chirpy. sharbert I need to migrate")
                .unwrap(),
            "I hear Mastodon is better than Chirpy. **** I need to migrate"
        );
        assert_eq!(validate_chirp("FORNAX Fornax fornax").unwrap(), "**** **** ****");
    }

    #[test]
    fn test_punctuation_prevents_masking() {
        assert_eq!(validate_chirp("Sharbert!").unwrap(), "Sharbert!");
    }
}
