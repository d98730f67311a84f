use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::types::ProfilePatch;

/// Maximum length of a profile bio, in characters.
pub const MAX_BIO_CHARS: usize = 500;

/// Maximum length of an avatar URL, in bytes.
pub const MAX_AVATAR_URL_LEN: usize = 2048;

/// Errors returned when registration or profile input is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error(
        "username must be 1-32 characters of letters, digits, '_' or '.', got: {0:?}"
    )]
    InvalidUsername(String),

    #[error("email must contain a single '@' with text on both sides, got: {0:?}")]
    InvalidEmail(String),

    #[error("bio must be at most {MAX_BIO_CHARS} characters, got {0}")]
    BioTooLong(usize),

    #[error("avatar_url must be an http(s) URL of at most {MAX_AVATAR_URL_LEN} bytes")]
    InvalidAvatarUrl,

    #[error("profile update must set at least one field")]
    EmptyPatch,
}

/// Validate a username for registration.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if !USERNAME_RE.is_match(username) {
        return Err(ValidationError::InvalidUsername(username.to_string()));
    }
    Ok(())
}

/// Light structural check; deliverability is not our concern.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(ValidationError::InvalidEmail(email.to_string())),
    }
}

/// Validate a profile update before it reaches storage.
pub fn validate_profile_patch(patch: &ProfilePatch) -> Result<(), ValidationError> {
    if patch.is_empty() {
        return Err(ValidationError::EmptyPatch);
    }

    if let Some(bio) = &patch.bio {
        let n = bio.chars().count();
        if n > MAX_BIO_CHARS {
            return Err(ValidationError::BioTooLong(n));
        }
    }

    if let Some(Some(url)) = &patch.avatar_url {
        let scheme_ok = url.starts_with("https://") || url.starts_with("http://");
        if !scheme_ok || url.len() > MAX_AVATAR_URL_LEN {
            return Err(ValidationError::InvalidAvatarUrl);
        }
    }

    Ok(())
}

/// `^[A-Za-z0-9_.]{1,32}$`
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.]{1,32}$").expect("invalid username regex"));

// --- tests -------------------------------------------------------------------
