//! Email address validation and normalization.
//!
//! The accepted shape is permissive: an ASCII local part made of
//! alphanumerics and the RFC 5322 "atext" specials, an `@`, and a domain made
//! of dot-separated labels (1-63 alphanumerics or hyphens, no leading or
//! trailing hyphen).

/// Maximum length of a normalized address.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length of a single domain label.
pub const MAX_LABEL_LENGTH: usize = 63;

const LOCAL_PART_SPECIALS: &str = ".!#$%&'*+/=?^_`{|}~-";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    #[error("email address is empty")]
    Empty,

    #[error("email address exceeds 254 characters")]
    TooLong,

    #[error("email address format is invalid")]
    InvalidFormat,
}

/// Trim surrounding whitespace and lowercase.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Validate a raw address, returning its normalized form.
pub fn validate_email(raw: &str) -> Result<String, EmailError> {
    let email = normalize_email(raw);

    if email.is_empty() {
        return Err(EmailError::Empty);
    }
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(EmailError::TooLong);
    }
    if !is_valid_format(&email) {
        return Err(EmailError::InvalidFormat);
    }

    Ok(email)
}

fn is_valid_format(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    is_valid_local_part(local) && is_valid_domain(domain)
}

fn is_valid_local_part(local: &str) -> bool {
    !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || LOCAL_PART_SPECIALS.contains(c))
}

fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty() && domain.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LENGTH
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
