use crate::error::MessagingError;

/// Normalise a phone number to E.164 (`+` followed by 8 to 15 digits).
///
/// A `whatsapp:` prefix, spaces, dashes, dots and parentheses are accepted
/// and removed.
///
/// # Errors
///
/// Returns [`MessagingError::InvalidRecipient`] when the result is not E.164.
pub fn normalize_e164(raw: &str) -> Result<String, MessagingError> {
    let invalid = |reason: &str| MessagingError::InvalidRecipient {
        number: raw.to_owned(),
        reason: reason.to_owned(),
    };

    let trimmed = raw.trim();
    let without_prefix = trimmed.strip_prefix("whatsapp:").unwrap_or(trimmed).trim();
    let compact: String = without_prefix
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    let digits = compact
        .strip_prefix('+')
        .ok_or_else(|| invalid("must start with + and a country code"))?;
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("contains non-digit characters"));
    }
    if !(8..=15).contains(&digits.len()) {
        return Err(invalid("must have 8 to 15 digits"));
    }
    if digits.starts_with('0') {
        return Err(invalid("country code cannot start with 0"));
    }
    Ok(compact)
}
