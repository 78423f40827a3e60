//! IDNA normalization of candidate domains

use crate::application::errors::LookupError;

/// Longest DNS name in presentation form, without the trailing dot
const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Convert a candidate to its ASCII-compatible (punycode) form.
///
/// The result is guaranteed to be a plain hostname: dot-separated labels of
/// `[a-z0-9-]`, none empty and none starting or ending with a hyphen.
pub fn to_ascii(domain: &str) -> Result<String, LookupError> {
    let invalid = |reason: String| LookupError::Normalize {
        domain: domain.to_string(),
        reason,
    };

    let ascii = idna::domain_to_ascii(domain).map_err(|e| invalid(format!("{:?}", e)))?;

    if ascii.is_empty() || ascii.len() > MAX_DOMAIN_LEN {
        return Err(invalid(format!("length {} out of range", ascii.len())));
    }

    for label in ascii.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(invalid(format!("bad label length in {}", ascii)));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid(format!("label {} starts or ends with a hyphen", label)));
        }
        if let Some(c) = label.chars().find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')) {
            return Err(invalid(format!("character {:?} is not allowed in a hostname", c)));
        }
    }

    Ok(ascii)
}
