//! Input checks shared by the link store

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{GeneratorError, LinkError};
use crate::generator::CodeGenerator;

/// Bounds on the length of any stored short code
pub const MIN_CODE_LEN: usize = 3;
pub const MAX_CODE_LEN: usize = 20;

/// Absolute http(s) URL: `scheme://[www.]host.tld[/path][?query]`
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(?:www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b(?:[-a-zA-Z0-9()@:%_\+.~#?&/=]*)$",
    )
    .expect("destination URL pattern is valid")
});

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{3,20}$").expect("short code pattern is valid"));

pub fn is_valid_url(url: &str) -> bool {
    URL_PATTERN.is_match(url)
}

pub fn is_valid_custom_code(code: &str) -> bool {
    CODE_PATTERN.is_match(code)
}

pub fn validate_destination(url: &str) -> Result<(), LinkError> {
    if url.trim().is_empty() {
        return Err(LinkError::validation("URL is required"));
    }
    if !is_valid_url(url) {
        return Err(LinkError::validation(
            "Invalid URL format. URL must start with http:// or https://",
        ));
    }
    Ok(())
}

pub fn validate_custom_code(code: &str) -> Result<(), LinkError> {
    if !is_valid_custom_code(code) {
        return Err(LinkError::validation(
            "Code must be alphanumeric and between 3-20 characters",
        ));
    }
    Ok(())
}

/// Checks that every code `generator` can produce is a valid stored code:
/// 3-20 characters of ASCII alphanumerics, `_` or `-`, all of which survive
/// as a single URL path segment.
pub fn check_generator(generator: &CodeGenerator) -> Result<(), GeneratorError> {
    let length = generator.default_length();
    if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&length) {
        return Err(GeneratorError::InvalidConfiguration(format!(
            "code length must be between {MIN_CODE_LEN} and {MAX_CODE_LEN}, got {length}"
        )));
    }
    if let Some(bad) = generator
        .alphabet()
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(GeneratorError::InvalidConfiguration(format!(
            "code alphabet may only contain ASCII letters, digits, '_' and '-', found {bad:?}"
        )));
    }
    Ok(())
}

/// Rejects empty or whitespace-only lookup keys.
pub fn require_code(code: &str) -> Result<(), LinkError> {
    if code.trim().is_empty() {
        return Err(LinkError::validation("code cannot be empty"));
    }
    Ok(())
}

/// Page sizes for listings are capped at 100.
pub fn validate_limit(limit: i64) -> Result<usize, LinkError> {
    if !(1..=100).contains(&limit) {
        return Err(LinkError::validation("Limit must be between 1 and 100"));
    }
    usize::try_from(limit).map_err(|_| LinkError::validation("Limit must be between 1 and 100"))
}

pub fn validate_offset(offset: i64) -> Result<usize, LinkError> {
    usize::try_from(offset).map_err(|_| LinkError::validation("Offset cannot be negative"))
}
