//! Regional phone number normalization.
//!
//! Contacts arrive in whatever shape a person typed them: `020 5555 1234`,
//! `+856-20-5555-1234`, `(020) 55551234`. The messaging network wants
//! `<country code><subscriber digits>@c.us`.

use std::fmt;
use thiserror::Error;

/// Country calling code for Laos.
pub const DEFAULT_COUNTRY_CODE: &str = "856";

/// Address suffix of the WhatsApp user namespace.
pub const DEFAULT_SUFFIX: &str = "@c.us";

/// National trunk prefix replaced by the country code.
const TRUNK_PREFIX: char = '0';

/// Address normalization errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("Contact must contain at least one digit")]
    NoDigits,

    #[error("Invalid country calling code: {0:?}")]
    InvalidCountryCode(String),
}

/// A network-ready destination address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalAddress(String);

impl CanonicalAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Maps loosely formatted local numbers to canonical addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressNormalizer {
    country_code: String,
    suffix: String,
}

impl AddressNormalizer {
    /// Create a normalizer. The country code must be digits without a leading zero.
    pub fn new(
        country_code: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Result<Self, AddressError> {
        let country_code = country_code.into();
        let valid = !country_code.is_empty()
            && country_code.chars().all(|c| c.is_ascii_digit())
            && !country_code.starts_with(TRUNK_PREFIX);

        if !valid {
            return Err(AddressError::InvalidCountryCode(country_code));
        }

        Ok(Self {
            country_code,
            suffix: suffix.into(),
        })
    }

    /// Normalize a raw contact.
    ///
    /// Non-digits are dropped. A single leading trunk `0` is replaced by the
    /// country code; anything else is assumed to already carry one. Length
    /// and plausibility are not checked.
    pub fn normalize(&self, raw: &str) -> Result<CanonicalAddress, AddressError> {
        let digits = strip_non_digits(raw);
        if digits.is_empty() {
            return Err(AddressError::NoDigits);
        }

        let international = match digits.strip_prefix(TRUNK_PREFIX) {
            Some(subscriber) => format!("{}{}", self.country_code, subscriber),
            None => digits,
        };

        Ok(CanonicalAddress(format!("{}{}", international, self.suffix)))
    }
}

impl Default for AddressNormalizer {
    fn default() -> Self {
        Self {
            country_code: DEFAULT_COUNTRY_CODE.into(),
            suffix: DEFAULT_SUFFIX.into(),
        }
    }
}

/// Keep only ASCII decimal digits.
pub fn strip_non_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}
