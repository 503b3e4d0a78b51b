//! Phone numbers and postal codes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input contains no digits.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains characters other than digits, spaces, dashes or a
    /// leading `+`.
    #[error("phone number contains invalid characters")]
    InvalidCharacters,
    /// The number does not have 10 significant digits.
    #[error("phone number must have 10 digits")]
    WrongLength,
    /// Indian mobile numbers start with 6, 7, 8 or 9.
    #[error("phone number must start with 6, 7, 8 or 9")]
    InvalidPrefix,
}

/// An Indian mobile number, stored as its 10 significant digits.
///
/// Accepts an optional `+91`, `91` or `0` prefix and ignores spaces and dashes.
///
/// ```
/// use shreeaura_core::Phone;
///
/// let phone = Phone::parse("+91 98765-43210").unwrap();
/// assert_eq!(phone.as_str(), "9876543210");
/// assert_eq!(phone.masked(), "******3210");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Parse a phone number.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] describing why the input is not a valid
    /// Indian mobile number.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('+').unwrap_or(trimmed);

        let mut digits = String::with_capacity(12);
        for c in body.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' => {}
                _ => return Err(PhoneError::InvalidCharacters),
            }
        }

        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        let significant = match digits.len() {
            10 => digits.as_str(),
            11 if digits.starts_with('0') => &digits[1..],
            12 if digits.starts_with("91") => &digits[2..],
            _ => return Err(PhoneError::WrongLength),
        };

        if !matches!(significant.as_bytes().first(), Some(b'6'..=b'9')) {
            return Err(PhoneError::InvalidPrefix);
        }

        Ok(Self(significant.to_owned()))
    }

    /// The 10 significant digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// E.164 representation (`+91XXXXXXXXXX`).
    #[must_use]
    pub fn e164(&self) -> String {
        format!("+91{}", self.0)
    }

    /// Mask all but the last four digits, for display and logs.
    #[must_use]
    pub fn masked(&self) -> String {
        let visible = self.0.get(6..).unwrap_or_default();
        format!("******{visible}")
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Errors that can occur when parsing a [`Pincode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PincodeError {
    /// Pincodes are exactly six digits.
    #[error("pincode must be 6 digits")]
    WrongLength,
    /// The input contains non-digit characters.
    #[error("pincode must contain only digits")]
    NotNumeric,
    /// No postal zone starts with 0.
    #[error("pincode cannot start with 0")]
    LeadingZero,
}

/// An Indian postal code (PIN).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Pincode(String);

impl Pincode {
    /// Parse a pincode.
    ///
    /// # Errors
    ///
    /// Returns a [`PincodeError`] if the trimmed input is not six digits or
    /// starts with zero.
    pub fn parse(s: &str) -> Result<Self, PincodeError> {
        let s = s.trim();
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(PincodeError::NotNumeric);
        }
        if s.len() != 6 {
            return Err(PincodeError::WrongLength);
        }
        if s.starts_with('0') {
            return Err(PincodeError::LeadingZero);
        }
        Ok(Self(s.to_owned()))
    }

    /// The six digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Pincode {
    type Error = PincodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Pincode> for String {
    fn from(pincode: Pincode) -> Self {
        pincode.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_accepts_common_formats() {
        for input in [
            "9876543210",
            "+919876543210",
            "919876543210",
            "09876543210",
            " 98765 43210 ",
            "+91-98765-43210",
        ] {
            assert_eq!(Phone::parse(input).unwrap().as_str(), "9876543210", "{input}");
        }
    }

    #[test]
    fn test_phone_rejects() {
        assert_eq!(Phone::parse(""), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("98765abc10"), Err(PhoneError::InvalidCharacters));
        assert_eq!(Phone::parse("98765"), Err(PhoneError::WrongLength));
        assert_eq!(Phone::parse("5876543210"), Err(PhoneError::InvalidPrefix));
        assert_eq!(Phone::parse("819876543210"), Err(PhoneError::WrongLength));
    }

    #[test]
    fn test_phone_e164_and_mask() {
        let phone = Phone::parse("7012345678").unwrap();
        assert_eq!(phone.e164(), "+917012345678");
        assert_eq!(phone.masked(), "******5678");
    }

    #[test]
    fn test_phone_deserialize_validates() {
        assert!(serde_json::from_str::<Phone>("\"9876543210\"").is_ok());
        assert!(serde_json::from_str::<Phone>("\"12\"").is_err());
    }

    #[test]
    fn test_pincode() {
        assert_eq!(Pincode::parse(" 560001 ").unwrap().as_str(), "560001");
        assert_eq!(Pincode::parse("56001"), Err(PincodeError::WrongLength));
        assert_eq!(Pincode::parse("56000A"), Err(PincodeError::NotNumeric));
        assert_eq!(Pincode::parse("060001"), Err(PincodeError::LeadingZero));
    }
}
