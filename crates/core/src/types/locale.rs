//! Locale code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Locale`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LocaleError {
    /// The input string is empty.
    #[error("locale cannot be empty")]
    Empty,
    /// The language subtag is not two or three ASCII letters.
    #[error("invalid language subtag: {0}")]
    InvalidLanguage(String),
    /// The region subtag is not two ASCII letters or three digits.
    #[error("invalid region subtag: {0}")]
    InvalidRegion(String),
}

/// A locale code such as `en`, `pt` or `pt-BR`.
///
/// Codes are normalized to a lower-case language and an upper-case region,
/// and `_` is accepted as a separator (`pt_br` parses as `pt-BR`).
///
/// ```
/// use mycoflora_core::Locale;
///
/// assert_eq!(Locale::parse("pt_br").unwrap().as_str(), "pt-BR");
/// assert_eq!(Locale::parse("FR").unwrap().language(), "fr");
/// assert!(Locale::parse("english").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    /// Parse and normalize a locale code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty or its subtags are malformed.
    pub fn parse(s: &str) -> Result<Self, LocaleError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(LocaleError::Empty);
        }

        let (language, region) = match s.split_once(['-', '_']) {
            Some((language, region)) => (language, Some(region)),
            None => (s, None),
        };

        if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(LocaleError::InvalidLanguage(language.to_owned()));
        }

        let mut code = language.to_ascii_lowercase();
        if let Some(region) = region {
            let alpha = region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic());
            let numeric = region.len() == 3 && region.chars().all(|c| c.is_ascii_digit());
            if !alpha && !numeric {
                return Err(LocaleError::InvalidRegion(region.to_owned()));
            }
            code.push('-');
            code.push_str(&region.to_ascii_uppercase());
        }

        Ok(Self(code))
    }

    /// Returns the full normalized code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the language subtag (`pt` for `pt-BR`).
    #[must_use]
    pub fn language(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl Default for Locale {
    /// English, the language every catalog is complete in.
    fn default() -> Self {
        Self(String::from("en"))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = LocaleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language_only() {
        assert_eq!(Locale::parse("en").unwrap().as_str(), "en");
        assert_eq!(Locale::parse(" DE ").unwrap().as_str(), "de");
    }

    #[test]
    fn test_parse_with_region() {
        let locale = Locale::parse("es-419").unwrap();
        assert_eq!(locale.as_str(), "es-419");
        assert_eq!(locale.language(), "es");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Locale::parse(""), Err(LocaleError::Empty));
        assert!(matches!(
            Locale::parse("e1"),
            Err(LocaleError::InvalidLanguage(_))
        ));
        assert!(matches!(
            Locale::parse("pt-Brazil"),
            Err(LocaleError::InvalidRegion(_))
        ));
    }

    #[test]
    fn test_serde_validates() {
        let locale: Locale = serde_json::from_str("\"fr\"").unwrap();
        assert_eq!(locale.as_str(), "fr");
        assert!(serde_json::from_str::<Locale>("\"french\"").is_err());
    }
}
