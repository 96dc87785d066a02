//! Logon methods supported by iProva

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The strategy used to establish the user's identity
///
/// The ordering of the variants is significant: every method from
/// [`WindowsAuthentication`][LogonMethod::WindowsAuthentication] onwards
/// obtains a token before calling a REST-style endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LogonMethod {
    /// Anonymous access
    None = 0,
    /// Session cookies managed by the browser
    Cookie = 1,
    /// Windows integrated authentication
    WindowsAuthentication = 2,
    /// ADFS redirect handshake
    Adfs = 3,
    /// SAML2 redirect handshake
    Saml2 = 4,
    /// SAML redirect handshake where iProva picks ADFS or SAML2 based on its
    /// configured auto-login type
    Saml = 5,
}

impl LogonMethod {
    /// All logon methods, in ordinal order
    pub const ALL: [LogonMethod; 6] = [
        LogonMethod::None,
        LogonMethod::Cookie,
        LogonMethod::WindowsAuthentication,
        LogonMethod::Adfs,
        LogonMethod::Saml2,
        LogonMethod::Saml,
    ];

    /// Whether a token has to be obtained before a REST-style call
    #[inline]
    pub fn fetches_token(self) -> bool {
        self >= LogonMethod::WindowsAuthentication
    }

    /// Whether the method authenticates through a SAML redirect handshake
    #[inline]
    pub fn is_saml(self) -> bool {
        matches!(self, LogonMethod::Adfs | LogonMethod::Saml2 | LogonMethod::Saml)
    }

    /// The variant suffix of the SAML descriptor endpoint
    ///
    /// `None` for the generic SAML method, which lets the server choose.
    pub fn saml_variant(self) -> Option<&'static str> {
        match self {
            LogonMethod::Adfs => Some("adfs"),
            LogonMethod::Saml2 => Some("saml2"),
            _ => None,
        }
    }

    /// The canonical name of the logon method
    pub fn as_str(self) -> &'static str {
        match self {
            LogonMethod::None => "None",
            LogonMethod::Cookie => "Cookie",
            LogonMethod::WindowsAuthentication => "WindowsAuthentication",
            LogonMethod::Adfs => "ADFS",
            LogonMethod::Saml2 => "SAML2",
            LogonMethod::Saml => "SAML",
        }
    }
}

impl fmt::Display for LogonMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The provided value does not name a logon method
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("'{value}' is not a known logon method")]
pub struct UnknownLogonMethod {
    value: String,
}

/// Accepts a case-insensitive name or an ordinal
impl FromStr for LogonMethod {
    type Err = UnknownLogonMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(ordinal) = s.parse::<u8>() {
            return LogonMethod::try_from(ordinal);
        }

        LogonMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownLogonMethod {
                value: s.to_owned(),
            })
    }
}

impl TryFrom<u8> for LogonMethod {
    type Error = UnknownLogonMethod;

    fn try_from(ordinal: u8) -> Result<Self, Self::Error> {
        LogonMethod::ALL
            .get(usize::from(ordinal))
            .copied()
            .ok_or_else(|| UnknownLogonMethod {
                value: ordinal.to_string(),
            })
    }
}

impl Serialize for LogonMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogonMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Ordinal(u8),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Ordinal(o) => LogonMethod::try_from(o),
            Repr::Name(n) => n.parse(),
        }
        .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_methods_from_windows_authentication_onwards_fetch_tokens() {
        let fetching: Vec<_> = LogonMethod::ALL
            .iter()
            .copied()
            .filter(|m| m.fetches_token())
            .collect();

        assert_eq!(
            fetching,
            [
                LogonMethod::WindowsAuthentication,
                LogonMethod::Adfs,
                LogonMethod::Saml2,
                LogonMethod::Saml
            ]
        );
    }

    #[test]
    fn saml_variants_select_descriptor_suffix() {
        assert_eq!(LogonMethod::Adfs.saml_variant(), Some("adfs"));
        assert_eq!(LogonMethod::Saml2.saml_variant(), Some("saml2"));
        assert_eq!(LogonMethod::Saml.saml_variant(), None);
    }

    #[test]
    fn deserializes_from_names_and_ordinals() {
        let by_name: LogonMethod = serde_json::from_str(r#""SAML2""#).unwrap();
        let by_ordinal: LogonMethod = serde_json::from_str("2").unwrap();
        let lower: LogonMethod = serde_json::from_str(r#""adfs""#).unwrap();

        assert_eq!(by_name, LogonMethod::Saml2);
        assert_eq!(by_ordinal, LogonMethod::WindowsAuthentication);
        assert_eq!(lower, LogonMethod::Adfs);
    }

    #[test]
    fn parses_names_and_ordinals_from_text() {
        assert_eq!("2".parse(), Ok(LogonMethod::WindowsAuthentication));
        assert_eq!("saml".parse(), Ok(LogonMethod::Saml));
        assert!("9".parse::<LogonMethod>().is_err());
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(serde_json::from_str::<LogonMethod>("6").is_err());
        assert!(serde_json::from_str::<LogonMethod>(r#""Kerberos""#).is_err());
    }
}
