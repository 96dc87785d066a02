use std::fmt;

use thiserror::Error;

/// The root URL of an iProva installation
///
/// Always ends with a `/`, so endpoint paths can be appended directly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BaseUrl(String);

/// The base URL is not an absolute URL
#[derive(Debug, Error)]
#[error("invalid iProva base URL '{url}'")]
pub struct InvalidBaseUrl {
    url: String,
    #[source]
    source: url::ParseError,
}

impl BaseUrl {
    /// Parses and normalizes a base URL
    pub fn parse(url: &str) -> Result<Self, InvalidBaseUrl> {
        url::Url::parse(url).map_err(|source| InvalidBaseUrl {
            url: url.to_owned(),
            source,
        })?;

        let mut normalized = url.to_owned();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }

        Ok(Self(normalized))
    }

    /// Appends `path` to the base URL
    ///
    /// A leading `/` on `path` is dropped, so the result never contains `//` at the seam.
    #[inline]
    pub fn join(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        let mut url = String::with_capacity(self.0.len() + path.len());
        url.push_str(&self.0);
        url.push_str(path);
        url
    }

    /// The normalized base URL
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_missing_trailing_separator() {
        let url = BaseUrl::parse("https://iprova.example.com/iprova").unwrap();
        assert_eq!(url.as_str(), "https://iprova.example.com/iprova/");
    }

    #[test]
    fn keeps_existing_trailing_separator() {
        let url = BaseUrl::parse("https://iprova.example.com/iprova/").unwrap();
        assert_eq!(url.join("api/saml"), "https://iprova.example.com/iprova/api/saml");
    }

    #[test]
    fn joins_rooted_paths_without_doubling_the_separator() {
        let url = BaseUrl::parse("https://iprova.example.com/").unwrap();
        assert_eq!(url.join("/items"), "https://iprova.example.com/items");
    }

    #[test]
    fn rejects_relative_urls() {
        assert!(BaseUrl::parse("iprova/").is_err());
    }
}
