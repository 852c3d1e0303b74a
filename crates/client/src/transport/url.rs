//! Resolution of resource identifiers into request URLs.
//!
//! The identifier itself is the cache key and is never rewritten; this only
//! decides where the request for it goes.

use url::Url;

/// Error type for request URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty identifier")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("relative identifier {0} with no base URL configured")]
    NoBase(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse and check a base URL for relative identifiers.
pub fn parse_base(input: &str) -> Result<Url, UrlError> {
    let base = Url::parse(input).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    match base.scheme() {
        "http" | "https" => Ok(base),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

/// Resolve `id` into the URL to request.
///
/// 1. Absolute `http`/`https` identifiers are used as-is
/// 2. Anything else is joined onto `base` (e.g. `/people`)
/// 3. A relative identifier without a base is an error
pub fn resolve(id: &str, base: Option<&Url>) -> Result<Url, UrlError> {
    if id.is_empty() {
        return Err(UrlError::Empty);
    }

    match Url::parse(id) {
        Ok(absolute) => match absolute.scheme() {
            "http" | "https" => Ok(absolute),
            scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
        },
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = base.ok_or_else(|| UrlError::NoBase(id.to_string()))?;
            base.join(id).map_err(|e| UrlError::InvalidUrl(e.to_string()))
        }
        Err(e) => Err(UrlError::InvalidUrl(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:3000").unwrap()
    }

    #[test]
    fn test_resolve_absolute() {
        let url = resolve("https://swapi.dev/api/people", Some(&base())).unwrap();
        assert_eq!(url.as_str(), "https://swapi.dev/api/people");
    }

    #[test]
    fn test_resolve_relative_against_base() {
        let url = resolve("/people", Some(&base())).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/people");
    }

    #[test]
    fn test_resolve_preserves_query() {
        let url = resolve("/people?page=2&sort=name", Some(&base())).unwrap();
        assert_eq!(url.query(), Some("page=2&sort=name"));
    }

    #[test]
    fn test_resolve_relative_without_base() {
        assert!(matches!(resolve("/people", None), Err(UrlError::NoBase(_))));
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve("file:///etc/passwd", Some(&base()));
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve("", Some(&base())), Err(UrlError::Empty)));
    }

    #[test]
    fn test_parse_base() {
        assert!(parse_base("https://example.com/api/").is_ok());
        assert!(matches!(parse_base("ftp://example.com"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(parse_base("not a url"), Err(UrlError::InvalidUrl(_))));
    }
}
