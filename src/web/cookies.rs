//! `Cookie:` header parsing.

use std::collections::BTreeMap;

/// Cookies sent with a request, by name.
///
/// Parsing is all-or-nothing: a header containing any malformed pair yields
/// an empty jar rather than an error, so a broken cookie can never fail the
/// request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookies {
    jar: BTreeMap<String, String>,
}

impl Cookies {
    /// Parses a raw `Cookie:` header value.
    pub fn parse(header: &str) -> Self {
        Self::try_parse(header).unwrap_or_default()
    }

    fn try_parse(header: &str) -> Option<Self> {
        let mut jar = BTreeMap::new();
        for pair in header.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() || !name.bytes().all(is_token_byte) {
                return None;
            }
            // $Path, $Domain, $Version: RFC 2965 attributes, not cookies
            if name.starts_with('$') {
                continue;
            }
            jar.insert(name.to_string(), unquote(value.trim())?.to_string());
        }
        Some(Self { jar })
    }

    /// Returns true if `name` survives parsing as a cookie name: nonempty,
    /// token characters only, and not a `$` attribute.
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty() && name.bytes().all(is_token_byte) && !name.starts_with('$')
    }

    /// Returns the value of the named cookie.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.jar.get(name).map(String::as_str)
    }

    /// Returns the number of cookies.
    pub fn len(&self) -> usize {
        self.jar.len()
    }

    /// Returns true if there are no cookies.
    pub fn is_empty(&self) -> bool {
        self.jar.is_empty()
    }
}

fn unquote(value: &str) -> Option<&str> {
    match value.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"'),
        None if value.contains('"') => None,
        None => Some(value),
    }
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names_round_trip() {
        for name in ["sessionid", "ifarch_sessionid", "a.b-c!"] {
            assert!(Cookies::is_valid_name(name), "{}", name);
            let cookies = Cookies::parse(&format!("{}=v", name));
            assert_eq!(cookies.get(name), Some("v"));
        }
        for name in ["", "if@rch_sessionid", "x\"sessionid", "$sessionid", "a b"] {
            assert!(!Cookies::is_valid_name(name), "{}", name);
        }
    }

    #[test]
    fn parses_pairs() {
        let cookies = Cookies::parse("ifarch_sessionid=abc123; theme=dark");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies.get("ifarch_sessionid"), Some("abc123"));
        assert_eq!(cookies.get("theme"), Some("dark"));
    }

    #[test]
    fn strips_quotes_and_whitespace() {
        let cookies = Cookies::parse("  a = \"quoted value\" ;b=2;");
        assert_eq!(cookies.get("a"), Some("quoted value"));
        assert_eq!(cookies.get("b"), Some("2"));
    }

    #[test]
    fn later_pair_wins() {
        let cookies = Cookies::parse("a=1; a=2");
        assert_eq!(cookies.get("a"), Some("2"));
    }

    #[test]
    fn dollar_attributes_are_skipped() {
        let cookies = Cookies::parse("$Version=1; a=1; $Path=/");
        assert_eq!(cookies.len(), 1);
    }

    #[test]
    fn malformed_header_is_empty() {
        assert!(Cookies::parse("no-equals-sign").is_empty());
        assert!(Cookies::parse("good=1; bad name=2").is_empty());
        assert!(Cookies::parse("a=\"unterminated").is_empty());
        assert!(Cookies::parse("=nameless").is_empty());
    }

    #[test]
    fn empty_header_is_empty() {
        assert!(Cookies::parse("").is_empty());
        assert!(Cookies::parse(" ; ;").is_empty());
    }

    #[test]
    fn empty_value_is_allowed() {
        let cookies = Cookies::parse("a=");
        assert_eq!(cookies.get("a"), Some(""));
    }
}
