//! Challenge record model
//!
//! A [`ChallengeRecord`] is the one TXT record that proves control of a
//! domain during DNS-01 validation. Its name is always derived from the
//! domain, so the value that gets written and the name that gets queried
//! can never disagree.

use crate::error::{Error, Result};

/// Label prepended to the domain for DNS-01 challenges
pub const CHALLENGE_LABEL: &str = "_acme-challenge";

/// TTL for challenge records, in seconds
///
/// Kept small so a record that was never cleaned up expires quickly.
pub const CHALLENGE_TTL: u32 = 60;

/// A DNS-01 challenge TXT record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRecord {
    domain: String,
    value: String,
    ttl: u32,
}

impl ChallengeRecord {
    /// Build the challenge record for `domain` carrying `token`
    ///
    /// The domain is normalized (trailing root dot removed, lowercased).
    pub fn new(domain: &str, token: impl Into<String>) -> Result<Self> {
        let domain = normalize_domain(domain);
        if domain.is_empty() {
            return Err(Error::invalid_input("Challenge domain cannot be empty"));
        }

        Ok(Self {
            domain,
            value: token.into(),
            ttl: CHALLENGE_TTL,
        })
    }

    /// The domain the certificate is issued for
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Record name without the trailing root dot: `_acme-challenge.<domain>`
    pub fn name(&self) -> String {
        challenge_name(&self.domain)
    }

    /// Record name with the trailing root dot: `_acme-challenge.<domain>.`
    pub fn fqdn(&self) -> String {
        format!("{}.", self.name())
    }

    /// The logical (unquoted) token
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The token in TXT presentation format
    pub fn quoted_value(&self) -> String {
        quote(&self.value)
    }

    /// Record TTL in seconds
    pub fn ttl(&self) -> u32 {
        self.ttl
    }
}

/// Challenge record name for a domain (no trailing dot)
pub fn challenge_name(domain: &str) -> String {
    format!("{}.{}", CHALLENGE_LABEL, normalize_domain(domain))
}

/// Strip the root dot and lowercase
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Wrap a value in double quotes, escaping `"` and `\`
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Reverse [`quote`]
///
/// Values that are not enclosed in double quotes are returned unchanged,
/// since resolvers usually hand back the raw character-string.
pub fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_derives_name() {
        let record = ChallengeRecord::new("example.com", "abc123").unwrap();

        assert_eq!(record.name(), "_acme-challenge.example.com");
        assert_eq!(record.fqdn(), "_acme-challenge.example.com.");
        assert_eq!(record.quoted_value(), "\"abc123\"");
        assert_eq!(record.value(), "abc123");
        assert_eq!(record.ttl(), 60);
    }

    #[test]
    fn test_domain_is_normalized() {
        let record = ChallengeRecord::new("WWW.Example.COM.", "t").unwrap();
        assert_eq!(record.domain(), "www.example.com");
        assert_eq!(record.fqdn(), "_acme-challenge.www.example.com.");
    }

    #[test]
    fn test_empty_domain_rejected() {
        assert!(matches!(
            ChallengeRecord::new(" . ", "t"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"abc123\""), "abc123");
        assert_eq!(unquote("abc123"), "abc123");
        assert_eq!(unquote("\"a\\\"b\""), "a\"b");
        // A lone quote is not an enclosing pair
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(unquote(&quote("a\"b\\c")), "a\"b\\c");
    }
}
