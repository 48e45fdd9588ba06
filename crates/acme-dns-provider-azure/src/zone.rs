//! Zone resolution
//!
//! Azure DNS holds any number of zones in a resource group, so the zone for
//! a domain is found by suffix match against the zone names.

use acme_dns_core::CHALLENGE_LABEL;
use acme_dns_core::record::normalize_domain;

/// Pick the zone that contains `domain`
///
/// A zone matches when it equals the domain or is a dot-suffix of it. When
/// several match (delegated subzones), the longest one wins.
pub fn resolve_zone<'a>(domain: &str, zones: &'a [String]) -> Option<&'a str> {
    let domain = normalize_domain(domain);

    zones
        .iter()
        .filter(|zone| {
            let zone = normalize_domain(zone);
            !zone.is_empty() && (domain == zone || domain.ends_with(&format!(".{}", zone)))
        })
        .max_by_key(|zone| normalize_domain(zone).len())
        .map(String::as_str)
}

/// Record set name relative to `zone`
///
/// `example.org` in `example.org` gives `_acme-challenge`,
/// `sub.example.org` gives `_acme-challenge.sub`.
pub fn relative_record_name(domain: &str, zone: &str) -> String {
    let domain = normalize_domain(domain);
    let zone = normalize_domain(zone);

    match domain.strip_suffix(&format!(".{}", zone)) {
        Some(prefix) if !prefix.is_empty() => format!("{}.{}", CHALLENGE_LABEL, prefix),
        _ => CHALLENGE_LABEL.to_string(),
    }
}
