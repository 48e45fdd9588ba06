// # TXT Resolver Trait
//
// Public DNS lookups used to observe propagation, independent of any
// provider's API.
//
// ## Implementations
//
// - hickory-resolver: `acme-dns-resolver-hickory` crate

use async_trait::async_trait;

/// Outcome of a TXT query that reached a nameserver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxtLookup {
    /// One or more TXT records were returned
    Records(Vec<String>),
    /// NXDOMAIN, or the name exists without TXT data
    NotFound,
}

/// Trait for TXT record lookups against public DNS
///
/// "Name does not exist" is a normal answer here and must be reported as
/// [`TxtLookup::NotFound`]. Only timeouts, SERVFAIL, malformed responses and
/// similar faults are returned as `Err(Error::Resolver)`.
#[async_trait]
pub trait TxtResolver: Send + Sync {
    /// Look up the TXT records for a fully-qualified name
    ///
    /// Each element of [`TxtLookup::Records`] is one TXT record with its
    /// character-strings concatenated.
    async fn lookup_txt(&self, name: &str) -> Result<TxtLookup, crate::Error>;
}
