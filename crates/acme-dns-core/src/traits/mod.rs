//! Core traits for challenge provisioning
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DnsProvider`]: Publish and remove challenge records via provider APIs
//! - [`TxtResolver`]: Observe challenge records through public DNS

pub mod dns_provider;
pub mod txt_resolver;

pub use dns_provider::{DnsProvider, DnsProviderFactory, RecordMetadata};
pub use txt_resolver::{TxtLookup, TxtResolver};
