// # acme-dns-core
//
// Core library for provisioning ACME DNS-01 challenge records.
//
// ## Architecture Overview
//
// - **ChallengeRecord**: The `_acme-challenge.<domain>` TXT record and its quoting rules
// - **DnsProvider**: Trait for publishing/removing records via provider APIs
// - **TxtResolver**: Trait for observing records through public DNS
// - **PropagationVerifier**: Bounded, fixed-delay polling until the record is visible
// - **ChallengeOrchestrator**: Sequences create → verify → cleanup for one domain
// - **ProviderRegistry**: Plugin-based registry for DNS providers
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from provider implementations
// 2. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 3. **Library-First**: All functionality can be embedded in a larger ACME client
// 4. **Idempotency**: Creates are upserts, deletes of missing records succeed

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod providers;
pub mod record;
pub mod registry;
pub mod traits;
pub mod verifier;

// Re-export core types for convenience
pub use config::{ChallengeConfig, PropagationConfig, ProviderConfig, ResolverSettings};
pub use error::{Error, Result};
pub use orchestrator::{ChallengeEvent, ChallengeOrchestrator};
pub use record::{CHALLENGE_LABEL, CHALLENGE_TTL, ChallengeRecord};
pub use registry::ProviderRegistry;
pub use traits::{DnsProvider, DnsProviderFactory, RecordMetadata, TxtLookup, TxtResolver};
pub use verifier::{PropagationPolicy, PropagationVerifier, VerificationOutcome};
