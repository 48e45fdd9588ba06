// # Built-in Providers
//
// Providers that ship with the core crate. Cloud providers live in their
// own crates and register themselves with the `ProviderRegistry`.

pub mod memory;
pub mod unimplemented;

pub use memory::{MemoryProvider, MemoryProviderFactory};
pub use unimplemented::{UnimplementedFactory, UnimplementedProvider};
