//! Lookup providers and the override chain.
//!
//! A [`LookupProvider`] is anything that answers translation lookups for a
//! domain: a plugin, a host's default resolver, or an earlier
//! [`TranslationCache`](crate::TranslationCache) generation. Providers that
//! were registered for a domain before the current cache are consulted, in
//! order, through the [`OverrideChain`] before the catalog itself.

pub mod chain;
pub mod traits;

pub use chain::{OverrideChain, OverridePolicy};
pub use traits::LookupProvider;
