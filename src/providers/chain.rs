//! Override chain with identity fall-through.
//!
//! The chain stores providers in priority order (index 0 = highest). On a
//! cache miss it asks each one in turn; the first answer that differs from
//! the source text wins and becomes the cached value.
//!
//! # Fallback Chain Flow
//!
//! ```text
//! cache.translate("Hello")
//!          │ miss
//!          ▼
//! ┌────────────────────┐
//! │  previous plugin   │ ──► "Hello" (identity: not translated)
//! │  (priority 0)      │
//! └─────────┬──────────┘
//!           │ fall through
//!           ▼
//! ┌────────────────────┐
//! │  older cache gen.  │ ──► "Bonjour" (wins, cached)
//! │  (priority 1)      │
//! └─────────┬──────────┘
//!           │ chain exhausted (no winner)
//!           ▼
//!     CatalogProvider
//! ```
//!
//! [`OverridePolicy::TrustIdentity`] restores the older behaviour where the
//! first provider's answer is authoritative even if it is the identity.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::LookupProvider;
use crate::types::LookupArgs;

/// How the chain treats an answer equal to the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverridePolicy {
    /// Identity answers mean "not translated"; ask the next provider, then
    /// the catalog.
    #[default]
    FallThrough,
    /// The first provider's answer is cached as authoritative, identity or
    /// not. Only for hosts that depend on that behaviour.
    TrustIdentity,
}

/// Ordered, read-only references to previously registered providers.
#[derive(Clone, Default)]
pub struct OverrideChain {
    providers: Vec<Arc<dyn LookupProvider>>,
    policy: OverridePolicy,
}

impl OverrideChain {
    /// Create an empty chain.
    pub fn new(policy: OverridePolicy) -> Self {
        Self {
            providers: Vec::new(),
            policy,
        }
    }

    /// Append a provider (lowest priority so far).
    pub fn push(&mut self, provider: Arc<dyn LookupProvider>) {
        self.providers.push(provider);
    }

    /// Active policy.
    pub fn policy(&self) -> OverridePolicy {
        self.policy
    }

    /// Number of providers in the chain.
    /// Providers in priority order.
    pub fn providers(&self) -> &[Arc<dyn LookupProvider>] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the chain has no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Ask the chain for an authoritative answer.
    ///
    /// Returns `None` when no provider produced a non-identity answer (or
    /// the chain is empty); the caller then consults the catalog.
    pub fn try_resolve(&self, args: &LookupArgs<'_>) -> Option<String> {
        for provider in &self.providers {
            let answer = provider.lookup(args);
            if !args.is_identity(&answer) {
                debug!(provider = provider.name(), text = args.text, "override answered");
                return Some(answer);
            }
            if self.policy == OverridePolicy::TrustIdentity {
                debug!(provider = provider.name(), text = args.text, "trusting identity answer");
                return Some(answer);
            }
        }
        None
    }
}

impl std::fmt::Debug for OverrideChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("OverrideChain")
            .field("providers", &names)
            .field("policy", &self.policy)
            .finish()
    }
}
