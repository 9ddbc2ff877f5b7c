//! Provider trait for chained lookups.
//!
//! # Identity answers
//!
//! A provider that does not know a text returns it unchanged. Callers
//! cannot tell that apart from a translation that happens to equal the
//! source, so the [`OverrideChain`](super::OverrideChain) treats an
//! identity answer as "not translated" by default.
//!
//! # Example
//!
//! ```
//! use mocache::LookupProvider;
//!
//! struct Shouting;
//!
//! impl LookupProvider for Shouting {
//!     fn name(&self) -> &str {
//!         "shouting"
//!     }
//!
//!     fn translate(&self, text: &str, _context: Option<&str>) -> String {
//!         text.to_uppercase()
//!     }
//!
//!     fn translate_plural(
//!         &self,
//!         singular: &str,
//!         plural: &str,
//!         count: u64,
//!         _context: Option<&str>,
//!     ) -> String {
//!         if count == 1 { singular.to_uppercase() } else { plural.to_uppercase() }
//!     }
//! }
//! ```

use crate::types::LookupArgs;

/// Answers translation lookups for one domain.
///
/// Lookups are infallible: a provider that cannot translate returns the
/// source text (for plural lookups, the form picked by `count == 1`).
pub trait LookupProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Translate `text`, disambiguated by `context`.
    fn translate(&self, text: &str, context: Option<&str>) -> String;

    /// Translate a plural pair for `count`.
    fn translate_plural(
        &self,
        singular: &str,
        plural: &str,
        count: u64,
        context: Option<&str>,
    ) -> String;

    /// Dispatch on the shape of `args`.
    ///
    /// Default implementation calls `translate` or `translate_plural`.
    fn lookup(&self, args: &LookupArgs<'_>) -> String {
        match (args.plural, args.count) {
            (Some(plural), Some(count)) => {
                self.translate_plural(args.text, plural, count, args.context)
            }
            _ => self.translate(args.text, args.context),
        }
    }
}
