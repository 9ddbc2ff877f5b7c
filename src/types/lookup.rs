//! Lookup arguments as passed by callers.

use serde::Serialize;

/// The arguments of a single translation lookup.
///
/// Singular lookups leave `plural` and `count` unset. Two lookups are
/// equivalent iff they serialize identically (together with the domain),
/// which is what [`fingerprint`](crate::fingerprint::fingerprint) hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LookupArgs<'a> {
    /// Primary (singular) source text.
    pub text: &'a str,
    /// Plural source text, for plural lookups.
    pub plural: Option<&'a str>,
    /// Count driving plural selection, for plural lookups.
    pub count: Option<u64>,
    /// Disambiguation context (`msgctxt`).
    pub context: Option<&'a str>,
}

impl<'a> LookupArgs<'a> {
    /// Arguments for a singular lookup.
    pub fn singular(text: &'a str) -> Self {
        Self {
            text,
            plural: None,
            count: None,
            context: None,
        }
    }

    /// Arguments for a plural lookup.
    pub fn plural(singular: &'a str, plural: &'a str, count: u64) -> Self {
        Self {
            text: singular,
            plural: Some(plural),
            count: Some(count),
            context: None,
        }
    }

    /// Attach (or clear) a disambiguation context.
    pub fn with_context(mut self, context: Option<&'a str>) -> Self {
        self.context = context;
        self
    }

    /// Whether this is a plural lookup.
    pub fn is_plural(&self) -> bool {
        self.plural.is_some()
    }

    /// Whether `answer` is the literal passthrough of these arguments.
    ///
    /// For plural lookups either source form counts as passthrough, since a
    /// provider that does not know the text echoes one of them back.
    pub fn is_identity(&self, answer: &str) -> bool {
        answer == self.text || self.plural.is_some_and(|p| answer == p)
    }

    /// The untranslated answer: the singular text, or for plural lookups the
    /// form selected by the default `count == 1` rule.
    pub fn identity(&self) -> &'a str {
        match (self.plural, self.count) {
            (Some(plural), Some(count)) if count != 1 => plural,
            _ => self.text,
        }
    }
}
