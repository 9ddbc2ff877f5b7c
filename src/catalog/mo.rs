//! Compiled gettext catalog (`.mo`) reader.
//!
//! # Layout
//!
//! ```text
//! offset  field
//! 0       magic 0x950412de (byte order of the file)
//! 4       revision
//! 8       N, number of strings
//! 12      O, offset of the original-strings table
//! 16      T, offset of the translated-strings table
//! 20      S, H: hash table size and offset (unused here)
//! ```
//!
//! Each table holds N `(length, offset)` pairs. An original string is
//! `msgctxt \x04 msgid`, optionally followed by `\0 msgid_plural`; the
//! matching translation holds the plural forms separated by `\0`. The entry
//! with an empty msgid is the header (`Plural-Forms`, `Content-Type`).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use super::plural::PluralForms;
use super::{CatalogImporter, EntryTable};
use crate::{MocacheError, Result};

const MAGIC: u32 = 0x9504_12de;
const HEADER_LEN: usize = 28;

/// Separator between context and msgid in original strings.
pub const CONTEXT_SEPARATOR: char = '\x04';

/// In-memory table of one compiled catalog.
#[derive(Debug, Clone, Default)]
pub struct MoCatalog {
    charset: Option<String>,
    plural_forms: PluralForms,
    messages: HashMap<String, String>,
    plurals: HashMap<String, Vec<String>>,
}

impl MoCatalog {
    /// Create an empty catalog with the default plural rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the bytes of a `.mo` file.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let reader = Reader::new(bytes)?;
        let count = reader.u32_at(8)? as usize;
        let originals = reader.u32_at(12)? as usize;
        let translations = reader.u32_at(16)? as usize;

        let mut catalog = Self::new();
        for i in 0..count {
            let original = reader.string(originals + i * 8)?;
            let translation = reader.string(translations + i * 8)?;
            if original.is_empty() {
                catalog.apply_header(translation);
                continue;
            }
            match original.split_once('\0') {
                Some((singular, _plural)) => {
                    let forms = translation.split('\0').map(str::to_owned).collect();
                    catalog.plurals.insert(singular.to_owned(), forms);
                }
                None => {
                    catalog
                        .messages
                        .insert(original.to_owned(), translation.to_owned());
                }
            }
        }
        Ok(catalog)
    }

    /// Read and parse a `.mo` file.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| MocacheError::CatalogUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&bytes)
    }

    /// Add a singular message, keyed by optional context.
    pub fn insert(
        &mut self,
        context: Option<&str>,
        msgid: impl AsRef<str>,
        msgstr: impl Into<String>,
    ) {
        self.messages
            .insert(lookup_key(context, msgid.as_ref()), msgstr.into());
    }

    /// Add plural forms for a singular msgid, keyed by optional context.
    pub fn insert_plural(
        &mut self,
        context: Option<&str>,
        msgid: impl AsRef<str>,
        forms: Vec<String>,
    ) {
        self.plurals.insert(lookup_key(context, msgid.as_ref()), forms);
    }

    /// Replace the plural rule.
    pub fn set_plural_forms(&mut self, forms: PluralForms) {
        self.plural_forms = forms;
    }

    /// Declared charset, if the header names one.
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Active plural rule.
    pub fn plural_forms(&self) -> &PluralForms {
        &self.plural_forms
    }

    /// Number of singular plus plural entries.
    pub fn len(&self) -> usize {
        self.messages.len() + self.plurals.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read `Plural-Forms` and `charset` from the header entry. An
    /// unparsable `Plural-Forms` keeps the default `n != 1` rule.
    fn apply_header(&mut self, header: &str) {
        for line in header.lines() {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            match name.trim().to_ascii_lowercase().as_str() {
                "plural-forms" => match PluralForms::parse(value) {
                    Ok(forms) => self.plural_forms = forms,
                    Err(e) => {
                        warn!(error = %e, "ignoring invalid Plural-Forms header, using n != 1");
                        self.plural_forms = PluralForms::default();
                    }
                },
                "content-type" => {
                    self.charset = value
                        .split(';')
                        .filter_map(|p| p.trim().strip_prefix("charset="))
                        .map(str::to_owned)
                        .next();
                }
                _ => {}
            }
        }
    }
}

impl EntryTable for MoCatalog {
    fn resolve(&self, text: &str, context: Option<&str>) -> Option<String> {
        let key = lookup_key(context, text);
        if let Some(msgstr) = self.messages.get(&key) {
            return non_empty(msgstr);
        }
        // A plural entry also answers singular lookups with its first form.
        self.plurals
            .get(&key)
            .and_then(|forms| forms.first())
            .and_then(|s| non_empty(s))
    }

    fn resolve_plural(
        &self,
        singular: &str,
        _plural: &str,
        count: u64,
        context: Option<&str>,
    ) -> Option<String> {
        let forms = self.plurals.get(&lookup_key(context, singular))?;
        let index = self.plural_forms.index(count).min(forms.len().saturating_sub(1));
        forms.get(index).and_then(|s| non_empty(s))
    }
}

/// Imports `.mo` files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoImporter;

impl CatalogImporter for MoImporter {
    fn name(&self) -> &str {
        "mo"
    }

    fn import(&self, path: &Path) -> Result<Arc<dyn EntryTable>> {
        Ok(Arc::new(MoCatalog::open(path)?))
    }
}

/// Compile `(original, translation)` pairs into little-endian `.mo` bytes.
///
/// Originals use the on-disk encoding described in the module docs, so a
/// plural entry is `"singular\0plural"` with forms `"one\0other"`. The hash
/// table is omitted (size 0), which readers must accept.
pub fn encode(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut sorted: Vec<_> = entries.to_vec();
    sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    let n = sorted.len();
    let originals_at = HEADER_LEN;
    let translations_at = originals_at + n * 8;
    let mut strings_at = translations_at + n * 8;

    let mut header = Vec::with_capacity(strings_at);
    let mut pool = Vec::new();
    let mut originals = Vec::with_capacity(n * 8);
    let mut translations = Vec::with_capacity(n * 8);
    for (table, pick) in [(&mut originals, 0), (&mut translations, 1)] {
        for entry in &sorted {
            let s = if pick == 0 { entry.0 } else { entry.1 };
            table.extend_from_slice(&(s.len() as u32).to_le_bytes());
            table.extend_from_slice(&(strings_at as u32).to_le_bytes());
            pool.extend_from_slice(s.as_bytes());
            pool.push(0);
            strings_at += s.len() + 1;
        }
    }

    for field in [
        MAGIC,
        0,
        n as u32,
        originals_at as u32,
        translations_at as u32,
        0,
        strings_at as u32,
    ] {
        header.extend_from_slice(&field.to_le_bytes());
    }
    header.extend_from_slice(&originals);
    header.extend_from_slice(&translations);
    header.extend_from_slice(&pool);
    header
}

fn lookup_key(context: Option<&str>, msgid: &str) -> String {
    match context {
        Some(ctx) => format!("{ctx}{CONTEXT_SEPARATOR}{msgid}"),
        None => msgid.to_owned(),
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_owned())
}

/// Bounds-checked view over `.mo` bytes in the file's byte order.
struct Reader<'a> {
    bytes: &'a [u8],
    big_endian: bool,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Result<Self> {
        let magic: [u8; 4] = bytes
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| malformed("file shorter than magic number"))?;
        let big_endian = if u32::from_le_bytes(magic) == MAGIC {
            false
        } else if u32::from_be_bytes(magic) == MAGIC {
            true
        } else {
            return Err(malformed("bad magic number"));
        };
        let reader = Self { bytes, big_endian };
        if bytes.len() < HEADER_LEN {
            return Err(malformed("truncated header"));
        }
        let major = reader.u32_at(4)? >> 16;
        if major > 1 {
            return Err(malformed(&format!("unsupported revision {major}")));
        }
        Ok(reader)
    }

    fn u32_at(&self, offset: usize) -> Result<u32> {
        let raw: [u8; 4] = offset
            .checked_add(4)
            .and_then(|end| self.bytes.get(offset..end))
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| malformed(&format!("offset {offset} out of bounds")))?;
        Ok(if self.big_endian {
            u32::from_be_bytes(raw)
        } else {
            u32::from_le_bytes(raw)
        })
    }

    /// String referenced by the `(length, offset)` descriptor at `at`.
    fn string(&self, at: usize) -> Result<&'a str> {
        let len = self.u32_at(at)? as usize;
        let start = self.u32_at(at + 4)? as usize;
        let raw = start
            .checked_add(len)
            .and_then(|end| self.bytes.get(start..end))
            .ok_or_else(|| malformed(&format!("string at {start} (+{len}) out of bounds")))?;
        std::str::from_utf8(raw).map_err(|e| malformed(&format!("string at {start}: {e}")))
    }
}

fn malformed(reason: &str) -> MocacheError {
    MocacheError::InvalidCatalog(format!("malformed .mo file: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Content-Type: text/plain; charset=UTF-8\nPlural-Forms: nplurals=3; plural=(n==1 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);\n";

    fn sample() -> MoCatalog {
        let bytes = encode(&[
            ("", HEADER),
            ("Cancel", "Anuluj"),
            ("month\x04May", "Maj"),
            ("file\0files", "plik\0pliki\0plików"),
            ("Untranslated", ""),
        ]);
        MoCatalog::parse(&bytes).unwrap()
    }

    #[test]
    fn parses_singular_entries() {
        let catalog = sample();
        assert_eq!(catalog.resolve("Cancel", None).as_deref(), Some("Anuluj"));
        assert_eq!(catalog.resolve("Missing", None), None);
    }

    #[test]
    fn empty_translation_is_absent() {
        assert_eq!(sample().resolve("Untranslated", None), None);
    }

    #[test]
    fn context_is_part_of_the_key() {
        let catalog = sample();
        assert_eq!(catalog.resolve("May", Some("month")).as_deref(), Some("Maj"));
        assert_eq!(catalog.resolve("May", None), None);
    }

    #[test]
    fn header_drives_plural_selection() {
        let catalog = sample();
        assert_eq!(catalog.charset(), Some("UTF-8"));
        assert_eq!(catalog.plural_forms().nplurals, 3);
        let pick = |n| catalog.resolve_plural("file", "files", n, None);
        assert_eq!(pick(1).as_deref(), Some("plik"));
        assert_eq!(pick(3).as_deref(), Some("pliki"));
        assert_eq!(pick(5).as_deref(), Some("plików"));
        assert_eq!(pick(22).as_deref(), Some("pliki"));
    }

    #[test]
    fn plural_entry_answers_singular_lookup() {
        assert_eq!(sample().resolve("file", None).as_deref(), Some("plik"));
    }

    #[test]
    fn big_endian_files_are_accepted() {
        let le = encode(&[("Yes", "Oui")]);
        // Re-encode each header and table word as big-endian.
        let mut be = le.clone();
        let words = (HEADER_LEN + 16) / 4;
        for i in 0..words {
            let at = i * 4;
            let word = u32::from_le_bytes(le[at..at + 4].try_into().unwrap());
            be[at..at + 4].copy_from_slice(&word.to_be_bytes());
        }
        let catalog = MoCatalog::parse(&be).unwrap();
        assert_eq!(catalog.resolve("Yes", None).as_deref(), Some("Oui"));
    }

    #[test]
    fn rejects_bad_magic() {
        let err = MoCatalog::parse(b"definitely not a catalog file").unwrap_err();
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn rejects_truncated_tables() {
        let bytes = encode(&[("Cancel", "Annuler"), ("Save", "Enregistrer")]);
        assert!(MoCatalog::parse(&bytes[..HEADER_LEN + 4]).is_err());
        assert!(MoCatalog::parse(&bytes[..bytes.len() - 6]).is_err());
    }

    #[test]
    fn rejects_invalid_utf8() {
        let mut bytes = encode(&[("Cancel", "Annuler")]);
        let last = bytes.len() - 2;
        bytes[last] = 0xff;
        assert!(MoCatalog::parse(&bytes).is_err());
    }

    #[test]
    fn bad_plural_header_keeps_default_rule() {
        for header in [
            "Plural-Forms: nplurals=2; plural=n +;\n",
            "Plural-Forms: nplurals=INTEGER; plural=EXPRESSION;\n",
        ] {
            let bytes = encode(&[
                ("", header),
                ("Cancel", "Annuler"),
                ("file\0files", "fichier\0fichiers"),
            ]);
            let catalog = MoCatalog::parse(&bytes).unwrap();
            assert_eq!(catalog.plural_forms(), &PluralForms::default());
            assert_eq!(catalog.resolve("Cancel", None).as_deref(), Some("Annuler"));
            let pick = |n| catalog.resolve_plural("file", "files", n, None);
            assert_eq!(pick(1).as_deref(), Some("fichier"));
            assert_eq!(pick(0).as_deref(), Some("fichiers"));
        }
    }

    #[test]
    fn deeply_nested_plural_header_keeps_default_rule() {
        let header = format!(
            "Plural-Forms: nplurals=2; plural={}n{};\n",
            "(".repeat(20_000),
            ")".repeat(20_000)
        );
        let bytes = encode(&[("", header.as_str()), ("Cancel", "Annuler")]);
        let catalog = MoCatalog::parse(&bytes).unwrap();
        assert_eq!(catalog.resolve("Cancel", None).as_deref(), Some("Annuler"));
    }

    #[test]
    fn open_missing_file_is_unavailable() {
        let err = MoCatalog::open(Path::new("/nonexistent/fr.mo")).unwrap_err();
        assert!(matches!(err, MocacheError::CatalogUnavailable { .. }));
    }

    #[test]
    fn programmatic_catalog() {
        let mut catalog = MoCatalog::new();
        catalog.insert(None, "Hello", "Bonjour");
        catalog.insert_plural(None, "item", vec!["élément".into(), "éléments".into()]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.resolve_plural("item", "items", 2, None).as_deref(),
            Some("éléments")
        );
    }
}
