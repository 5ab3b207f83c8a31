//! Label cleaning and name matching.
//!
//! Matching is exact and case-sensitive after trimming surrounding
//! whitespace. The only tolerance beyond trimming is the configured
//! Arabic ↔ English alias book. Labels that differ by punctuation, diacritics
//! or spelling are distinct names.

use std::collections::BTreeMap;

use crate::{
  Result,
  hierarchy::{EntityNames, Level, Named},
};

/// Trim a raw label; blank or absent labels become `None`.
pub fn clean_label(raw: Option<&str>) -> Option<&str> {
  raw.map(str::trim).filter(|s| !s.is_empty())
}

// ─── Alias book ──────────────────────────────────────────────────────────────

/// Known Arabic ↔ English name pairs.
#[derive(Debug, Clone, Default)]
pub struct AliasBook {
  ar_to_en: BTreeMap<String, String>,
  en_to_ar: BTreeMap<String, String>,
}

/// The spellings a label may appear under: the label itself and, if the alias
/// book knows it, its counterpart in the other language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spellings<'a> {
  pub label: &'a str,
  pub alias: Option<&'a str>,
}

impl<'a> Spellings<'a> {
  pub fn iter(self) -> impl Iterator<Item = &'a str> {
    std::iter::once(self.label).chain(self.alias)
  }
}

impl AliasBook {
  /// Build from an Arabic → English map. Pairs with a blank side are skipped.
  pub fn new<I, K, V>(pairs: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
  {
    let mut book = Self::default();
    for (ar, en) in pairs {
      let (Some(ar), Some(en)) =
        (clean_label(Some(ar.as_ref())), clean_label(Some(en.as_ref())))
      else {
        continue;
      };
      book.ar_to_en.insert(ar.to_owned(), en.to_owned());
      book.en_to_ar.insert(en.to_owned(), ar.to_owned());
    }
    book
  }

  pub fn is_empty(&self) -> bool { self.ar_to_en.is_empty() }

  pub fn english_for(&self, name_ar: &str) -> Option<&str> {
    self.ar_to_en.get(name_ar.trim()).map(String::as_str)
  }

  pub fn arabic_for(&self, name_en: &str) -> Option<&str> {
    self.en_to_ar.get(name_en.trim()).map(String::as_str)
  }

  /// `label` must already be cleaned.
  pub fn spellings<'a>(&'a self, label: &'a str) -> Spellings<'a> {
    let alias = self.english_for(label).or_else(|| self.arabic_for(label));
    Spellings { label, alias }
  }

  /// Names for a brand-new entity created from `label`.
  ///
  /// A known English alias is stored as the English name under its Arabic
  /// counterpart; anything else becomes the Arabic name.
  pub fn canonical_names(&self, level: Level, label: &str) -> Result<EntityNames> {
    match (self.arabic_for(label), self.english_for(label)) {
      (Some(ar), _) => EntityNames::new(level, ar, Some(label)),
      (None, en) => EntityNames::new(level, label, en),
    }
  }
}

// ─── Matcher ─────────────────────────────────────────────────────────────────

/// Resolves a label against the entities of one scope.
#[derive(Debug, Clone, Default)]
pub struct NameMatcher {
  aliases: AliasBook,
}

impl NameMatcher {
  pub fn new(aliases: AliasBook) -> Self { Self { aliases } }

  pub fn aliases(&self) -> &AliasBook { &self.aliases }

  /// Find the active entity in `scope` named `label`.
  ///
  /// Precedence: the label before its alias, an Arabic-name hit before an
  /// English-name hit, then lowest position in `scope`.
  pub fn find<'e, E: Named>(&self, scope: &'e [E], label: &str) -> Option<&'e E> {
    let label = clean_label(Some(label))?;
    let active = || scope.iter().filter(|e| e.is_active());

    for spelling in self.aliases.spellings(label).iter() {
      if let Some(hit) = active().find(|e| e.name_ar().trim() == spelling) {
        return Some(hit);
      }
      if let Some(hit) =
        active().find(|e| e.name_en().map(str::trim) == Some(spelling))
      {
        return Some(hit);
      }
    }
    None
  }
}
