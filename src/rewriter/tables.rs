// WHY: Read-only substitution tables, validated once at startup and passed explicitly
// Construction rejects tables whose ordering would let single words shadow compound phrases

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::analyzer::phrase_words;

/// Candidates that trigger verb agreement fixing before they are substituted
pub const SUBJECT_PRONOUNS: &[&str] = &["he", "she", "he or she"];

/// Check if a candidate phrase is a gendered subject pronoun
pub fn is_subject_pronoun(phrase: &str) -> bool {
    let normalized = normalize_phrase(phrase);
    SUBJECT_PRONOUNS.iter().any(|subject| *subject == normalized)
}

/// One row of the pronoun table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PronounEntry {
    /// Source phrase, possibly multi-word ("he or she")
    pub phrase: String,
    /// Neutral replacement
    pub replacement: String,
    /// Replacement used when an open-class word follows ("her book" -> "their book")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possessive: Option<String>,
}

impl PronounEntry {
    pub fn new(phrase: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            replacement: replacement.into(),
            possessive: None,
        }
    }

    pub fn with_possessive(mut self, possessive: impl Into<String>) -> Self {
        self.possessive = Some(possessive.into());
        self
    }

    pub fn is_compound(&self) -> bool {
        self.phrase.split_whitespace().count() > 1
    }

    /// Replacement for a match, given whether an open-class word follows it
    pub fn replacement_for(&self, before_open_class: bool) -> &str {
        match (&self.possessive, before_open_class) {
            (Some(possessive), true) => possessive,
            _ => &self.replacement,
        }
    }
}

/// Built-in gendered pronoun table: compound phrases first, then single words
pub fn default_pronoun_entries() -> Vec<PronounEntry> {
    vec![
        PronounEntry::new("he or she", "they"),
        PronounEntry::new("him or her", "them"),
        PronounEntry::new("his or her", "their"),
        PronounEntry::new("his or hers", "theirs"),
        PronounEntry::new("himself or herself", "themself"),
        PronounEntry::new("him or herself", "themself"),
        PronounEntry::new("she", "they"),
        PronounEntry::new("her", "them").with_possessive("their"),
        PronounEntry::new("hers", "theirs"),
        PronounEntry::new("herself", "themself"),
        PronounEntry::new("he", "they"),
        PronounEntry::new("him", "them"),
        PronounEntry::new("his", "theirs").with_possessive("their"),
        PronounEntry::new("himself", "themself"),
    ]
}

/// Ordered phrase-to-replacement table
/// Invariant: every compound (multi-word) phrase precedes every single-word phrase
#[derive(Debug, Clone)]
pub struct PronounTable {
    entries: Vec<PronounEntry>,
}

impl PronounTable {
    /// Validate and build a table; phrases are normalized to lowercase single-spaced form
    pub fn new(entries: Vec<PronounEntry>) -> Result<Self> {
        if entries.is_empty() {
            anyhow::bail!("Pronoun table must contain at least one entry");
        }

        let mut seen = HashSet::new();
        let mut seen_single_word = None;
        let mut normalized = Vec::with_capacity(entries.len());

        for entry in entries {
            let phrase = normalize_phrase(&entry.phrase);
            if phrase.is_empty() {
                anyhow::bail!("Pronoun table contains an empty phrase");
            }
            if entry.replacement.trim().is_empty() {
                anyhow::bail!("Pronoun '{}' has an empty replacement", phrase);
            }
            if !seen.insert(phrase.clone()) {
                anyhow::bail!("Pronoun '{}' appears more than once", phrase);
            }

            let entry = PronounEntry { phrase, ..entry };
            if entry.is_compound() {
                if let Some(single) = &seen_single_word {
                    anyhow::bail!(
                        "Compound phrase '{}' is listed after single word '{}'; compound phrases must come first",
                        entry.phrase,
                        single
                    );
                }
            } else if seen_single_word.is_none() {
                seen_single_word = Some(entry.phrase.clone());
            }
            normalized.push(entry);
        }

        // WHY: a replacement that is itself a key would be rewritten again on the next pass
        for entry in &normalized {
            let outputs = std::iter::once(&entry.replacement).chain(entry.possessive.iter());
            for output in outputs {
                let output_phrase = normalize_phrase(output);
                let clash = seen.contains(&output_phrase)
                    || output_phrase.split(' ').any(|word| seen.contains(word));
                if clash {
                    anyhow::bail!(
                        "Replacement '{}' for '{}' is itself a replaceable pronoun",
                        output,
                        entry.phrase
                    );
                }
            }
        }

        Ok(Self { entries: normalized })
    }

    /// Table with the built-in entries
    pub fn standard() -> Result<Self> {
        Self::new(default_pronoun_entries())
    }

    pub fn entries(&self) -> &[PronounEntry] {
        &self.entries
    }

    /// Phrases in match order
    pub fn phrases(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.phrase.as_str()).collect()
    }

    /// Look up the entry for a phrase in any casing
    pub fn get(&self, phrase: &str) -> Option<&PronounEntry> {
        let normalized = normalize_phrase(phrase);
        self.entries.iter().find(|e| e.phrase == normalized)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Singular/plural forms of a verb that does not follow spelling rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrregularVerb {
    singular: String,
    plural: String,
    singular_words: Vec<String>,
}

impl IrregularVerb {
    pub fn singular(&self) -> &str {
        &self.singular
    }

    pub fn plural(&self) -> &str {
        &self.plural
    }

    /// Lowercase words of the singular form ("is not" -> ["is", "not"])
    pub fn singular_words(&self) -> &[String] {
        &self.singular_words
    }
}

/// Built-in irregular verbs; negated forms precede their un-negated prefix
pub const IRREGULAR_VERBS: &[(&str, &str)] = &[
    ("is not", "are not"),
    ("is", "are"),
    ("was not", "were not"),
    ("was", "were"),
    ("has not", "have not"),
    ("has", "have"),
    ("does not", "do not"),
    ("does", "do"),
];

/// Ordered irregular verb pairs
/// Invariant: no entry's singular words are a proper prefix of a later entry's
#[derive(Debug, Clone)]
pub struct IrregularVerbTable {
    verbs: Vec<IrregularVerb>,
}

impl IrregularVerbTable {
    pub fn new(pairs: &[(&str, &str)]) -> Result<Self> {
        let mut verbs: Vec<IrregularVerb> = Vec::with_capacity(pairs.len());
        for (singular, plural) in pairs {
            let singular_words = phrase_words(singular);
            if singular_words.is_empty() || plural.trim().is_empty() {
                anyhow::bail!("Irregular verb pair ('{}', '{}') has an empty form", singular, plural);
            }
            if let Some(shadowing) = verbs.iter().find(|earlier| {
                earlier.singular_words.len() < singular_words.len()
                    && singular_words.starts_with(&earlier.singular_words)
            }) {
                anyhow::bail!(
                    "Irregular verb '{}' is listed after its prefix '{}' and would never match",
                    singular,
                    shadowing.singular
                );
            }
            verbs.push(IrregularVerb {
                singular: singular_words.join(" "),
                plural: normalize_phrase(plural),
                singular_words,
            });
        }
        Ok(Self { verbs })
    }

    pub fn standard() -> Result<Self> {
        Self::new(IRREGULAR_VERBS)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IrregularVerb> {
        self.verbs.iter()
    }

    pub fn len(&self) -> usize {
        self.verbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }
}

/// Lowercase, single-spaced form of a phrase
pub fn normalize_phrase(phrase: &str) -> String {
    phrase_words(phrase).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tables_are_valid() {
        let table = PronounTable::standard().unwrap();
        assert_eq!(table.len(), 14);
        assert_eq!(IrregularVerbTable::standard().unwrap().len(), 8);
    }

    #[test]
    fn test_compounds_precede_single_words() {
        let table = PronounTable::standard().unwrap();
        let first_single = table.entries().iter().position(|e| !e.is_compound()).unwrap();
        assert!(table.entries()[..first_single].iter().all(PronounEntry::is_compound));
        assert!(table.entries()[first_single..].iter().all(|e| !e.is_compound()));
    }

    #[test]
    fn test_compound_after_single_word_is_rejected() {
        let entries = vec![
            PronounEntry::new("he", "they"),
            PronounEntry::new("he or she", "they"),
        ];
        let err = PronounTable::new(entries).unwrap_err();
        assert!(err.to_string().contains("compound phrases must come first"));
    }

    #[test]
    fn test_replacement_that_is_a_key_is_rejected() {
        let entries = vec![PronounEntry::new("he", "she"), PronounEntry::new("she", "they")];
        assert!(PronounTable::new(entries).is_err());
    }

    #[test]
    fn test_duplicate_and_empty_phrases_are_rejected() {
        assert!(PronounTable::new(vec![]).is_err());
        assert!(PronounTable::new(vec![PronounEntry::new("  ", "they")]).is_err());
        let entries = vec![PronounEntry::new("he", "they"), PronounEntry::new("HE", "they")];
        assert!(PronounTable::new(entries).is_err());
    }

    #[test]
    fn test_lookup_and_possessive() {
        let table = PronounTable::standard().unwrap();
        let her = table.get("Her").unwrap();
        assert_eq!(her.replacement_for(false), "them");
        assert_eq!(her.replacement_for(true), "their");
        assert_eq!(table.get("He  or she").unwrap().replacement, "they");
        assert!(table.get("they").is_none());
    }

    #[test]
    fn test_negated_irregular_must_precede_prefix() {
        assert!(IrregularVerbTable::new(&[("is not", "are not"), ("is", "are")]).is_ok());
        let err = IrregularVerbTable::new(&[("is", "are"), ("is not", "are not")]).unwrap_err();
        assert!(err.to_string().contains("would never match"));
    }

    #[test]
    fn test_subject_pronouns() {
        assert!(is_subject_pronoun("he"));
        assert!(is_subject_pronoun("He or she"));
        assert!(!is_subject_pronoun("him"));
        assert!(!is_subject_pronoun("his or her"));
    }
}
