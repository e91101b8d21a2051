// WHY: Cheap whole-text pre-filter run before the token-level engine
// One compiled alternation per candidate set; a bad pattern fails at construction

use anyhow::{Context, Result};
use regex_automata::meta::Regex;
use std::ops::Range;
use tracing::debug;

/// Case-insensitive matcher over a fixed candidate set
#[derive(Debug, Clone)]
pub struct Classifier {
    regex: Regex,
    pattern_count: usize,
}

impl Classifier {
    /// Match literal phrases on word boundaries; inner whitespace matches any whitespace run
    pub fn for_phrases<S: AsRef<str>>(phrases: &[S]) -> Result<Self> {
        let patterns: Vec<String> = phrases
            .iter()
            .map(|phrase| phrase_pattern(phrase.as_ref()))
            .collect::<Result<_>>()?;
        Self::compile(&patterns)
    }

    /// Match raw regular expressions
    pub fn for_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns: Vec<String> = patterns.iter().map(|p| p.as_ref().to_string()).collect();
        Self::compile(&patterns)
    }

    fn compile(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            anyhow::bail!("Classifier needs at least one pattern");
        }
        let alternation = patterns
            .iter()
            .map(|p| format!("(?:{p})"))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!("(?i){alternation}");
        let regex = Regex::new(&pattern)
            .with_context(|| format!("Failed to compile classifier pattern: {pattern}"))?;

        debug!("Compiled classifier over {} patterns", patterns.len());
        Ok(Self {
            regex,
            pattern_count: patterns.len(),
        })
    }

    /// Check if any candidate occurs in `text`
    pub fn needs_replacement(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Byte ranges of non-overlapping, non-empty candidate occurrences
    pub fn find_spans(&self, text: &str) -> Vec<Range<usize>> {
        self.regex
            .find_iter(text)
            .map(|m| m.range())
            .filter(|range| !range.is_empty())
            .collect()
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }
}

fn phrase_pattern(phrase: &str) -> Result<String> {
    let words: Vec<String> = phrase.split_whitespace().map(escape_literal).collect();
    if words.is_empty() {
        anyhow::bail!("Cannot build a matcher for an empty phrase");
    }
    Ok(format!(r"\b{}\b", words.join(r"\s+")))
}

fn escape_literal(word: &str) -> String {
    let mut escaped = String::with_capacity(word.len());
    for c in word.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | '#' | '&' | '-' | '~'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_detection() {
        let classifier = Classifier::for_phrases(&["he or she", "she", "his"]).unwrap();
        assert!(classifier.needs_replacement("Ask if She agrees"));
        assert!(classifier.needs_replacement("he\n  or she"));
        assert!(classifier.needs_replacement("<p>His hat</p>"));
        assert!(!classifier.needs_replacement("The shed and this history"));
        assert!(!classifier.needs_replacement(""));
    }

    #[test]
    fn test_find_spans() {
        let classifier = Classifier::for_phrases(&["gender"]).unwrap();
        let text = "Gender and gendered are not both gender";
        let spans = classifier.find_spans(text);
        assert_eq!(spans, vec![0..6, 33..39]);
    }

    #[test]
    fn test_literal_metacharacters_are_escaped() {
        let classifier = Classifier::for_phrases(&["non-binary", "c++"]).unwrap();
        assert!(classifier.needs_replacement("a non-binary person"));
        assert!(!classifier.needs_replacement("nonxbinary"));
    }

    #[test]
    fn test_malformed_pattern_fails_fast() {
        assert!(Classifier::for_patterns(&["pronouns?:("]).is_err());
        assert!(Classifier::for_patterns::<&str>(&[]).is_err());
        assert!(Classifier::for_phrases(&["   "]).is_err());
    }
}
