// WHY: Pages that state pronouns or discuss gender are highlighted instead of rewritten
// Both detectors share the classifier so detection and highlighting agree on every span

use anyhow::Result;

use crate::rewriter::Classifier;

/// Personal pronoun specifications such as "Pronouns: she/her" or "he/him"
pub const DEFAULT_PRONOUN_SPEC_PATTERNS: &[&str] = &[
    r"\bpronouns?\s*:",
    r"\b(?:she|he|they|ze|xe|ey|fae)\s*/\s*(?:her|hers|him|his|them|theirs|hir|zir|xem|em|faer)\b",
];

/// Terms that mark a page as being about gender itself
pub const DEFAULT_GENDER_TERMS: &[&str] = &[
    "gender",
    "genders",
    "gendered",
    "agender",
    "cisgender",
    "transgender",
    "genderqueer",
    "genderfluid",
    "gender identity",
    "gender expression",
    "non-binary",
    "nonbinary",
    "intersex",
    "misgender",
    "misgendered",
    "misgendering",
    "feminism",
    "feminist",
    "sexism",
    "sexist",
    "masculinity",
    "femininity",
];

/// Opening tag of inserted highlight markup
pub const HIGHLIGHT_OPEN: &str = r#"<strong class="dgtw hide">"#;
pub const HIGHLIGHT_CLOSE: &str = "</strong>";

/// Detects and highlights one kind of span
#[derive(Debug, Clone)]
pub struct Highlighter {
    classifier: Classifier,
}

impl Highlighter {
    /// Highlighter over raw regular expressions
    pub fn for_pronoun_specs<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        Ok(Self {
            classifier: Classifier::for_patterns(patterns)?,
        })
    }

    /// Highlighter over literal terms matched on word boundaries
    pub fn for_terms<S: AsRef<str>>(terms: &[S]) -> Result<Self> {
        Ok(Self {
            classifier: Classifier::for_phrases(terms)?,
        })
    }

    pub fn default_pronoun_specs() -> Result<Self> {
        Self::for_pronoun_specs(DEFAULT_PRONOUN_SPEC_PATTERNS)
    }

    pub fn default_gender_terms() -> Result<Self> {
        Self::for_terms(DEFAULT_GENDER_TERMS)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.classifier.needs_replacement(text)
    }

    /// Wrap every match in hidden `strong.dgtw` markup
    pub fn highlight(&self, text: &str) -> String {
        let spans = self.classifier.find_spans(text);
        if spans.is_empty() {
            return text.to_string();
        }

        let extra = spans.len() * (HIGHLIGHT_OPEN.len() + HIGHLIGHT_CLOSE.len());
        let mut out = String::with_capacity(text.len() + extra);
        let mut last = 0;
        for span in spans {
            out.push_str(&text[last..span.start]);
            out.push_str(HIGHLIGHT_OPEN);
            out.push_str(&text[span.clone()]);
            out.push_str(HIGHLIGHT_CLOSE);
            last = span.end;
        }
        out.push_str(&text[last..]);
        out
    }
}
