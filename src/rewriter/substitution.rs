// WHY: Case-preserving, acronym-safe phrase substitution over an analyzed document
// Candidates are applied in the caller's order so compound phrases win over their parts

use anyhow::Result;
use tracing::debug;

use super::agreement::{fix_verb_number, fix_verb_number_with};
use super::analyzer::{Analyzer, Document};
use super::lexicon::capitalize;
use super::tables::{is_subject_pronoun, IrregularVerbTable};

/// What the engine knows about a match beyond its text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchContext {
    /// An open-class word (noun, adjective, number) directly follows the match
    pub before_open_class: bool,
}

/// Substitute outputs for one candidate, by case and context
struct RenderedForms {
    capitalized: [String; 2],
    lowercase: [String; 2],
}

impl RenderedForms {
    fn new<F>(candidate: &str, substitute: &F) -> Self
    where
        F: Fn(&str, &MatchContext) -> String,
    {
        let upper = capitalize(&candidate.to_lowercase());
        let lower = candidate.to_lowercase();
        let plain = MatchContext::default();
        let possessive = MatchContext { before_open_class: true };
        Self {
            capitalized: [substitute(&upper, &plain), substitute(&upper, &possessive)],
            lowercase: [substitute(&lower, &plain), substitute(&lower, &possessive)],
        }
    }

    fn pick(&self, uppercase: bool, context: &MatchContext) -> &str {
        let forms = if uppercase { &self.capitalized } else { &self.lowercase };
        &forms[usize::from(context.before_open_class)]
    }
}

/// Builds the text written for an edit from the original and the new wording
pub type ChangeMarkup = fn(&str, &str) -> String;

/// Substitution engine bound to one analyzer and irregular verb table
pub struct SubstitutionEngine<A: Analyzer> {
    analyzer: A,
    irregulars: IrregularVerbTable,
    verb_markup: Option<ChangeMarkup>,
}

impl<A: Analyzer> SubstitutionEngine<A> {
    pub fn new(analyzer: A, irregulars: IrregularVerbTable) -> Self {
        Self {
            analyzer,
            irregulars,
            verb_markup: None,
        }
    }

    /// Write verb agreement edits through `markup` instead of as the bare corrected verb
    pub fn with_verb_markup(mut self, markup: ChangeMarkup) -> Self {
        self.verb_markup = Some(markup);
        self
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    /// Replace every candidate in `text` using `substitute`, preserving title and lower case
    /// and leaving acronyms alone. Subject pronouns get their verbs fixed first.
    /// The only error is the analyzer failing to tokenize `text`.
    pub fn replace_words<S, F>(
        &self,
        text: &str,
        candidates: &[S],
        substitute: F,
        expand_contractions: bool,
    ) -> Result<String>
    where
        S: AsRef<str>,
        F: Fn(&str) -> String,
    {
        self.replace_words_in_context(
            text,
            candidates,
            |word, _context| substitute(word),
            expand_contractions,
        )
    }

    /// Like `replace_words`, with the substitute also told whether an open-class word follows
    pub fn replace_words_in_context<S, F>(
        &self,
        text: &str,
        candidates: &[S],
        substitute: F,
        expand_contractions: bool,
    ) -> Result<String>
    where
        S: AsRef<str>,
        F: Fn(&str, &MatchContext) -> String,
    {
        let mut doc = self.analyzer.analyze(text)?;
        if expand_contractions {
            let expanded = self.analyzer.expand_contractions(&mut doc);
            if expanded > 0 {
                debug!("Expanded {} contractions", expanded);
            }
        }

        for candidate in candidates {
            let word = candidate.as_ref();
            if !doc.has(word) {
                continue;
            }
            // WHY: agreement keys on the original subject, so it runs before substitution
            if is_subject_pronoun(word) {
                match self.verb_markup {
                    Some(markup) => fix_verb_number_with(&mut doc, word, &self.irregulars, markup),
                    None => fix_verb_number(&mut doc, word, &self.irregulars),
                };
            }
            let forms = RenderedForms::new(word, &substitute);
            let replaced = substitute_matches(&mut doc, word, &forms);
            debug!("Replaced {} occurrences of '{}'", replaced, word);
        }

        Ok(doc.render())
    }
}

fn substitute_matches(doc: &mut Document, word: &str, forms: &RenderedForms) -> usize {
    let matches = doc.find(word);
    let mut replaced = 0;
    for found in matches.iter().rev() {
        if doc.is_acronym_span(found) {
            continue;
        }
        let context = MatchContext {
            before_open_class: doc.next_is_open_class(found),
        };
        let replacement = forms.pick(found.starts_uppercase(), &context).to_string();
        doc.replace(found, &replacement);
        replaced += 1;
    }
    replaced
}
