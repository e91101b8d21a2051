// WHY: Text-level pronoun rewriting: classifier fast path, then substitution with agreement
// Tables and the analyzer are built once and shared read-only by every segment

pub mod agreement;
pub mod analyzer;
pub mod classifier;
pub mod lexicon;
pub mod substitution;
pub mod tables;

pub use agreement::{fix_verb_number, fix_verb_number_with, regular_plural, VerbPair};
pub use analyzer::{Analyzer, Document, LexiconAnalyzer, Match, Tag, Token};
pub use classifier::Classifier;
pub use substitution::{ChangeMarkup, MatchContext, SubstitutionEngine};
pub use tables::{IrregularVerbTable, PronounEntry, PronounTable};

use anyhow::Result;
use lexicon::capitalize;

/// Options for one pronoun rewriter
#[derive(Debug, Clone)]
pub struct RewriterConfig {
    /// Split "he's" into "he is" before matching
    pub expand_contractions: bool,
    /// Emit `<del>`/`<ins>` change markup for pronouns and the verbs fixed with them
    pub mark_changes: bool,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            expand_contractions: true,
            mark_changes: false,
        }
    }
}

/// Hidden `<del>`/`<ins>` pair recording one edit; `toggle` reveals it
pub fn change_markup(original: &str, replacement: &str) -> String {
    format!(r#"<del class="dgtw hide">{original}</del><ins class="dgtw hide">{replacement}</ins>"#)
}

/// Rewrites gendered pronouns in plain text to their neutral forms
pub struct PronounRewriter<A: Analyzer = LexiconAnalyzer> {
    engine: SubstitutionEngine<A>,
    table: PronounTable,
    classifier: Classifier,
    config: RewriterConfig,
}

impl<A: Analyzer> PronounRewriter<A> {
    pub fn new(
        analyzer: A,
        table: PronounTable,
        irregulars: IrregularVerbTable,
        config: RewriterConfig,
    ) -> Result<Self> {
        let classifier = Classifier::for_phrases(&table.phrases())?;
        let mut engine = SubstitutionEngine::new(analyzer, irregulars);
        if config.mark_changes {
            engine = engine.with_verb_markup(change_markup);
        }
        Ok(Self {
            engine,
            table,
            classifier,
            config,
        })
    }

    pub fn table(&self) -> &PronounTable {
        &self.table
    }

    pub fn config(&self) -> &RewriterConfig {
        &self.config
    }

    /// Fast check on raw text, safe to run over a whole page body
    pub fn has_replaceable_pronouns(&self, text: &str) -> bool {
        self.classifier.needs_replacement(text)
    }

    /// Rewrite every table phrase in `text`; errors only when the analyzer rejects the text
    /// `text` is one text segment: markup inside it is treated as words
    pub fn replace_pronouns(&self, text: &str) -> Result<String> {
        if !self.has_replaceable_pronouns(text) {
            return Ok(text.to_string());
        }
        let phrases = self.table.phrases();
        self.engine.replace_words_in_context(
            text,
            &phrases,
            |word, context| self.substitute(word, context),
            self.config.expand_contractions,
        )
    }

    fn substitute(&self, word: &str, context: &MatchContext) -> String {
        let Some(entry) = self.table.get(word) else {
            return word.to_string();
        };
        let replacement = entry.replacement_for(context.before_open_class);
        let cased = if word.chars().next().is_some_and(char::is_uppercase) {
            capitalize(replacement)
        } else {
            replacement.to_string()
        };

        if self.config.mark_changes {
            change_markup(word, &cased)
        } else {
            cased
        }
    }
}

impl PronounRewriter<LexiconAnalyzer> {
    /// Built-in tables with the lexicon analyzer
    pub fn with_defaults() -> Result<Self> {
        Self::new(
            LexiconAnalyzer::new(),
            PronounTable::standard()?,
            IrregularVerbTable::standard()?,
            RewriterConfig::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    // WHY: tables and classifier are validated once and reused across tests
    static REWRITER: OnceLock<PronounRewriter> = OnceLock::new();

    fn rewrite(text: &str) -> String {
        REWRITER
            .get_or_init(|| PronounRewriter::with_defaults().unwrap())
            .replace_pronouns(text)
            .unwrap()
    }

    #[test]
    fn test_agreement_examples() {
        assert_eq!(rewrite("He is happy"), "They are happy");
        assert_eq!(rewrite("He smokes"), "They smoke");
        assert_eq!(rewrite("She flies daily"), "They fly daily");
        assert_eq!(rewrite("He goes home"), "They go home");
        assert_eq!(rewrite("Does he smoke?"), "Do they smoke?");
        assert_eq!(rewrite("He does not smoke"), "They do not smoke");
    }

    #[test]
    fn test_compound_precedence() {
        assert_eq!(rewrite("He or she decides."), "They decide.");
        assert_eq!(rewrite("Ask him or her."), "Ask them.");
        assert_eq!(rewrite("She did it herself."), "They did it themself.");
    }

    #[test]
    fn test_possessive_disambiguation() {
        assert_eq!(rewrite("I saw her with her dog."), "I saw them with their dog.");
        assert_eq!(rewrite("The book is his."), "The book is theirs.");
        assert_eq!(rewrite("His book is on the table."), "Their book is on the table.");
    }

    #[test]
    fn test_acronyms_and_unrelated_text() {
        assert_eq!(rewrite("HER majesty and HE chemistry"), "HER majesty and HE chemistry");
        assert_eq!(rewrite("The shed is there."), "The shed is there.");
    }

    #[test]
    fn test_contractions_are_expanded() {
        assert_eq!(rewrite("He's late because he doesn't drive."), "They are late because they do not drive.");
    }

    #[test]
    fn test_idempotent_on_own_output() {
        for text in ["He is happy and his dog barks.", "Does she know him or her?"] {
            let once = rewrite(text);
            assert_eq!(rewrite(&once), once);
        }
    }

    #[test]
    fn test_change_markup() {
        let rewriter = PronounRewriter::new(
            LexiconAnalyzer::new(),
            PronounTable::standard().unwrap(),
            IrregularVerbTable::standard().unwrap(),
            RewriterConfig {
                expand_contractions: false,
                mark_changes: true,
            },
        )
        .unwrap();
        let result = rewriter.replace_pronouns("Ask him.").unwrap();
        assert_eq!(
            result,
            r#"Ask <del class="dgtw hide">him</del><ins class="dgtw hide">them</ins>."#
        );

        let result = rewriter.replace_pronouns("He smokes daily.").unwrap();
        assert_eq!(
            result,
            concat!(
                r#"<del class="dgtw hide">He</del><ins class="dgtw hide">They</ins> "#,
                r#"<del class="dgtw hide">smokes</del><ins class="dgtw hide">smoke</ins> daily."#
            )
        );
    }
}
