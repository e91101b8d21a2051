// WHY: Keeps verbs grammatical when a singular subject pronoun becomes plural
// Must run before the subject itself is substituted, since matching keys on the original subject

use tracing::debug;

use super::analyzer::{phrase_words, Document, Match, Tag};
use super::lexicon::capitalize;
use super::tables::IrregularVerbTable;

/// Stem endings that take "-es" in the third person singular ("goes", "squashes")
pub const ES_STEM_ENDINGS: &[&str] = &["o", "s", "ch", "sh", "x", "z"];

/// A verb occurrence and the form it should become
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbPair {
    pub original: Match,
    pub corrected: String,
}

/// Rewrite verbs governed by `subject` so they agree with a plural pronoun
/// Returns the number of verbs rewritten
pub fn fix_verb_number(doc: &mut Document, subject: &str, irregulars: &IrregularVerbTable) -> usize {
    fix_verb_number_with(doc, subject, irregulars, |_original, corrected| corrected.to_string())
}

/// Like `fix_verb_number`, with `render` building the replacement text from the original
/// verb and its corrected form
pub fn fix_verb_number_with<R>(
    doc: &mut Document,
    subject: &str,
    irregulars: &IrregularVerbTable,
    render: R,
) -> usize
where
    R: Fn(&str, &str) -> String,
{
    let subject_words = phrase_words(subject);
    if subject_words.is_empty() {
        return 0;
    }

    // Question form, e.g. "Does she smoke?"
    let questions = interrogative_pairs(doc, &subject_words, irregulars);
    let mut fixed = apply_pairs(doc, questions, &render);

    // Statement form, e.g. "Yes, she smokes." or "No, she does not smoke."
    let statements = declarative_pairs(doc, &subject_words, irregulars);
    fixed += apply_pairs(doc, statements, &render);

    if fixed > 0 {
        debug!("Fixed {} verb forms following '{}'", fixed, subject);
    }
    fixed
}

/// Plural of a regular third-person singular verb, by spelling rule
/// "-ies" -> "-y", "-es" after {o, s, ch, sh, x, z} -> drop "-es", otherwise "-s" -> drop "s"
pub fn regular_plural(verb: &str) -> Option<String> {
    if verb.is_empty() || !verb.chars().all(|c| c.is_ascii_lowercase()) {
        return None;
    }
    // "-ie" verbs ("lies", "dies") take this rule too and come out as "ly", "dy"
    if let Some(stem) = verb.strip_suffix("ies") {
        return Some(format!("{stem}y"));
    }
    if let Some(stem) = verb.strip_suffix("es") {
        if ES_STEM_ENDINGS.iter().any(|ending| stem.ends_with(ending)) {
            return Some(stem.to_string());
        }
    }
    verb.strip_suffix('s')
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

/// Irregular verb immediately followed by the subject ("Is he", "Does she")
fn interrogative_pairs(
    doc: &Document,
    subject_words: &[String],
    irregulars: &IrregularVerbTable,
) -> Vec<VerbPair> {
    let patterns: Vec<(Vec<&str>, usize, &str)> = irregulars
        .iter()
        .map(|verb| {
            let words = verb
                .singular_words()
                .iter()
                .chain(subject_words)
                .map(String::as_str)
                .collect();
            (words, verb.singular_words().len(), verb.plural())
        })
        .collect();

    let mut pairs = Vec::new();
    for start in 0..doc.len() {
        for (words, verb_len, plural) in &patterns {
            if !doc.matches_at(start, words) {
                continue;
            }
            let subject_start = start + verb_len;
            if doc.tokens()[subject_start..subject_start + subject_words.len()]
                .iter()
                .any(|t| t.is_acronym())
            {
                break;
            }
            if let Some(original) = doc.span(start, *verb_len) {
                let corrected = match_case(&original, plural);
                pairs.push(VerbPair { original, corrected });
            }
            break;
        }
    }
    pairs
}

/// Subject, optional adverb, then a verb ("she smokes", "he really is")
fn declarative_pairs(
    doc: &Document,
    subject_words: &[String],
    irregulars: &IrregularVerbTable,
) -> Vec<VerbPair> {
    let mut pairs = Vec::new();
    for start in 0..doc.len() {
        if !doc.matches_at(start, subject_words) {
            continue;
        }
        let subject = &doc.tokens()[start..start + subject_words.len()];
        let subject_joined = subject.last().is_some_and(|t| t.is_followed_by_space());
        if subject.iter().any(|t| t.is_acronym()) || !subject_joined {
            continue;
        }

        let mut verb_index = start + subject_words.len();
        let Some(next) = doc.token(verb_index) else {
            continue;
        };
        if next.has_tag(Tag::Adverb) {
            if !next.is_followed_by_space() {
                continue;
            }
            verb_index += 1;
        }

        if let Some(pair) = verb_pair_at(doc, verb_index, irregulars) {
            pairs.push(pair);
        }
    }
    pairs
}

/// Corrected form for the verb at `index`: irregular table first, then spelling rules
fn verb_pair_at(doc: &Document, index: usize, irregulars: &IrregularVerbTable) -> Option<VerbPair> {
    for verb in irregulars.iter() {
        if doc.matches_at(index, verb.singular_words()) {
            let original = doc.span(index, verb.singular_words().len())?;
            let corrected = match_case(&original, verb.plural());
            return Some(VerbPair { original, corrected });
        }
    }

    let token = doc.token(index)?;
    if token.is_acronym() || !token.is_open_class() {
        return None;
    }
    let plural = regular_plural(&token.text().to_lowercase())?;
    let original = doc.span(index, 1)?;
    let corrected = match_case(&original, &plural);
    Some(VerbPair { original, corrected })
}

/// Apply pairs right to left so earlier spans keep their indices
fn apply_pairs<R>(doc: &mut Document, mut pairs: Vec<VerbPair>, render: &R) -> usize
where
    R: Fn(&str, &str) -> String,
{
    pairs.sort_by_key(|pair| pair.original.start);
    pairs.dedup_by_key(|pair| pair.original.start);
    let count = pairs.len();
    for pair in pairs.iter().rev() {
        doc.replace(&pair.original, &render(&pair.original.surface, &pair.corrected));
    }
    count
}

fn match_case(original: &Match, replacement: &str) -> String {
    if original.starts_uppercase() {
        capitalize(replacement)
    } else {
        replacement.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewriter::analyzer::{Analyzer, LexiconAnalyzer};

    fn fix(text: &str, subject: &str) -> String {
        let irregulars = IrregularVerbTable::standard().unwrap();
        let mut doc = LexiconAnalyzer::new().analyze(text).unwrap();
        fix_verb_number(&mut doc, subject, &irregulars);
        doc.render()
    }

    #[test]
    fn test_regular_plural_rules() {
        let cases = [
            ("smokes", Some("smoke")),
            ("flies", Some("fly")),
            ("cries", Some("cry")),
            ("goes", Some("go")),
            ("squashes", Some("squash")),
            ("watches", Some("watch")),
            ("fixes", Some("fix")),
            ("buzzes", Some("buzz")),
            ("kisses", Some("kiss")),
            ("loves", Some("love")),
            ("lies", Some("ly")),
            ("walked", None),
            ("s", None),
        ];
        for (verb, expected) in cases {
            assert_eq!(regular_plural(verb).as_deref(), expected, "Plural of {}", verb);
        }
    }

    #[test]
    fn test_declarative_agreement() {
        assert_eq!(fix("He is happy", "he"), "He are happy");
        assert_eq!(fix("He smokes", "he"), "He smoke");
        assert_eq!(fix("She flies daily", "she"), "She fly daily");
        assert_eq!(fix("He goes home", "he"), "He go home");
        assert_eq!(fix("He does not smoke", "he"), "He do not smoke");
        assert_eq!(fix("She was not there", "she"), "She were not there");
    }

    #[test]
    fn test_optional_adverb() {
        assert_eq!(fix("He really smokes.", "he"), "He really smoke.");
        assert_eq!(fix("She always has time", "she"), "She always have time");
    }

    #[test]
    fn test_interrogative_agreement() {
        assert_eq!(fix("Does he smoke?", "he"), "Do he smoke?");
        assert_eq!(fix("Is she happy?", "she"), "Are she happy?");
        assert_eq!(fix("Why does he smoke?", "he"), "Why do he smoke?");
    }

    #[test]
    fn test_compound_subject() {
        assert_eq!(fix("He or she decides.", "he or she"), "He or she decide.");
        assert_eq!(fix("Has he or she left?", "he or she"), "Have he or she left?");
    }

    #[test]
    fn test_non_verbs_are_left_alone() {
        assert_eq!(fix("He said so.", "he"), "He said so.");
        assert_eq!(fix("Is he always this late?", "he"), "Are he always this late?");
        assert_eq!(fix("Then he, sadly, walks.", "he"), "Then he, sadly, walks.");
        assert_eq!(fix("HE SMOKES", "he"), "HE SMOKES");
        assert_eq!(fix("She smokes", "he"), "She smokes");
    }

    #[test]
    fn test_render_sees_original_and_corrected() {
        let irregulars = IrregularVerbTable::standard().unwrap();
        let mut doc = LexiconAnalyzer::new().analyze("Does he smoke? He does not.").unwrap();
        let fixed = fix_verb_number_with(&mut doc, "he", &irregulars, |original, corrected| {
            format!("[{original}>{corrected}]")
        });
        assert_eq!(fixed, 2);
        assert_eq!(doc.render(), "[Does>Do] he smoke? He [does not>do not].");
    }

    #[test]
    fn test_each_verb_rewritten_once() {
        // "is" must not also be stripped to "i" by the "-s" rule
        assert_eq!(fix("He is. She is.", "he"), "He are. She is.");
        assert_eq!(fix("he goes and he goes", "he"), "he go and he go");
    }
}
