// WHY: Closed word classes and contraction forms the analyzer tags against
// Kept as static tables so tagging stays a set lookup per token

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use super::analyzer::Tag;

/// Adverbs that do not follow the "-ly" spelling pattern
pub const ADVERBS: &[&str] = &[
    "always", "never", "often", "also", "still", "just", "seldom", "sometimes",
    "already", "almost", "even", "only", "soon", "ever", "once", "again", "thus",
    "hence", "therefore", "nevertheless", "rather", "quite", "very", "too",
    "now", "then", "perhaps", "maybe", "indeed", "instead", "otherwise", "twice",
    "yet", "not", "hardly", "barely", "scarcely",
];

/// Words ending in "-ly" that are not adverbs
pub const LY_NON_ADVERBS: &[&str] = &[
    "family", "supply", "reply", "apply", "fly", "rely", "ally", "belly", "holy",
    "ugly", "july", "italy", "assembly", "bully", "comply", "multiply", "imply",
    "lily", "jelly", "rally", "tally", "sly", "ply", "anomaly", "monopoly",
    "butterfly", "dragonfly", "firefly", "melancholy",
];

pub const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "my", "your", "our",
    "their", "its", "his", "her", "some", "any", "every", "each", "no", "all",
    "both", "either", "neither", "another", "such", "what", "which", "whose",
];

pub const PREPOSITIONS: &[&str] = &[
    "to", "of", "in", "on", "at", "by", "for", "with", "from", "into", "onto",
    "about", "over", "under", "after", "before", "up", "down", "out", "off",
    "through", "around", "against", "between", "without", "within", "as", "like",
    "near", "across", "behind", "beyond", "during", "toward", "towards", "upon",
    "via", "per", "among", "along", "since", "until", "despite", "except",
];

pub const CONJUNCTIONS: &[&str] = &[
    "and", "or", "but", "nor", "so", "because", "if", "than", "when", "while",
    "though", "although", "unless", "whereas", "whether", "that", "where",
    "once", "after", "before", "since", "until",
];

pub const PRONOUNS: &[&str] = &[
    "i", "me", "you", "he", "him", "she", "her", "hers", "it", "we", "us",
    "they", "them", "theirs", "himself", "herself", "itself", "themself",
    "themselves", "myself", "yourself", "ourselves", "yourselves", "mine",
    "yours", "ours", "something", "anything", "everything", "nothing",
    "someone", "anyone", "everyone", "nobody", "somebody", "anybody",
    "everybody", "who", "whom", "whoever", "what", "which", "this", "that",
    "these", "those",
];

pub const AUXILIARIES: &[&str] = &[
    "is", "are", "was", "were", "be", "been", "being", "am", "has", "have",
    "had", "do", "does", "did", "will", "would", "shall", "should", "can",
    "could", "may", "might", "must",
];

/// Character references that stand for an apostrophe in raw page text
pub const APOSTROPHE_ENTITIES: &[&str] = &["&rsquo;", "&#8217;", "&#x2019;", "&apos;", "&#39;"];

/// Character references that render as a space between words
pub const SPACE_ENTITIES: &[&str] = &["&nbsp;", "&#160;", "&#xa0;"];

/// Contracted forms and their expansions, keyed by lowercase form with a plain apostrophe
pub const CONTRACTIONS: &[(&str, &[&str])] = &[
    ("he's", &["he", "is"]),
    ("she's", &["she", "is"]),
    ("it's", &["it", "is"]),
    ("that's", &["that", "is"]),
    ("there's", &["there", "is"]),
    ("here's", &["here", "is"]),
    ("what's", &["what", "is"]),
    ("who's", &["who", "is"]),
    ("he'll", &["he", "will"]),
    ("she'll", &["she", "will"]),
    ("he'd", &["he", "would"]),
    ("she'd", &["she", "would"]),
    ("isn't", &["is", "not"]),
    ("aren't", &["are", "not"]),
    ("wasn't", &["was", "not"]),
    ("weren't", &["were", "not"]),
    ("hasn't", &["has", "not"]),
    ("haven't", &["have", "not"]),
    ("hadn't", &["had", "not"]),
    ("doesn't", &["does", "not"]),
    ("don't", &["do", "not"]),
    ("didn't", &["did", "not"]),
    ("won't", &["will", "not"]),
    ("can't", &["can", "not"]),
    ("couldn't", &["could", "not"]),
    ("shouldn't", &["should", "not"]),
    ("wouldn't", &["would", "not"]),
    ("mustn't", &["must", "not"]),
    ("i'm", &["i", "am"]),
    ("you're", &["you", "are"]),
    ("we're", &["we", "are"]),
    ("they're", &["they", "are"]),
    ("i've", &["i", "have"]),
    ("you've", &["you", "have"]),
    ("we've", &["we", "have"]),
    ("they've", &["they", "have"]),
    ("i'll", &["i", "will"]),
    ("you'll", &["you", "will"]),
    ("we'll", &["we", "will"]),
    ("they'll", &["they", "will"]),
    ("i'd", &["i", "would"]),
    ("you'd", &["you", "would"]),
    ("we'd", &["we", "would"]),
    ("they'd", &["they", "would"]),
    ("let's", &["let", "us"]),
];

/// Set-backed lookups over the word class tables
pub struct Lexicon {
    adverbs: HashSet<&'static str>,
    ly_non_adverbs: HashSet<&'static str>,
    determiners: HashSet<&'static str>,
    prepositions: HashSet<&'static str>,
    conjunctions: HashSet<&'static str>,
    pronouns: HashSet<&'static str>,
    auxiliaries: HashSet<&'static str>,
    contractions: HashMap<&'static str, &'static [&'static str]>,
}

static LEXICON: OnceLock<Lexicon> = OnceLock::new();

/// Shared lexicon, built on first use
pub fn lexicon() -> &'static Lexicon {
    LEXICON.get_or_init(Lexicon::new)
}

impl Lexicon {
    pub fn new() -> Self {
        Self {
            adverbs: ADVERBS.iter().copied().collect(),
            ly_non_adverbs: LY_NON_ADVERBS.iter().copied().collect(),
            determiners: DETERMINERS.iter().copied().collect(),
            prepositions: PREPOSITIONS.iter().copied().collect(),
            conjunctions: CONJUNCTIONS.iter().copied().collect(),
            pronouns: PRONOUNS.iter().copied().collect(),
            auxiliaries: AUXILIARIES.iter().copied().collect(),
            contractions: CONTRACTIONS.iter().copied().collect(),
        }
    }

    /// Check if a lowercase word is an adverb, by table or by "-ly" spelling
    pub fn is_adverb(&self, word: &str) -> bool {
        if self.adverbs.contains(word) {
            return true;
        }
        word.len() > 3
            && word.ends_with("ly")
            && word.chars().all(|c| c.is_alphabetic())
            && !self.ly_non_adverbs.contains(word)
    }

    /// Closed-class tags for a lowercase word; open-class words get none
    pub fn word_class_tags(&self, word: &str) -> Vec<Tag> {
        let mut tags = Vec::new();
        if self.is_adverb(word) {
            tags.push(Tag::Adverb);
        }
        if self.determiners.contains(word) {
            tags.push(Tag::Determiner);
        }
        if self.prepositions.contains(word) {
            tags.push(Tag::Preposition);
        }
        if self.conjunctions.contains(word) {
            tags.push(Tag::Conjunction);
        }
        if self.pronouns.contains(word) {
            tags.push(Tag::Pronoun);
        }
        if self.auxiliaries.contains(word) {
            tags.push(Tag::Auxiliary);
        }
        tags
    }

    /// Expand a contracted word into its full words, following the source casing
    pub fn expand_contraction(&self, word: &str) -> Option<Vec<String>> {
        let plain = plain_apostrophes(word);
        let key = plain.to_lowercase();
        let expansion = self.contractions.get(key.as_str())?;

        let letters: Vec<char> = plain.chars().filter(|c| c.is_alphabetic()).collect();
        let shouted = letters.len() > 1 && letters.iter().all(|c| c.is_uppercase());
        let titled = plain.chars().next().is_some_and(char::is_uppercase);

        let words = expansion
            .iter()
            .enumerate()
            .map(|(i, part)| {
                if shouted {
                    part.to_uppercase()
                } else if titled && i == 0 {
                    capitalize(part)
                } else {
                    (*part).to_string()
                }
            })
            .collect();
        Some(words)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

/// Spell every apostrophe in `word` as a plain `'`, including character references
pub fn plain_apostrophes(word: &str) -> String {
    let mut plain = word.replace('\u{2019}', "'");
    if plain.contains('&') {
        for entity in APOSTROPHE_ENTITIES {
            plain = replace_ignore_ascii_case(&plain, entity, "'");
        }
    }
    plain
}

/// Length of the character reference from `entities` that `text` starts with, ignoring ASCII case
pub fn entity_prefix_len(text: &str, entities: &[&str]) -> Option<usize> {
    entities
        .iter()
        .find(|entity| text.get(..entity.len()).is_some_and(|head| head.eq_ignore_ascii_case(entity)))
        .map(|entity| entity.len())
}

fn replace_ignore_ascii_case(text: &str, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while !rest.is_empty() {
        if let Some(len) = entity_prefix_len(rest, &[from]) {
            out.push_str(to);
            rest = &rest[len..];
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
    }
    out
}

/// Uppercase the first character of a word
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adverb_detection() {
        let lex = lexicon();
        for word in ["always", "quickly", "really", "thus", "never"] {
            assert!(lex.is_adverb(word), "Should detect {} as adverb", word);
        }
        for word in ["family", "fly", "smokes", "ly"] {
            assert!(!lex.is_adverb(word), "Should not detect {} as adverb", word);
        }
    }

    #[test]
    fn test_word_class_tags() {
        let lex = lexicon();
        assert!(lex.word_class_tags("the").contains(&Tag::Determiner));
        assert!(lex.word_class_tags("is").contains(&Tag::Auxiliary));
        let that = lex.word_class_tags("that");
        assert!(that.contains(&Tag::Determiner) && that.contains(&Tag::Conjunction));
        assert!(lex.word_class_tags("book").is_empty());
    }

    #[test]
    fn test_contraction_casing() {
        let lex = lexicon();
        assert_eq!(lex.expand_contraction("he's"), Some(vec!["he".to_string(), "is".to_string()]));
        assert_eq!(lex.expand_contraction("She's"), Some(vec!["She".to_string(), "is".to_string()]));
        assert_eq!(lex.expand_contraction("DOESN'T"), Some(vec!["DOES".to_string(), "NOT".to_string()]));
        assert_eq!(lex.expand_contraction("isn\u{2019}t"), Some(vec!["is".to_string(), "not".to_string()]));
        assert_eq!(lex.expand_contraction("John's"), None);
    }

    #[test]
    fn test_contraction_with_apostrophe_reference() {
        let lex = lexicon();
        let he_is = Some(vec!["He".to_string(), "is".to_string()]);
        for word in ["He&rsquo;s", "He&#8217;s", "He&#X2019;s", "He&apos;s", "He&#39;s"] {
            assert_eq!(lex.expand_contraction(word), he_is, "Expansion of {}", word);
        }
        assert_eq!(
            lex.expand_contraction("DOESN&#X2019;T"),
            Some(vec!["DOES".to_string(), "NOT".to_string()])
        );
    }

    #[test]
    fn test_entity_prefix_len() {
        assert_eq!(entity_prefix_len("&nbsp;smokes", SPACE_ENTITIES), Some(6));
        assert_eq!(entity_prefix_len("&#XA0;", SPACE_ENTITIES), Some(6));
        assert_eq!(entity_prefix_len("&amp;", SPACE_ENTITIES), None);
        assert_eq!(entity_prefix_len("&nb", SPACE_ENTITIES), None);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("he or she"), "He or she");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("été"), "Été");
    }
}
