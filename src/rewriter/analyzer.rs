// WHY: Linguistic backend seam for the rewriting engine
// The engine only sees Document/Token/Match, so any tagger producing them can be swapped in

use anyhow::Result;
use tracing::debug;

use super::lexicon::{entity_prefix_len, lexicon, APOSTROPHE_ENTITIES, SPACE_ENTITIES};

/// Upper bound on text handed to the lexicon analyzer in one call
pub const DEFAULT_MAX_TEXT_LEN: usize = 1 << 20;

/// Annotation attached to a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Initialism such as "NASA" or "U.S.A."
    Acronym,
    Adverb,
    Determiner,
    Preposition,
    Conjunction,
    Pronoun,
    Auxiliary,
    /// Text written by a substitution; never re-matched as a word
    Substituted,
}

/// A word plus the separator text that follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    text: String,
    post: String,
    tags: Vec<Tag>,
}

impl Token {
    pub fn new(text: impl Into<String>, post: impl Into<String>, tags: Vec<Tag>) -> Self {
        Self {
            text: text.into(),
            post: post.into(),
            tags,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Separator text (whitespace, punctuation) between this token and the next
    pub fn post(&self) -> &str {
        &self.post
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_acronym(&self) -> bool {
        self.has_tag(Tag::Acronym)
    }

    /// Nouns, adjectives, main verbs and numbers: no closed-class tag at all
    pub fn is_open_class(&self) -> bool {
        self.tags.iter().all(|tag| *tag == Tag::Acronym)
    }

    /// True when only whitespace, literal or `&nbsp;`-style, separates this token from the next one
    pub fn is_followed_by_space(&self) -> bool {
        !self.post.is_empty() && is_space_separator(&self.post)
    }

    /// Case-insensitive comparison against an already lowercased word
    pub fn is_word(&self, lowercase_word: &str) -> bool {
        !self.has_tag(Tag::Substituted)
            && self.text.chars().flat_map(char::to_lowercase).eq(lowercase_word.chars())
    }
}

/// A located phrase occurrence: token span plus the literal text it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub len: usize,
    pub surface: String,
}

impl Match {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn starts_uppercase(&self) -> bool {
        self.surface.chars().next().is_some_and(char::is_uppercase)
    }
}

/// Annotated text: leading separator followed by tokens
/// Rendering an unmodified document reproduces its source text exactly
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    leading: String,
    tokens: Vec<Token>,
}

impl Document {
    pub fn from_tokens(leading: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            leading: leading.into(),
            tokens,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Check if the lowercase `words` occur at `start`, joined only by whitespace
    pub fn matches_at<S: AsRef<str>>(&self, start: usize, words: &[S]) -> bool {
        if words.is_empty() || start + words.len() > self.tokens.len() {
            return false;
        }
        words.iter().enumerate().all(|(offset, word)| {
            let token = &self.tokens[start + offset];
            let joined = offset + 1 == words.len() || token.is_followed_by_space();
            joined && token.is_word(word.as_ref())
        })
    }

    /// Cheap existence check for a phrase
    pub fn has(&self, phrase: &str) -> bool {
        let words = phrase_words(phrase);
        (0..self.tokens.len()).any(|start| self.matches_at(start, &words))
    }

    /// All non-overlapping occurrences of a phrase, left to right
    pub fn find(&self, phrase: &str) -> Vec<Match> {
        let words = phrase_words(phrase);
        let mut matches = Vec::new();
        let mut start = 0;
        while start < self.tokens.len() {
            if self.matches_at(start, &words) {
                if let Some(found) = self.span(start, words.len()) {
                    matches.push(found);
                }
                start += words.len();
            } else {
                start += 1;
            }
        }
        matches
    }

    /// Build a match over an arbitrary token span
    pub fn span(&self, start: usize, len: usize) -> Option<Match> {
        if len == 0 || start + len > self.tokens.len() {
            return None;
        }
        let mut surface = String::new();
        for (offset, token) in self.tokens[start..start + len].iter().enumerate() {
            surface.push_str(&token.text);
            if offset + 1 < len {
                surface.push_str(&token.post);
            }
        }
        Some(Match { start, len, surface })
    }

    /// Check if any token of the match is an acronym
    pub fn is_acronym_span(&self, found: &Match) -> bool {
        self.tokens
            .get(found.start..found.end())
            .is_some_and(|tokens| tokens.iter().any(Token::is_acronym))
    }

    /// Check if an open-class word directly follows the match
    pub fn next_is_open_class(&self, found: &Match) -> bool {
        let Some(last) = found.end().checked_sub(1).and_then(|i| self.tokens.get(i)) else {
            return false;
        };
        last.is_followed_by_space()
            && self
                .tokens
                .get(found.end())
                .is_some_and(|next| next.is_open_class() && next.text.chars().any(char::is_alphanumeric))
    }

    /// Replace the matched span with one opaque token, keeping the trailing separator
    pub fn replace(&mut self, found: &Match, replacement: &str) {
        let end = found.end();
        if found.len == 0 || end > self.tokens.len() {
            return;
        }
        let post = std::mem::take(&mut self.tokens[end - 1].post);
        let token = Token::new(replacement, post, vec![Tag::Substituted]);
        self.tokens.splice(found.start..end, std::iter::once(token));
    }

    /// Replace the token at `index` with several tokens
    pub fn splice_token(&mut self, index: usize, tokens: Vec<Token>) {
        if index < self.tokens.len() && !tokens.is_empty() {
            self.tokens.splice(index..=index, tokens);
        }
    }

    /// Render back to plain text
    pub fn render(&self) -> String {
        let capacity = self.leading.len()
            + self.tokens.iter().map(|t| t.text.len() + t.post.len()).sum::<usize>();
        let mut out = String::with_capacity(capacity);
        out.push_str(&self.leading);
        for token in &self.tokens {
            out.push_str(&token.text);
            out.push_str(&token.post);
        }
        out
    }
}

/// Lowercase words of a candidate phrase
pub fn phrase_words(phrase: &str) -> Vec<String> {
    phrase.split_whitespace().map(str::to_lowercase).collect()
}

/// Tokenizer and tagger capability consumed by the substitution engine
pub trait Analyzer {
    /// Turn raw text into an annotated document
    fn analyze(&self, text: &str) -> Result<Document>;

    /// Rewrite contracted forms ("he's") into their full words ("he is")
    /// Returns the number of contractions expanded
    fn expand_contractions(&self, doc: &mut Document) -> usize;
}

/// Rule-based analyzer: word splitting plus closed-class lexicon tagging
#[derive(Debug, Clone)]
pub struct LexiconAnalyzer {
    max_text_len: usize,
}

impl LexiconAnalyzer {
    pub fn new() -> Self {
        Self::with_max_text_len(DEFAULT_MAX_TEXT_LEN)
    }

    /// Analyzer that rejects text longer than `max_text_len` bytes
    pub fn with_max_text_len(max_text_len: usize) -> Self {
        Self { max_text_len }
    }

    /// Tags for one word as it appears in text
    pub fn tag_word(word: &str) -> Vec<Tag> {
        let mut tags = Vec::new();
        if is_acronym(word) {
            tags.push(Tag::Acronym);
        }
        tags.extend(lexicon().word_class_tags(&word.to_lowercase()));
        tags
    }
}

impl Default for LexiconAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for LexiconAnalyzer {
    fn analyze(&self, text: &str) -> Result<Document> {
        if text.len() > self.max_text_len {
            anyhow::bail!(
                "Text of {} bytes exceeds analyzer limit of {} bytes",
                text.len(),
                self.max_text_len
            );
        }
        let doc = tokenize(text);
        debug!("Analyzed {} bytes into {} tokens", text.len(), doc.len());
        Ok(doc)
    }

    fn expand_contractions(&self, doc: &mut Document) -> usize {
        let mut expanded = 0;
        // WHY: walk backwards so splicing never shifts indices still to be visited
        for index in (0..doc.len()).rev() {
            let Some(token) = doc.token(index) else {
                continue;
            };
            let Some(words) = lexicon().expand_contraction(token.text()) else {
                continue;
            };
            let last_post = token.post().to_string();
            let count = words.len();
            let tokens = words
                .into_iter()
                .enumerate()
                .map(|(i, word)| {
                    let post = if i + 1 == count { last_post.clone() } else { " ".to_string() };
                    let tags = Self::tag_word(&word);
                    Token::new(word, post, tags)
                })
                .collect();
            doc.splice_token(index, tokens);
            expanded += 1;
        }
        expanded
    }
}

fn is_space_separator(separator: &str) -> bool {
    let mut rest = separator;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return true;
        }
        match entity_prefix_len(rest, SPACE_ENTITIES) {
            Some(len) => rest = &rest[len..],
            None => return false,
        }
    }
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}')
}

/// All-caps word of two or more letters, optionally dotted ("NASA", "U.S.")
fn is_acronym(word: &str) -> bool {
    let mut letters = 0;
    for c in word.chars() {
        if c == '.' {
            continue;
        }
        if !(c.is_alphabetic() && c.is_uppercase()) {
            return false;
        }
        letters += 1;
    }
    letters >= 2
}

/// Length in chars of a dotted initialism ("U.S.A.") starting at `start`, if any
fn scan_initialism(chars: &[(usize, char)], start: usize) -> Option<usize> {
    let mut pos = start;
    let mut letters = 0;
    while pos + 1 < chars.len() && chars[pos].1.is_alphabetic() && chars[pos + 1].1 == '.' {
        letters += 1;
        pos += 2;
    }
    let ends_cleanly = chars.get(pos).map_or(true, |(_, c)| !c.is_alphanumeric());
    (letters >= 2 && ends_cleanly).then_some(pos)
}

/// Chars taken by an apostrophe at `pos`, literal or as a character reference
fn apostrophe_len(text: &str, chars: &[(usize, char)], pos: usize) -> Option<usize> {
    let (byte, c) = *chars.get(pos)?;
    if is_apostrophe(c) {
        return Some(1);
    }
    // WHY: references are ASCII, so their byte length is their char length
    (c == '&').then(|| entity_prefix_len(&text[byte..], APOSTROPHE_ENTITIES)).flatten()
}

/// Chars taken by a character reference ("&amp;", "&#160;") at `pos`
fn reference_len(chars: &[(usize, char)], pos: usize) -> Option<usize> {
    if chars.get(pos)?.1 != '&' {
        return None;
    }
    let mut end = pos + 1;
    if chars.get(end).is_some_and(|(_, c)| *c == '#') {
        end += 1;
    }
    let name_start = end;
    while chars.get(end).is_some_and(|(_, c)| c.is_ascii_alphanumeric()) && end - name_start < 32 {
        end += 1;
    }
    let terminated = chars.get(end).is_some_and(|(_, c)| *c == ';');
    (end > name_start && terminated).then_some(end + 1 - pos)
}

/// End (exclusive char index) of the word starting at `start`
fn scan_word(text: &str, chars: &[(usize, char)], start: usize) -> usize {
    if let Some(end) = scan_initialism(chars, start) {
        return end;
    }
    let mut pos = start + 1;
    while pos < chars.len() {
        if chars[pos].1.is_alphanumeric() {
            pos += 1;
            continue;
        }
        if let Some(len) = apostrophe_len(text, chars, pos) {
            if chars.get(pos + len).is_some_and(|(_, n)| n.is_alphanumeric()) {
                pos += len + 1;
                continue;
            }
        }
        break;
    }
    pos
}

fn tokenize(text: &str) -> Document {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let byte_at = |index: usize| chars.get(index).map_or(text.len(), |(b, _)| *b);
    // Character references between words are separator text, not words
    let next_word = |from: usize| {
        let mut pos = from;
        while pos < chars.len() {
            if chars[pos].1.is_alphanumeric() {
                return pos;
            }
            pos += reference_len(&chars, pos).unwrap_or(1);
        }
        chars.len()
    };

    let first = next_word(0);
    let leading = &text[..byte_at(first)];
    let mut tokens = Vec::new();
    let mut pos = first;

    while pos < chars.len() {
        let end = scan_word(text, &chars, pos);
        let next = next_word(end);
        let word = &text[byte_at(pos)..byte_at(end)];
        let post = &text[byte_at(end)..byte_at(next)];
        tokens.push(Token::new(word, post, LexiconAnalyzer::tag_word(word)));
        pos = next;
    }

    Document::from_tokens(leading, tokens)
}
