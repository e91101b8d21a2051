// WHY: Splits a page body into markup and text segments so rewriting only ever touches text
// Segments concatenate back to the exact input; editability follows the ancestor heuristic

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Elements with no content or closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is text up to the matching close tag, never markup
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Elements whose text is never a rewrite target
const NON_PROSE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

const EDITABLE_ELEMENTS: &[&str] = &["textarea", "input", "form"];

/// Class carried by every highlight and change element a rewrite inserts
const GENERATED_CLASS: &str = "dgtw";

const INVISIBLE_ELEMENTS: &[&str] = &["head", "title", "script", "style", "noscript", "template"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Markup,
    Text,
}

/// A contiguous slice of the page: either markup or the text between tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    kind: SegmentKind,
    content: String,
    editable: bool,
    visible: bool,
    raw: bool,
    generated: bool,
}

impl Segment {
    fn markup(content: &str) -> Self {
        Self {
            kind: SegmentKind::Markup,
            content: content.to_string(),
            editable: false,
            visible: false,
            raw: false,
            generated: false,
        }
    }

    fn text(content: &str, context: Context) -> Self {
        Self {
            kind: SegmentKind::Text,
            content: content.to_string(),
            editable: context.editable,
            visible: !context.hidden,
            raw: context.raw,
            generated: context.generated,
        }
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_text(&self) -> bool {
        self.kind == SegmentKind::Text
    }

    /// Inside a form control or an element marked as an editor
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Text a reader would see rendered
    pub fn is_visible(&self) -> bool {
        self.is_text() && self.visible && !self.raw
    }

    /// Script or style content rather than prose
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// Inside `dgtw` highlight or change markup written by an earlier pass
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    /// Text the rewriter is allowed to change
    pub fn is_rewritable(&self) -> bool {
        self.is_text() && !self.editable && !self.raw && !self.generated
    }
}

/// Outcome of one pass over the page's segments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteSummary {
    /// Segments the pass selected and handed to the rewrite function
    pub examined: usize,
    /// Segments whose text changed
    pub rewritten: usize,
    /// Segments left unchanged because the rewrite function failed
    pub failed: usize,
}

/// A page body as an ordered list of segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    segments: Vec<Segment>,
}

impl Page {
    /// Segment a page body; never fails, malformed markup degrades to text
    pub fn parse(body: &str) -> Self {
        let segments = Parser::new(body).run();
        debug!("Parsed {} bytes into {} segments", body.len(), segments.len());
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Concatenate segments back into a page body
    pub fn render(&self) -> String {
        self.segments.iter().map(|s| s.content.as_str()).collect()
    }

    /// Visible text joined with newlines, for whole-page detection
    pub fn visible_text(&self) -> String {
        self.segments
            .iter()
            .filter(|s| s.is_visible())
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Rewrite every rewritable segment for which `needs` holds
    pub fn rewrite_segments<N, F>(&mut self, needs: N, rewrite: F) -> RewriteSummary
    where
        N: Fn(&str) -> bool,
        F: FnMut(&str) -> Result<String>,
    {
        self.rewrite_where(Segment::is_rewritable, needs, rewrite)
    }

    /// Like `rewrite_segments`, restricted to visible text
    pub fn rewrite_visible_segments<N, F>(&mut self, needs: N, rewrite: F) -> RewriteSummary
    where
        N: Fn(&str) -> bool,
        F: FnMut(&str) -> Result<String>,
    {
        self.rewrite_where(|s| s.is_rewritable() && s.is_visible(), needs, rewrite)
    }

    fn rewrite_where<P, N, F>(&mut self, select: P, needs: N, mut rewrite: F) -> RewriteSummary
    where
        P: Fn(&Segment) -> bool,
        N: Fn(&str) -> bool,
        F: FnMut(&str) -> Result<String>,
    {
        // WHY: targets are fixed before any segment changes, so rewritten text is never revisited
        let targets: Vec<usize> = self
            .segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| select(segment) && needs(&segment.content))
            .map(|(index, _)| index)
            .collect();

        let mut summary = RewriteSummary {
            examined: targets.len(),
            ..RewriteSummary::default()
        };
        for index in targets {
            let segment = &mut self.segments[index];
            match rewrite(&segment.content) {
                Ok(rewritten) => {
                    if rewritten != segment.content {
                        segment.content = rewritten;
                        summary.rewritten += 1;
                    }
                }
                Err(e) => {
                    warn!("Leaving segment {} unchanged: {:#}", index, e);
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}

/// Flags inherited from open ancestors
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    editable: bool,
    hidden: bool,
    raw: bool,
    generated: bool,
}

impl Context {
    fn child(self, name: &str, attributes: &[(String, String)]) -> Self {
        let attribute = |key: &str| attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
        let marked_edit = ["id", "class"]
            .into_iter()
            .any(|key| attribute(key).is_some_and(|v| v.contains("edit")));
        let content_editable = attribute("contenteditable").is_some_and(|v| !v.eq_ignore_ascii_case("false"));
        let styled_hidden = attribute("style").is_some_and(|v| {
            let style: String = v.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_lowercase();
            style.contains("display:none") || style.contains("visibility:hidden")
        });

        Self {
            editable: self.editable || EDITABLE_ELEMENTS.contains(&name) || marked_edit || content_editable,
            hidden: self.hidden
                || INVISIBLE_ELEMENTS.contains(&name)
                || attribute("hidden").is_some()
                || styled_hidden,
            raw: self.raw || NON_PROSE_ELEMENTS.contains(&name),
            generated: self.generated
                || attribute("class").is_some_and(|v| v.split_whitespace().any(|c| c == GENERATED_CLASS)),
        }
    }
}

struct OpenElement {
    name: String,
    context: Context,
}

enum Markup {
    Open {
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    Close {
        name: String,
    },
    Other,
}

struct Parser<'a> {
    src: &'a str,
    segments: Vec<Segment>,
    stack: Vec<OpenElement>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            segments: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn context(&self) -> Context {
        self.stack.last().map(|e| e.context).unwrap_or_default()
    }

    fn push_text(&mut self, text: &str, context: Context) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.segments.last_mut() {
            let same_context = last.is_text()
                && last.editable == context.editable
                && last.visible == !context.hidden
                && last.raw == context.raw
                && last.generated == context.generated;
            if same_context {
                last.content.push_str(text);
                return;
            }
        }
        self.segments.push(Segment::text(text, context));
    }

    fn run(mut self) -> Vec<Segment> {
        let src = self.src;
        let mut pos = 0;
        let mut text_start = 0;

        while let Some(offset) = src[pos..].find('<') {
            let lt = pos + offset;
            let Some((end, markup)) = scan_markup(src, lt) else {
                // A stray '<' is text
                pos = lt + 1;
                continue;
            };

            self.push_text(&src[text_start..lt], self.context());
            self.segments.push(Segment::markup(&src[lt..end]));
            pos = end;

            match markup {
                Markup::Open {
                    name,
                    attributes,
                    self_closing,
                } => {
                    if !self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
                        let context = self.context().child(&name, &attributes);
                        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                            let close = find_close_tag(src, pos, &name).unwrap_or(src.len());
                            self.push_text(&src[pos..close], context);
                            pos = close;
                        }
                        self.stack.push(OpenElement { name, context });
                    }
                }
                Markup::Close { name } => {
                    if let Some(open) = self.stack.iter().rposition(|e| e.name == name) {
                        self.stack.truncate(open);
                    }
                }
                Markup::Other => {}
            }
            text_start = pos;
        }

        self.push_text(&src[text_start..], self.context());
        self.segments
    }
}

/// Recognize markup starting at `lt`; returns its exclusive end
fn scan_markup(src: &str, lt: usize) -> Option<(usize, Markup)> {
    let rest = &src[lt..];
    if let Some(comment) = rest.strip_prefix("<!--") {
        let end = comment.find("-->").map(|i| lt + 4 + i + 3).unwrap_or(src.len());
        return Some((end, Markup::Other));
    }
    if rest.starts_with("<!") || rest.starts_with("<?") {
        let end = rest.find('>').map(|i| lt + i + 1).unwrap_or(src.len());
        return Some((end, Markup::Other));
    }

    let (closing, name_start) = match rest.strip_prefix("</") {
        Some(_) => (true, lt + 2),
        None => (false, lt + 1),
    };
    if !src[name_start..].starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let end = tag_end(src, lt)?;
    let inner = &src[name_start..end - 1];
    let name_len = inner
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(inner.len());
    let name = inner[..name_len].to_ascii_lowercase();

    if closing {
        return Some((end, Markup::Close { name }));
    }
    let attributes = parse_attributes(&inner[name_len..]);
    let self_closing = inner.trim_end().ends_with('/');
    Some((
        end,
        Markup::Open {
            name,
            attributes,
            self_closing,
        },
    ))
}

/// Index just past the '>' closing the tag at `lt`, skipping quoted attribute values
fn tag_end(src: &str, lt: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut previous = ' ';
    for (i, c) in src[lt..].char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if (c == '"' || c == '\'') && previous == '=' => quote = Some(c),
            None if c == '>' => return Some(lt + i + 1),
            None => {}
        }
        if !c.is_whitespace() {
            previous = c;
        }
    }
    None
}

/// Start of the first `</name` at or after `from`, matching the name case-insensitively
fn find_close_tag(src: &str, from: usize, name: &str) -> Option<usize> {
    src[from..]
        .match_indices("</")
        .map(|(i, _)| from + i)
        .find(|&lt| {
            src.get(lt + 2..lt + 2 + name.len())
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name))
        })
}

/// Attribute names lowercased; valueless attributes map to ""
fn parse_attributes(source: &str) -> Vec<(String, String)> {
    let mut attributes = Vec::new();
    let mut rest = source;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
        if rest.is_empty() {
            break;
        }
        let name_len = rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        let name = rest[..name_len].to_ascii_lowercase();
        rest = rest[name_len..].trim_start();

        let mut value = String::new();
        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            match after_eq.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let inner = &after_eq[1..];
                    let close = inner.find(q).unwrap_or(inner.len());
                    value = inner[..close].to_string();
                    rest = inner.get(close + 1..).unwrap_or("");
                }
                _ => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    value = after_eq[..end].to_string();
                    rest = &after_eq[end..];
                }
            }
        }
        if !name.is_empty() {
            attributes.push((name, value));
        }
    }
    attributes
}
