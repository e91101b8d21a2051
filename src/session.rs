// WHY: Decides per page whether to skip, highlight or rewrite, in a fixed priority order
// The original body is captured before anything changes so restore is always exact

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::exclusions::{DomainOracle, ExclusionList};
use crate::highlight::Highlighter;
use crate::page::{Page, RewriteSummary};
use crate::rewriter::{
    IrregularVerbTable, LexiconAnalyzer, PronounRewriter, PronounTable, RewriterConfig,
};

/// Outcome of classifying and processing a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    ExcludedDomain,
    PronounSpecs,
    MentionsGender,
    ReplacedPronouns,
    NoGenderedPronouns,
    RestoredOriginal,
}

/// Which inserted markup `toggle` shows and hides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleTarget {
    Highlights,
    Changes,
}

/// Status as reported to a front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: Status,
    pub is_toggled: bool,
    pub why_excluded: Option<String>,
}

const HIDDEN_CLASS: &str = r#"class="dgtw hide""#;
const SHOWN_CLASS: &str = r#"class="dgtw show""#;

/// Everything needed to process pages, built once and shared by every session
pub struct PageRewriter {
    pronouns: PronounRewriter<LexiconAnalyzer>,
    pronoun_specs: Highlighter,
    gender_terms: Highlighter,
    exclusions: Box<dyn DomainOracle + Send + Sync>,
}

impl PageRewriter {
    pub fn new(
        pronouns: PronounRewriter<LexiconAnalyzer>,
        pronoun_specs: Highlighter,
        gender_terms: Highlighter,
        exclusions: Box<dyn DomainOracle + Send + Sync>,
    ) -> Self {
        Self {
            pronouns,
            pronoun_specs,
            gender_terms,
            exclusions,
        }
    }

    /// Build and validate every table named by the config
    pub fn from_config(config: &Config) -> Result<Self> {
        let pronouns = PronounRewriter::new(
            LexiconAnalyzer::with_max_text_len(config.max_segment_len),
            PronounTable::new(config.pronouns.clone())?,
            IrregularVerbTable::standard()?,
            RewriterConfig {
                expand_contractions: config.expand_contractions,
                mark_changes: config.mark_changes,
            },
        )?;
        let pronoun_specs = Highlighter::for_pronoun_specs(&config.pronoun_spec_patterns)?;
        let gender_terms = Highlighter::for_terms(&config.gender_terms)?;
        let exclusions = ExclusionList::new(config.excluded_domains.clone());

        info!(
            "Page rewriter ready: {} pronouns, {} spec patterns, {} gender terms, {} excluded domains",
            config.pronouns.len(),
            config.pronoun_spec_patterns.len(),
            config.gender_terms.len(),
            exclusions.domains().len()
        );
        Ok(Self::new(pronouns, pronoun_specs, gender_terms, Box::new(exclusions)))
    }

    pub fn with_defaults() -> Result<Self> {
        Self::from_config(&Config::default())
    }

    pub fn pronouns(&self) -> &PronounRewriter<LexiconAnalyzer> {
        &self.pronouns
    }

    /// Classify and process one page body
    pub fn start(&self, host: Option<&str>, body: &str) -> Session<'_> {
        Session::start(self, host, body)
    }
}

/// One page's processing state: the captured original, the current body and its status
pub struct Session<'r> {
    rewriter: &'r PageRewriter,
    host: Option<String>,
    original: String,
    body: String,
    status: Status,
    toggle_target: Option<ToggleTarget>,
    is_toggled: bool,
    summary: RewriteSummary,
}

impl<'r> Session<'r> {
    pub fn start(rewriter: &'r PageRewriter, host: Option<&str>, body: &str) -> Self {
        let mut session = Self {
            rewriter,
            host: host.map(str::to_string),
            original: body.to_string(),
            body: body.to_string(),
            status: Status::NoGenderedPronouns,
            toggle_target: None,
            is_toggled: false,
            summary: RewriteSummary::default(),
        };
        session.classify();
        session
    }

    fn classify(&mut self) {
        let rewriter = self.rewriter;

        if self.host.as_deref().is_some_and(|h| rewriter.exclusions.is_excluded(h)) {
            self.status = Status::ExcludedDomain;
            debug!("Skipping excluded host {:?}", self.host);
            return;
        }

        let mut page = Page::parse(&self.original);

        // WHY: raw body, so specs in attributes (e.g. alt text) still count
        if rewriter.pronoun_specs.matches(&self.original) {
            let specs = &rewriter.pronoun_specs;
            self.summary = page.rewrite_segments(|text| specs.matches(text), |text| Ok(specs.highlight(text)));
            self.finish(page, Status::PronounSpecs, Some(ToggleTarget::Highlights));
            return;
        }

        if rewriter.gender_terms.matches(&page.visible_text()) {
            let terms = &rewriter.gender_terms;
            self.summary =
                page.rewrite_visible_segments(|text| terms.matches(text), |text| Ok(terms.highlight(text)));
            self.finish(page, Status::MentionsGender, Some(ToggleTarget::Highlights));
            return;
        }

        let pronouns = &rewriter.pronouns;
        if pronouns.has_replaceable_pronouns(&self.original) {
            self.summary = page.rewrite_segments(
                |text| pronouns.has_replaceable_pronouns(text),
                |text| pronouns.replace_pronouns(text),
            );
        }
        let body = page.render();
        if body != self.original {
            self.body = body;
            self.status = Status::ReplacedPronouns;
            self.toggle_target = Some(ToggleTarget::Changes);
        } else {
            self.status = Status::NoGenderedPronouns;
        }
    }

    fn finish(&mut self, page: Page, status: Status, toggle_target: Option<ToggleTarget>) {
        self.body = page.render();
        self.status = status;
        self.toggle_target = toggle_target;
        debug!("Page classified as {:?}: {:?}", status, self.summary);
    }

    /// Current page body
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Page body exactly as it was before processing
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_toggled(&self) -> bool {
        self.is_toggled
    }

    pub fn toggle_target(&self) -> Option<ToggleTarget> {
        self.toggle_target
    }

    /// Segment counts from the processing pass
    pub fn summary(&self) -> RewriteSummary {
        self.summary
    }

    pub fn report(&self) -> StatusReport {
        StatusReport {
            status: self.status,
            is_toggled: self.is_toggled,
            why_excluded: self
                .host
                .as_deref()
                .and_then(|h| self.rewriter.exclusions.why_excluded(h)),
        }
    }

    /// Put the original body back verbatim
    pub fn restore(&mut self) {
        self.body.clone_from(&self.original);
        self.status = Status::RestoredOriginal;
        info!("Restored original page content");
    }

    /// Flip inserted markup between hidden and shown; returns how many elements changed
    pub fn toggle(&mut self) -> usize {
        self.is_toggled = !self.is_toggled;
        let (from, to) = if self.is_toggled {
            (HIDDEN_CLASS, SHOWN_CLASS)
        } else {
            (SHOWN_CLASS, HIDDEN_CLASS)
        };
        let flipped = self.body.matches(from).count();
        if flipped > 0 {
            self.body = self.body.replace(from, to);
        }
        debug!("Toggled {} elements, shown = {}", flipped, self.is_toggled);
        flipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter() -> PageRewriter {
        PageRewriter::with_defaults().unwrap()
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let report = StatusReport {
            status: Status::NoGenderedPronouns,
            is_toggled: false,
            why_excluded: None,
        };
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"status":"noGenderedPronouns","isToggled":false,"whyExcluded":null}"#
        );
    }

    #[test]
    fn test_excluded_host_is_untouched() {
        let rewriter = rewriter();
        let session = rewriter.start(Some("www.facebook.com"), "<p>He smokes.</p>");
        assert_eq!(session.status(), Status::ExcludedDomain);
        assert_eq!(session.body(), "<p>He smokes.</p>");
        assert!(session.report().why_excluded.is_some());
    }

    #[test]
    fn test_pronoun_specs_beat_gender_mentions() {
        let rewriter = rewriter();
        let body = "<p>Pronouns: she/her</p><p>I write about gender. He smokes.</p>";
        let session = rewriter.start(None, body);
        assert_eq!(session.status(), Status::PronounSpecs);
        assert!(session.body().contains(r#"<strong class="dgtw hide">she/her</strong>"#));
        assert!(session.body().contains("He smokes."));
    }

    #[test]
    fn test_gender_mentions_only_count_when_visible() {
        let rewriter = rewriter();
        let hidden = rewriter.start(None, "<div hidden>gender</div><p>He smokes.</p>");
        assert_eq!(hidden.status(), Status::ReplacedPronouns);
        assert!(hidden.body().contains("They smoke."));

        let shown = rewriter.start(None, "<p>On gender. He smokes.</p>");
        assert_eq!(shown.status(), Status::MentionsGender);
        assert!(shown.body().contains("He smokes."));
    }

    #[test]
    fn test_no_gendered_pronouns() {
        let rewriter = rewriter();
        let session = rewriter.start(Some("example.com"), "<p>They smoke.</p>");
        assert_eq!(session.status(), Status::NoGenderedPronouns);
        assert_eq!(session.toggle_target(), None);
    }

    #[test]
    fn test_restore_is_exact() {
        let rewriter = rewriter();
        let body = "<html><body>\n<p class=x>He smokes &amp; she doesn't.</p>\n</body></html>";
        let mut session = rewriter.start(None, body);
        assert_eq!(session.status(), Status::ReplacedPronouns);
        assert_ne!(session.body(), body);
        session.restore();
        assert_eq!(session.body(), body);
        assert_eq!(session.status(), Status::RestoredOriginal);
    }

    #[test]
    fn test_toggle_flips_highlight_classes() {
        let rewriter = rewriter();
        let mut session = rewriter.start(None, "<p>(he/him)</p>");
        assert_eq!(session.toggle_target(), Some(ToggleTarget::Highlights));
        assert_eq!(session.toggle(), 1);
        assert!(session.is_toggled());
        assert!(session.body().contains(r#"<strong class="dgtw show">he/him</strong>"#));
        assert_eq!(session.toggle(), 1);
        assert!(!session.is_toggled());
        assert!(session.body().contains(r#"<strong class="dgtw hide">he/him</strong>"#));
    }
}
