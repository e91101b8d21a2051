// WHY: Some sites break when their text is rewritten, so they are skipped by host
// An excluded domain also covers all of its subdomains

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Decides whether a host is off limits and why
pub trait DomainOracle {
    fn is_excluded(&self, host: &str) -> bool;

    /// Human-readable reason, `None` when the host is not excluded
    fn why_excluded(&self, host: &str) -> Option<String>;
}

/// One excluded domain and the reason shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedDomain {
    pub domain: String,
    pub reason: String,
}

impl ExcludedDomain {
    pub fn new(domain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            reason: reason.into(),
        }
    }
}

/// Built-in exclusions: pages whose scripts re-render text the rewriter changed
pub fn default_excluded_domains() -> Vec<ExcludedDomain> {
    const DYNAMIC_PAGE: &str = "This site rebuilds its pages continuously, so rewritten text would be overwritten or break the page.";
    ["facebook.com", "messenger.com", "docs.google.com", "mail.google.com"]
        .into_iter()
        .map(|domain| ExcludedDomain::new(domain, DYNAMIC_PAGE))
        .collect()
}

/// Domain exclusion list with subdomain matching
#[derive(Debug, Clone, Default)]
pub struct ExclusionList {
    domains: Vec<ExcludedDomain>,
}

impl ExclusionList {
    pub fn new(domains: Vec<ExcludedDomain>) -> Self {
        let domains = domains
            .into_iter()
            .map(|d| ExcludedDomain {
                domain: normalize_host(&d.domain),
                ..d
            })
            .filter(|d| !d.domain.is_empty())
            .collect();
        Self { domains }
    }

    pub fn standard() -> Self {
        Self::new(default_excluded_domains())
    }

    pub fn domains(&self) -> &[ExcludedDomain] {
        &self.domains
    }

    /// Add or replace the entry for a domain
    pub fn exclude(&mut self, domain: &str, reason: impl Into<String>) {
        let domain = normalize_host(domain);
        if domain.is_empty() {
            return;
        }
        self.domains.retain(|d| d.domain != domain);
        self.domains.push(ExcludedDomain::new(domain, reason));
    }

    /// Turn rewriting back on for a domain; returns whether it had been excluded
    pub fn allow(&mut self, domain: &str) -> bool {
        let domain = normalize_host(domain);
        let before = self.domains.len();
        self.domains.retain(|d| d.domain != domain);
        before != self.domains.len()
    }

    fn lookup(&self, host: &str) -> Option<&ExcludedDomain> {
        let host = normalize_host(host);
        if host.is_empty() {
            return None;
        }
        let found = self.domains.iter().find(|d| {
            host == d.domain
                || host
                    .strip_suffix(d.domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        });
        if let Some(entry) = found {
            debug!("Host {} matched excluded domain {}", host, entry.domain);
        }
        found
    }
}

impl DomainOracle for ExclusionList {
    fn is_excluded(&self, host: &str) -> bool {
        self.lookup(host).is_some()
    }

    fn why_excluded(&self, host: &str) -> Option<String> {
        self.lookup(host).map(|d| d.reason.clone())
    }
}

/// Lowercase host without port, trailing dot or leading "www."
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    let host = host
        .split_once("://")
        .map(|(_, rest)| rest.to_string())
        .unwrap_or(host);
    let host = host.split(['/', ':']).next().unwrap_or_default();
    let host = host.trim_end_matches('.');
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdomains_are_excluded() {
        let list = ExclusionList::standard();
        assert!(list.is_excluded("facebook.com"));
        assert!(list.is_excluded("www.facebook.com"));
        assert!(list.is_excluded("m.facebook.com:443"));
        assert!(list.is_excluded("https://www.facebook.com/some/page"));
        assert!(!list.is_excluded("notfacebook.com"));
        assert!(!list.is_excluded("facebook.com.example.org"));
        assert!(!list.is_excluded("localhost:8080"));
        assert!(!list.is_excluded(""));
    }

    #[test]
    fn test_reasons() {
        let list = ExclusionList::new(vec![ExcludedDomain::new("Example.COM", "Test reason")]);
        assert_eq!(list.why_excluded("blog.example.com").as_deref(), Some("Test reason"));
        assert_eq!(list.why_excluded("example.org"), None);
    }

    #[test]
    fn test_exclude_and_allow() {
        let mut list = ExclusionList::default();
        list.exclude("www.news.example", "Asked by user");
        assert!(list.is_excluded("news.example"));
        assert!(list.allow("news.example"));
        assert!(!list.is_excluded("news.example"));
        assert!(!list.allow("news.example"));
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("WWW.Example.com.:8080"), "example.com");
        assert_eq!(normalize_host("http://localhost:8080/test"), "localhost");
    }
}
