//! Request Classifier
//!
//! Picks the route for an intercepted request from an ordered rule table.
//! The first matching rule wins; a request no rule matches takes the
//! default route.

use axum::http::Method;
use regex::RegexSet;

use crate::cache::FetchRequest;
use crate::error::{CacheError, Result};

/// Schemes a partition cannot store. Requests using them are never intercepted.
pub const BLOCKED_SCHEMES: &[&str] = &[
    "chrome-extension",
    "moz-extension",
    "safari-extension",
    "safari-web-extension",
    "ms-browser-extension",
    "data",
    "blob",
];

/// Path segment marking build-output assets.
pub const STATIC_SEGMENT: &str = "/static/";

/// File extensions served cache-first wherever they live.
pub const STATIC_EXTENSIONS: &[&str] = &[
    "js", "mjs", "css", "png", "jpg", "jpeg", "gif", "svg", "webp", "ico",
];

/// Path segment every API endpoint lives under.
pub const API_SEGMENT: &str = "/api/";

/// API endpoints whose responses may be cached for offline use.
pub const API_PATTERNS: &[&str] = &[r"/api/stats", r"/api/users", r"/api/networks"];

// == Route ==
/// Where a request goes after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted; the request goes straight to the network
    Ignore,
    /// Cache-first against the static partition
    Static,
    /// Network-first against the API partition
    Api,
    /// Network-first without storage
    Default,
}

// == Matcher ==
/// The predicate half of a rule.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// URL scheme is one of the listed schemes
    Scheme(Vec<String>),
    /// Method is anything but GET
    NonGet,
    /// Path contains the segment
    PathSegment(String),
    /// Last path segment ends with one of the extensions (case-insensitive)
    Extension(Vec<String>),
    /// Path contains the segment and matches at least one pattern
    PatternSet { segment: String, patterns: RegexSet },
}

impl Matcher {
    pub fn matches(&self, request: &FetchRequest) -> bool {
        let path = request.url.path();
        match self {
            Matcher::Scheme(schemes) => schemes.iter().any(|s| s == request.url.scheme()),
            Matcher::NonGet => request.method != Method::GET,
            Matcher::PathSegment(segment) => path.contains(segment.as_str()),
            Matcher::Extension(extensions) => {
                let file = path.rsplit('/').next().unwrap_or_default();
                match file.rsplit_once('.') {
                    Some((_, ext)) => extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)),
                    None => false,
                }
            }
            Matcher::PatternSet { segment, patterns } => {
                path.contains(segment.as_str()) && patterns.is_match(path)
            }
        }
    }
}

/// One row of the routing table.
#[derive(Debug, Clone)]
pub struct Rule {
    pub matcher: Matcher,
    pub route: Route,
}

impl Rule {
    pub fn new(matcher: Matcher, route: Route) -> Self {
        Self { matcher, route }
    }
}

// == Classifier ==
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Builds the standard table: ignore, non-GET, static, API.
    pub fn standard() -> Result<Self> {
        let patterns = RegexSet::new(API_PATTERNS)
            .map_err(|e| CacheError::Config(format!("invalid API pattern: {}", e)))?;

        Ok(Self::new(vec![
            Rule::new(Matcher::Scheme(to_owned(BLOCKED_SCHEMES)), Route::Ignore),
            Rule::new(Matcher::NonGet, Route::Default),
            Rule::new(Matcher::PathSegment(STATIC_SEGMENT.to_string()), Route::Static),
            Rule::new(Matcher::Extension(to_owned(STATIC_EXTENSIONS)), Route::Static),
            Rule::new(
                Matcher::PatternSet {
                    segment: API_SEGMENT.to_string(),
                    patterns,
                },
                Route::Api,
            ),
        ]))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the route of the first matching rule, or `Route::Default`.
    pub fn classify(&self, request: &FetchRequest) -> Route {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(request))
            .map_or(Route::Default, |rule| rule.route)
    }

    /// True when the request uses a scheme the strategies must not store.
    pub fn is_ignored(&self, request: &FetchRequest) -> bool {
        self.classify(request) == Route::Ignore
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use url::Url;

    fn classify(method: Method, url: &str) -> Route {
        let classifier = Classifier::standard().unwrap();
        classifier.classify(&FetchRequest::new(method, Url::parse(url).unwrap()))
    }

    fn get(url: &str) -> Route {
        classify(Method::GET, url)
    }

    #[test]
    fn test_blocked_schemes_are_ignored() {
        assert_eq!(get("chrome-extension://abc/script.js"), Route::Ignore);
        assert_eq!(get("moz-extension://abc/static/a.css"), Route::Ignore);
        assert_eq!(get("data:text/plain,hello"), Route::Ignore);
        assert_eq!(get("blob:https://app.test/1234"), Route::Ignore);
    }

    #[test]
    fn test_ignore_beats_non_get() {
        assert_eq!(
            classify(Method::POST, "chrome-extension://abc/api/stats"),
            Route::Ignore
        );
    }

    #[test]
    fn test_static_segment() {
        assert_eq!(get("https://app.test/static/media/logo.abc123"), Route::Static);
    }

    #[test]
    fn test_static_extensions() {
        assert_eq!(get("https://app.test/main.js"), Route::Static);
        assert_eq!(get("https://app.test/styles/app.CSS"), Route::Static);
        assert_eq!(get("https://app.test/favicon.ico"), Route::Static);
        assert_eq!(get("https://app.test/img/banner.webp?v=2"), Route::Static);
    }

    #[test]
    fn test_api_patterns() {
        assert_eq!(get("https://app.test/api/stats"), Route::Api);
        assert_eq!(get("https://app.test/api/users/42"), Route::Api);
        assert_eq!(get("https://app.test/api/networks?page=3"), Route::Api);
    }

    #[test]
    fn test_unlisted_api_is_default() {
        assert_eq!(get("https://app.test/api/auth/login"), Route::Default);
        assert_eq!(get("https://app.test/api/services"), Route::Default);
    }

    #[test]
    fn test_non_get_is_default() {
        assert_eq!(classify(Method::POST, "https://app.test/api/users"), Route::Default);
        assert_eq!(classify(Method::PUT, "https://app.test/static/a.js"), Route::Default);
        assert_eq!(classify(Method::DELETE, "https://app.test/api/networks/1"), Route::Default);
    }

    #[test]
    fn test_static_beats_api() {
        assert_eq!(get("https://app.test/api/stats/static/chart.js"), Route::Static);
        assert_eq!(get("https://app.test/api/users/avatar.png"), Route::Static);
    }

    #[test]
    fn test_documents_are_default() {
        assert_eq!(get("https://app.test/"), Route::Default);
        assert_eq!(get("https://app.test/members"), Route::Default);
        assert_eq!(get("https://app.test/index.html"), Route::Default);
    }

    #[test]
    fn test_custom_table_is_ordered() {
        let classifier = Classifier::new(vec![
            Rule::new(Matcher::PathSegment("/reports/".to_string()), Route::Api),
            Rule::new(Matcher::Extension(vec!["pdf".to_string()]), Route::Static),
        ]);
        let request = FetchRequest::get(Url::parse("https://app.test/reports/q1.pdf").unwrap());

        assert_eq!(classifier.classify(&request), Route::Api);
        assert_eq!(classifier.rules().len(), 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        // Blocked schemes are ignored whatever the method or path.
        #[test]
        fn prop_blocked_schemes_always_ignored(
            scheme in prop::sample::select(vec!["chrome-extension", "moz-extension", "safari-extension"]),
            path in "[a-z]{1,8}(/[a-z]{1,8}){0,3}(\\.js|\\.css|)",
            post in any::<bool>(),
        ) {
            let url = Url::parse(&format!("{}://ext/{}", scheme, path)).unwrap();
            let method = if post { Method::POST } else { Method::GET };
            prop_assert_eq!(
                Classifier::standard().unwrap().classify(&FetchRequest::new(method, url)),
                Route::Ignore
            );
        }

        // Non-GET requests over http(s) never reach a caching route.
        #[test]
        fn prop_non_get_never_cached(
            path in "(api/|static/)?[a-z]{1,8}(\\.js|\\.png|)",
            method in prop::sample::select(vec![Method::POST, Method::PUT, Method::PATCH, Method::DELETE]),
        ) {
            let url = Url::parse(&format!("https://app.test/{}", path)).unwrap();
            prop_assert_eq!(
                Classifier::standard().unwrap().classify(&FetchRequest::new(method, url)),
                Route::Default
            );
        }
    }
}
