//! Redirect Handling
//!
//! A [`FollowRedirect`](crate::FollowRedirect) consults a [`Policy`] for every
//! response it receives. The policy is made of two parts:
//!
//! - [`RedirectRules`], a table from status code to a [`Transform`] that
//!   decides the method and body of the next hop. Codes missing from the
//!   table are not followed.
//! - a [`HeaderFilter`] that names the headers to drop before the next hop.
//!
//! By default, 301, 302 and 303 turn any method other than `GET` or `HEAD`
//! into a `GET` with an empty body, 307 and 308 keep both, and the
//! `Authorization` header is dropped when the redirect leaves the host.
//! There is no limit on the number of hops unless one is set with
//! [`Policy::limited`] or [`Policy::max_redirects`].

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};

use crate::body::BodyProducer;
use crate::header::{
    HeaderList, AUTHORIZATION, COOKIE, COOKIE2, PROXY_AUTHORIZATION, WWW_AUTHENTICATE,
};
use crate::util;

/// A type that controls the policy on how to handle the following of redirects.
///
/// A `Policy` is built once and shared, read-only, by every request sent
/// through the wrapper that owns it.
///
/// - `default` follows 301, 302, 303, 307 and 308 without a hop limit.
/// - `limited` is the same, but fails once a chain exceeds `max` hops.
/// - `none` follows nothing.
#[derive(Clone)]
pub struct Policy {
    rules: RedirectRules,
    headers: HeaderFilter,
    max_redirects: Option<usize>,
}

impl Policy {
    /// Create a `Policy` with a maximum number of redirects.
    ///
    /// An `Error` will be returned if the max is reached.
    pub fn limited(max: usize) -> Self {
        Policy::default().max_redirects(Some(max))
    }

    /// Create a `Policy` that does not follow any redirect.
    pub fn none() -> Self {
        Policy::default().redirects(RedirectRules::new())
    }

    /// Replace the whole status code table.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use redirectable::redirect::{Policy, RedirectRules, Transform};
    /// # use http::StatusCode;
    /// // only follow 308, and keep everything as is
    /// let rules = [(StatusCode::PERMANENT_REDIRECT, Transform::identity())]
    ///     .into_iter()
    ///     .collect::<RedirectRules>();
    /// let policy = Policy::default().redirects(rules);
    /// # drop(policy);
    /// ```
    pub fn redirects(mut self, rules: RedirectRules) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the header filter.
    pub fn headers(mut self, filter: HeaderFilter) -> Self {
        self.headers = filter;
        self
    }

    /// Set the maximum number of redirects to follow in a single chain.
    ///
    /// `None` removes the limit.
    pub fn max_redirects(mut self, max: Option<usize>) -> Self {
        self.max_redirects = max;
        self
    }

    /// Get the status code table.
    pub fn rules(&self) -> &RedirectRules {
        &self.rules
    }

    /// Get the header filter.
    pub fn header_filter(&self) -> &HeaderFilter {
        &self.headers
    }

    /// Get the maximum number of redirects, if any.
    pub fn max(&self) -> Option<usize> {
        self.max_redirects
    }

    pub(crate) fn rule(&self, status: StatusCode) -> Option<&Transform> {
        self.rules.get(status)
    }

    pub(crate) fn exceeded(&self, hops: usize) -> bool {
        matches!(self.max_redirects, Some(max) if hops >= max)
    }
}

impl Default for Policy {
    fn default() -> Policy {
        Policy {
            rules: RedirectRules::default(),
            headers: HeaderFilter::default(),
            max_redirects: None,
        }
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Policy")
            .field("rules", &self.rules)
            .field("headers", &self.headers)
            .field("max_redirects", &self.max_redirects)
            .finish()
    }
}

/// Rewrites the method and body for the next hop of a redirect.
#[derive(Clone)]
pub struct Transform {
    inner: TransformKind,
}

#[derive(Clone)]
enum TransformKind {
    Identity,
    SeeOther,
    Custom(Arc<dyn Fn(Method, BodyProducer) -> (Method, BodyProducer) + Send + Sync>),
}

impl Transform {
    /// Keep the method and body unchanged.
    pub fn identity() -> Transform {
        Transform {
            inner: TransformKind::Identity,
        }
    }

    /// Keep `GET` and `HEAD` unchanged; turn every other method into a `GET`
    /// with an empty body.
    pub fn see_other() -> Transform {
        Transform {
            inner: TransformKind::SeeOther,
        }
    }

    /// Create a transform from a function.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use redirectable::redirect::Transform;
    /// # use redirectable::BodyProducer;
    /// # use http::Method;
    /// // turn everything into a body-less HEAD
    /// let head = Transform::custom(|_method, _body| (Method::HEAD, BodyProducer::empty()));
    /// # drop(head);
    /// ```
    pub fn custom<F>(f: F) -> Transform
    where
        F: Fn(Method, BodyProducer) -> (Method, BodyProducer) + Send + Sync + 'static,
    {
        Transform {
            inner: TransformKind::Custom(Arc::new(f)),
        }
    }

    /// Apply this transform to the method and body of the current hop.
    pub fn apply(&self, method: Method, body: BodyProducer) -> (Method, BodyProducer) {
        match self.inner {
            TransformKind::Identity => (method, body),
            TransformKind::SeeOther => {
                if method == Method::GET || method == Method::HEAD {
                    (method, body)
                } else {
                    (Method::GET, BodyProducer::empty())
                }
            }
            TransformKind::Custom(ref f) => f(method, body),
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.inner {
            TransformKind::Identity => f.pad("Identity"),
            TransformKind::SeeOther => f.pad("SeeOther"),
            TransformKind::Custom(..) => f.pad("Custom"),
        }
    }
}

/// An ordered table from status code to [`Transform`].
///
/// Lookups match the exact code. Inserting a code that is already present
/// replaces its transform and keeps its position.
#[derive(Clone)]
pub struct RedirectRules {
    entries: Vec<(StatusCode, Transform)>,
}

impl RedirectRules {
    /// Create an empty table, following no redirect at all.
    pub fn new() -> RedirectRules {
        RedirectRules {
            entries: Vec::new(),
        }
    }

    /// Insert a rule, returning the transform it replaced.
    pub fn insert(&mut self, status: StatusCode, transform: Transform) -> Option<Transform> {
        match self.entries.iter_mut().find(|(code, _)| *code == status) {
            Some((_, existing)) => Some(std::mem::replace(existing, transform)),
            None => {
                self.entries.push((status, transform));
                None
            }
        }
    }

    /// Insert a rule and return the table, for chaining.
    pub fn with(mut self, status: StatusCode, transform: Transform) -> RedirectRules {
        self.insert(status, transform);
        self
    }

    /// Remove the rule for `status`.
    pub fn remove(&mut self, status: StatusCode) -> Option<Transform> {
        let idx = self.entries.iter().position(|(code, _)| *code == status)?;
        Some(self.entries.remove(idx).1)
    }

    /// Get the rule for `status`.
    pub fn get(&self, status: StatusCode) -> Option<&Transform> {
        self.entries
            .iter()
            .find(|(code, _)| *code == status)
            .map(|(_, transform)| transform)
    }

    /// Returns true if `status` will be followed.
    pub fn contains(&self, status: StatusCode) -> bool {
        self.get(status).is_some()
    }

    /// The status codes in the table, in insertion order.
    pub fn codes(&self) -> impl Iterator<Item = StatusCode> + '_ {
        self.entries.iter().map(|(code, _)| *code)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table follows nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RedirectRules {
    fn default() -> RedirectRules {
        RedirectRules::new()
            .with(StatusCode::MOVED_PERMANENTLY, Transform::see_other())
            .with(StatusCode::FOUND, Transform::see_other())
            .with(StatusCode::SEE_OTHER, Transform::see_other())
            .with(StatusCode::TEMPORARY_REDIRECT, Transform::identity())
            .with(StatusCode::PERMANENT_REDIRECT, Transform::identity())
    }
}

impl FromIterator<(StatusCode, Transform)> for RedirectRules {
    fn from_iter<I: IntoIterator<Item = (StatusCode, Transform)>>(iter: I) -> Self {
        let mut rules = RedirectRules::new();
        for (status, transform) in iter {
            rules.insert(status, transform);
        }
        rules
    }
}

impl fmt::Debug for RedirectRules {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(code, t)| (code.as_u16(), t)))
            .finish()
    }
}

/// Decides which request headers are not carried over to the next hop.
#[derive(Clone)]
pub struct HeaderFilter {
    inner: FilterKind,
}

type FilterFn = dyn Fn(&str, &HeaderList, &str, &HeaderList) -> Vec<Bytes> + Send + Sync;

#[derive(Clone)]
enum FilterKind {
    CrossHost(&'static [&'static str]),
    Custom(Arc<FilterFn>),
}

const CREDENTIALS: &[&str] = &[AUTHORIZATION];
const SENSITIVE: &[&str] = &[
    AUTHORIZATION,
    COOKIE,
    COOKIE2,
    PROXY_AUTHORIZATION,
    WWW_AUTHENTICATE,
];

impl HeaderFilter {
    /// Drop `Authorization`, `Cookie`, `Cookie2`, `Proxy-Authorization` and
    /// `WWW-Authenticate` when the redirect goes to another host.
    pub fn sensitive() -> HeaderFilter {
        HeaderFilter {
            inner: FilterKind::CrossHost(SENSITIVE),
        }
    }

    /// Never drop anything.
    pub fn none() -> HeaderFilter {
        HeaderFilter {
            inner: FilterKind::CrossHost(&[]),
        }
    }

    /// Create a filter from a function.
    ///
    /// The function receives the current request url and headers, then the
    /// redirect target url and the headers of the redirect response, and
    /// returns the names to drop.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use redirectable::redirect::HeaderFilter;
    /// # use bytes::Bytes;
    /// // never forward an api key
    /// let filter = HeaderFilter::custom(|_url, _headers, _next, _res_headers| {
    ///     vec![Bytes::from_static(b"x-api-key")]
    /// });
    /// # drop(filter);
    /// ```
    pub fn custom<F>(f: F) -> HeaderFilter
    where
        F: Fn(&str, &HeaderList, &str, &HeaderList) -> Vec<Bytes> + Send + Sync + 'static,
    {
        HeaderFilter {
            inner: FilterKind::Custom(Arc::new(f)),
        }
    }

    /// Names of the headers to leave out of the next hop.
    pub fn excluded(
        &self,
        request_url: &str,
        request_headers: &HeaderList,
        redirect_url: &str,
        redirect_headers: &HeaderList,
    ) -> Vec<Bytes> {
        match self.inner {
            FilterKind::CrossHost(names) => {
                if names.is_empty() || util::same_host(request_url, redirect_url) {
                    Vec::new()
                } else {
                    names.iter().map(|&n| Bytes::from_static(n.as_bytes())).collect()
                }
            }
            FilterKind::Custom(ref f) => {
                f(request_url, request_headers, redirect_url, redirect_headers)
            }
        }
    }
}

impl Default for HeaderFilter {
    /// Drop `Authorization` when the redirect goes to another host.
    fn default() -> HeaderFilter {
        HeaderFilter {
            inner: FilterKind::CrossHost(CREDENTIALS),
        }
    }
}

impl fmt::Debug for HeaderFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.inner {
            FilterKind::CrossHost(names) => f.debug_tuple("CrossHost").field(&names).finish(),
            FilterKind::Custom(..) => f.pad("Custom"),
        }
    }
}

#[test]
fn test_default_rules() {
    let rules = RedirectRules::default();
    let codes = rules.codes().map(|c| c.as_u16()).collect::<Vec<_>>();
    assert_eq!(codes, vec![301, 302, 303, 307, 308]);

    for code in [300, 304, 305, 306, 309, 200, 404, 500] {
        let status = StatusCode::from_u16(code).unwrap();
        assert!(!rules.contains(status), "{code} should not be followed");
    }
}

#[test]
fn test_see_other_keeps_safe_methods() {
    let transform = Transform::see_other();
    for method in [Method::GET, Method::HEAD] {
        let body = BodyProducer::from("abc");
        let (next, next_body) = transform.apply(method.clone(), body.clone());
        assert_eq!(next, method);
        assert!(BodyProducer::ptr_eq(&body, &next_body));
    }
}

#[test]
fn test_see_other_downgrades_unsafe_methods() {
    let transform = Transform::see_other();
    for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
        let body = BodyProducer::from("abc");
        let (next, next_body) = transform.apply(method, body.clone());
        assert_eq!(next, Method::GET);
        assert!(!BodyProducer::ptr_eq(&body, &next_body));
        assert_eq!(next_body.produce().as_bytes(), Some(&b""[..]));
    }
}

#[test]
fn test_identity_keeps_everything() {
    let rules = RedirectRules::default();
    for code in [StatusCode::TEMPORARY_REDIRECT, StatusCode::PERMANENT_REDIRECT] {
        let body = BodyProducer::from("abc");
        let (next, next_body) = rules.get(code).unwrap().apply(Method::PUT, body.clone());
        assert_eq!(next, Method::PUT);
        assert!(BodyProducer::ptr_eq(&body, &next_body));
    }
}

#[test]
fn test_insert_replaces_in_place() {
    let mut rules = RedirectRules::default();
    let replaced = rules.insert(StatusCode::FOUND, Transform::identity());
    assert!(replaced.is_some());
    assert_eq!(rules.len(), 5);
    assert_eq!(rules.codes().nth(1), Some(StatusCode::FOUND));

    let (method, _) = rules
        .get(StatusCode::FOUND)
        .unwrap()
        .apply(Method::POST, BodyProducer::empty());
    assert_eq!(method, Method::POST);

    assert!(rules.remove(StatusCode::FOUND).is_some());
    assert!(!rules.contains(StatusCode::FOUND));
    assert!(rules.remove(StatusCode::FOUND).is_none());
}

#[test]
fn test_rules_from_iter() {
    let rules: RedirectRules = [
        (StatusCode::MULTIPLE_CHOICES, Transform::identity()),
        (StatusCode::MULTIPLE_CHOICES, Transform::see_other()),
    ]
    .into_iter()
    .collect();
    assert_eq!(rules.len(), 1);
    let (method, _) = rules
        .get(StatusCode::MULTIPLE_CHOICES)
        .unwrap()
        .apply(Method::POST, BodyProducer::empty());
    assert_eq!(method, Method::GET);
}

#[test]
fn test_custom_transform() {
    let transform = Transform::custom(|_, body| (Method::HEAD, body));
    let (method, _) = transform.apply(Method::POST, BodyProducer::empty());
    assert_eq!(method, Method::HEAD);
}

#[test]
fn test_default_filter_strips_authorization_cross_host() {
    let filter = HeaderFilter::default();
    let headers = HeaderList::new()
        .with("Accept", "*/*")
        .with("Authorization", "let me in");
    let res = HeaderList::new();

    let excluded = filter.excluded(
        "http://initial-domain.com/path",
        &headers,
        "http://new-domain.com/path",
        &res,
    );
    assert_eq!(excluded, vec![Bytes::from_static(b"authorization")]);
    assert_eq!(
        headers.without(&excluded),
        HeaderList::new().with("Accept", "*/*")
    );
}

#[test]
fn test_default_filter_keeps_same_host() {
    let filter = HeaderFilter::default();
    let headers = HeaderList::new().with("Authorization", "let me in");

    let excluded = filter.excluded(
        "http://initial-domain.com/path",
        &headers,
        "https://INITIAL-domain.com:8443/new_path",
        &HeaderList::new(),
    );
    assert!(excluded.is_empty());
}

#[test]
fn test_default_filter_fails_closed() {
    let filter = HeaderFilter::default();
    let excluded = filter.excluded(
        "not a url",
        &HeaderList::new(),
        "not a url",
        &HeaderList::new(),
    );
    assert_eq!(excluded, vec![Bytes::from_static(b"authorization")]);
}

#[test]
fn test_sensitive_filter() {
    let filter = HeaderFilter::sensitive();
    let headers = HeaderList::new()
        .with("Accept", "*/*")
        .with("Authorization", "let me in")
        .with("Cookie", "foo=bar");

    let excluded = filter.excluded(
        "http://initial-domain.com/path",
        &headers,
        "http://new-domain.com/path",
        &HeaderList::new(),
    );
    assert_eq!(
        headers.without(&excluded),
        HeaderList::new().with("Accept", "*/*")
    );

    let excluded = filter.excluded(
        "http://initial-domain.com/path",
        &headers,
        "http://initial-domain.com/new_path",
        &HeaderList::new(),
    );
    assert!(excluded.is_empty());
}

#[test]
fn test_none_filter() {
    let excluded = HeaderFilter::none().excluded(
        "http://a.example/",
        &HeaderList::new(),
        "http://b.example/",
        &HeaderList::new(),
    );
    assert!(excluded.is_empty());
}

#[test]
fn test_custom_filter_sees_response_headers() {
    let filter = HeaderFilter::custom(|_, _, _, res| {
        res.get_all("x-drop").cloned().collect()
    });
    let res = HeaderList::new().with("X-Drop", "Accept");
    let excluded = filter.excluded("http://a/", &HeaderList::new(), "http://a/", &res);
    assert_eq!(excluded, vec![Bytes::from_static(b"Accept")]);
}

#[test]
fn test_redirect_policy_limit() {
    let policy = Policy::limited(2);
    assert!(!policy.exceeded(0));
    assert!(!policy.exceeded(1));
    assert!(policy.exceeded(2));

    let policy = Policy::default();
    assert_eq!(policy.max(), None);
    assert!(!policy.exceeded(usize::MAX));
}

#[test]
fn test_redirect_policy_none() {
    let policy = Policy::none();
    assert!(policy.rules().is_empty());
    assert!(policy.rule(StatusCode::FOUND).is_none());
}
