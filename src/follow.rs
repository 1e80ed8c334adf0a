//! The redirect-following service.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::{Layer, ServiceExt};
use tower_service::Service;

use crate::error::{self, BoxError};
use crate::header::LOCATION;
use crate::redirect::Policy;
use crate::request::Request;
use crate::response::Response;
use crate::util;

/// Wraps a request service so that it follows redirects.
///
/// `FollowRedirect<S>` accepts the same [`Request`] and returns the same
/// [`Response`] as the service it wraps. Every response whose status code
/// is in the [`Policy`] table, and which carries a usable `Location`, is
/// followed: its body is drained, the method, body and headers of the next
/// hop are derived from the policy, and the inner service is called again.
///
/// Any other response is returned as is, with its body unread. That
/// includes redirect statuses with a missing or unparseable `Location`.
///
/// # Example
///
/// ```
/// # use redirectable::{FollowRedirect, Request, Response, HeaderList};
/// # use http::{Method, StatusCode};
/// # use tower::{service_fn, ServiceExt};
/// # async fn run() -> redirectable::Result<()> {
/// let transport = service_fn(|req: Request| async move {
///     let res = if req.url().ends_with("/old") {
///         Response::new(StatusCode::FOUND, HeaderList::new().with("Location", "/new"), "")
///     } else {
///         Response::new(StatusCode::OK, HeaderList::new(), "hello")
///     };
///     Ok::<_, std::io::Error>(res)
/// });
///
/// let res = FollowRedirect::new(transport)
///     .oneshot(Request::new(Method::GET, "http://example.com/old"))
///     .await?;
/// assert_eq!(res.status(), StatusCode::OK);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FollowRedirect<S> {
    inner: S,
    policy: Arc<Policy>,
}

impl<S> FollowRedirect<S> {
    /// Wrap `inner` with the default [`Policy`].
    pub fn new(inner: S) -> Self {
        FollowRedirect::with_policy(inner, Policy::default())
    }

    /// Wrap `inner` with the given [`Policy`].
    pub fn with_policy(inner: S, policy: Policy) -> Self {
        FollowRedirect {
            inner,
            policy: Arc::new(policy),
        }
    }

    /// Returns a new [`Layer`] that wraps services with a `FollowRedirect`.
    pub fn layer() -> FollowRedirectLayer {
        FollowRedirectLayer::new()
    }

    /// Get the policy in use.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Gets a reference to the underlying service.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Gets a mutable reference to the underlying service.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consumes `self`, returning the underlying service.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Service<Request> for FollowRedirect<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send,
{
    type Response = Response;
    type Error = crate::Error;
    type Future = Pending;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(error::transport)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // take the service that was driven to readiness, leave a fresh clone
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        Pending {
            inner: Box::pin(follow(inner, self.policy.clone(), req)),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for FollowRedirect<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FollowRedirect")
            .field("inner", &self.inner)
            .field("policy", &self.policy)
            .finish()
    }
}

/// A [`Layer`] that wraps services with [`FollowRedirect`].
#[derive(Clone, Debug, Default)]
pub struct FollowRedirectLayer {
    policy: Arc<Policy>,
}

impl FollowRedirectLayer {
    /// Create a layer with the default [`Policy`].
    pub fn new() -> Self {
        FollowRedirectLayer::default()
    }

    /// Create a layer with the given [`Policy`].
    pub fn with_policy(policy: Policy) -> Self {
        FollowRedirectLayer {
            policy: Arc::new(policy),
        }
    }
}

impl<S> Layer<S> for FollowRedirectLayer {
    type Service = FollowRedirect<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FollowRedirect {
            inner,
            policy: self.policy.clone(),
        }
    }
}

/// The future returned by [`FollowRedirect`].
#[must_use = "futures do nothing unless polled"]
pub struct Pending {
    inner: Pin<Box<dyn Future<Output = crate::Result<Response>> + Send>>,
}

impl Future for Pending {
    type Output = crate::Result<Response>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Pending").finish()
    }
}

async fn follow<S>(mut inner: S, policy: Arc<Policy>, mut req: Request) -> crate::Result<Response>
where
    S: Service<Request, Response = Response>,
    S::Error: Into<BoxError>,
{
    let mut hops = 0usize;
    loop {
        log::trace!("{} '{}'", req.method(), req.url());
        let res = inner
            .ready()
            .await
            .map_err(error::transport)?
            .call(req.clone())
            .await
            .map_err(error::transport)?;

        let status = res.status();
        let transform = match policy.rule(status) {
            Some(transform) => transform,
            None => return Ok(res),
        };

        let next_url = match res
            .headers()
            .get(LOCATION)
            .and_then(|loc| util::resolve_location(req.url(), loc))
        {
            Some(url) => url,
            None => {
                log::debug!("{status} from '{}' without a usable Location", req.url());
                return Ok(res);
            }
        };

        if policy.exceeded(hops) {
            log::debug!("redirect limit reached at '{}'", req.url());
            return Err(error::too_many_redirects(next_url));
        }

        let (method, url, headers, body) = req.into_parts();
        let (next_method, next_body) = transform.apply(method, body);
        let excluded =
            policy
                .header_filter()
                .excluded(&url, &headers, next_url.as_str(), res.headers());
        let next_headers = headers.without(&excluded);

        if let Err(e) = res.into_body().drain().await {
            log::debug!("error draining redirect body: {e}");
        }

        log::debug!("redirecting {status} to {next_method} '{next_url}'");
        req = Request::from_parts(next_method, next_url.into(), next_headers, next_body);
        hops += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BodyProducer, HeaderList};
    use http::{Method, StatusCode};
    use std::sync::Mutex;
    use tower::service_fn;

    fn redirect_to(status: StatusCode, location: &'static str) -> Response {
        Response::new(status, HeaderList::new().with("Location", location), "")
    }

    #[tokio::test]
    async fn non_redirect_is_returned_untouched() {
        let svc = service_fn(|_req: Request| async {
            Ok::<_, std::io::Error>(Response::new(StatusCode::NOT_FOUND, HeaderList::new(), "nope"))
        });
        let res = FollowRedirect::new(svc)
            .oneshot(Request::new(Method::GET, "http://a.example/x"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.bytes().await.unwrap(), "nope");
    }

    #[tokio::test]
    async fn follows_relative_location() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let svc = service_fn(move |req: Request| {
            log.lock().unwrap().push(req.url().to_owned());
            async move {
                let res = if req.url() == "https://a.example/x" {
                    redirect_to(StatusCode::FOUND, "/y")
                } else {
                    Response::new(StatusCode::OK, HeaderList::new(), "y")
                };
                Ok::<_, std::io::Error>(res)
            }
        });

        let res = FollowRedirect::new(svc)
            .oneshot(Request::new(Method::GET, "https://a.example/x"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["https://a.example/x", "https://a.example/y"]
        );
    }

    #[tokio::test]
    async fn limit_is_enforced() {
        let svc = service_fn(|req: Request| async move {
            let res = if req.url().ends_with("/a") {
                redirect_to(StatusCode::MOVED_PERMANENTLY, "/b")
            } else {
                redirect_to(StatusCode::MOVED_PERMANENTLY, "/a")
            };
            Ok::<_, std::io::Error>(res)
        });

        let err = FollowRedirect::with_policy(svc, Policy::limited(3))
            .oneshot(Request::new(Method::GET, "http://localhost:8080/a"))
            .await
            .unwrap_err();
        assert!(err.is_redirect());
        // a -> b -> a -> b, then the hop back to a is refused
        assert_eq!(err.url().unwrap().as_str(), "http://localhost:8080/a");
    }

    #[tokio::test]
    async fn layer_shares_policy() {
        let layer = FollowRedirectLayer::with_policy(Policy::none());
        let svc = layer.layer(service_fn(|_req: Request| async {
            Ok::<_, std::io::Error>(redirect_to(StatusCode::FOUND, "/y"))
        }));
        assert!(svc.policy().rules().is_empty());

        let res = svc
            .oneshot(
                Request::new(Method::POST, "http://a.example/x").with_body(BodyProducer::from("b")),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FOUND);
    }
}
