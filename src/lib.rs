#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(test, deny(warnings))]

//! # redirectable
//!
//! The `redirectable` crate adds HTTP redirect following to any asynchronous
//! request function.
//!
//! The request function is a [`Service`](tower_service::Service) that sends
//! one [`Request`] and returns one [`Response`]: a status code, headers, and
//! a streamed body. Wrapping it in a [`FollowRedirect`] gives a service with
//! exactly the same contract, which additionally:
//!
//! - follows 301, 302, 303, 307 and 308 responses, resolving relative
//!   `Location` values against the current url,
//! - turns a `POST` (or any method other than `GET` and `HEAD`) into a
//!   body-less `GET` on 301, 302 and 303, and keeps method and body on 307
//!   and 308,
//! - drops the `Authorization` header when a redirect leaves the host.
//!
//! All of this is configurable through a [`redirect::Policy`].
//!
//! ## Wrapping a request function
//!
//! ```
//! # use redirectable::{Request, Response, HeaderList};
//! # use http::{Method, StatusCode};
//! # use tower::{service_fn, ServiceExt};
//! # async fn run() -> redirectable::Result<()> {
//! // any transport will do; this one redirects once
//! let transport = service_fn(|req: Request| async move {
//!     let res = match req.url() {
//!         "https://a.example/x" => Response::new(
//!             StatusCode::FOUND,
//!             HeaderList::new().with("Location", "/y"),
//!             "",
//!         ),
//!         _ => Response::new(StatusCode::OK, HeaderList::new(), "done"),
//!     };
//!     Ok::<_, std::io::Error>(res)
//! });
//!
//! let res = redirectable::redirectable(transport)
//!     .oneshot(Request::new(Method::GET, "https://a.example/x"))
//!     .await?;
//!
//! assert_eq!(res.status(), StatusCode::OK);
//! assert_eq!(res.bytes().await?, "done");
//! # Ok(())
//! # }
//! ```
//!
//! ## Request bodies
//!
//! A request carries a [`BodyProducer`], not a body. The wrapped service
//! calls the producer to get a fresh [`Body`] each time it sends the request,
//! so a body kept across a 307 or 308 is produced again rather than
//! buffered.
//!
//! ## Redirect chains
//!
//! By default there is no limit on how many redirects are followed. Use
//! [`redirect::Policy::limited`] to fail with an [`Error`] once a chain
//! grows too long.

pub use http::{Method, StatusCode};
pub use url::Url;

pub use self::body::{Body, BodyProducer};
pub use self::error::{Error, Result};
pub use self::follow::{FollowRedirect, FollowRedirectLayer, Pending};
pub use self::header::HeaderList;
pub use self::request::Request;
pub use self::response::Response;

mod body;
mod error;
mod follow;
pub mod header;
pub mod redirect;
mod request;
mod response;
mod util;

/// Wrap a request service so that it follows redirects with the default
/// [`redirect::Policy`].
///
/// This is a shortcut for [`FollowRedirect::new`].
pub fn redirectable<S>(inner: S) -> FollowRedirect<S> {
    FollowRedirect::new(inner)
}

fn _assert_impls() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    fn assert_clone<T: Clone>() {}

    assert_send::<Request>();
    assert_sync::<Request>();
    assert_clone::<Request>();

    assert_send::<Response>();
    assert_send::<Body>();

    assert_send::<redirect::Policy>();
    assert_sync::<redirect::Policy>();
    assert_clone::<redirect::Policy>();

    assert_send::<Pending>();

    assert_send::<Error>();
    assert_sync::<Error>();
}
