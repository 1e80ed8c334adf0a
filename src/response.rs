use std::fmt;

use bytes::Bytes;
use http::StatusCode;

use crate::body::Body;
use crate::header::HeaderList;

/// A response returned by the wrapped service.
///
/// The body is read at most once. A response returned from
/// [`FollowRedirect`](crate::FollowRedirect) still has its body unread.
pub struct Response {
    status: StatusCode,
    headers: HeaderList,
    body: Body,
}

impl Response {
    /// Constructs a new response.
    #[inline]
    pub fn new(status: StatusCode, headers: HeaderList, body: impl Into<Body>) -> Response {
        Response {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Get the `StatusCode` of this `Response`.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the `Headers` of this `Response`.
    #[inline]
    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    /// Get a mutable reference to the `Headers` of this `Response`.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderList {
        &mut self.headers
    }

    /// Get a mutable reference to the `Body` of this `Response`.
    #[inline]
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Take the body out of this `Response`.
    #[inline]
    pub fn into_body(self) -> Body {
        self.body
    }

    /// Break the response into its parts.
    pub fn into_parts(self) -> (StatusCode, HeaderList, Body) {
        (self.status, self.headers, self.body)
    }

    /// Get the full response body as `Bytes`.
    pub async fn bytes(self) -> crate::Result<Bytes> {
        self.body.bytes().await
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status())
            .field("headers", self.headers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn response_parts() {
        let res = Response::new(
            StatusCode::FOUND,
            HeaderList::new().with("Location", "/y"),
            "moved",
        );
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers().get("location").unwrap(), "/y");
        assert_eq!(res.bytes().await.unwrap(), "moved");
    }
}
