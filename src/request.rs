use std::fmt;

use http::Method;

use crate::body::BodyProducer;
use crate::header::HeaderList;

/// A request handed to the wrapped service.
///
/// The body is carried as a [`BodyProducer`] rather than a stream, so the
/// same request description can be sent again on a later hop. Cloning a
/// `Request` never calls the producer.
#[derive(Clone)]
pub struct Request {
    method: Method,
    url: String,
    headers: HeaderList,
    body: BodyProducer,
}

impl Request {
    /// Constructs a new request with no headers and an empty body.
    #[inline]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Request {
            method,
            url: url.into(),
            headers: HeaderList::new(),
            body: BodyProducer::empty(),
        }
    }

    /// Replace the headers, returning the request.
    #[inline]
    pub fn with_headers(mut self, headers: HeaderList) -> Self {
        self.headers = headers;
        self
    }

    /// Replace the body producer, returning the request.
    #[inline]
    pub fn with_body(mut self, body: impl Into<BodyProducer>) -> Self {
        self.body = body.into();
        self
    }

    /// Get the method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get a mutable reference to the method.
    #[inline]
    pub fn method_mut(&mut self) -> &mut Method {
        &mut self.method
    }

    /// Get the url.
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get a mutable reference to the url.
    #[inline]
    pub fn url_mut(&mut self) -> &mut String {
        &mut self.url
    }

    /// Get the headers.
    #[inline]
    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    /// Get a mutable reference to the headers.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderList {
        &mut self.headers
    }

    /// Get the body producer.
    #[inline]
    pub fn body(&self) -> &BodyProducer {
        &self.body
    }

    /// Get a mutable reference to the body producer.
    #[inline]
    pub fn body_mut(&mut self) -> &mut BodyProducer {
        &mut self.body
    }

    /// Break the request into its parts.
    pub fn into_parts(self) -> (Method, String, HeaderList, BodyProducer) {
        (self.method, self.url, self.headers, self.body)
    }

    /// Build a request from its parts.
    pub fn from_parts(
        method: Method,
        url: String,
        headers: HeaderList,
        body: BodyProducer,
    ) -> Request {
        Request {
            method,
            url,
            headers,
            body,
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_request_parts() {
        let body = BodyProducer::from("Hello");
        let req = Request::new(Method::POST, "https://a.example/upload")
            .with_headers(HeaderList::new().with("Authorization", "the-key"))
            .with_body(body.clone());

        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.url(), "https://a.example/upload");
        assert_eq!(req.headers().get("authorization").unwrap(), "the-key");
        assert!(BodyProducer::ptr_eq(req.body(), &body));

        let (method, url, headers, producer) = req.clone().into_parts();
        let rebuilt = Request::from_parts(method, url, headers, producer);
        assert_eq!(rebuilt.url(), req.url());
        assert!(BodyProducer::ptr_eq(rebuilt.body(), req.body()));
    }

    #[test]
    fn debug_hides_body() {
        let req = Request::new(Method::GET, "http://a.example/");
        let s = format!("{req:?}");
        assert!(s.starts_with("Request { method: GET, url: \"http://a.example/\""));
    }
}
