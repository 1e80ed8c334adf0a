use std::error::Error as StdError;
use std::fmt;

use url::Url;

/// A `Result` alias where the `Err` case is `redirectable::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// The Errors that may occur while following redirects.
///
/// Failures of the wrapped service are reported with [`Error::is_transport`]
/// and carry the original error as their [`source`](StdError::source).
pub struct Error {
    inner: Box<Inner>,
}

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
    url: Option<Url>,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                source: source.map(Into::into),
                url: None,
            }),
        }
    }

    /// Returns a possible URL related to this error.
    ///
    /// For redirect errors this is the location that was not followed.
    pub fn url(&self) -> Option<&Url> {
        self.inner.url.as_ref()
    }

    /// Returns a mutable reference to the URL related to this error.
    pub fn url_mut(&mut self) -> Option<&mut Url> {
        self.inner.url.as_mut()
    }

    /// Add a url related to this error (overwriting any existing).
    pub fn with_url(mut self, url: Url) -> Self {
        self.inner.url = Some(url);
        self
    }

    /// Strip the related url from this error (if, for example, it contains
    /// sensitive information).
    pub fn without_url(mut self) -> Self {
        self.inner.url = None;
        self
    }

    /// Returns true if the wrapped service failed to produce a response.
    pub fn is_transport(&self) -> bool {
        matches!(self.inner.kind, Kind::Transport)
    }

    /// Returns true if the error is from the redirect policy, such as
    /// exceeding a configured maximum number of hops.
    pub fn is_redirect(&self) -> bool {
        matches!(self.inner.kind, Kind::Redirect)
    }

    /// Returns true if the error is related to reading a body.
    pub fn is_body(&self) -> bool {
        matches!(self.inner.kind, Kind::Body)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut builder = f.debug_struct("redirectable::Error");

        builder.field("kind", &self.inner.kind);

        if let Some(ref url) = self.inner.url {
            builder.field("url", &url.as_str());
        }
        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.inner.kind {
            Kind::Transport => f.write_str("error sending request")?,
            Kind::Redirect => f.write_str("error following redirect")?,
            Kind::Body => f.write_str("body error")?,
        }

        if let Some(url) = &self.inner.url {
            write!(f, " for url ({url})")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| &**e as _)
    }
}

#[derive(Debug)]
pub(crate) enum Kind {
    Transport,
    Redirect,
    Body,
}

// constructors

/// Wraps a failure of the inner service.
///
/// An error that is already ours (a wrapper nested in a wrapper) is passed
/// through untouched.
pub(crate) fn transport<E: Into<BoxError>>(e: E) -> Error {
    match e.into().downcast::<Error>() {
        Ok(err) => *err,
        Err(e) => Error::new(Kind::Transport, Some(e)),
    }
}

pub(crate) fn body<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Body, Some(e))
}

pub(crate) fn too_many_redirects(url: Url) -> Error {
    Error::new(Kind::Redirect, Some(TooManyRedirects)).with_url(url)
}

#[derive(Debug)]
pub(crate) struct TooManyRedirects;

impl fmt::Display for TooManyRedirects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("too many redirects")
    }
}

impl StdError for TooManyRedirects {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn test_source_chain() {
        let root = Error::new(Kind::Body, None::<Error>);
        assert!(root.source().is_none());

        let link = body(root);
        assert!(link.source().is_some());
        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn mem_size_of() {
        use std::mem::size_of;
        assert_eq!(size_of::<Error>(), size_of::<usize>());
    }

    #[test]
    fn transport_keeps_original_source() {
        let err = transport(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert!(err.is_transport());
        let io = err
            .source()
            .and_then(|e| e.downcast_ref::<io::Error>())
            .expect("io source");
        assert_eq!(io.kind(), io::ErrorKind::ConnectionRefused);
    }

    #[test]
    fn transport_does_not_nest_own_errors() {
        let url = Url::parse("http://a.example/loop").unwrap();
        let inner = too_many_redirects(url.clone());
        let outer = transport(inner);
        assert!(outer.is_redirect());
        assert!(!outer.is_transport());
        assert_eq!(outer.url(), Some(&url));
    }

    #[test]
    fn too_many_redirects_display() {
        let url = Url::parse("http://a.example/b").unwrap();
        let err = too_many_redirects(url);
        assert_eq!(
            err.to_string(),
            "error following redirect for url (http://a.example/b)"
        );
        assert!(err.source().unwrap().is::<TooManyRedirects>());
        assert_eq!(err.without_url().to_string(), "error following redirect");
    }
}
