use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::{StreamExt, TryStreamExt};

use crate::error::BoxError;

/// A read-once stream of body chunks.
///
/// Request bodies are created fresh for every hop by a [`BodyProducer`];
/// response bodies are handed back to the caller unread.
pub struct Body {
    inner: Inner,
}

enum Inner {
    Reusable(Bytes),
    Streaming(Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>),
}

impl Body {
    /// Create an empty body.
    #[inline]
    pub fn empty() -> Body {
        Body::reusable(Bytes::new())
    }

    /// Wrap a futures `Stream` in a box inside `Body`.
    ///
    /// # Example
    ///
    /// ```
    /// # use redirectable::Body;
    /// # use futures_util;
    /// # fn main() {
    /// let chunks: Vec<Result<_, ::std::io::Error>> = vec![
    ///     Ok("hello"),
    ///     Ok(" "),
    ///     Ok("world"),
    /// ];
    ///
    /// let stream = futures_util::stream::iter(chunks);
    ///
    /// let body = Body::wrap_stream(stream);
    /// # }
    /// ```
    pub fn wrap_stream<S>(stream: S) -> Body
    where
        S: futures_core::stream::TryStream + Send + 'static,
        S::Error: Into<BoxError>,
        Bytes: From<S::Ok>,
    {
        Body {
            inner: Inner::Streaming(Box::pin(
                stream.map_ok(Bytes::from).map_err(Into::<BoxError>::into),
            )),
        }
    }

    #[inline]
    pub(crate) fn reusable(chunk: Bytes) -> Body {
        Body {
            inner: Inner::Reusable(chunk),
        }
    }

    /// Returns a reference to the internal data of the `Body`.
    ///
    /// `None` is returned if the underlying data is a stream.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.inner {
            Inner::Reusable(bytes) => Some(bytes.as_ref()),
            Inner::Streaming(..) => None,
        }
    }

    /// Read the rest of the body into a single buffer.
    pub async fn bytes(mut self) -> crate::Result<Bytes> {
        if let Inner::Reusable(ref mut bytes) = self.inner {
            return Ok(std::mem::take(bytes));
        }
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next().await {
            buf.extend_from_slice(&chunk.map_err(crate::error::body)?);
        }
        Ok(buf.freeze())
    }

    /// Consume the rest of the body, discarding every chunk.
    ///
    /// Returns the number of bytes that were thrown away.
    pub async fn drain(mut self) -> crate::Result<u64> {
        let mut n = 0;
        while let Some(chunk) = self.next().await {
            n += chunk.map_err(crate::error::body)?.len() as u64;
        }
        Ok(n)
    }
}

impl Default for Body {
    #[inline]
    fn default() -> Body {
        Body::empty()
    }
}

impl Stream for Body {
    type Item = Result<Bytes, BoxError>;

    #[inline]
    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context) -> Poll<Option<Self::Item>> {
        match self.inner {
            Inner::Streaming(ref mut stream) => stream.as_mut().poll_next(cx),
            Inner::Reusable(ref mut bytes) => {
                if bytes.is_empty() {
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Ok(std::mem::take(bytes))))
                }
            }
        }
    }
}

impl From<Bytes> for Body {
    #[inline]
    fn from(bytes: Bytes) -> Body {
        Body::reusable(bytes)
    }
}

impl From<Vec<u8>> for Body {
    #[inline]
    fn from(vec: Vec<u8>) -> Body {
        Body::reusable(vec.into())
    }
}

impl From<&'static [u8]> for Body {
    #[inline]
    fn from(s: &'static [u8]) -> Body {
        Body::reusable(Bytes::from_static(s))
    }
}

impl From<String> for Body {
    #[inline]
    fn from(s: String) -> Body {
        Body::reusable(s.into())
    }
}

impl From<&'static str> for Body {
    #[inline]
    fn from(s: &'static str) -> Body {
        s.as_bytes().into()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.inner {
            Inner::Reusable(ref bytes) => f.debug_tuple("Body").field(bytes).finish(),
            Inner::Streaming(..) => f.debug_struct("Body").finish(),
        }
    }
}

/// A factory of request bodies.
///
/// Every call to [`produce`](BodyProducer::produce) returns a fresh [`Body`].
/// The redirect loop never buffers a body to replay it; when a redirect
/// keeps the body (307, 308, or a `GET` on 301-303), the next hop receives
/// the same producer and the transport calls it again.
///
/// # Note
///
/// A producer wrapping a single-use source (an upload stream that can only
/// be read once) will yield an empty or failing body on the second call.
/// It is up to the caller to only hand out producers that can be replayed.
#[derive(Clone)]
pub struct BodyProducer {
    inner: Arc<dyn Fn() -> Body + Send + Sync>,
}

impl BodyProducer {
    /// Create a producer from a closure.
    ///
    /// ```
    /// # use redirectable::{Body, BodyProducer};
    /// let producer = BodyProducer::new(|| {
    ///     let chunks = vec![Ok::<_, std::io::Error>("a"), Ok("b"), Ok("c")];
    ///     Body::wrap_stream(futures_util::stream::iter(chunks))
    /// });
    /// # drop(producer);
    /// ```
    pub fn new<F>(f: F) -> BodyProducer
    where
        F: Fn() -> Body + Send + Sync + 'static,
    {
        BodyProducer { inner: Arc::new(f) }
    }

    /// A producer that always yields an empty body.
    pub fn empty() -> BodyProducer {
        BodyProducer::new(Body::empty)
    }

    /// Produce a new body.
    pub fn produce(&self) -> Body {
        (self.inner)()
    }

    /// Returns true if both producers are the same instance.
    pub fn ptr_eq(a: &BodyProducer, b: &BodyProducer) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl Default for BodyProducer {
    fn default() -> BodyProducer {
        BodyProducer::empty()
    }
}

impl From<Bytes> for BodyProducer {
    fn from(bytes: Bytes) -> BodyProducer {
        BodyProducer::new(move || Body::reusable(bytes.clone()))
    }
}

impl From<Vec<u8>> for BodyProducer {
    #[inline]
    fn from(vec: Vec<u8>) -> BodyProducer {
        Bytes::from(vec).into()
    }
}

impl From<String> for BodyProducer {
    #[inline]
    fn from(s: String) -> BodyProducer {
        Bytes::from(s).into()
    }
}

impl From<&'static str> for BodyProducer {
    #[inline]
    fn from(s: &'static str) -> BodyProducer {
        Bytes::from_static(s.as_bytes()).into()
    }
}

impl fmt::Debug for BodyProducer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad("BodyProducer")
    }
}
