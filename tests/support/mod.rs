#![allow(dead_code)]

pub mod transport;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use redirectable::{Body, BodyProducer, HeaderList, Response, StatusCode};

/// A redirect response with an empty body.
pub fn redirect(code: u16, location: &str) -> Response {
    Response::new(
        StatusCode::from_u16(code).expect("status code"),
        HeaderList::new().with("Location", location.to_owned()),
        "",
    )
}

pub fn ok(body: &'static str) -> Response {
    Response::new(
        StatusCode::OK,
        HeaderList::new().with("Server", "test-dst"),
        body,
    )
}

/// A body that flips `done` once it has been read to the end.
pub fn tracked(chunks: Vec<&'static str>, done: Arc<AtomicBool>) -> Body {
    let stream = futures_util::stream::unfold(chunks.into_iter(), move |mut it| {
        let done = done.clone();
        async move {
            match it.next() {
                Some(chunk) => Some((Ok::<_, std::io::Error>(Bytes::from_static(chunk.as_bytes())), it)),
                None => {
                    done.store(true, Ordering::SeqCst);
                    None
                }
            }
        }
    });
    Body::wrap_stream(stream)
}

/// A producer streaming `a`, `b`, `c`, like an upload generator.
pub fn abc() -> BodyProducer {
    BodyProducer::new(|| {
        let chunks = vec![Ok::<_, std::io::Error>("a"), Ok("b"), Ok("c")];
        Body::wrap_stream(futures_util::stream::iter(chunks))
    })
}
