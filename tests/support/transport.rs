//! A scripted transport for the integration tests.
//!
//! Every request is recorded, with its body read to the end through the
//! request's producer, before the handler picks a response.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use bytes::Bytes;
use redirectable::{BodyProducer, HeaderList, Method, Request, Response};
use tower_service::Service;

#[derive(Clone, Debug)]
pub struct Seen {
    pub method: Method,
    pub url: String,
    pub headers: HeaderList,
    pub body: Bytes,
    pub producer: BodyProducer,
}

type Handler = dyn Fn(&Seen) -> io::Result<Response> + Send + Sync;

#[derive(Clone)]
pub struct Transport {
    handler: Arc<Handler>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Transport {
    pub fn new<F>(handler: F) -> Transport
    where
        F: Fn(&Seen) -> Response + Send + Sync + 'static,
    {
        Transport::fallible(move |seen| Ok(handler(seen)))
    }

    pub fn fallible<F>(handler: F) -> Transport
    where
        F: Fn(&Seen) -> io::Result<Response> + Send + Sync + 'static,
    {
        Transport {
            handler: Arc::new(handler),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every request received so far, in order.
    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.seen().into_iter().map(|s| s.url).collect()
    }
}

impl Service<Request> for Transport {
    type Response = Response;
    type Error = io::Error;
    type Future = Pin<Box<dyn Future<Output = io::Result<Response>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let handler = self.handler.clone();
        let log = self.seen.clone();
        Box::pin(async move {
            let (method, url, headers, producer) = req.into_parts();
            let body = producer
                .produce()
                .bytes()
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            let seen = Seen {
                method,
                url,
                headers,
                body,
                producer,
            };
            log.lock().unwrap().push(seen.clone());
            handler(&seen)
        })
    }
}
