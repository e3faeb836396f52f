//! Transport decorator that drains unread response bytes before releasing a body.

// crates.io
use bytes::Bytes;
use reqwest::Request;
// self
use crate::{
	_prelude::*,
	error::TransportError,
	http::{BodyFuture, HttpTransport, ResponseBody, TransportFuture},
};

/// Wraps a transport so every response body is read to the end before it is closed.
///
/// Pooled HTTP/1.1 connections can only be reused once their previous response has been fully
/// consumed, so callers that stop reading early still leave the connection reusable. Transport
/// errors pass through unchanged.
#[derive(Clone, Debug)]
pub struct DrainingTransport<T> {
	inner: T,
}
impl<T> DrainingTransport<T> {
	/// Decorates `inner`.
	pub fn new(inner: T) -> Self {
		Self { inner }
	}
}
impl<T> HttpTransport for DrainingTransport<T>
where
	T: HttpTransport,
{
	fn round_trip(&self, request: Request) -> TransportFuture<'_> {
		Box::pin(async move {
			let response = self.inner.round_trip(request).await?;

			Ok(response
				.map_body(|body| Box::new(DrainingBody { inner: body }) as Box<dyn ResponseBody>))
		})
	}
}

/// Body whose [`close`](ResponseBody::close) discards the unread remainder first.
pub struct DrainingBody {
	inner: Box<dyn ResponseBody>,
}
impl ResponseBody for DrainingBody {
	fn chunk(&mut self) -> BodyFuture<'_, Option<Bytes>> {
		self.inner.chunk()
	}

	fn close(self: Box<Self>) -> BodyFuture<'static, u64> {
		let mut inner = self.inner;

		Box::pin(async move {
			let mut discarded = 0_u64;

			loop {
				match inner.chunk().await {
					Ok(Some(chunk)) => discarded += chunk.len() as u64,
					Ok(None) => break,
					Err(e) => {
						// Still release the body so the connection is not leaked.
						let _ = inner.close().await;

						return Err::<u64, TransportError>(e);
					},
				}
			}

			inner.close().await?;

			Ok(discarded)
		})
	}
}
