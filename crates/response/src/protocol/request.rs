//! The request side of an exchange as seen by the response writer.
//!
//! Request parsing happens elsewhere. The writer only needs to know the method (a `HEAD`
//! response never carries body bytes), how to close the request body once the handler is done,
//! and how to clean up whatever a multipart form parser left behind.

use async_trait::async_trait;
use http::Method;
use http::request::Parts;
use std::fmt;
use std::io;

/// A request body that has to be closed when the exchange finishes.
#[async_trait]
pub trait CloseBody: Send {
    async fn close(&mut self) -> io::Result<()>;
}

/// Hook that removes temporary state of a parsed multipart form, e.g. spooled files.
pub type FormCleanup = Box<dyn FnOnce() -> io::Result<()> + Send>;

/// The request descriptor handed to a [`Response`](crate::response::Response).
pub struct RequestInfo {
    method: Method,
    body: Option<Box<dyn CloseBody>>,
    form_cleanup: Option<FormCleanup>,
}

impl RequestInfo {
    pub fn new(method: Method) -> Self {
        Self { method, body: None, form_cleanup: None }
    }

    /// Attaches the body which is closed by `finish_request`.
    pub fn with_body<B: CloseBody + 'static>(mut self, body: B) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    /// Attaches the multipart cleanup hook which is invoked by `finish_request`.
    pub fn with_form_cleanup<F>(mut self, cleanup: F) -> Self
    where
        F: FnOnce() -> io::Result<()> + Send + 'static,
    {
        self.form_cleanup = Some(Box::new(cleanup));
        self
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// Closes the body and runs the cleanup hook, both at most once.
    ///
    /// The hook runs even if closing the body failed; the first error is returned.
    pub(crate) async fn close(&mut self) -> io::Result<()> {
        let closed = match self.body.take() {
            Some(mut body) => body.close().await,
            None => Ok(()),
        };

        let cleaned = match self.form_cleanup.take() {
            Some(cleanup) => cleanup(),
            None => Ok(()),
        };

        closed.and(cleaned)
    }
}

impl fmt::Debug for RequestInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestInfo")
            .field("method", &self.method)
            .field("has_body", &self.body.is_some())
            .field("has_form_cleanup", &self.form_cleanup.is_some())
            .finish()
    }
}

impl From<Method> for RequestInfo {
    #[inline]
    fn from(method: Method) -> Self {
        Self::new(method)
    }
}

impl From<&Parts> for RequestInfo {
    #[inline]
    fn from(parts: &Parts) -> Self {
        Self::new(parts.method.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBody {
        closed: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl CloseBody for CountingBody {
        async fn close(&mut self) -> io::Result<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            if self.fail { Err(io::Error::other("close failed")) } else { Ok(()) }
        }
    }

    #[tokio::test]
    async fn test_close_runs_body_and_cleanup_once() {
        let closed = Arc::new(AtomicUsize::new(0));
        let cleaned = Arc::new(AtomicUsize::new(0));
        let cleaned_hook = Arc::clone(&cleaned);

        let mut request = RequestInfo::new(Method::POST)
            .with_body(CountingBody { closed: Arc::clone(&closed), fail: false })
            .with_form_cleanup(move || {
                cleaned_hook.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        assert!(request.close().await.is_ok());
        assert!(request.close().await.is_ok());

        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert_eq!(cleaned.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cleanup_runs_when_body_close_fails() {
        let closed = Arc::new(AtomicUsize::new(0));
        let cleaned = Arc::new(AtomicUsize::new(0));
        let cleaned_hook = Arc::clone(&cleaned);

        let mut request = RequestInfo::new(Method::POST)
            .with_body(CountingBody { closed: Arc::clone(&closed), fail: true })
            .with_form_cleanup(move || {
                cleaned_hook.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        let result = request.close().await;
        assert!(result.is_err());
        assert_eq!(cleaned.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_is_head() {
        assert!(RequestInfo::new(Method::HEAD).is_head());
        assert!(!RequestInfo::from(Method::GET).is_head());

        let (parts, ()) = http::Request::builder().method(Method::HEAD).body(()).unwrap().into_parts();
        assert!(RequestInfo::from(&parts).is_head());
    }
}
