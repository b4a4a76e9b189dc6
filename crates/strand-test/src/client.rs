//! Test client for in-memory handler testing.

use bytes::Bytes;
use http::Method;
use serde::Serialize;
use std::sync::Arc;
use strand_core::{BoxedHandler, BufferedResponse, Context, Handler, Request};

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Runs requests through a handler without a server.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use strand_core::{handler_fn, ResponseWriterExt};
/// use strand_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let client = TestClient::new(handler_fn(|_ctx, w, _req| {
///     Box::pin(async move { w.write_all(b"pong") })
/// }));
///
/// let response = client.get("/ping").send().await;
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.text().unwrap(), "pong");
/// # });
/// ```
#[must_use]
pub struct TestClient {
    handler: BoxedHandler,
    context: Context,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client for `handler`.
    pub fn new<H: Handler>(handler: H) -> Self {
        Self::from_boxed(Arc::new(handler))
    }

    /// Creates a client for an already-boxed handler.
    pub fn from_boxed(handler: BoxedHandler) -> Self {
        Self {
            handler,
            context: Context::new(),
            default_headers: Vec::new(),
        }
    }

    /// Sets the context every request starts with.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Adds a default header that will be included in all requests.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    /// Runs an already-built request.
    pub async fn call(&self, request: Request) -> TestResponse {
        let mut writer = BufferedResponse::new();
        let outcome = self
            .handler
            .call(self.context.clone(), &mut writer, request)
            .await;
        TestResponse::new(&writer, outcome)
    }
}

/// A request builder bound to a test client.
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        let builder = client
            .default_headers
            .iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value));
        Self { client, builder }
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets Basic credentials.
    pub fn basic_auth(mut self, username: &str, password: &str) -> Self {
        self.builder = self.builder.basic_auth(username, password);
        self
    }

    /// Records the transport peer address.
    pub fn remote_addr(mut self, addr: impl AsRef<str>) -> Self {
        self.builder = self.builder.remote_addr(addr);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets the request body as a URL-encoded form.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Sends the request and returns the response.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built.
    pub async fn send(self) -> TestResponse {
        self.try_send().await.expect("valid test request")
    }

    /// Sends the request, reporting build errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be built.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        Ok(self.client.call(request).await)
    }
}
