//! Middleware chain for the HTTP client.

use async_trait::async_trait;
use reqwest::Request;
use std::sync::Arc;
use std::time::Duration;

use crate::{HttpClientError, Response, Result};

/// Middleware trait for processing requests and responses.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Process the request and call the next middleware.
    async fn handle(&self, request: Request, next: &MiddlewareChain) -> Result<Response>;
}

/// Chain of middleware handlers ending in the transport.
///
/// Middleware runs in the order it was added; the first one added sees the
/// request first.
#[derive(Clone)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
    client: reqwest::Client,
    index: usize,
}

impl MiddlewareChain {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            middlewares: Vec::new(),
            client,
            index: 0,
        }
    }

    /// Add a middleware to the end of the chain.
    pub fn with_middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Run the request through the whole chain.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        self.execute_at(0, request).await
    }

    async fn execute_at(&self, index: usize, request: Request) -> Result<Response> {
        match self.middlewares.get(index) {
            Some(middleware) => {
                let next = MiddlewareChain {
                    middlewares: self.middlewares.clone(),
                    client: self.client.clone(),
                    index: index + 1,
                };
                middleware.handle(request, &next).await
            }
            None => {
                let response = self.client.execute(request).await?;
                Response::read(response).await
            }
        }
    }

    /// Continue to the next middleware, or the transport at the end.
    pub async fn next(&self, request: Request) -> Result<Response> {
        self.execute_at(self.index, request).await
    }
}

/// Fails requests that take longer than a fixed duration.
pub struct TimeoutMiddleware {
    timeout: Duration,
}

impl TimeoutMiddleware {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Middleware for TimeoutMiddleware {
    async fn handle(&self, request: Request, next: &MiddlewareChain) -> Result<Response> {
        tokio::time::timeout(self.timeout, next.next(request))
            .await
            .unwrap_or(Err(HttpClientError::Timeout(self.timeout)))
    }
}
