use async_trait::async_trait;
use reqwest::{Request, Response};

/// Minimal HTTP execution seam. Auth decorators wrap an inner client and
/// rewrite the request before it goes out.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
