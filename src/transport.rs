// Transport layer: the only place that touches the network. Every call
// either yields the status and body the server sent back, or `None` when
// no response could be obtained at all. Status codes are never judged
// here; that is left to the callers in `api`.

use anyhow::Context;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, error};

/// Status code and raw body text of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Outbound HTTP seam. Implementations must swallow transport failures
/// (DNS, refused connections, timeouts) and report them as `None`.
pub trait Transport {
    /// POST `payload` as a JSON body.
    fn post_json(&self, url: &str, payload: &serde_json::Value) -> Option<HttpResponse>;

    /// POST with `query` encoded in the URL and an empty body.
    fn post_query(&self, url: &str, query: &[(&str, &str)]) -> Option<HttpResponse>;

    /// GET with `query` encoded in the URL.
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Option<HttpResponse>;
}

/// Blocking `reqwest` implementation of [`Transport`].
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build the client. `timeout = None` means no client-side timeout at
    /// all; reqwest's blocking default of 30 seconds is switched off.
    pub fn new(timeout: Option<Duration>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    fn finish(
        method: &str,
        url: &str,
        result: reqwest::Result<reqwest::blocking::Response>,
    ) -> Option<HttpResponse> {
        let res = match result {
            Ok(res) => res,
            Err(e) => {
                error!(method, url, "request failed: {e}");
                return None;
            }
        };
        let status = res.status().as_u16();
        // A body that cannot be read is treated like an empty one; the
        // status line already arrived so the exchange still counts.
        let body = res.text().unwrap_or_else(|e| {
            error!(method, url, "failed to read response body: {e}");
            String::new()
        });
        debug!(method, url, status, body = %body, "response received");
        Some(HttpResponse { status, body })
    }
}

impl Transport for HttpTransport {
    fn post_json(&self, url: &str, payload: &serde_json::Value) -> Option<HttpResponse> {
        let result = self.client.post(url).json(payload).send();
        Self::finish("POST", url, result)
    }

    fn post_query(&self, url: &str, query: &[(&str, &str)]) -> Option<HttpResponse> {
        let result = self.client.post(url).query(query).send();
        Self::finish("POST", url, result)
    }

    fn get(&self, url: &str, query: &[(&str, &str)]) -> Option<HttpResponse> {
        let result = self.client.get(url).query(query).send();
        Self::finish("GET", url, result)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use std::net::TcpListener;

    /// Base URL of a loopback port that was just released, so nothing
    /// is listening on it.
    fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}")
    }

    #[test]
    fn refused_get_yields_none() {
        let transport = HttpTransport::new(Some(Duration::from_secs(2))).unwrap();
        let url = format!("{}/fetch-user-data", closed_port_url());
        assert!(transport.get(&url, &[("token", "t")]).is_none());
    }

    #[test]
    fn refused_post_yields_none() {
        let transport = HttpTransport::new(Some(Duration::from_secs(2))).unwrap();
        let base = closed_port_url();
        let payload = serde_json::json!({ "username": "a" });
        assert!(transport
            .post_json(&format!("{base}/login"), &payload)
            .is_none());
        assert!(transport
            .post_query(&format!("{base}/new-expense"), &[("amount", "1")])
            .is_none());
    }

    #[test]
    fn only_200_counts_as_ok() {
        assert!(HttpResponse::new(200, "{}").is_ok());
        assert!(!HttpResponse::new(201, "{}").is_ok());
        assert!(!HttpResponse::new(401, "{}").is_ok());
    }
}
