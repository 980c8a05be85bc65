// Bandwidth sampling: ranged GET directly against a CDN IP with the logical
// domain kept as the request host. Replaces shelling out to an HTTP utility;
// each attempt carries its own timeout and a failure drops the sample.

use crate::models::round2;
use reqwest::header;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Recoverable per-download failure; the run continues with the next target.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("http client build failed: {0}")]
    Client(reqwest::Error),
    #[error("request failed: {0}")]
    Request(reqwest::Error),
    #[error("server answered {0}")]
    Status(reqwest::StatusCode),
    #[error("empty response body")]
    EmptyBody,
}

/// Convert a transfer rate from bytes/second to Mbit/s.
pub fn throughput_mbits(bytes_per_sec: f64) -> f64 {
    bytes_per_sec * 8.0 / 1_000_000.0
}

pub struct Sampler {
    domain: String,
    path: String,
    size: u64,
    timeout: Duration,
}

impl Sampler {
    pub fn new(domain: &str, path: &str, size: u64, timeout: Duration) -> Self {
        Self {
            domain: domain.to_string(),
            path: path.to_string(),
            size,
            timeout,
        }
    }

    /// Download up to `size` bytes from `ip`, keeping the logical domain as
    /// the request host so virtual hosting still routes to the test object.
    /// Returns the achieved throughput in Mbit/s, rounded to 2 decimals.
    pub async fn sample(&self, ip: Ipv4Addr) -> Result<f64, SampleError> {
        let client = reqwest::Client::builder()
            .resolve(&self.domain, SocketAddr::new(IpAddr::V4(ip), 80))
            .timeout(self.timeout)
            .build()
            .map_err(SampleError::Client)?;

        let url = format!("http://{}{}", self.domain, self.path);
        let start = Instant::now();
        let mut response = client
            .get(&url)
            .header(header::RANGE, format!("bytes=0-{}", self.size))
            .send()
            .await
            .map_err(SampleError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SampleError::Status(status));
        }

        let mut bytes_read: u64 = 0;
        while let Some(chunk) = response.chunk().await.map_err(SampleError::Request)? {
            bytes_read += chunk.len() as u64;
        }
        let elapsed = start.elapsed();

        if bytes_read == 0 {
            return Err(SampleError::EmptyBody);
        }

        let secs = elapsed.as_secs_f64();
        let rate = if secs > 0.0 {
            bytes_read as f64 / secs
        } else {
            0.0
        };
        let mbits = round2(throughput_mbits(rate));
        debug!(%ip, bytes_read, elapsed_ms = elapsed.as_millis() as u64, mbits, "download sampled");
        Ok(mbits)
    }
}
