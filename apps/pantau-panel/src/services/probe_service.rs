use pantau_shared::api::StatusInfo;
use std::time::Duration;
use tracing::debug;

/// Best-effort reachability probe: HEAD over plain HTTP, one fallback
/// attempt over HTTPS. Redirect handling is whatever the client does by
/// default.
pub struct ProbeService {
    client: reqwest::Client,
}

impl ProbeService {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Never fails: an unreachable host is a result, not an error.
    pub async fn check(&self, domain: &str) -> StatusInfo {
        for scheme in ["http", "https"] {
            match self
                .client
                .head(format!("{}://{}", scheme, domain))
                .send()
                .await
            {
                Ok(resp) => {
                    return StatusInfo {
                        status: "aktif".to_string(),
                        status_code: Some(resp.status().as_u16()),
                        accessible: true,
                    };
                }
                Err(e) => debug!("Probe {}://{} failed: {}", scheme, domain, e),
            }
        }

        StatusInfo {
            status: "tidak aktif".to_string(),
            status_code: None,
            accessible: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn answering_host_is_aktif_with_status_code() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut sock, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = sock.read(&mut buf).await;
                let _ = sock
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
                    .await;
            }
        });

        let probe = ProbeService::new(Duration::from_secs(2)).unwrap();
        let info = probe.check(&format!("127.0.0.1:{}", addr.port())).await;

        assert!(info.accessible);
        assert_eq!(info.status, "aktif");
        assert_eq!(info.status_code, Some(200));
    }

    #[tokio::test]
    async fn unreachable_host_is_tidak_aktif_within_bounded_time() {
        // Port 1 refuses on both schemes.
        let probe = ProbeService::new(Duration::from_secs(1)).unwrap();
        let start = std::time::Instant::now();
        let info = probe.check("127.0.0.1:1").await;

        assert_eq!(
            info,
            StatusInfo {
                status: "tidak aktif".to_string(),
                status_code: None,
                accessible: false,
            }
        );
        // Roughly two per-attempt timeouts, with slack.
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}
