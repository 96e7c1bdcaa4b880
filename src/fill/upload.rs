//! Fetching remote images and injecting them into a file input.

use super::wait::ElementWaiter;
use crate::host::{AssetFile, FieldSignal, PageHost};
use crate::{Error, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on one download when nothing else is configured.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of asset bytes.
#[allow(async_fn_in_trait)]
pub trait AssetFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches assets over HTTP. Non-2xx responses are errors.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Every request, body included, must finish within `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("listing-autofill/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// What an upload run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Whether the file input was found at all.
    pub field_found: bool,
    pub attempted: usize,
    pub applied: usize,
    /// URLs that could not be fetched.
    pub failed: Vec<String>,
}

pub struct AssetUploader<'a, H, F> {
    waiter: ElementWaiter<'a, H>,
    fetcher: &'a F,
    fetch_timeout: Duration,
}

impl<'a, H: PageHost, F: AssetFetcher> AssetUploader<'a, H, F> {
    pub fn new(waiter: ElementWaiter<'a, H>, fetcher: &'a F) -> Self {
        Self {
            waiter,
            fetcher,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Give up on a single URL after this long.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    async fn fetch_bounded(&self, url: &str) -> Result<Vec<u8>> {
        let reason = match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(url)).await {
            Ok(Ok(bytes)) => return Ok(bytes),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("no response within {:?}", self.fetch_timeout),
        };
        Err(Error::AssetFetch {
            url: url.to_string(),
            reason,
        })
    }

    /// File name for the asset at `index` in the URL list.
    pub fn file_name(index: usize) -> String {
        format!("photo_{}.jpg", index)
    }

    /// Fetch every URL in order and assign the ones that arrived in a single
    /// assignment followed by one `change`. Fetch failures skip only that URL.
    pub async fn upload(&self, field_selector: &str, urls: &[String]) -> Result<UploadReport> {
        let mut report = UploadReport {
            attempted: urls.len(),
            ..Default::default()
        };
        if self.waiter.wait_for(field_selector).await?.is_none() {
            warn!("file input '{}' not found, skipping images", field_selector);
            return Ok(report);
        }
        report.field_found = true;

        let mut files = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            match self.fetch_bounded(url).await {
                Ok(bytes) => {
                    debug!("fetched {} ({} bytes)", url, bytes.len());
                    files.push(AssetFile {
                        name: Self::file_name(i),
                        mime: "image/jpeg".into(),
                        bytes,
                    });
                }
                Err(e) => {
                    warn!("{}", e);
                    report.failed.push(url.clone());
                }
            }
        }

        let host = self.waiter.host();
        host.assign_files(field_selector, &files).await?;
        host.notify(field_selector, FieldSignal::Change).await?;
        report.applied = files.len();
        info!("applied {}/{} images", report.applied, report.attempted);
        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;

    const PHOTOS: &str = "input[name=\"photos\"]";

    /// Serves a few bytes for every URL except the ones marked broken or
    /// stalled. Stalled URLs never answer.
    #[derive(Default)]
    pub(crate) struct FakeFetcher {
        broken: HashSet<String>,
        stalled: HashSet<String>,
    }

    impl FakeFetcher {
        pub fn failing(urls: &[&str]) -> Self {
            Self {
                broken: urls.iter().map(|u| u.to_string()).collect(),
                ..Default::default()
            }
        }

        pub fn stalling(urls: &[&str]) -> Self {
            Self {
                stalled: urls.iter().map(|u| u.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    impl AssetFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            if self.stalled.contains(url) {
                std::future::pending::<()>().await;
            }
            if self.broken.contains(url) {
                return Err(Error::Host(format!("404 for {}", url)));
            }
            Ok(url.as_bytes().to_vec())
        }
    }

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://img.test/{}.jpg", i)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failure_applies_remaining_in_single_assignment() {
        use crate::host::fake::FakePage;
        let page = FakePage::new().with_node(PHOTOS, "");
        let fetcher = FakeFetcher::failing(&["https://img.test/1.jpg"]);
        let uploader = AssetUploader::new(ElementWaiter::new(&page), &fetcher);

        let report = uploader.upload(PHOTOS, &urls(3)).await.unwrap();

        assert_eq!(report.applied, 2);
        assert_eq!(report.failed, vec!["https://img.test/1.jpg".to_string()]);
        assert_eq!(
            page.assignments(),
            vec![(
                PHOTOS.to_string(),
                vec!["photo_0.jpg".to_string(), "photo_2.jpg".to_string()]
            )]
        );
        assert_eq!(page.signals(PHOTOS), vec![FieldSignal::Change]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_failures_apply_empty_list() {
        use crate::host::fake::FakePage;
        let page = FakePage::new().with_node(PHOTOS, "");
        let all = urls(2);
        let broken: Vec<&str> = all.iter().map(String::as_str).collect();
        let fetcher = FakeFetcher::failing(&broken);
        let uploader = AssetUploader::new(ElementWaiter::new(&page), &fetcher);

        let report = uploader.upload(PHOTOS, &all).await.unwrap();

        assert_eq!(report.applied, 0);
        assert_eq!(page.assignments(), vec![(PHOTOS.to_string(), vec![])]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_input_skips_fetching() {
        use crate::host::fake::FakePage;
        let page = FakePage::new();
        let fetcher = FakeFetcher::default();
        let uploader = AssetUploader::new(ElementWaiter::new(&page), &fetcher);

        let report = uploader.upload(PHOTOS, &urls(2)).await.unwrap();

        assert!(!report.field_found);
        assert_eq!(report.applied, 0);
        assert!(page.assignments().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_fetch_gives_up_and_keeps_the_rest() {
        use crate::host::fake::FakePage;
        let page = FakePage::new().with_node(PHOTOS, "");
        let fetcher = FakeFetcher::stalling(&["https://img.test/0.jpg"]);
        let uploader = AssetUploader::new(ElementWaiter::new(&page), &fetcher)
            .fetch_timeout(Duration::from_secs(5));

        let start = tokio::time::Instant::now();
        let report = uploader.upload(PHOTOS, &urls(2)).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(5));
        assert_eq!(report.failed, vec!["https://img.test/0.jpg".to_string()]);
        assert_eq!(
            page.assignments(),
            vec![(PHOTOS.to_string(), vec!["photo_1.jpg".to_string()])]
        );
    }

    mod http {
        use super::super::*;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        /// Accepts one connection and answers it with `reply`, or holds it
        /// open without a word when `reply` is `None`.
        async fn serve_once(reply: Option<&'static str>) -> String {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                match reply {
                    Some(reply) => {
                        socket.write_all(reply.as_bytes()).await.unwrap();
                        socket.shutdown().await.ok();
                    }
                    None => {
                        std::future::pending::<()>().await;
                        drop(socket);
                    }
                }
            });
            format!("http://{}/photo.jpg", addr)
        }

        #[tokio::test]
        async fn test_silent_server_times_out() {
            let url = serve_once(None).await;
            let fetcher = HttpFetcher::with_timeout(Duration::from_millis(200)).unwrap();

            let fetched = tokio::time::timeout(Duration::from_secs(5), fetcher.fetch(&url))
                .await
                .expect("fetch outlived its timeout");

            match fetched {
                Err(Error::Http(e)) => assert!(e.is_timeout(), "{}", e),
                other => panic!("expected a timeout, got {:?}", other.map(|b| b.len())),
            }
        }

        #[tokio::test]
        async fn test_not_found_is_an_error() {
            let url = serve_once(Some(
                "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            ))
            .await;
            let fetcher = HttpFetcher::new().unwrap();

            match fetcher.fetch(&url).await {
                Err(Error::Http(e)) => assert_eq!(e.status(), Some(reqwest::StatusCode::NOT_FOUND)),
                other => panic!("expected a 404, got {:?}", other.map(|b| b.len())),
            }
        }

        #[tokio::test]
        async fn test_ok_returns_body() {
            let url = serve_once(Some(
                "HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\njpeg",
            ))
            .await;
            let fetcher = HttpFetcher::new().unwrap();

            assert_eq!(fetcher.fetch(&url).await.unwrap(), b"jpeg");
        }
    }
}
