use crate::core::{ArtifactSource, ClientError, NormalizedResultSet, Result, Sleeper};
use std::time::Duration;

pub const DEFAULT_ZIP_NAME: &str = "renamed_files.zip";
pub const DEFAULT_EXCEL_NAME: &str = "renamed_files.xlsx";

/// 下載重試策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub not_found_delay: Duration,
    pub network_delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            not_found_delay: Duration::from_secs(3),
            network_delay: Duration::from_secs(2),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp,
}

impl RetryPolicy {
    /// 只有 404（檔案尚未產生）與連線失敗會重試；逾時與其他狀態碼直接結束
    pub fn decide(&self, error: &ClientError, retries_used: u32) -> RetryDecision {
        if !error.is_transient() || retries_used >= self.max_retries {
            return RetryDecision::GiveUp;
        }
        match error {
            ClientError::HttpError { status: 404, .. } => {
                RetryDecision::Retry(self.not_found_delay)
            }
            _ => RetryDecision::Retry(self.network_delay),
        }
    }
}

/// 下載狀態機
#[derive(Debug)]
pub enum DownloadState {
    Idle,
    Requesting { attempt: u32 },
    Retrying { attempt: u32, delay: Duration, last_error: ClientError },
    Success(DownloadedArtifact),
    Failed(ClientError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub attempts: u32,
}

impl DownloadedArtifact {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// 取連結最後一段作為檔名
pub fn artifact_file_name(link: &str, fallback: &str) -> String {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    path.rsplit('/')
        .next()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}

/// 相對連結接在 base URL 之後；絕對連結原樣使用
pub fn join_url(base_url: &str, link: &str) -> String {
    let link = link.trim();
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        link.trim_start_matches('/')
    )
}

pub struct DownloadOrchestrator<A: ArtifactSource, S: Sleeper> {
    source: A,
    sleeper: S,
    base_url: String,
    policy: RetryPolicy,
}

impl<A: ArtifactSource, S: Sleeper> DownloadOrchestrator<A, S> {
    pub fn new(source: A, sleeper: S, base_url: impl Into<String>) -> Self {
        Self {
            source,
            sleeper,
            base_url: base_url.into(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn fetch_zip(&self, set: &NormalizedResultSet) -> Result<DownloadedArtifact> {
        self.fetch(set.zip_link(), DEFAULT_ZIP_NAME).await
    }

    pub async fn fetch_excel(&self, set: &NormalizedResultSet) -> Result<DownloadedArtifact> {
        self.fetch(set.excel_link(), DEFAULT_EXCEL_NAME).await
    }

    /// 依狀態機執行下載，回傳最終成果或最後一次的錯誤
    pub async fn fetch(&self, link: Option<&str>, fallback_name: &str) -> Result<DownloadedArtifact> {
        let link = match link.map(str::trim).filter(|l| !l.is_empty()) {
            Some(link) => link,
            None => {
                tracing::warn!("⚠️ No download link in response");
                return Err(ClientError::MissingLink);
            }
        };

        let url = join_url(&self.base_url, link);
        let filename = artifact_file_name(link, fallback_name);
        let mut state = DownloadState::Idle;

        loop {
            state = match state {
                DownloadState::Idle => DownloadState::Requesting { attempt: 1 },
                DownloadState::Requesting { attempt } => {
                    tracing::info!(
                        "📡 Downloading {} (attempt {}/{})",
                        url,
                        attempt,
                        self.policy.max_retries + 1
                    );
                    match self.attempt(&url).await {
                        Ok(bytes) => DownloadState::Success(DownloadedArtifact {
                            filename: filename.clone(),
                            bytes,
                            attempts: attempt,
                        }),
                        Err(error) => match self.policy.decide(&error, attempt - 1) {
                            RetryDecision::Retry(delay) => DownloadState::Retrying {
                                attempt,
                                delay,
                                last_error: error,
                            },
                            RetryDecision::GiveUp => DownloadState::Failed(error),
                        },
                    }
                }
                DownloadState::Retrying {
                    attempt,
                    delay,
                    last_error,
                } => {
                    tracing::warn!(
                        "🔄 Attempt {} failed ({}), retrying in {:?}",
                        attempt,
                        last_error,
                        delay
                    );
                    self.sleeper.sleep(delay).await;
                    DownloadState::Requesting {
                        attempt: attempt + 1,
                    }
                }
                DownloadState::Success(artifact) => {
                    tracing::info!(
                        "✅ Downloaded {} ({} bytes) after {} attempt(s)",
                        artifact.filename,
                        artifact.size(),
                        artifact.attempts
                    );
                    return Ok(artifact);
                }
                DownloadState::Failed(error) => {
                    tracing::error!("❌ Download failed: {}", error);
                    return Err(error);
                }
            };
        }
    }

    async fn attempt(&self, url: &str) -> Result<Vec<u8>> {
        let reply = self.source.get(url, self.policy.timeout).await?;

        if !(200..300).contains(&reply.status) {
            let message = String::from_utf8_lossy(&reply.body).trim().to_string();
            return Err(ClientError::HttpError {
                status: reply.status,
                message: if message.is_empty() {
                    format!("download request returned status {}", reply.status)
                } else {
                    message
                },
            });
        }

        if reply.body.is_empty() {
            return Err(ClientError::EmptyArtifact);
        }

        if let Some(content_type) = &reply.content_type {
            tracing::debug!("Received {} bytes ({})", reply.body.len(), content_type);
        }
        Ok(reply.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ArtifactReply, DownloadLinks};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    enum Scripted {
        Status(u16, usize),
        Network,
        Timeout,
    }

    #[derive(Clone, Default)]
    struct ScriptedSource {
        script: Arc<Mutex<VecDeque<Scripted>>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Scripted>) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into())),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ArtifactSource for ScriptedSource {
        async fn get(&self, url: &str, _timeout: Duration) -> Result<ArtifactReply> {
            self.calls.lock().unwrap().push(url.to_string());
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted");
            match next {
                Scripted::Status(status, size) => Ok(ArtifactReply {
                    status,
                    body: vec![b'P'; size],
                    content_type: Some("application/zip".to_string()),
                }),
                Scripted::Network => Err(ClientError::NetworkError {
                    message: "connection refused".to_string(),
                }),
                Scripted::Timeout => Err(ClientError::Timeout {
                    message: "deadline elapsed".to_string(),
                }),
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSleeper {
        delays: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingSleeper {
        fn total(&self) -> Duration {
            self.delays.lock().unwrap().iter().sum()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    fn set_with_zip(link: &str) -> NormalizedResultSet {
        NormalizedResultSet {
            success: true,
            download_links: Some(DownloadLinks {
                zip: Some(link.to_string()),
                excel: None,
            }),
            ..Default::default()
        }
    }

    fn orchestrator(
        script: Vec<Scripted>,
    ) -> (
        DownloadOrchestrator<ScriptedSource, RecordingSleeper>,
        ScriptedSource,
        RecordingSleeper,
    ) {
        let source = ScriptedSource::new(script);
        let sleeper = RecordingSleeper::default();
        let orchestrator =
            DownloadOrchestrator::new(source.clone(), sleeper.clone(), "https://api.test/");
        (orchestrator, source, sleeper)
    }

    #[tokio::test]
    async fn test_not_found_twice_then_success() {
        let (orchestrator, source, sleeper) = orchestrator(vec![
            Scripted::Status(404, 0),
            Scripted::Status(404, 0),
            Scripted::Status(200, 5000),
        ]);

        let artifact = orchestrator
            .fetch_zip(&set_with_zip("/download-zip/Renamed_Files_EVLN.zip"))
            .await
            .unwrap();

        assert_eq!(artifact.attempts, 3);
        assert_eq!(artifact.size(), 5000);
        assert_eq!(artifact.filename, "Renamed_Files_EVLN.zip");
        assert!(sleeper.total() >= Duration::from_secs(6));
        assert_eq!(
            source.calls()[0],
            "https://api.test/download-zip/Renamed_Files_EVLN.zip"
        );
    }

    #[tokio::test]
    async fn test_not_found_exhausts_retries() {
        let (orchestrator, source, _) = orchestrator(vec![
            Scripted::Status(404, 0),
            Scripted::Status(404, 0),
            Scripted::Status(404, 0),
        ]);

        let err = orchestrator
            .fetch_zip(&set_with_zip("/download-zip/x.zip"))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::HttpError { status: 404, .. }));
        assert_eq!(source.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_body_is_terminal() {
        let (orchestrator, source, sleeper) = orchestrator(vec![Scripted::Status(200, 0)]);

        let err = orchestrator
            .fetch_zip(&set_with_zip("/download-zip/x.zip"))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::EmptyArtifact));
        assert_eq!(source.calls().len(), 1);
        assert_eq!(sleeper.total(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_missing_link_makes_no_request() {
        let (orchestrator, source, _) = orchestrator(vec![]);

        let err = orchestrator
            .fetch_zip(&NormalizedResultSet::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingLink));

        let err = orchestrator.fetch_zip(&set_with_zip("  ")).await.unwrap_err();
        assert!(matches!(err, ClientError::MissingLink));

        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let (orchestrator, source, _) = orchestrator(vec![Scripted::Status(500, 12)]);

        let err = orchestrator
            .fetch_zip(&set_with_zip("/download-zip/x.zip"))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::HttpError { status: 500, .. }));
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_network_error_retries_after_short_delay() {
        let (orchestrator, source, sleeper) =
            orchestrator(vec![Scripted::Network, Scripted::Status(200, 10)]);

        let artifact = orchestrator
            .fetch_zip(&set_with_zip("/download-zip/x.zip"))
            .await
            .unwrap();

        assert_eq!(artifact.attempts, 2);
        assert_eq!(source.calls().len(), 2);
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn test_timeout_is_terminal() {
        let (orchestrator, source, _) =
            orchestrator(vec![Scripted::Timeout, Scripted::Status(200, 10)]);

        let err = orchestrator
            .fetch_zip(&set_with_zip("/download-zip/x.zip"))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Timeout { .. }));
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_absolute_link_used_as_is() {
        let (orchestrator, source, _) = orchestrator(vec![Scripted::Status(200, 3)]);

        let artifact = orchestrator
            .fetch(Some("https://cdn.test/files/out.zip?token=1"), DEFAULT_ZIP_NAME)
            .await
            .unwrap();

        assert_eq!(source.calls(), vec!["https://cdn.test/files/out.zip?token=1"]);
        assert_eq!(artifact.filename, "out.zip");
    }

    #[test]
    fn test_file_name_and_url_helpers() {
        assert_eq!(artifact_file_name("/download-zip/", DEFAULT_ZIP_NAME), "renamed_files.zip");
        assert_eq!(artifact_file_name("a/b/c.zip", DEFAULT_ZIP_NAME), "c.zip");
        assert_eq!(join_url("http://h:1", "x/y.zip"), "http://h:1/x/y.zip");
        assert_eq!(join_url("http://h:1///", "//x.zip"), "http://h:1/x.zip");
    }

    #[test]
    fn test_retry_policy_budget() {
        let policy = RetryPolicy::default();
        let not_found = ClientError::HttpError {
            status: 404,
            message: String::new(),
        };
        assert_eq!(
            policy.decide(&not_found, 0),
            RetryDecision::Retry(Duration::from_secs(3))
        );
        assert_eq!(policy.decide(&not_found, 2), RetryDecision::GiveUp);
        assert_eq!(policy.decide(&ClientError::EmptyArtifact, 0), RetryDecision::GiveUp);
        assert_eq!(
            policy.decide(
                &ClientError::Timeout {
                    message: String::new()
                },
                0
            ),
            RetryDecision::GiveUp
        );
        assert_eq!(
            policy.decide(
                &ClientError::InvalidResponse {
                    message: String::new()
                },
                0
            ),
            RetryDecision::GiveUp
        );
    }
}
