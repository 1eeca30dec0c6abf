use crate::core::{
    ApiResponse, ApiStatus, ArtifactReply, ArtifactSource, ClientError, ConfigProvider,
    ExtractionRequest, Result,
};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;

const NO_ERROR_DETAILS: &str = "No error details available";
const ARTIFACT_ACCEPT: &str = "application/zip, application/octet-stream, */*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    pub health: Duration,
    pub request: Duration,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            health: Duration::from_secs(5),
            request: Duration::from_secs(30),
        }
    }
}

/// 擷取服務的 HTTP 用戶端
#[derive(Debug, Clone)]
pub struct ExtractionClient {
    client: Client,
    base_url: String,
    timeouts: ClientTimeouts,
}

impl ExtractionClient {
    pub fn new(base_url: impl Into<String>, timeouts: ClientTimeouts) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeouts,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(
            config.base_url(),
            ClientTimeouts {
                health: config.health_timeout(),
                request: config.request_timeout(),
            },
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// 健康檢查；任何失敗都視為離線
    pub async fn health(&self) -> ApiStatus {
        let url = self.url("/health");
        tracing::debug!("Checking API health at {}", url);

        match self
            .client
            .get(&url)
            .timeout(self.timeouts.health)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                tracing::info!("✅ Extraction API is online");
                ApiStatus::Online
            }
            Ok(response) => {
                tracing::warn!("⚠️ Health check returned {}", response.status());
                ApiStatus::Offline
            }
            Err(e) => {
                tracing::warn!("⚠️ Health check failed: {}", e);
                ApiStatus::Offline
            }
        }
    }

    /// 以 multipart 上傳 PDF 並取得擷取結果
    pub async fn extract(&self, request: &ExtractionRequest) -> Result<ApiResponse> {
        let url = self.url(request.endpoint());
        let form = build_form(request)?;

        tracing::info!(
            "📡 Submitting {} file(s) as {} to {}",
            request.files.len(),
            request.document_type,
            url
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.timeouts.request)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                NO_ERROR_DETAILS.to_string()
            } else {
                body
            };
            return Err(ClientError::HttpError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ApiResponse = response.json().await?;
        tracing::info!(
            "✅ Server processed {}/{} file(s)",
            parsed.processed_files,
            parsed.total_files
        );
        Ok(parsed)
    }
}

fn build_form(request: &ExtractionRequest) -> Result<Form> {
    let mut form = Form::new();
    for file in &request.files {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str("application/pdf")?;
        form = form.part("files", part);
    }

    form = form.text("document_type", request.document_type.code());

    if request.rename.enabled {
        form = form
            .text("use_name_for_rename", request.rename.use_name.to_string())
            .text(
                "use_passport_for_rename",
                request.rename.use_passport.to_string(),
            );
    }

    Ok(form)
}

#[async_trait]
impl ArtifactSource for ExtractionClient {
    async fn get(&self, url: &str, timeout: Duration) -> Result<ArtifactReply> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .header(ACCEPT, ARTIFACT_ACCEPT)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(ArtifactReply {
            status,
            body,
            content_type,
        })
    }
}
