use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn output_path(&self) -> &str;
    fn health_timeout(&self) -> Duration;
    fn request_timeout(&self) -> Duration;
    fn download_timeout(&self) -> Duration;
    fn max_retries(&self) -> u32;
}

/// 單次 GET 的原始結果（尚未判斷成功與否）
#[derive(Debug, Clone)]
pub struct ArtifactReply {
    pub status: u16,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// 傳輸層失敗（連線、逾時）以 Err 回傳；HTTP 狀態碼一律放在 reply 中
    async fn get(&self, url: &str, timeout: Duration) -> Result<ArtifactReply>;
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
