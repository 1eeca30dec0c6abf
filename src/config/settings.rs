use crate::config::toml_config::TomlConfig;
use crate::core::download::RetryPolicy;
use crate::core::engine::RunOptions;
use crate::core::{ConfigProvider, DocumentType, RenameOptions};
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://fermanta-pdf-extractor-api.hf.space";
pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const BASE_URL_ENV: &str = "PDF_EXTRACTOR_API_URL";

/// 命令列覆寫值；未指定者為 None
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub output_path: Option<String>,
    pub document_type: Option<String>,
    pub rename: Option<bool>,
    pub use_name: Option<bool>,
    pub use_passport: Option<bool>,
    pub max_retries: Option<u32>,
    pub download_zip: Option<bool>,
    pub download_excel: Option<bool>,
}

/// 合併後的最終設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub output_path: String,
    pub health_timeout: Duration,
    pub request_timeout: Duration,
    pub download_timeout: Duration,
    pub max_retries: u32,
    pub not_found_delay: Duration,
    pub network_delay: Duration,
    pub document_type: DocumentType,
    pub rename: RenameOptions,
    pub download_zip: bool,
    pub download_excel: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            health_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            download_timeout: policy.timeout,
            max_retries: policy.max_retries,
            not_found_delay: policy.not_found_delay,
            network_delay: policy.network_delay,
            document_type: DocumentType::default(),
            rename: RenameOptions::default(),
            download_zip: true,
            download_excel: false,
        }
    }
}

impl ClientConfig {
    /// 優先順序：命令列 > 環境變數 > TOML > 預設值
    pub fn resolve(
        overrides: &Overrides,
        env_base_url: Option<String>,
        file: Option<&TomlConfig>,
    ) -> Result<Self> {
        let defaults = Self::default();
        let file = file.cloned().unwrap_or_default();

        let base_url = overrides
            .base_url
            .clone()
            .or(env_base_url.filter(|url| !url.trim().is_empty()))
            .or(file.api.base_url)
            .unwrap_or(defaults.base_url);

        let document_type = match overrides
            .document_type
            .as_deref()
            .or(file.extraction.document_type.as_deref())
        {
            Some(value) => value.parse()?,
            None => defaults.document_type,
        };

        let rename = RenameOptions {
            enabled: overrides
                .rename
                .or(file.extraction.rename)
                .unwrap_or(defaults.rename.enabled),
            use_name: overrides
                .use_name
                .or(file.extraction.use_name)
                .unwrap_or(defaults.rename.use_name),
            use_passport: overrides
                .use_passport
                .or(file.extraction.use_passport)
                .unwrap_or(defaults.rename.use_passport),
        };

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            output_path: overrides
                .output_path
                .clone()
                .or(file.output.path)
                .unwrap_or(defaults.output_path),
            health_timeout: file
                .api
                .health_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.health_timeout),
            request_timeout: file
                .api
                .request_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            download_timeout: file
                .api
                .download_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.download_timeout),
            max_retries: overrides
                .max_retries
                .or(file.download.max_retries)
                .unwrap_or(defaults.max_retries),
            not_found_delay: file
                .download
                .not_found_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.not_found_delay),
            network_delay: file
                .download
                .network_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.network_delay),
            document_type,
            rename,
            download_zip: overrides
                .download_zip
                .or(file.download.zip)
                .unwrap_or(defaults.download_zip),
            download_excel: overrides
                .download_excel
                .or(file.download.excel)
                .unwrap_or(defaults.download_excel),
        })
    }

    /// 讀取環境變數與（可選的）設定檔後合併
    pub fn load(overrides: &Overrides, config_file: Option<&str>) -> Result<Self> {
        let file = match config_file {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path);
                let file = TomlConfig::from_file(path)?;
                file.validate()?;
                Some(file)
            }
            None => None,
        };
        let env_base_url = std::env::var(BASE_URL_ENV).ok();
        Self::resolve(overrides, env_base_url, file.as_ref())
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            document_type: self.document_type,
            rename: self.rename,
            download_zip: self.download_zip,
            download_excel: self.download_excel,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            not_found_delay: self.not_found_delay,
            network_delay: self.network_delay,
            timeout: self.download_timeout,
        }
    }
}

impl ConfigProvider for ClientConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn health_timeout(&self) -> Duration {
        self.health_timeout
    }

    fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    fn download_timeout(&self) -> Duration {
        self.download_timeout
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url)?;
        validate_path("output_path", &self.output_path)?;
        validate_range("max_retries", self.max_retries, 0, 10)?;
        validate_range("request_timeout", self.request_timeout.as_secs(), 1, 600)?;
        Ok(())
    }
}
