use crate::utils::error::{ClientError, Result};
use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub api: ApiSection,
    pub download: DownloadSection,
    pub output: OutputSection,
    pub extraction: ExtractionSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: Option<String>,
    pub health_timeout_seconds: Option<u64>,
    pub request_timeout_seconds: Option<u64>,
    pub download_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSection {
    pub max_retries: Option<u32>,
    pub not_found_delay_ms: Option<u64>,
    pub network_delay_ms: Option<u64>,
    pub zip: Option<bool>,
    pub excel: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSection {
    pub document_type: Option<String>,
    pub rename: Option<bool>,
    pub use_name: Option<bool>,
    pub use_passport: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ClientError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ClientError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PDF_EXTRACTOR_API_URL})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ClientError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.api.base_url {
            validate_url("api.base_url", base_url)?;
        }
        if let Some(path) = &self.output.path {
            validate_path("output.path", path)?;
        }
        if let Some(retries) = self.download.max_retries {
            validate_range("download.max_retries", retries, 0, 10)?;
        }
        if let Some(document_type) = &self.extraction.document_type {
            document_type.parse::<crate::core::DocumentType>()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::from_toml_str(
            r#"
[api]
base_url = "http://localhost:7860"
request_timeout_seconds = 45

[download]
max_retries = 4
not_found_delay_ms = 500
excel = true

[output]
path = "./hasil"

[extraction]
document_type = "ITAS"
rename = true
use_passport = false
"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url.as_deref(), Some("http://localhost:7860"));
        assert_eq!(config.api.request_timeout_seconds, Some(45));
        assert_eq!(config.api.health_timeout_seconds, None);
        assert_eq!(config.download.max_retries, Some(4));
        assert_eq!(config.download.excel, Some(true));
        assert_eq!(config.output.path.as_deref(), Some("./hasil"));
        assert_eq!(config.extraction.rename, Some(true));
        assert_eq!(config.extraction.use_name, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("PDF_CLIENT_TOML_TEST_HOST", "http://extractor.internal:8000");
        let config = TomlConfig::from_toml_str(
            r#"
[api]
base_url = "${PDF_CLIENT_TOML_TEST_HOST}"

[output]
path = "${PDF_CLIENT_TOML_TEST_UNSET}/out"
"#,
        )
        .unwrap();

        assert_eq!(
            config.api.base_url.as_deref(),
            Some("http://extractor.internal:8000")
        );
        assert_eq!(
            config.output.path.as_deref(),
            Some("${PDF_CLIENT_TOML_TEST_UNSET}/out")
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_type = TomlConfig::from_toml_str("[extraction]\ndocument_type = \"KTP\"").unwrap();
        assert!(matches!(
            bad_type.validate(),
            Err(ClientError::InvalidDocumentType { .. })
        ));

        let bad_url = TomlConfig::from_toml_str("[api]\nbase_url = \"ftp://host\"").unwrap();
        assert!(bad_url.validate().is_err());

        assert!(TomlConfig::from_toml_str("[api\nbase_url=").is_err());
    }
}
