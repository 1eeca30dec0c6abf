use crate::core::client::ExtractionClient;
use crate::core::download::{DownloadOrchestrator, DownloadedArtifact, RetryPolicy};
use crate::core::export;
use crate::core::session::SessionState;
use crate::core::{
    normalize, ApiStatus, ConfigProvider, DocumentType, NormalizationWarning,
    NormalizedResultSet, RenameOptions, Result, Storage, TokioSleeper, UploadFile,
};
use crate::utils::validation::{validate_file_extensions, validate_non_empty_list};
use chrono::NaiveDate;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// 單次執行的選項
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub document_type: DocumentType,
    pub rename: RenameOptions,
    pub download_zip: bool,
    pub download_excel: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            document_type: DocumentType::default(),
            rename: RenameOptions::default(),
            download_zip: true,
            download_excel: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub filename: String,
    pub size: usize,
    pub attempts: u32,
    pub entries: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub document_type: DocumentType,
    pub result: Arc<NormalizedResultSet>,
    pub csv_file: String,
    pub json_file: String,
    pub archive: Option<ArchiveSummary>,
    pub excel_file: Option<String>,
    pub download_errors: Vec<String>,
}

impl RunSummary {
    pub fn successful(&self) -> usize {
        self.result.successful().count()
    }

    pub fn failed(&self) -> usize {
        self.result.failed().count()
    }

    pub fn warnings(&self) -> &[NormalizationWarning] {
        &self.result.warnings
    }
}

/// 列出 ZIP 內的檔案（略過目錄）
pub fn list_archive_entries(bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index(index)?;
        if !entry.is_dir() {
            names.push(entry.name().to_string());
        }
    }
    Ok(names)
}

/// 上傳 → 正規化 → 匯出 → 下載 的完整流程
pub struct ExtractionEngine<S: Storage, C: ConfigProvider> {
    input: S,
    output: S,
    config: C,
    client: ExtractionClient,
    downloads: DownloadOrchestrator<ExtractionClient, TokioSleeper>,
    session: SessionState,
    options: RunOptions,
    date: NaiveDate,
}

impl<S: Storage, C: ConfigProvider> ExtractionEngine<S, C> {
    pub fn new(input: S, output: S, config: C, options: RunOptions) -> Self {
        let client = ExtractionClient::from_config(&config);
        let policy = RetryPolicy {
            max_retries: config.max_retries(),
            timeout: config.download_timeout(),
            ..RetryPolicy::default()
        };
        let downloads = DownloadOrchestrator::new(client.clone(), TokioSleeper, config.base_url())
            .with_policy(policy);

        let mut session = SessionState::new();
        session.set_document_type(options.document_type);
        session.set_rename_options(options.rename);

        Self {
            input,
            output,
            config,
            client,
            downloads,
            session,
            options,
            date: chrono::Local::now().date_naive(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.downloads = self.downloads.with_policy(policy);
        self
    }

    /// 匯出檔名使用的日期
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub async fn check_health(&mut self) -> ApiStatus {
        self.session.set_api_status(ApiStatus::Checking);
        let status = self.client.health().await;
        self.session.set_api_status(status);
        status
    }

    pub async fn run(&mut self, paths: &[String]) -> Result<RunSummary> {
        tracing::info!("🚀 Starting extraction for {} file(s)", paths.len());

        validate_non_empty_list("files", paths)?;
        validate_file_extensions("files", paths, &["pdf"])?;

        if self.check_health().await == ApiStatus::Offline {
            tracing::warn!("⚠️ Extraction API at {} is offline", self.config.base_url());
        }

        let files = self.read_inputs(paths).await?;
        self.session.select_files(files);
        let request = self.session.begin_submission()?;

        let response = match self.client.extract(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.session.fail_submission();
                return Err(e);
            }
        };

        let set = normalize(response, request.rename.enabled, &request.filenames());
        let result = self.session.publish(set);
        tracing::info!(
            "📊 {} succeeded, {} failed",
            result.successful().count(),
            result.failed().count()
        );

        let (csv_file, json_file) = self.write_exports(&result).await?;

        let mut summary = RunSummary {
            document_type: request.document_type,
            result: Arc::clone(&result),
            csv_file,
            json_file,
            archive: None,
            excel_file: None,
            download_errors: Vec::new(),
        };

        if request.rename.enabled && self.options.download_zip {
            match self.downloads.fetch_zip(&result).await {
                Ok(artifact) => match self.save_archive(artifact).await {
                    Ok(archive) => summary.archive = Some(archive),
                    Err(e) => {
                        tracing::error!("❌ Could not save ZIP: {}", e);
                        summary.download_errors.push(e.user_friendly_message());
                    }
                },
                Err(e) => {
                    tracing::error!("❌ ZIP download failed: {}", e.user_friendly_message());
                    summary.download_errors.push(e.user_friendly_message());
                }
            }
        }

        if request.rename.enabled && self.options.download_excel {
            match self.downloads.fetch_excel(&result).await {
                Ok(artifact) => match self
                    .output
                    .write_file(&artifact.filename, &artifact.bytes)
                    .await
                {
                    Ok(()) => {
                        tracing::info!("📁 Saved {}", self.output_display(&artifact.filename));
                        summary.excel_file = Some(artifact.filename);
                    }
                    Err(e) => {
                        tracing::error!("❌ Could not save Excel file: {}", e);
                        summary.download_errors.push(e.user_friendly_message());
                    }
                },
                Err(e) => {
                    tracing::error!("❌ Excel download failed: {}", e.user_friendly_message());
                    summary.download_errors.push(e.user_friendly_message());
                }
            }
        }

        tracing::info!("✅ Extraction run completed");
        Ok(summary)
    }

    async fn read_inputs(&self, paths: &[String]) -> Result<Vec<UploadFile>> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = self.input.read_file(path).await?;
            let name = Path::new(path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone());
            tracing::debug!("Read {} ({} bytes)", name, bytes.len());
            files.push(UploadFile { name, bytes });
        }
        Ok(files)
    }

    async fn write_exports(&self, set: &NormalizedResultSet) -> Result<(String, String)> {
        let document_type = self.session.document_type();

        let csv_file = export::csv_file_name(document_type, self.date);
        let csv = export::to_csv(set, document_type)?;
        self.output.write_file(&csv_file, csv.as_bytes()).await?;
        tracing::info!("📁 Saved {}", self.output_display(&csv_file));

        let json_file = export::json_file_name(self.date);
        let json = export::to_json(set)?;
        self.output.write_file(&json_file, json.as_bytes()).await?;
        tracing::info!("📁 Saved {}", self.output_display(&json_file));

        Ok((csv_file, json_file))
    }

    async fn save_archive(&self, artifact: DownloadedArtifact) -> Result<ArchiveSummary> {
        let entries = list_archive_entries(&artifact.bytes)?;
        self.output
            .write_file(&artifact.filename, &artifact.bytes)
            .await?;
        tracing::info!(
            "📦 Saved {} with {} renamed file(s)",
            self.output_display(&artifact.filename),
            entries.len()
        );

        Ok(ArchiveSummary {
            size: artifact.size(),
            filename: artifact.filename,
            attempts: artifact.attempts,
            entries,
        })
    }

    fn output_display(&self, filename: &str) -> String {
        Path::new(self.config.output_path())
            .join(filename)
            .display()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_list_archive_entries() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.add_directory("renamed/", SimpleFileOptions::default()).unwrap();
        writer
            .start_file("renamed/JOHN_DOE.pdf", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"%PDF-1.4").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert_eq!(
            list_archive_entries(&bytes).unwrap(),
            vec!["renamed/JOHN_DOE.pdf"]
        );
    }

    #[test]
    fn test_corrupt_archive_is_an_error() {
        assert!(list_archive_entries(b"not a zip").is_err());
    }

    #[test]
    fn test_default_run_options() {
        let options = RunOptions::default();
        assert!(options.download_zip);
        assert!(!options.download_excel);
        assert!(!options.rename.enabled);
    }
}
