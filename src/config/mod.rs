pub mod cli;
pub mod settings;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::settings::Overrides;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "pdf-extractor-client")]
#[command(about = "Upload scanned immigration PDFs for field extraction and export the results")]
pub struct CliConfig {
    /// PDF files to upload
    #[arg(value_name = "FILE")]
    pub files: Vec<String>,

    #[arg(long, help = "Optional TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Extraction API base URL (env: PDF_EXTRACTOR_API_URL)")]
    pub api_url: Option<String>,

    #[arg(long, help = "SKTT, EVLN, ITAS, ITK, Notifikasi or DKPTKA")]
    pub document_type: Option<String>,

    #[arg(long, help = "Rename files on the server and download them as a ZIP")]
    pub rename: bool,

    #[arg(long, help = "Do not use the holder name when renaming")]
    pub no_name: bool,

    #[arg(long, help = "Do not use the passport number when renaming")]
    pub no_passport: bool,

    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long, help = "Retries for the ZIP download")]
    pub max_retries: Option<u32>,

    #[arg(long, help = "Skip downloading the renamed-files ZIP")]
    pub skip_zip: bool,

    #[arg(long, help = "Also download the Excel workbook")]
    pub download_excel: bool,

    #[arg(long, help = "Only check whether the API is online")]
    pub check_health: bool,

    #[arg(long, help = "Validate configuration and exit")]
    pub dry_run: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 只有明確指定的旗標才覆寫設定檔
    pub fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.api_url.clone(),
            output_path: self.output_path.clone(),
            document_type: self.document_type.clone(),
            rename: self.rename.then_some(true),
            use_name: self.no_name.then_some(false),
            use_passport: self.no_passport.then_some(false),
            max_retries: self.max_retries,
            download_zip: self.skip_zip.then_some(false),
            download_excel: self.download_excel.then_some(true),
        }
    }
}
