use crate::utils::error::ClientError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 擷取服務回傳的單一欄位值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
    Absent,
    Other(serde_json::Value),
}

impl FieldValue {
    /// 顯示用文字；只有空字串與 null 視為沒有值，空白字串仍是值
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) if s.is_empty() => None,
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Flag(b) => Some(b.to_string()),
            FieldValue::Absent => None,
            FieldValue::Other(serde_json::Value::Null) => None,
            FieldValue::Other(value) => Some(value.to_string()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawExtractionRecord {
    pub fields: BTreeMap<String, FieldValue>,
}

impl RawExtractionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(FieldValue::as_text)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for RawExtractionRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    pub filename: String,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RawExtractionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// 單一檔案的處理結果視圖
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome<'a> {
    Success(&'a RawExtractionRecord),
    Failure(&'a str),
}

impl ResultItem {
    pub fn success(filename: impl Into<String>, data: RawExtractionRecord) -> Self {
        Self {
            filename: filename.into(),
            status: ResultStatus::Success,
            data: Some(data),
            error: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn failure(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: ResultStatus::Error,
            data: None,
            error: Some(error.into()),
            extra: BTreeMap::new(),
        }
    }

    pub fn outcome(&self) -> Outcome<'_> {
        match (self.status, &self.data) {
            (ResultStatus::Success, Some(data)) => Outcome::Success(data),
            (ResultStatus::Success, None) => Outcome::Failure("no data returned"),
            (ResultStatus::Error, _) => {
                Outcome::Failure(self.error.as_deref().unwrap_or("unknown error"))
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome(), Outcome::Success(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excel: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excel_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_renamed_files: Option<u32>,
}

/// `/extract` 與 `/extract-with-rename` 的原始回應
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default)]
    pub total_files: u32,
    #[serde(default)]
    pub processed_files: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_files: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ResultItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_data: Option<Vec<RawExtractionRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renamed_files: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_links: Option<DownloadLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_info: Option<FileInfo>,
    /// 未列出的欄位原樣保留
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// 回應的兩種形狀
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractResponse {
    Plain {
        results: Vec<ResultItem>,
        meta: ApiResponse,
    },
    Renamed {
        extraction_data: Vec<RawExtractionRecord>,
        meta: ApiResponse,
    },
}

impl ExtractResponse {
    pub fn classify(mut response: ApiResponse, rename_requested: bool) -> Self {
        if rename_requested {
            if let Some(extraction_data) = response.extraction_data.clone() {
                return ExtractResponse::Renamed {
                    extraction_data,
                    meta: response,
                };
            }
        }
        let results = response.results.take().unwrap_or_default();
        ExtractResponse::Plain {
            results,
            meta: response,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizationWarning {
    FilenameCountMismatch { submitted: usize, returned: usize },
    CountsInconsistent { total: u32, processed: u32, failed: u32 },
}

impl fmt::Display for NormalizationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizationWarning::FilenameCountMismatch {
                submitted,
                returned,
            } => write!(
                f,
                "{} files submitted but {} extraction entries returned; filenames matched by position",
                submitted, returned
            ),
            NormalizationWarning::CountsInconsistent {
                total,
                processed,
                failed,
            } => write!(
                f,
                "processed ({}) + failed ({}) does not equal total ({})",
                processed, failed, total
            ),
        }
    }
}

/// 正規化後的結果集，一次提交對應一份，不做原地修改
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResultSet {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default)]
    pub total_files: u32,
    #[serde(default)]
    pub processed_files: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_files: Option<u32>,
    #[serde(default)]
    pub results: Vec<ResultItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_data: Option<Vec<RawExtractionRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renamed_files: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_links: Option<DownloadLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_info: Option<FileInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<NormalizationWarning>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl NormalizedResultSet {
    pub fn successful(&self) -> impl Iterator<Item = &ResultItem> {
        self.results.iter().filter(|item| item.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ResultItem> {
        self.results.iter().filter(|item| !item.is_success())
    }

    pub fn zip_link(&self) -> Option<&str> {
        self.download_links
            .as_ref()
            .and_then(|links| links.zip.as_deref())
            .filter(|link| !link.trim().is_empty())
    }

    pub fn excel_link(&self) -> Option<&str> {
        self.download_links
            .as_ref()
            .and_then(|links| links.excel.as_deref())
            .filter(|link| !link.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "SKTT")]
    Sktt,
    #[serde(rename = "EVLN")]
    Evln,
    #[serde(rename = "ITAS")]
    Itas,
    #[serde(rename = "ITK")]
    Itk,
    #[serde(rename = "Notifikasi")]
    Notifikasi,
    #[serde(rename = "DKPTKA")]
    Dkptka,
}

impl DocumentType {
    pub const ALL: [DocumentType; 6] = [
        DocumentType::Sktt,
        DocumentType::Evln,
        DocumentType::Itas,
        DocumentType::Itk,
        DocumentType::Notifikasi,
        DocumentType::Dkptka,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            DocumentType::Sktt => "SKTT",
            DocumentType::Evln => "EVLN",
            DocumentType::Itas => "ITAS",
            DocumentType::Itk => "ITK",
            DocumentType::Notifikasi => "Notifikasi",
            DocumentType::Dkptka => "DKPTKA",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DocumentType::Sktt => "Surat Keterangan Tinggal Terbatas",
            DocumentType::Evln => "Exit Visa Luar Negeri",
            DocumentType::Itas => "Izin Tinggal Terbatas",
            DocumentType::Itk => "Izin Tinggal Kunjungan",
            DocumentType::Notifikasi => "Notifikasi TKA",
            DocumentType::Dkptka => "Dana Kompensasi Penggunaan TKA",
        }
    }
}

impl Default for DocumentType {
    fn default() -> Self {
        DocumentType::Sktt
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DocumentType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        DocumentType::ALL
            .into_iter()
            .find(|doc_type| doc_type.code().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ClientError::InvalidDocumentType {
                value: s.to_string(),
            })
    }
}

/// 檔案重新命名選項
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOptions {
    pub enabled: bool,
    pub use_name: bool,
    pub use_passport: bool,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            use_name: true,
            use_passport: true,
        }
    }
}

/// 待上傳的 PDF
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub files: Vec<UploadFile>,
    pub document_type: DocumentType,
    pub rename: RenameOptions,
}

impl ExtractionRequest {
    pub fn filenames(&self) -> Vec<String> {
        self.files.iter().map(|file| file.name.clone()).collect()
    }

    pub fn endpoint(&self) -> &'static str {
        if self.rename.enabled {
            "/extract-with-rename"
        } else {
            "/extract"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    Checking,
    Online,
    Offline,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_value_decoding() {
        let record: RawExtractionRecord = serde_json::from_value(json!({
            "Name": "JOHN DOE",
            "NIK": 1234,
            "Date Issue": null,
            "Verified": true,
            "Tags": ["a", "b"]
        }))
        .unwrap();

        assert_eq!(record.text("Name").as_deref(), Some("JOHN DOE"));
        assert_eq!(record.text("NIK").as_deref(), Some("1234"));
        assert_eq!(record.get("Date Issue"), Some(&FieldValue::Absent));
        assert_eq!(record.text("Date Issue"), None);
        assert_eq!(record.text("Verified").as_deref(), Some("true"));
        assert!(matches!(record.get("Tags"), Some(FieldValue::Other(_))));
    }

    #[test]
    fn test_empty_text_is_no_value() {
        let record: RawExtractionRecord = [("Name", ""), ("NIK", "  ")].into_iter().collect();
        assert_eq!(record.text("Name"), None);
        assert_eq!(record.text("NIK").as_deref(), Some("  "));
    }

    #[test]
    fn test_record_serialization_is_stable() {
        let payload = json!({
            "Name": "JOHN DOE", "NIK": "123", "Gender": "MALE", "Nationality": "CHN",
            "Occupation": "ENGINEER", "Address": "JAKARTA", "Date Issue": null, "Passport No": "X1"
        });
        let first = serde_json::to_string(
            &serde_json::from_value::<RawExtractionRecord>(payload.clone()).unwrap(),
        )
        .unwrap();

        for _ in 0..20 {
            let record: RawExtractionRecord = serde_json::from_value(payload.clone()).unwrap();
            assert_eq!(serde_json::to_string(&record).unwrap(), first);
        }
        assert!(first.starts_with("{\"Address\""));
    }

    #[test]
    fn test_result_item_outcome() {
        let ok = ResultItem::success("a.pdf", RawExtractionRecord::new());
        assert!(ok.is_success());

        let failed: ResultItem = serde_json::from_value(json!({
            "filename": "b.pdf",
            "status": "error",
            "error": "File is not a PDF",
            "data": null
        }))
        .unwrap();
        assert_eq!(failed.outcome(), Outcome::Failure("File is not a PDF"));

        let hollow: ResultItem = serde_json::from_value(json!({
            "filename": "c.pdf",
            "status": "success",
            "data": null
        }))
        .unwrap();
        assert!(!hollow.is_success());
    }

    #[test]
    fn test_document_type_parsing() {
        assert_eq!("EVLN".parse::<DocumentType>().unwrap(), DocumentType::Evln);
        assert_eq!(
            "notifikasi".parse::<DocumentType>().unwrap(),
            DocumentType::Notifikasi
        );
        assert!("KTP".parse::<DocumentType>().is_err());

        for doc_type in DocumentType::ALL {
            let encoded = serde_json::to_string(&doc_type).unwrap();
            assert_eq!(encoded, format!("\"{}\"", doc_type.code()));
        }
    }

    #[test]
    fn test_api_response_keeps_unknown_fields() {
        let response: ApiResponse = serde_json::from_value(json!({
            "success": true,
            "total_files": 1,
            "processed_files": 1,
            "failed_files": 0,
            "results": [],
            "server_version": "3.0.0"
        }))
        .unwrap();

        assert_eq!(response.extra.get("server_version"), Some(&json!("3.0.0")));
        let encoded = serde_json::to_value(&response).unwrap();
        assert_eq!(encoded["server_version"], json!("3.0.0"));
    }

    #[test]
    fn test_classify_prefers_extraction_data_only_when_renaming() {
        let response = ApiResponse {
            success: true,
            results: Some(vec![ResultItem::failure("x.pdf", "boom")]),
            extraction_data: Some(vec![RawExtractionRecord::new()]),
            ..Default::default()
        };

        assert!(matches!(
            ExtractResponse::classify(response.clone(), true),
            ExtractResponse::Renamed { .. }
        ));
        match ExtractResponse::classify(response, false) {
            ExtractResponse::Plain { results, .. } => assert_eq!(results.len(), 1),
            other => panic!("unexpected shape: {:?}", other),
        }
    }
}
