use crate::core::{
    ApiStatus, ClientError, DocumentType, ExtractionRequest, NormalizedResultSet, RenameOptions,
    Result, UploadFile,
};
use std::sync::Arc;

/// 單一寫入者的工作階段狀態
///
/// 結果集以 `Arc` 快照整份替換，讀取端不會看到建構中的資料。
#[derive(Debug)]
pub struct SessionState {
    document_type: DocumentType,
    rename: RenameOptions,
    files: Vec<UploadFile>,
    api_status: ApiStatus,
    result: Option<Arc<NormalizedResultSet>>,
    in_flight: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            document_type: DocumentType::default(),
            rename: RenameOptions::default(),
            files: Vec::new(),
            api_status: ApiStatus::Checking,
            result: None,
            in_flight: false,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn rename_options(&self) -> RenameOptions {
        self.rename
    }

    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    pub fn api_status(&self) -> ApiStatus {
        self.api_status
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn current(&self) -> Option<Arc<NormalizedResultSet>> {
        self.result.clone()
    }

    /// 換檔案時清掉上一次的結果
    pub fn select_files(&mut self, files: Vec<UploadFile>) {
        tracing::debug!("Selected {} file(s)", files.len());
        self.files = files;
        self.result = None;
    }

    pub fn set_document_type(&mut self, document_type: DocumentType) {
        self.document_type = document_type;
    }

    pub fn set_rename_options(&mut self, rename: RenameOptions) {
        self.rename = rename;
    }

    pub fn set_api_status(&mut self, status: ApiStatus) {
        if self.api_status != status {
            tracing::debug!("API status changed: {:?} -> {:?}", self.api_status, status);
        }
        self.api_status = status;
    }

    /// 檢查前置條件並標記為處理中，回傳要送出的請求
    pub fn begin_submission(&mut self) -> Result<ExtractionRequest> {
        if self.in_flight {
            return Err(ClientError::SubmissionInProgress);
        }
        if self.files.is_empty() {
            return Err(ClientError::ValidationError {
                message: "Please select at least one PDF file".to_string(),
            });
        }
        if self.api_status == ApiStatus::Offline {
            return Err(ClientError::ApiOffline);
        }

        self.in_flight = true;
        Ok(ExtractionRequest {
            files: self.files.clone(),
            document_type: self.document_type,
            rename: self.rename,
        })
    }

    pub fn publish(&mut self, set: NormalizedResultSet) -> Arc<NormalizedResultSet> {
        let snapshot = Arc::new(set);
        self.result = Some(Arc::clone(&snapshot));
        self.in_flight = false;
        snapshot
    }

    /// 提交失敗：保留上一份結果，解除處理中狀態
    pub fn fail_submission(&mut self) {
        self.in_flight = false;
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.result = None;
        self.in_flight = false;
    }
}
