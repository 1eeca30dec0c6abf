use crate::core::{ApiResponse, ExtractResponse, NormalizationWarning, NormalizedResultSet, ResultItem};

/// 將兩種 API 回應形狀統一為單一結果清單
///
/// 重新命名模式下伺服器只回傳 `extraction_data`，檔名依提交順序逐一對應；
/// 數量不一致時不會失敗，而是在結果集上附加警告。
pub fn normalize(
    response: ApiResponse,
    rename_requested: bool,
    submitted_filenames: &[String],
) -> NormalizedResultSet {
    let mut warnings = Vec::new();

    let (results, meta) = match ExtractResponse::classify(response, rename_requested) {
        ExtractResponse::Plain { results, meta } => {
            tracing::debug!("Normalizing plain response with {} results", results.len());
            (results, meta)
        }
        ExtractResponse::Renamed {
            extraction_data,
            meta,
        } => {
            if extraction_data.len() != submitted_filenames.len() {
                let warning = NormalizationWarning::FilenameCountMismatch {
                    submitted: submitted_filenames.len(),
                    returned: extraction_data.len(),
                };
                tracing::warn!("⚠️ {}", warning);
                warnings.push(warning);
            }

            let results = extraction_data
                .into_iter()
                .enumerate()
                .map(|(index, data)| {
                    let filename = submitted_filenames
                        .get(index)
                        .cloned()
                        .unwrap_or_else(|| format!("File {}", index + 1));
                    ResultItem::success(filename, data)
                })
                .collect::<Vec<_>>();

            tracing::debug!("Normalized {} renamed extraction entries", results.len());
            (results, meta)
        }
    };

    if let Some(failed) = meta.failed_files {
        if meta.processed_files.checked_add(failed) != Some(meta.total_files) {
            let warning = NormalizationWarning::CountsInconsistent {
                total: meta.total_files,
                processed: meta.processed_files,
                failed,
            };
            tracing::warn!("⚠️ {}", warning);
            warnings.push(warning);
        }
    }

    NormalizedResultSet {
        success: meta.success,
        timestamp: meta.timestamp,
        document_type: meta.document_type,
        total_files: meta.total_files,
        processed_files: meta.processed_files,
        failed_files: meta.failed_files,
        results,
        extraction_data: meta.extraction_data,
        renamed_files: meta.renamed_files,
        download_links: meta.download_links,
        file_info: meta.file_info,
        warnings,
        extra: meta.extra,
    }
}
