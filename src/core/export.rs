use crate::core::field_mapper::{self, Schema};
use crate::core::{ClientError, DocumentType, NormalizedResultSet, Result};
use chrono::NaiveDate;

/// 每份匯出都有的前置欄位
pub const BASE_COLUMNS: [&str; 2] = ["No", "Filename"];

pub fn header_for(schema: &Schema) -> Vec<&'static str> {
    BASE_COLUMNS
        .iter()
        .copied()
        .chain(schema.column_names())
        .collect()
}

/// 將成功的結果轉為 CSV（所有欄位加引號，缺值為空字串）
///
/// 欄位表依結果集的類型字串決定，未知類型使用通用欄位表。
pub fn to_csv(set: &NormalizedResultSet, document_type: DocumentType) -> Result<String> {
    let (schema, code) = field_mapper::schema_for_set(set, document_type);
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(header_for(schema))?;

    for (index, item) in set.successful().enumerate() {
        let row = schema.map_item(item, code);
        let mut record = vec![(index + 1).to_string(), item.filename.clone()];
        record.extend(row.export_values());
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ClientError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| ClientError::ValidationError {
        message: format!("CSV output is not valid UTF-8: {}", e),
    })
}

/// 完整結果集的 JSON 備份
pub fn to_json(set: &NormalizedResultSet) -> Result<String> {
    Ok(serde_json::to_string_pretty(set)?)
}

pub fn from_json(json: &str) -> Result<NormalizedResultSet> {
    Ok(serde_json::from_str(json)?)
}

pub fn csv_file_name(document_type: DocumentType, date: NaiveDate) -> String {
    format!(
        "Hasil_Ekstraksi_{}_{}.csv",
        document_type.code(),
        date.format("%Y-%m-%d")
    )
}

pub fn json_file_name(date: NaiveDate) -> String {
    format!("pdf_extraction_results_{}.json", date.format("%Y-%m-%d"))
}

/// 結果表格（顯示用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn table_view(set: &NormalizedResultSet, document_type: DocumentType) -> TableView {
    let (schema, code) = field_mapper::schema_for_set(set, document_type);
    let header = header_for(schema)
        .into_iter()
        .map(str::to_string)
        .collect();

    let rows = set
        .successful()
        .enumerate()
        .map(|(index, item)| {
            let mut row = vec![(index + 1).to_string(), item.filename.clone()];
            row.extend(schema.map_item(item, code).display_values());
            row
        })
        .collect();

    TableView { header, rows }
}

impl TableView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 固定寬度文字表格
    pub fn render(&self) -> String {
        if self.rows.is_empty() {
            return "No data".to_string();
        }

        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let format_line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let separator = widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-");

        let mut lines = vec![format_line(&self.header), separator];
        lines.extend(self.rows.iter().map(|row| format_line(row)));
        lines.join("\n")
    }
}

/// 每個檔案的摘要行（成功或失敗原因）
pub fn file_summaries(set: &NormalizedResultSet) -> Vec<String> {
    set.results
        .iter()
        .map(|item| match item.outcome() {
            crate::core::Outcome::Success(data) => {
                format!("✅ {} ({} fields)", item.filename, data.len())
            }
            crate::core::Outcome::Failure(reason) => {
                format!("❌ {}: {}", item.filename, reason)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{normalize, ApiResponse, ResultItem};
    use serde_json::json;

    fn evln_set() -> NormalizedResultSet {
        let response: ApiResponse = serde_json::from_value(json!({
            "success": true,
            "document_type": "EVLN",
            "total_files": 2,
            "processed_files": 1,
            "failed_files": 1,
            "results": [
                {"filename": "file.pdf", "status": "success", "data": {"Name": "John Doe", "Passport No": "X1234567"}},
                {"filename": "broken.pdf", "status": "error", "error": "cannot parse", "data": null}
            ]
        }))
        .unwrap();
        normalize(response, false, &[])
    }

    #[test]
    fn test_csv_only_contains_successful_rows() {
        let csv = to_csv(&evln_set(), DocumentType::Evln).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#""No","Filename","Name","Place of Birth","Date of Birth","Passport No","Passport Expiry","Date Issue","Document Type""#
        );
        assert_eq!(
            lines[1],
            r#""1","file.pdf","John Doe","","","X1234567","","","EVLN""#
        );
        assert!(csv.ends_with('\n'));
    }

    #[test]
    fn test_csv_escapes_quotes_and_delimiters() {
        let mut set = NormalizedResultSet::default();
        set.results.push(ResultItem::success(
            "pt, \"maju\".pdf",
            [("Name", "O\"Brien, Jr."), ("Passport No", "A1")]
                .into_iter()
                .collect(),
        ));

        let csv = to_csv(&set, DocumentType::Evln).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with(r#""1","pt, ""maju"".pdf","O""Brien, Jr.""#));

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[1], "pt, \"maju\".pdf");
        assert_eq!(&record[2], "O\"Brien, Jr.");
    }

    #[test]
    fn test_csv_is_idempotent() {
        let set = evln_set();
        assert_eq!(
            to_csv(&set, DocumentType::Evln).unwrap(),
            to_csv(&set, DocumentType::Evln).unwrap()
        );
    }

    #[test]
    fn test_csv_header_without_rows() {
        let csv = to_csv(&NormalizedResultSet::default(), DocumentType::Dkptka).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("\"No\",\"Filename\",\"Nama Pemberi Kerja\""));
    }

    #[test]
    fn test_json_round_trip() {
        let set = evln_set();
        let json = to_json(&set).unwrap();
        assert!(json.contains("\n  \"success\": true"));
        assert_eq!(from_json(&json).unwrap(), set);
    }

    #[test]
    fn test_table_view_uses_placeholders() {
        let table = table_view(&evln_set(), DocumentType::Evln);
        assert_eq!(table.header.len(), 9);
        assert_eq!(
            table.rows,
            vec![vec!["1", "file.pdf", "John Doe", "-", "-", "X1234567", "-", "-", "EVLN"]]
        );

        let rendered = table.render();
        assert!(rendered.lines().next().unwrap().starts_with("No | Filename"));
        assert_eq!(rendered.lines().count(), 3);
    }

    #[test]
    fn test_export_file_names() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(
            csv_file_name(DocumentType::Notifikasi, date),
            "Hasil_Ekstraksi_Notifikasi_2025-03-07.csv"
        );
        assert_eq!(json_file_name(date), "pdf_extraction_results_2025-03-07.json");
    }

    #[test]
    fn test_file_summaries_report_failures() {
        let summaries = file_summaries(&evln_set());
        assert_eq!(summaries.len(), 2);
        assert!(summaries[1].contains("broken.pdf: cannot parse"));
    }

    #[test]
    fn test_unknown_server_label_uses_generic_columns() {
        let mut set = evln_set();
        set.document_type = Some("PASPOR".to_string());

        let csv = to_csv(&set, DocumentType::Sktt).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[0].starts_with(r#""No","Filename","Name","Place of Birth""#));
        assert!(lines[1].ends_with(r#""X1234567","","","PASPOR""#));

        let table = table_view(&set, DocumentType::Sktt);
        assert_eq!(table.header.len(), 9);
        assert_eq!(table.rows[0].last().map(String::as_str), Some("PASPOR"));
    }

    #[test]
    fn test_server_label_wins_over_selected_type() {
        let table = table_view(&evln_set(), DocumentType::Dkptka);
        assert_eq!(table.header[2], "Name");
        assert_eq!(table.rows[0][8], "EVLN");
    }

    #[test]
    fn test_json_round_trip_of_renamed_set() {
        let response: ApiResponse = serde_json::from_value(json!({
            "success": true,
            "timestamp": "2025-02-01T08:00:00",
            "document_type": "ITK",
            "total_files": 3,
            "processed_files": 2,
            "extraction_data": [
                {"Name": "ALICE", "Passport Number": "A111", "Date Issue": null},
                {"Name": "BOB", "Tags": ["x", 1]}
            ],
            "renamed_files": {"a.pdf": "ALICE_A111.pdf", "b.pdf": "BOB.pdf"},
            "download_links": {"zip": "/download-zip/Renamed_Files_ITK.zip", "excel": "/download-excel/ITK.xlsx"},
            "file_info": {"zip_filename": "Renamed_Files_ITK.zip", "zip_size": 20480, "total_renamed_files": 2},
            "server_version": "3.1"
        }))
        .unwrap();
        let set = normalize(response, true, &["a.pdf".to_string()]);
        assert_eq!(set.warnings.len(), 1);

        let json = to_json(&set).unwrap();
        let decoded = from_json(&json).unwrap();

        assert_eq!(decoded, set);
        assert_eq!(decoded.results[1].filename, "File 2");
        assert_eq!(decoded.zip_link(), Some("/download-zip/Renamed_Files_ITK.zip"));
        assert_eq!(decoded.file_info.as_ref().and_then(|info| info.zip_size), Some(20480));
        assert_eq!(decoded.extra.get("server_version"), Some(&json!("3.1")));
        assert!(!json.contains("failed_files"));
        assert_eq!(to_json(&decoded).unwrap(), json);
    }
}
