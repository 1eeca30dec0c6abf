//! 依文件類型將原始擷取記錄對應到固定欄位。
//!
//! 每個欄位有一條別名查找鏈：依序嘗試主要鍵名、英文／印尼文別名、
//! 由合併欄位切分出的值，最後才回退到文件類型代碼。新增文件類型只需
//! 新增一張欄位表。

use crate::core::{DocumentType, NormalizedResultSet, RawExtractionRecord, ResultItem};

/// 顯示表格中未解析欄位的佔位符
pub const PLACEHOLDER: &str = "-";

/// 單一查找步驟
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Key(&'static str),
    /// 合併欄位第一個逗號之前的部分
    Before(&'static str),
    /// 合併欄位第一個逗號之後的部分
    After(&'static str),
    DocumentCode,
}

impl Lookup {
    fn resolve(&self, record: &RawExtractionRecord, code: &str) -> Option<String> {
        match self {
            Lookup::Key(key) => record.text(key),
            Lookup::Before(key) => {
                let combined = record.text(key)?;
                let place = match combined.split_once(',') {
                    Some((before, _)) => before.trim().to_string(),
                    None => combined.trim().to_string(),
                };
                Some(place).filter(|s| !s.is_empty())
            }
            Lookup::After(key) => {
                let combined = record.text(key)?;
                let (_, after) = combined.split_once(',')?;
                Some(after.trim().to_string()).filter(|s| !s.is_empty())
            }
            Lookup::DocumentCode => Some(code.to_string()).filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub lookups: &'static [Lookup],
}

impl Column {
    pub fn resolve(&self, record: &RawExtractionRecord, code: &str) -> Option<String> {
        self.lookups
            .iter()
            .find_map(|lookup| lookup.resolve(record, code))
    }
}

const fn col(name: &'static str, lookups: &'static [Lookup]) -> Column {
    Column { name, lookups }
}

use Lookup::{After, Before, DocumentCode, Key};

const NAME: Column = col("Name", &[Key("Name"), Key("Nama TKA")]);
const PLACE_OF_BIRTH: Column = col(
    "Place of Birth",
    &[
        Key("Place of Birth"),
        Before("Place & Date of Birth"),
        Before("Tempat/Tanggal Lahir"),
    ],
);
const DATE_OF_BIRTH: Column = col(
    "Date of Birth",
    &[
        Key("Date of Birth"),
        After("Place & Date of Birth"),
        After("Tempat/Tanggal Lahir"),
    ],
);
const PASSPORT_NO: Column = col(
    "Passport No",
    &[Key("Passport No"), Key("Passport Number"), Key("Nomor Paspor")],
);
const PASSPORT_NUMBER: Column = col(
    "Passport Number",
    &[Key("Passport Number"), Key("Passport No"), Key("Nomor Paspor")],
);
const PASSPORT_EXPIRY: Column = col("Passport Expiry", &[Key("Passport Expiry")]);
const DATE_ISSUE: Column = col("Date Issue", &[Key("Date Issue")]);
const GENDER: Column = col("Gender", &[Key("Gender"), Key("Jenis Kelamin")]);
const NATIONALITY: Column = col("Nationality", &[Key("Nationality"), Key("Kewarganegaraan")]);
const OCCUPATION: Column = col("Occupation", &[Key("Occupation"), Key("Jabatan")]);
const ADDRESS: Column = col("Address", &[Key("Address"), Key("Alamat Tempat Tinggal")]);
const DOCUMENT_TYPE: Column = col(
    "Document Type",
    &[Key("Document Type"), Key("Jenis Dokumen"), DocumentCode],
);

const SKTT_COLUMNS: &[Column] = &[
    NAME,
    col("NIK", &[Key("NIK")]),
    PLACE_OF_BIRTH,
    DATE_OF_BIRTH,
    GENDER,
    NATIONALITY,
    OCCUPATION,
    ADDRESS,
    col("KITAS/KITAP", &[Key("KITAS/KITAP"), Key("Permit Number")]),
    PASSPORT_EXPIRY,
    DATE_ISSUE,
    DOCUMENT_TYPE,
];

const EVLN_COLUMNS: &[Column] = &[
    NAME,
    PLACE_OF_BIRTH,
    DATE_OF_BIRTH,
    PASSPORT_NO,
    PASSPORT_EXPIRY,
    DATE_ISSUE,
    DOCUMENT_TYPE,
];

const PERMIT_COLUMNS: &[Column] = &[
    NAME,
    col("Permit Number", &[Key("Permit Number"), Key("KITAS/KITAP")]),
    col(
        "Place & Date of Birth",
        &[Key("Place & Date of Birth"), Key("Tempat/Tanggal Lahir")],
    ),
    PASSPORT_NUMBER,
    PASSPORT_EXPIRY,
    col("Stay Permit Expiry", &[Key("Stay Permit Expiry")]),
    NATIONALITY,
    GENDER,
    ADDRESS,
    OCCUPATION,
    DATE_ISSUE,
    DOCUMENT_TYPE,
];

const NOTIFIKASI_COLUMNS: &[Column] = &[
    col("Nomor Keputusan", &[Key("Nomor Keputusan")]),
    col("Nama TKA", &[Key("Nama TKA"), Key("Name")]),
    col(
        "Tempat/Tanggal Lahir",
        &[Key("Tempat/Tanggal Lahir"), Key("Place & Date of Birth")],
    ),
    col("Kewarganegaraan", &[Key("Kewarganegaraan"), Key("Nationality")]),
    col(
        "Alamat Tempat Tinggal",
        &[Key("Alamat Tempat Tinggal"), Key("Address")],
    ),
    col(
        "Nomor Paspor",
        &[Key("Nomor Paspor"), Key("Passport No"), Key("Passport Number")],
    ),
    col("Jabatan", &[Key("Jabatan"), Key("Occupation")]),
    col("Lokasi Kerja", &[Key("Lokasi Kerja")]),
    col("Berlaku", &[Key("Berlaku")]),
    DATE_ISSUE,
    DOCUMENT_TYPE,
];

// DKPTKA 只使用伺服器原始鍵名
const DKPTKA_COLUMNS: &[Column] = &[
    col("Nama Pemberi Kerja", &[Key("Nama Pemberi Kerja")]),
    col("Alamat", &[Key("Alamat")]),
    col("No Telepon", &[Key("No Telepon")]),
    col("Email", &[Key("Email")]),
    col("Nama TKA", &[Key("Nama TKA")]),
    col("Tempat/Tanggal Lahir", &[Key("Tempat/Tanggal Lahir")]),
    col("Nomor Paspor", &[Key("Nomor Paspor")]),
    col("Kewarganegaraan", &[Key("Kewarganegaraan")]),
    col("Jabatan", &[Key("Jabatan")]),
    col("Lokasi Kerja", &[Key("Lokasi Kerja")]),
    col("Kode Billing Pembayaran", &[Key("Kode Billing Pembayaran")]),
    col("DKPTKA", &[Key("DKPTKA")]),
    DOCUMENT_TYPE,
];

/// 一種文件類型的欄位表
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub document_type: Option<DocumentType>,
    pub columns: &'static [Column],
}

static SKTT_SCHEMA: Schema = Schema {
    document_type: Some(DocumentType::Sktt),
    columns: SKTT_COLUMNS,
};
static EVLN_SCHEMA: Schema = Schema {
    document_type: Some(DocumentType::Evln),
    columns: EVLN_COLUMNS,
};
static ITAS_SCHEMA: Schema = Schema {
    document_type: Some(DocumentType::Itas),
    columns: PERMIT_COLUMNS,
};
static ITK_SCHEMA: Schema = Schema {
    document_type: Some(DocumentType::Itk),
    columns: PERMIT_COLUMNS,
};
static NOTIFIKASI_SCHEMA: Schema = Schema {
    document_type: Some(DocumentType::Notifikasi),
    columns: NOTIFIKASI_COLUMNS,
};
static DKPTKA_SCHEMA: Schema = Schema {
    document_type: Some(DocumentType::Dkptka),
    columns: DKPTKA_COLUMNS,
};

/// 未知文件類型使用的通用欄位表
pub static GENERIC_SCHEMA: Schema = Schema {
    document_type: None,
    columns: EVLN_COLUMNS,
};

pub fn schema(document_type: DocumentType) -> &'static Schema {
    match document_type {
        DocumentType::Sktt => &SKTT_SCHEMA,
        DocumentType::Evln => &EVLN_SCHEMA,
        DocumentType::Itas => &ITAS_SCHEMA,
        DocumentType::Itk => &ITK_SCHEMA,
        DocumentType::Notifikasi => &NOTIFIKASI_SCHEMA,
        DocumentType::Dkptka => &DKPTKA_SCHEMA,
    }
}

/// 依伺服器回傳的類型字串選擇欄位表，無法辨識時回退到通用欄位表
pub fn schema_for_label(label: &str) -> &'static Schema {
    match label.parse::<DocumentType>() {
        Ok(document_type) => schema(document_type),
        Err(_) => {
            tracing::debug!("Unknown document type '{}', using generic columns", label);
            &GENERIC_SCHEMA
        }
    }
}

/// 結果集使用的欄位表與文件類型代碼
///
/// 伺服器回傳的類型字串優先；沒有時使用選取的類型。
pub fn schema_for_set(
    set: &NormalizedResultSet,
    selected: DocumentType,
) -> (&'static Schema, &str) {
    match set
        .document_type
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty())
    {
        Some(label) => {
            let schema = schema_for_label(label);
            let code = schema
                .document_type
                .map(|document_type| document_type.code())
                .unwrap_or(label);
            (schema, code)
        }
        None => (schema(selected), selected.code()),
    }
}

impl Schema {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.name).collect()
    }

    pub fn map_record(&self, record: &RawExtractionRecord, code: &str) -> MappedRow {
        let cells = self
            .columns
            .iter()
            .map(|column| Cell {
                column: column.name,
                value: column.resolve(record, code),
            })
            .collect();
        MappedRow { cells }
    }

    pub fn map_item(&self, item: &ResultItem, code: &str) -> MappedRow {
        let empty = RawExtractionRecord::new();
        let record = item.data.as_ref().unwrap_or(&empty);
        self.map_record(record, code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub column: &'static str,
    pub value: Option<String>,
}

/// 依欄位表順序排列的一列資料
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRow {
    pub cells: Vec<Cell>,
}

impl MappedRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|cell| cell.column == column)
            .and_then(|cell| cell.value.as_deref())
    }

    /// 顯示用：缺值以 `-` 呈現
    pub fn display(&self, column: &str) -> &str {
        self.get(column).unwrap_or(PLACEHOLDER)
    }

    pub fn display_values(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|cell| cell.value.clone().unwrap_or_else(|| PLACEHOLDER.to_string()))
            .collect()
    }

    /// 匯出用：缺值為空字串
    pub fn export_values(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|cell| cell.value.clone().unwrap_or_default())
            .collect()
    }
}

pub fn columns_for(document_type: DocumentType) -> Vec<&'static str> {
    schema(document_type).column_names()
}

pub fn row_for(document_type: DocumentType, item: &ResultItem) -> MappedRow {
    schema(document_type).map_item(item, document_type.code())
}
