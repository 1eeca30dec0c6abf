pub mod client;
pub mod download;
pub mod engine;
pub mod export;
pub mod field_mapper;
pub mod normalizer;
pub mod session;

pub use crate::domain::model::{
    ApiResponse, ApiStatus, DocumentType, DownloadLinks, ExtractResponse, ExtractionRequest,
    FieldValue, FileInfo, NormalizationWarning, NormalizedResultSet, Outcome, RawExtractionRecord,
    RenameOptions, ResultItem, ResultStatus, UploadFile,
};
pub use crate::domain::ports::{
    ArtifactReply, ArtifactSource, ConfigProvider, Sleeper, Storage, TokioSleeper,
};
pub use crate::utils::error::{ClientError, Result};
pub use normalizer::normalize;
