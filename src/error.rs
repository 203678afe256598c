use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeMatchError {
    #[error("config error: {0}")]
    Config(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported table format: {0} (expected xlsx, xls, csv or txt)")]
    UnsupportedFormat(String),

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("spreadsheet read error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("map generation error: {0}")]
    MapGeneration(String),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TreeMatchError>;
