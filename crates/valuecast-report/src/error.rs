use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("report io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("report serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("sheet '{sheet}' exceeds the worksheet row or column limit")]
    SheetTooLarge { sheet: String },

    #[error("sheet name cannot be empty")]
    EmptySheetName,
}
