use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset missing required column: {0}")]
    MissingColumn(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_missing_column() {
        let err = DatasetError::MissingColumn("Line");
        assert_eq!(err.to_string(), "dataset missing required column: Line");
    }

    #[test]
    fn error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DatasetError = io_err.into();
        assert!(err.to_string().contains("file not found"));
        assert!(matches!(err, DatasetError::Io(_)));
    }
}
