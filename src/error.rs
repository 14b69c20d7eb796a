use thiserror::Error;
use tonic::Status;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Search engine error: {0}")]
    Search(String),

    #[error("QR code expired")]
    QrExpired,

    #[error("QR code checksum mismatch")]
    QrChecksumMismatch,
}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Database(e) => Status::internal(format!("Database error: {}", e)),
            AppError::NotFound(msg) => Status::not_found(msg),
            AppError::InvalidInput(msg) => Status::invalid_argument(msg),
            AppError::AlreadyExists(msg) => Status::already_exists(msg),
            AppError::Internal(msg) => Status::internal(msg),
            AppError::Storage(msg) => Status::internal(format!("Storage error: {}", msg)),
            AppError::Search(msg) => Status::unavailable(format!("Search engine error: {}", msg)),
            AppError::QrExpired => Status::failed_precondition("QR code expired"),
            AppError::QrChecksumMismatch => Status::data_loss("QR code checksum mismatch"),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_failures_map_to_distinct_codes() {
        let expired: Status = AppError::QrExpired.into();
        let mismatch: Status = AppError::QrChecksumMismatch.into();
        let missing: Status = AppError::NotFound("QR code not found".into()).into();

        assert_eq!(expired.code(), tonic::Code::FailedPrecondition);
        assert_eq!(mismatch.code(), tonic::Code::DataLoss);
        assert_eq!(missing.code(), tonic::Code::NotFound);
    }
}
