//! QR short-link generation and validation.
//!
//! Every bin QR code encodes a URL ending in a compact random short code.
//! The server stores the code together with a checksum over the signed
//! payload (version, bin id, short code, issue time) so a tampered or
//! corrupted record is detected at resolve time.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};

/// Checksum payload version. Bump when the payload layout changes.
pub const PAYLOAD_VERSION: &str = "v1";

/// Length of the random portion backing a short code (6 bytes -> 8 chars).
const SHORT_CODE_BYTES: usize = 6;

/// Generates a URL-safe random short code.
pub fn generate_short_code() -> AppResult<String> {
    let mut buf = [0u8; SHORT_CODE_BYTES];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| AppError::Internal("Random generator failure".to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(buf))
}

/// Computes the integrity checksum stored alongside a short code:
/// the first 8 hex chars of sha256 over "v1:{bin_id}:{short_code}:{issued_at}".
pub fn checksum(bin_id: &str, short_code: &str, issued_at: DateTime<Utc>) -> String {
    let payload = format!(
        "{}:{}:{}:{}",
        PAYLOAD_VERSION,
        bin_id,
        short_code,
        issued_at.timestamp()
    );
    let digest = Sha256::digest(payload.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..8].to_string()
}

/// Validates a stored QR record at resolve time. Expiration is checked
/// before integrity so a stale-but-intact code reports "expired".
pub fn validate(
    bin_id: &str,
    short_code: &str,
    stored_checksum: &str,
    issued_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if let Some(expiry) = expires_at {
        if now >= expiry {
            return Err(AppError::QrExpired);
        }
    }
    if checksum(bin_id, short_code, issued_at) != stored_checksum {
        return Err(AppError::QrChecksumMismatch);
    }
    Ok(())
}

/// The URL a scanner lands on, e.g. https://bin.example.com/s/AbCd12xY
pub fn scan_url(base_url: &str, short_code: &str) -> String {
    format!("{}/s/{}", base_url.trim_end_matches('/'), short_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn issued() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_short_code_shape() {
        let code = generate_short_code().unwrap();
        assert_eq!(code.len(), 8);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_short_codes_are_unique_enough() {
        let a = generate_short_code().unwrap();
        let b = generate_short_code().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_checksum_is_deterministic() {
        let a = checksum("bin-1", "AbCd12xY", issued());
        let b = checksum("bin-1", "AbCd12xY", issued());
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn test_checksum_binds_all_fields() {
        let base = checksum("bin-1", "AbCd12xY", issued());
        assert_ne!(base, checksum("bin-2", "AbCd12xY", issued()));
        assert_ne!(base, checksum("bin-1", "AbCd12xZ", issued()));
        assert_ne!(base, checksum("bin-1", "AbCd12xY", issued() + Duration::seconds(1)));
    }

    #[test]
    fn test_validate_ok() {
        let sum = checksum("bin-1", "AbCd12xY", issued());
        let result = validate("bin-1", "AbCd12xY", &sum, issued(), None, Utc::now());
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_expired() {
        let sum = checksum("bin-1", "AbCd12xY", issued());
        let expiry = issued() + Duration::hours(1);
        let err = validate(
            "bin-1",
            "AbCd12xY",
            &sum,
            issued(),
            Some(expiry),
            expiry + Duration::seconds(1),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::QrExpired));

        // One second before expiry still resolves
        assert!(validate(
            "bin-1",
            "AbCd12xY",
            &sum,
            issued(),
            Some(expiry),
            expiry - Duration::seconds(1),
        )
        .is_ok());
    }

    #[test]
    fn test_validate_checksum_mismatch() {
        let err = validate("bin-1", "AbCd12xY", "00000000", issued(), None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, AppError::QrChecksumMismatch));
    }

    #[test]
    fn test_expiry_reported_before_checksum() {
        // Both expired and tampered: expiration wins
        let expiry = issued() + Duration::hours(1);
        let err = validate(
            "bin-1",
            "AbCd12xY",
            "00000000",
            issued(),
            Some(expiry),
            expiry + Duration::hours(1),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::QrExpired));
    }

    #[test]
    fn test_scan_url() {
        assert_eq!(
            scan_url("https://bin.example.com/", "AbCd12xY"),
            "https://bin.example.com/s/AbCd12xY"
        );
    }
}
