//! TOTP (RFC 6238) two-factor codes: HMAC-SHA1, 30 second steps, 6 digits.
//!
//! Secrets are stored and displayed base32-encoded (the format expected by
//! authenticator apps).

use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::{AppError, AppResult};

const BASE32_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Time step in seconds.
pub const TOTP_STEP: u64 = 30;

/// Number of digits in a code.
pub const TOTP_DIGITS: u32 = 6;

/// Accepted clock skew, in steps, on either side of "now".
const TOTP_SKEW_STEPS: u64 = 1;

/// RFC 4648 base32 encoding without padding.
pub fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8 + 4) / 5);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for &byte in data {
        buffer = (buffer << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

/// RFC 4648 base32 decoding. Case-insensitive, padding ignored.
pub fn base32_decode(encoded: &str) -> AppResult<Vec<u8>> {
    let mut out = Vec::with_capacity(encoded.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for c in encoded.chars() {
        if c == '=' {
            continue;
        }
        let value = BASE32_ALPHABET
            .iter()
            .position(|&a| a == c.to_ascii_uppercase() as u8)
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid base32 character: {}", c)))?;
        buffer = (buffer << 5) | value as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
        }
    }
    Ok(out)
}

/// Generates a fresh 20-byte TOTP secret, base32-encoded.
pub fn generate_secret() -> AppResult<String> {
    let mut buf = [0u8; 20];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| AppError::Internal("Random generator failure".to_string()))?;
    Ok(base32_encode(&buf))
}

/// Computes the TOTP code for a raw secret at the given unix time.
pub fn totp(secret: &[u8], unix_time: u64) -> String {
    let counter = unix_time / TOTP_STEP;
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret);
    let tag = hmac::sign(&key, &counter.to_be_bytes());
    let digest = tag.as_ref();

    // RFC 4226 dynamic truncation
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32);
    let code = binary % 10u32.pow(TOTP_DIGITS);
    format!("{:0width$}", code, width = TOTP_DIGITS as usize)
}

/// Verifies a user-supplied code against a base32 secret, accepting
/// one step of clock skew in either direction.
pub fn verify_totp(secret_base32: &str, code: &str, unix_time: u64) -> AppResult<bool> {
    let secret = base32_decode(secret_base32)?;
    if code.len() != TOTP_DIGITS as usize || !code.chars().all(|c| c.is_ascii_digit()) {
        return Ok(false);
    }
    let start = unix_time.saturating_sub(TOTP_SKEW_STEPS * TOTP_STEP);
    let mut t = start;
    while t <= unix_time + TOTP_SKEW_STEPS * TOTP_STEP {
        if totp(&secret, t) == code {
            return Ok(true);
        }
        t += TOTP_STEP;
    }
    Ok(false)
}

/// Builds the otpauth:// provisioning URL encoded into the setup QR code.
pub fn otpauth_url(secret_base32: &str, account: &str, issuer: &str) -> String {
    format!(
        "otpauth://totp/{}:{}?secret={}&issuer={}&algorithm=SHA1&digits={}&period={}",
        urlencoding::encode(issuer),
        urlencoding::encode(account),
        secret_base32,
        urlencoding::encode(issuer),
        TOTP_DIGITS,
        TOTP_STEP,
    )
}

/// Generates `count` single-use recovery codes (8 base32 chars each).
pub fn generate_recovery_codes(count: usize) -> AppResult<Vec<String>> {
    let rng = SystemRandom::new();
    let mut codes = Vec::with_capacity(count);
    for _ in 0..count {
        let mut buf = [0u8; 5];
        rng.fill(&mut buf)
            .map_err(|_| AppError::Internal("Random generator failure".to_string()))?;
        codes.push(base32_encode(&buf));
    }
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 Appendix B test secret
    const RFC_SECRET: &[u8] = b"12345678901234567890";

    #[test]
    fn test_base32_rfc4648_vectors() {
        assert_eq!(base32_encode(b""), "");
        assert_eq!(base32_encode(b"f"), "MY");
        assert_eq!(base32_encode(b"fo"), "MZXQ");
        assert_eq!(base32_encode(b"foo"), "MZXW6");
        assert_eq!(base32_encode(b"foob"), "MZXW6YQ");
        assert_eq!(base32_encode(b"fooba"), "MZXW6YTB");
        assert_eq!(base32_encode(b"foobar"), "MZXW6YTBOI");
    }

    #[test]
    fn test_base32_round_trip() {
        let encoded = base32_encode(RFC_SECRET);
        assert_eq!(encoded, "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ");
        assert_eq!(base32_decode(&encoded).unwrap(), RFC_SECRET);
        // lowercase and padding are tolerated
        assert_eq!(base32_decode("mzxw6ytboi======").unwrap(), b"foobar");
    }

    #[test]
    fn test_base32_rejects_invalid_chars() {
        assert!(base32_decode("MZXW1").is_err());
    }

    #[test]
    fn test_totp_rfc6238_vectors() {
        // RFC 6238 Appendix B, truncated to 6 digits
        assert_eq!(totp(RFC_SECRET, 59), "287082");
        assert_eq!(totp(RFC_SECRET, 1_111_111_109), "081804");
        assert_eq!(totp(RFC_SECRET, 1_111_111_111), "050471");
        assert_eq!(totp(RFC_SECRET, 1_234_567_890), "005924");
        assert_eq!(totp(RFC_SECRET, 2_000_000_000), "279037");
    }

    #[test]
    fn test_verify_accepts_adjacent_steps() {
        let secret = base32_encode(RFC_SECRET);
        // Code for t=59 is in the step [30, 60); at t=75 it is one step old
        assert!(verify_totp(&secret, "287082", 75).unwrap());
        // Two steps away is rejected
        assert!(!verify_totp(&secret, "287082", 59 + 2 * TOTP_STEP + 1).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_codes() {
        let secret = base32_encode(RFC_SECRET);
        assert!(!verify_totp(&secret, "28708", 59).unwrap());
        assert!(!verify_totp(&secret, "28708a", 59).unwrap());
    }

    #[test]
    fn test_generate_secret_shape() {
        let secret = generate_secret().unwrap();
        assert_eq!(secret.len(), 32); // 20 bytes -> 32 base32 chars
        assert!(base32_decode(&secret).is_ok());
    }

    #[test]
    fn test_otpauth_url() {
        let url = otpauth_url("GEZDGNBV", "user@example.com", "Binventory");
        assert!(url.starts_with("otpauth://totp/Binventory:user%40example.com?"));
        assert!(url.contains("secret=GEZDGNBV"));
        assert!(url.contains("digits=6"));
        assert!(url.contains("period=30"));
    }

    #[test]
    fn test_recovery_codes() {
        let codes = generate_recovery_codes(10).unwrap();
        assert_eq!(codes.len(), 10);
        assert!(codes.iter().all(|c| c.len() == 8));
    }
}
