//! Registered pinpad credential - the shared TOTP secret and its parameters.

use crate::{hotp, unix_now};

/// Rejected credential configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// An empty key makes every HMAC security-meaningless; refuse it at
    /// setup instead of validating against it at runtime.
    #[error("shared secret must not be empty")]
    EmptySecret,
    /// Above 9 digits the `10^digits` truncation modulus degenerates.
    #[error("digit count must be between 1 and 9, got {0}")]
    BadDigits(u32),
    #[error("time-step period must be greater than zero")]
    BadPeriod,
}

/// Shared symmetric credential for TOTP validation.
///
/// Configured once at setup and immutable afterwards; the pinpad server owns
/// exactly one of these.
#[derive(Debug, Clone)]
pub struct Credential {
    secret: Vec<u8>,
    digits: u32,
    period: u64,
}

impl Credential {
    pub fn new(
        secret: impl Into<Vec<u8>>,
        digits: u32,
        period: u64,
    ) -> Result<Self, CredentialError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(CredentialError::EmptySecret);
        }
        if !(1..=9).contains(&digits) {
            return Err(CredentialError::BadDigits(digits));
        }
        if period == 0 {
            return Err(CredentialError::BadPeriod);
        }
        Ok(Self { secret, digits, period })
    }

    /// Common defaults: 6 digits, 30-second window.
    pub fn standard(secret: impl Into<Vec<u8>>) -> Result<Self, CredentialError> {
        Self::new(secret, crate::DEFAULT_DIGITS, crate::DEFAULT_PERIOD)
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    /// Code for the time window containing `unix_secs`.
    pub fn code_at(&self, unix_secs: u64) -> u32 {
        hotp(&self.secret, unix_secs / self.period, self.digits)
    }

    /// Strict single-window check: `code` matches only the window containing
    /// `unix_secs`. No drift tolerance is granted; the previous and next
    /// windows never match.
    pub fn verify_at(&self, code: u32, unix_secs: u64) -> bool {
        self.code_at(unix_secs) == code
    }

    /// Check `code` against the current system-time window.
    pub fn verify(&self, code: u32) -> bool {
        self.verify_at(code, unix_now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"12345678901234567890";

    #[test]
    fn rejects_bad_configuration() {
        assert_eq!(
            Credential::new(Vec::new(), 6, 30).unwrap_err(),
            CredentialError::EmptySecret
        );
        assert_eq!(
            Credential::new(SECRET, 0, 30).unwrap_err(),
            CredentialError::BadDigits(0)
        );
        assert_eq!(
            Credential::new(SECRET, 10, 30).unwrap_err(),
            CredentialError::BadDigits(10)
        );
        assert_eq!(
            Credential::new(SECRET, 6, 0).unwrap_err(),
            CredentialError::BadPeriod
        );
    }

    #[test]
    fn accepts_current_window_only() {
        let cred = Credential::new(SECRET, 8, 30).unwrap();

        // RFC 6238: the code for t=59 is 94287082.
        assert!(cred.verify_at(94287082, 59));
        assert!(cred.verify_at(94287082, 30)); // same window
        assert!(!cred.verify_at(94287082, 60)); // next window: no replay
        assert!(!cred.verify_at(94287082, 29)); // previous window
    }

    #[test]
    fn wrong_code_rejected() {
        let cred = Credential::standard(SECRET).unwrap();
        let t = 1_234_567_890;
        let good = cred.code_at(t);
        assert!(cred.verify_at(good, t));
        assert!(!cred.verify_at(good.wrapping_add(1) % 1_000_000, t));
    }
}
