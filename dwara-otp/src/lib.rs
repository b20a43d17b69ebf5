//! HOTP (RFC 4226) and TOTP (RFC 6238) code derivation
//!
//! This crate is the validation leaf of the dwara stack: a pure function of
//! (secret, counter, digits) with no I/O. The pinpad server holds a
//! [`Credential`] and asks it whether a submitted code matches the current
//! time window.

mod credential;

pub use credential::{Credential, CredentialError};

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Default time-step length in seconds (RFC 6238 recommendation).
pub const DEFAULT_PERIOD: u64 = 30;

/// Default code length in digits.
pub const DEFAULT_DIGITS: u32 = 6;

/// Generate an HOTP code for `counter`.
///
/// The counter is hashed as its 8-byte big-endian encoding, as RFC 4226
/// requires, regardless of host endianness.
pub fn hotp(secret: &[u8], counter: u64, digits: u32) -> u32 {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamic truncation (RFC 4226 section 5.3): the low nibble of the last
    // digest byte selects a 4-byte window, whose top bit is masked off.
    let offset = (digest[19] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    binary % 10u32.pow(digits)
}

/// Generate the TOTP code for the time window containing `unix_secs`.
pub fn totp_at(secret: &[u8], unix_secs: u64, period: u64, digits: u32) -> u32 {
    hotp(secret, unix_secs / period, digits)
}

/// Generate the TOTP code for the current system time, using the standard
/// 30-second window.
pub fn totp_now(secret: &[u8], digits: u32) -> u32 {
    totp_at(secret, unix_now(), DEFAULT_PERIOD, digits)
}

/// Current Unix timestamp in seconds.
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4226 Appendix D test secret, shared with the RFC 6238 SHA1 vectors.
    const SECRET: &[u8] = b"12345678901234567890";

    #[test]
    fn rfc4226_vectors() {
        let expected = [
            755224, 287082, 359152, 969429, 338314, 254676, 287922, 162583, 399871, 520489,
        ];
        for (counter, want) in expected.iter().enumerate() {
            assert_eq!(hotp(SECRET, counter as u64, 6), *want, "counter {counter}");
        }
    }

    #[test]
    fn rfc6238_sha1_vectors() {
        // (unix time, expected 8-digit code) from RFC 6238 Appendix B.
        let vectors = [
            (59u64, 94287082u32),
            (1111111109, 7081804),
            (1111111111, 14050471),
            (1234567890, 89005924),
            (2000000000, 69279037),
            (20000000000, 65353130),
        ];
        for (t, want) in vectors {
            assert_eq!(totp_at(SECRET, t, 30, 8), want, "t={t}");
        }
    }

    #[test]
    fn code_fits_digit_count() {
        for digits in 1..=8u32 {
            for counter in [0u64, 1, 7, 1_000, 20_000_000] {
                assert!(hotp(SECRET, counter, digits) < 10u32.pow(digits));
            }
        }
    }

    #[test]
    fn deterministic_and_input_sensitive() {
        let a = hotp(SECRET, 42, 6);
        assert_eq!(a, hotp(SECRET, 42, 6));
        assert_ne!(a, hotp(SECRET, 43, 6));
        assert_ne!(a, hotp(b"other secret material", 42, 6));
    }

    #[test]
    fn totp_window_derivation() {
        // All timestamps in the same 30-second window share a code.
        assert_eq!(totp_at(SECRET, 60, 30, 6), totp_at(SECRET, 89, 30, 6));

        // Window 0 is HOTP counter 0 (84755224 at 8 digits); window 1 is the
        // RFC 6238 t=59 vector.
        assert_eq!(totp_at(SECRET, 29, 30, 8), 84755224);
        assert_eq!(totp_at(SECRET, 59, 30, 8), 94287082);
    }
}
