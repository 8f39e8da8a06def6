//! Sensor Payload Protocol
//!
//! The sensor (an HM-10 style serial bridge) pushes plain text notifications
//! of the form `"<temperature>,<humidity>"`, e.g. `"23.5,60"`.

use crate::domain::models::SensorReading;
use thiserror::Error;

/// Advertised name of the sensor peripheral
pub const TARGET_NAME: &str = "HMSoft";

/// Separator between the temperature and humidity fields
pub const FIELD_DELIMITER: char = ',';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,
    #[error("expected 2 comma-separated fields, found {0}")]
    FieldCount(usize),
}

/// Parse a notification payload into a reading.
///
/// Empty segments are dropped before counting, so `"23.5,"` has a single
/// field. The two values are returned verbatim: no trimming, no unit
/// stripping, no numeric validation.
pub fn parse_payload(bytes: &[u8]) -> Result<SensorReading, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;

    let fields: Vec<&str> = text
        .split(FIELD_DELIMITER)
        .filter(|field| !field.is_empty())
        .collect();

    match fields.as_slice() {
        [temperature, humidity] => Ok(SensorReading::new(*temperature, *humidity)),
        other => Err(DecodeError::FieldCount(other.len())),
    }
}

/// Like [`parse_payload`], with every failure collapsed into the `N/A` reading
pub fn decode_payload(bytes: &[u8]) -> SensorReading {
    parse_payload(bytes).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn na() -> SensorReading {
        SensorReading::default()
    }

    #[test]
    fn test_two_fields() {
        assert_eq!(
            decode_payload(b"23.5,60"),
            SensorReading::new("23.5", "60")
        );
    }

    #[test]
    fn test_single_field() {
        assert_eq!(decode_payload(b"23.5"), na());
        assert_eq!(parse_payload(b"23.5"), Err(DecodeError::FieldCount(1)));
    }

    #[test]
    fn test_three_fields() {
        assert_eq!(decode_payload(b"23.5,60,extra"), na());
        assert_eq!(
            parse_payload(b"23.5,60,extra"),
            Err(DecodeError::FieldCount(3))
        );
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(decode_payload(&[0xff, 0xfe, b',', 0x80]), na());
        assert_eq!(parse_payload(&[0xc3, 0x28]), Err(DecodeError::InvalidUtf8));
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(parse_payload(b""), Err(DecodeError::FieldCount(0)));
        assert_eq!(parse_payload(b","), Err(DecodeError::FieldCount(0)));
    }

    #[test]
    fn test_values_are_verbatim() {
        assert_eq!(
            decode_payload(b" 23.5 C,60%\r\n"),
            SensorReading::new(" 23.5 C", "60%\r\n")
        );
        assert_eq!(decode_payload(b"abc,def"), SensorReading::new("abc", "def"));
    }

    #[test]
    fn test_empty_segments_are_dropped() {
        assert_eq!(decode_payload(b"23.5,"), na());
        assert_eq!(decode_payload(b",60"), na());
        assert_eq!(decode_payload(b"23.5,,60"), SensorReading::new("23.5", "60"));
    }

    #[test]
    fn test_decode_is_repeatable() {
        let payloads: [&[u8]; 4] = [b"23.5,60", b"23.5", b"a,b,c", &[0xff]];
        for payload in payloads {
            assert_eq!(decode_payload(payload), decode_payload(payload));
        }
    }
}
