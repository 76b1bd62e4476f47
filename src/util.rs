use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// Bounded lowercase hex preview over at most `limit` source bytes.
pub fn hex_preview(bytes: &[u8], limit: usize) -> String {
    hex::encode(&bytes[..bytes.len().min(limit)])
}

pub fn system_time_to_iso8601(system_time: SystemTime) -> String {
    let datetime: DateTime<Utc> = system_time.into();
    datetime.to_rfc3339()
}

/// Epoch seconds (fractional) to an ISO-8601 stamp safe for filenames:
/// colons replaced with dashes.
pub fn epoch_to_filename_stamp(epoch_seconds: f64) -> String {
    let system_time = epoch_to_system_time(epoch_seconds);
    let datetime: DateTime<Utc> = system_time.into();
    datetime.format("%Y-%m-%dT%H-%M-%SZ").to_string()
}

pub fn epoch_to_system_time(epoch_seconds: f64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs_f64(epoch_seconds.max(0.0))
}

pub fn system_time_to_epoch(system_time: SystemTime) -> f64 {
    system_time
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64()
}

/// Map a radio channel frequency in MHz to its channel number.
pub fn freq_to_channel(freq: u16) -> Option<u8> {
    match freq {
        2412..=2472 => Some(((freq - 2407) / 5) as u8),
        2484 => Some(14),
        5160..=5885 => Some(((freq - 5000) / 5) as u8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_preview_is_bounded() {
        let bytes = vec![0xAB; 100];
        let preview = hex_preview(&bytes, 64);
        assert_eq!(preview.len(), 128);
        assert!(preview.starts_with("abab"));
    }

    #[test]
    fn test_filename_stamp_has_no_colons() {
        let stamp = epoch_to_filename_stamp(1_700_000_000.5);
        assert!(!stamp.contains(':'));
        assert!(stamp.starts_with("2023-11-14T"));
    }

    #[test]
    fn test_freq_to_channel() {
        assert_eq!(freq_to_channel(2412), Some(1));
        assert_eq!(freq_to_channel(2437), Some(6));
        assert_eq!(freq_to_channel(2484), Some(14));
        assert_eq!(freq_to_channel(5180), Some(36));
        assert_eq!(freq_to_channel(900), None);
    }
}
