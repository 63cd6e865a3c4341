//! System time decoder

use std::time::Duration;

use contracts::FieldMap;

use super::utc_from_days_and_ticks;
use crate::reader::{u16_le, u32_le, u8_at, U16_NA, U32_NA};

/// PGN 126992 - System Time
///
/// Date is emitted as an ISO date string, time-of-day as a Duration since
/// midnight (0.0001 s resolution).
pub fn decode_system_time(data: &[u8]) -> Option<FieldMap> {
    if data.len() < 8 {
        return None;
    }

    let mut fields = FieldMap::new();
    fields.insert("sid".into(), u8_at(data, 0).into());
    fields.insert("time_source".into(), u8_at(data, 1).into());

    let days = u16_le(data, 2);
    let ticks = u32_le(data, 4);

    if days != U16_NA {
        if let Some(date) = utc_from_days_and_ticks(days, 0) {
            fields.insert("date".into(), date.format("%Y-%m-%d").to_string().into());
        }
    }

    if ticks != U32_NA {
        fields.insert("time_of_day".into(), Duration::from_micros(ticks as u64 * 100).into());
    }

    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::FieldValue;

    #[test]
    fn test_system_time_decode() {
        let mut data = [0u8; 8];
        data[1] = 5; // GPS time source
        data[2..4].copy_from_slice(&18_748u16.to_le_bytes());
        data[4..8].copy_from_slice(&541_507_500u32.to_le_bytes()); // 15:02:30.750
        let fields = decode_system_time(&data).unwrap();

        assert_eq!(fields["date"], FieldValue::Str("2021-05-01".into()));
        assert_eq!(fields["time_of_day"].to_string(), "15:02:30.750");
    }

    #[test]
    fn test_system_time_sentinel_date() {
        let mut data = [0xFFu8; 8];
        data[0] = 0;
        let fields = decode_system_time(&data).unwrap();
        assert!(!fields.contains_key("date"));
        assert!(!fields.contains_key("time_of_day"));
    }
}
