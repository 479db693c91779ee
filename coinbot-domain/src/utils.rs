use chrono::{DateTime, TimeZone, Utc};

/// Platform epoch for snowflake ids (2015-01-01T00:00:00Z), in milliseconds.
pub const SNOWFLAKE_EPOCH_MS: i64 = 1_420_070_400_000;

pub fn millis_to_utc(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
}

pub fn current_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Creation time encoded in the upper bits of a snowflake id.
pub fn snowflake_timestamp(id: u64) -> DateTime<Utc> {
    millis_to_utc((id >> 22) as i64 + SNOWFLAKE_EPOCH_MS)
}

pub fn parse_snowflake(raw: &str) -> anyhow::Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| anyhow::anyhow!("invalid snowflake id {:?}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_encodes_creation_time() {
        let ts = snowflake_timestamp(175928847299117063);
        assert_eq!(ts.timestamp_millis(), 1_462_015_105_796);
    }

    #[test]
    fn parse_snowflake_rejects_garbage() {
        assert_eq!(parse_snowflake(" 42 ").expect("parse"), 42);
        assert!(parse_snowflake("abc").is_err());
    }
}
