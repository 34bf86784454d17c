use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Converts judging timestamps into display strings.
pub trait TimeFormatter: Send + Sync {
    /// Wall-clock rendering of `timestamp`.
    fn to_absolute(&self, timestamp: DateTime<Utc>) -> String;

    /// Offset of `timestamp` from `reference_start`, usually the contest start.
    fn to_relative(&self, timestamp: DateTime<Utc>, reference_start: DateTime<Utc>) -> String {
        format_relative(timestamp, reference_start)
    }
}

/// Formatter rendering absolute times in a fixed UTC offset.
#[derive(Clone, Copy, Debug)]
pub struct DisplayClock {
    offset: FixedOffset,
}

impl DisplayClock {
    /// `offset_minutes` east of UTC. Out-of-range offsets fall back to UTC.
    pub fn new(offset_minutes: i32) -> Self {
        let offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(utc_offset);
        Self { offset }
    }

    pub fn utc() -> Self {
        Self {
            offset: utc_offset(),
        }
    }
}

impl Default for DisplayClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl TimeFormatter for DisplayClock {
    fn to_absolute(&self, timestamp: DateTime<Utc>) -> String {
        timestamp
            .with_timezone(&self.offset)
            .format("%Y-%m-%dT%H:%M:%S%.3f%:z")
            .to_string()
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// `[-]H:MM:SS.mmm`, hours unpadded.
pub fn format_relative(timestamp: DateTime<Utc>, reference_start: DateTime<Utc>) -> String {
    let millis = (timestamp - reference_start).num_milliseconds();
    let sign = if millis < 0 { "-" } else { "" };
    let millis = millis.unsigned_abs();

    let hours = millis / 3_600_000;
    let minutes = (millis / 60_000) % 60;
    let seconds = (millis / 1_000) % 60;
    let fraction = millis % 1_000;

    format!("{sign}{hours}:{minutes:02}:{seconds:02}.{fraction:03}")
}
