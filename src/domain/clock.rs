use time::{Date, OffsetDateTime};

/// Source of "today" and of creation timestamps.
pub trait Clock {
    fn today(&self) -> Date;
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    fn now() -> OffsetDateTime {
        // The local offset cannot always be determined (e.g. once other
        // threads exist on some Unix targets); UTC is the fallback.
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

impl Clock for SystemClock {
    fn today(&self) -> Date {
        Self::now().date()
    }

    fn now_millis(&self) -> i64 {
        (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
    }
}

#[cfg(test)]
pub use fixed::FixedClock;
