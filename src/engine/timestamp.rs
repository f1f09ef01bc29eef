// src/engine/timestamp.rs

//! Wall-clock source and the human-readable timestamp shown with a
//! successful redemption.
//!
//! The display follows the zh-TW locale with two-digit fields and a 12-hour
//! clock: `2025/03/07 下午02:05:09`.

use chrono::{DateTime, FixedOffset, Local, TimeZone, Timelike};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The host's local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

pub fn format_locale_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let meridiem = if at.hour() < 12 { "上午" } else { "下午" };
    format!(
        "{} {}{}",
        at.format("%Y/%m/%d"),
        meridiem,
        at.format("%I:%M:%S")
    )
}
