//! Duration model: form input (value + unit) to stored minutes and back.

use shared::{DurationInput, DurationUnit};

pub const MINUTES_PER_HOUR: u32 = 60;
pub const MINUTES_PER_DAY: u32 = 1440;

/// Convert a form value into minutes. Saturates instead of overflowing.
pub fn normalize(value: u32, unit: DurationUnit) -> u32 {
    match unit {
        DurationUnit::Minutes => value,
        DurationUnit::Hours => value.saturating_mul(MINUTES_PER_HOUR),
        DurationUnit::Days => value.saturating_mul(MINUTES_PER_DAY),
    }
}

/// Stored duration for a form input; zero means "no duration"
pub fn normalize_input(input: DurationInput) -> Option<u32> {
    match normalize(input.value, input.unit) {
        0 => None,
        minutes => Some(minutes),
    }
}

/// Pick the unit an edit form re-populates with.
///
/// The largest unit the duration reaches wins and the value is truncated, so
/// 90 minutes comes back as 1 hour. Saving that form unchanged loses the 30
/// minute remainder.
pub fn denormalize(minutes: u32) -> DurationInput {
    if minutes >= MINUTES_PER_DAY {
        DurationInput {
            value: minutes / MINUTES_PER_DAY,
            unit: DurationUnit::Days,
        }
    } else if minutes >= MINUTES_PER_HOUR {
        DurationInput {
            value: minutes / MINUTES_PER_HOUR,
            unit: DurationUnit::Hours,
        }
    } else {
        DurationInput {
            value: minutes,
            unit: DurationUnit::Minutes,
        }
    }
}

/// Human display: "1d 1h", "1h 30m", "45m", "0m"
pub fn format(minutes: u32) -> String {
    let days = minutes / MINUTES_PER_DAY;
    let hours = (minutes % MINUTES_PER_DAY) / MINUTES_PER_HOUR;
    let mins = minutes % MINUTES_PER_HOUR;

    let mut parts = Vec::with_capacity(3);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if mins > 0 || parts.is_empty() {
        parts.push(format!("{mins}m"));
    }
    parts.join(" ")
}

/// Number of civil days a duration covers, rounding partial days up
pub fn span_days(minutes: u32) -> u32 {
    minutes.div_ceil(MINUTES_PER_DAY)
}
