//! Human-readable rendering of raw scrape metrics.

use chrono::{DateTime, Local};

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
const K: f64 = 1024.0;

/// Formats `value` with `decimals` places, rounding exact ties away from zero
/// (`1.125` -> `"1.13"`). Values that only look like ties in decimal, such as
/// `1.005`, keep their exact binary value and round accordingly.
pub fn to_fixed(value: f64, decimals: u32) -> String {
    let value = if is_decimal_tie(value, decimals) {
        // next representable value away from zero
        f64::from_bits(value.to_bits() + 1)
    } else {
        value
    };
    format!("{:.*}", decimals as usize, value)
}

/// True when `value` sits exactly halfway between two `decimals`-place numbers,
/// i.e. `value * 2 * 10^decimals` is an odd integer.
fn is_decimal_tie(value: f64, decimals: u32) -> bool {
    if !value.is_finite() || value == 0.0 {
        return false;
    }

    let bits = value.to_bits();
    let exp_bits = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exp) = if exp_bits == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), exp_bits - 1075)
    };

    // value * 2 * 10^d == mantissa * 5^d * 2^(exp + d + 1); 5^d is odd, so the
    // product is an odd integer iff the power of two cancels exactly.
    let shift = -(exp + decimals as i64 + 1);
    shift >= 0 && mantissa.trailing_zeros() as i64 == shift
}

/// Formats a byte count with a binary unit and two decimals, e.g. `"1.50 KB"`.
///
/// Anything at or above 1024^4 keeps the GB divisor and grows the prefix.
pub fn format_bytes(bytes: f64) -> String {
    if bytes == 0.0 {
        return "0 B".to_string();
    }

    // floor(log_1024(bytes)), compared against exact powers so 1024^n
    // never lands one unit short.
    let mut unit = 0;
    while unit + 1 < UNITS.len() && bytes >= K.powi(unit as i32 + 1) {
        unit += 1;
    }

    format!("{} {}", to_fixed(bytes / K.powi(unit as i32), 2), UNITS[unit])
}

/// Formats a duration given in seconds.
///
/// Sub-second values become whole milliseconds, values under a minute keep two
/// decimals, and longer ones become `"{m}m {s}s"`. There is no hours unit.
pub fn format_duration(seconds: f64) -> String {
    if seconds < 1.0 {
        return format!("{}ms", to_fixed(seconds * 1000.0, 0));
    }
    if seconds < 60.0 {
        return format!("{}s", to_fixed(seconds, 2));
    }

    let mins = (seconds / 60.0).floor() as u64;
    let secs = seconds % 60.0;
    format!("{}m {}s", mins, to_fixed(secs, 0))
}

pub fn format_percent(rate: f64) -> String {
    format!("{}%", to_fixed(rate, 1))
}

/// Formats an integer with `,` thousands separators.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Renders an RFC 3339 timestamp as `M/D/YYYY` in the local time zone.
pub fn format_date(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.with_timezone(&Local).format("%-m/%-d/%Y").to_string(),
        Err(_) => "Invalid Date".to_string(),
    }
}
