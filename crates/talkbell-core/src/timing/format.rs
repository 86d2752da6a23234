use std::fmt;

use chrono::{DateTime, TimeZone};

/// Render a reminder instant for a brief confirmation message.
///
/// Same calendar day as `now_ms` in `tz` gives `HH:mm`; anything else gives
/// `dd/MM/yy HH:mm`.
pub fn format_fire_time<Tz>(at_ms: i64, now_ms: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let (Some(at), Some(now)) = (
        DateTime::from_timestamp_millis(at_ms),
        DateTime::from_timestamp_millis(now_ms),
    ) else {
        return at_ms.to_string();
    };

    let at = at.with_timezone(tz);
    let now = now.with_timezone(tz);

    if at.date_naive() == now.date_naive() {
        at.format("%H:%M").to_string()
    } else {
        at.format("%d/%m/%y %H:%M").to_string()
    }
}
