// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp localization for the attribution header.
//!
//! Rendering must be deterministic for identical inputs, so locales are a
//! closed set of chrono format strings rather than a locale database, and
//! the timezone is a fixed UTC offset.

use chrono::{DateTime, FixedOffset, Utc};
use portage_core::PortageError;

/// Supported rendering locales. Unrecognized tags fall back to `Iso`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    EnUs,
    EnGb,
    Iso,
}

impl Locale {
    /// Parse a BCP 47-style tag, falling back to ISO rendering.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "en-US" => Locale::EnUs,
            "en-GB" => Locale::EnGb,
            _ => Locale::Iso,
        }
    }

    fn format_str(self) -> &'static str {
        match self {
            Locale::EnUs => "%b %-d, %Y %-I:%M %p",
            Locale::EnGb => "%-d %b %Y %H:%M",
            Locale::Iso => "%Y-%m-%d %H:%M",
        }
    }

    /// Render a UTC creation time in the given offset and this locale.
    pub fn render(self, at: DateTime<Utc>, offset: FixedOffset) -> String {
        at.with_timezone(&offset).format(self.format_str()).to_string()
    }
}

/// Parse a `+HH:MM` / `-HH:MM` offset string into a `FixedOffset`.
pub fn parse_offset(s: &str) -> Result<FixedOffset, PortageError> {
    let invalid = || {
        PortageError::Config(format!(
            "timezone `{s}` is not a UTC offset of the form +HH:MM or -HH:MM"
        ))
    };

    let bytes = s.as_bytes();
    if !s.is_ascii() || bytes.len() != 6 || bytes[3] != b':' {
        return Err(invalid());
    }
    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return Err(invalid()),
    };
    let hours: i32 = s[1..3].parse().map_err(|_| invalid())?;
    let minutes: i32 = s[4..6].parse().map_err(|_| invalid())?;
    if hours > 14 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> DateTime<Utc> {
        "2026-03-01T18:45:00Z".parse().unwrap()
    }

    #[test]
    fn parse_offset_accepts_both_signs() {
        assert_eq!(parse_offset("+05:30").unwrap().local_minus_utc(), 19800);
        assert_eq!(parse_offset("-08:00").unwrap().local_minus_utc(), -28800);
    }

    #[test]
    fn parse_offset_rejects_garbage() {
        for bad in ["UTC", "+5:30", "0530", "+15:00", "+05:60", "+0530"] {
            assert!(parse_offset(bad).is_err(), "`{bad}` should be rejected");
        }
    }

    #[test]
    fn en_us_renders_twelve_hour() {
        let offset = parse_offset("+00:00").unwrap();
        assert_eq!(Locale::EnUs.render(at(), offset), "Mar 1, 2026 6:45 PM");
    }

    #[test]
    fn en_gb_renders_twenty_four_hour() {
        let offset = parse_offset("+00:00").unwrap();
        assert_eq!(Locale::EnGb.render(at(), offset), "1 Mar 2026 18:45");
    }

    #[test]
    fn iso_fallback_for_unknown_tags() {
        assert_eq!(Locale::parse("fr-FR"), Locale::Iso);
        let offset = parse_offset("+00:00").unwrap();
        assert_eq!(Locale::Iso.render(at(), offset), "2026-03-01 18:45");
    }

    #[test]
    fn offset_shifts_the_rendered_time() {
        let offset = parse_offset("+05:30").unwrap();
        // 18:45 UTC is 00:15 next day at +05:30.
        assert_eq!(Locale::Iso.render(at(), offset), "2026-03-02 00:15");
    }
}
