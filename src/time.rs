//! Duration text helpers. Parsing is deliberately lenient: junk input
//! degrades to 0 or to whatever digits can be salvaged, never an error.

/// "M:SS" clock display, minutes unpadded.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Compact display form: "3m", "45s", "1m30s". Zero renders as "0m".
pub fn format_short(seconds: u32) -> String {
    let mins = seconds / 60;
    let secs = seconds % 60;
    if secs == 0 {
        format!("{}m", mins)
    } else if mins == 0 {
        format!("{}s", secs)
    } else {
        format!("{}m{}s", mins, secs)
    }
}

/// Free-form duration input to seconds.
///
/// Accepted forms: "3:00" (minutes:seconds), "90s" (seconds, any stray
/// characters dropped), "1.5" or "3" (bare numbers read as minutes).
pub fn parse_duration(input: &str) -> u32 {
    let s = input.trim().to_lowercase();
    if s.is_empty() {
        return 0;
    }

    if s.contains('s') && !s.contains(':') {
        return digits_only(&s);
    }

    if let Some((mins, secs)) = s.split_once(':') {
        return leading_int(mins) * 60 + leading_int(secs);
    }

    // bare number means minutes, fractions allowed
    (leading_float(&s) * 60.0).round() as u32
}

fn digits_only(s: &str) -> u32 {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Integer prefix of the string, 0 when there is none.
pub(crate) fn leading_int(s: &str) -> u32 {
    let t = s.trim_start();
    let digits: String = t.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

fn leading_float(s: &str) -> f64 {
    let t = s.trim_start();
    let mut seen_dot = false;
    let prefix: String = t
        .chars()
        .take_while(|&c| {
            if c.is_ascii_digit() {
                true
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                true
            } else {
                false
            }
        })
        .collect();
    prefix.parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(59), "0:59");
        assert_eq!(format_clock(60), "1:00");
        assert_eq!(format_clock(180), "3:00");
        assert_eq!(format_clock(3661), "61:01");
    }

    #[test]
    fn test_format_short_whole_minutes() {
        assert_eq!(format_short(180), "3m");
        assert_eq!(format_short(60), "1m");
        assert_eq!(format_short(0), "0m");
    }

    #[test]
    fn test_format_short_seconds_only() {
        assert_eq!(format_short(45), "45s");
        assert_eq!(format_short(1), "1s");
    }

    #[test]
    fn test_format_short_mixed() {
        assert_eq!(format_short(90), "1m30s");
        assert_eq!(format_short(185), "3m5s");
    }

    #[test]
    fn test_parse_duration_colon_form() {
        assert_eq!(parse_duration("3:00"), 180);
        assert_eq!(parse_duration("1:30"), 90);
        assert_eq!(parse_duration("0:45"), 45);
        assert_eq!(parse_duration(" 2:05 "), 125);
    }

    #[test]
    fn test_parse_duration_colon_form_partial() {
        assert_eq!(parse_duration(":30"), 30);
        assert_eq!(parse_duration("3:"), 180);
        // extra colon segments are ignored past the second slot
        assert_eq!(parse_duration("1:2:3"), 62);
    }

    #[test]
    fn test_parse_duration_seconds_form() {
        assert_eq!(parse_duration("90s"), 90);
        assert_eq!(parse_duration("45 s"), 45);
        assert_eq!(parse_duration("s"), 0);
    }

    #[test]
    fn test_parse_duration_bare_number_is_minutes() {
        assert_eq!(parse_duration("3"), 180);
        assert_eq!(parse_duration("1.5"), 90);
        assert_eq!(parse_duration("0.25"), 15);
        assert_eq!(parse_duration(".5"), 30);
    }

    #[test]
    fn test_parse_duration_garbage() {
        assert_eq!(parse_duration(""), 0);
        assert_eq!(parse_duration("   "), 0);
        assert_eq!(parse_duration("abc"), 0);
        assert_eq!(parse_duration("1.5x"), 90);
        assert_eq!(parse_duration("-2"), 0);
    }

    #[test]
    fn test_digits_only_strips_junk() {
        assert_eq!(digits_only("30"), 30);
        assert_eq!(digits_only("a3b0c"), 30);
        assert_eq!(digits_only(""), 0);
        assert_eq!(digits_only("xyz"), 0);
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("12abc"), 12);
        assert_eq!(leading_int("  7"), 7);
        assert_eq!(leading_int("abc"), 0);
        assert_eq!(leading_int(""), 0);
    }

    #[test]
    fn test_leading_float_prefixes() {
        assert_eq!(parse_duration("1.5.2"), 90);
        assert_eq!(parse_duration("2."), 120);
    }
}
