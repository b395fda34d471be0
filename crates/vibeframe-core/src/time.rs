/// Tolerance for comparing timeline positions expressed in seconds.
pub const TIME_EPSILON: f64 = 1e-6;

#[must_use]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_EPSILON
}

/// Strictly positive beyond rounding noise.
#[must_use]
pub fn is_positive(value: f64) -> bool {
    value.is_finite() && value > TIME_EPSILON
}

/// Zero or positive, allowing rounding noise below zero.
#[must_use]
pub fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= -TIME_EPSILON
}

/// Snaps values within rounding noise of zero to exactly zero.
#[must_use]
pub fn clamp_noise(value: f64) -> f64 {
    if value.abs() <= TIME_EPSILON { 0.0 } else { value }
}

#[must_use]
pub fn format_timecode(seconds: f64) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let millis = total_millis % 1000;
    let total_seconds = total_millis / 1000;
    let secs = total_seconds % 60;
    let minutes = (total_seconds / 60) % 60;
    let hours = total_seconds / 3600;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}.{millis:03}")
    } else {
        format!("{minutes:02}:{secs:02}.{millis:03}")
    }
}

/// Parses `90`, `90.5`, `1:30`, `1:30.25` or `1:02:03` into seconds.
#[must_use]
pub fn parse_timecode(input: &str) -> Option<f64> {
    let input = input.trim().trim_end_matches('s');
    if input.is_empty() {
        return None;
    }

    let mut seconds = 0.0;
    let parts: Vec<&str> = input.split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    for (index, part) in parts.iter().enumerate() {
        let value: f64 = part.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        if index + 1 < parts.len() && (value.fract() != 0.0 || (index > 0 && value >= 60.0)) {
            return None;
        }
        seconds = seconds * 60.0 + value;
    }
    Some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timecode_formats_minutes_and_hours() {
        assert_eq!(format_timecode(4.0), "00:04.000");
        assert_eq!(format_timecode(83.25), "01:23.250");
        assert_eq!(format_timecode(3_723.5), "1:02:03.500");
    }

    #[test]
    fn timecode_parse_accepts_common_forms() {
        assert_eq!(parse_timecode("90"), Some(90.0));
        assert_eq!(parse_timecode("4.5s"), Some(4.5));
        assert_eq!(parse_timecode("1:30"), Some(90.0));
        assert_eq!(parse_timecode("1:02:03"), Some(3_723.0));
        assert_eq!(parse_timecode(""), None);
        assert_eq!(parse_timecode("-3"), None);
        assert_eq!(parse_timecode("1.5:00"), None);
    }

    #[test]
    fn positivity_ignores_rounding_noise() {
        assert!(!is_positive(1e-9));
        assert!(is_positive(0.01));
        assert!(is_non_negative(-1e-9));
        assert!(!is_non_negative(-0.5));
        assert_eq!(clamp_noise(-1e-9), 0.0);
    }
}
