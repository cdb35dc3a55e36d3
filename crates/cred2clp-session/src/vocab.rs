//! Reply vocabularies and number parsing for the camera shell.
//!
//! The shell prints numbers the way C's `strtol`/`strtod` read them and
//! booleans in several spellings. Everything here works on already-trimmed
//! reply text.

/// `synchronization` modes, indexed by register value.
pub const SYNCHRONIZATION_MODES: &[&str] = &["lvds", "cmos"];

/// `sensibility` levels, indexed by register value.
pub const SENSIBILITY_LEVELS: &[&str] = &["low", "medium", "high"];

/// `fan mode` settings, indexed by register value.
pub const FAN_MODES: &[&str] = &["automatic", "manual"];

/// `ip mode` settings, indexed by register value.
pub const IP_MODES: &[&str] = &["manual", "automatic"];

/// How a boolean register spells its value on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolSpelling {
    OnOff,
    EnableDisable,
}

impl BoolSpelling {
    pub fn word(self, value: bool) -> &'static str {
        match (self, value) {
            (BoolSpelling::OnOff, true) => "on",
            (BoolSpelling::OnOff, false) => "off",
            (BoolSpelling::EnableDisable, true) => "enable",
            (BoolSpelling::EnableDisable, false) => "disable",
        }
    }
}

/// Decode a boolean reply.
///
/// Accepts `on/off`, `enable/disable` and `1/0` in any case. Anything else
/// must be a whole signed decimal integer, read as true when non-zero.
pub fn parse_bool(text: &str) -> Option<bool> {
    const TRUE_WORDS: [&str; 3] = ["1", "on", "enable"];
    const FALSE_WORDS: [&str; 3] = ["0", "off", "disable"];

    if TRUE_WORDS.iter().any(|w| text.eq_ignore_ascii_case(w)) {
        return Some(true);
    }
    if FALSE_WORDS.iter().any(|w| text.eq_ignore_ascii_case(w)) {
        return Some(false);
    }

    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.bytes().any(|b| b != b'0'))
}

/// Position of `text` in `words`, ignoring ASCII case.
pub fn choice_index(words: &[&str], text: &str) -> Option<i32> {
    words
        .iter()
        .position(|w| w.eq_ignore_ascii_case(text))
        .and_then(|idx| i32::try_from(idx).ok())
}

/// Word for register value `value`.
///
/// A two-word vocabulary is a switch: zero picks the first word and any
/// other value the second. Longer vocabularies clamp, so negative values pick
/// the first word and values past the end pick the last.
pub fn choice_word<'a>(words: &[&'a str], value: i32) -> &'a str {
    let idx = if words.len() == 2 {
        usize::from(value != 0)
    } else {
        let last = words.len().saturating_sub(1);
        usize::try_from(value).map_or(0, |v| v.min(last))
    };
    words.get(idx).copied().unwrap_or("")
}

/// Parse the leading decimal integer of `text`, like `strtol(text, _, 10)`.
///
/// Leading whitespace and one sign are accepted; trailing text is ignored.
/// Out-of-range values saturate to `i32::MIN` or `i32::MAX`. Returns `None`
/// when there are no digits.
pub fn parse_leading_i32(text: &str) -> Option<i32> {
    let s = text.trim_start();
    let negative = s.starts_with('-');
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits = &s[sign_len..];
    let digit_len = digits.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digit_len == 0 {
        return None;
    }
    let value = digits.as_bytes()[..digit_len]
        .iter()
        .fold(0i64, |acc, b| {
            acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
        });
    let value = if negative { -value } else { value };
    Some(value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

/// Parse the leading floating-point number of `text`, like `strtod`.
///
/// Accepts an optional sign, digits with an optional fraction, an optional
/// exponent, and the special words `inf`, `infinity` and `nan`. Trailing text
/// is ignored. Returns `None` when nothing numeric leads the text.
pub fn parse_leading_f32(text: &str) -> Option<f32> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = usize::from(s.starts_with(['+', '-']));
    let negative = s.starts_with('-');

    let rest = &s[end..];
    for word in ["infinity", "inf"] {
        if rest.len() >= word.len() && rest[..word.len()].eq_ignore_ascii_case(word) {
            return Some(if negative {
                f32::NEG_INFINITY
            } else {
                f32::INFINITY
            });
        }
    }
    if rest.len() >= 3 && rest[..3].eq_ignore_ascii_case("nan") {
        return Some(f32::NAN);
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    // Parse as f64 first so the narrowing matches a C double-to-float cast.
    s[..end].parse::<f64>().ok().map(|v| v as f32)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Render a float the way `printf("%.6f")` does.
pub fn format_float(value: f32) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    format!("{:.6}", f64::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_words_any_case() {
        for text in ["1", "on", "ON", "On", "enable", "Enable", "ENABLE"] {
            assert_eq!(parse_bool(text), Some(true), "{text}");
        }
        for text in ["0", "off", "OFF", "disable", "Disable"] {
            assert_eq!(parse_bool(text), Some(false), "{text}");
        }
    }

    #[test]
    fn bool_falls_back_to_whole_integer() {
        assert_eq!(parse_bool("2"), Some(true));
        assert_eq!(parse_bool("-1"), Some(true));
        assert_eq!(parse_bool("000"), Some(false));
        assert_eq!(parse_bool("99999999999999999999"), Some(true));
        assert_eq!(parse_bool("1x"), None);
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool(""), None);
        assert_eq!(parse_bool("-"), None);
    }

    #[test]
    fn choice_lookup_ignores_case() {
        assert_eq!(choice_index(SYNCHRONIZATION_MODES, "CMOS"), Some(1));
        assert_eq!(choice_index(SENSIBILITY_LEVELS, "Medium"), Some(1));
        assert_eq!(choice_index(FAN_MODES, "automatic"), Some(0));
        assert_eq!(choice_index(FAN_MODES, "off"), None);
    }

    #[test]
    fn choice_word_clamps() {
        assert_eq!(choice_word(SENSIBILITY_LEVELS, -4), "low");
        assert_eq!(choice_word(SENSIBILITY_LEVELS, 1), "medium");
        assert_eq!(choice_word(SENSIBILITY_LEVELS, 7), "high");
        assert_eq!(choice_word(IP_MODES, 1), "automatic");
        assert_eq!(choice_word(&[], 1), "");
    }

    #[test]
    fn two_word_choice_is_a_switch() {
        assert_eq!(choice_word(SYNCHRONIZATION_MODES, 0), "lvds");
        assert_eq!(choice_word(SYNCHRONIZATION_MODES, -1), "cmos");
        assert_eq!(choice_word(FAN_MODES, -1), "manual");
        assert_eq!(choice_word(IP_MODES, -1), "automatic");
        assert_eq!(choice_word(IP_MODES, 9), "automatic");
    }

    #[test]
    fn leading_integer() {
        assert_eq!(parse_leading_i32("320"), Some(320));
        assert_eq!(parse_leading_i32("  -12 columns"), Some(-12));
        assert_eq!(parse_leading_i32("+7"), Some(7));
        assert_eq!(parse_leading_i32("12.9"), Some(12));
        assert_eq!(parse_leading_i32("abc"), None);
        assert_eq!(parse_leading_i32("-"), None);
        assert_eq!(parse_leading_i32("4294967296"), Some(i32::MAX));
        assert_eq!(parse_leading_i32("-99999999999999999999999"), Some(i32::MIN));
        assert_eq!(parse_leading_i32("-2147483648"), Some(i32::MIN));
    }

    #[test]
    fn leading_float() {
        assert_eq!(parse_leading_f32("123.0"), Some(123.0));
        assert_eq!(parse_leading_f32("42.5 C"), Some(42.5));
        assert_eq!(parse_leading_f32("-0.25"), Some(-0.25));
        assert_eq!(parse_leading_f32(".5"), Some(0.5));
        assert_eq!(parse_leading_f32("5."), Some(5.0));
        assert_eq!(parse_leading_f32("1e3"), Some(1000.0));
        assert_eq!(parse_leading_f32("2e"), Some(2.0));
        assert_eq!(parse_leading_f32("inf"), Some(f32::INFINITY));
        assert!(parse_leading_f32("NaN").unwrap().is_nan());
        assert_eq!(parse_leading_f32("not-a-number"), None);
        assert_eq!(parse_leading_f32("."), None);
        assert_eq!(parse_leading_f32(""), None);
    }

    #[test]
    fn float_formatting_matches_printf() {
        assert_eq!(format_float(600.0), "600.000000");
        assert_eq!(format_float(0.1), "0.100000");
        assert_eq!(format_float(-2.5), "-2.500000");
        assert_eq!(format_float(f32::NAN), "nan");
        assert_eq!(format_float(f32::NEG_INFINITY), "-inf");
    }
}
