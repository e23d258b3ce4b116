//! Parsers for profile values. Every parser returns `None` for malformed or
//! out-of-range input so the caller can keep the field's current value.
use crate::drivers::switch::spi::RgbColor;

/// Largest value accepted for a button mask (24 bits)
pub const BUTTON_MASK_MAX: u32 = 0x00ff_ffff;
/// Largest accepted LED brightness
pub const LED_BRIGHTNESS_MAX: u32 = 63;
/// Largest accepted polling rate divisor
pub const POLLING_RATE_DIVISOR_MAX: u32 = 16;

/// Parse `true` or `false` (case-insensitive)
pub fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parse a decimal integer, accepting it only if it lies within `min..=max`
pub fn parse_int_in_range(value: &str, min: u32, max: u32) -> Option<u32> {
    let parsed: i64 = value.trim().parse().ok()?;
    if parsed < min as i64 || parsed > max as i64 {
        return None;
    }
    Some(parsed as u32)
}

pub fn parse_brightness(value: &str) -> Option<u32> {
    parse_int_in_range(value, 0, LED_BRIGHTNESS_MAX)
}

pub fn parse_polling_rate_divisor(value: &str) -> Option<u32> {
    parse_int_in_range(value, 0, POLLING_RATE_DIVISOR_MAX)
}

pub fn parse_button_mask(value: &str) -> Option<u32> {
    parse_int_in_range(value, 0, BUTTON_MASK_MAX)
}

/// Parse an unsigned decimal number made only of digits and at most one
/// dot (e.g. "12", "12.5", ".5"). Any other character rejects the value.
pub fn parse_float(value: &str) -> Option<f32> {
    if value.is_empty() {
        return None;
    }

    let mut integer = 0.0_f32;
    let mut fraction = 0.0_f32;
    let mut divisor = 10.0_f32;
    let mut seen_dot = false;
    for c in value.chars() {
        match c {
            '0'..='9' => {
                let digit = (c as u8 - b'0') as f32;
                if seen_dot {
                    fraction += digit / divisor;
                    divisor *= 10.0;
                } else {
                    integer = integer * 10.0 + digit;
                }
            }
            '.' if !seen_dot => seen_dot = true,
            _ => return None,
        }
    }

    Some(integer + fraction)
}

/// Parse a deadzone given in percent, returning the fraction if it lies
/// strictly between 0 and 1.
pub fn parse_deadzone(value: &str) -> Option<f32> {
    let deadzone = parse_float(value)? / 100.0;
    if deadzone > 0.0 && deadzone < 1.0 {
        Some(deadzone)
    } else {
        None
    }
}

/// Parse a colour given as `#RRGGBB` or `rgb(r, g, b)`
pub fn parse_rgb(value: &str) -> Option<RgbColor> {
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex_rgb(hex);
    }
    if let Some(args) = value.strip_prefix("rgb(") {
        return parse_decimal_rgb(args);
    }
    None
}

fn parse_hex_rgb(hex: &str) -> Option<RgbColor> {
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(RgbColor::new(channel(0)?, channel(2)?, channel(4)?))
}

fn parse_decimal_rgb(args: &str) -> Option<RgbColor> {
    let (args, rest) = args.split_once(')')?;
    if !rest.trim().is_empty() {
        return None;
    }

    let mut channels = [0_u8; 3];
    let mut count = 0;
    for part in args.split(',') {
        if count == channels.len() {
            return None;
        }
        // Spaces are allowed anywhere within a component
        let digits: String = part.chars().filter(|c| *c != ' ').collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        channels[count] = digits.parse().ok()?;
        count += 1;
    }
    if count != channels.len() {
        return None;
    }

    let [r, g, b] = channels;
    Some(RgbColor::new(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("yes"), None);
    }

    #[test]
    fn test_parse_ranges() {
        assert_eq!(parse_brightness("63"), Some(63));
        assert_eq!(parse_brightness("100"), None);
        assert_eq!(parse_brightness("-1"), None);
        assert_eq!(parse_brightness("abc"), None);
        assert_eq!(parse_polling_rate_divisor("16"), Some(16));
        assert_eq!(parse_polling_rate_divisor("17"), None);
        assert_eq!(parse_button_mask("16777215"), Some(0xffffff));
        assert_eq!(parse_button_mask("16777216"), None);
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("12"), Some(12.0));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert!((parse_float("12.25").unwrap() - 12.25).abs() < 1e-6);
        assert_eq!(parse_float("1.2.3"), None);
        assert_eq!(parse_float("-3"), None);
        assert_eq!(parse_float("3e2"), None);
        assert_eq!(parse_float(""), None);
    }

    #[test]
    fn test_parse_deadzone() {
        assert!((parse_deadzone("15").unwrap() - 0.15).abs() < 1e-6);
        assert_eq!(parse_deadzone("0"), None);
        assert_eq!(parse_deadzone("100"), None);
        assert_eq!(parse_deadzone("150"), None);
        assert_eq!(parse_deadzone("ten"), None);
    }

    #[test]
    fn test_parse_rgb() {
        let expected = Some(RgbColor::new(255, 136, 0));
        assert_eq!(parse_rgb("#ff8800"), expected);
        assert_eq!(parse_rgb("#FF8800"), expected);
        assert_eq!(parse_rgb("rgb(255,136,0)"), expected);
        assert_eq!(parse_rgb("rgb( 255, 136 , 0 )"), expected);
    }

    #[test]
    fn test_parse_rgb_malformed() {
        assert_eq!(parse_rgb("#ff88"), None);
        assert_eq!(parse_rgb("#gg8800"), None);
        assert_eq!(parse_rgb("rgb(255,136)"), None);
        assert_eq!(parse_rgb("rgb(255,136,0,1)"), None);
        assert_eq!(parse_rgb("rgb(256,0,0)"), None);
        assert_eq!(parse_rgb("rgb(a,0,0)"), None);
        assert_eq!(parse_rgb("rgb(1,2,3"), None);
        assert_eq!(parse_rgb("orange"), None);
    }
}
