//! Numeric conversions that do not need an interpreter.
//!
//! These are the number-level halves of ToString, ToNumber, ToInteger,
//! ToInt32, ToUint32 and ToUint16. The interpreter layers object coercion on
//! top of them.

const TWO_32: f64 = 4_294_967_296.0;
const TWO_16: f64 = 65_536.0;

/// Render a number the way ToString does.
///
/// # Examples
///
/// ```
/// use core_types::number_to_string;
///
/// assert_eq!(number_to_string(1.0), "1");
/// assert_eq!(number_to_string(0.1), "0.1");
/// assert_eq!(number_to_string(-0.0), "0");
/// assert_eq!(number_to_string(f64::NAN), "NaN");
/// assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
/// assert_eq!(number_to_string(1e21), "1e+21");
/// ```
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let mut buf = ryu_js::Buffer::new();
    buf.format(n).to_string()
}

fn is_str_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\u{0B}' | '\u{0C}' | ' ' | '\u{A0}' | '\n' | '\r' | '\u{2028}' | '\u{2029}'
    ) || (c.is_whitespace() && c != '\u{85}')
}

/// Parse a string the way ToNumber does.
///
/// Leading and trailing white space is ignored, an empty string is zero,
/// `0x` introduces an unsigned hex literal and anything unparseable is NaN.
///
/// # Examples
///
/// ```
/// use core_types::string_to_number;
///
/// assert_eq!(string_to_number("  42  "), 42.0);
/// assert_eq!(string_to_number(""), 0.0);
/// assert_eq!(string_to_number("0x1F"), 31.0);
/// assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
/// assert!(string_to_number("12px").is_nan());
/// assert!(string_to_number("inf").is_nan());
/// ```
pub fn string_to_number(s: &str) -> f64 {
    let s = s.trim_matches(is_str_whitespace);
    if s.is_empty() {
        return 0.0;
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() {
            return f64::NAN;
        }
        let mut value = 0.0f64;
        for c in hex.chars() {
            match c.to_digit(16) {
                Some(d) => value = value * 16.0 + d as f64,
                None => return f64::NAN,
            }
        }
        return value;
    }

    let (sign, unsigned) = match s.as_bytes()[0] {
        b'+' => (1.0, &s[1..]),
        b'-' => (-1.0, &s[1..]),
        _ => (1.0, s),
    };
    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    }
    if !is_decimal_literal(unsigned) {
        return f64::NAN;
    }
    unsigned
        .parse::<f64>()
        .map(|v| sign * v)
        .unwrap_or(f64::NAN)
}

// digits [. digits] [e [sign] digits], with at least one mantissa digit
fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut mantissa_digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        mantissa_digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }
    i == bytes.len()
}

/// ToInteger on a number: NaN becomes 0, everything else truncates toward zero.
pub fn to_integer(n: f64) -> f64 {
    if n.is_nan() {
        0.0
    } else if n == 0.0 || n.is_infinite() {
        n
    } else {
        n.trunc()
    }
}

fn modulo(n: f64, m: f64) -> f64 {
    if !n.is_finite() {
        return 0.0;
    }
    let r = n.trunc() % m;
    if r < 0.0 {
        r + m
    } else {
        r
    }
}

/// ToUint32: truncate, then wrap modulo 2^32. NaN and infinities map to 0.
///
/// # Examples
///
/// ```
/// use core_types::to_uint32;
///
/// assert_eq!(to_uint32(-1.0), 4294967295);
/// assert_eq!(to_uint32(4294967296.0 + 5.0), 5);
/// ```
pub fn to_uint32(n: f64) -> u32 {
    modulo(n, TWO_32) as u32
}

/// ToInt32: ToUint32 reinterpreted as a signed two's complement value.
///
/// # Examples
///
/// ```
/// use core_types::to_int32;
///
/// assert_eq!(to_int32(f64::NAN), 0);
/// assert_eq!(to_int32(f64::INFINITY), 0);
/// assert_eq!(to_int32(4294967296.0 + 5.0), 5);
/// assert_eq!(to_int32(2147483648.0), -2147483648);
/// ```
pub fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// ToUint16: truncate, then wrap modulo 2^16.
pub fn to_uint16(n: f64) -> u16 {
    modulo(n, TWO_16) as u16
}
