//! Number text in the formats persisted description trees use.
//!
//! Persisted values must be byte-compatible with trees written by other
//! implementations, so the formatters reproduce C's `%.NE` and `%.Ng`
//! output exactly and the parsers follow the lenient prefix rules of
//! `atof`, `strtoll` and `strtoull` (longest valid prefix, garbage reads as
//! zero).

use crate::{Error, Result};

// ============================================================================
// Formatter
// ============================================================================

/// Formats `v` like C's `%.{precision}E`.
///
/// ```
/// use bandpam::numeric::format_scientific;
/// assert_eq!(format_scientific(-9999.0, 14), "-9.99900000000000E+03");
/// assert_eq!(format_scientific(f64::INFINITY, 14), "INF");
/// ```
pub fn format_scientific(v: f64, precision: usize) -> String {
    if v.is_nan() {
        return if v.is_sign_negative() { "-NAN".into() } else { "NAN".into() };
    }
    if v.is_infinite() {
        return if v < 0.0 { "-INF".into() } else { "INF".into() };
    }
    let raw = format!("{v:.precision$E}");
    let (mantissa, exp) = split_exponent(&raw, 'E');
    let mut out = String::with_capacity(mantissa.len() + 5);
    out.push_str(mantissa);
    out.push('E');
    push_c_exponent(&mut out, exp);
    out
}

/// Formats `v` like C's `%.{precision}g`.
///
/// ```
/// use bandpam::numeric::format_general;
/// assert_eq!(format_general(0.1, 16), "0.1");
/// assert_eq!(format_general(1e20, 16), "1e+20");
/// assert_eq!(format_general(255.5, 16), "255.5");
/// ```
pub fn format_general(v: f64, precision: usize) -> String {
    if v.is_nan() {
        return if v.is_sign_negative() { "-nan".into() } else { "nan".into() };
    }
    if v.is_infinite() {
        return if v < 0.0 { "-inf".into() } else { "inf".into() };
    }
    let p = precision.max(1);
    let sci = format!("{:.*e}", p - 1, v);
    let (mantissa, exp) = split_exponent(&sci, 'e');

    // %g: Festkomma wenn -4 <= X < P, sonst Exponentialform
    if exp >= -4 && exp < p as i32 {
        let decimals = (p as i32 - 1 - exp) as usize;
        let fixed = format!("{v:.decimals$}");
        strip_trailing_zeros(&fixed).to_string()
    } else {
        let mut out = strip_trailing_zeros(mantissa).to_string();
        out.push('e');
        push_c_exponent(&mut out, exp);
        out
    }
}

/// Zerlegt Rusts `{:e}` Ausgabe in Mantisse und Exponent.
fn split_exponent(raw: &str, marker: char) -> (&str, i32) {
    match raw.split_once(marker) {
        Some((m, e)) => (m, e.parse().unwrap_or(0)),
        None => (raw, 0),
    }
}

/// Haengt den Exponenten im C-Format an (Vorzeichen, mindestens zwei Ziffern).
fn push_c_exponent(out: &mut String, exp: i32) {
    out.push(if exp < 0 { '-' } else { '+' });
    let abs = exp.unsigned_abs();
    if abs < 10 {
        out.push('0');
    }
    out.push_str(&abs.to_string());
}

/// Entfernt Nullen am Ende des Nachkommateils (und ggf. den Dezimalpunkt).
fn strip_trailing_zeros(s: &str) -> &str {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.')
}

// ============================================================================
// Parser
// ============================================================================

/// Prueft auf C-Whitespace (isspace).
fn is_c_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r')
}

/// Ueberspringt fuehrenden Whitespace und liefert (negativ, Rest).
fn split_sign(s: &str) -> (bool, &str) {
    let s = s.trim_start_matches(|c: char| c.is_ascii() && is_c_space(c as u8));
    if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    }
}

/// Parses the longest real-number prefix of `s` like C's `atof`.
///
/// Leading whitespace is skipped, `nan`, `inf` and `infinity` are accepted
/// in any case, and text without a numeric prefix reads as `0.0`.
pub fn parse_real(s: &str) -> f64 {
    let (negative, rest) = split_sign(s);
    let sign = if negative { -1.0 } else { 1.0 };
    let bytes = rest.as_bytes();

    if starts_with_ignore_case(bytes, b"nan") {
        return if negative { -f64::NAN } else { f64::NAN };
    }
    if starts_with_ignore_case(bytes, b"inf") {
        return sign * f64::INFINITY;
    }

    let mut end = 0;
    let mut mantissa_digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        mantissa_digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return 0.0;
    }
    // Exponent nur uebernehmen wenn mindestens eine Ziffer folgt
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }
    let magnitude: f64 = rest[..end].parse().unwrap_or(0.0);
    sign * magnitude
}

fn starts_with_ignore_case(bytes: &[u8], prefix: &[u8]) -> bool {
    bytes.len() >= prefix.len() && bytes[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Liest die fuehrenden Dezimalziffern als u64; `None` bei Ueberlauf.
/// Liefert zusaetzlich ob ueberhaupt Ziffern vorhanden waren.
fn leading_digits(s: &str) -> (Option<u64>, bool) {
    let mut acc: Option<u64> = Some(0);
    let mut any = false;
    for b in s.bytes() {
        if !b.is_ascii_digit() {
            break;
        }
        any = true;
        acc = acc
            .and_then(|a| a.checked_mul(10))
            .and_then(|a| a.checked_add(u64::from(b - b'0')));
    }
    (acc, any)
}

/// Parses a signed 64-bit integer like C's `strtoll` in base 10.
///
/// Out-of-range values saturate at `i64::MIN` / `i64::MAX`.
pub fn parse_i64(s: &str) -> i64 {
    let (negative, rest) = split_sign(s);
    let (digits, any) = leading_digits(rest);
    if !any {
        return 0;
    }
    match digits {
        Some(m) if negative => {
            if m > i64::MAX as u64 + 1 { i64::MIN } else { (m as i64).wrapping_neg() }
        }
        Some(m) => i64::try_from(m).unwrap_or(i64::MAX),
        None if negative => i64::MIN,
        None => i64::MAX,
    }
}

/// Parses an unsigned 64-bit integer like C's `strtoull` in base 10.
///
/// Out-of-range values saturate at `u64::MAX`; a leading minus sign negates
/// the parsed magnitude modulo 2^64.
pub fn parse_u64(s: &str) -> u64 {
    let (negative, rest) = split_sign(s);
    match leading_digits(rest) {
        (_, false) => 0,
        (Some(m), true) if negative => m.wrapping_neg(),
        (Some(m), true) => m,
        (None, true) => u64::MAX,
    }
}

/// Parses an integer like C's `atoi`, clamped to the `i32` range.
pub fn parse_i32(s: &str) -> i32 {
    parse_i64(s).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

// ============================================================================
// Vergleich und Bitmuster
// ============================================================================

/// Tolerance-aware real equality used for histogram bounds.
pub fn are_real_equal(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() < f64::EPSILON * (a + b).abs() * 2.0
}

/// Lowercase hex dump of the little-endian bit pattern of `v` (16 digits).
pub fn hex_le_bits(v: f64) -> String {
    hex::encode(v.to_le_bytes())
}

/// Decodes a little-endian hex dump back into the exact double.
///
/// Fails when the text is not hex or does not decode to exactly 8 bytes.
pub fn f64_from_hex_le(s: &str) -> Result<f64> {
    let bytes = hex::decode(s.trim())
        .map_err(|e| Error::malformed("NoDataValue.le_hex_equiv", e.to_string()))?;
    let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
        Error::malformed(
            "NoDataValue.le_hex_equiv",
            format!("expected 8 bytes, got {}", bytes.len()),
        )
    })?;
    Ok(f64::from_le_bytes(raw))
}
