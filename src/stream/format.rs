//! Locale-independent numeric and string formatting for the text encoding.

use std::fmt::Write as _;

/// Number of decimals written for every float.
pub const FLOAT_DECIMALS: usize = 6;

/// Format `v` with fixed precision, trailing zeros trimmed and negative zero folded to `0`.
///
/// Non-finite values are written as `0`; the renderer cannot parse `NaN`/`inf` tokens.
pub fn format_float(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_owned();
    }
    let mut s = format!("{v:.prec$}", prec = FLOAT_DECIMALS);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_owned();
    }
    s
}

/// Quote a string token, escaping backslashes and double quotes.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Append `[v0 v1 ...]` with fixed-precision floats.
pub fn push_float_array<I>(out: &mut String, values: I)
where
    I: IntoIterator<Item = f64>,
{
    out.push('[');
    for (i, v) in values.into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format_float(v));
    }
    out.push(']');
}

/// Append `[i0 i1 ...]`.
pub fn push_int_array<I>(out: &mut String, values: I)
where
    I: IntoIterator<Item = i64>,
{
    out.push('[');
    for (i, v) in values.into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{v}");
    }
    out.push(']');
}

/// Append `["a" "b" ...]`.
pub fn push_string_array<'a, I>(out: &mut String, values: I)
where
    I: IntoIterator<Item = &'a str>,
{
    out.push('[');
    for (i, v) in values.into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&quote(v));
    }
    out.push(']');
}
