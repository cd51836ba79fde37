/// Format a float the way ECMAScript's `Number.prototype.toString` would,
/// so that canonical payloads signed by one implementation verify
/// byte-for-byte against another.
///
/// `NaN` and both infinities collapse to `"null"`. Magnitudes in
/// `(0, 1e-6)` or `>= 1e21` use scientific notation; everything else uses
/// fixed notation with trailing zeros trimmed.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() || n.is_infinite() {
        return "null".to_string();
    }
    if (n > 0.0 && n < 1e-6) || n >= 1e21 {
        format_scientific(n)
    } else {
        format_fixed(n)
    }
}

fn format_scientific(n: f64) -> String {
    let raw = format!("{n:.8e}");
    let (mantissa, exponent) = raw.split_once('e').expect("exp format always has 'e'");
    let mantissa = trim_trailing_zeros(mantissa);
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(d) => ("-", d),
        None => ("+", exponent),
    };
    let digits = digits.trim_start_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };
    format!("{mantissa}e{sign}{digits}")
}

fn format_fixed(n: f64) -> String {
    let raw = format!("{n:.8}");
    trim_trailing_zeros(&raw).to_string()
}

fn trim_trailing_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
