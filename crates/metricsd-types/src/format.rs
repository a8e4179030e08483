//! Plain-text rendering of stored values.
//!
//! Gauges render with the shortest digits that round-trip. Exponent form
//! (`d.ddde±XX`, at least two exponent digits) is used when the decimal
//! exponent is below -4 or at least 6, plain decimal otherwise. Clients
//! of the text endpoints compare these strings literally.

/// Render a gauge value, e.g. `2128506.0` as `2.128506e+06`.
pub fn format_gauge(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value.is_sign_positive() { "+Inf" } else { "-Inf" }.to_owned();
    }

    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };

    if (-4..6).contains(&exponent) {
        value.to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
    }
}

/// Render a counter total in decimal.
pub fn format_counter(value: i64) -> String {
    value.to_string()
}
