/// Formats a figure with thousands separators and two decimals.
pub fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

/// Like [`format_value`] but drops the decimals, for counts and years.
pub fn format_count(value: f64) -> String {
    let formatted = format_value(value.round());
    formatted
        .strip_suffix(".00")
        .unwrap_or(&formatted)
        .to_string()
}

pub fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), format_value)
}

/// Cuts a label to `max` characters, marking the cut with an ellipsis.
pub fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        return label.to_string();
    }
    let kept: String = label.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}
