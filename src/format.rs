use rust_decimal::Decimal;

/// Format a decimal amount with thousand separators and 2 decimal places.
/// e.g. `1234567.89` with `"$"` → `"$1,234,567.89"`
pub(crate) fn format_amount(val: Decimal, symbol: &str) -> String {
    let abs = val.abs().round_dp(2);
    let formatted = format!("{abs:.2}");
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if val < Decimal::ZERO && !abs.is_zero() {
        format!("-{symbol}{with_commas}.{dec_part}")
    } else {
        format!("{symbol}{with_commas}.{dec_part}")
    }
}

/// Format a ratio as a percentage with one decimal place: `0.853` → `"85.3%"`.
/// Ratios too large to scale print as `"-"`.
pub(crate) fn format_percent(ratio: Decimal) -> String {
    match ratio.checked_mul(Decimal::ONE_HUNDRED) {
        Some(pct) => format!("{:.1}%", pct.round_dp(1)),
        None => "-".into(),
    }
}

/// Truncate a string to `max` visible characters, appending "…" if truncated.
/// Safe for multi-byte UTF-8 characters.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}…")
}

/// A horizontal bar of `width` cells scaled so that `max` fills it.
pub(crate) fn bar(value: Decimal, max: Decimal, width: usize) -> String {
    if max <= Decimal::ZERO || value <= Decimal::ZERO {
        return String::new();
    }
    let cells = (value / max * Decimal::from(width as u64)).round();
    let cells = usize::try_from(cells.mantissa()).unwrap_or(width).min(width);
    "█".repeat(cells.max(1))
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
