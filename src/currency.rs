// 💲 Currency parsing - statement amounts are display strings ("$1,234.56")

/// Parse a statement currency string into a number.
///
/// Accepts `$`, thousands separators, surrounding whitespace, a leading `-`
/// and accounting-style parentheses. Anything without a recognizable amount
/// yields 0.0 so one bad cell never blocks the rest of the computation.
pub fn parse_currency(text: &str) -> f64 {
    let trimmed = text.trim();
    let (negative, body) = if trimmed.starts_with('(') && trimmed.ends_with(')') && trimmed.len() >= 2 {
        (true, &trimmed[1..trimmed.len() - 1])
    } else {
        (false, trimmed)
    };

    let cleaned: String = body
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '$' && *c != ',')
        .collect();

    let (sign, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, cleaned.as_str()),
    };

    // First numeric run only: "12.50 USD" → 12.50
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .map(|(i, _)| i)
        .unwrap_or(digits.len());

    let value = match digits[..end].parse::<f64>() {
        Ok(v) if v.is_finite() => v * sign,
        _ => 0.0,
    };

    if negative {
        -value.abs()
    } else {
        value
    }
}
