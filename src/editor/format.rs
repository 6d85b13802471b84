//! Keystroke formatters for the payment card form.

/// Group a card number into 4-digit blocks, keeping at most 16 digits.
///
/// Input with fewer than 4 digits is returned untouched so a user can keep
/// typing.
pub fn format_card_number(value: &str) -> String {
    let digits: Vec<char> = value.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return value.to_string();
    }

    digits
        .chunks(4)
        .take(4)
        .map(|block| block.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize raw expiry input towards `MM/YY`.
///
/// - a lone month digit 2-9 gets a leading zero (`"4"` -> `"04"`)
/// - `13`..`19` is read as month 1 plus a year digit (`"13"` -> `"01/3"`)
/// - four or more digits become `MM/YY`, dropping the rest
/// - three digits starting with a valid month get the slash after the month
pub fn format_expiry(value: &str) -> String {
    let mut digits: String = value.chars().filter(char::is_ascii_digit).collect();

    let needs_leading_zero = matches!(digits.as_bytes(), [b'2'..=b'9'] | [b'1', b'3'..=b'9']);
    if needs_leading_zero {
        digits.insert(0, '0');
    }

    if digits.len() >= 4 && matches!(digits.as_bytes()[0], b'0' | b'1') {
        return format!("{}/{}", &digits[..2], &digits[2..4]);
    }

    if digits.len() == 3 && is_month(&digits[..2]) {
        return format!("{}/{}", &digits[..2], &digits[2..]);
    }

    digits
}

/// Whether `value` is a complete `MM/YY` expiry with a real month.
pub fn is_valid_expiry(value: &str) -> bool {
    let Some((month, year)) = value.split_once('/') else {
        return false;
    };
    month.len() == 2
        && year.len() == 2
        && year.bytes().all(|b| b.is_ascii_digit())
        && is_month(month)
}

fn is_month(value: &str) -> bool {
    value.len() == 2
        && value.bytes().all(|b| b.is_ascii_digit())
        && matches!(value.parse::<u8>(), Ok(1..=12))
}
