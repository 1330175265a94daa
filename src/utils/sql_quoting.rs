//! SQL literal and identifier helpers shared by the rewriters.
//!
//! The upstream query builder quotes meta keys the way MySQL's escaping does
//! (backslash before `\`, `'` and `"`), so patterns that must find those keys
//! again have to quote them identically.

/// Quote a string as a single-quoted SQL literal, backslash-escaping the
/// characters the upstream builder escapes.
///
/// # Examples
/// ```
/// use order_columns::utils::quote_string_literal;
///
/// assert_eq!(quote_string_literal("_billing_email"), "'_billing_email'");
/// assert_eq!(quote_string_literal("o'neil"), r"'o\'neil'");
/// ```
pub fn quote_string_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' | '\'' | '"' => {
                quoted.push('\\');
                quoted.push(ch);
            }
            '\0' => quoted.push_str("\\0"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\u{1a}' => quoted.push_str("\\Z"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('\'');
    quoted
}

/// True when `name` is a plain, unquoted SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// True for characters that can continue an identifier.
pub(crate) fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}
