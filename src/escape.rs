//! Predefined entities and character references.
//!
//! XML knows exactly five predefined entities; everything else written as
//! `&name;` is kept as an unresolved fragment for the consumer to deal
//! with. Numeric character references (`&#65;`, `&#x42;`) are resolved to
//! their code point on the spot.

use crate::errors::{Error, Result};

#[cfg(test)]
use pretty_assertions::assert_eq;

/// Resolves predefined XML entities. If the specified entity is not a
/// predefined XML entity, `None` is returned.
///
/// The complete list of predefined entities is defined in the
/// [specification].
///
/// ```
/// # use pull_xml::escape::resolve_predefined_entity;
/// # use pretty_assertions::assert_eq;
/// assert_eq!(resolve_predefined_entity("lt"), Some("<"));
/// assert_eq!(resolve_predefined_entity("gt"), Some(">"));
/// assert_eq!(resolve_predefined_entity("amp"), Some("&"));
/// assert_eq!(resolve_predefined_entity("apos"), Some("'"));
/// assert_eq!(resolve_predefined_entity("quot"), Some("\""));
///
/// assert_eq!(resolve_predefined_entity("foo"), None);
/// ```
///
/// [specification]: https://www.w3.org/TR/xml11/#sec-predefined-ent
pub const fn resolve_predefined_entity(entity: &str) -> Option<&'static str> {
    // match over strings are not allowed in const functions
    let s = match entity.as_bytes() {
        b"lt" => "<",
        b"gt" => ">",
        b"amp" => "&",
        b"apos" => "'",
        b"quot" => "\"",
        _ => return None,
    };
    Some(s)
}

/// Parses the digits of a character reference, i.e. the part of
/// `&#65;` / `&#x42;` between `#` and `;`, into the character they denote.
///
/// The null character and values that are not Unicode scalar values are
/// rejected.
pub fn parse_char_ref(digits: &str) -> Result<char> {
    let code = if let Some(hex_digits) = digits.strip_prefix('x') {
        parse_hexadecimal(hex_digits)
    } else {
        parse_decimal(digits)
    }?;
    if code == 0 {
        return Err(Error::Syntax(
            "character reference to the null character".to_string(),
        ));
    }
    match char::from_u32(code) {
        Some(ch) => Ok(ch),
        None => Err(Error::Syntax(format!("'{}' is not a valid codepoint", code))),
    }
}

fn parse_hexadecimal(digits: &str) -> Result<u32> {
    // maximum code is 0x10FFFF => 6 characters
    if digits.is_empty() || digits.len() > 6 {
        return Err(Error::Syntax(
            "character reference is empty or too long".to_string(),
        ));
    }
    let mut code = 0;
    for b in digits.bytes() {
        code <<= 4;
        code += match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            b => {
                return Err(Error::Syntax(format!(
                    "'{}' is not a valid hexadecimal character",
                    b as char
                )))
            }
        } as u32;
    }
    Ok(code)
}

fn parse_decimal(digits: &str) -> Result<u32> {
    // maximum code is 0x10FFFF = 1114111 => 7 characters
    if digits.is_empty() || digits.len() > 7 {
        return Err(Error::Syntax(
            "character reference is empty or too long".to_string(),
        ));
    }
    let mut code = 0;
    for b in digits.bytes() {
        code *= 10;
        code += match b {
            b'0'..=b'9' => b - b'0',
            b => {
                return Err(Error::Syntax(format!(
                    "'{}' is not a valid decimal character",
                    b as char
                )))
            }
        } as u32;
    }
    Ok(code)
}

#[test]
fn test_predefined() {
    assert_eq!(resolve_predefined_entity("amp"), Some("&"));
    assert_eq!(resolve_predefined_entity(""), None);
    assert_eq!(resolve_predefined_entity("AMP"), None);
}

#[test]
fn test_char_ref() {
    assert_eq!(parse_char_ref("48").unwrap(), '0');
    assert_eq!(parse_char_ref("x30").unwrap(), '0');
    assert_eq!(parse_char_ref("x1F600").unwrap(), '\u{1F600}');
    assert!(parse_char_ref("").is_err());
    assert!(parse_char_ref("x").is_err());
    assert!(parse_char_ref("0").is_err());
    assert!(parse_char_ref("xD800").is_err());
    assert!(parse_char_ref("12q").is_err());
    assert!(parse_char_ref("x110000").is_err());
}
