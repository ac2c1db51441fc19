use pretty_assertions::assert_eq;
use pull_xml::errors::Error;
use pull_xml::events::Event;
use pull_xml::{parse_bytes, parse_str, Result};

static DOCUMENT: &str = "<?xml version=\"1.0\"?>\n<котёл xmlns=\"ns\">\n  <p a=\"v\">текст &amp; 𝄞</p>\n</котёл>\n";

fn utf16(text: &str, le: bool, bom: bool) -> Vec<u8> {
    let mut bytes = Vec::new();
    if bom {
        bytes.extend_from_slice(if le { &[0xFF, 0xFE] } else { &[0xFE, 0xFF] });
    }
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&if le {
            unit.to_le_bytes()
        } else {
            unit.to_be_bytes()
        });
    }
    bytes
}

fn utf32(text: &str, le: bool, bom: bool) -> Vec<u8> {
    let mut bytes = Vec::new();
    if bom {
        bytes.extend_from_slice(if le {
            &[0xFF, 0xFE, 0x00, 0x00]
        } else {
            &[0x00, 0x00, 0xFE, 0xFF]
        });
    }
    for ch in text.chars() {
        bytes.extend_from_slice(&if le {
            (ch as u32).to_le_bytes()
        } else {
            (ch as u32).to_be_bytes()
        });
    }
    bytes
}

fn events_of(bytes: Vec<u8>) -> Vec<Event> {
    parse_bytes(bytes).collect::<Result<_>>().unwrap()
}

#[test]
fn every_encoding_yields_the_same_events() {
    let reference: Vec<Event> = parse_str(DOCUMENT).collect::<Result<_>>().unwrap();
    assert!(reference.len() > 4);

    let mut utf8_bom = vec![0xEF, 0xBB, 0xBF];
    utf8_bom.extend_from_slice(DOCUMENT.as_bytes());

    assert_eq!(events_of(DOCUMENT.as_bytes().to_vec()), reference);
    assert_eq!(events_of(utf8_bom), reference);
    assert_eq!(events_of(utf16(DOCUMENT, true, true)), reference);
    assert_eq!(events_of(utf16(DOCUMENT, false, true)), reference);
    assert_eq!(events_of(utf32(DOCUMENT, true, true)), reference);
    assert_eq!(events_of(utf32(DOCUMENT, false, true)), reference);
}

#[test]
fn bomless_utf16_is_sniffed_from_the_prolog() {
    // `<?` in 16-bit units is enough for detection, no BOM needed
    let reference: Vec<Event> = parse_str(DOCUMENT).collect::<Result<_>>().unwrap();
    assert_eq!(events_of(utf16(DOCUMENT, true, false)), reference);
    assert_eq!(events_of(utf16(DOCUMENT, false, false)), reference);
}

#[test]
fn bomless_utf32_is_sniffed_from_the_first_angle_bracket() {
    let document = "<a>x</a>";
    let reference: Vec<Event> = parse_str(document).collect::<Result<_>>().unwrap();
    assert_eq!(events_of(utf32(document, true, false)), reference);
    assert_eq!(events_of(utf32(document, false, false)), reference);
}

#[test]
fn malformed_utf8_is_a_decode_error() {
    let result: Result<Vec<Event>> = parse_bytes(b"<a>\xFF</a>".to_vec()).collect();
    assert!(matches!(result, Err(Error::NonDecodable(_))));
}

#[test]
fn truncated_utf32_word_is_a_decode_error() {
    let mut bytes = utf32("<a/>", false, true);
    bytes.pop();
    let result: Result<Vec<Event>> = parse_bytes(bytes).collect();
    assert!(matches!(result, Err(Error::NonDecodable(_))));
}
