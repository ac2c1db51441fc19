//! Streaming XML pull parser.
//!
//! ## Description
//!
//! The crate is a linear pipeline of pull-based stages: bytes are decoded
//! to characters (with automatic detection of the five common UTF
//! encodings), tokenized, and rewritten into namespace-resolved events.
//! On top of the event cursor a small combinator layer (`tag`, `content`,
//! `choose`, `many`, …) assembles domain parsers without building a DOM.
//!
//! No stage reads ahead more than it must: four bytes for encoding
//! detection, one character in the tokenizer, one event in the
//! combinators. A consumer that stops pulling stops the whole pipeline.
//!
//! ## Examples
//!
//! Streaming over raw events:
//!
//! ```rust
//! use pull_xml::events::Event;
//!
//! let xml = r#"<tag1 att1="test">
//!                 <tag2><!--Test comment-->Test</tag2>
//!                 <tag2>Test 2</tag2>
//!             </tag1>"#;
//!
//! let mut count = 0;
//! let mut txt = Vec::new();
//! for event in pull_xml::parse_str(xml) {
//!     match event.unwrap() {
//!         Event::Start(e) if e.name.local == "tag2" => count += 1,
//!         Event::Text(t) => txt.push(t.flatten()),
//!         _ => (),
//!     }
//! }
//! assert_eq!(count, 2);
//! ```
//!
//! Consuming through the combinator layer:
//!
//! ```rust
//! let xml = r#"<people>
//!     <person age="25">Michael</person>
//!     <person age="2">Eliezer</person>
//! </people>"#;
//!
//! let mut reader = pull_xml::parse_str(xml);
//! let people = reader.force("people element", |r| {
//!     r.tag_no_attr("people", |r| {
//!         r.many(|r| {
//!             r.tag_name(
//!                 "person",
//!                 |attrs| attrs.require_attr("age"),
//!                 |r, age| Ok((age, r.content()?)),
//!             )
//!         })
//!     })
//! }).unwrap();
//!
//! assert_eq!(people[0], ("25".to_string(), "Michael".to_string()));
//! assert_eq!(people[1], ("2".to_string(), "Eliezer".to_string()));
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod encoding;
pub mod errors;
pub mod escape;
pub mod events;
pub mod name;
pub mod reader;
pub mod tokenizer;

// reexports
pub use crate::errors::{Error, Result};
pub use crate::events::Event;
pub use crate::name::QName;
pub use crate::reader::{parse_bytes, parse_chars, parse_str, EventReader};
