//! Tokens and events flowing through the pipeline.
//!
//! The tokenizer produces [`Token`]s, whose names are lexical
//! ([`LName`]) and whose attributes are plain name/value pairs. The
//! namespace resolver rewrites them into [`Event`]s, whose names are
//! qualified ([`QName`]) and whose `xmlns` attributes have been absorbed
//! into the namespace scopes. Character data travels as [`Content`]
//! fragments in both.

pub mod attributes;

use std::fmt;

use crate::errors::{Error, Result};
use crate::name::{LName, QName};
use crate::tokenizer::is_whitespace;

/// The atom of character data: either a literal run of characters, or a
/// named entity that is not one of the five predefined entities.
///
/// Predefined entities and numeric character references are resolved by
/// the tokenizer, so they arrive here as literal text. Everything else
/// written as `&name;` is kept unresolved so consumers can decide whether
/// to reject it or look it up themselves.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Content {
    /// A literal run of characters.
    Text(String),
    /// An unresolved entity reference, carrying the name between `&` and `;`.
    Entity(String),
}

impl Content {
    /// Whether this fragment is literal text made of whitespace only.
    /// Entity fragments are never whitespace.
    pub fn is_whitespace(&self) -> bool {
        match self {
            Content::Text(text) => text.chars().all(is_whitespace),
            Content::Entity(_) => false,
        }
    }

    /// The literal text of this fragment, rejecting unresolved entities.
    pub fn text(&self) -> Result<&str> {
        match self {
            Content::Text(text) => Ok(text),
            Content::Entity(name) => Err(Error::UnresolvedEntity(name.clone())),
        }
    }

    /// Appends this fragment to `out`: literal text verbatim, unresolved
    /// entities rendered back as `&name;`.
    pub fn flatten_into(&self, out: &mut String) {
        match self {
            Content::Text(text) => out.push_str(text),
            Content::Entity(name) => {
                out.push('&');
                out.push_str(name);
                out.push(';');
            }
        }
    }

    /// This fragment flattened to a string.
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        self.flatten_into(&mut out);
        out
    }

    /// Flattens a whole fragment list.
    pub fn flatten_all(fragments: &[Content]) -> String {
        let mut out = String::new();
        for fragment in fragments {
            fragment.flatten_into(&mut out);
        }
        out
    }
}

/// External identifier of a doctype.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExternalId {
    /// `SYSTEM "…"`
    System(String),
    /// `PUBLIC "…" "…"`
    Public(String, String),
}

/// Payload of a `<!DOCTYPE …>` declaration. The internal subset, if any,
/// is skipped, not captured.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Doctype {
    /// Name of the document's root element.
    pub name: String,
    /// The external identifier, if the doctype had one.
    pub external_id: Option<ExternalId>,
}

/// A lexical token produced by the tokenizer. Names are unresolved and
/// `xmlns` attributes are still ordinary attributes at this stage.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// The `<?xml …?>` prolog with its pseudo-attributes.
    Decl(Vec<(LName, Vec<Content>)>),
    /// A processing instruction `<?target body?>`.
    PI {
        /// The instruction target.
        target: String,
        /// Everything between the target and `?>`.
        content: String,
    },
    /// A start tag, or the whole element if `self_closing`.
    Start {
        /// The tag name.
        name: LName,
        /// The attributes in document order.
        attributes: Vec<(LName, Vec<Content>)>,
        /// The tag ended in `/>`.
        self_closing: bool,
    },
    /// An end tag `</name>`.
    End(LName),
    /// One content fragment between markup. Consecutive fragments stay
    /// separate tokens.
    Text(Content),
    /// A comment `<!-- … -->`.
    Comment(String),
    /// A CDATA section `<![CDATA[…]]>`.
    CData(String),
    /// A `<!DOCTYPE …>` declaration.
    DocType(Doctype),
}

/// An attribute of a resolved start element.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attribute {
    /// The resolved attribute name. Unprefixed attribute names never take
    /// the default namespace.
    pub name: QName,
    /// The attribute value as parsed fragments.
    pub value: Vec<Content>,
}

impl Attribute {
    /// The attribute value flattened to a string.
    pub fn flat_value(&self) -> String {
        Content::flatten_all(&self.value)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}=\"{}\"", self.name, self.flat_value())
    }
}

/// A resolved start element.
#[derive(Clone, Debug, PartialEq)]
pub struct StartElement {
    /// The qualified element name.
    pub name: QName,
    /// The attributes in document order, `xmlns` declarations excluded.
    pub attributes: Vec<Attribute>,
}

impl StartElement {
    /// Looks up an attribute by name.
    pub fn attribute(&self, name: &QName) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == *name)
    }
}

/// A resolved event, the pipeline's output.
///
/// The stream always starts with [`StartDocument`] and, for balanced
/// input, ends with [`EndDocument`]. A self-closing element produces
/// [`Start`] immediately followed by [`End`].
///
/// [`StartDocument`]: Event::StartDocument
/// [`EndDocument`]: Event::EndDocument
/// [`Start`]: Event::Start
/// [`End`]: Event::End
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Emitted exactly once, before everything else.
    StartDocument,
    /// Emitted exactly once, after everything else.
    EndDocument,
    /// A processing instruction.
    PI {
        /// The instruction target.
        target: String,
        /// Everything between the target and `?>`.
        content: String,
    },
    /// A start tag.
    Start(StartElement),
    /// An end tag.
    End(QName),
    /// One content fragment. Consecutive fragments are separate events;
    /// coalescing is left to consumers.
    Text(Content),
    /// A comment.
    Comment(String),
    /// A CDATA section.
    CData(String),
    /// A doctype declaration opens…
    StartDoctype(Doctype),
    /// …and closes immediately after.
    EndDoctype,
}
