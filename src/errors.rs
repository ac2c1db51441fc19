//! Error management module

use std::fmt;

use crate::encoding::TextEncoding;
use crate::events::{Attribute, Event};
use crate::name::QName;

/// The error type used by this crate.
///
/// All errors are fatal to the pipeline: once one is returned, the stream
/// that produced it must be discarded. The only recoverable outcome in the
/// API is the *not matched* result of the pull combinators, which is
/// expressed as `Ok(None)`, never as an error.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The input is not well-formed XML; the message describes the offending
    /// construct.
    Syntax(String),

    /// The input ended in the middle of the named construct.
    UnexpectedEof(String),

    /// The byte stream is not valid for the detected encoding.
    NonDecodable(TextEncoding),

    /// An end tag closed a different element than the one that was open.
    EndEventMismatch {
        /// Name of the element that was open.
        expected: QName,
        /// Name the end tag actually carried.
        found: QName,
    },

    /// A named entity was neither one of the five predefined entities nor
    /// acceptable to the consumer.
    UnresolvedEntity(String),

    /// An attribute parser completed while attributes were still unconsumed.
    UnparsedAttributes(Vec<Attribute>),

    /// A consumer required something the event stream does not provide at
    /// the current position.
    Expected {
        /// What the consumer was looking for.
        msg: String,
        /// The event that was found instead, when one was available.
        event: Option<Event>,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Syntax(msg) => write!(f, "syntax error: {}", msg),
            Error::UnexpectedEof(context) => {
                write!(f, "unexpected end of input during reading {}", context)
            }
            Error::NonDecodable(encoding) => {
                write!(f, "malformed {} byte sequence in input", encoding)
            }
            Error::EndEventMismatch { expected, found } => {
                write!(f, "expecting </{}> found </{}>", expected, found)
            }
            Error::UnresolvedEntity(name) => write!(f, "unresolved entity: &{};", name),
            Error::UnparsedAttributes(attributes) => {
                write!(f, "element has unparsed attributes: ")?;
                for (i, attribute) in attributes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", attribute)?;
                }
                Ok(())
            }
            Error::Expected { msg, event: None } => write!(f, "expected {}", msg),
            Error::Expected {
                msg,
                event: Some(event),
            } => write!(f, "expected {}, found {:?}", msg, event),
        }
    }
}

impl std::error::Error for Error {}

/// A specialized `Result` type where the error is hard-wired to [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
