//! The event reader and its pull combinators.
//!
//! [`EventReader`] drives the whole pipeline: it pulls tokens from the
//! tokenizer, runs them through the namespace resolver and hands out
//! [`Event`]s one at a time. On top of the raw `peek` / [`next_event`]
//! cursor it offers a small combinator vocabulary ([`tag`], [`content`],
//! [`choose`], [`many`], …) for assembling domain parsers without
//! materializing a tree.
//!
//! Every combinator either consumes a contiguous run of events and
//! succeeds, or consumes nothing and reports *not matched* as
//! `Ok(None)`. Errors are fatal; a combinator never recovers from one.
//!
//! [`next_event`]: EventReader::next_event
//! [`tag`]: EventReader::tag
//! [`content`]: EventReader::content
//! [`choose`]: EventReader::choose
//! [`many`]: EventReader::many

use std::collections::VecDeque;
use std::str::Chars;

use crate::encoding::{CharDecoder, Decoded};
use crate::errors::{Error, Result};
use crate::events::attributes::AttrParser;
use crate::events::{Content, Event, StartElement, Token};
use crate::name::{LName, NamespaceResolver, QName};
use crate::tokenizer::Tokenizer;

/// Parses a byte stream, auto-detecting its encoding from the leading
/// bytes.
pub fn parse_bytes<B>(bytes: B) -> EventReader<CharDecoder<B::IntoIter>>
where
    B: IntoIterator<Item = u8>,
{
    EventReader::new(Tokenizer::new(CharDecoder::new(bytes.into_iter())))
}

/// Parses an already-decoded character stream; encoding detection is
/// skipped.
pub fn parse_chars<C>(chars: C) -> EventReader<Decoded<C::IntoIter>>
where
    C: IntoIterator<Item = char>,
{
    EventReader::new(Tokenizer::new(Decoded::new(chars.into_iter())))
}

/// Convenience wrapper over [`parse_chars`] for string slices.
pub fn parse_str(text: &str) -> EventReader<Decoded<Chars<'_>>> {
    parse_chars(text.chars())
}

/// View over the pseudo-attributes of the `<?xml …?>` prolog.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XmlDecl {
    attributes: Vec<(LName, Vec<Content>)>,
}

impl XmlDecl {
    fn get(&self, name: &str) -> Option<String> {
        self.attributes
            .iter()
            .find(|(attr_name, _)| attr_name.prefix.is_none() && attr_name.local == name)
            .map(|(_, value)| Content::flatten_all(value))
    }

    /// The declared XML version, usually `1.0`.
    pub fn version(&self) -> Option<String> {
        self.get("version")
    }

    /// The declared encoding. Note that the detected encoding wins; this
    /// value is never cross-checked against it.
    pub fn encoding(&self) -> Option<String> {
        self.get("encoding")
    }

    /// The declared standalone status.
    pub fn standalone(&self) -> Option<String> {
        self.get("standalone")
    }
}

enum ReaderState {
    /// The start-of-document event was not handed out yet.
    Fresh,
    /// Inside the document.
    Document,
    /// The end-of-document event was handed out.
    Done,
}

/// A pull reader over the resolved event stream.
///
/// The stream starts with [`Event::StartDocument`] and, for balanced
/// input, ends with [`Event::EndDocument`]; input that ends while
/// elements are still open raises [`Error::UnexpectedEof`] instead.
///
/// The reader keeps a one-event lookahead ([`peek`]) which is what lets
/// the combinators leave the cursor untouched when they do not match.
///
/// [`peek`]: Self::peek
pub struct EventReader<I> {
    tokens: Tokenizer<I>,
    resolver: NamespaceResolver,
    /// Events synthesized from one token but not yet handed out.
    pending: VecDeque<Event>,
    peeked: Option<Event>,
    state: ReaderState,
    decl: Option<XmlDecl>,
}

impl<I: Iterator<Item = Result<char>>> EventReader<I> {
    pub(crate) fn new(tokens: Tokenizer<I>) -> Self {
        Self {
            tokens,
            resolver: NamespaceResolver::default(),
            pending: VecDeque::new(),
            peeked: None,
            state: ReaderState::Fresh,
            decl: None,
        }
    }

    /// The prolog's pseudo-attributes, available once the first event
    /// past the prolog has been pulled, and only if the document had an
    /// XML declaration.
    pub fn decl(&self) -> Option<&XmlDecl> {
        self.decl.as_ref()
    }

    /// Pulls the next event. Returns `None` after the end-of-document
    /// event.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        match self.peeked.take() {
            Some(event) => Ok(Some(event)),
            None => self.pump(),
        }
    }

    /// One-event lookahead; the peeked event stays in the stream.
    pub fn peek(&mut self) -> Result<Option<&Event>> {
        if self.peeked.is_none() {
            self.peeked = self.pump()?;
        }
        Ok(self.peeked.as_ref())
    }

    fn pump(&mut self) -> Result<Option<Event>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            match self.state {
                ReaderState::Fresh => {
                    self.state = ReaderState::Document;
                    return Ok(Some(Event::StartDocument));
                }
                ReaderState::Done => return Ok(None),
                ReaderState::Document => match self.tokens.next().transpose()? {
                    Some(token) => self.transduce(token),
                    None => {
                        if self.resolver.depth() > 0 {
                            return Err(Error::UnexpectedEof("element content".to_string()));
                        }
                        self.state = ReaderState::Done;
                        return Ok(Some(Event::EndDocument));
                    }
                },
            }
        }
    }

    /// Turns one token into zero, one or two events.
    fn transduce(&mut self, token: Token) {
        match token {
            Token::Decl(attributes) => {
                // the prolog is kept out of the event stream; its
                // pseudo-attributes stay available through `decl()`
                if self.decl.is_none() {
                    self.decl = Some(XmlDecl { attributes });
                }
            }
            Token::PI { target, content } => {
                self.pending.push_back(Event::PI { target, content });
            }
            Token::Start {
                name,
                attributes,
                self_closing,
            } => {
                let (name, attributes) = self.resolver.push(&name, attributes, self_closing);
                self.pending.push_back(Event::Start(StartElement {
                    name: name.clone(),
                    attributes,
                }));
                if self_closing {
                    self.pending.push_back(Event::End(name));
                }
            }
            Token::End(name) => {
                let name = self.resolver.pop(&name);
                self.pending.push_back(Event::End(name));
            }
            Token::Text(fragment) => self.pending.push_back(Event::Text(fragment)),
            Token::Comment(text) => self.pending.push_back(Event::Comment(text)),
            Token::CData(text) => self.pending.push_back(Event::CData(text)),
            Token::DocType(doctype) => {
                self.pending.push_back(Event::StartDoctype(doctype));
                self.pending.push_back(Event::EndDoctype);
            }
        }
    }
}

/// Pull combinators.
impl<I: Iterator<Item = Result<char>>> EventReader<I> {
    /// Drops text events whose fragment is whitespace only. Nothing else
    /// is skipped: mixed content, comments, instructions and doctype
    /// events stay in the stream, so a combinator that rejects afterwards
    /// leaves the cursor where it found it.
    fn skip_blank_text(&mut self) -> Result<()> {
        while matches!(self.peek()?, Some(Event::Text(fragment)) if fragment.is_whitespace()) {
            self.next_event()?;
        }
        Ok(())
    }

    /// Steps over the start-of-document event. It exists exactly once, at
    /// the very beginning of the stream, so consuming it is idempotent
    /// and does not move the cursor relative to any repeatable event.
    fn skip_start_document(&mut self) -> Result<()> {
        if matches!(self.peek()?, Some(Event::StartDocument)) {
            self.next_event()?;
        }
        Ok(())
    }

    /// Matches one element.
    ///
    /// `matcher` inspects the qualified name of the next start tag and
    /// returns a witness to proceed, or `None` to leave the element (and
    /// the cursor) untouched. `attrs` parses the element's attributes —
    /// every attribute must be consumed or explicitly ignored, leftovers
    /// raise [`Error::UnparsedAttributes`]. `body` runs between the start
    /// and end tag with the attribute parser's result; once it returns,
    /// the matching end tag is required.
    ///
    /// Whitespace-only text around the tags is transparent; any other
    /// event (including comments and instructions) is not, and makes the
    /// combinator report *not matched* with the cursor unmoved.
    ///
    /// Returns `Ok(None)` without consuming anything when the next
    /// meaningful event is not a start tag accepted by `matcher`.
    pub fn tag<W, A, T, M, F, B>(&mut self, matcher: M, attrs: F, body: B) -> Result<Option<T>>
    where
        M: FnOnce(&QName) -> Option<W>,
        F: FnOnce(W, &mut AttrParser) -> Result<A>,
        B: FnOnce(&mut Self, A) -> Result<T>,
    {
        self.skip_start_document()?;
        self.skip_blank_text()?;
        let element = match self.next_event()? {
            Some(Event::Start(element)) => element,
            other => {
                // the one-event lookahead slot doubles as pushback
                self.peeked = other;
                return Ok(None);
            }
        };
        let witness = match matcher(&element.name) {
            Some(witness) => witness,
            None => {
                self.peeked = Some(Event::Start(element));
                return Ok(None);
            }
        };
        let StartElement { name, attributes } = element;
        let mut attr_parser = AttrParser::new(attributes);
        let attr_value = attrs(witness, &mut attr_parser)?;
        attr_parser.finish()?;
        let result = body(self, attr_value)?;
        self.skip_blank_text()?;
        match self.next_event()? {
            Some(Event::End(end)) if end == name => Ok(Some(result)),
            Some(Event::End(end)) => Err(Error::EndEventMismatch {
                expected: name,
                found: end,
            }),
            other => Err(Error::Expected {
                msg: format!("end of element {}", name),
                event: other,
            }),
        }
    }

    /// [`tag`] matching one specific name.
    ///
    /// [`tag`]: Self::tag
    pub fn tag_name<A, T, F, B>(
        &mut self,
        name: impl Into<QName>,
        attrs: F,
        body: B,
    ) -> Result<Option<T>>
    where
        F: FnOnce(&mut AttrParser) -> Result<A>,
        B: FnOnce(&mut Self, A) -> Result<T>,
    {
        let name = name.into();
        self.tag(
            |candidate| if *candidate == name { Some(()) } else { None },
            |(), attr_parser| attrs(attr_parser),
            body,
        )
    }

    /// [`tag_name`] for elements that must not carry attributes.
    ///
    /// [`tag_name`]: Self::tag_name
    pub fn tag_no_attr<T, B>(&mut self, name: impl Into<QName>, body: B) -> Result<Option<T>>
    where
        B: FnOnce(&mut Self) -> Result<T>,
    {
        self.tag_name(name, |_| Ok(()), |reader, ()| body(reader))
    }

    fn next_if_text(&mut self) -> Result<Option<Content>> {
        match self.peek()? {
            Some(Event::Text(_)) => match self.next_event()? {
                Some(Event::Text(fragment)) => Ok(Some(fragment)),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    /// The flattened text of the consecutive text events at the cursor,
    /// or `None` when the next event is not text.
    pub fn content_maybe(&mut self) -> Result<Option<String>> {
        let mut text = match self.next_if_text()? {
            Some(fragment) => fragment.flatten(),
            None => return Ok(None),
        };
        while let Some(fragment) = self.next_if_text()? {
            fragment.flatten_into(&mut text);
        }
        Ok(Some(text))
    }

    /// As [`content_maybe`], but absent content is the empty string. The
    /// cursor does not move when there is no text to consume.
    ///
    /// [`content_maybe`]: Self::content_maybe
    pub fn content(&mut self) -> Result<String> {
        Ok(self.content_maybe()?.unwrap_or_default())
    }

    /// Tries the given parsers in order and returns the first match.
    /// A parser that does not match must not have consumed anything, so
    /// the next one sees the same cursor.
    pub fn choose<T>(
        &mut self,
        parsers: &mut [&mut dyn FnMut(&mut Self) -> Result<Option<T>>],
    ) -> Result<Option<T>> {
        for parser in parsers.iter_mut() {
            if let Some(value) = parser(self)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Collects matches of `parser` until it reports *not matched*.
    /// Terminates because every match consumes at least one event.
    pub fn many<T>(
        &mut self,
        mut parser: impl FnMut(&mut Self) -> Result<Option<T>>,
    ) -> Result<Vec<T>> {
        let mut values = Vec::new();
        while let Some(value) = parser(self)? {
            values.push(value);
        }
        Ok(values)
    }

    /// Turns *not matched* into an error carrying `msg` and the event
    /// that was found instead.
    pub fn force<T>(
        &mut self,
        msg: &str,
        parser: impl FnOnce(&mut Self) -> Result<Option<T>>,
    ) -> Result<T> {
        match parser(self)? {
            Some(value) => Ok(value),
            None => {
                let event = self.peek()?.cloned();
                Err(Error::Expected {
                    msg: msg.to_string(),
                    event,
                })
            }
        }
    }

    /// Skips one whole element, including everything nested below it.
    /// Events before the next start tag are dropped along the way.
    ///
    /// Reports *not matched*, consuming nothing further, when the
    /// enclosing element ends before another start tag shows up.
    pub fn ignore_elem(&mut self) -> Result<Option<()>> {
        loop {
            match self.peek()? {
                None | Some(Event::End(_)) | Some(Event::EndDocument) => return Ok(None),
                Some(Event::Start(_)) => break,
                _ => {
                    self.next_event()?;
                }
            }
        }
        self.next_event()?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_event()? {
                Some(Event::Start(_)) => depth += 1,
                Some(Event::End(_)) => depth -= 1,
                Some(_) => {}
                None => return Err(Error::UnexpectedEof("element content".to_string())),
            }
        }
        Ok(Some(()))
    }

    /// Skips every remaining sibling. The end tag of the enclosing
    /// element is left for the caller.
    pub fn ignore_siblings(&mut self) -> Result<()> {
        while self.ignore_elem()?.is_some() {}
        Ok(())
    }

    /// Tries `parser` against each sibling in turn, skipping the ones it
    /// does not match, and returns the first match. Reports *not matched*
    /// once the siblings are exhausted.
    pub fn skip_till<T>(
        &mut self,
        mut parser: impl FnMut(&mut Self) -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        loop {
            if let Some(value) = parser(self)? {
                return Ok(Some(value));
            }
            if self.ignore_elem()?.is_none() {
                return Ok(None);
            }
        }
    }

    /// Runs `parser`, then skips whatever siblings are left.
    pub fn skip_siblings<T>(
        &mut self,
        parser: impl FnOnce(&mut Self) -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        let value = parser(self)?;
        self.ignore_siblings()?;
        Ok(value)
    }
}

impl<I: Iterator<Item = Result<char>>> Iterator for EventReader<I> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}
