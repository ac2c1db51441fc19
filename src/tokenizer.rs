//! The character-level tokenizer.
//!
//! A recursive-descent parser from a character stream to a stream of
//! [`Token`]s. At every step it peeks one character: `<` opens markup and
//! is dispatched on the next character (`?` instruction, `!` comment /
//! CDATA / doctype, `/` end tag, anything else a start tag); everything
//! else is character data, emitted one fragment at a time.
//!
//! The tokenizer does not check that tags balance; that is the consumer
//! layer's business. It does resolve the five predefined entities and
//! numeric character references, and keeps any other `&name;` as an
//! unresolved fragment.

use crate::errors::{Error, Result};
use crate::escape::{parse_char_ref, resolve_predefined_entity};
use crate::events::{Content, Doctype, ExternalId, Token};
use crate::name::LName;

/// A function to check whether the character is a whitespace (blank, new
/// line, carriage return or tab)
#[inline]
pub(crate) fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\r' | '\n' | '\t')
}

/// Characters that may appear in an identifier: everything except the
/// XML delimiters and whitespace.
#[inline]
fn is_name_char(ch: char) -> bool {
    !matches!(ch, '&' | '<' | '>' | ':' | '?' | '=' | '"' | '\'' | '/') && !is_whitespace(ch)
}

/// A pull tokenizer over a character stream.
///
/// The input is any iterator of `Result<char>`, which is what the
/// [decoder] produces; already-decoded input goes through [`Decoded`].
/// One character of lookahead is kept. After the first error the
/// tokenizer is fused.
///
/// [decoder]: crate::encoding::CharDecoder
/// [`Decoded`]: crate::encoding::Decoded
pub struct Tokenizer<I> {
    chars: I,
    peeked: Option<char>,
    errored: bool,
}

impl<I: Iterator<Item = Result<char>>> Tokenizer<I> {
    /// Creates a tokenizer over a character stream.
    pub fn new(chars: I) -> Self {
        Self {
            chars,
            peeked: None,
            errored: false,
        }
    }

    fn peek(&mut self) -> Result<Option<char>> {
        if self.peeked.is_none() {
            self.peeked = match self.chars.next() {
                Some(ch) => Some(ch?),
                None => return Ok(None),
            };
        }
        Ok(self.peeked)
    }

    fn bump(&mut self) -> Result<Option<char>> {
        match self.peeked.take() {
            Some(ch) => Ok(Some(ch)),
            None => self.chars.next().transpose(),
        }
    }

    fn next_or_eof(&mut self, context: &str) -> Result<char> {
        match self.bump()? {
            Some(ch) => Ok(ch),
            None => Err(Error::UnexpectedEof(context.to_string())),
        }
    }

    fn expect_char(&mut self, expected: char, context: &str) -> Result<()> {
        let found = self.next_or_eof(context)?;
        if found == expected {
            Ok(())
        } else {
            Err(Error::Syntax(format!(
                "expected '{}' in {}, found '{}'",
                expected, context, found
            )))
        }
    }

    fn expect_str(&mut self, expected: &str, context: &str) -> Result<()> {
        for ch in expected.chars() {
            self.expect_char(ch, context)?;
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) -> Result<()> {
        while matches!(self.peek()?, Some(ch) if is_whitespace(ch)) {
            self.bump()?;
        }
        Ok(())
    }

    /// Consumes one optional line break (`\n`, `\r` or `\r\n`).
    fn skip_newline(&mut self) -> Result<()> {
        if self.peek()? == Some('\r') {
            self.bump()?;
        }
        if self.peek()? == Some('\n') {
            self.bump()?;
        }
        Ok(())
    }

    fn identifier(&mut self, context: &str) -> Result<String> {
        let mut ident = String::new();
        while let Some(ch) = self.peek()? {
            if is_name_char(ch) {
                ident.push(ch);
                self.bump()?;
            } else {
                break;
            }
        }
        if ident.is_empty() {
            Err(Error::Syntax(format!("expected a name in {}", context)))
        } else {
            Ok(ident)
        }
    }

    /// A lexical name: an identifier, optionally followed by `:` and a
    /// second identifier.
    fn lexical_name(&mut self, context: &str) -> Result<LName> {
        let first = self.identifier(context)?;
        if self.peek()? == Some(':') {
            self.bump()?;
            let local = self.identifier(context)?;
            Ok(LName::prefixed(first, local))
        } else {
            Ok(LName::local(first))
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        match self.peek()? {
            None => Ok(None),
            Some('<') => {
                self.bump()?;
                self.markup().map(Some)
            }
            Some(_) => self
                .fragment(false, false)
                .map(|fragment| Some(Token::Text(fragment))),
        }
    }

    fn markup(&mut self) -> Result<Token> {
        match self.peek()? {
            Some('?') => {
                self.bump()?;
                self.instruction()
            }
            Some('!') => {
                self.bump()?;
                self.bang()
            }
            Some('/') => {
                self.bump()?;
                self.end_tag()
            }
            Some(_) => self.start_tag(),
            None => Err(Error::UnexpectedEof("markup".to_string())),
        }
    }

    /// After `<?`: either the XML declaration or a processing instruction.
    fn instruction(&mut self) -> Result<Token> {
        let target = self.identifier("processing instruction")?;
        if target == "xml" {
            let attributes = self.attributes()?;
            self.skip_whitespace()?;
            self.expect_char('?', "XML declaration")?;
            self.expect_char('>', "XML declaration")?;
            self.skip_newline()?;
            Ok(Token::Decl(attributes))
        } else {
            self.skip_whitespace()?;
            let mut content = String::new();
            loop {
                let ch = self.next_or_eof("processing instruction")?;
                if ch == '?' && self.peek()? == Some('>') {
                    self.bump()?;
                    break;
                }
                content.push(ch);
            }
            Ok(Token::PI { target, content })
        }
    }

    /// After `<!`: comment, CDATA section or doctype.
    fn bang(&mut self) -> Result<Token> {
        match self.peek()? {
            Some('-') => {
                self.expect_str("--", "comment")?;
                self.comment()
            }
            Some('[') => {
                self.expect_str("[CDATA[", "CDATA section")?;
                self.cdata()
            }
            Some('D') => {
                self.expect_str("DOCTYPE", "doctype")?;
                self.doctype()
            }
            Some(ch) => Err(Error::Syntax(format!(
                "only comment, CDATA and DOCTYPE can follow '<!', found '{}'",
                ch
            ))),
            None => Err(Error::UnexpectedEof("markup".to_string())),
        }
    }

    fn comment(&mut self) -> Result<Token> {
        let mut text = String::new();
        loop {
            let ch = self.next_or_eof("comment")?;
            text.push(ch);
            if text.ends_with("-->") {
                text.truncate(text.len() - 3);
                return Ok(Token::Comment(text));
            }
        }
    }

    fn cdata(&mut self) -> Result<Token> {
        let mut text = String::new();
        loop {
            let ch = self.next_or_eof("CDATA section")?;
            text.push(ch);
            if text.ends_with("]]>") {
                text.truncate(text.len() - 3);
                return Ok(Token::CData(text));
            }
        }
    }

    fn doctype(&mut self) -> Result<Token> {
        self.skip_whitespace()?;
        let name = self.identifier("doctype")?;
        self.skip_whitespace()?;
        let external_id = match self.peek()? {
            Some('P') => {
                self.expect_str("PUBLIC", "doctype")?;
                self.skip_whitespace()?;
                let public = self.quoted("public identifier")?;
                self.skip_whitespace()?;
                let system = self.quoted("system identifier")?;
                Some(ExternalId::Public(public, system))
            }
            Some('S') => {
                self.expect_str("SYSTEM", "doctype")?;
                self.skip_whitespace()?;
                Some(ExternalId::System(self.quoted("system identifier")?))
            }
            _ => None,
        };
        self.skip_whitespace()?;
        if self.peek()? == Some('[') {
            self.bump()?;
            // the internal subset is skipped raw up to the first `]`,
            // quotes are not interpreted
            loop {
                if self.next_or_eof("doctype internal subset")? == ']' {
                    break;
                }
            }
        }
        self.skip_whitespace()?;
        self.expect_char('>', "doctype")?;
        self.skip_newline()?;
        Ok(Token::DocType(Doctype { name, external_id }))
    }

    /// A quoted literal; either quote character works.
    fn quoted(&mut self, context: &str) -> Result<String> {
        let quote = self.next_or_eof(context)?;
        if quote != '"' && quote != '\'' {
            return Err(Error::Syntax(format!(
                "expected a quoted literal in {}, found '{}'",
                context, quote
            )));
        }
        let mut text = String::new();
        loop {
            let ch = self.next_or_eof(context)?;
            if ch == quote {
                return Ok(text);
            }
            text.push(ch);
        }
    }

    fn start_tag(&mut self) -> Result<Token> {
        self.skip_whitespace()?;
        let name = self.lexical_name("start tag")?;
        let attributes = self.attributes()?;
        self.skip_whitespace()?;
        let self_closing = if self.peek()? == Some('/') {
            self.bump()?;
            true
        } else {
            false
        };
        self.expect_char('>', "start tag")?;
        Ok(Token::Start {
            name,
            attributes,
            self_closing,
        })
    }

    fn end_tag(&mut self) -> Result<Token> {
        self.skip_whitespace()?;
        let name = self.lexical_name("end tag")?;
        self.skip_whitespace()?;
        self.expect_char('>', "end tag")?;
        Ok(Token::End(name))
    }

    fn attributes(&mut self) -> Result<Vec<(LName, Vec<Content>)>> {
        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace()?;
            match self.peek()? {
                Some(ch) if is_name_char(ch) => attributes.push(self.attribute()?),
                _ => return Ok(attributes),
            }
        }
    }

    fn attribute(&mut self) -> Result<(LName, Vec<Content>)> {
        let name = self.lexical_name("attribute")?;
        self.skip_whitespace()?;
        self.expect_char('=', "attribute")?;
        self.skip_whitespace()?;
        let quote = self.next_or_eof("attribute value")?;
        let (break_double, break_single) = match quote {
            '"' => (true, false),
            '\'' => (false, true),
            ch => {
                return Err(Error::Syntax(format!(
                    "attribute value must start with a quote, found '{}'",
                    ch
                )))
            }
        };
        let mut value = Vec::new();
        loop {
            match self.peek()? {
                Some(ch) if ch == quote => {
                    self.bump()?;
                    return Ok((name, value));
                }
                Some(_) => value.push(self.fragment(break_double, break_single)?),
                None => return Err(Error::UnexpectedEof("attribute value".to_string())),
            }
        }
    }

    /// One content fragment: an entity reference, or a literal run up to
    /// the next `&`, `<` or active quote character.
    fn fragment(&mut self, break_double: bool, break_single: bool) -> Result<Content> {
        if self.peek()? == Some('&') {
            self.bump()?;
            return self.entity();
        }
        let mut text = String::new();
        while let Some(ch) = self.peek()? {
            match ch {
                '&' | '<' => break,
                '"' if break_double => break,
                '\'' if break_single => break,
                _ => {
                    text.push(ch);
                    self.bump()?;
                }
            }
        }
        if text.is_empty() {
            // only reachable on a raw `<` inside an attribute value
            Err(Error::Syntax(
                "unescaped '<' in attribute value".to_string(),
            ))
        } else {
            Ok(Content::Text(text))
        }
    }

    /// After `&`: a character reference, a predefined entity, or an
    /// entity this tokenizer leaves unresolved.
    fn entity(&mut self) -> Result<Content> {
        if self.peek()? == Some('#') {
            self.bump()?;
            let mut digits = String::new();
            loop {
                let ch = self.next_or_eof("character reference")?;
                if ch == ';' {
                    break;
                }
                digits.push(ch);
            }
            let ch = parse_char_ref(&digits)?;
            Ok(Content::Text(ch.to_string()))
        } else {
            let name = self.identifier("entity reference")?;
            self.expect_char(';', "entity reference")?;
            match resolve_predefined_entity(&name) {
                Some(text) => Ok(Content::Text(text.to_string())),
                None => Ok(Content::Entity(name)),
            }
        }
    }
}

impl<I: Iterator<Item = Result<char>>> Iterator for Tokenizer<I> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored {
            return None;
        }
        match self.next_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => None,
            Err(error) => {
                self.errored = true;
                Some(Err(error))
            }
        }
    }
}
