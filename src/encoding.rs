//! Encoding detection and byte-stream decoding.
//!
//! The decoder is the first stage of the pipeline: it inspects up to four
//! leading bytes to choose one of the five common UTF encodings, drops a
//! byte order mark if one was present, and then converts the remaining
//! bytes to a character stream. Bytes that were inspected but were not a
//! BOM are replayed, so no input is lost to the detection step.

use std::collections::VecDeque;
use std::fmt;

use encoding_rs::{Decoder, DecoderResult, UTF_16BE, UTF_16LE, UTF_8};

use crate::errors::{Error, Result};

/// Unicode "byte order mark" encoded as UTF-8
pub(crate) const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
/// Unicode "byte order mark" encoded as UTF-16 with little-endian byte order
pub(crate) const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
/// Unicode "byte order mark" encoded as UTF-16 with big-endian byte order
pub(crate) const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];
/// Unicode "byte order mark" encoded as UTF-32 with little-endian byte order
pub(crate) const UTF32_LE_BOM: &[u8] = &[0xFF, 0xFE, 0x00, 0x00];
/// Unicode "byte order mark" encoded as UTF-32 with big-endian byte order
pub(crate) const UTF32_BE_BOM: &[u8] = &[0x00, 0x00, 0xFE, 0xFF];

/// Number of bytes pulled from the source per decode step.
const CHUNK: usize = 128;

/// An encoding the decoder is able to detect and decode.
///
/// UTF-8 and the UTF-16 flavors are decoded through [`encoding_rs`]; the
/// UTF-32 flavors are fixed-width and decoded directly, since `encoding_rs`
/// does not ship them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextEncoding {
    /// UTF-8, also the fallback when nothing else could be detected
    Utf8,
    /// UTF-16 with little-endian byte order
    Utf16Le,
    /// UTF-16 with big-endian byte order
    Utf16Be,
    /// UTF-32 with little-endian byte order
    Utf32Le,
    /// UTF-32 with big-endian byte order
    Utf32Be,
}

impl TextEncoding {
    /// Automatic encoding detection of XML files based on the
    /// [recommended algorithm](https://www.w3.org/TR/xml11/#sec-guessing).
    ///
    /// `prefix` is up to four leading bytes of the input. Returns the
    /// detected encoding and the number of BOM bytes to discard:
    ///
    /// | Bytes         | Detected encoding | BOM bytes
    /// |---------------|-------------------|----------
    /// |`00 00 FE FF`  | UTF-32 BE         | 4
    /// |`FF FE 00 00`  | UTF-32 LE         | 4
    /// |`FE FF ## ##`  | UTF-16 BE         | 2
    /// |`FF FE ## ##`  | UTF-16 LE         | 2
    /// |`EF BB BF`     | UTF-8             | 3
    /// |`00 00 00 3C`  | UTF-32 BE         | 0
    /// |`3C 00 00 00`  | UTF-32 LE         | 0
    /// |`00 3C 00 3F`  | UTF-16 BE         | 0
    /// |`3C 00 3F 00`  | UTF-16 LE         | 0
    /// | anything else | UTF-8             | 0
    ///
    /// The rows are tried in order: the 4-byte BOMs must win over their
    /// 2-byte prefixes (UTF-32 BE starts with `00 00`, the UTF-32 LE BOM
    /// contains the UTF-16 LE one).
    pub fn detect(prefix: &[u8]) -> (Self, usize) {
        match prefix {
            // with BOM; 32-bit patterns first
            _ if prefix.starts_with(UTF32_BE_BOM) => (Self::Utf32Be, 4),
            _ if prefix.starts_with(UTF32_LE_BOM) => (Self::Utf32Le, 4),
            _ if prefix.starts_with(UTF16_BE_BOM) => (Self::Utf16Be, 2),
            _ if prefix.starts_with(UTF16_LE_BOM) => (Self::Utf16Le, 2),
            _ if prefix.starts_with(UTF8_BOM) => (Self::Utf8, 3),

            // without BOM: sniff the `<` opening the first markup
            _ if prefix.starts_with(&[0x00, 0x00, 0x00, b'<']) => (Self::Utf32Be, 0),
            _ if prefix.starts_with(&[b'<', 0x00, 0x00, 0x00]) => (Self::Utf32Le, 0),
            _ if prefix.starts_with(&[0x00, b'<', 0x00, b'?']) => (Self::Utf16Be, 0),
            _ if prefix.starts_with(&[b'<', 0x00, b'?', 0x00]) => (Self::Utf16Le, 0),

            _ => (Self::Utf8, 0),
        }
    }

    /// A streaming `encoding_rs` decoder for this encoding, for the
    /// encodings that crate covers.
    fn new_decoder(self) -> Option<Decoder> {
        match self {
            Self::Utf8 => Some(UTF_8.new_decoder_without_bom_handling()),
            Self::Utf16Le => Some(UTF_16LE.new_decoder_without_bom_handling()),
            Self::Utf16Be => Some(UTF_16BE.new_decoder_without_bom_handling()),
            Self::Utf32Le | Self::Utf32Be => None,
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf32Le => "UTF-32LE",
            Self::Utf32Be => "UTF-32BE",
        })
    }
}

/// Pull decoder turning a byte stream into a character stream.
///
/// Encoding detection is deferred until the first character is demanded, so
/// constructing the decoder consumes nothing. Malformed byte sequences are
/// reported as [`Error::NonDecodable`] instead of being replaced; the
/// decoder is fused after the first error.
pub struct CharDecoder<I> {
    bytes: I,
    /// Sniffed bytes that were not part of a BOM, replayed before `bytes`.
    replay: VecDeque<u8>,
    /// Decoded characters not yet handed out.
    out: VecDeque<char>,
    /// `None` until the leading bytes were sniffed.
    encoding: Option<TextEncoding>,
    /// Streaming decoder for the `encoding_rs`-backed encodings.
    inner: Option<Decoder>,
    /// The byte source returned `None`.
    exhausted: bool,
    /// Everything was decoded and flushed, or an error was returned.
    done: bool,
}

impl<I: Iterator<Item = u8>> CharDecoder<I> {
    /// Creates a decoder over a byte stream. No bytes are consumed until
    /// the first character is pulled.
    pub fn new(bytes: I) -> Self {
        Self {
            bytes,
            replay: VecDeque::new(),
            out: VecDeque::new(),
            encoding: None,
            inner: None,
            exhausted: false,
            done: false,
        }
    }

    /// The encoding chosen for this stream, once detection ran.
    pub fn encoding(&self) -> Option<TextEncoding> {
        self.encoding
    }

    fn next_byte(&mut self) -> Option<u8> {
        if let Some(byte) = self.replay.pop_front() {
            return Some(byte);
        }
        if self.exhausted {
            return None;
        }
        match self.bytes.next() {
            Some(byte) => Some(byte),
            None => {
                self.exhausted = true;
                None
            }
        }
    }

    /// Inspects up to four leading bytes and fixes the encoding. The
    /// inspected bytes that were not a BOM are queued for replay.
    fn sniff(&mut self) -> TextEncoding {
        let mut prefix = [0u8; 4];
        let mut len = 0;
        while len < prefix.len() {
            match self.next_byte() {
                Some(byte) => {
                    prefix[len] = byte;
                    len += 1;
                }
                None => break,
            }
        }
        let (encoding, bom_len) = TextEncoding::detect(&prefix[..len]);
        self.replay.extend(&prefix[bom_len..len]);
        self.inner = encoding.new_decoder();
        self.encoding = Some(encoding);
        encoding
    }

    /// Decodes one more chunk of input into `self.out`.
    fn refill(&mut self, encoding: TextEncoding) -> Result<()> {
        match encoding {
            TextEncoding::Utf32Le | TextEncoding::Utf32Be => self.refill_utf32(encoding),
            _ => self.refill_with_inner(encoding),
        }
    }

    fn refill_with_inner(&mut self, encoding: TextEncoding) -> Result<()> {
        let mut chunk = [0u8; CHUNK];
        let mut len = 0;
        while len < chunk.len() {
            match self.next_byte() {
                Some(byte) => {
                    chunk[len] = byte;
                    len += 1;
                }
                None => break,
            }
        }
        let last = self.replay.is_empty() && self.exhausted;

        let decoder = match self.inner.as_mut() {
            Some(decoder) => decoder,
            None => return Err(Error::NonDecodable(encoding)),
        };
        let mut decoded = String::with_capacity(
            decoder
                .max_utf8_buffer_length_without_replacement(len)
                .unwrap_or(4 * len + 4),
        );
        let mut src = &chunk[..len];
        loop {
            let (result, read) =
                decoder.decode_to_string_without_replacement(src, &mut decoded, last);
            src = &src[read..];
            match result {
                DecoderResult::InputEmpty => break,
                DecoderResult::OutputFull => decoded.reserve(CHUNK),
                DecoderResult::Malformed(..) => return Err(Error::NonDecodable(encoding)),
            }
        }
        self.out.extend(decoded.chars());
        if last {
            self.done = true;
        }
        Ok(())
    }

    /// UTF-32 is a fixed-width encoding: every code point is one 4-byte
    /// word, surrogate values and out-of-range words are invalid.
    fn refill_utf32(&mut self, encoding: TextEncoding) -> Result<()> {
        let mut word = [0u8; 4];
        let mut len = 0;
        while len < word.len() {
            match self.next_byte() {
                Some(byte) => {
                    word[len] = byte;
                    len += 1;
                }
                None => break,
            }
        }
        if len == 0 {
            self.done = true;
            return Ok(());
        }
        if len < word.len() {
            return Err(Error::NonDecodable(encoding));
        }
        let code = match encoding {
            TextEncoding::Utf32Le => u32::from_le_bytes(word),
            _ => u32::from_be_bytes(word),
        };
        match char::from_u32(code) {
            Some(ch) => {
                self.out.push_back(ch);
                Ok(())
            }
            None => Err(Error::NonDecodable(encoding)),
        }
    }
}

impl<I: Iterator<Item = u8>> Iterator for CharDecoder<I> {
    type Item = Result<char>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(ch) = self.out.pop_front() {
                return Some(Ok(ch));
            }
            if self.done {
                return None;
            }
            let encoding = match self.encoding {
                Some(encoding) => encoding,
                None => self.sniff(),
            };
            if let Err(error) = self.refill(encoding) {
                self.done = true;
                return Some(Err(error));
            }
        }
    }
}

/// Adapter for input that is already decoded to characters, so encoding
/// detection is skipped entirely.
pub struct Decoded<C>(C);

impl<C: Iterator<Item = char>> Decoded<C> {
    /// Wraps a character iterator as pipeline input.
    pub fn new(chars: C) -> Self {
        Self(chars)
    }
}

impl<C: Iterator<Item = char>> Iterator for Decoded<C> {
    type Item = Result<char>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(Ok)
    }
}
