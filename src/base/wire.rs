//! Reading and writing of wire-format data.
//!
//! [`Parser`] is a cursor over the raw octets of a DNS message. Because
//! compressed domain names contain absolute offsets into the message, a
//! parser always sees the entire message and keeps its own position.
//! [`Composer`] is the matching write side: it appends to a growable
//! buffer and optionally keeps the name compression state for the message
//! being built.

use core::fmt;
use bytes::{Bytes, BytesMut};

//------------ Parser --------------------------------------------------------

/// A cursor over the octets of a DNS message.
#[derive(Clone, Copy, Debug)]
pub struct Parser<'a> {
    /// The full message. Offset 0 is the first octet of the header.
    octets: &'a [u8],

    /// The current read position.
    pos: usize,

    /// The exclusive upper bound of the readable region.
    ///
    /// This is the message length except while parsing record data, where
    /// it is lowered to the end of the RDATA field.
    limit: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser positioned at the start of `octets`.
    pub fn from_octets(octets: &'a [u8]) -> Self {
        Parser {
            octets,
            pos: 0,
            limit: octets.len(),
        }
    }

    /// Returns the full underlying message slice.
    ///
    /// This ignores the limit and is used by the name parser to follow
    /// compression pointers.
    pub fn message(&self) -> &'a [u8] {
        self.octets
    }

    /// Returns the current position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the number of octets left before the limit.
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.pos)
    }

    /// Moves the position to `pos`.
    ///
    /// Seeking beyond the limit is an error.
    pub fn seek(&mut self, pos: usize) -> Result<(), ParseError> {
        if pos > self.limit {
            return Err(ParseError::ShortInput);
        }
        self.pos = pos;
        Ok(())
    }

    /// Advances the position by `count` octets.
    pub fn advance(&mut self, count: usize) -> Result<(), ParseError> {
        if count > self.remaining() {
            return Err(ParseError::ShortInput);
        }
        self.pos += count;
        Ok(())
    }

    /// Lowers the limit to `count` octets past the current position.
    ///
    /// Returns the previous limit so it can be restored afterwards.
    pub fn set_limit(&mut self, count: usize) -> Result<usize, ParseError> {
        let end = self.pos.checked_add(count).ok_or(ParseError::ShortInput)?;
        if end > self.limit {
            return Err(ParseError::ShortInput);
        }
        Ok(core::mem::replace(&mut self.limit, end))
    }

    /// Restores a limit previously returned by [`set_limit`].
    ///
    /// [`set_limit`]: Self::set_limit
    pub fn restore_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    /// Takes the next octet.
    pub fn parse_u8(&mut self) -> Result<u8, ParseError> {
        let res = *self
            .octets
            .get(self.pos)
            .filter(|_| self.pos < self.limit)
            .ok_or(ParseError::ShortInput)?;
        self.pos += 1;
        Ok(res)
    }

    /// Takes the next two octets as a big-endian integer.
    pub fn parse_u16_be(&mut self) -> Result<u16, ParseError> {
        let slice = self.parse_slice(2)?;
        Ok(u16::from_be_bytes([slice[0], slice[1]]))
    }

    /// Takes the next four octets as a big-endian integer.
    pub fn parse_u32_be(&mut self) -> Result<u32, ParseError> {
        let slice = self.parse_slice(4)?;
        Ok(u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]))
    }

    /// Takes the next `len` octets as a borrowed slice.
    pub fn parse_slice(&mut self, len: usize) -> Result<&'a [u8], ParseError> {
        if len > self.remaining() {
            return Err(ParseError::ShortInput);
        }
        let res = &self.octets[self.pos..self.pos + len];
        self.pos += len;
        Ok(res)
    }

    /// Takes the next `len` octets as an owned sequence.
    pub fn parse_octets(&mut self, len: usize) -> Result<Bytes, ParseError> {
        self.parse_slice(len).map(Bytes::copy_from_slice)
    }
}

//------------ Composer ------------------------------------------------------

/// A growable buffer a DNS message is written into.
///
/// The composer records the byte offset of every domain name suffix it has
/// written so later occurrences can be replaced by compression pointers.
/// Compression is per message, so each message gets its own composer.
#[derive(Debug, Default)]
pub struct Composer {
    /// The octets written so far.
    buf: BytesMut,

    /// Offsets of previously written name suffixes, keyed by the
    /// case-folded wire form of the suffix.
    compress: std::collections::HashMap<Bytes, u16>,
}

impl Composer {
    /// Creates an empty composer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of octets written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the written octets.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Shortens the buffer to `len` octets.
    ///
    /// Used to roll back a record that pushed the message over its size
    /// limit. Compression table entries pointing past `len` are dropped so
    /// no later name can point into the removed region.
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
        self.compress.retain(|_, pos| usize::from(*pos) < len);
    }

    /// Appends a slice of octets.
    pub fn append_slice(&mut self, slice: &[u8]) {
        self.buf.extend_from_slice(slice);
    }

    /// Appends a single octet.
    pub fn append_u8(&mut self, value: u8) {
        self.buf.extend_from_slice(&[value]);
    }

    /// Appends a big-endian integer.
    pub fn append_u16_be(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a big-endian integer.
    pub fn append_u32_be(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Overwrites the two octets starting at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos + 2` is past the end of the buffer.
    pub fn patch_u16_be(&mut self, pos: usize, value: u16) {
        self.buf[pos..pos + 2].copy_from_slice(&value.to_be_bytes());
    }

    /// Looks up the compression table entry for a case-folded suffix.
    pub fn compress_get(&self, key: &[u8]) -> Option<u16> {
        self.compress.get(key).copied()
    }

    /// Records the current offset for a case-folded suffix.
    ///
    /// Offsets that cannot be expressed in the 14 bits of a compression
    /// pointer are not recorded.
    pub fn compress_insert(&mut self, key: Bytes) {
        if let Ok(pos) = u16::try_from(self.buf.len()) {
            if pos < 0xC000 {
                self.compress.entry(key).or_insert(pos);
            }
        }
    }

    /// Appends data prefixed by its 16 bit length.
    ///
    /// The closure writes the data; the length field is patched in
    /// afterwards. Fails if the data is longer than 65535 octets.
    pub fn append_len_prefixed<F>(&mut self, op: F) -> Result<(), ComposeError>
    where
        F: FnOnce(&mut Self),
    {
        self.append_u16_be(0);
        let start = self.buf.len();
        op(self);
        let len = u16::try_from(self.buf.len() - start)
            .map_err(|_| ComposeError::LongData)?;
        self.patch_u16_be(start - 2, len);
        Ok(())
    }

    /// Finishes the message and returns its octets.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

//============ Error Types ===================================================

//------------ ParseError ----------------------------------------------------

/// An error happened while parsing wire data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// An attempt was made to read beyond the end of the input.
    ShortInput,

    /// The data violates the wire format.
    Form(FormError),
}

impl ParseError {
    /// Creates a form error with the given diagnostic message.
    pub fn form_error(msg: &'static str) -> Self {
        ParseError::Form(FormError::new(msg))
    }
}

impl From<FormError> for ParseError {
    fn from(err: FormError) -> Self {
        ParseError::Form(err)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParseError::ShortInput => f.write_str("unexpected end of input"),
            ParseError::Form(ref err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ParseError {}

//------------ FormError -----------------------------------------------------

/// Wire data did not conform to the format.
///
/// Carries a static diagnostic string naming what was wrong.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormError(&'static str);

impl FormError {
    /// Creates a new form error with the given diagnostic string.
    pub fn new(msg: &'static str) -> Self {
        FormError(msg)
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for FormError {}

//------------ ComposeError --------------------------------------------------

/// An error happened while composing wire data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ComposeError {
    /// A length-prefixed field exceeded 65535 octets.
    LongData,
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ComposeError::LongData => f.write_str("data too long"),
        }
    }
}

impl std::error::Error for ComposeError {}

//============ Tests =========================================================
