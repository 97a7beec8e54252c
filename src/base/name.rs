//! Domain names.
//!
//! A domain name is a sequence of labels of up to 63 octets each, with a
//! total wire length of at most 255 octets including the terminating empty
//! root label. [`Name`] stores the uncompressed wire form. Comparison and
//! hashing fold ASCII case, as required for names, while the stored octets
//! keep the case they were created with.
//!
//! On the wire a name may end in a compression pointer: a two octet value
//! with the top two bits set whose remaining 14 bits are an absolute offset
//! into the message where the name continues. [`Name::parse`] follows such
//! pointers; [`Name::compose`] emits them when the composer has already
//! written the same suffix.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::str::FromStr;
use bytes::{BufMut, Bytes, BytesMut};
use super::wire::{Composer, ParseError, Parser};

/// The maximum wire length of a domain name.
pub const MAX_NAME_LEN: usize = 255;

/// The maximum length of a single label.
pub const MAX_LABEL_LEN: usize = 63;

//------------ Name ----------------------------------------------------------

/// An absolute domain name.
#[derive(Clone)]
pub struct Name {
    /// The uncompressed wire format of the name.
    ///
    /// Always ends with the empty root label and is at most
    /// [`MAX_NAME_LEN`] octets long.
    octets: Bytes,
}

impl Name {
    /// Creates the root name.
    pub fn root() -> Self {
        Name {
            octets: Bytes::from_static(b"\0"),
        }
    }

    /// Returns whether this is the root name.
    pub fn is_root(&self) -> bool {
        self.octets.len() == 1
    }

    /// Returns the wire length of the name.
    pub fn len(&self) -> usize {
        self.octets.len()
    }

    /// Returns whether the name is empty.
    ///
    /// It never is: even the root name contains the empty root label.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns the uncompressed wire format octets.
    pub fn as_wire(&self) -> &[u8] {
        &self.octets
    }

    /// Returns an iterator over the labels of the name.
    ///
    /// The final empty root label is not included.
    pub fn iter_labels(&self) -> Labels {
        Labels {
            octets: &self.octets,
        }
    }

    /// Returns the number of labels, not counting the root label.
    pub fn label_count(&self) -> usize {
        self.iter_labels().count()
    }

    /// Returns the name with its first label removed.
    ///
    /// Returns `None` for the root name.
    pub fn parent(&self) -> Option<Name> {
        if self.is_root() {
            return None;
        }
        let skip = usize::from(self.octets[0]) + 1;
        Some(Name {
            octets: self.octets.slice(skip..),
        })
    }

    /// Returns whether `suffix` is identical to or a suffix of this name.
    ///
    /// Works label-wise: `ample.com` is not a suffix of `example.com`.
    pub fn ends_with(&self, suffix: &Name) -> bool {
        let mut name = self.clone();
        loop {
            if name == *suffix {
                return true;
            }
            match name.parent() {
                Some(parent) => name = parent,
                None => return false,
            }
        }
    }

    /// Parses a name out of a message.
    ///
    /// The parser is left positioned directly after the name, which for a
    /// compressed name is after the first compression pointer. The number
    /// of pointer jumps is bounded by the message length and every pointer
    /// must point strictly backwards, so parsing terminates on any input.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let mut buf = BytesMut::with_capacity(32);
        let mut return_pos = None;
        let mut jumps = 0usize;
        let max_jumps = parser.message().len();
        loop {
            let label_start = parser.pos();
            let ltype = parser.parse_u8()?;
            match ltype {
                0 => {
                    buf.put_u8(0);
                    break;
                }
                1..=0x3F => {
                    let len = usize::from(ltype);
                    if buf.len() + len + 2 > MAX_NAME_LEN {
                        return Err(ParseError::form_error("long name"));
                    }
                    let label = parser.parse_slice(len)?;
                    buf.put_u8(ltype);
                    buf.put_slice(label);
                }
                0xC0..=0xFF => {
                    let lo = parser.parse_u8()?;
                    let target =
                        usize::from(ltype & 0x3F) << 8 | usize::from(lo);
                    if target >= label_start {
                        return Err(ParseError::form_error(
                            "forward compression pointer",
                        ));
                    }
                    jumps += 1;
                    if jumps > max_jumps {
                        return Err(ParseError::form_error(
                            "compression pointer loop",
                        ));
                    }
                    if return_pos.is_none() {
                        return_pos = Some(parser.pos());
                    }
                    parser.seek(target)?;
                }
                _ => {
                    return Err(ParseError::form_error("bad label type"));
                }
            }
        }
        if let Some(pos) = return_pos {
            parser.seek(pos)?;
        }
        Ok(Name {
            octets: buf.freeze(),
        })
    }

    /// Appends the name to a composer.
    ///
    /// With `compressed`, suffixes already present in the composer's
    /// compression table are replaced by pointers and newly written
    /// suffixes are recorded. The root label is never compressed.
    pub fn compose(&self, composer: &mut Composer, compressed: bool) {
        let mut suffix = &self.octets[..];
        loop {
            if suffix == b"\0" {
                composer.append_u8(0);
                return;
            }
            if compressed {
                let key =
                    Bytes::from(suffix.to_ascii_lowercase());
                if let Some(pos) = composer.compress_get(&key) {
                    composer.append_u16_be(0xC000 | pos);
                    return;
                }
                composer.compress_insert(key);
            }
            let len = usize::from(suffix[0]);
            composer.append_slice(&suffix[..len + 1]);
            suffix = &suffix[len + 1..];
        }
    }
}

//--- FromStr

impl FromStr for Name {
    type Err = NameError;

    /// Parses a name from its dotted presentation form.
    ///
    /// An empty string or a single dot produce the root name; a trailing
    /// dot is accepted and ignored otherwise.
    fn from_str(s: &str) -> Result<Self, NameError> {
        if s.is_empty() || s == "." {
            return Ok(Name::root());
        }
        let s = s.strip_suffix('.').unwrap_or(s);
        let mut buf = BytesMut::with_capacity(s.len() + 2);
        for label in s.split('.') {
            if label.is_empty() {
                return Err(NameError::EmptyLabel);
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(NameError::LongLabel);
            }
            buf.put_u8(label.len() as u8);
            buf.put_slice(label.as_bytes());
        }
        buf.put_u8(0);
        if buf.len() > MAX_NAME_LEN {
            return Err(NameError::LongName);
        }
        Ok(Name {
            octets: buf.freeze(),
        })
    }
}

//--- PartialEq, Eq, and Hash

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.octets.eq_ignore_ascii_case(&other.octets)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for ch in self.octets.iter() {
            state.write_u8(ch.to_ascii_lowercase())
        }
    }
}

//--- Debug and Display

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        let mut first = true;
        for label in self.iter_labels() {
            if !first {
                f.write_str(".")?;
            }
            first = false;
            for &ch in label {
                if ch == b'.' || ch == b'\\' {
                    write!(f, "\\{}", ch as char)?;
                } else if ch.is_ascii_graphic() || ch == b' ' {
                    write!(f, "{}", ch as char)?;
                } else {
                    write!(f, "\\{:03}", ch)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}

//------------ Labels --------------------------------------------------------

/// An iterator over the labels of a name.
#[derive(Clone, Debug)]
pub struct Labels<'a> {
    /// The not yet visited tail of the name's wire form.
    octets: &'a [u8],
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let len = usize::from(*self.octets.first()?);
        if len == 0 {
            return None;
        }
        let res = &self.octets[1..len + 1];
        self.octets = &self.octets[len + 1..];
        Some(res)
    }
}

//------------ NameError -----------------------------------------------------

/// A domain name could not be constructed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NameError {
    /// A label was empty.
    EmptyLabel,

    /// A label was longer than 63 octets.
    LongLabel,

    /// The name was longer than 255 octets.
    LongName,
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            NameError::EmptyLabel => f.write_str("empty label"),
            NameError::LongLabel => f.write_str("label too long"),
            NameError::LongName => f.write_str("name too long"),
        }
    }
}

impl std::error::Error for NameError {}

//============ Tests =========================================================
