use super::error::{MalformedNumber, UnexpectedEof, UnexpectedKeyword, UnsupportedDataType};
use crate::Encoding;

use num_traits::ToPrimitive;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Value type named in an array header, e.g. the `float` of `POINTS 8 float`
pub enum DataType {
    UnsignedChar,
    Char,
    UnsignedShort,
    Short,
    UnsignedInt,
    Int,
    UnsignedLong,
    Long,
    Float,
    Double,
}

impl DataType {
    pub(crate) fn from_name<E>(name: &str) -> Result<Self, E>
    where
        E: From<UnsupportedDataType>,
    {
        let data_type = match name.to_ascii_lowercase().as_str() {
            "unsigned_char" => Self::UnsignedChar,
            "char" => Self::Char,
            "unsigned_short" => Self::UnsignedShort,
            "short" => Self::Short,
            "unsigned_int" => Self::UnsignedInt,
            "int" => Self::Int,
            "unsigned_long" | "vtktypeuint64" => Self::UnsignedLong,
            "long" | "vtktypeint64" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            other => return Err(E::from(UnsupportedDataType::new(other.into()))),
        };

        Ok(data_type)
    }

    pub(crate) fn size(&self) -> usize {
        match self {
            Self::UnsignedChar | Self::Char => 1,
            Self::UnsignedShort | Self::Short => 2,
            Self::UnsignedInt | Self::Int | Self::Float => 4,
            Self::UnsignedLong | Self::Long | Self::Double => 8,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::UnsignedChar => "unsigned_char",
            Self::Char => "char",
            Self::UnsignedShort => "unsigned_short",
            Self::Short => "short",
            Self::UnsignedInt => "unsigned_int",
            Self::Int => "int",
            Self::UnsignedLong => "unsigned_long",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }
}

/// Reads whitespace separated tokens and raw binary blocks from a legacy file
pub(crate) struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// bytes not consumed yet
    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    /// `count * width` entries declared by a header. Every entry takes at least
    /// one byte in either encoding, so a total the rest of the file cannot hold
    /// is reported as an early end of file
    pub(crate) fn entries<E>(&self, count: usize, width: usize, expected: &str) -> Result<usize, E>
    where
        E: From<UnexpectedEof>,
    {
        count
            .checked_mul(width)
            .filter(|total| *total <= self.remaining())
            .ok_or_else(|| E::from(UnexpectedEof::new(expected.into())))
    }

    pub(crate) fn is_eof(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.bytes.len()
    }

    /// the next token without consuming it
    pub(crate) fn peek(&mut self) -> Option<Cow<'a, str>> {
        let start = self.pos;
        let token = self.next_token();
        self.pos = start;
        token
    }

    fn next_token(&mut self) -> Option<Cow<'a, str>> {
        self.skip_whitespace();
        let start = self.pos;

        while self.pos < self.bytes.len() && !self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }

        if start == self.pos {
            None
        } else {
            Some(String::from_utf8_lossy(&self.bytes[start..self.pos]))
        }
    }

    pub(crate) fn token<E>(&mut self, expected: &str) -> Result<Cow<'a, str>, E>
    where
        E: From<UnexpectedEof>,
    {
        self.next_token()
            .ok_or_else(|| E::from(UnexpectedEof::new(expected.into())))
    }

    /// consume a token that must match `expected` (case insensitive)
    pub(crate) fn keyword<E>(&mut self, expected: &str) -> Result<(), E>
    where
        E: From<UnexpectedEof> + From<UnexpectedKeyword>,
    {
        let token = self.token::<E>(expected)?;

        if token.eq_ignore_ascii_case(expected) {
            Ok(())
        } else {
            Err(E::from(UnexpectedKeyword::expected(expected, token)))
        }
    }

    /// consume the rest of the current line, including the line break
    pub(crate) fn line(&mut self) -> Cow<'a, str> {
        let start = self.pos;

        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }

        let line = String::from_utf8_lossy(&self.bytes[start..self.pos]);

        if self.pos < self.bytes.len() {
            self.pos += 1;
        }

        line
    }

    pub(crate) fn usize<E>(&mut self, expected: &str) -> Result<usize, E>
    where
        E: From<UnexpectedEof> + From<MalformedNumber>,
    {
        let token = self.token::<E>(expected)?;
        token
            .parse()
            .map_err(|_| E::from(MalformedNumber::new(token.into_owned())))
    }

    pub(crate) fn f64<E>(&mut self, expected: &str) -> Result<f64, E>
    where
        E: From<UnexpectedEof> + From<MalformedNumber>,
    {
        let token = self.token::<E>(expected)?;
        parse_float(&token).ok_or_else(|| E::from(MalformedNumber::new(token.into_owned())))
    }

    pub(crate) fn point<E>(&mut self, expected: &str) -> Result<[f64; 3], E>
    where
        E: From<UnexpectedEof> + From<MalformedNumber>,
    {
        Ok([
            self.f64::<E>(expected)?,
            self.f64::<E>(expected)?,
            self.f64::<E>(expected)?,
        ])
    }

    /// read `count` values of `data_type` following an array header line
    pub(crate) fn values<E>(
        &mut self,
        count: usize,
        data_type: DataType,
        encoding: Encoding,
        expected: &str,
    ) -> Result<Vec<f64>, E>
    where
        E: From<UnexpectedEof> + From<MalformedNumber>,
    {
        let count = self.entries::<E>(count, 1, expected)?;

        match encoding {
            Encoding::Ascii => (0..count).map(|_| self.f64::<E>(expected)).collect(),
            Encoding::Binary => {
                let length = self.entries::<E>(count, data_type.size(), expected)?;
                let bytes = self.binary_block::<E>(length, expected)?;
                Ok(decode_big_endian(bytes, data_type))
            }
        }
    }

    /// raw bytes starting on the line after the current header
    fn binary_block<E>(&mut self, length: usize, expected: &str) -> Result<&'a [u8], E>
    where
        E: From<UnexpectedEof>,
    {
        // the binary data starts right after the line break ending the header
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
        self.pos += 1;

        let end = self
            .pos
            .checked_add(length)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| E::from(UnexpectedEof::new(expected.into())))?;

        let block = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(block)
    }
}

/// floats as written by vtk and by other tools, including `nan` and `inf`
fn parse_float(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().or_else(|| {
        match token.to_ascii_lowercase().as_str() {
            "nan" | "-nan" | "1.#qnan" => Some(f64::NAN),
            "inf" | "infinity" | "1.#inf" => Some(f64::INFINITY),
            "-inf" | "-infinity" | "-1.#inf" => Some(f64::NEG_INFINITY),
            _ => None,
        }
    })
}

fn decode<T, const N: usize>(bytes: &[u8], from_be: fn([u8; N]) -> T) -> Vec<f64>
where
    T: ToPrimitive,
{
    bytes
        .chunks_exact(N)
        .filter_map(|chunk| chunk.try_into().ok())
        .map(|chunk| from_be(chunk).to_f64().unwrap_or(f64::NAN))
        .collect()
}

fn decode_big_endian(bytes: &[u8], data_type: DataType) -> Vec<f64> {
    match data_type {
        DataType::UnsignedChar => decode(bytes, u8::from_be_bytes),
        DataType::Char => decode(bytes, i8::from_be_bytes),
        DataType::UnsignedShort => decode(bytes, u16::from_be_bytes),
        DataType::Short => decode(bytes, i16::from_be_bytes),
        DataType::UnsignedInt => decode(bytes, u32::from_be_bytes),
        DataType::Int => decode(bytes, i32::from_be_bytes),
        DataType::UnsignedLong => decode(bytes, u64::from_be_bytes),
        DataType::Long => decode(bytes, i64::from_be_bytes),
        DataType::Float => decode(bytes, f32::from_be_bytes),
        DataType::Double => decode(bytes, f64::from_be_bytes),
    }
}
