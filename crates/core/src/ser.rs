//! A simple trait for binary (de)serialization using std `Read` and `Write`
//! traits, plus Bitcoin-style VarInt helpers.

use std::io::{Error as IOError, Read, Write};

use thiserror::Error;

/// Errors related to serialization of types.
#[derive(Debug, Error)]
pub enum SerError {
    /// VarInts must be 1, 3, 5, or 9 bytes long
    #[error("Bad VarInt length. Must be 1,3,5, or 9. Got {0}.")]
    BadVarIntLen(u8),

    /// A VarInt used more bytes than necessary to represent its value.
    #[error("Non-minimal VarInt encoding")]
    NonMinimalVarInt,

    /// IOError bubbled up from a `Write` passed to a `ByteFormat::write_to`
    /// implementation.
    #[error("Serialization error")]
    IoError(#[from] IOError),

    /// `deserialize_hex` encountered an error on its input.
    #[error("Error deserializing hex string")]
    FromHexError(#[from] hex::FromHexError),

    /// Wrapped error from a component of a composite type.
    #[error("Error in component: {0}")]
    ComponentError(String),
}

/// Type alias for serialization errors
pub type SerResult<T> = Result<T, SerError>;

/// Calculates the minimum prefix length for a VarInt encoding `number`
pub fn prefix_byte_len(number: u64) -> u8 {
    match number {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x10000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Matches the length of the VarInt to the 1-byte flag
pub fn first_byte_from_len(number: u8) -> Option<u8> {
    match number {
        3 => Some(0xfd),
        5 => Some(0xfe),
        9 => Some(0xff),
        _ => None,
    }
}

/// Matches the VarInt prefix flag to the serialized length
pub fn prefix_len_from_first_byte(number: u8) -> u8 {
    match number {
        0..=0xfc => 1,
        0xfd => 3,
        0xfe => 5,
        0xff => 9,
    }
}

/// Read a Bitcoin-style VarInt from a reader. Rejects non-minimal encodings.
pub fn read_compact_int<R: Read>(reader: &mut R) -> SerResult<u64> {
    let mut prefix = [0u8; 1];
    reader.read_exact(&mut prefix)?;
    let prefix_len = prefix_len_from_first_byte(prefix[0]);

    let number = if prefix_len > 1 {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf[..prefix_len as usize - 1])?;
        u64::from_le_bytes(buf)
    } else {
        prefix[0] as u64
    };

    if prefix_byte_len(number) < prefix_len {
        return Err(SerError::NonMinimalVarInt);
    }
    Ok(number)
}

/// Write a Bitcoin-style VarInt to a writer. Returns the number of bytes
/// written.
pub fn write_compact_int<W: Write>(writer: &mut W, number: u64) -> SerResult<usize> {
    let prefix_len = prefix_byte_len(number);
    match first_byte_from_len(prefix_len) {
        None => Ok(writer.write(&[number as u8])?),
        Some(prefix) => {
            let body = number.to_le_bytes();
            let mut written = writer.write(&[prefix])?;
            written += writer.write(&body[..prefix_len as usize - 1])?;
            Ok(written)
        }
    }
}

/// A simple trait for deserializing from `std::io::Read` and serializing to
/// `std::io::Write`. We provide implementations for `u8` and `Vec<T>`.
///
/// `ByteFormat` is used extensively in sighash calculation, txid
/// calculation, and transaction (de)serialization.
pub trait ByteFormat {
    /// An error type. Must be convertible from `SerError` and `io::Error`.
    type Error: From<SerError> + From<IOError> + std::error::Error;

    /// Returns the byte-length of the serialized data structure.
    fn serialized_length(&self) -> usize;

    /// Deserializes an instance of `Self` from a `std::io::Read`. The
    /// `limit` argument is used only when deserializing collections, and
    /// specifies a maximum number of instances of the underlying type to
    /// read.
    fn read_from<R>(reader: &mut R, limit: usize) -> Result<Self, Self::Error>
    where
        R: Read,
        Self: std::marker::Sized;

    /// Serializes `Self` to a `std::io::Write`. Returns the number of bytes
    /// written.
    fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
    where
        W: Write;

    /// Convenience function for reading a LE u8
    fn read_u8<R>(reader: &mut R) -> SerResult<u8>
    where
        R: Read,
    {
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Convenience function for reading a LE u32
    fn read_u32_le<R>(reader: &mut R) -> SerResult<u32>
    where
        R: Read,
    {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Convenience function for reading a LE u64
    fn read_u64_le<R>(reader: &mut R) -> SerResult<u64>
    where
        R: Read,
    {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Convenience function for writing a LE u8
    fn write_u8<W>(writer: &mut W, number: u8) -> SerResult<usize>
    where
        W: Write,
    {
        Ok(writer.write(&[number])?)
    }

    /// Convenience function for writing a LE u32
    fn write_u32_le<W>(writer: &mut W, number: u32) -> SerResult<usize>
    where
        W: Write,
    {
        Ok(writer.write(&number.to_le_bytes())?)
    }

    /// Convenience function for writing a LE u64
    fn write_u64_le<W>(writer: &mut W, number: u64) -> SerResult<usize>
    where
        W: Write,
    {
        Ok(writer.write(&number.to_le_bytes())?)
    }

    /// Read a VarInt-prefixed vector of `T` from the reader.
    fn read_prefix_vec<R, T>(reader: &mut R) -> SerResult<Vec<T>>
    where
        R: Read,
        T: ByteFormat<Error = SerError>,
    {
        let count = read_compact_int(reader)?;
        Vec::<T>::read_from(reader, count as usize)
    }

    /// Write a VarInt length prefix, then the vector of `T` to the writer.
    fn write_prefix_vec<W, T>(writer: &mut W, vector: &[T]) -> SerResult<usize>
    where
        W: Write,
        T: ByteFormat<Error = SerError>,
    {
        let mut len = write_compact_int(writer, vector.len() as u64)?;
        for item in vector.iter() {
            len += item.write_to(writer)?;
        }
        Ok(len)
    }

    /// Decodes a hex string to a `Vec<u8>`, deserializes an instance of
    /// `Self` from that vector.
    fn deserialize_hex(s: &str) -> Result<Self, Self::Error>
    where
        Self: std::marker::Sized,
    {
        let v: Vec<u8> = hex::decode(s).map_err(SerError::from)?;
        let mut cursor = std::io::Cursor::new(v);
        Self::read_from(&mut cursor, 0)
    }

    /// Serializes `self` to a vector, returns the hex-encoded vector.
    fn serialize_hex(&self) -> String {
        let mut v: Vec<u8> = vec![];
        self.write_to(&mut v).expect("no IOError writing to a vec");
        hex::encode(v)
    }

    /// Serializes `self` to a fresh byte vector.
    fn serialize_bytes(&self) -> Vec<u8> {
        let mut v: Vec<u8> = vec![];
        self.write_to(&mut v).expect("no IOError writing to a vec");
        v
    }
}

impl ByteFormat for u8 {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        1
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Self::read_u8(reader)
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        Ok(writer.write(&[*self])?)
    }
}

impl<A> ByteFormat for Vec<A>
where
    A: ByteFormat<Error = SerError>,
{
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        self.iter().map(|v| v.serialized_length()).sum()
    }

    fn read_from<R>(reader: &mut R, limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let mut v = vec![];
        for _ in 0..limit {
            v.push(A::read_from(reader, 0)?);
        }
        Ok(v)
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = 0;
        for item in self.iter() {
            len += item.write_to(writer)?;
        }
        Ok(len)
    }
}
