//! The string pool: `string_id_item` offsets pointing at uleb128-prefixed
//! modified UTF-8 (MUTF-8) data.

use crate::dex::error::DexError;
use crate::dex::{read_table, read_uleb128};
use std::borrow::Cow;

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum DexString
{
    Decoded(String),
    /// Well formed MUTF-8 that has no `String` form, e.g. an unpaired surrogate.
    Raw(u32, Vec<u8>),
}

impl DexString
{
    /// Read one `string_data_item` at `*ix`.
    ///
    /// Exactly `utf16_size` code units are consumed and the NUL terminator must
    /// follow them.
    pub fn read(bytes: &[u8], ix: &mut usize) -> Result<DexString, DexError>
    {
        let start = *ix;
        let utf16_size = read_uleb128(bytes, ix)
            .map_err(|_| err!(TruncatedString, "string length at offset {} runs past end of data", start))?;
        let data_start = *ix;
        let data_len = mutf8_len(bytes.get(data_start..).unwrap_or(&[]), utf16_size)
            .map_err(|e| DexError::with_context(e, format!("string at offset {}", start)))?;
        let data = &bytes[data_start..data_start + data_len];
        *ix = data_start + data_len + 1;

        Ok(match cesu8::from_java_cesu8(data)
        {
            Ok(converted_str) => DexString::Decoded(converted_str.into_owned()),
            _ => DexString::Raw(utf16_size, data.to_vec())
        })
    }

    pub fn as_str(&self) -> Cow<'_, str>
    {
        match self
        {
            DexString::Decoded(s) => Cow::Borrowed(s.as_str()),
            DexString::Raw(_, v) => String::from_utf8_lossy(v),
        }
    }

    pub fn is_decoded(&self) -> bool
    {
        matches!(self, DexString::Decoded(_))
    }
}

/// Byte length of the MUTF-8 payload holding `utf16_size` code units, checking
/// that a NUL terminator follows it.
fn mutf8_len(data: &[u8], utf16_size: u32) -> Result<usize, DexError>
{
    let mut pos = 0usize;
    for unit in 0..utf16_size
    {
        let lead = match data.get(pos)
        {
            Some(0) => fail!(TruncatedString, "terminator after {} of {} code units", unit, utf16_size),
            Some(&b) => b,
            None => fail!(TruncatedString, "data ends after {} of {} code units", unit, utf16_size),
        };
        let width = match lead
        {
            0x01..=0x7f => 1,
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            _ => fail!(InvalidString, "invalid MUTF-8 lead byte 0x{:02x} at payload offset {}", lead, pos),
        };
        if data.len() < pos + width
        {
            fail!(TruncatedString, "data ends inside code unit {} of {}", unit, utf16_size);
        }
        if data[pos + 1..pos + width].iter().any(|b| b & 0xc0 != 0x80)
        {
            fail!(InvalidString, "invalid MUTF-8 continuation byte at payload offset {}", pos);
        }
        pos += width;
    }

    match data.get(pos)
    {
        Some(0) => Ok(pos),
        Some(_) => fail!(TruncatedString, "missing terminator after {} code units", utf16_size),
        None => fail!(TruncatedString, "data ends before terminator"),
    }
}

/// Read the string-id offsets, then decode each string they point at.
pub fn read_string_pool(bytes: &[u8], off: u32, count: u32) -> Result<Vec<DexString>, DexError>
{
    let offsets: Vec<u32> = read_table(bytes, off, count, "string id")?;
    let mut strings = Vec::with_capacity(offsets.len());
    for (i, string_off) in offsets.into_iter().enumerate()
    {
        let mut ix = string_off as usize;
        let s = DexString::read(bytes, &mut ix)
            .map_err(|e| DexError::with_context(e, format!("string id {}", i)))?;
        strings.push(s);
    }
    Ok(strings)
}
