#[macro_use]
pub mod error;

pub mod dex_file;
pub(crate) mod leb;
pub(crate) mod strings;
mod reader;

pub use crate::dex::error::{DexError, DexErrorKind};
pub use crate::dex::reader::{read_dex, read_dex_bytes, read_dex_file};

use crate::dex::leb::decode_uleb128;

fn remaining(bytes: &[u8], ix: usize) -> usize
{
    bytes.len().saturating_sub(ix)
}

// Basic type reading
pub(crate) fn read_u2(bytes: &[u8], ix: &mut usize) -> Result<u16, DexError>
{
    if remaining(bytes, *ix) < 2
    {
        fail!(TruncatedTable, "Unexpected end of stream reading u2 at index {}", *ix);
    }
    let result = ((bytes[*ix + 1] as u16) << 8) | (bytes[*ix] as u16);
    *ix += 2;
    Ok(result)
}

pub(crate) fn read_u4(bytes: &[u8], ix: &mut usize) -> Result<u32, DexError>
{
    if remaining(bytes, *ix) < 4
    {
        fail!(TruncatedTable, "Unexpected end of stream reading u4 at index {}", *ix);
    }
    let result =
        ((bytes[*ix + 3] as u32) << 24) | ((bytes[*ix + 2] as u32) << 16) | ((bytes[*ix + 1] as u32) << 8) | (bytes[*ix] as u32);
    *ix += 4;
    Ok(result)
}

pub(crate) fn read_uleb128(bytes: &[u8], ix: &mut usize) -> Result<u32, DexError>
{
    let tail = bytes.get(*ix..).unwrap_or(&[]);
    match decode_uleb128(tail)
    {
        Some((val, size)) => {
            *ix += size;
            Ok(val)
        }
        None => Err(err!(TruncatedTable, "Unexpected end of stream reading uleb128 at index {}", *ix)),
    }
}

pub(crate) fn read_array<const N: usize>(bytes: &[u8], ix: &mut usize) -> Result<[u8; N], DexError>
{
    if remaining(bytes, *ix) < N
    {
        fail!(TruncatedTable, "buffer too short for {} byte array read at index {}", N, *ix);
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[*ix..*ix + N]);
    *ix += N;
    Ok(out)
}

/// A record with a fixed on-disk size that lives in one of the flat id tables.
pub(crate) trait FixedRecord: Sized
{
    const SIZE: usize;

    fn read(bytes: &[u8], ix: &mut usize) -> Result<Self, DexError>;
}

impl FixedRecord for u32
{
    const SIZE: usize = 4;

    fn read(bytes: &[u8], ix: &mut usize) -> Result<u32, DexError>
    {
        read_u4(bytes, ix)
    }
}

/// Read `count` records starting at absolute offset `off`.
///
/// The cursor is always positioned at `off` first, so earlier reads never leak
/// into the position of the next table.
pub(crate) fn read_table<T: FixedRecord>(bytes: &[u8], off: u32, count: u32, what: &str) -> Result<Vec<T>, DexError>
{
    let start = off as usize;
    let needed = (count as usize).checked_mul(T::SIZE);
    match needed
    {
        Some(n) if remaining(bytes, start) >= n => {}
        _ => fail!(
            TruncatedTable,
            "{} table of {} entries at offset {} runs past end of data ({} bytes)",
            what, count, off, bytes.len()
        ),
    }

    let mut ix = start;
    let mut v = Vec::with_capacity(count as usize);
    for _ in 0..count
    {
        v.push(T::read(bytes, &mut ix)?);
    }
    Ok(v)
}
