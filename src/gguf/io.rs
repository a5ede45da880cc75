//! GGUF primitive readers
//!
//! Little-endian fixed-width reads over a cursor into the mapped header.
//! Every short read becomes a `Format` error naming the field.

use std::io::{Cursor, Read};

use crate::error::{ExplorerError, Result};

fn read_array<const N: usize>(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    cursor
        .read_exact(&mut buf)
        .map_err(|e| ExplorerError::Format {
            reason: format!("Failed to read {what} at offset {}: {e}", cursor.position()),
        })?;
    Ok(buf)
}

/// Read a single u8 from the cursor.
pub(crate) fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8> {
    Ok(read_array::<1>(cursor, "u8")?[0])
}

/// Read a single i8 from the cursor.
pub(crate) fn read_i8(cursor: &mut Cursor<&[u8]>) -> Result<i8> {
    Ok(i8::from_le_bytes(read_array(cursor, "i8")?))
}

/// Read a u16 (little-endian) from the cursor.
pub(crate) fn read_u16(cursor: &mut Cursor<&[u8]>) -> Result<u16> {
    Ok(u16::from_le_bytes(read_array(cursor, "u16")?))
}

/// Read an i16 (little-endian) from the cursor.
pub(crate) fn read_i16(cursor: &mut Cursor<&[u8]>) -> Result<i16> {
    Ok(i16::from_le_bytes(read_array(cursor, "i16")?))
}

/// Read a u32 (little-endian) from the cursor.
pub(crate) fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32> {
    Ok(u32::from_le_bytes(read_array(cursor, "u32")?))
}

/// Read an i32 (little-endian) from the cursor.
pub(crate) fn read_i32(cursor: &mut Cursor<&[u8]>) -> Result<i32> {
    Ok(i32::from_le_bytes(read_array(cursor, "i32")?))
}

/// Read an f32 (little-endian) from the cursor.
pub(crate) fn read_f32(cursor: &mut Cursor<&[u8]>) -> Result<f32> {
    Ok(f32::from_le_bytes(read_array(cursor, "f32")?))
}

/// Read a bool from the cursor.
pub(crate) fn read_bool(cursor: &mut Cursor<&[u8]>) -> Result<bool> {
    Ok(read_u8(cursor)? != 0)
}

/// Read a u64 (little-endian) from the cursor.
pub(crate) fn read_u64(cursor: &mut Cursor<&[u8]>) -> Result<u64> {
    Ok(u64::from_le_bytes(read_array(cursor, "u64")?))
}

/// Read an i64 (little-endian) from the cursor.
pub(crate) fn read_i64(cursor: &mut Cursor<&[u8]>) -> Result<i64> {
    Ok(i64::from_le_bytes(read_array(cursor, "i64")?))
}

/// Read an f64 (little-endian) from the cursor.
pub(crate) fn read_f64(cursor: &mut Cursor<&[u8]>) -> Result<f64> {
    Ok(f64::from_le_bytes(read_array(cursor, "f64")?))
}

/// Read a string: u64 length + UTF-8 bytes
///
/// The length is checked against the bytes left in the cursor before
/// anything is allocated.
pub(crate) fn read_string(cursor: &mut Cursor<&[u8]>) -> Result<String> {
    let len_u64 = read_u64(cursor)?;
    let remaining = (cursor.get_ref().len() as u64).saturating_sub(cursor.position());
    if len_u64 > remaining {
        return Err(ExplorerError::Format {
            reason: format!(
                "String length {len_u64} exceeds remaining {remaining} bytes (corrupted?)"
            ),
        });
    }
    let len = usize::try_from(len_u64).map_err(|_| ExplorerError::Format {
        reason: format!("String length {len_u64} exceeds platform usize limit"),
    })?;

    let mut string_bytes = vec![0u8; len];
    cursor
        .read_exact(&mut string_bytes)
        .map_err(|e| ExplorerError::Format {
            reason: format!("Failed to read string data: {e}"),
        })?;

    String::from_utf8(string_bytes).map_err(|e| ExplorerError::Format {
        reason: format!("Invalid UTF-8 in string: {e}"),
    })
}
