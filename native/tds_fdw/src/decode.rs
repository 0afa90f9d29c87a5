/// Column value decoding
///
/// This module converts the raw bytes of one column of the current row into
/// a [`Cell`] the host can parse into its own typed value.
///
/// - Character types are converted to `CHAR`, null-terminated, into a buffer
///   one byte longer than the source.
/// - Binary types are converted to `BINARY` with the exact source length.
/// - Every other type is converted to `CHAR` through a fixed-size buffer.
use bytes::Bytes;

use crate::constants::DEFAULT_CONVERT_BUFFER_LEN;
use crate::error::{Result, TdsError};
use crate::models::Cell;
use crate::protocol::{Connection, ConvertLength, TypeTag};
use crate::utils;

/// How a source type is converted to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionTarget {
    pub dst_type: TypeTag,
    pub length: ConvertLength,
    pub buffer_len: usize,
}

/// Pick the destination type and buffer size for a source type.
pub fn conversion_target(src_type: TypeTag, src_len: usize) -> ConversionTarget {
    if src_type.is_character() {
        ConversionTarget {
            dst_type: TypeTag::CHAR,
            length: ConvertLength::NullTerminated,
            buffer_len: src_len.saturating_add(1),
        }
    } else if src_type.is_binary() {
        ConversionTarget {
            dst_type: TypeTag::BINARY,
            length: ConvertLength::Exact(src_len),
            buffer_len: src_len,
        }
    } else {
        ConversionTarget {
            dst_type: TypeTag::CHAR,
            length: ConvertLength::NullTerminated,
            buffer_len: DEFAULT_CONVERT_BUFFER_LEN,
        }
    }
}

/// Decode one column of the current row.
///
/// A zero data length or a null data pointer is a NULL cell. Conversion
/// problems come back as conversion-class errors, which callers turn into
/// NULL cells; allocation failures are resource errors.
pub fn decode_column<C>(conn: &C, column: usize) -> Result<Cell>
where
    C: Connection + ?Sized,
{
    let src_type = conn.col_type(column);
    let src_len = conn.data_len(column);

    tracing::trace!(
        column,
        name = ?conn.col_name(column),
        src_type = src_type.0,
        src_len,
        "decoding column"
    );

    if src_len == 0 {
        return Ok(Cell::Null);
    }

    let Some(src) = conn.data(column) else {
        tracing::debug!(column, "column data pointer is NULL with non-zero length");
        return Ok(Cell::Null);
    };

    convert_value(conn, column, src_type, src)
}

/// Convert non-NULL column bytes to a text cell.
pub fn convert_value<C>(conn: &C, column: usize, src_type: TypeTag, src: &[u8]) -> Result<Cell>
where
    C: Connection + ?Sized,
{
    let target = conversion_target(src_type, src.len());

    if !conn.will_convert(src_type, target.dst_type) {
        return Err(TdsError::Unconvertible {
            column,
            from: src_type,
            to: target.dst_type,
        });
    }

    let mut buffer = utils::alloc_buffer(target.buffer_len, "column value")?;

    let written = conn
        .convert(src_type, src, target.dst_type, &mut buffer, target.length)
        .map_err(|reason| TdsError::Conversion {
            column,
            from: src_type,
            reason,
            cause: None,
        })?;

    buffer.truncate(written.min(target.buffer_len));
    if target.length == ConvertLength::NullTerminated {
        // Some libraries count the terminator; the cell never holds it.
        if let Some(end) = buffer.iter().position(|b| *b == 0) {
            buffer.truncate(end);
        }
    }

    Ok(Cell::Text(Bytes::from(buffer)))
}
