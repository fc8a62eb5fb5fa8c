//! Shared pieces of the node codecs.

use thiserror::Error;

use crate::storage::page::PageType;

/// A node has no room for another entry; the caller must split it.
///
/// A capacity condition, not a failure; it never appears in [`crate::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("node is full")]
pub struct Overflow;

/// Encoding of a node into the payload area of a page.
///
/// Implementations are pure: they neither know their own page id nor do
/// any I/O. `decode` validates structure and reports violations as a
/// human-readable reason the caller attaches to the page id.
pub trait NodeCodec: Sized {
    /// Tag written to the page header.
    const PAGE_TYPE: PageType;

    /// Decode a node of the given capacity from a page payload.
    fn decode(payload: &[u8], capacity: usize) -> std::result::Result<Self, String>;

    /// Encode the node into a (zeroed) page payload.
    fn encode_into(&self, payload: &mut [u8]);
}

// Little-endian field accessors over a payload slice. Callers bounds-check
// the record count before reading, so offsets are always in range.

#[inline]
pub(crate) fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

#[inline]
pub(crate) fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[inline]
pub(crate) fn read_i32(data: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[inline]
pub(crate) fn write_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub(crate) fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub(crate) fn write_i32(data: &mut [u8], offset: usize, value: i32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
