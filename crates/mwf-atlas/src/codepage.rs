//! Legacy charset to Unicode mapping
//!
//! Grid cells are addressed by raw GBK bytes; glyph lookup needs Unicode.
//! The ASCII row is widened to the full-width Latin block first so it
//! renders with the same CJK metrics as the rest of the atlas.

use encoding_rs::GBK;

/// Converts a legacy byte sequence to a Unicode scalar value
pub trait CodepointMapper {
    /// Returns `None` when the sequence has no Unicode representation
    fn map(&self, bytes: &[u8]) -> Option<u32>;
}

impl<T: CodepointMapper + ?Sized> CodepointMapper for &T {
    fn map(&self, bytes: &[u8]) -> Option<u32> {
        (**self).map(bytes)
    }
}

/// GBK decoder backed by `encoding_rs`
#[derive(Debug, Default, Clone, Copy)]
pub struct GbkMapper;

impl GbkMapper {
    pub fn new() -> Self {
        Self
    }
}

impl CodepointMapper for GbkMapper {
    fn map(&self, bytes: &[u8]) -> Option<u32> {
        let text = GBK.decode_without_bom_handling_and_without_replacement(bytes)?;
        let mut chars = text.chars();
        let c = chars.next()?;
        // A pair decoding to two characters means it was not one code point
        if chars.next().is_some() {
            return None;
        }
        Some(c as u32)
    }
}

/// Widen a printable ASCII byte to its full-width GBK pair.
///
/// Space maps to the ideographic space `A1 A1`; `0x21..=0x7E` map into the
/// `A3` row with the trail byte `byte + 0x80`. Everything else is unmapped.
pub fn dbc_to_sbc(byte: u8) -> Option<[u8; 2]> {
    match byte {
        0x20 => Some([0xA1, 0xA1]),
        0x21..=0x7E => Some([0xA3, byte + 0x80]),
        _ => None,
    }
}
