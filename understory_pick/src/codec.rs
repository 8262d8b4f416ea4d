// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reversible identity ↔ color encoding.

use core::num::NonZeroU32;

/// An RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// Identity of one element for the duration of a single pick pass.
///
/// Identities start at 1 and are dense; `0` is the "no hit" background.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickId(NonZeroU32);

impl PickId {
    /// Build an identity from its raw value. Returns `None` for `0`.
    #[inline]
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Raw value, at least 1.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Zero-based slot in the pass's assignment table.
    #[inline]
    pub(crate) const fn slot(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Packs a [`PickId`] into the color channels of a framebuffer with a given bit depth.
///
/// Only the top `bits` of each channel carry identity bits. The remaining low
/// bits are set to half their range so that the rounding a shallower
/// framebuffer applies on write cannot carry into the identity bits. Alpha is
/// always opaque. The all-zero color is the background and decodes to no hit.
///
/// ```
/// use understory_pick::{PickCodec, PickId};
///
/// let codec = PickCodec::RGB565;
/// let id = PickId::new(1234).unwrap();
/// let color = codec.encode(id).unwrap();
/// assert_eq!(codec.decode(color), Some(id));
/// assert_eq!(codec.decode([0, 0, 0, 0]), None);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PickCodec {
    red_bits: u8,
    green_bits: u8,
    blue_bits: u8,
}

impl Default for PickCodec {
    fn default() -> Self {
        Self::RGB888
    }
}

impl PickCodec {
    /// 8 bits per channel, 16 777 215 identities.
    pub const RGB888: Self = Self::new(8, 8, 8);
    /// 5/6/5 framebuffers, 65 535 identities.
    pub const RGB565: Self = Self::new(5, 6, 5);

    /// Codec for a framebuffer with the given per-channel depths, each clamped to `1..=8`.
    pub const fn new(red_bits: u8, green_bits: u8, blue_bits: u8) -> Self {
        Self {
            red_bits: clamp_bits(red_bits),
            green_bits: clamp_bits(green_bits),
            blue_bits: clamp_bits(blue_bits),
        }
    }

    /// Total identity bits.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.red_bits as u32 + self.green_bits as u32 + self.blue_bits as u32
    }

    /// Largest identity this codec can encode.
    #[inline]
    pub const fn max_id(&self) -> u32 {
        (1_u32 << self.bits()) - 1
    }

    /// Encode `id`, or `None` if it does not fit in the available bits.
    pub fn encode(&self, id: PickId) -> Option<Rgba8> {
        let v = id.get();
        if v > self.max_id() {
            return None;
        }
        let gb = u32::from(self.green_bits) + u32::from(self.blue_bits);
        let r = v >> gb;
        let g = (v >> self.blue_bits) & mask(self.green_bits);
        let b = v & mask(self.blue_bits);
        Some([
            pack(r, self.red_bits),
            pack(g, self.green_bits),
            pack(b, self.blue_bits),
            0xff,
        ])
    }

    /// Decode a pixel read back from the pick buffer. Background decodes to `None`.
    pub fn decode(&self, pixel: Rgba8) -> Option<PickId> {
        let r = u32::from(pixel[0] >> (8 - self.red_bits));
        let g = u32::from(pixel[1] >> (8 - self.green_bits));
        let b = u32::from(pixel[2] >> (8 - self.blue_bits));
        let gb = u32::from(self.green_bits) + u32::from(self.blue_bits);
        PickId::new((r << gb) | (g << self.blue_bits) | b)
    }
}

const fn clamp_bits(bits: u8) -> u8 {
    if bits == 0 {
        1
    } else if bits > 8 {
        8
    } else {
        bits
    }
}

fn mask(bits: u8) -> u32 {
    (1_u32 << bits) - 1
}

fn pack(value: u32, bits: u8) -> u8 {
    let shift = 8 - bits;
    let bias = if shift > 0 { 1_u32 << (shift - 1) } else { 0 };
    #[allow(
        clippy::cast_possible_truncation,
        reason = "value is masked to `bits` <= 8 bits before shifting into a byte."
    )]
    let byte = ((value << shift) | bias) as u8;
    byte
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Quantize a byte to `bits` and expand it back the way GL readback does.
    fn through_framebuffer(byte: u8, bits: u8) -> u8 {
        let max = (1_u32 << bits) - 1;
        let q = (u32::from(byte) * max + 127) / 255;
        let expanded = (q * 255 + max / 2) / max;
        expanded as u8
    }

    #[test]
    fn zero_is_background() {
        assert_eq!(PickId::new(0), None);
        assert_eq!(PickCodec::RGB888.decode([0, 0, 0, 0xff]), None);
    }

    #[test]
    fn rgb888_uses_exact_bytes() {
        let id = PickId::new(0x12_34_56).unwrap();
        assert_eq!(PickCodec::RGB888.encode(id), Some([0x12, 0x34, 0x56, 0xff]));
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        let codec = PickCodec::RGB565;
        assert_eq!(codec.max_id(), 0xffff);
        assert!(codec.encode(PickId::new(0x1_0000).unwrap()).is_none());
    }

    #[test]
    fn survives_shallow_framebuffer() {
        let codec = PickCodec::RGB565;
        for raw in [1_u32, 2, 31, 32, 0x7ff, 0x800, 0xabcd, 0xffff] {
            let id = PickId::new(raw).unwrap();
            let [r, g, b, a] = codec.encode(id).unwrap();
            let stored = [
                through_framebuffer(r, 5),
                through_framebuffer(g, 6),
                through_framebuffer(b, 5),
                a,
            ];
            assert_eq!(codec.decode(stored), Some(id), "id {raw:#x} corrupted");
        }
    }

    #[test]
    fn bits_are_clamped() {
        let codec = PickCodec::new(0, 12, 8);
        assert_eq!(codec.bits(), 17);
    }
}
