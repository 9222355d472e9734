// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Texel timecode burn-in.
//!
//! Draws `HH:MM:SS:FF` as a strip of 32 black/white blocks (two BCD digits per
//! field, most significant bit first) into the top-left corner of a picture.
//! Each block is [`BLOCK_WIDTH`] pixels wide and [`BLOCK_LINES`] lines tall.
//! Used to check frame accuracy end to end by reading the strip back on
//! screen or with [`read_timecode`].

use crate::Timecode;

/// Pixel packing the burn-in writes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EncodePixelFormat {
    /// 8-bit 4:2:2, two pixels per 4 bytes.
    #[default]
    CharUyvy,
    /// 10-bit 4:2:2, six pixels per 16 bytes.
    YuvV210,
}

/// Width of one bit block in pixels.
pub const BLOCK_WIDTH: u32 = 6;

/// Height of one bit block in lines.
pub const BLOCK_LINES: u32 = 6;

const BITS: u32 = 32;

const UYVY_WHITE: [u8; 4] = [128, 235, 128, 235];
const UYVY_BLACK: [u8; 4] = [128, 16, 128, 16];

const V210_LUMA_WHITE: u32 = 940;
const V210_LUMA_BLACK: u32 = 64;
const V210_CHROMA: u32 = 512;

fn to_bits(timecode: &Timecode) -> u32 {
    [
        timecode.hours,
        timecode.minutes,
        timecode.seconds,
        timecode.frames,
    ]
    .iter()
    .fold(0u32, |acc, value| {
        let bcd = ((value / 10) % 10) << 4 | (value % 10);
        acc << 8 | bcd
    })
}

fn v210_group(luma: u32) -> [u8; 16] {
    let words = [
        V210_CHROMA | luma << 10 | V210_CHROMA << 20,
        luma | V210_CHROMA << 10 | luma << 20,
        V210_CHROMA | luma << 10 | V210_CHROMA << 20,
        luma | V210_CHROMA << 10 | luma << 20,
    ];
    let mut bytes = [0u8; 16];
    for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    bytes
}

/// Byte span of one bit block within a row.
fn block_span(format: EncodePixelFormat, bit: u32) -> (usize, usize) {
    let bytes = match format {
        EncodePixelFormat::CharUyvy => BLOCK_WIDTH as usize * 2,
        EncodePixelFormat::YuvV210 => 16,
    };
    (bit as usize * bytes, bytes)
}

fn fits(format: EncodePixelFormat, buffer: &[u8], pitch: u32, width: u32, height: u32) -> bool {
    let (end, _) = block_span(format, BITS);
    width >= BITS * BLOCK_WIDTH
        && height >= BLOCK_LINES
        && pitch as usize >= end
        && buffer.len() >= pitch as usize * BLOCK_LINES as usize
}

/// Draws `timecode` into `buffer`. Returns `false` if the picture is too
/// small to hold the strip, in which case nothing is written.
pub fn encode_timecode(
    format: EncodePixelFormat,
    buffer: &mut [u8],
    pitch: u32,
    width: u32,
    height: u32,
    timecode: &Timecode,
) -> bool {
    if !fits(format, buffer, pitch, width, height) {
        return false;
    }

    let bits = to_bits(timecode);
    for bit in 0..BITS {
        let set = bits >> (BITS - 1 - bit) & 1 == 1;
        let (offset, len) = block_span(format, bit);
        for line in 0..BLOCK_LINES as usize {
            let start = line * pitch as usize + offset;
            let block = &mut buffer[start..start + len];
            match format {
                EncodePixelFormat::CharUyvy => {
                    let texel = if set { UYVY_WHITE } else { UYVY_BLACK };
                    for pair in block.chunks_exact_mut(4) {
                        pair.copy_from_slice(&texel);
                    }
                }
                EncodePixelFormat::YuvV210 => {
                    let luma = if set { V210_LUMA_WHITE } else { V210_LUMA_BLACK };
                    block.copy_from_slice(&v210_group(luma));
                }
            }
        }
    }
    true
}

/// Reads back a strip written by [`encode_timecode`].
pub fn read_timecode(
    format: EncodePixelFormat,
    buffer: &[u8],
    pitch: u32,
    width: u32,
    height: u32,
) -> Option<Timecode> {
    if !fits(format, buffer, pitch, width, height) {
        return None;
    }

    let mut bits = 0u32;
    for bit in 0..BITS {
        let (offset, _) = block_span(format, bit);
        let set = match format {
            EncodePixelFormat::CharUyvy => buffer[offset + 1] > 128,
            EncodePixelFormat::YuvV210 => {
                let word = u32::from_le_bytes([
                    buffer[offset],
                    buffer[offset + 1],
                    buffer[offset + 2],
                    buffer[offset + 3],
                ]);
                (word >> 10 & 0x3ff) > V210_CHROMA
            }
        };
        bits = bits << 1 | set as u32;
    }

    let field = |shift: u32| {
        let bcd = bits >> shift & 0xff;
        (bcd >> 4) * 10 + (bcd & 0xf)
    };
    Some(Timecode::new(field(24), field(16), field(8), field(0), false))
}
