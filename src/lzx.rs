//! LZ11 / LZ40 codec
//!
//! The extended flavors trade the fixed two-byte back-reference of LZ10 for
//! three length classes, letting a single token cover up to 65808 bytes.
//! The two formats share the token layout idea but differ in byte order:
//! LZ11 (`0x11`) keeps its length bits big-endian and stores distances as
//! `d - 1`, LZ40 (`0x40`) keeps its length bits low-endian, stores exact
//! 12-bit distances, negates every flag byte, and closes the stream with a
//! flagged terminator followed by two zero bytes.
//!
//! Both encoders are linear-scan with an unconditional one-byte lookahead.
//! The decoder handles either format, selected by the header magic.

use crate::tools::flags::{TokenReader,TokenWriter};
use crate::tools::search::longest_match;
use crate::tools::note;
use crate::{Error,Magic,Warning,RAW_MAXIM};
use num_traits::FromPrimitive;

/// longest byte run left uncoded
const THRESHOLD: usize = 2;
/// window size shared with LZ10
const WIN_SIZE: usize = 0x1000;
/// upper bound of the small length class
const F: usize = 0x10;
/// upper bound of the medium length class
const F1: usize = 0x110;
/// upper bound of the large length class
const F2: usize = 0x10110;

/// Compress into the big-endian-length LZ11 format.
pub fn encode_lz11(raw: &[u8], vram_safe: bool) -> Result<Vec<u8>,Error> {
    if raw.len() > RAW_MAXIM {
        return Err(Error::InputTooLarge);
    }
    Ok(encode(raw, Magic::Lz11, vram_safe))
}

/// Compress into the low-endian-length LZ40 format.
pub fn encode_lz40(raw: &[u8], vram_safe: bool) -> Result<Vec<u8>,Error> {
    if raw.len() > RAW_MAXIM {
        return Err(Error::InputTooLarge);
    }
    Ok(encode(raw, Magic::Lz40, vram_safe))
}

fn encode(raw: &[u8], magic: Magic, vram_safe: bool) -> Vec<u8> {
    let negated = magic == Magic::Lz40;
    // LZ40 distances are stored verbatim in 12 bits, so its window and
    // longest match are one short of LZ11's
    let (window,max_len,min_len) = match magic {
        Magic::Lz40 => (WIN_SIZE - 1, F2 - 1, THRESHOLD),
        _ => (WIN_SIZE, F2, THRESHOLD + 1)
    };
    let min_distance = if vram_safe { 2 } else { 1 };
    let mut pak = Vec::with_capacity(4 + raw.len() + raw.len() / 8 + 4);
    pak.extend_from_slice(&u32::to_le_bytes(magic as u32 | (raw.len() as u32) << 8));
    let mut writer = TokenWriter::new(pak, negated);
    let mut r = 0;
    log::debug!("entering loop over tokens");
    while r < raw.len() {
        let (mut len, dist) = longest_match(raw, r, window, max_len, min_distance);
        if len >= min_len {
            // unconditional one-byte lookahead; a probe with no usable match
            // counts as the single byte a literal would consume
            let (next,_) = longest_match(raw, r + len, window, max_len, min_distance);
            let (post,_) = longest_match(raw, r + 1, window, max_len, min_distance);
            if len + next.max(1) <= 1 + post.max(1) {
                log::trace!("defer match of {} at {}",len,r);
                len = 1;
            }
        }
        if len >= min_len {
            log::trace!("reference: {} bytes from {} back at {}",len,dist,r);
            match magic {
                Magic::Lz40 => put_reference_lz40(&mut writer, len, dist),
                _ => put_reference_lz11(&mut writer, len, dist)
            }
            r += len;
        } else {
            log::trace!("literal: {} at {}",raw[r],r);
            writer.literal(raw[r]);
            r += 1;
        }
    }
    if negated {
        // terminator: one more flagged slot followed by two zero bytes
        log::debug!("close stream with terminator");
        writer.reference(&[0,0]);
    }
    writer.into_inner()
}

fn put_reference_lz11(writer: &mut TokenWriter, len: usize, dist: usize) {
    if len > F1 {
        let m = len - (F1 + 1);
        writer.reference(&[
            (0x10 | (m >> 12)) as u8,
            ((m >> 4) & 0xFF) as u8,
            (((m & 0xF) << 4) | ((dist - 1) >> 8)) as u8,
            ((dist - 1) & 0xFF) as u8
        ]);
    } else if len > F {
        let m = len - (F + 1);
        writer.reference(&[
            (m >> 4) as u8,
            (((m & 0xF) << 4) | ((dist - 1) >> 8)) as u8,
            ((dist - 1) & 0xFF) as u8
        ]);
    } else {
        writer.reference(&[
            (((len - 1) << 4) | ((dist - 1) >> 8)) as u8,
            ((dist - 1) & 0xFF) as u8
        ]);
    }
}

fn put_reference_lz40(writer: &mut TokenWriter, len: usize, dist: usize) {
    if len > F1 - 1 {
        let m = len - F1;
        writer.reference(&[
            (((dist & 0xF) << 4) | 1) as u8,
            (dist >> 4) as u8,
            (m & 0xFF) as u8,
            (m >> 8) as u8
        ]);
    } else if len > F - 1 {
        writer.reference(&[
            ((dist & 0xF) << 4) as u8,
            (dist >> 4) as u8,
            (len - F) as u8
        ]);
    } else {
        writer.reference(&[
            (((dist & 0xF) << 4) | len) as u8,
            (dist >> 4) as u8
        ]);
    }
}

/// Pull one back-reference off the stream; `None` means it was cut short.
fn read_reference(reader: &mut TokenReader, magic: Magic) -> Option<(usize,usize)> {
    let p0 = reader.byte()? as usize;
    let p1 = reader.byte()? as usize;
    match magic {
        Magic::Lz40 => {
            let pos = p0 | (p1 << 8);
            let tag = pos & 0xF;
            let (len,threshold) = if tag >= THRESHOLD {
                (tag,0)
            } else {
                let lo = reader.byte()? as usize;
                if tag != 0 {
                    (((reader.byte()? as usize) << 8) | lo, F1)
                } else {
                    (lo, F)
                }
            };
            Some((len + threshold, pos >> 4))
        },
        _ => {
            let mut pos = (p0 << 8) | p1;
            let tag = pos >> 12;
            let threshold = if tag >= THRESHOLD {
                0
            } else {
                pos = ((pos & 0xFFF) << 8) | reader.byte()? as usize;
                if tag != 0 {
                    pos = (pos << 8) | reader.byte()? as usize;
                    F1
                } else {
                    F
                }
            };
            Some(((pos >> 12) + threshold + 1, (pos & 0xFFF) + 1))
        }
    }
}

/// Main decompression function; the magic byte selects LZ11 or LZ40.
/// Lenient: whatever could be reconstructed comes back with diagnostics.
pub fn decode(pak: &[u8]) -> (Vec<u8>,Vec<Warning>) {
    let mut warnings = Vec::new();
    if pak.len() < 4 {
        note(&mut warnings, Warning::TruncatedInput);
        return (Vec::new(),warnings);
    }
    let magic = match Magic::from_u8(pak[0]) {
        Some(Magic::Lz11) => Magic::Lz11,
        Some(Magic::Lz40) => Magic::Lz40,
        _ => {
            note(&mut warnings, Warning::BadMagic);
            return (Vec::new(),warnings);
        }
    };
    let raw_len = (u32::from_le_bytes([pak[0],pak[1],pak[2],pak[3]]) >> 8) as usize;
    let mut raw = Vec::with_capacity(raw_len);
    let mut reader = TokenReader::new(pak, 4, magic == Magic::Lz40);
    while raw.len() < raw_len {
        let is_reference = match reader.next_is_reference() {
            Some(bit) => bit,
            None => {
                note(&mut warnings, Warning::TruncatedInput);
                break;
            }
        };
        if !is_reference {
            match reader.byte() {
                Some(val) => raw.push(val),
                None => {
                    note(&mut warnings, Warning::TruncatedInput);
                    break;
                }
            }
            continue;
        }
        let (mut len, dist) = match read_reference(&mut reader, magic) {
            Some(token) => token,
            None => {
                note(&mut warnings, Warning::TruncatedInput);
                break;
            }
        };
        // LZ40 can represent distance 0; neither format may reach back
        // past the start of the decoded data
        if dist == 0 || dist > raw.len() {
            note(&mut warnings, Warning::BadDistance);
            break;
        }
        if raw.len() + len > raw_len {
            note(&mut warnings, Warning::LengthOverrun);
            len = raw_len - raw.len();
        }
        for _k in 0..len {
            let val = raw[raw.len() - dist];
            raw.push(val);
        }
    }
    if magic == Magic::Lz40 {
        // trailing padding: two bytes, or three when a bare 0x80 flag leads
        reader.skip(if reader.peek() == Some(0x80) { 3 } else { 2 });
    }
    if raw.len() < raw_len {
        note(&mut warnings, Warning::ShortOutput);
    }
    log::debug!("unpacked {} of {} bytes from {} packed",raw.len(),raw_len,reader.position());
    (raw,warnings)
}

// *************** TESTS *****************

#[cfg(test)]
fn corpus() -> Vec<Vec<u8>> {
    let mut mixed = Vec::new();
    let mut x: u8 = 1;
    for i in 0..1000 {
        x = x.wrapping_mul(31).wrapping_add(7);
        mixed.push(if i % 5 == 0 { 0 } else { x });
    }
    vec![
        vec![],
        vec![0;32],
        vec![0x00,0x01,0x02,0x03],
        [0xAA,0xBB].repeat(11),
        "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes().to_vec(),
        "12345123456789123456789\n".repeat(20).into_bytes(),
        vec![0;1000],
        mixed
    ]
}

/// smallest back-reference distance in a packed stream, if any
#[cfg(test)]
fn min_reference_distance(pak: &[u8]) -> Option<usize> {
    let magic = Magic::from_u8(pak[0]).unwrap();
    let raw_len = (u32::from_le_bytes([pak[0],pak[1],pak[2],pak[3]]) >> 8) as usize;
    let mut reader = TokenReader::new(pak, 4, magic == Magic::Lz40);
    let mut produced = 0;
    let mut min_dist: Option<usize> = None;
    while produced < raw_len {
        match reader.next_is_reference() {
            Some(true) => {
                let (len,dist) = read_reference(&mut reader, magic).unwrap();
                min_dist = Some(min_dist.map_or(dist, |d| d.min(dist)));
                produced += len;
            },
            Some(false) => {
                reader.byte().unwrap();
                produced += 1;
            },
            None => break
        }
    }
    min_dist
}

#[test]
fn empty_input() {
    let pak = encode_lz11(&[], false).expect("encoding failed");
    assert_eq!(pak,hex::decode("11000000").unwrap());
    assert_eq!(decode(&pak),(vec![],vec![]));
    // the LZ40 terminator stands alone after the bare header
    let pak = encode_lz40(&[], false).expect("encoding failed");
    assert_eq!(pak,hex::decode("40000000800000").unwrap());
    assert_eq!(decode(&pak),(vec![],vec![]));
}

#[test]
fn lz11_large_class() {
    let raw = vec![0;1000];
    let pak = encode_lz11(&raw, false).expect("encoding failed");
    // literal seed, then one four-byte reference covers the rest
    assert_eq!(pak,hex::decode("11e803004000102d6000").unwrap());
    assert_eq!(decode(&pak).0,raw);
}

#[test]
fn lz11_large_class_vram() {
    let raw = vec![0;1000];
    let pak = encode_lz11(&raw, true).expect("encoding failed");
    assert_eq!(pak,hex::decode("11e80300200000102d5001").unwrap());
    assert_eq!(decode(&pak).0,raw);
    assert!(min_reference_distance(&pak).unwrap() >= 2);
}

#[test]
fn lz11_medium_class() {
    let raw = [0xAA,0xBB].repeat(11);
    let pak = encode_lz11(&raw, false).expect("encoding failed");
    assert_eq!(pak,hex::decode("1116000020aabb003001").unwrap());
    assert_eq!(decode(&pak).0,raw);
}

#[test]
fn lz40_zero_run() {
    let raw = vec![0;1000];
    let pak = encode_lz40(&raw, false).expect("encoding failed");
    assert_eq!(pak,hex::decode("40e80300a0001100d7020000").unwrap());
    assert_eq!(decode(&pak).0,raw);
}

#[test]
fn lz40_medium_class() {
    let raw = [0xAA,0xBB].repeat(11);
    let pak = encode_lz40(&raw, false).expect("encoding failed");
    assert_eq!(pak,hex::decode("40160000d0aabb2000040000").unwrap());
    assert_eq!(decode(&pak).0,raw);
}

#[test]
fn lz40_terminator_in_fresh_group() {
    // eight literals fill the first group, pushing the terminator flag
    // into a group of its own; the decoder skips all three bytes
    let raw = [0x00,0x01,0x02,0x03,0x04,0x05,0x06,0x07];
    let pak = encode_lz40(&raw, false).expect("encoding failed");
    assert_eq!(pak,hex::decode("40080000000001020304050607800000").unwrap());
    assert_eq!(&pak[pak.len()-3..],&[0x80,0x00,0x00]);
    let (expanded,warnings) = decode(&pak);
    assert_eq!(expanded,raw);
    assert!(warnings.is_empty());
}

#[test]
fn lz40_terminator_always_zero_padded() {
    for raw in corpus() {
        let pak = encode_lz40(&raw, false).expect("encoding failed");
        assert_eq!(&pak[pak.len()-2..],&[0x00,0x00]);
    }
}

#[test]
fn round_trip_both_formats() {
    for raw in corpus() {
        for vram_safe in [false,true] {
            for pak in [
                encode_lz11(&raw, vram_safe).expect("encoding failed"),
                encode_lz40(&raw, vram_safe).expect("encoding failed")
            ] {
                let stored = (u32::from_le_bytes([pak[0],pak[1],pak[2],pak[3]]) >> 8) as usize;
                assert_eq!(stored,raw.len());
                let (expanded,warnings) = decode(&pak);
                assert_eq!(expanded,raw);
                assert!(warnings.is_empty());
                if vram_safe {
                    if let Some(dist) = min_reference_distance(&pak) {
                        assert!(dist >= 2);
                    }
                }
            }
        }
    }
}

#[test]
fn long_run_spans_length_classes() {
    // long enough that no single token can cover it
    let raw = vec![0x5A;70000];
    for pak in [
        encode_lz11(&raw, false).expect("encoding failed"),
        encode_lz40(&raw, false).expect("encoding failed")
    ] {
        let (expanded,warnings) = decode(&pak);
        assert_eq!(expanded,raw);
        assert!(warnings.is_empty());
    }
}

#[test]
fn deterministic_output() {
    for raw in corpus() {
        assert_eq!(
            encode_lz11(&raw, true).expect("encoding failed"),
            encode_lz11(&raw, true).expect("encoding failed")
        );
        assert_eq!(
            encode_lz40(&raw, true).expect("encoding failed"),
            encode_lz40(&raw, true).expect("encoding failed")
        );
    }
}

#[test]
fn decode_is_idempotent() {
    let pak = encode_lz40(&"12345123456789123456789\n".repeat(20).into_bytes(), false)
        .expect("encoding failed");
    assert_eq!(decode(&pak),decode(&pak));
}

#[test]
fn oversized_input_is_fatal() {
    let raw = vec![0;RAW_MAXIM + 1];
    assert!(encode_lz11(&raw, false).is_err());
    assert!(encode_lz40(&raw, false).is_err());
}

#[test]
fn bad_magic_decodes_empty() {
    let (raw,warnings) = decode(&hex::decode("1004000000000102").unwrap());
    assert!(raw.is_empty());
    assert_eq!(warnings,vec![Warning::BadMagic]);
}

#[test]
fn truncated_stream_partial() {
    // cut an LZ11 stream off in the middle of a four-byte reference
    let full = hex::decode("11e803004000102d6000").unwrap();
    let (raw,warnings) = decode(&full[..8]);
    assert_eq!(raw,vec![0x00]);
    assert!(warnings.contains(&Warning::TruncatedInput));
    assert!(warnings.contains(&Warning::ShortOutput));
}

#[test]
fn overrun_clamps() {
    // small-class reference of length 9 into a 3-byte output
    let (raw,warnings) = decode(&hex::decode("110300004041800000").unwrap());
    assert_eq!(raw,vec![0x41;3]);
    assert_eq!(warnings,vec![Warning::LengthOverrun]);
}

#[test]
fn lz40_zero_distance() {
    // distance 0 is representable in LZ40; the decoder refuses it
    let (raw,warnings) = decode(&hex::decode("4004000080020000").unwrap());
    assert!(raw.is_empty());
    assert_eq!(warnings,vec![Warning::BadDistance,Warning::ShortOutput]);
}
