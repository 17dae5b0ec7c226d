//! LZ10 codec
//!
//! The classic `0x10` flavor: a 4-byte little-endian header carrying the
//! magic and the 24-bit raw length, then flag-byte groups of literals and
//! two-byte back-references with lengths 3-18 and distances 1-4096.
//!
//! Three encoder strategies are offered.  `Greedy` scans the window
//! linearly at every position, `Lazy` adds a one-byte lookahead that trades
//! a match now for a longer match one byte later, and `Fast` replaces the
//! scan with a binary-search-tree index over the sliding window.
//! All three produce streams any LZ10 decoder reconstructs identically;
//! VRAM-safe streams keep every distance at 2 or more so the hardware
//! blitter can copy them.

use crate::tools::flags::{TokenReader,TokenWriter};
use crate::tools::search::longest_match;
use crate::tools::window::{TreeWindow,MAX_MATCH,WIN_SIZE};
use crate::tools::note;
use crate::{Error,Magic,Strategy,Warning,RAW_MAXIM};

/// longest byte run left uncoded
const THRESHOLD: usize = 2;

/// Main compression function.  Packs `raw` under the given strategy; the
/// result is returned even when larger than the input.
pub fn encode(raw: &[u8], strategy: Strategy, vram_safe: bool) -> Result<Vec<u8>,Error> {
    if raw.len() > RAW_MAXIM {
        return Err(Error::InputTooLarge);
    }
    Ok(match strategy {
        Strategy::Greedy => encode_linear(raw, vram_safe, false),
        Strategy::Lazy => encode_linear(raw, vram_safe, true),
        Strategy::Fast => encode_fast(raw, vram_safe)
    })
}

fn header(raw_len: usize) -> Vec<u8> {
    let mut pak = Vec::with_capacity(4 + raw_len + raw_len / 8 + 1);
    pak.extend_from_slice(&u32::to_le_bytes(Magic::Lz10 as u32 | (raw_len as u32) << 8));
    pak
}

fn put_reference(writer: &mut TokenWriter, len: usize, dist: usize) {
    writer.reference(&[
        (((len - (THRESHOLD + 1)) << 4) | ((dist - 1) >> 8)) as u8,
        ((dist - 1) & 0xFF) as u8
    ]);
}

fn encode_linear(raw: &[u8], vram_safe: bool, lazy: bool) -> Vec<u8> {
    let min_distance = if vram_safe { 2 } else { 1 };
    let mut writer = TokenWriter::new(header(raw.len()), false);
    let mut r = 0;
    log::debug!("entering loop over tokens");
    while r < raw.len() {
        let (mut len, dist) = longest_match(raw, r, WIN_SIZE, MAX_MATCH, min_distance);
        if lazy && len > THRESHOLD && r + len < raw.len() {
            let (next,_) = longest_match(raw, r + len, WIN_SIZE, MAX_MATCH, min_distance);
            let (post,_) = longest_match(raw, r + 1, WIN_SIZE, MAX_MATCH, min_distance);
            let next = if next <= THRESHOLD { 1 } else { next };
            let post = if post <= THRESHOLD { 1 } else { post };
            // a literal here lets the next position carry a better match
            if len + next <= 1 + post {
                log::trace!("defer match of {} at {}",len,r);
                len = 1;
            }
        }
        if len > THRESHOLD {
            log::trace!("reference: {} bytes from {} back at {}",len,dist,r);
            put_reference(&mut writer, len, dist);
            r += len;
        } else {
            log::trace!("literal: {} at {}",raw[r],r);
            writer.literal(raw[r]);
            r += 1;
        }
    }
    writer.into_inner()
}

/// Tree-indexed encoder.  The window is primed with the first
/// `min(raw_len, 18)` bytes ending at ring position 4095, and every shift
/// deletes the tail node, admits one raw byte, and indexes the new head.
/// The match recorded by the head's insert drives the next token.
fn encode_fast(raw: &[u8], vram_safe: bool) -> Vec<u8> {
    let pak = header(raw.len());
    if raw.is_empty() {
        return pak;
    }
    let mut writer = TokenWriter::new(pak, false);
    log::debug!("create window index");
    let mut tree = TreeWindow::new(vram_safe);

    let mut len = raw.len().min(MAX_MATCH);
    let mut r = WIN_SIZE - len;
    let mut s = 0;
    for i in 0..len {
        tree.set_byte(r + i, raw[i]);
    }
    let mut next = len;
    tree.insert(r);

    log::debug!("entering loop over tokens");
    while len > 0 {
        let mut match_len = tree.match_len;
        let match_pos = tree.match_pos;
        if match_len > len {
            match_len = len;
        }
        if match_len > THRESHOLD {
            let dist = (r + WIN_SIZE - match_pos) & (WIN_SIZE - 1);
            log::trace!("reference: {} bytes from {} back at ring {}",match_len,dist,r);
            put_reference(&mut writer, match_len, dist);
        } else {
            match_len = 1;
            log::trace!("literal: {} at ring {}",tree.byte_at(r),r);
            writer.literal(tree.byte_at(r));
        }
        // slide the window over the bytes the token consumed
        let mut i = 0;
        while i < match_len {
            if next == raw.len() {
                break;
            }
            tree.delete(s);
            log::trace!("shift in {} at ring {}",raw[next],s);
            tree.set_byte(s, raw[next]);
            next += 1;
            s = (s + 1) & (WIN_SIZE - 1);
            r = (r + 1) & (WIN_SIZE - 1);
            tree.insert(r);
            i += 1;
        }
        // input exhausted: drain the lookahead still in the ring
        while i < match_len {
            tree.delete(s);
            s = (s + 1) & (WIN_SIZE - 1);
            r = (r + 1) & (WIN_SIZE - 1);
            len -= 1;
            if len > 0 {
                tree.insert(r);
            }
            i += 1;
        }
    }
    writer.into_inner()
}

/// Main decompression function.  Lenient: whatever could be reconstructed
/// comes back, together with diagnostics for anything wrong on the way.
pub fn decode(pak: &[u8]) -> (Vec<u8>,Vec<Warning>) {
    let mut warnings = Vec::new();
    if pak.len() < 4 {
        note(&mut warnings, Warning::TruncatedInput);
        return (Vec::new(),warnings);
    }
    if pak[0] != Magic::Lz10 as u8 {
        note(&mut warnings, Warning::BadMagic);
        return (Vec::new(),warnings);
    }
    let raw_len = (u32::from_le_bytes([pak[0],pak[1],pak[2],pak[3]]) >> 8) as usize;
    let mut raw = Vec::with_capacity(raw_len);
    let mut reader = TokenReader::new(pak, 4, false);
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
        let (hi,lo) = match (reader.byte(),reader.byte()) {
            (Some(hi),Some(lo)) => (hi as usize,lo as usize),
            _ => {
                note(&mut warnings, Warning::TruncatedInput);
                break;
            }
        };
        let mut len = (hi >> 4) + THRESHOLD + 1;
        let dist = (((hi & 0xF) << 8) | lo) + 1;
        if dist > raw.len() {
            note(&mut warnings, Warning::BadDistance);
            break;
        }
        if raw.len() + len > raw_len {
            note(&mut warnings, Warning::LengthOverrun);
            len = raw_len - raw.len();
        }
        // forward copy; a match may run into the bytes it produces
        for _k in 0..len {
            let val = raw[raw.len() - dist];
            raw.push(val);
        }
    }
    if raw.len() < raw_len {
        note(&mut warnings, Warning::ShortOutput);
    }
    log::debug!("unpacked {} of {} bytes from {} packed",raw.len(),raw_len,pak.len());
    (raw,warnings)
}

// *************** TESTS *****************

#[cfg(test)]
const STRATEGIES: [Strategy;3] = [Strategy::Greedy,Strategy::Fast,Strategy::Lazy];

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
    let raw_len = (u32::from_le_bytes([pak[0],pak[1],pak[2],pak[3]]) >> 8) as usize;
    let mut reader = TokenReader::new(pak, 4, false);
    let mut produced = 0;
    let mut min_dist: Option<usize> = None;
    while produced < raw_len {
        match reader.next_is_reference() {
            Some(true) => {
                let hi = reader.byte().unwrap() as usize;
                let lo = reader.byte().unwrap() as usize;
                let dist = (((hi & 0xF) << 8) | lo) + 1;
                min_dist = Some(min_dist.map_or(dist, |d| d.min(dist)));
                produced += (hi >> 4) + THRESHOLD + 1;
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
    for strategy in STRATEGIES {
        let pak = encode(&[], strategy, false).expect("encoding failed");
        assert_eq!(pak,hex::decode("10000000").unwrap());
        let (raw,warnings) = decode(&pak);
        assert!(raw.is_empty());
        assert!(warnings.is_empty());
    }
}

#[test]
fn incompressible_is_literals() {
    let raw = [0x00,0x01,0x02,0x03];
    for strategy in STRATEGIES {
        let pak = encode(&raw, strategy, false).expect("encoding failed");
        assert_eq!(pak,hex::decode("100400000000010203").unwrap());
    }
}

#[test]
fn zero_run_wram() {
    // literal, then distance-1 self-extending references
    let pak = encode(&[0;32], Strategy::Greedy, false).expect("encoding failed");
    assert_eq!(pak,hex::decode("102000006000f000a000").unwrap());
    assert_eq!(decode(&pak).0,vec![0;32]);
}

#[test]
fn zero_run_vram() {
    // distance 1 is banned, so two literals seed a distance-2 copy
    let pak = encode(&[0;32], Strategy::Greedy, true).expect("encoding failed");
    assert_eq!(pak,hex::decode("10200000300000f0019001").unwrap());
    assert_eq!(decode(&pak).0,vec![0;32]);
}

#[test]
fn pattern_run_greedy() {
    let raw = [0xAA,0xBB].repeat(11);
    let pak = encode(&raw, Strategy::Greedy, false).expect("encoding failed");
    assert_eq!(pak,hex::decode("1016000020aabbf001aabb").unwrap());
    assert_eq!(decode(&pak).0,raw);
}

#[test]
fn pattern_run_lazy() {
    // the lookahead defers the distance-2 match until it can run to the end
    let raw = [0xAA,0xBB].repeat(11);
    let pak = encode(&raw, Strategy::Lazy, false).expect("encoding failed");
    assert_eq!(pak,hex::decode("1016000008aabbaabbf001").unwrap());
    assert_eq!(decode(&pak).0,raw);
}

#[test]
fn round_trip_all_strategies() {
    for raw in corpus() {
        for strategy in STRATEGIES {
            for vram_safe in [false,true] {
                let pak = encode(&raw, strategy, vram_safe).expect("encoding failed");
                // 24-bit header length agrees with the input
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
fn deterministic_output() {
    for raw in corpus() {
        for strategy in STRATEGIES {
            let first = encode(&raw, strategy, false).expect("encoding failed");
            let second = encode(&raw, strategy, false).expect("encoding failed");
            assert_eq!(first,second);
        }
    }
}

#[test]
fn cross_strategy_agreement() {
    // packed bytes may differ between strategies, decoded bytes may not
    for raw in corpus() {
        let from_greedy = decode(&encode(&raw, Strategy::Greedy, true).expect("encoding failed")).0;
        let from_fast = decode(&encode(&raw, Strategy::Fast, true).expect("encoding failed")).0;
        let from_lazy = decode(&encode(&raw, Strategy::Lazy, true).expect("encoding failed")).0;
        assert_eq!(from_greedy,from_fast);
        assert_eq!(from_fast,from_lazy);
        assert_eq!(from_lazy,raw);
    }
}

#[test]
fn decode_is_idempotent() {
    let pak = encode(&"12345123456789123456789\n".repeat(20).into_bytes(), Strategy::Lazy, false)
        .expect("encoding failed");
    assert_eq!(decode(&pak),decode(&pak));
}

#[test]
fn lazy_never_larger_on_runs() {
    for raw in [vec![0;32],vec![0;1000],[0xAA,0xBB].repeat(11),[0x11,0x22,0x33].repeat(40)] {
        let greedy = encode(&raw, Strategy::Greedy, false).expect("encoding failed");
        let lazy = encode(&raw, Strategy::Lazy, false).expect("encoding failed");
        assert!(lazy.len() <= greedy.len());
    }
}

#[test]
fn oversized_input_is_fatal() {
    let raw = vec![0;RAW_MAXIM + 1];
    assert!(encode(&raw, Strategy::Fast, false).is_err());
}

#[test]
fn bad_magic_decodes_empty() {
    let (raw,warnings) = decode(&hex::decode("1104000000000102").unwrap());
    assert!(raw.is_empty());
    assert_eq!(warnings,vec![Warning::BadMagic]);
}

#[test]
fn truncated_stream_partial() {
    let (raw,warnings) = decode(&hex::decode("1020000000aa").unwrap());
    assert_eq!(raw,vec![0xAA]);
    assert!(warnings.contains(&Warning::TruncatedInput));
    assert!(warnings.contains(&Warning::ShortOutput));
}

#[test]
fn overrun_clamps() {
    // reference of length 18 into a 4-byte output
    let (raw,warnings) = decode(&hex::decode("100400004041f000").unwrap());
    assert_eq!(raw,vec![0x41;4]);
    assert_eq!(warnings,vec![Warning::LengthOverrun]);
}

#[test]
fn distance_before_start() {
    let (raw,warnings) = decode(&hex::decode("1004000080f005").unwrap());
    assert!(raw.is_empty());
    assert_eq!(warnings,vec![Warning::BadDistance,Warning::ShortOutput]);
}
