//! Linear-scan match search over the preceding window
//!
//! One routine serves the greedy emit decision and both lookahead probes of
//! the lazy optimisers; all of them must agree on the tie-break for the
//! encoders to be deterministic.

/// Longest prefix match for `raw[at..]` against earlier positions.
///
/// Candidate distances run from `min_distance` (2 under VRAM safety) up to
/// `min(at, window)`.  Matches may run into themselves (length > distance),
/// mirroring the decoder's forward copy.  Returns `(length, distance)` with
/// the smallest distance that achieves the longest length; `(0, 0)` when
/// nothing matches.
pub fn longest_match(raw: &[u8], at: usize, window: usize, max_len: usize, min_distance: usize) -> (usize,usize) {
    let mut best_len = 0;
    let mut best_dist = 0;
    for dist in min_distance..=at.min(window) {
        let mut len = 0;
        while len < max_len && at + len < raw.len() && raw[at + len] == raw[at + len - dist] {
            len += 1;
        }
        if len > best_len {
            best_len = len;
            best_dist = dist;
            if len == max_len {
                break;
            }
        }
    }
    (best_len,best_dist)
}

#[test]
fn smallest_distance_wins_ties() {
    // "abc" at distances 3 and 6 from position 6, both length 3
    let raw = b"abcabcabc";
    assert_eq!(longest_match(raw, 6, 4096, 18, 1), (3, 3));
}

#[test]
fn run_length_extension() {
    // distance 1 self-overlap covers the whole run
    let raw = [7u8; 20];
    assert_eq!(longest_match(&raw, 1, 4096, 18, 1), (18, 1));
    assert_eq!(longest_match(&raw, 1, 4096, 18, 2), (0, 0));
    assert_eq!(longest_match(&raw, 2, 4096, 18, 2), (18, 2));
}

#[test]
fn clipped_at_input_end() {
    let raw = b"abcdabc";
    assert_eq!(longest_match(raw, 4, 4096, 18, 1), (3, 4));
}
