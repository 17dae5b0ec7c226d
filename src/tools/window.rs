//! Sliding-window dictionary with a binary-search-tree index
//!
//! The fast LZ10 encoder keeps its history in a 4096-byte ring.  Every ring
//! position is a node in one of 256 binary search trees, keyed by the
//! 18-byte sequence starting there and rooted per leading byte.  The last
//! 17 bytes of the ring are mirrored past the wrap point so an 18-byte key
//! read is always contiguous.  The tree pointers `lson`, `rson`, and `dad`
//! are indexed over the ring; the 256 roots live in the tail of `rson`.

/// size of the sliding window
pub const WIN_SIZE: usize = 0x1000;
/// longest match a two-byte LZ10 token can express
pub const MAX_MATCH: usize = 0x12;
/// pointer value NIL means we have a leaf
const NIL: usize = WIN_SIZE;

pub struct TreeWindow {
    ring: Vec<u8>,
    lson: Vec<usize>,
    rson: Vec<usize>,
    dad: Vec<usize>,
    vram_safe: bool,
    /// ring position of the best match found by the last `insert`
    pub match_pos: usize,
    /// length of the best match found by the last `insert`
    pub match_len: usize
}

impl TreeWindow {
    pub fn new(vram_safe: bool) -> Self {
        Self {
            ring: vec![0;WIN_SIZE+MAX_MATCH-1],
            lson: vec![NIL;WIN_SIZE+1],
            rson: vec![NIL;WIN_SIZE+1+256],
            dad: vec![NIL;WIN_SIZE+1],
            vram_safe,
            match_pos: 0,
            match_len: 0
        }
    }
    pub fn byte_at(&self, pos: usize) -> u8 {
        self.ring[pos]
    }
    /// overwrite a ring byte, maintaining the mirror past the wrap point
    pub fn set_byte(&mut self, pos: usize, val: u8) {
        self.ring[pos] = val;
        if pos < MAX_MATCH - 1 {
            self.ring[pos + WIN_SIZE] = val;
        }
    }
    /// This finds a match to the byte run starting at ring position `r` by
    /// searching the tree for that run's leading byte, then indexes `r`.
    /// It always exits by attaching a node: either as a new leaf, or by
    /// splicing `r` into the place of a node with an identical key.
    /// The best `(match_pos, match_len)` seen on the way down is recorded;
    /// under VRAM safety the distance-1 candidate is passed over.
    pub fn insert(&mut self, r: usize) {
        let prev = (r + WIN_SIZE - 1) & (WIN_SIZE - 1);
        let mut cmp: i32 = 1;
        let mut p = WIN_SIZE + 1 + self.ring[r] as usize;
        self.rson[r] = NIL;
        self.lson[r] = NIL;
        self.match_len = 0;
        // Each iteration steps to one prior match candidate.  The comparison
        // byte decides the branch, so candidates arrive in key order.
        loop {
            if cmp >= 0 {
                if self.rson[p] != NIL {
                    p = self.rson[p];
                } else {
                    self.rson[p] = r;
                    self.dad[r] = p;
                    return;
                }
            } else {
                if self.lson[p] != NIL {
                    p = self.lson[p];
                } else {
                    self.lson[p] = r;
                    self.dad[r] = p;
                    return;
                }
            }
            // length of the common prefix, and the ordering of the first
            // mismatched bytes
            let mut i: usize = 1;
            while i < MAX_MATCH {
                cmp = self.ring[r + i] as i32 - self.ring[p + i] as i32;
                if cmp != 0 {
                    break;
                }
                i += 1;
            }
            if i > self.match_len {
                if !self.vram_safe || p != prev {
                    self.match_pos = p;
                    self.match_len = i;
                    if i == MAX_MATCH {
                        break;
                    }
                }
            }
        }
        // full-length match: node p carries the identical key, so r takes
        // its place in the tree and p is unlinked
        self.dad[r] = self.dad[p];
        self.lson[r] = self.lson[p];
        self.rson[r] = self.rson[p];
        self.dad[self.lson[p]] = r;
        self.dad[self.rson[p]] = r;
        if self.rson[self.dad[p]] == p {
            self.rson[self.dad[p]] = r;
        } else {
            self.lson[self.dad[p]] = r;
        }
        self.dad[p] = NIL;
    }
    /// Remove ring position `p` from its tree before the window overwrites it.
    pub fn delete(&mut self, p: usize) {
        if self.dad[p] == NIL {
            return; // not indexed
        }
        let mut q;
        if self.rson[p] == NIL {
            q = self.lson[p];
        } else if self.lson[p] == NIL {
            q = self.rson[p];
        } else {
            // two children: the left child replaces p unless it already has
            // a right branch, in which case the rightmost descendant on that
            // branch is lifted out and takes p's place
            q = self.lson[p];
            if self.rson[q] != NIL {
                loop {
                    q = self.rson[q];
                    if self.rson[q] == NIL {
                        break;
                    }
                }
                self.rson[self.dad[q]] = self.lson[q];
                self.dad[self.lson[q]] = self.dad[q];
                self.lson[q] = self.lson[p];
                self.dad[self.lson[p]] = q;
            }
            self.rson[q] = self.rson[p];
            self.dad[self.rson[p]] = q;
        }
        self.dad[q] = self.dad[p];
        if self.rson[self.dad[p]] == p {
            self.rson[self.dad[p]] = q;
        } else {
            self.lson[self.dad[p]] = q;
        }
        self.dad[p] = NIL;
    }
}

// *************** TESTS *****************

#[cfg(test)]
fn prime(tree: &mut TreeWindow, data: &[u8]) -> usize {
    let r = WIN_SIZE - data.len();
    for (i,val) in data.iter().enumerate() {
        tree.set_byte(r + i, *val);
    }
    tree.insert(r);
    r
}

#[test]
fn first_insert_finds_nothing() {
    let mut tree = TreeWindow::new(false);
    prime(&mut tree, &[1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,16,17,18]);
    assert_eq!(tree.match_len, 0);
}

#[test]
fn adjacent_zero_run() {
    // a zero run matches itself one byte back unless VRAM safety is on
    let mut tree = TreeWindow::new(false);
    let r = prime(&mut tree, &[0;MAX_MATCH]);
    tree.set_byte(0, 0);
    tree.insert((r + 1) & (WIN_SIZE - 1));
    assert_eq!(tree.match_len, MAX_MATCH);
    assert_eq!(tree.match_pos, r);

    let mut tree = TreeWindow::new(true);
    let r = prime(&mut tree, &[0;MAX_MATCH]);
    tree.set_byte(0, 0);
    tree.insert((r + 1) & (WIN_SIZE - 1));
    assert_eq!(tree.match_len, 0);
}

#[test]
fn delete_then_reuse() {
    let mut tree = TreeWindow::new(false);
    let r = prime(&mut tree, &[9;MAX_MATCH]);
    tree.delete(r);
    // the only node is gone, so the next insert sees an empty tree
    tree.insert((r + 1) & (WIN_SIZE - 1));
    assert_eq!(tree.match_len, 0);
    tree.delete(r); // deleting an unindexed node is a no-op
}
