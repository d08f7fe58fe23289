// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Bit-packed boolean vector underpinning nullability, boolean column
//! storage, and filter results. Bits beyond `cap` in the final word are
//! garbage and must never leak into `count`/`invert`/`and_not`/`or`.

use std::io::{self, Read, Write};

const WORD_BITS: u32 = 64;

fn word_count_for(cap: u32) -> usize {
    cap.div_ceil(WORD_BITS) as usize
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bitmap {
    words: Vec<u64>,
    cap: u32,
}

impl Bitmap {
    pub fn new(n: u32) -> Self {
        Self {
            words: vec![0u64; word_count_for(n)],
            cap: n,
        }
    }

    pub fn from_bools(seq: &[bool]) -> Self {
        let mut bm = Self::new(seq.len() as u32);
        for (i, &v) in seq.iter().enumerate() {
            if v {
                bm.set(i as u32, true);
            }
        }
        bm
    }

    /// Takes ownership of `words` without copying. `words.len()` must equal
    /// `ceil(length / 64)`.
    pub fn from_words(words: Vec<u64>, length: u32) -> Self {
        debug_assert_eq!(words.len(), word_count_for(length));
        let mut bm = Self { words, cap: length };
        bm.mask_trailing();
        bm
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn data(&self) -> &[u64] {
        &self.words
    }

    pub fn count(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Grows to hold at least `n` bits. Never shrinks.
    pub fn ensure(&mut self, n: u32) {
        if n <= self.cap {
            return;
        }
        self.words.resize(word_count_for(n), 0);
        self.cap = n;
    }

    pub fn get(&mut self, n: u32) -> bool {
        self.ensure(n + 1);
        let word = self.words[(n / WORD_BITS) as usize];
        (word >> (n % WORD_BITS)) & 1 == 1
    }

    pub fn set(&mut self, n: u32, v: bool) {
        self.ensure(n + 1);
        let idx = (n / WORD_BITS) as usize;
        let bit = n % WORD_BITS;
        if v {
            self.words[idx] |= 1u64 << bit;
        } else {
            self.words[idx] &= !(1u64 << bit);
        }
    }

    /// Masks bits beyond `cap` in the final word to zero.
    fn mask_trailing(&mut self) {
        if self.cap == 0 {
            return;
        }
        let used_bits = self.cap % WORD_BITS;
        if used_bits != 0 {
            if let Some(last) = self.words.last_mut() {
                let mask = (1u64 << used_bits) - 1;
                *last &= mask;
            }
        }
    }

    pub fn invert(&mut self) {
        for word in &mut self.words {
            *word = !*word;
        }
        self.mask_trailing();
    }

    /// `self[i] &= !other[i]`. Panics if caps differ.
    pub fn and_not(&mut self, other: &Bitmap) {
        assert_eq!(self.cap, other.cap, "and_not: bitmap cap mismatch");
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a &= !*b;
        }
        self.mask_trailing();
    }

    /// `self[i] |= other[i]`. Panics if caps differ.
    pub fn or(&mut self, other: &Bitmap) {
        assert_eq!(self.cap, other.cap, "or: bitmap cap mismatch");
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a |= *b;
        }
        self.mask_trailing();
    }

    /// Appends `other`'s bits after `self`'s, growing `cap` by `other.cap`.
    pub fn append(&mut self, other: &Bitmap) {
        let base = self.cap;
        self.ensure(base + other.cap);
        for i in 0..other.cap {
            if (other.words[(i / WORD_BITS) as usize] >> (i % WORD_BITS)) & 1 == 1 {
                self.set(base + i, true);
            }
        }
    }

    /// Zeros all bits past the `n`th set bit, counting from low to high.
    /// `cap` is unchanged. A no-op if there are fewer than `n` set bits
    /// (including the boundary `n == count()`, which zeros only bits that
    /// were already zero).
    pub fn keep_first_n(&mut self, n: i64) {
        assert!(n >= 0, "keep_first_n: n must be non-negative");
        let n = n as u64;
        if n == 0 {
            for i in 0..self.cap {
                self.set(i, false);
            }
            return;
        }
        let mut seen = 0u64;
        let mut cutoff = None;
        for i in 0..self.cap {
            if (self.words[(i / WORD_BITS) as usize] >> (i % WORD_BITS)) & 1 == 1 {
                seen += 1;
                if seen == n {
                    cutoff = Some(i + 1);
                    break;
                }
            }
        }
        if seen < n {
            return;
        }
        if let Some(start) = cutoff {
            for i in start..self.cap {
                self.set(i, false);
            }
        }
    }

    /// Combines two equal-cap bitmaps word-by-word, masking trailing
    /// garbage bits afterward. Used by the evaluation kernel's word-parallel
    /// Bool/Bool comparisons (`EQ` = XNOR, `GT` = `a & !b`, ...). Panics on
    /// cap mismatch, matching `and_not`/`or`.
    pub fn word_parallel(a: &Bitmap, b: &Bitmap, f: impl Fn(u64, u64) -> u64) -> Bitmap {
        assert_eq!(a.cap, b.cap, "word_parallel: cap mismatch");
        let words = a.words.iter().zip(b.words.iter()).map(|(&x, &y)| f(x, y)).collect();
        let mut out = Bitmap { words, cap: a.cap };
        out.mask_trailing();
        out
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.cap.to_le_bytes())?;
        w.write_all(&(self.words.len() as u32).to_le_bytes())?;
        for word in &self.words {
            w.write_all(&word.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> io::Result<Option<Bitmap>> {
        let cap = read_u32(r)?;
        if cap == 0 {
            return Ok(None);
        }
        let word_count = read_u32(r)? as usize;
        let mut words = Vec::with_capacity(word_count);
        for _ in 0..word_count {
            words.push(read_u64(r)?);
        }
        Ok(Some(Bitmap::from_words(words, cap)))
    }
}

fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Deep copy tolerating a nil input.
pub fn clone_opt(b: Option<&Bitmap>) -> Option<Bitmap> {
    b.cloned()
}

/// `or` at the free-function level: a nil operand behaves like all-zero.
/// `nil ∨ nil` is nil.
pub fn or_opt(a: Option<&Bitmap>, b: Option<&Bitmap>) -> Option<Bitmap> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a.clone()),
        (None, Some(b)) => Some(b.clone()),
        (Some(a), Some(b)) => {
            let mut out = a.clone();
            out.or(b);
            Some(out)
        }
    }
}

/// Write a possibly-nil bitmap: nil writes `cap = 0` only.
pub fn write_opt<W: Write>(b: Option<&Bitmap>, w: &mut W) -> io::Result<()> {
    match b {
        None => w.write_all(&0u32.to_le_bytes()),
        Some(b) => b.write(w),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let mut bm = Bitmap::new(10);
        for n in 0..10 {
            bm.set(n, n % 2 == 0);
        }
        for n in 0..10 {
            assert_eq!(bm.get(n), n % 2 == 0);
        }
    }

    #[test]
    fn get_set_grow_past_cap() {
        let mut bm = Bitmap::new(0);
        bm.set(100, true);
        assert_eq!(bm.cap(), 101);
        assert!(bm.get(100));
        assert!(!bm.get(50));
    }

    #[test]
    fn count_matches_set_bits() {
        let mut bm = Bitmap::new(200);
        for i in (0..200).step_by(3) {
            bm.set(i, true);
        }
        let expected = (0..200u32).step_by(3).count() as u32;
        assert_eq!(bm.count(), expected);
    }

    #[test]
    fn double_invert_is_identity() {
        let mut bm = Bitmap::new(130);
        bm.set(5, true);
        bm.set(129, true);
        let before = bm.clone();
        bm.invert();
        bm.invert();
        assert_eq!(bm, before);
    }

    #[test]
    fn invert_masks_trailing_garbage() {
        let mut bm = Bitmap::new(3);
        bm.invert();
        // only first 3 bits may be set; word has 64 bits total
        assert_eq!(bm.count(), 3);
    }

    #[test]
    fn or_with_nil_is_identity() {
        let mut bm = Bitmap::new(10);
        bm.set(2, true);
        let result = or_opt(Some(&bm), None);
        assert_eq!(result, Some(bm));
    }

    #[test]
    fn or_nil_nil_is_nil() {
        assert_eq!(or_opt(None, None), None);
    }

    #[test]
    fn append_extends_cap_and_preserves_bits() {
        let mut a = Bitmap::from_bools(&[true, false, true]);
        let b = Bitmap::from_bools(&[false, true]);
        a.append(&b);
        assert_eq!(a.cap(), 5);
        let bits: Vec<bool> = (0..5).map(|i| a.get(i)).collect();
        assert_eq!(bits, vec![true, false, true, false, true]);
    }

    #[test]
    fn keep_first_n_basic() {
        let mut bm = Bitmap::from_bools(&[true, true, false, true, true]);
        bm.keep_first_n(2);
        let bits: Vec<bool> = (0..5).map(|i| bm.get(i)).collect();
        assert_eq!(bits, vec![true, true, false, false, false]);
    }

    #[test]
    fn keep_first_n_zero_clears_everything() {
        let mut bm = Bitmap::from_bools(&[true, true, false, true]);
        bm.keep_first_n(0);
        let bits: Vec<bool> = (0..4).map(|i| bm.get(i)).collect();
        assert_eq!(bits, vec![false, false, false, false]);
    }

    #[test]
    fn keep_first_n_equal_to_count_is_noop() {
        let mut bm = Bitmap::from_bools(&[true, false, true, true]);
        let total = bm.count() as i64;
        let before = bm.clone();
        bm.keep_first_n(total);
        assert_eq!(bm, before);
    }

    #[test]
    fn keep_first_n_more_than_count_is_noop() {
        let mut bm = Bitmap::from_bools(&[true, false, true]);
        let before = bm.clone();
        bm.keep_first_n(100);
        assert_eq!(bm, before);
    }

    #[test]
    #[should_panic]
    fn keep_first_n_negative_panics() {
        let mut bm = Bitmap::new(4);
        bm.keep_first_n(-1);
    }

    #[test]
    fn serialize_round_trip() {
        let mut bm = Bitmap::new(70);
        bm.set(0, true);
        bm.set(69, true);
        let mut buf = Vec::new();
        bm.write(&mut buf).unwrap();
        let mut cursor = &buf[..];
        let back = Bitmap::read(&mut cursor).unwrap().unwrap();
        assert_eq!(back, bm);
    }

    #[test]
    fn serialize_nil_yields_three_zero_bytes_omitted() {
        let mut buf = Vec::new();
        write_opt(None, &mut buf).unwrap();
        assert_eq!(buf.len(), 4);
        let mut cursor = &buf[..];
        assert_eq!(Bitmap::read(&mut cursor).unwrap(), None);
    }

    #[test]
    fn word_parallel_xnor_matches_bitwise_eq() {
        let a = Bitmap::from_bools(&[true, false, true, true]);
        let b = Bitmap::from_bools(&[true, true, false, true]);
        let result = Bitmap::word_parallel(&a, &b, |x, y| !(x ^ y));
        let bits: Vec<bool> = (0..4).map(|i| result.clone().get(i)).collect();
        assert_eq!(bits, vec![true, false, false, true]);
    }

    proptest::proptest! {
        #[test]
        fn prop_get_after_set(bits in proptest::collection::vec(proptest::bool::ANY, 0..200)) {
            let mut bm = Bitmap::from_bools(&bits);
            for (i, &v) in bits.iter().enumerate() {
                proptest::prop_assert_eq!(bm.get(i as u32), v);
            }
            proptest::prop_assert_eq!(bm.count() as usize, bits.iter().filter(|&&b| b).count());
        }
    }
}
