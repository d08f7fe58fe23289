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

//! Vectorized evaluation kernel: element-wise projections over pairs of
//! chunks. Dispatch is on the pair of input dtypes; within a dtype pair,
//! literal folding picks one of up to four branches. Results are
//! single-use, in-memory chunks — always built nullable, since the result
//! of a projection may introduce nulls (division by zero) even when neither
//! input chunk was nullable.

pub mod arithmetic;
pub mod compare;
pub mod logical;

use crate::bitmap::{self, Bitmap};
use crate::chunk::Chunk;

/// The logical output length of a binary projection: the length of
/// whichever side is not a literal, or either side's length when both are
/// literal (the caller is expected to have aligned the two chunks).
fn output_len(a: &Chunk, b: &Chunk) -> u32 {
    if !a.is_literal() {
        a.len()
    } else {
        b.len()
    }
}

/// Null propagation: OR of both inputs' nullability, with absent
/// bitmaps (including literals, which are never null) treated as all-zero.
fn propagate_nulls(a: &Chunk, b: &Chunk) -> Option<Bitmap> {
    bitmap::or_opt(
        a.nullability_effective().as_ref(),
        b.nullability_effective().as_ref(),
    )
}

/// Runs a binary elementwise op across two slices (possibly of different
/// element types, for the Int/Float promoting paths), honoring literal
/// folding: when both sides are literal the op runs once and the caller is
/// expected to mark the result chunk literal; otherwise it runs once per
/// logical output row, each side indexing its own slot (0 for a literal,
/// `i` otherwise). Returns `(values, result_is_literal)`.
pub(crate) fn elementwise2<T: Copy, S: Copy, U>(
    a: &[T],
    a_literal: bool,
    b: &[S],
    b_literal: bool,
    len: u32,
    f: impl Fn(T, S) -> U,
) -> (Vec<U>, bool) {
    if a_literal && b_literal {
        (vec![f(a[0], b[0])], true)
    } else {
        let out = (0..len as usize)
            .map(|i| {
                let ai = if a_literal { 0 } else { i };
                let bi = if b_literal { 0 } else { i };
                f(a[ai], b[bi])
            })
            .collect();
        (out, false)
    }
}

/// [`elementwise2`] specialized to equal element types on both sides (the
/// common case: same-dtype comparisons and arithmetic).
pub(crate) fn elementwise<T: Copy, U>(
    a: &[T],
    a_literal: bool,
    b: &[T],
    b_literal: bool,
    len: u32,
    f: impl Fn(T, T) -> U,
) -> (Vec<U>, bool) {
    elementwise2(a, a_literal, b, b_literal, len, f)
}

/// Broadcasts a one-bit literal bitmap to a dense `len`-bit bitmap so it can
/// feed a word-parallel combinator alongside a dense operand. A no-op clone
/// when `bm` is already dense.
pub(crate) fn hydrate_bool(bm: &Bitmap, is_literal: bool, len: u32) -> Bitmap {
    if !is_literal {
        return bm.clone();
    }
    let mut bm_clone = bm.clone();
    let v = bm_clone.get(0);
    let mut out = Bitmap::new(len);
    if v {
        for i in 0..len {
            out.set(i, true);
        }
    }
    out
}
