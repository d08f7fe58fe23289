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

//! `and`, `or`, `not`: logical operators, defined only over Bool chunks.

use snafu::prelude::*;

use super::{hydrate_bool, output_len, propagate_nulls};
use crate::bitmap::Bitmap;
use crate::chunk::{Chunk, ChunkData};
use crate::error::{ProjectionNotSupportedSnafu, Result};

pub fn and(a: &Chunk, b: &Chunk) -> Result<Chunk> {
    binary(a, b, |x, y| x & y)
}

pub fn or(a: &Chunk, b: &Chunk) -> Result<Chunk> {
    binary(a, b, |x, y| x | y)
}

/// Clones `a`'s data bitmap and inverts it.
pub fn not(a: &Chunk) -> Result<Chunk> {
    match &a.data {
        ChunkData::Bool(bm) => {
            let mut bm = bm.clone();
            bm.invert();
            if a.is_literal() {
                Ok(Chunk::from_parts_literal(ChunkData::Bool(bm), a.len()))
            } else {
                Ok(Chunk::from_parts(
                    ChunkData::Bool(bm),
                    a.len(),
                    true,
                    a.nullability_effective(),
                ))
            }
        }
        _ => ProjectionNotSupportedSnafu {
            left: a.dtype(),
            right: a.dtype(),
        }
        .fail(),
    }
}

fn binary(a: &Chunk, b: &Chunk, f: impl Fn(u64, u64) -> u64) -> Result<Chunk> {
    match (&a.data, &b.data) {
        (ChunkData::Bool(abm), ChunkData::Bool(bbm)) => {
            let len = output_len(a, b);
            if a.is_literal() && b.is_literal() {
                let mut abm_clone = abm.clone();
                let mut bbm_clone = bbm.clone();
                let av = abm_clone.get(0);
                let bv = bbm_clone.get(0);
                let mut bm = Bitmap::new(1);
                bm.set(0, f(av as u64, bv as u64) & 1 == 1);
                return Ok(Chunk::from_parts_literal(ChunkData::Bool(bm), len));
            }
            let a_full = hydrate_bool(abm, a.is_literal(), len);
            let b_full = hydrate_bool(bbm, b.is_literal(), len);
            let result = Bitmap::word_parallel(&a_full, &b_full, &f);
            Ok(Chunk::from_parts(
                ChunkData::Bool(result),
                len,
                true,
                propagate_nulls(a, b),
            ))
        }
        _ => ProjectionNotSupportedSnafu {
            left: a.dtype(),
            right: b.dtype(),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;

    fn bool_chunk(values: &[&str]) -> Chunk {
        let mut c = Chunk::from_schema(DataType::Bool, false);
        for v in values {
            c.add_value(v).unwrap();
        }
        c
    }

    fn bools(c: &Chunk) -> Vec<bool> {
        match &c.data {
            ChunkData::Bool(bm) => {
                let mut bm = bm.clone();
                (0..c.len())
                    .map(|i| bm.get(if c.is_literal() { 0 } else { i }))
                    .collect()
            }
            _ => panic!("expected bool chunk"),
        }
    }

    #[test]
    fn and_truth_table() {
        let a = bool_chunk(&["true", "true", "false", "false"]);
        let b = bool_chunk(&["true", "false", "true", "false"]);
        assert_eq!(bools(&and(&a, &b).unwrap()), vec![true, false, false, false]);
    }

    #[test]
    fn or_truth_table() {
        let a = bool_chunk(&["true", "true", "false", "false"]);
        let b = bool_chunk(&["true", "false", "true", "false"]);
        assert_eq!(bools(&or(&a, &b).unwrap()), vec![true, true, true, false]);
    }

    #[test]
    fn not_inverts() {
        let a = bool_chunk(&["true", "false"]);
        assert_eq!(bools(&not(&a).unwrap()), vec![false, true]);
    }

    #[test]
    fn not_on_literal_stays_literal() {
        let a = Chunk::literal("true", DataType::Bool, 5).unwrap();
        let result = not(&a).unwrap();
        assert!(result.is_literal());
        assert_eq!(result.len(), 5);
        assert_eq!(bools(&result), vec![false; 5]);
    }

    #[test]
    fn non_bool_rejected() {
        let mut a = Chunk::from_schema(DataType::Int, false);
        a.add_value("1").unwrap();
        let mut b = Chunk::from_schema(DataType::Int, false);
        b.add_value("1").unwrap();
        assert!(and(&a, &b).is_err());
    }
}
