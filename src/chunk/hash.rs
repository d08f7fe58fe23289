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

//! Reproducible 64-bit row hashing, fixed constants documented so
//! serialized hash outputs are stable across processes.

use super::{Chunk, ChunkData};

const H_NULL: u64 = 0xe967_66e0_d622_1951;
const H_TRUE: u64 = 0x5a32_0fa8_dfcf_e3a7;
const H_FALSE: u64 = 0x1549_571b_97ff_2995;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv64(bytes: &[u8]) -> u64 {
    let mut h = FNV_OFFSET_BASIS;
    for &b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// `(2p + 17)^8`, used to make XOR-based tuple hashing column-order
/// sensitive.
pub fn position_multiplier(p: i64) -> u64 {
    let base = (2 * p + 17) as i128;
    let mut acc: i128 = 1;
    for _ in 0..8 {
        acc = acc.wrapping_mul(base);
    }
    acc as u64
}

impl Chunk {
    /// XORs into `out[i]` a hash of row `i`, scaled by the position
    /// multiplier for `position`. `out.len()` must equal `self.len()`.
    pub fn hash(&self, position: i64, out: &mut [u64]) {
        assert_eq!(out.len(), self.length as usize, "hash: output length mismatch");
        let mult = position_multiplier(position);
        for i in 0..self.length {
            let h = self.hash_one(i);
            out[i as usize] ^= h.wrapping_mul(mult);
        }
    }

    fn hash_one(&self, i: u32) -> u64 {
        if self.is_null(i) {
            return H_NULL;
        }
        let slot = if self.is_literal { 0 } else { i as usize };
        match &self.data {
            ChunkData::String { data, offsets } => {
                let start = offsets[slot] as usize;
                let end = offsets[slot + 1] as usize;
                fnv64(&data[start..end])
            }
            ChunkData::Int(values) => fnv64(&values[slot].to_le_bytes()),
            ChunkData::Float(values) => fnv64(&values[slot].to_bits().to_le_bytes()),
            ChunkData::Date(values) => fnv64(&values[slot].to_le_bytes()),
            ChunkData::Datetime(values) => fnv64(&values[slot].to_le_bytes()),
            ChunkData::Bool(bm) => {
                let mut bm = bm.clone();
                if bm.get(slot as u32) {
                    H_TRUE
                } else {
                    H_FALSE
                }
            }
            ChunkData::Null => H_NULL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;

    #[test]
    fn null_always_hashes_to_sentinel() {
        let mut c = Chunk::from_schema(DataType::Int, true);
        c.add_value("").unwrap();
        let mut out = vec![0u64; 1];
        c.hash(0, &mut out);
        assert_eq!(out[0], H_NULL.wrapping_mul(position_multiplier(0)));
    }

    #[test]
    fn bool_true_false_distinct_constants() {
        let mut c = Chunk::from_schema(DataType::Bool, false);
        c.add_value("true").unwrap();
        c.add_value("false").unwrap();
        let mut out = vec![0u64; 2];
        c.hash(0, &mut out);
        assert_ne!(out[0], out[1]);
    }

    #[test]
    fn literal_hashes_same_value_every_slot() {
        let c = Chunk::literal("7", DataType::Int, 4).unwrap();
        let mut out = vec![0u64; 4];
        c.hash(0, &mut out);
        assert!(out.iter().all(|&v| v == out[0]));
    }

    #[test]
    fn position_multiplier_matches_formula() {
        assert_eq!(position_multiplier(0), 17u64.pow(8));
    }
}
