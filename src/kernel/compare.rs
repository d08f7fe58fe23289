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

//! `eq`, `neq`, `gt`, `gte`, `lt`, `lte`: comparisons over pairs of chunks,
//! always producing a Bool chunk. `lt(a, b) = gt(b, a)` and
//! `lte(a, b) = gte(b, a)`, so only `eq`/`neq`/`gt`/`gte` have
//! their own dispatch bodies.

use std::cmp::Ordering;

use snafu::prelude::*;

use super::{elementwise, elementwise2, hydrate_bool, output_len, propagate_nulls};
use crate::bitmap::Bitmap;
use crate::chunk::{Chunk, ChunkData};
use crate::error::{ProjectionNotSupportedSnafu, Result};

#[derive(Clone, Copy)]
enum Op {
    Eq,
    Neq,
    Gt,
    Gte,
}

fn ordering_to_bool(op: Op, ord: Ordering) -> bool {
    match op {
        Op::Eq => ord == Ordering::Equal,
        Op::Neq => ord != Ordering::Equal,
        Op::Gt => ord == Ordering::Greater,
        Op::Gte => ord != Ordering::Less,
    }
}

pub fn eq(a: &Chunk, b: &Chunk) -> Result<Chunk> {
    dispatch(Op::Eq, a, b)
}

pub fn neq(a: &Chunk, b: &Chunk) -> Result<Chunk> {
    dispatch(Op::Neq, a, b)
}

pub fn gt(a: &Chunk, b: &Chunk) -> Result<Chunk> {
    dispatch(Op::Gt, a, b)
}

pub fn gte(a: &Chunk, b: &Chunk) -> Result<Chunk> {
    dispatch(Op::Gte, a, b)
}

pub fn lt(a: &Chunk, b: &Chunk) -> Result<Chunk> {
    gt(b, a)
}

pub fn lte(a: &Chunk, b: &Chunk) -> Result<Chunk> {
    gte(b, a)
}

fn dispatch(op: Op, a: &Chunk, b: &Chunk) -> Result<Chunk> {
    match (&a.data, &b.data) {
        (ChunkData::Bool(abm), ChunkData::Bool(bbm)) => Ok(bool_compare(op, a, b, abm, bbm)),
        (ChunkData::String { .. }, ChunkData::String { .. }) => Ok(string_compare(op, a, b)),
        (ChunkData::Int(av), ChunkData::Int(bv)) => {
            Ok(numeric_compare(op, a, av, b, bv, |x, y| x.cmp(&y)))
        }
        (ChunkData::Float(av), ChunkData::Float(bv)) => Ok(numeric_compare(op, a, av, b, bv, |x, y| {
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        })),
        (ChunkData::Date(av), ChunkData::Date(bv)) => {
            Ok(numeric_compare(op, a, av, b, bv, |x, y| x.cmp(&y)))
        }
        (ChunkData::Datetime(av), ChunkData::Datetime(bv)) => {
            Ok(numeric_compare(op, a, av, b, bv, |x, y| x.cmp(&y)))
        }
        (ChunkData::Int(av), ChunkData::Float(bv)) => Ok(promoted_compare(op, a, av, b, bv)),
        (ChunkData::Float(av), ChunkData::Int(bv)) => Ok(promoted_compare_rev(op, a, av, b, bv)),
        _ => ProjectionNotSupportedSnafu {
            left: a.dtype(),
            right: b.dtype(),
        }
        .fail(),
    }
}

fn build_bool(len: u32, literal: bool, vals: Vec<bool>, nullability: Option<Bitmap>) -> Chunk {
    let mut bm = Bitmap::new(vals.len() as u32);
    for (i, v) in vals.into_iter().enumerate() {
        bm.set(i as u32, v);
    }
    if literal {
        Chunk::from_parts_literal(ChunkData::Bool(bm), len)
    } else {
        Chunk::from_parts(ChunkData::Bool(bm), len, true, nullability)
    }
}

fn numeric_compare<T: Copy>(
    op: Op,
    a: &Chunk,
    av: &[T],
    b: &Chunk,
    bv: &[T],
    cmp: impl Fn(T, T) -> Ordering,
) -> Chunk {
    let len = output_len(a, b);
    let (vals, lit) = elementwise(av, a.is_literal(), bv, b.is_literal(), len, |x, y| {
        ordering_to_bool(op, cmp(x, y))
    });
    build_bool(len, lit, vals, propagate_nulls(a, b))
}

fn promoted_compare(op: Op, a: &Chunk, av: &[i64], b: &Chunk, bv: &[f64]) -> Chunk {
    let len = output_len(a, b);
    let (vals, lit) = elementwise2(av, a.is_literal(), bv, b.is_literal(), len, |x, y| {
        ordering_to_bool(op, (x as f64).partial_cmp(&y).unwrap_or(Ordering::Equal))
    });
    build_bool(len, lit, vals, propagate_nulls(a, b))
}

fn promoted_compare_rev(op: Op, a: &Chunk, av: &[f64], b: &Chunk, bv: &[i64]) -> Chunk {
    let len = output_len(a, b);
    let (vals, lit) = elementwise2(av, a.is_literal(), bv, b.is_literal(), len, |x, y| {
        ordering_to_bool(op, x.partial_cmp(&(y as f64)).unwrap_or(Ordering::Equal))
    });
    build_bool(len, lit, vals, propagate_nulls(a, b))
}

fn as_string(data: &ChunkData) -> (&[u8], &[u32]) {
    match data {
        ChunkData::String { data, offsets } => (data, offsets),
        _ => unreachable!("caller matched on ChunkData::String"),
    }
}

fn string_compare(op: Op, a: &Chunk, b: &Chunk) -> Chunk {
    let len = output_len(a, b);
    let (ad, ao) = as_string(&a.data);
    let (bd, bo) = as_string(&b.data);
    let a_lit = a.is_literal();
    let b_lit = b.is_literal();
    let slot_of = |lit: bool, i: usize| if lit { 0 } else { i };
    let slice_at = |offsets: &[u32], idx: usize| -> (u32, u32) { (offsets[idx], offsets[idx + 1]) };

    if a_lit && b_lit {
        let (as_, ae) = slice_at(ao, 0);
        let (bs, be) = slice_at(bo, 0);
        let ord = ad[as_ as usize..ae as usize].cmp(&bd[bs as usize..be as usize]);
        return build_bool(len, true, vec![ordering_to_bool(op, ord)], None);
    }

    let vals = (0..len as usize)
        .map(|i| {
            let (as_, ae) = slice_at(ao, slot_of(a_lit, i));
            let (bs, be) = slice_at(bo, slot_of(b_lit, i));
            let ord = ad[as_ as usize..ae as usize].cmp(&bd[bs as usize..be as usize]);
            ordering_to_bool(op, ord)
        })
        .collect();
    build_bool(len, false, vals, propagate_nulls(a, b))
}

fn bool_compare(op: Op, a: &Chunk, b: &Chunk, abm: &Bitmap, bbm: &Bitmap) -> Chunk {
    let len = output_len(a, b);
    if a.is_literal() && b.is_literal() {
        let mut abm_clone = abm.clone();
        let mut bbm_clone = bbm.clone();
        let ord = abm_clone.get(0).cmp(&bbm_clone.get(0));
        return build_bool(len, true, vec![ordering_to_bool(op, ord)], None);
    }
    let a_full = hydrate_bool(abm, a.is_literal(), len);
    let b_full = hydrate_bool(bbm, b.is_literal(), len);
    let result = match op {
        Op::Eq => Bitmap::word_parallel(&a_full, &b_full, |x, y| !(x ^ y)),
        Op::Neq => Bitmap::word_parallel(&a_full, &b_full, |x, y| x ^ y),
        Op::Gt => Bitmap::word_parallel(&a_full, &b_full, |x, y| x & !y),
        Op::Gte => Bitmap::word_parallel(&a_full, &b_full, |x, y| x | !y),
    };
    Chunk::from_parts(ChunkData::Bool(result), len, true, propagate_nulls(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;

    fn int_chunk(values: &[&str]) -> Chunk {
        let mut c = Chunk::from_schema(DataType::Int, false);
        for v in values {
            c.add_value(v).unwrap();
        }
        c
    }

    fn float_chunk(values: &[&str]) -> Chunk {
        let mut c = Chunk::from_schema(DataType::Float, false);
        for v in values {
            c.add_value(v).unwrap();
        }
        c
    }

    fn bools(c: &Chunk) -> Vec<bool> {
        (0..c.len()).map(|i| !c.is_null(i) && bool_at(c, i)).collect()
    }

    fn bool_at(c: &Chunk, i: u32) -> bool {
        match &c.data {
            ChunkData::Bool(bm) => bm.clone().get(if c.is_literal() { 0 } else { i }),
            _ => panic!("expected bool chunk"),
        }
    }

    #[test]
    fn eq_with_literal_matches_scenario() {
        let c1 = int_chunk(&["3", "1", "2"]);
        let c2 = Chunk::literal("1", DataType::Int, 3).unwrap();
        let result = eq(&c1, &c2).unwrap();
        assert_eq!(bools(&result), vec![false, true, false]);
    }

    #[test]
    fn gte_with_literal_matches_scenario() {
        let c1 = int_chunk(&["3", "1", "2"]);
        let c2 = Chunk::literal("1", DataType::Int, 3).unwrap();
        let result = gte(&c2, &c1).unwrap();
        assert_eq!(bools(&result), vec![false, true, true]);
    }

    #[test]
    fn mixed_int_float_eq() {
        let c1 = int_chunk(&["1", "2", "3"]);
        let c2 = float_chunk(&["1.2", "2.0", "3.0"]);
        let result = eq(&c1, &c2).unwrap();
        assert_eq!(bools(&result), vec![false, true, true]);
    }

    #[test]
    fn lt_is_gt_reversed() {
        let c1 = int_chunk(&["1", "5"]);
        let c2 = int_chunk(&["5", "1"]);
        assert_eq!(bools(&lt(&c1, &c2).unwrap()), bools(&gt(&c2, &c1).unwrap()));
    }

    #[test]
    fn string_eq() {
        let mut c1 = Chunk::from_schema(DataType::String, false);
        for v in ["a", "bb", "ccc"] {
            c1.add_value(v).unwrap();
        }
        let c2 = Chunk::literal("bb", DataType::String, 3).unwrap();
        let result = eq(&c1, &c2).unwrap();
        assert_eq!(bools(&result), vec![false, true, false]);
    }

    #[test]
    fn bool_eq_word_parallel() {
        let mut c1 = Chunk::from_schema(DataType::Bool, false);
        for v in ["true", "false", "true", "false"] {
            c1.add_value(v).unwrap();
        }
        let mut c2 = Chunk::from_schema(DataType::Bool, false);
        for v in ["true", "true", "false", "false"] {
            c2.add_value(v).unwrap();
        }
        let result = eq(&c1, &c2).unwrap();
        assert_eq!(bools(&result), vec![true, false, false, true]);
    }

    #[test]
    fn mismatched_dtypes_rejected() {
        let c1 = int_chunk(&["1"]);
        let mut c2 = Chunk::from_schema(DataType::String, false);
        c2.add_value("x").unwrap();
        assert!(eq(&c1, &c2).is_err());
    }

    #[test]
    fn null_propagates_through_comparison() {
        let mut c1 = Chunk::from_schema(DataType::Int, true);
        c1.add_value("1").unwrap();
        c1.add_value("").unwrap();
        let c2 = int_chunk(&["1", "1"]);
        let result = eq(&c1, &c2).unwrap();
        assert!(result.is_null(1));
        assert!(!result.is_null(0));
    }
}
