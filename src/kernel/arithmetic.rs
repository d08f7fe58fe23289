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

//! `add`, `subtract`, `multiply`, `divide` over Int/Float, with promotion
//! when the two inputs disagree. `divide` always returns Float, even for
//! Int/Int. Integer arithmetic wraps on overflow; float results that come
//! out NaN or infinite (overflow, division by zero) are converted to nulls
//! rather than stored, since a `Chunk`'s Float payload never holds NaN/Inf.

use snafu::prelude::*;

use super::{elementwise, elementwise2, output_len, propagate_nulls};
use crate::bitmap::{self, Bitmap};
use crate::chunk::{Chunk, ChunkData};
use crate::error::{ProjectionNotSupportedSnafu, Result};

fn build_int(len: u32, literal: bool, vals: Vec<i64>, nullability: Option<Bitmap>) -> Chunk {
    if literal {
        Chunk::from_parts_literal(ChunkData::Int(vals), len)
    } else {
        Chunk::from_parts(ChunkData::Int(vals), len, true, nullability)
    }
}

/// Builds a Float result, converting any NaN/Inf slot to null. A literal
/// candidate whose single value is NaN/Inf cannot stay literal (literals
/// are never null) — it is instead broadcast to a dense, all-null chunk of
/// the logical length.
fn build_float_checked(len: u32, literal: bool, mut vals: Vec<f64>, nullability: Option<Bitmap>) -> Chunk {
    if literal {
        if vals[0].is_finite() {
            return Chunk::from_parts_literal(ChunkData::Float(vals), len);
        }
        let mut bm = Bitmap::new(len);
        for i in 0..len {
            bm.set(i, true);
        }
        return Chunk::from_parts(ChunkData::Float(vec![0.0; len as usize]), len, true, Some(bm));
    }

    let mut overflow_nulls: Option<Bitmap> = None;
    for (i, v) in vals.iter_mut().enumerate() {
        if !v.is_finite() {
            let bm = overflow_nulls.get_or_insert_with(|| Bitmap::new(len));
            bm.set(i as u32, true);
            *v = 0.0;
        }
    }
    let merged = bitmap::or_opt(nullability.as_ref(), overflow_nulls.as_ref());
    Chunk::from_parts(ChunkData::Float(vals), len, true, merged)
}

pub fn add(a: &Chunk, b: &Chunk) -> Result<Chunk> {
    dispatch(
        a,
        b,
        |x, y| x.wrapping_add(y),
        |x, y| x + y,
        |x: i64, y: f64| x as f64 + y,
        |x: f64, y: i64| x + y as f64,
    )
}

pub fn multiply(a: &Chunk, b: &Chunk) -> Result<Chunk> {
    dispatch(
        a,
        b,
        |x, y| x.wrapping_mul(y),
        |x, y| x * y,
        |x: i64, y: f64| x as f64 * y,
        |x: f64, y: i64| x * y as f64,
    )
}

pub fn subtract(a: &Chunk, b: &Chunk) -> Result<Chunk> {
    dispatch(
        a,
        b,
        |x, y| x.wrapping_sub(y),
        |x, y| x - y,
        |x: i64, y: f64| x as f64 - y,
        |x: f64, y: i64| x - y as f64,
    )
}

pub fn divide(a: &Chunk, b: &Chunk) -> Result<Chunk> {
    let len = output_len(a, b);
    let nulls = propagate_nulls(a, b);
    match (&a.data, &b.data) {
        (ChunkData::Int(av), ChunkData::Int(bv)) => {
            let (vals, lit) = elementwise(av, a.is_literal(), bv, b.is_literal(), len, |x, y| {
                x as f64 / y as f64
            });
            Ok(build_float_checked(len, lit, vals, nulls))
        }
        (ChunkData::Float(av), ChunkData::Float(bv)) => {
            let (vals, lit) = elementwise(av, a.is_literal(), bv, b.is_literal(), len, |x, y| x / y);
            Ok(build_float_checked(len, lit, vals, nulls))
        }
        (ChunkData::Int(av), ChunkData::Float(bv)) => {
            let (vals, lit) = elementwise2(av, a.is_literal(), bv, b.is_literal(), len, |x, y| {
                x as f64 / y
            });
            Ok(build_float_checked(len, lit, vals, nulls))
        }
        (ChunkData::Float(av), ChunkData::Int(bv)) => {
            let (vals, lit) = elementwise2(av, a.is_literal(), bv, b.is_literal(), len, |x, y| {
                x / y as f64
            });
            Ok(build_float_checked(len, lit, vals, nulls))
        }
        _ => ProjectionNotSupportedSnafu {
            left: a.dtype(),
            right: b.dtype(),
        }
        .fail(),
    }
}

/// Shared dispatch for the three commutative-shaped ops (`add`, `multiply`,
/// `subtract` — subtract isn't commutative but still only needs one
/// same-type path per side plus the two promoting paths given here).
fn dispatch(
    a: &Chunk,
    b: &Chunk,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
    promote_if: impl Fn(i64, f64) -> f64,
    promote_fi: impl Fn(f64, i64) -> f64,
) -> Result<Chunk> {
    let len = output_len(a, b);
    let nulls = propagate_nulls(a, b);
    match (&a.data, &b.data) {
        (ChunkData::Int(av), ChunkData::Int(bv)) => {
            let (vals, lit) = elementwise(av, a.is_literal(), bv, b.is_literal(), len, int_op);
            Ok(build_int(len, lit, vals, nulls))
        }
        (ChunkData::Float(av), ChunkData::Float(bv)) => {
            let (vals, lit) = elementwise(av, a.is_literal(), bv, b.is_literal(), len, float_op);
            Ok(build_float_checked(len, lit, vals, nulls))
        }
        (ChunkData::Int(av), ChunkData::Float(bv)) => {
            let (vals, lit) = elementwise2(av, a.is_literal(), bv, b.is_literal(), len, promote_if);
            Ok(build_float_checked(len, lit, vals, nulls))
        }
        (ChunkData::Float(av), ChunkData::Int(bv)) => {
            let (vals, lit) = elementwise2(av, a.is_literal(), bv, b.is_literal(), len, promote_fi);
            Ok(build_float_checked(len, lit, vals, nulls))
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

    fn floats(c: &Chunk) -> Vec<f64> {
        match &c.data {
            ChunkData::Float(v) => {
                if c.is_literal() {
                    vec![v[0]; c.len() as usize]
                } else {
                    v.clone()
                }
            }
            _ => panic!("expected float chunk"),
        }
    }

    #[test]
    fn add_promotion_matches_scenario() {
        let lit = Chunk::literal("34", DataType::Int, 3).unwrap();
        let f = float_chunk(&["4", "5.5", "6.2"]);
        let result = add(&lit, &f).unwrap();
        assert_eq!(floats(&result), vec![38.0, 39.5, 40.2]);
    }

    #[test]
    fn add_is_commutative() {
        let a = int_chunk(&["1", "2", "3"]);
        let b = float_chunk(&["4.0", "5.0", "6.0"]);
        assert_eq!(floats(&add(&a, &b).unwrap()), floats(&add(&b, &a).unwrap()));
    }

    #[test]
    fn multiply_is_commutative() {
        let a = int_chunk(&["2", "3"]);
        let b = int_chunk(&["5", "7"]);
        let ab = multiply(&a, &b).unwrap();
        let ba = multiply(&b, &a).unwrap();
        match (&ab.data, &ba.data) {
            (ChunkData::Int(x), ChunkData::Int(y)) => assert_eq!(x, y),
            _ => panic!("expected int chunks"),
        }
    }

    #[test]
    fn subtract_is_antisymmetric() {
        let a = int_chunk(&["10", "3"]);
        let b = int_chunk(&["4", "8"]);
        let ab = subtract(&a, &b).unwrap();
        let ba = subtract(&b, &a).unwrap();
        match (&ab.data, &ba.data) {
            (ChunkData::Int(x), ChunkData::Int(y)) => {
                for (x, y) in x.iter().zip(y.iter()) {
                    assert_eq!(*x, -*y);
                }
            }
            _ => panic!("expected int chunks"),
        }
    }

    #[test]
    fn divide_always_returns_float() {
        let a = int_chunk(&["7", "9"]);
        let b = int_chunk(&["2", "3"]);
        let result = divide(&a, &b).unwrap();
        assert_eq!(result.dtype(), DataType::Float);
        assert_eq!(floats(&result), vec![3.5, 3.0]);
    }

    #[test]
    fn divide_by_zero_becomes_null() {
        let a = float_chunk(&["1.0", "2.0"]);
        let b = float_chunk(&["0.0", "2.0"]);
        let result = divide(&a, &b).unwrap();
        assert!(result.is_null(0));
        assert!(!result.is_null(1));
    }

    #[test]
    fn divide_both_literal_zero_is_dense_null_broadcast() {
        let a = Chunk::literal("1", DataType::Int, 4).unwrap();
        let b = Chunk::literal("0", DataType::Int, 4).unwrap();
        let result = divide(&a, &b).unwrap();
        assert!(!result.is_literal());
        assert_eq!(result.len(), 4);
        for i in 0..4 {
            assert!(result.is_null(i));
        }
    }

    #[test]
    fn int_overflow_wraps_without_error() {
        let a = Chunk::literal(&i64::MAX.to_string(), DataType::Int, 1).unwrap();
        let b = Chunk::literal("1", DataType::Int, 1).unwrap();
        let result = add(&a, &b).unwrap();
        match &result.data {
            ChunkData::Int(v) => assert_eq!(v[0], i64::MIN),
            _ => panic!("expected int chunk"),
        }
    }

    #[test]
    fn mismatched_dtype_rejected() {
        let a = int_chunk(&["1"]);
        let mut b = Chunk::from_schema(DataType::String, false);
        b.add_value("x").unwrap();
        assert!(add(&a, &b).is_err());
    }
}
