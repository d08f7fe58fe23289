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

//! The typed column fragment: a sum type over {string, int, float, bool,
//! date, datetime, null}, dense or literal, with an optional nullability
//! bitmap.

pub mod compare;
pub mod hash;
pub mod serialize;

use chrono::NaiveDate;
use snafu::prelude::*;

use crate::bitmap::Bitmap;
use crate::error::{
    AppendTypeMismatchSnafu, InvalidDateSnafu, NoAddToLiteralSnafu, NotABoolSnafu, NotADateSnafu,
    NotADatetimeSnafu, NotAFloatSnafu, NotAnIntSnafu, NotNullSnafu, NullInNonNullableSnafu, Result,
};
use crate::schema::DataType;

/// Packs `(year, month, day, hour)` into 32 bits: `year << 14 | month << 10
/// | day << 5 | hour`.
pub fn pack_date(year: u32, month: u32, day: u32, hour: u32) -> u32 {
    (year << 14) | (month << 10) | (day << 5) | hour
}

pub fn unpack_date(packed: u32) -> (u32, u32, u32, u32) {
    let hour = packed & 0x1F;
    let day = (packed >> 5) & 0x1F;
    let month = (packed >> 10) & 0xF;
    let year = (packed >> 14) & 0x3FFFF;
    (year, month, day, hour)
}

/// Packs a datetime into 64 bits: `(date as u32) << 32 | microseconds_in_hour`.
pub fn pack_datetime(date: u32, minute: u32, second: u32, microsecond: u32) -> u64 {
    let micros_in_hour = 1_000_000u64 * (minute as u64 * 60 + second as u64) + microsecond as u64;
    ((date as u64) << 32) | micros_in_hour
}

pub fn unpack_datetime(packed: u64) -> (u32, u32, u32, u32) {
    let date = (packed >> 32) as u32;
    let micros_in_hour = packed & 0xFFFF_FFFF;
    let minute = (micros_in_hour / 1_000_000 / 60) as u32;
    let second = (micros_in_hour / 1_000_000 % 60) as u32;
    let microsecond = (micros_in_hour % 1_000_000) as u32;
    (date, minute, second, microsecond)
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ChunkData {
    String { data: Vec<u8>, offsets: Vec<u32> },
    Int(Vec<i64>),
    Float(Vec<f64>),
    Bool(Bitmap),
    Date(Vec<u32>),
    Datetime(Vec<u64>),
    Null,
}

/// A single column's worth of rows within one stripe.
#[derive(Clone, Debug)]
pub struct Chunk {
    pub(crate) length: u32,
    pub(crate) is_literal: bool,
    /// Whether this chunk's schema declares the column nullable. Literal
    /// chunks are always non-nullable.
    pub(crate) nullable: bool,
    pub(crate) nullability: Option<Bitmap>,
    pub(crate) data: ChunkData,
}

impl PartialEq for Chunk {
    /// Value-equality: compares payloads only at non-null positions.
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length || self.dtype() != other.dtype() {
            return false;
        }
        for i in 0..self.length {
            let a_null = self.is_null(i);
            let b_null = other.is_null(i);
            if a_null != b_null {
                return false;
            }
            if a_null {
                continue;
            }
            if !self.value_eq_at(other, i) {
                return false;
            }
        }
        true
    }
}

impl Chunk {
    pub fn dtype(&self) -> DataType {
        match &self.data {
            ChunkData::String { .. } => DataType::String,
            ChunkData::Int(_) => DataType::Int,
            ChunkData::Float(_) => DataType::Float,
            ChunkData::Bool(_) => DataType::Bool,
            ChunkData::Date(_) => DataType::Date,
            ChunkData::Datetime(_) => DataType::Datetime,
            ChunkData::Null => DataType::Null,
        }
    }

    pub fn len(&self) -> u32 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn is_literal(&self) -> bool {
        self.is_literal
    }

    pub fn nullability(&self) -> Option<&Bitmap> {
        self.nullability.as_ref()
    }

    /// Whether logical row `i` is null. Literal chunks are never null.
    pub fn is_null(&self, i: u32) -> bool {
        if self.is_literal {
            return false;
        }
        match &self.nullability {
            Some(bm) => {
                let mut bm = bm.clone();
                bm.get(i)
            }
            None => false,
        }
    }

    /// Maps a logical row index to its payload slot: 0 for literals, `i`
    /// otherwise.
    fn slot(&self, i: u32) -> usize {
        if self.is_literal {
            0
        } else {
            i as usize
        }
    }

    // ---- construction -----------------------------------------------

    /// Builds a dense chunk directly from payload + nullability, bypassing
    /// `add_value` parsing. Used by the evaluation kernel to assemble
    /// projection results row-by-row without re-validating text.
    pub(crate) fn from_parts(
        data: ChunkData,
        length: u32,
        nullable: bool,
        nullability: Option<Bitmap>,
    ) -> Self {
        Self {
            length,
            is_literal: false,
            nullable,
            nullability,
            data,
        }
    }

    /// Builds a literal chunk directly from a single-element payload.
    pub(crate) fn from_parts_literal(data: ChunkData, length: u32) -> Self {
        Self {
            length,
            is_literal: true,
            nullable: false,
            nullability: None,
            data,
        }
    }

    pub fn from_schema(dtype: DataType, nullable: bool) -> Self {
        let data = match dtype {
            DataType::String => ChunkData::String {
                data: Vec::new(),
                offsets: vec![0],
            },
            DataType::Int => ChunkData::Int(Vec::new()),
            DataType::Float => ChunkData::Float(Vec::new()),
            DataType::Bool => ChunkData::Bool(Bitmap::new(0)),
            DataType::Date => ChunkData::Date(Vec::new()),
            DataType::Datetime => ChunkData::Datetime(Vec::new()),
            DataType::Null | DataType::Invalid => ChunkData::Null,
        };
        Self {
            length: 0,
            is_literal: false,
            nullable,
            nullability: None,
            data,
        }
    }

    /// A single-value chunk repeated `length` times. Literals are
    /// non-nullable; an empty `value` for a non-string, non-null dtype is
    /// rejected rather than silently treated as null.
    pub fn literal(value: &str, dtype: DataType, length: u32) -> Result<Self> {
        let data = match dtype {
            DataType::String => ChunkData::String {
                data: value.as_bytes().to_vec(),
                offsets: vec![0, value.len() as u32],
            },
            DataType::Int => ChunkData::Int(vec![parse_int(value)?]),
            DataType::Float => {
                let v = parse_float_strict(value)?;
                ChunkData::Float(vec![v])
            }
            DataType::Bool => {
                let b = parse_bool(value)?;
                let mut bm = Bitmap::new(1);
                bm.set(0, b);
                ChunkData::Bool(bm)
            }
            DataType::Date => ChunkData::Date(vec![parse_date(value)?]),
            DataType::Datetime => ChunkData::Datetime(vec![parse_datetime(value)?]),
            DataType::Null | DataType::Invalid => ChunkData::Null,
        };
        Ok(Self {
            length,
            is_literal: true,
            nullable: false,
            nullability: None,
            data,
        })
    }

    /// Like [`Chunk::literal`], but first infers the dtype the same way
    /// the loader's type guesser would classify a single value.
    pub fn literal_auto(value: &str, length: u32) -> Result<Self> {
        let dtype = crate::loader::typeguess::classify_value(value);
        Self::literal(value, dtype, length)
    }

    // ---- value addition -----------------------------------------------

    pub fn add_value(&mut self, s: &str) -> Result<()> {
        ensure!(!self.is_literal, NoAddToLiteralSnafu);
        match &mut self.data {
            ChunkData::String { data, offsets } => {
                data.extend_from_slice(s.as_bytes());
                offsets.push(data.len() as u32);
                self.length += 1;
                self.extend_nullability_non_null();
            }
            ChunkData::Int(values) => {
                if s.is_empty() {
                    self.push_null_placeholder(|d| {
                        if let ChunkData::Int(v) = d {
                            v.push(0);
                        }
                    })?;
                } else {
                    let v = parse_int(s)?;
                    values.push(v);
                    self.length += 1;
                    self.extend_nullability_non_null();
                }
            }
            ChunkData::Float(values) => {
                let parsed = if s.is_empty() { None } else { parse_float(s)? };
                match parsed {
                    None => {
                        self.push_null_placeholder(|d| {
                            if let ChunkData::Float(v) = d {
                                v.push(0.0);
                            }
                        })?;
                    }
                    Some(v) => {
                        values.push(v);
                        self.length += 1;
                        self.extend_nullability_non_null();
                    }
                }
            }
            ChunkData::Bool(_) => {
                if s.is_empty() {
                    self.push_null_placeholder(|d| {
                        if let ChunkData::Bool(bm) = d {
                            let len = bm.cap();
                            bm.set(len, false);
                        }
                    })?;
                } else {
                    let v = parse_bool(s)?;
                    if let ChunkData::Bool(bm) = &mut self.data {
                        let len = bm.cap();
                        bm.set(len, v);
                    }
                    self.length += 1;
                    self.extend_nullability_non_null();
                }
            }
            ChunkData::Date(values) => {
                if s.is_empty() {
                    self.push_null_placeholder(|d| {
                        if let ChunkData::Date(v) = d {
                            v.push(0);
                        }
                    })?;
                } else {
                    let v = parse_date(s)?;
                    values.push(v);
                    self.length += 1;
                    self.extend_nullability_non_null();
                }
            }
            ChunkData::Datetime(values) => {
                if s.is_empty() {
                    self.push_null_placeholder(|d| {
                        if let ChunkData::Datetime(v) = d {
                            v.push(0);
                        }
                    })?;
                } else {
                    let v = parse_datetime(s)?;
                    values.push(v);
                    self.length += 1;
                    self.extend_nullability_non_null();
                }
            }
            ChunkData::Null => {
                ensure!(
                    s.is_empty(),
                    NotNullSnafu {
                        value: s.to_string()
                    }
                );
                self.push_null_placeholder(|_| {})?;
            }
        }
        Ok(())
    }

    fn push_null_placeholder(&mut self, push_payload: impl FnOnce(&mut ChunkData)) -> Result<()> {
        ensure!(self.nullable, NullInNonNullableSnafu);
        push_payload(&mut self.data);
        let pos = self.length;
        let bm = self.nullability.get_or_insert_with(|| Bitmap::new(pos));
        bm.set(pos, true);
        self.length += 1;
        Ok(())
    }

    /// After a non-null insertion, grows the nullability bitmap (if one
    /// exists) so its cap keeps tracking `length`.
    fn extend_nullability_non_null(&mut self) {
        if let Some(bm) = &mut self.nullability {
            bm.ensure(self.length);
        }
    }

    // ---- append ---------------------------------------------------------

    pub fn append(&mut self, other: &Chunk) -> Result<()> {
        ensure!(!self.is_literal, NoAddToLiteralSnafu);
        ensure!(
            self.dtype() == other.dtype(),
            AppendTypeMismatchSnafu {
                left: self.dtype(),
                right: other.dtype(),
            }
        );

        if self.nullability.is_none() && other.nullability_effective().is_some() {
            self.nullability = Some(Bitmap::new(self.length));
        }
        let other_nulls = other.nullability_effective();

        let old_len = self.length;
        let other_len = other.length;

        match (&mut self.data, &other.data) {
            (ChunkData::String { data, offsets }, ChunkData::String { data: od, offsets: oo }) => {
                if other.is_literal {
                    for _ in 0..other_len {
                        data.extend_from_slice(od);
                        offsets.push(data.len() as u32);
                    }
                } else {
                    let base = *offsets.last().unwrap();
                    data.extend_from_slice(od);
                    offsets.extend(oo.iter().skip(1).map(|&o| o + base));
                }
            }
            (ChunkData::Int(values), ChunkData::Int(ov)) => {
                append_payload(values, ov, other.is_literal, other_len)
            }
            (ChunkData::Float(values), ChunkData::Float(ov)) => {
                append_payload(values, ov, other.is_literal, other_len)
            }
            (ChunkData::Date(values), ChunkData::Date(ov)) => {
                append_payload(values, ov, other.is_literal, other_len)
            }
            (ChunkData::Datetime(values), ChunkData::Datetime(ov)) => {
                append_payload(values, ov, other.is_literal, other_len)
            }
            (ChunkData::Bool(bm), ChunkData::Bool(obm)) => {
                if other.is_literal {
                    let v = {
                        let mut obm = obm.clone();
                        obm.get(0)
                    };
                    for i in 0..other_len {
                        bm.set(old_len + i, v);
                    }
                } else {
                    bm.append(obm);
                }
            }
            (ChunkData::Null, ChunkData::Null) => {}
            _ => unreachable!("dtype checked above"),
        }

        if let Some(self_bm) = &mut self.nullability {
            match other_nulls {
                Some(other_bm) => {
                    if other.is_literal {
                        self_bm.ensure(old_len + other_len);
                    } else {
                        self_bm.append(&other_bm);
                    }
                }
                None => self_bm.ensure(old_len + other_len),
            }
        }

        self.length += other_len;
        Ok(())
    }

    /// A literal's single value treated as an all-zero bitmap of its
    /// logical length (literals have no nullability bitmap of their own).
    pub(crate) fn nullability_effective(&self) -> Option<Bitmap> {
        if self.is_literal {
            None
        } else {
            self.nullability.clone()
        }
    }

    // ---- prune ------------------------------------------------------

    /// Returns the rows where `mask`'s bit is 1. `mask` must have cap
    /// equal to `self.length`. Panics if called on a literal chunk.
    pub fn prune(&self, mask: Option<&Bitmap>) -> Chunk {
        assert!(!self.is_literal, "prune: literal chunks are not supported");

        let Some(mask) = mask else {
            return Chunk::from_schema(self.dtype(), self.nullable);
        };
        assert_eq!(
            mask.cap(),
            self.length,
            "prune: mask cap must equal chunk length"
        );

        let mut mask_clone = mask.clone();
        if mask_clone.count() == self.length {
            return self.clone();
        }

        let mut out = Chunk::from_schema(self.dtype(), self.nullable);
        for i in 0..self.length {
            if mask_clone.get(i) {
                self.copy_row_into(i, &mut out);
            }
        }
        out
    }

    /// Appends row `i` of `self` into `out`, which must share `self`'s
    /// dtype and must not be a literal.
    fn copy_row_into(&self, i: u32, out: &mut Chunk) {
        let is_null = self.is_null(i);
        match (&self.data, &mut out.data) {
            (ChunkData::String { data, offsets }, ChunkData::String { data: od, offsets: oo }) => {
                let start = offsets[i as usize] as usize;
                let end = offsets[i as usize + 1] as usize;
                od.extend_from_slice(&data[start..end]);
                oo.push(od.len() as u32);
            }
            (ChunkData::Int(values), ChunkData::Int(ov)) => ov.push(values[i as usize]),
            (ChunkData::Float(values), ChunkData::Float(ov)) => ov.push(values[i as usize]),
            (ChunkData::Date(values), ChunkData::Date(ov)) => ov.push(values[i as usize]),
            (ChunkData::Datetime(values), ChunkData::Datetime(ov)) => ov.push(values[i as usize]),
            (ChunkData::Bool(bm), ChunkData::Bool(obm)) => {
                let mut bm = bm.clone();
                let v = bm.get(i);
                obm.set(out.length, v);
            }
            (ChunkData::Null, ChunkData::Null) => {}
            _ => unreachable!("dtype matched by construction"),
        }
        if is_null {
            let pos = out.length;
            let bm = out.nullability.get_or_insert_with(|| Bitmap::new(pos));
            bm.set(pos, true);
        }
        if let Some(obm) = &mut out.nullability {
            obm.ensure(out.length + 1);
        }
        out.length += 1;
    }

    fn value_eq_at(&self, other: &Chunk, i: u32) -> bool {
        let a = self.slot(i);
        let b = other.slot(i);
        match (&self.data, &other.data) {
            (
                ChunkData::String { data: ad, offsets: ao },
                ChunkData::String { data: bd, offsets: bo },
            ) => ad[ao[a] as usize..ao[a + 1] as usize] == bd[bo[b] as usize..bo[b + 1] as usize],
            (ChunkData::Int(av), ChunkData::Int(bv)) => av[a] == bv[b],
            (ChunkData::Float(av), ChunkData::Float(bv)) => av[a] == bv[b],
            (ChunkData::Date(av), ChunkData::Date(bv)) => av[a] == bv[b],
            (ChunkData::Datetime(av), ChunkData::Datetime(bv)) => av[a] == bv[b],
            (ChunkData::Bool(abm), ChunkData::Bool(bbm)) => {
                let mut abm = abm.clone();
                let mut bbm = bbm.clone();
                abm.get(a as u32) == bbm.get(b as u32)
            }
            (ChunkData::Null, ChunkData::Null) => true,
            _ => false,
        }
    }
}

fn append_payload<T: Copy>(
    values: &mut Vec<T>,
    other: &[T],
    other_is_literal: bool,
    other_len: u32,
) {
    if other_is_literal {
        let v = other[0];
        values.extend(std::iter::repeat(v).take(other_len as usize));
    } else {
        values.extend_from_slice(other);
    }
}

pub(crate) fn parse_bool(s: &str) -> Result<bool> {
    match s {
        "t" | "T" | "true" | "TRUE" => Ok(true),
        "f" | "F" | "false" | "FALSE" => Ok(false),
        _ => NotABoolSnafu {
            value: s.to_string(),
        }
        .fail(),
    }
}

pub(crate) fn parse_int(s: &str) -> Result<i64> {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return NotAnIntSnafu {
            value: s.to_string(),
        }
        .fail();
    }
    let (sign, digits) = match bytes[0] {
        b'+' => (1i64, &s[1..]),
        b'-' => (-1i64, &s[1..]),
        _ => (1i64, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return NotAnIntSnafu {
            value: s.to_string(),
        }
        .fail();
    }
    digits
        .parse::<i64>()
        .map(|v| v * sign)
        .map_err(|_| NotAnIntSnafu { value: s.to_string() }.build())
}

/// Parses a float, returning `None` for NaN/Inf results (callers map that
/// to a null insertion rather than a parse error).
pub(crate) fn parse_float(s: &str) -> Result<Option<f64>> {
    let v: f64 = s
        .parse()
        .map_err(|_| NotAFloatSnafu { value: s.to_string() }.build())?;
    if v.is_nan() || v.is_infinite() {
        Ok(None)
    } else {
        Ok(Some(v))
    }
}

/// As [`parse_float`], but rejects NaN/Inf outright (used for literals,
/// which cannot be null).
pub(crate) fn parse_float_strict(s: &str) -> Result<f64> {
    match parse_float(s)? {
        Some(v) => Ok(v),
        None => NotAFloatSnafu {
            value: s.to_string(),
        }
        .fail(),
    }
}

pub(crate) fn parse_date(s: &str) -> Result<u32> {
    let (year, month, day) =
        split_date(s).ok_or_else(|| NotADateSnafu { value: s.to_string() }.build())?;
    NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| InvalidDateSnafu { value: s.to_string() }.build())?;
    Ok(pack_date(year, month, day, 0))
}

fn split_date(s: &str) -> Option<(u32, u32, u32)> {
    if s.len() != 10 || s.as_bytes()[4] != b'-' || s.as_bytes()[7] != b'-' {
        return None;
    }
    let year: u32 = s[0..4].parse().ok()?;
    let month: u32 = s[5..7].parse().ok()?;
    let day: u32 = s[8..10].parse().ok()?;
    Some((year, month, day))
}

pub(crate) fn parse_datetime(s: &str) -> Result<u64> {
    let err = || {
        NotADatetimeSnafu {
            value: s.to_string(),
        }
        .build()
    };
    if s.len() < 19 {
        return Err(err());
    }
    let (year, month, day) = split_date(&s[0..10]).ok_or_else(err)?;
    let sep = s.as_bytes()[10];
    if sep != b' ' && sep != b'T' {
        return Err(err());
    }
    let time = &s[11..];
    if time.as_bytes().get(2) != Some(&b':') || time.as_bytes().get(5) != Some(&b':') {
        return Err(err());
    }
    let hour: u32 = time.get(0..2).and_then(|v| v.parse().ok()).ok_or_else(err)?;
    let minute: u32 = time.get(3..5).and_then(|v| v.parse().ok()).ok_or_else(err)?;
    let second: u32 = time.get(6..8).and_then(|v| v.parse().ok()).ok_or_else(err)?;
    let microsecond = match time.len() {
        8 => 0u32,
        12 if time.as_bytes()[8] == b'.' => {
            time[9..12].parse::<u32>().map_err(|_| err())? * 1000
        }
        15 if time.as_bytes()[8] == b'.' => time[9..15].parse::<u32>().map_err(|_| err())?,
        _ => return Err(err()),
    };
    NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(err)?;
    chrono::NaiveTime::from_hms_micro_opt(hour, minute, second, microsecond).ok_or_else(err)?;
    let date = pack_date(year, month, day, hour);
    Ok(pack_datetime(date, minute, second, microsecond))
}
