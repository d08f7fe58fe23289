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

//! Binary on-disk layout for a chunk. A serialized chunk's dtype is not
//! embedded in the block — the caller supplies the expected dtype from
//! the dataset schema at read time. Literal chunks cannot be serialized.

use std::io::{self, Read, Write};

use snafu::prelude::*;

use super::{Chunk, ChunkData};
use crate::bitmap::{self, Bitmap};
use crate::error::{IoSnafu, LiteralsCannotBeSerialisedSnafu, Result};
use crate::schema::DataType;

fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i64<R: Read>(r: &mut R) -> io::Result<i64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

fn read_f64<R: Read>(r: &mut R) -> io::Result<f64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

impl Chunk {
    /// Writes this chunk's payload per the per-type layout table. Errors
    /// if called on a literal chunk.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        ensure!(!self.is_literal, LiteralsCannotBeSerialisedSnafu);
        self.write_inner(w).context(IoSnafu)
    }

    fn write_inner<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match &self.data {
            ChunkData::String { data, offsets } => {
                bitmap::write_opt(self.nullability.as_ref(), w)?;
                w.write_all(&(offsets.len() as u32).to_le_bytes())?;
                for o in offsets {
                    w.write_all(&o.to_le_bytes())?;
                }
                w.write_all(&(data.len() as u32).to_le_bytes())?;
                w.write_all(data)?;
            }
            ChunkData::Int(values) => {
                bitmap::write_opt(self.nullability.as_ref(), w)?;
                w.write_all(&(values.len() as u32).to_le_bytes())?;
                for v in values {
                    w.write_all(&v.to_le_bytes())?;
                }
            }
            ChunkData::Float(values) => {
                bitmap::write_opt(self.nullability.as_ref(), w)?;
                w.write_all(&(values.len() as u32).to_le_bytes())?;
                for v in values {
                    w.write_all(&v.to_le_bytes())?;
                }
            }
            ChunkData::Bool(bm) => {
                bitmap::write_opt(self.nullability.as_ref(), w)?;
                w.write_all(&self.length.to_le_bytes())?;
                bm.write(w)?;
            }
            ChunkData::Date(values) => {
                bitmap::write_opt(self.nullability.as_ref(), w)?;
                w.write_all(&(values.len() as u32).to_le_bytes())?;
                for v in values {
                    w.write_all(&v.to_le_bytes())?;
                }
            }
            ChunkData::Datetime(values) => {
                bitmap::write_opt(self.nullability.as_ref(), w)?;
                w.write_all(&(values.len() as u32).to_le_bytes())?;
                for v in values {
                    w.write_all(&v.to_le_bytes())?;
                }
            }
            ChunkData::Null => {
                w.write_all(&self.length.to_le_bytes())?;
            }
        }
        Ok(())
    }

    /// Reads a dense chunk of `dtype`, nullable per `nullable`, from `r`.
    pub fn read<R: Read>(r: &mut R, dtype: DataType, nullable: bool) -> Result<Chunk> {
        Self::read_inner(r, dtype, nullable).context(IoSnafu)
    }

    fn read_inner<R: Read>(r: &mut R, dtype: DataType, nullable: bool) -> io::Result<Chunk> {
        let (data, nullability, length) = match dtype {
            DataType::String => {
                let nullability = Bitmap::read(r)?;
                let offsets_len = read_u32(r)? as usize;
                let mut offsets = Vec::with_capacity(offsets_len);
                for _ in 0..offsets_len {
                    offsets.push(read_u32(r)?);
                }
                let data_len = read_u32(r)? as usize;
                let mut data = vec![0u8; data_len];
                r.read_exact(&mut data)?;
                let length = (offsets_len.saturating_sub(1)) as u32;
                (ChunkData::String { data, offsets }, nullability, length)
            }
            DataType::Int => {
                let nullability = Bitmap::read(r)?;
                let n = read_u32(r)?;
                let mut values = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    values.push(read_i64(r)?);
                }
                (ChunkData::Int(values), nullability, n)
            }
            DataType::Float => {
                let nullability = Bitmap::read(r)?;
                let n = read_u32(r)?;
                let mut values = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    values.push(read_f64(r)?);
                }
                (ChunkData::Float(values), nullability, n)
            }
            DataType::Bool => {
                let nullability = Bitmap::read(r)?;
                let length = read_u32(r)?;
                let bm = Bitmap::read(r)?.unwrap_or_else(|| Bitmap::new(length));
                (ChunkData::Bool(bm), nullability, length)
            }
            DataType::Date => {
                let nullability = Bitmap::read(r)?;
                let n = read_u32(r)?;
                let mut values = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    values.push(read_u32(r)?);
                }
                (ChunkData::Date(values), nullability, n)
            }
            DataType::Datetime => {
                let nullability = Bitmap::read(r)?;
                let n = read_u32(r)?;
                let mut values = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    values.push(read_u64(r)?);
                }
                (ChunkData::Datetime(values), nullability, n)
            }
            DataType::Null | DataType::Invalid => {
                let length = read_u32(r)?;
                (ChunkData::Null, None, length)
            }
        };
        Ok(Chunk {
            length,
            is_literal: false,
            nullable,
            nullability,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn round_trip(c: &Chunk) -> Chunk {
        let mut buf = Vec::new();
        c.write(&mut buf).unwrap();
        let mut cursor = &buf[..];
        Chunk::read(&mut cursor, c.dtype(), c.nullable).unwrap()
    }

    #[test]
    fn string_round_trip() {
        let mut c = Chunk::from_schema(DataType::String, false);
        for v in ["foo", "", "barbaz"] {
            c.add_value(v).unwrap();
        }
        assert_eq!(round_trip(&c), c);
    }

    #[test]
    fn nullable_int_round_trip() {
        let mut c = Chunk::from_schema(DataType::Int, true);
        for v in ["1", "", "3"] {
            c.add_value(v).unwrap();
        }
        assert_eq!(round_trip(&c), c);
    }

    #[test]
    fn bool_round_trip() {
        let mut c = Chunk::from_schema(DataType::Bool, false);
        for v in ["true", "false", "true"] {
            c.add_value(v).unwrap();
        }
        assert_eq!(round_trip(&c), c);
    }

    #[test]
    fn null_dtype_round_trip() {
        let mut c = Chunk::from_schema(DataType::Null, true);
        c.add_value("").unwrap();
        c.add_value("").unwrap();
        assert_eq!(round_trip(&c), c);
    }

    #[test]
    fn literal_cannot_be_serialized() {
        let c = Chunk::literal("1", DataType::Int, 3).unwrap();
        let mut buf = Vec::new();
        assert!(c.write(&mut buf).is_err());
    }
}
