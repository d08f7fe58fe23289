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

//! Packs a run of rows into one checksummed stripe file. Each column is
//! serialized independently, optionally compressed with a one-byte tag
//! ahead of the payload, then prefixed with a CRC32 over everything that
//! follows it (tag included, when present).

use crc32fast::Hasher;

use crate::chunk::Chunk;
use crate::compression::{self, Compression};
use crate::dataset::Stripe;
use crate::error::Result;
use crate::id::ObjectId;
use crate::schema::Schema;

/// The write-side half of [`Compression`] — stripe blocks only ever need
/// `none` or `gzip`; bzip2/snappy are read-only formats we must be able to
/// decode but never choose to produce ourselves.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteCompression {
    None,
    Gzip,
}

impl WriteCompression {
    fn as_codec(self) -> Compression {
        match self {
            WriteCompression::None => Compression::None,
            WriteCompression::Gzip => Compression::Gzip,
        }
    }
}

/// A stripe's packed bytes plus the offset metadata describing them.
pub struct PackedStripe {
    pub stripe: Stripe,
    pub bytes: Vec<u8>,
}

/// Accumulates one column [`Chunk`] per schema column and packs them into a
/// stripe once the caller decides the stripe is full.
pub struct StripeWriter<'a> {
    schema: &'a Schema,
    write_compression: WriteCompression,
    builders: Vec<Chunk>,
}

impl<'a> StripeWriter<'a> {
    pub fn new(schema: &'a Schema, write_compression: WriteCompression) -> Self {
        let builders = schema
            .columns()
            .iter()
            .map(|c| Chunk::from_schema(c.dtype, c.nullable))
            .collect();
        Self {
            schema,
            write_compression,
            builders,
        }
    }

    /// Number of rows accumulated so far in the current (unflushed) stripe.
    pub fn row_count(&self) -> u32 {
        self.builders.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Appends one row. Missing trailing fields (a short row) are recorded
    /// as empty/null; extra trailing fields (a long row) are ignored —
    /// both are how a malformed row is tolerated rather than rejected.
    pub fn add_row(&mut self, fields: &[&str]) -> Result<()> {
        for (index, builder) in self.builders.iter_mut().enumerate() {
            let value = fields.get(index).copied().unwrap_or("");
            builder.add_value(value)?;
        }
        Ok(())
    }

    /// Serializes and checksums every column, concatenating them into one
    /// stripe file and resetting the writer for the next stripe.
    pub fn finish(&mut self, id: ObjectId) -> Result<PackedStripe> {
        let length = self.row_count();
        let mut bytes = Vec::new();
        let mut offsets = Vec::with_capacity(self.builders.len() + 1);
        offsets.push(0u64);

        for builder in &self.builders {
            let mut block = Vec::new();
            builder.write(&mut block)?;

            let payload = match self.write_compression {
                WriteCompression::None => block,
                WriteCompression::Gzip => {
                    let codec = self.write_compression.as_codec();
                    let compressed = compression::compress_all(&block, codec)?;
                    let mut tagged = Vec::with_capacity(compressed.len() + 1);
                    tagged.push(codec.tag());
                    tagged.extend(compressed);
                    tagged
                }
            };

            let mut hasher = Hasher::new();
            hasher.update(&payload);
            let checksum = hasher.finalize();

            bytes.extend_from_slice(&checksum.to_le_bytes());
            bytes.extend_from_slice(&payload);
            offsets.push(bytes.len() as u64);
        }

        for (builder, column) in self.builders.iter_mut().zip(self.schema.columns()) {
            *builder = Chunk::from_schema(column.dtype, column.nullable);
        }

        Ok(PackedStripe {
            stripe: Stripe::new(id, length, offsets),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{IdGenerator, ObjectKind};
    use crate::schema::{Column, DataType};

    fn schema() -> Schema {
        Schema::new(vec![
            Column::new("a", DataType::Int, false),
            Column::new("b", DataType::String, true),
        ])
    }

    #[test]
    fn finish_produces_checksummed_offsets_matching_file_size() {
        let schema = schema();
        let mut writer = StripeWriter::new(&schema, WriteCompression::None);
        writer.add_row(&["1", "hello"]).unwrap();
        writer.add_row(&["2", ""]).unwrap();
        let mut gen = IdGenerator::from_seed(9);
        let packed = writer.finish(gen.next(ObjectKind::Stripe)).unwrap();

        assert_eq!(packed.stripe.length, 2);
        assert_eq!(packed.stripe.offsets.len(), 3);
        assert_eq!(packed.stripe.offsets[0], 0);
        assert_eq!(*packed.stripe.offsets.last().unwrap(), packed.bytes.len() as u64);
        packed.stripe.validate(2, packed.bytes.len() as u64).unwrap();
    }

    #[test]
    fn finish_resets_the_writer_for_the_next_stripe() {
        let schema = schema();
        let mut writer = StripeWriter::new(&schema, WriteCompression::None);
        writer.add_row(&["1", "x"]).unwrap();
        let mut gen = IdGenerator::from_seed(10);
        writer.finish(gen.next(ObjectKind::Stripe)).unwrap();
        assert_eq!(writer.row_count(), 0);
    }

    #[test]
    fn gzip_compressed_block_carries_a_leading_tag_byte() {
        let schema = schema();
        let mut writer = StripeWriter::new(&schema, WriteCompression::Gzip);
        for i in 0..50 {
            writer.add_row(&[&i.to_string(), "repeated value repeated value"]).unwrap();
        }
        let mut gen = IdGenerator::from_seed(11);
        let packed = writer.finish(gen.next(ObjectKind::Stripe)).unwrap();
        let (start, end) = packed.stripe.column_range(1).unwrap();
        let payload = &packed.bytes[(start as usize + 4)..end as usize];
        assert_eq!(payload[0], Compression::Gzip.tag());
    }

    #[test]
    fn short_row_fills_missing_fields_with_null() {
        let schema = schema();
        let mut writer = StripeWriter::new(&schema, WriteCompression::None);
        writer.add_row(&["1"]).unwrap();
        assert_eq!(writer.row_count(), 1);
    }
}
