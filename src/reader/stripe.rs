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

//! Reads one column at a time out of a packed stripe file, verifying the
//! checksum ahead of every block before trusting its bytes to [`Chunk::read`].

use snafu::prelude::*;

use super::ChunkReader;
use crate::chunk::Chunk;
use crate::compression::{self, Compression};
use crate::dataset::Stripe;
use crate::error::{IncorrectChecksumSnafu, InvalidOffsetDataSnafu, IoSnafu, Result};
use crate::schema::Schema;

/// Reads columns out of one stripe file. `write_compressed` must match
/// whatever `write_compression` the stripe was packed with — that setting
/// lives on the dataset's load configuration, outside this crate's stripe
/// format, so the caller is responsible for passing it through.
pub struct StripeReader<'a, R: ChunkReader> {
    source: &'a R,
    stripe: &'a Stripe,
    schema: &'a Schema,
    write_compressed: bool,
}

impl<'a, R: ChunkReader> StripeReader<'a, R> {
    pub fn new(source: &'a R, stripe: &'a Stripe, schema: &'a Schema, write_compressed: bool) -> Self {
        Self {
            source,
            stripe,
            schema,
            write_compressed,
        }
    }

    /// Validates the stripe's offset table against the schema's column
    /// count and the source's actual length.
    pub fn validate(&self) -> Result<()> {
        self.stripe
            .validate(self.schema.len(), ChunkReader::len(self.source))
    }

    /// Reads and decodes column `index`. Column reads do not need to happen
    /// in order — each one seeks to its own byte range independently.
    pub fn read_column(&self, index: usize) -> Result<Chunk> {
        let (start, end) = self.stripe.column_range(index).ok_or_else(|| {
            InvalidOffsetDataSnafu {
                msg: format!("stripe has no column {index}"),
            }
            .build()
        })?;
        let column = self.schema.column(index).ok_or_else(|| {
            InvalidOffsetDataSnafu {
                msg: format!("schema has no column {index}"),
            }
            .build()
        })?;

        let block = self
            .source
            .get_bytes(start, end - start)
            .context(IoSnafu)?;
        ensure!(
            block.len() >= 4,
            InvalidOffsetDataSnafu {
                msg: "column block smaller than its checksum header".to_string()
            }
        );

        let expected_checksum = u32::from_le_bytes((&block[0..4]).try_into().unwrap());
        let payload = &block[4..];
        let actual_checksum = crc32fast::hash(payload);
        if actual_checksum != expected_checksum {
            log::warn!(
                "column {index} checksum mismatch: expected {expected_checksum:#x}, got {actual_checksum:#x}"
            );
        }
        ensure!(
            actual_checksum == expected_checksum,
            IncorrectChecksumSnafu {
                expected: expected_checksum,
                actual: actual_checksum,
            }
        );

        let decoded = if self.write_compressed {
            ensure!(
                !payload.is_empty(),
                InvalidOffsetDataSnafu {
                    msg: "compressed column block missing its tag byte".to_string()
                }
            );
            let kind = Compression::from_tag(payload[0])?;
            compression::decompress_all(&payload[1..], kind)?
        } else {
            payload.to_vec()
        };

        let mut cursor = &decoded[..];
        Chunk::read(&mut cursor, column.dtype, column.nullable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{IdGenerator, ObjectKind};
    use crate::schema::{Column, DataType};
    use crate::writer::{StripeWriter, WriteCompression};

    fn schema() -> Schema {
        Schema::new(vec![
            Column::new("a", DataType::Int, false),
            Column::new("b", DataType::String, true),
        ])
    }

    #[test]
    fn round_trips_uncompressed_stripe() {
        let schema = schema();
        let mut writer = StripeWriter::new(&schema, WriteCompression::None);
        writer.add_row(&["1", "hello"]).unwrap();
        writer.add_row(&["2", ""]).unwrap();
        writer.add_row(&["3", "world"]).unwrap();
        let mut gen = IdGenerator::from_seed(21);
        let packed = writer.finish(gen.next(ObjectKind::Stripe)).unwrap();

        let bytes = bytes::Bytes::from(packed.bytes);
        let reader = StripeReader::new(&bytes, &packed.stripe, &schema, false);
        reader.validate().unwrap();

        let a = reader.read_column(0).unwrap();
        assert_eq!(a.len(), 3);
        let b = reader.read_column(1).unwrap();
        assert_eq!(b.len(), 3);
        assert!(b.is_null(1));
    }

    #[test]
    fn round_trips_gzip_compressed_stripe() {
        let schema = schema();
        let mut writer = StripeWriter::new(&schema, WriteCompression::Gzip);
        for i in 0..20 {
            writer.add_row(&[&i.to_string(), "value value value"]).unwrap();
        }
        let mut gen = IdGenerator::from_seed(22);
        let packed = writer.finish(gen.next(ObjectKind::Stripe)).unwrap();

        let bytes = bytes::Bytes::from(packed.bytes);
        let reader = StripeReader::new(&bytes, &packed.stripe, &schema, true);
        let a = reader.read_column(0).unwrap();
        assert_eq!(a.len(), 20);
    }

    #[test]
    fn corrupted_block_fails_checksum() {
        let schema = schema();
        let mut writer = StripeWriter::new(&schema, WriteCompression::None);
        writer.add_row(&["1", "hello"]).unwrap();
        let mut gen = IdGenerator::from_seed(23);
        let packed = writer.finish(gen.next(ObjectKind::Stripe)).unwrap();

        let mut corrupted = packed.bytes.clone();
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0xFF;

        let bytes = bytes::Bytes::from(corrupted);
        let reader = StripeReader::new(&bytes, &packed.stripe, &schema, false);
        assert!(reader.read_column(1).is_err());
    }

    #[test]
    fn round_trips_through_a_file_on_disk() {
        use std::io::Write;

        let schema = schema();
        let mut writer = StripeWriter::new(&schema, WriteCompression::None);
        writer.add_row(&["1", "hello"]).unwrap();
        writer.add_row(&["2", "world"]).unwrap();
        let mut gen = IdGenerator::from_seed(24);
        let packed = writer.finish(gen.next(ObjectKind::Stripe)).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&packed.bytes).unwrap();
        file.flush().unwrap();

        let reader = StripeReader::new(file.as_file(), &packed.stripe, &schema, false);
        reader.validate().unwrap();
        let a = reader.read_column(0).unwrap();
        assert_eq!(a.len(), 2);
    }
}
