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

//! Ingest pipeline: raw byte stream -> compression detector -> decompressor
//! -> BOM stripper -> header row -> CSV row iterator -> (pass 1) type
//! guesser -> (pass 2) per-column chunk builders -> stripe packer. The
//! first row of the (decompressed, BOM-stripped) body is always the
//! column-name header, consumed once and excluded from both inference and
//! packing; an explicit schema compares its names against the header
//! instead of inferring from it. The whole input is read into memory up
//! front, so both passes iterate the same in-memory buffer rather than
//! re-reading a stream.

pub mod sniff;
pub mod typeguess;

use snafu::prelude::*;

use crate::compression::{self, Compression};
use crate::error::{InvalidLoadSettingsSnafu, Result, SchemaMismatchSnafu};
use crate::id::{IdGenerator, ObjectKind};
use crate::schema::{Column, Schema};
use crate::writer::{PackedStripe, StripeWriter, WriteCompression};
use typeguess::TypeGuesser;

pub const DEFAULT_MAX_ROWS_PER_STRIPE: u32 = 100_000;
pub const DEFAULT_MAX_BYTES_PER_STRIPE: u64 = 10_000_000;

/// How to decide the input stream's compression. `Auto` sniffs magic
/// bytes; snappy has none and must be requested explicitly.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadCompression {
    Auto,
    None,
    Gzip,
    Bzip2,
    Snappy,
}

/// How to decide the field delimiter. `Auto` sniffs it from the first two
/// records; `None` treats every line as one unnamed column.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DelimiterSetting {
    Auto,
    Comma,
    Semicolon,
    Tab,
    Space,
    Pipe,
    None,
}

impl DelimiterSetting {
    fn as_byte(self) -> Option<u8> {
        match self {
            DelimiterSetting::Comma => Some(b','),
            DelimiterSetting::Semicolon => Some(b';'),
            DelimiterSetting::Tab => Some(b'\t'),
            DelimiterSetting::Space => Some(b' '),
            DelimiterSetting::Pipe => Some(b'|'),
            DelimiterSetting::None | DelimiterSetting::Auto => None,
        }
    }
}

/// Ingest configuration.
#[derive(Clone, Debug)]
pub struct LoadSettings {
    pub max_rows_per_stripe: u32,
    pub max_bytes_per_stripe: u64,
    pub read_compression: ReadCompression,
    pub delimiter: DelimiterSetting,
    pub write_compression: WriteCompression,
    /// When set, inference is skipped and this schema is enforced instead.
    pub schema: Option<Schema>,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            max_rows_per_stripe: DEFAULT_MAX_ROWS_PER_STRIPE,
            max_bytes_per_stripe: DEFAULT_MAX_BYTES_PER_STRIPE,
            read_compression: ReadCompression::Auto,
            delimiter: DelimiterSetting::Auto,
            write_compression: WriteCompression::None,
            schema: None,
        }
    }
}

impl LoadSettings {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.max_rows_per_stripe > 0,
            InvalidLoadSettingsSnafu {
                msg: "max_rows_per_stripe must be positive".to_string()
            }
        );
        ensure!(
            self.max_bytes_per_stripe > 0,
            InvalidLoadSettingsSnafu {
                msg: "max_bytes_per_stripe must be positive".to_string()
            }
        );
        Ok(())
    }
}

/// Result of one ingest run: the (possibly inferred) schema and every
/// stripe packed from the input.
pub struct LoadResult {
    pub schema: Schema,
    pub stripes: Vec<PackedStripe>,
}

/// Ingests one delimited-text byte stream, producing a schema and a
/// sequence of packed stripes. `ids` mints the [`crate::id::ObjectId`] for
/// each stripe produced.
pub fn load(raw: &[u8], settings: &LoadSettings, ids: &mut IdGenerator) -> Result<LoadResult> {
    settings.validate()?;

    let stream_compression = match settings.read_compression {
        ReadCompression::Auto => compression::sniff(raw),
        ReadCompression::None => Compression::None,
        ReadCompression::Gzip => Compression::Gzip,
        ReadCompression::Bzip2 => Compression::Bzip2,
        ReadCompression::Snappy => Compression::Snappy,
    };
    log::debug!("ingest: {} input bytes, compression {:?}", raw.len(), stream_compression);
    let decompressed = compression::decompress_all(raw, stream_compression)?;
    let body = compression::strip_bom(&decompressed).to_vec();

    let delimiter = match settings.delimiter {
        DelimiterSetting::Auto => sniff::sniff_delimiter(&body),
        other => other.as_byte(),
    };
    if delimiter.is_none() && !body.is_empty() {
        log::debug!("ingest: no delimiter sniffed, treating input as a single column");
    }

    let header = read_header(&body, delimiter)?;

    let schema = match &settings.schema {
        Some(explicit) => {
            if let Some(delim) = delimiter {
                if let Some(field_count) = sniff::probe_field_count(&body, delim) {
                    ensure!(
                        field_count == explicit.len(),
                        SchemaMismatchSnafu {
                            expected: format!("{} columns", explicit.len()),
                            actual: format!("{field_count} columns"),
                        }
                    );
                }
            }
            if let Some(header_fields) = &header {
                let expected: Vec<&str> = explicit.columns().iter().map(|c| c.name.as_str()).collect();
                let actual: Vec<&str> = header_fields.iter().map(String::as_str).collect();
                ensure!(
                    actual == expected,
                    SchemaMismatchSnafu {
                        expected: expected.join(","),
                        actual: actual.join(","),
                    }
                );
            }
            explicit.clone()
        }
        None => infer_schema(&body, delimiter, header.as_deref().unwrap_or(&[]))?,
    };

    pack_stripes(&body, delimiter, &schema, settings, ids)
}

/// Reads the first row of `body` as column names, the way every row after
/// it is split by `delimiter`. `None` when the input has no rows at all.
fn read_header(body: &[u8], delimiter: Option<u8>) -> Result<Option<Vec<String>>> {
    let mut header = None;
    for_each_row_including_header(body, delimiter, |fields, _row_bytes| {
        if header.is_none() {
            header = Some(fields.iter().map(|s| s.to_string()).collect());
        }
        Ok(())
    })?;
    Ok(header)
}

/// Runs `f` once per row, passing the row's fields and the number of input
/// bytes that row consumed (used to track `max_bytes_per_stripe`). The
/// first row is always the column-name header and is skipped — callers
/// that need it use [`read_header`] instead.
fn for_each_row(
    body: &[u8],
    delimiter: Option<u8>,
    mut f: impl FnMut(&[&str], u64) -> Result<()>,
) -> Result<()> {
    let mut is_header = true;
    for_each_row_including_header(body, delimiter, |fields, row_bytes| {
        if is_header {
            is_header = false;
            return Ok(());
        }
        f(fields, row_bytes)
    })
}

/// As [`for_each_row`], but does not skip the header row — used by
/// [`read_header`] and [`for_each_row`] itself.
fn for_each_row_including_header(
    body: &[u8],
    delimiter: Option<u8>,
    mut f: impl FnMut(&[&str], u64) -> Result<()>,
) -> Result<()> {
    match delimiter {
        Some(delim) => {
            let mut reader = csv::ReaderBuilder::new()
                .delimiter(delim)
                .has_headers(false)
                .flexible(true)
                .from_reader(body);
            let mut record = csv::StringRecord::new();
            let mut prev_bytes = 0u64;
            loop {
                let has_record = reader
                    .read_record(&mut record)
                    .map_err(|e| crate::error::CsvSnafu { msg: e.to_string() }.build())?;
                if !has_record {
                    break;
                }
                let now_bytes = reader.position().byte();
                let row_bytes = now_bytes - prev_bytes;
                prev_bytes = now_bytes;
                let fields: Vec<&str> = record.iter().collect();
                f(&fields, row_bytes)?;
            }
        }
        None => {
            let text = std::str::from_utf8(body)
                .map_err(|e| crate::error::CsvSnafu { msg: e.to_string() }.build())?;
            for line in text.lines() {
                f(&[line], line.len() as u64 + 1)?;
            }
        }
    }
    Ok(())
}

fn infer_schema(body: &[u8], delimiter: Option<u8>, header: &[String]) -> Result<Schema> {
    let mut guessers: Vec<TypeGuesser> = Vec::new();
    for_each_row(body, delimiter, |fields, _row_bytes| {
        if guessers.len() < fields.len() {
            guessers.resize_with(fields.len(), TypeGuesser::new);
        }
        // A short row's missing trailing fields are nulls, not absent
        // observations — backfill them the same way `StripeWriter::add_row`
        // does, so a ragged column doesn't silently end up non-nullable.
        for (index, guesser) in guessers.iter_mut().enumerate() {
            let value = fields.get(index).copied().unwrap_or("");
            guesser.observe(value);
        }
        Ok(())
    })?;

    let columns = guessers
        .into_iter()
        .enumerate()
        .map(|(index, guesser)| {
            let (dtype, nullable) = guesser.finalize();
            let name = header
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("col{index}"));
            Column::new(name, dtype, nullable)
        })
        .collect();
    Ok(Schema::new(columns))
}

fn pack_stripes(
    body: &[u8],
    delimiter: Option<u8>,
    schema: &Schema,
    settings: &LoadSettings,
    ids: &mut IdGenerator,
) -> Result<LoadResult> {
    let mut writer = StripeWriter::new(schema, settings.write_compression);
    let mut stripes = Vec::new();
    let mut row_count = 0u32;
    let mut byte_count = 0u64;

    if !schema.is_empty() {
        for_each_row(body, delimiter, |fields, row_bytes| {
            writer.add_row(fields)?;
            row_count += 1;
            byte_count += row_bytes;
            if row_count >= settings.max_rows_per_stripe || byte_count >= settings.max_bytes_per_stripe {
                let packed = writer.finish(ids.next(ObjectKind::Stripe))?;
                log::debug!(
                    "flushed stripe {} ({} rows, {} bytes)",
                    packed.stripe.id,
                    packed.stripe.length,
                    packed.bytes.len()
                );
                stripes.push(packed);
                row_count = 0;
                byte_count = 0;
            }
            Ok(())
        })?;

        if writer.row_count() > 0 {
            let packed = writer.finish(ids.next(ObjectKind::Stripe))?;
            log::debug!(
                "flushed final stripe {} ({} rows, {} bytes)",
                packed.stripe.id,
                packed.stripe.length,
                packed.bytes.len()
            );
            stripes.push(packed);
        }
    }

    Ok(LoadResult {
        schema: schema.clone(),
        stripes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;

    #[test]
    fn empty_input_yields_zero_stripes() {
        let mut ids = IdGenerator::from_seed(100);
        let result = load(b"", &LoadSettings::default(), &mut ids).unwrap();
        assert!(result.schema.is_empty());
        assert!(result.stripes.is_empty());
    }

    #[test]
    fn infers_schema_and_packs_one_stripe() {
        // spec.md §8.2 scenario 1, verbatim.
        let mut ids = IdGenerator::from_seed(101);
        let csv = b"foo,bar,baz\n1,true,1.23\n1444,,1e8\n";
        let result = load(csv, &LoadSettings::default(), &mut ids).unwrap();
        assert_eq!(result.schema.len(), 3);
        assert_eq!(result.schema.column(0).unwrap().name, "foo");
        assert_eq!(result.schema.column(0).unwrap().dtype, DataType::Int);
        assert!(!result.schema.column(0).unwrap().nullable);
        assert_eq!(result.schema.column(1).unwrap().name, "bar");
        assert_eq!(result.schema.column(1).unwrap().dtype, DataType::Bool);
        assert!(result.schema.column(1).unwrap().nullable);
        assert_eq!(result.schema.column(2).unwrap().name, "baz");
        assert_eq!(result.schema.column(2).unwrap().dtype, DataType::Float);
        assert!(!result.schema.column(2).unwrap().nullable);
        assert_eq!(result.stripes.len(), 1);
        assert_eq!(result.stripes[0].stripe.length, 2);
    }

    #[test]
    fn respects_max_rows_per_stripe() {
        let mut ids = IdGenerator::from_seed(102);
        let mut settings = LoadSettings::default();
        settings.max_rows_per_stripe = 2;
        let csv = b"n\n1\n2\n3\n4\n5\n";
        let result = load(csv, &settings, &mut ids).unwrap();
        assert_eq!(result.stripes.len(), 3);
        assert_eq!(result.stripes[0].stripe.length, 2);
        assert_eq!(result.stripes[1].stripe.length, 2);
        assert_eq!(result.stripes[2].stripe.length, 1);
    }

    #[test]
    fn single_column_input_has_no_delimiter() {
        let mut ids = IdGenerator::from_seed(103);
        let text = b"name\nalpha\nbeta\ngamma\n";
        let result = load(text, &LoadSettings::default(), &mut ids).unwrap();
        assert_eq!(result.schema.len(), 1);
        assert_eq!(result.schema.column(0).unwrap().name, "name");
        assert_eq!(result.schema.column(0).unwrap().dtype, DataType::String);
        assert_eq!(result.stripes[0].stripe.length, 3);
    }

    #[test]
    fn malformed_short_row_is_tolerated() {
        let mut ids = IdGenerator::from_seed(104);
        let csv = b"a,b,c\n1,2,3\n4,5\n";
        let result = load(csv, &LoadSettings::default(), &mut ids).unwrap();
        assert_eq!(result.stripes[0].stripe.length, 2);
    }

    #[test]
    fn explicit_schema_skips_inference() {
        let mut ids = IdGenerator::from_seed(105);
        let schema = Schema::new(vec![Column::new("n", DataType::Int, false)]);
        let mut settings = LoadSettings::default();
        settings.schema = Some(schema.clone());
        let result = load(b"n\n10\n20\n30\n", &settings, &mut ids).unwrap();
        assert_eq!(result.schema, schema);
        assert_eq!(result.stripes[0].stripe.length, 3);
    }

    #[test]
    fn explicit_schema_rejects_header_name_mismatch() {
        let mut ids = IdGenerator::from_seed(107);
        let schema = Schema::new(vec![Column::new("n", DataType::Int, false)]);
        let mut settings = LoadSettings::default();
        settings.schema = Some(schema);
        assert!(load(b"not_n\n10\n20\n", &settings, &mut ids).is_err());
    }

    #[test]
    fn rejects_zero_max_rows() {
        let mut ids = IdGenerator::from_seed(106);
        let mut settings = LoadSettings::default();
        settings.max_rows_per_stripe = 0;
        assert!(load(b"n\n1\n", &settings, &mut ids).is_err());
    }
}
