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

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Parser;
use stripedb::id::ObjectId;
use stripedb::reader::StripeReader;
use stripedb::{Column, DataType, Schema, Stripe};

#[derive(Parser)]
#[command(name = "stripedb-inspect")]
#[command(version, about = "Print schema, row counts and per-column nullability for ingested stripes", long_about = None)]
struct Cli {
    /// Directory produced by stripedb-ingest (holds schema.txt, manifest.txt, *.stripe)
    dir: PathBuf,

    /// Only print the stripe whose id matches this hex string
    #[arg(long)]
    stripe: Option<String>,
}

fn parse_schema(text: &str) -> Result<Schema> {
    let mut columns = Vec::new();
    for line in text.lines() {
        let mut parts = line.splitn(3, ':');
        let name = parts.next().context("missing column name")?;
        let dtype = parts.next().context("missing column dtype")?;
        let nullable = parts.next().context("missing column nullable flag")?;
        let dtype = match dtype {
            "string" => DataType::String,
            "int" => DataType::Int,
            "float" => DataType::Float,
            "bool" => DataType::Bool,
            "date" => DataType::Date,
            "datetime" => DataType::Datetime,
            "null" => DataType::Null,
            other => bail!("unknown dtype {other}"),
        };
        columns.push(Column::new(name, dtype, nullable == "true"));
    }
    Ok(Schema::new(columns))
}

struct ManifestEntry {
    id: ObjectId,
    length: u32,
    offsets: Vec<u64>,
}

fn parse_manifest(text: &str) -> Result<(bool, Vec<ManifestEntry>)> {
    let mut lines = text.lines();
    let header = lines.next().context("empty manifest")?;
    let write_compressed = match header.strip_prefix("compression:") {
        Some("gzip") => true,
        Some("none") => false,
        _ => bail!("malformed manifest header: {header}"),
    };

    let mut entries = Vec::new();
    for line in lines {
        let mut parts = line.split(' ');
        let id = parts.next().context("missing stripe id")?;
        let length = parts.next().context("missing stripe length")?;
        let offsets = parts.next().context("missing stripe offsets")?;
        entries.push(ManifestEntry {
            id: ObjectId::from_str(id).map_err(|_| anyhow::anyhow!("bad stripe id {id}"))?,
            length: length.parse().context("bad stripe length")?,
            offsets: offsets
                .split(',')
                .map(|s| s.parse::<u64>())
                .collect::<std::result::Result<_, _>>()
                .context("bad stripe offsets")?,
        });
    }
    Ok((write_compressed, entries))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let schema_text = fs::read_to_string(cli.dir.join("schema.txt")).context("reading schema.txt")?;
    let schema = parse_schema(&schema_text)?;

    let manifest_text =
        fs::read_to_string(cli.dir.join("manifest.txt")).context("reading manifest.txt")?;
    let (write_compressed, entries) = parse_manifest(&manifest_text)?;

    println!("schema: {schema}");
    println!("stripes: {}", entries.len());

    for entry in &entries {
        let id_text = entry.id.to_string();
        if let Some(wanted) = &cli.stripe {
            if &id_text != wanted {
                continue;
            }
        }

        let path = cli.dir.join(format!("{id_text}.stripe"));
        let bytes: bytes::Bytes = fs::read(&path)
            .with_context(|| format!("reading {}", path.display()))?
            .into();
        let stripe = Stripe::new(entry.id, entry.length, entry.offsets.clone());
        let reader = StripeReader::new(&bytes, &stripe, &schema, write_compressed);
        reader.validate()?;

        println!("\n=== stripe {id_text} ===");
        println!("rows: {}", stripe.length);
        for (index, column) in schema.columns().iter().enumerate() {
            let chunk = reader.read_column(index)?;
            let null_count = (0..chunk.len()).filter(|&i| chunk.is_null(i)).count();
            println!(
                "  {}: {} (nulls: {}/{})",
                column.name,
                column.dtype,
                null_count,
                chunk.len()
            );
        }
    }

    Ok(())
}
