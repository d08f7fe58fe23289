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

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use stripedb::id::IdGenerator;
use stripedb::loader::{self, DelimiterSetting, LoadSettings, ReadCompression};
use stripedb::writer::WriteCompression;

#[derive(Parser)]
#[command(name = "stripedb-ingest")]
#[command(version, about = "Ingest a delimited-text file into checksummed stripes", long_about = None)]
struct Cli {
    /// Path to the input file
    input: PathBuf,

    /// Directory to write the stripe files (and schema sidecar) into
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Compression of the input stream
    #[arg(value_enum, long, default_value_t = ReadCompressionArg::Auto)]
    read_compression: ReadCompressionArg,

    /// Field delimiter
    #[arg(value_enum, long, default_value_t = DelimiterArg::Auto)]
    delimiter: DelimiterArg,

    /// Compress each column block with gzip before writing it
    #[arg(long)]
    gzip: bool,

    /// Maximum rows per stripe
    #[arg(long, default_value_t = loader::DEFAULT_MAX_ROWS_PER_STRIPE)]
    max_rows: u32,

    /// Maximum bytes per stripe
    #[arg(long, default_value_t = loader::DEFAULT_MAX_BYTES_PER_STRIPE)]
    max_bytes: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum ReadCompressionArg {
    Auto,
    None,
    Gzip,
    Bzip2,
    Snappy,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum DelimiterArg {
    Auto,
    Comma,
    Semicolon,
    Tab,
    Space,
    Pipe,
    None,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let raw = fs::read(&cli.input).with_context(|| format!("reading {}", cli.input.display()))?;

    let settings = LoadSettings {
        max_rows_per_stripe: cli.max_rows,
        max_bytes_per_stripe: cli.max_bytes,
        read_compression: match cli.read_compression {
            ReadCompressionArg::Auto => ReadCompression::Auto,
            ReadCompressionArg::None => ReadCompression::None,
            ReadCompressionArg::Gzip => ReadCompression::Gzip,
            ReadCompressionArg::Bzip2 => ReadCompression::Bzip2,
            ReadCompressionArg::Snappy => ReadCompression::Snappy,
        },
        delimiter: match cli.delimiter {
            DelimiterArg::Auto => DelimiterSetting::Auto,
            DelimiterArg::Comma => DelimiterSetting::Comma,
            DelimiterArg::Semicolon => DelimiterSetting::Semicolon,
            DelimiterArg::Tab => DelimiterSetting::Tab,
            DelimiterArg::Space => DelimiterSetting::Space,
            DelimiterArg::Pipe => DelimiterSetting::Pipe,
            DelimiterArg::None => DelimiterSetting::None,
        },
        write_compression: if cli.gzip {
            WriteCompression::Gzip
        } else {
            WriteCompression::None
        },
        schema: None,
    };

    let mut ids = IdGenerator::new();
    let result = loader::load(&raw, &settings, &mut ids)?;

    fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating {}", cli.output_dir.display()))?;

    let schema_path = cli.output_dir.join("schema.txt");
    fs::write(&schema_path, render_schema(&result.schema))
        .with_context(|| format!("writing {}", schema_path.display()))?;

    // Offsets are stripe-file-local metadata this crate hands back to its
    // caller rather than persisting itself (dataset/manifest layout is a
    // collaborator's concern, see `dataset.rs`). The CLI needs *some* place
    // to keep them between the ingest and inspect invocations, so it keeps
    // its own plain-text manifest rather than inventing an on-disk format
    // for the crate to own.
    let mut manifest = format!("compression:{}\n", if cli.gzip { "gzip" } else { "none" });
    let mut total_rows = 0u64;
    for packed in &result.stripes {
        let name = format!("{}.stripe", packed.stripe.id);
        let path = cli.output_dir.join(&name);
        fs::write(&path, &packed.bytes).with_context(|| format!("writing {}", path.display()))?;
        total_rows += packed.stripe.length as u64;
        println!(
            "wrote {} ({} rows, {} bytes)",
            name,
            packed.stripe.length,
            packed.bytes.len()
        );

        let offsets = packed
            .stripe
            .offsets
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        manifest.push_str(&format!("{} {} {}\n", packed.stripe.id, packed.stripe.length, offsets));
    }

    let manifest_path = cli.output_dir.join("manifest.txt");
    fs::write(&manifest_path, manifest)
        .with_context(|| format!("writing {}", manifest_path.display()))?;

    println!("schema: {}", result.schema);
    println!("stripes: {}", result.stripes.len());
    println!("total rows: {total_rows}");
    Ok(())
}

fn render_schema(schema: &stripedb::Schema) -> String {
    schema
        .columns()
        .iter()
        .map(|c| format!("{}:{}:{}", c.name, c.dtype, c.nullable))
        .collect::<Vec<_>>()
        .join("\n")
}
