//! An embedded, columnar, append-only store: a delimited-text file goes in,
//! type-inferred, checksummed stripes of typed columns come out, and a
//! small vectorized kernel evaluates comparisons/arithmetic over them
//! without ever decoding a column back into row-oriented values.
//!
//! - [`bitmap`] — word-packed bitmaps, the nullability/boolean primitive
//!   everything else is built from.
//! - [`chunk`] — a single typed column fragment: literal or dense, with or
//!   without nulls.
//! - [`schema`] / [`dataset`] — the (name, dtype, nullable) column
//!   description and the stripe/dataset metadata built from it.
//! - [`loader`] — CSV ingest: sniffing, type inference, stripe packing.
//! - [`writer`] / [`reader`] — the checksummed on-disk stripe format.
//! - [`kernel`] — vectorized comparison/arithmetic/logical projections.

pub mod bitmap;
pub mod chunk;
pub mod compression;
pub mod dataset;
pub mod error;
pub mod id;
pub mod kernel;
pub mod loader;
pub mod reader;
pub mod schema;
pub mod writer;

pub use bitmap::Bitmap;
pub use chunk::Chunk;
pub use dataset::{Dataset, Stripe};
pub use error::{Result, StoreError};
pub use id::{IdGenerator, ObjectId, ObjectKind};
pub use schema::{Column, DataType, Schema};
