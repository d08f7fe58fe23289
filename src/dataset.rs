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

//! Stripe and Dataset metadata. Stripes are append-only and never
//! rewritten; the filesystem layout that holds their files is a collaborator
//! out of this crate's scope — these types only describe offsets within a
//! single stripe file and the sequence of stripes a dataset owns.

use snafu::prelude::*;

use crate::error::{InvalidOffsetDataSnafu, Result};
use crate::id::ObjectId;
use crate::schema::Schema;

/// `(id, length, offsets)`. `offsets` has `schema.len() + 1` entries: column
/// *i* occupies byte range `[offsets[i], offsets[i+1])` within the stripe
/// file. `offsets[0] == 0` and `offsets[last] == file_size`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stripe {
    pub id: ObjectId,
    pub length: u32,
    pub offsets: Vec<u64>,
}

impl Stripe {
    pub fn new(id: ObjectId, length: u32, offsets: Vec<u64>) -> Self {
        Self { id, length, offsets }
    }

    pub fn num_columns(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Byte range of column `index` within the stripe file.
    pub fn column_range(&self, index: usize) -> Option<(u64, u64)> {
        let start = *self.offsets.get(index)?;
        let end = *self.offsets.get(index + 1)?;
        Some((start, end))
    }

    /// Checks the offset-table invariants: one entry per column plus a
    /// trailing sentinel, strictly increasing, starting at zero and ending
    /// at `file_size`, with each column block large enough to hold at least
    /// its checksum header.
    pub fn validate(&self, num_columns: usize, file_size: u64) -> Result<()> {
        ensure!(
            self.offsets.len() == num_columns + 1,
            InvalidOffsetDataSnafu {
                msg: format!(
                    "expected {} offsets, got {}",
                    num_columns + 1,
                    self.offsets.len()
                )
            }
        );
        ensure!(
            self.offsets.first() == Some(&0),
            InvalidOffsetDataSnafu {
                msg: "offset table must start at 0".to_string()
            }
        );
        ensure!(
            self.offsets.last() == Some(&file_size),
            InvalidOffsetDataSnafu {
                msg: "offset table must end at the file size".to_string()
            }
        );
        for window in self.offsets.windows(2) {
            ensure!(
                window[1] >= window[0] + 4,
                InvalidOffsetDataSnafu {
                    msg: format!(
                        "column block [{}, {}) too small for a checksum header",
                        window[0], window[1]
                    )
                }
            );
        }
        Ok(())
    }
}

/// `(id, name, schema, stripes)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Dataset {
    pub id: ObjectId,
    pub name: String,
    pub schema: Schema,
    pub stripes: Vec<Stripe>,
}

impl Dataset {
    pub fn new(id: ObjectId, name: impl Into<String>, schema: Schema) -> Self {
        Self {
            id,
            name: name.into(),
            schema,
            stripes: Vec::new(),
        }
    }

    pub fn total_rows(&self) -> u64 {
        self.stripes.iter().map(|s| s.length as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{IdGenerator, ObjectKind};
    use crate::schema::{Column, DataType};

    #[test]
    fn column_range_from_offsets() {
        let mut gen = IdGenerator::from_seed(1);
        let stripe = Stripe::new(gen.next(ObjectKind::Stripe), 10, vec![0, 12, 30, 45]);
        assert_eq!(stripe.num_columns(), 3);
        assert_eq!(stripe.column_range(1), Some((12, 30)));
        assert_eq!(stripe.column_range(3), None);
    }

    #[test]
    fn validate_rejects_bad_offsets() {
        let mut gen = IdGenerator::from_seed(3);
        let ok = Stripe::new(gen.next(ObjectKind::Stripe), 10, vec![0, 20, 40]);
        assert!(ok.validate(2, 40).is_ok());

        let wrong_end = Stripe::new(gen.next(ObjectKind::Stripe), 10, vec![0, 20, 39]);
        assert!(wrong_end.validate(2, 40).is_err());

        let too_small = Stripe::new(gen.next(ObjectKind::Stripe), 10, vec![0, 2, 40]);
        assert!(too_small.validate(2, 40).is_err());
    }

    #[test]
    fn dataset_total_rows_sums_stripes() {
        let mut gen = IdGenerator::from_seed(2);
        let schema = Schema::new(vec![Column::new("a", DataType::Int, false)]);
        let mut ds = Dataset::new(gen.next(ObjectKind::Dataset), "events", schema);
        ds.stripes.push(Stripe::new(gen.next(ObjectKind::Stripe), 100, vec![0, 20]));
        ds.stripes.push(Stripe::new(gen.next(ObjectKind::Stripe), 50, vec![0, 20]));
        assert_eq!(ds.total_rows(), 150);
    }
}
