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

//! Per-column type inference. A [`TypeGuesser`] watches a stream of
//! raw field values for one column and, once every row has been observed,
//! settles on a single dtype plus nullability. Classification order is
//! bool, int, float, date, datetime, string — the first parse that succeeds
//! wins. Once a column has produced a string value it stops classifying
//! ("once string, always string"): later values are just tallied as string
//! without re-running the parse ladder.

use crate::chunk::{parse_bool, parse_date, parse_datetime, parse_float, parse_int};
use crate::schema::DataType;

#[derive(Clone, Copy, Debug, Default)]
struct Counts {
    null: u64,
    bool_: u64,
    int: u64,
    float: u64,
    date: u64,
    datetime: u64,
    string: u64,
}

/// Accumulates per-column observations across one inference pass over the
/// input rows.
#[derive(Clone, Debug, Default)]
pub struct TypeGuesser {
    counts: Counts,
    string_seen: bool,
    rows: u64,
}

impl TypeGuesser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one raw field value. An empty string is always treated as
    /// null, regardless of the dtype the column eventually settles on.
    pub fn observe(&mut self, value: &str) {
        self.rows += 1;
        if value.is_empty() {
            self.counts.null += 1;
            return;
        }
        if self.string_seen {
            self.counts.string += 1;
            return;
        }
        match classify_value(value) {
            DataType::Bool => self.counts.bool_ += 1,
            DataType::Int => self.counts.int += 1,
            DataType::Float => self.counts.float += 1,
            DataType::Date => self.counts.date += 1,
            DataType::Datetime => self.counts.datetime += 1,
            DataType::String => {
                self.string_seen = true;
                self.counts.string += 1;
            }
            DataType::Null | DataType::Invalid => {
                unreachable!("classify_value never returns Null/Invalid")
            }
        }
    }

    /// Settles on a final `(dtype, nullable)` once every row has been
    /// observed. Zero rows seen is reported as `(Invalid, true)` — the
    /// caller (the loader) treats a column stuck at `Invalid` as evidence
    /// the whole input was empty and skips packing any stripes.
    pub fn finalize(&self) -> (DataType, bool) {
        if self.rows == 0 {
            return (DataType::Invalid, true);
        }
        let nullable = self.counts.null > 0;
        let non_null_rows = self.rows - self.counts.null;
        if non_null_rows == 0 {
            return (DataType::Null, true);
        }

        let observed: Vec<DataType> = [
            (self.counts.bool_, DataType::Bool),
            (self.counts.int, DataType::Int),
            (self.counts.float, DataType::Float),
            (self.counts.date, DataType::Date),
            (self.counts.datetime, DataType::Datetime),
            (self.counts.string, DataType::String),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(_, dtype)| dtype)
        .collect();

        match observed.as_slice() {
            [single] => (*single, nullable),
            multiple if multiple.iter().all(|d| d.is_numeric()) => (DataType::Float, nullable),
            _ => (DataType::String, nullable),
        }
    }
}

/// Classifies one non-empty value, trying bool, int, float, date, and
/// datetime in order and falling back to string.
pub fn classify_value(value: &str) -> DataType {
    if parse_bool(value).is_ok() {
        DataType::Bool
    } else if parse_int(value).is_ok() {
        DataType::Int
    } else if matches!(parse_float(value), Ok(Some(_))) {
        DataType::Float
    } else if parse_date(value).is_ok() {
        DataType::Date
    } else if parse_datetime(value).is_ok() {
        DataType::Datetime
    } else {
        DataType::String
    }
}
