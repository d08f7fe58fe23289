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

//! Row-level ordering within a single chunk.

use std::cmp::Ordering;

use super::{Chunk, ChunkData};

impl Chunk {
    /// Compares rows `i` and `j`. Literals always compare equal. If
    /// exactly one of the two rows is null, it sorts first or last per
    /// `nulls_first` (the non-null direction still respects `ascending`).
    /// Otherwise uses natural ordering (`false < true` for bool).
    pub fn compare(&self, ascending: bool, nulls_first: bool, i: u32, j: u32) -> i32 {
        if self.is_literal {
            return 0;
        }
        let i_null = self.is_null(i);
        let j_null = self.is_null(j);
        if i_null && j_null {
            return 0;
        }
        if i_null || j_null {
            let null_first_wins = if i_null { -1 } else { 1 };
            return if nulls_first {
                null_first_wins
            } else {
                -null_first_wins
            };
        }

        let ord = self.natural_order(i, j);
        let signed = match ord {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        };
        if ascending {
            signed
        } else {
            -signed
        }
    }

    fn natural_order(&self, i: u32, j: u32) -> Ordering {
        match &self.data {
            ChunkData::String { data, offsets } => {
                let (ia, ib) = (offsets[i as usize] as usize, offsets[i as usize + 1] as usize);
                let (ja, jb) = (offsets[j as usize] as usize, offsets[j as usize + 1] as usize);
                data[ia..ib].cmp(&data[ja..jb])
            }
            ChunkData::Int(values) => values[i as usize].cmp(&values[j as usize]),
            ChunkData::Float(values) => values[i as usize]
                .partial_cmp(&values[j as usize])
                .unwrap_or(Ordering::Equal),
            ChunkData::Date(values) => values[i as usize].cmp(&values[j as usize]),
            ChunkData::Datetime(values) => values[i as usize].cmp(&values[j as usize]),
            ChunkData::Bool(bm) => {
                let mut bm = bm.clone();
                bm.get(i).cmp(&bm.get(j))
            }
            ChunkData::Null => Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;

    #[test]
    fn literal_always_equal() {
        let c = Chunk::literal("1", DataType::Int, 5).unwrap();
        assert_eq!(c.compare(true, true, 0, 4), 0);
    }

    #[test]
    fn ascending_natural_order() {
        let mut c = Chunk::from_schema(DataType::Int, false);
        c.add_value("3").unwrap();
        c.add_value("1").unwrap();
        assert_eq!(c.compare(true, true, 0, 1), 1);
        assert_eq!(c.compare(false, true, 0, 1), -1);
    }

    #[test]
    fn nulls_first_and_last() {
        let mut c = Chunk::from_schema(DataType::Int, true);
        c.add_value("1").unwrap();
        c.add_value("").unwrap();
        assert_eq!(c.compare(true, true, 0, 1), 1);
        assert_eq!(c.compare(true, false, 0, 1), -1);
    }

    #[test]
    fn both_null_equal() {
        let mut c = Chunk::from_schema(DataType::Int, true);
        c.add_value("").unwrap();
        c.add_value("").unwrap();
        assert_eq!(c.compare(true, true, 0, 1), 0);
    }

    #[test]
    fn bool_false_before_true() {
        let mut c = Chunk::from_schema(DataType::Bool, false);
        c.add_value("false").unwrap();
        c.add_value("true").unwrap();
        assert_eq!(c.compare(true, true, 0, 1), -1);
    }
}
