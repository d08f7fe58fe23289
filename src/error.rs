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

use snafu::prelude::*;
use snafu::Location;

use crate::schema::DataType;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    #[snafu(display("Failed to read/write, source: {}", source))]
    IoError {
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("not a bool: {:?}", value))]
    NotABool {
        value: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("not an int: {:?}", value))]
    NotAnInt {
        value: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("not a float: {:?}", value))]
    NotAFloat {
        value: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("not a date: {:?}", value))]
    NotADate {
        value: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("not a datetime: {:?}", value))]
    NotADatetime {
        value: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("not an empty string, cannot add to a null-typed column: {:?}", value))]
    NotNull {
        value: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("invalid date: {:?}", value))]
    InvalidDate {
        value: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("schema mismatch: expected {:?}, got {:?}", expected, actual))]
    SchemaMismatch {
        expected: String,
        actual: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("invalid typed literal {:?} for {:?}", value, dtype))]
    InvalidTypedLiteral {
        value: String,
        dtype: DataType,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("unknown dtype tag on deserialize: {}", tag))]
    UnknownDtype {
        tag: u8,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot append: dtype mismatch ({:?} vs {:?})", left, right))]
    AppendTypeMismatch {
        left: DataType,
        right: DataType,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot add values to a literal chunk"))]
    NoAddToLiteral {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("literal chunks cannot be serialised"))]
    LiteralsCannotBeSerialised {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("null value for non-nullable column"))]
    NullInNonNullable {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("incorrect checksum: expected {:#010x}, got {:#010x}", expected, actual))]
    IncorrectChecksum {
        expected: u32,
        actual: u32,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("invalid offset data: {}", msg))]
    InvalidOffsetData {
        msg: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("incompatible on-disk format: {}", msg))]
    IncompatibleOnDiskFormat {
        msg: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("projection not supported for {:?} {:?}", left, right))]
    ProjectionNotSupported {
        left: DataType,
        right: DataType,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("invalid load settings: {}", msg))]
    InvalidLoadSettings {
        msg: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("no map data"))]
    NoMapData {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("length mismatch: expected {}, got {}", expected, actual))]
    LengthMismatch {
        expected: usize,
        actual: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("csv parse error: {}", msg))]
    CsvError {
        msg: String,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
