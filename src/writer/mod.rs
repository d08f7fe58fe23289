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

//! Stripe packing. [`stripe::StripeWriter`] is the whole surface — there is
//! no separate per-column encoder here, unlike ORC's dictionary and RLE
//! column encoders: a chunk already is its own compact on-disk encoding, so
//! packing a stripe is just "serialize each column, checksum it,
//! concatenate".

pub mod stripe;

pub use stripe::{PackedStripe, StripeWriter, WriteCompression};
