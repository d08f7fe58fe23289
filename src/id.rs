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

//! 9-byte object identifiers: one tag byte identifying the kind of object,
//! followed by 8 random bytes. Generated from a per-instance RNG rather
//! than a hidden process-wide one, so two `IdGenerator`s never race over
//! shared state and a seeded generator reproduces the same ids in tests.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum ObjectKind {
    Dataset = 1,
    Stripe = 2,
}

#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct ObjectId([u8; 9]);

impl ObjectId {
    pub fn kind_tag(&self) -> u8 {
        self.0[0]
    }

    pub fn as_bytes(&self) -> &[u8; 9] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; 9]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({self})")
    }
}

#[derive(Debug)]
pub struct ParseObjectIdError;

impl std::str::FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 18 {
            return Err(ParseObjectIdError);
        }
        let mut bytes = [0u8; 9];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| ParseObjectIdError)?;
        }
        Ok(Self(bytes))
    }
}

/// Generates [`ObjectId`]s from a per-instance RNG. Hold one of these on a
/// `Database` (or any owner of object identity), rather than seeding a
/// global RNG at process startup.
pub struct IdGenerator {
    rng: StdRng,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next(&mut self, kind: ObjectKind) -> ObjectId {
        let mut bytes = [0u8; 9];
        bytes[0] = kind as u8;
        self.rng.fill(&mut bytes[1..]);
        ObjectId(bytes)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
