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

//! Compression sniffing and codecs, used both for the input byte stream
//! (`read_compression`) and, optionally, per-column stripe blocks
//! (`write_compression`).

use std::io::{Read, Write};

use snafu::prelude::*;

use crate::error::{IncompatibleOnDiskFormatSnafu, IoSnafu, Result};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Snappy,
}

impl Compression {
    /// One-byte tag written ahead of a per-column block when
    /// `write_compression` is not `none`.
    pub fn tag(self) -> u8 {
        match self {
            Compression::None => 0,
            Compression::Gzip => 1,
            Compression::Bzip2 => 2,
            Compression::Snappy => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Gzip),
            2 => Ok(Compression::Bzip2),
            3 => Ok(Compression::Snappy),
            other => IncompatibleOnDiskFormatSnafu {
                msg: format!("unknown compression tag {other}"),
            }
            .fail(),
        }
    }
}

/// Sniffs compression from the leading bytes of the input stream:
/// `{0x1f, 0x8b}` is gzip, `{0x42, 0x5A, 0x68}` ("BZh") is bzip2, else none.
/// Snappy has no stable magic-byte signature and is never auto-detected —
/// `read_compression = snappy` must be set explicitly.
pub fn sniff(bytes: &[u8]) -> Compression {
    if bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b {
        Compression::Gzip
    } else if bytes.len() >= 3 && bytes[0] == 0x42 && bytes[1] == 0x5A && bytes[2] == 0x68 {
        Compression::Bzip2
    } else {
        Compression::None
    }
}

/// Strips a leading UTF-8 BOM (`EF BB BF`) from a decompressed byte buffer.
pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    if bytes.len() >= 3 && bytes[0..3] == [0xEF, 0xBB, 0xBF] {
        &bytes[3..]
    } else {
        bytes
    }
}

pub fn decompress_all(data: &[u8], kind: Compression) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match kind {
        Compression::None => out.extend_from_slice(data),
        Compression::Gzip => {
            flate2::read::GzDecoder::new(data)
                .read_to_end(&mut out)
                .context(IoSnafu)?;
        }
        Compression::Bzip2 => {
            bzip2::read::BzDecoder::new(data)
                .read_to_end(&mut out)
                .context(IoSnafu)?;
        }
        Compression::Snappy => {
            out = snap::raw::Decoder::new().decompress_vec(data).map_err(|e| {
                IncompatibleOnDiskFormatSnafu {
                    msg: format!("snappy: {e}"),
                }
                .build()
            })?;
        }
    }
    Ok(out)
}

pub fn compress_all(data: &[u8], kind: Compression) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match kind {
        Compression::None => out.extend_from_slice(data),
        Compression::Gzip => {
            let mut enc = flate2::write::GzEncoder::new(&mut out, flate2::Compression::default());
            enc.write_all(data).context(IoSnafu)?;
            enc.finish().context(IoSnafu)?;
        }
        Compression::Bzip2 => {
            let mut enc = bzip2::write::BzEncoder::new(&mut out, bzip2::Compression::default());
            enc.write_all(data).context(IoSnafu)?;
            enc.finish().context(IoSnafu)?;
        }
        Compression::Snappy => {
            out = snap::raw::Encoder::new().compress_vec(data).map_err(|e| {
                IncompatibleOnDiskFormatSnafu {
                    msg: format!("snappy: {e}"),
                }
                .build()
            })?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_gzip_magic() {
        assert_eq!(sniff(&[0x1f, 0x8b, 0x08]), Compression::Gzip);
    }

    #[test]
    fn sniffs_bzip2_magic() {
        assert_eq!(sniff(b"BZh91AY"), Compression::Bzip2);
    }

    #[test]
    fn no_magic_is_none() {
        assert_eq!(sniff(b"foo,bar\n1,2\n"), Compression::None);
    }

    #[test]
    fn strips_bom() {
        let with_bom = [0xEF, 0xBB, 0xBF, b'a', b'b'];
        assert_eq!(strip_bom(&with_bom), b"ab");
        assert_eq!(strip_bom(b"ab"), b"ab");
    }

    #[test]
    fn gzip_round_trip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(10);
        let compressed = compress_all(&data, Compression::Gzip).unwrap();
        let back = decompress_all(&compressed, Compression::Gzip).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn snappy_round_trip() {
        let data = b"col_a,col_b,col_c\n1,2,3\n".repeat(5);
        let compressed = compress_all(&data, Compression::Snappy).unwrap();
        let back = decompress_all(&compressed, Compression::Snappy).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn bzip2_round_trip() {
        let data = b"lorem ipsum dolor sit amet".repeat(20);
        let compressed = compress_all(&data, Compression::Bzip2).unwrap();
        let back = decompress_all(&compressed, Compression::Bzip2).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn tag_round_trip() {
        for c in [
            Compression::None,
            Compression::Gzip,
            Compression::Bzip2,
            Compression::Snappy,
        ] {
            assert_eq!(Compression::from_tag(c.tag()).unwrap(), c);
        }
    }
}
