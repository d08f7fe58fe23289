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

//! Delimiter sniffing. Compression sniffing and BOM stripping live
//! in [`crate::compression`]; this module only picks the field delimiter
//! for a decompressed, BOM-free byte buffer.

/// Candidates tried in order: comma, semicolon, tab, space, pipe.
const CANDIDATES: [u8; 5] = [b',', b';', b'\t', b' ', b'|'];

/// Picks a delimiter by trying each candidate against the first two
/// records of `body`: the first candidate that splits both records into
/// the same number of fields, with more than one field, wins. If none do,
/// falls back to whichever candidate byte appears most often in the buffer.
/// Returns `None` when no candidate appears at all — the caller should then
/// treat the input as a single unnamed column, one row per line.
pub fn sniff_delimiter(body: &[u8]) -> Option<u8> {
    for &delim in &CANDIDATES {
        if let Some(n) = probe_field_count(body, delim) {
            if n > 1 {
                return Some(delim);
            }
        }
    }

    let mut best: Option<(u8, usize)> = None;
    for &delim in &CANDIDATES {
        let count = body.iter().filter(|&&b| b == delim).count();
        if count > 0 && best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((delim, count));
        }
    }
    best.map(|(delim, _)| delim)
}

/// Parses the first two records of `body` with delimiter `delim` and
/// returns their shared field count, or `None` if they disagree or there
/// are fewer than two records.
pub fn probe_field_count(body: &[u8], delim: u8) -> Option<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .from_reader(body);
    let mut records = reader.records();
    let first = records.next()?.ok()?;
    let second = records.next()?.ok()?;
    (first.len() == second.len()).then_some(first.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_comma() {
        assert_eq!(sniff_delimiter(b"a,b,c\n1,2,3\n"), Some(b','));
    }

    #[test]
    fn sniffs_semicolon_when_comma_absent() {
        assert_eq!(sniff_delimiter(b"a;b;c\n1;2;3\n"), Some(b';'));
    }

    #[test]
    fn sniffs_pipe() {
        assert_eq!(sniff_delimiter(b"a|b\n1|2\n"), Some(b'|'));
    }

    #[test]
    fn single_column_has_no_delimiter() {
        assert_eq!(sniff_delimiter(b"alpha\nbeta\ngamma\n"), None);
    }

    #[test]
    fn prefers_comma_over_tab_when_both_present_and_consistent() {
        assert_eq!(sniff_delimiter(b"a,b\tc\n1,2\t3\n"), Some(b','));
    }

    #[test]
    fn probe_field_count_reports_mismatch_as_none() {
        assert_eq!(probe_field_count(b"a,b,c\n1,2\n", b','), None);
    }
}
