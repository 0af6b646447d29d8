/*
 * gzip.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Staffetta, a client-side HTTP transfer engine.
 *
 * Staffetta is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Staffetta is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Staffetta.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Streaming gzip inflate for `Content-Encoding: gzip`. Sits between the
//! framing decoder and the handler, so it always sees post-framing bytes.

use std::io::{self, Write};

use flate2::write::GzDecoder;

/// Push-mode inflater: compressed bytes go in via `push`, plaintext comes
/// out through the sink callback as it becomes available.
pub(crate) struct GzipStage {
    decoder: GzDecoder<Vec<u8>>,
}

impl GzipStage {
    pub fn new() -> Self {
        Self {
            decoder: GzDecoder::new(Vec::new()),
        }
    }

    pub fn push(&mut self, data: &[u8], sink: &mut dyn FnMut(&[u8])) -> io::Result<()> {
        self.decoder.write_all(data)?;
        let out = self.decoder.get_mut();
        if !out.is_empty() {
            sink(out);
            out.clear();
        }
        Ok(())
    }

    /// Flush the trailing window. Fails on a truncated or corrupt stream.
    pub fn finish(mut self, sink: &mut dyn FnMut(&[u8])) -> io::Result<()> {
        self.decoder.try_finish()?;
        let out = self.decoder.get_mut();
        if !out.is_empty() {
            sink(out);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn inflates_in_pieces() {
        let compressed = gzip(b"hello gzip world");
        let mut stage = GzipStage::new();
        let mut out = Vec::new();
        let mut sink = |d: &[u8]| out.extend_from_slice(d);
        for piece in compressed.chunks(3) {
            stage.push(piece, &mut sink).unwrap();
        }
        stage.finish(&mut sink).unwrap();
        assert_eq!(out, b"hello gzip world");
    }

    #[test]
    fn truncated_stream_fails_on_finish() {
        let compressed = gzip(b"some longer payload to compress");
        let mut stage = GzipStage::new();
        let mut out = Vec::new();
        let mut sink = |d: &[u8]| out.extend_from_slice(d);
        stage
            .push(&compressed[..compressed.len() / 2], &mut sink)
            .unwrap();
        assert!(stage.finish(&mut sink).is_err());
    }
}
