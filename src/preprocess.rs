//! Input preprocessing: how a build-time line becomes the bytes that get
//! hashed (spec §4.1). This is a property of the build invocation, not of
//! the file format — only post-hash buckets are ever stored.

use crate::error::Error;

/// How to turn a line of input text into bytes before hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Use the line's bytes as-is.
    Raw,
    /// Decode the line as hex digits into bytes first.
    Hex,
}

/// Apply `mode` to one input line, tagging any failure with `line` (1-based).
///
/// `line` should already have its trailing newline stripped by the caller
/// (reading and splitting the input file is the CLI's job, not the core's —
/// see spec §1).
pub fn decode_line(mode: InputMode, line: &str, line_no: u64) -> Result<Vec<u8>, Error> {
    match mode {
        InputMode::Raw => Ok(line.as_bytes().to_vec()),
        InputMode::Hex => {
            if line.len() % 2 != 0 {
                return Err(Error::BadInputLine {
                    line: line_no,
                    reason: format!("odd-length hex string ({} chars)", line.len()),
                });
            }
            hex::decode(line).map_err(|e| Error::BadInputLine {
                line: line_no,
                reason: format!("invalid hex: {e}"),
            })
        }
    }
}
