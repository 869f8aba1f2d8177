//! I/O utilities for reading delimited sources and writing query output.
//!
//! - **Encoding**: raw bytes are decoded through `encoding_rs`, trying an
//!   ordered list of candidates and keeping the first that decodes cleanly.
//! - **Delimiter resolution**: `.tsv` inputs read as tab-separated, everything
//!   else as comma-separated.
//! - **Reader/writer construction**: `open_csv_reader` for decoded text,
//!   `open_output` and `open_csv_writer` for output to a file or stdout.

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::Encoding;
use log::debug;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_input_delimiter(path: &Path) -> u8 {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

/// Opens `path` for writing, or stdout when it is absent or `-`.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    })
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let base = open_output(path)?;
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(base))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

/// Text decoded by [`decode_with_fallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
    /// Number of candidates tried, including the successful one.
    pub attempts: usize,
}

/// Decodes `bytes` with each candidate in order and returns the first clean
/// decode. Candidates after the first success are never tried.
pub fn decode_with_fallback(
    bytes: &[u8],
    candidates: &[&'static Encoding],
) -> Option<DecodedText> {
    for (idx, encoding) in candidates.iter().copied().enumerate() {
        match decode_bytes(bytes, encoding) {
            Ok(text) => {
                return Some(DecodedText {
                    text,
                    encoding,
                    attempts: idx + 1,
                });
            }
            Err(err) => debug!("{err}; trying next candidate"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{ISO_8859_15, SHIFT_JIS, UTF_8, WINDOWS_1252};

    #[test]
    fn decode_with_fallback_stops_at_first_success() {
        // 0xE9 is 'é' in windows-1252 but an invalid lone byte in UTF-8.
        let bytes = b"name\nJos\xe9\n";
        let decoded = decode_with_fallback(bytes, &[UTF_8, WINDOWS_1252, ISO_8859_15]).unwrap();
        assert_eq!(decoded.encoding, WINDOWS_1252);
        assert_eq!(decoded.attempts, 2);
        assert_eq!(decoded.text, "name\nJosé\n");
    }

    #[test]
    fn decode_with_fallback_uses_first_candidate_when_valid() {
        let decoded = decode_with_fallback("café".as_bytes(), &[UTF_8, WINDOWS_1252]).unwrap();
        assert_eq!(decoded.encoding, UTF_8);
        assert_eq!(decoded.attempts, 1);
    }

    #[test]
    fn decode_with_fallback_reports_exhaustion() {
        // A truncated multi-byte sequence is invalid in both candidates.
        assert!(decode_with_fallback(b"\xe9", &[UTF_8, SHIFT_JIS]).is_none());
    }

    #[test]
    fn latin1_label_names_windows_1252() {
        assert_eq!(Encoding::for_label(b"iso-8859-1"), Some(WINDOWS_1252));
        assert_eq!(Encoding::for_label(b"cp1252"), Some(WINDOWS_1252));
    }

    #[test]
    fn tsv_extension_selects_tab_delimiter() {
        assert_eq!(resolve_input_delimiter(Path::new("rates.tsv")), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("rates.csv")), b',');
    }
}
