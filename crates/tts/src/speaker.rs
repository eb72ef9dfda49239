//! Speaker identity vectors read from reference embedding tables
//!
//! Two table formats are understood: a headerless run of little-endian
//! `f32` values (`.bin`, one row after another) and NumPy `.npy` arrays of
//! dtype `<f4` with one or two dimensions.

use std::path::Path;

use crate::error::{Result, TtsError};

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

/// Fixed conditioning vector for the fallback speech model
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerEmbedding(Vec<f32>);

impl SpeakerEmbedding {
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(TtsError::SpeakerEmbedding("embedding must not be empty".to_string()));
        }
        Ok(Self(values))
    }

    /// Read row `index` of a table whose rows are `dimension` values wide
    pub fn from_table_file(path: &Path, index: usize, dimension: usize) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| TtsError::SpeakerEmbedding(format!("failed to read {}: {e}", path.display())))?;

        let is_npy = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("npy"))
            || bytes.starts_with(NPY_MAGIC);

        let table = if is_npy { parse_npy(&bytes)? } else { parse_raw(&bytes)? };

        select_row(&table, index, dimension)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub const fn dimension(&self) -> usize {
        self.0.len()
    }
}

fn select_row(table: &[f32], index: usize, dimension: usize) -> Result<SpeakerEmbedding> {
    if dimension == 0 || table.len() % dimension != 0 {
        return Err(TtsError::SpeakerEmbedding(format!(
            "table of {} values does not split into rows of {dimension}",
            table.len()
        )));
    }

    let rows = table.len() / dimension;
    let row = table
        .chunks_exact(dimension)
        .nth(index)
        .ok_or_else(|| TtsError::SpeakerEmbedding(format!("index {index} out of range for {rows} row(s)")))?;

    SpeakerEmbedding::new(row.to_vec())
}

fn parse_raw(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(TtsError::SpeakerEmbedding(format!(
            "raw table length {} is not a multiple of 4 bytes",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn parse_npy(bytes: &[u8]) -> Result<Vec<f32>> {
    let invalid = |message: &str| TtsError::SpeakerEmbedding(format!("invalid npy table: {message}"));

    if bytes.len() < 10 || !bytes.starts_with(NPY_MAGIC) {
        return Err(invalid("missing magic header"));
    }

    let (header_len, header_offset) = match bytes[6] {
        1 => (usize::from(u16::from_le_bytes([bytes[8], bytes[9]])), 10),
        2 | 3 if bytes.len() >= 12 => {
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (usize::try_from(len).map_err(|_| invalid("header too large"))?, 12)
        }
        _ => return Err(invalid("unsupported format version")),
    };

    let header_end = header_offset + header_len;
    let header = bytes
        .get(header_offset..header_end)
        .and_then(|raw| std::str::from_utf8(raw).ok())
        .ok_or_else(|| invalid("truncated or non-UTF-8 header"))?;

    if header_field(header, "descr") != Some("<f4") {
        return Err(invalid("dtype must be '<f4'"));
    }
    if header_field(header, "fortran_order") != Some("False") {
        return Err(invalid("fortran-ordered arrays are not supported"));
    }

    let shape = header_shape(header).ok_or_else(|| invalid("missing or malformed shape"))?;
    if shape.is_empty() || shape.len() > 2 {
        return Err(invalid("expected a 1-D or 2-D array"));
    }

    let count: usize = shape.iter().product();
    let values = parse_raw(&bytes[header_end..])?;
    if values.len() != count {
        return Err(invalid(&format!(
            "shape {shape:?} needs {count} values, found {}",
            values.len()
        )));
    }

    Ok(values)
}

fn header_field<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!("'{key}':");
    let rest = header[header.find(&pattern)? + pattern.len()..].trim_start();

    if let Some(quoted) = rest.strip_prefix('\'') {
        return quoted.split('\'').next();
    }

    let end = rest.find([',', '}']).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn header_shape(header: &str) -> Option<Vec<usize>> {
    let rest = &header[header.find("'shape':")?..];
    let inner = &rest[rest.find('(')? + 1..rest.find(')')?];

    inner
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
        .collect()
}
