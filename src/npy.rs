//! Minimal NPY (NumPy array file, format version 1.0) support for label maps.
//!
//! Only the layout this crate produces is handled: a C-ordered 2-D array of
//! little-endian `i64` (`'<i8'`). That is what `numpy.argmax` returns and what
//! `numpy.load` reads without any dtype conversion.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use crate::errors::{FaceSegError, Result};
use ndarray::prelude::*;

const MAGIC: &[u8] = b"\x93NUMPY";
const VERSION: [u8; 2] = [1, 0];
const DESCR: &str = "<i8";
// magic + version + u16 header length
const PREAMBLE_LEN: usize = MAGIC.len() + 2 + 2;
const ALIGNMENT: usize = 64;

fn header(shape: (usize, usize)) -> Vec<u8> {
    let dict = format!(
        "{{'descr': '{DESCR}', 'fortran_order': False, 'shape': ({}, {}), }}",
        shape.0, shape.1
    );
    // pad with spaces so the data starts on an aligned offset, newline last
    let unpadded = PREAMBLE_LEN + dict.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;

    let mut header = dict.into_bytes();
    header.resize(header.len() + padding, b' ');
    header.push(b'\n');
    header
}

/// Serialize a label array in NPY format.
pub fn write_labels<W: Write>(writer: &mut W, labels: ArrayView2<i64>) -> std::io::Result<()> {
    let header = header(labels.dim());
    let header_len = u16::try_from(header.len()).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "NPY header too long")
    })?;

    writer.write_all(MAGIC)?;
    writer.write_all(&VERSION)?;
    writer.write_all(&header_len.to_le_bytes())?;
    writer.write_all(&header)?;
    // logical (row-major) order whatever the in-memory layout
    for value in labels.iter() {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.flush()
}

/// Write a label array to `path` as an `.npy` file.
pub fn save_labels(path: &Path, labels: ArrayView2<i64>) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| FaceSegError::file_system(path, "npy file creation", e))?;
    let mut writer = BufWriter::new(file);
    write_labels(&mut writer, labels)
        .map_err(|e| FaceSegError::file_system(path, "npy write", e))
}

/// Read a label array written by [`write_labels`].
pub fn read_labels<R: Read>(reader: &mut R) -> Result<Array2<i64>> {
    let mut preamble = [0u8; PREAMBLE_LEN];
    reader.read_exact(&mut preamble)?;
    if &preamble[..MAGIC.len()] != MAGIC {
        return Err(invalid("missing \\x93NUMPY magic bytes"));
    }
    if preamble[MAGIC.len()] != 1 {
        return Err(invalid(format!(
            "unsupported format version {}.{}",
            preamble[MAGIC.len()],
            preamble[MAGIC.len() + 1]
        )));
    }
    let header_len = u16::from_le_bytes([preamble[8], preamble[9]]) as usize;

    let mut header = vec![0u8; header_len];
    reader.read_exact(&mut header)?;
    let header = String::from_utf8(header).map_err(|_| invalid("header is not UTF-8"))?;

    if !header.contains(&format!("'descr': '{DESCR}'")) {
        return Err(invalid(format!("dtype is not {DESCR}")));
    }
    if !header.contains("'fortran_order': False") {
        return Err(invalid("only C-ordered arrays are supported"));
    }
    let shape = parse_shape(&header)?;
    let byte_len = shape
        .0
        .checked_mul(shape.1)
        .and_then(|len| len.checked_mul(std::mem::size_of::<i64>()))
        .ok_or_else(|| invalid(format!("shape {shape:?} is too large")))?;

    // sized by what is actually on disk, never by the header
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.len() != byte_len {
        return Err(invalid(format!(
            "shape {shape:?} needs {byte_len} data bytes, found {}",
            bytes.len()
        )));
    }

    let data: Vec<i64> = bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            i64::from_le_bytes(buf)
        })
        .collect();
    Ok(Array2::from_shape_vec(shape, data)?)
}

/// Read an `.npy` label file from `path`.
pub fn load_labels(path: &Path) -> Result<Array2<i64>> {
    let file =
        File::open(path).map_err(|e| FaceSegError::file_system(path, "npy file open", e))?;
    read_labels(&mut BufReader::new(file)).map_err(|e| match e {
        FaceSegError::FileSystem { source, .. } => {
            FaceSegError::file_system(path, "npy read", source)
        }
        other => other,
    })
}

fn parse_shape(header: &str) -> Result<(usize, usize)> {
    let start = header
        .find("'shape': (")
        .map(|i| i + "'shape': (".len())
        .ok_or_else(|| invalid("header has no shape"))?;
    let end = header[start..]
        .find(')')
        .map(|i| start + i)
        .ok_or_else(|| invalid("unterminated shape tuple"))?;

    let dims = header[start..end]
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| {
            dim.parse::<usize>()
                .map_err(|_| invalid(format!("bad dimension `{dim}`")))
        })
        .collect::<Result<Vec<_>>>()?;

    match dims.as_slice() {
        &[height, width] => Ok((height, width)),
        _ => Err(invalid(format!("expected 2 dimensions, found {}", dims.len()))),
    }
}

fn invalid(reason: impl Into<String>) -> FaceSegError {
    FaceSegError::validation("npy file", reason)
}
