//! Reader for legacy UNL dumps: pipe-delimited lines in windows-1250.
//!
//! Undecodable bytes are replaced with U+FFFD rather than failing the
//! run; stray bytes do occur in the historical dumps. A wrong column
//! count is a different matter: it means the export format changed, so
//! it fails immediately as [`HemicycleError::SchemaMismatch`].

use crate::core::error::HemicycleError;
use encoding_rs::WINDOWS_1250;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Streaming UNL reader. Restartable by reopening, not resumable.
pub struct UnlReader {
    path: PathBuf,
    reader: BufReader<File>,
    expected_ncols: Option<usize>,
    row: usize,
}

impl UnlReader {
    pub fn open(path: &Path, expected_ncols: Option<usize>) -> Result<Self, HemicycleError> {
        let file = File::open(path)?;
        Ok(UnlReader {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            expected_ncols,
            row: 0,
        })
    }
}

impl Iterator for UnlReader {
    type Item = Result<Vec<String>, HemicycleError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut line: Vec<u8> = Vec::new();
            match self.reader.read_until(b'\n', &mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            while matches!(line.last(), Some(b'\n') | Some(b'\r')) {
                line.pop();
            }
            let row = self.row;
            self.row += 1;
            if line.is_empty() {
                continue;
            }
            // windows-1250 is a single-byte encoding, so decoding per
            // line is equivalent to decoding the whole file.
            let (text, _, _) = WINDOWS_1250.decode(&line);
            let cols: Vec<String> = text.split('|').map(str::to_string).collect();
            if let Some(expected) = self.expected_ncols {
                if cols.len() != expected {
                    return Some(Err(HemicycleError::SchemaMismatch {
                        file: self.path.clone(),
                        row,
                        expected,
                        got: cols.len(),
                    }));
                }
            }
            return Some(Ok(cols));
        }
    }
}

/// Materialize a whole UNL file. Use [`UnlReader`] directly for the
/// large per-member ballot files.
pub fn read_unl(
    path: &Path,
    expected_ncols: Option<usize>,
) -> Result<Vec<Vec<String>>, HemicycleError> {
    UnlReader::open(path, expected_ncols)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).expect("create fixture");
        f.write_all(bytes).expect("write fixture");
        path
    }

    #[test]
    fn decodes_windows_1250_and_splits_on_pipe() {
        let tmp = tempdir().expect("tempdir");
        // "Poslanecká sněmovna" in windows-1250
        let path = write_bytes(
            tmp.path(),
            "organy.unl",
            b"200|Poslaneck\xe1 sn\xecmovna|\n",
        );
        let rows = read_unl(&path, Some(3)).expect("read");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], "Poslanecká sněmovna");
        assert_eq!(rows[0][2], "");
    }

    #[test]
    fn undecodable_byte_is_replaced_not_fatal() {
        let tmp = tempdir().expect("tempdir");
        // 0x81 is unassigned in windows-1250
        let path = write_bytes(tmp.path(), "stray.unl", b"1|a\x81b\n");
        let rows = read_unl(&path, Some(2)).expect("read");
        assert_eq!(rows[0][1], "a\u{FFFD}b");
    }

    #[test]
    fn empty_lines_are_skipped() {
        let tmp = tempdir().expect("tempdir");
        let path = write_bytes(tmp.path(), "gaps.unl", b"1|x\n\n\n2|y\n");
        let rows = read_unl(&path, Some(2)).expect("read");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "2");
    }

    #[test]
    fn column_count_mismatch_is_fatal() {
        let tmp = tempdir().expect("tempdir");
        let path = write_bytes(tmp.path(), "bad.unl", b"1|x|extra\n");
        let err = read_unl(&path, Some(2)).expect_err("should fail");
        match err {
            HemicycleError::SchemaMismatch { expected, got, row, .. } => {
                assert_eq!(expected, 2);
                assert_eq!(got, 3);
                assert_eq!(row, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn crlf_line_endings_are_tolerated() {
        let tmp = tempdir().expect("tempdir");
        let path = write_bytes(tmp.path(), "crlf.unl", b"1|x\r\n2|y\r\n");
        let rows = read_unl(&path, Some(2)).expect("read");
        assert_eq!(rows[0][1], "x");
        assert_eq!(rows[1][1], "y");
    }

    #[test]
    fn streaming_reader_restarts_from_the_top() {
        let tmp = tempdir().expect("tempdir");
        let path = write_bytes(tmp.path(), "again.unl", b"1|x\n2|y\n");
        for _ in 0..2 {
            let rows: Vec<_> = UnlReader::open(&path, Some(2))
                .expect("open")
                .collect::<Result<Vec<_>, _>>()
                .expect("rows");
            assert_eq!(rows.len(), 2);
        }
    }
}
