use cq_core::{CodeScanner, ScanError};
use std::io::{self, BufRead};

/// Reads one decoded code from stdin.
///
/// USB barcode and QR scanners in keyboard-wedge mode type the decoded
/// payload followed by Enter, so a single line read covers the common
/// hardware without a camera dependency. A blank line or end of input is
/// the operator aborting the scan.
pub struct StdinScanner;

impl StdinScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdinScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeScanner for StdinScanner {
    fn scan(&mut self) -> Result<Option<String>, ScanError> {
        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|err| ScanError::Read(err.to_string()))?;
        if read == 0 {
            return Ok(None);
        }
        let code = line.trim_end_matches(['\r', '\n']);
        if code.is_empty() {
            return Ok(None);
        }
        Ok(Some(code.to_string()))
    }
}
