//! Byte-oriented I/O between the machine and its host.
//!
//! The `input` and `output` operations exchange single bytes with the
//! controlling environment through the [`Console`] trait. Bytes pass through
//! untouched: no newline translation, no interpretation of any kind.

use crate::machine::errors::MachineError;
use std::io::{self, BufWriter, Read, Write};

/// Blocking byte I/O endpoint for the machine.
///
/// End of input is reported as `None`, never as an error; the machine turns
/// it into the guest-visible all-ones sentinel.
pub trait Console {
    /// Blocks for one byte; `None` once the input stream is exhausted.
    fn read_byte(&mut self) -> Result<Option<u8>, MachineError>;
    /// Writes one byte. Implementations may buffer.
    fn write_byte(&mut self, byte: u8) -> Result<(), MachineError>;
    /// Forces buffered output to the host.
    fn flush(&mut self) -> Result<(), MachineError>;
}

/// Console over the process standard streams.
///
/// Output is buffered for throughput; the machine flushes before every
/// blocking read and before halt or a fault is reported, so the buffering is
/// never observable.
pub struct StdConsole {
    stdin: io::Stdin,
    stdout: BufWriter<io::Stdout>,
}

impl StdConsole {
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            stdout: BufWriter::new(io::stdout()),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for StdConsole {
    fn read_byte(&mut self) -> Result<Option<u8>, MachineError> {
        let mut buf = [0u8; 1];
        loop {
            match self.stdin.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(MachineError::ConsoleIo(e.to_string())),
            }
        }
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), MachineError> {
        self.stdout
            .write_all(&[byte])
            .map_err(|e| MachineError::ConsoleIo(e.to_string()))
    }

    fn flush(&mut self) -> Result<(), MachineError> {
        self.stdout
            .flush()
            .map_err(|e| MachineError::ConsoleIo(e.to_string()))
    }
}
