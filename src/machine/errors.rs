//! Fault taxonomy for the Universal Machine.

use um_derive::Error;

/// Errors that can occur while loading a program image or running it.
///
/// Every variant is fatal to the machine. Handlers never recover locally;
/// faults propagate to the run loop, which is the only exit path besides a
/// clean halt. End-of-input is *not* an error: it reaches the guest as an
/// in-band all-ones sentinel.
#[derive(Debug, Error)]
pub enum MachineError {
    /// Image size is not a whole number of four-byte platters.
    #[error("malformed program: {len} bytes is not a multiple of four")]
    MalformedImage { len: usize },
    /// The program image could not be read from disk.
    #[error("cannot read program image: {0}")]
    ImageIo(String),
    /// Instruction fetch outside segment 0.
    #[error("execution finger {finger} outside the code segment of {len} platters")]
    FingerOutOfBounds { finger: usize, len: usize },
    /// Opcode 14 or 15 reached the dispatcher.
    #[error("invalid opcode {opcode} at offset {offset}")]
    InvalidOpcode { opcode: u8, offset: usize },
    /// Division with a zero divisor.
    #[error("division by zero at offset {offset}")]
    DivisionByZero { offset: usize },
    /// Platter index past the end of a live segment.
    #[error("index {index} out of bounds for segment {segment} of {len} platters")]
    SegmentOutOfBounds { segment: u32, index: u32, len: usize },
    /// Use of an identifier that is not allocated, or was abandoned.
    #[error("segment {segment} is not allocated")]
    DeadSegment { segment: u32 },
    /// The guest tried to abandon the code segment.
    #[error("segment 0 cannot be abandoned")]
    AbandonCodeSegment,
    /// `output` with a register value outside 0..=255.
    #[error("output value {value:#010x} is not a byte")]
    OutputInvalidByte { value: u32 },
    /// The host allocator refused a segment allocation.
    #[error("cannot allocate segment of {words} platters")]
    AllocationFailed { words: u32 },
    /// Byte I/O with the host failed.
    #[error("console i/o error: {0}")]
    ConsoleIo(String),
}
