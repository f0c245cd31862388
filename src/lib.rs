//! Interpreter for the Universal Machine.
//!
//! Loads a big-endian binary program image into segment 0 and executes it
//! until the guest halts or faults, exchanging single bytes with the host's
//! standard streams along the way.

pub mod machine;
pub mod utils;
