//! Universal Machine interpreter.
//!
//! Loads a binary program image and runs it until the guest halts.
//!
//! # Usage
//! ```text
//! universal-machine <image>
//! ```
//!
//! # Arguments
//! - `image`: program image of big-endian 32-bit platters
//!
//! # Exit status
//! - `0`: the guest executed halt
//! - non-zero: usage error, malformed or unreadable image, or guest fault
//!
//! Guest bytes flow over stdin/stdout untouched; diagnostics go to stderr.

use std::env;
use std::process;

use universal_machine::error;
use universal_machine::machine::console::StdConsole;
use universal_machine::machine::program::ProgramImage;
use universal_machine::machine::vm::Machine;
use universal_machine::utils::log::{self, Level};

fn main() {
    log::init(Level::Info);

    let args: Vec<String> = env::args().collect();

    if args.len() == 2 && (args[1] == "--help" || args[1] == "-h") {
        print_usage(&args[0]);
        process::exit(0);
    }

    if args.len() != 2 {
        print_usage(&args[0]);
        process::exit(1);
    }

    let image = match ProgramImage::from_file(&args[1]) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let mut machine = Machine::new(image, StdConsole::new());
    if let Err(fault) = machine.run() {
        error!("{fault}");
        process::exit(1);
    }
}

const USAGE: &str = "\
Universal Machine

USAGE:
    {program} <image>

ARGS:
    <image>    Program image: a sequence of big-endian 32-bit platters

OPTIONS:
    -h, --help    Print this help message

EXIT STATUS:
    0 when the guest halts; non-zero on usage error, malformed image or fault
";

/// Prints usage information to stderr.
fn print_usage(program: &str) {
    eprintln!("{}", USAGE.replace("{program}", program));
}
