//! Machine benchmark binary.
//!
//! Measures execution time for representative guest workloads: a
//! dispatch-bound countdown loop, a `load_program` clone loop (the
//! copy-on-write hot path) and allocation/abandonment churn.
//! Run with: `cargo run --release --bin bench`

use std::time::{Duration, Instant};

use universal_machine::machine::console::Console;
use universal_machine::machine::errors::MachineError;
use universal_machine::machine::isa::Opcode::*;
use universal_machine::machine::isa::{encode, encode_orthography};
use universal_machine::machine::program::ProgramImage;
use universal_machine::machine::vm::Machine;

/// Console that discards output and reports immediate end of input.
struct SinkConsole;

impl Console for SinkConsole {
    fn read_byte(&mut self) -> Result<Option<u8>, MachineError> {
        Ok(None)
    }

    fn write_byte(&mut self, _byte: u8) -> Result<(), MachineError> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), MachineError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Benchmark harness
// ---------------------------------------------------------------------------

struct BenchResult {
    name: &'static str,
    iterations: u64,
    total: Duration,
    /// Number of guest instructions executed per run.
    instructions: u64,
}

impl BenchResult {
    fn avg(&self) -> Duration {
        self.total / self.iterations as u32
    }

    fn print(&self) {
        let ns_per_op = self.avg().as_nanos();
        println!(
            "  {:<28} {:>7} iters {:>12.3} us/iter {:>8.1} ns/instr",
            self.name,
            self.iterations,
            ns_per_op as f64 / 1000.0,
            ns_per_op as f64 / self.instructions as f64,
        );
    }
}

/// Runs `f` for at least `min_duration`, returning aggregated results.
fn bench<F>(name: &'static str, min_duration: Duration, instructions: u64, mut f: F) -> BenchResult
where
    F: FnMut(),
{
    // Warmup
    for _ in 0..5 {
        f();
    }

    let mut iterations = 0u64;
    let start = Instant::now();
    while start.elapsed() < min_duration {
        f();
        iterations += 1;
    }
    let total = start.elapsed();

    BenchResult {
        name,
        iterations,
        total,
        instructions,
    }
}

fn run_image(image: &ProgramImage) {
    let mut machine = Machine::new(image.clone(), SinkConsole);
    machine.run().expect("benchmark program faulted");
}

// ---------------------------------------------------------------------------
// Guest workloads
// ---------------------------------------------------------------------------

/// Countdown loop: decrement r1 until zero, four instructions per pass.
///
/// ```text
/// 0: r1 = n
/// 1: r2 = not_and(r0, r0)        -1
/// 2: r3 = 4                      loop head
/// 3: r4 = 8                      halt address
/// 4: r1 = r1 + r2                LOOP
/// 5: r5 = 8
/// 6: if r1 != 0 { r5 = r3 }
/// 7: jump r5
/// 8: halt
/// ```
fn countdown_loop(n: u32) -> ProgramImage {
    ProgramImage::from_words(vec![
        encode_orthography(1, n),
        encode(NotAnd, 2, 0, 0),
        encode_orthography(3, 4),
        encode_orthography(4, 8),
        encode(Addition, 1, 1, 2),
        encode_orthography(5, 8),
        encode(ConditionalMove, 5, 3, 1),
        encode(LoadProgram, 0, 0, 5),
        encode(Halt, 0, 0, 0),
    ])
}

const COUNTDOWN_SETUP: u64 = 4;
const COUNTDOWN_PER_PASS: u64 = 4;

/// Clone loop: copies segment 0 into a fresh segment once, then re-loads that
/// segment as the program on every pass. Exercises `load_program`'s clone,
/// which the copy-on-write backing reduces to a handle swap.
///
/// The image is padded to `segment_words` platters so each clone covers a
/// non-trivial segment.
fn clone_loop(n: u32, segment_words: u32) -> ProgramImage {
    let mut words = vec![
        encode_orthography(1, n),             //  0: r1 = n
        encode_orthography(7, segment_words), //  1: r7 = segment size
        encode(Allocation, 0, 4, 7),          //  2: r4 = allocate(r7)
        encode(NotAnd, 2, 0, 0),              //  3: r2 = -1
        encode_orthography(3, segment_words), //  4: r3 = copy index
        encode(Addition, 3, 3, 2),            //  5: r3 -= 1         COPY
        encode(ArrayIndex, 5, 0, 3),          //  6: r5 = seg0[r3]
        encode(ArrayAmendment, 4, 3, 5),      //  7: seg[r4][r3] = r5
        encode_orthography(6, 12),            //  8: r6 = main head
        encode_orthography(7, 5),             //  9: r7 = copy head
        encode(ConditionalMove, 6, 7, 3),     // 10: copy until r3 == 0
        encode(LoadProgram, 0, 0, 6),         // 11: jump r6
        encode(Addition, 1, 1, 2),            // 12: r1 -= 1         MAIN
        encode_orthography(6, 17),            // 13: r6 = done
        encode_orthography(7, 12),            // 14: r7 = main head
        encode(ConditionalMove, 6, 7, 1),     // 15: loop until r1 == 0
        encode(LoadProgram, 0, 4, 6),         // 16: clone r4, jump r6
        encode(Halt, 0, 0, 0),                // 17: halt
    ];
    assert!(words.len() <= segment_words as usize);
    words.resize(segment_words as usize, 0);
    ProgramImage::from_words(words)
}

fn clone_loop_instructions(n: u64, segment_words: u64) -> u64 {
    // setup + copy loop (7 per platter) + main loop (5 per pass) + halt
    5 + 7 * segment_words + 5 * n + 1
}

/// Allocation churn: allocate a 64-platter segment and abandon it on every
/// pass, seven instructions per pass. The free list keeps reusing one slot.
fn alloc_churn(n: u32) -> ProgramImage {
    ProgramImage::from_words(vec![
        encode_orthography(1, n),         //  0: r1 = n
        encode(NotAnd, 2, 0, 0),          //  1: r2 = -1
        encode_orthography(3, 64),        //  2: r3 = segment size
        encode(Allocation, 0, 4, 3),      //  3: r4 = allocate(r3)   LOOP
        encode(Abandonment, 0, 0, 4),     //  4: abandon r4
        encode(Addition, 1, 1, 2),        //  5: r1 -= 1
        encode_orthography(5, 10),        //  6: r5 = done
        encode_orthography(6, 3),         //  7: r6 = loop head
        encode(ConditionalMove, 5, 6, 1), //  8: loop until r1 == 0
        encode(LoadProgram, 0, 0, 5),     //  9: jump r5
        encode(Halt, 0, 0, 0),            // 10: halt
    ])
}

const CHURN_SETUP: u64 = 3;
const CHURN_PER_PASS: u64 = 7;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let min = Duration::from_secs(2);

    println!("Machine benchmarks (each runs for >= 2s)\n");
    println!(
        "  {:<28} {:>7}       {:>15} {:>17}",
        "benchmark", "iters", "avg time", "per instruction"
    );
    println!("  {}", "-".repeat(76));

    let countdown = countdown_loop(100_000);
    let r = bench(
        "countdown(100K)",
        min,
        COUNTDOWN_SETUP + 100_000 * COUNTDOWN_PER_PASS + 1,
        || run_image(&countdown),
    );
    r.print();

    for &segment_words in &[256u32, 4096] {
        let name: &'static str = match segment_words {
            256 => "clone_loop(10K, 256w)",
            4096 => "clone_loop(10K, 4096w)",
            _ => unreachable!(),
        };
        let image = clone_loop(10_000, segment_words);
        let r = bench(
            name,
            min,
            clone_loop_instructions(10_000, segment_words as u64),
            || run_image(&image),
        );
        r.print();
    }

    let churn = alloc_churn(50_000);
    let r = bench(
        "alloc_churn(50K, 64w)",
        min,
        CHURN_SETUP + 50_000 * CHURN_PER_PASS + 1,
        || run_image(&churn),
    );
    r.print();

    println!();
}
