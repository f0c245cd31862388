//! The execution engine: registers, execution finger and dispatch loop.
//!
//! Each step fetches one platter from segment 0 at the execution finger,
//! advances the finger, decodes the opcode and dispatches to the handler.
//! The finger is advanced *before* dispatch, so `load_program` simply
//! overwrites it. The loop ends on `halt` (a status, not an unwind) or a
//! fault.

mod registers;
mod segments;

use crate::machine::console::Console;
use crate::machine::errors::MachineError;
use crate::machine::isa::{self, Opcode};
use crate::machine::program::ProgramImage;
use registers::Registers;
use segments::Segments;

/// Whether the machine will execute another instruction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    /// The next `step` fetches at the execution finger.
    Running,
    /// The guest executed `halt`. Terminal.
    Halted,
}

/// A Universal Machine.
///
/// Owns all guest-visible state: the eight-register file, the segment table
/// and the execution finger. Generic over its [`Console`] so tests and
/// embedders can substitute the byte streams.
pub struct Machine<C: Console> {
    registers: Registers,
    segments: Segments,
    finger: usize,
    status: Status,
    console: C,
}

impl<C: Console> Machine<C> {
    /// Creates a machine with `image` as segment 0, every register zero and
    /// the execution finger at the first platter.
    pub fn new(image: ProgramImage, console: C) -> Self {
        Self {
            registers: Registers::new(),
            segments: Segments::new(image.words),
            finger: 0,
            status: Status::Running,
            console,
        }
    }

    /// Runs until the guest halts or faults.
    ///
    /// Buffered output is flushed before either outcome is reported, so bytes
    /// written ahead of a fault are never lost.
    pub fn run(&mut self) -> Result<(), MachineError> {
        let outcome = loop {
            match self.step() {
                Ok(Status::Running) => continue,
                Ok(Status::Halted) => break Ok(()),
                Err(fault) => break Err(fault),
            }
        };
        let flushed = self.console.flush();
        outcome.and(flushed)
    }

    /// Executes one instruction and returns the resulting status.
    ///
    /// Calling `step` on a halted machine is a no-op.
    pub fn step(&mut self) -> Result<Status, MachineError> {
        if self.status == Status::Halted {
            return Ok(Status::Halted);
        }

        let offset = self.finger;
        let word = self
            .segments
            .code_fetch(offset)
            .ok_or(MachineError::FingerOutOfBounds {
                finger: offset,
                len: self.segments.code_len(),
            })?;
        self.finger = offset + 1;

        let opcode = isa::opcode_bits(word);
        let op = Opcode::try_from(opcode)
            .map_err(|_| MachineError::InvalidOpcode { opcode, offset })?;

        match op {
            Opcode::ConditionalMove => self.op_conditional_move(word),
            Opcode::ArrayIndex => self.op_array_index(word)?,
            Opcode::ArrayAmendment => self.op_array_amendment(word)?,
            Opcode::Addition => self.op_addition(word),
            Opcode::Multiplication => self.op_multiplication(word),
            Opcode::Division => self.op_division(word, offset)?,
            Opcode::NotAnd => self.op_not_and(word),
            Opcode::Halt => self.status = Status::Halted,
            Opcode::Allocation => self.op_allocation(word)?,
            Opcode::Abandonment => self.op_abandonment(word)?,
            Opcode::Output => self.op_output(word)?,
            Opcode::Input => self.op_input(word)?,
            Opcode::LoadProgram => self.op_load_program(word)?,
            Opcode::Orthography => self.op_orthography(word),
        }

        Ok(self.status)
    }

    /// Current machine status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Word offset of the next instruction fetch.
    pub fn finger(&self) -> usize {
        self.finger
    }

    /// Reads register `index` (0..=7).
    pub fn register(&self, index: usize) -> u32 {
        self.registers.get(index)
    }

    /// Gives back the console, e.g. to inspect captured output.
    pub fn into_console(self) -> C {
        self.console
    }

    fn op_conditional_move(&mut self, word: u32) {
        if self.registers.get(isa::reg_c(word)) != 0 {
            let value = self.registers.get(isa::reg_b(word));
            self.registers.set(isa::reg_a(word), value);
        }
    }

    fn op_array_index(&mut self, word: u32) -> Result<(), MachineError> {
        let id = self.registers.get(isa::reg_b(word));
        let index = self.registers.get(isa::reg_c(word));
        let value = self.segments.read(id, index)?;
        self.registers.set(isa::reg_a(word), value);
        Ok(())
    }

    fn op_array_amendment(&mut self, word: u32) -> Result<(), MachineError> {
        let id = self.registers.get(isa::reg_a(word));
        let index = self.registers.get(isa::reg_b(word));
        let value = self.registers.get(isa::reg_c(word));
        self.segments.write(id, index, value)
    }

    fn op_addition(&mut self, word: u32) {
        let value = self
            .registers
            .get(isa::reg_b(word))
            .wrapping_add(self.registers.get(isa::reg_c(word)));
        self.registers.set(isa::reg_a(word), value);
    }

    fn op_multiplication(&mut self, word: u32) {
        let value = self
            .registers
            .get(isa::reg_b(word))
            .wrapping_mul(self.registers.get(isa::reg_c(word)));
        self.registers.set(isa::reg_a(word), value);
    }

    fn op_division(&mut self, word: u32, offset: usize) -> Result<(), MachineError> {
        let divisor = self.registers.get(isa::reg_c(word));
        if divisor == 0 {
            return Err(MachineError::DivisionByZero { offset });
        }
        let value = self.registers.get(isa::reg_b(word)) / divisor;
        self.registers.set(isa::reg_a(word), value);
        Ok(())
    }

    fn op_not_and(&mut self, word: u32) {
        let value = !(self.registers.get(isa::reg_b(word)) & self.registers.get(isa::reg_c(word)));
        self.registers.set(isa::reg_a(word), value);
    }

    fn op_allocation(&mut self, word: u32) -> Result<(), MachineError> {
        let words = self.registers.get(isa::reg_c(word));
        let id = self.segments.allocate(words)?;
        self.registers.set(isa::reg_b(word), id);
        Ok(())
    }

    fn op_abandonment(&mut self, word: u32) -> Result<(), MachineError> {
        self.segments.abandon(self.registers.get(isa::reg_c(word)))
    }

    fn op_output(&mut self, word: u32) -> Result<(), MachineError> {
        let value = self.registers.get(isa::reg_c(word));
        let byte = u8::try_from(value).map_err(|_| MachineError::OutputInvalidByte { value })?;
        self.console.write_byte(byte)
    }

    fn op_input(&mut self, word: u32) -> Result<(), MachineError> {
        // Pending guest output must reach the host before we block.
        self.console.flush()?;
        let value = match self.console.read_byte()? {
            Some(byte) => byte as u32,
            None => u32::MAX,
        };
        self.registers.set(isa::reg_c(word), value);
        Ok(())
    }

    fn op_load_program(&mut self, word: u32) -> Result<(), MachineError> {
        let source = self.registers.get(isa::reg_b(word));
        if source != 0 {
            self.segments.clone_into_zero(source)?;
        }
        self.finger = self.registers.get(isa::reg_c(word)) as usize;
        Ok(())
    }

    fn op_orthography(&mut self, word: u32) {
        self.registers
            .set(isa::ortho_reg(word), isa::ortho_value(word));
    }
}
