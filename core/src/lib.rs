//! Core layer of the interpreter: stack, memory, code analysis and the
//! dispatch table for opcodes that need nothing outside the machine.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod code;
mod error;
mod eval;
mod memory;
mod opcode;
mod revision;
mod stack;
pub mod utils;
mod valids;

pub use crate::code::Code;
pub use crate::error::{Capture, ExitError, ExitFatal, ExitReason, ExitRevert, ExitSucceed, Trap};
pub use crate::memory::{memory_cost, Memory};
pub use crate::opcode::Opcode;
pub use crate::revision::Revision;
pub use crate::stack::{Stack, STACK_LIMIT};
pub use crate::valids::Valids;

use crate::eval::{eval, Control};
use alloc::vec::Vec;
use core::ops::Range;

/// Core execution layer for EVM.
pub struct Machine {
	/// Program data.
	data: Vec<u8>,
	/// Program code.
	code: Code,
	/// Program counter.
	position: Result<usize, ExitReason>,
	/// Return value.
	return_range: Range<usize>,
	/// Memory.
	memory: Memory,
	/// Stack.
	stack: Stack,
}

impl Machine {
	/// Reference of machine stack.
	pub fn stack(&self) -> &Stack {
		&self.stack
	}
	/// Mutable reference of machine stack.
	pub fn stack_mut(&mut self) -> &mut Stack {
		&mut self.stack
	}
	/// Reference of machine memory.
	pub fn memory(&self) -> &Memory {
		&self.memory
	}
	/// Mutable reference of machine memory.
	pub fn memory_mut(&mut self) -> &mut Memory {
		&mut self.memory
	}
	/// Return a reference of the program counter.
	pub fn position(&self) -> &Result<usize, ExitReason> {
		&self.position
	}
	/// Program code.
	pub fn code(&self) -> &Code {
		&self.code
	}
	/// Call data.
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// Create a new machine with given code and data.
	pub fn new(code: Code, data: Vec<u8>) -> Self {
		Self::resume(code, data, 0, Memory::new(), Stack::new())
	}

	/// Create a machine that continues at `position` with existing memory
	/// and stack.
	pub fn resume(code: Code, data: Vec<u8>, position: usize, memory: Memory, stack: Stack) -> Self {
		Self {
			data,
			code,
			position: Ok(position),
			return_range: 0..0,
			memory,
			stack,
		}
	}

	/// Explicit exit of the machine. Further step will return error.
	pub fn exit(&mut self, reason: ExitReason) {
		self.position = Err(reason);
	}

	/// Inspect the machine's next opcode and current stack. Returns `None`
	/// once the machine has exited or the position is past the code.
	pub fn inspect(&self) -> Option<(Opcode, &Stack)> {
		let position = match self.position {
			Ok(position) => position,
			Err(_) => return None,
		};
		self.code.get(position).map(|v| (Opcode(v), &self.stack))
	}

	/// Copy and get the return value of the machine, if any.
	pub fn return_value(&self) -> Vec<u8> {
		let data = self.memory.data();
		if self.return_range.end > data.len() {
			return Vec::new();
		}
		data[self.return_range.clone()].to_vec()
	}

	/// Set the range returned by `return_value`. The range must already be
	/// inside memory.
	pub fn set_return_range(&mut self, range: Range<usize>) {
		self.return_range = range;
	}

	/// Take apart the machine, yielding its memory and stack.
	pub fn into_parts(self) -> (Memory, Stack) {
		(self.memory, self.stack)
	}

	/// Loop stepping the machine, until it stops.
	pub fn run(&mut self) -> Capture<ExitReason, Trap> {
		loop {
			match self.step() {
				Ok(()) => (),
				Err(res) => return res,
			}
		}
	}

	/// Step the machine, executing one opcode. It then returns. A trap
	/// leaves the position past the trapping opcode.
	#[inline]
	pub fn step(&mut self) -> Result<(), Capture<ExitReason, Trap>> {
		let position = *self
			.position
			.as_ref()
			.map_err(|reason| Capture::Exit(reason.clone()))?;

		match self.code.get(position).map(Opcode) {
			Some(opcode) => match eval(self, opcode, position) {
				Control::Continue(p) => {
					self.position = Ok(position + p);
					Ok(())
				}
				Control::Exit(e) => {
					self.position = Err(e.clone());
					Err(Capture::Exit(e))
				}
				Control::Jump(p) => {
					if self.code.is_valid_jump_destination(p) {
						self.position = Ok(p);
						Ok(())
					} else {
						self.position = Err(ExitError::InvalidJump.into());
						Err(Capture::Exit(ExitError::InvalidJump.into()))
					}
				}
				Control::Trap(opcode) => {
					self.position = Ok(position + 1);
					Err(Capture::Trap(opcode))
				}
			},
			None => {
				self.position = Err(ExitSucceed::Stopped.into());
				Err(Capture::Exit(ExitSucceed::Stopped.into()))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use primitive_types::U256;

	fn run(code: &str) -> (Capture<ExitReason, Trap>, Machine) {
		let mut machine = Machine::new(Code::new(hex::decode(code).unwrap()), Vec::new());
		let result = machine.run();
		(result, machine)
	}

	#[test]
	fn adds_two_pushes() {
		let (result, machine) = run("6003600401");
		assert_eq!(result, Capture::Exit(ExitSucceed::Stopped.into()));
		assert_eq!(machine.stack().data(), &[U256::from(7)]);
	}

	#[test]
	fn returns_memory_slice() {
		// MSTORE 0x2a at 0, RETURN 32 bytes.
		let (result, machine) = run("602a60005260206000f3");
		assert_eq!(result, Capture::Exit(ExitSucceed::Returned.into()));
		let value = machine.return_value();
		assert_eq!(value.len(), 32);
		assert_eq!(value[31], 0x2a);
	}

	#[test]
	fn jump_must_land_on_jumpdest() {
		let (result, _) = run("600356005b");
		assert_eq!(result, Capture::Exit(ExitError::InvalidJump.into()));
		let (result, machine) = run("600456605b00");
		assert_eq!(result, Capture::Exit(ExitError::InvalidJump.into()));
		assert!(machine.position().is_err());
		let (result, _) = run("600456005b00");
		assert_eq!(result, Capture::Exit(ExitSucceed::Stopped.into()));
	}

	#[test]
	fn environment_opcodes_trap() {
		let (result, machine) = run("3000");
		assert_eq!(result, Capture::Trap(Opcode::ADDRESS));
		assert_eq!(machine.position(), &Ok(1));
	}

	#[test]
	fn push_past_end_pads_with_zero() {
		let (result, machine) = run("61ff");
		assert_eq!(result, Capture::Exit(ExitSucceed::Stopped.into()));
		assert_eq!(machine.stack().data(), &[U256::from(0xff00)]);
	}

	#[test]
	fn designated_invalid() {
		let (result, _) = run("fe");
		assert_eq!(result, Capture::Exit(ExitError::DesignatedInvalid.into()));
	}
}
