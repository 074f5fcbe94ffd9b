//! Runtime layer of the interpreter: everything an opcode needs from the
//! outside world goes through [`Handler`], while calls and creations are
//! surfaced as interrupts for the caller to resolve.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod address;
mod context;
mod eval;
mod handler;
mod interrupt;

pub use ctvm_core::*;

pub use crate::address::{create2_address, create_address, scheme_address};
pub use crate::context::{CallScheme, Context, CreateScheme};
pub use crate::handler::{
	CallOutcome, CallRequest, CreateOutcome, CreateRequest, Handler, StorageStatus, Transfer,
};
pub use crate::interrupt::{CallInterrupt, CreateInterrupt, Resolve, ResolveCall, ResolveCreate};

use alloc::vec::Vec;

/// EVM runtime.
///
/// The runtime wraps an EVM `Machine` with support of return data and
/// context.
pub struct Runtime {
	machine: Machine,
	status: Result<(), ExitReason>,
	return_data_buffer: Vec<u8>,
	context: Context,
	is_static: bool,
	depth: usize,
	revision: Revision,
}

impl Runtime {
	/// Create a new runtime with given machine and context.
	pub fn new(machine: Machine, context: Context, revision: Revision) -> Self {
		Self {
			machine,
			status: Ok(()),
			return_data_buffer: Vec::new(),
			context,
			is_static: false,
			depth: 0,
			revision,
		}
	}

	/// Frame position of the runtime: its depth and whether state changes
	/// are forbidden.
	pub fn with_frame(mut self, depth: usize, is_static: bool) -> Self {
		self.depth = depth;
		self.is_static = is_static;
		self
	}

	/// Return data left by a previous call or creation.
	pub fn with_return_data(mut self, return_data: Vec<u8>) -> Self {
		self.return_data_buffer = return_data;
		self
	}

	/// Get a reference to the machine.
	pub fn machine(&self) -> &Machine {
		&self.machine
	}

	/// Get a reference to the execution context.
	pub fn context(&self) -> &Context {
		&self.context
	}

	pub fn is_static(&self) -> bool {
		self.is_static
	}

	pub fn depth(&self) -> usize {
		self.depth
	}

	pub fn return_data(&self) -> &[u8] {
		&self.return_data_buffer
	}

	/// Take apart the runtime, yielding the machine and the return data
	/// buffer.
	pub fn into_parts(self) -> (Machine, Vec<u8>) {
		(self.machine, self.return_data_buffer)
	}

	/// Step the runtime by one opcode. Gas must already have been paid;
	/// `gas_left` is what `GAS` observes.
	pub fn step<'a, H: Handler + ?Sized>(
		&'a mut self,
		handler: &mut H,
		gas_left: u64,
	) -> Result<(), Capture<ExitReason, Resolve<'a>>> {
		if let Err(exit) = &self.status {
			return Err(Capture::Exit(exit.clone()));
		}

		match self.machine.step() {
			Ok(()) => Ok(()),
			Err(Capture::Exit(exit)) => {
				self.status = Err(exit.clone());
				Err(Capture::Exit(exit))
			}
			Err(Capture::Trap(opcode)) => match eval::eval(self, opcode, handler, gas_left) {
				eval::Control::Continue => Ok(()),
				eval::Control::CallInterrupt(interrupt, out_offset, out_len) => {
					let resolve = ResolveCall::new(self, out_offset, out_len);
					Err(Capture::Trap(Resolve::Call(interrupt, resolve)))
				}
				eval::Control::CreateInterrupt(interrupt) => {
					let resolve = ResolveCreate::new(self);
					Err(Capture::Trap(Resolve::Create(interrupt, resolve)))
				}
				eval::Control::Exit(exit) => {
					self.machine.exit(exit.clone());
					self.status = Err(exit.clone());
					Err(Capture::Exit(exit))
				}
			},
		}
	}
}
