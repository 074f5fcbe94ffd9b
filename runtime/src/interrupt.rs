use crate::{
	CallScheme, Context, CreateScheme, ExitFatal, ExitReason, Runtime, Transfer,
};
use alloc::vec::Vec;
use primitive_types::{H160, U256};

/// Interrupt resolution.
pub enum Resolve<'a> {
	/// Create interrupt resolution.
	Create(CreateInterrupt, ResolveCreate<'a>),
	/// Call interrupt resolution.
	Call(CallInterrupt, ResolveCall<'a>),
}

/// Arguments of a trapped call opcode. The gas is the amount requested on
/// the stack; what is actually forwarded is up to the metering side.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallInterrupt {
	pub scheme: CallScheme,
	pub code_address: H160,
	pub context: Context,
	pub transfer: Option<Transfer>,
	pub input: Vec<u8>,
	pub gas: U256,
	pub is_static: bool,
	pub depth: usize,
}

/// Arguments of a trapped create opcode.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateInterrupt {
	pub caller: H160,
	pub scheme: CreateScheme,
	pub value: U256,
	pub init_code: Vec<u8>,
	pub depth: usize,
}

/// Create interrupt resolution.
pub struct ResolveCreate<'a> {
	runtime: &'a mut Runtime,
	resolved: bool,
}

impl<'a> ResolveCreate<'a> {
	pub(crate) fn new(runtime: &'a mut Runtime) -> Self {
		Self {
			runtime,
			resolved: false,
		}
	}

	/// Feed the outcome of the creation back into the runtime.
	pub fn finish(
		mut self,
		reason: ExitReason,
		address: Option<H160>,
		return_data: Vec<u8>,
	) -> Result<(), ExitReason> {
		self.resolved = true;
		crate::eval::finish_create(&mut *self.runtime, reason, address, return_data)
	}
}

impl<'a> Drop for ResolveCreate<'a> {
	fn drop(&mut self) {
		if self.resolved {
			return;
		}
		self.runtime.status = Err(ExitFatal::UnhandledInterrupt.into());
		self.runtime
			.machine
			.exit(ExitFatal::UnhandledInterrupt.into());
	}
}

/// Call interrupt resolution.
pub struct ResolveCall<'a> {
	runtime: &'a mut Runtime,
	out_offset: usize,
	out_len: usize,
	resolved: bool,
}

impl<'a> ResolveCall<'a> {
	pub(crate) fn new(runtime: &'a mut Runtime, out_offset: usize, out_len: usize) -> Self {
		Self {
			runtime,
			out_offset,
			out_len,
			resolved: false,
		}
	}

	/// Feed the outcome of the call back into the runtime.
	pub fn finish(mut self, reason: ExitReason, return_data: Vec<u8>) -> Result<(), ExitReason> {
		self.resolved = true;
		crate::eval::finish_call(
			&mut *self.runtime,
			self.out_len,
			self.out_offset,
			reason,
			return_data,
		)
	}
}

impl<'a> Drop for ResolveCall<'a> {
	fn drop(&mut self) {
		if self.resolved {
			return;
		}
		self.runtime.status = Err(ExitFatal::UnhandledInterrupt.into());
		self.runtime
			.machine
			.exit(ExitFatal::UnhandledInterrupt.into());
	}
}
