//! Drives the table-dispatch machine, the system-opcode runtime and the
//! gasometer through the shared [`ExecutionState`].

use crate::gasometer::{call_gas_limit, l64, Config, Gasometer, StorageTarget};
use crate::{
	CallInterrupt, CallRequest, Capture, Context, CreateInterrupt, CreateRequest, ExecutionState,
	ExitReason, ExitSucceed, Handler, Interpreter, Machine, Resolve, ResolveCall, ResolveCreate,
	Runtime, Status, StepError, STACK_LIMIT,
};

/// The production engine wrapped into the single-step contract.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConformanceAdapter;

impl ConformanceAdapter {
	pub fn new() -> Self {
		Self
	}
}

impl Interpreter for ConformanceAdapter {
	fn name(&self) -> &str {
		"production"
	}

	fn step_n(
		&self,
		state: ExecutionState,
		handler: &mut dyn Handler,
		steps: usize,
	) -> Result<ExecutionState, StepError> {
		if steps == 0 || state.is_terminal() {
			return Ok(state);
		}

		let mut frame = Frame::load(state)?;
		for _ in 0..steps {
			if frame.step(handler)?.is_some() {
				break;
			}
		}
		Ok(frame.store())
	}
}

/// One frame translated into the engine's own representation.
struct Frame {
	runtime: Runtime,
	gasometer: Gasometer<'static>,
	/// Parts of the state the engine does not track.
	shell: ExecutionState,
}

impl Frame {
	fn load(mut state: ExecutionState) -> Result<Self, StepError> {
		if state.stack.len() > STACK_LIMIT {
			return Err(StepError::UnsupportedState(format!(
				"stack of {} words",
				state.stack.len()
			)));
		}
		if state.memory.len() % 32 != 0 {
			return Err(StepError::UnsupportedState(format!(
				"memory of {} bytes",
				state.memory.len()
			)));
		}

		let config = Config::for_revision(state.revision);
		let gasometer =
			Gasometer::resume(state.gas, state.gas_refund, state.memory.len(), config)
				.ok_or_else(|| {
					StepError::UnsupportedState(format!(
						"{} bytes of memory",
						state.memory.len()
					))
				})?;

		let machine = Machine::resume(
			state.code.clone(),
			state.context.input.clone(),
			state.pc,
			core::mem::take(&mut state.memory),
			core::mem::take(&mut state.stack),
		);
		let context = Context {
			address: state.context.recipient,
			caller: state.context.sender,
			apparent_value: state.context.value,
		};
		let runtime = Runtime::new(machine, context, state.revision)
			.with_frame(state.context.depth, state.context.is_static)
			.with_return_data(core::mem::take(&mut state.return_data));

		Ok(Self {
			runtime,
			gasometer,
			shell: state,
		})
	}

	/// Executes one instruction. Returns the status once the frame halts.
	fn step(&mut self, handler: &mut dyn Handler) -> Result<Option<Status>, StepError> {
		let pc = match self.runtime.machine().position() {
			Ok(pc) => *pc,
			Err(reason) => {
				return Err(StepError::Internal(format!(
					"stepping a halted machine: {:?}",
					reason
				)))
			}
		};

		let (opcode, stack) = match self.runtime.machine().inspect() {
			Some(next) => next,
			None => {
				self.shell.status = Status::Stopped;
				return Ok(Some(Status::Stopped));
			}
		};

		let target = match self.gasometer.record_opcode(
			self.runtime.context().address,
			opcode,
			stack,
			self.runtime.is_static(),
			&*handler,
		) {
			Ok(target) => target,
			Err(error) => {
				self.shell.fail(error);
				return Ok(Some(Status::Failed));
			}
		};
		match target {
			StorageTarget::Address(address) => handler.mark_hot(address, None),
			StorageTarget::Slot(address, index) => handler.mark_hot(address, Some(index)),
			StorageTarget::None => (),
		}

		let gas_left = self.gasometer.gas();
		let exit = match self.runtime.step(handler, gas_left) {
			Ok(()) => return Ok(None),
			Err(Capture::Exit(reason)) => reason,
			Err(Capture::Trap(Resolve::Call(interrupt, resolve))) => {
				match resolve_call(&mut self.gasometer, handler, interrupt, resolve) {
					Ok(()) => return Ok(None),
					Err(reason) => reason,
				}
			}
			Err(Capture::Trap(Resolve::Create(interrupt, resolve))) => {
				match resolve_create(&mut self.gasometer, handler, interrupt, resolve) {
					Ok(()) => return Ok(None),
					Err(reason) => reason,
				}
			}
		};

		self.shell.pc = pc;
		let status = match exit {
			ExitReason::Succeed(ExitSucceed::Returned) => {
				self.shell.output = self.runtime.machine().return_value();
				Status::Stopped
			}
			ExitReason::Succeed(_) => Status::Stopped,
			ExitReason::Revert(_) => {
				self.shell.output = self.runtime.machine().return_value();
				Status::Reverted
			}
			ExitReason::Error(error) => {
				self.shell.fail(error);
				Status::Failed
			}
			ExitReason::Fatal(fatal) => return Err(StepError::Fatal(fatal)),
		};
		self.shell.status = status;
		Ok(Some(status))
	}

	fn store(self) -> ExecutionState {
		let Frame {
			runtime,
			gasometer,
			mut shell,
		} = self;

		let (machine, return_data) = runtime.into_parts();
		if let Ok(pc) = machine.position() {
			shell.pc = *pc;
		}
		let (memory, stack) = machine.into_parts();

		shell.return_data = return_data;
		if shell.status == Status::Failed {
			return shell;
		}
		shell.memory = memory;
		shell.stack = stack;
		shell.gas = gasometer.gas();
		shell.gas_refund = gasometer.refunded_gas();
		shell
	}
}

fn resolve_call(
	gasometer: &mut Gasometer<'static>,
	handler: &mut dyn Handler,
	interrupt: CallInterrupt,
	resolve: ResolveCall<'_>,
) -> Result<(), ExitReason> {
	let mut gas_limit = call_gas_limit(interrupt.gas, gasometer.gas());
	gasometer.record_cost(gas_limit)?;
	if let Some(transfer) = interrupt.transfer.as_ref() {
		if !transfer.value.is_zero() {
			gas_limit = gas_limit.saturating_add(gasometer.config().call_stipend());
		}
	}

	let outcome = handler.call(CallRequest {
		scheme: interrupt.scheme,
		code_address: interrupt.code_address,
		context: interrupt.context,
		transfer: interrupt.transfer,
		input: interrupt.input,
		gas_limit,
		is_static: interrupt.is_static,
		depth: interrupt.depth,
	});
	log::trace!(
		target: "ctvm",
		"call to {:?} exited with {:?}, {} of {} gas left",
		interrupt.code_address,
		outcome.reason,
		outcome.gas_left,
		gas_limit
	);

	gasometer.return_gas(outcome.gas_left);
	gasometer.record_refund(outcome.gas_refund);
	resolve.finish(outcome.reason, outcome.output)
}

fn resolve_create(
	gasometer: &mut Gasometer<'static>,
	handler: &mut dyn Handler,
	interrupt: CreateInterrupt,
	resolve: ResolveCreate<'_>,
) -> Result<(), ExitReason> {
	let gas_limit = l64(gasometer.gas());
	gasometer.record_cost(gas_limit)?;

	let outcome = handler.create(CreateRequest {
		caller: interrupt.caller,
		scheme: interrupt.scheme,
		value: interrupt.value,
		init_code: interrupt.init_code,
		gas_limit,
		depth: interrupt.depth,
	});
	log::trace!(
		target: "ctvm",
		"create by {:?} exited with {:?} at {:?}",
		interrupt.caller,
		outcome.reason,
		outcome.address
	);

	gasometer.return_gas(outcome.gas_left);
	gasometer.record_refund(outcome.gas_refund);
	resolve.finish(outcome.reason, outcome.address, outcome.output)
}
