//! A second, self-contained interpreter: one `match` over the opcode that
//! pops operands, pays for the instruction and mutates the
//! [`ExecutionState`] in place. It shares no execution code with the
//! table-driven engine, which is what makes comparing the two meaningful.

mod gas;
mod system;

use core::cmp::min;

use primitive_types::{H256, U256};

use crate::utils::I256;
use crate::{
	ExecutionState, ExitError, ExitFatal, Handler, Interpreter, Opcode, Revision, Status,
	StepError, STACK_LIMIT,
};

/// The match-dispatch engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectInterpreter;

impl DirectInterpreter {
	pub fn new() -> Self {
		Self
	}
}

impl Interpreter for DirectInterpreter {
	fn name(&self) -> &str {
		"direct"
	}

	fn step_n(
		&self,
		mut state: ExecutionState,
		handler: &mut dyn Handler,
		steps: usize,
	) -> Result<ExecutionState, StepError> {
		if steps == 0 || state.is_terminal() {
			return Ok(state);
		}
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

		for _ in 0..steps {
			step(&mut state, handler)?;
			if state.is_terminal() {
				break;
			}
		}
		Ok(state)
	}
}

/// What an instruction does to the program counter.
enum Flow {
	Continue(usize),
	Jump(usize),
	Halt(Status),
}

/// Why an instruction did not complete.
enum Fault {
	Error(ExitError),
	Fatal(ExitFatal),
}

impl From<ExitError> for Fault {
	fn from(error: ExitError) -> Self {
		Fault::Error(error)
	}
}

type Outcome = Result<Flow, Fault>;

fn step(state: &mut ExecutionState, handler: &mut dyn Handler) -> Result<(), StepError> {
	let opcode = match state.code.get(state.pc) {
		Some(byte) => Opcode(byte),
		None => {
			state.status = Status::Stopped;
			return Ok(());
		}
	};

	match execute(state, handler, opcode) {
		Ok(Flow::Continue(len)) => state.pc += len,
		Ok(Flow::Jump(dest)) => state.pc = dest,
		Ok(Flow::Halt(status)) => state.status = status,
		Err(Fault::Error(error)) => {
			log::trace!(target: "ctvm", "{:?} at {} failed: {:?}", opcode, state.pc, error);
			state.fail(error);
		}
		Err(Fault::Fatal(fatal)) => return Err(StepError::Fatal(fatal)),
	}
	Ok(())
}

fn execute(state: &mut ExecutionState, handler: &mut dyn Handler, opcode: Opcode) -> Outcome {
	let revision = state.revision;
	let address = state.context.recipient;

	if let Some(n) = opcode.is_push() {
		let value = state.code.push_data(state.pc, n as usize);
		charge(state, gas::VERYLOW)?;
		state.stack.push(value)?;
		return Ok(Flow::Continue(1 + n as usize));
	}
	if let Some(n) = opcode.is_dup() {
		charge(state, gas::VERYLOW)?;
		state.stack.dup(n - 1)?;
		return Ok(Flow::Continue(1));
	}
	if let Some(n) = opcode.is_swap() {
		charge(state, gas::VERYLOW)?;
		state.stack.swap(n)?;
		return Ok(Flow::Continue(1));
	}
	if let Some(n) = opcode.is_log() {
		return system::log(state, handler, n);
	}

	match opcode {
		Opcode::STOP => Ok(Flow::Halt(Status::Stopped)),

		Opcode::ADD => binary(state, gas::VERYLOW, |a, b| a.overflowing_add(b).0),
		Opcode::MUL => binary(state, gas::LOW, |a, b| a.overflowing_mul(b).0),
		Opcode::SUB => binary(state, gas::VERYLOW, |a, b| a.overflowing_sub(b).0),
		Opcode::DIV => binary(state, gas::LOW, |a, b| a.checked_div(b).unwrap_or_default()),
		Opcode::SDIV => binary(state, gas::LOW, |a, b| (I256::from(a) / I256::from(b)).into()),
		Opcode::MOD => binary(state, gas::LOW, |a, b| a.checked_rem(b).unwrap_or_default()),
		Opcode::SMOD => binary(state, gas::LOW, |a, b| {
			if b.is_zero() {
				U256::zero()
			} else {
				(I256::from(a) % I256::from(b)).into()
			}
		}),
		Opcode::ADDMOD => ternary(state, gas::MID, |a, b, n| {
			if n.is_zero() {
				U256::zero()
			} else {
				let sum = a.full_mul(U256::one()) + b.full_mul(U256::one());
				truncate(sum % n.full_mul(U256::one()))
			}
		}),
		Opcode::MULMOD => ternary(state, gas::MID, |a, b, n| {
			if n.is_zero() {
				U256::zero()
			} else {
				truncate(a.full_mul(b) % n.full_mul(U256::one()))
			}
		}),
		Opcode::EXP => {
			let base = state.stack.pop()?;
			let exponent = state.stack.pop()?;
			charge(state, gas::exp(exponent))?;
			state.stack.push(base.overflowing_pow(exponent).0)?;
			Ok(Flow::Continue(1))
		}
		Opcode::SIGNEXTEND => binary(state, gas::LOW, |byte, value| {
			if byte >= U256::from(31) {
				return value;
			}
			let bit = byte.as_usize() * 8 + 7;
			let mask = (U256::one() << bit) - U256::one();
			if value.bit(bit) {
				value | !mask
			} else {
				value & mask
			}
		}),

		Opcode::LT => binary(state, gas::VERYLOW, |a, b| flag(a < b)),
		Opcode::GT => binary(state, gas::VERYLOW, |a, b| flag(a > b)),
		Opcode::SLT => binary(state, gas::VERYLOW, |a, b| flag(I256::from(a) < I256::from(b))),
		Opcode::SGT => binary(state, gas::VERYLOW, |a, b| flag(I256::from(a) > I256::from(b))),
		Opcode::EQ => binary(state, gas::VERYLOW, |a, b| flag(a == b)),
		Opcode::ISZERO => unary(state, gas::VERYLOW, |a| flag(a.is_zero())),
		Opcode::AND => binary(state, gas::VERYLOW, |a, b| a & b),
		Opcode::OR => binary(state, gas::VERYLOW, |a, b| a | b),
		Opcode::XOR => binary(state, gas::VERYLOW, |a, b| a ^ b),
		Opcode::NOT => unary(state, gas::VERYLOW, |a| !a),
		Opcode::BYTE => binary(state, gas::VERYLOW, |index, value| {
			if index >= U256::from(32) {
				U256::zero()
			} else {
				U256::from(value.byte(31 - index.as_usize()))
			}
		}),
		Opcode::SHL => binary(state, gas::VERYLOW, |shift, value| {
			if shift >= U256::from(256) {
				U256::zero()
			} else {
				value << shift.as_usize()
			}
		}),
		Opcode::SHR => binary(state, gas::VERYLOW, |shift, value| {
			if shift >= U256::from(256) {
				U256::zero()
			} else {
				value >> shift.as_usize()
			}
		}),
		Opcode::SAR => binary(state, gas::VERYLOW, arithmetic_shift_right),

		Opcode::KECCAK256 => {
			let offset = state.stack.pop()?;
			let len = state.stack.pop()?;
			charge(state, gas::per_word(gas::KECCAK, gas::KECCAK_WORD, len)?)?;
			let (offset, len) = expand(state, offset, len)?;
			let hash = state.memory.hash(offset, len);
			state.stack.push_h256(hash)?;
			Ok(Flow::Continue(1))
		}

		Opcode::ADDRESS => push(state, gas::BASE, H256::from(address).into_uint()),
		Opcode::BALANCE => {
			let target = state.stack.pop_h256()?.into();
			access_account(state, handler, target)?;
			push(state, gas::ZERO, handler.balance(target))
		}
		Opcode::ORIGIN => push(state, gas::BASE, H256::from(handler.origin()).into_uint()),
		Opcode::CALLER => {
			let caller = H256::from(state.context.sender).into_uint();
			push(state, gas::BASE, caller)
		}
		Opcode::CALLVALUE => {
			let value = state.context.value;
			push(state, gas::BASE, value)
		}
		Opcode::CALLDATALOAD => {
			let offset = state.stack.pop()?;
			charge(state, gas::VERYLOW)?;
			let mut word = [0u8; 32];
			let input = &state.context.input;
			if offset < U256::from(input.len()) {
				let start = offset.as_usize();
				let end = min(input.len(), start + 32);
				word[..end - start].copy_from_slice(&input[start..end]);
			}
			state.stack.push(U256::from_big_endian(&word))?;
			Ok(Flow::Continue(1))
		}
		Opcode::CALLDATASIZE => {
			let size = U256::from(state.context.input.len());
			push(state, gas::BASE, size)
		}
		Opcode::CALLDATACOPY => {
			let source = state.context.input.clone();
			copy(state, &source)
		}
		Opcode::CODESIZE => {
			let size = U256::from(state.code.len());
			push(state, gas::BASE, size)
		}
		Opcode::CODECOPY => {
			let code = state.code.clone();
			copy(state, code.bytes())
		}
		Opcode::GASPRICE => push(state, gas::BASE, handler.gas_price()),
		Opcode::EXTCODESIZE => {
			let target = state.stack.pop_h256()?.into();
			access_account(state, handler, target)?;
			push(state, gas::ZERO, handler.code_size(target))
		}
		Opcode::EXTCODECOPY => {
			let target = state.stack.pop_h256()?.into();
			let memory_offset = state.stack.pop()?;
			let code_offset = state.stack.pop()?;
			let len = state.stack.pop()?;
			access_account(state, handler, target)?;
			charge(state, gas::per_word(0, gas::COPY_WORD, len)?)?;
			let (memory_offset, len) = expand(state, memory_offset, len)?;
			let code = handler.code(target);
			state
				.memory
				.copy_padded(memory_offset, code_offset, len, &code);
			Ok(Flow::Continue(1))
		}
		Opcode::RETURNDATASIZE => {
			let size = U256::from(state.return_data.len());
			push(state, gas::BASE, size)
		}
		Opcode::RETURNDATACOPY => {
			let memory_offset = state.stack.pop()?;
			let data_offset = state.stack.pop()?;
			let len = state.stack.pop()?;
			charge(state, gas::per_word(gas::VERYLOW, gas::COPY_WORD, len)?)?;
			let (memory_offset, len_usize) = expand(state, memory_offset, len)?;
			match data_offset.checked_add(len) {
				Some(end) if end <= U256::from(state.return_data.len()) => (),
				_ => return Err(ExitError::OutOfOffset.into()),
			}
			let data = core::mem::take(&mut state.return_data);
			state
				.memory
				.copy_padded(memory_offset, data_offset, len_usize, &data);
			state.return_data = data;
			Ok(Flow::Continue(1))
		}
		Opcode::EXTCODEHASH => {
			let target = state.stack.pop_h256()?.into();
			access_account(state, handler, target)?;
			let hash = handler.code_hash(target);
			push(state, gas::ZERO, hash.into_uint())
		}

		Opcode::BLOCKHASH => {
			let number = state.stack.pop()?;
			push(state, gas::BLOCKHASH, handler.block_hash(number).into_uint())
		}
		Opcode::COINBASE => push(
			state,
			gas::BASE,
			H256::from(handler.block_coinbase()).into_uint(),
		),
		Opcode::TIMESTAMP => push(state, gas::BASE, handler.block_timestamp()),
		Opcode::NUMBER => push(state, gas::BASE, handler.block_number()),
		Opcode::PREVRANDAO => {
			let value = if revision >= Revision::Paris {
				handler.block_randomness().into_uint()
			} else {
				handler.block_difficulty()
			};
			push(state, gas::BASE, value)
		}
		Opcode::GASLIMIT => push(state, gas::BASE, handler.block_gas_limit()),
		Opcode::CHAINID => push(state, gas::BASE, handler.chain_id()),
		Opcode::SELFBALANCE => push(state, gas::LOW, handler.balance(address)),
		Opcode::BASEFEE if revision >= Revision::London => {
			push(state, gas::BASE, handler.block_base_fee_per_gas())
		}
		Opcode::BLOBHASH if revision >= Revision::Cancun => {
			let index = state.stack.pop()?;
			push(state, gas::VERYLOW, handler.blob_hash(index).into_uint())
		}
		Opcode::BLOBBASEFEE if revision >= Revision::Cancun => {
			push(state, gas::BASE, handler.blob_base_fee_per_gas())
		}

		Opcode::POP => {
			state.stack.pop()?;
			charge(state, gas::BASE)?;
			Ok(Flow::Continue(1))
		}
		Opcode::MLOAD => {
			let offset = state.stack.pop()?;
			charge(state, gas::VERYLOW)?;
			let (offset, _) = expand(state, offset, U256::from(32))?;
			let value = state.memory.read_word(offset);
			state.stack.push(value)?;
			Ok(Flow::Continue(1))
		}
		Opcode::MSTORE => {
			let offset = state.stack.pop()?;
			let value = state.stack.pop()?;
			charge(state, gas::VERYLOW)?;
			let (offset, _) = expand(state, offset, U256::from(32))?;
			let mut word = [0u8; 32];
			value.to_big_endian(&mut word);
			state.memory.write(&word, offset);
			Ok(Flow::Continue(1))
		}
		Opcode::MSTORE8 => {
			let offset = state.stack.pop()?;
			let value = state.stack.pop()?;
			charge(state, gas::VERYLOW)?;
			let (offset, _) = expand(state, offset, U256::one())?;
			state.memory.write(&[value.byte(0)], offset);
			Ok(Flow::Continue(1))
		}
		Opcode::SLOAD => {
			let index = state.stack.pop_h256()?;
			let is_cold = handler.is_cold(address, Some(index));
			charge(state, gas::sload(revision, is_cold))?;
			handler.mark_hot(address, Some(index));
			let value = handler.storage(address, index);
			state.stack.push_h256(value)?;
			Ok(Flow::Continue(1))
		}
		Opcode::SSTORE => system::sstore(state, handler),
		Opcode::JUMP => {
			let dest = state.stack.pop()?;
			charge(state, gas::MID)?;
			jump(state, dest)
		}
		Opcode::JUMPI => {
			let dest = state.stack.pop()?;
			let condition = state.stack.pop()?;
			charge(state, gas::HIGH)?;
			if condition.is_zero() {
				Ok(Flow::Continue(1))
			} else {
				jump(state, dest)
			}
		}
		Opcode::PC => {
			let pc = U256::from(state.pc);
			push(state, gas::BASE, pc)
		}
		Opcode::MSIZE => {
			let size = U256::from(state.memory.len());
			push(state, gas::BASE, size)
		}
		Opcode::GAS => {
			charge(state, gas::BASE)?;
			state.stack.push(U256::from(state.gas))?;
			Ok(Flow::Continue(1))
		}
		Opcode::JUMPDEST => {
			charge(state, gas::JUMPDEST)?;
			Ok(Flow::Continue(1))
		}
		Opcode::TLOAD if revision >= Revision::Cancun => {
			let index = state.stack.pop_h256()?;
			let value = handler.transient_storage(address, index);
			push(state, gas::TRANSIENT, value.into_uint())
		}
		Opcode::TSTORE if revision >= Revision::Cancun => {
			if state.context.is_static {
				return Err(ExitError::StaticModeViolation.into());
			}
			let index = state.stack.pop_h256()?;
			let value = state.stack.pop_h256()?;
			charge(state, gas::TRANSIENT)?;
			handler.set_transient_storage(address, index, value);
			Ok(Flow::Continue(1))
		}
		Opcode::MCOPY if revision >= Revision::Cancun => {
			let dst = state.stack.pop()?;
			let src = state.stack.pop()?;
			let len = state.stack.pop()?;
			charge(state, gas::per_word(gas::VERYLOW, gas::COPY_WORD, len)?)?;
			let (dst, len_usize) = expand(state, dst, len)?;
			let (src, _) = expand(state, src, len)?;
			state.memory.copy_within(dst, src, len_usize);
			Ok(Flow::Continue(1))
		}
		Opcode::PUSH0 if revision >= Revision::Shanghai => push(state, gas::BASE, U256::zero()),

		Opcode::CREATE => system::create(state, handler, false),
		Opcode::CREATE2 => system::create(state, handler, true),
		Opcode::CALL => system::call(state, handler, crate::CallScheme::Call),
		Opcode::CALLCODE => system::call(state, handler, crate::CallScheme::CallCode),
		Opcode::DELEGATECALL => system::call(state, handler, crate::CallScheme::DelegateCall),
		Opcode::STATICCALL => system::call(state, handler, crate::CallScheme::StaticCall),
		Opcode::RETURN => halt_with_output(state, Status::Stopped),
		Opcode::REVERT => halt_with_output(state, Status::Reverted),
		Opcode::INVALID => Err(ExitError::DesignatedInvalid.into()),
		Opcode::SELFDESTRUCT => system::selfdestruct(state, handler),

		_ => Err(ExitError::InvalidCode(opcode).into()),
	}
}

/// Takes `cost` from the frame's gas.
fn charge(state: &mut ExecutionState, cost: u64) -> Result<(), ExitError> {
	if state.gas < cost {
		return Err(ExitError::OutOfGas);
	}
	state.gas -= cost;
	Ok(())
}

/// Pays for and performs the growth needed to address `offset..offset + len`.
fn expand(state: &mut ExecutionState, offset: U256, len: U256) -> Result<(usize, usize), ExitError> {
	let (cost, offset, len) = state.memory.expansion_cost(offset, len);
	if cost == u64::MAX {
		return Err(ExitError::OutOfGas);
	}
	charge(state, cost)?;
	state.memory.grow(offset, len);
	Ok((offset, len))
}

/// Charges the access price of `target` and records the access.
fn access_account(
	state: &mut ExecutionState,
	handler: &mut dyn Handler,
	target: primitive_types::H160,
) -> Result<(), ExitError> {
	let cost = gas::account_access(state.revision, handler.is_cold(target, None));
	charge(state, cost)?;
	handler.mark_hot(target, None);
	Ok(())
}

fn push(state: &mut ExecutionState, cost: u64, value: U256) -> Outcome {
	charge(state, cost)?;
	state.stack.push(value)?;
	Ok(Flow::Continue(1))
}

fn unary(state: &mut ExecutionState, cost: u64, op: impl FnOnce(U256) -> U256) -> Outcome {
	let a = state.stack.pop()?;
	push(state, cost, op(a))
}

fn binary(state: &mut ExecutionState, cost: u64, op: impl FnOnce(U256, U256) -> U256) -> Outcome {
	let a = state.stack.pop()?;
	let b = state.stack.pop()?;
	push(state, cost, op(a, b))
}

fn ternary(
	state: &mut ExecutionState,
	cost: u64,
	op: impl FnOnce(U256, U256, U256) -> U256,
) -> Outcome {
	let a = state.stack.pop()?;
	let b = state.stack.pop()?;
	let c = state.stack.pop()?;
	push(state, cost, op(a, b, c))
}

/// Shared by the copy instructions reading from a byte source.
fn copy(state: &mut ExecutionState, source: &[u8]) -> Outcome {
	let memory_offset = state.stack.pop()?;
	let source_offset = state.stack.pop()?;
	let len = state.stack.pop()?;
	charge(state, gas::per_word(gas::VERYLOW, gas::COPY_WORD, len)?)?;
	let (memory_offset, len) = expand(state, memory_offset, len)?;
	state
		.memory
		.copy_padded(memory_offset, source_offset, len, source);
	Ok(Flow::Continue(1))
}

fn jump(state: &ExecutionState, dest: U256) -> Outcome {
	if dest > U256::from(usize::MAX) || !state.code.is_valid_jump_destination(dest.as_usize()) {
		return Err(ExitError::InvalidJump.into());
	}
	Ok(Flow::Jump(dest.as_usize()))
}

fn halt_with_output(state: &mut ExecutionState, status: Status) -> Outcome {
	let offset = state.stack.pop()?;
	let len = state.stack.pop()?;
	let (offset, len) = expand(state, offset, len)?;
	state.output = state.memory.read(offset, len);
	Ok(Flow::Halt(status))
}

fn flag(value: bool) -> U256 {
	if value {
		U256::one()
	} else {
		U256::zero()
	}
}

fn truncate(value: primitive_types::U512) -> U256 {
	U256([value.0[0], value.0[1], value.0[2], value.0[3]])
}

fn arithmetic_shift_right(shift: U256, value: U256) -> U256 {
	let negative = value.bit(255);
	if shift >= U256::from(256) {
		return if negative { U256::MAX } else { U256::zero() };
	}
	let shift = shift.as_usize();
	let shifted = value >> shift;
	if negative && shift > 0 {
		shifted | !(U256::MAX >> shift)
	} else {
		shifted
	}
}

trait IntoUint {
	fn into_uint(self) -> U256;
}

impl IntoUint for H256 {
	fn into_uint(self) -> U256 {
		U256::from_big_endian(self.as_bytes())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sar_fills_with_the_sign_bit() {
		assert_eq!(arithmetic_shift_right(U256::from(4), U256::from(0xf0)), U256::from(0x0f));
		assert_eq!(arithmetic_shift_right(U256::from(4), U256::MAX), U256::MAX);
		assert_eq!(arithmetic_shift_right(U256::from(300), U256::MAX), U256::MAX);
		assert_eq!(arithmetic_shift_right(U256::from(300), U256::one()), U256::zero());
		let min = U256::one() << 255;
		assert_eq!(arithmetic_shift_right(U256::one(), min), U256::from(3) << 254);
	}

	#[test]
	fn wide_modular_arithmetic_does_not_wrap() {
		let n = U256::from(10);
		let sum = U256::MAX.full_mul(U256::one()) + U256::from(2).full_mul(U256::one());
		assert_eq!(truncate(sum % n.full_mul(U256::one())), U256::from(7));
	}
}
