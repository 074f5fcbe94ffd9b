#[macro_use]
mod macros;
mod system;

use crate::{CallInterrupt, CallScheme, CreateInterrupt, ExitError, ExitReason, Handler, Opcode, Runtime};
use alloc::vec::Vec;
use core::cmp::min;
use primitive_types::{H160, H256, U256};

pub enum Control {
	Continue,
	CallInterrupt(CallInterrupt, usize, usize),
	CreateInterrupt(CreateInterrupt),
	Exit(ExitReason),
}

/// Executes one of the opcodes that need the call context or the handler.
pub fn eval<H: Handler + ?Sized>(
	state: &mut Runtime,
	opcode: Opcode,
	handler: &mut H,
	gas_left: u64,
) -> Control {
	if let Some(topics) = opcode.is_log() {
		return system::log(state, topics, handler);
	}
	if let Some(scheme) = call_scheme(opcode) {
		return system::call(state, scheme);
	}

	match opcode {
		Opcode::KECCAK256 => system::keccak256(state),
		Opcode::ADDRESS => system::address(state),
		Opcode::BALANCE => system::balance(state, handler),
		Opcode::SELFBALANCE => system::selfbalance(state, handler),
		Opcode::ORIGIN => system::origin(state, handler),
		Opcode::CALLER => system::caller(state),
		Opcode::CALLVALUE => system::callvalue(state),
		Opcode::GASPRICE => system::gasprice(state, handler),
		Opcode::EXTCODESIZE => system::extcodesize(state, handler),
		Opcode::EXTCODEHASH => system::extcodehash(state, handler),
		Opcode::EXTCODECOPY => system::extcodecopy(state, handler),
		Opcode::RETURNDATASIZE => system::returndatasize(state),
		Opcode::RETURNDATACOPY => system::returndatacopy(state),
		Opcode::BLOCKHASH => system::blockhash(state, handler),
		Opcode::COINBASE => system::coinbase(state, handler),
		Opcode::TIMESTAMP => system::timestamp(state, handler),
		Opcode::NUMBER => system::number(state, handler),
		Opcode::PREVRANDAO => system::prevrandao(state, handler),
		Opcode::GASLIMIT => system::gaslimit(state, handler),
		Opcode::CHAINID => system::chainid(state, handler),
		Opcode::BASEFEE => system::base_fee(state, handler),
		Opcode::BLOBHASH => system::blob_hash(state, handler),
		Opcode::BLOBBASEFEE => system::blob_base_fee(state, handler),
		Opcode::SLOAD => system::sload(state, handler),
		Opcode::SSTORE => system::sstore(state, handler),
		Opcode::TLOAD => system::tload(state, handler),
		Opcode::TSTORE => system::tstore(state, handler),
		Opcode::GAS => system::gas(state, gas_left),
		Opcode::SELFDESTRUCT => system::selfdestruct(state, handler),
		Opcode::CREATE => system::create(state, false),
		Opcode::CREATE2 => system::create(state, true),
		_ => Control::Exit(ExitError::InvalidCode(opcode).into()),
	}
}

fn call_scheme(opcode: Opcode) -> Option<CallScheme> {
	match opcode {
		Opcode::CALL => Some(CallScheme::Call),
		Opcode::CALLCODE => Some(CallScheme::CallCode),
		Opcode::DELEGATECALL => Some(CallScheme::DelegateCall),
		Opcode::STATICCALL => Some(CallScheme::StaticCall),
		_ => None,
	}
}

/// Pushes the created address, or zero when the creation did not succeed.
pub fn finish_create(
	runtime: &mut Runtime,
	reason: ExitReason,
	address: Option<H160>,
	return_data: Vec<u8>,
) -> Result<(), ExitReason> {
	runtime.return_data_buffer = return_data;
	let pushed = match reason {
		ExitReason::Succeed(_) => address.map(H256::from).unwrap_or_default(),
		_ => H256::zero(),
	};
	runtime.machine.stack_mut().push_h256(pushed)?;

	match reason {
		ExitReason::Fatal(fatal) => Err(fatal.into()),
		_ => Ok(()),
	}
}

/// Copies what the callee returned or reverted with into the output span
/// and pushes the success flag.
pub fn finish_call(
	runtime: &mut Runtime,
	out_len: usize,
	out_offset: usize,
	reason: ExitReason,
	return_data: Vec<u8>,
) -> Result<(), ExitReason> {
	runtime.return_data_buffer = return_data;
	let (copy_output, success) = match reason {
		ExitReason::Succeed(_) => (true, true),
		ExitReason::Revert(_) => (true, false),
		ExitReason::Error(_) | ExitReason::Fatal(_) => (false, false),
	};
	if copy_output {
		let len = min(out_len, runtime.return_data_buffer.len());
		runtime
			.machine
			.memory_mut()
			.write(&runtime.return_data_buffer[..len], out_offset);
	}
	runtime
		.machine
		.stack_mut()
		.push(if success { U256::one() } else { U256::zero() })?;

	match reason {
		ExitReason::Fatal(fatal) => Err(fatal.into()),
		_ => Ok(()),
	}
}
