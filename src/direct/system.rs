use core::cmp::min;

use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

use super::{charge, expand, gas, Fault, Flow, Outcome};
use crate::{
	CallRequest, CallScheme, Context, CreateRequest, CreateScheme, ExecutionState, ExitError,
	ExitReason, Handler, Revision, Status, StorageStatus, Transfer,
};

fn check_writable(state: &ExecutionState) -> Result<(), ExitError> {
	if state.context.is_static {
		Err(ExitError::StaticModeViolation)
	} else {
		Ok(())
	}
}

pub fn sstore(state: &mut ExecutionState, handler: &mut dyn Handler) -> Outcome {
	check_writable(state)?;
	let address = state.context.recipient;
	let index = state.stack.pop_h256()?;
	let value = state.stack.pop_h256()?;

	if state.gas <= gas::STIPEND {
		return Err(ExitError::OutOfGas.into());
	}
	let status = StorageStatus::classify(
		handler.original_storage(address, index),
		handler.storage(address, index),
		value,
	);
	let is_cold = handler.is_cold(address, Some(index));
	let cost = gas::sstore(state.revision, status, is_cold);
	charge(state, cost)?;
	state.gas_refund += gas::sstore_refund(state.revision, status);
	handler.mark_hot(address, Some(index));

	handler.set_storage(address, index, value);
	Ok(Flow::Continue(1))
}

pub fn log(state: &mut ExecutionState, handler: &mut dyn Handler, topics: usize) -> Outcome {
	check_writable(state)?;
	let offset = state.stack.pop()?;
	let len = state.stack.pop()?;
	let mut words = Vec::with_capacity(topics);
	for _ in 0..topics {
		words.push(state.stack.pop_h256()?);
	}

	charge(state, gas::log(topics, len)?)?;
	let (offset, len) = expand(state, offset, len)?;
	let data = state.memory.read(offset, len);
	handler.log(state.context.recipient, words, data);
	Ok(Flow::Continue(1))
}

pub fn selfdestruct(state: &mut ExecutionState, handler: &mut dyn Handler) -> Outcome {
	check_writable(state)?;
	let address = state.context.recipient;
	let target: H160 = state.stack.pop_h256()?.into();

	let mut cost = gas::SELFDESTRUCT;
	if state.revision >= Revision::Berlin && handler.is_cold(target, None) {
		cost += gas::account_access(state.revision, true);
	}
	if !handler.balance(address).is_zero() && handler.is_empty(target) {
		cost += gas::NEW_ACCOUNT;
	}
	charge(state, cost)?;
	if !handler.deleted(address) {
		state.gas_refund += gas::selfdestruct_refund(state.revision);
	}
	handler.mark_hot(target, None);

	handler.mark_delete(address, target);
	Ok(Flow::Halt(Status::Stopped))
}

pub fn create(state: &mut ExecutionState, handler: &mut dyn Handler, is_create2: bool) -> Outcome {
	check_writable(state)?;
	let value = state.stack.pop()?;
	let offset = state.stack.pop()?;
	let len = state.stack.pop()?;
	let salt = if is_create2 {
		Some(state.stack.pop_h256()?)
	} else {
		None
	};

	let mut cost = gas::CREATE + gas::initcode(state.revision, len)?;
	if is_create2 {
		cost = cost
			.checked_add(gas::per_word(0, gas::KECCAK_WORD, len)?)
			.ok_or(ExitError::OutOfGas)?;
	}
	charge(state, cost)?;
	let (offset, len) = expand(state, offset, len)?;

	state.return_data.clear();
	let init_code = state.memory.read(offset, len);
	let caller = state.context.recipient;
	let scheme = match salt {
		Some(salt) => CreateScheme::Create2 {
			caller,
			salt,
			code_hash: H256::from_slice(Keccak256::digest(&init_code).as_slice()),
		},
		None => CreateScheme::Legacy { caller },
	};

	let gas_limit = state.gas - state.gas / 64;
	charge(state, gas_limit)?;
	let outcome = handler.create(CreateRequest {
		caller,
		scheme,
		value,
		init_code,
		gas_limit,
		depth: state.context.depth + 1,
	});

	state.gas = state.gas.saturating_add(outcome.gas_left);
	state.gas_refund += outcome.gas_refund;
	state.return_data = outcome.output;
	let pushed = match outcome.reason {
		ExitReason::Succeed(_) => H256::from(outcome.address.unwrap_or_default()),
		ExitReason::Revert(_) | ExitReason::Error(_) => H256::zero(),
		ExitReason::Fatal(fatal) => return Err(Fault::Fatal(fatal)),
	};
	state.stack.push_h256(pushed)?;
	Ok(Flow::Continue(1))
}

pub fn call(state: &mut ExecutionState, handler: &mut dyn Handler, scheme: CallScheme) -> Outcome {
	let requested = state.stack.pop()?;
	let target: H160 = state.stack.pop_h256()?.into();
	let value = match scheme {
		CallScheme::Call | CallScheme::CallCode => state.stack.pop()?,
		CallScheme::DelegateCall | CallScheme::StaticCall => U256::zero(),
	};
	let in_offset = state.stack.pop()?;
	let in_len = state.stack.pop()?;
	let out_offset = state.stack.pop()?;
	let out_len = state.stack.pop()?;

	let transfers_value = !value.is_zero();
	if scheme == CallScheme::Call && transfers_value {
		check_writable(state)?;
	}

	let mut cost = gas::account_access(state.revision, handler.is_cold(target, None));
	if transfers_value {
		cost += gas::CALL_VALUE;
		if scheme == CallScheme::Call && handler.is_empty(target) {
			cost += gas::NEW_ACCOUNT;
		}
	}
	charge(state, cost)?;
	let (in_offset, in_len) = expand(state, in_offset, in_len)?;
	let (out_offset, out_len) = expand(state, out_offset, out_len)?;
	handler.mark_hot(target, None);

	state.return_data.clear();
	let available = state.gas - state.gas / 64;
	let mut gas_limit = if requested > U256::from(available) {
		available
	} else {
		requested.as_u64()
	};
	charge(state, gas_limit)?;
	if transfers_value {
		gas_limit = gas_limit.saturating_add(gas::STIPEND);
	}

	let address = state.context.recipient;
	let (context, transfer) = match scheme {
		CallScheme::Call => (
			Context {
				address: target,
				caller: address,
				apparent_value: value,
			},
			Some(Transfer {
				source: address,
				target,
				value,
			}),
		),
		CallScheme::CallCode => (
			Context {
				address,
				caller: address,
				apparent_value: value,
			},
			Some(Transfer {
				source: address,
				target: address,
				value,
			}),
		),
		CallScheme::DelegateCall => (
			Context {
				address,
				caller: state.context.sender,
				apparent_value: state.context.value,
			},
			None,
		),
		CallScheme::StaticCall => (
			Context {
				address: target,
				caller: address,
				apparent_value: U256::zero(),
			},
			None,
		),
	};

	let input = state.memory.read(in_offset, in_len);
	let outcome = handler.call(CallRequest {
		scheme,
		code_address: target,
		context,
		transfer,
		input,
		gas_limit,
		is_static: state.context.is_static || scheme == CallScheme::StaticCall,
		depth: state.context.depth + 1,
	});

	state.gas = state.gas.saturating_add(outcome.gas_left);
	state.gas_refund += outcome.gas_refund;
	state.return_data = outcome.output;
	let copied = min(out_len, state.return_data.len());
	let success = match outcome.reason {
		ExitReason::Succeed(_) => {
			state.memory.write(&state.return_data[..copied], out_offset);
			true
		}
		ExitReason::Revert(_) => {
			state.memory.write(&state.return_data[..copied], out_offset);
			false
		}
		ExitReason::Error(_) => false,
		ExitReason::Fatal(fatal) => return Err(Fault::Fatal(fatal)),
	};
	state.stack.push(if success { U256::one() } else { U256::zero() })?;
	Ok(Flow::Continue(1))
}
