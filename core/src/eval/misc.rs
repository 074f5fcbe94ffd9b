use super::Control;
use crate::{ExitError, ExitRevert, ExitSucceed, Machine};
use core::cmp::min;
use primitive_types::{H256, U256};

pub fn codesize(state: &mut Machine) -> Control {
	let size = U256::from(state.code.len());
	push_u256!(state, size);
	Control::Continue(1)
}

pub fn codecopy(state: &mut Machine) -> Control {
	pop_u256!(state, memory_offset, code_offset, len);

	if len.is_zero() {
		return Control::Continue(1);
	}
	let memory_offset = as_usize_or_fail!(memory_offset);
	let len = as_usize_or_fail!(len);
	state
		.memory
		.copy_padded(memory_offset, code_offset, len, state.code.bytes());
	Control::Continue(1)
}

pub fn calldataload(state: &mut Machine) -> Control {
	pop_u256!(state, index);

	let mut load = [0u8; 32];
	if index < U256::from(state.data.len()) {
		let start = index.as_usize();
		let end = min(state.data.len(), start + 32);
		load[..end - start].copy_from_slice(&state.data[start..end]);
	}

	push_h256!(state, H256::from(load));
	Control::Continue(1)
}

pub fn calldatasize(state: &mut Machine) -> Control {
	push_u256!(state, U256::from(state.data.len()));
	Control::Continue(1)
}

pub fn calldatacopy(state: &mut Machine) -> Control {
	pop_u256!(state, memory_offset, data_offset, len);

	if len.is_zero() {
		return Control::Continue(1);
	}
	let memory_offset = as_usize_or_fail!(memory_offset);
	let len = as_usize_or_fail!(len);
	state
		.memory
		.copy_padded(memory_offset, data_offset, len, &state.data);
	Control::Continue(1)
}

pub fn pop(state: &mut Machine) -> Control {
	pop_u256!(state, _any);
	Control::Continue(1)
}

pub fn mload(state: &mut Machine) -> Control {
	pop_u256!(state, index);
	let index = as_usize_or_fail!(index);
	let value = state.memory.read_word(index);
	push_u256!(state, value);
	Control::Continue(1)
}

pub fn mstore(state: &mut Machine) -> Control {
	pop_u256!(state, index);
	pop_h256!(state, value);
	let index = as_usize_or_fail!(index);
	state.memory.write(&value[..], index);
	Control::Continue(1)
}

pub fn mstore8(state: &mut Machine) -> Control {
	pop_u256!(state, index, value);
	let index = as_usize_or_fail!(index);
	let value = (value.low_u32() & 0xff) as u8;
	state.memory.write(&[value], index);
	Control::Continue(1)
}

pub fn mcopy(state: &mut Machine) -> Control {
	pop_u256!(state, dst, src, len);

	if len.is_zero() {
		return Control::Continue(1);
	}
	let dst = as_usize_or_fail!(dst);
	let src = as_usize_or_fail!(src);
	let len = as_usize_or_fail!(len);
	state.memory.copy_within(dst, src, len);
	Control::Continue(1)
}

pub fn jump(state: &mut Machine) -> Control {
	pop_u256!(state, dest);
	let dest = as_usize_or_fail!(dest, ExitError::InvalidJump);
	Control::Jump(dest)
}

pub fn jumpi(state: &mut Machine) -> Control {
	pop_u256!(state, dest, value);
	if value.is_zero() {
		return Control::Continue(1);
	}
	let dest = as_usize_or_fail!(dest, ExitError::InvalidJump);
	Control::Jump(dest)
}

pub fn pc(state: &mut Machine, position: usize) -> Control {
	push_u256!(state, U256::from(position));
	Control::Continue(1)
}

pub fn msize(state: &mut Machine) -> Control {
	push_u256!(state, U256::from(state.memory.len()));
	Control::Continue(1)
}

pub fn push0(state: &mut Machine) -> Control {
	push_u256!(state, U256::zero());
	Control::Continue(1)
}

pub fn push(state: &mut Machine, n: usize, position: usize) -> Control {
	let value = state.code.push_data(position, n);
	push_u256!(state, value);
	Control::Continue(1 + n)
}

pub fn dup(state: &mut Machine, n: usize) -> Control {
	try_or_fail!(state.stack.dup(n - 1));
	Control::Continue(1)
}

pub fn swap(state: &mut Machine, n: usize) -> Control {
	try_or_fail!(state.stack.swap(n));
	Control::Continue(1)
}

/// Pops the output span of RETURN/REVERT and makes it addressable.
fn output_range(state: &mut Machine) -> Result<(usize, usize), ExitError> {
	let start = state.stack.pop()?;
	let len = state.stack.pop()?;
	if len.is_zero() {
		return Ok((0, 0));
	}
	if start > crate::utils::USIZE_MAX || len > crate::utils::USIZE_MAX {
		return Err(ExitError::InvalidRange);
	}
	let (start, len) = (start.as_usize(), len.as_usize());
	if start.checked_add(len).is_none() {
		return Err(ExitError::InvalidRange);
	}
	state.memory.grow(start, len);
	Ok((start, len))
}

pub fn ret(state: &mut Machine) -> Control {
	let (start, len) = try_or_fail!(output_range(state));
	state.return_range = start..start + len;
	Control::Exit(ExitSucceed::Returned.into())
}

pub fn revert(state: &mut Machine) -> Control {
	let (start, len) = try_or_fail!(output_range(state));
	state.return_range = start..start + len;
	Control::Exit(ExitRevert::Reverted.into())
}
