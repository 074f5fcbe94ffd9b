use super::Control;
use crate::{
	CallInterrupt, CallScheme, Context, CreateInterrupt, CreateScheme, ExitError, ExitSucceed,
	Handler, Revision, Runtime, Transfer,
};
use alloc::vec::Vec;
use ctvm_core::utils::USIZE_MAX;
use primitive_types::{H256, U256};
use sha3::{Digest, Keccak256};

/// Turns an (offset, length) pair from the stack into a memory span. A
/// zero length yields `None` whatever the offset.
fn memory_span(offset: U256, len: U256) -> Result<Option<(usize, usize)>, ExitError> {
	if len.is_zero() {
		return Ok(None);
	}
	if offset > USIZE_MAX || len > USIZE_MAX {
		return Err(ExitError::InvalidRange);
	}
	let (offset, len) = (offset.as_usize(), len.as_usize());
	if offset.checked_add(len).is_none() {
		return Err(ExitError::InvalidRange);
	}
	Ok(Some((offset, len)))
}

fn read_span(runtime: &mut Runtime, offset: U256, len: U256) -> Result<Vec<u8>, ExitError> {
	Ok(match memory_span(offset, len)? {
		Some((offset, len)) => runtime.machine.memory_mut().read(offset, len),
		None => Vec::new(),
	})
}

pub fn keccak256(runtime: &mut Runtime) -> Control {
	pop!(runtime, u256: from, len);

	let ret = match exit_on_err!(memory_span(from, len)) {
		Some((from, len)) => runtime.machine.memory_mut().hash(from, len),
		None => H256::from_slice(Keccak256::digest(b"").as_slice()),
	};
	push!(runtime, h256: ret);

	Control::Continue
}

pub fn chainid<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	push!(runtime, u256: handler.chain_id());

	Control::Continue
}

pub fn address(runtime: &mut Runtime) -> Control {
	let ret = H256::from(runtime.context.address);
	push!(runtime, h256: ret);

	Control::Continue
}

pub fn balance<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	pop!(runtime, h256: address);
	push!(runtime, u256: handler.balance(address.into()));

	Control::Continue
}

pub fn selfbalance<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	push!(runtime, u256: handler.balance(runtime.context.address));

	Control::Continue
}

pub fn origin<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	let ret = H256::from(handler.origin());
	push!(runtime, h256: ret);

	Control::Continue
}

pub fn caller(runtime: &mut Runtime) -> Control {
	let ret = H256::from(runtime.context.caller);
	push!(runtime, h256: ret);

	Control::Continue
}

pub fn callvalue(runtime: &mut Runtime) -> Control {
	push!(runtime, u256: runtime.context.apparent_value);

	Control::Continue
}

pub fn gasprice<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	push!(runtime, u256: handler.gas_price());

	Control::Continue
}

pub fn base_fee<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	push!(runtime, u256: handler.block_base_fee_per_gas());

	Control::Continue
}

pub fn blob_hash<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	pop!(runtime, u256: index);
	push!(runtime, h256: handler.blob_hash(index));

	Control::Continue
}

pub fn blob_base_fee<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	push!(runtime, u256: handler.blob_base_fee_per_gas());

	Control::Continue
}

pub fn extcodesize<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	pop!(runtime, h256: address);
	push!(runtime, u256: handler.code_size(address.into()));

	Control::Continue
}

pub fn extcodehash<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	pop!(runtime, h256: address);
	push!(runtime, h256: handler.code_hash(address.into()));

	Control::Continue
}

pub fn extcodecopy<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	pop!(runtime, h256: address);
	pop!(runtime, u256: memory_offset, code_offset, len);

	if let Some((memory_offset, len)) = exit_on_err!(memory_span(memory_offset, len)) {
		let code = handler.code(address.into());
		runtime
			.machine
			.memory_mut()
			.copy_padded(memory_offset, code_offset, len, &code);
	}

	Control::Continue
}

pub fn returndatasize(runtime: &mut Runtime) -> Control {
	let size = U256::from(runtime.return_data_buffer.len());
	push!(runtime, u256: size);

	Control::Continue
}

pub fn returndatacopy(runtime: &mut Runtime) -> Control {
	pop!(runtime, u256: memory_offset, data_offset, len);

	if data_offset
		.checked_add(len)
		.map(|l| l > U256::from(runtime.return_data_buffer.len()))
		.unwrap_or(true)
	{
		return Control::Exit(ExitError::OutOfOffset.into());
	}

	if let Some((memory_offset, len)) = exit_on_err!(memory_span(memory_offset, len)) {
		runtime.machine.memory_mut().copy_padded(
			memory_offset,
			data_offset,
			len,
			&runtime.return_data_buffer,
		);
	}

	Control::Continue
}

pub fn blockhash<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	pop!(runtime, u256: number);
	push!(runtime, h256: handler.block_hash(number));

	Control::Continue
}

pub fn coinbase<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	push!(runtime, h256: handler.block_coinbase().into());
	Control::Continue
}

pub fn timestamp<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	push!(runtime, u256: handler.block_timestamp());
	Control::Continue
}

pub fn number<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	push!(runtime, u256: handler.block_number());
	Control::Continue
}

/// `DIFFICULTY` before the merge, `PREVRANDAO` after it.
pub fn prevrandao<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	if runtime.revision >= Revision::Paris {
		push!(runtime, h256: handler.block_randomness());
	} else {
		push!(runtime, u256: handler.block_difficulty());
	}
	Control::Continue
}

pub fn gaslimit<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	push!(runtime, u256: handler.block_gas_limit());
	Control::Continue
}

pub fn sload<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	pop!(runtime, h256: index);
	let value = handler.storage(runtime.context.address, index);
	push!(runtime, h256: value);

	Control::Continue
}

pub fn sstore<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop!(runtime, h256: index, value);

	handler.set_storage(runtime.context.address, index, value);
	Control::Continue
}

pub fn tload<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &H) -> Control {
	pop!(runtime, h256: index);
	let value = handler.transient_storage(runtime.context.address, index);
	push!(runtime, h256: value);

	Control::Continue
}

pub fn tstore<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop!(runtime, h256: index, value);

	handler.set_transient_storage(runtime.context.address, index, value);
	Control::Continue
}

pub fn gas(runtime: &mut Runtime, gas_left: u64) -> Control {
	push!(runtime, u256: U256::from(gas_left));

	Control::Continue
}

pub fn log<H: Handler + ?Sized>(runtime: &mut Runtime, topics: usize, handler: &mut H) -> Control {
	pop!(runtime, u256: offset, len);
	let data = exit_on_err!(read_span(runtime, offset, len));

	let mut words = Vec::with_capacity(topics);
	for _ in 0..topics {
		pop!(runtime, h256: topic);
		words.push(topic);
	}

	handler.log(runtime.context.address, words, data);
	Control::Continue
}

pub fn selfdestruct<H: Handler + ?Sized>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop!(runtime, h256: target);

	handler.mark_delete(runtime.context.address, target.into());
	Control::Exit(ExitSucceed::SelfDestructed.into())
}

pub fn create(runtime: &mut Runtime, is_create2: bool) -> Control {
	runtime.return_data_buffer = Vec::new();

	pop!(runtime, u256: value, code_offset, len);
	let init_code = exit_on_err!(read_span(runtime, code_offset, len));

	let caller = runtime.context.address;
	let scheme = if is_create2 {
		pop!(runtime, h256: salt);
		let code_hash = H256::from_slice(Keccak256::digest(&init_code).as_slice());
		CreateScheme::Create2 {
			caller,
			salt,
			code_hash,
		}
	} else {
		CreateScheme::Legacy { caller }
	};

	Control::CreateInterrupt(CreateInterrupt {
		caller,
		scheme,
		value,
		init_code,
		depth: runtime.depth + 1,
	})
}

pub fn call(runtime: &mut Runtime, scheme: CallScheme) -> Control {
	runtime.return_data_buffer = Vec::new();

	pop!(runtime, u256: gas);
	pop!(runtime, h256: to);

	let value = match scheme {
		CallScheme::Call | CallScheme::CallCode => {
			pop!(runtime, u256: value);
			value
		}
		CallScheme::DelegateCall | CallScheme::StaticCall => U256::zero(),
	};

	pop!(runtime, u256: in_offset, in_len, out_offset, out_len);

	let input = exit_on_err!(read_span(runtime, in_offset, in_len));
	let (out_offset, out_len) = match exit_on_err!(memory_span(out_offset, out_len)) {
		Some((offset, len)) => {
			runtime.machine.memory_mut().grow(offset, len);
			(offset, len)
		}
		None => (0, 0),
	};

	let context = match scheme {
		CallScheme::Call | CallScheme::StaticCall => Context {
			address: to.into(),
			caller: runtime.context.address,
			apparent_value: value,
		},
		CallScheme::CallCode => Context {
			address: runtime.context.address,
			caller: runtime.context.address,
			apparent_value: value,
		},
		CallScheme::DelegateCall => Context {
			address: runtime.context.address,
			caller: runtime.context.caller,
			apparent_value: runtime.context.apparent_value,
		},
	};

	let transfer = match scheme {
		CallScheme::Call => Some(Transfer {
			source: runtime.context.address,
			target: to.into(),
			value,
		}),
		CallScheme::CallCode => Some(Transfer {
			source: runtime.context.address,
			target: runtime.context.address,
			value,
		}),
		CallScheme::DelegateCall | CallScheme::StaticCall => None,
	};

	Control::CallInterrupt(
		CallInterrupt {
			scheme,
			code_address: to.into(),
			context,
			transfer,
			input,
			gas,
			is_static: runtime.is_static || scheme == CallScheme::StaticCall,
			depth: runtime.depth + 1,
		},
		out_offset,
		out_len,
	)
}
