//! Gas metering: per-revision schedules and a gasometer that prices an
//! opcode from the stack and the world before it runs.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod config;
mod consts;
mod costs;
mod utils;

pub use crate::config::Config;
pub use crate::costs::memory_gas;
pub use crate::utils::l64;

use core::cmp::{max, min};
use ctvm_core::{ExitError, Opcode, Stack};
use ctvm_runtime::Handler;
use primitive_types::{H160, H256, U256};

/// Account or slot an opcode touches, to be marked warm once it is paid for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StorageTarget {
	/// No storage access.
	None,
	/// Accessed an address.
	Address(H160),
	/// Accessed a storage slot.
	Slot(H160, H256),
}

/// EVM gasometer.
#[derive(Clone, Debug)]
pub struct Gasometer<'config> {
	gas_limit: u64,
	memory_gas: u64,
	/// Memory gas paid before the gasometer took over the frame.
	memory_paid: u64,
	used_gas: u64,
	refunded_gas: i64,
	config: &'config Config,
}

impl<'config> Gasometer<'config> {
	/// Create a new gasometer with given gas limit and config.
	pub fn new(gas_limit: u64, config: &'config Config) -> Self {
		Self {
			gas_limit,
			memory_gas: 0,
			memory_paid: 0,
			used_gas: 0,
			refunded_gas: 0,
			config,
		}
	}

	/// Gasometer of a frame that already paid for `memory_len` bytes of
	/// memory, left with `gas` and having accrued `refunded_gas`. Only
	/// growth beyond that memory is charged. Returns `None` when the memory
	/// could never have been paid for.
	pub fn resume(
		gas: u64,
		refunded_gas: i64,
		memory_len: usize,
		config: &'config Config,
	) -> Option<Self> {
		let memory_gas = memory_gas(memory_len / 32).ok()?;
		Some(Self {
			gas_limit: gas,
			memory_gas,
			memory_paid: memory_gas,
			used_gas: 0,
			refunded_gas,
			config,
		})
	}

	/// Reference to the config.
	pub fn config(&self) -> &'config Config {
		self.config
	}

	/// Remaining gas.
	pub fn gas(&self) -> u64 {
		self.gas_limit - self.total_used_gas()
	}

	/// Total used gas, memory included.
	pub fn total_used_gas(&self) -> u64 {
		self.used_gas + (self.memory_gas - self.memory_paid)
	}

	/// Refunded gas.
	pub fn refunded_gas(&self) -> i64 {
		self.refunded_gas
	}

	/// Consume all remaining gas and drop refunds.
	pub fn fail(&mut self) {
		self.memory_gas = 0;
		self.memory_paid = 0;
		self.refunded_gas = 0;
		self.used_gas = self.gas_limit;
	}

	/// Run `f`, failing the gasometer if it errors.
	fn perform<R, F: FnOnce(&mut Self) -> Result<R, ExitError>>(
		&mut self,
		f: F,
	) -> Result<R, ExitError> {
		match f(self) {
			Ok(r) => Ok(r),
			Err(e) => {
				log::trace!(target: "gasometer", "failed with {:?} at {} gas used", e, self.total_used_gas());
				self.fail();
				Err(e)
			}
		}
	}

	/// Record an explicit cost.
	pub fn record_cost(&mut self, cost: u64) -> Result<(), ExitError> {
		let all_gas_cost = self.total_used_gas().checked_add(cost);
		match all_gas_cost {
			Some(all_gas_cost) if all_gas_cost <= self.gas_limit => {
				self.used_gas += cost;
				Ok(())
			}
			_ => Err(ExitError::OutOfGas),
		}
	}

	/// Record a refund, which may be negative.
	pub fn record_refund(&mut self, refund: i64) {
		self.refunded_gas += refund;
	}

	/// Give back gas a nested frame did not use.
	pub fn return_gas(&mut self, gas: u64) {
		self.used_gas = self.used_gas.saturating_sub(gas);
	}

	/// Record the code deposit of a successful creation.
	pub fn record_deposit(&mut self, len: usize) -> Result<(), ExitError> {
		self.perform(|gasometer| {
			let cost = (len as u64)
				.checked_mul(consts::G_CODEDEPOSIT)
				.ok_or(ExitError::OutOfGas)?;
			gasometer.record_cost(cost)
		})
	}

	fn set_memory_gas(&mut self, memory_gas: u64) -> Result<(), ExitError> {
		match self.used_gas.checked_add(memory_gas - self.memory_paid) {
			Some(all_gas_cost) if all_gas_cost <= self.gas_limit => {
				self.memory_gas = memory_gas;
				Ok(())
			}
			_ => Err(ExitError::OutOfGas),
		}
	}

	/// Charge `opcode` about to run at `address` with `stack`, including
	/// any memory expansion and refund. Returns the account or slot to warm.
	pub fn record_opcode<H: Handler + ?Sized>(
		&mut self,
		address: H160,
		opcode: Opcode,
		stack: &Stack,
		is_static: bool,
		handler: &H,
	) -> Result<StorageTarget, ExitError> {
		self.perform(|gasometer| {
			if let Some(cost) = consts::STATIC_COST_TABLE[opcode.as_usize()] {
				gasometer.record_cost(cost)?;
				return Ok(StorageTarget::None);
			}

			let (gas_cost, target, memory_cost) =
				dynamic_opcode_cost(address, opcode, stack, is_static, gasometer.config, handler)?;
			let cost = gas_cost.cost(gasometer.gas(), gasometer.config)?;
			gasometer.record_cost(cost)?;
			gasometer.record_refund(gas_cost.refund(gasometer.config));

			if let Some(memory_cost) = memory_cost {
				if let Some(memory_gas) = memory_cost.cost()? {
					gasometer.set_memory_gas(max(gasometer.memory_gas, memory_gas))?;
				}
			}

			Ok(target)
		})
	}
}

/// Gas forwarded to a nested call that asked for `requested` while the
/// caller has `gas` left after paying for the call itself.
pub fn call_gas_limit(requested: U256, gas: u64) -> u64 {
	let available = l64(gas);
	if requested > U256::from(available) {
		available
	} else {
		min(requested.as_u64(), available)
	}
}

/// Calculate the opcode cost.
#[allow(clippy::nonminimal_bool)]
fn dynamic_opcode_cost<H: Handler + ?Sized>(
	address: H160,
	opcode: Opcode,
	stack: &Stack,
	is_static: bool,
	config: &Config,
	handler: &H,
) -> Result<(GasCost, StorageTarget, Option<MemoryCost>), ExitError> {
	let mut storage_target = StorageTarget::None;
	let gas_cost = match opcode {
		Opcode::RETURN | Opcode::REVERT => GasCost::Zero,

		Opcode::MLOAD | Opcode::MSTORE | Opcode::MSTORE8 => GasCost::VeryLow,

		Opcode::BASEFEE if config.eip3198_base_fee => GasCost::Base,
		Opcode::PUSH0 if config.eip3855_push0 => GasCost::Base,
		Opcode::BLOBHASH if config.eip4844_blob_hash => GasCost::VeryLow,
		Opcode::BLOBBASEFEE if config.eip7516_blob_base_fee => GasCost::Base,
		Opcode::TLOAD if config.eip1153_transient_storage => GasCost::Transient,
		Opcode::TSTORE if config.eip1153_transient_storage && !is_static => GasCost::Transient,
		Opcode::MCOPY if config.eip5656_mcopy => GasCost::VeryLowCopy {
			len: stack.peek(2)?,
		},

		Opcode::EXTCODESIZE => {
			let target = stack.peek_h256(0)?.into();
			storage_target = StorageTarget::Address(target);
			GasCost::ExtCodeSize {
				target_is_cold: handler.is_cold(target, None),
			}
		}
		Opcode::BALANCE => {
			let target = stack.peek_h256(0)?.into();
			storage_target = StorageTarget::Address(target);
			GasCost::Balance {
				target_is_cold: handler.is_cold(target, None),
			}
		}
		Opcode::EXTCODEHASH => {
			let target = stack.peek_h256(0)?.into();
			storage_target = StorageTarget::Address(target);
			GasCost::ExtCodeHash {
				target_is_cold: handler.is_cold(target, None),
			}
		}
		Opcode::EXTCODECOPY => {
			let target = stack.peek_h256(0)?.into();
			storage_target = StorageTarget::Address(target);
			GasCost::ExtCodeCopy {
				target_is_cold: handler.is_cold(target, None),
				len: stack.peek(3)?,
			}
		}

		Opcode::CALLCODE => {
			let target = stack.peek_h256(1)?.into();
			storage_target = StorageTarget::Address(target);
			GasCost::CallCode {
				value: stack.peek(2)?,
				target_is_cold: handler.is_cold(target, None),
				target_is_empty: handler.is_empty(target),
			}
		}
		Opcode::STATICCALL => {
			let target = stack.peek_h256(1)?.into();
			storage_target = StorageTarget::Address(target);
			GasCost::StaticCall {
				target_is_cold: handler.is_cold(target, None),
			}
		}
		Opcode::DELEGATECALL => {
			let target = stack.peek_h256(1)?.into();
			storage_target = StorageTarget::Address(target);
			GasCost::DelegateCall {
				target_is_cold: handler.is_cold(target, None),
			}
		}
		Opcode::CALL if !is_static || stack.peek(2)?.is_zero() => {
			let target = stack.peek_h256(1)?.into();
			storage_target = StorageTarget::Address(target);
			GasCost::Call {
				value: stack.peek(2)?,
				target_is_cold: handler.is_cold(target, None),
				target_is_empty: handler.is_empty(target),
			}
		}

		Opcode::KECCAK256 => GasCost::Sha3 {
			len: stack.peek(1)?,
		},
		Opcode::CALLDATACOPY | Opcode::CODECOPY | Opcode::RETURNDATACOPY => {
			GasCost::VeryLowCopy {
				len: stack.peek(2)?,
			}
		}
		Opcode::EXP => GasCost::Exp {
			power: stack.peek(1)?,
		},
		Opcode::SLOAD => {
			let index = stack.peek_h256(0)?;
			storage_target = StorageTarget::Slot(address, index);
			GasCost::SLoad {
				target_is_cold: handler.is_cold(address, Some(index)),
			}
		}
		Opcode::SSTORE if !is_static => {
			let index = stack.peek_h256(0)?;
			let value = stack.peek_h256(1)?;
			storage_target = StorageTarget::Slot(address, index);

			GasCost::SStore {
				original: handler.original_storage(address, index),
				current: handler.storage(address, index),
				new: value,
				target_is_cold: handler.is_cold(address, Some(index)),
			}
		}
		Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 if !is_static => {
			GasCost::Log {
				n: opcode.0 - Opcode::LOG0.0,
				len: stack.peek(1)?,
			}
		}
		Opcode::CREATE if !is_static => GasCost::Create {
			len: stack.peek(2)?,
		},
		Opcode::CREATE2 if !is_static => GasCost::Create2 {
			len: stack.peek(2)?,
		},
		Opcode::SELFDESTRUCT if !is_static => {
			let target = stack.peek_h256(0)?.into();
			storage_target = StorageTarget::Address(target);
			GasCost::SelfDestruct {
				value: handler.balance(address),
				target_is_cold: handler.is_cold(target, None),
				target_is_empty: handler.is_empty(target),
				already_removed: handler.deleted(address),
			}
		}

		Opcode::SSTORE
		| Opcode::TSTORE
		| Opcode::LOG0
		| Opcode::LOG1
		| Opcode::LOG2
		| Opcode::LOG3
		| Opcode::LOG4
		| Opcode::CREATE
		| Opcode::CREATE2
		| Opcode::SELFDESTRUCT
		| Opcode::CALL
			if is_static =>
		{
			return Err(ExitError::StaticModeViolation)
		}

		_ => GasCost::Invalid(opcode),
	};

	let memory_cost = match opcode {
		Opcode::KECCAK256
		| Opcode::RETURN
		| Opcode::REVERT
		| Opcode::LOG0
		| Opcode::LOG1
		| Opcode::LOG2
		| Opcode::LOG3
		| Opcode::LOG4 => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: stack.peek(1)?,
		}),

		Opcode::CODECOPY | Opcode::CALLDATACOPY | Opcode::RETURNDATACOPY => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: stack.peek(2)?,
		}),

		Opcode::EXTCODECOPY => Some(MemoryCost {
			offset: stack.peek(1)?,
			len: stack.peek(3)?,
		}),

		Opcode::MLOAD | Opcode::MSTORE => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: U256::from(32),
		}),

		Opcode::MSTORE8 => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: U256::one(),
		}),

		Opcode::MCOPY => Some(
			MemoryCost {
				offset: stack.peek(0)?,
				len: stack.peek(2)?,
			}
			.join(MemoryCost {
				offset: stack.peek(1)?,
				len: stack.peek(2)?,
			}),
		),

		Opcode::CREATE | Opcode::CREATE2 => Some(MemoryCost {
			offset: stack.peek(1)?,
			len: stack.peek(2)?,
		}),

		Opcode::CALL | Opcode::CALLCODE => Some(
			MemoryCost {
				offset: stack.peek(3)?,
				len: stack.peek(4)?,
			}
			.join(MemoryCost {
				offset: stack.peek(5)?,
				len: stack.peek(6)?,
			}),
		),

		Opcode::DELEGATECALL | Opcode::STATICCALL => Some(
			MemoryCost {
				offset: stack.peek(2)?,
				len: stack.peek(3)?,
			}
			.join(MemoryCost {
				offset: stack.peek(4)?,
				len: stack.peek(5)?,
			}),
		),

		_ => None,
	};

	Ok((gas_cost, storage_target, memory_cost))
}

/// Gas cost.
#[derive(Debug, Clone, Copy)]
enum GasCost {
	/// Zero gas cost.
	Zero,
	/// Base gas cost.
	Base,
	/// Very low gas cost.
	VeryLow,
	/// Warm storage read price of transient storage.
	Transient,
	/// Fail the gasometer.
	Invalid(Opcode),

	/// Gas cost for `EXTCODESIZE`.
	ExtCodeSize {
		/// True if address has not been previously accessed in this transaction
		target_is_cold: bool,
	},
	/// Gas cost for `BALANCE`.
	Balance {
		/// True if address has not been previously accessed in this transaction
		target_is_cold: bool,
	},
	/// Gas cost for `EXTCODEHASH`.
	ExtCodeHash {
		/// True if address has not been previously accessed in this transaction
		target_is_cold: bool,
	},

	/// Gas cost for `CALL`.
	Call {
		/// Call value.
		value: U256,
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
		/// Whether the target is absent or empty.
		target_is_empty: bool,
	},
	/// Gas cost for `CALLCODE`.
	CallCode {
		/// Call value.
		value: U256,
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
		/// Whether the target is absent or empty.
		target_is_empty: bool,
	},
	/// Gas cost for `DELEGATECALL`.
	DelegateCall {
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
	},
	/// Gas cost for `STATICCALL`.
	StaticCall {
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
	},
	/// Gas cost for `SELFDESTRUCT`.
	SelfDestruct {
		/// Value.
		value: U256,
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
		/// Whether the target is absent or empty.
		target_is_empty: bool,
		/// Whether the target has already been removed.
		already_removed: bool,
	},
	/// Gas cost for `SSTORE`.
	SStore {
		/// Original value.
		original: H256,
		/// Current value.
		current: H256,
		/// New value.
		new: H256,
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
	},
	/// Gas cost for `KECCAK256`.
	Sha3 {
		/// Length of the data.
		len: U256,
	},
	/// Gas cost for `LOG`.
	Log {
		/// Topic length.
		n: u8,
		/// Data length.
		len: U256,
	},
	/// Gas cost for `EXTCODECOPY`.
	ExtCodeCopy {
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
		/// Length.
		len: U256,
	},
	/// Gas cost for some copy opcodes that is documented as `VERYLOW`.
	VeryLowCopy {
		/// Length.
		len: U256,
	},
	/// Gas cost for `EXP`.
	Exp {
		/// Power of `EXP`.
		power: U256,
	},
	/// Gas cost for `CREATE`.
	Create {
		/// Init code length.
		len: U256,
	},
	/// Gas cost for `CREATE2`.
	Create2 {
		/// Init code length.
		len: U256,
	},
	/// Gas cost for `SLOAD`.
	SLoad {
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
	},
}

impl GasCost {
	/// Returns the gas cost numerical value.
	fn cost(&self, gas: u64, config: &Config) -> Result<u64, ExitError> {
		Ok(match *self {
			GasCost::Call {
				value,
				target_is_cold,
				target_is_empty,
			} => costs::call_cost(value, target_is_cold, true, true, target_is_empty, config),
			GasCost::CallCode {
				value,
				target_is_cold,
				target_is_empty,
			} => costs::call_cost(value, target_is_cold, true, false, target_is_empty, config),
			GasCost::DelegateCall { target_is_cold } => {
				costs::call_cost(U256::zero(), target_is_cold, false, false, false, config)
			}
			GasCost::StaticCall { target_is_cold } => {
				costs::call_cost(U256::zero(), target_is_cold, false, true, false, config)
			}

			GasCost::SelfDestruct {
				value,
				target_is_cold,
				target_is_empty,
				..
			} => costs::selfdestruct_cost(value, target_is_cold, target_is_empty, config),
			GasCost::SStore {
				original,
				current,
				new,
				target_is_cold,
			} => costs::sstore_cost(original, current, new, gas, target_is_cold, config)?,

			GasCost::Sha3 { len } => costs::sha3_cost(len)?,
			GasCost::Log { n, len } => costs::log_cost(n, len)?,
			GasCost::VeryLowCopy { len } => costs::copy_cost(consts::G_VERYLOW, len)?,
			GasCost::Exp { power } => costs::exp_cost(power, config)?,
			GasCost::Create { len } => consts::G_CREATE + costs::initcode_cost(len, config)?,
			GasCost::Create2 { len } => {
				costs::create2_cost(len)? + costs::initcode_cost(len, config)?
			}
			GasCost::SLoad { target_is_cold } => costs::sload_cost(target_is_cold, config),

			GasCost::Zero => consts::G_ZERO,
			GasCost::Base => consts::G_BASE,
			GasCost::VeryLow => consts::G_VERYLOW,
			GasCost::Transient => consts::G_TRANSIENT,
			GasCost::Invalid(opcode) => return Err(ExitError::InvalidCode(opcode)),

			GasCost::ExtCodeSize { target_is_cold }
			| GasCost::Balance { target_is_cold }
			| GasCost::ExtCodeHash { target_is_cold } => {
				costs::address_access_cost(target_is_cold, config.gas_ext_code(), config)
			}
			GasCost::ExtCodeCopy {
				target_is_cold,
				len,
			} => costs::extcodecopy_cost(len, target_is_cold, config)?,
		})
	}

	/// Numeric value for the refund.
	fn refund(&self, config: &Config) -> i64 {
		match *self {
			GasCost::SStore {
				original,
				current,
				new,
				..
			} => costs::sstore_refund(original, current, new, config),
			GasCost::SelfDestruct {
				already_removed, ..
			} if !config.eip3529_decrease_clears_refund => costs::selfdestruct_refund(already_removed),
			_ => 0,
		}
	}
}

/// Memory cost.
#[derive(Debug, Clone, Copy)]
struct MemoryCost {
	/// Affected memory offset.
	pub offset: U256,
	/// Affected length.
	pub len: U256,
}

impl MemoryCost {
	/// Join two memory cost together.
	pub fn join(self, other: MemoryCost) -> MemoryCost {
		if self.len == U256::zero() {
			return other;
		}

		if other.len == U256::zero() {
			return self;
		}

		let self_end = self.offset.saturating_add(self.len);
		let other_end = other.offset.saturating_add(other.len);

		if self_end >= other_end {
			self
		} else {
			other
		}
	}

	/// Numeric value of the cost.
	pub fn cost(&self) -> Result<Option<u64>, ExitError> {
		let from = self.offset;
		let len = self.len;

		if len == U256::zero() {
			return Ok(None);
		}

		let end = from.checked_add(len).ok_or(ExitError::OutOfGas)?;

		if end > U256::from(usize::MAX) {
			return Err(ExitError::OutOfGas);
		}
		let end = end.as_usize();

		let rem = end % 32;
		let new = if rem == 0 { end / 32 } else { end / 32 + 1 };

		Ok(Some(costs::memory_gas(new)?))
	}
}

/// Transaction cost.
#[derive(Debug, Clone, Copy)]
pub enum TransactionCost {
	/// Call transaction cost.
	Call {
		/// Length of zeros in transaction data.
		zero_data_len: usize,
		/// Length of non-zeros in transaction data.
		non_zero_data_len: usize,
	},
	/// Create transaction cost.
	Create {
		/// Length of zeros in transaction data.
		zero_data_len: usize,
		/// Length of non-zeros in transaction data.
		non_zero_data_len: usize,
		/// Cost of initcode = 2 * ceil(len(initcode) / 32) (see EIP-3860)
		initcode_cost: u64,
	},
}

impl TransactionCost {
	pub fn call(data: &[u8]) -> TransactionCost {
		let zero_data_len = data.iter().filter(|v| **v == 0).count();
		let non_zero_data_len = data.len() - zero_data_len;

		TransactionCost::Call {
			zero_data_len,
			non_zero_data_len,
		}
	}

	pub fn create(data: &[u8]) -> TransactionCost {
		let zero_data_len = data.iter().filter(|v| **v == 0).count();
		let non_zero_data_len = data.len() - zero_data_len;
		let initcode_cost = consts::G_INITCODE_WORD * ((data.len() as u64 + 31) / 32);

		TransactionCost::Create {
			zero_data_len,
			non_zero_data_len,
			initcode_cost,
		}
	}

	/// Intrinsic gas of the transaction.
	pub fn cost(&self, config: &Config) -> u64 {
		match self {
			TransactionCost::Call {
				zero_data_len,
				non_zero_data_len,
			} => {
				config.gas_transaction_call()
					+ *zero_data_len as u64 * config.gas_transaction_zero_data()
					+ *non_zero_data_len as u64 * config.gas_transaction_non_zero_data()
			}
			TransactionCost::Create {
				zero_data_len,
				non_zero_data_len,
				initcode_cost,
			} => {
				let mut cost = config.gas_transaction_create()
					+ *zero_data_len as u64 * config.gas_transaction_zero_data()
					+ *non_zero_data_len as u64 * config.gas_transaction_non_zero_data();
				if config.max_initcode_size().is_some() {
					cost += initcode_cost;
				}

				cost
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ctvm_core::Revision;
	use ctvm_runtime::{CallOutcome, CallRequest, CreateOutcome, CreateRequest};
	use std::collections::BTreeMap;

	#[derive(Default)]
	struct Fixture {
		storage: BTreeMap<H256, H256>,
		warm: Vec<(H160, Option<H256>)>,
		existing: Vec<H160>,
	}

	impl Handler for Fixture {
		fn balance(&self, _: H160) -> U256 {
			U256::zero()
		}
		fn code_size(&self, _: H160) -> U256 {
			U256::zero()
		}
		fn code_hash(&self, _: H160) -> H256 {
			H256::zero()
		}
		fn code(&self, _: H160) -> Vec<u8> {
			Vec::new()
		}
		fn nonce(&self, _: H160) -> U256 {
			U256::zero()
		}
		fn exists(&self, address: H160) -> bool {
			self.existing.contains(&address)
		}
		fn is_empty(&self, address: H160) -> bool {
			!self.exists(address)
		}
		fn deleted(&self, _: H160) -> bool {
			false
		}
		fn storage(&self, _: H160, index: H256) -> H256 {
			self.storage.get(&index).copied().unwrap_or_default()
		}
		fn original_storage(&self, address: H160, index: H256) -> H256 {
			self.storage(address, index)
		}
		fn transient_storage(&self, _: H160, _: H256) -> H256 {
			H256::zero()
		}
		fn block_hash(&self, _: U256) -> H256 {
			H256::zero()
		}
		fn block_number(&self) -> U256 {
			U256::zero()
		}
		fn block_coinbase(&self) -> H160 {
			H160::zero()
		}
		fn block_timestamp(&self) -> U256 {
			U256::zero()
		}
		fn block_difficulty(&self) -> U256 {
			U256::zero()
		}
		fn block_randomness(&self) -> H256 {
			H256::zero()
		}
		fn block_gas_limit(&self) -> U256 {
			U256::zero()
		}
		fn block_base_fee_per_gas(&self) -> U256 {
			U256::zero()
		}
		fn chain_id(&self) -> U256 {
			U256::one()
		}
		fn blob_hash(&self, _: U256) -> H256 {
			H256::zero()
		}
		fn blob_base_fee_per_gas(&self) -> U256 {
			U256::zero()
		}
		fn origin(&self) -> H160 {
			H160::zero()
		}
		fn gas_price(&self) -> U256 {
			U256::zero()
		}
		fn is_cold(&self, address: H160, index: Option<H256>) -> bool {
			!self.warm.contains(&(address, index))
		}
		fn mark_hot(&mut self, address: H160, index: Option<H256>) {
			self.warm.push((address, index));
		}
		fn set_storage(&mut self, _: H160, index: H256, value: H256) {
			self.storage.insert(index, value);
		}
		fn set_transient_storage(&mut self, _: H160, _: H256, _: H256) {}
		fn log(&mut self, _: H160, _: Vec<H256>, _: Vec<u8>) {}
		fn mark_delete(&mut self, _: H160, _: H160) {}
		fn call(&mut self, request: CallRequest) -> CallOutcome {
			CallOutcome::aborted(ExitError::NotSupported.into(), request.gas_limit)
		}
		fn create(&mut self, request: CreateRequest) -> CreateOutcome {
			CreateOutcome::aborted(ExitError::NotSupported.into(), request.gas_limit)
		}
	}

	fn stack(words: &[u64]) -> Stack {
		// Last element ends up on top.
		Stack::from_words(words.iter().map(|w| U256::from(*w)).collect()).unwrap()
	}

	#[test]
	fn static_opcode_is_charged_from_table() {
		let config = Config::for_revision(Revision::Cancun);
		let mut gasometer = Gasometer::new(10, config);
		let target = gasometer
			.record_opcode(H160::zero(), Opcode::ADD, &stack(&[1, 2]), false, &Fixture::default())
			.unwrap();

		assert_eq!(target, StorageTarget::None);
		assert_eq!(gasometer.gas(), 7);
	}

	#[test]
	fn out_of_gas_consumes_everything() {
		let config = Config::for_revision(Revision::Cancun);
		let mut gasometer = Gasometer::new(7, config);
		assert_eq!(
			gasometer.record_opcode(H160::zero(), Opcode::JUMPI, &stack(&[0, 0]), false, &Fixture::default()),
			Err(ExitError::OutOfGas)
		);
		assert_eq!(gasometer.gas(), 0);
	}

	#[test]
	fn mstore_pays_for_expansion() {
		let config = Config::for_revision(Revision::Cancun);
		let mut gasometer = Gasometer::new(100, config);
		gasometer
			.record_opcode(H160::zero(), Opcode::MSTORE, &stack(&[1, 0]), false, &Fixture::default())
			.unwrap();
		assert_eq!(gasometer.gas(), 100 - 3 - 3);

		// Already paid for the first word.
		gasometer
			.record_opcode(H160::zero(), Opcode::MSTORE, &stack(&[1, 0]), false, &Fixture::default())
			.unwrap();
		assert_eq!(gasometer.gas(), 100 - 3 - 3 - 3);
	}

	#[test]
	fn opcodes_follow_revision() {
		let fixture = Fixture::default();
		let mut berlin = Gasometer::new(100, Config::for_revision(Revision::Berlin));
		assert_eq!(
			berlin.record_opcode(H160::zero(), Opcode::BASEFEE, &Stack::new(), false, &fixture),
			Err(ExitError::InvalidCode(Opcode::BASEFEE))
		);

		let mut london = Gasometer::new(100, Config::for_revision(Revision::London));
		london
			.record_opcode(H160::zero(), Opcode::BASEFEE, &Stack::new(), false, &fixture)
			.unwrap();
		assert_eq!(
			london.record_opcode(H160::zero(), Opcode::PUSH0, &Stack::new(), false, &fixture),
			Err(ExitError::InvalidCode(Opcode::PUSH0))
		);

		let mut cancun = Gasometer::new(100, Config::for_revision(Revision::Cancun));
		cancun
			.record_opcode(H160::zero(), Opcode::TLOAD, &stack(&[0]), false, &fixture)
			.unwrap();
		assert_eq!(cancun.gas(), 0);
		assert_eq!(
			cancun.record_opcode(H160::zero(), Opcode(0x0c), &Stack::new(), false, &fixture),
			Err(ExitError::InvalidCode(Opcode(0x0c)))
		);
	}

	#[test]
	fn writes_fail_in_static_frames() {
		let fixture = Fixture::default();
		let config = Config::for_revision(Revision::Cancun);
		for (opcode, words) in [
			(Opcode::SSTORE, &[1u64, 0][..]),
			(Opcode::TSTORE, &[1, 0]),
			(Opcode::LOG0, &[0, 0]),
			(Opcode::CREATE, &[0, 0, 0]),
			(Opcode::SELFDESTRUCT, &[0]),
			(Opcode::CALL, &[0, 0, 0, 0, 1, 0, 100]),
		] {
			let mut gasometer = Gasometer::new(100_000, config);
			assert_eq!(
				gasometer.record_opcode(H160::zero(), opcode, &stack(words), true, &fixture),
				Err(ExitError::StaticModeViolation),
				"{:?}",
				opcode
			);
		}

		// Calls without value are allowed.
		let mut gasometer = Gasometer::new(100_000, config);
		gasometer
			.record_opcode(H160::zero(), Opcode::CALL, &stack(&[0, 0, 0, 0, 0, 0, 100]), true, &fixture)
			.unwrap();
	}

	#[test]
	fn sload_warms_its_slot() {
		let config = Config::for_revision(Revision::Berlin);
		let mut fixture = Fixture::default();
		let address = H160::repeat_byte(0xaa);
		let mut gasometer = Gasometer::new(10_000, config);

		let target = gasometer
			.record_opcode(address, Opcode::SLOAD, &stack(&[5]), false, &fixture)
			.unwrap();
		assert_eq!(target, StorageTarget::Slot(address, H256::from_low_u64_be(5)));
		assert_eq!(gasometer.gas(), 10_000 - 2100);

		fixture.mark_hot(address, Some(H256::from_low_u64_be(5)));
		gasometer
			.record_opcode(address, Opcode::SLOAD, &stack(&[5]), false, &fixture)
			.unwrap();
		assert_eq!(gasometer.gas(), 10_000 - 2100 - 100);
	}

	#[test]
	fn sstore_clear_records_refund() {
		let config = Config::for_revision(Revision::London);
		let mut fixture = Fixture::default();
		fixture.storage.insert(H256::zero(), H256::from_low_u64_be(1));
		fixture.warm.push((H160::zero(), Some(H256::zero())));

		let mut gasometer = Gasometer::new(10_000, config);
		gasometer
			.record_opcode(H160::zero(), Opcode::SSTORE, &stack(&[0, 0]), false, &fixture)
			.unwrap();
		assert_eq!(gasometer.gas(), 10_000 - 2900);
		assert_eq!(gasometer.refunded_gas(), 4800);
	}

	#[test]
	fn resumed_gasometer_keeps_memory_price() {
		let config = Config::for_revision(Revision::Cancun);
		let mut gasometer = Gasometer::resume(50, 0, 64, config).unwrap();
		assert_eq!(gasometer.gas(), 50);

		// Touching the second word again costs nothing extra.
		gasometer
			.record_opcode(H160::zero(), Opcode::MLOAD, &stack(&[32]), false, &Fixture::default())
			.unwrap();
		assert_eq!(gasometer.gas(), 47);

		// Growing past it is charged only the difference.
		gasometer
			.record_opcode(H160::zero(), Opcode::MLOAD, &stack(&[64]), false, &Fixture::default())
			.unwrap();
		assert_eq!(gasometer.gas(), 47 - 3 - (memory_gas(3).unwrap() - memory_gas(2).unwrap()));
	}

	#[test]
	fn resumes_with_all_gas_over_paid_memory() {
		let config = Config::for_revision(Revision::London);
		let mut gasometer = Gasometer::resume(u64::MAX, 0, 32, config).unwrap();
		assert_eq!(gasometer.gas(), u64::MAX);

		gasometer.record_cost(1).unwrap();
		assert_eq!(gasometer.gas(), u64::MAX - 1);
		gasometer.fail();
		assert_eq!(gasometer.gas(), 0);
	}

	#[test]
	fn forwards_all_but_one_64th() {
		assert_eq!(call_gas_limit(U256::MAX, 6400), 6300);
		assert_eq!(call_gas_limit(U256::from(1000), 6400), 1000);
		assert_eq!(call_gas_limit(U256::zero(), 6400), 0);
	}

	#[test]
	fn intrinsic_gas() {
		let cancun = Config::for_revision(Revision::Cancun);
		let istanbul = Config::for_revision(Revision::Istanbul);

		assert_eq!(TransactionCost::call(&[0, 1, 0]).cost(cancun), 21000 + 4 + 16 + 4);
		assert_eq!(TransactionCost::create(&[0x60; 33]).cost(cancun), 53000 + 33 * 16 + 4);
		assert_eq!(TransactionCost::create(&[0x60; 33]).cost(istanbul), 53000 + 33 * 16);
	}

	#[test]
	fn call_and_delegatecall_memory_joins_spans() {
		let joined = MemoryCost {
			offset: U256::from(0),
			len: U256::from(32),
		}
		.join(MemoryCost {
			offset: U256::from(64),
			len: U256::from(32),
		});
		assert_eq!(joined.cost(), Ok(Some(memory_gas(3).unwrap())));

		let empty = MemoryCost {
			offset: U256::MAX,
			len: U256::zero(),
		};
		assert_eq!(empty.cost(), Ok(None));
		assert_eq!(
			MemoryCost {
				offset: U256::MAX,
				len: U256::one(),
			}
			.cost(),
			Err(ExitError::OutOfGas)
		);
	}
}
