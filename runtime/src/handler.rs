use crate::{CallScheme, Context, CreateScheme, ExitReason};
use alloc::vec::Vec;
use auto_impl::auto_impl;
use primitive_types::{H160, H256, U256};

/// Transfer from source to target, with given value.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transfer {
	/// Source address.
	pub source: H160,
	/// Target address.
	pub target: H160,
	/// Transfer value.
	pub value: U256,
}

/// Effect of a storage write, classified by the slot's value at the start
/// of the transaction (original), before the write (current) and after it
/// (new). `X`, `Y` and `Z` stand for distinct nonzero values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StorageStatus {
	/// Any write not covered below, including no-op writes.
	Assigned,
	/// `0 -> 0 -> Z`
	Added,
	/// `X -> X -> 0`
	Deleted,
	/// `X -> X -> Z`
	Modified,
	/// `X -> 0 -> Z`
	DeletedAdded,
	/// `X -> Y -> 0`
	ModifiedDeleted,
	/// `X -> 0 -> X`
	DeletedRestored,
	/// `0 -> Y -> 0`
	AddedDeleted,
	/// `X -> Y -> X`
	ModifiedRestored,
}

impl StorageStatus {
	pub fn classify(original: H256, current: H256, new: H256) -> Self {
		let zero = H256::zero();
		if current == new {
			return Self::Assigned;
		}
		if original == current {
			return if original == zero {
				Self::Added
			} else if new == zero {
				Self::Deleted
			} else {
				Self::Modified
			};
		}
		// The slot is already dirty from here on.
		if original == zero {
			return if new == zero {
				Self::AddedDeleted
			} else {
				Self::Assigned
			};
		}
		if current == zero {
			if new == original {
				Self::DeletedRestored
			} else {
				Self::DeletedAdded
			}
		} else if new == zero {
			Self::ModifiedDeleted
		} else if new == original {
			Self::ModifiedRestored
		} else {
			Self::Assigned
		}
	}
}

/// Nested message call issued by `CALL`, `CALLCODE`, `DELEGATECALL` or
/// `STATICCALL`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallRequest {
	pub scheme: CallScheme,
	/// Address whose code is executed.
	pub code_address: H160,
	/// Context the callee runs in.
	pub context: Context,
	pub transfer: Option<Transfer>,
	pub input: Vec<u8>,
	/// Gas handed to the callee, stipend included.
	pub gas_limit: u64,
	pub is_static: bool,
	/// Depth of the callee frame.
	pub depth: usize,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallOutcome {
	pub reason: ExitReason,
	pub output: Vec<u8>,
	/// Unused gas credited back to the caller.
	pub gas_left: u64,
	pub gas_refund: i64,
}

impl CallOutcome {
	/// A call that never started, returning all of its gas.
	pub fn aborted(reason: ExitReason, gas_limit: u64) -> Self {
		Self {
			reason,
			output: Vec::new(),
			gas_left: gas_limit,
			gas_refund: 0,
		}
	}
}

/// Contract creation issued by `CREATE` or `CREATE2`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateRequest {
	pub caller: H160,
	pub scheme: CreateScheme,
	pub value: U256,
	pub init_code: Vec<u8>,
	pub gas_limit: u64,
	/// Depth of the init code frame.
	pub depth: usize,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateOutcome {
	pub reason: ExitReason,
	/// Address of the new contract, set only on success.
	pub address: Option<H160>,
	/// Revert data of the init code; empty otherwise.
	pub output: Vec<u8>,
	pub gas_left: u64,
	pub gas_refund: i64,
}

impl CreateOutcome {
	/// A creation that never started, returning all of its gas.
	pub fn aborted(reason: ExitReason, gas_limit: u64) -> Self {
		Self {
			reason,
			address: None,
			output: Vec::new(),
			gas_left: gas_limit,
			gas_refund: 0,
		}
	}
}

/// EVM context handler.
#[auto_impl(&mut, Box)]
pub trait Handler {
	/// Get balance of address.
	fn balance(&self, address: H160) -> U256;
	/// Get code size of address.
	fn code_size(&self, address: H160) -> U256;
	/// Get code hash of address. Zero for accounts that do not exist.
	fn code_hash(&self, address: H160) -> H256;
	/// Get code of address.
	fn code(&self, address: H160) -> Vec<u8>;
	/// Get nonce of address.
	fn nonce(&self, address: H160) -> U256;
	/// Check whether an address exists.
	fn exists(&self, address: H160) -> bool;
	/// Check whether an address is absent or has no code, nonce and balance.
	fn is_empty(&self, address: H160) -> bool;
	/// Check whether an address has already been marked for deletion.
	fn deleted(&self, address: H160) -> bool;

	/// Get storage value of address at index.
	fn storage(&self, address: H160, index: H256) -> H256;
	/// Get storage value of address at index as of the transaction start.
	fn original_storage(&self, address: H160, index: H256) -> H256;
	/// Get transient storage value of address at index.
	fn transient_storage(&self, address: H160, index: H256) -> H256;

	/// Get environmental block hash.
	fn block_hash(&self, number: U256) -> H256;
	/// Get environmental block number.
	fn block_number(&self) -> U256;
	/// Get environmental coinbase.
	fn block_coinbase(&self) -> H160;
	/// Get environmental block timestamp.
	fn block_timestamp(&self) -> U256;
	/// Get environmental block difficulty.
	fn block_difficulty(&self) -> U256;
	/// Get environmental block randomness.
	fn block_randomness(&self) -> H256;
	/// Get environmental gas limit.
	fn block_gas_limit(&self) -> U256;
	/// Environmental block base fee.
	fn block_base_fee_per_gas(&self) -> U256;
	/// Get environmental chain ID.
	fn chain_id(&self) -> U256;
	/// Versioned hash of the transaction's blob at `index`, zero if none.
	fn blob_hash(&self, index: U256) -> H256;
	/// Environmental blob base fee.
	fn blob_base_fee_per_gas(&self) -> U256;
	/// Get execution origin.
	fn origin(&self) -> H160;
	/// Get the gas price value.
	fn gas_price(&self) -> U256;

	/// Checks if the address or (address, index) pair has been previously
	/// accessed in this transaction.
	fn is_cold(&self, address: H160, index: Option<H256>) -> bool;
	/// Record an access of the address or (address, index) pair.
	fn mark_hot(&mut self, address: H160, index: Option<H256>);

	/// Set storage value of address at index.
	fn set_storage(&mut self, address: H160, index: H256, value: H256);
	/// Set transient storage value of address at index.
	fn set_transient_storage(&mut self, address: H160, index: H256, value: H256);
	/// Create a log owned by address with given topics and data.
	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>);
	/// Mark an address to be deleted, with funds transferred to target.
	fn mark_delete(&mut self, address: H160, target: H160);

	/// Invoke a call operation.
	fn call(&mut self, request: CallRequest) -> CallOutcome;
	/// Invoke a create operation.
	fn create(&mut self, request: CreateRequest) -> CreateOutcome;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn word(v: u64) -> H256 {
		H256::from_low_u64_be(v)
	}

	#[test]
	fn classifies_every_transition() {
		use StorageStatus::*;

		let cases = [
			(0, 0, 0, Assigned),
			(0, 0, 3, Added),
			(1, 1, 0, Deleted),
			(1, 1, 3, Modified),
			(1, 0, 3, DeletedAdded),
			(1, 2, 0, ModifiedDeleted),
			(1, 0, 1, DeletedRestored),
			(0, 2, 0, AddedDeleted),
			(1, 2, 1, ModifiedRestored),
			(1, 2, 3, Assigned),
			(0, 2, 3, Assigned),
			(1, 2, 2, Assigned),
		];
		for (original, current, new, expected) in cases {
			assert_eq!(
				StorageStatus::classify(word(original), word(current), word(new)),
				expected,
				"{original} -> {current} -> {new}"
			);
		}
	}
}
