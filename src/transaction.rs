use primitive_types::{H160, H256, U256};

use crate::backend::Log;

/// Block environment a transaction executes in.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockParameters {
	pub number: U256,
	pub coinbase: H160,
	pub timestamp: U256,
	pub gas_limit: U256,
	/// Observed through `DIFFICULTY` before Paris.
	pub difficulty: U256,
	/// Observed through `PREVRANDAO` from Paris.
	pub prev_randao: H256,
	pub base_fee: U256,
	pub blob_base_fee: U256,
	pub chain_id: U256,
	/// Hashes of the preceding blocks, most recent first.
	pub block_hashes: Vec<H256>,
}

impl BlockParameters {
	/// Hash of block `number`, zero unless it is one of the known
	/// predecessors.
	pub fn block_hash(&self, number: U256) -> H256 {
		if number >= self.number
			|| self.number - number - U256::one() >= U256::from(self.block_hashes.len())
		{
			H256::default()
		} else {
			let index = (self.number - number - U256::one()).as_usize();
			self.block_hashes[index]
		}
	}
}

/// Unit of work submitted to the processor. No recipient means contract
/// creation with `input` as the init code.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transaction {
	pub sender: H160,
	pub recipient: Option<H160>,
	pub gas_limit: u64,
	pub value: U256,
	pub input: Vec<u8>,
	/// Observed through `GASPRICE`. Never charged.
	pub gas_price: U256,
	/// Versioned hashes observed through `BLOBHASH`.
	pub blob_hashes: Vec<H256>,
}

/// What a processed transaction left behind.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TransactionResult {
	pub success: bool,
	/// Returned or reverted data. Empty for failures and successful
	/// creations.
	pub output: Vec<u8>,
	pub contract_address: Option<H160>,
	/// Gas used after refunds.
	pub gas_used: u64,
	pub logs: Vec<Log>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_recent_block_hashes_are_known() {
		let block = BlockParameters {
			number: U256::from(10),
			block_hashes: vec![H256::repeat_byte(9), H256::repeat_byte(8)],
			..Default::default()
		};

		assert_eq!(block.block_hash(U256::from(9)), H256::repeat_byte(9));
		assert_eq!(block.block_hash(U256::from(8)), H256::repeat_byte(8));
		assert_eq!(block.block_hash(U256::from(7)), H256::zero());
		assert_eq!(block.block_hash(U256::from(10)), H256::zero());
		assert_eq!(block.block_hash(U256::MAX), H256::zero());
	}
}
