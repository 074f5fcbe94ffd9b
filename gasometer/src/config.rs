use ctvm_core::Revision;

/// Gas schedule and feature switches of one revision.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Config {
	/// Revision this schedule belongs to.
	pub revision: Revision,
	/// EIP-2929: cold/warm account and storage access pricing.
	pub eip2929_increase_state_access_gas: bool,
	/// EIP-3529: reduced SSTORE clear refund, no SELFDESTRUCT refund,
	/// refund quotient of 5.
	pub eip3529_decrease_clears_refund: bool,
	/// EIP-3541: reject new code starting with 0xEF.
	pub eip3541_disallow_executable_format: bool,
	/// EIP-3198: BASEFEE opcode.
	pub eip3198_base_fee: bool,
	/// EIP-4399: 0x44 returns the beacon randomness.
	pub eip4399_prev_randao: bool,
	/// EIP-3651: coinbase starts warm.
	pub eip3651_warm_coinbase_address: bool,
	/// EIP-3855: PUSH0 opcode.
	pub eip3855_push0: bool,
	/// EIP-3860: init code size limit and word cost.
	pub eip3860_max_initcode_size: bool,
	/// EIP-1153: TLOAD and TSTORE.
	pub eip1153_transient_storage: bool,
	/// EIP-5656: MCOPY.
	pub eip5656_mcopy: bool,
	/// EIP-4844: BLOBHASH.
	pub eip4844_blob_hash: bool,
	/// EIP-7516: BLOBBASEFEE.
	pub eip7516_blob_base_fee: bool,
	/// EIP-6780: SELFDESTRUCT only deletes accounts created in the same
	/// transaction.
	pub eip6780_selfdestruct_only_in_same_tx: bool,
}

pub static ISTANBUL: Config = Config::istanbul();
pub static BERLIN: Config = Config::berlin();
pub static LONDON: Config = Config::london();
pub static PARIS: Config = Config::paris();
pub static SHANGHAI: Config = Config::shanghai();
pub static CANCUN: Config = Config::cancun();

impl Config {
	/// Istanbul hard fork configuration.
	pub const fn istanbul() -> Config {
		Config {
			revision: Revision::Istanbul,
			eip2929_increase_state_access_gas: false,
			eip3529_decrease_clears_refund: false,
			eip3541_disallow_executable_format: false,
			eip3198_base_fee: false,
			eip4399_prev_randao: false,
			eip3651_warm_coinbase_address: false,
			eip3855_push0: false,
			eip3860_max_initcode_size: false,
			eip1153_transient_storage: false,
			eip5656_mcopy: false,
			eip4844_blob_hash: false,
			eip7516_blob_base_fee: false,
			eip6780_selfdestruct_only_in_same_tx: false,
		}
	}

	/// Berlin
	pub const fn berlin() -> Config {
		let mut config = Self::istanbul();
		config.revision = Revision::Berlin;
		config.eip2929_increase_state_access_gas = true;
		config
	}

	/// London
	pub const fn london() -> Config {
		let mut config = Self::berlin();
		config.revision = Revision::London;
		config.eip3198_base_fee = true;
		config.eip3529_decrease_clears_refund = true;
		config.eip3541_disallow_executable_format = true;
		config
	}

	/// Paris (the merge)
	pub const fn paris() -> Config {
		let mut config = Self::london();
		config.revision = Revision::Paris;
		config.eip4399_prev_randao = true;
		config
	}

	/// Shanghai
	pub const fn shanghai() -> Config {
		let mut config = Self::paris();
		config.revision = Revision::Shanghai;
		config.eip3651_warm_coinbase_address = true;
		config.eip3855_push0 = true;
		config.eip3860_max_initcode_size = true;
		config
	}

	/// Cancun
	pub const fn cancun() -> Config {
		let mut config = Self::shanghai();
		config.revision = Revision::Cancun;
		config.eip1153_transient_storage = true;
		config.eip5656_mcopy = true;
		config.eip4844_blob_hash = true;
		config.eip7516_blob_base_fee = true;
		config.eip6780_selfdestruct_only_in_same_tx = true;
		config
	}

	/// Shared schedule of `revision`.
	pub fn for_revision(revision: Revision) -> &'static Config {
		match revision {
			Revision::Istanbul => &ISTANBUL,
			Revision::Berlin => &BERLIN,
			Revision::London => &LONDON,
			Revision::Paris => &PARIS,
			Revision::Shanghai => &SHANGHAI,
			Revision::Cancun => &CANCUN,
		}
	}

	/// Gas paid for BALANCE, EXTCODESIZE, EXTCODEHASH and EXTCODECOPY
	/// before access lists.
	pub fn gas_ext_code(&self) -> u64 {
		700
	}

	/// Gas paid for sstore set.
	pub fn gas_sstore_set(&self) -> u64 {
		20000
	}

	/// Gas paid for sstore reset.
	pub fn gas_sstore_reset(&self) -> u64 {
		if self.eip2929_increase_state_access_gas {
			2900
		} else {
			5000
		}
	}

	/// Gas paid for sstore refund.
	pub fn refund_sstore_clears(&self) -> i64 {
		if self.eip3529_decrease_clears_refund {
			4800
		} else {
			15000
		}
	}

	/// EIP-3529
	pub fn max_refund_quotient(&self) -> u64 {
		if self.eip3529_decrease_clears_refund {
			5
		} else {
			2
		}
	}

	/// Gas paid for SLOAD opcode.
	pub fn gas_sload(&self) -> u64 {
		if self.eip2929_increase_state_access_gas {
			100
		} else {
			800
		}
	}

	/// Gas paid for cold SLOAD opcode.
	pub fn gas_sload_cold(&self) -> u64 {
		if self.eip2929_increase_state_access_gas {
			2100
		} else {
			0
		}
	}

	/// Gas paid for SELFDESTRUCT opcode.
	pub fn gas_selfdestruct(&self) -> u64 {
		5000
	}

	/// Gas paid for SELFDESTRUCT opcode when it hits a new account.
	pub fn gas_selfdestruct_new_account(&self) -> u64 {
		25000
	}

	/// Gas paid for CALL opcode before access lists.
	pub fn gas_call(&self) -> u64 {
		700
	}

	/// Gas paid for EXP opcode for every byte.
	pub fn gas_expbyte(&self) -> u64 {
		50
	}

	/// Gas paid for a contract creation transaction.
	pub fn gas_transaction_create(&self) -> u64 {
		53000
	}

	/// Gas paid for a message call transaction.
	pub fn gas_transaction_call(&self) -> u64 {
		21000
	}

	/// Gas paid for zero data in a transaction.
	pub fn gas_transaction_zero_data(&self) -> u64 {
		4
	}

	/// Gas paid for non-zero data in a transaction.
	pub fn gas_transaction_non_zero_data(&self) -> u64 {
		16
	}

	/// Gas paid for accessing cold account.
	pub fn gas_account_access_cold(&self) -> u64 {
		if self.eip2929_increase_state_access_gas {
			2600
		} else {
			0
		}
	}

	/// Gas paid for accessing ready storage.
	pub fn gas_storage_read_warm(&self) -> u64 {
		if self.eip2929_increase_state_access_gas {
			100
		} else {
			0
		}
	}

	/// Stack limit.
	pub fn stack_limit(&self) -> usize {
		1024
	}

	/// Call stack limit.
	pub fn call_stack_limit(&self) -> usize {
		1024
	}

	/// Call stipend.
	pub fn call_stipend(&self) -> u64 {
		2300
	}

	/// Maximum size limit of init code.
	pub fn max_initcode_size(&self) -> Option<usize> {
		if self.eip3860_max_initcode_size {
			Some(0xc000)
		} else {
			None
		}
	}

	/// Create contract limit.
	pub fn create_contract_limit(&self) -> usize {
		0x6000
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn forks_chain_their_switches() {
		for revision in Revision::ALL {
			assert_eq!(Config::for_revision(revision).revision, revision);
		}
		assert!(!ISTANBUL.eip2929_increase_state_access_gas);
		assert!(BERLIN.eip2929_increase_state_access_gas);
		assert!(CANCUN.eip2929_increase_state_access_gas);
		assert!(!PARIS.eip3855_push0);
		assert!(SHANGHAI.eip3855_push0);
		assert!(!SHANGHAI.eip1153_transient_storage);
	}

	#[test]
	fn sstore_prices_follow_access_lists() {
		assert_eq!(ISTANBUL.gas_sload(), 800);
		assert_eq!(ISTANBUL.gas_sstore_reset(), 5000);
		assert_eq!(BERLIN.gas_sload(), 100);
		assert_eq!(BERLIN.gas_sstore_reset(), 2900);
		assert_eq!(BERLIN.refund_sstore_clears(), 15000);
		assert_eq!(LONDON.refund_sstore_clears(), 4800);
		assert_eq!(LONDON.max_refund_quotient(), 5);
	}
}
