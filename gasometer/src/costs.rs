use crate::consts::*;
use crate::utils::log2floor;
use crate::Config;
use ctvm_core::ExitError;
use primitive_types::{H256, U256};

/// Total price of `words` words of memory: `3 * words + words^2 / 512`.
pub fn memory_gas(words: usize) -> Result<u64, ExitError> {
	let words = u64::try_from(words).map_err(|_| ExitError::OutOfGas)?;
	let square = words.checked_mul(words).ok_or(ExitError::OutOfGas)?;
	G_MEMORY
		.checked_mul(words)
		.and_then(|linear| linear.checked_add(square / 512))
		.ok_or(ExitError::OutOfGas)
}

pub fn selfdestruct_refund(already_removed: bool) -> i64 {
	if already_removed {
		0
	} else {
		R_SELFDESTRUCT
	}
}

pub fn sstore_refund(original: H256, current: H256, new: H256, config: &Config) -> i64 {
	if current == new {
		return 0;
	}

	if original == current && new == H256::default() {
		return config.refund_sstore_clears();
	}

	let mut refund = 0;
	if original != H256::default() {
		if current == H256::default() {
			refund -= config.refund_sstore_clears();
		} else if new == H256::default() {
			refund += config.refund_sstore_clears();
		}
	}

	if original == new {
		let (gas_sstore_reset, gas_sload) = (config.gas_sstore_reset(), config.gas_sload());
		if original == H256::default() {
			refund += (config.gas_sstore_set() - gas_sload) as i64;
		} else {
			refund += (gas_sstore_reset - gas_sload) as i64;
		}
	}

	refund
}

pub fn create2_cost(len: U256) -> Result<u64, ExitError> {
	let base = U256::from(G_CREATE);
	let sha_addup_base = len / U256::from(32)
		+ if len % U256::from(32) == U256::zero() {
			U256::zero()
		} else {
			U256::one()
		};
	let sha_addup = U256::from(G_SHA3WORD)
		.checked_mul(sha_addup_base)
		.ok_or(ExitError::OutOfGas)?;
	let gas = base.checked_add(sha_addup).ok_or(ExitError::OutOfGas)?;

	if gas > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}

	Ok(gas.as_u64())
}

/// EIP-3860 word cost of init code, on top of the create price.
pub fn initcode_cost(len: U256, config: &Config) -> Result<u64, ExitError> {
	match config.max_initcode_size() {
		Some(limit) => {
			if len > U256::from(limit) {
				return Err(ExitError::MaxInitCodeSizeExceeded);
			}
			let words = (len.as_u64() + 31) / 32;
			Ok(words * G_INITCODE_WORD)
		}
		None => Ok(0),
	}
}

pub fn exp_cost(power: U256, config: &Config) -> Result<u64, ExitError> {
	if power == U256::zero() {
		Ok(G_EXP)
	} else {
		let gas = U256::from(G_EXP)
			.checked_add(
				U256::from(config.gas_expbyte())
					.checked_mul(U256::from(log2floor(power) / 8 + 1))
					.ok_or(ExitError::OutOfGas)?,
			)
			.ok_or(ExitError::OutOfGas)?;

		if gas > U256::from(u64::MAX) {
			return Err(ExitError::OutOfGas);
		}

		Ok(gas.as_u64())
	}
}

/// Base price plus 3 gas per copied word.
pub fn copy_cost(base: u64, len: U256) -> Result<u64, ExitError> {
	let wordd = len / U256::from(32);
	let wordr = len % U256::from(32);

	let gas = U256::from(base)
		.checked_add(
			U256::from(G_COPY)
				.checked_mul(if wordr == U256::zero() {
					wordd
				} else {
					wordd + U256::one()
				})
				.ok_or(ExitError::OutOfGas)?,
		)
		.ok_or(ExitError::OutOfGas)?;

	if gas > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}

	Ok(gas.as_u64())
}

pub fn extcodecopy_cost(len: U256, is_cold: bool, config: &Config) -> Result<u64, ExitError> {
	copy_cost(address_access_cost(is_cold, config.gas_ext_code(), config), len)
}

pub fn log_cost(n: u8, len: U256) -> Result<u64, ExitError> {
	let gas = U256::from(G_LOG)
		.checked_add(
			U256::from(G_LOGDATA)
				.checked_mul(len)
				.ok_or(ExitError::OutOfGas)?,
		)
		.ok_or(ExitError::OutOfGas)?
		.checked_add(U256::from(G_LOGTOPIC * n as u64))
		.ok_or(ExitError::OutOfGas)?;

	if gas > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}

	Ok(gas.as_u64())
}

pub fn sha3_cost(len: U256) -> Result<u64, ExitError> {
	let wordd = len / U256::from(32);
	let wordr = len % U256::from(32);

	let gas = U256::from(G_SHA3)
		.checked_add(
			U256::from(G_SHA3WORD)
				.checked_mul(if wordr == U256::zero() {
					wordd
				} else {
					wordd + U256::one()
				})
				.ok_or(ExitError::OutOfGas)?,
		)
		.ok_or(ExitError::OutOfGas)?;

	if gas > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}

	Ok(gas.as_u64())
}

pub fn sload_cost(is_cold: bool, config: &Config) -> u64 {
	if config.eip2929_increase_state_access_gas {
		if is_cold {
			config.gas_sload_cold()
		} else {
			config.gas_storage_read_warm()
		}
	} else {
		config.gas_sload()
	}
}

pub fn sstore_cost(
	original: H256,
	current: H256,
	new: H256,
	gas: u64,
	is_cold: bool,
	config: &Config,
) -> Result<u64, ExitError> {
	if gas <= config.call_stipend() {
		return Err(ExitError::OutOfGas);
	}

	let gas_cost = if new == current {
		config.gas_sload()
	} else if original == current {
		if original == H256::zero() {
			config.gas_sstore_set()
		} else {
			config.gas_sstore_reset()
		}
	} else {
		config.gas_sload()
	};

	Ok(gas_cost
		+ if is_cold {
			config.gas_sload_cold()
		} else {
			0
		})
}

pub fn selfdestruct_cost(value: U256, is_cold: bool, new_account: bool, config: &Config) -> u64 {
	let selfdestruct_gas_topup = if new_account && value != U256::zero() {
		config.gas_selfdestruct_new_account()
	} else {
		0
	};

	let mut gas = config.gas_selfdestruct() + selfdestruct_gas_topup;
	if config.eip2929_increase_state_access_gas && is_cold {
		gas += config.gas_account_access_cold()
	}

	gas
}

pub fn call_cost(
	value: U256,
	is_cold: bool,
	is_call_or_callcode: bool,
	is_call_or_staticcall: bool,
	new_account: bool,
	config: &Config,
) -> u64 {
	let transfers_value = value != U256::default();
	address_access_cost(is_cold, config.gas_call(), config)
		+ xfer_cost(is_call_or_callcode, transfers_value)
		+ new_cost(is_call_or_staticcall, new_account, transfers_value)
}

pub fn address_access_cost(is_cold: bool, regular_value: u64, config: &Config) -> u64 {
	if config.eip2929_increase_state_access_gas {
		if is_cold {
			config.gas_account_access_cold()
		} else {
			config.gas_storage_read_warm()
		}
	} else {
		regular_value
	}
}

fn xfer_cost(is_call_or_callcode: bool, transfers_value: bool) -> u64 {
	if is_call_or_callcode && transfers_value {
		G_CALLVALUE
	} else {
		0
	}
}

fn new_cost(is_call_or_staticcall: bool, new_account: bool, transfers_value: bool) -> u64 {
	if is_call_or_staticcall && transfers_value && new_account {
		G_NEWACCOUNT
	} else {
		0
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{BERLIN, ISTANBUL, LONDON};

	fn word(v: u64) -> H256 {
		H256::from_low_u64_be(v)
	}

	// (original, current, new) for each storage status, in the order
	// Added, Deleted, Modified, DeletedAdded, ModifiedDeleted,
	// DeletedRestored, AddedDeleted, ModifiedRestored.
	const TRANSITIONS: [(u64, u64, u64); 8] = [
		(0, 0, 1),
		(1, 1, 0),
		(1, 1, 2),
		(1, 0, 2),
		(1, 2, 0),
		(1, 0, 1),
		(0, 1, 0),
		(1, 2, 1),
	];

	fn table(config: &Config) -> Vec<(u64, i64)> {
		TRANSITIONS
			.iter()
			.map(|&(o, c, n)| {
				(
					sstore_cost(word(o), word(c), word(n), 10_000, false, config).unwrap(),
					sstore_refund(word(o), word(c), word(n), config),
				)
			})
			.collect()
	}

	#[test]
	fn sstore_istanbul() {
		assert_eq!(
			table(&ISTANBUL),
			vec![
				(20000, 0),
				(5000, 15000),
				(5000, 0),
				(800, -15000),
				(800, 15000),
				(800, -15000 + 4200),
				(800, 19200),
				(800, 4200),
			]
		);
	}

	#[test]
	fn sstore_berlin() {
		assert_eq!(
			table(&BERLIN),
			vec![
				(20000, 0),
				(2900, 15000),
				(2900, 0),
				(100, -15000),
				(100, 15000),
				(100, -15000 + 2800),
				(100, 19900),
				(100, 2800),
			]
		);
	}

	#[test]
	fn sstore_london() {
		assert_eq!(
			table(&LONDON),
			vec![
				(20000, 0),
				(2900, 4800),
				(2900, 0),
				(100, -4800),
				(100, 4800),
				(100, -4800 + 2800),
				(100, 19900),
				(100, 2800),
			]
		);
		assert_eq!(
			sstore_cost(word(0), word(0), word(1), 10_000, true, &LONDON),
			Ok(22100)
		);
	}

	#[test]
	fn sstore_needs_more_than_stipend() {
		assert_eq!(
			sstore_cost(word(0), word(0), word(1), 2300, false, &LONDON),
			Err(ExitError::OutOfGas)
		);
	}

	#[test]
	fn memory_price_is_quadratic() {
		assert_eq!(memory_gas(0), Ok(0));
		assert_eq!(memory_gas(1), Ok(3));
		assert_eq!(memory_gas(32), Ok(98));
		assert_eq!(memory_gas(1024), Ok(3072 + 2048));
		assert_eq!(memory_gas(usize::MAX), Err(ExitError::OutOfGas));
	}

	#[test]
	fn exp_counts_exponent_bytes() {
		assert_eq!(exp_cost(U256::zero(), &LONDON), Ok(10));
		assert_eq!(exp_cost(U256::from(0xff), &LONDON), Ok(60));
		assert_eq!(exp_cost(U256::from(0x100), &LONDON), Ok(110));
		assert_eq!(exp_cost(U256::MAX, &LONDON), Ok(10 + 50 * 32));
	}

	#[test]
	fn call_surcharges() {
		let one = U256::one();
		assert_eq!(call_cost(U256::zero(), true, true, true, true, &ISTANBUL), 700);
		assert_eq!(call_cost(one, true, true, true, true, &ISTANBUL), 700 + 9000 + 25000);
		assert_eq!(call_cost(one, false, true, true, false, &BERLIN), 100 + 9000);
		assert_eq!(call_cost(one, true, true, false, true, &BERLIN), 2600 + 9000);
	}
}
