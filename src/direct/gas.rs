//! Prices charged by the direct interpreter, keyed on the revision.

use crate::{ExitError, Revision, StorageStatus};
use primitive_types::U256;

pub const ZERO: u64 = 0;
pub const BASE: u64 = 2;
pub const VERYLOW: u64 = 3;
pub const LOW: u64 = 5;
pub const MID: u64 = 8;
pub const HIGH: u64 = 10;
pub const JUMPDEST: u64 = 1;
pub const BLOCKHASH: u64 = 20;
pub const TRANSIENT: u64 = 100;
pub const KECCAK: u64 = 30;
pub const KECCAK_WORD: u64 = 6;
pub const COPY_WORD: u64 = 3;
pub const EXP: u64 = 10;
pub const EXP_BYTE: u64 = 50;
pub const LOG: u64 = 375;
pub const LOG_TOPIC: u64 = 375;
pub const LOG_DATA: u64 = 8;
pub const CREATE: u64 = 32000;
pub const INITCODE_WORD: u64 = 2;
pub const MAX_INITCODE_SIZE: u64 = 0xc000;
pub const CALL_VALUE: u64 = 9000;
pub const NEW_ACCOUNT: u64 = 25000;
pub const STIPEND: u64 = 2300;
pub const SELFDESTRUCT: u64 = 5000;
pub const SELFDESTRUCT_REFUND: i64 = 24000;

const COLD_ACCOUNT: u64 = 2600;
const COLD_SLOT: u64 = 2100;
const SSTORE_SET: u64 = 20000;

/// Ceiling of `len / 32`.
pub fn words(len: U256) -> U256 {
	len / U256::from(32) + if (len % U256::from(32)).is_zero() { U256::zero() } else { U256::one() }
}

/// `base + per_word * words(len)`, out of gas when it leaves `u64`.
pub fn per_word(base: u64, per_word: u64, len: U256) -> Result<u64, ExitError> {
	let cost = words(len)
		.checked_mul(U256::from(per_word))
		.and_then(|cost| cost.checked_add(U256::from(base)))
		.ok_or(ExitError::OutOfGas)?;
	if cost > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}
	Ok(cost.as_u64())
}

pub fn exp(exponent: U256) -> u64 {
	EXP + EXP_BYTE * ((exponent.bits() as u64 + 7) / 8)
}

pub fn log(topics: usize, len: U256) -> Result<u64, ExitError> {
	let cost = len
		.checked_mul(U256::from(LOG_DATA))
		.and_then(|cost| cost.checked_add(U256::from(LOG + LOG_TOPIC * topics as u64)))
		.ok_or(ExitError::OutOfGas)?;
	if cost > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}
	Ok(cost.as_u64())
}

/// Word price of init code from Shanghai on, which also caps its size.
pub fn initcode(revision: Revision, len: U256) -> Result<u64, ExitError> {
	if revision < Revision::Shanghai {
		return Ok(0);
	}
	if len > U256::from(MAX_INITCODE_SIZE) {
		return Err(ExitError::MaxInitCodeSizeExceeded);
	}
	per_word(0, INITCODE_WORD, len)
}

/// Price of touching another account: flat before Berlin, warm or cold
/// after it.
pub fn account_access(revision: Revision, is_cold: bool) -> u64 {
	match (revision >= Revision::Berlin, is_cold) {
		(false, _) => 700,
		(true, true) => COLD_ACCOUNT,
		(true, false) => 100,
	}
}

/// Price of a warm storage read, also paid by writes that leave the slot
/// dirty.
pub fn warm_read(revision: Revision) -> u64 {
	if revision >= Revision::Berlin {
		100
	} else {
		800
	}
}

pub fn sload(revision: Revision, is_cold: bool) -> u64 {
	if revision >= Revision::Berlin && is_cold {
		COLD_SLOT
	} else {
		warm_read(revision)
	}
}

fn sstore_reset(revision: Revision) -> u64 {
	if revision >= Revision::Berlin {
		5000 - COLD_SLOT
	} else {
		5000
	}
}

fn sstore_clear_refund(revision: Revision) -> i64 {
	if revision >= Revision::London {
		4800
	} else {
		15000
	}
}

pub fn sstore(revision: Revision, status: StorageStatus, is_cold: bool) -> u64 {
	let cold = if revision >= Revision::Berlin && is_cold {
		COLD_SLOT
	} else {
		0
	};
	let cost = match status {
		StorageStatus::Added => SSTORE_SET,
		StorageStatus::Deleted | StorageStatus::Modified => sstore_reset(revision),
		StorageStatus::Assigned
		| StorageStatus::DeletedAdded
		| StorageStatus::ModifiedDeleted
		| StorageStatus::DeletedRestored
		| StorageStatus::AddedDeleted
		| StorageStatus::ModifiedRestored => warm_read(revision),
	};
	cost + cold
}

pub fn sstore_refund(revision: Revision, status: StorageStatus) -> i64 {
	let clear = sstore_clear_refund(revision);
	let restore_set = (SSTORE_SET - warm_read(revision)) as i64;
	let restore_reset = (sstore_reset(revision) - warm_read(revision)) as i64;
	match status {
		StorageStatus::Assigned | StorageStatus::Added | StorageStatus::Modified => 0,
		StorageStatus::Deleted | StorageStatus::ModifiedDeleted => clear,
		StorageStatus::DeletedAdded => -clear,
		StorageStatus::DeletedRestored => restore_reset - clear,
		StorageStatus::AddedDeleted => restore_set,
		StorageStatus::ModifiedRestored => restore_reset,
	}
}

/// Refund for the first self-destruct of an account, gone from London on.
pub fn selfdestruct_refund(revision: Revision) -> i64 {
	if revision >= Revision::London {
		0
	} else {
		SELFDESTRUCT_REFUND
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn word_prices() {
		assert_eq!(per_word(3, 3, U256::zero()), Ok(3));
		assert_eq!(per_word(3, 3, U256::from(33)), Ok(9));
		assert_eq!(per_word(30, 6, U256::MAX), Err(ExitError::OutOfGas));
		assert_eq!(exp(U256::zero()), 10);
		assert_eq!(exp(U256::from(0x100)), 110);
		assert_eq!(log(2, U256::from(4)), Ok(375 + 750 + 32));
	}

	#[test]
	fn sstore_tables_per_revision() {
		use StorageStatus::*;

		assert_eq!(sstore(Revision::Istanbul, Modified, true), 5000);
		assert_eq!(sstore(Revision::Berlin, Modified, true), 5000);
		assert_eq!(sstore(Revision::Berlin, Assigned, false), 100);
		assert_eq!(sstore(Revision::London, Added, true), 22100);

		assert_eq!(sstore_refund(Revision::Istanbul, Deleted), 15000);
		assert_eq!(sstore_refund(Revision::London, Deleted), 4800);
		assert_eq!(sstore_refund(Revision::Istanbul, DeletedRestored), 4200 - 15000);
		assert_eq!(sstore_refund(Revision::London, AddedDeleted), 19900);
		assert_eq!(sstore_refund(Revision::Berlin, ModifiedRestored), 2800);
	}

	#[test]
	fn initcode_is_capped_from_shanghai() {
		let big = U256::from(MAX_INITCODE_SIZE + 1);
		assert_eq!(initcode(Revision::Paris, big), Ok(0));
		assert_eq!(
			initcode(Revision::Shanghai, big),
			Err(ExitError::MaxInitCodeSizeExceeded)
		);
		assert_eq!(initcode(Revision::Shanghai, U256::from(64)), Ok(4));
	}
}
