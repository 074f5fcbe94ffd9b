use std::collections::BTreeMap;

use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

/// Account information of the in-memory world state.
#[derive(Default, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Account {
	/// Account nonce.
	pub nonce: U256,
	/// Account balance.
	pub balance: U256,
	/// Full account storage. Zero values are never stored.
	pub storage: BTreeMap<H256, H256>,
	/// Account code.
	pub code: Vec<u8>,
}

impl Account {
	/// Whether the account has no code, nonce or balance.
	pub fn is_empty(&self) -> bool {
		self.balance.is_zero() && self.nonce.is_zero() && self.code.is_empty()
	}

	pub fn code_hash(&self) -> H256 {
		H256::from_slice(Keccak256::digest(&self.code).as_slice())
	}
}

/// A log entry emitted by `LOG0`..`LOG4`.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Log {
	pub address: H160,
	pub topics: Vec<H256>,
	pub data: Vec<u8>,
}

/// World state, storing all accounts in a `BTreeMap`. An absent address is
/// an account that does not exist.
#[derive(Default, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldState {
	accounts: BTreeMap<H160, Account>,
}

impl WorldState {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style insertion of an account.
	pub fn with_account(mut self, address: H160, account: Account) -> Self {
		self.insert(address, account);
		self
	}

	pub fn accounts(&self) -> &BTreeMap<H160, Account> {
		&self.accounts
	}

	pub fn get(&self, address: &H160) -> Option<&Account> {
		self.accounts.get(address)
	}

	pub fn exists(&self, address: H160) -> bool {
		self.accounts.contains_key(&address)
	}

	pub fn insert(&mut self, address: H160, mut account: Account) {
		account.storage.retain(|_, value| *value != H256::zero());
		self.accounts.insert(address, account);
	}

	pub fn remove(&mut self, address: &H160) -> Option<Account> {
		self.accounts.remove(address)
	}

	pub fn storage(&self, address: H160, index: H256) -> H256 {
		self.accounts
			.get(&address)
			.and_then(|account| account.storage.get(&index).copied())
			.unwrap_or_default()
	}

	/// Human-readable differences against `other`, empty when equal.
	pub fn diff(&self, other: &WorldState) -> Vec<String> {
		let mut out = Vec::new();
		for (address, account) in &self.accounts {
			match other.accounts.get(address) {
				None => out.push(format!("Account {:?} missing on the right", address)),
				Some(theirs) => diff_account(*address, account, theirs, &mut out),
			}
		}
		for address in other.accounts.keys() {
			if !self.accounts.contains_key(address) {
				out.push(format!("Account {:?} missing on the left", address));
			}
		}
		out
	}
}

fn diff_account(address: H160, ours: &Account, theirs: &Account, out: &mut Vec<String>) {
	if ours.nonce != theirs.nonce {
		out.push(format!(
			"Different nonce of {:?}: {} vs {}",
			address, ours.nonce, theirs.nonce
		));
	}
	if ours.balance != theirs.balance {
		out.push(format!(
			"Different balance of {:?}: {} vs {}",
			address, ours.balance, theirs.balance
		));
	}
	if ours.code != theirs.code {
		out.push(format!(
			"Different code of {:?}: {:?} vs {:?}",
			address,
			ours.code_hash(),
			theirs.code_hash()
		));
	}
	if ours.storage != theirs.storage {
		for (index, value) in &ours.storage {
			let other = theirs.storage.get(index).copied().unwrap_or_default();
			if *value != other {
				out.push(format!(
					"Different storage of {:?} at {:?}: {:?} vs {:?}",
					address, index, value, other
				));
			}
		}
		for (index, value) in &theirs.storage {
			if !ours.storage.contains_key(index) {
				out.push(format!(
					"Different storage of {:?} at {:?}: {:?} vs {:?}",
					address,
					index,
					H256::zero(),
					value
				));
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zero_storage_is_not_kept() {
		let mut account = Account::default();
		account.storage.insert(H256::repeat_byte(1), H256::zero());
		account.storage.insert(H256::repeat_byte(2), H256::repeat_byte(3));

		let world = WorldState::new().with_account(H160::repeat_byte(9), account);
		let stored = world.get(&H160::repeat_byte(9)).unwrap();
		assert_eq!(stored.storage.len(), 1);
		assert_eq!(
			world.storage(H160::repeat_byte(9), H256::repeat_byte(2)),
			H256::repeat_byte(3)
		);
		assert_eq!(world.storage(H160::repeat_byte(8), H256::repeat_byte(2)), H256::zero());
	}

	#[test]
	fn diff_reports_storage_and_missing_accounts() {
		let mut left = Account::default();
		left.storage.insert(H256::repeat_byte(1), H256::repeat_byte(1));
		let a = WorldState::new().with_account(H160::repeat_byte(1), left);
		let b = WorldState::new()
			.with_account(H160::repeat_byte(1), Account::default())
			.with_account(H160::repeat_byte(2), Account::default());

		let diff = a.diff(&b);
		assert_eq!(diff.len(), 2);
		assert!(diff[0].starts_with("Different storage"));
		assert!(diff[1].ends_with("missing on the left"));
		assert!(a.diff(&a.clone()).is_empty());
	}
}
