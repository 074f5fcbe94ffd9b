use std::collections::{BTreeMap, BTreeSet};
use std::mem;

use primitive_types::{H160, H256, U256};

use crate::backend::{Log, WorldState};
use crate::{ExitError, ExitFatal, Transfer};

#[derive(Clone, Debug, Default)]
struct StackAccount {
	nonce: U256,
	balance: U256,
	/// `None` while the code is still the one in the world state.
	code: Option<Vec<u8>>,
	/// Storage was wiped by a creation; the world state's slots no longer
	/// apply.
	reset: bool,
}

/// Changes made by one frame on top of its parent's. Entering a frame
/// pushes a fresh layer; leaving it either folds the layer into the parent
/// or drops it.
#[derive(Debug, Default)]
pub struct Substate {
	parent: Option<Box<Substate>>,
	logs: Vec<Log>,
	accounts: BTreeMap<H160, StackAccount>,
	storages: BTreeMap<(H160, H256), H256>,
	transients: BTreeMap<(H160, H256), H256>,
	deletes: BTreeSet<H160>,
	created: BTreeSet<H160>,
	accessed_addresses: BTreeSet<H160>,
	accessed_storages: BTreeSet<(H160, H256)>,
}

impl Substate {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn depth(&self) -> usize {
		match &self.parent {
			Some(parent) => parent.depth() + 1,
			None => 0,
		}
	}

	pub fn enter(&mut self) {
		let mut entering = Self::new();
		mem::swap(&mut entering, self);
		self.parent = Some(Box::new(entering));
	}

	pub fn exit_commit(&mut self) -> Result<(), ExitFatal> {
		let mut exited = *self
			.parent
			.take()
			.ok_or(ExitFatal::Other("cannot commit on root substate".into()))?;
		mem::swap(&mut exited, self);

		self.logs.append(&mut exited.logs);
		self.accounts.append(&mut exited.accounts);
		self.storages.append(&mut exited.storages);
		self.transients.append(&mut exited.transients);
		self.deletes.append(&mut exited.deletes);
		self.created.append(&mut exited.created);
		self.accessed_addresses.append(&mut exited.accessed_addresses);
		self.accessed_storages.append(&mut exited.accessed_storages);

		Ok(())
	}

	pub fn exit_revert(&mut self) -> Result<(), ExitFatal> {
		let mut exited = *self
			.parent
			.take()
			.ok_or(ExitFatal::Other("cannot revert on root substate".into()))?;
		mem::swap(&mut exited, self);

		Ok(())
	}

	/// Folds all changes into `world`, removing the accounts marked for
	/// deletion. Returns the logs. Transient storage and access sets are
	/// dropped.
	pub fn apply(self, world: &mut WorldState) -> Vec<Log> {
		debug_assert!(self.parent.is_none());

		let mut addresses: BTreeSet<H160> = self.accounts.keys().copied().collect();
		addresses.extend(self.storages.keys().map(|(address, _)| *address));

		for address in addresses {
			if self.deletes.contains(&address) {
				continue;
			}

			let mut account = world.get(&address).cloned().unwrap_or_default();
			if let Some(changed) = self.accounts.get(&address) {
				account.nonce = changed.nonce;
				account.balance = changed.balance;
				if let Some(code) = &changed.code {
					account.code = code.clone();
				}
				if changed.reset {
					account.storage = BTreeMap::new();
				}
			}
			for ((owner, index), value) in self.storages.range((address, H256::zero())..) {
				if *owner != address {
					break;
				}
				account.storage.insert(*index, *value);
			}
			world.insert(address, account);
		}

		for address in &self.deletes {
			world.remove(address);
		}

		self.logs
	}

	fn known_account(&self, address: H160) -> Option<&StackAccount> {
		if let Some(account) = self.accounts.get(&address) {
			Some(account)
		} else if let Some(parent) = self.parent.as_ref() {
			parent.known_account(address)
		} else {
			None
		}
	}

	pub fn exists(&self, address: H160, world: &WorldState) -> bool {
		self.known_account(address).is_some() || world.exists(address)
	}

	pub fn nonce(&self, address: H160, world: &WorldState) -> U256 {
		match self.known_account(address) {
			Some(account) => account.nonce,
			None => world.get(&address).map(|a| a.nonce).unwrap_or_default(),
		}
	}

	pub fn balance(&self, address: H160, world: &WorldState) -> U256 {
		match self.known_account(address) {
			Some(account) => account.balance,
			None => world.get(&address).map(|a| a.balance).unwrap_or_default(),
		}
	}

	pub fn code(&self, address: H160, world: &WorldState) -> Vec<u8> {
		self.known_account(address)
			.and_then(|account| account.code.clone())
			.unwrap_or_else(|| world.get(&address).map(|a| a.code.clone()).unwrap_or_default())
	}

	pub fn storage(&self, address: H160, index: H256, world: &WorldState) -> H256 {
		self.known_storage(address, index)
			.unwrap_or_else(|| world.storage(address, index))
	}

	fn known_storage(&self, address: H160, index: H256) -> Option<H256> {
		if let Some(value) = self.storages.get(&(address, index)) {
			return Some(*value);
		}

		if let Some(account) = self.accounts.get(&address) {
			if account.reset {
				return Some(H256::default());
			}
		}

		if let Some(parent) = self.parent.as_ref() {
			return parent.known_storage(address, index);
		}

		None
	}

	/// Storage value as of the start of the transaction.
	pub fn original_storage(&self, address: H160, index: H256, world: &WorldState) -> H256 {
		if self.was_reset(address) {
			return H256::default();
		}
		world.storage(address, index)
	}

	fn was_reset(&self, address: H160) -> bool {
		if let Some(account) = self.accounts.get(&address) {
			if account.reset {
				return true;
			}
		}
		match self.parent.as_ref() {
			Some(parent) => parent.was_reset(address),
			None => false,
		}
	}

	pub fn transient_storage(&self, address: H160, index: H256) -> H256 {
		if let Some(value) = self.transients.get(&(address, index)) {
			return *value;
		}
		match self.parent.as_ref() {
			Some(parent) => parent.transient_storage(address, index),
			None => H256::default(),
		}
	}

	pub fn deleted(&self, address: H160) -> bool {
		self.deletes.contains(&address)
			|| self
				.parent
				.as_ref()
				.map(|parent| parent.deleted(address))
				.unwrap_or(false)
	}

	pub fn created(&self, address: H160) -> bool {
		self.created.contains(&address)
			|| self
				.parent
				.as_ref()
				.map(|parent| parent.created(address))
				.unwrap_or(false)
	}

	pub fn is_cold(&self, address: H160, index: Option<H256>) -> bool {
		let hot = match index {
			None => self.accessed_addresses.contains(&address),
			Some(index) => self.accessed_storages.contains(&(address, index)),
		};
		if hot {
			return false;
		}
		match self.parent.as_ref() {
			Some(parent) => parent.is_cold(address, index),
			None => true,
		}
	}

	pub fn mark_hot(&mut self, address: H160, index: Option<H256>) {
		match index {
			None => {
				self.accessed_addresses.insert(address);
			}
			Some(index) => {
				self.accessed_storages.insert((address, index));
			}
		}
	}

	fn account_mut(&mut self, address: H160, world: &WorldState) -> &mut StackAccount {
		let inherited = if self.accounts.contains_key(&address) {
			None
		} else {
			Some(self.known_account(address).cloned().unwrap_or_else(|| {
				let (nonce, balance) = world
					.get(&address)
					.map(|account| (account.nonce, account.balance))
					.unwrap_or_default();
				StackAccount {
					nonce,
					balance,
					code: None,
					reset: false,
				}
			}))
		};

		self.accounts
			.entry(address)
			.or_insert_with(|| inherited.unwrap_or_default())
	}

	pub fn inc_nonce(&mut self, address: H160, world: &WorldState) {
		let account = self.account_mut(address, world);
		account.nonce = account.nonce.saturating_add(U256::one());
	}

	/// Turns `address` into a fresh contract account with nonce 1 and no
	/// storage, keeping its balance.
	pub fn create_account(&mut self, address: H160, world: &WorldState) {
		let stale: Vec<H256> = self
			.storages
			.keys()
			.filter(|(owner, _)| *owner == address)
			.map(|(_, index)| *index)
			.collect();
		for index in stale {
			self.storages.remove(&(address, index));
		}

		let account = self.account_mut(address, world);
		account.nonce = U256::one();
		account.code = Some(Vec::new());
		account.reset = true;
		self.created.insert(address);
	}

	pub fn set_code(&mut self, address: H160, code: Vec<u8>, world: &WorldState) {
		self.account_mut(address, world).code = Some(code);
	}

	pub fn set_storage(&mut self, address: H160, index: H256, value: H256) {
		self.storages.insert((address, index), value);
	}

	pub fn set_transient_storage(&mut self, address: H160, index: H256, value: H256) {
		self.transients.insert((address, index), value);
	}

	pub fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) {
		self.logs.push(Log {
			address,
			topics,
			data,
		});
	}

	pub fn set_deleted(&mut self, address: H160) {
		self.deletes.insert(address);
	}

	pub fn set_balance(&mut self, address: H160, balance: U256, world: &WorldState) {
		self.account_mut(address, world).balance = balance;
	}

	/// Moves value between accounts. A zero-value transfer leaves absent
	/// accounts absent.
	pub fn transfer(&mut self, transfer: &Transfer, world: &WorldState) -> Result<(), ExitError> {
		let source_balance = self.balance(transfer.source, world);
		if source_balance < transfer.value {
			return Err(ExitError::OutOfFund);
		}
		if transfer.value.is_zero() {
			return Ok(());
		}

		self.account_mut(transfer.source, world).balance = source_balance - transfer.value;
		let target = self.account_mut(transfer.target, world);
		target.balance = target.balance.saturating_add(transfer.value);

		Ok(())
	}
}
