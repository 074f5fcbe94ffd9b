//! Reference transaction processor. It drives one interpreter through every
//! frame of a transaction and is the [`Handler`] those frames talk to.

mod substate;

pub use self::substate::Substate;

use core::cmp::{max, min};
use core::mem;

use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

use crate::backend::{Log, WorldState};
use crate::gasometer::{Config, Gasometer, TransactionCost};
use crate::{
	scheme_address, CallContext, CallOutcome, CallRequest, CallScheme, Code, Context,
	CreateOutcome, CreateRequest, CreateScheme, ExecutionState, ExitError, ExitFatal, ExitReason,
	ExitRevert, ExitSucceed, Handler, Interpreter, Revision, Status, StepError, Transfer,
};
use crate::{BlockParameters, Transaction, TransactionResult};

/// Executes transactions against an in-memory world state with a single
/// interpreter for all frames.
pub struct Processor<'i> {
	interpreter: &'i dyn Interpreter,
	world: WorldState,
	block: BlockParameters,
	revision: Revision,
	config: &'static Config,
	origin: H160,
	gas_price: U256,
	blob_hashes: Vec<H256>,
	substate: Substate,
	fatal: Option<StepError>,
}

impl<'i> Processor<'i> {
	pub fn new(
		interpreter: &'i dyn Interpreter,
		world: WorldState,
		block: BlockParameters,
		revision: Revision,
	) -> Self {
		Self {
			interpreter,
			world,
			block,
			revision,
			config: Config::for_revision(revision),
			origin: H160::default(),
			gas_price: U256::zero(),
			blob_hashes: Vec::new(),
			substate: Substate::new(),
			fatal: None,
		}
	}

	/// Sets what `ORIGIN` and `GASPRICE` observe outside of [`Processor::transact`].
	pub fn with_environment(mut self, origin: H160, gas_price: U256) -> Self {
		self.origin = origin;
		self.gas_price = gas_price;
		self
	}

	pub fn world(&self) -> &WorldState {
		&self.world
	}

	pub fn into_world(self) -> WorldState {
		self.world
	}

	pub fn interpreter(&self) -> &'i dyn Interpreter {
		self.interpreter
	}

	/// Marks the accounts a transaction starts with as already accessed.
	pub fn warm_up(&mut self, addresses: &[H160]) {
		for address in addresses {
			self.substate.mark_hot(*address, None);
		}
		if self.config.eip3651_warm_coinbase_address {
			self.substate.mark_hot(self.block.coinbase, None);
		}
	}

	/// Folds pending changes into the world state and returns the emitted
	/// logs.
	pub fn commit(&mut self) -> Vec<Log> {
		mem::take(&mut self.substate).apply(&mut self.world)
	}

	/// Runs up to `steps` instructions of a top-level frame.
	pub fn step(
		&mut self,
		state: ExecutionState,
		steps: usize,
	) -> Result<ExecutionState, StepError> {
		let interpreter = self.interpreter;
		let result = interpreter.step_n(state, self, steps);
		match self.fatal.take() {
			Some(error) => Err(error),
			None => result,
		}
	}

	/// Executes a whole transaction and commits its effects.
	pub fn transact(&mut self, transaction: Transaction) -> Result<TransactionResult, StepError> {
		let Transaction {
			sender,
			recipient,
			gas_limit,
			value,
			input,
			gas_price,
			blob_hashes,
		} = transaction;
		self.origin = sender;
		self.gas_price = gas_price;
		self.blob_hashes = blob_hashes;

		let intrinsic = match recipient {
			Some(_) => TransactionCost::call(&input),
			None => TransactionCost::create(&input),
		}
		.cost(self.config);
		let initcode_too_large = recipient.is_none()
			&& self
				.config
				.max_initcode_size()
				.map(|limit| input.len() > limit)
				.unwrap_or(false);
		if intrinsic > gas_limit || initcode_too_large {
			log::debug!(
				target: "ctvm",
				"rejecting transaction of {:?}: intrinsic gas {} over limit {}",
				sender,
				intrinsic,
				gas_limit
			);
			return Ok(TransactionResult {
				success: false,
				gas_used: gas_limit,
				..Default::default()
			});
		}
		let gas = gas_limit - intrinsic;

		let (reason, output, contract_address, gas_left, gas_refund) = match recipient {
			Some(target) => {
				self.warm_up(&[sender, target]);
				self.substate.inc_nonce(sender, &self.world);
				let outcome = self.call(CallRequest {
					scheme: CallScheme::Call,
					code_address: target,
					context: Context {
						address: target,
						caller: sender,
						apparent_value: value,
					},
					transfer: Some(Transfer {
						source: sender,
						target,
						value,
					}),
					input,
					gas_limit: gas,
					is_static: false,
					depth: 0,
				});
				(
					outcome.reason,
					outcome.output,
					None,
					outcome.gas_left,
					outcome.gas_refund,
				)
			}
			None => {
				self.warm_up(&[sender]);
				let outcome = self.create(CreateRequest {
					caller: sender,
					scheme: CreateScheme::Legacy { caller: sender },
					value,
					init_code: input,
					gas_limit: gas,
					depth: 0,
				});
				(
					outcome.reason,
					outcome.output,
					outcome.address,
					outcome.gas_left,
					outcome.gas_refund,
				)
			}
		};

		if let Some(error) = self.fatal.take() {
			return Err(error);
		}
		if let ExitReason::Fatal(fatal) = reason {
			return Err(StepError::Fatal(fatal));
		}

		let success = matches!(reason, ExitReason::Succeed(_));
		let gas_used = gas_limit.saturating_sub(gas_left);
		let refund = if success {
			min(
				max(gas_refund, 0) as u64,
				gas_used / self.config.max_refund_quotient(),
			)
		} else {
			0
		};
		let logs = self.commit();
		log::debug!(
			target: "ctvm",
			"transaction of {:?} finished with {:?}, {} gas used, {} refunded",
			sender,
			reason,
			gas_used,
			refund
		);

		Ok(TransactionResult {
			success,
			output,
			contract_address: if success { contract_address } else { None },
			gas_used: gas_used - refund,
			logs,
		})
	}

	/// Runs a nested frame to completion.
	fn execute(&mut self, state: ExecutionState) -> Result<ExecutionState, StepError> {
		let interpreter = self.interpreter;
		let state = interpreter.step_n(state, self, usize::MAX)?;
		if !state.is_terminal() {
			return Err(StepError::Internal(format!(
				"frame of {:?} did not halt",
				state.context.recipient
			)));
		}
		Ok(state)
	}

	/// Keeps the first out-of-band error of a nested frame so that it can be
	/// reported instead of the fatal exit it turns into on the way up.
	fn record_fatal(&mut self, error: StepError) -> ExitReason {
		let reason = ExitFatal::Other(error.to_string().into()).into();
		if self.fatal.is_none() {
			self.fatal = Some(error);
		}
		reason
	}

	/// Gas left once `code` has been paid for as the result of a creation.
	fn deposit(&self, code: &[u8], gas: u64) -> Result<u64, ExitError> {
		if self.config.eip3541_disallow_executable_format && code.first() == Some(&0xef) {
			return Err(ExitError::CreateContractStartingWithEF);
		}
		if code.len() > self.config.create_contract_limit() {
			return Err(ExitError::CreateContractLimit);
		}

		let mut gasometer = Gasometer::new(gas, self.config);
		gasometer.record_deposit(code.len())?;
		Ok(gasometer.gas())
	}
}

impl<'i> Handler for Processor<'i> {
	fn balance(&self, address: H160) -> U256 {
		self.substate.balance(address, &self.world)
	}

	fn code_size(&self, address: H160) -> U256 {
		U256::from(self.substate.code(address, &self.world).len())
	}

	fn code_hash(&self, address: H160) -> H256 {
		if self.is_empty(address) {
			return H256::default();
		}
		H256::from_slice(Keccak256::digest(self.substate.code(address, &self.world)).as_slice())
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.substate.code(address, &self.world)
	}

	fn nonce(&self, address: H160) -> U256 {
		self.substate.nonce(address, &self.world)
	}

	fn exists(&self, address: H160) -> bool {
		self.substate.exists(address, &self.world)
	}

	fn is_empty(&self, address: H160) -> bool {
		!self.exists(address)
			|| (self.balance(address).is_zero()
				&& self.nonce(address).is_zero()
				&& self.substate.code(address, &self.world).is_empty())
	}

	fn deleted(&self, address: H160) -> bool {
		self.substate.deleted(address)
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.substate.storage(address, index, &self.world)
	}

	fn original_storage(&self, address: H160, index: H256) -> H256 {
		self.substate.original_storage(address, index, &self.world)
	}

	fn transient_storage(&self, address: H160, index: H256) -> H256 {
		self.substate.transient_storage(address, index)
	}

	fn block_hash(&self, number: U256) -> H256 {
		self.block.block_hash(number)
	}

	fn block_number(&self) -> U256 {
		self.block.number
	}

	fn block_coinbase(&self) -> H160 {
		self.block.coinbase
	}

	fn block_timestamp(&self) -> U256 {
		self.block.timestamp
	}

	fn block_difficulty(&self) -> U256 {
		self.block.difficulty
	}

	fn block_randomness(&self) -> H256 {
		self.block.prev_randao
	}

	fn block_gas_limit(&self) -> U256 {
		self.block.gas_limit
	}

	fn block_base_fee_per_gas(&self) -> U256 {
		self.block.base_fee
	}

	fn chain_id(&self) -> U256 {
		self.block.chain_id
	}

	fn blob_hash(&self, index: U256) -> H256 {
		if index >= U256::from(self.blob_hashes.len()) {
			return H256::default();
		}
		self.blob_hashes[index.as_usize()]
	}

	fn blob_base_fee_per_gas(&self) -> U256 {
		self.block.blob_base_fee
	}

	fn origin(&self) -> H160 {
		self.origin
	}

	fn gas_price(&self) -> U256 {
		self.gas_price
	}

	fn is_cold(&self, address: H160, index: Option<H256>) -> bool {
		self.substate.is_cold(address, index)
	}

	fn mark_hot(&mut self, address: H160, index: Option<H256>) {
		self.substate.mark_hot(address, index)
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) {
		self.substate.set_storage(address, index, value);
	}

	fn set_transient_storage(&mut self, address: H160, index: H256, value: H256) {
		self.substate.set_transient_storage(address, index, value)
	}

	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) {
		self.substate.log(address, topics, data)
	}

	fn mark_delete(&mut self, address: H160, target: H160) {
		let balance = self.balance(address);
		if !balance.is_zero() {
			self.substate.set_balance(address, U256::zero(), &self.world);
			let target_balance = self.balance(target);
			self.substate
				.set_balance(target, target_balance.saturating_add(balance), &self.world);
		}

		if !self.config.eip6780_selfdestruct_only_in_same_tx || self.substate.created(address) {
			self.substate.set_deleted(address);
			if !self.balance(address).is_zero() {
				self.substate.set_balance(address, U256::zero(), &self.world);
			}
		}
	}

	fn call(&mut self, request: CallRequest) -> CallOutcome {
		if request.depth > self.config.call_stack_limit() {
			return CallOutcome::aborted(ExitError::CallTooDeep.into(), request.gas_limit);
		}
		if let Some(transfer) = &request.transfer {
			if self.balance(transfer.source) < transfer.value {
				return CallOutcome::aborted(ExitError::OutOfFund.into(), request.gas_limit);
			}
		}

		log::debug!(
			target: "ctvm",
			"entering call to {:?} at depth {} with {} gas",
			request.code_address,
			request.depth,
			request.gas_limit
		);
		self.substate.enter();
		if let Some(transfer) = &request.transfer {
			if let Err(error) = self.substate.transfer(transfer, &self.world) {
				let _ = self.substate.exit_revert();
				return CallOutcome::aborted(error.into(), request.gas_limit);
			}
		}

		let code = self.substate.code(request.code_address, &self.world);
		if code.is_empty() {
			let _ = self.substate.exit_commit();
			return CallOutcome {
				reason: ExitSucceed::Stopped.into(),
				output: Vec::new(),
				gas_left: request.gas_limit,
				gas_refund: 0,
			};
		}

		let state = ExecutionState::new(
			self.revision,
			Code::new(code),
			CallContext {
				sender: request.context.caller,
				recipient: request.context.address,
				value: request.context.apparent_value,
				input: request.input,
				is_static: request.is_static,
				depth: request.depth,
			},
			request.gas_limit,
		);
		let state = match self.execute(state) {
			Ok(state) => state,
			Err(error) => {
				let _ = self.substate.exit_revert();
				return CallOutcome::aborted(self.record_fatal(error), 0);
			}
		};

		log::debug!(
			target: "ctvm",
			"leaving call to {:?} with {:?}, {} gas left",
			request.code_address,
			state.status,
			state.gas
		);
		match state.status {
			Status::Stopped => {
				let _ = self.substate.exit_commit();
				CallOutcome {
					reason: ExitSucceed::Returned.into(),
					output: state.output,
					gas_left: state.gas,
					gas_refund: state.gas_refund,
				}
			}
			Status::Reverted => {
				let _ = self.substate.exit_revert();
				CallOutcome {
					reason: ExitRevert::Reverted.into(),
					output: state.output,
					gas_left: state.gas,
					gas_refund: 0,
				}
			}
			Status::Failed | Status::Running => {
				let _ = self.substate.exit_revert();
				let error = state.fault.unwrap_or(ExitError::DesignatedInvalid);
				CallOutcome::aborted(error.into(), 0)
			}
		}
	}

	fn create(&mut self, request: CreateRequest) -> CreateOutcome {
		if request.depth > self.config.call_stack_limit() {
			return CreateOutcome::aborted(ExitError::CallTooDeep.into(), request.gas_limit);
		}
		if self.balance(request.caller) < request.value {
			return CreateOutcome::aborted(ExitError::OutOfFund.into(), request.gas_limit);
		}

		let nonce = self.nonce(request.caller);
		self.substate.inc_nonce(request.caller, &self.world);
		let address = scheme_address(&request.scheme, nonce);
		self.substate.mark_hot(address, None);
		log::debug!(
			target: "ctvm",
			"creating {:?} from {:?} at depth {} with {} gas",
			address,
			request.caller,
			request.depth,
			request.gas_limit
		);

		if !self.nonce(address).is_zero() || !self.code(address).is_empty() {
			return CreateOutcome::aborted(ExitError::CreateCollision.into(), 0);
		}

		self.substate.enter();
		self.substate.create_account(address, &self.world);
		let transfer = Transfer {
			source: request.caller,
			target: address,
			value: request.value,
		};
		if let Err(error) = self.substate.transfer(&transfer, &self.world) {
			let _ = self.substate.exit_revert();
			return CreateOutcome::aborted(error.into(), request.gas_limit);
		}

		let state = ExecutionState::new(
			self.revision,
			Code::new(request.init_code),
			CallContext {
				sender: request.caller,
				recipient: address,
				value: request.value,
				input: Vec::new(),
				is_static: false,
				depth: request.depth,
			},
			request.gas_limit,
		);
		let state = match self.execute(state) {
			Ok(state) => state,
			Err(error) => {
				let _ = self.substate.exit_revert();
				return CreateOutcome::aborted(self.record_fatal(error), 0);
			}
		};

		match state.status {
			Status::Stopped => match self.deposit(&state.output, state.gas) {
				Ok(gas_left) => {
					self.substate.set_code(address, state.output, &self.world);
					let _ = self.substate.exit_commit();
					log::debug!(target: "ctvm", "created {:?}, {} gas left", address, gas_left);
					CreateOutcome {
						reason: ExitSucceed::Returned.into(),
						address: Some(address),
						output: Vec::new(),
						gas_left,
						gas_refund: state.gas_refund,
					}
				}
				Err(error) => {
					let _ = self.substate.exit_revert();
					log::debug!(target: "ctvm", "creation of {:?} failed: {:?}", address, error);
					CreateOutcome::aborted(error.into(), 0)
				}
			},
			Status::Reverted => {
				let _ = self.substate.exit_revert();
				CreateOutcome {
					reason: ExitRevert::Reverted.into(),
					address: None,
					output: state.output,
					gas_left: state.gas,
					gas_refund: 0,
				}
			}
			Status::Failed | Status::Running => {
				let _ = self.substate.exit_revert();
				let error = state.fault.unwrap_or(ExitError::DesignatedInvalid);
				CreateOutcome::aborted(error.into(), 0)
			}
		}
	}
}
