#![allow(dead_code)]

use ctvm::backend::{Account, WorldState};
use ctvm::harness::{self, Report, Scenario};
use ctvm::{
	CallContext, Code, ConformanceAdapter, DirectInterpreter, ExecutionState, Interpreter,
	Processor, Revision, Transaction, TransactionResult,
};
use primitive_types::{H160, U256};

pub const PRODUCTION: ConformanceAdapter = ConformanceAdapter;
pub const DIRECT: DirectInterpreter = DirectInterpreter;

pub fn engines() -> [&'static dyn Interpreter; 2] {
	[&PRODUCTION, &DIRECT]
}

pub fn sender() -> H160 {
	H160::repeat_byte(0xaa)
}

pub fn contract() -> H160 {
	H160::repeat_byte(0xcc)
}

pub fn other() -> H160 {
	H160::repeat_byte(0xbb)
}

pub fn bytes(code: &str) -> Vec<u8> {
	hex::decode(code).unwrap()
}

/// Top-level frame running `code` on behalf of [`contract`].
pub fn frame(revision: Revision, code: &str, gas: u64) -> ExecutionState {
	ExecutionState::new(
		revision,
		Code::new(bytes(code)),
		CallContext {
			sender: sender(),
			recipient: contract(),
			..Default::default()
		},
		gas,
	)
}

pub fn account(code: &str, balance: u64) -> Account {
	Account {
		nonce: U256::one(),
		balance: U256::from(balance),
		code: bytes(code),
		..Default::default()
	}
}

pub fn funded_sender() -> WorldState {
	WorldState::new().with_account(
		sender(),
		Account {
			balance: U256::from(1_000_000_000u64),
			..Default::default()
		},
	)
}

/// Runs `state` for `steps` instructions against an empty world.
pub fn step(interpreter: &dyn Interpreter, state: ExecutionState, steps: usize) -> ExecutionState {
	let scenario = Scenario::new(state);
	harness::execute(interpreter, &scenario, steps).unwrap().state
}

/// Runs `scenario` through both engines and fails on any divergence.
pub fn agree(scenario: &Scenario, steps: usize) -> Report {
	let report = harness::run(&engines(), scenario, steps).unwrap();
	assert!(
		report.is_consistent(),
		"engines diverged: {:#?}",
		report.divergences
	);
	report
}

/// Executes `transaction` with each engine and fails unless both agree on
/// the result and the resulting world.
pub fn transact(
	world: &WorldState,
	revision: Revision,
	transaction: Transaction,
) -> (TransactionResult, WorldState) {
	let mut outcomes = engines().into_iter().map(|interpreter| {
		let mut processor =
			Processor::new(interpreter, world.clone(), Default::default(), revision);
		let result = processor.transact(transaction.clone()).unwrap();
		(result, processor.into_world())
	});
	let (result, world) = outcomes.next().unwrap();
	for (other_result, other_world) in outcomes {
		assert_eq!(result, other_result);
		assert_eq!(world.diff(&other_world), Vec::<String>::new());
	}
	(result, world)
}
