mod common;

use common::{account, agree, bytes, contract, frame, funded_sender, other, sender, transact};
use ctvm::harness::Scenario;
use ctvm::{create2_address, create_address, Revision, Status, Transaction};
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

/// Returns the word in slot 0.
const RUNTIME: &str = "60005460005260206000f3";

/// Stores 0x2a in slot 0, then deploys [`RUNTIME`].
fn init_code() -> String {
	format!("602a600055600b6011600039600b6000f3{}", RUNTIME)
}

/// Puts the init code at memory 4..32.
fn load_init_code() -> String {
	format!("7b{}600052", init_code())
}

fn factory() -> H160 {
	H160::repeat_byte(0xfa)
}

fn slot(index: u64) -> H256 {
	H256::from_low_u64_be(index)
}

fn call(recipient: H160) -> Transaction {
	Transaction {
		sender: sender(),
		recipient: Some(recipient),
		gas_limit: 1_000_000,
		..Default::default()
	}
}

#[test]
fn creation_transaction_deploys_at_the_sender_address() {
	let (result, world) = transact(
		&funded_sender(),
		Revision::Shanghai,
		Transaction {
			sender: sender(),
			recipient: None,
			gas_limit: 1_000_000,
			input: bytes(&init_code()),
			..Default::default()
		},
	);
	let created = create_address(sender(), U256::zero());
	assert!(result.success);
	assert_eq!(result.contract_address, Some(created));
	assert_eq!(world.get(&created).unwrap().code, bytes(RUNTIME));
	assert_eq!(world.storage(created, slot(0)), slot(0x2a));
	assert_eq!(world.get(&sender()).unwrap().nonce, U256::one());

	let (result, _) = transact(&world, Revision::Shanghai, call(created));
	assert!(result.success);
	assert_eq!(result.output, slot(0x2a).as_bytes());
}

#[test]
fn init_code_writes_the_new_account_storage() {
	let mut holder = account(
		&format!("{}601c60046000f060015500", load_init_code()),
		0,
	);
	holder.storage.insert(slot(0), slot(7));
	let world = funded_sender().with_account(factory(), holder);

	let (result, world) = transact(&world, Revision::Cancun, call(factory()));
	assert!(result.success);

	let created = create_address(factory(), U256::one());
	assert_eq!(world.storage(factory(), slot(1)), H256::from(created));
	assert_eq!(world.storage(factory(), slot(0)), slot(7));
	assert_eq!(world.storage(created, slot(0)), slot(0x2a));
	assert_eq!(world.get(&factory()).unwrap().nonce, U256::from(2));

	let (result, _) = transact(&world, Revision::Cancun, call(created));
	assert_eq!(result.output, slot(0x2a).as_bytes());
}

#[test]
fn second_create2_with_the_same_salt_collides() {
	let create2 = "6005601c60046000f5";
	let code = format!("{}{}{}600255600155", load_init_code(), create2, create2);
	let world = funded_sender().with_account(factory(), account(&code, 0));

	let (result, world) = transact(&world, Revision::Cancun, call(factory()));
	assert!(result.success);

	let code_hash = H256::from_slice(Keccak256::digest(bytes(&init_code())).as_slice());
	let created = create2_address(factory(), slot(5), code_hash);
	assert_eq!(world.storage(factory(), slot(1)), H256::from(created));
	assert_eq!(world.storage(factory(), slot(2)), H256::zero());
	assert_eq!(world.get(&created).unwrap().code, bytes(RUNTIME));
}

#[test]
fn reverted_creation_leaves_no_account() {
	// init code that reverts right away
	let code = "7b60006000fd0000000000000000000000000000000000000000000000600052601c60046000f060015500";
	let world = funded_sender().with_account(factory(), account(code, 0));

	let (result, world) = transact(&world, Revision::London, call(factory()));
	assert!(result.success);
	assert_eq!(world.storage(factory(), slot(1)), H256::zero());
	assert!(!world.exists(create_address(factory(), U256::one())));
}

#[test]
fn calls_beyond_the_depth_limit_fail_for_the_callee() {
	let code = format!("6000600060006000600073{}61fffff1", hex::encode(other()));
	let mut state = frame(Revision::London, &code, 100_000);
	state.context.depth = 1024;
	let scenario = Scenario::new(state).with_world(
		funded_sender()
			.with_account(contract(), account(&code, 0))
			.with_account(other(), account("602a60005260206000f3", 0)),
	);

	let report = agree(&scenario, 9);
	let state = &report.outcomes[0].state;
	assert_eq!(state.status, Status::Stopped);
	assert_eq!(state.stack.data(), &[U256::zero()]);
}

#[test]
fn selfdestruct_removes_the_account_before_cancun() {
	let code = format!("73{}ff", hex::encode(other()));
	let world = funded_sender().with_account(contract(), account(&code, 500));

	let (result, after) = transact(&world, Revision::London, call(contract()));
	assert!(result.success);
	assert!(!after.exists(contract()));
	assert_eq!(after.get(&other()).unwrap().balance, U256::from(500));

	let (result, after) = transact(&world, Revision::Cancun, call(contract()));
	assert!(result.success);
	assert!(after.exists(contract()));
	assert_eq!(after.get(&contract()).unwrap().balance, U256::zero());
	assert_eq!(after.get(&other()).unwrap().balance, U256::from(500));
}

#[test]
fn transaction_below_intrinsic_gas_is_rejected() {
	let world = funded_sender();
	let (result, after) = transact(
		&world,
		Revision::London,
		Transaction {
			gas_limit: 20_000,
			..call(contract())
		},
	);
	assert!(!result.success);
	assert_eq!(result.gas_used, 20_000);
	assert_eq!(after, world);
}

#[test]
fn reverting_call_reports_its_output() {
	let code = "602a60005260206000fd";
	let world = funded_sender().with_account(contract(), account(code, 0));
	let (result, after) = transact(&world, Revision::London, call(contract()));
	assert!(!result.success);
	assert_eq!(result.output, slot(0x2a).as_bytes());
	assert_eq!(after.get(&sender()).unwrap().nonce, U256::one());
}
