mod common;

use common::{engines, frame, step};
use ctvm::{ExitError, Opcode, Revision, Status};
use primitive_types::U256;

#[test]
fn empty_code_stops_at_once() {
	for engine in engines() {
		let state = step(engine, frame(Revision::London, "", 100), 1);
		assert_eq!(state.status, Status::Stopped, "{}", engine.name());
		assert_eq!(state.pc, 0);
		assert_eq!(state.gas, 100);
	}
}

#[test]
fn add_charges_and_advances() {
	for engine in engines() {
		let state = step(engine, frame(Revision::London, "600160020100", 100), 3);
		assert_eq!(state.status, Status::Running, "{}", engine.name());
		assert_eq!(state.pc, 5);
		assert_eq!(state.gas, 91);
		assert_eq!(state.stack.data(), &[U256::from(3)]);

		let state = step(engine, state, 10);
		assert_eq!(state.status, Status::Stopped);
		assert_eq!(state.pc, 5);
	}
}

#[test]
fn arithmetic_wraps() {
	let code = format!("7f{}600101", "ff".repeat(32));
	for engine in engines() {
		let state = step(engine, frame(Revision::London, &code, 100), 3);
		assert_eq!(state.stack.data(), &[U256::zero()], "{}", engine.name());
	}
}

#[test]
fn jump_to_non_jumpdest_fails() {
	for engine in engines() {
		let state = step(engine, frame(Revision::London, "60035600", 100), 2);
		assert_eq!(state.status, Status::Failed, "{}", engine.name());
		assert_eq!(state.fault, Some(ExitError::InvalidJump));
		assert_eq!(state.gas, 0);
	}
}

#[test]
fn jump_past_the_end_fails() {
	for engine in engines() {
		let state = step(engine, frame(Revision::London, "60c856", 100), 2);
		assert_eq!(state.status, Status::Failed, "{}", engine.name());
		assert_eq!(state.fault, Some(ExitError::InvalidJump));
	}
}

#[test]
fn jumpdest_inside_push_data_is_not_a_destination() {
	// PUSH1 3, JUMP, PUSH1 0x5b
	for engine in engines() {
		let state = step(engine, frame(Revision::London, "600356605b", 100), 2);
		assert_eq!(state.status, Status::Failed, "{}", engine.name());
		assert_eq!(state.fault, Some(ExitError::InvalidJump));
	}
}

#[test]
fn truncated_push_is_zero_padded() {
	for engine in engines() {
		let state = step(engine, frame(Revision::London, "61ff", 100), 2);
		assert_eq!(state.status, Status::Stopped, "{}", engine.name());
		assert_eq!(state.stack.data(), &[U256::from(0xff00)]);
	}
}

#[test]
fn out_of_gas_has_no_partial_effect() {
	for engine in engines() {
		let state = step(engine, frame(Revision::London, "6001", 2), 1);
		assert_eq!(state.status, Status::Failed, "{}", engine.name());
		assert_eq!(state.fault, Some(ExitError::OutOfGas));
	}
}

#[test]
fn unaffordable_memory_is_out_of_gas() {
	// MLOAD at 2^64
	for engine in engines() {
		let state = step(
			engine,
			frame(Revision::London, "6801000000000000000051", 1_000_000),
			2,
		);
		assert_eq!(state.status, Status::Failed, "{}", engine.name());
	}
}

#[test]
fn all_gas_with_memory_already_paid_for() {
	for engine in engines() {
		let mut state = frame(Revision::London, "5b60ff6020520000", u64::MAX);
		state.memory.append(&[0x2a; 32]);

		let state = step(engine, state, 1);
		assert_eq!(state.status, Status::Running, "{}", engine.name());
		assert_eq!(state.gas, u64::MAX - 1);
		assert_eq!(state.memory.len(), 32);

		// MSTORE at 32 pays for one more word only.
		let state = step(engine, state, 3);
		assert_eq!(state.status, Status::Running, "{}", engine.name());
		assert_eq!(state.gas, u64::MAX - 1 - 9 - 3);
		assert_eq!(state.memory.len(), 64);
	}
}

#[test]
fn zero_steps_is_the_identity() {
	let state = frame(Revision::Cancun, "6001600201", 100);
	for engine in engines() {
		let stepped = step(engine, state.clone(), 3);
		for input in [state.clone(), stepped] {
			let output = step(engine, input.clone(), 0);
			assert_eq!(output, input, "{}", engine.name());
			assert_eq!(output.canonical_bytes(), input.canonical_bytes());
		}
	}
}

#[test]
fn halted_states_are_returned_unchanged() {
	for engine in engines() {
		let halted = step(engine, frame(Revision::London, "00", 100), 1);
		assert_eq!(halted.status, Status::Stopped);
		let again = step(engine, halted.clone(), 5);
		assert_eq!(again.canonical_hash(), halted.canonical_hash(), "{}", engine.name());
	}
}

#[test]
fn newer_opcodes_are_invalid_before_their_revision() {
	let cases = [
		(Opcode::BASEFEE, Revision::Berlin, Revision::London),
		(Opcode::PUSH0, Revision::Paris, Revision::Shanghai),
		(Opcode::TLOAD, Revision::Shanghai, Revision::Cancun),
		(Opcode::MCOPY, Revision::Shanghai, Revision::Cancun),
		(Opcode::BLOBBASEFEE, Revision::Shanghai, Revision::Cancun),
	];
	for engine in engines() {
		for (opcode, before, from) in cases {
			// operands for the opcodes that take some
			let code = format!("600060006000{:02x}", opcode.as_u8());

			let state = step(engine, frame(before, &code, 1000), 4);
			assert_eq!(state.status, Status::Failed, "{} {:?}", engine.name(), opcode);
			assert_eq!(state.fault, Some(ExitError::InvalidCode(opcode)));

			let state = step(engine, frame(from, &code, 1000), 4);
			assert_eq!(state.status, Status::Running, "{} {:?}", engine.name(), opcode);
		}
	}
}

#[test]
fn designated_invalid_fails() {
	for engine in engines() {
		let state = step(engine, frame(Revision::London, "fe", 100), 1);
		assert_eq!(state.status, Status::Failed, "{}", engine.name());
		assert_eq!(state.fault, Some(ExitError::DesignatedInvalid));
	}
}

#[test]
fn return_and_revert_keep_their_data() {
	// MSTORE 0x2a at 0, RETURN / REVERT the word
	for (opcode, status) in [("f3", Status::Stopped), ("fd", Status::Reverted)] {
		let code = format!("602a60005260206000{}", opcode);
		for engine in engines() {
			let state = step(engine, frame(Revision::London, &code, 100), 10);
			assert_eq!(state.status, status, "{}", engine.name());
			assert_eq!(state.pc, 9);
			assert_eq!(state.output.len(), 32);
			assert_eq!(state.output[31], 0x2a);
		}
	}
}
