use crate::{Code, ExitError, Memory, Revision, Stack};
use primitive_types::{H160, H256, U256};
use rlp::RlpStream;
use sha3::{Digest, Keccak256};

/// Lifecycle of an execution frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
	/// More instructions may run.
	Running,
	/// Halted normally through STOP, RETURN, SELFDESTRUCT or the end of code.
	Stopped,
	/// Halted through REVERT.
	Reverted,
	/// Halted by a fault. All gas is forfeited.
	Failed,
}

impl Status {
	pub fn is_terminal(&self) -> bool {
		*self != Status::Running
	}

	fn as_u8(&self) -> u8 {
		match self {
			Status::Running => 0,
			Status::Stopped => 1,
			Status::Reverted => 2,
			Status::Failed => 3,
		}
	}
}

/// Message a frame was invoked with.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallContext {
	/// Account observed through `CALLER`.
	pub sender: H160,
	/// Account whose storage and balance the frame operates on.
	pub recipient: H160,
	/// Value observed through `CALLVALUE`.
	pub value: U256,
	/// Call data.
	pub input: Vec<u8>,
	/// Whether state modifications are forbidden.
	pub is_static: bool,
	/// Number of frames below this one.
	pub depth: usize,
}

/// Snapshot of one interpreter frame between two instructions. Every
/// interpreter consumes and produces this same representation.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionState {
	pub status: Status,
	pub revision: Revision,
	pub pc: usize,
	/// Gas left. Zero once the frame failed.
	pub gas: u64,
	/// Refund accumulated by this frame. May be negative.
	pub gas_refund: i64,
	pub stack: Stack,
	pub memory: Memory,
	pub code: Code,
	pub context: CallContext,
	/// Output of the last nested call or creation.
	pub return_data: Vec<u8>,
	/// Data returned or reverted with once the frame halted.
	pub output: Vec<u8>,
	/// Signal that moved the frame to `Failed`. Diagnostic only.
	pub fault: Option<ExitError>,
}

impl ExecutionState {
	/// Fresh running frame at the first instruction of `code`.
	pub fn new(revision: Revision, code: Code, context: CallContext, gas: u64) -> Self {
		Self {
			status: Status::Running,
			revision,
			pc: 0,
			gas,
			gas_refund: 0,
			stack: Stack::new(),
			memory: Memory::new(),
			code,
			context,
			return_data: Vec::new(),
			output: Vec::new(),
			fault: None,
		}
	}

	pub fn is_terminal(&self) -> bool {
		self.status.is_terminal()
	}

	/// Moves the frame to `Failed`, forfeiting all gas.
	pub fn fail(&mut self, error: ExitError) {
		self.status = Status::Failed;
		self.gas = 0;
		self.fault = Some(error);
	}

	/// RLP encoding of everything observable about the frame. A failed
	/// frame encodes as its status alone.
	pub fn canonical_bytes(&self) -> Vec<u8> {
		if self.status == Status::Failed {
			let mut stream = RlpStream::new_list(1);
			stream.append(&self.status.as_u8());
			return stream.out().to_vec();
		}

		let mut stream = RlpStream::new_list(17);
		stream.append(&self.status.as_u8());
		stream.append(&self.revision.as_u8());
		stream.append(&(self.pc as u64));
		stream.append(&self.gas);
		stream.append(&u8::from(self.gas_refund < 0));
		stream.append(&self.gas_refund.unsigned_abs());
		stream.append_list::<U256, U256>(self.stack.data());
		stream.append(&self.memory.data().to_vec());
		stream.append(&self.code.hash());
		stream.append(&self.context.recipient);
		stream.append(&self.context.sender);
		stream.append(&self.context.value);
		stream.append(&self.context.input);
		stream.append(&u8::from(self.context.is_static));
		stream.append(&(self.context.depth as u64));
		stream.append(&self.return_data);
		stream.append(&self.output);
		stream.out().to_vec()
	}

	/// Keccak-256 of [`ExecutionState::canonical_bytes`].
	pub fn canonical_hash(&self) -> H256 {
		H256::from_slice(Keccak256::digest(self.canonical_bytes()).as_slice())
	}

	/// Human-readable differences against `other`, empty when the two
	/// states are equal.
	pub fn diff(&self, other: &ExecutionState) -> Vec<String> {
		let mut out = Vec::new();
		if self.status != other.status {
			out.push(format!(
				"Different status: {:?} vs {:?}",
				self.status, other.status
			));
			return out;
		}
		if self.status == Status::Failed {
			return out;
		}

		if self.revision != other.revision {
			out.push(format!(
				"Different revision: {} vs {}",
				self.revision, other.revision
			));
		}
		if self.pc != other.pc {
			out.push(format!("Different pc: {} vs {}", self.pc, other.pc));
		}
		if self.gas != other.gas {
			out.push(format!("Different gas: {} vs {}", self.gas, other.gas));
		}
		if self.gas_refund != other.gas_refund {
			out.push(format!(
				"Different gas refund: {} vs {}",
				self.gas_refund, other.gas_refund
			));
		}
		if self.stack.len() != other.stack.len() {
			out.push(format!(
				"Different stack size: {} vs {}",
				self.stack.len(),
				other.stack.len()
			));
		} else {
			for (i, (a, b)) in self
				.stack
				.data()
				.iter()
				.zip(other.stack.data().iter())
				.enumerate()
			{
				if a != b {
					out.push(format!("Different stack value at {}: {:#x} vs {:#x}", i, a, b));
				}
			}
		}
		out.extend(self.memory.diff(&other.memory));
		if self.code.hash() != other.code.hash() {
			out.push(format!(
				"Different code: {:?} vs {:?}",
				self.code.hash(),
				other.code.hash()
			));
		}
		if self.context != other.context {
			out.push(format!(
				"Different call context: {:?} vs {:?}",
				self.context, other.context
			));
		}
		if self.return_data != other.return_data {
			out.push(format!(
				"Different return data: 0x{} vs 0x{}",
				hex_string(&self.return_data),
				hex_string(&other.return_data)
			));
		}
		if self.output != other.output {
			out.push(format!(
				"Different output: 0x{} vs 0x{}",
				hex_string(&self.output),
				hex_string(&other.output)
			));
		}
		out
	}
}

impl PartialEq for ExecutionState {
	fn eq(&self, other: &Self) -> bool {
		if self.status == Status::Failed || other.status == Status::Failed {
			return self.status == other.status;
		}

		self.status == other.status
			&& self.revision == other.revision
			&& self.pc == other.pc
			&& self.gas == other.gas
			&& self.gas_refund == other.gas_refund
			&& self.stack == other.stack
			&& self.memory == other.memory
			&& self.code.bytes() == other.code.bytes()
			&& self.context == other.context
			&& self.return_data == other.return_data
			&& self.output == other.output
	}
}

impl Eq for ExecutionState {}

fn hex_string(bytes: &[u8]) -> String {
	bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn running() -> ExecutionState {
		ExecutionState::new(
			Revision::Cancun,
			Code::new(vec![0x60, 0x01, 0x00]),
			CallContext::default(),
			1_000,
		)
	}

	#[test]
	fn failed_states_are_equal_whatever_they_hold() {
		let mut a = running();
		a.stack.push(U256::one()).unwrap();
		a.fail(ExitError::InvalidJump);

		let mut b = running();
		b.pc = 2;
		b.fail(ExitError::OutOfGas);

		assert_eq!(a, b);
		assert!(a.diff(&b).is_empty());
		assert_eq!(a.canonical_hash(), b.canonical_hash());
		assert_eq!(a.gas, 0);
	}

	#[test]
	fn diff_names_each_mismatch() {
		let a = running();
		let mut b = running();
		b.pc = 2;
		b.gas = 997;
		b.stack.push(U256::from(1)).unwrap();

		let diff = a.diff(&b);
		assert_eq!(
			diff,
			vec![
				"Different pc: 0 vs 2".to_string(),
				"Different gas: 1000 vs 997".to_string(),
				"Different stack size: 0 vs 1".to_string(),
			]
		);
		assert_ne!(a, b);
	}

	#[test]
	fn memory_size_mismatch_hides_byte_differences() {
		let a = running();
		let mut b = running();
		b.memory.write(&[1], 0);

		assert_eq!(a.diff(&b), vec!["Different memory size: 0 vs 32".to_string()]);
	}

	#[test]
	fn canonical_encoding_tracks_observable_fields() {
		let a = running();
		let mut b = running();
		assert_eq!(a.canonical_bytes(), b.canonical_bytes());

		b.gas_refund = -4800;
		assert_ne!(a.canonical_hash(), b.canonical_hash());

		let mut c = running();
		c.gas_refund = 4800;
		assert_ne!(b.canonical_hash(), c.canonical_hash());

		// Faults are diagnostic only.
		let mut d = running();
		d.fault = Some(ExitError::OutOfGas);
		assert_eq!(a.canonical_bytes(), d.canonical_bytes());
	}
}
