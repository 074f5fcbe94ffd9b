/// One instruction byte. Values without a name are undefined in every
/// supported revision and execute as `InvalidCode`.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Opcode(pub u8);

// Stop, arithmetic and comparison.
impl Opcode {
	pub const STOP: Opcode = Opcode(0x00);
	pub const ADD: Opcode = Opcode(0x01);
	pub const MUL: Opcode = Opcode(0x02);
	pub const SUB: Opcode = Opcode(0x03);
	pub const DIV: Opcode = Opcode(0x04);
	pub const SDIV: Opcode = Opcode(0x05);
	pub const MOD: Opcode = Opcode(0x06);
	pub const SMOD: Opcode = Opcode(0x07);
	pub const ADDMOD: Opcode = Opcode(0x08);
	pub const MULMOD: Opcode = Opcode(0x09);
	pub const EXP: Opcode = Opcode(0x0a);
	pub const SIGNEXTEND: Opcode = Opcode(0x0b);

	pub const LT: Opcode = Opcode(0x10);
	pub const GT: Opcode = Opcode(0x11);
	pub const SLT: Opcode = Opcode(0x12);
	pub const SGT: Opcode = Opcode(0x13);
	pub const EQ: Opcode = Opcode(0x14);
	pub const ISZERO: Opcode = Opcode(0x15);
	pub const AND: Opcode = Opcode(0x16);
	pub const OR: Opcode = Opcode(0x17);
	pub const XOR: Opcode = Opcode(0x18);
	pub const NOT: Opcode = Opcode(0x19);
	pub const BYTE: Opcode = Opcode(0x1a);
	pub const SHL: Opcode = Opcode(0x1b);
	pub const SHR: Opcode = Opcode(0x1c);
	pub const SAR: Opcode = Opcode(0x1d);

	pub const KECCAK256: Opcode = Opcode(0x20);
}

// Environment and block information.
impl Opcode {
	pub const ADDRESS: Opcode = Opcode(0x30);
	pub const BALANCE: Opcode = Opcode(0x31);
	pub const ORIGIN: Opcode = Opcode(0x32);
	pub const CALLER: Opcode = Opcode(0x33);
	pub const CALLVALUE: Opcode = Opcode(0x34);
	pub const CALLDATALOAD: Opcode = Opcode(0x35);
	pub const CALLDATASIZE: Opcode = Opcode(0x36);
	pub const CALLDATACOPY: Opcode = Opcode(0x37);
	pub const CODESIZE: Opcode = Opcode(0x38);
	pub const CODECOPY: Opcode = Opcode(0x39);
	pub const GASPRICE: Opcode = Opcode(0x3a);
	pub const EXTCODESIZE: Opcode = Opcode(0x3b);
	pub const EXTCODECOPY: Opcode = Opcode(0x3c);
	pub const RETURNDATASIZE: Opcode = Opcode(0x3d);
	pub const RETURNDATACOPY: Opcode = Opcode(0x3e);
	pub const EXTCODEHASH: Opcode = Opcode(0x3f);

	pub const BLOCKHASH: Opcode = Opcode(0x40);
	pub const COINBASE: Opcode = Opcode(0x41);
	pub const TIMESTAMP: Opcode = Opcode(0x42);
	pub const NUMBER: Opcode = Opcode(0x43);
	/// `DIFFICULTY` before Paris, `PREVRANDAO` afterwards.
	pub const PREVRANDAO: Opcode = Opcode(0x44);
	pub const GASLIMIT: Opcode = Opcode(0x45);
	pub const CHAINID: Opcode = Opcode(0x46);
	pub const SELFBALANCE: Opcode = Opcode(0x47);
	pub const BASEFEE: Opcode = Opcode(0x48);
	pub const BLOBHASH: Opcode = Opcode(0x49);
	pub const BLOBBASEFEE: Opcode = Opcode(0x4a);
}

// Stack, memory, storage and flow.
impl Opcode {
	pub const POP: Opcode = Opcode(0x50);
	pub const MLOAD: Opcode = Opcode(0x51);
	pub const MSTORE: Opcode = Opcode(0x52);
	pub const MSTORE8: Opcode = Opcode(0x53);
	pub const SLOAD: Opcode = Opcode(0x54);
	pub const SSTORE: Opcode = Opcode(0x55);
	pub const JUMP: Opcode = Opcode(0x56);
	pub const JUMPI: Opcode = Opcode(0x57);
	pub const PC: Opcode = Opcode(0x58);
	pub const MSIZE: Opcode = Opcode(0x59);
	pub const GAS: Opcode = Opcode(0x5a);
	pub const JUMPDEST: Opcode = Opcode(0x5b);
	pub const TLOAD: Opcode = Opcode(0x5c);
	pub const TSTORE: Opcode = Opcode(0x5d);
	pub const MCOPY: Opcode = Opcode(0x5e);

	pub const PUSH0: Opcode = Opcode(0x5f);
	pub const PUSH1: Opcode = Opcode(0x60);
	pub const PUSH2: Opcode = Opcode(0x61);
	pub const PUSH32: Opcode = Opcode(0x7f);
	pub const DUP1: Opcode = Opcode(0x80);
	pub const DUP16: Opcode = Opcode(0x8f);
	pub const SWAP1: Opcode = Opcode(0x90);
	pub const SWAP16: Opcode = Opcode(0x9f);

	pub const LOG0: Opcode = Opcode(0xa0);
	pub const LOG1: Opcode = Opcode(0xa1);
	pub const LOG2: Opcode = Opcode(0xa2);
	pub const LOG3: Opcode = Opcode(0xa3);
	pub const LOG4: Opcode = Opcode(0xa4);
}

// System operations.
impl Opcode {
	pub const CREATE: Opcode = Opcode(0xf0);
	pub const CALL: Opcode = Opcode(0xf1);
	pub const CALLCODE: Opcode = Opcode(0xf2);
	pub const RETURN: Opcode = Opcode(0xf3);
	pub const DELEGATECALL: Opcode = Opcode(0xf4);
	pub const CREATE2: Opcode = Opcode(0xf5);
	pub const STATICCALL: Opcode = Opcode(0xfa);
	pub const REVERT: Opcode = Opcode(0xfd);
	pub const INVALID: Opcode = Opcode(0xfe);
	pub const SELFDESTRUCT: Opcode = Opcode(0xff);
}

impl Opcode {
	/// Number of immediate bytes if this is `PUSH1`..`PUSH32`.
	pub fn is_push(&self) -> Option<u8> {
		if (Self::PUSH1.0..=Self::PUSH32.0).contains(&self.0) {
			Some(self.0 - Self::PUSH1.0 + 1)
		} else {
			None
		}
	}

	/// Stack depth duplicated by `DUP1`..`DUP16` (1-based).
	pub fn is_dup(&self) -> Option<usize> {
		if (Self::DUP1.0..=Self::DUP16.0).contains(&self.0) {
			Some((self.0 - Self::DUP1.0 + 1) as usize)
		} else {
			None
		}
	}

	/// Stack depth exchanged with the top by `SWAP1`..`SWAP16`.
	pub fn is_swap(&self) -> Option<usize> {
		if (Self::SWAP1.0..=Self::SWAP16.0).contains(&self.0) {
			Some((self.0 - Self::SWAP1.0 + 1) as usize)
		} else {
			None
		}
	}

	/// Topic count of `LOG0`..`LOG4`.
	pub fn is_log(&self) -> Option<usize> {
		if (Self::LOG0.0..=Self::LOG4.0).contains(&self.0) {
			Some((self.0 - Self::LOG0.0) as usize)
		} else {
			None
		}
	}

	#[inline]
	pub const fn as_u8(&self) -> u8 {
		self.0
	}

	#[inline]
	pub const fn as_usize(&self) -> usize {
		self.0 as usize
	}

	/// Mnemonic, if the byte names an instruction in any supported revision.
	pub fn name(&self) -> Option<&'static str> {
		const PUSH: [&str; 32] = [
			"PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8", "PUSH9",
			"PUSH10", "PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16", "PUSH17",
			"PUSH18", "PUSH19", "PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24", "PUSH25",
			"PUSH26", "PUSH27", "PUSH28", "PUSH29", "PUSH30", "PUSH31", "PUSH32",
		];
		const DUP: [&str; 16] = [
			"DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8", "DUP9", "DUP10",
			"DUP11", "DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
		];
		const SWAP: [&str; 16] = [
			"SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8", "SWAP9",
			"SWAP10", "SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
		];
		const LOG: [&str; 5] = ["LOG0", "LOG1", "LOG2", "LOG3", "LOG4"];

		if let Some(n) = self.is_push() {
			return Some(PUSH[n as usize - 1]);
		}
		if let Some(n) = self.is_dup() {
			return Some(DUP[n - 1]);
		}
		if let Some(n) = self.is_swap() {
			return Some(SWAP[n - 1]);
		}
		if let Some(n) = self.is_log() {
			return Some(LOG[n]);
		}

		Some(match *self {
			Opcode::STOP => "STOP",
			Opcode::ADD => "ADD",
			Opcode::MUL => "MUL",
			Opcode::SUB => "SUB",
			Opcode::DIV => "DIV",
			Opcode::SDIV => "SDIV",
			Opcode::MOD => "MOD",
			Opcode::SMOD => "SMOD",
			Opcode::ADDMOD => "ADDMOD",
			Opcode::MULMOD => "MULMOD",
			Opcode::EXP => "EXP",
			Opcode::SIGNEXTEND => "SIGNEXTEND",
			Opcode::LT => "LT",
			Opcode::GT => "GT",
			Opcode::SLT => "SLT",
			Opcode::SGT => "SGT",
			Opcode::EQ => "EQ",
			Opcode::ISZERO => "ISZERO",
			Opcode::AND => "AND",
			Opcode::OR => "OR",
			Opcode::XOR => "XOR",
			Opcode::NOT => "NOT",
			Opcode::BYTE => "BYTE",
			Opcode::SHL => "SHL",
			Opcode::SHR => "SHR",
			Opcode::SAR => "SAR",
			Opcode::KECCAK256 => "KECCAK256",
			Opcode::ADDRESS => "ADDRESS",
			Opcode::BALANCE => "BALANCE",
			Opcode::ORIGIN => "ORIGIN",
			Opcode::CALLER => "CALLER",
			Opcode::CALLVALUE => "CALLVALUE",
			Opcode::CALLDATALOAD => "CALLDATALOAD",
			Opcode::CALLDATASIZE => "CALLDATASIZE",
			Opcode::CALLDATACOPY => "CALLDATACOPY",
			Opcode::CODESIZE => "CODESIZE",
			Opcode::CODECOPY => "CODECOPY",
			Opcode::GASPRICE => "GASPRICE",
			Opcode::EXTCODESIZE => "EXTCODESIZE",
			Opcode::EXTCODECOPY => "EXTCODECOPY",
			Opcode::RETURNDATASIZE => "RETURNDATASIZE",
			Opcode::RETURNDATACOPY => "RETURNDATACOPY",
			Opcode::EXTCODEHASH => "EXTCODEHASH",
			Opcode::BLOCKHASH => "BLOCKHASH",
			Opcode::COINBASE => "COINBASE",
			Opcode::TIMESTAMP => "TIMESTAMP",
			Opcode::NUMBER => "NUMBER",
			Opcode::PREVRANDAO => "PREVRANDAO",
			Opcode::GASLIMIT => "GASLIMIT",
			Opcode::CHAINID => "CHAINID",
			Opcode::SELFBALANCE => "SELFBALANCE",
			Opcode::BASEFEE => "BASEFEE",
			Opcode::BLOBHASH => "BLOBHASH",
			Opcode::BLOBBASEFEE => "BLOBBASEFEE",
			Opcode::POP => "POP",
			Opcode::MLOAD => "MLOAD",
			Opcode::MSTORE => "MSTORE",
			Opcode::MSTORE8 => "MSTORE8",
			Opcode::SLOAD => "SLOAD",
			Opcode::SSTORE => "SSTORE",
			Opcode::JUMP => "JUMP",
			Opcode::JUMPI => "JUMPI",
			Opcode::PC => "PC",
			Opcode::MSIZE => "MSIZE",
			Opcode::GAS => "GAS",
			Opcode::JUMPDEST => "JUMPDEST",
			Opcode::TLOAD => "TLOAD",
			Opcode::TSTORE => "TSTORE",
			Opcode::MCOPY => "MCOPY",
			Opcode::PUSH0 => "PUSH0",
			Opcode::CREATE => "CREATE",
			Opcode::CALL => "CALL",
			Opcode::CALLCODE => "CALLCODE",
			Opcode::RETURN => "RETURN",
			Opcode::DELEGATECALL => "DELEGATECALL",
			Opcode::CREATE2 => "CREATE2",
			Opcode::STATICCALL => "STATICCALL",
			Opcode::REVERT => "REVERT",
			Opcode::INVALID => "INVALID",
			Opcode::SELFDESTRUCT => "SELFDESTRUCT",
			_ => return None,
		})
	}
}

impl core::fmt::Debug for Opcode {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		write!(f, "{:02x}", self.0)
	}
}

impl core::fmt::Display for Opcode {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self.name() {
			Some(name) => f.write_str(name),
			None => write!(f, "UNDEFINED(0x{:02x})", self.0),
		}
	}
}
