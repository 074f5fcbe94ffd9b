use primitive_types::{H160, H256, U256};

/// How the address of a new contract is derived.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CreateScheme {
	/// `CREATE`: from the caller and its nonce.
	Legacy { caller: H160 },
	/// `CREATE2`: from the caller, a salt and the init code hash.
	Create2 {
		caller: H160,
		code_hash: H256,
		salt: H256,
	},
}

impl CreateScheme {
	pub fn caller(&self) -> H160 {
		match self {
			Self::Legacy { caller } | Self::Create2 { caller, .. } => *caller,
		}
	}
}

/// The four message-call opcodes.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CallScheme {
	Call,
	CallCode,
	DelegateCall,
	StaticCall,
}

/// Identity a frame executes under, as seen by `ADDRESS`, `CALLER` and
/// `CALLVALUE`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Context {
	/// Account whose storage and balance are used.
	pub address: H160,
	pub caller: H160,
	pub apparent_value: U256,
}
