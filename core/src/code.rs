use crate::Valids;
use alloc::{sync::Arc, vec::Vec};
use primitive_types::{H256, U256};
use sha3::{Digest, Keccak256};

#[derive(Debug, Eq, PartialEq, Hash)]
struct Inner {
	bytes: Vec<u8>,
	valids: Valids,
	hash: H256,
}

/// Immutable bytecode with its jump-destination analysis. Cloning is cheap
/// and clones share the same analysis.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Code(Arc<Inner>);

impl Code {
	pub fn new(bytes: Vec<u8>) -> Self {
		let valids = Valids::new(&bytes);
		let hash = H256::from_slice(Keccak256::digest(&bytes).as_slice());
		Self(Arc::new(Inner {
			bytes,
			valids,
			hash,
		}))
	}

	pub fn bytes(&self) -> &[u8] {
		&self.0.bytes
	}

	pub fn len(&self) -> usize {
		self.0.bytes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.bytes.is_empty()
	}

	/// Keccak-256 of the bytes.
	pub fn hash(&self) -> H256 {
		self.0.hash
	}

	/// Byte at `position`, if inside the code.
	#[inline]
	pub fn get(&self, position: usize) -> Option<u8> {
		self.0.bytes.get(position).copied()
	}

	#[inline]
	pub fn is_valid_jump_destination(&self, position: usize) -> bool {
		self.0.valids.is_valid(position)
	}

	/// The `n` immediate bytes following `position` as a big-endian word.
	/// Bytes past the end of code read as zero.
	pub fn push_data(&self, position: usize, n: usize) -> U256 {
		let mut word = [0u8; 32];
		let start = position.saturating_add(1);
		if start < self.len() {
			let available = &self.0.bytes[start..core::cmp::min(self.len(), start + n)];
			word[32 - n..32 - n + available.len()].copy_from_slice(available);
		}
		U256::from_big_endian(&word)
	}
}

impl Default for Code {
	fn default() -> Self {
		Self::new(Vec::new())
	}
}

impl From<Vec<u8>> for Code {
	fn from(bytes: Vec<u8>) -> Self {
		Self::new(bytes)
	}
}

impl From<&[u8]> for Code {
	fn from(bytes: &[u8]) -> Self {
		Self::new(bytes.to_vec())
	}
}

#[cfg(feature = "with-serde")]
impl serde::Serialize for Code {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_bytes(self.bytes())
	}
}

#[cfg(feature = "with-serde")]
impl<'de> serde::Deserialize<'de> for Code {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let bytes = <Vec<u8> as serde::Deserialize>::deserialize(deserializer)?;
		Ok(Self::new(bytes))
	}
}

#[cfg(test)]
mod tests {
	use super::Code;
	use crate::Opcode;
	use primitive_types::U256;
	use proptest::prelude::*;

	#[test]
	fn missing_push_data_is_zero_padded() {
		// PUSH3 0x01 0x02 <end>
		let code = Code::new(vec![0x62, 0x01, 0x02]);
		assert_eq!(code.push_data(0, 3), U256::from(0x010200));
		// PUSH2 with nothing after it.
		let code = Code::new(vec![0x61]);
		assert_eq!(code.push_data(0, 2), U256::zero());
	}

	#[test]
	fn push32_reads_full_word() {
		let mut bytes = vec![0x7f];
		bytes.extend_from_slice(&[0xff; 32]);
		let code = Code::new(bytes);
		assert_eq!(code.push_data(0, 32), U256::MAX);
	}

	#[test]
	fn clones_share_analysis() {
		let code = Code::new(hex::decode("5b600056").unwrap());
		let other = code.clone();
		assert!(other.is_valid_jump_destination(0));
		assert_eq!(code.hash(), other.hash());
		assert_eq!(code.get(4), None);
	}

	proptest! {
		#[test]
		fn destinations_are_jumpdests_outside_push_data(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
			let code = Code::new(bytes.clone());
			let mut in_push_data = vec![false; bytes.len()];
			let mut i = 0;
			while i < bytes.len() {
				if let Some(n) = Opcode(bytes[i]).is_push() {
					for j in i + 1..=i + n as usize {
						if j < bytes.len() {
							in_push_data[j] = true;
						}
					}
					i += n as usize + 1;
				} else {
					i += 1;
				}
			}
			for (position, byte) in bytes.iter().enumerate() {
				let expected = *byte == Opcode::JUMPDEST.0 && !in_push_data[position];
				prop_assert_eq!(code.is_valid_jump_destination(position), expected);
			}
		}
	}
}
