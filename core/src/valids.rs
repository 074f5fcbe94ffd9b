use crate::Opcode;
use alloc::vec::Vec;

/// Bitmap of the jump destinations of a piece of code.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Valids {
	len: usize,
	bits: Vec<u64>,
}

impl Valids {
	/// Scans `code` once. A `JUMPDEST` byte inside the immediate of a
	/// `PUSHn` is data, not a destination.
	pub fn new(code: &[u8]) -> Self {
		let mut valids = Self {
			len: code.len(),
			bits: alloc::vec![0; (code.len() + 63) / 64],
		};

		let mut position = 0;
		while let Some(&byte) = code.get(position) {
			let opcode = Opcode(byte);
			if opcode == Opcode::JUMPDEST {
				valids.bits[position / 64] |= 1 << (position % 64);
			}
			position += 1 + opcode.is_push().map_or(0, usize::from);
		}

		valids
	}

	/// Length of the scanned code.
	#[inline]
	pub fn len(&self) -> usize {
		self.len
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	#[inline]
	pub fn is_valid(&self, position: usize) -> bool {
		position < self.len && (self.bits[position / 64] >> (position % 64)) & 1 == 1
	}
}

#[cfg(test)]
mod tests {
	use super::Valids;

	#[test]
	fn push_data_is_never_a_destination() {
		// PUSH2 0x5b5b, JUMPDEST, PUSH1 (missing data)
		let valids = Valids::new(&[0x61, 0x5b, 0x5b, 0x5b, 0x60]);
		assert!(!valids.is_valid(1));
		assert!(!valids.is_valid(2));
		assert!(valids.is_valid(3));
		assert!(!valids.is_valid(4));
		assert!(!valids.is_valid(200));
	}

	#[test]
	fn destinations_past_the_first_word() {
		let mut code = alloc::vec![0x00; 130];
		code[64] = 0x5b;
		code[129] = 0x5b;
		let valids = Valids::new(&code);
		assert!(valids.is_valid(64));
		assert!(valids.is_valid(129));
		assert!(!valids.is_valid(128));
		assert_eq!(valids.len(), 130);
	}

	#[test]
	fn empty_code_has_no_destinations() {
		let valids = Valids::new(&[]);
		assert!(valids.is_empty());
		assert!(!valids.is_valid(0));
	}
}
