use alloc::{format, string::String, vec::Vec};
use core::cmp::min;
use primitive_types::{H256, U256};
use sha3::{Digest, Keccak256};

/// Linear byte-addressable memory of one call frame. Its size is always a
/// multiple of 32 and never shrinks.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Memory {
	data: Vec<u8>,
}

/// Memory cost of `size` bytes: `words² / 512 + 3 · words`.
#[inline]
pub fn memory_cost(size: u64) -> u64 {
	let words = u128::from(size / 32 + u64::from(size % 32 != 0));
	let cost = words * words / 512 + 3 * words;
	if cost > u128::from(u64::MAX) {
		u64::MAX
	} else {
		cost as u64
	}
}

impl Memory {
	pub fn new() -> Self {
		Self { data: Vec::new() }
	}

	/// Memory holding `data`, zero-padded to the next word boundary.
	pub fn with_data(data: Vec<u8>) -> Self {
		let mut memory = Self { data };
		memory.pad();
		memory
	}

	/// Size in bytes.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn data(&self) -> &[u8] {
		&self.data
	}

	pub fn into_data(self) -> Vec<u8> {
		self.data
	}

	/// Appends raw bytes and pads the result to a word boundary.
	pub fn append(&mut self, data: &[u8]) {
		self.data.extend_from_slice(data);
		self.pad();
	}

	fn pad(&mut self) {
		let rem = self.data.len() % 32;
		if rem != 0 {
			self.data.resize(self.data.len() + 32 - rem, 0);
		}
	}

	/// Grows memory to cover `offset..offset + size`, rounded up to 32 bytes.
	/// Zero-sized spans never grow memory.
	///
	/// ## Panics
	///
	/// `offset + size` must not overflow; callers establish this through
	/// [`Memory::expansion_cost`] first.
	pub fn grow(&mut self, offset: usize, size: usize) {
		if size == 0 {
			return;
		}
		let end = offset + size;
		if end > self.data.len() {
			let new_len = end + (32 - end % 32) % 32;
			self.data.resize(new_len, 0);
		}
	}

	/// Additional gas needed to make `offset..offset + size` addressable,
	/// together with offset and size narrowed to `usize`.
	///
	/// Spans that cannot be represented yield a cost of `u64::MAX` and a
	/// clamped `(0, 0)` span; no amount of gas can pay for them.
	pub fn expansion_cost(&self, offset: U256, size: U256) -> (u64, usize, usize) {
		if size.is_zero() {
			let offset = if offset > U256::from(usize::MAX) {
				0
			} else {
				offset.as_usize()
			};
			return (0, offset, 0);
		}
		if size > U256::from(u64::MAX)
			|| offset > U256::from(u64::MAX)
			|| size > U256::from(usize::MAX)
			|| offset > U256::from(usize::MAX)
		{
			return (u64::MAX, 0, 0);
		}

		let offset = offset.as_usize();
		let size = size.as_usize();
		let end = match offset.checked_add(size) {
			Some(end) if (end as u64) < u64::MAX - 31 => end,
			_ => return (u64::MAX, 0, 0),
		};

		if end <= self.data.len() {
			return (0, offset, size);
		}

		let cost = memory_cost(end as u64) - memory_cost(self.data.len() as u64);
		(cost, offset, size)
	}

	/// Reads `size` bytes at `offset`, growing memory first.
	pub fn read(&mut self, offset: usize, size: usize) -> Vec<u8> {
		if size == 0 {
			return Vec::new();
		}
		self.grow(offset, size);
		self.data[offset..offset + size].to_vec()
	}

	/// Reads a 32-byte word at `offset`, growing memory first.
	pub fn read_word(&mut self, offset: usize) -> U256 {
		self.grow(offset, 32);
		U256::from_big_endian(&self.data[offset..offset + 32])
	}

	/// Writes `data` at `offset`, growing memory first.
	pub fn write(&mut self, data: &[u8], offset: usize) {
		if data.is_empty() {
			return;
		}
		self.grow(offset, data.len());
		self.data[offset..offset + data.len()].copy_from_slice(data);
	}

	/// Writes `value` into `offset..offset + target_size`, zero-filling the
	/// remainder when `value` is shorter and truncating it when longer.
	pub fn set(&mut self, offset: usize, value: &[u8], target_size: usize) {
		if target_size == 0 {
			return;
		}
		self.grow(offset, target_size);
		let copied = min(value.len(), target_size);
		self.data[offset..offset + copied].copy_from_slice(&value[..copied]);
		for byte in &mut self.data[offset + copied..offset + target_size] {
			*byte = 0;
		}
	}

	/// Copies `len` bytes of `source` starting at `source_offset` into memory.
	/// Source bytes past its end read as zero.
	pub fn copy_padded(&mut self, memory_offset: usize, source_offset: U256, len: usize, source: &[u8]) {
		if len == 0 {
			return;
		}
		let slice = if source_offset >= U256::from(source.len()) {
			&[][..]
		} else {
			let start = source_offset.as_usize();
			&source[start..min(source.len(), start.saturating_add(len))]
		};
		self.set(memory_offset, slice, len);
	}

	/// Copies `len` bytes from `src` to `dst` within memory (MCOPY); both
	/// spans are grown first.
	pub fn copy_within(&mut self, dst: usize, src: usize, len: usize) {
		if len == 0 {
			return;
		}
		self.grow(src, len);
		self.grow(dst, len);
		self.data.copy_within(src..src + len, dst);
	}

	/// Keccak-256 of `offset..offset + size`, growing memory first.
	pub fn hash(&mut self, offset: usize, size: usize) -> H256 {
		self.grow(offset, size);
		let mut hasher = Keccak256::new();
		if size > 0 {
			hasher.update(&self.data[offset..offset + size]);
		}
		H256::from_slice(hasher.finalize().as_slice())
	}

	/// Human-readable differences against `other`. Memories of different
	/// sizes only report the size mismatch.
	pub fn diff(&self, other: &Memory) -> Vec<String> {
		if self.len() != other.len() {
			return alloc::vec![format!(
				"Different memory size: {} vs {}",
				self.len(),
				other.len()
			)];
		}
		self.data
			.iter()
			.zip(other.data.iter())
			.enumerate()
			.filter(|(_, (a, b))| a != b)
			.map(|(i, (a, b))| format!("Different memory value at offset {}: {} vs {}", i, a, b))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::{memory_cost, Memory, U256};
	use proptest::prelude::*;

	#[test]
	fn grow_rounds_to_words() {
		let mut memory = Memory::new();
		memory.grow(0, 1);
		assert_eq!(memory.len(), 32);
		memory.grow(31, 2);
		assert_eq!(memory.len(), 64);
		memory.grow(10, 10);
		assert_eq!(memory.len(), 64);
		memory.grow(1000, 0);
		assert_eq!(memory.len(), 64);
	}

	#[test]
	fn zero_sized_requests_are_free() {
		let mut memory = Memory::new();
		assert_eq!(memory.expansion_cost(U256::zero(), U256::zero()).0, 0);
		assert_eq!(memory.expansion_cost(U256::MAX, U256::zero()).0, 0);
		assert!(memory.read(1 << 40, 0).is_empty());
		memory.write(&[], 1 << 40);
		assert!(memory.is_empty());
	}

	#[test]
	fn expansion_cost_is_marginal() {
		let mut memory = Memory::new();
		let (cost, offset, size) = memory.expansion_cost(U256::from(0), U256::from(32));
		assert_eq!((cost, offset, size), (3, 0, 32));
		memory.grow(offset, size);
		assert_eq!(memory.expansion_cost(U256::from(0), U256::from(32)).0, 0);
		// 1 -> 2 words: (4/512 + 6) - (1/512 + 3)
		assert_eq!(memory.expansion_cost(U256::from(32), U256::from(1)).0, 3);
		assert_eq!(memory_cost(32 * 1024), 1024 * 1024 / 512 + 3 * 1024);
	}

	#[test]
	fn unrepresentable_spans_saturate() {
		let memory = Memory::new();
		let big = U256::from(u64::MAX) + 1;
		assert_eq!(memory.expansion_cost(big, U256::from(1)), (u64::MAX, 0, 0));
		assert_eq!(memory.expansion_cost(U256::zero(), big), (u64::MAX, 0, 0));
		assert_eq!(
			memory.expansion_cost(U256::from(u64::MAX), U256::from(u64::MAX)),
			(u64::MAX, 0, 0)
		);
		assert_eq!(memory.expansion_cost(big, U256::zero()).0, 0);
	}

	#[test]
	fn hash_grows_and_digests_span() {
		let mut memory = Memory::new();
		let empty = memory.hash(100, 0);
		assert_eq!(
			hex::encode(empty),
			"c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
		);
		assert!(memory.is_empty());

		memory.write(&[0xff], 0);
		let digest = memory.hash(0, 1);
		assert_eq!(
			hex::encode(digest),
			"8b1a944cf13a9a1c08facb2c9e98623ef3254d2ddb48113885c3e8e97fec8db9"
		);
		memory.hash(40, 1);
		assert_eq!(memory.len(), 64);
	}

	#[test]
	fn diff_reports_size_only_on_mismatch() {
		let a = Memory::with_data(vec![1; 32]);
		let b = Memory::with_data(vec![1; 64]);
		assert_eq!(a.diff(&b), vec!["Different memory size: 32 vs 64".to_string()]);

		let mut c = a.clone();
		c.write(&[2, 3], 4);
		let diff = a.diff(&c);
		assert_eq!(diff.len(), 2);
		assert_eq!(diff[0], "Different memory value at offset 4: 1 vs 2");
		assert_ne!(a, c);
	}

	#[test]
	fn append_and_with_data_keep_word_alignment() {
		let mut memory = Memory::with_data(vec![7; 3]);
		assert_eq!(memory.len(), 32);
		memory.append(&[1; 33]);
		assert_eq!(memory.len(), 96);
		assert_eq!(memory.data()[32], 1);
	}

	#[test]
	fn copy_padded_reads_zero_past_source() {
		let mut memory = Memory::with_data(vec![0xaa; 32]);
		memory.copy_padded(0, U256::from(2), 4, &[1, 2, 3, 4]);
		assert_eq!(&memory.data()[..5], &[3, 4, 0, 0, 0xaa]);
		memory.copy_padded(8, U256::MAX, 2, &[1, 2]);
		assert_eq!(&memory.data()[8..10], &[0, 0]);
	}

	#[test]
	fn copy_within_handles_overlap() {
		let mut memory = Memory::with_data((0u8..32).collect());
		memory.copy_within(1, 0, 4);
		assert_eq!(&memory.data()[..6], &[0, 0, 1, 2, 3, 5]);
		memory.copy_within(40, 0, 2);
		assert_eq!(memory.len(), 64);
	}

	proptest! {
		#[test]
		fn write_then_read_round_trips(data in proptest::collection::vec(any::<u8>(), 0..200), offset in 0usize..4096) {
			let mut memory = Memory::new();
			memory.write(&data, offset);
			prop_assert_eq!(memory.read(offset, data.len()), data);
			prop_assert_eq!(memory.len() % 32, 0);
		}

		#[test]
		fn grow_settles_expansion_cost(offset in 0u64..100_000, size in 0u64..100_000) {
			let mut memory = Memory::new();
			let (_, o, s) = memory.expansion_cost(U256::from(offset), U256::from(size));
			memory.grow(o, s);
			if size > 0 {
				prop_assert!(memory.len() as u64 >= offset + size);
			}
			prop_assert_eq!(memory.len() % 32, 0);
			prop_assert_eq!(memory.expansion_cost(U256::from(offset), U256::from(size)).0, 0);
		}

		#[test]
		fn expansion_cost_is_monotonic(a in 1u64..1_000_000, b in 1u64..1_000_000) {
			let memory = Memory::new();
			let (low, high) = if a <= b { (a, b) } else { (b, a) };
			let cost_low = memory.expansion_cost(U256::zero(), U256::from(low)).0;
			let cost_high = memory.expansion_cost(U256::zero(), U256::from(high)).0;
			prop_assert!(cost_low <= cost_high);
		}
	}
}
