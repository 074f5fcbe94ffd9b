use crate::utils::USIZE_MAX;
use crate::ExitError;
use alloc::vec::Vec;
use primitive_types::{H256, U256};

/// Maximum number of words on the operand stack.
pub const STACK_LIMIT: usize = 1024;

/// EVM operand stack.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stack {
	data: Vec<U256>,
}

impl Stack {
	/// Create an empty stack.
	#[must_use]
	pub const fn new() -> Self {
		Self { data: Vec::new() }
	}

	/// Build a stack from words listed bottom to top.
	///
	/// # Errors
	/// `StackOverflow` if more than [`STACK_LIMIT`] words are given.
	pub fn from_words(words: Vec<U256>) -> Result<Self, ExitError> {
		if words.len() > STACK_LIMIT {
			return Err(ExitError::StackOverflow);
		}
		Ok(Self { data: words })
	}

	/// Stack length.
	#[inline]
	#[must_use]
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Whether the stack is empty.
	#[inline]
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Stack data, bottom first.
	#[inline]
	#[must_use]
	pub fn data(&self) -> &[U256] {
		&self.data
	}

	/// Pop a value from the stack. If the stack is already empty, returns the
	/// `StackUnderflow` error.
	///
	/// # Errors
	/// Return `ExitError`
	#[inline]
	pub fn pop(&mut self) -> Result<U256, ExitError> {
		self.data.pop().ok_or(ExitError::StackUnderflow)
	}

	/// # Errors
	/// Return `ExitError`
	#[inline]
	pub fn pop_h256(&mut self) -> Result<H256, ExitError> {
		self.pop().map(|it| {
			let mut res = H256([0; 32]);
			it.to_big_endian(&mut res.0);
			res
		})
	}

	/// Push a new value into the stack. If it will exceed the stack limit,
	/// returns `StackOverflow` error and leaves the stack unchanged.
	///
	/// # Errors
	/// Return `ExitError`
	#[inline]
	pub fn push(&mut self, value: U256) -> Result<(), ExitError> {
		if self.data.len() >= STACK_LIMIT {
			return Err(ExitError::StackOverflow);
		}
		self.data.push(value);
		Ok(())
	}

	/// # Errors
	/// Return `ExitError`
	#[inline]
	pub fn push_h256(&mut self, value: H256) -> Result<(), ExitError> {
		self.push(U256::from_big_endian(&value[..]))
	}

	/// Peek a value at given index for the stack, where the top of
	/// the stack is at index `0`.
	///
	/// # Errors
	/// `StackUnderflow` if the index is too large.
	#[inline]
	pub fn peek(&self, no_from_top: usize) -> Result<U256, ExitError> {
		if self.data.len() > no_from_top {
			Ok(self.data[self.data.len() - no_from_top - 1])
		} else {
			Err(ExitError::StackUnderflow)
		}
	}

	/// # Errors
	/// Return `ExitError`
	#[inline]
	pub fn peek_h256(&self, no_from_top: usize) -> Result<H256, ExitError> {
		self.peek(no_from_top).map(|it| {
			let mut res = H256([0; 32]);
			it.to_big_endian(&mut res.0);
			res
		})
	}

	/// Peek a value at given index for the stack as usize.
	///
	/// If the value is larger than `usize::MAX`, `OutOfGas` error is returned.
	///
	/// # Errors
	/// Return `ExitError`
	#[inline]
	pub fn peek_usize(&self, no_from_top: usize) -> Result<usize, ExitError> {
		let u = self.peek(no_from_top)?;
		if u > USIZE_MAX {
			return Err(ExitError::OutOfGas);
		}
		Ok(u.as_usize())
	}

	/// Set a value at given index for the stack, where the top of the
	/// stack is at index `0`.
	///
	/// # Errors
	/// `StackUnderflow` if the index is too large.
	#[inline]
	pub fn set(&mut self, no_from_top: usize, val: U256) -> Result<(), ExitError> {
		if self.data.len() > no_from_top {
			let len = self.data.len();
			self.data[len - no_from_top - 1] = val;
			Ok(())
		} else {
			Err(ExitError::StackUnderflow)
		}
	}

	/// Exchange the top with the word `no_from_top` below it (`SWAPn`).
	///
	/// # Errors
	/// `StackUnderflow` if fewer than `no_from_top + 1` words are present.
	#[inline]
	pub fn swap(&mut self, no_from_top: usize) -> Result<(), ExitError> {
		let len = self.data.len();
		if len > no_from_top {
			self.data.swap(len - 1, len - no_from_top - 1);
			Ok(())
		} else {
			Err(ExitError::StackUnderflow)
		}
	}

	/// Push a copy of the word `no_from_top` (`DUPn` uses `n - 1`).
	///
	/// # Errors
	/// `StackUnderflow` or `StackOverflow`.
	#[inline]
	pub fn dup(&mut self, no_from_top: usize) -> Result<(), ExitError> {
		let value = self.peek(no_from_top)?;
		self.push(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn push_fails_at_capacity() {
		let mut stack = Stack::new();
		for i in 0..STACK_LIMIT {
			stack.push(U256::from(i)).unwrap();
		}
		assert_eq!(stack.push(U256::one()), Err(ExitError::StackOverflow));
		assert_eq!(stack.len(), STACK_LIMIT);
		assert_eq!(stack.peek(0), Ok(U256::from(STACK_LIMIT - 1)));
	}

	#[test]
	fn underflow_is_detected() {
		let mut stack = Stack::new();
		assert_eq!(stack.pop(), Err(ExitError::StackUnderflow));
		stack.push(U256::one()).unwrap();
		assert_eq!(stack.peek(1), Err(ExitError::StackUnderflow));
		assert_eq!(stack.swap(1), Err(ExitError::StackUnderflow));
		assert_eq!(stack.dup(1), Err(ExitError::StackUnderflow));
	}

	#[test]
	fn swap_and_dup_address_from_top() {
		let mut stack = Stack::from_words(vec![1.into(), 2.into(), 3.into()]).unwrap();
		stack.swap(2).unwrap();
		assert_eq!(stack.data(), &[3.into(), 2.into(), 1.into()]);
		stack.dup(1).unwrap();
		assert_eq!(stack.peek(0), Ok(U256::from(2)));
		assert_eq!(stack.len(), 4);
	}

	#[test]
	fn from_words_respects_limit() {
		assert!(Stack::from_words(vec![U256::zero(); STACK_LIMIT]).is_ok());
		assert_eq!(
			Stack::from_words(vec![U256::zero(); STACK_LIMIT + 1]),
			Err(ExitError::StackOverflow)
		);
	}
}
