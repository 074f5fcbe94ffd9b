use core::cmp::Ordering;
use core::ops::{Div, Rem};
use primitive_types::U256;

/// Precalculated `usize::MAX` for `U256`
pub const USIZE_MAX: U256 = U256([usize::MAX as u64, 0, 0, 0]);

/// A 256-bit word read as a two's complement signed integer.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct I256(U256);

impl I256 {
	pub const ZERO: I256 = I256(U256::zero());
	/// `-2^255`, the one value without a positive counterpart.
	pub const MIN: I256 = I256(U256([0, 0, 0, 0x8000_0000_0000_0000]));

	pub fn is_negative(&self) -> bool {
		self.0.bit(255)
	}

	/// Absolute value. `MIN` maps to `2^255`.
	pub fn magnitude(&self) -> U256 {
		if self.is_negative() {
			negate(self.0)
		} else {
			self.0
		}
	}

	/// The value `-magnitude`.
	pub fn negative(magnitude: U256) -> Self {
		Self(negate(magnitude))
	}

	/// Signed value with the given magnitude and sign.
	fn with_sign(magnitude: U256, negative: bool) -> Self {
		if negative {
			Self::negative(magnitude)
		} else {
			Self(magnitude)
		}
	}
}

fn negate(value: U256) -> U256 {
	(!value).overflowing_add(U256::one()).0
}

impl From<U256> for I256 {
	fn from(value: U256) -> Self {
		Self(value)
	}
}

impl From<I256> for U256 {
	fn from(value: I256) -> Self {
		value.0
	}
}

impl Ord for I256 {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self.is_negative(), other.is_negative()) {
			(true, false) => Ordering::Less,
			(false, true) => Ordering::Greater,
			// same sign: two's complement order matches unsigned order
			_ => self.0.cmp(&other.0),
		}
	}
}

impl PartialOrd for I256 {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// Truncating division, zero when dividing by zero. `MIN / -1` wraps to
/// `MIN`.
impl Div for I256 {
	type Output = Self;

	fn div(self, other: Self) -> Self {
		if other.0.is_zero() {
			return Self::ZERO;
		}
		let quotient = self.magnitude() / other.magnitude();
		Self::with_sign(quotient, self.is_negative() != other.is_negative())
	}
}

/// Remainder carrying the sign of the dividend, zero for a zero divisor.
impl Rem for I256 {
	type Output = Self;

	fn rem(self, other: Self) -> Self {
		if other.0.is_zero() {
			return Self::ZERO;
		}
		let remainder = self.magnitude() % other.magnitude();
		Self::with_sign(remainder, self.is_negative())
	}
}

#[cfg(test)]
mod tests {
	use super::I256;
	use primitive_types::U256;

	fn int(value: i64) -> I256 {
		if value < 0 {
			I256::negative(U256::from(value.unsigned_abs()))
		} else {
			I256::from(U256::from(value))
		}
	}

	#[test]
	fn division_truncates_towards_zero() {
		assert_eq!(int(100) / int(-1), int(-100));
		assert_eq!(int(100) / int(2), int(50));
		assert_eq!(int(-7) / int(2), int(-3));
		assert_eq!(int(-7) / int(-2), int(3));
		assert_eq!(int(7) / int(0), I256::ZERO);
	}

	#[test]
	fn min_over_minus_one_wraps() {
		assert_eq!(I256::MIN / int(-1), I256::MIN);
		assert_eq!(I256::MIN / int(1), I256::MIN);
		assert_eq!(I256::MIN.magnitude(), U256::one() << 255);
	}

	#[test]
	fn rem_takes_sign_of_dividend() {
		assert_eq!(int(-7) % int(3), int(-1));
		assert_eq!(int(7) % int(-3), int(1));
		assert_eq!(int(7) % I256::ZERO, I256::ZERO);
	}

	#[test]
	fn ordering_is_signed() {
		assert!(int(-1) < int(0));
		assert!(I256::MIN < int(-1));
		assert!(int(3) > int(-300));
		assert_eq!(U256::from(int(-1)), U256::MAX);
	}
}
