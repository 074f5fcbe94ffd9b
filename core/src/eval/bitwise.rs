use crate::utils::I256;
use primitive_types::U256;

#[inline]
pub fn slt(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();

	if op1.lt(&op2) {
		U256::one()
	} else {
		U256::zero()
	}
}

#[inline]
pub fn sgt(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();

	if op1.gt(&op2) {
		U256::one()
	} else {
		U256::zero()
	}
}

#[inline]
pub fn iszero(op1: U256) -> U256 {
	if op1 == U256::zero() {
		U256::one()
	} else {
		U256::zero()
	}
}

#[inline]
pub fn not(op1: U256) -> U256 {
	!op1
}

/// Byte `op1` of `op2`, counting from the most significant byte.
#[inline]
pub fn byte(op1: U256, op2: U256) -> U256 {
	if op1 >= U256::from(32) {
		return U256::zero();
	}
	U256::from(op2.byte(31 - op1.as_usize()))
}

#[inline]
pub fn shl(shift: U256, value: U256) -> U256 {
	if value == U256::zero() || shift >= U256::from(256) {
		U256::zero()
	} else {
		value << shift.as_usize()
	}
}

#[inline]
pub fn shr(shift: U256, value: U256) -> U256 {
	if value == U256::zero() || shift >= U256::from(256) {
		U256::zero()
	} else {
		value >> shift.as_usize()
	}
}

#[inline]
pub fn sar(shift: U256, value: U256) -> U256 {
	let value = I256::from(value);
	if !value.is_negative() {
		return shr(shift, value.into());
	}
	if shift >= U256::from(256) {
		return U256::MAX;
	}

	// rounds towards negative infinity
	let shifted = (value.magnitude() - U256::one()) >> shift.as_usize();
	I256::negative(shifted + U256::one()).into()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn byte_counts_from_most_significant() {
		let value = U256::from_big_endian(&[0xab; 1]) << 248;
		assert_eq!(byte(0.into(), value), U256::from(0xab));
		assert_eq!(byte(31.into(), U256::from(0x12)), U256::from(0x12));
		assert_eq!(byte(32.into(), U256::MAX), U256::zero());
	}

	#[test]
	fn signed_comparisons() {
		assert_eq!(slt(U256::MAX, U256::zero()), U256::one());
		assert_eq!(sgt(U256::MAX, U256::zero()), U256::zero());
		assert_eq!(sgt(U256::one(), U256::MAX), U256::one());
	}

	#[test]
	fn shifts_saturate_at_256() {
		assert_eq!(shl(256.into(), U256::one()), U256::zero());
		assert_eq!(shl(255.into(), U256::one()), U256::one() << 255);
		assert_eq!(shr(4.into(), 0xf0.into()), U256::from(0x0f));
		assert_eq!(sar(300.into(), U256::MAX), U256::MAX);
		assert_eq!(sar(4.into(), U256::MAX - U256::from(0xf)), U256::MAX);
		assert_eq!(sar(1.into(), U256::from(4)), U256::from(2));
	}
}
