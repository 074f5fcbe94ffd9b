use crate::utils::I256;
use core::ops::Rem;
use primitive_types::{U256, U512};

/// Lower 256 bits; exact for remainders of a 256-bit modulus.
#[inline]
fn low_u256(value: U512) -> U256 {
	U256([value.0[0], value.0[1], value.0[2], value.0[3]])
}

#[inline]
pub fn div(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		U256::zero()
	} else {
		op1 / op2
	}
}

#[inline]
pub fn sdiv(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();
	let ret = op1 / op2;
	ret.into()
}

#[inline]
pub fn rem(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		U256::zero()
	} else {
		op1.rem(op2)
	}
}

#[inline]
pub fn srem(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		U256::zero()
	} else {
		let op1: I256 = op1.into();
		let op2: I256 = op2.into();
		let ret = op1.rem(op2);
		ret.into()
	}
}

#[inline]
pub fn addmod(op1: U256, op2: U256, op3: U256) -> U256 {
	let op1: U512 = op1.into();
	let op2: U512 = op2.into();
	let op3: U512 = op3.into();

	if op3 == U512::zero() {
		U256::zero()
	} else {
		let v = (op1 + op2) % op3;
		low_u256(v)
	}
}

#[inline]
pub fn mulmod(op1: U256, op2: U256, op3: U256) -> U256 {
	let op1: U512 = op1.into();
	let op2: U512 = op2.into();
	let op3: U512 = op3.into();

	if op3 == U512::zero() {
		U256::zero()
	} else {
		let v = (op1 * op2) % op3;
		low_u256(v)
	}
}

#[inline]
pub fn exp(op1: U256, op2: U256) -> U256 {
	let mut op1 = op1;
	let mut op2 = op2;
	let mut r: U256 = 1.into();

	while op2 != 0.into() {
		if op2 & 1.into() != 0.into() {
			r = r.overflowing_mul(op1).0;
		}
		op2 >>= 1;
		op1 = op1.overflowing_mul(op1).0;
	}

	r
}

/// Sign-extend `op2` from byte `op1` (counted from the least significant).
#[inline]
pub fn signextend(op1: U256, op2: U256) -> U256 {
	if op1 < U256::from(32) {
		// `low_u32` is safe here: op1 < 32.
		let bit_index = (8 * op1.low_u32() + 7) as usize;
		let bit = op2.bit(bit_index);
		let mask = (U256::one() << bit_index) - U256::one();
		if bit {
			op2 | !mask
		} else {
			op2 & mask
		}
	} else {
		op2
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn division_by_zero_is_zero() {
		assert_eq!(div(U256::from(7), U256::zero()), U256::zero());
		assert_eq!(sdiv(U256::from(7), U256::zero()), U256::zero());
		assert_eq!(rem(U256::from(7), U256::zero()), U256::zero());
		assert_eq!(srem(U256::from(7), U256::zero()), U256::zero());
		assert_eq!(addmod(1.into(), 2.into(), U256::zero()), U256::zero());
		assert_eq!(mulmod(1.into(), 2.into(), U256::zero()), U256::zero());
	}

	#[test]
	fn modular_ops_use_wide_intermediates() {
		assert_eq!(addmod(U256::MAX, U256::from(2), U256::from(10)), U256::from(7));
		assert_eq!(mulmod(U256::MAX, U256::MAX, U256::from(12)), U256::from(9));
	}

	#[test]
	fn exp_wraps() {
		assert_eq!(exp(2.into(), 255.into()), U256::one() << 255);
		assert_eq!(exp(2.into(), 256.into()), U256::zero());
		assert_eq!(exp(0.into(), 0.into()), U256::one());
	}

	#[test]
	fn signextend_extends_negative_bytes() {
		assert_eq!(signextend(0.into(), 0xff.into()), U256::MAX);
		assert_eq!(signextend(0.into(), 0x7f.into()), U256::from(0x7f));
		assert_eq!(signextend(1.into(), 0x80ff.into()), U256::MAX - U256::from(0x7f00));
		assert_eq!(signextend(31.into(), 0x80.into()), U256::from(0x80));
		assert_eq!(signextend(40.into(), 0xff.into()), U256::from(0xff));
	}
}
