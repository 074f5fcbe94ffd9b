use primitive_types::U256;

/// Index of the highest set bit. `value` must be nonzero.
pub fn log2floor(value: U256) -> u64 {
	debug_assert!(!value.is_zero());
	value.bits().saturating_sub(1) as u64
}

/// All but one 64th of `gas`, the most a nested frame may receive.
pub fn l64(gas: u64) -> u64 {
	gas - gas / 64
}
