use crate::CreateScheme;
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

/// Address of a contract created by `caller` whose nonce is `nonce`.
pub fn create_address(caller: H160, nonce: U256) -> H160 {
	let mut stream = rlp::RlpStream::new_list(2);
	stream.append(&caller);
	stream.append(&nonce);
	H256::from_slice(Keccak256::digest(&stream.out()).as_slice()).into()
}

/// Address of a contract created through `CREATE2`.
pub fn create2_address(caller: H160, salt: H256, code_hash: H256) -> H160 {
	let mut hasher = Keccak256::new();
	hasher.update([0xff]);
	hasher.update(&caller[..]);
	hasher.update(&salt[..]);
	hasher.update(&code_hash[..]);
	H256::from_slice(hasher.finalize().as_slice()).into()
}

/// Target address of `scheme`, `nonce` being the caller's current nonce.
pub fn scheme_address(scheme: &CreateScheme, nonce: U256) -> H160 {
	match *scheme {
		CreateScheme::Legacy { caller } => create_address(caller, nonce),
		CreateScheme::Create2 {
			caller,
			code_hash,
			salt,
		} => create2_address(caller, salt, code_hash),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use core::str::FromStr;

	#[test]
	fn legacy_address_depends_on_nonce() {
		let caller = H160::from_str("6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0").unwrap();
		assert_eq!(
			create_address(caller, U256::zero()),
			H160::from_str("cd234a471b72ba2f1ccf0a70fcaba648a5eecd8d").unwrap()
		);
		assert_eq!(
			create_address(caller, U256::one()),
			H160::from_str("343c43a37d37dff08ae8c4a11544c718abb4fcf8").unwrap()
		);
	}

	#[test]
	fn create2_known_vectors() {
		let code_hash = H256::from_slice(Keccak256::digest([0x00u8]).as_slice());
		assert_eq!(
			create2_address(H160::zero(), H256::zero(), code_hash),
			H160::from_str("4d1a2e2bb4f88f0250f26ffff098b0b30b26bf38").unwrap()
		);
		let caller = H160::from_str("deadbeef00000000000000000000000000000000").unwrap();
		assert_eq!(
			create2_address(caller, H256::zero(), code_hash),
			H160::from_str("b928f69bb1d91cd65274e3c79d8986362984fda3").unwrap()
		);
	}
}
