/// Fork ruleset an execution runs under. Ordered chronologically so that
/// `revision >= Revision::Berlin` reads as "Berlin rules are active".
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Revision {
	Istanbul,
	Berlin,
	London,
	Paris,
	Shanghai,
	Cancun,
}

impl Revision {
	/// All supported revisions, oldest first.
	pub const ALL: [Revision; 6] = [
		Revision::Istanbul,
		Revision::Berlin,
		Revision::London,
		Revision::Paris,
		Revision::Shanghai,
		Revision::Cancun,
	];

	/// Newest supported revision.
	pub const LATEST: Revision = Revision::Cancun;

	/// Stable numeric tag used by the canonical state encoding.
	pub const fn as_u8(&self) -> u8 {
		*self as u8
	}

	pub fn from_u8(value: u8) -> Option<Self> {
		Self::ALL.get(value as usize).copied()
	}

	pub const fn name(&self) -> &'static str {
		match self {
			Revision::Istanbul => "Istanbul",
			Revision::Berlin => "Berlin",
			Revision::London => "London",
			Revision::Paris => "Paris",
			Revision::Shanghai => "Shanghai",
			Revision::Cancun => "Cancun",
		}
	}
}

impl Default for Revision {
	fn default() -> Self {
		Self::LATEST
	}
}

impl core::fmt::Display for Revision {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.write_str(self.name())
	}
}

#[cfg(test)]
mod tests {
	use super::Revision;

	#[test]
	fn revisions_are_ordered() {
		assert!(Revision::Istanbul < Revision::Berlin);
		assert!(Revision::Shanghai < Revision::Cancun);
		for (i, revision) in Revision::ALL.iter().enumerate() {
			assert_eq!(revision.as_u8() as usize, i);
			assert_eq!(Revision::from_u8(i as u8), Some(*revision));
		}
		assert_eq!(Revision::from_u8(6), None);
	}
}
