use crate::{ExecutionState, ExitFatal, Handler};

/// Out-of-band failure of an interpreter. Unlike a `Failed` state, which is
/// an ordinary EVM outcome, these mean the engine could not produce an
/// answer at all and the comparison must stop.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum StepError {
	/// The input state cannot be represented by the engine.
	#[error("unsupported state: {0}")]
	UnsupportedState(String),
	/// The engine halted with a fatal exit.
	#[error("fatal exit: {0:?}")]
	Fatal(ExitFatal),
	/// Anything else that went wrong inside the engine.
	#[error("internal error: {0}")]
	Internal(String),
}

impl From<ExitFatal> for StepError {
	fn from(fatal: ExitFatal) -> Self {
		Self::Fatal(fatal)
	}
}

/// Single-step contract every engine implements.
pub trait Interpreter: Send + Sync {
	/// Short name used in reports.
	fn name(&self) -> &str;

	/// Run up to `steps` instructions of `state`, stopping early once it
	/// halts. A halted state, or zero steps, comes back unchanged.
	fn step_n(
		&self,
		state: ExecutionState,
		handler: &mut dyn Handler,
		steps: usize,
	) -> Result<ExecutionState, StepError>;
}
