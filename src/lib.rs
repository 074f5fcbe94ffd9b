//! EVM interpreter with a differential conformance harness.
//!
//! Two engines implement [`Interpreter`]: the production stack
//! (table-dispatch machine, system-opcode runtime and gasometer) behind
//! [`ConformanceAdapter`], and the match-dispatch [`DirectInterpreter`].
//! Both consume and produce the same [`ExecutionState`], talk to the world
//! through the [`Handler`] implemented by [`Processor`], and are compared
//! by the [`harness`].

#![forbid(unsafe_code)]
#![deny(unused_variables)]

pub use ctvm_gasometer as gasometer;
pub use ctvm_runtime::*;

mod adapter;
pub mod backend;
mod direct;
pub mod executor;
pub mod harness;
mod interpreter;
mod state;
mod transaction;

pub use crate::adapter::ConformanceAdapter;
pub use crate::backend::{Account, Log, WorldState};
pub use crate::direct::DirectInterpreter;
pub use crate::executor::{Processor, Substate};
pub use crate::harness::{Divergence, Report, Scenario};
pub use crate::interpreter::{Interpreter, StepError};
pub use crate::state::{CallContext, ExecutionState, Status};
pub use crate::transaction::{BlockParameters, Transaction, TransactionResult};
