//! Differential runs: the same scenario is handed to several interpreters
//! and everything they leave behind is compared against the first one.

use primitive_types::{H160, U256};
use rayon::prelude::*;

use crate::backend::{Log, WorldState};
use crate::{BlockParameters, ExecutionState, Interpreter, Processor, StepError};

/// Starting point of a differential run.
#[derive(Clone, Debug)]
pub struct Scenario {
	pub state: ExecutionState,
	pub world: WorldState,
	pub block: BlockParameters,
	/// Observed through `ORIGIN`, and warm from the start.
	pub origin: H160,
	pub gas_price: U256,
}

impl Scenario {
	/// Scenario in an empty world with default block parameters.
	pub fn new(state: ExecutionState) -> Self {
		Self {
			state,
			world: WorldState::new(),
			block: BlockParameters::default(),
			origin: H160::default(),
			gas_price: U256::zero(),
		}
	}

	pub fn with_world(mut self, world: WorldState) -> Self {
		self.world = world;
		self
	}

	pub fn with_block(mut self, block: BlockParameters) -> Self {
		self.block = block;
		self
	}

	fn processor<'i>(&self, interpreter: &'i dyn Interpreter) -> Processor<'i> {
		let mut processor = Processor::new(
			interpreter,
			self.world.clone(),
			self.block.clone(),
			self.state.revision,
		)
		.with_environment(self.origin, self.gas_price);
		processor.warm_up(&[self.origin, self.state.context.recipient]);
		processor
	}
}

/// What one interpreter left behind.
#[derive(Clone, Debug)]
pub struct Outcome {
	pub interpreter: String,
	pub state: ExecutionState,
	pub world: WorldState,
	pub logs: Vec<Log>,
}

impl Outcome {
	/// Differences against `other`, empty when the two agree.
	pub fn diff(&self, other: &Outcome) -> Vec<String> {
		let mut out = self.state.diff(&other.state);
		out.extend(self.world.diff(&other.world));
		if self.logs != other.logs {
			out.push(format!(
				"Different logs: {} vs {} entries",
				self.logs.len(),
				other.logs.len()
			));
		}
		out
	}
}

/// An interpreter that disagreed with the reference.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Divergence {
	pub interpreter: String,
	pub differences: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Report {
	/// Name of the interpreter everything was compared against.
	pub reference: String,
	pub outcomes: Vec<Outcome>,
	pub divergences: Vec<Divergence>,
	/// Index of the first instruction after which the interpreters
	/// disagreed. Only set by [`run_lockstep`].
	pub diverged_at: Option<usize>,
}

impl Report {
	pub fn is_consistent(&self) -> bool {
		self.divergences.is_empty()
	}

	fn compare(outcomes: Vec<Outcome>, diverged_at: Option<usize>) -> Self {
		let reference = &outcomes[0];
		let divergences = outcomes[1..]
			.iter()
			.filter_map(|outcome| {
				let differences = reference.diff(outcome);
				if differences.is_empty() {
					None
				} else {
					Some(Divergence {
						interpreter: outcome.interpreter.clone(),
						differences,
					})
				}
			})
			.collect();
		Self {
			reference: reference.interpreter.clone(),
			outcomes,
			divergences,
			diverged_at,
		}
	}
}

/// Runs a single interpreter for up to `steps` instructions.
pub fn execute(
	interpreter: &dyn Interpreter,
	scenario: &Scenario,
	steps: usize,
) -> Result<Outcome, StepError> {
	let mut processor = scenario.processor(interpreter);
	let state = processor.step(scenario.state.clone(), steps)?;
	let logs = processor.commit();
	Ok(Outcome {
		interpreter: interpreter.name().to_owned(),
		state,
		world: processor.into_world(),
		logs,
	})
}

/// Runs every interpreter on its own copy of `scenario`, in parallel, and
/// compares all outcomes against the first interpreter's.
pub fn run(
	interpreters: &[&dyn Interpreter],
	scenario: &Scenario,
	steps: usize,
) -> Result<Report, StepError> {
	if interpreters.is_empty() {
		return Err(StepError::Internal("no interpreter to run".into()));
	}

	let outcomes = interpreters
		.par_iter()
		.map(|interpreter| execute(*interpreter, scenario, steps))
		.collect::<Result<Vec<_>, _>>()?;
	let report = Report::compare(outcomes, None);
	if !report.is_consistent() {
		log::debug!(
			target: "ctvm",
			"{} interpreter(s) diverged from {} after {} steps",
			report.divergences.len(),
			report.reference,
			steps
		);
	}
	Ok(report)
}

/// Steps every interpreter one instruction at a time and stops at the first
/// instruction after which their states differ, or once all of them halted
/// or ran `max_steps` instructions.
pub fn run_lockstep(
	interpreters: &[&dyn Interpreter],
	scenario: &Scenario,
	max_steps: usize,
) -> Result<Report, StepError> {
	if interpreters.is_empty() {
		return Err(StepError::Internal("no interpreter to run".into()));
	}

	let mut processors = interpreters
		.iter()
		.map(|interpreter| scenario.processor(*interpreter))
		.collect::<Vec<_>>();
	let mut states = vec![scenario.state.clone(); interpreters.len()];
	let mut diverged_at = None;

	for index in 0..max_steps {
		if states.iter().all(ExecutionState::is_terminal) {
			break;
		}
		for (processor, state) in processors.iter_mut().zip(states.iter_mut()) {
			*state = processor.step(state.clone(), 1)?;
		}
		if states[1..].iter().any(|state| *state != states[0]) {
			log::debug!(target: "ctvm", "interpreters diverged at step {}", index);
			diverged_at = Some(index);
			break;
		}
	}

	let outcomes = processors
		.into_iter()
		.zip(states)
		.zip(interpreters)
		.map(|((mut processor, state), interpreter)| {
			let logs = processor.commit();
			Outcome {
				interpreter: interpreter.name().to_owned(),
				state,
				world: processor.into_world(),
				logs,
			}
		})
		.collect();
	Ok(Report::compare(outcomes, diverged_at))
}

/// Runs `interpreter` and lists how its final state differs from
/// `expected`.
pub fn check_against(
	interpreter: &dyn Interpreter,
	scenario: &Scenario,
	steps: usize,
	expected: &ExecutionState,
) -> Result<Vec<String>, StepError> {
	let outcome = execute(interpreter, scenario, steps)?;
	Ok(outcome.state.diff(expected))
}
