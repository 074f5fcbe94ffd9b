/// Unwraps a result, turning the error into a frame exit.
macro_rules! exit_on_err {
	( $e:expr ) => {
		match $e {
			Ok(v) => v,
			Err(e) => return Control::Exit(e.into()),
		}
	};
}

/// Pops operands in order, either as integers or as raw words.
macro_rules! pop {
	( $runtime:expr, u256: $( $x:ident ),* ) => (
		$( let $x = exit_on_err!($runtime.machine.stack_mut().pop()); )*
	);
	( $runtime:expr, h256: $( $x:ident ),* ) => (
		$( let $x = exit_on_err!($runtime.machine.stack_mut().pop_h256()); )*
	);
}

macro_rules! push {
	( $runtime:expr, u256: $x:expr ) => (
		exit_on_err!($runtime.machine.stack_mut().push($x))
	);
	( $runtime:expr, h256: $x:expr ) => (
		exit_on_err!($runtime.machine.stack_mut().push_h256($x))
	);
}
