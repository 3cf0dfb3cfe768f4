//! Optional observability helpers for invocation stages.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oidc_invoker.stage` with the `stage` field.
//! - Enable `metrics` to increment the `oidc_invoker_stage_total` counter for every
//!   attempt/success/failure/cancellation, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Pipeline stages observed by the invoker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Reading and validating the service-account key.
	LoadCredentials,
	/// Minting or reusing an ID token.
	MintToken,
	/// Sending the bearer-authenticated request.
	Dispatch,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::LoadCredentials => "load_credentials",
			Stage::MintToken => "mint_token",
			Stage::Dispatch => "dispatch",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Abandoned through cancellation.
	Cancelled,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
			StageOutcome::Cancelled => "cancelled",
		}
	}

	/// Classifies a stage result.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => StageOutcome::Success,
			Err(Error::Cancelled) => StageOutcome::Cancelled,
			Err(_) => StageOutcome::Failure,
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs one stage inside its span, recording attempt and outcome.
pub async fn observe<T, Fut>(stage: Stage, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = StageSpan::new(stage);

	record_stage_outcome(stage, StageOutcome::Attempt);

	let result = span.instrument(fut).await;

	record_stage_outcome(stage, StageOutcome::of(&result));

	result
}
