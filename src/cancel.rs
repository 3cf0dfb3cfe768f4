//! Cooperative cancellation for the invocation pipeline.

// self
use crate::_prelude::*;

/// Runs `fut` unless `cancellation` fires first.
///
/// An already-cancelled token short-circuits before `fut` is polled, so no I/O starts. Otherwise
/// the future is raced against the token and dropped (aborting any in-flight request) when
/// cancellation wins.
pub async fn run_until_cancelled<F>(
	cancellation: Option<&CancellationToken>,
	fut: F,
) -> Result<F::Output>
where
	F: Future,
{
	let Some(token) = cancellation else {
		return Ok(fut.await);
	};

	ensure_not_cancelled(Some(token))?;

	tokio::select! {
		biased;
		_ = token.cancelled() => Err(Error::Cancelled),
		output = fut => Ok(output),
	}
}

/// Fails with [`Error::Cancelled`] when the token has already fired.
pub fn ensure_not_cancelled(cancellation: Option<&CancellationToken>) -> Result<()> {
	match cancellation {
		Some(token) if token.is_cancelled() => Err(Error::Cancelled),
		_ => Ok(()),
	}
}
