//! Invoke IAP and Cloud Run protected endpoints with Google-signed OIDC identity tokens.
//!
//! The crate loads a service-account key, mints (or reuses) an ID token bound to the exact target
//! URI, and issues a bearer-authenticated GET. Each stage is cancellable and surfaces its own error
//! kind so callers can tell a bad key file from a rejected audience or a broken network.
//!
//! ```no_run
//! # async fn demo() -> oidc_invoker::error::Result<()> {
//! let response =
//! 	oidc_invoker::invoke("/secrets/sa.json", "https://hello-abc123-uc.a.run.app", None).await?;
//!
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cancel;
pub mod error;
pub mod http;
pub mod invoker;
pub mod obs;
pub mod oidc;

pub use invoker::{Invoker, InvokerConfig, invoke, invoke_with_default_credentials};

#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests and demos.

	pub use crate::_prelude::*;

	// crates.io
	use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

	/// Builds an unsigned JWT-shaped ID token carrying the provided audience and lifetime.
	///
	/// The signature segment is a fixed placeholder; the crate never verifies it.
	pub fn fake_id_token(
		audience: &str,
		issued_at: OffsetDateTime,
		expires_at: OffsetDateTime,
	) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
		let claims = serde_json::json!({
			"aud": audience,
			"iss": "https://accounts.google.com",
			"iat": issued_at.unix_timestamp(),
			"exp": expires_at.unix_timestamp(),
		});
		let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

		format!("{header}.{payload}.c2lnbmF0dXJl")
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, Response as ReqwestResponse};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use tokio_util::sync::CancellationToken;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use tokio_util::sync::CancellationToken;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tempfile as _};
