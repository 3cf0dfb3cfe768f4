//! ID token issuance behind a narrow minting interface.
//!
//! [`IdTokenMinter`] is the only seam between the invoker and the identity provider. The
//! built-in [`ServiceAccountMinter`] performs the JWT-bearer exchange against the key's token
//! endpoint, and [`CachingMinter`] layers per-key, per-audience reuse with early refresh on top of
//! any minter.

pub mod assertion;
pub mod cache;
pub mod service_account;

pub use cache::CachingMinter;
pub use service_account::ServiceAccountMinter;

// self
use crate::{
	_prelude::*,
	auth::{Audience, IdToken, ServiceAccountKey},
};

/// Boxed future returned by [`IdTokenMinter::mint`].
pub type MintFuture<'a> = Pin<Box<dyn Future<Output = Result<IdToken>> + 'a + Send>>;

/// Produces ID tokens for a service account and audience.
pub trait IdTokenMinter
where
	Self: Send + Sync,
{
	/// Mints (or returns a still-valid) token whose audience is exactly `audience`.
	fn mint<'a>(&'a self, key: &'a ServiceAccountKey, audience: &'a Audience) -> MintFuture<'a>;
}
impl<T> IdTokenMinter for Arc<T>
where
	T: ?Sized + IdTokenMinter,
{
	fn mint<'a>(&'a self, key: &'a ServiceAccountKey, audience: &'a Audience) -> MintFuture<'a> {
		(**self).mint(key, audience)
	}
}
