//! Per-key, per-audience ID token reuse with early refresh and singleflight guards.
//!
//! [`CachingMinter`] wraps any [`IdTokenMinter`] and keeps the last token minted for each
//! `(key fingerprint, audience)` pair. A cached token is handed out while more than the
//! preemptive window of lifetime remains; once it falls inside the window (or has expired) the
//! next caller mints a replacement. Concurrent callers for the same pair queue behind one
//! guard so only a single exchange is in flight at a time.
//!
//! Expired tokens are pruned whenever a new token is stored, and a guard is released as soon as
//! its last caller leaves, so neither map outgrows the set of live audiences.

// self
use crate::{
	_prelude::*,
	auth::{Audience, IdToken, ServiceAccountKey},
	oidc::{IdTokenMinter, MintFuture},
};

/// Identity of a cached token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
	/// [`ServiceAccountKey::fingerprint`] of the signing key.
	pub fingerprint: String,
	/// Audience the token is bound to.
	pub audience: Audience,
}
impl CacheKey {
	/// Builds the cache identity for a key + audience pair.
	pub fn new(key: &ServiceAccountKey, audience: &Audience) -> Self {
		Self { fingerprint: key.fingerprint(), audience: audience.clone() }
	}
}

/// Caching decorator around an [`IdTokenMinter`].
pub struct CachingMinter<M>
where
	M: IdTokenMinter,
{
	inner: M,
	preemptive_window: Duration,
	tokens: RwLock<HashMap<CacheKey, IdToken>>,
	guards: Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>,
}
impl<M> CachingMinter<M>
where
	M: IdTokenMinter,
{
	/// Default remaining-lifetime threshold below which a cached token is replaced.
	pub const DEFAULT_PREEMPTIVE_WINDOW: Duration = Duration::seconds(60);

	/// Wraps `inner` with the default preemptive window.
	pub fn new(inner: M) -> Self {
		Self {
			inner,
			preemptive_window: Self::DEFAULT_PREEMPTIVE_WINDOW,
			tokens: Default::default(),
			guards: Default::default(),
		}
	}

	/// Overrides the preemptive window; negative values clamp to zero.
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Returns the configured preemptive window.
	pub fn preemptive_window(&self) -> Duration {
		self.preemptive_window
	}

	/// Returns the cached token for a key + audience pair, fresh or not.
	pub fn cached(&self, key: &ServiceAccountKey, audience: &Audience) -> Option<IdToken> {
		self.tokens.read().get(&CacheKey::new(key, audience)).cloned()
	}

	/// Drops the cached token for a key + audience pair.
	pub fn invalidate(&self, key: &ServiceAccountKey, audience: &Audience) -> Option<IdToken> {
		self.tokens.write().remove(&CacheKey::new(key, audience))
	}

	/// Drops every cached token.
	pub fn clear(&self) {
		self.tokens.write().clear();
	}

	/// Determines whether a cached token must be replaced at `now`.
	pub fn should_refresh(&self, token: &IdToken, now: OffsetDateTime) -> bool {
		token.expires_within(self.preemptive_window, now)
	}

	async fn mint_cached(&self, key: &ServiceAccountKey, audience: &Audience) -> Result<IdToken> {
		let cache_key = CacheKey::new(key, audience);
		let lease = self.lease(&cache_key);
		let _singleflight = lease.lock.lock().await;
		let now = OffsetDateTime::now_utc();
		let current = self.tokens.read().get(&cache_key).cloned();

		if let Some(token) = current.filter(|token| !self.should_refresh(token, now)) {
			return Ok(token);
		}

		let token = self.inner.mint(key, audience).await?;
		let now = OffsetDateTime::now_utc();
		let mut tokens = self.tokens.write();

		tokens.retain(|_, cached| !cached.is_expired_at(now));
		tokens.insert(cache_key, token.clone());

		Ok(token)
	}

	fn lease(&self, cache_key: &CacheKey) -> GuardLease<'_> {
		let mut guards = self.guards.lock();
		let lock = guards
			.entry(cache_key.clone())
			.or_insert_with(|| Arc::new(AsyncMutex::new(())))
			.clone();

		GuardLease { guards: &self.guards, key: cache_key.clone(), lock }
	}
}
/// Shared handle on a singleflight guard; the map entry goes away with its last holder.
struct GuardLease<'a> {
	guards: &'a Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>,
	key: CacheKey,
	lock: Arc<AsyncMutex<()>>,
}
impl Drop for GuardLease<'_> {
	fn drop(&mut self) {
		let mut guards = self.guards.lock();
		let owned = guards.get(&self.key).is_some_and(|current| Arc::ptr_eq(current, &self.lock));

		// One reference lives in the map and one here; anything more is a queued caller.
		if owned && Arc::strong_count(&self.lock) == 2 {
			guards.remove(&self.key);
		}
	}
}

impl<M> IdTokenMinter for CachingMinter<M>
where
	M: IdTokenMinter,
{
	fn mint<'a>(&'a self, key: &'a ServiceAccountKey, audience: &'a Audience) -> MintFuture<'a> {
		Box::pin(self.mint_cached(key, audience))
	}
}
impl<M> Debug for CachingMinter<M>
where
	M: IdTokenMinter,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachingMinter")
			.field("preemptive_window", &self.preemptive_window)
			.field("cached_tokens", &self.tokens.read().len())
			.finish()
	}
}
