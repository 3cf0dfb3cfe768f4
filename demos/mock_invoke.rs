//! Demonstrates invoking a protected endpoint through a long-lived invoker, with a local mock
//! server standing in for both the token endpoint and the target service.

// std
use std::io::Write;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use tempfile::NamedTempFile;
use time::{Duration, OffsetDateTime};
// self
use oidc_invoker::{CancellationToken, Invoker, InvokerConfig, _preludet::fake_id_token};

const KEY: &str = include_str!("../tests/fixtures/service_account.json");

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let target = server.url("/hello");
	let now = OffsetDateTime::now_utc();
	let id_token = fake_id_token(&target, now, now + Duration::hours(1));
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(serde_json::json!({ "id_token": id_token }).to_string());
		})
		.await;
	let target_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/hello").header("authorization", format!("Bearer {id_token}"));
			then.status(200).body("Hello from a protected service.");
		})
		.await;
	let mut key: serde_json::Value = serde_json::from_str(KEY)?;

	key["token_uri"] = server.url("/token").into();

	let mut credentials = NamedTempFile::new()?;

	credentials.write_all(key.to_string().as_bytes())?;

	let invoker = Invoker::new(InvokerConfig::default());
	let cancellation = CancellationToken::new();

	for attempt in 1..=2 {
		let response = invoker.invoke(credentials.path(), &target, Some(&cancellation)).await?;
		let status = response.status();

		println!("Attempt {attempt}: {status} {}", response.text().await?);
	}

	// The second attempt reuses the cached ID token.
	token_mock.assert_calls_async(1).await;
	target_mock.assert_calls_async(2).await;

	Ok(())
}
