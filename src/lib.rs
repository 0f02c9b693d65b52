//! Client-side exchange broker: rate-budgeted, HMAC-signed REST calls and deduplicated
//! incremental stream dispatch.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod limit;
pub mod obs;
pub mod stream;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
#[doc(hidden)]
pub mod _preludet {
	//! Re-exports and client fixtures for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::ApiCredentials,
		client::{ExchangeClient, ReqwestExchangeClient},
		config::ClientConfig,
		http::ReqwestHttpClient,
	};

	/// Key identifier shared by signed integration tests.
	pub const TEST_API_KEY: &str = "test-key";
	/// Secret shared by signed integration tests.
	pub const TEST_API_SECRET: &str = "test-secret";

	/// Builds a configuration that targets a mock server base URL.
	pub fn test_config(base_url: &str) -> ClientConfig {
		ClientConfig::builder()
			.base_url(Url::parse(base_url).expect("Mock server URL should parse."))
			.build()
			.expect("Test configuration should validate.")
	}

	/// Constructs an unsigned reqwest-backed client pointed at `base_url`.
	pub fn build_reqwest_test_client(base_url: &str) -> ReqwestExchangeClient {
		ExchangeClient::with_http_client(test_config(base_url), ReqwestHttpClient::default())
	}

	/// Constructs a signed reqwest-backed client pointed at `base_url`.
	pub fn build_signed_test_client(base_url: &str) -> ReqwestExchangeClient {
		build_reqwest_test_client(base_url)
			.with_credentials(ApiCredentials::new(TEST_API_KEY, TEST_API_SECRET))
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	pub use async_lock::OnceCell;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
