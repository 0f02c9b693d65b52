// self
use crate::{
	_prelude::*,
	client::{self, ExchangeClient, PreparedRequest, Verb},
	error::{ApiError, TransportError},
	http::{ExchangeHttpClient, HttpRequest, HttpResponse},
	obs::{self, Operation, OperationOutcome, OperationSpan},
};

const ERROR_FIELD: &str = "error";

impl<C> ExchangeClient<C>
where
	C: ?Sized + ExchangeHttpClient,
{
	/// Sends one REST call once the rate budget exceeds `floor`.
	///
	/// The first call on a fresh client waits for [`ExchangeClient::bootstrap`], which samples
	/// the server clock and starts refilling the budget; concurrent first calls share it. The
	/// limiter is charged before the call and reconciled from the response headers
	/// whatever the status. A JSON body carrying a non-null `error` field fails with
	/// [`Error::Api`]; network failures and non-JSON bodies fail with [`Error::Transport`].
	/// Any other body is returned unchanged.
	pub async fn make_request<P>(
		&self,
		verb: Verb,
		endpoint: &str,
		payload: P,
		floor: f64,
	) -> Result<JsonValue>
	where
		P: Serialize,
	{
		let span = OperationSpan::new(Operation::Request, "make_request");

		obs::record_operation_outcome(Operation::Request, OperationOutcome::Attempt);

		let result = span
			.instrument(async {
				if self.server_clock().is_none() {
					self.bootstrap().await?;
				}

				self.send(verb, endpoint, &payload, floor).await
			})
			.await;

		obs::record_operation_outcome(Operation::Request, OperationOutcome::from(&result));

		result
	}

	/// [`ExchangeClient::make_request`] with the configured default floor.
	pub async fn request<P>(&self, verb: Verb, endpoint: &str, payload: P) -> Result<JsonValue>
	where
		P: Serialize,
	{
		self.make_request(verb, endpoint, payload, self.config.default_floor).await
	}

	pub(crate) async fn send<P>(
		&self,
		verb: Verb,
		endpoint: &str,
		payload: &P,
		floor: f64,
	) -> Result<JsonValue>
	where
		P: ?Sized + Serialize,
	{
		let prepared = PreparedRequest::new(verb, endpoint, payload)?;
		let url = prepared.url(&self.config)?;

		self.limiter.acquire(floor).await?;

		let request = HttpRequest {
			verb,
			headers: self.headers_for(&prepared, client::signed_path(&url)),
			url,
			body: prepared.wire_body().map(ToOwned::to_owned),
		};
		let response =
			self.http_client.execute(request).await.map_err(TransportError::network)?;

		self.limiter.reconcile(&response);

		let body = response.json()?;

		match api_error(&body, &response, prepared) {
			Some(err) => Err(err.into()),
			None => Ok(body),
		}
	}

	fn headers_for(&self, prepared: &PreparedRequest, path: &str) -> Vec<(String, String)> {
		let mut headers = vec![
			("content-type".to_owned(), "application/json".to_owned()),
			("accept".to_owned(), "application/json".to_owned()),
		];

		if let Some(signer) = &self.signer {
			// Expiry is computed after the budget wait.
			let expires = (self.clock.now() + self.config.signature_ttl).unix_timestamp();
			let signed = signer.signed_headers(prepared.verb, path, expires, &prepared.body);

			headers.extend(signed.into_pairs().map(|(name, value)| (name.to_owned(), value)));
		}

		headers
	}
}

fn api_error(
	body: &JsonValue,
	response: &HttpResponse,
	prepared: PreparedRequest,
) -> Option<ApiError> {
	let error = body.get(ERROR_FIELD).filter(|error| !error.is_null())?;
	let message = match error {
		JsonValue::String(message) => message.clone(),
		JsonValue::Object(fields) => fields
			.get("message")
			.and_then(JsonValue::as_str)
			.map_or_else(|| error.to_string(), ToOwned::to_owned),
		other => other.to_string(),
	};
	let name = error.get("name").and_then(JsonValue::as_str).map(ToOwned::to_owned);

	Some(ApiError {
		message,
		name,
		status: response.status,
		verb: prepared.verb,
		endpoint: prepared.endpoint,
		payload: prepared.payload,
	})
}
