//! Signed data calls against the API endpoint.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	error::ApiError,
	handler::RequestHandler,
	http::{HttpClient, HttpMethod, HttpRequest},
	obs::{self, CallKind, CallOutcome, CallSpan},
	signer::ParameterSet,
};

/// Successful data call response awaiting decoding.
#[derive(Debug)]
pub(super) struct DataResponse {
	status: u16,
	body: Vec<u8>,
}
impl DataResponse {
	fn is_blank(&self) -> bool {
		self.body.iter().all(u8::is_ascii_whitespace)
	}
}

impl<C> RequestHandler<C>
where
	C: ?Sized + HttpClient,
{
	/// Signs the call with the current token and sends it.
	///
	/// Query parameters embedded in `path` are always signed. For `GET`, `params` join them in
	/// the query string; other verbs serialize `params` as a JSON body that stays outside the
	/// signature. Caller entries named `oauth_*` are dropped from the query.
	pub(super) async fn send_data_call(
		&self,
		method: HttpMethod,
		path: &str,
		params: &ParameterSet,
	) -> Result<DataResponse> {
		const KIND: CallKind = CallKind::Data;

		let span = CallSpan::new(KIND, "send_data_call");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		self.metrics.record_data_call();

		let result: Result<DataResponse> = span
			.instrument(async move {
				let (token, token_secret) = {
					let state = self.state.lock();

					(state.token().to_owned(), state.token_secret().clone())
				};
				let mut url = self.config.credentials.api_url(path)?;
				let mut query = url
					.query_pairs()
					.map(|(name, value)| (name.into_owned(), value.into_owned()))
					.collect::<ParameterSet>();

				url.set_query(None);

				let body = match method {
					HttpMethod::Get => {
						query.merge(params);

						None
					},
					HttpMethod::Post | HttpMethod::Put | HttpMethod::Delete => Some(
						serde_json::to_vec(params)
							.map_err(|e| ApiError::new(None, format!("Request body encoding failed: {e}.")))?,
					),
				};

				// `oauth_*` names belong to the Authorization header.
				query.retain(|name, _| !name.starts_with("oauth_"));

				let oauth = self.oauth_parameters().token(&token);
				let signed = (!query.is_empty()).then_some(&query);
				let authorization =
					self.authorization_header(method, &url, &oauth, signed, token_secret.expose())?;

				if !query.is_empty() {
					url.set_query(Some(&query.normalized()));
				}

				let mut headers =
					vec![("Authorization", authorization), ("Accept", "application/json".to_owned())];

				if body.is_some() {
					headers.push(("Content-Type", "application/json".to_owned()));
				}

				let request =
					HttpRequest { method, url, headers, body, timeout: self.config.timeout };
				let response =
					self.http_client.execute(request).await.map_err(ApiError::transport)?;

				if !response.is_success() {
					return Err(ApiError::from_response(response.status, &response.body).into());
				}

				Ok(DataResponse { status: response.status, body: response.body })
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => {
				self.metrics.record_failure();
				obs::record_call_outcome(KIND, CallOutcome::Failure);
			},
		}

		result
	}
}

pub(super) fn decode_value(response: &DataResponse) -> Result<Value> {
	if response.is_blank() {
		return Ok(Value::Null);
	}

	serde_json::from_slice(&response.body)
		.map_err(|e| ApiError::malformed(response.status, "JSON response", e).into())
}

pub(super) fn decode_typed<T>(response: &DataResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	let body = if response.is_blank() { b"null".as_slice() } else { response.body.as_slice() };
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|e| ApiError::malformed(response.status, "JSON response", e).into())
}
