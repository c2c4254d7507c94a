//! Token exchanges run ahead of data calls.

// self
use crate::{
	_prelude::*,
	auth::{TokenExchange, TokenResponse},
	error::ApiError,
	handler::RequestHandler,
	http::{HttpClient, HttpMethod, HttpRequest},
	obs::{self, CallKind, CallOutcome, CallSpan},
};

impl<C> RequestHandler<C>
where
	C: ?Sized + HttpClient,
{
	/// Runs the exchange the token state calls for, if any, and applies its result.
	///
	/// A completed request-token exchange always ends in [`Error::AuthorizationRequired`].
	pub(super) async fn ensure_token(&self, path: &str) -> Result<()> {
		let policy = self.config.policy();
		let exchange = self.state.lock().plan(OffsetDateTime::now_utc(), &policy);

		obs::record_refresh_decision(path, exchange);

		let Some(exchange) = exchange else {
			return Ok(());
		};
		let response = self.fetch_token(exchange).await?;

		match exchange {
			TokenExchange::RequestToken => {
				let token = response.token.clone();

				self.state.lock().apply_request_token(response);

				let authorization_url = self.config.credentials.authorization_url(&token)?;

				Err(Error::AuthorizationRequired { token, authorization_url })
			},
			TokenExchange::AccessToken | TokenExchange::Renewal => {
				self.state.lock().apply_access_token(response, OffsetDateTime::now_utc(), &policy);

				Ok(())
			},
		}
	}

	/// Performs one signed `GET` against the OAuth endpoint and parses the form-encoded reply.
	///
	/// The token state is only read here; callers apply the parsed response.
	async fn fetch_token(&self, exchange: TokenExchange) -> Result<TokenResponse> {
		let kind = CallKind::from(exchange);
		let span = CallSpan::new(kind, "fetch_token");

		obs::record_call_outcome(kind, CallOutcome::Attempt);
		self.metrics.record_token_fetch();

		let result: Result<TokenResponse> = span
			.instrument(async move {
				let credentials = self.state.lock().exchange_credentials(exchange);
				let url = self.config.credentials.oauth_url(exchange.path())?;
				let oauth = self
					.oauth_parameters()
					.token(&credentials.token)
					.verifier(&credentials.verifier)
					.session_handle(&credentials.session_handle);
				let authorization = self.authorization_header(
					HttpMethod::Get,
					&url,
					&oauth,
					None,
					credentials.token_secret.expose(),
				)?;
				let request = HttpRequest {
					method: HttpMethod::Get,
					url,
					headers: vec![("Authorization", authorization)],
					body: None,
					timeout: self.config.timeout,
				};
				let response =
					self.http_client.execute(request).await.map_err(ApiError::transport)?;

				if !response.is_success() {
					return Err(ApiError::from_response(response.status, &response.body).into());
				}

				Ok(TokenResponse::parse(response.status, &response.body)?)
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(kind, CallOutcome::Success),
			Err(_) => {
				self.metrics.record_failure();
				obs::record_call_outcome(kind, CallOutcome::Failure);
			},
		}

		result
	}
}
