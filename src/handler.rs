//! Request orchestration: refresh decisions, token exchanges, and signed data calls.
//!
//! A [`RequestHandler`] owns one application's configuration, signer, and token state. Every
//! [`RequestHandler::request`] runs "decide, fetch, apply, sign, send" under a per-handler
//! async guard, so concurrent callers sharing a handler observe the token exchanges one at a
//! time and never race on the state.

mod call;
mod metrics;
mod token;

pub use metrics::HandlerMetrics;

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{AuthData, TokenState},
	config::ApplicationConfig,
	error::ConfigError,
	http::{HttpClient, HttpMethod},
	signer::{OAuthParameters, ParameterSet, Signer},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Handler specialized for the crate's default reqwest transport.
pub type ReqwestRequestHandler = RequestHandler<ReqwestHttpClient>;

/// Signs and sends API calls for one application, exchanging tokens as needed.
pub struct RequestHandler<C>
where
	C: ?Sized + HttpClient,
{
	/// HTTP client wrapper used for every outbound request.
	pub http_client: Arc<C>,
	/// Shared counters for token exchanges and data calls.
	pub metrics: Arc<HandlerMetrics>,
	config: ApplicationConfig,
	signer: Signer,
	state: Mutex<TokenState>,
	call_guard: AsyncMutex<()>,
}
impl<C> RequestHandler<C>
where
	C: ?Sized + HttpClient,
{
	/// Creates a handler that reuses the caller-provided transport.
	pub fn with_http_client(config: ApplicationConfig, http_client: impl Into<Arc<C>>) -> Self {
		let credentials = &config.credentials;
		let mut signer =
			Signer::new(credentials.signature_method, credentials.consumer_secret.expose());

		if let Some(path) = &credentials.private_key {
			signer = signer.with_private_key(path);
		}

		let state = TokenState::from_auth_data(config.auth_data.clone());

		Self {
			http_client: http_client.into(),
			metrics: Default::default(),
			config,
			signer,
			state: Mutex::new(state),
			call_guard: AsyncMutex::new(()),
		}
	}

	/// Validated configuration backing this handler.
	pub fn config(&self) -> &ApplicationConfig {
		&self.config
	}

	/// Sends a signed call and returns the decoded JSON body.
	///
	/// `method` must be `GET`, `POST`, `PUT`, or `DELETE`; anything else fails with a 405
	/// [`ApiError`](crate::error::ApiError) before any network traffic. For `GET`, `params`
	/// are signed and sent as the query string; other verbs send them as a JSON body. An empty
	/// response body decodes to [`Value::Null`].
	///
	/// When the token state calls for it, a token exchange runs first. A fresh request token
	/// ends the call with [`Error::AuthorizationRequired`].
	pub async fn request(&self, method: &str, path: &str, params: &ParameterSet) -> Result<Value> {
		let response = self.dispatch(method, path, params).await?;

		call::decode_value(&response)
	}

	/// Like [`request`](Self::request) but decodes the JSON body into `T`.
	///
	/// Decoding failures name the JSON path that did not match `T`.
	pub async fn request_as<T>(&self, method: &str, path: &str, params: &ParameterSet) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.dispatch(method, path, params).await?;

		call::decode_typed(&response)
	}

	/// Returns a snapshot of the current token state.
	pub fn auth_data(&self) -> AuthData {
		self.state.lock().snapshot()
	}

	/// Stores the verifier the user received after approving the request token.
	pub fn set_verifier(&self, verifier: impl Into<String>) {
		self.state.lock().set_verifier(verifier);
	}

	/// Replaces the token state with a previously captured snapshot.
	pub fn restore(&self, data: AuthData) {
		*self.state.lock() = TokenState::from_auth_data(data);
	}

	/// User authorization URL for the current request token, if one awaits approval.
	pub fn authorization_url(&self) -> Result<Option<Url>, ConfigError> {
		let state = self.state.lock();

		if state.token().is_empty() || state.is_verified() || !self.config.policy().three_legged {
			return Ok(None);
		}

		self.config.credentials.authorization_url(state.token()).map(Some)
	}

	async fn dispatch(
		&self,
		method: &str,
		path: &str,
		params: &ParameterSet,
	) -> Result<call::DataResponse> {
		let method = method.parse::<HttpMethod>()?;
		let _serialized = self.call_guard.lock().await;

		self.ensure_token(path).await?;
		self.send_data_call(method, path, params).await
	}

	fn oauth_parameters(&self) -> OAuthParameters {
		let credentials = &self.config.credentials;

		OAuthParameters::new(
			&credentials.consumer_key,
			credentials.signature_method,
			&credentials.callback_url,
		)
	}

	fn authorization_header(
		&self,
		method: HttpMethod,
		url: &Url,
		oauth: &OAuthParameters,
		extra: Option<&ParameterSet>,
		token_secret: &str,
	) -> Result<String, ConfigError> {
		let signing_set = oauth.signing_set(extra);
		let signature = self.signer.sign(method.as_str(), url.as_str(), &signing_set, token_secret)?;

		Ok(oauth.authorization_header(&signature))
	}
}
#[cfg(feature = "reqwest")]
impl RequestHandler<ReqwestHttpClient> {
	/// Creates a handler that provisions its own reqwest-backed transport.
	pub fn new(config: ApplicationConfig) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default())
	}
}
impl<C> Debug for RequestHandler<C>
where
	C: ?Sized + HttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestHandler")
			.field("application_type", &self.config.application_type)
			.field("consumer_key", &self.config.credentials.consumer_key)
			.field("signer", &self.signer)
			.field("auth_data", &self.auth_data())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		auth::TokenSecret,
		config::ApplicationType,
		error::{AUTHORIZATION_REQUIRED_CODE, ApiError},
		signer::SignatureMethod,
	};

	fn public_config() -> ApplicationConfig {
		ApplicationConfig::builder()
			.key("testKey")
			.secret("testSecret")
			.application_type(ApplicationType::Public)
			.endpoint("http://host")
			.sign_with("HMAC-SHA1")
			.build()
			.expect("Public configuration fixture should build.")
	}

	fn partner_config() -> ApplicationConfig {
		ApplicationConfig::builder()
			.key("partnerKey")
			.secret("partnerSecret")
			.application_type(ApplicationType::Partner)
			.endpoint("http://host")
			.oauth_endpoint("http://host/oauth")
			.sign_with("HMAC-SHA1")
			.build()
			.expect("Partner configuration fixture should build.")
	}

	fn two_legged_hmac_config() -> ApplicationConfig {
		ApplicationConfig::builder()
			.key("privateKey")
			.secret("privateSecret")
			.application_type(ApplicationType::Private)
			.sign_with("HMAC-SHA1")
			.endpoint("http://host")
			.build()
			.expect("Two-legged configuration fixture should build.")
	}

	fn handler(
		config: ApplicationConfig,
		client: &Arc<ScriptedHttpClient>,
	) -> RequestHandler<ScriptedHttpClient> {
		RequestHandler::with_http_client(config, Arc::clone(client))
	}

	#[tokio::test]
	async fn missing_token_requests_one_and_prompts_for_authorization() {
		let client = Arc::new(ScriptedHttpClient::new());

		client.push_form(200, "oauth_token=RT1&oauth_token_secret=RTS1&oauth_callback_confirmed=true");

		let handler = handler(public_config(), &client);
		let err = handler
			.request("GET", "/TEST", &ParameterSet::new())
			.await
			.expect_err("A fresh request token must prompt for authorization.");

		assert_eq!(err.code(), AUTHORIZATION_REQUIRED_CODE);
		assert!(matches!(
			&err,
			Error::AuthorizationRequired { token, authorization_url }
				if token == "RT1"
					&& authorization_url.as_str() == "http://host/oauth/Authorize?oauth_token=RT1"
		));

		let requests = client.requests();

		assert_eq!(requests.len(), 1);
		assert_eq!(requests[0].url.as_str(), "http://host/oauth/RequestToken");

		let header = requests[0].header("Authorization").expect("Authorization header is set.");

		assert_eq!(oauth_field(header, "oauth_callback").as_deref(), Some("oob"));
		assert_eq!(oauth_field(header, "oauth_token"), None);

		let data = handler.auth_data();

		assert_eq!(data.token, "RT1");
		assert_eq!(data.token_secret.expose(), "RTS1");
		assert!(!data.verified);
		assert_eq!(
			handler.authorization_url().expect("Authorize URL should build.").map(String::from),
			Some("http://host/oauth/Authorize?oauth_token=RT1".into())
		);
		assert_eq!(handler.metrics.token_fetches(), 1);
		assert_eq!(handler.metrics.data_calls(), 0);
		assert_eq!(handler.metrics.failures(), 0);
	}

	#[tokio::test]
	async fn verifier_is_exchanged_once_before_the_data_call() {
		let client = Arc::new(ScriptedHttpClient::new());

		client.push_form(200, "oauth_token=AT1&oauth_token_secret=ATS1&oauth_expires_in=1800");
		client.push_json(200, json!({"Status": "OK", "Invoices": []}));

		let handler = handler(public_config(), &client);

		handler.restore(AuthData::authorized("RT1", "RTS1", ""));
		handler.set_verifier("123456");

		let value = handler
			.request("GET", "/TEST", &ParameterSet::new())
			.await
			.expect("Data call should succeed after the exchange.");

		assert_eq!(value, json!({"Status": "OK", "Invoices": []}));

		let requests = client.requests();

		assert_eq!(requests.len(), 2);
		assert_eq!(requests[0].url.as_str(), "http://host/oauth/AccessToken");

		let exchange = requests[0].header("Authorization").expect("Exchange is signed.");

		assert_eq!(oauth_field(exchange, "oauth_token").as_deref(), Some("RT1"));
		assert_eq!(oauth_field(exchange, "oauth_verifier").as_deref(), Some("123456"));

		let data_call = requests[1].header("Authorization").expect("Data call is signed.");

		assert_eq!(requests[1].url.as_str(), "http://host/TEST");
		assert_eq!(oauth_field(data_call, "oauth_token").as_deref(), Some("AT1"));
		assert_eq!(requests[1].header("Accept"), Some("application/json"));

		let data = handler.auth_data();

		assert!(data.verified);
		assert_eq!(data.token, "AT1");
		assert!(data.expires_at.is_some());
		assert!(data.session_handle.is_none());

		client.push_json(200, json!({"Status": "OK"}));
		handler
			.request("GET", "/TEST", &ParameterSet::new())
			.await
			.expect("Verified tokens are reused without another exchange.");

		assert_eq!(client.requests().len(), 3);
	}

	#[tokio::test]
	async fn data_calls_are_keyed_with_the_exchanged_secret() {
		let client = Arc::new(ScriptedHttpClient::new());

		client.push_form(200, "oauth_token=AT1&oauth_token_secret=ATS1&oauth_expires_in=1800");
		client.push_json(200, json!({"Status": "OK"}));

		let handler = handler(public_config(), &client);

		handler.restore(AuthData::authorized("RT1", "RTS1", "123456"));
		handler
			.request("GET", "/TEST", &ParameterSet::new())
			.await
			.expect("Data call should succeed after the exchange.");

		let requests = client.requests();
		let header = requests[1].header("Authorization").expect("Data call is signed.");
		let signed = header
			.strip_prefix("OAuth ")
			.expect("Header uses the OAuth scheme.")
			.split(',')
			.filter_map(|pair| pair.split_once('=').map(|(name, _)| name))
			.filter(|name| *name != "oauth_signature")
			.map(|name| {
				(name.to_owned(), oauth_field(header, name).expect("Header field should decode."))
			})
			.collect::<ParameterSet>();
		let signer = Signer::new(SignatureMethod::HmacSha1, "testSecret");
		let expected = signer
			.sign("GET", "http://host/TEST", &signed, "ATS1")
			.expect("HMAC signing should succeed.");
		let stale = signer
			.sign("GET", "http://host/TEST", &signed, "RTS1")
			.expect("HMAC signing should succeed.");
		let signature = oauth_field(header, "oauth_signature");

		assert_eq!(signed.first("oauth_token"), Some("AT1"));
		assert!(signed.get("oauth_timestamp").is_some());
		assert!(signed.get("oauth_nonce").is_some());
		assert_eq!(signature.as_deref(), Some(expected.as_str()));
		assert_ne!(signature.as_deref(), Some(stale.as_str()));
	}

	#[tokio::test]
	async fn failed_data_calls_keep_the_exchanged_token() {
		let client = Arc::new(ScriptedHttpClient::new());

		client.push_form(200, "oauth_token=AT1&oauth_token_secret=ATS1&oauth_expires_in=1800");
		client.push_json(500, json!({"Title": "Server Error", "Detail": "Try again."}));
		client.push_json(200, json!({"Status": "OK"}));

		let handler = handler(public_config(), &client);

		handler.restore(AuthData::authorized("RT1", "RTS1", "123456"));

		let err = handler
			.request("GET", "/TEST", &ParameterSet::new())
			.await
			.expect_err("The data call must surface the server error.");

		assert_eq!(err.code(), 500);
		assert_eq!(handler.metrics.token_fetches(), 1);

		let data = handler.auth_data();

		assert!(data.verified);
		assert_eq!(data.token, "AT1");
		assert_eq!(data.token_secret.expose(), "ATS1");

		let value = handler
			.request("GET", "/TEST", &ParameterSet::new())
			.await
			.expect("The retry should reuse the exchanged token.");

		assert_eq!(value, json!({"Status": "OK"}));
		assert_eq!(handler.metrics.token_fetches(), 1);

		let requests = client.requests();

		assert_eq!(requests.len(), 3);
		assert_eq!(requests[2].url.as_str(), "http://host/TEST");
	}

	#[tokio::test]
	async fn partner_sessions_renew_through_the_handle() {
		let client = Arc::new(ScriptedHttpClient::new());

		client.push_form(
			200,
			"oauth_token=AT2&oauth_token_secret=ATS2&oauth_expires_in=1800&oauth_session_handle=SH2&\
			 oauth_authorization_expires_in=31536000",
		);
		client.push_json(200, json!({"Status": "OK"}));

		let handler = handler(partner_config(), &client);
		let past = OffsetDateTime::now_utc() - Duration::minutes(5);

		handler.restore(AuthData {
			token: "AT1".into(),
			token_secret: TokenSecret::new("ATS1"),
			verified: true,
			expires_at: Some(OffsetDateTime::now_utc() + Duration::minutes(20)),
			session_handle: Some("SH1".into()),
			authorization_expires_at: Some(past),
			..Default::default()
		});
		handler
			.request("GET", "/Organisation", &ParameterSet::new())
			.await
			.expect("Renewal should not require user interaction.");

		let requests = client.requests();
		let renewal = requests[0].header("Authorization").expect("Renewal is signed.");

		assert_eq!(requests[0].url.as_str(), "http://host/oauth/AccessToken");
		assert_eq!(oauth_field(renewal, "oauth_session_handle").as_deref(), Some("SH1"));
		assert_eq!(oauth_field(renewal, "oauth_token").as_deref(), Some("AT1"));
		assert_eq!(oauth_field(renewal, "oauth_verifier"), None);

		let data = handler.auth_data();

		assert_eq!(data.token, "AT2");
		assert_eq!(data.session_handle.as_deref(), Some("SH2"));
		assert!(data.authorization_expires_at.is_some_and(|at| at > OffsetDateTime::now_utc()));
	}

	#[tokio::test]
	async fn expired_public_tokens_restart_authorization() {
		let client = Arc::new(ScriptedHttpClient::new());

		client.push_form(200, "oauth_token=RT9&oauth_token_secret=RTS9");

		let handler = handler(public_config(), &client);

		handler.restore(AuthData {
			token: "AT1".into(),
			token_secret: TokenSecret::new("ATS1"),
			verified: true,
			expires_at: Some(OffsetDateTime::now_utc() - Duration::seconds(1)),
			..Default::default()
		});

		let err = handler
			.request("GET", "/TEST", &ParameterSet::new())
			.await
			.expect_err("Expired public tokens must be re-authorized.");

		assert_eq!(err.code(), AUTHORIZATION_REQUIRED_CODE);

		let requests = client.requests();
		let header = requests[0].header("Authorization").expect("Request token call is signed.");

		assert_eq!(requests[0].url.as_str(), "http://host/oauth/RequestToken");
		assert_eq!(oauth_field(header, "oauth_token"), None);
		assert_eq!(handler.auth_data().token, "RT9");
		assert!(handler.auth_data().expires_at.is_none());
	}

	#[tokio::test]
	async fn unsupported_verbs_fail_before_any_traffic() {
		let client = Arc::new(ScriptedHttpClient::new());
		let handler = handler(public_config(), &client);
		let err = handler
			.request("PATCH", "/TEST", &ParameterSet::new())
			.await
			.expect_err("PATCH must be rejected.");

		assert!(matches!(&err, Error::Api(ApiError { status: Some(405), .. })));
		assert_eq!(err.code(), 405);
		assert!(client.requests().is_empty());
	}

	#[tokio::test]
	async fn get_parameters_are_signed_into_the_query() {
		let client = Arc::new(ScriptedHttpClient::new());

		client.push_json(200, json!({"Contacts": []}));

		let handler = handler(two_legged_hmac_config(), &client);
		let params = ParameterSet::from([("where", "Name == \"A B\""), ("page", "2")]);

		handler.request("get", "/Contacts", &params).await.expect("GET should succeed.");

		let request = &client.requests()[0];

		assert_eq!(
			request.url.as_str(),
			"http://host/Contacts?page=2&where=Name%20%3D%3D%20%22A%20B%22"
		);
		assert!(request.body.is_none());

		let header = request.header("Authorization").expect("Data call is signed.");

		assert_eq!(oauth_field(header, "oauth_token").as_deref(), Some("privateKey"));
	}

	#[tokio::test]
	async fn caller_oauth_names_stay_out_of_the_query() {
		let client = Arc::new(ScriptedHttpClient::new());

		client.push_json(200, json!({"Contacts": []}));

		let handler = handler(two_legged_hmac_config(), &client);
		let params = ParameterSet::from([("oauth_token", "forged"), ("page", "2")]);

		handler
			.request("GET", "/Contacts?oauth_nonce=fixed", &params)
			.await
			.expect("GET should succeed.");

		let request = &client.requests()[0];

		assert_eq!(request.url.as_str(), "http://host/Contacts?page=2");

		let header = request.header("Authorization").expect("Data call is signed.");

		assert_eq!(oauth_field(header, "oauth_token").as_deref(), Some("privateKey"));
		assert_ne!(oauth_field(header, "oauth_nonce").as_deref(), Some("fixed"));
	}

	#[tokio::test]
	async fn post_parameters_travel_as_json() {
		let client = Arc::new(ScriptedHttpClient::new());

		client.push_json(200, json!({"Id": "1"}));

		let handler = handler(two_legged_hmac_config(), &client);
		let params = ParameterSet::from([("Name", "ACME")]);

		handler.request("POST", "/Contacts", &params).await.expect("POST should succeed.");

		let request = &client.requests()[0];
		let body: Value = serde_json::from_slice(request.body.as_deref().unwrap_or_default())
			.expect("Body should be JSON.");

		assert_eq!(request.url.as_str(), "http://host/Contacts");
		assert_eq!(body, json!({"Name": "ACME"}));
		assert_eq!(request.header("Content-Type"), Some("application/json"));
	}

	#[tokio::test]
	async fn api_errors_carry_status_and_folded_message() {
		let client = Arc::new(ScriptedHttpClient::new());

		client.push_json(
			400,
			json!({"status": 400, "title": "Validation", "detail": "Bad contact", "errors": []}),
		);

		let handler = handler(two_legged_hmac_config(), &client);
		let err = handler
			.request("PUT", "/Contacts", &ParameterSet::new())
			.await
			.expect_err("400 responses must fail.");

		assert_eq!(err.code(), 400);
		assert_eq!(err.to_string(), "400: Validation - Bad contact");
		assert_eq!(handler.metrics.failures(), 1);
	}

	#[tokio::test]
	async fn failed_exchanges_leave_state_untouched() {
		let client = Arc::new(ScriptedHttpClient::new());

		client.push_form(401, "oauth_problem=token_rejected&oauth_problem_advice=Bad%20verifier");
		client.push_transport_error("connection reset");

		let handler = handler(public_config(), &client);
		let restored = AuthData::authorized("RT1", "RTS1", "bad");

		handler.restore(restored.clone());

		let err = handler
			.request("GET", "/TEST", &ParameterSet::new())
			.await
			.expect_err("Rejected verifiers must fail.");

		assert_eq!(err.to_string(), "401: token_rejected - Bad verifier");
		assert_eq!(handler.auth_data(), restored);

		let err = handler
			.request("GET", "/TEST", &ParameterSet::new())
			.await
			.expect_err("Transport failures must fail.");

		assert_eq!(err.code(), 0);
		assert!(matches!(err, Error::Api(ApiError { status: None, .. })));
		assert_eq!(handler.auth_data(), restored);
		assert_eq!(handler.metrics.failures(), 2);
	}

	#[tokio::test]
	async fn empty_bodies_decode_to_null() {
		let client = Arc::new(ScriptedHttpClient::new());

		client.push(204, Vec::new());

		let handler = handler(two_legged_hmac_config(), &client);
		let value = handler
			.request("DELETE", "/Items/1", &ParameterSet::new())
			.await
			.expect("Empty bodies should decode.");

		assert_eq!(value, Value::Null);
	}

	#[tokio::test]
	async fn typed_decoding_reports_the_failing_path() {
		#[derive(Debug, Deserialize)]
		struct Organisation {
			#[serde(rename = "Name")]
			name: String,
		}
		#[derive(Debug, Deserialize)]
		struct Organisations {
			#[serde(rename = "Organisations")]
			organisations: Vec<Organisation>,
		}

		let client = Arc::new(ScriptedHttpClient::new());

		client.push_json(200, json!({"Organisations": [{"Name": "Demo"}]}));
		client.push_json(200, json!({"Organisations": [{"Name": 7}]}));

		let handler = handler(two_legged_hmac_config(), &client);
		let orgs: Organisations = handler
			.request_as("GET", "/Organisation", &ParameterSet::new())
			.await
			.expect("Typed decoding should succeed.");

		assert_eq!(orgs.organisations[0].name, "Demo");

		let err = handler
			.request_as::<Organisations>("GET", "/Organisation", &ParameterSet::new())
			.await
			.expect_err("Mismatched types must fail.");

		assert!(err.to_string().contains("Organisations[0].Name"));
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let client = Arc::new(ScriptedHttpClient::new());
		let handler = handler(two_legged_hmac_config(), &client);
		let rendered = format!("{handler:?}");

		assert!(rendered.contains("privateKey"));
		assert!(!rendered.contains("privateSecret"));
		assert_eq!(handler.authorization_url().expect("No URL is needed."), None);
	}
}
