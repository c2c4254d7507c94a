//! Walks a public application through the three-legged flow: request token, user approval,
//! verifier exchange, and a first signed call.
//!
//! Set `XERO_CONSUMER_KEY` and `XERO_CONSUMER_SECRET`, then run
//! `cargo run --example public_authorization`.

// std
use std::{env, io};
// crates.io
use color_eyre::{Result, eyre::eyre};
// self
use xero_oauth1::{
	config::{ApplicationConfig, ApplicationType},
	error::Error,
	handler::ReqwestRequestHandler,
	signer::ParameterSet,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = ApplicationConfig::builder()
		.key(env::var("XERO_CONSUMER_KEY")?)
		.secret(env::var("XERO_CONSUMER_SECRET")?)
		.application_type(ApplicationType::Public)
		.build()?;
	let handler = ReqwestRequestHandler::new(config);
	let params = ParameterSet::new();

	match handler.request("GET", "/Organisation", &params).await {
		Err(Error::AuthorizationRequired { authorization_url, .. }) => {
			println!("Send your user to {authorization_url}.");
			println!("Paste the verifier shown after approval:");
		},
		Ok(_) => return Err(eyre!("A fresh public application should need authorization first.")),
		Err(e) => return Err(e.into()),
	}

	let mut verifier = String::new();

	io::stdin().read_line(&mut verifier)?;
	handler.set_verifier(verifier.trim());

	let organisation = handler.request("GET", "/Organisation", &params).await?;

	println!("{}", serde_json::to_string_pretty(&organisation)?);
	println!(
		"Persist this state to skip the redirect next time: {}",
		serde_json::to_string(&handler.auth_data())?
	);

	Ok(())
}
