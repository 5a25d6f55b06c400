//! Drives a web login from the terminal: prints the hosted login URL, then waits for the
//! callback URL the browser was redirected to to be pasted back.

// std
use std::{io::BufRead, sync::Arc, time::Duration};
// crates.io
use color_eyre::{Report, Result};
use url::Url;
// self
use idp_webauth::{
	auth::{AuthParameters, ClientId, ConnectionId},
	authenticator::Authenticator,
	config::WebAuthConfig,
	present::ChannelPresenter,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = WebAuthConfig::builder(
		Url::parse("https://tenant.example.com")?,
		ClientId::new("demo-client")?,
	)
	.redirect_uri(Url::parse("http://127.0.0.1:7878/callback")?)
	.build()?;
	let authenticator = Arc::new(Authenticator::from_config(config));
	let (presenter, sender) = ChannelPresenter::new();
	let flow = tokio::spawn({
		let authenticator = authenticator.clone();
		let presenter = Arc::new(presenter.clone());
		let parameters = AuthParameters::new().with_scope("openid profile offline_access");

		async move {
			let connection = ConnectionId::new("google-oauth2")?;
			let credentials =
				authenticator.authenticate(connection, Some(parameters), presenter).await?;

			Ok::<_, Report>(credentials)
		}
	});

	while presenter.presented().is_empty() {
		if flow.is_finished() {
			flow.await??;

			return Ok(());
		}

		tokio::time::sleep(Duration::from_millis(10)).await;
	}

	println!("Open {} in a browser.", &presenter.presented()[0]);
	println!("Paste the URL you were redirected to (empty line to give up):");

	let line = tokio::task::spawn_blocking(|| {
		let mut line = String::new();

		std::io::stdin().lock().read_line(&mut line).map(|_| line)
	})
	.await??;

	match line.trim() {
		"" => {
			sender.dismissed();
		},
		raw => {
			sender.redirect(Url::parse(raw)?);
		},
	}

	let credentials = flow.await??;

	println!("Logged in: {credentials:?}.");

	Ok(())
}
