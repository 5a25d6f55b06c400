#![cfg(feature = "reqwest")]

mod common;

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use common::{http::*, *};
use idp_webauth::{
	api::{ApiClient, AuthorizationArtifact},
	auth::{AuthParameters, TokenSecret},
	authenticator::Authenticator,
	error::{ApiError, Error, TransientError},
	present::ChannelPresenter,
};

fn artifact(code: &str) -> AuthorizationArtifact {
	AuthorizationArtifact {
		code: TokenSecret::new(code),
		redirect_uri: url(REDIRECT_URI),
		code_verifier: Some(TokenSecret::new("verifier-0123456789")),
	}
}

#[tokio::test]
async fn exchange_posts_code_and_maps_id_token() {
	let server = MockServer::start_async().await;
	let config = mock_config(&server);
	let api = mock_api_client(&config);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.body_includes("grant_type=authorization_code")
				.body_includes("code=valid-code")
				.body_includes("code_verifier=verifier-0123456789");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-abc\",\"id_token\":\"h.p.s\",\"refresh_token\":\"refresh-abc\",\"token_type\":\"bearer\",\"expires_in\":3600,\"scope\":\"openid offline_access\"}",
			);
		})
		.await;
	let credentials = api
		.exchange(&artifact("valid-code"), &connection("google-oauth2"), &AuthParameters::new())
		.await
		.expect("Code exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(credentials.access_token.expose(), "access-abc");
	assert_eq!(credentials.id_token.as_ref().map(|secret| secret.expose()), Some("h.p.s"));
	assert_eq!(
		credentials.refresh_token.as_ref().map(|secret| secret.expose()),
		Some("refresh-abc")
	);
	assert_eq!(credentials.token_type, "bearer");
	assert_eq!(credentials.scope.as_deref(), Some("openid offline_access"));
	assert!(credentials.expires_at.is_some());
}

#[tokio::test]
async fn exchange_echoes_audience_and_scope() {
	let server = MockServer::start_async().await;
	let config = mock_config(&server);
	let api = mock_api_client(&config);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/token")
				.body_includes("grant_type=authorization_code")
				.body_includes("audience=https%3A%2F%2Fapi.example.com")
				.body_includes("scope=openid+email");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"aud-token\",\"token_type\":\"bearer\"}");
		})
		.await;
	let credentials = api
		.exchange(
			&artifact("valid-code"),
			&connection("google-oauth2"),
			&AuthParameters::new().with_scope("openid email").with_audience("https://api.example.com"),
		)
		.await
		.expect("Code exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(credentials.access_token.expose(), "aud-token");
}

#[tokio::test]
async fn exchange_classifies_invalid_grant() {
	let server = MockServer::start_async().await;
	let config = mock_config(&server);
	let api = mock_api_client(&config);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"already used\"}");
		})
		.await;
	let err = api
		.exchange(&artifact("stale-code"), &connection("google-oauth2"), &AuthParameters::new())
		.await
		.expect_err("Reused codes must be rejected.");

	mock.assert_async().await;

	match err {
		ApiError::InvalidGrant { reason } => assert!(reason.contains("already used")),
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn throttled_exchange_reports_retry_after() {
	let server = MockServer::start_async().await;
	let config = mock_config(&server);
	let api = mock_api_client(&config);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(503)
				.header("content-type", "application/json")
				.header("retry-after", "30")
				.body("{\"error\":\"temporarily_unavailable\"}");
		})
		.await;
	let err = api
		.exchange(&artifact("code"), &connection("google-oauth2"), &AuthParameters::new())
		.await
		.expect_err("Unavailable endpoints must fail.");

	match err {
		ApiError::Transient(TransientError::TokenEndpoint { status, retry_after, .. }) => {
			assert_eq!(status, Some(503));
			assert_eq!(retry_after, Some(time::Duration::seconds(30)));
		},
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn password_login_sends_realm_and_scope() {
	let server = MockServer::start_async().await;
	let config = mock_config(&server);
	let api = mock_api_client(&config);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/token")
				.body_includes("grant_type=password")
				.body_includes("username=user%40example.com")
				.body_includes("realm=Username-Password-Authentication")
				.body_includes("audience=https%3A%2F%2Fapi.example.com");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"db-token\",\"token_type\":\"bearer\"}");
		})
		.await;
	let credentials = api
		.login_with_password(
			&connection("Username-Password-Authentication"),
			"user@example.com",
			&TokenSecret::new("hunter2"),
			&AuthParameters::new().with_scope("openid").with_audience("https://api.example.com"),
		)
		.await
		.expect("Password login should succeed.");

	mock.assert_async().await;

	assert_eq!(credentials.access_token.expose(), "db-token");
	assert!(credentials.expires_at.is_none());
}

#[tokio::test]
async fn full_web_login_against_mock_tenant() {
	let server = MockServer::start_async().await;
	let config = mock_config(&server);
	let api = Arc::new(mock_api_client(&config));
	let authenticator = Authenticator::new(api, config);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token").body_includes("code=from-redirect");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"abc\",\"token_type\":\"bearer\",\"expires_in\":60}");
		})
		.await;
	let (presenter, sender) = ChannelPresenter::new();

	sender.redirect(callback("code=from-redirect&state=s1"));

	let credentials = authenticator
		.authenticate(
			connection("google-oauth2"),
			Some(AuthParameters::new().with_state("s1")),
			Arc::new(presenter.clone()),
		)
		.await
		.expect("Web login should succeed.");

	mock.assert_async().await;

	assert_eq!(credentials.access_token.expose(), "abc");

	let presented = presenter.presented();
	let authorize = &presented[0];

	assert_eq!(authorize.path(), "/authorize");
	assert_eq!(authorize.port(), Some(server.port()));

	let err: Error = authenticator
		.authenticate(connection("google-oauth2"), None, Arc::new(VanishingPresenter::default()))
		.await
		.expect_err("A closed surface must fail.");

	assert!(err.is_cancellation());
}
