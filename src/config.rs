// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use knus::Decode;
use miette::{IntoDiagnostic, Result};
use tokio::fs::read_to_string;

pub async fn parse_config(config_path: &str) -> Result<ConfigData> {
	let config_file_contents = read_to_string(config_path).await.into_diagnostic()?;
	let config = knus::parse(config_path, &config_file_contents)?;
	Ok(config)
}

#[derive(Debug, Decode)]
pub struct ConfigData {
	#[knus(child)]
	pub discord: DiscordConfig,
	#[knus(child)]
	pub database: DatabaseConfig,
	#[knus(child)]
	pub web: WebConfig,
	#[knus(child)]
	pub redis: RedisConfig,
}

#[derive(Debug, Decode)]
pub struct DiscordConfig {
	/// The bot token used for the gateway connection and HTTP client
	#[knus(child, unwrap(argument))]
	pub bot_token: String,
	/// The application's OAuth2 client ID, used for dashboard logins
	#[knus(child, unwrap(argument))]
	pub client_id: String,
	/// The application's OAuth2 client secret, used for dashboard logins
	#[knus(child, unwrap(argument))]
	pub client_secret: String,
}

#[derive(Debug, Decode)]
pub struct DatabaseConfig {
	#[knus(child, unwrap(argument))]
	pub host: String,
	#[knus(child, unwrap(argument))]
	pub port: Option<u16>,
	#[knus(child, unwrap(argument))]
	pub username: String,
	#[knus(child, unwrap(argument))]
	pub password: String,
	#[knus(child, unwrap(argument))]
	pub database: String,
}

#[derive(Debug, Decode)]
pub struct WebConfig {
	/// The address on which the dashboard server listens, e.g. `127.0.0.1:3000`
	#[knus(child, unwrap(argument))]
	pub bind_addr: String,
	/// The externally-visible base URL of the dashboard, used to build the OAuth redirect URL
	#[knus(child, unwrap(argument))]
	pub base_url: String,
}

#[derive(Debug, Decode)]
pub struct RedisConfig {
	#[knus(child, unwrap(argument))]
	pub url: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	const EXAMPLE_CONFIG: &str = r#"
discord {
	bot-token "abc123"
	client-id "1234567890"
	client-secret "shhh"
}
database {
	host "localhost"
	username "gatewarden"
	password "hunter2"
	database "gatewarden"
}
web {
	bind-addr "127.0.0.1:3000"
	base-url "https://tickets.example.com"
}
redis {
	url "redis://127.0.0.1/"
}
"#;

	#[test]
	fn parses_full_document() {
		let config: ConfigData = knus::parse("test.kdl", EXAMPLE_CONFIG).expect("config should parse");
		assert_eq!(config.discord.bot_token, "abc123");
		assert_eq!(config.database.host, "localhost");
		assert_eq!(config.database.port, None);
		assert_eq!(config.web.bind_addr, "127.0.0.1:3000");
		assert_eq!(config.redis.url, "redis://127.0.0.1/");
	}

	#[test]
	fn database_port_is_optional() {
		let with_port = EXAMPLE_CONFIG.replace("host \"localhost\"", "host \"localhost\"\n\tport 5433");
		let config: ConfigData = knus::parse("test.kdl", &with_port).expect("config should parse");
		assert_eq!(config.database.port, Some(5433));
	}

	#[test]
	fn rejects_missing_sections() {
		let no_redis = EXAMPLE_CONFIG.replace("redis {\n\turl \"redis://127.0.0.1/\"\n}", "");
		let result: Result<ConfigData, _> = knus::parse("test.kdl", &no_redis);
		assert!(result.is_err());
	}
}
