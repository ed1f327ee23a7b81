// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::preconditions::Precondition;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use miette::bail;
use twilight_http::client::Client;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::command::CommandBuilder;

mod admin_role;
mod auto_close;
mod log_channel;
mod reminder;
mod staff_role;

pub const PRECONDITIONS: &[Precondition] = &[Precondition::GuildOnly, Precondition::AdminOnly];

pub fn command_definition() -> Command {
	CommandBuilder::new("settings", "Manages server settings", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.option(admin_role::subcommand_definition())
		.option(auto_close::subcommand_definition())
		.option(log_channel::subcommand_definition())
		.option(reminder::subcommand_definition())
		.option(staff_role::subcommand_definition())
		.build()
}

pub async fn handle_command(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
) -> miette::Result<()> {
	let Some(subcommand_option) = command_data.options.first() else {
		bail!("Command data is malformed; expected `/settings` to have a subcommand group");
	};

	match subcommand_option.name.as_str() {
		"admin_role" => {
			admin_role::handle_subcommand(
				interaction,
				&subcommand_option.value,
				http_client,
				application_id,
				db_connection_pool,
			)
			.await
		}
		"auto_close" => {
			auto_close::handle_subcommand(
				interaction,
				&subcommand_option.value,
				http_client,
				application_id,
				db_connection_pool,
			)
			.await
		}
		"log_channel" => {
			log_channel::handle_subcommand(
				interaction,
				&subcommand_option.value,
				http_client,
				application_id,
				db_connection_pool,
			)
			.await
		}
		"reminder" => {
			reminder::handle_subcommand(
				interaction,
				&subcommand_option.value,
				http_client,
				application_id,
				db_connection_pool,
			)
			.await
		}
		"staff_role" => {
			staff_role::handle_subcommand(
				interaction,
				&subcommand_option.value,
				http_client,
				application_id,
				db_connection_pool,
			)
			.await
		}
		_ => bail!(
			"Unknown settings subcommand encountered: {}\n{:?}",
			subcommand_option.name,
			command_data
		),
	}
}
