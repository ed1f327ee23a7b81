// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::preconditions::{Precondition, context_for_interaction, evaluate};
use crate::lifecycle::LifecycleScheduler;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use miette::{IntoDiagnostic, bail};
use std::sync::Arc;
use twilight_http::client::Client;
use twilight_model::application::command::Command;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::channel::message::MessageFlags;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::InteractionResponseDataBuilder;

mod add_user;
mod block_user;
mod claim;
mod close;
mod list_blocked_users;
mod panel;
mod remove_user;
mod settings;
mod setup;
mod unblock_user;
mod unclaim;

pub fn command_definitions() -> Vec<Command> {
	vec![
		add_user::command_definition(),
		block_user::command_definition(),
		claim::command_definition(),
		close::command_definition(),
		list_blocked_users::command_definition(),
		panel::command_definition(),
		remove_user::command_definition(),
		settings::command_definition(),
		setup::command_definition(),
		unblock_user::command_definition(),
		unclaim::command_definition(),
	]
}

pub async fn route_command(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	http_client: &Arc<Client>,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
	lifecycle_scheduler: LifecycleScheduler,
) -> miette::Result<()> {
	let preconditions: &[Precondition] = match command_data.name.as_str() {
		"add_user" => add_user::PRECONDITIONS,
		"block_user" => block_user::PRECONDITIONS,
		"claim" => claim::PRECONDITIONS,
		"close" => close::PRECONDITIONS,
		"list_blocked_users" => list_blocked_users::PRECONDITIONS,
		"panel" => panel::PRECONDITIONS,
		"remove_user" => remove_user::PRECONDITIONS,
		"settings" => settings::PRECONDITIONS,
		"setup" => setup::PRECONDITIONS,
		"unblock_user" => unblock_user::PRECONDITIONS,
		"unclaim" => unclaim::PRECONDITIONS,
		_ => bail!("Unknown command encountered: {}\n{:?}", command_data.name, command_data),
	};

	let precondition_context = {
		let mut db_connection = db_connection_pool.get().into_diagnostic()?;
		context_for_interaction(interaction, &mut db_connection)?
	};
	if let Err(failure) = evaluate(preconditions, &precondition_context) {
		let response = InteractionResponseDataBuilder::new()
			.content(failure.user_message())
			.flags(MessageFlags::EPHEMERAL)
			.build();
		let response = InteractionResponse {
			kind: InteractionResponseType::ChannelMessageWithSource,
			data: Some(response),
		};
		http_client
			.interaction(application_id)
			.create_response(interaction.id, &interaction.token, &response)
			.await
			.into_diagnostic()?;
		return Ok(());
	}

	match command_data.name.as_str() {
		"add_user" => {
			add_user::handle_command(interaction, command_data, http_client, application_id, db_connection_pool).await
		}
		"block_user" => {
			block_user::handle_command(interaction, command_data, http_client, application_id, db_connection_pool).await
		}
		"claim" => claim::handle_command(interaction, http_client, application_id, db_connection_pool).await,
		"close" => {
			close::handle_command(
				interaction,
				command_data,
				http_client,
				application_id,
				db_connection_pool,
				lifecycle_scheduler,
			)
			.await
		}
		"list_blocked_users" => {
			list_blocked_users::handle_command(interaction, http_client, application_id, db_connection_pool).await
		}
		"panel" => panel::handle_command(interaction, command_data, http_client, application_id, db_connection_pool).await,
		"remove_user" => {
			remove_user::handle_command(interaction, command_data, http_client, application_id, db_connection_pool).await
		}
		"settings" => {
			settings::handle_command(interaction, command_data, http_client, application_id, db_connection_pool).await
		}
		"setup" => setup::handle_command(interaction, command_data, http_client, application_id, db_connection_pool).await,
		"unblock_user" => {
			unblock_user::handle_command(interaction, command_data, http_client, application_id, db_connection_pool).await
		}
		"unclaim" => unclaim::handle_command(interaction, http_client, application_id, db_connection_pool).await,
		_ => bail!("Unknown command encountered: {}\n{:?}", command_data.name, command_data),
	}
}
