// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::preconditions::Precondition;
use crate::model::{TicketBlockedUser, database_id_from_discord_id};
use crate::schema::ticket_blocked_users;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use miette::{IntoDiagnostic, bail};
use twilight_http::client::Client;
use twilight_mention::fmt::Mention;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::channel::message::{AllowedMentions, MessageFlags};
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::InteractionResponseDataBuilder;
use twilight_util::builder::command::CommandBuilder;

pub const PRECONDITIONS: &[Precondition] = &[Precondition::GuildOnly, Precondition::StaffOnly];

pub fn command_definition() -> Command {
	CommandBuilder::new(
		"list_blocked_users",
		"List the users blocked from opening tickets on this server",
		CommandType::ChatInput,
	)
	.contexts([InteractionContextType::Guild])
	.build()
}

pub async fn handle_command(
	interaction: &InteractionCreate,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
) -> miette::Result<()> {
	let Some(guild_id) = interaction.guild_id else {
		bail!("List blocked users command was used outside of a guild");
	};
	let db_guild_id = database_id_from_discord_id(guild_id.get());

	let mut db_connection = db_connection_pool.get().into_diagnostic()?;
	let blocked_users: Vec<TicketBlockedUser> = ticket_blocked_users::table
		.filter(ticket_blocked_users::guild_id.eq(db_guild_id))
		.load(&mut db_connection)
		.into_diagnostic()?;

	let message = if blocked_users.is_empty() {
		String::from("No users are blocked from opening tickets on this server.")
	} else {
		let mut message = String::from("Users blocked from opening tickets:");
		for blocked_user in blocked_users {
			message = format!("{}\n- {}", message, blocked_user.get_user_id().mention());
		}
		message
	};

	let interaction_client = http_client.interaction(application_id);
	let response = InteractionResponseDataBuilder::new()
		.content(message)
		.allowed_mentions(AllowedMentions::default())
		.flags(MessageFlags::EPHEMERAL)
		.build();
	let response = InteractionResponse {
		kind: InteractionResponseType::ChannelMessageWithSource,
		data: Some(response),
	};
	interaction_client
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;

	Ok(())
}
