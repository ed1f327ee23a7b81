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
use miette::{IntoDiagnostic, bail, ensure};
use twilight_http::client::Client;
use twilight_mention::fmt::Mention;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::{CommandData, CommandOptionValue};
use twilight_model::channel::message::{AllowedMentions, MessageFlags};
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::InteractionResponseDataBuilder;
use twilight_util::builder::command::{CommandBuilder, UserBuilder};

pub const PRECONDITIONS: &[Precondition] = &[Precondition::GuildOnly, Precondition::StaffOnly];

pub fn command_definition() -> Command {
	let user_option = UserBuilder::new("user", "The user to block from opening tickets")
		.required(true)
		.build();
	CommandBuilder::new(
		"block_user",
		"Block a user from opening tickets on this server",
		CommandType::ChatInput,
	)
	.contexts([InteractionContextType::Guild])
	.option(user_option)
	.build()
}

pub async fn handle_command(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
) -> miette::Result<()> {
	let Some(guild_id) = interaction.guild_id else {
		bail!("Block user command was used outside of a guild");
	};
	let Some(user_option) = command_data.options.first() else {
		bail!("Command data is malformed; expected `/block_user` to have required option `user`");
	};
	ensure!(
		user_option.name.as_str() == "user",
		"The only option for `/block_user` should be `user`"
	);
	let CommandOptionValue::User(user_id) = user_option.value else {
		bail!("Command data is malformed; expected `user` option of `/block_user` to be a user");
	};

	let mut db_connection = db_connection_pool.get().into_diagnostic()?;
	let new_block = TicketBlockedUser {
		guild_id: database_id_from_discord_id(guild_id.get()),
		user_id: database_id_from_discord_id(user_id.get()),
	};
	diesel::insert_into(ticket_blocked_users::table)
		.values(new_block)
		.on_conflict_do_nothing()
		.execute(&mut db_connection)
		.into_diagnostic()?;

	let interaction_client = http_client.interaction(application_id);
	let response = InteractionResponseDataBuilder::new()
		.content(format!("{} can no longer open tickets on this server.", user_id.mention()))
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
