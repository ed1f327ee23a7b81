// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::preconditions::Precondition;
use crate::model::{Ticket, database_id_from_discord_id};
use crate::schema::tickets;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use miette::{IntoDiagnostic, bail, ensure};
use twilight_http::client::Client;
use twilight_mention::fmt::Mention;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::{CommandData, CommandOptionValue};
use twilight_model::channel::message::AllowedMentions;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::InteractionResponseDataBuilder;
use twilight_util::builder::command::{CommandBuilder, UserBuilder};

pub const PRECONDITIONS: &[Precondition] = &[
	Precondition::GuildOnly,
	Precondition::StaffOnly,
	Precondition::InTicketThread,
];

pub fn command_definition() -> Command {
	let user_option = UserBuilder::new("user", "The user to add to the ticket")
		.required(true)
		.build();
	CommandBuilder::new("add_user", "Add a user to this ticket", CommandType::ChatInput)
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
	let Some(user_option) = command_data.options.first() else {
		bail!("Command data is malformed; expected `/add_user` to have required option `user`");
	};
	ensure!(
		user_option.name.as_str() == "user",
		"The only option for `/add_user` should be `user`"
	);
	let CommandOptionValue::User(user_id) = user_option.value else {
		bail!("Command data is malformed; expected `user` option of `/add_user` to be a user");
	};

	let mut db_connection = db_connection_pool.get().into_diagnostic()?;
	let Some(channel) = interaction.channel.as_ref() else {
		bail!("Add user command used with no channel");
	};
	let db_channel_id = database_id_from_discord_id(channel.id.get());
	let ticket: Ticket = tickets::table
		.filter(tickets::thread.eq(db_channel_id).and(tickets::closed_at.is_null()))
		.first(&mut db_connection)
		.into_diagnostic()?;

	http_client
		.add_thread_member(ticket.get_thread(), user_id)
		.await
		.into_diagnostic()?;

	let interaction_client = http_client.interaction(application_id);
	let response = InteractionResponseDataBuilder::new()
		.content(format!("Added {} to the ticket.", user_id.mention()))
		.allowed_mentions(AllowedMentions::default())
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
