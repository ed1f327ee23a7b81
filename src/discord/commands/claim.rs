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

pub const PRECONDITIONS: &[Precondition] = &[
	Precondition::GuildOnly,
	Precondition::StaffOnly,
	Precondition::InTicketThread,
];

pub fn command_definition() -> Command {
	CommandBuilder::new("claim", "Claim this ticket", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.build()
}

pub async fn handle_command(
	interaction: &InteractionCreate,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
) -> miette::Result<()> {
	let mut db_connection = db_connection_pool.get().into_diagnostic()?;
	let interaction_client = http_client.interaction(application_id);

	let Some(channel) = interaction.channel.as_ref() else {
		bail!("Claim command used with no channel");
	};
	let db_channel_id = database_id_from_discord_id(channel.id.get());
	let ticket: Ticket = tickets::table
		.filter(tickets::thread.eq(db_channel_id).and(tickets::closed_at.is_null()))
		.first(&mut db_connection)
		.into_diagnostic()?;

	let Some(interaction_member) = &interaction.member else {
		bail!("Interaction isn't from a guild member");
	};
	let Some(interaction_user) = &interaction_member.user else {
		bail!("Interaction member is not a user");
	};

	if let Some(claimer) = ticket.get_claimed_by() {
		let message = if claimer == interaction_user.id {
			String::from("You've already claimed this ticket.")
		} else {
			format!("This ticket is already claimed by {}.", claimer.mention())
		};
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
		return Ok(());
	}

	let db_user_id = database_id_from_discord_id(interaction_user.id.get());
	diesel::update(tickets::table)
		.filter(tickets::id.eq(&ticket.id))
		.set(tickets::claimed_by.eq(Some(db_user_id)))
		.execute(&mut db_connection)
		.into_diagnostic()?;

	let response = InteractionResponseDataBuilder::new()
		.content(format!("Ticket claimed by {}.", interaction_user.id.mention()))
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
