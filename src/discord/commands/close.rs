// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::preconditions::Precondition;
use crate::discord::utils::tickets::close_ticket;
use crate::lifecycle::LifecycleScheduler;
use crate::model::{Guild, Ticket, database_id_from_discord_id};
use crate::schema::{guilds, tickets};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use miette::{IntoDiagnostic, bail};
use twilight_http::client::Client;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::{CommandData, CommandOptionValue};
use twilight_model::channel::message::MessageFlags;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::InteractionResponseDataBuilder;
use twilight_util::builder::command::{CommandBuilder, StringBuilder};

pub const PRECONDITIONS: &[Precondition] = &[Precondition::GuildOnly, Precondition::InTicketThread];

pub fn command_definition() -> Command {
	let reason_option = StringBuilder::new("reason", "Why the ticket is being closed").build();
	CommandBuilder::new("close", "Close this ticket", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.option(reason_option)
		.build()
}

pub async fn handle_command(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
	lifecycle_scheduler: LifecycleScheduler,
) -> miette::Result<()> {
	let mut db_connection = db_connection_pool.get().into_diagnostic()?;
	let interaction_client = http_client.interaction(application_id);

	let ticket = match interaction.channel.as_ref() {
		Some(channel) => {
			let db_channel_id = database_id_from_discord_id(channel.id.get());
			let ticket: Option<Ticket> = tickets::table
				.filter(tickets::thread.eq(db_channel_id).and(tickets::closed_at.is_null()))
				.first(&mut db_connection)
				.optional()
				.into_diagnostic()?;
			ticket
		}
		None => None,
	};
	let Some(ticket) = ticket else {
		let response = InteractionResponseDataBuilder::new()
			.content("This command is only useful in a ticket thread.")
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
	};

	let guild: Guild = guilds::table
		.find(ticket.guild)
		.first(&mut db_connection)
		.into_diagnostic()?;

	let Some(interaction_member) = &interaction.member else {
		bail!("Interaction isn't from a guild member");
	};
	let Some(interaction_user) = &interaction_member.user else {
		bail!("Interaction member is not a user");
	};

	// Staff can close any ticket; the ticket opener can close their own.
	let staff_role = guild.get_staff_role();
	let admin_role = guild.get_admin_role();
	let is_staff =
		interaction_member.roles.contains(&staff_role) || interaction_member.roles.contains(&admin_role);
	if !is_staff && interaction_user.id != ticket.get_opened_by() {
		let response = InteractionResponseDataBuilder::new()
			.content("Only staff or the user who opened this ticket can close it.")
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

	let reason = command_data.options.iter().find_map(|option| {
		if option.name == "reason" {
			if let CommandOptionValue::String(reason) = &option.value {
				Some(reason.clone())
			} else {
				None
			}
		} else {
			None
		}
	});

	// The interaction needs its response before the thread gets archived out from under it.
	let response = InteractionResponseDataBuilder::new()
		.content("Closing this ticket.")
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

	close_ticket(
		http_client,
		&mut db_connection,
		&lifecycle_scheduler,
		&ticket,
		&guild,
		Some(interaction_user.id),
		reason.as_deref(),
	)
	.await?;

	Ok(())
}
