// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::utils::tickets::close_ticket;
use crate::lifecycle::LifecycleScheduler;
use crate::model::{Guild, Ticket};
use crate::schema::{guilds, tickets};
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use miette::{IntoDiagnostic, bail};
use std::sync::Arc;
use twilight_http::client::Client;
use twilight_model::channel::message::MessageFlags;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::InteractionResponseDataBuilder;

pub async fn route_ticket_interaction(
	interaction: &InteractionCreate,
	custom_id_path: &[String],
	http_client: &Arc<Client>,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
	lifecycle_scheduler: LifecycleScheduler,
) -> miette::Result<()> {
	let Some(ticket_id) = custom_id_path.get(1) else {
		bail!("Invalid custom ID for ticket button (parts: {:?})", custom_id_path);
	};
	let Some(action) = custom_id_path.get(2) else {
		bail!("Invalid custom ID for ticket button (parts: {:?})", custom_id_path);
	};

	match action.as_str() {
		"close" => {
			close_from_button(
				interaction,
				ticket_id,
				http_client,
				application_id,
				db_connection_pool,
				lifecycle_scheduler,
			)
			.await?
		}
		"keep_open" => {
			keep_open(
				interaction,
				ticket_id,
				http_client,
				application_id,
				db_connection_pool,
				lifecycle_scheduler,
			)
			.await?
		}
		_ => bail!(
			"Invalid action for ticket button: {} (custom ID parts: {:?})",
			action,
			custom_id_path
		),
	}

	Ok(())
}

async fn close_from_button(
	interaction: &InteractionCreate,
	ticket_id: &str,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
	lifecycle_scheduler: LifecycleScheduler,
) -> miette::Result<()> {
	let mut db_connection = db_connection_pool.get().into_diagnostic()?;
	let interaction_client = http_client.interaction(application_id);

	let ticket: Option<Ticket> = tickets::table
		.find(ticket_id)
		.first(&mut db_connection)
		.optional()
		.into_diagnostic()?;
	let Some(ticket) = ticket else {
		bail!("Close button pressed for a ticket that doesn't exist: {}", ticket_id);
	};
	if ticket.is_closed() {
		let response = InteractionResponseDataBuilder::new()
			.content("This ticket is already closed.")
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

	let is_staff = interaction_member.roles.contains(&guild.get_staff_role())
		|| interaction_member.roles.contains(&guild.get_admin_role());
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
		None,
	)
	.await?;

	Ok(())
}

async fn keep_open(
	interaction: &InteractionCreate,
	ticket_id: &str,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
	lifecycle_scheduler: LifecycleScheduler,
) -> miette::Result<()> {
	let mut db_connection = db_connection_pool.get().into_diagnostic()?;
	let interaction_client = http_client.interaction(application_id);

	let ticket: Option<Ticket> = tickets::table
		.find(ticket_id)
		.first(&mut db_connection)
		.optional()
		.into_diagnostic()?;
	let Some(ticket) = ticket else {
		bail!("Keep open button pressed for a ticket that doesn't exist: {}", ticket_id);
	};
	if ticket.is_closed() {
		let response = InteractionResponseDataBuilder::new()
			.content("This ticket is already closed.")
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

	let guild: Guild = guilds::table
		.find(ticket.guild)
		.first(&mut db_connection)
		.into_diagnostic()?;

	let keep_open_time = Utc::now();
	diesel::update(tickets::table)
		.filter(tickets::id.eq(&ticket.id))
		.set(tickets::last_activity_at.eq(keep_open_time))
		.execute(&mut db_connection)
		.into_diagnostic()?;
	lifecycle_scheduler.reschedule_for_activity(&guild, &ticket.id, keep_open_time)?;

	// Replace the reminder's button with a note so it can't be pressed over and over.
	let response = InteractionResponseDataBuilder::new()
		.content("Keeping this ticket open.")
		.components(Vec::new())
		.build();
	let response = InteractionResponse {
		kind: InteractionResponseType::UpdateMessage,
		data: Some(response),
	};
	interaction_client
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;

	Ok(())
}
