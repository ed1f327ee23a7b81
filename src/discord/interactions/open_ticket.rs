// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::utils::responses::NOT_SET_UP_FOR_GUILD;
use crate::discord::utils::tickets::{
	MAX_TICKET_TITLE_LENGTH, opening_message, ticket_open_components, ticket_thread_name,
};
use crate::discord::utils::timestamp::timestamp_from_id;
use crate::lifecycle::LifecycleScheduler;
use crate::model::{Guild, Panel, Ticket, TicketBlockedUser, TicketMessage, database_id_from_discord_id};
use crate::schema::{guilds, panels, ticket_blocked_users, ticket_messages, tickets};
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error as DbError;
use miette::{IntoDiagnostic, bail};
use std::sync::Arc;
use twilight_http::client::Client;
use twilight_model::application::interaction::modal::ModalInteractionData;
use twilight_model::channel::ChannelType;
use twilight_model::channel::message::MessageFlags;
use twilight_model::channel::message::component::{ActionRow, Component, TextInput, TextInputStyle};
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::InteractionResponseDataBuilder;

pub async fn route_open_ticket_interaction(
	interaction: &InteractionCreate,
	custom_id_path: &[String],
	http_client: &Arc<Client>,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
) -> miette::Result<()> {
	let Some(panel_id) = custom_id_path.get(1) else {
		bail!("Invalid custom ID for ticket opening (parts: {:?})", custom_id_path);
	};
	let Some(action) = custom_id_path.get(2) else {
		bail!("Invalid custom ID for ticket opening (parts: {:?})", custom_id_path);
	};

	match action.as_str() {
		"start" => start_ticket(interaction, panel_id, http_client, application_id, db_connection_pool).await?,
		_ => bail!(
			"Invalid action for ticket opening: {} (custom ID parts: {:?})",
			action,
			custom_id_path
		),
	}

	Ok(())
}

pub async fn route_open_ticket_modal(
	interaction: &InteractionCreate,
	modal_data: &ModalInteractionData,
	custom_id_path: &[String],
	http_client: &Arc<Client>,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
	lifecycle_scheduler: LifecycleScheduler,
) -> miette::Result<()> {
	let Some(panel_id) = custom_id_path.get(1) else {
		bail!("Invalid custom ID for ticket opening (parts: {:?})", custom_id_path);
	};
	let Some(action) = custom_id_path.get(2) else {
		bail!("Invalid custom ID for ticket opening (parts: {:?})", custom_id_path);
	};

	if action == "submit" {
		handle_submit_modal_data(
			interaction,
			modal_data,
			panel_id,
			http_client,
			application_id,
			db_connection_pool,
			lifecycle_scheduler,
		)
		.await?;
	} else {
		bail!(
			"Invalid action for ticket opening: {} (custom ID parts: {:?})",
			action,
			custom_id_path
		);
	}

	Ok(())
}

/// Checks whether the pressing user may open a ticket on this guild right now. On failure, sends
/// the refusal as the interaction response and returns `None`.
async fn guild_accepting_tickets_from_user(
	interaction: &InteractionCreate,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	db_connection: &mut PgConnection,
) -> miette::Result<Option<Guild>> {
	let interaction_client = http_client.interaction(application_id);

	let Some(guild_id) = interaction.guild_id else {
		bail!("Open ticket button used outside of a guild");
	};
	let db_guild_id = database_id_from_discord_id(guild_id.get());

	let Some(interaction_member) = &interaction.member else {
		bail!("Interaction isn't from a user");
	};
	let Some(interaction_user) = &interaction_member.user else {
		bail!("Interaction member is not a user");
	};
	let db_user_id = database_id_from_discord_id(interaction_user.id.get());

	let block: Option<TicketBlockedUser> = ticket_blocked_users::table
		.find((db_guild_id, db_user_id))
		.first(db_connection)
		.optional()
		.into_diagnostic()?;
	if block.is_some() {
		let response = InteractionResponseDataBuilder::new()
			.content("You may not open tickets on this server.")
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
		return Ok(None);
	}

	let guild: Option<Guild> = guilds::table
		.find(db_guild_id)
		.first(db_connection)
		.optional()
		.into_diagnostic()?;
	let Some(guild) = guild else {
		let response = InteractionResponseDataBuilder::new()
			.content(NOT_SET_UP_FOR_GUILD)
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
		return Ok(None);
	};

	if guild.ticket_channel.is_none() {
		let response = InteractionResponseDataBuilder::new()
			.content("This server isn't accepting new tickets right now.")
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
		return Ok(None);
	}

	Ok(Some(guild))
}

async fn start_ticket(
	interaction: &InteractionCreate,
	panel_id: &str,
	http_client: &Arc<Client>,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
) -> miette::Result<()> {
	let mut db_connection = db_connection_pool.get().into_diagnostic()?;
	let interaction_client = http_client.interaction(application_id);

	let panel: Option<Panel> = panels::table
		.find(panel_id)
		.first(&mut db_connection)
		.optional()
		.into_diagnostic()?;
	if panel.is_none() {
		let response = InteractionResponseDataBuilder::new()
			.content("This panel is no longer active.")
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

	let guild =
		guild_accepting_tickets_from_user(interaction, http_client, application_id, &mut db_connection).await?;
	if guild.is_none() {
		return Ok(());
	}

	let topic_input = Component::TextInput(TextInput {
		custom_id: String::from("topic"),
		label: String::from("Topic"),
		max_length: Some(MAX_TICKET_TITLE_LENGTH),
		min_length: None,
		placeholder: Some(String::from("What is this ticket about?")),
		required: Some(true),
		style: TextInputStyle::Short,
		value: None,
	});
	let topic_row = Component::ActionRow(ActionRow {
		components: vec![topic_input],
	});
	let message_input = Component::TextInput(TextInput {
		custom_id: String::from("message"),
		label: String::from("Message"),
		max_length: None,
		min_length: None,
		placeholder: None,
		required: Some(true),
		style: TextInputStyle::Paragraph,
		value: None,
	});
	let message_row = Component::ActionRow(ActionRow {
		components: vec![message_input],
	});

	let modal_id = format!("open_ticket/{}/submit", panel_id);
	let response = InteractionResponseDataBuilder::new()
		.custom_id(modal_id)
		.title("Open Ticket")
		.components(vec![topic_row, message_row])
		.build();
	let response = InteractionResponse {
		kind: InteractionResponseType::Modal,
		data: Some(response),
	};
	interaction_client
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;

	Ok(())
}

async fn handle_submit_modal_data(
	interaction: &InteractionCreate,
	modal_data: &ModalInteractionData,
	panel_id: &str,
	http_client: &Arc<Client>,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
	lifecycle_scheduler: LifecycleScheduler,
) -> miette::Result<()> {
	let mut topic: Option<String> = None;
	let mut message: Option<String> = None;
	for row in modal_data.components.iter() {
		for component in row.components.iter() {
			match component.custom_id.as_str() {
				"topic" => topic = component.value.clone(),
				"message" => message = component.value.clone(),
				_ => (),
			}
		}
	}

	let mut db_connection = db_connection_pool.get().into_diagnostic()?;
	let interaction_client = http_client.interaction(application_id);

	let (Some(topic), Some(message)) = (topic, message) else {
		let response = InteractionResponseDataBuilder::new()
			.content("Ticket not opened: missing required data.")
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

	let max_ticket_title_len: usize = MAX_TICKET_TITLE_LENGTH.into();
	if topic.len() > max_ticket_title_len {
		let response = InteractionResponseDataBuilder::new()
			.content("Your ticket couldn't be opened, as the topic is too long.")
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

	// The open conditions are checked again at submit time; the modal can sit open for a while.
	let guild =
		guild_accepting_tickets_from_user(interaction, http_client, application_id, &mut db_connection).await?;
	let Some(guild) = guild else {
		return Ok(());
	};
	let Some(ticket_channel) = guild.get_ticket_channel() else {
		bail!("Guild ticket channel disappeared after the accepting-tickets check");
	};

	let Some(interaction_member) = &interaction.member else {
		bail!("Interaction isn't from a user");
	};
	let Some(interaction_user) = &interaction_member.user else {
		bail!("Interaction member is not a user");
	};

	let ticket_number: i32 = diesel::update(guilds::table)
		.filter(guilds::guild_id.eq(guild.guild_id))
		.set(guilds::last_ticket_number.eq(guilds::last_ticket_number + 1))
		.returning(guilds::last_ticket_number)
		.get_result(&mut db_connection)
		.into_diagnostic()?;

	let thread_name = ticket_thread_name(ticket_number, &topic);
	let ticket_thread_response = http_client
		.create_thread(ticket_channel, &thread_name, ChannelType::PrivateThread)
		.invitable(false)
		.await;
	let ticket_thread_response = match ticket_thread_response {
		Ok(response) => response,
		Err(error) => {
			tracing::error!(source = ?error, "Failed to create a ticket thread");
			let response = InteractionResponseDataBuilder::new()
				.content("Your ticket couldn't be opened. Try again in a moment.")
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
	};
	let ticket_thread = ticket_thread_response.model().await.into_diagnostic()?;

	http_client
		.add_thread_member(ticket_thread.id, interaction_user.id)
		.await
		.into_diagnostic()?;

	let ticket_id = cuid2::create_id();
	let message_sent_timestamp = timestamp_from_id(interaction.id).into_diagnostic()?;
	let opening_message_data = opening_message(
		interaction_user.id,
		&interaction_user.name,
		&message,
		message_sent_timestamp,
	)
	.into_diagnostic()?;
	let open_components = ticket_open_components(&ticket_id);
	let mut opening_create_message = http_client.create_message(ticket_thread.id);
	opening_create_message = opening_message_data.set_create_message_data(opening_create_message);
	let opening_message_response = opening_create_message
		.components(&open_components)
		.await
		.into_diagnostic()?;
	let posted_opening_message = opening_message_response.model().await.into_diagnostic()?;

	let open_time = Utc::now();
	let db_user_id = database_id_from_discord_id(interaction_user.id.get());
	let new_ticket = Ticket {
		id: ticket_id.clone(),
		guild: guild.guild_id,
		number: ticket_number,
		panel: Some(panel_id.to_string()),
		opened_by: db_user_id,
		claimed_by: None,
		thread: database_id_from_discord_id(ticket_thread.id.get()),
		title: topic,
		opened_at: open_time,
		last_activity_at: open_time,
		closed_at: None,
		closed_by: None,
		close_reason: None,
	};
	let new_ticket_message = TicketMessage {
		id: cuid2::create_id(),
		ticket: ticket_id.clone(),
		author: db_user_id,
		send_time: open_time,
		body: message,
		discord_message: database_id_from_discord_id(posted_opening_message.id.get()),
	};

	db_connection
		.transaction(|db_connection| {
			diesel::insert_into(tickets::table)
				.values(new_ticket)
				.execute(db_connection)?;
			diesel::insert_into(ticket_messages::table)
				.values(new_ticket_message)
				.execute(db_connection)?;
			Ok::<(), DbError>(())
		})
		.into_diagnostic()?;

	lifecycle_scheduler.reschedule_for_activity(&guild, &ticket_id, open_time)?;

	let response = InteractionResponseDataBuilder::new()
		.content(format!("Ticket #{} opened: <#{}>", ticket_number, ticket_thread.id.get()))
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
