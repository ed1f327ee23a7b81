// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::utils::timestamp::datetime_from_timestamp;
use crate::lifecycle::LifecycleScheduler;
use crate::model::{Guild, Ticket, TicketMessage, database_id_from_discord_id};
use crate::schema::{guilds, ticket_messages, tickets};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use miette::IntoDiagnostic;
use twilight_model::channel::message::Message;

/// Records a message sent in a ticket thread and treats it as ticket activity.
///
/// Every recorded message becomes part of the ticket's transcript and pushes the ticket's
/// lifecycle jobs out from the new activity time.
pub async fn handle_message(
	message: &Message,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
	lifecycle_scheduler: LifecycleScheduler,
) -> miette::Result<()> {
	if message.author.bot {
		return Ok(());
	}

	let mut db_connection = db_connection_pool.get().into_diagnostic()?;

	let db_channel_id = database_id_from_discord_id(message.channel_id.get());
	let ticket: Option<Ticket> = tickets::table
		.filter(tickets::thread.eq(db_channel_id).and(tickets::closed_at.is_null()))
		.first(&mut db_connection)
		.optional()
		.into_diagnostic()?;
	let Some(ticket) = ticket else {
		return Ok(());
	};

	let Some(message_time) = datetime_from_timestamp(&message.timestamp) else {
		return Ok(());
	};

	let author = database_id_from_discord_id(message.author.id.get());
	let discord_message = database_id_from_discord_id(message.id.get());
	let new_message = TicketMessage {
		id: cuid2::create_id(),
		ticket: ticket.id.clone(),
		author,
		send_time: message_time,
		body: message.content.clone(),
		discord_message,
	};
	diesel::insert_into(ticket_messages::table)
		.values(new_message)
		.execute(&mut db_connection)
		.into_diagnostic()?;

	diesel::update(tickets::table)
		.filter(tickets::id.eq(&ticket.id))
		.set(tickets::last_activity_at.eq(message_time))
		.execute(&mut db_connection)
		.into_diagnostic()?;

	let guild: Guild = guilds::table
		.find(ticket.guild)
		.first(&mut db_connection)
		.into_diagnostic()?;
	lifecycle_scheduler.reschedule_for_activity(&guild, &ticket.id, message_time)?;

	Ok(())
}
