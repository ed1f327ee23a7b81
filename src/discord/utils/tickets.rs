// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::lifecycle::LifecycleScheduler;
use crate::model::{Guild, Ticket, database_id_from_discord_id};
use crate::schema::tickets;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use miette::IntoDiagnostic;
use std::future::IntoFuture;
use twilight_http::client::Client;
use twilight_http::request::AuditLogReason;
use twilight_http::request::channel::message::create_message::CreateMessage;
use twilight_mention::fmt::Mention;
use twilight_model::channel::message::AllowedMentions;
use twilight_model::channel::message::component::{ActionRow, Button, ButtonStyle, Component};
use twilight_model::channel::message::embed::Embed;
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;
use twilight_model::util::datetime::Timestamp;
use twilight_util::builder::embed::{EmbedAuthorBuilder, EmbedBuilder};
use twilight_validate::embed::EmbedValidationError;

pub const MAX_TICKET_TITLE_LENGTH: u16 = 60;
pub const AUTO_CLOSE_REASON: &str = "Closed automatically due to inactivity.";

/// Discord limits channel (and therefore thread) names to this many characters.
const MAX_THREAD_NAME_LENGTH: usize = 100;

/// Contains data necessary to post a ticket message
pub struct TicketMessageData {
	pub content: Option<String>,
	pub embeds: Vec<Embed>,
	pub allowed_mentions: AllowedMentions,
}

impl TicketMessageData {
	/// Adds all of the ticket message data to a [CreateMessage] builder
	pub fn set_create_message_data<'a>(&'a self, mut create_message: CreateMessage<'a>) -> CreateMessage<'a> {
		if let Some(content) = &self.content {
			create_message = create_message.content(content);
		}
		create_message
			.embeds(&self.embeds)
			.allowed_mentions(Some(&self.allowed_mentions))
	}
}

/// Generates the message data for the message that opens a ticket thread
pub fn opening_message(
	opener: Id<UserMarker>,
	opener_name: &str,
	message: &str,
	timestamp: Timestamp,
) -> Result<TicketMessageData, EmbedValidationError> {
	let author = EmbedAuthorBuilder::new(opener_name).build();
	let embed = EmbedBuilder::new()
		.description(message)
		.author(author)
		.timestamp(timestamp)
		.validate()?
		.build();
	let mut allowed_mentions = AllowedMentions::default();
	allowed_mentions.users.push(opener);
	Ok(TicketMessageData {
		content: Some(format!(
			"{} Staff will be with you shortly. Anything you can add in the meantime helps.",
			opener.mention()
		)),
		embeds: vec![embed],
		allowed_mentions,
	})
}

/// Generates the message data for the inactivity reminder posted in a ticket thread
pub fn reminder_message(auto_close_at: DateTime<Utc>) -> Result<TicketMessageData, EmbedValidationError> {
	let embed = EmbedBuilder::new()
		.title("Still there?")
		.description(format!(
			"This ticket has had no recent activity and will be closed automatically <t:{}:R>. Send a message or press Keep Open to keep it active.",
			auto_close_at.timestamp()
		))
		.validate()?
		.build();
	Ok(TicketMessageData {
		content: None,
		embeds: vec![embed],
		allowed_mentions: AllowedMentions::default(),
	})
}

/// The components posted with a ticket's opening message
pub fn ticket_open_components(ticket_id: &str) -> Vec<Component> {
	let close_button = Button {
		custom_id: Some(format!("ticket/{}/close", ticket_id)),
		disabled: false,
		emoji: None,
		label: Some(String::from("Close Ticket")),
		style: ButtonStyle::Danger,
		url: None,
		sku_id: None,
	};
	vec![Component::ActionRow(ActionRow {
		components: vec![Component::Button(close_button)],
	})]
}

/// The components posted with an inactivity reminder
pub fn keep_open_components(ticket_id: &str) -> Vec<Component> {
	let keep_open_button = Button {
		custom_id: Some(format!("ticket/{}/keep_open", ticket_id)),
		disabled: false,
		emoji: None,
		label: Some(String::from("Keep Open")),
		style: ButtonStyle::Primary,
		url: None,
		sku_id: None,
	};
	vec![Component::ActionRow(ActionRow {
		components: vec![Component::Button(keep_open_button)],
	})]
}

/// Generates the name for a ticket's thread, truncated to fit Discord's channel name limit
pub fn ticket_thread_name(number: i32, title: &str) -> String {
	let name = format!("[#{}] {}", number, title);
	match name.char_indices().nth(MAX_THREAD_NAME_LENGTH) {
		Some((boundary, _)) => name[..boundary].to_string(),
		None => name,
	}
}

/// Closes a ticket: marks it closed in the database, cancels its pending lifecycle jobs, posts a
/// farewell message, locks and archives the thread, and logs the closure to the guild's log
/// channel if one is set up.
///
/// Callers are responsible for any interaction response of their own; this function only performs
/// the parts of closing shared by the `/close` command, the close button, and the auto-close job.
pub async fn close_ticket(
	http_client: &Client,
	db_connection: &mut PgConnection,
	lifecycle_scheduler: &LifecycleScheduler,
	ticket: &Ticket,
	guild: &Guild,
	closed_by: Option<Id<UserMarker>>,
	reason: Option<&str>,
) -> miette::Result<()> {
	let close_time = Utc::now();
	let db_closed_by = closed_by.map(|user| database_id_from_discord_id(user.get()));
	diesel::update(tickets::table)
		.filter(tickets::id.eq(&ticket.id))
		.set((
			tickets::closed_at.eq(Some(close_time)),
			tickets::closed_by.eq(db_closed_by),
			tickets::close_reason.eq(reason.map(String::from)),
		))
		.execute(db_connection)
		.into_diagnostic()?;
	lifecycle_scheduler.cancel_all(&ticket.id)?;

	let thread_id = ticket.get_thread();

	// The farewell has to land before the thread is archived.
	let farewell = farewell_message(reason).into_diagnostic()?;
	let mut farewell_create = http_client.create_message(thread_id);
	farewell_create = farewell.set_create_message_data(farewell_create);
	farewell_create.await.into_diagnostic()?;

	let thread_update_future = http_client
		.update_thread(thread_id)
		.locked(true)
		.archived(true)
		.reason("Closed ticket")
		.into_future();

	match guild.get_log_channel() {
		Some(log_channel) => {
			let log_embeds = vec![close_log_embed(ticket, closed_by, reason).into_diagnostic()?];
			let log_allowed_mentions = AllowedMentions::default();
			let log_future = http_client
				.create_message(log_channel)
				.embeds(&log_embeds)
				.allowed_mentions(Some(&log_allowed_mentions))
				.into_future();
			let (thread_result, log_result) = tokio::join!(thread_update_future, log_future);
			thread_result.into_diagnostic()?;
			log_result.into_diagnostic()?;
		}
		None => {
			thread_update_future.await.into_diagnostic()?;
		}
	}

	Ok(())
}

fn farewell_message(reason: Option<&str>) -> Result<TicketMessageData, EmbedValidationError> {
	let description = match reason {
		Some(reason) => format!("This ticket has been closed.\n**Reason**: {}", reason),
		None => String::from("This ticket has been closed."),
	};
	let embed = EmbedBuilder::new().description(description).validate()?.build();
	Ok(TicketMessageData {
		content: None,
		embeds: vec![embed],
		allowed_mentions: AllowedMentions::default(),
	})
}

fn close_log_embed(
	ticket: &Ticket,
	closed_by: Option<Id<UserMarker>>,
	reason: Option<&str>,
) -> Result<Embed, EmbedValidationError> {
	let closed_by_text = match closed_by {
		Some(user) => format!("{}", user.mention()),
		None => String::from("the inactivity timer"),
	};
	let mut description = format!(
		"Ticket #{} ({}) with {} was closed by {}.",
		ticket.number,
		ticket.title,
		ticket.get_opened_by().mention(),
		closed_by_text
	);
	if let Some(reason) = reason {
		description = format!("{}\n**Reason**: {}", description, reason);
	}
	let embed = EmbedBuilder::new()
		.title("Ticket closed")
		.description(description)
		.validate()?
		.build();
	Ok(embed)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn thread_name_includes_number_and_title() {
		assert_eq!(ticket_thread_name(7, "Payment issue"), "[#7] Payment issue");
	}

	#[test]
	fn thread_name_fits_discord_limit() {
		let long_title = "x".repeat(200);
		let name = ticket_thread_name(1234, &long_title);
		assert_eq!(name.chars().count(), MAX_THREAD_NAME_LENGTH);
		assert!(name.starts_with("[#1234] "));
	}

	#[test]
	fn open_components_route_to_the_ticket() {
		let components = ticket_open_components("abc123");
		let Component::ActionRow(row) = &components[0] else {
			panic!("expected an action row");
		};
		let Component::Button(button) = &row.components[0] else {
			panic!("expected a button");
		};
		assert_eq!(button.custom_id.as_deref(), Some("ticket/abc123/close"));
	}
}
