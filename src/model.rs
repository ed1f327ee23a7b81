// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::schema::{guilds, lifecycle_jobs, panels, sessions, ticket_blocked_users, ticket_messages, tickets};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, MessageMarker, RoleMarker, UserMarker};

/// The kind of time-delayed transition a lifecycle job performs when it fires.
#[derive(Clone, Copy, DbEnum, Debug, Eq, PartialEq)]
#[ExistingTypePath = "crate::schema::sql_types::LifecycleJobKind"]
pub enum LifecycleJobKind {
	AutoClose,
	Reminder,
}

/// A guild that's using the bot and its various settings.
#[derive(Insertable, Queryable)]
pub struct Guild {
	/// The ID of the guild in question.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_guild_id].
	pub guild_id: i64,
	/// The ID of the role administrators have.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_admin_role].
	pub admin_role: i64,
	/// The ID of the role all staff have.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_staff_role].
	pub staff_role: i64,
	/// The ID of the channel under which ticket threads are created.
	/// If no ID is entered, the guild doesn't accept new tickets.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_ticket_channel].
	pub ticket_channel: Option<i64>,
	/// The ID of the channel to which ticket lifecycle events are logged.
	/// If the feature is disabled, no ID will be entered.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_log_channel].
	pub log_channel: Option<i64>,
	/// The number of hours a ticket can sit without activity before it's closed automatically.
	/// If the feature is disabled, no value will be entered.
	pub auto_close_hours: Option<i32>,
	/// The number of hours without activity after which the ticket opener is reminded that the
	/// ticket will close. If the feature is disabled, no value will be entered.
	pub reminder_hours: Option<i32>,
	/// The ticket number most recently handed out for this guild.
	pub last_ticket_number: i32,
	/// A host name that maps dashboard requests directly to this guild.
	pub custom_host: Option<String>,
}

impl Guild {
	/// Gets the Discord-facing guild information.
	///
	/// For the raw database representation, use [Self::guild_id].
	pub fn get_guild_id(&self) -> Id<GuildMarker> {
		Id::new(discord_id_from_database_id(self.guild_id))
	}

	/// Gets the role that administrators have.
	///
	/// For the raw database representation, use [Self::admin_role].
	pub fn get_admin_role(&self) -> Id<RoleMarker> {
		Id::new(discord_id_from_database_id(self.admin_role))
	}

	/// Gets the role that all staff have.
	///
	/// For the raw database representation, use [Self::staff_role].
	pub fn get_staff_role(&self) -> Id<RoleMarker> {
		Id::new(discord_id_from_database_id(self.staff_role))
	}

	/// Gets the channel under which ticket threads are created.
	/// If the guild doesn't accept tickets, no channel will be returned.
	///
	/// For the raw database representation, use [Self::ticket_channel].
	pub fn get_ticket_channel(&self) -> Option<Id<ChannelMarker>> {
		self.ticket_channel
			.map(|database_id| Id::new(discord_id_from_database_id(database_id)))
	}

	/// Gets the channel to which ticket lifecycle events are logged.
	/// If the feature is disabled, no channel will be returned.
	///
	/// For the raw database representation, use [Self::log_channel].
	pub fn get_log_channel(&self) -> Option<Id<ChannelMarker>> {
		self.log_channel
			.map(|database_id| Id::new(discord_id_from_database_id(database_id)))
	}
}

/// The database representation of a panel, a posted message with a button from which users open
/// tickets
#[derive(Insertable, Queryable)]
pub struct Panel {
	/// The panel's ID
	pub id: String,
	/// The database ID of the guild that owns the panel.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_guild].
	pub guild: i64,
	/// The channel in which the panel message was posted
	pub channel: i64,
	/// The panel message itself; empty until the message is successfully posted
	pub message: Option<i64>,
	/// The title shown on the panel embed
	pub title: String,
	/// The body text shown on the panel embed
	pub body: String,
	/// The label on the panel's open-ticket button
	pub button_label: String,
}

impl Panel {
	/// Gets the guild that owns the panel.
	///
	/// For the raw database representation, use [Self::guild].
	pub fn get_guild(&self) -> Id<GuildMarker> {
		Id::new(discord_id_from_database_id(self.guild))
	}

	/// Gets the channel in which the panel message was posted.
	///
	/// For the raw database representation, use [Self::channel].
	pub fn get_channel(&self) -> Id<ChannelMarker> {
		Id::new(discord_id_from_database_id(self.channel))
	}
}

/// The database representation of a ticket and its conversation metadata
#[derive(Insertable, Queryable)]
pub struct Ticket {
	/// Ticket's ID
	pub id: String,
	/// The ID of the guild the ticket is with.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_guild].
	pub guild: i64,
	/// The guild-sequential ticket number shown to users
	pub number: i32,
	/// The panel from which the ticket was opened, if it was opened from a panel
	pub panel: Option<String>,
	/// The ID of the user who opened the ticket.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_opened_by].
	pub opened_by: i64,
	/// The ID of the staff member who claimed the ticket, if any.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_claimed_by].
	pub claimed_by: Option<i64>,
	/// The thread in which the ticket conversation happens.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_thread].
	pub thread: i64,
	/// The ticket's title
	pub title: String,
	/// When the ticket was opened
	pub opened_at: DateTime<Utc>,
	/// When the ticket last saw a message; the basis for lifecycle scheduling
	pub last_activity_at: DateTime<Utc>,
	/// When the ticket was closed, if it has been
	pub closed_at: Option<DateTime<Utc>>,
	/// Who closed the ticket; empty for tickets closed automatically
	pub closed_by: Option<i64>,
	/// The reason given when the ticket was closed
	pub close_reason: Option<String>,
}

impl Ticket {
	/// The guild the ticket is with.
	///
	/// For the raw database representation, use [Self::guild].
	pub fn get_guild(&self) -> Id<GuildMarker> {
		Id::new(discord_id_from_database_id(self.guild))
	}

	/// The user who opened the ticket.
	///
	/// For the raw database representation, use [Self::opened_by].
	pub fn get_opened_by(&self) -> Id<UserMarker> {
		Id::new(discord_id_from_database_id(self.opened_by))
	}

	/// The staff member who claimed the ticket, if any.
	///
	/// For the raw database representation, use [Self::claimed_by].
	pub fn get_claimed_by(&self) -> Option<Id<UserMarker>> {
		self.claimed_by
			.map(|database_id| Id::new(discord_id_from_database_id(database_id)))
	}

	/// The thread in which the ticket conversation happens.
	///
	/// For the raw database representation, use [Self::thread].
	pub fn get_thread(&self) -> Id<ChannelMarker> {
		Id::new(discord_id_from_database_id(self.thread))
	}

	pub fn is_closed(&self) -> bool {
		self.closed_at.is_some()
	}
}

/// The database representation of a single message in a ticket's transcript
#[derive(Insertable, Queryable)]
pub struct TicketMessage {
	/// Message's ID
	pub id: String,
	/// The ticket to which the message belongs
	pub ticket: String,
	/// The ID of the user who sent the message.
	///
	/// To get a Discord-facing version of this more easily, use [Self::get_author].
	pub author: i64,
	/// When the message was sent
	pub send_time: DateTime<Utc>,
	/// The message content
	pub body: String,
	/// The Discord ID of the message in the ticket thread
	pub discord_message: i64,
}

impl TicketMessage {
	/// The user who sent the message.
	///
	/// For the raw database representation, use [Self::author].
	pub fn get_author(&self) -> Id<UserMarker> {
		Id::new(discord_id_from_database_id(self.author))
	}

	/// The Discord-facing ID of the message in the ticket thread.
	///
	/// For the raw database representation, use [Self::discord_message].
	pub fn get_discord_message(&self) -> Id<MessageMarker> {
		Id::new(discord_id_from_database_id(self.discord_message))
	}
}

/// A user who isn't allowed to open tickets in a guild
#[derive(Insertable, Queryable)]
pub struct TicketBlockedUser {
	pub guild_id: i64,
	pub user_id: i64,
}

impl TicketBlockedUser {
	pub fn get_user_id(&self) -> Id<UserMarker> {
		Id::new(discord_id_from_database_id(self.user_id))
	}
}

/// A scheduled time-delayed ticket transition. See the lifecycle module for the scheduling and
/// execution semantics.
#[derive(Insertable, Queryable)]
pub struct LifecycleJob {
	/// Job's ID
	pub id: String,
	/// The ticket the job acts on
	pub ticket: String,
	/// What the job does when it fires
	pub kind: LifecycleJobKind,
	/// When the job is due
	pub run_at: DateTime<Utc>,
	/// How many times the job has fired and failed
	pub attempts: i32,
	/// Set once the job has exhausted its attempts; dead jobs are kept for inspection but never
	/// fire again
	pub dead: bool,
}

/// A dashboard login session
#[derive(Insertable, Queryable)]
pub struct Session {
	pub session_id: BigDecimal,
	pub data: String,
	pub expires: DateTime<Utc>,
}

/// Converts an ID used with Discord (unsigned) to an ID for Postgres use (signed)
pub fn database_id_from_discord_id(discord_id: u64) -> i64 {
	discord_id as i64
}

/// Converts an ID retrieved from the database (signed) to an ID for use with Discord (unsigned)
pub fn discord_id_from_database_id(database_id: i64) -> u64 {
	database_id as u64
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn id_conversion_round_trips_large_ids() {
		// Discord snowflakes use the full unsigned range; the database stores them signed.
		let id: u64 = 18_446_744_073_709_551_000;
		assert_eq!(discord_id_from_database_id(database_id_from_discord_id(id)), id);
	}

	#[test]
	fn id_conversion_round_trips_small_ids() {
		let id: u64 = 175_928_847_299_117_063;
		assert_eq!(discord_id_from_database_id(database_id_from_discord_id(id)), id);
	}
}
