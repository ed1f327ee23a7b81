// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Guards run before a command handler executes.
//!
//! Each command declares the preconditions it needs; the command router evaluates them against a
//! context extracted from the interaction and refuses the command (with an ephemeral response)
//! before the handler runs. Evaluation itself is pure so the rules can be tested without a
//! gateway connection.

use crate::discord::utils::responses::NOT_SET_UP_FOR_GUILD;
use crate::model::{Guild, Ticket, database_id_from_discord_id};
use crate::schema::{guilds, tickets};
use diesel::prelude::*;
use miette::IntoDiagnostic;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::RoleMarker;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Precondition {
	/// The interaction must come from a guild.
	GuildOnly,
	/// The invoking member must hold the guild's staff or admin role. Implies the guild is
	/// registered.
	StaffOnly,
	/// The invoking member must hold the guild's admin role. Implies the guild is registered.
	AdminOnly,
	/// The invoking channel must be an open ticket's thread.
	InTicketThread,
}

/// The facts about an interaction that preconditions are evaluated against
#[derive(Debug, Default)]
pub struct PreconditionContext {
	pub in_guild: bool,
	pub guild_registered: bool,
	pub member_roles: Vec<Id<RoleMarker>>,
	pub admin_role: Option<Id<RoleMarker>>,
	pub staff_role: Option<Id<RoleMarker>>,
	pub in_ticket_thread: bool,
}

impl PreconditionContext {
	fn has_role(&self, role: Option<Id<RoleMarker>>) -> bool {
		role.is_some_and(|role| self.member_roles.contains(&role))
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PreconditionFailure {
	OutsideGuild,
	GuildNotRegistered,
	NotStaff,
	NotAdmin,
	NotTicketThread,
}

impl PreconditionFailure {
	/// The message shown (ephemerally) to the user whose command was refused
	pub fn user_message(&self) -> &'static str {
		match self {
			Self::OutsideGuild => "This command can only be used in a server.",
			Self::GuildNotRegistered => NOT_SET_UP_FOR_GUILD,
			Self::NotStaff => "Only staff members can use this command.",
			Self::NotAdmin => "Only administrators can use this command.",
			Self::NotTicketThread => "This command is only useful in a ticket thread.",
		}
	}
}

/// Evaluates a command's precondition list in order, failing on the first unmet guard.
pub fn evaluate(preconditions: &[Precondition], context: &PreconditionContext) -> Result<(), PreconditionFailure> {
	for precondition in preconditions {
		match precondition {
			Precondition::GuildOnly => {
				if !context.in_guild {
					return Err(PreconditionFailure::OutsideGuild);
				}
			}
			Precondition::StaffOnly => {
				if !context.guild_registered {
					return Err(PreconditionFailure::GuildNotRegistered);
				}
				if !context.has_role(context.staff_role) && !context.has_role(context.admin_role) {
					return Err(PreconditionFailure::NotStaff);
				}
			}
			Precondition::AdminOnly => {
				if !context.guild_registered {
					return Err(PreconditionFailure::GuildNotRegistered);
				}
				if !context.has_role(context.admin_role) {
					return Err(PreconditionFailure::NotAdmin);
				}
			}
			Precondition::InTicketThread => {
				if !context.in_ticket_thread {
					return Err(PreconditionFailure::NotTicketThread);
				}
			}
		}
	}
	Ok(())
}

/// Extracts the precondition context for an interaction.
pub fn context_for_interaction(
	interaction: &InteractionCreate,
	db_connection: &mut PgConnection,
) -> miette::Result<PreconditionContext> {
	let mut context = PreconditionContext::default();

	let Some(guild_id) = interaction.guild_id else {
		return Ok(context);
	};
	context.in_guild = true;

	let db_guild_id = database_id_from_discord_id(guild_id.get());
	let guild: Option<Guild> = guilds::table
		.find(db_guild_id)
		.first(db_connection)
		.optional()
		.into_diagnostic()?;
	if let Some(guild) = &guild {
		context.guild_registered = true;
		context.admin_role = Some(guild.get_admin_role());
		context.staff_role = Some(guild.get_staff_role());
	}

	if let Some(member) = &interaction.member {
		context.member_roles = member.roles.clone();
	}

	if let Some(channel) = &interaction.channel {
		let db_channel_id = database_id_from_discord_id(channel.id.get());
		let ticket: Option<Ticket> = tickets::table
			.filter(tickets::thread.eq(db_channel_id).and(tickets::closed_at.is_null()))
			.first(db_connection)
			.optional()
			.into_diagnostic()?;
		context.in_ticket_thread = ticket.is_some();
	}

	Ok(context)
}

#[cfg(test)]
mod tests {
	use super::*;

	const ADMIN_ROLE: u64 = 100;
	const STAFF_ROLE: u64 = 200;
	const OTHER_ROLE: u64 = 300;

	fn registered_context(member_roles: &[u64]) -> PreconditionContext {
		PreconditionContext {
			in_guild: true,
			guild_registered: true,
			member_roles: member_roles.iter().map(|id| Id::new(*id)).collect(),
			admin_role: Some(Id::new(ADMIN_ROLE)),
			staff_role: Some(Id::new(STAFF_ROLE)),
			in_ticket_thread: false,
		}
	}

	#[test]
	fn guild_only_rejects_direct_messages() {
		let context = PreconditionContext::default();
		assert_eq!(
			evaluate(&[Precondition::GuildOnly], &context),
			Err(PreconditionFailure::OutsideGuild)
		);
	}

	#[test]
	fn staff_only_accepts_staff_and_admins() {
		assert_eq!(
			evaluate(&[Precondition::StaffOnly], &registered_context(&[STAFF_ROLE])),
			Ok(())
		);
		assert_eq!(
			evaluate(&[Precondition::StaffOnly], &registered_context(&[ADMIN_ROLE])),
			Ok(())
		);
		assert_eq!(
			evaluate(&[Precondition::StaffOnly], &registered_context(&[OTHER_ROLE])),
			Err(PreconditionFailure::NotStaff)
		);
	}

	#[test]
	fn admin_only_rejects_staff() {
		assert_eq!(
			evaluate(&[Precondition::AdminOnly], &registered_context(&[STAFF_ROLE])),
			Err(PreconditionFailure::NotAdmin)
		);
		assert_eq!(
			evaluate(&[Precondition::AdminOnly], &registered_context(&[ADMIN_ROLE])),
			Ok(())
		);
	}

	#[test]
	fn role_checks_require_a_registered_guild() {
		let mut context = registered_context(&[ADMIN_ROLE]);
		context.guild_registered = false;
		context.admin_role = None;
		context.staff_role = None;
		assert_eq!(
			evaluate(&[Precondition::StaffOnly], &context),
			Err(PreconditionFailure::GuildNotRegistered)
		);
		assert_eq!(
			evaluate(&[Precondition::AdminOnly], &context),
			Err(PreconditionFailure::GuildNotRegistered)
		);
	}

	#[test]
	fn first_failure_wins() {
		let context = registered_context(&[STAFF_ROLE]);
		let preconditions = [
			Precondition::GuildOnly,
			Precondition::StaffOnly,
			Precondition::InTicketThread,
		];
		assert_eq!(
			evaluate(&preconditions, &context),
			Err(PreconditionFailure::NotTicketThread)
		);
	}

	#[test]
	fn ticket_thread_check_passes_inside_ticket() {
		let mut context = registered_context(&[STAFF_ROLE]);
		context.in_ticket_thread = true;
		assert_eq!(evaluate(&[Precondition::InTicketThread], &context), Ok(()));
	}
}
