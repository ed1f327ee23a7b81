// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::model::{Guild, LifecycleJob, LifecycleJobKind};
use crate::schema::lifecycle_jobs;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error as DbError;
use miette::IntoDiagnostic;

/// Scheduling interface over the `lifecycle_jobs` table.
///
/// At most one live job exists per (ticket, kind) pair; scheduling a pair again replaces the
/// previous row. All of the mutating operations here are also safe to call for tickets with no
/// pending jobs.
#[derive(Clone)]
pub struct LifecycleScheduler {
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
}

impl LifecycleScheduler {
	pub fn new(db_connection_pool: Pool<ConnectionManager<PgConnection>>) -> Self {
		Self { db_connection_pool }
	}

	/// Schedules a job of the given kind for a ticket, replacing any job of that kind already
	/// pending for it.
	pub fn schedule(&self, ticket_id: &str, kind: LifecycleJobKind, run_at: DateTime<Utc>) -> miette::Result<()> {
		let mut db_connection = self.db_connection_pool.get().into_diagnostic()?;
		let new_job = LifecycleJob {
			id: cuid2::create_id(),
			ticket: ticket_id.to_string(),
			kind,
			run_at,
			attempts: 0,
			dead: false,
		};
		db_connection
			.transaction(|db_connection| {
				diesel::delete(lifecycle_jobs::table)
					.filter(
						lifecycle_jobs::ticket
							.eq(ticket_id)
							.and(lifecycle_jobs::kind.eq(kind))
							.and(lifecycle_jobs::dead.eq(false)),
					)
					.execute(db_connection)?;
				diesel::insert_into(lifecycle_jobs::table)
					.values(new_job)
					.execute(db_connection)?;
				Ok::<(), DbError>(())
			})
			.into_diagnostic()?;
		Ok(())
	}

	/// Recomputes a ticket's pending jobs from its guild's settings and the ticket's latest
	/// activity time. Called whenever a ticket sees a new message.
	///
	/// A kind whose feature is disabled for the guild gets its pending job canceled instead.
	pub fn reschedule_for_activity(
		&self,
		guild: &Guild,
		ticket_id: &str,
		last_activity: DateTime<Utc>,
	) -> miette::Result<()> {
		match guild.auto_close_hours {
			Some(hours) => self.schedule(ticket_id, LifecycleJobKind::AutoClose, run_at_after(last_activity, hours))?,
			None => self.cancel(ticket_id, LifecycleJobKind::AutoClose)?,
		}
		match reminder_hours_for_guild(guild) {
			Some(hours) => self.schedule(ticket_id, LifecycleJobKind::Reminder, run_at_after(last_activity, hours))?,
			None => self.cancel(ticket_id, LifecycleJobKind::Reminder)?,
		}
		Ok(())
	}

	/// Cancels the pending job of one kind for a ticket, if there is one.
	pub fn cancel(&self, ticket_id: &str, kind: LifecycleJobKind) -> miette::Result<()> {
		let mut db_connection = self.db_connection_pool.get().into_diagnostic()?;
		diesel::delete(lifecycle_jobs::table)
			.filter(
				lifecycle_jobs::ticket
					.eq(ticket_id)
					.and(lifecycle_jobs::kind.eq(kind))
					.and(lifecycle_jobs::dead.eq(false)),
			)
			.execute(&mut db_connection)
			.into_diagnostic()?;
		Ok(())
	}

	/// Cancels all pending jobs for a ticket. Used when a ticket closes.
	pub fn cancel_all(&self, ticket_id: &str) -> miette::Result<()> {
		let mut db_connection = self.db_connection_pool.get().into_diagnostic()?;
		diesel::delete(lifecycle_jobs::table)
			.filter(lifecycle_jobs::ticket.eq(ticket_id).and(lifecycle_jobs::dead.eq(false)))
			.execute(&mut db_connection)
			.into_diagnostic()?;
		Ok(())
	}
}

/// Computes when a job scheduled `hours` after the given activity time is due.
pub fn run_at_after(last_activity: DateTime<Utc>, hours: i32) -> DateTime<Utc> {
	last_activity + Duration::hours(hours.into())
}

/// The effective reminder delay for a guild.
///
/// Reminders only make sense while auto-close is enabled and the reminder would land before the
/// close; a reminder configured at or past the auto-close delay is treated as disabled.
pub fn reminder_hours_for_guild(guild: &Guild) -> Option<i32> {
	let reminder_hours = guild.reminder_hours?;
	let auto_close_hours = guild.auto_close_hours?;
	if reminder_hours < auto_close_hours {
		Some(reminder_hours)
	} else {
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn guild_with_hours(auto_close_hours: Option<i32>, reminder_hours: Option<i32>) -> Guild {
		Guild {
			guild_id: 1,
			admin_role: 2,
			staff_role: 3,
			ticket_channel: Some(4),
			log_channel: None,
			auto_close_hours,
			reminder_hours,
			last_ticket_number: 0,
			custom_host: None,
		}
	}

	#[test]
	fn run_at_lands_after_activity() {
		let activity = Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap();
		let expected = Utc.with_ymd_and_hms(2025, 5, 12, 12, 0, 0).unwrap();
		assert_eq!(run_at_after(activity, 48), expected);
	}

	#[test]
	fn reminder_requires_auto_close() {
		let guild = guild_with_hours(None, Some(24));
		assert_eq!(reminder_hours_for_guild(&guild), None);
	}

	#[test]
	fn reminder_must_precede_auto_close() {
		assert_eq!(reminder_hours_for_guild(&guild_with_hours(Some(48), Some(24))), Some(24));
		assert_eq!(reminder_hours_for_guild(&guild_with_hours(Some(24), Some(24))), None);
		assert_eq!(reminder_hours_for_guild(&guild_with_hours(Some(24), Some(48))), None);
	}

	#[test]
	fn reminder_disabled_when_unset() {
		let guild = guild_with_hours(Some(48), None);
		assert_eq!(reminder_hours_for_guild(&guild), None);
	}
}
