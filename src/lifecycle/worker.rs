// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::scheduler::{LifecycleScheduler, reminder_hours_for_guild, run_at_after};
use crate::discord::utils::tickets::{AUTO_CLOSE_REASON, close_ticket, keep_open_components, reminder_message};
use crate::model::{Guild, LifecycleJob, LifecycleJobKind, Ticket};
use crate::schema::{guilds, lifecycle_jobs, tickets};
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use miette::IntoDiagnostic;
use redis::aio::MultiplexedConnection;
use std::sync::Arc;
use twilight_http::client::Client;

/// How often the worker looks for due jobs.
const WORKER_TICK_SECONDS: u64 = 60;
/// How long a Redis claim on a job is held. Bounds how long a job stalls if the process that
/// claimed it dies before resolving the row.
const CLAIM_TTL_SECONDS: u64 = 6 * 60 * 60;
/// How many times a job may fire and fail before it's marked dead.
const MAX_ATTEMPTS: i32 = 5;

/// Runs the lifecycle worker until the process exits.
///
/// Durability lives in Postgres: anything that was due while no worker ran is picked up on the
/// first tick after startup, so a restart needs no replay step. Failures inside a tick are logged
/// and don't stop the loop.
pub async fn run_worker(
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
	http_client: Arc<Client>,
	redis_client: redis::Client,
	lifecycle_scheduler: LifecycleScheduler,
) {
	let mut ticker = tokio::time::interval(tokio::time::Duration::from_secs(WORKER_TICK_SECONDS));
	loop {
		ticker.tick().await;
		let tick_result = run_due_jobs(&db_connection_pool, &http_client, &redis_client, &lifecycle_scheduler).await;
		if let Err(error) = tick_result {
			tracing::error!(source = ?error, "Failed to run due lifecycle jobs");
		}
	}
}

async fn run_due_jobs(
	db_connection_pool: &Pool<ConnectionManager<PgConnection>>,
	http_client: &Client,
	redis_client: &redis::Client,
	lifecycle_scheduler: &LifecycleScheduler,
) -> miette::Result<()> {
	let due_jobs: Vec<LifecycleJob> = {
		let mut db_connection = db_connection_pool.get().into_diagnostic()?;
		lifecycle_jobs::table
			.filter(lifecycle_jobs::run_at.le(Utc::now()).and(lifecycle_jobs::dead.eq(false)))
			.order(lifecycle_jobs::run_at.asc())
			.load(&mut db_connection)
			.into_diagnostic()?
	};
	if due_jobs.is_empty() {
		return Ok(());
	}

	let mut redis_connection = redis_client.get_multiplexed_async_connection().await.into_diagnostic()?;

	for job in due_jobs {
		// Claims, not timestamps, provide mutual exclusion between processes; a job another
		// process already claimed is simply skipped on this tick.
		let claimed = claim_job(&mut redis_connection, &job).await?;
		if !claimed {
			continue;
		}

		let job_result = execute_job(&job, db_connection_pool, http_client, lifecycle_scheduler).await;
		if let Err(error) = job_result {
			tracing::error!(source = ?error, job_id = %job.id, ticket = %job.ticket, "Lifecycle job failed");
			let mut db_connection = db_connection_pool.get().into_diagnostic()?;
			apply_retry(&mut db_connection, &job)?;
		}
	}

	Ok(())
}

fn claim_key(job: &LifecycleJob) -> String {
	// The attempt count is part of the key so that a retried job isn't blocked by the claim its
	// failed firing left behind.
	format!("gatewarden:lifecycle_claim:{}:{}", job.id, job.attempts)
}

async fn claim_job(redis_connection: &mut MultiplexedConnection, job: &LifecycleJob) -> miette::Result<bool> {
	let claim_result: Option<String> = redis::cmd("SET")
		.arg(claim_key(job))
		.arg("1")
		.arg("NX")
		.arg("EX")
		.arg(CLAIM_TTL_SECONDS)
		.query_async(redis_connection)
		.await
		.into_diagnostic()?;
	Ok(claim_result.is_some())
}

async fn execute_job(
	job: &LifecycleJob,
	db_connection_pool: &Pool<ConnectionManager<PgConnection>>,
	http_client: &Client,
	lifecycle_scheduler: &LifecycleScheduler,
) -> miette::Result<()> {
	let mut db_connection = db_connection_pool.get().into_diagnostic()?;

	let ticket: Option<Ticket> = tickets::table
		.find(&job.ticket)
		.first(&mut db_connection)
		.optional()
		.into_diagnostic()?;
	let Some(ticket) = ticket else {
		return delete_job(&mut db_connection, job);
	};
	if ticket.is_closed() {
		return delete_job(&mut db_connection, job);
	}

	// Settings are re-read at fire time; a guild that disabled the feature after this job was
	// scheduled gets the job dropped instead of fired.
	let guild: Option<Guild> = guilds::table
		.find(ticket.guild)
		.first(&mut db_connection)
		.optional()
		.into_diagnostic()?;
	let Some(guild) = guild else {
		return delete_job(&mut db_connection, job);
	};

	match job.kind {
		LifecycleJobKind::AutoClose => {
			let Some(auto_close_hours) = guild.auto_close_hours else {
				return delete_job(&mut db_connection, job);
			};
			let due_at = run_at_after(ticket.last_activity_at, auto_close_hours);
			if due_at > Utc::now() {
				// The ticket saw activity after this row was scheduled (for example, from
				// another process); push the job to where the activity puts it.
				return push_back_job(&mut db_connection, job, due_at);
			}
			close_ticket(
				http_client,
				&mut db_connection,
				lifecycle_scheduler,
				&ticket,
				&guild,
				None,
				Some(AUTO_CLOSE_REASON),
			)
			.await?;
			// close_ticket cancels every pending job for the ticket, this one included.
		}
		LifecycleJobKind::Reminder => {
			let Some(reminder_hours) = reminder_hours_for_guild(&guild) else {
				return delete_job(&mut db_connection, job);
			};
			let due_at = run_at_after(ticket.last_activity_at, reminder_hours);
			if due_at > Utc::now() {
				return push_back_job(&mut db_connection, job, due_at);
			}
			let auto_close_at = run_at_after(
				ticket.last_activity_at,
				guild.auto_close_hours.unwrap_or(reminder_hours),
			);
			let message_data = reminder_message(auto_close_at).into_diagnostic()?;
			let mut create_message = http_client.create_message(ticket.get_thread());
			create_message = message_data.set_create_message_data(create_message);
			create_message
				.components(&keep_open_components(&ticket.id))
				.await
				.into_diagnostic()?;
			delete_job(&mut db_connection, job)?;
		}
	}

	Ok(())
}

fn delete_job(db_connection: &mut PgConnection, job: &LifecycleJob) -> miette::Result<()> {
	diesel::delete(lifecycle_jobs::table)
		.filter(lifecycle_jobs::id.eq(&job.id))
		.execute(db_connection)
		.into_diagnostic()?;
	Ok(())
}

fn push_back_job(db_connection: &mut PgConnection, job: &LifecycleJob, run_at: DateTime<Utc>) -> miette::Result<()> {
	diesel::update(lifecycle_jobs::table)
		.filter(lifecycle_jobs::id.eq(&job.id))
		.set((lifecycle_jobs::run_at.eq(run_at), lifecycle_jobs::attempts.eq(0)))
		.execute(db_connection)
		.into_diagnostic()?;
	Ok(())
}

fn apply_retry(db_connection: &mut PgConnection, job: &LifecycleJob) -> miette::Result<()> {
	let attempts = job.attempts + 1;
	if attempts >= MAX_ATTEMPTS {
		tracing::warn!(job_id = %job.id, ticket = %job.ticket, "Lifecycle job exhausted its attempts; marking it dead");
		diesel::update(lifecycle_jobs::table)
			.filter(lifecycle_jobs::id.eq(&job.id))
			.set(lifecycle_jobs::dead.eq(true))
			.execute(db_connection)
			.into_diagnostic()?;
	} else {
		let run_at = Utc::now() + retry_backoff(attempts);
		diesel::update(lifecycle_jobs::table)
			.filter(lifecycle_jobs::id.eq(&job.id))
			.set((lifecycle_jobs::run_at.eq(run_at), lifecycle_jobs::attempts.eq(attempts)))
			.execute(db_connection)
			.into_diagnostic()?;
	}
	Ok(())
}

/// How long to wait before the given (1-based) retry attempt fires again.
fn retry_backoff(attempt: i32) -> Duration {
	let doublings = attempt.saturating_sub(1).clamp(0, 16) as u32;
	let seconds = (60u64 << doublings).min(3600);
	Duration::seconds(seconds as i64)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn backoff_doubles_from_a_minute() {
		assert_eq!(retry_backoff(1), Duration::seconds(60));
		assert_eq!(retry_backoff(2), Duration::seconds(120));
		assert_eq!(retry_backoff(3), Duration::seconds(240));
		assert_eq!(retry_backoff(4), Duration::seconds(480));
	}

	#[test]
	fn backoff_caps_at_an_hour() {
		assert_eq!(retry_backoff(7), Duration::seconds(3600));
		assert_eq!(retry_backoff(100), Duration::seconds(3600));
	}

	#[test]
	fn claim_keys_are_distinct_per_attempt() {
		let job = LifecycleJob {
			id: String::from("job1"),
			ticket: String::from("ticket1"),
			kind: LifecycleJobKind::AutoClose,
			run_at: Utc::now(),
			attempts: 0,
			dead: false,
		};
		let retried = LifecycleJob { attempts: 1, ..job_clone(&job) };
		assert_ne!(claim_key(&job), claim_key(&retried));
	}

	fn job_clone(job: &LifecycleJob) -> LifecycleJob {
		LifecycleJob {
			id: job.id.clone(),
			ticket: job.ticket.clone(),
			kind: job.kind,
			run_at: job.run_at,
			attempts: job.attempts,
			dead: job.dead,
		}
	}
}
