// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> miette::Result<()> {
	use gatewarden::config::parse_config;
	use gatewarden::database::{connect_db, run_embedded_migrations};
	use gatewarden::discord::{run_bot, set_up_client};
	use gatewarden::lifecycle::{LifecycleScheduler, run_worker};
	use gatewarden::web::server::run_server_task;
	use miette::IntoDiagnostic;
	use std::sync::Arc;

	tracing_subscriber::fmt().init();

	let config = Arc::new(parse_config("config.kdl").await?);

	let db_connection_pool = connect_db(&config)?;
	run_embedded_migrations(&db_connection_pool)?;

	let http_client = set_up_client(&config);
	let redis_client = redis::Client::open(config.redis.url.as_str()).into_diagnostic()?;
	let lifecycle_scheduler = LifecycleScheduler::new(db_connection_pool.clone());

	let bot_task = run_bot(
		db_connection_pool.clone(),
		Arc::clone(&config),
		Arc::clone(&http_client),
		lifecycle_scheduler.clone(),
	);
	let server_task = run_server_task(
		Arc::clone(&config),
		db_connection_pool.clone(),
		Arc::clone(&http_client),
	);
	let worker_task = run_worker(
		db_connection_pool,
		Arc::clone(&http_client),
		redis_client,
		lifecycle_scheduler,
	);

	let (bot_result, (), ()) = tokio::join!(bot_task, server_task, worker_task);
	bot_result?;

	Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
	// The client side of the dashboard has no binary entry point; see the hydrate function in lib.rs.
}
