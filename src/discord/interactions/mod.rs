// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::lifecycle::LifecycleScheduler;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use miette::bail;
use std::sync::Arc;
use twilight_http::client::Client;
use twilight_model::application::interaction::message_component::MessageComponentInteractionData;
use twilight_model::application::interaction::modal::ModalInteractionData;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;

mod open_ticket;
mod ticket_buttons;

/// Splits a component or modal custom ID into its `/`-separated path parts.
fn custom_id_parts(custom_id: &str) -> Vec<String> {
	custom_id.split('/').map(|part| part.to_string()).collect()
}

pub async fn route_interaction(
	interaction: &InteractionCreate,
	interaction_data: &MessageComponentInteractionData,
	http_client: &Arc<Client>,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
	lifecycle_scheduler: LifecycleScheduler,
) -> miette::Result<()> {
	let custom_id_path = custom_id_parts(&interaction_data.custom_id);

	match custom_id_path.first().map(|part| part.as_str()) {
		Some("open_ticket") => {
			open_ticket::route_open_ticket_interaction(
				interaction,
				&custom_id_path,
				http_client,
				application_id,
				db_connection_pool,
			)
			.await
		}
		Some("ticket") => {
			ticket_buttons::route_ticket_interaction(
				interaction,
				&custom_id_path,
				http_client,
				application_id,
				db_connection_pool,
				lifecycle_scheduler,
			)
			.await
		}
		_ => bail!("Unknown interaction custom ID encountered: {}", interaction_data.custom_id),
	}
}

pub async fn route_modal_submit(
	interaction: &InteractionCreate,
	modal_data: &ModalInteractionData,
	http_client: &Arc<Client>,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
	lifecycle_scheduler: LifecycleScheduler,
) -> miette::Result<()> {
	let custom_id_path = custom_id_parts(&modal_data.custom_id);

	match custom_id_path.first().map(|part| part.as_str()) {
		Some("open_ticket") => {
			open_ticket::route_open_ticket_modal(
				interaction,
				modal_data,
				&custom_id_path,
				http_client,
				application_id,
				db_connection_pool,
				lifecycle_scheduler,
			)
			.await
		}
		_ => bail!("Unknown modal custom ID encountered: {}", modal_data.custom_id),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn custom_id_splits_into_path_parts() {
		assert_eq!(custom_id_parts("open_ticket/abc123/start"), vec!["open_ticket", "abc123", "start"]);
		assert_eq!(custom_id_parts("ticket/xyz/keep_open"), vec!["ticket", "xyz", "keep_open"]);
	}

	#[test]
	fn custom_id_without_separators_is_a_single_part() {
		assert_eq!(custom_id_parts("open_ticket"), vec!["open_ticket"]);
	}
}
