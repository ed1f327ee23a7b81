// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::web::pages::utils::{GuildParam, make_ticket_url};
use chrono::{DateTime, Utc};
use leptos::prelude::*;
use leptos_router::hooks::use_params;
use serde::{Deserialize, Serialize};

#[component]
pub fn OpenTickets() -> impl IntoView {
	let params = use_params::<GuildParam>();
	let guild_id = params.read().as_ref().ok().and_then(|params| params.guild);

	let open_tickets = OnceResource::new(get_open_tickets(guild_id));

	view! {
		<Transition fallback=|| view! { <div class="staff_ticket_list_loading">"Loading tickets..."</div> }>
			{
				move || match &open_tickets.read().as_ref().and_then(|tickets| tickets.as_ref().ok()) {
					Some(ticket_data) if !ticket_data.is_empty() => {
						view! {
							<table class="staff_ticket_list">
								<thead>
									<tr>
										<th>"Ticket"</th>
										<th>"Topic"</th>
										<th>"Opened By"</th>
										<th>"Claimed By"</th>
										<th>"Last Activity"</th>
									</tr>
								</thead>
								<tbody>
									{
										ticket_data.iter().map(|ticket|
											view! {
												<tr>
													<td>
														{format!("#{}", ticket.number)}
													</td>
													<td>
														<a href={make_ticket_url(guild_id, &ticket.id)}>
															{ticket.title.clone()}
														</a>
													</td>
													<td>
														{ticket.opened_by_name.clone()}
													</td>
													<td>
														{ticket.claimed_by_name.clone().unwrap_or_else(|| String::from("—"))}
													</td>
													<td>
														{ticket.last_activity_at.to_rfc3339()}
													</td>
												</tr>
											}.into_any()
										).collect::<Vec<_>>()
									}
								</tbody>
							</table>
						}.into_any()
					}
					_ => view! {
						<div id="staff_ticket_list_empty">
							"No open tickets"
						</div>
					}.into_any()
				}
			}
		</Transition>
	}
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StaffTicketMetadata {
	pub id: String,
	pub number: i32,
	pub title: String,
	pub opened_by_name: String,
	pub claimed_by_name: Option<String>,
	pub last_activity_at: DateTime<Utc>,
}

#[server]
async fn get_open_tickets(guild_id: Option<u64>) -> Result<Vec<StaffTicketMetadata>, ServerFnError> {
	use crate::model::{Guild, Ticket, database_id_from_discord_id};
	use crate::schema::{guilds, tickets};
	use crate::web::pages::server_utils::{get_guild_id_from_request, get_user_id_from_request};
	use crate::web::state::AppState;
	use diesel::prelude::*;
	use std::collections::HashMap;
	use std::collections::hash_map::Entry;
	use twilight_model::id::Id;
	use twilight_model::id::marker::UserMarker;

	let guild_id = get_guild_id_from_request(guild_id).await?;
	let user_id = get_user_id_from_request().await?;

	let (Some(guild_id), Some(user_id)) = (guild_id, user_id) else {
		return Err(ServerFnError::ServerError(String::from(
			"No guild found and/or user not logged in",
		)));
	};

	async fn resolve_name(
		state: &AppState,
		usernames_cache: &mut HashMap<Id<UserMarker>, String>,
		user: Id<UserMarker>,
	) -> Result<String, ServerFnError> {
		match usernames_cache.entry(user) {
			Entry::Occupied(entry) => Ok(entry.get().clone()),
			Entry::Vacant(entry) => {
				let name = match state.discord_client.user(user).await {
					Ok(response) => response.model().await?.name,
					Err(_) => format!("<{}>", user.get()),
				};
				entry.insert(name.clone());
				Ok(name)
			}
		}
	}

	let state: AppState = expect_context();
	let mut db_connection = state.db_connection_pool.get()?;

	let db_guild_id = database_id_from_discord_id(guild_id.get());

	let guild: Guild = guilds::table.find(db_guild_id).first(&mut db_connection)?;

	let member = state
		.discord_client
		.guild_member(guild_id, user_id)
		.await?
		.model()
		.await?;
	if !member.roles.contains(&guild.get_admin_role()) && !member.roles.contains(&guild.get_staff_role()) {
		return Ok(Vec::new());
	}

	let all_tickets: Vec<Ticket> = tickets::table
		.filter(tickets::guild.eq(db_guild_id).and(tickets::closed_at.is_null()))
		.order(tickets::last_activity_at.desc())
		.load(&mut db_connection)?;

	let mut usernames: HashMap<Id<UserMarker>, String> = HashMap::new();
	let mut tickets: Vec<StaffTicketMetadata> = Vec::with_capacity(all_tickets.len());
	for ticket in all_tickets {
		let opened_by_name = resolve_name(&state, &mut usernames, ticket.get_opened_by()).await?;
		let claimed_by_name = match ticket.get_claimed_by() {
			Some(claimer) => Some(resolve_name(&state, &mut usernames, claimer).await?),
			None => None,
		};

		tickets.push(StaffTicketMetadata {
			id: ticket.id,
			number: ticket.number,
			title: ticket.title,
			opened_by_name,
			claimed_by_name,
			last_activity_at: ticket.last_activity_at,
		});
	}

	Ok(tickets)
}
