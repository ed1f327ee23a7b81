// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::web::pages::errors::not_found::NotFound;
use crate::web::pages::utils::{TicketData, TicketParams};
use leptos::prelude::*;
use leptos_router::hooks::use_params;

#[component]
pub fn TicketView() -> impl IntoView {
	let params = use_params::<TicketParams>();
	let (guild_id, ticket_id) = {
		let params = params.read();
		let params = params.as_ref().ok();
		(
			params.and_then(|params| params.guild),
			params.and_then(|params| params.ticket.clone()),
		)
	};

	let ticket_data = OnceResource::new(get_ticket_data(guild_id, ticket_id));

	view! {
		<Transition fallback=|| view! { <div class="ticket_loading">"Loading ticket..."</div> }>
			{
				move || match &ticket_data.read().as_ref().map(|data| data.as_ref().ok().cloned().flatten()) {
					Some(Some(ticket)) => {
						let messages = ticket.messages.clone();
						view! {
							<div class="ticket_view">
								<h2>
									{format!("#{} {}", ticket.number, ticket.title)}
									{ticket.closed.then(|| view! { <span class="ticket_closed_tag">" (closed)"</span> })}
								</h2>
								<ul class="ticket_messages">
									{
										messages.iter().map(|message|
											view! {
												<li class="ticket_message">
													<div class="ticket_message_meta">
														<span class="ticket_message_author">{message.author_name.clone()}</span>
														<span class="ticket_message_time">{message.send_time.to_rfc3339()}</span>
													</div>
													<div class="ticket_message_body">{message.body.clone()}</div>
												</li>
											}.into_any()
										).collect::<Vec<_>>()
									}
								</ul>
							</div>
						}.into_any()
					}
					_ => view! { <NotFound /> }.into_any()
				}
			}
		</Transition>
	}
}

/// Gets a ticket and its transcript for display.
///
/// Only the ticket's opener and staff can see a ticket; anyone else gets the same nothing a
/// nonexistent ticket produces.
#[server]
async fn get_ticket_data(guild_id: Option<u64>, ticket_id: Option<String>) -> Result<Option<TicketData>, ServerFnError> {
	use crate::model::{Guild, Ticket, TicketMessage, database_id_from_discord_id};
	use crate::schema::{guilds, ticket_messages, tickets};
	use crate::web::pages::server_utils::{get_guild_id_from_request, get_user_id_from_request};
	use crate::web::pages::utils::TicketMessageData;
	use crate::web::state::AppState;
	use diesel::prelude::*;
	use std::collections::HashMap;
	use std::collections::hash_map::Entry;
	use twilight_model::id::Id;
	use twilight_model::id::marker::UserMarker;

	let guild_id = get_guild_id_from_request(guild_id).await?;
	let user_id = get_user_id_from_request().await?;

	let (Some(guild_id), Some(user_id), Some(ticket_id)) = (guild_id, user_id, ticket_id) else {
		return Ok(None);
	};

	let state: AppState = expect_context();
	let mut db_connection = state.db_connection_pool.get()?;

	let db_guild_id = database_id_from_discord_id(guild_id.get());

	let ticket: Option<Ticket> = tickets::table
		.find(&ticket_id)
		.first(&mut db_connection)
		.optional()?;
	let Some(ticket) = ticket else {
		return Ok(None);
	};
	if ticket.guild != db_guild_id {
		return Ok(None);
	}

	if ticket.get_opened_by() != user_id {
		let guild: Guild = guilds::table.find(db_guild_id).first(&mut db_connection)?;
		let member = state
			.discord_client
			.guild_member(guild_id, user_id)
			.await?
			.model()
			.await?;
		let is_staff =
			member.roles.contains(&guild.get_staff_role()) || member.roles.contains(&guild.get_admin_role());
		if !is_staff {
			return Ok(None);
		}
	}

	let messages: Vec<TicketMessage> = ticket_messages::table
		.filter(ticket_messages::ticket.eq(&ticket.id))
		.order(ticket_messages::send_time.asc())
		.load(&mut db_connection)?;

	let mut usernames: HashMap<Id<UserMarker>, String> = HashMap::new();
	let mut message_data: Vec<TicketMessageData> = Vec::with_capacity(messages.len());
	for message in messages {
		let author = message.get_author();
		let author_name = match usernames.entry(author) {
			Entry::Occupied(entry) => entry.get().clone(),
			Entry::Vacant(entry) => {
				let name = match state.discord_client.user(author).await {
					Ok(response) => response.model().await?.name,
					Err(_) => format!("<{}>", author.get()),
				};
				entry.insert(name.clone());
				name
			}
		};
		message_data.push(TicketMessageData {
			id: message.id,
			author_name,
			send_time: message.send_time,
			body: message.body,
		});
	}

	Ok(Some(TicketData {
		number: ticket.number,
		title: ticket.title,
		closed: ticket.closed_at.is_some(),
		messages: message_data,
	}))
}
