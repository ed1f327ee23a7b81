// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::preconditions::Precondition;
use crate::discord::utils::permissions::{channel_permissions, ticket_channel_permissions};
use crate::discord::utils::responses::ticket_channel_missing_permissions_message;
use crate::model::{Guild, database_id_from_discord_id};
use crate::schema::guilds;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use miette::{IntoDiagnostic, bail};
use twilight_http::client::Client;
use twilight_mention::fmt::Mention;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::{CommandData, CommandOptionValue};
use twilight_model::channel::ChannelType;
use twilight_model::channel::message::{AllowedMentions, MessageFlags};
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::guild::Permissions;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, ChannelMarker, RoleMarker};
use twilight_util::builder::InteractionResponseDataBuilder;
use twilight_util::builder::command::{ChannelBuilder, CommandBuilder, RoleBuilder};

pub const PRECONDITIONS: &[Precondition] = &[Precondition::GuildOnly];

pub fn command_definition() -> Command {
	let admin_role_option = RoleBuilder::new("admin_role", "The role assigned to all administrators")
		.required(true)
		.build();
	let staff_role_option = RoleBuilder::new("staff_role", "The role assigned to all staff")
		.required(true)
		.build();
	let ticket_channel_option = ChannelBuilder::new("ticket_channel", "The channel under which ticket threads are created")
		.channel_types([ChannelType::GuildText])
		.required(true)
		.build();
	let log_channel_option = ChannelBuilder::new("log_channel", "The channel to which ticket events are logged")
		.channel_types([ChannelType::GuildText])
		.build();

	CommandBuilder::new("setup", "Set up this server for Gatewarden", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.option(admin_role_option)
		.option(staff_role_option)
		.option(ticket_channel_option)
		.option(log_channel_option)
		.build()
}

pub async fn handle_command(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
) -> miette::Result<()> {
	let Some(guild_id) = interaction.guild_id else {
		bail!("Setup command was used outside of a guild");
	};
	let Some(interaction_member) = &interaction.member else {
		bail!("Interaction isn't from a guild member");
	};

	let interaction_client = http_client.interaction(application_id);

	// Setup has to work before any roles are registered, so it relies on Discord's own
	// permission data instead of the staff/admin preconditions.
	let can_manage_guild = interaction_member
		.permissions
		.is_some_and(|permissions| permissions.contains(Permissions::MANAGE_GUILD));
	if !can_manage_guild {
		let response = InteractionResponseDataBuilder::new()
			.content("Only members who can manage the server can set up Gatewarden.")
			.flags(MessageFlags::EPHEMERAL)
			.build();
		let response = InteractionResponse {
			kind: InteractionResponseType::ChannelMessageWithSource,
			data: Some(response),
		};
		interaction_client
			.create_response(interaction.id, &interaction.token, &response)
			.await
			.into_diagnostic()?;
		return Ok(());
	}

	let mut admin_role: Option<Id<RoleMarker>> = None;
	let mut staff_role: Option<Id<RoleMarker>> = None;
	let mut ticket_channel: Option<Id<ChannelMarker>> = None;
	let mut log_channel: Option<Id<ChannelMarker>> = None;
	for option in command_data.options.iter() {
		match (option.name.as_str(), &option.value) {
			("admin_role", CommandOptionValue::Role(role)) => admin_role = Some(*role),
			("staff_role", CommandOptionValue::Role(role)) => staff_role = Some(*role),
			("ticket_channel", CommandOptionValue::Channel(channel)) => ticket_channel = Some(*channel),
			("log_channel", CommandOptionValue::Channel(channel)) => log_channel = Some(*channel),
			_ => (),
		}
	}
	let (Some(admin_role), Some(staff_role), Some(ticket_channel)) = (admin_role, staff_role, ticket_channel) else {
		bail!("Command data is malformed; expected `/setup` to have its required role and channel options");
	};

	let bot_permissions = channel_permissions(guild_id, ticket_channel, http_client).await?;
	if !bot_permissions.contains(ticket_channel_permissions()) {
		let response = InteractionResponseDataBuilder::new()
			.content(ticket_channel_missing_permissions_message(ticket_channel.mention()))
			.flags(MessageFlags::EPHEMERAL)
			.build();
		let response = InteractionResponse {
			kind: InteractionResponseType::ChannelMessageWithSource,
			data: Some(response),
		};
		interaction_client
			.create_response(interaction.id, &interaction.token, &response)
			.await
			.into_diagnostic()?;
		return Ok(());
	}

	let db_guild_id = database_id_from_discord_id(guild_id.get());
	let db_admin_role = database_id_from_discord_id(admin_role.get());
	let db_staff_role = database_id_from_discord_id(staff_role.get());
	let db_ticket_channel = database_id_from_discord_id(ticket_channel.get());
	let db_log_channel = log_channel.map(|channel| database_id_from_discord_id(channel.get()));

	let new_guild = Guild {
		guild_id: db_guild_id,
		admin_role: db_admin_role,
		staff_role: db_staff_role,
		ticket_channel: Some(db_ticket_channel),
		log_channel: db_log_channel,
		auto_close_hours: None,
		reminder_hours: None,
		last_ticket_number: 0,
		custom_host: None,
	};

	let mut db_connection = db_connection_pool.get().into_diagnostic()?;
	// Running setup again updates the roles and channels without touching the lifecycle settings
	// or the ticket number sequence.
	diesel::insert_into(guilds::table)
		.values(new_guild)
		.on_conflict(guilds::guild_id)
		.do_update()
		.set((
			guilds::admin_role.eq(db_admin_role),
			guilds::staff_role.eq(db_staff_role),
			guilds::ticket_channel.eq(Some(db_ticket_channel)),
			guilds::log_channel.eq(db_log_channel),
		))
		.execute(&mut db_connection)
		.into_diagnostic()?;

	let log_channel_text = match log_channel {
		Some(channel) => format!("{}", channel.mention()),
		None => String::from("not set up"),
	};
	let response = InteractionResponseDataBuilder::new()
		.content(format!(
			"This server is now set up.\n**Admin role**: {}\n**Staff role**: {}\n**Ticket channel**: {}\n**Log channel**: {}",
			admin_role.mention(),
			staff_role.mention(),
			ticket_channel.mention(),
			log_channel_text
		))
		.allowed_mentions(AllowedMentions::default())
		.flags(MessageFlags::EPHEMERAL)
		.build();
	let response = InteractionResponse {
		kind: InteractionResponseType::ChannelMessageWithSource,
		data: Some(response),
	};
	interaction_client
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;

	Ok(())
}
