// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::utils::responses::NOT_SET_UP_FOR_GUILD;
use crate::model::{Guild, database_id_from_discord_id};
use crate::schema::guilds;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use miette::{IntoDiagnostic, bail, ensure};
use twilight_http::client::Client;
use twilight_mention::fmt::Mention;
use twilight_model::application::command::CommandOption;
use twilight_model::application::interaction::application_command::CommandOptionValue;
use twilight_model::channel::ChannelType;
use twilight_model::channel::message::{AllowedMentions, MessageFlags};
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::InteractionResponseDataBuilder;
use twilight_util::builder::command::{ChannelBuilder, SubCommandBuilder, SubCommandGroupBuilder};

pub fn subcommand_definition() -> CommandOption {
	let channel_option = ChannelBuilder::new("log_channel", "The channel to which ticket events are logged")
		.channel_types([ChannelType::GuildText])
		.required(true)
		.build();

	let get_subcommand = SubCommandBuilder::new("get", "Gets the channel to which ticket events are logged");
	let set_subcommand =
		SubCommandBuilder::new("set", "Sets the channel to which ticket events are logged").option(channel_option);
	let unset_subcommand = SubCommandBuilder::new("unset", "Turns off ticket event logging");

	SubCommandGroupBuilder::new("log_channel", "Manages the ticket log channel setting")
		.subcommands([get_subcommand, set_subcommand, unset_subcommand])
		.build()
}

pub async fn handle_subcommand(
	interaction: &InteractionCreate,
	subcommand_value: &CommandOptionValue,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	db_connection_pool: Pool<ConnectionManager<PgConnection>>,
) -> miette::Result<()> {
	let Some(guild_id) = interaction.guild_id else {
		bail!("Settings command was used outside of a guild");
	};

	let mut db_connection = db_connection_pool.get().into_diagnostic()?;
	let db_guild_id = database_id_from_discord_id(guild_id.get());
	let guild: Option<Guild> = guilds::table
		.find(db_guild_id)
		.first(&mut db_connection)
		.optional()
		.into_diagnostic()?;

	let interaction_client = http_client.interaction(application_id);

	let Some(guild) = guild else {
		let response = InteractionResponseDataBuilder::new()
			.content(NOT_SET_UP_FOR_GUILD)
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
	};

	let CommandOptionValue::SubCommandGroup(value_data) = subcommand_value else {
		bail!("Command data is malformed; expected `/settings log_channel` to get a subcommand group value");
	};
	let Some(value) = value_data.first() else {
		bail!("Command data is malformed; expected `/settings log_channel` to have a subcommand");
	};

	let new_log_channel = match value.name.as_str() {
		"get" => {
			let message = match guild.get_log_channel() {
				Some(channel) => format!("Ticket events are logged to {}.", channel.mention()),
				None => String::from("Ticket event logging is turned off."),
			};
			let response = InteractionResponseDataBuilder::new()
				.content(message)
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
			return Ok(());
		}
		"set" => {
			let CommandOptionValue::SubCommand(values) = &value.value else {
				bail!("Command data is malformed; expected `/settings log_channel set` to get subcommand data");
			};
			let Some(channel_option) = values.first() else {
				bail!(
					"Command data is malformed; expected `/settings log_channel set` to have required option `log_channel`"
				);
			};
			ensure!(
				channel_option.name.as_str() == "log_channel",
				"The only option for `/settings log_channel set` should be `log_channel`"
			);
			let CommandOptionValue::Channel(new_channel) = channel_option.value else {
				bail!(
					"Command data is malformed; expected `log_channel` option of `/settings log_channel set` to be a channel"
				);
			};
			Some(new_channel)
		}
		"unset" => None,
		_ => bail!(
			"Unknown settings log_channel subcommand encountered: {}\n{:?}",
			value.name,
			subcommand_value
		),
	};

	let db_log_channel = new_log_channel.map(|channel| database_id_from_discord_id(channel.get()));
	diesel::update(guilds::table)
		.filter(guilds::guild_id.eq(guild.guild_id))
		.set(guilds::log_channel.eq(db_log_channel))
		.execute(&mut db_connection)
		.into_diagnostic()?;

	let message = match new_log_channel {
		Some(channel) => format!("Ticket events are now logged to {}.", channel.mention()),
		None => String::from("Ticket event logging is now turned off."),
	};
	let response = InteractionResponseDataBuilder::new()
		.content(message)
		.allowed_mentions(AllowedMentions::default())
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
