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
use twilight_model::application::command::CommandOption;
use twilight_model::application::interaction::application_command::CommandOptionValue;
use twilight_model::channel::message::MessageFlags;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::InteractionResponseDataBuilder;
use twilight_util::builder::command::{IntegerBuilder, SubCommandBuilder, SubCommandGroupBuilder};

pub fn subcommand_definition() -> CommandOption {
	let hours_option = IntegerBuilder::new("hours", "How many hours of inactivity trigger a reminder")
		.min_value(1)
		.required(true)
		.build();

	let get_subcommand = SubCommandBuilder::new("get", "Gets the inactivity reminder delay");
	let set_subcommand = SubCommandBuilder::new("set", "Sets the inactivity reminder delay").option(hours_option);
	let unset_subcommand = SubCommandBuilder::new("unset", "Turns off inactivity reminders");

	SubCommandGroupBuilder::new("reminder", "Manages the inactivity reminder setting")
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
		bail!("Command data is malformed; expected `/settings reminder` to get a subcommand group value");
	};
	let Some(value) = value_data.first() else {
		bail!("Command data is malformed; expected `/settings reminder` to have a subcommand");
	};

	let new_hours = match value.name.as_str() {
		"get" => {
			let message = match guild.reminder_hours {
				Some(hours) => format!("Ticket openers are reminded after {} hours of inactivity.", hours),
				None => String::from("Inactivity reminders are turned off."),
			};
			let response = InteractionResponseDataBuilder::new()
				.content(message)
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
				bail!("Command data is malformed; expected `/settings reminder set` to get subcommand data");
			};
			let Some(hours_option) = values.first() else {
				bail!("Command data is malformed; expected `/settings reminder set` to have required option `hours`");
			};
			ensure!(
				hours_option.name.as_str() == "hours",
				"The only option for `/settings reminder set` should be `hours`"
			);
			let CommandOptionValue::Integer(hours) = hours_option.value else {
				bail!("Command data is malformed; expected `hours` option of `/settings reminder set` to be an integer");
			};
			let hours: i32 = hours
				.try_into()
				.into_diagnostic()?;
			Some(hours)
		}
		"unset" => None,
		_ => bail!(
			"Unknown settings reminder subcommand encountered: {}\n{:?}",
			value.name,
			subcommand_value
		),
	};

	diesel::update(guilds::table)
		.filter(guilds::guild_id.eq(guild.guild_id))
		.set(guilds::reminder_hours.eq(new_hours))
		.execute(&mut db_connection)
		.into_diagnostic()?;

	let mut message = match new_hours {
		Some(hours) => format!("Ticket openers will now be reminded after {} hours of inactivity.", hours),
		None => String::from("Inactivity reminders are now turned off."),
	};
	if let (Some(reminder_hours), Some(auto_close_hours)) = (new_hours, guild.auto_close_hours) {
		if reminder_hours >= auto_close_hours {
			message = format!(
				"{} Note: reminders only fire when set to fewer hours than auto-close ({} hours), so this reminder won't fire.",
				message, auto_close_hours
			);
		}
	}
	let response = InteractionResponseDataBuilder::new().content(message).build();
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
