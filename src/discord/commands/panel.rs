// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::preconditions::Precondition;
use crate::discord::utils::permissions::channel_permissions;
use crate::model::{Panel, database_id_from_discord_id};
use crate::schema::panels;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use miette::{IntoDiagnostic, bail};
use twilight_http::client::Client;
use twilight_mention::fmt::Mention;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::{CommandData, CommandOptionValue};
use twilight_model::channel::message::MessageFlags;
use twilight_model::channel::message::component::{ActionRow, Button, ButtonStyle, Component};
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::guild::Permissions;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::InteractionResponseDataBuilder;
use twilight_util::builder::command::{CommandBuilder, StringBuilder};
use twilight_util::builder::embed::EmbedBuilder;

pub const PRECONDITIONS: &[Precondition] = &[Precondition::GuildOnly, Precondition::StaffOnly];

const DEFAULT_BUTTON_LABEL: &str = "Open Ticket";

pub fn command_definition() -> Command {
	let title_option = StringBuilder::new("title", "The title shown on the panel")
		.required(true)
		.build();
	let body_option = StringBuilder::new("body", "The body text shown on the panel")
		.required(true)
		.build();
	let button_label_option = StringBuilder::new("button_label", "The label on the panel's button").build();

	CommandBuilder::new(
		"panel",
		"Post an open-ticket panel in this channel",
		CommandType::ChatInput,
	)
	.contexts([InteractionContextType::Guild])
	.option(title_option)
	.option(body_option)
	.option(button_label_option)
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
		bail!("Panel command was used outside of a guild");
	};
	let Some(channel) = interaction.channel.as_ref() else {
		bail!("Panel command used with no channel");
	};

	let mut title: Option<String> = None;
	let mut body: Option<String> = None;
	let mut button_label: Option<String> = None;
	for option in command_data.options.iter() {
		match (option.name.as_str(), &option.value) {
			("title", CommandOptionValue::String(value)) => title = Some(value.clone()),
			("body", CommandOptionValue::String(value)) => body = Some(value.clone()),
			("button_label", CommandOptionValue::String(value)) => button_label = Some(value.clone()),
			_ => (),
		}
	}
	let (Some(title), Some(body)) = (title, body) else {
		bail!("Command data is malformed; expected `/panel` to have required options `title` and `body`");
	};
	let button_label = button_label.unwrap_or_else(|| String::from(DEFAULT_BUTTON_LABEL));

	let interaction_client = http_client.interaction(application_id);

	let bot_permissions = channel_permissions(guild_id, channel.id, http_client).await?;
	if !bot_permissions.contains(Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES) {
		let response = InteractionResponseDataBuilder::new()
			.content(format!(
				"The bot can't post messages in {}, so the panel can't go there.",
				channel.id.mention()
			))
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

	let panel_id = cuid2::create_id();
	let new_panel = Panel {
		id: panel_id.clone(),
		guild: database_id_from_discord_id(guild_id.get()),
		channel: database_id_from_discord_id(channel.id.get()),
		message: None,
		title: title.clone(),
		body: body.clone(),
		button_label: button_label.clone(),
	};

	let mut db_connection = db_connection_pool.get().into_diagnostic()?;
	diesel::insert_into(panels::table)
		.values(new_panel)
		.execute(&mut db_connection)
		.into_diagnostic()?;

	let panel_embed = EmbedBuilder::new()
		.title(title)
		.description(body)
		.validate()
		.into_diagnostic()?
		.build();
	let open_button = Button {
		custom_id: Some(format!("open_ticket/{}/start", panel_id)),
		disabled: false,
		emoji: None,
		label: Some(button_label),
		style: ButtonStyle::Primary,
		url: None,
		sku_id: None,
	};
	let components = vec![Component::ActionRow(ActionRow {
		components: vec![Component::Button(open_button)],
	})];

	let panel_message_response = http_client
		.create_message(channel.id)
		.embeds(&[panel_embed])
		.components(&components)
		.await
		.into_diagnostic()?;
	let panel_message = panel_message_response.model().await.into_diagnostic()?;

	let db_message_id = database_id_from_discord_id(panel_message.id.get());
	diesel::update(panels::table)
		.filter(panels::id.eq(&panel_id))
		.set(panels::message.eq(Some(db_message_id)))
		.execute(&mut db_connection)
		.into_diagnostic()?;

	let response = InteractionResponseDataBuilder::new()
		.content("Panel posted.")
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
