//! Conversion of serenity command interactions into pipeline invocations.
use crate::dispatch::Invocation;
use serenity::model::application::{CommandDataOption, CommandDataOptionValue, CommandInteraction};

/// Reads the subcommand group and subcommand names from the option tree. Shapes that do not
/// match simply yield `None`.
pub fn subcommand_path(options: &[CommandDataOption]) -> (Option<String>, Option<String>) {
    let Some(first) = options.first() else {
        return (None, None);
    };
    match &first.value {
        CommandDataOptionValue::SubCommandGroup(nested) => {
            let sub = nested
                .first()
                .filter(|option| matches!(option.value, CommandDataOptionValue::SubCommand(_)))
                .map(|option| option.name.clone());
            (Some(first.name.clone()), sub)
        }
        CommandDataOptionValue::SubCommand(_) => (None, Some(first.name.clone())),
        _ => (None, None),
    }
}

pub fn invocation_from(interaction: &CommandInteraction) -> Invocation {
    let (subcommand_group, subcommand) = subcommand_path(&interaction.data.options);
    let roles = interaction
        .member
        .as_ref()
        .map(|member| member.roles.iter().map(ToString::to_string).collect())
        .unwrap_or_default();
    Invocation {
        interaction_id: interaction.id.to_string(),
        command_id: Some(interaction.data.id.to_string()),
        command_name: interaction.data.name.clone(),
        subcommand_group,
        subcommand,
        user_id: interaction.user.id.to_string(),
        guild_id: interaction.guild_id.map(|id| id.to_string()),
        channel_id: Some(interaction.channel_id.to_string()),
        roles,
    }
}
