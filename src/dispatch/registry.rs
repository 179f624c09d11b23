//! Registered commands and the resolution of an invocation into a handler plus merged metadata.
use crate::dispatch::context::Invocation;
use crate::dispatch::descriptor::{
    CommandDescriptor, CommandMetadata, SubcommandDescriptor, SubcommandGroupDescriptor,
};
use crate::dispatch::key::CommandKey;
use crate::dispatch::pipeline::CommandHandler;
use crate::error::RegistrationError;
use serenity::builder::CreateCommand;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

pub struct RegisteredCommand<S> {
    pub descriptor: Arc<CommandDescriptor>,
    pub handler: Arc<dyn CommandHandler<S>>,
}

impl<S> Clone for RegisteredCommand<S> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            handler: Arc::clone(&self.handler),
        }
    }
}

/// A command located from an invocation.
pub struct ResolvedCommand<S> {
    pub descriptor: Arc<CommandDescriptor>,
    pub handler: Arc<dyn CommandHandler<S>>,
    pub group: Option<SubcommandGroupDescriptor>,
    pub sub: Option<SubcommandDescriptor>,
    pub metadata: CommandMetadata,
    requested_group: bool,
    requested_sub: bool,
}

impl<S> ResolvedCommand<S> {
    /// False when the invocation named a group or subcommand the descriptor does not declare.
    /// An unknown flat subcommand aborts too; it never falls back to the top-level command.
    pub fn is_dispatchable(&self) -> bool {
        if self.requested_group && (self.group.is_none() || self.sub.is_none()) {
            return false;
        }
        !(self.requested_sub && self.sub.is_none())
    }
}

pub struct CommandRegistry<S> {
    commands: HashMap<String, RegisteredCommand<S>>,
    order: Vec<String>,
}

impl<S> Default for CommandRegistry<S> {
    fn default() -> Self {
        Self {
            commands: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<S> CommandRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        descriptor: CommandDescriptor,
        handler: Arc<dyn CommandHandler<S>>,
    ) -> Result<(), RegistrationError> {
        descriptor.validate()?;
        if self.commands.contains_key(&descriptor.id) {
            return Err(RegistrationError::Duplicate { id: descriptor.id });
        }
        info!(target: "dispatch", command = %descriptor.id, published = descriptor.published, "Bound command");
        self.order.push(descriptor.id.clone());
        self.commands.insert(
            descriptor.id.clone(),
            RegisteredCommand {
                descriptor: Arc::new(descriptor),
                handler,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Schemas of every published command, in registration order.
    pub fn published_commands(&self) -> Vec<CreateCommand> {
        self.order
            .iter()
            .filter_map(|id| self.commands.get(id))
            .filter(|command| command.descriptor.published)
            .filter_map(|command| command.descriptor.src.clone())
            .collect()
    }

    /// Returns `None` when no top-level command carries the invocation's name.
    pub fn resolve(&self, invocation: &Invocation) -> Option<ResolvedCommand<S>> {
        let registered = self.commands.get(&invocation.command_name)?;
        let base = &registered.descriptor;
        let group_name = invocation.subcommand_group.as_deref();
        let sub_name = invocation.subcommand.as_deref();

        let root = base.key();
        let group = group_name.and_then(|name| {
            let wanted = root.child(name);
            base.subcommand_groups
                .iter()
                .find(|group| CommandKey::parse(&group.id) == wanted)
        });

        let sub = sub_name.and_then(|name| {
            let (parent, candidates) = match (group_name, group) {
                (Some(_), Some(group)) => (CommandKey::parse(&group.id), &group.subcommands),
                (Some(_), None) => return None,
                (None, _) => (root.clone(), &base.subcommands),
            };
            let wanted = parent.child(name);
            candidates
                .iter()
                .find(|sub| CommandKey::parse(&sub.id) == wanted)
        });

        Some(ResolvedCommand {
            descriptor: Arc::clone(base),
            handler: Arc::clone(&registered.handler),
            metadata: CommandMetadata::merge(base, group, sub),
            group: group.cloned(),
            sub: sub.cloned(),
            requested_group: group_name.is_some(),
            requested_sub: sub_name.is_some(),
        })
    }
}
