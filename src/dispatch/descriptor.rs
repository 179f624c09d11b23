//! Command descriptors: the immutable definition of a command, its subcommand groups and
//! subcommands, plus the layered merge that produces the metadata an invocation runs with.
use crate::constants::{DEFAULT_DESCRIPTION, MAX_COOL_DOWN_SECS, MAX_ID_LEN, MIN_ID_LEN};
use crate::dispatch::key::CommandKey;
use crate::dispatch::privileges::PrivilegeRules;
use crate::error::RegistrationError;
use serenity::builder::CreateCommand;

/// Identifier grammar shared by command ids and data map names.
pub fn is_valid_id(id: &str) -> bool {
    let len = id.chars().count();
    (MIN_ID_LEN..=MAX_ID_LEN).contains(&len)
        && !id.starts_with(' ')
        && !id.ends_with(' ')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ')
}

/// Per-field overrides carried by subcommand groups and subcommands. `None` inherits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOverrides {
    pub description: Option<String>,
    pub cool_down: Option<u32>,
    pub interfering_commands: Option<Vec<String>>,
    pub privileges: Option<PrivilegeRules>,
}

macro_rules! override_setters {
    ($ty:ty) => {
        impl $ty {
            pub fn description(mut self, description: impl Into<String>) -> Self {
                self.overrides.description = Some(description.into());
                self
            }

            pub fn cool_down(mut self, seconds: u32) -> Self {
                self.overrides.cool_down = Some(seconds);
                self
            }

            pub fn interfering<I, T>(mut self, ids: I) -> Self
            where
                I: IntoIterator<Item = T>,
                T: Into<String>,
            {
                self.overrides.interfering_commands =
                    Some(ids.into_iter().map(Into::into).collect());
                self
            }

            pub fn privileges(mut self, rules: PrivilegeRules) -> Self {
                self.overrides.privileges = Some(rules);
                self
            }
        }
    };
}

/// A subcommand. Its id is the full key, e.g. `"parent sub"` or `"parent grp sub"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcommandDescriptor {
    pub id: String,
    pub overrides: CommandOverrides,
}

impl SubcommandDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            overrides: CommandOverrides::default(),
        }
    }
}

override_setters!(SubcommandDescriptor);

/// A subcommand group. Its id is the full key, e.g. `"parent grp"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcommandGroupDescriptor {
    pub id: String,
    pub overrides: CommandOverrides,
    pub subcommands: Vec<SubcommandDescriptor>,
}

impl SubcommandGroupDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            overrides: CommandOverrides::default(),
            subcommands: Vec::new(),
        }
    }

    pub fn subcommand(mut self, sub: SubcommandDescriptor) -> Self {
        self.subcommands.push(sub);
        self
    }
}

override_setters!(SubcommandGroupDescriptor);

#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    pub id: String,
    pub description: String,
    /// Seconds, 0-300.
    pub cool_down: u32,
    /// Commands that must not be in flight for the same user while this one runs.
    pub interfering_commands: Vec<String>,
    pub privileges: PrivilegeRules,
    pub subcommand_groups: Vec<SubcommandGroupDescriptor>,
    pub subcommands: Vec<SubcommandDescriptor>,
    /// The schema published to the platform.
    pub src: Option<CreateCommand>,
    /// Internal commands are dispatchable but never published, and need no `src`.
    pub published: bool,
}

impl CommandDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: DEFAULT_DESCRIPTION.to_owned(),
            cool_down: 0,
            interfering_commands: Vec::new(),
            privileges: PrivilegeRules::default(),
            subcommand_groups: Vec::new(),
            subcommands: Vec::new(),
            src: None,
            published: true,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn cool_down(mut self, seconds: u32) -> Self {
        self.cool_down = seconds;
        self
    }

    pub fn interfering<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.interfering_commands = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn privileges(mut self, rules: PrivilegeRules) -> Self {
        self.privileges = rules;
        self
    }

    pub fn subcommand_group(mut self, group: SubcommandGroupDescriptor) -> Self {
        self.subcommand_groups.push(group);
        self
    }

    pub fn subcommand(mut self, sub: SubcommandDescriptor) -> Self {
        self.subcommands.push(sub);
        self
    }

    pub fn src(mut self, src: CreateCommand) -> Self {
        self.src = Some(src);
        self
    }

    pub fn internal(mut self) -> Self {
        self.published = false;
        self
    }

    pub fn key(&self) -> CommandKey {
        CommandKey::parse(&self.id)
    }

    /// Checks the whole descriptor tree.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        check_id(&self.id)?;
        check_cool_down(&self.id, Some(self.cool_down))?;
        for id in &self.interfering_commands {
            check_id(id)?;
        }
        if self.published && self.src.is_none() {
            return Err(RegistrationError::MissingSource {
                id: self.id.clone(),
            });
        }

        let root = self.key();
        for group in &self.subcommand_groups {
            check_nested(&group.id, &group.overrides, &root)?;
            let group_key = CommandKey::parse(&group.id);
            for sub in &group.subcommands {
                check_nested(&sub.id, &sub.overrides, &group_key)?;
            }
        }
        for sub in &self.subcommands {
            check_nested(&sub.id, &sub.overrides, &root)?;
        }
        Ok(())
    }
}

fn check_id(id: &str) -> Result<(), RegistrationError> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(RegistrationError::InvalidId { id: id.to_owned() })
    }
}

fn check_cool_down(id: &str, cool_down: Option<u32>) -> Result<(), RegistrationError> {
    match cool_down {
        Some(cool_down) if cool_down > MAX_COOL_DOWN_SECS => {
            Err(RegistrationError::InvalidCoolDown {
                id: id.to_owned(),
                cool_down,
                max: MAX_COOL_DOWN_SECS,
            })
        }
        _ => Ok(()),
    }
}

fn check_nested(
    id: &str,
    overrides: &CommandOverrides,
    parent: &CommandKey,
) -> Result<(), RegistrationError> {
    check_id(id)?;
    if !CommandKey::parse(id).is_child_of(parent) {
        return Err(RegistrationError::InvalidNesting {
            id: id.to_owned(),
            parent: parent.to_string(),
        });
    }
    check_cool_down(id, overrides.cool_down)?;
    for interfering in overrides.interfering_commands.iter().flatten() {
        check_id(interfering)?;
    }
    Ok(())
}

/// The metadata an invocation runs with, after layering overrides onto the base descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMetadata {
    /// Key of the most specific resolved level.
    pub key: CommandKey,
    pub description: String,
    pub cool_down: u32,
    pub interfering_commands: Vec<CommandKey>,
    pub privileges: PrivilegeRules,
}

impl CommandMetadata {
    /// Layers `base <- group <- sub`; the later level wins for every field it sets.
    ///
    /// | field | precedence |
    /// | --- | --- |
    /// | key | sub, group, base |
    /// | description | sub, group, base |
    /// | cool_down | sub, group, base |
    /// | interfering_commands | sub, group, base |
    /// | privileges | sub, group, base |
    pub fn merge(
        base: &CommandDescriptor,
        group: Option<&SubcommandGroupDescriptor>,
        sub: Option<&SubcommandDescriptor>,
    ) -> Self {
        let layers = [group.map(|g| &g.overrides), sub.map(|s| &s.overrides)];
        let mut metadata = Self {
            key: base.key(),
            description: base.description.clone(),
            cool_down: base.cool_down,
            interfering_commands: base
                .interfering_commands
                .iter()
                .map(|id| CommandKey::parse(id))
                .collect(),
            privileges: base.privileges.clone(),
        };
        for overrides in layers.into_iter().flatten() {
            if let Some(description) = &overrides.description {
                metadata.description = description.clone();
            }
            if let Some(cool_down) = overrides.cool_down {
                metadata.cool_down = cool_down;
            }
            if let Some(ids) = &overrides.interfering_commands {
                metadata.interfering_commands = ids.iter().map(|id| CommandKey::parse(id)).collect();
            }
            if let Some(privileges) = &overrides.privileges {
                metadata.privileges = privileges.clone();
            }
        }
        if let Some(sub) = sub {
            metadata.key = CommandKey::parse(&sub.id);
        } else if let Some(group) = group {
            metadata.key = CommandKey::parse(&group.id);
        }
        metadata
    }
}
