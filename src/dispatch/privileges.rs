//! Privilege rules and their evaluation.
//!
//! Each of the eight rule categories carries a fixed rank. A category that passes *and* is
//! configured (non-empty list) raises the achieved level; under [`PrivilegePolicy::RankOverride`]
//! an invocation is still authorized when every failing category ranks below the achieved level.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrivilegeCategory {
    ForbiddenUsers,
    UniqueUsers,
    ForbiddenGuilds,
    UniqueGuilds,
    ForbiddenRoles,
    UniqueRoles,
    ForbiddenChannels,
    UniqueChannels,
}

impl PrivilegeCategory {
    /// Lowest rank first.
    pub const ALL: [Self; 8] = [
        Self::ForbiddenUsers,
        Self::UniqueUsers,
        Self::ForbiddenGuilds,
        Self::UniqueGuilds,
        Self::ForbiddenRoles,
        Self::UniqueRoles,
        Self::ForbiddenChannels,
        Self::UniqueChannels,
    ];

    /// Distinct power-of-two weight; sums of ranks are unique per category set.
    pub fn rank(self) -> u32 {
        1 << (self as u32)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ForbiddenUsers => "forbiddenUsers",
            Self::UniqueUsers => "uniqueUsers",
            Self::ForbiddenGuilds => "forbiddenGuilds",
            Self::UniqueGuilds => "uniqueGuilds",
            Self::ForbiddenRoles => "forbiddenRoles",
            Self::UniqueRoles => "uniqueRoles",
            Self::ForbiddenChannels => "forbiddenChannels",
            Self::UniqueChannels => "uniqueChannels",
        }
    }
}

/// Allow/deny lists. An empty list imposes no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivilegeRules {
    pub forbidden_users: Vec<String>,
    pub unique_users: Vec<String>,
    pub forbidden_guilds: Vec<String>,
    pub unique_guilds: Vec<String>,
    pub forbidden_roles: Vec<String>,
    pub unique_roles: Vec<String>,
    pub forbidden_channels: Vec<String>,
    pub unique_channels: Vec<String>,
}

fn owned<I, T>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

impl PrivilegeRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forbid_users<I: IntoIterator<Item = T>, T: Into<String>>(mut self, ids: I) -> Self {
        self.forbidden_users = owned(ids);
        self
    }

    pub fn only_users<I: IntoIterator<Item = T>, T: Into<String>>(mut self, ids: I) -> Self {
        self.unique_users = owned(ids);
        self
    }

    pub fn forbid_guilds<I: IntoIterator<Item = T>, T: Into<String>>(mut self, ids: I) -> Self {
        self.forbidden_guilds = owned(ids);
        self
    }

    pub fn only_guilds<I: IntoIterator<Item = T>, T: Into<String>>(mut self, ids: I) -> Self {
        self.unique_guilds = owned(ids);
        self
    }

    pub fn forbid_roles<I: IntoIterator<Item = T>, T: Into<String>>(mut self, ids: I) -> Self {
        self.forbidden_roles = owned(ids);
        self
    }

    /// Every listed role must be held.
    pub fn only_roles<I: IntoIterator<Item = T>, T: Into<String>>(mut self, ids: I) -> Self {
        self.unique_roles = owned(ids);
        self
    }

    pub fn forbid_channels<I: IntoIterator<Item = T>, T: Into<String>>(mut self, ids: I) -> Self {
        self.forbidden_channels = owned(ids);
        self
    }

    pub fn only_channels<I: IntoIterator<Item = T>, T: Into<String>>(mut self, ids: I) -> Self {
        self.unique_channels = owned(ids);
        self
    }

    pub fn list(&self, category: PrivilegeCategory) -> &[String] {
        match category {
            PrivilegeCategory::ForbiddenUsers => &self.forbidden_users,
            PrivilegeCategory::UniqueUsers => &self.unique_users,
            PrivilegeCategory::ForbiddenGuilds => &self.forbidden_guilds,
            PrivilegeCategory::UniqueGuilds => &self.unique_guilds,
            PrivilegeCategory::ForbiddenRoles => &self.forbidden_roles,
            PrivilegeCategory::UniqueRoles => &self.unique_roles,
            PrivilegeCategory::ForbiddenChannels => &self.forbidden_channels,
            PrivilegeCategory::UniqueChannels => &self.unique_channels,
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        PrivilegeCategory::ALL
            .iter()
            .all(|category| self.list(*category).is_empty())
    }
}

/// Who is invoking and where.
#[derive(Debug, Clone, Copy)]
pub struct Identity<'a> {
    pub user_id: &'a str,
    pub guild_id: Option<&'a str>,
    pub channel_id: Option<&'a str>,
    pub roles: &'a [String],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrivilegePolicy {
    /// A configured passing category outranking every failure authorizes the invocation.
    #[default]
    RankOverride,
    /// Every category must pass.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub authorized: bool,
    /// Highest rank among configured passing categories (0 when none).
    pub achieved: u32,
    /// Failing categories, highest rank first.
    pub missing: Vec<PrivilegeCategory>,
}

impl Authorization {
    /// `"{missing count}{sum of missing ranks}"`; `None` when authorized.
    pub fn error_code(&self) -> Option<String> {
        if self.authorized {
            return None;
        }
        let sum: u32 = self.missing.iter().map(|c| c.rank()).sum();
        Some(format!("{}{}", self.missing.len(), sum))
    }

    pub fn missing_names(&self) -> Vec<&'static str> {
        self.missing.iter().map(|c| c.name()).collect()
    }
}

fn passes(category: PrivilegeCategory, list: &[String], identity: &Identity<'_>) -> bool {
    let contains = |value: &str| list.iter().any(|entry| entry == value);
    match category {
        PrivilegeCategory::ForbiddenUsers => !contains(identity.user_id),
        PrivilegeCategory::UniqueUsers => list.is_empty() || contains(identity.user_id),
        PrivilegeCategory::ForbiddenGuilds => identity.guild_id.is_none_or(|g| !contains(g)),
        PrivilegeCategory::UniqueGuilds => {
            list.is_empty() || identity.guild_id.is_some_and(|g| contains(g))
        }
        PrivilegeCategory::ForbiddenRoles => !identity.roles.iter().any(|r| contains(r.as_str())),
        PrivilegeCategory::UniqueRoles => {
            list.is_empty() || list.iter().all(|r| identity.roles.contains(r))
        }
        PrivilegeCategory::ForbiddenChannels => identity.channel_id.is_none_or(|c| !contains(c)),
        PrivilegeCategory::UniqueChannels => {
            list.is_empty() || identity.channel_id.is_some_and(|c| contains(c))
        }
    }
}

pub fn evaluate(
    identity: &Identity<'_>,
    rules: &PrivilegeRules,
    policy: PrivilegePolicy,
) -> Authorization {
    let mut achieved = 0;
    let mut missing = Vec::new();

    for category in PrivilegeCategory::ALL {
        let list = rules.list(category);
        if passes(category, list, identity) {
            // Unconfigured categories pass vacuously and never lift the level.
            if !list.is_empty() {
                achieved = achieved.max(category.rank());
            }
        } else {
            missing.push(category);
        }
    }
    missing.sort_by_key(|c| std::cmp::Reverse(c.rank()));

    let authorized = match (missing.first(), policy) {
        (None, _) => true,
        (Some(_), PrivilegePolicy::Strict) => false,
        (Some(highest), PrivilegePolicy::RankOverride) => highest.rank() < achieved,
    };

    Authorization {
        authorized,
        achieved,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_ordered_and_distinct() {
        let ranks: Vec<u32> = PrivilegeCategory::ALL.iter().map(|c| c.rank()).collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn error_code_counts_and_sums() {
        let auth = Authorization {
            authorized: false,
            achieved: 0,
            missing: vec![PrivilegeCategory::UniqueRoles, PrivilegeCategory::ForbiddenUsers],
        };
        assert_eq!(auth.error_code().as_deref(), Some("233"));
    }
}
