// Central constants for command limits and canned replies.
pub const MAX_COOL_DOWN_SECS: u32 = 300;
pub const MIN_ID_LEN: usize = 3;
pub const MAX_ID_LEN: usize = 64;
pub const DEFAULT_DESCRIPTION: &str = "Nothing.";

// Default flow-control replies (overridable through `FlowCallbacks`).
pub const PRIVILEGES_DENIED_REPLY: &str = "❌ **Error** → missing privileges authorizations.";
pub const COOL_DOWN_REPLY: &str = "❌ **Error** → cool down is running.";
pub const INTERFERING_REPLY: &str = "❌ **Error** → interfering commands are already running:";

pub const DEFAULT_CONFIG_PATH: &str = "hashi.config.json";
pub const DEFAULT_PROJECT_NAME: &str = "hashi";
// GUILDS only; slash commands arrive without privileged intents.
pub const DEFAULT_INTENTS: u64 = 1;
