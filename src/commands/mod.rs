//! Commands bundled with the bot. Each module exposes `register()`, returning its descriptor, and a
//! handler type bound to it by [`register_all`].

pub mod cooldowns;
pub mod ping;
pub mod stats;

use crate::dispatch::CommandManager;
use crate::error::RegistrationError;
use crate::model::AppState;

pub fn register_all(manager: &mut CommandManager<AppState>) -> Result<(), RegistrationError> {
    manager.register(ping::register(), ping::Ping)?;
    manager.register(cooldowns::register(), cooldowns::CoolDowns)?;
    manager.register(stats::register(), stats::Stats)?;
    Ok(())
}
