//! Command flow control: resolution, privileges, cooldown and interference gates, execution.

pub mod callbacks;
pub mod context;
pub mod descriptor;
pub mod key;
pub mod pipeline;
pub mod privileges;
pub mod registry;

pub use callbacks::{DefaultFlowCallbacks, FlowCallbacks};
pub use context::{Context, DeliveredMessage, Invocation, ReplyMessage, Responder};
pub use descriptor::{
    CommandDescriptor, CommandMetadata, SubcommandDescriptor, SubcommandGroupDescriptor,
};
pub use key::CommandKey;
pub use pipeline::{CommandEnd, CommandHandler, CommandManager, Dispatch};
pub use privileges::{PrivilegePolicy, PrivilegeRules};
pub use registry::{CommandRegistry, ResolvedCommand};
