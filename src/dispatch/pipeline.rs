//! The invocation pipeline: resolve, authorize, gate, register, execute, finalize.
use crate::dispatch::callbacks::{DefaultFlowCallbacks, FlowCallbacks};
use crate::dispatch::context::{Context, Invocation, Responder};
use crate::dispatch::descriptor::CommandDescriptor;
use crate::dispatch::key::CommandKey;
use crate::dispatch::privileges::{self, PrivilegePolicy};
use crate::dispatch::registry::{CommandRegistry, ResolvedCommand};
use crate::error::RegistrationError;
use crate::services::clock::{Clock, SystemClock};
use crate::services::flow::{Blocked, FlowControl, GateRequest};
use crate::services::interfering::InterferingEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::builder::CreateCommand;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// A command implementation. One handler serves a top-level command and all of its subcommands;
/// `ctx.metadata.key` tells which one was invoked.
#[async_trait]
pub trait CommandHandler<S>: Send + Sync {
    /// Runs the command. Returning `Err` (or panicking) is a handler fault; the in-flight entry
    /// is released either way.
    async fn callback(&self, ctx: &mut Context<S>) -> anyhow::Result<()>;
}

/// How a command run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandEnd {
    Success,
    /// The command did not run to completion.
    Error,
    /// The command completed but recorded errors along the way.
    Issued,
}

/// Outcome of one pass through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// No command matches the invocation. Not an error.
    NotFound,
    Denied { error_code: String },
    CoolingDown { expires_at: DateTime<Utc> },
    Interfering { colliding: Vec<CommandKey> },
    Completed(CommandEnd),
    /// The handler returned an error or panicked.
    Failed,
}

impl Dispatch {
    pub fn end(&self) -> CommandEnd {
        match self {
            Dispatch::NotFound => CommandEnd::Success,
            Dispatch::Completed(end) => *end,
            Dispatch::Denied { .. }
            | Dispatch::CoolingDown { .. }
            | Dispatch::Interfering { .. }
            | Dispatch::Failed => CommandEnd::Error,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            Dispatch::Denied { .. } | Dispatch::CoolingDown { .. } | Dispatch::Interfering { .. }
        )
    }
}

/// Owns the registry, the shared ledgers and the gate callbacks.
pub struct CommandManager<S: Send + Sync + 'static> {
    registry: CommandRegistry<S>,
    flow: Arc<FlowControl>,
    callbacks: Arc<dyn FlowCallbacks<S>>,
    policy: PrivilegePolicy,
}

impl<S: Send + Sync + 'static> Default for CommandManager<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Send + Sync + 'static> CommandManager<S> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: CommandRegistry::new(),
            flow: Arc::new(FlowControl::new(clock)),
            callbacks: Arc::new(DefaultFlowCallbacks),
            policy: PrivilegePolicy::default(),
        }
    }

    /// Replaces the gate callbacks.
    pub fn on(mut self, callbacks: impl FlowCallbacks<S> + 'static) -> Self {
        self.callbacks = Arc::new(callbacks);
        self
    }

    pub fn privilege_policy(mut self, policy: PrivilegePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn register(
        &mut self,
        descriptor: CommandDescriptor,
        handler: impl CommandHandler<S> + 'static,
    ) -> Result<(), RegistrationError> {
        self.registry.register(descriptor, Arc::new(handler))
    }

    pub fn registry(&self) -> &CommandRegistry<S> {
        &self.registry
    }

    pub fn flow(&self) -> &Arc<FlowControl> {
        &self.flow
    }

    pub fn published_commands(&self) -> Vec<CreateCommand> {
        self.registry.published_commands()
    }

    #[instrument(level = "debug", skip_all, fields(command = %invocation.command_name, user_id = %invocation.user_id))]
    pub async fn dispatch(
        &self,
        state: Arc<S>,
        invocation: Invocation,
        responder: Arc<dyn Responder>,
    ) -> Dispatch {
        let Some(resolved) = self.registry.resolve(&invocation) else {
            debug!(target: "dispatch", "no matching command");
            return Dispatch::NotFound;
        };
        if !resolved.is_dispatchable() {
            debug!(target: "dispatch", group = ?invocation.subcommand_group, sub = ?invocation.subcommand, "unresolved subcommand");
            return Dispatch::NotFound;
        }
        let ResolvedCommand {
            handler, metadata, ..
        } = resolved;

        let issued_at = self.flow.now();
        let mut ctx = Context::new(
            state,
            invocation,
            metadata,
            issued_at,
            responder,
            Arc::clone(&self.flow),
        );

        let authorization = privileges::evaluate(
            &ctx.invocation.identity(),
            &ctx.metadata.privileges,
            self.policy,
        );
        if let Some(error_code) = authorization.error_code() {
            debug!(target: "dispatch.privileges", missing = ?authorization.missing_names(), %error_code, "denied");
            self.callbacks.privileges_denied(&mut ctx, &error_code).await;
            return Dispatch::Denied { error_code };
        }

        let request = GateRequest {
            user_id: &ctx.invocation.user_id,
            key: &ctx.metadata.key,
            interfering: &ctx.metadata.interfering_commands,
            cool_down: ctx.metadata.cool_down,
            handle: ctx.invocation.handle(),
        };
        let slot = match self.flow.acquire(request) {
            Ok(slot) => slot,
            Err(Blocked::CoolingDown { expires_at }) => {
                self.callbacks.cooling_down(&mut ctx, expires_at).await;
                return Dispatch::CoolingDown { expires_at };
            }
            Err(Blocked::Interfering { colliding }) => {
                let mentions: Vec<String> = colliding.iter().map(InterferingEntry::mention).collect();
                self.callbacks.interfering(&mut ctx, &mentions).await;
                return Dispatch::Interfering {
                    colliding: colliding.into_iter().map(|entry| entry.key).collect(),
                };
            }
        };
        ctx.attach_slot(slot);

        let command = ctx.metadata.key.clone();
        // A panicking handler surfaces as a JoinError; unwinding drops the context and its slot.
        let task = tokio::spawn(async move {
            let result = handler.callback(&mut ctx).await;
            (ctx, result)
        });
        match task.await {
            Ok((mut ctx, Ok(()))) => {
                let end = ctx.end();
                debug!(target: "dispatch", %command, ?end, "completed");
                Dispatch::Completed(end)
            }
            Ok((mut ctx, Err(err))) => {
                ctx.end();
                error!(target: "dispatch", %command, error = ?err, "command failed");
                Dispatch::Failed
            }
            Err(err) => {
                error!(target: "dispatch", %command, error = %err, "command panicked");
                Dispatch::Failed
            }
        }
    }
}
