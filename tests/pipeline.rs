mod common;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::{DeadResponder, RecordingResponder};
use hashi::dispatch::{
    CommandDescriptor, CommandEnd, CommandHandler, CommandKey, CommandManager, Context, Dispatch,
    FlowCallbacks, Invocation, PrivilegePolicy, PrivilegeRules, ReplyMessage, Responder,
};
use hashi::services::ManualClock;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Barrier, Notify};

struct Pong;

#[async_trait]
impl CommandHandler<()> for Pong {
    async fn callback(&self, ctx: &mut Context<()>) -> anyhow::Result<()> {
        ctx.reply("pong").await;
        Ok(())
    }
}

/// Signals `entered`, then suspends until `release` is notified.
struct Slow {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl CommandHandler<()> for Slow {
    async fn callback(&self, ctx: &mut Context<()>) -> anyhow::Result<()> {
        self.entered.notify_one();
        self.release.notified().await;
        ctx.reply("done").await;
        Ok(())
    }
}

struct Failing;

#[async_trait]
impl CommandHandler<()> for Failing {
    async fn callback(&self, _ctx: &mut Context<()>) -> anyhow::Result<()> {
        Err(anyhow!("backend unavailable"))
    }
}

struct Panicking;

#[async_trait]
impl CommandHandler<()> for Panicking {
    async fn callback(&self, _ctx: &mut Context<()>) -> anyhow::Result<()> {
        panic!("handler bug");
    }
}

struct Partial;

#[async_trait]
impl CommandHandler<()> for Partial {
    async fn callback(&self, ctx: &mut Context<()>) -> anyhow::Result<()> {
        ctx.reply("half done").await;
        assert_eq!(ctx.reply_data.as_ref().and_then(|m| m.id.as_deref()), Some("m1"));
        ctx.record_error(anyhow!("one item skipped"));
        Ok(())
    }
}

fn manager_with_clock() -> (CommandManager<()>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    (CommandManager::with_clock(clock.clone()), clock)
}

async fn run(
    manager: &CommandManager<()>,
    invocation: Invocation,
) -> (Dispatch, Arc<RecordingResponder>) {
    let responder = Arc::new(RecordingResponder::default());
    let outcome = manager
        .dispatch(Arc::new(()), invocation, responder.clone() as Arc<dyn Responder>)
        .await;
    (outcome, responder)
}

#[tokio::test]
async fn cool_down_is_per_user() {
    let (mut manager, clock) = manager_with_clock();
    manager
        .register(CommandDescriptor::new("ping").cool_down(5).internal(), Pong)
        .unwrap();

    let (first, responder) = run(&manager, Invocation::new("ping", "A")).await;
    assert_eq!(first, Dispatch::Completed(CommandEnd::Success));
    assert_eq!(responder.replies(), vec![ReplyMessage::new("pong")]);

    let (second, responder) = run(&manager, Invocation::new("ping", "A")).await;
    assert!(matches!(second, Dispatch::CoolingDown { .. }));
    assert_eq!(second.end(), CommandEnd::Error);
    let reply = responder.last_reply().expect("cool down reply");
    assert!(reply.ephemeral);
    assert!(reply.content.contains("**`5.0`**s"), "{}", reply.content);

    let (other_user, _) = run(&manager, Invocation::new("ping", "B")).await;
    assert_eq!(other_user, Dispatch::Completed(CommandEnd::Success));

    clock.advance(Duration::seconds(5));
    let (after_expiry, _) = run(&manager, Invocation::new("ping", "A")).await;
    assert_eq!(after_expiry, Dispatch::Completed(CommandEnd::Success));
}

#[tokio::test]
async fn remaining_cool_down_shrinks_with_time() {
    let (mut manager, clock) = manager_with_clock();
    manager
        .register(CommandDescriptor::new("ping").cool_down(5).internal(), Pong)
        .unwrap();
    run(&manager, Invocation::new("ping", "A")).await;

    clock.advance(Duration::milliseconds(3_500));
    let (outcome, responder) = run(&manager, Invocation::new("ping", "A")).await;
    assert!(matches!(outcome, Dispatch::CoolingDown { .. }));
    assert!(responder.last_reply().unwrap().content.contains("**`1.5`**s"));
}

#[tokio::test]
async fn in_flight_command_blocks_itself_until_done() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let mut manager = CommandManager::<()>::new();
    manager
        .register(
            CommandDescriptor::new("slow").interfering(["slow"]).internal(),
            Slow {
                entered: entered.clone(),
                release: release.clone(),
            },
        )
        .unwrap();
    let manager = Arc::new(manager);

    let first = tokio::spawn({
        let manager = manager.clone();
        async move { run(&manager, Invocation::new("slow", "A").interaction_id("i1")).await.0 }
    });
    entered.notified().await;

    let (second, responder) = run(&manager, Invocation::new("slow", "A").interaction_id("i2")).await;
    assert_eq!(
        second,
        Dispatch::Interfering {
            colliding: vec![CommandKey::parse("slow")]
        }
    );
    let reply = responder.last_reply().unwrap();
    assert!(reply.content.contains("interfering commands are already running"));
    assert!(reply.content.contains("/slow"));

    release.notify_one();
    assert_eq!(first.await.unwrap(), Dispatch::Completed(CommandEnd::Success));
    assert!(manager.flow().interfering("A", &[]).is_empty());

    release.notify_one();
    let (third, _) = run(&manager, Invocation::new("slow", "A").interaction_id("i3")).await;
    assert_eq!(third, Dispatch::Completed(CommandEnd::Success));
}

#[tokio::test]
async fn unregistered_command_is_silent() {
    let (manager, _) = manager_with_clock();
    let (outcome, responder) = run(&manager, Invocation::new("ghost", "A")).await;
    assert_eq!(outcome, Dispatch::NotFound);
    assert_eq!(outcome.end(), CommandEnd::Success);
    assert!(responder.replies().is_empty());
}

#[tokio::test]
async fn undeclared_subcommand_is_silent() {
    let (mut manager, _) = manager_with_clock();
    manager
        .register(CommandDescriptor::new("ping").internal(), Pong)
        .unwrap();
    let (outcome, responder) = run(&manager, Invocation::new("ping", "A").sub("loud")).await;
    assert_eq!(outcome, Dispatch::NotFound);
    assert!(responder.replies().is_empty());
}

#[tokio::test]
async fn denied_invocation_registers_nothing() {
    let (mut manager, _) = manager_with_clock();
    manager
        .register(
            CommandDescriptor::new("ping")
                .cool_down(5)
                .privileges(PrivilegeRules::new().forbid_users(["U1"]))
                .internal(),
            Pong,
        )
        .unwrap();

    let (outcome, responder) = run(&manager, Invocation::new("ping", "U1")).await;
    assert_eq!(
        outcome,
        Dispatch::Denied {
            error_code: "11".into()
        }
    );
    assert!(responder
        .last_reply()
        .unwrap()
        .content
        .contains("(privileges error code: **`11`**)"));
    assert!(manager.flow().cool_downs("U1", None).is_empty());
    assert!(manager.flow().interfering("U1", &[]).is_empty());
}

#[tokio::test]
async fn strict_policy_ignores_rank_override() {
    let rules = PrivilegeRules::new()
        .forbid_users(["U1"])
        .only_channels(["C1"]);
    let invocation = || Invocation::new("ping", "U1").channel("C1");

    let mut lenient = CommandManager::<()>::new();
    lenient
        .register(CommandDescriptor::new("ping").privileges(rules.clone()).internal(), Pong)
        .unwrap();
    assert!(!run(&lenient, invocation()).await.0.is_blocked());

    let mut strict = CommandManager::<()>::new().privilege_policy(PrivilegePolicy::Strict);
    strict
        .register(CommandDescriptor::new("ping").privileges(rules).internal(), Pong)
        .unwrap();
    assert!(matches!(run(&strict, invocation()).await.0, Dispatch::Denied { .. }));
}

#[tokio::test]
async fn handler_error_releases_in_flight_entry() {
    let (mut manager, _) = manager_with_clock();
    manager
        .register(CommandDescriptor::new("flaky").internal(), Failing)
        .unwrap();

    let (outcome, _) = run(&manager, Invocation::new("flaky", "A")).await;
    assert_eq!(outcome, Dispatch::Failed);
    assert_eq!(outcome.end(), CommandEnd::Error);
    assert!(manager.flow().interfering("A", &[]).is_empty());
}

#[tokio::test]
async fn handler_panic_is_contained() {
    let (mut manager, _) = manager_with_clock();
    manager
        .register(CommandDescriptor::new("buggy").cool_down(3).internal(), Panicking)
        .unwrap();

    let (outcome, _) = run(&manager, Invocation::new("buggy", "A")).await;
    assert_eq!(outcome, Dispatch::Failed);
    assert!(manager.flow().interfering("A", &[]).is_empty());
    // The cool down was registered before the handler ran.
    assert_eq!(manager.flow().cool_downs("A", None).len(), 1);
}

#[tokio::test]
async fn recorded_errors_mark_the_run_issued() {
    let (mut manager, _) = manager_with_clock();
    manager
        .register(CommandDescriptor::new("batch").internal(), Partial)
        .unwrap();

    let (outcome, responder) = run(&manager, Invocation::new("batch", "A")).await;
    assert_eq!(outcome, Dispatch::Completed(CommandEnd::Issued));
    assert_eq!(responder.replies().len(), 1);
}

#[tokio::test]
async fn failed_delivery_does_not_fail_the_command() {
    let (mut manager, _) = manager_with_clock();
    manager
        .register(CommandDescriptor::new("ping").internal(), Pong)
        .unwrap();
    let outcome = manager
        .dispatch(Arc::new(()), Invocation::new("ping", "A"), Arc::new(DeadResponder))
        .await;
    assert_eq!(outcome, Dispatch::Completed(CommandEnd::Success));
}

struct Quiet {
    cooling: Arc<AtomicUsize>,
}

#[async_trait]
impl FlowCallbacks<()> for Quiet {
    async fn cooling_down(&self, ctx: &mut Context<()>, expires_at: DateTime<Utc>) {
        self.cooling.fetch_add(1, Ordering::SeqCst);
        let secs = (expires_at - ctx.issued_at).num_seconds();
        ctx.reply(ReplyMessage::new(format!("slow down ({secs}s)")).ephemeral())
            .await;
    }
}

#[tokio::test]
async fn custom_callbacks_replace_canned_replies() {
    let cooling = Arc::new(AtomicUsize::new(0));
    let (manager, _) = manager_with_clock();
    let mut manager = manager.on(Quiet {
        cooling: cooling.clone(),
    });
    manager
        .register(
            CommandDescriptor::new("ping")
                .cool_down(10)
                .privileges(PrivilegeRules::new().forbid_users(["U1"]))
                .internal(),
            Pong,
        )
        .unwrap();

    run(&manager, Invocation::new("ping", "A")).await;
    let (_, responder) = run(&manager, Invocation::new("ping", "A")).await;
    assert_eq!(
        responder.last_reply(),
        Some(ReplyMessage::new("slow down (10s)").ephemeral())
    );
    assert_eq!(cooling.load(Ordering::SeqCst), 1);

    // Slots left alone keep the default reply.
    let (_, responder) = run(&manager, Invocation::new("ping", "U1")).await;
    assert!(responder.last_reply().unwrap().content.contains("missing privileges"));
}

/// Counts how many runs are inside the handler at once.
struct Exclusive {
    active: Arc<AtomicUsize>,
    overlaps: Arc<AtomicUsize>,
}

#[async_trait]
impl CommandHandler<()> for Exclusive {
    async fn callback(&self, _ctx: &mut Context<()>) -> anyhow::Result<()> {
        if self.active.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn simultaneous_invocations_never_overlap() {
    const CALLERS: usize = 16;
    let active = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let mut manager = CommandManager::<()>::new();
    manager
        .register(
            CommandDescriptor::new("vault").interfering(["vault"]).internal(),
            Exclusive {
                active: active.clone(),
                overlaps: overlaps.clone(),
            },
        )
        .unwrap();
    let manager = Arc::new(manager);

    for round in 0..10 {
        let barrier = Arc::new(Barrier::new(CALLERS));
        let tasks: Vec<_> = (0..CALLERS)
            .map(|n| {
                let manager = manager.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    let invocation =
                        Invocation::new("vault", "A").interaction_id(format!("r{round}-{n}"));
                    run(&manager, invocation).await.0
                })
            })
            .collect();

        let mut completed = 0;
        for task in tasks {
            match task.await.unwrap() {
                Dispatch::Completed(CommandEnd::Success) => completed += 1,
                Dispatch::Interfering { .. } => {}
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert!(completed >= 1, "round {round}: nobody got through");
        assert!(manager.flow().interfering("A", &[]).is_empty());
    }
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
}
