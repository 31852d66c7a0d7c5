// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::profile::SharedProfile;
use crate::session::clock::{Clock, SystemClock, TickOutcome};
use crate::session::emitter::{MintedReward, RewardParameters};
use crate::session::journal::DEFAULT_LOG_CAPACITY;
use crate::session::persistence::{PersistenceBridge, RestoreOutcome};
use crate::session::scheduler::SessionScheduler;
use crate::session::state::{RewardSession, SessionSnapshot};
use crate::wallet::BalanceMutator;
use nexus_kv_store::KeyValueStore;
use nexus_task::ShutdownTracker;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Timing and reward tunables of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub session_duration: Duration,
    pub tick_interval: Duration,
    pub hash_rate_interval: Duration,
    pub log_capacity: usize,
    pub reward: RewardParameters,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            session_duration: Duration::from_secs(24 * 60 * 60),
            tick_interval: Duration::from_secs(1),
            hash_rate_interval: Duration::from_secs(1),
            log_capacity: DEFAULT_LOG_CAPACITY,
            reward: RewardParameters::default(),
        }
    }
}

/// Result of a single firing of the reward emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RewardOutcome {
    /// The session is not active, nothing was minted and the emitter should not re-arm.
    Inactive,

    /// The reward got credited and accounted for.
    Credited(MintedReward),

    /// The balance mutation has failed, the session stats were left untouched.
    ApplicationFailed,
}

struct SessionContext<S> {
    session: RewardSession,
    persistence: PersistenceBridge<S>,
    rng: StdRng,
    scheduler: Option<SessionScheduler>,
}

struct ManagerInner<S> {
    context: Mutex<SessionContext<S>>,
    settings: SessionSettings,
    balance: Arc<dyn BalanceMutator>,
    profile: SharedProfile,
    clock: Arc<dyn Clock>,
    parent_tracker: ShutdownTracker,
    updates: watch::Sender<SessionSnapshot>,
}

/// Owns the reward session of a single user and drives its clock, reward emitter
/// and hash rate refresh. Cheap to clone, all clones control the same session.
pub struct RewardSessionManager<S> {
    inner: Arc<ManagerInner<S>>,
}

impl<S> Clone for RewardSessionManager<S> {
    fn clone(&self) -> Self {
        RewardSessionManager {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub struct RewardSessionManagerBuilder<S> {
    user_id: String,
    store: S,
    balance: Arc<dyn BalanceMutator>,
    profile: SharedProfile,
    settings: SessionSettings,
    clock: Option<Arc<dyn Clock>>,
    rng_seed: Option<u64>,
    parent_tracker: Option<ShutdownTracker>,
}

impl<S> RewardSessionManagerBuilder<S>
where
    S: KeyValueStore + 'static,
{
    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Tie the session tasks to an outer tracker, so that they get cancelled with it.
    #[must_use]
    pub fn with_parent_tracker(mut self, tracker: ShutdownTracker) -> Self {
        self.parent_tracker = Some(tracker);
        self
    }

    /// Establish the user context: create the idle session, restore any still running
    /// persisted session and, if one got resumed, start driving it.
    pub async fn establish(self) -> RewardSessionManager<S> {
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let now = clock.now();
        let persistence = PersistenceBridge::new(self.store, self.user_id);
        let mut session = RewardSession::new_idle(now, self.settings.log_capacity);

        let resumed = match persistence.restore(now).await {
            RestoreOutcome::Resumed {
                end_timestamp,
                stats,
                log,
            } => {
                info!("resuming the mining session ending at {end_timestamp}");
                session.resume(now, end_timestamp, stats, log);
                true
            }
            RestoreOutcome::Expired => {
                info!("the previous mining session has already ended");
                false
            }
            RestoreOutcome::NoSession | RestoreOutcome::Failed => false,
        };

        let (updates, _) = watch::channel(session.snapshot());
        let manager = RewardSessionManager {
            inner: Arc::new(ManagerInner {
                context: Mutex::new(SessionContext {
                    session,
                    persistence,
                    rng,
                    scheduler: None,
                }),
                settings: self.settings,
                balance: self.balance,
                profile: self.profile,
                clock,
                parent_tracker: self.parent_tracker.unwrap_or_default(),
                updates,
            }),
        };

        if resumed {
            let mut guard = manager.inner.context.lock().await;
            let ctx = &mut *guard;
            manager.refresh_hash_rate_locked(ctx).await;
            ctx.persistence.write_through(&ctx.session).await;
            manager.arm_scheduler(ctx);
            manager.publish(&ctx.session);
        }

        manager
    }
}

impl<S> RewardSessionManager<S>
where
    S: KeyValueStore + 'static,
{
    pub fn builder<B>(
        user_id: impl Into<String>,
        store: S,
        balance: B,
        profile: SharedProfile,
    ) -> RewardSessionManagerBuilder<S>
    where
        B: BalanceMutator + 'static,
    {
        RewardSessionManagerBuilder {
            user_id: user_id.into(),
            store,
            balance: Arc::new(balance),
            profile,
            settings: SessionSettings::default(),
            clock: None,
            rng_seed: None,
            parent_tracker: None,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.inner.settings
    }

    fn publish(&self, session: &RewardSession) {
        self.inner.updates.send_replace(session.snapshot());
    }

    fn from_weak(inner: &Weak<ManagerInner<S>>) -> Option<Self> {
        inner.upgrade().map(|inner| RewardSessionManager { inner })
    }

    /// Replace any previous scheduler with a fresh one running the three session tasks.
    /// Called with the context lock held, so it can't race with expiry or stop.
    fn arm_scheduler(&self, ctx: &mut SessionContext<S>) {
        if let Some(previous) = ctx.scheduler.take() {
            previous.cancel_all();
        }

        let settings = &self.inner.settings;
        let scheduler = SessionScheduler::new(&self.inner.parent_tracker);
        let first_reward_delay = settings.reward.next_delay(&mut ctx.rng);

        let weak = Arc::downgrade(&self.inner);
        scheduler.spawn_periodic("session-clock", settings.tick_interval, move || {
            let manager = Self::from_weak(&weak);
            async move {
                let Some(manager) = manager else {
                    return ControlFlow::Break(());
                };
                match manager.tick().await {
                    TickOutcome::Running { .. } => ControlFlow::Continue(()),
                    TickOutcome::Idle | TickOutcome::Expired => ControlFlow::Break(()),
                }
            }
        });

        let weak = Arc::downgrade(&self.inner);
        scheduler.spawn_rearming("reward-emitter", first_reward_delay, move || {
            let manager = Self::from_weak(&weak);
            async move {
                let Some(manager) = manager else {
                    return ControlFlow::Break(());
                };
                if manager.fire_reward().await == RewardOutcome::Inactive {
                    return ControlFlow::Break(());
                }
                match manager.next_reward_delay().await {
                    Some(delay) => ControlFlow::Continue(delay),
                    None => ControlFlow::Break(()),
                }
            }
        });

        let weak = Arc::downgrade(&self.inner);
        scheduler.spawn_periodic("hash-rate", settings.hash_rate_interval, move || {
            let manager = Self::from_weak(&weak);
            async move {
                let Some(manager) = manager else {
                    return ControlFlow::Break(());
                };
                if manager.refresh_hash_rate().await {
                    ControlFlow::Continue(())
                } else {
                    ControlFlow::Break(())
                }
            }
        });

        ctx.scheduler = Some(scheduler);
    }

    fn cancel_scheduler(ctx: &mut SessionContext<S>) -> Option<SessionScheduler> {
        let scheduler = ctx.scheduler.take()?;
        scheduler.cancel_all();
        Some(scheduler)
    }

    /// Begin a new session. Does nothing and returns `false` if one is already active.
    pub async fn start(&self) -> bool {
        let mut guard = self.inner.context.lock().await;
        let ctx = &mut *guard;

        let now = self.inner.clock.now();
        if !ctx.session.start(now, self.inner.settings.session_duration) {
            debug!("the mining session has not been started");
            return false;
        }

        self.refresh_hash_rate_locked(ctx).await;
        ctx.persistence.write_through(&ctx.session).await;
        self.arm_scheduler(ctx);
        self.publish(&ctx.session);

        info!(
            "started a new mining session ending at {:?}",
            ctx.session.end_timestamp()
        );
        true
    }

    /// Single step of the session clock.
    pub async fn tick(&self) -> TickOutcome {
        let mut guard = self.inner.context.lock().await;
        let ctx = &mut *guard;

        let now = self.inner.clock.now();
        let outcome = ctx.session.tick(now, self.inner.settings.session_duration);
        match outcome {
            TickOutcome::Expired => {
                info!("the mining session has ended");
                Self::cancel_scheduler(ctx);
                ctx.persistence.purge().await;
                self.publish(&ctx.session);
            }
            TickOutcome::Running { .. } => self.publish(&ctx.session),
            TickOutcome::Idle => {}
        }
        outcome
    }

    /// Mint a single reward with a freshly drawn base amount.
    pub async fn fire_reward(&self) -> RewardOutcome {
        let mut guard = self.inner.context.lock().await;
        let ctx = &mut *guard;

        let base = self.inner.settings.reward.draw_base_reward(&mut ctx.rng);
        self.credit_locked(ctx, base).await
    }

    /// Mint a single reward of the provided base amount, scaled by the current multiplier.
    pub async fn mint_reward(&self, base: f64) -> RewardOutcome {
        let mut guard = self.inner.context.lock().await;
        self.credit_locked(&mut guard, base).await
    }

    async fn credit_locked(&self, ctx: &mut SessionContext<S>, base: f64) -> RewardOutcome {
        let now = self.inner.clock.now();
        if !ctx.session.is_active() || !ctx.session.is_active_at(now) {
            return RewardOutcome::Inactive;
        }

        let multiplier = self.inner.profile.reward_multiplier().await;
        let reward = MintedReward::new(base, multiplier);

        // the balance goes first, the session only accounts for what has been credited
        if let Err(err) = self.inner.balance.apply_reward(reward.amount).await {
            warn!("failed to credit the mining reward of {}: {err}", reward.amount);
            return RewardOutcome::ApplicationFailed;
        }

        ctx.session.record_block(now, &reward, &self.inner.settings.reward);
        ctx.persistence.write_through(&ctx.session).await;
        self.publish(&ctx.session);
        debug!("minted a reward of {}", reward.amount);

        RewardOutcome::Credited(reward)
    }

    /// Delay until the next reward, or `None` if the session is no longer active.
    pub async fn next_reward_delay(&self) -> Option<Duration> {
        let mut guard = self.inner.context.lock().await;
        let ctx = &mut *guard;
        if !ctx.session.is_active() {
            return None;
        }
        Some(self.inner.settings.reward.next_delay(&mut ctx.rng))
    }

    async fn refresh_hash_rate_locked(&self, ctx: &mut SessionContext<S>) -> bool {
        if !ctx.session.is_active() {
            ctx.session.set_hash_rate(0.0);
            return false;
        }
        let multiplier = self.inner.profile.reward_multiplier().await;
        let hash_rate = self
            .inner
            .settings
            .reward
            .draw_hash_rate(&mut ctx.rng, multiplier);
        ctx.session.set_hash_rate(hash_rate);
        true
    }

    /// Redraw the displayed hash rate. Returns `false` if the session is not active.
    pub async fn refresh_hash_rate(&self) -> bool {
        let mut guard = self.inner.context.lock().await;
        let ctx = &mut *guard;
        let active = self.refresh_hash_rate_locked(ctx).await;
        if active {
            self.publish(&ctx.session);
        }
        active
    }

    /// Add a message to the session log.
    pub async fn append(&self, message: impl AsRef<str>) {
        let mut guard = self.inner.context.lock().await;
        let ctx = &mut *guard;
        ctx.session.append_log(self.inner.clock.now(), message.as_ref());
        ctx.persistence.write_through(&ctx.session).await;
        self.publish(&ctx.session);
    }

    /// Remind another user to start mining.
    pub async fn ping(&self, user_name: &str) {
        info!("pinging {user_name}");
        self.append(format!(
            "Pinged user {user_name} to remind them to start mining."
        ))
        .await
    }

    /// End the session before its natural expiry and forget it.
    pub async fn stop(&self) -> bool {
        let mut guard = self.inner.context.lock().await;
        let ctx = &mut *guard;

        Self::cancel_scheduler(ctx);
        let stopped = ctx.session.stop(self.inner.clock.now());
        ctx.persistence.purge().await;
        self.publish(&ctx.session);
        if stopped {
            info!("the mining session got stopped");
        }
        stopped
    }

    /// Tear down the user context. The session and everything persisted about it is dropped.
    pub async fn logout(&self) {
        let scheduler = {
            let mut guard = self.inner.context.lock().await;
            let ctx = &mut *guard;

            let scheduler = Self::cancel_scheduler(ctx);
            ctx.persistence.purge().await;
            ctx.session =
                RewardSession::new_idle(self.inner.clock.now(), self.inner.settings.log_capacity);
            self.publish(&ctx.session);
            scheduler
        };

        if let Some(scheduler) = scheduler {
            scheduler.wait_until_stopped().await;
        }
        info!("logged out of the mining session");
    }

    /// Stop driving the session without touching its persisted state,
    /// so that it can be resumed by the next process.
    pub async fn shutdown(&self) {
        let scheduler = {
            let mut guard = self.inner.context.lock().await;
            Self::cancel_scheduler(&mut guard)
        };

        if let Some(scheduler) = scheduler {
            scheduler.wait_until_stopped().await;
        }
        debug!("mining session tasks have finished");
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.context.lock().await.session.snapshot()
    }

    /// Receive a fresh snapshot after every change of the session.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.updates.subscribe()
    }

    /// Whether the session tasks are currently scheduled.
    pub async fn is_running(&self) -> bool {
        self.inner
            .context
            .lock()
            .await
            .scheduler
            .as_ref()
            .is_some_and(SessionScheduler::is_running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::UserProfile;
    use crate::session::clock::ManualClock;
    use crate::wallet::WalletLedger;
    use nexus_kv_store::InMemoryStore;
    use time::macros::datetime;

    async fn test_manager(
        clock: &ManualClock,
    ) -> (RewardSessionManager<InMemoryStore>, WalletLedger) {
        let ledger = WalletLedger::new("NXG");
        ledger.create_wallet("w1", "Main", "u1", 0.0).await;
        let profile = SharedProfile::from(UserProfile::new("u1", "Alice", "alice"));

        let manager =
            RewardSessionManager::builder("u1", InMemoryStore::new(), ledger.clone(), profile)
                .with_clock(clock.clone())
                .with_rng_seed(42)
                .establish()
                .await;
        (manager, ledger)
    }

    #[tokio::test(start_paused = true)]
    async fn starting_arms_the_scheduler() {
        let clock = ManualClock::new(datetime!(2026-03-01 10:00:00 UTC));
        let (manager, _) = test_manager(&clock).await;
        assert!(!manager.is_running().await);

        assert!(manager.start().await);
        assert!(manager.is_running().await);
        assert!(!manager.start().await);

        let snapshot = manager.snapshot().await;
        assert!(snapshot.is_active);
        assert!(snapshot.hash_rate >= 2500.0);
        manager.shutdown().await;
        assert!(!manager.is_running().await);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_returns_to_idle() {
        let clock = ManualClock::new(datetime!(2026-03-01 10:00:00 UTC));
        let (manager, _) = test_manager(&clock).await;
        manager.start().await;

        assert!(manager.stop().await);
        assert!(!manager.is_running().await);
        let snapshot = manager.snapshot().await;
        assert!(!snapshot.is_active);
        assert_eq!(snapshot.hash_rate, 0.0);
        assert_eq!(snapshot.log[0], "[10:00:00] Mining session stopped.");

        assert!(!manager.stop().await);
    }

    #[tokio::test]
    async fn ping_is_logged() {
        let clock = ManualClock::new(datetime!(2026-03-01 10:00:00 UTC));
        let (manager, _) = test_manager(&clock).await;
        manager.ping("Bob").await;
        assert_eq!(
            manager.snapshot().await.log[0],
            "[10:00:00] Pinged user Bob to remind them to start mining."
        );
    }

    #[tokio::test]
    async fn rewards_require_an_active_session() {
        let clock = ManualClock::new(datetime!(2026-03-01 10:00:00 UTC));
        let (manager, ledger) = test_manager(&clock).await;

        assert_eq!(manager.mint_reward(0.05).await, RewardOutcome::Inactive);
        assert_eq!(manager.next_reward_delay().await, None);
        assert_eq!(ledger.balance("w1", "NXG").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn logout_resets_the_session() {
        let clock = ManualClock::new(datetime!(2026-03-01 10:00:00 UTC));
        let (manager, _) = test_manager(&clock).await;
        manager.start().await;
        manager.mint_reward(0.05).await;

        manager.logout().await;
        let snapshot = manager.snapshot().await;
        assert!(!snapshot.is_active);
        assert_eq!(snapshot.blocks_found, 0);
        assert_eq!(snapshot.log.len(), 1);
    }
}
