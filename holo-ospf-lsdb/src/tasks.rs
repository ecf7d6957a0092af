//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug_span};

use crate::collections::LsaEntryIndex;

//
// LSDB timers diagram:
//
//                                    +--------------+
//           lsa_expiry_timer (Nx) -> |              |
//                                    |     lsdb     |
//          lsa_refresh_timer (Nx) -> |              |
//                                    +--------------+
//
// Timers are owned by the LSA entry that scheduled them and are always
// created and canceled through a `Scheduler`.
//

// Timer identifier.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct TimerId(pub u64);

// Event delivered when a timer expires.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimerEvent {
    // The LSA age is expected to have reached MaxAge.
    LsaExpiry(LsaEntryIndex),
    // The self-originated LSA needs to be refreshed.
    LsaRefresh(LsaEntryIndex),
}

// One-shot timer scheduling capability.
pub trait Scheduler {
    // Schedules `event` to be delivered after `timeout`.
    fn schedule(&mut self, timeout: Duration, event: TimerEvent) -> TimerId;

    // Cancels a pending timer.
    //
    // Canceling a timer that already fired or that was already canceled is
    // a no-op.
    fn cancel(&mut self, timer_id: TimerId);
}

// Scheduler backed by tokio timers.
//
// Each scheduled timer is a task sleeping for the requested duration and
// then posting the event to the channel returned by `TokioScheduler::new`.
// A task drops its own handle right before posting the event.
#[derive(Debug)]
pub struct TokioScheduler {
    tasks: Arc<Mutex<HashMap<TimerId, JoinHandle<()>>>>,
    timerp: UnboundedSender<(TimerId, TimerEvent)>,
    next_id: u64,
}

// Scheduler that never fires on its own. Timers are kept in a list and
// expired explicitly by the caller.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: HashMap<TimerId, (Duration, TimerEvent)>,
    next_id: u64,
}

// ===== impl TokioScheduler =====

impl TokioScheduler {
    pub fn new() -> (Self, UnboundedReceiver<(TimerId, TimerEvent)>) {
        let (timerp, timerc) = mpsc::unbounded_channel();
        let scheduler = TokioScheduler {
            tasks: Default::default(),
            timerp,
            next_id: 0,
        };
        (scheduler, timerc)
    }

    // Returns the number of timers that haven't fired nor been canceled.
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, timeout: Duration, event: TimerEvent) -> TimerId {
        self.next_id += 1;
        let timer_id = TimerId(self.next_id);

        let timerp = self.timerp.clone();
        let tasks = self.tasks.clone();
        let span = debug_span!("timer", id = %timer_id.0);

        // Hold the lock until the handle is stored, so that a timer expiring
        // right away can't miss its own entry.
        let mut tasks_guard = self.tasks.lock().unwrap();
        let task = tokio::spawn(
            async move {
                tokio::time::sleep(timeout).await;
                tasks.lock().unwrap().remove(&timer_id);
                let _ = timerp.send((timer_id, event));
            }
            .instrument(span),
        );
        tasks_guard.insert(timer_id, task);

        timer_id
    }

    fn cancel(&mut self, timer_id: TimerId) {
        if let Some(task) = self.tasks.lock().unwrap().remove(&timer_id) {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.lock().unwrap().drain() {
            task.abort();
        }
    }
}

// ===== impl ManualScheduler =====

impl ManualScheduler {
    // Returns whether the given timer is still pending.
    pub fn is_pending(&self, timer_id: TimerId) -> bool {
        self.pending.contains_key(&timer_id)
    }

    // Returns the timeout and event of a pending timer.
    pub fn get(&self, timer_id: TimerId) -> Option<&(Duration, TimerEvent)> {
        self.pending.get(&timer_id)
    }

    // Returns the number of pending timers.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    // Fires a pending timer, returning its event.
    pub fn fire(&mut self, timer_id: TimerId) -> Option<TimerEvent> {
        self.pending.remove(&timer_id).map(|(_, event)| event)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, timeout: Duration, event: TimerEvent) -> TimerId {
        self.next_id += 1;
        let timer_id = TimerId(self.next_id);
        self.pending.insert(timer_id, (timeout, event));
        timer_id
    }

    fn cancel(&mut self, timer_id: TimerId) {
        self.pending.remove(&timer_id);
    }
}

// ===== unit tests =====
