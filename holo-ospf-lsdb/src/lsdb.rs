//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::collections::{Arena, LsaEntryIndex};
use crate::debug::{Debug, LsaFlushReason};
use crate::packet::error::{EncodeError, LsaValidationError};
use crate::packet::lsa::{Lsa, LsaHdr};
use crate::tasks::{Scheduler, TimerEvent, TimerId};
use crate::version::Version;

// Architectural Constants.
pub const LSA_REFRESH_TIME: u16 = 1800;
pub const LSA_MAX_AGE: u16 = 3600;
pub const LSA_MAX_AGE_DIFF: u16 = 900;
pub const LSA_CHECK_AGE: u16 = 300;
pub const LSA_INFINITY: u32 = 0x00ffffff;
pub const LSA_INIT_SEQ_NO: u32 = 0x80000001;
pub const LSA_MAX_SEQ_NO: u32 = 0x7fffffff;
pub const LSA_RESERVED_SEQ_NO: u32 = 0x80000000;
pub const LSA_MIN_INTERVAL: u64 = 5;
pub const LSA_MIN_ARRIVAL: u64 = 1;

#[derive(Debug)]
pub struct LsaEntry<V: Version> {
    // Arena index of the entry, used to tag its timers.
    pub idx: LsaEntryIndex,
    // LSA data.
    pub data: Arc<Lsa<V>>,
    // LSA entry flags.
    pub flags: LsaEntryFlags,
    // Lifecycle state.
    state: LsaEntryState,
    // The LSA age is computed relative to this instant.
    base_time: Instant,
    initial_age: u16,
    // Time the current LSA instance was installed.
    install_time: Instant,
    // Time of the last checksum audit.
    last_checkage: Instant,
    // Neighbors that haven't acknowledged the current LSA instance.
    nacks: BTreeSet<Ipv4Addr>,
    // Expiry timer that triggers when the LSA age reaches MaxAge.
    expiry_timer: Option<TimerId>,
    // Refresh timer that triggers every LSA_REFRESH_TIME seconds.
    refresh_timer: Option<TimerId>,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct LsaEntryFlags: u8 {
        const RECEIVED = 0x01;
        const SELF_ORIGINATED = 0x02;
    }
}

// LSA entry lifecycle state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LsaEntryState {
    // The LSA is valid and its age is below MaxAge.
    Normal,
    // The LSA reached MaxAge, either by aging out or by being flushed.
    MaxAge,
    // The LSA was superseded or removed. This state is terminal.
    Invalidated,
}

// ===== impl LsaEntry =====

impl<V> LsaEntry<V>
where
    V: Version,
{
    pub fn new(
        idx: LsaEntryIndex,
        data: Arc<Lsa<V>>,
        flags: LsaEntryFlags,
        now: Instant,
    ) -> LsaEntry<V> {
        let state = if data.hdr.is_maxage() {
            LsaEntryState::MaxAge
        } else {
            LsaEntryState::Normal
        };
        let initial_age = data.hdr.age;

        LsaEntry {
            idx,
            data,
            flags,
            state,
            base_time: now,
            initial_age,
            install_time: now,
            last_checkage: now,
            nacks: Default::default(),
            expiry_timer: None,
            refresh_timer: None,
        }
    }

    pub fn state(&self) -> LsaEntryState {
        self.state
    }

    pub fn is_self_originated(&self) -> bool {
        self.flags.contains(LsaEntryFlags::SELF_ORIGINATED)
    }

    pub fn install_time(&self) -> Instant {
        self.install_time
    }

    // Recomputes the LSA age from the time elapsed since the LSA was
    // installed, saturating at MaxAge.
    //
    // Ages are never decremented by timers, so this can be called any number
    // of times.
    pub fn update_age(
        &mut self,
        now: Instant,
        scheduler: &mut dyn Scheduler,
    ) -> u16 {
        self.assert_not_invalidated("update age");
        if self.state == LsaEntryState::MaxAge {
            return LSA_MAX_AGE;
        }

        let elapsed = now.saturating_duration_since(self.base_time).as_secs();
        let age = std::cmp::min(
            u64::from(self.initial_age) + elapsed,
            u64::from(LSA_MAX_AGE),
        ) as u16;
        if age != self.data.hdr.age {
            Arc::make_mut(&mut self.data).set_age(age);
        }
        if age == LSA_MAX_AGE {
            Debug::<V>::LsaFlush(&self.data.hdr, LsaFlushReason::Expiry).log();
            self.enter_maxage(scheduler);
        }

        age
    }

    // Sets the LSA age.
    //
    // Panics if the LSA is already at MaxAge: once reached, MaxAge can only
    // be left through a revival of the LSA.
    pub fn set_age(
        &mut self,
        age: u16,
        now: Instant,
        scheduler: &mut dyn Scheduler,
    ) {
        self.assert_not_invalidated("set age");
        if self.state == LsaEntryState::MaxAge {
            panic!(
                "attempt to set the age of LSA {:?} which is already at MaxAge",
                self.data.hdr.key()
            );
        }
        assert!(age <= LSA_MAX_AGE, "LSA age {age} is above MaxAge");

        self.base_time = now;
        self.initial_age = age;
        Arc::make_mut(&mut self.data).set_age(age);
        if age == LSA_MAX_AGE {
            self.enter_maxage(scheduler);
        }
    }

    // Prematurely ages the LSA so that it gets flushed from the routing
    // domain.
    pub fn set_maxage(&mut self, now: Instant, scheduler: &mut dyn Scheduler) {
        self.assert_not_invalidated("flush");
        if self.state == LsaEntryState::Normal {
            Debug::<V>::LsaFlush(
                &self.data.hdr,
                LsaFlushReason::PrematureAging,
            )
            .log();
        }

        self.base_time = now;
        self.initial_age = LSA_MAX_AGE;
        Arc::make_mut(&mut self.data).set_maxage();
        self.enter_maxage(scheduler);
    }

    // Re-originates the self-originated LSA with a new body, incrementing
    // its sequence number and resetting its age.
    //
    // Panics when the LSA is at MaxAge or when the sequence number is already
    // MaxSequenceNumber. In the latter case the LSA must first be flushed and
    // then revived. Fails, leaving the entry untouched, when the new body
    // doesn't fit in an LSA.
    pub fn update_age_and_seqno(
        &mut self,
        now: Instant,
        body: V::LsaBody,
        scheduler: &mut dyn Scheduler,
    ) -> Result<(), EncodeError> {
        self.assert_not_invalidated("re-originate");
        self.assert_self_originated("re-originate");
        self.assert_not_maxage("re-originate");

        let hdr = &self.data.hdr;
        let seq_no = self.next_seq_no();
        let lsa = Lsa::<V>::new(
            0,
            hdr.options,
            hdr.lsa_id,
            hdr.adv_rtr,
            seq_no,
            body,
        )?;
        self.reoriginate(now, lsa, scheduler);
        Ok(())
    }

    // Refreshes the self-originated LSA, keeping its body.
    //
    // When the sequence number is about to wrap, the LSA is flushed instead
    // and `false` is returned. The LSA must then be revived once it's
    // acknowledged by all neighbors. Panics if the LSA is at MaxAge.
    pub fn refresh(
        &mut self,
        now: Instant,
        scheduler: &mut dyn Scheduler,
    ) -> bool {
        self.assert_not_invalidated("refresh");
        self.assert_not_maxage("refresh");
        if self.data.hdr.seq_no == LSA_MAX_SEQ_NO {
            Debug::<V>::LsaSeqNoWrap(&self.data.hdr).log();
            self.set_maxage(now, scheduler);
            return false;
        }

        Debug::<V>::LsaRefresh(&self.data.hdr).log();
        let lsa = self.data.with_seq_no(self.next_seq_no());
        self.reoriginate(now, lsa, scheduler);
        true
    }

    // Reoriginates the LSA with InitialSequenceNumber after its sequence
    // number has wrapped.
    //
    // Panics unless the LSA is self-originated, at MaxAge, and has
    // MaxSequenceNumber as its sequence number.
    pub fn revive(&mut self, now: Instant, scheduler: &mut dyn Scheduler) {
        self.assert_not_invalidated("revive");
        self.assert_self_originated("revive");
        if self.state != LsaEntryState::MaxAge
            || self.data.hdr.seq_no != LSA_MAX_SEQ_NO
        {
            panic!(
                "LSA {:?} can't be revived: state {:?}, seqno {:#010x}",
                self.data.hdr.key(),
                self.state,
                self.data.hdr.seq_no
            );
        }

        Debug::<V>::LsaRevive(&self.data.hdr).log();
        let lsa = self.data.with_seq_no(LSA_INIT_SEQ_NO);
        self.reoriginate(now, lsa, scheduler);
    }

    // Marks the entry as invalid, canceling all of its timers.
    pub fn invalidate(&mut self, scheduler: &mut dyn Scheduler) {
        self.cancel_timers(scheduler);
        self.nacks.clear();
        self.state = LsaEntryState::Invalidated;
    }

    // Records that the given neighbor hasn't acknowledged the LSA yet.
    pub fn add_nack(&mut self, router_id: Ipv4Addr) {
        self.assert_not_invalidated("add NACK");
        self.nacks.insert(router_id);
    }

    // Records the acknowledgment of the given neighbor.
    pub fn remove_nack(&mut self, router_id: Ipv4Addr) -> bool {
        self.nacks.remove(&router_id)
    }

    pub fn nacks(&self) -> impl Iterator<Item = &Ipv4Addr> + '_ {
        self.nacks.iter()
    }

    // Returns whether all neighbors acknowledged the LSA.
    pub fn is_fully_flooded(&self) -> bool {
        self.nacks.is_empty()
    }

    // Starts or restarts the refresh timer.
    pub fn schedule_refresh(&mut self, scheduler: &mut dyn Scheduler) {
        self.assert_self_originated("schedule refresh");
        if let Some(timer_id) = self.refresh_timer.take() {
            scheduler.cancel(timer_id);
        }
        if self.state != LsaEntryState::Normal {
            return;
        }

        let timeout = Duration::from_secs(LSA_REFRESH_TIME.into());
        let event = TimerEvent::LsaRefresh(self.idx);
        self.refresh_timer = Some(scheduler.schedule(timeout, event));
    }

    // Starts or restarts the expiry timer, which fires when the LSA is
    // expected to reach MaxAge.
    pub fn schedule_expiry(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(timer_id) = self.expiry_timer.take() {
            scheduler.cancel(timer_id);
        }
        if self.state != LsaEntryState::Normal {
            return;
        }

        let timeout = LSA_MAX_AGE - self.data.hdr.age;
        let timeout = Duration::from_secs(timeout.into());
        let event = TimerEvent::LsaExpiry(self.idx);
        self.expiry_timer = Some(scheduler.schedule(timeout, event));
    }

    pub fn cancel_timers(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(timer_id) = self.expiry_timer.take() {
            scheduler.cancel(timer_id);
        }
        if let Some(timer_id) = self.refresh_timer.take() {
            scheduler.cancel(timer_id);
        }
    }

    pub fn expiry_timer(&self) -> Option<TimerId> {
        self.expiry_timer
    }

    pub fn refresh_timer(&self) -> Option<TimerId> {
        self.refresh_timer
    }

    // Returns whether the LSA checksum is due for a periodic audit.
    pub fn is_checkage_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_checkage)
            >= Duration::from_secs(LSA_CHECK_AGE.into())
    }

    // Audits the checksum of the stored LSA.
    pub fn checkage(&mut self, now: Instant) -> Result<(), LsaValidationError> {
        self.last_checkage = now;
        if !self.data.is_checksum_valid() {
            return Err(LsaValidationError::InvalidChecksum);
        }
        Ok(())
    }

    // Panics when the sequence number is MaxSequenceNumber.
    fn next_seq_no(&self) -> u32 {
        let seq_no = self.data.hdr.seq_no;
        if seq_no == LSA_MAX_SEQ_NO {
            panic!(
                "sequence number of LSA {:?} is exhausted, revive it first",
                self.data.hdr.key()
            );
        }
        seq_no.wrapping_add(1)
    }

    fn reoriginate(
        &mut self,
        now: Instant,
        lsa: Lsa<V>,
        scheduler: &mut dyn Scheduler,
    ) {
        let hdr = &self.data.hdr;
        if lsa.hdr.key() != hdr.key() {
            panic!(
                "re-originated LSA {:?} doesn't match LSA {:?}",
                lsa.hdr.key(),
                hdr.key()
            );
        }

        self.data = Arc::new(lsa);
        self.state = LsaEntryState::Normal;
        self.base_time = now;
        self.initial_age = 0;
        self.install_time = now;
        self.last_checkage = now;
        self.nacks.clear();
        self.schedule_expiry(scheduler);
        self.schedule_refresh(scheduler);
    }

    // MaxAge pins the LSA: no timer may bring it back to a lower age.
    fn enter_maxage(&mut self, scheduler: &mut dyn Scheduler) {
        self.state = LsaEntryState::MaxAge;
        self.cancel_timers(scheduler);
    }

    fn assert_not_maxage(&self, operation: &str) {
        if self.state == LsaEntryState::MaxAge {
            panic!(
                "attempt to {} LSA {:?} which is at MaxAge",
                operation,
                self.data.hdr.key()
            );
        }
    }

    fn assert_not_invalidated(&self, operation: &str) {
        if self.state == LsaEntryState::Invalidated {
            panic!(
                "attempt to {} invalidated LSA {:?}",
                operation,
                self.data.hdr.key()
            );
        }
    }

    fn assert_self_originated(&self, operation: &str) {
        if !self.is_self_originated() {
            panic!(
                "attempt to {} LSA {:?} which isn't self-originated",
                operation,
                self.data.hdr.key()
            );
        }
    }
}

// ===== global functions =====

// Compares which LSA is more recent according to the rules specified in Section
// 13.1 of RFC 2328.
//
// Returns:
// - Ordering::Greater when `a` is more recent
// - Ordering::Less when `b` is more recent
// - Ordering::Equal when the two LSAs are considered to be identical
pub fn lsa_compare<V>(a: &LsaHdr<V>, b: &LsaHdr<V>) -> Ordering
where
    V: Version,
{
    let a_seq_no = a.seq_no as i32;
    let b_seq_no = b.seq_no as i32;
    let cmp = a_seq_no.cmp(&b_seq_no);
    if cmp != Ordering::Equal {
        return cmp;
    }

    let cmp = a.cksum.cmp(&b.cksum);
    if cmp != Ordering::Equal {
        return cmp;
    }

    if a.is_maxage() && !b.is_maxage() {
        return Ordering::Greater;
    } else if !a.is_maxage() && b.is_maxage() {
        return Ordering::Less;
    }

    if a.age.abs_diff(b.age) > LSA_MAX_AGE_DIFF {
        return b.age.cmp(&a.age);
    }

    Ordering::Equal
}

// Compares two LSAs according to the rules specified in Section 13.2 of RFC
// 2328. Its purpose is to determine if the contents of the LSAs are identical.
pub fn lsa_same_contents<V>(a: &Lsa<V>, b: &Lsa<V>) -> bool
where
    V: Version,
{
    if a.hdr.options != b.hdr.options {
        return false;
    }

    if a.hdr.is_maxage() ^ b.hdr.is_maxage() {
        return false;
    }

    if a.hdr.length != b.hdr.length {
        return false;
    }

    let hdr_length = LsaHdr::<V>::LENGTH as usize;
    a.raw[hdr_length..] == b.raw[hdr_length..]
}

// Checks whether MinLSArrival seconds have passed since the given LSA was
// received via flooding.
pub fn lsa_min_arrival_elapsed<V>(lse: &LsaEntry<V>, now: Instant) -> bool
where
    V: Version,
{
    if !lse.flags.contains(LsaEntryFlags::RECEIVED) {
        return true;
    }

    now.saturating_duration_since(lse.install_time)
        >= Duration::from_secs(LSA_MIN_ARRIVAL)
}

// Checks whether MinLSInterval seconds have passed since the given LSA was
// originated.
pub fn lsa_min_interval_elapsed<V>(lse: &LsaEntry<V>, now: Instant) -> bool
where
    V: Version,
{
    if lse.flags.contains(LsaEntryFlags::RECEIVED) {
        return true;
    }

    now.saturating_duration_since(lse.install_time)
        >= Duration::from_secs(LSA_MIN_INTERVAL)
}

// Processes an expired LSA timer.
//
// Timers of entries that no longer exist, or that were rescheduled after the
// event was posted, are ignored. Returns the index of the affected entry.
pub fn process_timer_event<V>(
    arena: &mut Arena<LsaEntry<V>>,
    timer_id: TimerId,
    event: TimerEvent,
    now: Instant,
    scheduler: &mut dyn Scheduler,
) -> Option<LsaEntryIndex>
where
    V: Version,
{
    match event {
        TimerEvent::LsaExpiry(lse_idx) => {
            let lse = arena.get_mut(lse_idx)?;
            if lse.expiry_timer != Some(timer_id) {
                return None;
            }
            lse.expiry_timer = None;
            if lse.update_age(now, scheduler) != LSA_MAX_AGE {
                lse.schedule_expiry(scheduler);
            }
            Some(lse_idx)
        }
        TimerEvent::LsaRefresh(lse_idx) => {
            let lse = arena.get_mut(lse_idx)?;
            if lse.refresh_timer != Some(timer_id) {
                return None;
            }
            lse.refresh_timer = None;
            lse.refresh(now, scheduler);
            Some(lse_idx)
        }
    }
}

// ===== unit tests =====
