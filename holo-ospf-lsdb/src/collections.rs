//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use generational_arena::Index;

use crate::debug::Debug;
use crate::lsdb::{LSA_MAX_SEQ_NO, LsaEntry, LsaEntryFlags, LsaEntryState};
use crate::packet::lsa::{Lsa, LsaKey};
use crate::tasks::Scheduler;
use crate::version::Version;

pub type LsaEntryIndex = Index;

// Arena owning every LSA entry. Handles (`Index`) stored elsewhere must be
// checked for liveness with `Arena::get` before use.
#[derive(Debug)]
pub struct Arena<T>(generational_arena::Arena<T>);

// Link-state database.
//
// LSAs are indexed by type first and then by LSA key, so that iterating over
// a single LSA type is cheap.
#[derive(Debug)]
pub struct Lsdb<V: Version> {
    tree: BTreeMap<V::LsaType, LsdbSingleType<V>>,
}

#[derive(Debug)]
pub struct LsdbSingleType<V: Version> {
    lsa_type: V::LsaType,
    tree: BTreeMap<LsaKey<V::LsaType>, LsaEntryIndex>,
}

// ===== impl Arena =====

impl<T> Arena<T> {
    pub fn insert(&mut self, value: T) -> Index {
        self.0.insert(value)
    }

    pub fn insert_with(&mut self, create: impl FnOnce(Index) -> T) -> Index {
        self.0.insert_with(create)
    }

    pub fn remove(&mut self, index: Index) -> Option<T> {
        self.0.remove(index)
    }

    pub fn get(&self, index: Index) -> Option<&T> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: Index) -> Option<&mut T> {
        self.0.get_mut(index)
    }

    pub fn contains(&self, index: Index) -> bool {
        self.0.contains(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Index, &T)> + '_ {
        self.0.iter()
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Arena<T> {
        Arena(Default::default())
    }
}

impl<T> std::ops::Index<Index> for Arena<T> {
    type Output = T;

    fn index(&self, index: Index) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> std::ops::IndexMut<Index> for Arena<T> {
    fn index_mut(&mut self, index: Index) -> &mut Self::Output {
        &mut self.0[index]
    }
}

// ===== impl Lsdb =====

impl<V> Lsdb<V>
where
    V: Version,
{
    // Inserts a new LSA into the LSDB.
    //
    // Panics if an LSA with the same key already exists.
    pub fn insert<'a>(
        &mut self,
        arena: &'a mut Arena<LsaEntry<V>>,
        lsa: Arc<Lsa<V>>,
        flags: LsaEntryFlags,
        now: Instant,
    ) -> (LsaEntryIndex, &'a mut LsaEntry<V>) {
        let key = lsa.hdr.key();

        // Create and insert LSA into the arena.
        let lse_idx =
            arena.insert_with(|idx| LsaEntry::new(idx, lsa, flags, now));

        // Link LSA to the per-type tree.
        let lsdb_type =
            self.tree
                .entry(key.lsa_type)
                .or_insert_with(|| LsdbSingleType {
                    lsa_type: key.lsa_type,
                    tree: Default::default(),
                });
        if lsdb_type.tree.insert(key, lse_idx).is_some() {
            panic!("LSA key={key:?} already exists");
        }

        (lse_idx, &mut arena[lse_idx])
    }

    // Installs an LSA, replacing and invalidating the previous instance
    // with the same key (if any).
    //
    // The expiry timer of the new entry is started, along with the refresh
    // timer for self-originated LSAs.
    pub fn install(
        &mut self,
        arena: &mut Arena<LsaEntry<V>>,
        lsa: Arc<Lsa<V>>,
        flags: LsaEntryFlags,
        now: Instant,
        scheduler: &mut dyn Scheduler,
    ) -> LsaEntryIndex {
        Debug::<V>::LsaInstall(&lsa.hdr).log();

        // Remove old instance of the LSA.
        let old_lse_idx =
            self.get(arena, &lsa.hdr.key()).map(|(lse_idx, _)| lse_idx);
        if let Some(old_lse_idx) = old_lse_idx {
            self.delete(arena, old_lse_idx, scheduler);
        }

        // Add new instance of the LSA.
        let (lse_idx, lse) = self.insert(arena, lsa, flags, now);
        lse.schedule_expiry(scheduler);
        if lse.is_self_originated() {
            lse.schedule_refresh(scheduler);
        }

        lse_idx
    }

    // Removes an LSA from the LSDB, invalidating it.
    pub fn delete(
        &mut self,
        arena: &mut Arena<LsaEntry<V>>,
        lse_idx: LsaEntryIndex,
        scheduler: &mut dyn Scheduler,
    ) -> Option<LsaEntry<V>> {
        let lse = arena.get_mut(lse_idx)?;
        let key = lse.data.hdr.key();
        lse.invalidate(scheduler);

        // Unlink LSA from the per-type tree.
        if let Some(lsdb_type) = self.tree.get_mut(&key.lsa_type) {
            lsdb_type.tree.remove(&key);
            if lsdb_type.tree.is_empty() {
                self.tree.remove(&key.lsa_type);
            }
        }

        // Remove LSA from the arena.
        arena.remove(lse_idx)
    }

    // Removes all LSAs, invalidating them.
    pub fn clear(
        &mut self,
        arena: &mut Arena<LsaEntry<V>>,
        scheduler: &mut dyn Scheduler,
    ) {
        for lse_idx in self
            .tree
            .values()
            .flat_map(|lsdb_type| lsdb_type.tree.values())
        {
            if let Some(mut lse) = arena.remove(*lse_idx) {
                lse.invalidate(scheduler);
            }
        }
        self.tree.clear();
    }

    // Removes MaxAge LSAs that were acknowledged by all neighbors. Returns
    // the keys of the removed LSAs.
    pub fn maxage_sweep(
        &mut self,
        arena: &mut Arena<LsaEntry<V>>,
        now: Instant,
        scheduler: &mut dyn Scheduler,
    ) -> Vec<LsaKey<V::LsaType>> {
        let lse_idxs = self
            .iter(arena)
            .map(|(lse_idx, _)| lse_idx)
            .collect::<Vec<_>>();

        let mut removed = vec![];
        for lse_idx in lse_idxs {
            let lse = &mut arena[lse_idx];
            lse.update_age(now, scheduler);
            if lse.state() != LsaEntryState::MaxAge || !lse.is_fully_flooded()
            {
                continue;
            }
            // MaxAge LSAs with a wrapped sequence number are revived instead.
            if lse.is_self_originated()
                && lse.data.hdr.seq_no == LSA_MAX_SEQ_NO
            {
                lse.revive(now, scheduler);
                continue;
            }

            removed.push(lse.data.hdr.key());
            self.delete(arena, lse_idx, scheduler);
        }

        removed
    }

    // Returns a reference to the LSA corresponding to the given LSA key.
    pub fn get<'a>(
        &self,
        arena: &'a Arena<LsaEntry<V>>,
        key: &LsaKey<V::LsaType>,
    ) -> Option<(LsaEntryIndex, &'a LsaEntry<V>)> {
        self.tree
            .get(&key.lsa_type)
            .and_then(|lsdb_type| lsdb_type.tree.get(key).copied())
            .and_then(|lse_idx| {
                arena.get(lse_idx).map(|lse| (lse_idx, lse))
            })
    }

    // Returns a mutable reference to the LSA corresponding to the given
    // LSA key.
    pub fn get_mut<'a>(
        &mut self,
        arena: &'a mut Arena<LsaEntry<V>>,
        key: &LsaKey<V::LsaType>,
    ) -> Option<(LsaEntryIndex, &'a mut LsaEntry<V>)> {
        self.tree
            .get(&key.lsa_type)
            .and_then(|lsdb_type| lsdb_type.tree.get(key).copied())
            .and_then(move |lse_idx| {
                arena.get_mut(lse_idx).map(|lse| (lse_idx, lse))
            })
    }

    // Returns an iterator visiting all LSAs.
    //
    // LSAs are ordered by their keys.
    pub fn iter<'a>(
        &'a self,
        arena: &'a Arena<LsaEntry<V>>,
    ) -> impl Iterator<Item = (LsaEntryIndex, &'a LsaEntry<V>)> + 'a {
        self.tree
            .values()
            .flat_map(|lsdb_type| lsdb_type.iter(arena))
    }

    // Returns an iterator visiting all LSA types.
    //
    // LSA types are ordered numerically.
    pub fn iter_types(&self) -> impl Iterator<Item = &LsdbSingleType<V>> + '_ {
        self.tree.values()
    }

    // Returns an iterator visiting all LSAs of the given type.
    pub fn iter_by_type<'a>(
        &'a self,
        arena: &'a Arena<LsaEntry<V>>,
        lsa_type: V::LsaType,
    ) -> impl Iterator<Item = (LsaEntryIndex, &'a LsaEntry<V>)> + 'a {
        self.tree
            .get(&lsa_type)
            .into_iter()
            .flat_map(|lsdb_type| lsdb_type.iter(arena))
    }

    // Returns the total number of LSAs.
    pub fn lsa_count(&self) -> usize {
        self.tree.values().map(|lsdb_type| lsdb_type.lsa_count()).sum()
    }

    // Returns the sum of the checksums of all LSAs.
    pub fn cksum_sum(&self, arena: &Arena<LsaEntry<V>>) -> u32 {
        self.iter(arena)
            .map(|(_, lse)| lse.data.hdr.cksum as u32)
            .sum()
    }
}

impl<V> Default for Lsdb<V>
where
    V: Version,
{
    fn default() -> Lsdb<V> {
        Lsdb {
            tree: Default::default(),
        }
    }
}

// ===== impl LsdbSingleType =====

impl<V> LsdbSingleType<V>
where
    V: Version,
{
    pub fn lsa_type(&self) -> V::LsaType {
        self.lsa_type
    }

    pub fn lsa_count(&self) -> usize {
        self.tree.len()
    }

    // Returns an iterator visiting all LSAs of this type.
    //
    // LSAs are ordered by their keys. Entries removed from the arena are
    // skipped.
    pub fn iter<'a>(
        &'a self,
        arena: &'a Arena<LsaEntry<V>>,
    ) -> impl Iterator<Item = (LsaEntryIndex, &'a LsaEntry<V>)> + 'a {
        self.tree.values().filter_map(move |lse_idx| {
            arena.get(*lse_idx).map(|lse| (*lse_idx, lse))
        })
    }
}

// ===== unit tests =====
