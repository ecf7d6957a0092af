//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::net::{IpAddr, Ipv4Addr};

use derive_new::new;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::debug::Debug;
use crate::lsdb::LSA_INFINITY;
use crate::southbound::RouteTableClient;
use crate::version::Version;

// OSPF path types in decreasing order of preference.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum PathType {
    IntraArea,
    InterArea,
    Type1External,
    Type2External,
}

// Routing table destination.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum Destination {
    Network(IpNetwork),
    Router(Ipv4Addr),
}

// Route nexthop.
#[derive(Clone, Debug, Eq, Hash, new, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct Nexthop {
    // Nexthop interface.
    pub ifname: String,
    // Nexthop address (`None` for connected routes).
    pub addr: Option<IpAddr>,
}

// Ordered set of nexthops.
pub type Nexthops = BTreeSet<Nexthop>;

// Route computed for a destination from the point of view of a single area.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct RouteCandidate {
    pub area_id: Ipv4Addr,
    pub path_type: PathType,
    // Cost of the route. For type-2 external routes, this is the cost to
    // reach the ASBR.
    pub metric: u32,
    // External cost of type-2 external routes.
    pub type2_metric: Option<u32>,
    pub nexthops: Nexthops,
}

// All per-area candidates of a destination, along with the cached winner.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RouteSelection {
    candidates: BTreeMap<Ipv4Addr, RouteCandidate>,
    best: Option<Ipv4Addr>,
}

// Routing table. Selected network routes are pushed to a route-table client.
#[derive(Debug)]
pub struct RoutingTable<V: Version> {
    routes: BTreeMap<Destination, RouteSelection>,
    _marker: PhantomData<V>,
}

// ===== impl RouteCandidate =====

impl RouteCandidate {
    pub fn new(
        area_id: Ipv4Addr,
        path_type: PathType,
        metric: u32,
        type2_metric: Option<u32>,
        nexthops: Nexthops,
    ) -> Self {
        RouteCandidate {
            area_id,
            path_type,
            metric,
            type2_metric,
            nexthops,
        }
    }

    // Returns the metric announced to the route-table client.
    pub fn metric(&self) -> u32 {
        match self.path_type {
            PathType::IntraArea
            | PathType::InterArea
            | PathType::Type1External => self.metric,
            PathType::Type2External => {
                self.type2_metric.unwrap_or(LSA_INFINITY)
            }
        }
    }

    // Compares two candidates by preference. `Ordering::Less` means `self`
    // is preferred over `other`.
    //
    // The path type is compared first, then the cost. Type-2 external routes
    // compare only their external cost. The area ID is the last resort, so
    // that the selection is deterministic.
    pub fn cmp_preference(&self, other: &Self) -> Ordering {
        self.path_type
            .cmp(&other.path_type)
            .then_with(|| match self.path_type {
                PathType::Type2External => {
                    let a = self.type2_metric.unwrap_or(LSA_INFINITY);
                    let b = other.type2_metric.unwrap_or(LSA_INFINITY);
                    a.cmp(&b)
                }
                _ => self.metric.cmp(&other.metric),
            })
            .then_with(|| self.area_id.cmp(&other.area_id))
    }
}

// ===== impl RouteSelection =====

impl RouteSelection {
    // Adds or replaces the candidate of the candidate's area. Returns whether
    // the selected route changed.
    pub fn insert(&mut self, candidate: RouteCandidate) -> bool {
        let area_id = candidate.area_id;
        let old_best = self.best().cloned();
        self.candidates.insert(area_id, candidate);

        match self.best {
            // The winner got replaced and might now be worse than another
            // candidate.
            Some(best) if best == area_id => {
                self.best = self.compute_best();
            }
            Some(best) => {
                let candidate = &self.candidates[&area_id];
                if candidate.cmp_preference(&self.candidates[&best])
                    == Ordering::Less
                {
                    self.best = Some(area_id);
                }
            }
            None => {
                self.best = Some(area_id);
            }
        }

        old_best.as_ref() != self.best()
    }

    // Removes the candidate of the given area. Returns whether the selected
    // route changed.
    pub fn remove(&mut self, area_id: Ipv4Addr) -> bool {
        if self.candidates.remove(&area_id).is_none() {
            return false;
        }

        // Removing a losing candidate doesn't affect the winner.
        if self.best != Some(area_id) {
            return false;
        }

        self.best = self.compute_best();
        true
    }

    // Returns the selected route.
    pub fn best(&self) -> Option<&RouteCandidate> {
        self.best.and_then(|area_id| self.candidates.get(&area_id))
    }

    pub fn get(&self, area_id: Ipv4Addr) -> Option<&RouteCandidate> {
        self.candidates.get(&area_id)
    }

    pub fn candidates(&self) -> impl Iterator<Item = &RouteCandidate> + '_ {
        self.candidates.values()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    fn compute_best(&self) -> Option<Ipv4Addr> {
        self.candidates
            .values()
            .min_by(|a, b| a.cmp_preference(b))
            .map(|candidate| candidate.area_id)
    }
}

// ===== impl RoutingTable =====

impl<V> RoutingTable<V>
where
    V: Version,
{
    // Updates the route of the given destination for the candidate's area.
    pub fn update(
        &mut self,
        destination: Destination,
        candidate: RouteCandidate,
        client: &mut dyn RouteTableClient,
    ) {
        let selection = self.routes.entry(destination).or_default();
        let had_route = selection.best().is_some();
        if !selection.insert(candidate) {
            return;
        }

        let Some(best) = selection.best() else {
            return;
        };
        Debug::<V>::RouteSelect(&destination, best).log();
        if let Destination::Network(prefix) = destination {
            if had_route {
                client.route_replace(
                    &prefix,
                    &best.nexthops,
                    best.metric(),
                    best.path_type,
                );
            } else {
                client.route_add(
                    &prefix,
                    &best.nexthops,
                    best.metric(),
                    best.path_type,
                );
            }
        }
    }

    // Withdraws the route of the given destination computed for the given
    // area.
    pub fn withdraw(
        &mut self,
        destination: Destination,
        area_id: Ipv4Addr,
        client: &mut dyn RouteTableClient,
    ) {
        let Some(selection) = self.routes.get_mut(&destination) else {
            return;
        };
        if !selection.remove(area_id) {
            return;
        }

        match selection.best() {
            Some(best) => {
                Debug::<V>::RouteSelect(&destination, best).log();
                if let Destination::Network(prefix) = destination {
                    client.route_replace(
                        &prefix,
                        &best.nexthops,
                        best.metric(),
                        best.path_type,
                    );
                }
            }
            None => {
                Debug::<V>::RouteDelete(&destination).log();
                if let Destination::Network(prefix) = destination {
                    client.route_delete(&prefix);
                }
                self.routes.remove(&destination);
            }
        }
    }

    // Returns the selected route of the given destination.
    pub fn get(&self, destination: &Destination) -> Option<&RouteCandidate> {
        self.routes
            .get(destination)
            .and_then(|selection| selection.best())
    }

    // Returns an iterator visiting all destinations and their selected
    // routes.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&Destination, &RouteCandidate)> + '_ {
        self.routes.iter().filter_map(|(destination, selection)| {
            selection.best().map(|best| (destination, best))
        })
    }
}

impl<V> Default for RoutingTable<V>
where
    V: Version,
{
    fn default() -> RoutingTable<V> {
        RoutingTable {
            routes: Default::default(),
            _marker: PhantomData,
        }
    }
}

// ===== unit tests =====
