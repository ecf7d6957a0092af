//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::route::{Nexthops, PathType};

// Route-table client.
//
// Selected routes are pushed through this interface. Kernel route entries are
// never manipulated directly.
pub trait RouteTableClient {
    fn route_add(
        &mut self,
        prefix: &IpNetwork,
        nexthops: &Nexthops,
        metric: u32,
        path_type: PathType,
    );

    fn route_replace(
        &mut self,
        prefix: &IpNetwork,
        nexthops: &Nexthops,
        metric: u32,
        path_type: PathType,
    );

    fn route_delete(&mut self, prefix: &IpNetwork);
}

// Route installation message.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct RouteMsg {
    pub prefix: IpNetwork,
    pub nexthops: Nexthops,
    pub metric: u32,
    pub path_type: PathType,
}

// Route-table operation.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum RouteOp {
    Add(RouteMsg),
    Replace(RouteMsg),
    Delete(IpNetwork),
}

// Route-table client that forwards every operation over a channel, leaving
// the actual route installation to the receiving end.
#[derive(Clone, Debug)]
pub struct RouteChannelClient {
    routep: UnboundedSender<RouteOp>,
}

// ===== impl RouteOp =====

impl RouteOp {
    pub fn prefix(&self) -> &IpNetwork {
        match self {
            RouteOp::Add(msg) | RouteOp::Replace(msg) => &msg.prefix,
            RouteOp::Delete(prefix) => prefix,
        }
    }
}

// ===== impl RouteChannelClient =====

impl RouteChannelClient {
    pub fn new(routep: UnboundedSender<RouteOp>) -> Self {
        RouteChannelClient { routep }
    }

    fn send(&self, op: RouteOp) {
        // The receiving end is gone only during shutdown.
        let _ = self.routep.send(op);
    }
}

impl RouteTableClient for RouteChannelClient {
    fn route_add(
        &mut self,
        prefix: &IpNetwork,
        nexthops: &Nexthops,
        metric: u32,
        path_type: PathType,
    ) {
        let msg = RouteMsg {
            prefix: *prefix,
            nexthops: nexthops.clone(),
            metric,
            path_type,
        };
        self.send(RouteOp::Add(msg));
    }

    fn route_replace(
        &mut self,
        prefix: &IpNetwork,
        nexthops: &Nexthops,
        metric: u32,
        path_type: PathType,
    ) {
        let msg = RouteMsg {
            prefix: *prefix,
            nexthops: nexthops.clone(),
            metric,
            path_type,
        };
        self.send(RouteOp::Replace(msg));
    }

    fn route_delete(&mut self, prefix: &IpNetwork) {
        self.send(RouteOp::Delete(*prefix));
    }
}
