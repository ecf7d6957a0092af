//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![cfg_attr(feature = "testing", allow(dead_code, unused_variables))]
#![allow(type_alias_bounds)]

pub mod bytes;
pub mod collections;
pub mod debug;
pub mod error;
pub mod lsdb;
pub mod network;
pub mod ospfv2;
pub mod ospfv3;
pub mod packet;
pub mod route;
pub mod southbound;
pub mod tasks;
pub mod version;
