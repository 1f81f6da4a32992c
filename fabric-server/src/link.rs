//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use derive_new::new;
use fabric_utils::id::{ClientId, ControllerId, DatapathId};
use fabric_utils::mac_addr::MacAddr;
use serde::Serialize;

use crate::association::DatapathPort;

// One directed half of an inter-switch link.
//
// At least one of the two endpoints is always present.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Serialize)]
pub struct Link {
    pub client_id: Option<ClientId>,
    pub local: Option<LinkEndpoint>,
    pub remote: Option<LinkEndpoint>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, new)]
#[derive(Serialize)]
pub struct LinkEndpoint {
    pub ct_id: ControllerId,
    pub dp_id: DatapathId,
    pub dp_port: u32,
    pub hw_addr: MacAddr,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Serialize)]
pub enum LinkStatus {
    // Only the local side is known.
    IdleLocal,
    // The local datapath went down, only the remote side is known.
    IdleRemote,
    Active,
}

// ===== impl Link =====

impl Link {
    pub fn status(&self) -> LinkStatus {
        match (&self.local, &self.remote) {
            (Some(_), Some(_)) => LinkStatus::Active,
            (None, Some(_)) => LinkStatus::IdleRemote,
            (_, None) => LinkStatus::IdleLocal,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.local.is_none() && self.remote.is_none()
    }
}

// ===== impl LinkEndpoint =====

impl LinkEndpoint {
    pub fn port(&self) -> DatapathPort {
        DatapathPort::new(self.ct_id, self.dp_id, self.dp_port)
    }
}

impl std::fmt::Display for LinkEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.port(), self.hw_addr)
    }
}

// ===== impl LinkStatus =====

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkStatus::IdleLocal => write!(f, "idle-local"),
            LinkStatus::IdleRemote => write!(f, "idle-remote"),
            LinkStatus::Active => write!(f, "active"),
        }
    }
}
