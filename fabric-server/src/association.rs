//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use derive_new::new;
use fabric_utils::id::{ClientId, ControllerId, DatapathId, DataplaneId};
use fabric_utils::mac_addr::MacAddr;
use serde::Serialize;

// Binding between a client port, a datapath port and, once confirmed, a
// dataplane port.
//
// At least one of the client and datapath halves is always present.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Serialize)]
pub struct Association {
    pub client: Option<ClientPort>,
    pub datapath: Option<DatapathPort>,
    pub dataplane: Option<DataplanePort>,
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, new)]
#[derive(Serialize)]
pub struct ClientPortKey {
    pub client_id: ClientId,
    pub client_port: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, new)]
#[derive(Serialize)]
pub struct ClientPort {
    pub client_id: ClientId,
    pub client_port: u32,
    pub hw_addr: MacAddr,
}

// Port of a datapath, as seen by its controller.
//
// The field order matters: ports sort by controller, then datapath, which
// allows visiting all ports of a datapath with a range query.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, new)]
#[derive(Serialize)]
pub struct DatapathPort {
    pub ct_id: ControllerId,
    pub dp_id: DatapathId,
    pub dp_port: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, new)]
#[derive(Serialize)]
pub struct DataplanePort {
    pub dataplane_id: DataplaneId,
    pub dataplane_port: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Serialize)]
pub enum AssociationStatus {
    IdleClient,
    IdleDatapath,
    Associated,
    Active,
}

// ===== impl Association =====

impl Association {
    pub(crate) fn with_client(client: ClientPort) -> Association {
        Association {
            client: Some(client),
            datapath: None,
            dataplane: None,
        }
    }

    pub(crate) fn with_datapath(datapath: DatapathPort) -> Association {
        Association {
            client: None,
            datapath: Some(datapath),
            dataplane: None,
        }
    }

    pub fn status(&self) -> AssociationStatus {
        match (&self.client, &self.datapath, &self.dataplane) {
            (Some(_), Some(_), Some(_)) => AssociationStatus::Active,
            (Some(_), Some(_), None) => AssociationStatus::Associated,
            (None, Some(_), _) => AssociationStatus::IdleDatapath,
            (_, None, _) => AssociationStatus::IdleClient,
        }
    }

    pub fn client_key(&self) -> Option<ClientPortKey> {
        self.client.as_ref().map(ClientPort::key)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.client.is_none() && self.datapath.is_none()
    }
}

// ===== impl ClientPort =====

impl ClientPort {
    pub fn key(&self) -> ClientPortKey {
        ClientPortKey::new(self.client_id, self.client_port)
    }
}

// ===== impl DatapathPort =====

impl DatapathPort {
    // Returns the lowest and highest possible ports of the given datapath.
    pub(crate) fn bounds(
        ct_id: ControllerId,
        dp_id: DatapathId,
    ) -> std::ops::RangeInclusive<DatapathPort> {
        DatapathPort::new(ct_id, dp_id, u32::MIN)
            ..=DatapathPort::new(ct_id, dp_id, u32::MAX)
    }
}

impl std::fmt::Display for DatapathPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.ct_id, self.dp_id, self.dp_port)
    }
}

// ===== impl AssociationStatus =====

impl std::fmt::Display for AssociationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssociationStatus::IdleClient => write!(f, "idle-client"),
            AssociationStatus::IdleDatapath => write!(f, "idle-datapath"),
            AssociationStatus::Associated => write!(f, "associated"),
            AssociationStatus::Active => write!(f, "active"),
        }
    }
}
