//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::path::Path;

use derive_new::new;
use fabric_utils::id::{ClientId, ControllerId, DatapathId};
use fabric_utils::mac_addr::MacAddr;
use serde::{Deserialize, Serialize};

use crate::association::DatapathPort;
use crate::consts::AGGREGATION_SWITCH_ID;
use crate::error::ConfigError;
use crate::link::LinkEndpoint;

// Static configuration consulted by the coordinator.
#[derive(Debug)]
pub struct Config {
    pub port_map: PortMap,
    pub isl_map: IslMap,
    pub aggregation_switches: BTreeSet<DatapathId>,
}

// One row of the port-mapping table.
#[derive(Clone, Copy, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct PortMapEntry {
    #[serde(rename = "vm_id")]
    pub client_id: ClientId,
    #[serde(rename = "vm_port")]
    pub client_port: u32,
    pub ct_id: ControllerId,
    pub dp_id: DatapathId,
    pub dp_port: u32,
}

// One row of the inter-switch link table.
#[derive(Clone, Copy, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct IslConfigEntry {
    #[serde(rename = "vm_id")]
    pub client_id: ClientId,
    pub ct_id: ControllerId,
    pub dp_id: DatapathId,
    pub dp_port: u32,
    #[serde(rename = "eth_addr")]
    pub hw_addr: MacAddr,
    pub rem_ct: ControllerId,
    pub rem_id: DatapathId,
    pub rem_port: u32,
    #[serde(rename = "rem_eth_addr")]
    pub rem_hw_addr: MacAddr,
}

#[derive(Debug, Default)]
pub struct PortMap {
    entries: Vec<PortMapEntry>,
}

#[derive(Debug, Default)]
pub struct IslMap {
    entries: Vec<IslConfigEntry>,
}

// ===== impl Config =====

impl Config {
    pub fn new(port_map: PortMap, isl_map: IslMap) -> Config {
        Config {
            port_map,
            isl_map,
            aggregation_switches: [AGGREGATION_SWITCH_ID].into(),
        }
    }

    pub fn is_aggregation_switch(&self, dp_id: DatapathId) -> bool {
        self.aggregation_switches.contains(&dp_id)
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new(Default::default(), Default::default())
    }
}

// ===== impl PortMap =====

impl PortMap {
    pub fn from_entries(entries: Vec<PortMapEntry>) -> PortMap {
        PortMap { entries }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<PortMap, ConfigError> {
        load_csv(path.as_ref()).map(PortMap::from_entries)
    }

    pub fn by_client_port(
        &self,
        client_id: ClientId,
        client_port: u32,
    ) -> Option<&PortMapEntry> {
        self.entries.iter().find(|entry| {
            entry.client_id == client_id && entry.client_port == client_port
        })
    }

    pub fn by_datapath_port(&self, port: &DatapathPort) -> Option<&PortMapEntry> {
        self.entries.iter().find(|entry| entry.datapath_port() == *port)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ===== impl PortMapEntry =====

impl PortMapEntry {
    pub fn datapath_port(&self) -> DatapathPort {
        DatapathPort::new(self.ct_id, self.dp_id, self.dp_port)
    }
}

// ===== impl IslMap =====

impl IslMap {
    pub fn from_entries(entries: Vec<IslConfigEntry>) -> IslMap {
        IslMap { entries }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<IslMap, ConfigError> {
        load_csv(path.as_ref()).map(IslMap::from_entries)
    }

    // Returns all records having the given port as one of their endpoints.
    pub fn by_datapath_port<'a>(
        &'a self,
        port: &'a DatapathPort,
    ) -> impl Iterator<Item = &'a IslConfigEntry> + 'a {
        self.entries.iter().filter(move |entry| {
            entry.local().port() == *port || entry.remote().port() == *port
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ===== impl IslConfigEntry =====

impl IslConfigEntry {
    pub fn local(&self) -> LinkEndpoint {
        LinkEndpoint::new(self.ct_id, self.dp_id, self.dp_port, self.hw_addr)
    }

    pub fn remote(&self) -> LinkEndpoint {
        LinkEndpoint::new(
            self.rem_ct,
            self.rem_id,
            self.rem_port,
            self.rem_hw_addr,
        )
    }

    // Splits the record into the endpoint owned by the given port and the
    // endpoint at the far end of the link.
    //
    // Returns `None` unless exactly one of the two endpoints is the given
    // port.
    pub fn orient(
        &self,
        port: &DatapathPort,
    ) -> Option<(LinkEndpoint, LinkEndpoint)> {
        let (local, remote) = (self.local(), self.remote());
        match (local.port() == *port, remote.port() == *port) {
            (true, false) => Some((local, remote)),
            (false, true) => Some((remote, local)),
            _ => None,
        }
    }
}

// ===== helper functions =====

fn load_csv<T>(path: &Path) -> Result<Vec<T>, ConfigError>
where
    T: serde::de::DeserializeOwned,
{
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|error| ConfigError::Open(path.to_owned(), error))?;

    rdr.deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|error| ConfigError::Parse(path.to_owned(), error))
}

// ===== unit tests =====
