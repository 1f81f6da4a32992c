//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::id::{ClientId, ControllerId, DatapathId, DataplaneId};
use crate::mac_addr::MacAddr;
use crate::route_mod::RouteMod;
use crate::{UnboundedReceiver, UnboundedSender};

// Useful type definition(s).
pub type ProxyReceiver = UnboundedReceiver<ProxyMsg>;
pub type ClientReceiver = UnboundedReceiver<ClientMsg>;

/// Messages received by the coordinator, either from clients or from the
/// datapath-facing proxies.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum InboundMsg {
    /// A client port came up.
    ClientPortRegister {
        client_id: ClientId,
        client_port: u32,
        hw_addr: MacAddr,
    },
    /// A datapath port came up.
    DatapathPortRegister {
        ct_id: ControllerId,
        dp_id: DatapathId,
        dp_port: u32,
    },
    /// A datapath disconnected from its controller.
    DatapathDown {
        ct_id: ControllerId,
        dp_id: DatapathId,
    },
    /// Confirmation that a client port was mapped onto the dataplane.
    DataplaneMap {
        client_id: ClientId,
        client_port: u32,
        dataplane_id: DataplaneId,
        dataplane_port: u32,
    },
    /// Route update emitted by a client.
    RouteUpdate(RouteMod),
}

/// Messages sent to the proxy serving a given controller.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum ProxyMsg {
    /// Flow-table operation to apply on the datapath named by `id`.
    RouteMod(RouteMod),
    /// Binds a datapath port to a dataplane port.
    DataplaneMap {
        ct_id: ControllerId,
        dp_id: DatapathId,
        dp_port: u32,
        dataplane_id: DataplaneId,
        dataplane_port: u32,
    },
}

/// Messages sent to a client.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum ClientMsg {
    PortConfig {
        client_id: ClientId,
        client_port: u32,
        operation: PortConfigOp,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PortConfigOp {
    Reset,
    MapSuccess,
}

/// Keyed publish/subscribe bus connecting the coordinator to its agents.
///
/// Each destination (a controller for proxies, a client for routing engines)
/// has at most one live subscriber. Sends never block and are never retried.
#[derive(Clone, Debug, Default)]
pub struct IpcBus {
    subscribers: Arc<Mutex<Subscribers>>,
}

#[derive(Debug, Default)]
struct Subscribers {
    proxies: BTreeMap<ControllerId, UnboundedSender<ProxyMsg>>,
    clients: BTreeMap<ClientId, UnboundedSender<ClientMsg>>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Destination {
    Proxy(ControllerId),
    Client(ClientId),
}

// IPC delivery errors.
#[derive(Debug, Eq, PartialEq)]
pub enum IpcError {
    NoSubscriber(Destination),
    ChannelClosed(Destination),
}

// ===== impl IpcBus =====

impl IpcBus {
    // Subscribes to messages destined to the proxy serving `ct_id`.
    //
    // A previous subscription for the same controller is superseded.
    pub fn subscribe_proxy(&self, ct_id: ControllerId) -> ProxyReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.proxies.insert(ct_id, tx);
        rx
    }

    // Subscribes to messages destined to the given client.
    //
    // A previous subscription for the same client is superseded.
    pub fn subscribe_client(&self, client_id: ClientId) -> ClientReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.clients.insert(client_id, tx);
        rx
    }

    pub fn send_proxy(
        &self,
        ct_id: ControllerId,
        msg: ProxyMsg,
    ) -> Result<(), IpcError> {
        let mut subscribers = self.subscribers.lock().unwrap();
        send(&mut subscribers.proxies, ct_id, msg, Destination::Proxy(ct_id))
    }

    pub fn send_client(
        &self,
        client_id: ClientId,
        msg: ClientMsg,
    ) -> Result<(), IpcError> {
        let mut subscribers = self.subscribers.lock().unwrap();
        send(
            &mut subscribers.clients,
            client_id,
            msg,
            Destination::Client(client_id),
        )
    }
}

// ===== impl Destination =====

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Proxy(ct_id) => write!(f, "proxy {ct_id}"),
            Destination::Client(client_id) => write!(f, "client {client_id}"),
        }
    }
}

// ===== impl IpcError =====

impl IpcError {
    pub fn destination(&self) -> Destination {
        match self {
            IpcError::NoSubscriber(dst) | IpcError::ChannelClosed(dst) => *dst,
        }
    }
}

impl std::fmt::Display for IpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IpcError::NoSubscriber(..) => {
                write!(f, "no subscriber for destination")
            }
            IpcError::ChannelClosed(..) => {
                write!(f, "subscriber channel closed")
            }
        }
    }
}

impl std::error::Error for IpcError {}

// ===== helper functions =====

fn send<K: Ord, T>(
    subscribers: &mut BTreeMap<K, UnboundedSender<T>>,
    key: K,
    msg: T,
    dst: Destination,
) -> Result<(), IpcError> {
    let Some(tx) = subscribers.get(&key) else {
        return Err(IpcError::NoSubscriber(dst));
    };
    if tx.send(msg).is_err() {
        // The receiving end is gone, forget about it.
        subscribers.remove(&key);
        return Err(IpcError::ChannelClosed(dst));
    }

    Ok(())
}

// ===== unit tests =====
