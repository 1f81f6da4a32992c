//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(dead_code)]

use fabric_server::Master;
use fabric_server::config::{
    Config, IslConfigEntry, IslMap, PortMap, PortMapEntry,
};
use fabric_utils::UnboundedReceiver;
use fabric_utils::id::{ClientId, ControllerId, DatapathId};
use fabric_utils::ipc::{ClientMsg, InboundMsg, IpcBus, ProxyMsg};
use fabric_utils::mac_addr::MacAddr;
use fabric_utils::route_mod::RouteMod;

pub const CT0: ControllerId = ControllerId::new(0);
pub const CT1: ControllerId = ControllerId::new(1);
pub const C1: ClientId = ClientId::new(0x12a0a0a0a0a0);
pub const C2: ClientId = ClientId::new(0x12a0a0a0a0a1);
pub const D1: DatapathId = DatapathId::new(0x99);
pub const D2: DatapathId = DatapathId::new(0x9a);
pub const D3: DatapathId = DatapathId::new(0x9b);
pub const D4: DatapathId = DatapathId::new(0x9c);
pub const MAC1: MacAddr = MacAddr::new([0x12, 0xa0, 0xa0, 0xa0, 0xa0, 0x01]);
pub const MAC2: MacAddr = MacAddr::new([0x12, 0xa0, 0xa0, 0xa0, 0xa0, 0x02]);

// Number of default flow entries installed on a regular datapath.
pub const DEFAULT_RULES: usize = 17;

pub struct Fabric {
    pub master: Master,
    pub ipc: IpcBus,
}

// ===== impl Fabric =====

impl Fabric {
    pub fn new(port_map: Vec<PortMapEntry>, isl_map: Vec<IslConfigEntry>) -> Fabric {
        let config = Config::new(
            PortMap::from_entries(port_map),
            IslMap::from_entries(isl_map),
        );
        Fabric::with_config(config)
    }

    pub fn with_config(config: Config) -> Fabric {
        let ipc = IpcBus::default();
        let master = Master::new(ipc.clone(), config);
        Fabric { master, ipc }
    }

    pub fn register_client_port(
        &mut self,
        client_id: ClientId,
        client_port: u32,
        hw_addr: MacAddr,
    ) {
        self.master.process_msg(InboundMsg::ClientPortRegister {
            client_id,
            client_port,
            hw_addr,
        });
    }

    pub fn register_datapath_port(
        &mut self,
        ct_id: ControllerId,
        dp_id: DatapathId,
        dp_port: u32,
    ) {
        self.master.process_msg(InboundMsg::DatapathPortRegister {
            ct_id,
            dp_id,
            dp_port,
        });
    }

    pub fn datapath_down(&mut self, ct_id: ControllerId, dp_id: DatapathId) {
        self.master
            .process_msg(InboundMsg::DatapathDown { ct_id, dp_id });
    }

    pub fn route_update(&mut self, route_mod: RouteMod) {
        self.master.process_msg(InboundMsg::RouteUpdate(route_mod));
    }
}

// ===== global functions =====

pub fn port_map_entry(
    client_id: ClientId,
    client_port: u32,
    dp_id: DatapathId,
    dp_port: u32,
) -> PortMapEntry {
    PortMapEntry::new(client_id, client_port, CT0, dp_id, dp_port)
}

// Collects all pending messages of a subscription.
pub fn drain<T>(rx: &mut UnboundedReceiver<T>) -> Vec<T> {
    let mut msgs = vec![];
    while let Ok(msg) = rx.try_recv() {
        msgs.push(msg);
    }
    msgs
}

pub fn drain_route_mods(rx: &mut UnboundedReceiver<ProxyMsg>) -> Vec<RouteMod> {
    drain(rx)
        .into_iter()
        .filter_map(|msg| match msg {
            ProxyMsg::RouteMod(route_mod) => Some(route_mod),
            _ => None,
        })
        .collect()
}

pub fn drain_client(rx: &mut UnboundedReceiver<ClientMsg>) -> Vec<ClientMsg> {
    drain(rx)
}
