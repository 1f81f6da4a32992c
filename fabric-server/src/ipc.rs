//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use fabric_utils::id::{ClientId, ControllerId};
use fabric_utils::ipc::{ClientMsg, InboundMsg, IpcBus, ProxyMsg};
use fabric_utils::route_mod::RouteMod;

use crate::debug::Debug;
use crate::error::Error;
use crate::{Master, events};

// ===== global functions =====

pub(crate) fn process_msg(master: &mut Master, msg: InboundMsg) {
    Debug::MsgRx(&msg).log();

    let result = match msg {
        // Client port registration.
        InboundMsg::ClientPortRegister {
            client_id,
            client_port,
            hw_addr,
        } => events::process_client_port_register(
            master,
            client_id,
            client_port,
            hw_addr,
        ),
        // Datapath port registration.
        InboundMsg::DatapathPortRegister {
            ct_id,
            dp_id,
            dp_port,
        } => {
            events::process_datapath_port_register(master, ct_id, dp_id, dp_port)
        }
        // Datapath disconnection.
        InboundMsg::DatapathDown { ct_id, dp_id } => {
            events::process_datapath_down(master, ct_id, dp_id)
        }
        // Dataplane mapping confirmation.
        InboundMsg::DataplaneMap {
            client_id,
            client_port,
            dataplane_id,
            dataplane_port,
        } => events::process_dataplane_map(
            master,
            client_id,
            client_port,
            dataplane_id,
            dataplane_port,
        ),
        // Route update.
        InboundMsg::RouteUpdate(route_mod) => {
            events::process_route_update(master, route_mod)
        }
    };
    if let Err(error) = result {
        error.log();
    }
}

pub(crate) fn send_route_mod(
    ipc_bus: &IpcBus,
    ct_id: ControllerId,
    route_mod: RouteMod,
) {
    send_proxy(ipc_bus, ct_id, ProxyMsg::RouteMod(route_mod));
}

pub(crate) fn send_proxy(ipc_bus: &IpcBus, ct_id: ControllerId, msg: ProxyMsg) {
    Debug::ProxyMsgTx(ct_id, &msg).log();
    if let Err(error) = ipc_bus.send_proxy(ct_id, msg) {
        Error::from(error).log();
    }
}

pub(crate) fn send_client(
    ipc_bus: &IpcBus,
    client_id: ClientId,
    msg: ClientMsg,
) {
    Debug::ClientMsgTx(client_id, &msg).log();
    if let Err(error) = ipc_bus.send_client(client_id, msg) {
        Error::from(error).log();
    }
}
