//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use fabric_utils::id::{ClientId, ControllerId, DatapathId};
use fabric_utils::ipc::IpcBus;
use fabric_utils::mac_addr::MacAddr;
use fabric_utils::route_mod::{
    Action, Match, RouteMod, RouteModKind, RouteOption,
};

use crate::Master;
use crate::consts::{OUTPUT_TABLE, PORT_TABLE, PRIORITY_HIGH, ROUTE_TABLE};
use crate::error::Error;
use crate::ipc;
use crate::link::LinkStatus;

// ===== global functions =====

// Installs a client route update on the datapath bound to its egress port,
// and replicates it on every datapath linked to that one.
pub(crate) fn propagate(
    master: &mut Master,
    mut route_mod: RouteMod,
) -> Result<(), Error> {
    let client_id = ClientId::new(route_mod.id);

    // The output port names the client port the route egresses through.
    let Some(client_port) = route_mod.take_output() else {
        return Err(Error::RouteMissingOutput(client_id));
    };
    let Some(datapath) = master
        .associations
        .get_by_client(client_id, client_port)
        .and_then(|(_, assoc)| assoc.datapath)
    else {
        return Err(Error::RouteUnknownClientPort(client_id, client_port));
    };

    // Build one replica per datapath linked to the egress datapath.
    let replicas = master
        .links
        .iter_by_remote_datapath(datapath.ct_id, datapath.dp_id)
        .filter(|link| link.status() == LinkStatus::Active)
        .filter_map(|link| Some((link.local?, link.remote?)))
        .map(|(local, remote)| {
            let mut replica = RouteMod::new(route_mod.kind, local.dp_id.get());
            replica.matches = route_mod.matches.clone();
            replica.actions = vec![
                Action::SetEthDst(remote.hw_addr),
                Action::WriteMetadata(local.dp_port.into()),
                Action::GotoTable(OUTPUT_TABLE),
            ];
            replica.options = route_mod.options.clone();
            replica.options.push(RouteOption::TableNo(ROUTE_TABLE));
            replica.options.push(RouteOption::CtId(local.ct_id));
            (local.ct_id, replica)
        })
        .collect::<Vec<_>>();

    // Rewrite the route update for the egress datapath.
    route_mod.id = datapath.dp_id.get();
    if route_mod.kind == RouteModKind::Add {
        route_mod
            .actions
            .push(Action::WriteMetadata(datapath.dp_port.into()));
        route_mod.actions.push(Action::GotoTable(OUTPUT_TABLE));
    }
    route_mod.options.push(RouteOption::TableNo(ROUTE_TABLE));
    route_mod.options.push(RouteOption::CtId(datapath.ct_id));
    ipc::send_route_mod(&master.ipc, datapath.ct_id, route_mod);

    for (ct_id, replica) in replicas {
        ipc::send_route_mod(&master.ipc, ct_id, replica);
    }

    Ok(())
}

// Returns the pair of rules accepting traffic addressed to a port and
// emitting traffic out of it.
//
// Without a port, only a rule accepting traffic addressed to `hw_addr` on any
// port is returned.
pub fn port_config_rules(
    ct_id: ControllerId,
    dp_id: DatapathId,
    dp_port: Option<u32>,
    hw_addr: MacAddr,
) -> Vec<RouteMod> {
    let mut rules = vec![];

    let mut input = RouteMod::new(RouteModKind::Add, dp_id.get())
        .with_match(Match::Ethernet(hw_addr));
    if let Some(dp_port) = dp_port {
        input = input.with_match(Match::InPort(dp_port));
    }
    let input = input
        .with_action(Action::GotoTable(ROUTE_TABLE))
        .with_option(RouteOption::TableNo(PORT_TABLE))
        .with_option(RouteOption::CtId(ct_id))
        .with_option(RouteOption::Priority(PRIORITY_HIGH));
    rules.push(input);

    if let Some(dp_port) = dp_port {
        let output = RouteMod::new(RouteModKind::Add, dp_id.get())
            .with_match(Match::Metadata(dp_port.into()))
            .with_action(Action::SetEthSrc(hw_addr))
            .with_action(Action::Output(dp_port))
            .with_option(RouteOption::CtId(ct_id))
            .with_option(RouteOption::TableNo(OUTPUT_TABLE))
            .with_option(RouteOption::Priority(PRIORITY_HIGH));
        rules.push(output);
    }

    rules
}

pub(crate) fn send_port_config(
    ipc_bus: &IpcBus,
    ct_id: ControllerId,
    dp_id: DatapathId,
    dp_port: Option<u32>,
    hw_addr: MacAddr,
) {
    for rule in port_config_rules(ct_id, dp_id, dp_port, hw_addr) {
        ipc::send_route_mod(ipc_bus, ct_id, rule);
    }
}
