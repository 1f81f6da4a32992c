//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use fabric_utils::id::{ClientId, ControllerId, DatapathId, DataplaneId};
use fabric_utils::ipc::{ClientMsg, PortConfigOp, ProxyMsg};
use fabric_utils::mac_addr::MacAddr;
use fabric_utils::route_mod::RouteMod;

use crate::Master;
use crate::association::{
    Association, AssociationStatus, ClientPort, DatapathPort, DataplanePort,
};
use crate::config::IslConfigEntry;
use crate::debug::Debug;
use crate::error::Error;
use crate::link::LinkStatus;
use crate::{datapath, ipc, route};

// ===== client port registration =====

pub(crate) fn process_client_port_register(
    master: &mut Master,
    client_id: ClientId,
    client_port: u32,
    hw_addr: MacAddr,
) -> Result<(), Error> {
    let client = ClientPort::new(client_id, client_port, hw_addr);

    // Look for an idle datapath port the client port is configured to use.
    let config = master.config.port_map.by_client_port(client_id, client_port);
    if config.is_none() {
        Error::ClientPortNotConfigured(client_id, client_port).log();
    }
    let idle_idx = config
        .map(|config| config.datapath_port())
        .and_then(|datapath| master.associations.get_by_datapath(&datapath))
        .filter(|(_, assoc)| assoc.status() == AssociationStatus::IdleDatapath)
        .map(|(assoc_idx, _)| assoc_idx);

    match idle_idx {
        Some(assoc_idx) => {
            master.associations.bind_client(assoc_idx, client);
            let assoc = &master.associations[assoc_idx];
            Debug::AssociationUpdate(assoc).log();

            if let Some(datapath) = assoc.datapath {
                route::send_port_config(
                    &master.ipc,
                    datapath.ct_id,
                    datapath.dp_id,
                    Some(datapath.dp_port),
                    hw_addr,
                );
            }
        }
        None => {
            let assoc_idx = master.associations.insert_client(client);
            Debug::AssociationUpdate(&master.associations[assoc_idx]).log();
        }
    }

    Ok(())
}

// ===== datapath port registration =====

pub(crate) fn process_datapath_port_register(
    master: &mut Master,
    ct_id: ControllerId,
    dp_id: DatapathId,
    dp_port: u32,
) -> Result<(), Error> {
    datapath::initialize(master, ct_id, dp_id);

    // Ports of aggregation switches aren't tracked.
    if master.config.is_aggregation_switch(dp_id) {
        return Ok(());
    }

    let port = DatapathPort::new(ct_id, dp_id, dp_port);
    if let Some(config) = master.config.port_map.by_datapath_port(&port).copied()
    {
        let idle_idx = master
            .associations
            .get_by_client(config.client_id, config.client_port)
            .filter(|(_, assoc)| assoc.status() == AssociationStatus::IdleClient)
            .map(|(assoc_idx, _)| assoc_idx);

        match idle_idx {
            Some(assoc_idx) => {
                master.associations.bind_datapath(assoc_idx, port);
                let assoc = &master.associations[assoc_idx];
                Debug::AssociationUpdate(assoc).log();

                if let Some(client) = assoc.client {
                    route::send_port_config(
                        &master.ipc,
                        ct_id,
                        dp_id,
                        Some(dp_port),
                        client.hw_addr,
                    );
                }
            }
            None => {
                register_idle_datapath_port(master, port);
            }
        }
        return Ok(());
    }

    let isl_entries = master
        .config
        .isl_map
        .by_datapath_port(&port)
        .copied()
        .collect::<Vec<_>>();
    if isl_entries.is_empty() {
        register_idle_datapath_port(master, port);
        return Ok(());
    }
    for entry in isl_entries {
        if let Err(error) = process_isl_register(master, port, entry) {
            error.log();
        }
    }

    Ok(())
}

fn register_idle_datapath_port(master: &mut Master, port: DatapathPort) {
    let assoc_idx = master.associations.insert_datapath(port);
    Debug::AssociationUpdate(&master.associations[assoc_idx]).log();
}

// Registers one end of an inter-switch link.
//
// The first end to register is kept idle. Once the far end registers too,
// both directions of the link become active.
fn process_isl_register(
    master: &mut Master,
    port: DatapathPort,
    entry: IslConfigEntry,
) -> Result<(), Error> {
    let Some((local, remote)) = entry.orient(&port) else {
        return Err(Error::IslConfigMismatch(port, entry));
    };
    let client_id = Some(entry.client_id);

    let link = master
        .links
        .get_by_local(&remote.port())
        .map(|(link_idx, link)| (link_idx, link.status()));
    match link {
        None => {
            let link_idx = master.links.insert_local(client_id, local);
            Debug::LinkUpdate(&master.links[link_idx]).log();
        }
        Some((link_idx, LinkStatus::IdleLocal)) => {
            // Complete the direction declared by the far end.
            master.links.bind_remote(link_idx, local);
            Debug::LinkUpdate(&master.links[link_idx]).log();

            // Complete the opposite direction, creating it if necessary.
            let reverse_idx = master
                .links
                .get_by_remote(&remote.port())
                .map(|(link_idx, _)| link_idx);
            let link_idx = match reverse_idx {
                Some(link_idx) => {
                    master.links.bind_local(link_idx, local);
                    link_idx
                }
                None => master.links.insert_active(client_id, local, remote),
            };
            Debug::LinkUpdate(&master.links[link_idx]).log();

            for endpoint in [local, remote] {
                route::send_port_config(
                    &master.ipc,
                    endpoint.ct_id,
                    endpoint.dp_id,
                    Some(endpoint.dp_port),
                    endpoint.hw_addr,
                );
            }
        }
        Some(_) => {
            // Link is already active.
        }
    }

    Ok(())
}

// ===== datapath down =====

pub(crate) fn process_datapath_down(
    master: &mut Master,
    ct_id: ControllerId,
    dp_id: DatapathId,
) -> Result<(), Error> {
    Debug::DatapathDown(ct_id, dp_id).log();

    // The datapath will be initialized again once it comes back.
    master.datapaths.remove(&(ct_id, dp_id));

    // Release all datapath ports, resetting the client ports bound to them.
    let assoc_idxs = master
        .associations
        .indexes_by_datapath(ct_id, dp_id)
        .collect::<Vec<_>>();
    for assoc_idx in assoc_idxs {
        let Some(client) = master.associations.unbind_datapath(assoc_idx)
        else {
            continue;
        };
        Debug::AssociationUpdate(&master.associations[assoc_idx]).log();

        let msg = ClientMsg::PortConfig {
            client_id: client.client_id,
            client_port: client.client_port,
            operation: PortConfigOp::Reset,
        };
        ipc::send_client(&master.ipc, client.client_id, msg);
    }

    // Release all link ends on the datapath.
    let link_idxs = master
        .links
        .indexes_by_local_datapath(ct_id, dp_id)
        .collect::<Vec<_>>();
    for link_idx in link_idxs {
        master.links.unbind_local(link_idx);
        if let Some(link) = master.links.get(link_idx) {
            Debug::LinkUpdate(link).log();
        }
    }
    let link_idxs = master
        .links
        .indexes_by_remote_datapath(ct_id, dp_id)
        .collect::<Vec<_>>();
    for link_idx in link_idxs {
        master.links.unbind_remote(link_idx);
        if let Some(link) = master.links.get(link_idx) {
            Debug::LinkUpdate(link).log();
        }
    }

    Ok(())
}

// ===== dataplane mapping =====

pub(crate) fn process_dataplane_map(
    master: &mut Master,
    client_id: ClientId,
    client_port: u32,
    dataplane_id: DataplaneId,
    dataplane_port: u32,
) -> Result<(), Error> {
    // Only associated ports can be mapped onto the dataplane.
    let lookup = master.associations.get_by_client(client_id, client_port);
    let Some((
        assoc_idx,
        &Association {
            datapath: Some(datapath),
            dataplane: None,
            ..
        },
    )) = lookup
    else {
        let status = lookup.map(|(_, assoc)| assoc.status());
        return Err(Error::DataplaneMapStale(client_id, client_port, status));
    };

    let dataplane = DataplanePort::new(dataplane_id, dataplane_port);
    master.associations.bind_dataplane(assoc_idx, dataplane);
    Debug::AssociationUpdate(&master.associations[assoc_idx]).log();

    let msg = ProxyMsg::DataplaneMap {
        ct_id: datapath.ct_id,
        dp_id: datapath.dp_id,
        dp_port: datapath.dp_port,
        dataplane_id,
        dataplane_port,
    };
    ipc::send_proxy(&master.ipc, datapath.ct_id, msg);

    let msg = ClientMsg::PortConfig {
        client_id,
        client_port,
        operation: PortConfigOp::MapSuccess,
    };
    ipc::send_client(&master.ipc, client_id, msg);

    Ok(())
}

// ===== route update =====

pub(crate) fn process_route_update(
    master: &mut Master,
    route_mod: RouteMod,
) -> Result<(), Error> {
    route::propagate(master, route_mod)
}
