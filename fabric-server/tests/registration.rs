//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

mod common;

use fabric_server::association::{AssociationStatus, DatapathPort};
use fabric_server::consts::{
    OUTPUT_TABLE, PORT_TABLE, PRIORITY_HIGH, ROUTE_TABLE,
};
use fabric_server::route::port_config_rules;
use fabric_utils::id::DataplaneId;
use fabric_utils::ipc::{ClientMsg, InboundMsg, PortConfigOp, ProxyMsg};
use fabric_utils::route_mod::{Action, Match, RouteModKind, RouteOption};

use crate::common::*;

fn dataplane_map(fabric: &mut Fabric, client_port: u32) {
    fabric.master.process_msg(InboundMsg::DataplaneMap {
        client_id: C1,
        client_port,
        dataplane_id: DataplaneId::new(0x1),
        dataplane_port: 12,
    });
}

#[test]
fn client_then_datapath_then_dataplane() {
    let mut fabric = Fabric::new(vec![port_map_entry(C1, 7, D1, 3)], vec![]);
    let mut proxy_rx = fabric.ipc.subscribe_proxy(CT0);
    let mut client_rx = fabric.ipc.subscribe_client(C1);

    fabric.register_client_port(C1, 7, MAC1);
    let (_, assoc) = fabric.master.associations().get_by_client(C1, 7).unwrap();
    assert_eq!(assoc.status(), AssociationStatus::IdleClient);
    assert!(drain(&mut proxy_rx).is_empty());

    fabric.register_datapath_port(CT0, D1, 3);
    let (_, assoc) = fabric.master.associations().get_by_client(C1, 7).unwrap();
    assert_eq!(assoc.status(), AssociationStatus::Associated);
    assert_eq!(assoc.datapath, Some(DatapathPort::new(CT0, D1, 3)));
    let route_mods = drain_route_mods(&mut proxy_rx);
    assert_eq!(route_mods.len(), DEFAULT_RULES + 2);
    assert_eq!(
        route_mods[DEFAULT_RULES..],
        port_config_rules(CT0, D1, Some(3), MAC1)
    );

    dataplane_map(&mut fabric, 7);
    let (_, assoc) = fabric.master.associations().get_by_client(C1, 7).unwrap();
    assert_eq!(assoc.status(), AssociationStatus::Active);
    assert_eq!(
        drain(&mut proxy_rx),
        vec![ProxyMsg::DataplaneMap {
            ct_id: CT0,
            dp_id: D1,
            dp_port: 3,
            dataplane_id: DataplaneId::new(0x1),
            dataplane_port: 12,
        }]
    );
    assert_eq!(
        drain_client(&mut client_rx),
        vec![ClientMsg::PortConfig {
            client_id: C1,
            client_port: 7,
            operation: PortConfigOp::MapSuccess,
        }]
    );
}

#[test]
fn unconfigured_client_port_stays_idle() {
    let mut fabric = Fabric::new(vec![], vec![]);
    let mut proxy_rx = fabric.ipc.subscribe_proxy(CT0);

    fabric.register_client_port(C1, 7, MAC1);
    let (_, assoc) = fabric.master.associations().get_by_client(C1, 7).unwrap();
    assert_eq!(assoc.status(), AssociationStatus::IdleClient);

    // A datapath port without configuration stays idle too.
    fabric.register_datapath_port(CT0, D1, 3);
    let port = DatapathPort::new(CT0, D1, 3);
    let (_, assoc) = fabric.master.associations().get_by_datapath(&port).unwrap();
    assert_eq!(assoc.status(), AssociationStatus::IdleDatapath);
    assert_eq!(fabric.master.associations().len(), 2);
    assert_eq!(drain_route_mods(&mut proxy_rx).len(), DEFAULT_RULES);
}

#[test]
fn registration_order_is_irrelevant() {
    let mut fabric1 = Fabric::new(vec![port_map_entry(C1, 7, D1, 3)], vec![]);
    let mut proxy_rx1 = fabric1.ipc.subscribe_proxy(CT0);
    fabric1.register_client_port(C1, 7, MAC1);
    fabric1.register_datapath_port(CT0, D1, 3);

    let mut fabric2 = Fabric::new(vec![port_map_entry(C1, 7, D1, 3)], vec![]);
    let mut proxy_rx2 = fabric2.ipc.subscribe_proxy(CT0);
    fabric2.register_datapath_port(CT0, D1, 3);
    fabric2.register_client_port(C1, 7, MAC1);

    let (_, assoc1) = fabric1.master.associations().get_by_client(C1, 7).unwrap();
    let (_, assoc2) = fabric2.master.associations().get_by_client(C1, 7).unwrap();
    assert_eq!(assoc1, assoc2);
    assert_eq!(assoc1.status(), AssociationStatus::Associated);
    assert_eq!(fabric1.master.associations().len(), 1);
    assert_eq!(fabric2.master.associations().len(), 1);

    // Both orders program the datapath the same way.
    assert_eq!(
        drain_route_mods(&mut proxy_rx1),
        drain_route_mods(&mut proxy_rx2)
    );
}

#[test]
fn lookups_resolve_to_the_same_entry() {
    let mut fabric = Fabric::new(
        vec![port_map_entry(C1, 7, D1, 3), port_map_entry(C1, 8, D1, 4)],
        vec![],
    );
    fabric.register_client_port(C1, 7, MAC1);
    fabric.register_datapath_port(CT0, D1, 4);
    fabric.register_datapath_port(CT0, D1, 3);
    fabric.register_client_port(C1, 8, MAC2);

    for assoc in fabric.master.associations().iter() {
        let (Some(client), Some(datapath)) = (assoc.client, assoc.datapath)
        else {
            panic!("unassociated entry: {assoc:?}");
        };
        let by_client = fabric
            .master
            .associations()
            .get_by_client(client.client_id, client.client_port)
            .unwrap();
        let by_datapath =
            fabric.master.associations().get_by_datapath(&datapath).unwrap();
        assert_eq!(by_client.0, by_datapath.0);
        assert_eq!(by_client.1, assoc);
    }
    assert_eq!(fabric.master.associations().len(), 2);
}

#[test]
fn idle_client_port_refreshes_hw_addr() {
    let mut fabric = Fabric::new(vec![port_map_entry(C1, 7, D1, 3)], vec![]);
    let mut proxy_rx = fabric.ipc.subscribe_proxy(CT0);

    fabric.register_client_port(C1, 7, MAC1);
    fabric.register_client_port(C1, 7, MAC2);
    assert_eq!(fabric.master.associations().len(), 1);

    fabric.register_datapath_port(CT0, D1, 3);
    let route_mods = drain_route_mods(&mut proxy_rx);
    assert_eq!(
        route_mods[DEFAULT_RULES..],
        port_config_rules(CT0, D1, Some(3), MAC2)
    );
}

#[test]
fn associated_client_port_reregistration() {
    let mut fabric = Fabric::new(vec![port_map_entry(C1, 7, D1, 3)], vec![]);
    let mut proxy_rx = fabric.ipc.subscribe_proxy(CT0);
    fabric.register_client_port(C1, 7, MAC1);
    fabric.register_datapath_port(CT0, D1, 3);
    drain(&mut proxy_rx);

    // Nothing changes, nothing is sent.
    fabric.register_client_port(C1, 7, MAC2);
    let (_, assoc) = fabric.master.associations().get_by_client(C1, 7).unwrap();
    assert_eq!(assoc.status(), AssociationStatus::Associated);
    assert_eq!(assoc.client.unwrap().hw_addr, MAC1);
    assert!(drain(&mut proxy_rx).is_empty());
}

#[test]
fn port_config_pair() {
    let rules = port_config_rules(CT0, D1, Some(3), MAC1);
    assert_eq!(rules.len(), 2);

    let input = &rules[0];
    assert_eq!(input.kind, RouteModKind::Add);
    assert_eq!(input.id, D1.get());
    assert_eq!(input.matches, vec![Match::Ethernet(MAC1), Match::InPort(3)]);
    assert_eq!(input.actions, vec![Action::GotoTable(ROUTE_TABLE)]);
    assert!(input.options.contains(&RouteOption::TableNo(PORT_TABLE)));
    assert!(input.options.contains(&RouteOption::Priority(PRIORITY_HIGH)));
    assert_eq!(input.ct_id(), Some(CT0));

    let output = &rules[1];
    assert_eq!(output.matches, vec![Match::Metadata(3)]);
    assert_eq!(
        output.actions,
        vec![Action::SetEthSrc(MAC1), Action::Output(3)]
    );
    assert!(output.options.contains(&RouteOption::TableNo(OUTPUT_TABLE)));
    assert!(output.options.contains(&RouteOption::Priority(PRIORITY_HIGH)));

    // Without a port, only the input rule is built.
    let rules = port_config_rules(CT0, D1, None, MAC1);
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].matches, vec![Match::Ethernet(MAC1)]);
}

#[test]
fn stale_dataplane_map() {
    let mut fabric = Fabric::new(vec![port_map_entry(C1, 7, D1, 3)], vec![]);
    let mut proxy_rx = fabric.ipc.subscribe_proxy(CT0);
    let mut client_rx = fabric.ipc.subscribe_client(C1);

    // Unknown client port.
    dataplane_map(&mut fabric, 7);
    assert!(fabric.master.associations().is_empty());

    // Idle client port.
    fabric.register_client_port(C1, 7, MAC1);
    dataplane_map(&mut fabric, 7);
    let (_, assoc) = fabric.master.associations().get_by_client(C1, 7).unwrap();
    assert_eq!(assoc.status(), AssociationStatus::IdleClient);

    // Already active.
    fabric.register_datapath_port(CT0, D1, 3);
    dataplane_map(&mut fabric, 7);
    drain(&mut proxy_rx);
    drain(&mut client_rx);
    dataplane_map(&mut fabric, 7);
    assert!(drain(&mut proxy_rx).is_empty());
    assert!(drain(&mut client_rx).is_empty());
}
