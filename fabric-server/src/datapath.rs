//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use fabric_utils::id::{ControllerId, DatapathId};
use fabric_utils::mac_addr::MacAddr;
use fabric_utils::route_mod::{
    Action, Match, RouteMod, RouteModKind, RouteOption,
};

use crate::Master;
use crate::consts::*;
use crate::debug::Debug;
use crate::ipc;
use crate::route;

// Protocol traffic punted to the controller on regular switches.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Punt {
    Ospf,
    BgpPassive,
    BgpActive,
    RipV2,
    Arp,
    Icmp,
    Icmpv6,
    LdpPassive,
    LdpActive,
    Discovery,
}

// ===== impl Punt =====

impl Punt {
    const ALL: [Punt; 10] = [
        Punt::Ospf,
        Punt::BgpPassive,
        Punt::BgpActive,
        Punt::RipV2,
        Punt::Arp,
        Punt::Icmp,
        Punt::Icmpv6,
        Punt::LdpPassive,
        Punt::LdpActive,
        Punt::Discovery,
    ];

    fn matches(&self) -> Vec<Match> {
        let ip = Match::Ethertype(ETHERTYPE_IP);
        let tcp = Match::NwProto(IPPROTO_TCP);
        match self {
            Punt::Ospf => vec![ip, Match::NwProto(IPPROTO_OSPF)],
            Punt::BgpPassive => vec![ip, tcp, Match::TpDst(TPORT_BGP)],
            Punt::BgpActive => vec![ip, tcp, Match::TpSrc(TPORT_BGP)],
            Punt::RipV2 => vec![
                ip,
                Match::NwProto(IPPROTO_UDP),
                Match::Ipv4 {
                    addr: RIPV2_GROUP,
                    mask: std::net::Ipv4Addr::BROADCAST,
                },
            ],
            Punt::Arp => vec![Match::Ethertype(ETHERTYPE_ARP)],
            Punt::Icmp => vec![ip, Match::NwProto(IPPROTO_ICMP)],
            Punt::Icmpv6 => vec![
                Match::Ethertype(ETHERTYPE_IPV6),
                Match::NwProto(IPPROTO_ICMPV6),
            ],
            Punt::LdpPassive => vec![ip, tcp, Match::TpDst(TPORT_LDP)],
            Punt::LdpActive => vec![ip, tcp, Match::TpSrc(TPORT_LDP)],
            Punt::Discovery => vec![Match::Ethertype(ETHERTYPE_DISCOVERY)],
        }
    }
}

// ===== global functions =====

// Installs the default flow entries of a datapath the first time one of its
// ports registers.
pub(crate) fn initialize(
    master: &mut Master,
    ct_id: ControllerId,
    dp_id: DatapathId,
) {
    if !master.datapaths.insert((ct_id, dp_id)) {
        return;
    }

    let aggregation = master.config.is_aggregation_switch(dp_id);
    Debug::DatapathInit(ct_id, dp_id, aggregation).log();

    for rule in default_rules(ct_id, dp_id, aggregation) {
        ipc::send_route_mod(&master.ipc, ct_id, rule);
    }
}

// Returns the default flow entries of a datapath, in installation order.
pub fn default_rules(
    ct_id: ControllerId,
    dp_id: DatapathId,
    aggregation: bool,
) -> Vec<RouteMod> {
    // Aggregation switches hand everything over to the controller.
    if aggregation {
        let rule = RouteMod::new(RouteModKind::Add, dp_id.get())
            .with_action(Action::Controller)
            .with_option(RouteOption::Priority(PRIORITY_HIGH))
            .with_option(RouteOption::TableNo(ROUTE_TABLE))
            .with_option(RouteOption::CtId(ct_id));
        return vec![rule];
    }

    let tables = [PORT_TABLE, ROUTE_TABLE, OUTPUT_TABLE];
    let mut rules = vec![];

    // Clear the flow tables.
    for table in tables {
        let rule = RouteMod::new(RouteModKind::Delete, dp_id.get())
            .with_option(RouteOption::Priority(PRIORITY_LOWEST))
            .with_option(RouteOption::TableNo(table))
            .with_option(RouteOption::CtId(ct_id));
        rules.push(rule);
    }

    // Accept broadcast frames, drop everything else.
    rules.extend(route::port_config_rules(
        ct_id,
        dp_id,
        None,
        MacAddr::BROADCAST,
    ));
    for table in tables {
        let rule = RouteMod::new(RouteModKind::Add, dp_id.get())
            .with_option(RouteOption::Priority(PRIORITY_LOWEST + PRIORITY_BAND))
            .with_option(RouteOption::TableNo(table))
            .with_option(RouteOption::CtId(ct_id));
        rules.push(rule);
    }

    // Punt control traffic to the controller.
    for punt in Punt::ALL {
        let mut rule = RouteMod::new(RouteModKind::Add, dp_id.get());
        rule.matches = punt.matches();
        let rule = rule
            .with_action(Action::Controller)
            .with_option(RouteOption::Priority(PRIORITY_HIGH))
            .with_option(RouteOption::TableNo(ROUTE_TABLE))
            .with_option(RouteOption::CtId(ct_id));
        rules.push(rule);
    }

    rules
}
