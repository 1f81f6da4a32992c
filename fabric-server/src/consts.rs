//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use fabric_utils::id::DatapathId;

// Flow table stages.
pub const PORT_TABLE: u8 = 0;
pub const ROUTE_TABLE: u8 = 3;
pub const OUTPUT_TABLE: u8 = 5;

// Flow priorities.
pub const PRIORITY_LOWEST: u16 = 0x0000;
pub const PRIORITY_BAND: u16 = 0x000a;
pub const PRIORITY_HIGH: u16 = 0x8020;

// Ethertypes.
pub const ETHERTYPE_IP: u16 = 0x0800;
pub const ETHERTYPE_ARP: u16 = 0x0806;
pub const ETHERTYPE_IPV6: u16 = 0x86dd;
// Ethertype of the fabric discovery frames exchanged with the clients.
pub const ETHERTYPE_DISCOVERY: u16 = 0x0a0a;

// IP protocols.
pub const IPPROTO_ICMP: u8 = 1;
pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;
pub const IPPROTO_ICMPV6: u8 = 58;
pub const IPPROTO_OSPF: u8 = 89;

// Well-known TCP ports.
pub const TPORT_BGP: u16 = 179;
pub const TPORT_LDP: u16 = 646;

pub const RIPV2_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 9);

// Datapath identifier of the default aggregation switch.
pub const AGGREGATION_SWITCH_ID: DatapathId = DatapathId::new(0x7266767372667673);

// Capacity of the master's inbound channel.
pub const INBOUND_CHANNEL_SIZE: usize = 1024;
