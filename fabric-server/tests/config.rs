//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

mod common;

use fabric_server::association::DatapathPort;
use fabric_server::config::{IslMap, PortMap, PortMapEntry};
use fabric_server::error::ConfigError;
use fabric_utils::id::{ClientId, DatapathId};
use fabric_utils::mac_addr::MacAddr;

use crate::common::*;

const PORT_MAP: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/conf/port_map.csv");
const ISL_MAP: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/conf/isl_map.csv");

#[test]
fn load_port_map() {
    let port_map = PortMap::load(PORT_MAP).unwrap();
    assert_eq!(port_map.len(), 3);

    let entry = port_map.by_client_port(C1, 2).unwrap();
    assert_eq!(*entry, PortMapEntry::new(C1, 2, CT0, D1, 2));

    let port = DatapathPort::new(CT0, D2, 1);
    let entry = port_map.by_datapath_port(&port).unwrap();
    assert_eq!(entry.client_id, ClientId::new(0x12a0a0a0a0a1));
    assert_eq!(entry.client_port, 1);
    assert!(port_map.by_client_port(C1, 3).is_none());
}

#[test]
fn load_isl_map() {
    let isl_map = IslMap::load(ISL_MAP).unwrap();
    assert_eq!(isl_map.len(), 1);

    let port = DatapathPort::new(CT0, D2, 3);
    let entry = isl_map.by_datapath_port(&port).next().unwrap();
    assert_eq!(entry.dp_id, D1);
    assert_eq!(
        entry.hw_addr,
        MacAddr::new([0x12, 0xa0, 0xa0, 0xa0, 0xa0, 0x03])
    );
    let (me, far) = entry.orient(&port).unwrap();
    assert_eq!(me.dp_id, D2);
    assert_eq!(far.dp_id, DatapathId::new(0x99));
}

#[test]
fn missing_file() {
    let error = PortMap::load("/nonexistent/port_map.csv").unwrap_err();
    assert!(matches!(error, ConfigError::Open(..)));
}
