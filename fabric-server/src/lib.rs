//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

pub mod association;
pub mod collections;
pub mod config;
pub mod consts;
mod datapath;
pub mod debug;
pub mod error;
mod events;
mod ipc;
pub mod link;
pub mod route;
pub mod southbound;

use std::collections::BTreeSet;

use fabric_utils::{Receiver, Sender};
use fabric_utils::id::{ControllerId, DatapathId};
use fabric_utils::ipc::{InboundMsg, IpcBus};
use tokio::sync::mpsc;
use tracing::{Instrument, debug_span};

use crate::collections::{Associations, Links};
use crate::config::Config;
use crate::consts::INBOUND_CHANNEL_SIZE;

pub use crate::datapath::default_rules;

pub struct Master {
    // IPC bus used to reach the proxies and the clients.
    pub(crate) ipc: IpcBus,
    // Static configuration.
    pub(crate) config: Config,
    // Client port to datapath port associations.
    pub(crate) associations: Associations,
    // Inter-switch links.
    pub(crate) links: Links,
    // Datapaths whose default flow entries were installed.
    pub(crate) datapaths: BTreeSet<(ControllerId, DatapathId)>,
}

// ===== impl Master =====

impl Master {
    pub fn new(ipc: IpcBus, config: Config) -> Master {
        Master {
            ipc,
            config,
            associations: Default::default(),
            links: Default::default(),
            datapaths: Default::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn associations(&self) -> &Associations {
        &self.associations
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    // Returns whether the default flow entries of the given datapath were
    // installed.
    pub fn is_initialized(
        &self,
        ct_id: ControllerId,
        dp_id: DatapathId,
    ) -> bool {
        self.datapaths.contains(&(ct_id, dp_id))
    }

    // Processes a single inbound message to completion.
    pub fn process_msg(&mut self, msg: InboundMsg) {
        ipc::process_msg(self, msg);
    }

    async fn run(&mut self, mut inbound_rx: Receiver<InboundMsg>) {
        while let Some(msg) = inbound_rx.recv().await {
            self.process_msg(msg);
        }
    }

    fn debug_span() -> tracing::Span {
        debug_span!("fabric")
    }
}

// ===== global functions =====

// Spawns the coordinator task, returning the channel used to feed it with
// inbound messages.
pub fn start(ipc: IpcBus, config: Config) -> Sender<InboundMsg> {
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_SIZE);

    tokio::spawn(async move {
        let mut master = Master::new(ipc, config);

        // Run task main loop.
        let span = Master::debug_span();
        master.run(inbound_rx).instrument(span).await;
    });

    inbound_tx
}
