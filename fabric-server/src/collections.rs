//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

use fabric_utils::id::{ClientId, ControllerId, DatapathId};
use generational_arena::{Arena, Index};

use crate::association::{
    Association, ClientPort, ClientPortKey, DatapathPort, DataplanePort,
};
use crate::link::{Link, LinkEndpoint};

pub type AssociationIndex = Index;
pub type LinkIndex = Index;

#[derive(Debug, Default)]
pub struct Associations {
    // Association arena.
    arena: Arena<Association>,
    // Association binary tree keyed by client port (1:1).
    client_tree: BTreeMap<ClientPortKey, AssociationIndex>,
    // Association binary tree keyed by datapath port (1:1).
    datapath_tree: BTreeMap<DatapathPort, AssociationIndex>,
}

#[derive(Debug, Default)]
pub struct Links {
    // Link arena.
    arena: Arena<Link>,
    // Link binary tree keyed by local datapath port (1:1).
    local_tree: BTreeMap<DatapathPort, LinkIndex>,
    // Link binary tree keyed by remote datapath port (1:1).
    remote_tree: BTreeMap<DatapathPort, LinkIndex>,
}

// ===== impl Associations =====

impl Associations {
    // Registers a client port that isn't bound to any datapath port yet.
    //
    // An existing idle entry for the same client port has its hardware
    // address refreshed. Entries already bound to a datapath port are left
    // untouched.
    pub(crate) fn insert_client(
        &mut self,
        client: ClientPort,
    ) -> AssociationIndex {
        if let Some(assoc_idx) = self.client_tree.get(&client.key()).copied() {
            let assoc = &mut self.arena[assoc_idx];
            if assoc.datapath.is_none() {
                assoc.client = Some(client);
            }
            return assoc_idx;
        }

        let assoc_idx = self.arena.insert(Association::with_client(client));
        self.client_tree.insert(client.key(), assoc_idx);
        assoc_idx
    }

    // Registers a datapath port that isn't bound to any client port yet.
    pub(crate) fn insert_datapath(
        &mut self,
        datapath: DatapathPort,
    ) -> AssociationIndex {
        if let Some(assoc_idx) = self.datapath_tree.get(&datapath).copied() {
            return assoc_idx;
        }

        let assoc_idx =
            self.arena.insert(Association::with_datapath(datapath));
        self.datapath_tree.insert(datapath, assoc_idx);
        assoc_idx
    }

    // Binds the given client port to the entry at `assoc_idx`.
    //
    // Any other entry holding the same client port is merged into this one.
    pub(crate) fn bind_client(
        &mut self,
        assoc_idx: AssociationIndex,
        client: ClientPort,
    ) {
        let key = client.key();
        if let Some(old_idx) = self.client_tree.get(&key).copied()
            && old_idx != assoc_idx
        {
            self.delete(old_idx);
        }

        let assoc = &mut self.arena[assoc_idx];
        if let Some(old_key) = assoc.client_key() {
            self.client_tree.remove(&old_key);
        }
        assoc.client = Some(client);
        self.client_tree.insert(key, assoc_idx);
    }

    // Binds the given datapath port to the entry at `assoc_idx`.
    //
    // Any other entry holding the same datapath port is merged into this one.
    pub(crate) fn bind_datapath(
        &mut self,
        assoc_idx: AssociationIndex,
        datapath: DatapathPort,
    ) {
        if let Some(old_idx) = self.datapath_tree.get(&datapath).copied()
            && old_idx != assoc_idx
        {
            self.delete(old_idx);
        }

        let assoc = &mut self.arena[assoc_idx];
        if let Some(old) = assoc.datapath.take() {
            self.datapath_tree.remove(&old);
        }
        assoc.datapath = Some(datapath);
        self.datapath_tree.insert(datapath, assoc_idx);
    }

    pub(crate) fn bind_dataplane(
        &mut self,
        assoc_idx: AssociationIndex,
        dataplane: DataplanePort,
    ) {
        self.arena[assoc_idx].dataplane = Some(dataplane);
    }

    // Clears the datapath and dataplane halves of the entry at `assoc_idx`,
    // returning the client half (if any).
    //
    // Entries left without any half are removed.
    pub(crate) fn unbind_datapath(
        &mut self,
        assoc_idx: AssociationIndex,
    ) -> Option<ClientPort> {
        let assoc = &mut self.arena[assoc_idx];
        if let Some(datapath) = assoc.datapath.take() {
            self.datapath_tree.remove(&datapath);
        }
        assoc.dataplane = None;
        let client = assoc.client;
        if assoc.is_empty() {
            self.arena.remove(assoc_idx);
        }
        client
    }

    fn delete(&mut self, assoc_idx: AssociationIndex) {
        let assoc = &self.arena[assoc_idx];

        // Unlink entry from different collections.
        if let Some(key) = assoc.client_key() {
            self.client_tree.remove(&key);
        }
        if let Some(datapath) = &assoc.datapath {
            self.datapath_tree.remove(datapath);
        }

        // Remove entry from the arena.
        self.arena.remove(assoc_idx);
    }

    pub fn get(&self, assoc_idx: AssociationIndex) -> Option<&Association> {
        self.arena.get(assoc_idx)
    }

    // Returns a reference to the entry corresponding to the given client
    // port.
    pub fn get_by_client(
        &self,
        client_id: ClientId,
        client_port: u32,
    ) -> Option<(AssociationIndex, &Association)> {
        self.client_tree
            .get(&ClientPortKey::new(client_id, client_port))
            .copied()
            .map(|assoc_idx| (assoc_idx, &self.arena[assoc_idx]))
    }

    // Returns a reference to the entry corresponding to the given datapath
    // port.
    pub fn get_by_datapath(
        &self,
        datapath: &DatapathPort,
    ) -> Option<(AssociationIndex, &Association)> {
        self.datapath_tree
            .get(datapath)
            .copied()
            .map(|assoc_idx| (assoc_idx, &self.arena[assoc_idx]))
    }

    // Returns an iterator over the indexes of all entries bound to the given
    // datapath.
    //
    // Entries are ordered by their datapath ports.
    pub fn indexes_by_datapath(
        &self,
        ct_id: ControllerId,
        dp_id: DatapathId,
    ) -> impl Iterator<Item = AssociationIndex> + '_ {
        self.datapath_tree
            .range(DatapathPort::bounds(ct_id, dp_id))
            .map(|(_, assoc_idx)| *assoc_idx)
    }

    // Returns an iterator visiting all entries.
    //
    // Order of iteration is not defined.
    pub fn iter(&self) -> impl Iterator<Item = &'_ Association> + '_ {
        self.arena.iter().map(|(_, assoc)| assoc)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

impl std::ops::Index<AssociationIndex> for Associations {
    type Output = Association;

    fn index(&self, index: AssociationIndex) -> &Self::Output {
        &self.arena[index]
    }
}

// ===== impl Links =====

impl Links {
    // Registers the local half of a link whose remote end hasn't shown up
    // yet.
    pub(crate) fn insert_local(
        &mut self,
        client_id: Option<ClientId>,
        local: LinkEndpoint,
    ) -> LinkIndex {
        if let Some(link_idx) = self.local_tree.get(&local.port()).copied() {
            let link = &mut self.arena[link_idx];
            if link.remote.is_none() {
                link.client_id = client_id;
                link.local = Some(local);
            }
            return link_idx;
        }

        let link = Link {
            client_id,
            local: Some(local),
            remote: None,
        };
        let link_idx = self.arena.insert(link);
        self.local_tree.insert(local.port(), link_idx);
        link_idx
    }

    // Registers a fully known link half.
    pub(crate) fn insert_active(
        &mut self,
        client_id: Option<ClientId>,
        local: LinkEndpoint,
        remote: LinkEndpoint,
    ) -> LinkIndex {
        let link_idx = self.arena.insert(Link {
            client_id,
            local: None,
            remote: None,
        });
        self.bind_local(link_idx, local);
        self.bind_remote(link_idx, remote);
        link_idx
    }

    // Sets the local half of the link at `link_idx`.
    //
    // Any other link holding the same local port is superseded.
    pub(crate) fn bind_local(&mut self, link_idx: LinkIndex, local: LinkEndpoint) {
        let port = local.port();
        if let Some(old_idx) = self.local_tree.get(&port).copied()
            && old_idx != link_idx
        {
            self.delete(old_idx);
        }

        let link = &mut self.arena[link_idx];
        if let Some(old) = link.local.take() {
            self.local_tree.remove(&old.port());
        }
        link.local = Some(local);
        self.local_tree.insert(port, link_idx);
    }

    // Sets the remote half of the link at `link_idx`.
    //
    // Any other link holding the same remote port is superseded.
    pub(crate) fn bind_remote(
        &mut self,
        link_idx: LinkIndex,
        remote: LinkEndpoint,
    ) {
        let port = remote.port();
        if let Some(old_idx) = self.remote_tree.get(&port).copied()
            && old_idx != link_idx
        {
            self.delete(old_idx);
        }

        let link = &mut self.arena[link_idx];
        if let Some(old) = link.remote.take() {
            self.remote_tree.remove(&old.port());
        }
        link.remote = Some(remote);
        self.remote_tree.insert(port, link_idx);
    }

    // Clears the local half of the link at `link_idx`.
    //
    // Links left without any half are removed.
    pub(crate) fn unbind_local(&mut self, link_idx: LinkIndex) {
        let link = &mut self.arena[link_idx];
        if let Some(local) = link.local.take() {
            self.local_tree.remove(&local.port());
        }
        if link.is_empty() {
            self.arena.remove(link_idx);
        }
    }

    // Clears the remote half of the link at `link_idx`.
    //
    // Links left without any half are removed.
    pub(crate) fn unbind_remote(&mut self, link_idx: LinkIndex) {
        let link = &mut self.arena[link_idx];
        if let Some(remote) = link.remote.take() {
            self.remote_tree.remove(&remote.port());
        }
        if link.is_empty() {
            self.arena.remove(link_idx);
        }
    }

    fn delete(&mut self, link_idx: LinkIndex) {
        let link = &self.arena[link_idx];

        // Unlink entry from different collections.
        if let Some(local) = &link.local {
            self.local_tree.remove(&local.port());
        }
        if let Some(remote) = &link.remote {
            self.remote_tree.remove(&remote.port());
        }

        // Remove entry from the arena.
        self.arena.remove(link_idx);
    }

    pub fn get(&self, link_idx: LinkIndex) -> Option<&Link> {
        self.arena.get(link_idx)
    }

    // Returns a reference to the link whose local half is the given port.
    pub fn get_by_local(
        &self,
        port: &DatapathPort,
    ) -> Option<(LinkIndex, &Link)> {
        self.local_tree
            .get(port)
            .copied()
            .map(|link_idx| (link_idx, &self.arena[link_idx]))
    }

    // Returns a reference to the link whose remote half is the given port.
    pub fn get_by_remote(
        &self,
        port: &DatapathPort,
    ) -> Option<(LinkIndex, &Link)> {
        self.remote_tree
            .get(port)
            .copied()
            .map(|link_idx| (link_idx, &self.arena[link_idx]))
    }

    // Returns an iterator over the indexes of all links whose local half is
    // on the given datapath.
    pub fn indexes_by_local_datapath(
        &self,
        ct_id: ControllerId,
        dp_id: DatapathId,
    ) -> impl Iterator<Item = LinkIndex> + '_ {
        self.local_tree
            .range(DatapathPort::bounds(ct_id, dp_id))
            .map(|(_, link_idx)| *link_idx)
    }

    // Returns an iterator over the indexes of all links whose remote half is
    // on the given datapath.
    pub fn indexes_by_remote_datapath(
        &self,
        ct_id: ControllerId,
        dp_id: DatapathId,
    ) -> impl Iterator<Item = LinkIndex> + '_ {
        self.remote_tree
            .range(DatapathPort::bounds(ct_id, dp_id))
            .map(|(_, link_idx)| *link_idx)
    }

    // Returns an iterator visiting all links whose remote half is on the
    // given datapath.
    //
    // Links are ordered by their remote ports.
    pub fn iter_by_remote_datapath(
        &self,
        ct_id: ControllerId,
        dp_id: DatapathId,
    ) -> impl Iterator<Item = &'_ Link> + '_ {
        self.indexes_by_remote_datapath(ct_id, dp_id)
            .map(|link_idx| &self.arena[link_idx])
    }

    // Returns an iterator visiting all links.
    //
    // Order of iteration is not defined.
    pub fn iter(&self) -> impl Iterator<Item = &'_ Link> + '_ {
        self.arena.iter().map(|(_, link)| link)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

impl std::ops::Index<LinkIndex> for Links {
    type Output = Link;

    fn index(&self, index: LinkIndex) -> &Self::Output {
        &self.arena[index]
    }
}

// ===== unit tests =====
