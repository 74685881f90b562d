//! Who shared a file with whom
//!
//! An explicit adjacency map `username → usernames they shared with`, rooted
//! at the file owner. Every member has a node, possibly with no children.
//! Grants never add a second parent, so the graph stays a tree.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessGraph(BTreeMap<String, BTreeSet<String>>);

impl AccessGraph {
    /// A graph holding only `owner`.
    pub fn rooted(owner: &str) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(owner.to_string(), BTreeSet::new());
        Self(nodes)
    }

    pub fn contains(&self, user: &str) -> bool {
        self.0.contains_key(user)
    }

    /// Record that `from` shared with `to`.
    ///
    /// Returns `false` and leaves the graph unchanged if `from` is not a
    /// member or `to` already is.
    pub fn grant(&mut self, from: &str, to: &str) -> bool {
        if !self.contains(from) || self.contains(to) {
            return false;
        }
        if let Some(children) = self.0.get_mut(from) {
            children.insert(to.to_string());
        }
        self.0.insert(to.to_string(), BTreeSet::new());
        true
    }

    pub fn children(&self, user: &str) -> impl Iterator<Item = &str> {
        self.0.get(user).into_iter().flatten().map(String::as_str)
    }

    /// Every user reachable from `root` through grants, excluding `root`.
    ///
    /// Iterative DFS with a visited set; a corrupted cyclic graph still terminates.
    pub fn descendants(&self, root: &str) -> Vec<String> {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<&str> = self.children(root).collect();
        let mut found = Vec::new();

        while let Some(user) = stack.pop() {
            if user == root || !visited.insert(user) {
                continue;
            }
            found.push(user.to_string());
            stack.extend(self.children(user));
        }
        found
    }

    pub fn is_reachable(&self, from: &str, to: &str) -> bool {
        self.descendants(from).iter().any(|u| u == to)
    }

    /// Remove `target` and everyone reachable through it.
    ///
    /// Descendants are collected before any node is removed. Returns the
    /// removed users, `target` first; empty if `target` is not a member.
    pub fn remove_subtree(&mut self, target: &str) -> Vec<String> {
        if !self.contains(target) {
            return Vec::new();
        }

        let mut removed = vec![target.to_string()];
        removed.extend(self.descendants(target));

        for user in &removed {
            self.0.remove(user);
        }
        for children in self.0.values_mut() {
            for user in &removed {
                children.remove(user);
            }
        }
        removed
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
