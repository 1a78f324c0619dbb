//! Debug utilities for dynamic tree troubleshooting.

use std::fmt::Write;

use super::{DynRef, DynamicStats, DynamicTree, MAX_PREFIX_LEN};
use crate::key::{self, LoadKey};
use crate::noderef::{self, RadixNode, Ref};

impl DynamicTree {
    /// Render the tree structure, one node per line.
    pub fn debug_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "DynamicTree len={} {:?}", self.len, self.stats);
        Self::debug_node(&self.root, 0, &mut out);
        out
    }

    fn debug_node(r: &DynRef, indent: usize, out: &mut String) {
        let pad = "  ".repeat(indent);
        match r {
            Ref::Empty => {
                let _ = writeln!(out, "{pad}(empty)");
            }
            Ref::Leaf(record) => {
                let _ = writeln!(out, "{pad}leaf {record}");
            }
            Ref::Inner(node) => {
                let _ = writeln!(out, "{pad}{node:?}");
                for (byte, child) in node.children() {
                    let _ = writeln!(out, "{pad}  [{byte:#04x}]");
                    Self::debug_node(child, indent + 2, out);
                }
            }
        }
    }

    /// Verify structural invariants; returns the problems found.
    pub fn verify_integrity(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let leaves = noderef::count_leaves(&self.root);
        if leaves != self.len {
            issues.push(format!("len is {} but {} leaves are reachable", self.len, leaves));
        }
        let mut counted = DynamicStats::default();
        Self::verify_node(&self.root, &mut counted, &mut issues);
        if counted != self.stats {
            issues.push(format!("stats {:?} disagree with tree {:?}", self.stats, counted));
        }
        issues
    }

    fn verify_node(r: &DynRef, counted: &mut DynamicStats, issues: &mut Vec<String>) {
        let Ref::Inner(node) = r else {
            return;
        };
        counted.alloc(node.node_type());
        issues.extend(node.layout_errors());
        for (_, child) in node.children() {
            Self::verify_node(child, counted, issues);
        }
    }

    /// [`DynamicTree::verify_integrity`] plus a check that every stored
    /// prefix and branch byte agrees with the keys of the leaves below it.
    pub fn verify_integrity_with<L: LoadKey + ?Sized>(&self, loader: &L) -> Vec<String> {
        let mut issues = self.verify_integrity();
        let mut path = Vec::with_capacity(self.key_len);
        self.verify_keys(&self.root, &mut path, loader, &mut issues);
        issues
    }

    fn verify_keys<L: LoadKey + ?Sized>(&self, r: &DynRef, path: &mut Vec<u8>, loader: &L, issues: &mut Vec<String>) {
        match r {
            Ref::Empty => {}
            Ref::Leaf(record) => {
                let leaf_key = key::load(loader, *record, self.key_len);
                if !leaf_key.starts_with(path.as_slice()) {
                    issues.push(format!("leaf {} is not under path {:?}", record, path));
                }
            }
            Ref::Inner(node) => {
                let depth = path.len();
                let prefix = node.full_prefix(depth, self.key_len, loader);
                let stored = node.prefix_len().min(MAX_PREFIX_LEN);
                if prefix[..stored] != *node.inline_prefix() {
                    issues.push(format!("inline prefix of {:?} disagrees with its leaves", node));
                }
                path.extend_from_slice(&prefix);
                for (byte, child) in node.children() {
                    path.push(byte);
                    self.verify_keys(child, path, loader, issues);
                    path.pop();
                }
                path.truncate(depth);
            }
        }
    }
}
