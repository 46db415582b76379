//! Persistence Sync
//!
//! Keeps a [`NavigationTree`] and a [`NavigationStore`] consistent:
//!
//! - At startup, [`PersistenceSync::load_all`] rebuilds the tree from the
//!   stored rows, repairing anything that cannot be linked as stored.
//! - Afterwards it observes the tree and turns every change event into a
//!   [`StoreWrite`] on the serializing [`WriteQueue`].
//!
//! Persistence is best-effort: the in-memory tree is the source of truth
//! while the process runs, and a failed write is logged by the queue worker
//! without rolling anything back.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mynotes_core::db::{DatabaseService, LibsqlNavigationStore};
//! use mynotes_core::models::NavigationNode;
//! use mynotes_core::services::PersistenceSync;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/data.db")).await?);
//!     let sync = PersistenceSync::new(Arc::new(LibsqlNavigationStore::new(db)));
//!
//!     let (mut tree, report) = sync.load_all().await?;
//!     println!("{} repair(s) at load", report.repair_count());
//!
//!     let root = tree.root_id();
//!     tree.insert(root, NavigationNode::leaf("Groceries"), 0)?;
//!
//!     sync.shutdown().await;
//!     Ok(())
//! }
//! ```

use crate::db::{NavigationEvent, NavigationObserver, NavigationRecord, NavigationStore, StoreWrite};
use crate::models::{NavigationId, NavigationNode, NavigationTree};
use crate::operations::{SiblingOrderCalculator, WriteHandle, WriteQueue};
use crate::services::error::SyncError;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Repairs made while rebuilding the tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    /// Rows moved under the root because their parent was missing, a list,
    /// or part of a cycle
    pub reparented: Vec<NavigationId>,
    /// Rows whose position was rewritten to remove duplicates
    pub renumbered: Vec<NavigationId>,
    /// Raw ids of rows that could not be loaded at all
    pub skipped: Vec<String>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.reparented.is_empty() && self.renumbered.is_empty() && self.skipped.is_empty()
    }

    pub fn repair_count(&self) -> usize {
        self.reparented.len() + self.renumbered.len() + self.skipped.len()
    }
}

/// A validated row waiting to be linked
#[derive(Debug)]
struct PendingNode {
    id: NavigationId,
    title: String,
    position: i64,
    is_composite: bool,
}

impl PendingNode {
    fn into_node(self) -> NavigationNode {
        NavigationNode::restore(self.id, self.title, self.position, self.is_composite)
    }
}

/// Bridges the in-memory tree and the navigation store
#[derive(Clone)]
pub struct PersistenceSync {
    store: Arc<dyn NavigationStore>,
    queue: WriteQueue,
}

impl PersistenceSync {
    /// Create the sync and start its write queue
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(store: Arc<dyn NavigationStore>) -> Self {
        Self::with_queue(store, WriteQueue::spawn())
    }

    pub fn with_queue(store: Arc<dyn NavigationStore>, queue: WriteQueue) -> Self {
        Self { store, queue }
    }

    pub fn queue(&self) -> &WriteQueue {
        &self.queue
    }

    /// Queue one write against the store
    pub fn submit(&self, write: StoreWrite) -> WriteHandle {
        let store = self.store.clone();
        self.queue
            .submit(move || async move { store.apply(&write).await })
    }

    /// Rebuild the tree from storage and start observing it
    ///
    /// Every row ends up in the tree exactly once. Rows that cannot be
    /// linked where they are stored are attached under the root, and
    /// duplicate sibling positions are renumbered; both repairs are
    /// logged, listed in the [`LoadReport`] and written back.
    pub async fn load_all(&self) -> Result<(NavigationTree, LoadReport), SyncError> {
        let records = self.store.load_all().await?;
        let row_count = records.len();
        let mut report = LoadReport::default();
        let mut groups = Self::group_by_parent(records, &mut report);

        let mut tree = NavigationTree::new(NavigationNode::root());
        let root_id = tree.root_id();
        let mut repairs = Vec::new();
        let mut frontier = VecDeque::from([root_id]);

        loop {
            // Breadth-first: link each container's stored children in order
            while let Some(parent_id) = frontier.pop_front() {
                let Some(mut group) = groups.remove(&parent_id) else {
                    continue;
                };
                Self::renumber_duplicates(parent_id, &mut group, &mut repairs, &mut report);

                for pending in group {
                    let id = pending.id;
                    let is_composite = pending.is_composite;
                    tree.restore_child(parent_id, pending.into_node())?;
                    if is_composite {
                        frontier.push_back(id);
                    }
                }
            }

            if groups.is_empty() {
                break;
            }

            for pending in Self::take_orphan_heads(&mut groups) {
                let position = tree.tail_position(root_id)?;
                tracing::warn!(
                    "Navigation node '{}' ('{}') is not reachable from the root; attaching it at the end of the top level",
                    pending.id,
                    pending.title
                );
                report.reparented.push(pending.id);
                repairs.push(StoreWrite::UpdateParent {
                    id: pending.id,
                    parent: root_id,
                    position,
                });

                let id = pending.id;
                let is_composite = pending.is_composite;
                tree.restore_child(root_id, PendingNode { position, ..pending }.into_node())?;
                if is_composite {
                    frontier.push_back(id);
                }
            }
        }

        tree.subscribe(Arc::new(self.clone()));
        for write in repairs {
            drop(self.submit(write));
        }

        tracing::info!(
            "Loaded navigation tree: {} row(s), {} node(s), {} reparented, {} renumbered, {} skipped",
            row_count,
            tree.len() - 1,
            report.reparented.len(),
            report.renumbered.len(),
            report.skipped.len()
        );

        Ok((tree, report))
    }

    /// Wait until every write submitted so far has run
    pub async fn flush(&self) {
        let marker = self.queue.submit(|| async { Ok(0) });
        // A closed queue has nothing left to run
        let _ = marker.wait().await;
    }

    /// Stop accepting writes and drain the queue
    pub async fn shutdown(&self) {
        self.queue.shutdown().await;
    }

    /// Validate rows and bucket them by parent id, each bucket sorted by (position, id)
    ///
    /// Rows with unusable parents are keyed under [`NavigationId::EMPTY`],
    /// which never matches a node, so they take the orphan path.
    fn group_by_parent(
        records: Vec<NavigationRecord>,
        report: &mut LoadReport,
    ) -> HashMap<NavigationId, Vec<PendingNode>> {
        let mut groups: HashMap<NavigationId, Vec<PendingNode>> = HashMap::new();
        let mut seen = HashSet::new();

        for record in records {
            let id = match record.id.parse::<NavigationId>() {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!("Skipping navigation row with unusable id: {}", e);
                    report.skipped.push(record.id);
                    continue;
                }
            };
            if !seen.insert(id) {
                tracing::warn!("Skipping duplicate navigation row '{}'", id);
                report.skipped.push(record.id);
                continue;
            }

            let parent = NavigationId::parse_reference(&record.parent).unwrap_or_else(|_| {
                tracing::warn!(
                    "Navigation row '{}' has unusable parent '{}'",
                    id,
                    record.parent
                );
                NavigationId::EMPTY
            });

            groups.entry(parent).or_default().push(PendingNode {
                id,
                title: record.title,
                position: record.position,
                is_composite: record.is_composite,
            });
        }

        for group in groups.values_mut() {
            group.sort_by(|a, b| a.position.cmp(&b.position).then(a.id.cmp(&b.id)));
        }
        groups
    }

    /// Replace tied positions in a sorted group with `0..n`
    fn renumber_duplicates(
        parent_id: NavigationId,
        group: &mut [PendingNode],
        repairs: &mut Vec<StoreWrite>,
        report: &mut LoadReport,
    ) {
        let positions: Vec<i64> = group.iter().map(|p| p.position).collect();
        if SiblingOrderCalculator::is_strictly_ascending(&positions) {
            return;
        }

        tracing::warn!(
            "Duplicate sibling positions under '{}'; renumbering {} node(s)",
            parent_id,
            group.len()
        );
        for (pending, position) in group
            .iter_mut()
            .zip(SiblingOrderCalculator::rebalance(positions.len()))
        {
            if pending.position != position {
                pending.position = position;
                report.renumbered.push(pending.id);
                repairs.push(StoreWrite::UpdatePosition {
                    id: pending.id,
                    position,
                });
            }
        }
    }

    /// Remove the rows to attach under the root in this round
    ///
    /// A head is a row whose parent is not another unlinked group. If every
    /// remaining row is inside a cycle of groups, the smallest id breaks it.
    fn take_orphan_heads(groups: &mut HashMap<NavigationId, Vec<PendingNode>>) -> Vec<PendingNode> {
        let unlinked_groups: HashSet<NavigationId> = groups
            .values()
            .flatten()
            .filter(|p| p.is_composite)
            .map(|p| p.id)
            .collect();

        let dangling: Vec<NavigationId> = groups
            .keys()
            .filter(|parent| !unlinked_groups.contains(parent))
            .copied()
            .collect();

        let mut heads: Vec<PendingNode> = if dangling.is_empty() {
            let smallest = groups
                .iter()
                .flat_map(|(parent, group)| group.iter().map(move |p| (p.id, *parent)))
                .min();
            match smallest {
                Some((id, parent)) => {
                    let mut taken = Vec::new();
                    if let Some(group) = groups.get_mut(&parent) {
                        if let Some(index) = group.iter().position(|p| p.id == id) {
                            taken.push(group.remove(index));
                        }
                        if group.is_empty() {
                            groups.remove(&parent);
                        }
                    }
                    taken
                }
                None => Vec::new(),
            }
        } else {
            dangling
                .into_iter()
                .filter_map(|parent| groups.remove(&parent))
                .flatten()
                .collect()
        };

        heads.sort_by(|a, b| a.position.cmp(&b.position).then(a.id.cmp(&b.id)));
        heads
    }
}

impl NavigationObserver for PersistenceSync {
    fn on_event(&self, event: &NavigationEvent) {
        let write = StoreWrite::from(event);
        tracing::debug!("Queueing {} for '{}'", write.kind(), write.target());
        // Fire-and-forget; the worker logs failures
        drop(self.submit(write));
    }
}
