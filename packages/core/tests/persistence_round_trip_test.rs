//! Persistence Round-Trip Tests
//!
//! Builds trees through the public API, lets the write queue persist them
//! to a real libsql database, and reloads them from disk.

#[cfg(test)]
mod persistence_round_trip_tests {
    use anyhow::Result;
    use mynotes_core::db::{
        DatabaseService, LibsqlNavigationStore, NavigationRecord, NavigationStore, StoreWrite,
    };
    use mynotes_core::{LoadReport, NavigationId, NavigationNode, NavigationTree, PersistenceSync};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::time::{timeout, Duration};

    type Shape = Vec<(NavigationId, Option<NavigationId>, String, i64, bool)>;

    async fn open_store(dir: &Path) -> Result<Arc<LibsqlNavigationStore>> {
        let db = Arc::new(DatabaseService::new(dir.join("data.db")).await?);
        Ok(Arc::new(LibsqlNavigationStore::new(db)))
    }

    async fn load(dir: &Path) -> Result<(PersistenceSync, NavigationTree, LoadReport)> {
        let sync = PersistenceSync::new(open_store(dir).await?);
        let (tree, report) = sync.load_all().await?;
        Ok((sync, tree, report))
    }

    async fn close(sync: PersistenceSync) -> Result<()> {
        timeout(Duration::from_secs(10), sync.shutdown()).await?;
        Ok(())
    }

    fn shape(tree: &NavigationTree) -> Shape {
        tree.depth_first()
            .map(|n| {
                (
                    n.id(),
                    n.parent(),
                    n.title().to_string(),
                    n.position(),
                    n.is_composite(),
                )
            })
            .collect()
    }

    fn add(tree: &mut NavigationTree, parent: NavigationId, node: NavigationNode, index: usize) -> Result<NavigationId> {
        let id = node.id();
        tree.insert(parent, node, index)?;
        Ok(id)
    }

    #[tokio::test]
    async fn test_reload_is_isomorphic() -> Result<()> {
        let temp_dir = TempDir::new()?;

        let (sync, mut tree, report) = load(temp_dir.path()).await?;
        assert!(report.is_clean());
        let root = tree.root_id();

        let work = add(&mut tree, root, NavigationNode::composite("Work"), 0)?;
        let home = add(&mut tree, root, NavigationNode::composite("Home"), 1)?;
        let inbox = add(&mut tree, root, NavigationNode::leaf("Inbox"), 0)?;
        let projects = add(&mut tree, work, NavigationNode::composite("Projects"), 0)?;
        let q3 = add(&mut tree, projects, NavigationNode::leaf("Q3"), 0)?;
        let q4 = add(&mut tree, projects, NavigationNode::leaf("Q4"), 1)?;
        let groceries = add(&mut tree, home, NavigationNode::leaf("Groceries"), 0)?;
        let chores = add(&mut tree, home, NavigationNode::leaf("Chores"), 0)?;

        tree.set_title(q4, "Q4 planning")?;
        tree.move_node(groceries, work, 1)?;
        tree.move_node(q3, projects, 1)?;
        tree.move_node(inbox, root, 2)?;
        tree.remove(chores)?;

        let expected = shape(&tree);
        close(sync).await?;

        let (sync, reloaded, report) = load(temp_dir.path()).await?;
        assert!(report.is_clean(), "unexpected repairs: {:?}", report);
        assert_eq!(shape(&reloaded), expected);
        assert!(!reloaded.contains(chores));
        close(sync).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_subtree_removal_is_persisted() -> Result<()> {
        let temp_dir = TempDir::new()?;

        let (sync, mut tree, _) = load(temp_dir.path()).await?;
        let root = tree.root_id();
        let group = add(&mut tree, root, NavigationNode::composite("Group"), 0)?;
        let inner = add(&mut tree, group, NavigationNode::composite("Inner"), 0)?;
        add(&mut tree, inner, NavigationNode::leaf("Deep"), 0)?;
        let keep = add(&mut tree, root, NavigationNode::leaf("Keep"), 1)?;
        tree.remove(group)?;
        close(sync).await?;

        let store = open_store(temp_dir.path()).await?;
        let rows = store.load_all().await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, keep.to_string());

        Ok(())
    }

    #[tokio::test]
    async fn test_dense_inserts_survive_reload() -> Result<()> {
        let temp_dir = TempDir::new()?;

        let (sync, mut tree, _) = load(temp_dir.path()).await?;
        let root = tree.root_id();

        // Deterministic pseudo-random insert indices
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for i in 0..200 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let len = tree.children(root).count();
            let index = (seed >> 33) as usize % (len + 1);
            add(&mut tree, root, NavigationNode::leaf(format!("list {}", i)), index)?;
        }

        let positions = tree.child_positions(root);
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let expected = shape(&tree);
        close(sync).await?;

        let (sync, reloaded, report) = load(temp_dir.path()).await?;
        assert!(report.is_clean());
        assert_eq!(shape(&reloaded), expected);
        close(sync).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_dangling_parent_repair_is_written_back() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = NavigationId::USER_ROOT;
        let a = NavigationId::new();
        let b = NavigationId::new();
        let orphan = NavigationId::new();

        let store = open_store(temp_dir.path()).await?;
        for (id, title, parent, position) in [
            (a, "A", root, 0),
            (b, "B", root, 1),
            (orphan, "Orphan", NavigationId::new(), 0),
        ] {
            store
                .apply(&StoreWrite::Upsert {
                    id,
                    title: title.to_string(),
                    parent,
                    position,
                    is_composite: false,
                })
                .await?;
        }
        drop(store);

        let (sync, tree, report) = load(temp_dir.path()).await?;
        assert_eq!(report.reparented, vec![orphan]);
        let top: Vec<NavigationId> = tree.children(root).map(|n| n.id()).collect();
        assert_eq!(top, vec![a, b, orphan]);
        assert_eq!(tree.get(orphan).map(|n| n.position()), Some(2));
        let expected = shape(&tree);
        close(sync).await?;

        let (sync, reloaded, report) = load(temp_dir.path()).await?;
        assert!(report.is_clean());
        assert_eq!(shape(&reloaded), expected);
        close(sync).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_positions_repair_is_written_back() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = NavigationId::USER_ROOT;

        let store = open_store(temp_dir.path()).await?;
        for title in ["x", "y", "z"] {
            store
                .apply(&StoreWrite::Upsert {
                    id: NavigationId::new(),
                    title: title.to_string(),
                    parent: root,
                    position: 4,
                    is_composite: true,
                })
                .await?;
        }
        drop(store);

        let (sync, tree, report) = load(temp_dir.path()).await?;
        assert_eq!(tree.child_positions(root), vec![0, 1, 2]);
        assert!(!report.renumbered.is_empty());
        close(sync).await?;

        let store = open_store(temp_dir.path()).await?;
        let mut positions: Vec<i64> = store
            .load_all()
            .await?
            .iter()
            .map(|r: &NavigationRecord| r.position)
            .collect();
        positions.sort();
        assert_eq!(positions, vec![0, 1, 2]);

        Ok(())
    }

    #[tokio::test]
    async fn test_replayed_writes_give_the_same_tree() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = NavigationId::USER_ROOT;
        let group = NavigationId::new();
        let list = NavigationId::new();

        let writes = vec![
            StoreWrite::Upsert {
                id: group,
                title: "Group".into(),
                parent: root,
                position: 0,
                is_composite: true,
            },
            StoreWrite::Upsert {
                id: list,
                title: "List".into(),
                parent: root,
                position: 1,
                is_composite: false,
            },
            StoreWrite::UpdateTitle {
                id: list,
                title: "Renamed".into(),
            },
            StoreWrite::UpdateParent {
                id: list,
                parent: group,
                position: 0,
            },
        ];

        let store = open_store(temp_dir.path()).await?;
        for write in &writes {
            store.apply(write).await?;
        }
        drop(store);
        let (sync, once, _) = load(temp_dir.path()).await?;
        let expected = shape(&once);
        close(sync).await?;

        let store = open_store(temp_dir.path()).await?;
        for write in &writes {
            store.apply(write).await?;
        }
        drop(store);
        let (sync, twice, report) = load(temp_dir.path()).await?;
        assert!(report.is_clean());
        assert_eq!(shape(&twice), expected);
        assert_eq!(twice.parent_of(list).map(|n| n.id()), Some(group));
        close(sync).await?;

        Ok(())
    }
}
