//! Closure-table maintenance over a [`GroupClosureStore`].

use std::collections::BTreeSet;

use folio_storage::{GroupClosure, GroupClosureStore, GroupId, StoreError};

/// Make `child` (and everything beneath it) a descendant of `parent` (and everything
/// above it). Pairs that already have a row are skipped, so linking twice is a no-op.
/// Returns the number of rows inserted.
pub async fn extend<T: GroupClosureStore>(
    txn: &mut T,
    parent: &GroupId,
    child: &GroupId,
) -> Result<usize, StoreError> {
    let ancestors = txn.ancestors_of(parent).await?;
    let descendants = txn.descendants_of(child).await?;

    let mut inserted = 0;
    for a in &ancestors {
        for d in &descendants {
            let row = GroupClosure {
                ancestor_id: a.ancestor_id,
                descendant_id: d.descendant_id,
                depth: a.depth + 1 + d.depth,
            };
            if txn.insert_closure(&row).await? {
                inserted += 1;
            }
        }
    }
    Ok(inserted)
}

/// Ancestor-or-self set of `group_id`.
pub async fn ancestors<T: GroupClosureStore>(
    txn: &mut T,
    group_id: &GroupId,
) -> Result<BTreeSet<GroupId>, StoreError> {
    Ok(txn
        .ancestors_of(group_id)
        .await?
        .into_iter()
        .map(|row| row.ancestor_id)
        .collect())
}

/// Descendant-or-self set of `group_id`.
pub async fn descendants<T: GroupClosureStore>(
    txn: &mut T,
    group_id: &GroupId,
) -> Result<BTreeSet<GroupId>, StoreError> {
    Ok(txn
        .descendants_of(group_id)
        .await?
        .into_iter()
        .map(|row| row.descendant_id)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use folio_storage::{Group, GroupStore, Store};
    use folio_store_sqlite::{SqliteStore, SqliteTxn};

    async fn group(t: &mut SqliteTxn) -> GroupId {
        let g = Group {
            id: GroupId::new(),
            name: None,
            hidden: false,
            created_at: Utc::now(),
        };
        t.insert_group(&g).await.unwrap();
        t.insert_closure(&GroupClosure::reflexive(g.id))
            .await
            .unwrap();
        g.id
    }

    #[tokio::test]
    async fn extend_joins_whole_subtrees() {
        let s = SqliteStore::open_in_memory().await.unwrap();
        let mut t = s.begin_txn().await.unwrap();
        let (a, b, c, d) = (
            group(&mut t).await,
            group(&mut t).await,
            group(&mut t).await,
            group(&mut t).await,
        );

        // a > b and c > d, then graft the c subtree under b.
        assert_eq!(extend(&mut t, &a, &b).await.unwrap(), 1);
        assert_eq!(extend(&mut t, &c, &d).await.unwrap(), 1);
        assert_eq!(extend(&mut t, &b, &c).await.unwrap(), 4);

        assert_eq!(t.depth(&a, &d).await.unwrap(), Some(3));
        assert_eq!(t.depth(&b, &d).await.unwrap(), Some(2));
        assert_eq!(t.depth(&a, &c).await.unwrap(), Some(2));
        assert_eq!(
            descendants(&mut t, &a).await.unwrap(),
            BTreeSet::from([a, b, c, d])
        );
        assert_eq!(
            ancestors(&mut t, &d).await.unwrap(),
            BTreeSet::from([a, b, c, d])
        );
    }

    #[tokio::test]
    async fn extend_twice_is_a_no_op() {
        let s = SqliteStore::open_in_memory().await.unwrap();
        let mut t = s.begin_txn().await.unwrap();
        let (a, b) = (group(&mut t).await, group(&mut t).await);

        assert_eq!(extend(&mut t, &a, &b).await.unwrap(), 1);
        assert_eq!(extend(&mut t, &a, &b).await.unwrap(), 0);
        assert_eq!(t.depth(&a, &b).await.unwrap(), Some(1));
    }
}
