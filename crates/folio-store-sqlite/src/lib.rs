use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use folio_storage::{
    Entity, EntityGroupLink, EntityId, EntityStore, Group, GroupClosure, GroupClosureStore,
    GroupId, GroupMember, GroupMembershipStore, GroupPermission, GroupStore, Permission,
    PermissionGrantStore, ReachingGrant, Store, StoreError, Transaction, UserId,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};
use uuid::Uuid;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Connection settings for an on-disk database.
#[derive(Clone, Debug)]
pub struct SqliteConfig {
    /// `sqlite://path/to/folio.db`
    pub url: String,
    pub max_connections: u32,
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl SqliteConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// `~/.folio/folio.db`
    pub fn default_path() -> Result<PathBuf, StoreError> {
        Ok(dirs::home_dir()
            .ok_or_else(|| StoreError::Backend("no home dir".into()))?
            .join(".folio")
            .join("folio.db"))
    }

    /// URL of `~/.folio/folio.db`, creating the directory (0700 on unix) if needed.
    pub fn default_url() -> Result<String, StoreError> {
        let path = Self::default_path()?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(backend)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))
                    .map_err(backend)?;
            }
        }
        Ok(format!("sqlite://{}", path.to_string_lossy()))
    }

    /// Single-connection in-memory database; the connection is never recycled, since
    /// dropping it would drop the data.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(backend)?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(backend)?;
        Self::migrate(pool).await
    }

    pub async fn open(url: &str) -> Result<Self, StoreError> {
        Self::open_with(&SqliteConfig::new(url)).await
    }

    pub async fn open_with(config: &SqliteConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(backend)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.busy_timeout);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(backend)?;
        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self, StoreError> {
        MIGRATOR.run(&pool).await.map_err(backend)?;
        tracing::debug!("sqlite store ready");
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    type Txn = SqliteTxn;

    async fn begin_txn(&self) -> Result<Self::Txn, StoreError> {
        let tx = self.pool.begin().await.map_err(backend)?;
        Ok(SqliteTxn { tx })
    }
}

pub struct SqliteTxn {
    tx: sqlx::Transaction<'static, Sqlite>,
}

#[async_trait::async_trait]
impl Transaction for SqliteTxn {
    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(backend)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(backend)
    }
}

// ───────────────────────────── Row mapping ─────────────────────────────

fn backend(e: impl ToString) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Constraint violations become domain errors; everything else is a backend fault.
fn map_write_err(e: sqlx::Error) -> StoreError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return StoreError::Conflict;
        }
        if db.is_foreign_key_violation() {
            return StoreError::NotFound;
        }
    }
    backend(e)
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::try_parse(s).map_err(backend)
}

fn parse_ts(secs: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| backend(format!("bad timestamp {secs}")))
}

fn parse_depth(depth: i64) -> Result<u32, StoreError> {
    u32::try_from(depth).map_err(backend)
}

type GroupRow = (String, Option<String>, bool, i64);

fn group_from_row((id, name, hidden, created_at): GroupRow) -> Result<Group, StoreError> {
    Ok(Group {
        id: GroupId(parse_uuid(&id)?),
        name,
        hidden,
        created_at: parse_ts(created_at)?,
    })
}

fn closure_from_row((a, d, depth): (String, String, i64)) -> Result<GroupClosure, StoreError> {
    Ok(GroupClosure {
        ancestor_id: GroupId(parse_uuid(&a)?),
        descendant_id: GroupId(parse_uuid(&d)?),
        depth: parse_depth(depth)?,
    })
}

fn grant_from_row(
    (group_id, permission, propagate): (String, String, bool),
) -> Result<GroupPermission, StoreError> {
    Ok(GroupPermission {
        group_id: GroupId(parse_uuid(&group_id)?),
        permission: Permission::from_str(&permission).map_err(backend)?,
        propagate,
    })
}

// ───────────────────────────── Groups ─────────────────────────────

#[async_trait::async_trait]
impl GroupStore for SqliteTxn {
    async fn insert_group(&mut self, group: &Group) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO groups(id,name,hidden,created_at) VALUES(?,?,?,?)")
            .bind(group.id.0.to_string())
            .bind(&group.name)
            .bind(group.hidden)
            .bind(group.created_at.timestamp())
            .execute(&mut *self.tx)
            .await
            .map_err(map_write_err)?;
        Ok(())
    }

    async fn get_group(&mut self, group_id: &GroupId) -> Result<Group, StoreError> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT id,name,hidden,created_at FROM groups WHERE id=?",
        )
        .bind(group_id.0.to_string())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound)?;
        group_from_row(row)
    }

    async fn list_member_groups(
        &mut self,
        user_id: &UserId,
        include_hidden: bool,
    ) -> Result<Vec<Group>, StoreError> {
        let rows = sqlx::query_as::<_, GroupRow>(
            "SELECT g.id, g.name, g.hidden, g.created_at
               FROM groups g
               JOIN group_rel gr ON gr.group_id=g.id
              WHERE gr.user_id=? AND (? OR g.hidden=0)
              ORDER BY g.name, g.id",
        )
        .bind(user_id.0.to_string())
        .bind(include_hidden)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(backend)?;
        rows.into_iter().map(group_from_row).collect()
    }

    async fn find_sharing_group(
        &mut self,
        a: &GroupId,
        b: &GroupId,
    ) -> Result<Option<GroupId>, StoreError> {
        // Hidden, beneath both, and with no ancestor outside the two lineages: reusing
        // such a group never widens visibility beyond members of a and b.
        let (a, b) = (a.0.to_string(), b.0.to_string());
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT g.id
               FROM groups g
               JOIN group_closure ca ON ca.descendant_id=g.id AND ca.ancestor_id=?
               JOIN group_closure cb ON cb.descendant_id=g.id AND cb.ancestor_id=?
              WHERE g.hidden=1 AND g.id<>? AND g.id<>?
                AND NOT EXISTS (
                    SELECT 1 FROM group_closure up
                     WHERE up.descendant_id=g.id AND up.depth>0
                       AND up.ancestor_id NOT IN
                           (SELECT ancestor_id FROM group_closure WHERE descendant_id=?)
                       AND up.ancestor_id NOT IN
                           (SELECT ancestor_id FROM group_closure WHERE descendant_id=?))
              ORDER BY g.created_at, g.id
              LIMIT 1",
        )
        .bind(&a)
        .bind(&b)
        .bind(&a)
        .bind(&b)
        .bind(&a)
        .bind(&b)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(backend)?;

        row.map(|(id,)| parse_uuid(&id).map(GroupId)).transpose()
    }

    async fn set_default_group(
        &mut self,
        user_id: &UserId,
        group_id: &GroupId,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO default_groups(user_id,group_id) VALUES(?,?)")
            .bind(user_id.0.to_string())
            .bind(group_id.0.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(map_write_err)?;
        Ok(())
    }

    async fn get_default_group(
        &mut self,
        user_id: &UserId,
    ) -> Result<Option<GroupId>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT group_id FROM default_groups WHERE user_id=?")
                .bind(user_id.0.to_string())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(backend)?;
        row.map(|(id,)| parse_uuid(&id).map(GroupId)).transpose()
    }
}

// ───────────────────────────── Closure ─────────────────────────────

#[async_trait::async_trait]
impl GroupClosureStore for SqliteTxn {
    async fn insert_closure(&mut self, row: &GroupClosure) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO group_closure(ancestor_id,descendant_id,depth) VALUES(?,?,?)
             ON CONFLICT(ancestor_id,descendant_id) DO NOTHING",
        )
        .bind(row.ancestor_id.0.to_string())
        .bind(row.descendant_id.0.to_string())
        .bind(i64::from(row.depth))
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn depth(
        &mut self,
        ancestor: &GroupId,
        descendant: &GroupId,
    ) -> Result<Option<u32>, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT depth FROM group_closure WHERE ancestor_id=? AND descendant_id=?",
        )
        .bind(ancestor.0.to_string())
        .bind(descendant.0.to_string())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(backend)?;
        row.map(|(depth,)| parse_depth(depth)).transpose()
    }

    async fn ancestors_of(&mut self, group_id: &GroupId) -> Result<Vec<GroupClosure>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String, i64)>(
            "SELECT ancestor_id,descendant_id,depth FROM group_closure
              WHERE descendant_id=? ORDER BY depth",
        )
        .bind(group_id.0.to_string())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(backend)?;
        rows.into_iter().map(closure_from_row).collect()
    }

    async fn descendants_of(
        &mut self,
        group_id: &GroupId,
    ) -> Result<Vec<GroupClosure>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String, i64)>(
            "SELECT ancestor_id,descendant_id,depth FROM group_closure
              WHERE ancestor_id=? ORDER BY depth",
        )
        .bind(group_id.0.to_string())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(backend)?;
        rows.into_iter().map(closure_from_row).collect()
    }
}

// ───────────────────────────── Membership ─────────────────────────────

#[async_trait::async_trait]
impl GroupMembershipStore for SqliteTxn {
    async fn add_member(&mut self, user_id: &UserId, group_id: &GroupId) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO group_rel(user_id,group_id,created_at) VALUES(?,?,?)")
            .bind(user_id.0.to_string())
            .bind(group_id.0.to_string())
            .bind(Utc::now().timestamp())
            .execute(&mut *self.tx)
            .await
            .map_err(map_write_err)?;
        Ok(())
    }

    async fn add_member_if_absent(
        &mut self,
        user_id: &UserId,
        group_id: &GroupId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO group_rel(user_id,group_id,created_at) VALUES(?,?,?)
             ON CONFLICT(user_id,group_id) DO NOTHING",
        )
        .bind(user_id.0.to_string())
        .bind(group_id.0.to_string())
        .bind(Utc::now().timestamp())
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_member(&mut self, user_id: &UserId, group_id: &GroupId) -> Result<bool, StoreError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM group_rel WHERE user_id=? AND group_id=?")
                .bind(user_id.0.to_string())
                .bind(group_id.0.to_string())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(backend)?;
        Ok(row.is_some())
    }

    async fn list_members(&mut self, group_id: &GroupId) -> Result<Vec<GroupMember>, StoreError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT user_id,created_at FROM group_rel WHERE group_id=? ORDER BY created_at, user_id",
        )
        .bind(group_id.0.to_string())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(backend)?;

        let mut out = Vec::with_capacity(rows.len());
        for (user_id, created_at) in rows {
            out.push(GroupMember {
                group_id: *group_id,
                user_id: UserId(parse_uuid(&user_id)?),
                created_at: parse_ts(created_at)?,
            });
        }
        Ok(out)
    }
}

// ───────────────────────────── Permissions ─────────────────────────────

#[async_trait::async_trait]
impl PermissionGrantStore for SqliteTxn {
    async fn grant_permission(&mut self, grant: &GroupPermission) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO group_permissions(group_id,permission,propagate) VALUES(?,?,?)")
            .bind(grant.group_id.0.to_string())
            .bind(grant.permission.as_str())
            .bind(grant.propagate)
            .execute(&mut *self.tx)
            .await
            .map_err(map_write_err)?;
        Ok(())
    }

    async fn list_permissions(
        &mut self,
        group_id: &GroupId,
    ) -> Result<Vec<GroupPermission>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String, bool)>(
            "SELECT group_id,permission,propagate FROM group_permissions
              WHERE group_id=? ORDER BY permission",
        )
        .bind(group_id.0.to_string())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(backend)?;
        rows.into_iter().map(grant_from_row).collect()
    }

    async fn grants_reaching(
        &mut self,
        user_id: &UserId,
        group_id: &GroupId,
        permission: Permission,
    ) -> Result<Vec<ReachingGrant>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String, String, bool)>(
            "SELECT gr.group_id, gp.group_id, gp.permission, gp.propagate
               FROM group_rel gr
               JOIN group_closure mg ON mg.ancestor_id=gr.group_id
               JOIN group_permissions gp ON gp.group_id=mg.descendant_id AND gp.permission=?
               JOIN group_closure gt ON gt.ancestor_id=gp.group_id AND gt.descendant_id=?
              WHERE gr.user_id=?
              ORDER BY gt.depth, mg.depth",
        )
        .bind(permission.as_str())
        .bind(group_id.0.to_string())
        .bind(user_id.0.to_string())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(backend)?;

        let mut out = Vec::with_capacity(rows.len());
        for (via, granting, permission, propagate) in rows {
            out.push(ReachingGrant {
                via: GroupId(parse_uuid(&via)?),
                grant: grant_from_row((granting, permission, propagate))?,
            });
        }
        Ok(out)
    }
}

// ───────────────────────────── Entities ─────────────────────────────

#[async_trait::async_trait]
impl EntityStore for SqliteTxn {
    async fn insert_entity(&mut self, entity: &Entity) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO entities(id,group_id,created_at) VALUES(?,?,?)")
            .bind(entity.id.0.to_string())
            .bind(entity.primary_group_id.0.to_string())
            .bind(entity.created_at.timestamp())
            .execute(&mut *self.tx)
            .await
            .map_err(map_write_err)?;
        Ok(())
    }

    async fn get_entity(&mut self, entity_id: &EntityId) -> Result<Entity, StoreError> {
        let (id, group_id, created_at) = sqlx::query_as::<_, (String, String, i64)>(
            "SELECT id,group_id,created_at FROM entities WHERE id=?",
        )
        .bind(entity_id.0.to_string())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound)?;

        Ok(Entity {
            id: EntityId(parse_uuid(&id)?),
            primary_group_id: GroupId(parse_uuid(&group_id)?),
            created_at: parse_ts(created_at)?,
        })
    }

    async fn link_entity(&mut self, link: &EntityGroupLink) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO entity_groups(entity_id,group_id) VALUES(?,?)
             ON CONFLICT(entity_id,group_id) DO NOTHING",
        )
        .bind(link.entity_id.0.to_string())
        .bind(link.group_id.0.to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(map_write_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_entity_links(
        &mut self,
        entity_id: &EntityId,
    ) -> Result<Vec<EntityGroupLink>, StoreError> {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT group_id FROM entity_groups WHERE entity_id=? ORDER BY group_id",
        )
        .bind(entity_id.0.to_string())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(backend)?;

        rows.into_iter()
            .map(|(group_id,)| {
                Ok(EntityGroupLink {
                    entity_id: *entity_id,
                    group_id: GroupId(parse_uuid(&group_id)?),
                })
            })
            .collect()
    }
}
