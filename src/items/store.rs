/// Item Lifecycle Manager
///
/// Coordinates item rows, file asset rows, the backing byte store, and the
/// quota ledger. Three independently triggered paths (user delete, trash
/// emptying, expiry sweep) converge on the single purge sequence here, so
/// the ordering invariant (bytes, then records, then quota) lives in
/// exactly one place.
use crate::{
    error::{CaptureError, CaptureResult},
    file_store::{storage_path_for, FileAsset, FileBackend},
    items::models::*,
    quota::QuotaLedger,
    tiers::TierLimits,
    workspaces::Workspace,
};
use chrono::{DateTime, Duration, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Listing filters: substring over title/body, single-tag match
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub q: Option<String>,
    pub tag: Option<String>,
}

#[derive(Clone)]
pub struct ItemStore {
    db: SqlitePool,
    files: Arc<dyn FileBackend>,
    quota: QuotaLedger,
}

impl ItemStore {
    pub fn new(db: SqlitePool, files: Arc<dyn FileBackend>, quota: QuotaLedger) -> Self {
        Self { db, files, quota }
    }

    /// Create a note or link item. No file asset, no quota effect.
    pub async fn create_item(
        &self,
        workspace: &Workspace,
        limits: &TierLimits,
        owner_id: &str,
        new: NewItem,
    ) -> CaptureResult<Item> {
        if new.kind == ItemKind::Drop {
            return Err(CaptureError::Validation(
                "Drop items are created through the upload endpoint".to_string(),
            ));
        }
        if new.title.trim().is_empty() {
            return Err(CaptureError::Validation("Title cannot be empty".to_string()));
        }
        if new.kind == ItemKind::Link && new.body.as_deref().unwrap_or("").trim().is_empty() {
            return Err(CaptureError::Validation(
                "Link items require a URL body".to_string(),
            ));
        }

        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4().to_string(),
            workspace_id: workspace.id.clone(),
            owner_id: owner_id.to_string(),
            kind: new.kind,
            title: new.title,
            body: new.body,
            tags: normalize_tags(&new.tags),
            pinned: false,
            expires_at: expiry_for(now, new.ttl_seconds, limits)?,
            file_id: None,
            trashed_at: None,
            created_at: now,
            updated_at: now,
        };

        self.insert_item(&item).await?;
        Ok(item)
    }

    /// Create a drop item backed by an uploaded file
    ///
    /// The quota charge is the file size, reserved before any bytes are
    /// written; every later failure unwinds what came before it so the
    /// charge never outlives the upload.
    pub async fn create_drop(
        &self,
        workspace: &Workspace,
        limits: &TierLimits,
        uploader_id: &str,
        new: NewDrop,
    ) -> CaptureResult<Item> {
        if new.filename.trim().is_empty() {
            return Err(CaptureError::Validation(
                "Filename cannot be empty".to_string(),
            ));
        }

        let size = new.data.len() as i64;
        if size > limits.max_file_size_bytes {
            return Err(CaptureError::Validation(format!(
                "File of {} bytes exceeds the {} byte per-file limit",
                size, limits.max_file_size_bytes
            )));
        }

        let mime_type = new
            .mime_type
            .filter(|m| !m.is_empty())
            .or_else(|| {
                mime_guess::from_path(&new.filename)
                    .first_raw()
                    .map(String::from)
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        self.quota
            .reserve(&workspace.id, size, limits.storage_limit_bytes)
            .await?;

        let now = Utc::now();
        let asset_id = Uuid::new_v4().to_string();
        let asset = FileAsset {
            storage_path: storage_path_for(&asset_id),
            id: asset_id,
            workspace_id: workspace.id.clone(),
            uploader_id: uploader_id.to_string(),
            filename: new.filename,
            mime_type,
            size_bytes: size,
            created_at: now,
        };

        if let Err(e) = self.files.put(&asset.storage_path, new.data).await {
            self.refund(&workspace.id, size).await;
            return Err(e);
        }

        if let Err(e) = self.insert_asset(&asset).await {
            self.discard_bytes(&asset.storage_path).await;
            self.refund(&workspace.id, size).await;
            return Err(e);
        }

        let title = if new.title.trim().is_empty() {
            asset.filename.clone()
        } else {
            new.title
        };
        let item = Item {
            id: Uuid::new_v4().to_string(),
            workspace_id: workspace.id.clone(),
            owner_id: uploader_id.to_string(),
            kind: ItemKind::Drop,
            title,
            body: None,
            tags: normalize_tags(&new.tags),
            pinned: false,
            expires_at: expiry_for(now, new.ttl_seconds, limits)?,
            file_id: Some(asset.id.clone()),
            trashed_at: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.insert_item(&item).await {
            if let Err(del) = sqlx::query("DELETE FROM file_asset WHERE id = ?1")
                .bind(&asset.id)
                .execute(&self.db)
                .await
            {
                tracing::warn!("Failed to unwind asset record {}: {}", asset.id, del);
            }
            self.discard_bytes(&asset.storage_path).await;
            self.refund(&workspace.id, size).await;
            return Err(e);
        }

        Ok(item)
    }

    /// Load an item by id
    pub async fn get(&self, item_id: &str) -> CaptureResult<Item> {
        self.find(item_id)
            .await?
            .ok_or_else(|| CaptureError::NotFound(format!("Item not found: {}", item_id)))
    }

    async fn find(&self, item_id: &str) -> CaptureResult<Option<Item>> {
        let row = sqlx::query(&format!("{} WHERE id = ?1", SELECT_ITEM))
            .bind(item_id)
            .fetch_optional(&self.db)
            .await?;

        row.map(|r| item_from_row(&r)).transpose()
    }

    /// Load a file asset by id
    pub async fn asset(&self, asset_id: &str) -> CaptureResult<Option<FileAsset>> {
        let row = sqlx::query(
            r#"
            SELECT id, workspace_id, uploader_id, filename, storage_path, mime_type, size_bytes, created_at
            FROM file_asset
            WHERE id = ?1
            "#,
        )
        .bind(asset_id)
        .fetch_optional(&self.db)
        .await?;

        row.map(|r| asset_from_row(&r)).transpose()
    }

    /// Read file bytes for an asset
    pub async fn asset_bytes(&self, asset: &FileAsset) -> CaptureResult<Option<Vec<u8>>> {
        self.files.get(&asset.storage_path).await
    }

    /// List a workspace's active items, newest first. Trashed items are
    /// excluded; `q` is a substring scan over title and body.
    pub async fn list(&self, workspace_id: &str, filter: &ListFilter) -> CaptureResult<Vec<Item>> {
        let tag = filter.tag.as_ref().map(|t| t.trim().to_lowercase());

        let rows = sqlx::query(&format!(
            r#"{}
            WHERE workspace_id = ?1
              AND trashed_at IS NULL
              AND (?2 IS NULL OR title LIKE '%' || ?2 || '%' OR body LIKE '%' || ?2 || '%')
              AND (?3 IS NULL OR (',' || tags || ',') LIKE '%,' || ?3 || ',%')
            ORDER BY created_at DESC
            LIMIT 200
            "#,
            SELECT_ITEM
        ))
        .bind(workspace_id)
        .bind(filter.q.as_deref())
        .bind(tag)
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    /// List a workspace's trashed items
    pub async fn list_trash(&self, workspace_id: &str) -> CaptureResult<Vec<Item>> {
        let rows = sqlx::query(&format!(
            "{} WHERE workspace_id = ?1 AND trashed_at IS NOT NULL ORDER BY trashed_at DESC LIMIT 200",
            SELECT_ITEM
        ))
        .bind(workspace_id)
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    /// Pin an item, exempting it from expiry
    pub async fn pin(&self, item_id: &str) -> CaptureResult<()> {
        self.set_pinned(item_id, true).await
    }

    /// Unpin an item. If its expiry has already passed this does not
    /// delete anything; the next sweep does.
    pub async fn unpin(&self, item_id: &str) -> CaptureResult<()> {
        self.set_pinned(item_id, false).await
    }

    async fn set_pinned(&self, item_id: &str, pinned: bool) -> CaptureResult<()> {
        let result = sqlx::query("UPDATE item SET pinned = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(item_id)
            .bind(pinned)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CaptureError::NotFound(format!("Item not found: {}", item_id)));
        }

        Ok(())
    }

    /// Soft-delete an item into the trash. Quota is not released; trashed
    /// items stay billed until restored or purged.
    pub async fn trash(&self, item_id: &str) -> CaptureResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE item SET trashed_at = ?2, updated_at = ?2 WHERE id = ?1 AND trashed_at IS NULL",
        )
        .bind(item_id)
        .bind(now)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            self.get(item_id).await?;
            return Err(CaptureError::Conflict("Item is already in the trash".to_string()));
        }

        Ok(())
    }

    /// Restore an item from the trash
    pub async fn restore(&self, item_id: &str) -> CaptureResult<()> {
        let result = sqlx::query(
            "UPDATE item SET trashed_at = NULL, updated_at = ?2 WHERE id = ?1 AND trashed_at IS NOT NULL",
        )
        .bind(item_id)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            self.get(item_id).await?;
            return Err(CaptureError::Conflict("Item is not in the trash".to_string()));
        }

        Ok(())
    }

    /// Permanently delete an item, its file asset, and the asset's bytes,
    /// refunding the quota charge.
    ///
    /// Retrying against an already-purged id is a no-op success, and the
    /// refund is gated on the asset row deletion actually deleting, so a
    /// doubled invocation can never release twice.
    pub async fn purge(&self, item_id: &str) -> CaptureResult<PurgeOutcome> {
        let Some(item) = self.find(item_id).await? else {
            return Ok(PurgeOutcome::AlreadyGone);
        };

        let removed = self.remove_item_storage(&item).await?;
        if removed.bytes_freed > 0 {
            self.quota.release(&item.workspace_id, removed.bytes_freed).await?;
        }

        Ok(PurgeOutcome::Purged {
            bytes_freed: removed.bytes_freed,
        })
    }

    /// Purge every item whose expiry has passed and which is not pinned.
    ///
    /// Each candidate is processed independently: one bad file does not
    /// block the rest of the batch, it is logged, counted, and left
    /// untouched for the next sweep. Freed bytes are refunded per
    /// workspace in a single pass after the batch.
    pub async fn sweep(&self) -> CaptureResult<SweepStats> {
        let rows = sqlx::query(&format!(
            "{} WHERE expires_at IS NOT NULL AND expires_at <= ?1 AND pinned = 0 ORDER BY expires_at ASC",
            SELECT_ITEM
        ))
        .bind(Utc::now())
        .fetch_all(&self.db)
        .await?;

        let mut stats = SweepStats::default();
        let mut freed_per_workspace: HashMap<String, i64> = HashMap::new();

        for row in &rows {
            let item = item_from_row(row)?;

            match self.remove_item_storage(&item).await {
                Ok(removed) => {
                    if removed.item_deleted {
                        stats.items_deleted += 1;
                    }
                    if removed.bytes_freed > 0 {
                        stats.files_deleted += 1;
                        stats.bytes_freed += removed.bytes_freed;
                        *freed_per_workspace
                            .entry(item.workspace_id.clone())
                            .or_default() += removed.bytes_freed;
                    }
                }
                Err(e) => {
                    stats.failures += 1;
                    tracing::warn!("Sweep skipped item {}: {}", item.id, e);
                }
            }
        }

        for (workspace_id, bytes) in freed_per_workspace {
            if let Err(e) = self.quota.release(&workspace_id, bytes).await {
                stats.failures += 1;
                tracing::error!(
                    "Failed to refund {} bytes to workspace {}: {}",
                    bytes,
                    workspace_id,
                    e
                );
            }
        }

        Ok(stats)
    }

    /// The shared removal sequence: bytes, then the item row, then the
    /// asset row (the item references the asset, so its row goes first).
    ///
    /// A bytes-deletion failure aborts before any record is touched, so
    /// the worst partial state is orphaned bytes with no record, never a
    /// record pointing at missing bytes. Returns freed bytes only when
    /// this call deleted the asset row; the quota refund keys on that.
    async fn remove_item_storage(&self, item: &Item) -> CaptureResult<RemovedStorage> {
        let asset = match &item.file_id {
            Some(file_id) => self.asset(file_id).await?,
            None => None,
        };

        if let Some(asset) = &asset {
            if let Err(e) = self.files.delete(&asset.storage_path).await {
                tracing::error!(
                    "Failed to delete bytes for item {} (asset {} at {}, {} bytes): {}",
                    item.id,
                    asset.id,
                    asset.storage_path,
                    asset.size_bytes,
                    e
                );
                return Err(e);
            }
        }

        let result = sqlx::query("DELETE FROM item WHERE id = ?1")
            .bind(&item.id)
            .execute(&self.db)
            .await?;
        let item_deleted = result.rows_affected() == 1;

        let mut bytes_freed = 0;
        if let Some(asset) = &asset {
            let result = sqlx::query("DELETE FROM file_asset WHERE id = ?1")
                .bind(&asset.id)
                .execute(&self.db)
                .await?;
            if result.rows_affected() == 1 {
                bytes_freed = asset.size_bytes;
            }
        }

        Ok(RemovedStorage {
            item_deleted,
            bytes_freed,
        })
    }

    async fn insert_item(&self, item: &Item) -> CaptureResult<()> {
        sqlx::query(
            r#"
            INSERT INTO item (id, workspace_id, owner_id, kind, title, body, tags, pinned,
                              expires_at, file_id, trashed_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&item.id)
        .bind(&item.workspace_id)
        .bind(&item.owner_id)
        .bind(item.kind.as_str())
        .bind(&item.title)
        .bind(&item.body)
        .bind(join_tags(&item.tags))
        .bind(item.pinned)
        .bind(item.expires_at)
        .bind(&item.file_id)
        .bind(item.trashed_at)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn insert_asset(&self, asset: &FileAsset) -> CaptureResult<()> {
        sqlx::query(
            r#"
            INSERT INTO file_asset (id, workspace_id, uploader_id, filename, storage_path,
                                    mime_type, size_bytes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&asset.id)
        .bind(&asset.workspace_id)
        .bind(&asset.uploader_id)
        .bind(&asset.filename)
        .bind(&asset.storage_path)
        .bind(&asset.mime_type)
        .bind(asset.size_bytes)
        .bind(asset.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Best-effort compensation on a failed upload
    async fn refund(&self, workspace_id: &str, bytes: i64) {
        if let Err(e) = self.quota.release(workspace_id, bytes).await {
            tracing::warn!(
                "Failed to refund {} bytes to workspace {} after aborted upload: {}",
                bytes,
                workspace_id,
                e
            );
        }
    }

    async fn discard_bytes(&self, path: &str) {
        if let Err(e) = self.files.delete(path).await {
            tracing::warn!("Failed to discard staged bytes at {}: {}", path, e);
        }
    }
}

struct RemovedStorage {
    item_deleted: bool,
    bytes_freed: i64,
}

const SELECT_ITEM: &str = r#"
    SELECT id, workspace_id, owner_id, kind, title, body, tags, pinned,
           expires_at, file_id, trashed_at, created_at, updated_at
    FROM item
"#;

fn expiry_for(
    now: DateTime<Utc>,
    ttl_seconds: Option<i64>,
    limits: &TierLimits,
) -> CaptureResult<Option<DateTime<Utc>>> {
    match ttl_seconds {
        Some(ttl) if ttl <= 0 => Err(CaptureError::Validation(
            "TTL must be a positive number of seconds".to_string(),
        )),
        Some(ttl) => Ok(Some(now + Duration::seconds(ttl))),
        None => Ok(limits
            .retention_days
            .map(|days| now + Duration::days(days as i64))),
    }
}

fn item_from_row(row: &SqliteRow) -> CaptureResult<Item> {
    let kind: String = row.try_get("kind")?;
    let tags: String = row.try_get("tags")?;

    Ok(Item {
        id: row.try_get("id")?,
        workspace_id: row.try_get("workspace_id")?,
        owner_id: row.try_get("owner_id")?,
        kind: ItemKind::from_str(&kind)?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        tags: split_tags(&tags),
        pinned: row.try_get("pinned")?,
        expires_at: row.try_get("expires_at")?,
        file_id: row.try_get("file_id")?,
        trashed_at: row.try_get("trashed_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn asset_from_row(row: &SqliteRow) -> CaptureResult<FileAsset> {
    Ok(FileAsset {
        id: row.try_get("id")?,
        workspace_id: row.try_get("workspace_id")?,
        uploader_id: row.try_get("uploader_id")?,
        filename: row.try_get("filename")?,
        storage_path: row.try_get("storage_path")?,
        mime_type: row.try_get("mime_type")?,
        size_bytes: row.try_get("size_bytes")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_store::disk::DiskFileBackend;
    use crate::tiers::{StaticTierProvider, TierLimitProvider};
    use crate::workspaces::WorkspaceStore;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    const MB: i64 = 1024 * 1024;

    /// Backend wrapper whose delete fails for selected paths
    struct FlakyBackend {
        inner: DiskFileBackend,
        failing: Mutex<HashSet<String>>,
    }

    impl FlakyBackend {
        fn new(inner: DiskFileBackend) -> Self {
            Self {
                inner,
                failing: Mutex::new(HashSet::new()),
            }
        }

        fn fail_delete_for(&self, path: &str) {
            self.failing.lock().unwrap().insert(path.to_string());
        }
    }

    #[async_trait::async_trait]
    impl FileBackend for FlakyBackend {
        async fn put(&self, path: &str, data: Vec<u8>) -> CaptureResult<()> {
            self.inner.put(path, data).await
        }

        async fn get(&self, path: &str) -> CaptureResult<Option<Vec<u8>>> {
            self.inner.get(path).await
        }

        async fn delete(&self, path: &str) -> CaptureResult<()> {
            if self.failing.lock().unwrap().contains(path) {
                return Err(CaptureError::Storage(format!(
                    "Injected delete failure for {}",
                    path
                )));
            }
            self.inner.delete(path).await
        }

        async fn exists(&self, path: &str) -> CaptureResult<bool> {
            self.inner.exists(path).await
        }

        async fn size(&self, path: &str) -> CaptureResult<Option<u64>> {
            self.inner.size(path).await
        }
    }

    struct Fixture {
        store: ItemStore,
        quota: QuotaLedger,
        workspaces: WorkspaceStore,
        backend: Arc<FlakyBackend>,
        db: SqlitePool,
        _dir: TempDir,
    }

    async fn fixture() -> Fixture {
        let db = SqlitePool::connect(":memory:").await.unwrap();

        for ddl in [
            r#"
            CREATE TABLE workspace (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                tier TEXT NOT NULL DEFAULT 'free',
                storage_used_bytes INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL
            )
            "#,
            r#"
            CREATE TABLE file_asset (
                id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL,
                uploader_id TEXT NOT NULL,
                filename TEXT NOT NULL,
                storage_path TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                created_at DATETIME NOT NULL
            )
            "#,
            r#"
            CREATE TABLE item (
                id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT,
                tags TEXT NOT NULL DEFAULT '',
                pinned INTEGER NOT NULL DEFAULT 0,
                expires_at DATETIME,
                file_id TEXT,
                trashed_at DATETIME,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            "#,
        ] {
            sqlx::query(ddl).execute(&db).await.unwrap();
        }

        sqlx::query(
            "INSERT INTO workspace (id, name, owner_id, tier, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind("ws-1")
        .bind("Test Workspace")
        .bind("alice")
        .bind("free")
        .bind(Utc::now())
        .execute(&db)
        .await
        .unwrap();

        let dir = tempdir().unwrap();
        let backend = Arc::new(FlakyBackend::new(DiskFileBackend::new(
            dir.path().to_path_buf(),
        )));
        let quota = QuotaLedger::new(db.clone());
        let store = ItemStore::new(db.clone(), backend.clone(), quota.clone());

        Fixture {
            store,
            quota,
            workspaces: WorkspaceStore::new(db.clone()),
            backend,
            db,
            _dir: dir,
        }
    }

    fn limits_10mb() -> TierLimits {
        TierLimits {
            storage_limit_bytes: 10 * MB,
            max_file_size_bytes: 8 * MB,
            retention_days: None,
        }
    }

    fn new_drop(name: &str, size: usize) -> NewDrop {
        NewDrop {
            title: String::new(),
            filename: name.to_string(),
            mime_type: Some("application/pdf".to_string()),
            data: vec![0u8; size],
            tags: vec![],
            ttl_seconds: None,
        }
    }

    async fn force_expired(db: &SqlitePool, item_id: &str) {
        sqlx::query("UPDATE item SET expires_at = ?2 WHERE id = ?1")
            .bind(item_id)
            .bind(Utc::now() - Duration::hours(1))
            .execute(db)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_note_and_link() {
        let f = fixture().await;
        let ws = f.workspaces.get("ws-1").await.unwrap();
        let limits = limits_10mb();

        let note = f
            .store
            .create_item(
                &ws,
                &limits,
                "alice",
                NewItem {
                    kind: ItemKind::Note,
                    title: "Standup notes".to_string(),
                    body: Some("decisions from monday".to_string()),
                    tags: vec!["Meetings".to_string(), "meetings".to_string()],
                    ttl_seconds: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(note.kind, ItemKind::Note);
        assert_eq!(note.tags, vec!["meetings"]);
        assert!(note.file_id.is_none());
        // Notes and links never charge quota
        assert_eq!(f.quota.usage("ws-1").await.unwrap(), 0);

        let err = f
            .store
            .create_item(
                &ws,
                &limits,
                "alice",
                NewItem {
                    kind: ItemKind::Link,
                    title: "Docs".to_string(),
                    body: None,
                    tags: vec![],
                    ttl_seconds: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_drop_charges_quota_once() {
        let f = fixture().await;
        let ws = f.workspaces.get("ws-1").await.unwrap();

        let item = f
            .store
            .create_drop(&ws, &limits_10mb(), "alice", new_drop("report.pdf", 3 * MB as usize))
            .await
            .unwrap();

        assert_eq!(item.kind, ItemKind::Drop);
        assert_eq!(item.title, "report.pdf");
        assert_eq!(f.quota.usage("ws-1").await.unwrap(), 3 * MB);

        let asset = f
            .store
            .asset(item.file_id.as_deref().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(asset.size_bytes, 3 * MB);
        assert!(f.backend.exists(&asset.storage_path).await.unwrap());
    }

    #[tokio::test]
    async fn test_oversized_file_is_validation_not_quota() {
        let f = fixture().await;
        let ws = f.workspaces.get("ws-1").await.unwrap();

        let err = f
            .store
            .create_drop(&ws, &limits_10mb(), "alice", new_drop("huge.bin", 9 * MB as usize))
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Validation(_)));
        assert_eq!(f.quota.usage("ws-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_quota_lifecycle_scenario() {
        // 0 used, 10 MB limit: 6 MB fits, a second 6 MB is rejected,
        // trash keeps billing, purge frees, then the second fits
        let f = fixture().await;
        let ws = f.workspaces.get("ws-1").await.unwrap();
        let limits = limits_10mb();

        let first = f
            .store
            .create_drop(&ws, &limits, "alice", new_drop("a.bin", 6 * MB as usize))
            .await
            .unwrap();
        assert_eq!(f.quota.usage("ws-1").await.unwrap(), 6 * MB);

        let err = f
            .store
            .create_drop(&ws, &limits, "alice", new_drop("b.bin", 6 * MB as usize))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::QuotaExceeded { .. }));
        assert_eq!(f.quota.usage("ws-1").await.unwrap(), 6 * MB);

        f.store.trash(&first.id).await.unwrap();
        assert_eq!(f.quota.usage("ws-1").await.unwrap(), 6 * MB);

        let outcome = f.store.purge(&first.id).await.unwrap();
        assert_eq!(outcome, PurgeOutcome::Purged { bytes_freed: 6 * MB });
        assert_eq!(f.quota.usage("ws-1").await.unwrap(), 0);

        f.store
            .create_drop(&ws, &limits, "alice", new_drop("b.bin", 6 * MB as usize))
            .await
            .unwrap();
        assert_eq!(f.quota.usage("ws-1").await.unwrap(), 6 * MB);
    }

    #[tokio::test]
    async fn test_purge_is_idempotent() {
        let f = fixture().await;
        let ws = f.workspaces.get("ws-1").await.unwrap();

        let item = f
            .store
            .create_drop(&ws, &limits_10mb(), "alice", new_drop("a.bin", 2 * MB as usize))
            .await
            .unwrap();

        assert_eq!(
            f.store.purge(&item.id).await.unwrap(),
            PurgeOutcome::Purged { bytes_freed: 2 * MB }
        );
        // A retried purge is a no-op success and must not release again
        assert_eq!(f.store.purge(&item.id).await.unwrap(), PurgeOutcome::AlreadyGone);
        assert_eq!(f.quota.usage("ws-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_aborts_when_bytes_deletion_fails() {
        let f = fixture().await;
        let ws = f.workspaces.get("ws-1").await.unwrap();

        let item = f
            .store
            .create_drop(&ws, &limits_10mb(), "alice", new_drop("a.bin", 2 * MB as usize))
            .await
            .unwrap();
        let asset = f
            .store
            .asset(item.file_id.as_deref().unwrap())
            .await
            .unwrap()
            .unwrap();

        f.backend.fail_delete_for(&asset.storage_path);

        assert!(f.store.purge(&item.id).await.is_err());
        // Records untouched, quota still charged
        assert!(f.store.get(&item.id).await.is_ok());
        assert!(f.store.asset(&asset.id).await.unwrap().is_some());
        assert_eq!(f.quota.usage("ws-1").await.unwrap(), 2 * MB);
    }

    #[tokio::test]
    async fn test_trash_and_restore_transitions() {
        let f = fixture().await;
        let ws = f.workspaces.get("ws-1").await.unwrap();
        let limits = limits_10mb();

        let item = f
            .store
            .create_item(
                &ws,
                &limits,
                "alice",
                NewItem {
                    kind: ItemKind::Note,
                    title: "n".to_string(),
                    body: None,
                    tags: vec![],
                    ttl_seconds: None,
                },
            )
            .await
            .unwrap();

        f.store.trash(&item.id).await.unwrap();
        assert!(matches!(
            f.store.trash(&item.id).await.unwrap_err(),
            CaptureError::Conflict(_)
        ));

        // Trashed items disappear from the active listing but show in trash
        assert!(f.store.list("ws-1", &ListFilter::default()).await.unwrap().is_empty());
        assert_eq!(f.store.list_trash("ws-1").await.unwrap().len(), 1);

        f.store.restore(&item.id).await.unwrap();
        assert!(matches!(
            f.store.restore(&item.id).await.unwrap_err(),
            CaptureError::Conflict(_)
        ));
        assert_eq!(f.store.list("ws-1", &ListFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_pin_exempts_from_sweep_until_unpinned() {
        let f = fixture().await;
        let ws = f.workspaces.get("ws-1").await.unwrap();

        let item = f
            .store
            .create_drop(&ws, &limits_10mb(), "alice", new_drop("a.bin", MB as usize))
            .await
            .unwrap();
        force_expired(&f.db, &item.id).await;
        f.store.pin(&item.id).await.unwrap();

        let stats = f.store.sweep().await.unwrap();
        assert_eq!(stats.items_deleted, 0);
        assert!(f.store.get(&item.id).await.is_ok());

        // Unpinning an already-expired item defers deletion to the sweep
        f.store.unpin(&item.id).await.unwrap();
        assert!(f.store.get(&item.id).await.is_ok());

        let stats = f.store.sweep().await.unwrap();
        assert_eq!(stats.items_deleted, 1);
        assert_eq!(stats.files_deleted, 1);
        assert_eq!(stats.bytes_freed, MB);
        assert_eq!(f.quota.usage("ws-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sweep_ignores_unexpired_items() {
        let f = fixture().await;
        let ws = f.workspaces.get("ws-1").await.unwrap();
        let limits = limits_10mb();

        f.store
            .create_item(
                &ws,
                &limits,
                "alice",
                NewItem {
                    kind: ItemKind::Note,
                    title: "keep".to_string(),
                    body: None,
                    tags: vec![],
                    ttl_seconds: Some(3600),
                },
            )
            .await
            .unwrap();
        f.store
            .create_drop(&ws, &limits, "alice", new_drop("keep.bin", MB as usize))
            .await
            .unwrap();

        let stats = f.store.sweep().await.unwrap();
        assert_eq!(stats.items_deleted, 0);
        assert_eq!(f.quota.usage("ws-1").await.unwrap(), MB);
    }

    #[tokio::test]
    async fn test_sweep_continues_past_single_failure() {
        let f = fixture().await;
        let ws = f.workspaces.get("ws-1").await.unwrap();
        let limits = limits_10mb();

        let mut items = Vec::new();
        for name in ["a.bin", "b.bin", "c.bin"] {
            let item = f
                .store
                .create_drop(&ws, &limits, "alice", new_drop(name, MB as usize))
                .await
                .unwrap();
            force_expired(&f.db, &item.id).await;
            items.push(item);
        }

        let bad_asset = f
            .store
            .asset(items[1].file_id.as_deref().unwrap())
            .await
            .unwrap()
            .unwrap();
        f.backend.fail_delete_for(&bad_asset.storage_path);

        let stats = f.store.sweep().await.unwrap();
        assert_eq!(stats.items_deleted, 2);
        assert_eq!(stats.files_deleted, 2);
        assert_eq!(stats.bytes_freed, 2 * MB);
        assert_eq!(stats.failures, 1);

        // The failing item is left untouched for the next sweep
        assert!(f.store.get(&items[1].id).await.is_ok());
        assert!(f.store.asset(&bad_asset.id).await.unwrap().is_some());
        // Only the two successful purges are reflected in the counter
        assert_eq!(f.quota.usage("ws-1").await.unwrap(), MB);
    }

    #[tokio::test]
    async fn test_sweep_collects_trashed_expired_items() {
        let f = fixture().await;
        let ws = f.workspaces.get("ws-1").await.unwrap();

        let item = f
            .store
            .create_drop(&ws, &limits_10mb(), "alice", new_drop("a.bin", MB as usize))
            .await
            .unwrap();
        f.store.trash(&item.id).await.unwrap();
        force_expired(&f.db, &item.id).await;

        let stats = f.store.sweep().await.unwrap();
        assert_eq!(stats.items_deleted, 1);
        assert_eq!(f.quota.usage("ws-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_listing_filters() {
        let f = fixture().await;
        let ws = f.workspaces.get("ws-1").await.unwrap();
        let limits = limits_10mb();

        for (title, body, tags) in [
            ("Quarterly report", Some("numbers for Q3"), vec!["finance"]),
            ("Reading list", Some("articles to read"), vec!["personal"]),
        ] {
            f.store
                .create_item(
                    &ws,
                    &limits,
                    "alice",
                    NewItem {
                        kind: ItemKind::Note,
                        title: title.to_string(),
                        body: body.map(String::from),
                        tags: tags.into_iter().map(String::from).collect(),
                        ttl_seconds: None,
                    },
                )
                .await
                .unwrap();
        }

        let hits = f
            .store
            .list(
                "ws-1",
                &ListFilter {
                    q: Some("Q3".to_string()),
                    tag: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Quarterly report");

        let hits = f
            .store
            .list(
                "ws-1",
                &ListFilter {
                    q: None,
                    tag: Some("Personal".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Reading list");
    }

    #[tokio::test]
    async fn test_retention_default_sets_expiry() {
        let f = fixture().await;
        let ws = f.workspaces.get("ws-1").await.unwrap();
        let limits = StaticTierProvider.limits_for("free");

        let item = f
            .store
            .create_item(
                &ws,
                &limits,
                "alice",
                NewItem {
                    kind: ItemKind::Note,
                    title: "n".to_string(),
                    body: None,
                    tags: vec![],
                    ttl_seconds: None,
                },
            )
            .await
            .unwrap();

        // Free tier retention is 30 days
        let expires = item.expires_at.unwrap();
        let days = (expires - item.created_at).num_days();
        assert_eq!(days, 30);
    }
}
