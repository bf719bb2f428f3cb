use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::Receiver;
use indexmap::{IndexMap, IndexSet};
use rusqlite::config::DbConfig;
use rusqlite::{params, Connection, OptionalExtension};
use time::OffsetDateTime;

use super::schema;
use super::{DraftCache, DraftChange, DraftEvent, DraftStore, VideoDraft};
use crate::candidate::{ThumbnailCandidate, ThumbnailKind, TitleCandidate, VideoId};
use crate::config::StorageOptions;

#[derive(Debug, Clone)]
pub struct DraftSummary {
    pub video_id: VideoId,
    pub titles: usize,
    pub thumbnails: usize,
    pub updated_at: i64,
}

/// Durable home of the draft cache.
#[derive(Clone)]
pub struct DraftDatabase {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl DraftDatabase {
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&*self.db_path)
            .with_context(|| format!("opening database {}", self.db_path.display()))?;
        prepare_connection(&conn, &self.options)?;
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    /// Fills `cache` with every persisted draft, in first-written order.
    pub fn hydrate(&self, cache: &DraftCache) -> Result<usize> {
        let drafts = self.load_all()?;
        let count = drafts.len();
        cache.hydrate(drafts);
        tracing::debug!(count, "hydrated draft cache");
        Ok(count)
    }

    /// Writes back every draft named by a pending `Written` event. Events
    /// for the same video collapse into one write.
    pub fn persist_events(
        &self,
        cache: &DraftCache,
        events: &Receiver<DraftEvent>,
    ) -> Result<usize> {
        let dirty: IndexSet<VideoId> = events
            .try_iter()
            .filter(|event| event.change == DraftChange::Written)
            .map(|event| event.video_id)
            .collect();
        for video_id in &dirty {
            if let Some(draft) = cache.get(video_id) {
                self.save_draft(video_id, &draft)
                    .with_context(|| format!("persisting draft for {video_id}"))?;
            }
        }
        Ok(dirty.len())
    }

    pub fn load_all(&self) -> Result<Vec<(VideoId, VideoDraft)>> {
        self.with_connection(|conn| {
            let mut drafts: IndexMap<VideoId, VideoDraft> = IndexMap::new();
            let mut stmt = conn.prepare("SELECT video_id FROM drafts ORDER BY created_at, rowid")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()
                .context("listing drafts")?;
            for id in ids {
                drafts.insert(VideoId::from(id), VideoDraft::default());
            }

            let mut stmt = conn.prepare(
                "SELECT video_id, text FROM draft_titles ORDER BY video_id, position",
            )?;
            let titles = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<Result<Vec<_>, _>>()
                .context("loading draft titles")?;
            for (video_id, text) in titles {
                if let Some(draft) = drafts.get_mut(&VideoId::from(video_id)) {
                    draft.titles.push(TitleCandidate::new(text));
                }
            }

            let mut stmt = conn.prepare(
                "SELECT video_id, kind, timestamp FROM draft_thumbnails ORDER BY video_id, position",
            )?;
            let thumbnails = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()
                .context("loading draft thumbnails")?;
            for (video_id, kind, timestamp) in thumbnails {
                let thumbnail = decode_thumbnail(&kind, timestamp)?;
                if let Some(draft) = drafts.get_mut(&VideoId::from(video_id)) {
                    draft.thumbnails.push(thumbnail);
                }
            }

            Ok(drafts.into_iter().collect())
        })
    }

    pub fn fetch_draft(&self, video_id: &VideoId) -> Result<Option<VideoDraft>> {
        self.with_connection(|conn| {
            let exists = conn
                .query_row(
                    "SELECT 1 FROM drafts WHERE video_id = ?1",
                    params![video_id.as_str()],
                    |_row| Ok(()),
                )
                .optional()?
                .is_some();
            if !exists {
                return Ok(None);
            }

            let mut stmt = conn
                .prepare("SELECT text FROM draft_titles WHERE video_id = ?1 ORDER BY position")?;
            let titles = stmt
                .query_map(params![video_id.as_str()], |row| row.get::<_, String>(0))?
                .map(|text| text.map(TitleCandidate::new))
                .collect::<Result<Vec<_>, _>>()
                .context("loading draft titles")?;

            let mut stmt = conn.prepare(
                "SELECT kind, timestamp FROM draft_thumbnails WHERE video_id = ?1 ORDER BY position",
            )?;
            let raw = stmt
                .query_map(params![video_id.as_str()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, Option<f64>>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()
                .context("loading draft thumbnails")?;
            let thumbnails = raw
                .iter()
                .map(|(kind, timestamp)| decode_thumbnail(kind, *timestamp))
                .collect::<Result<Vec<_>>>()?;

            Ok(Some(VideoDraft { titles, thumbnails }))
        })
    }

    /// Replaces the stored draft for `video_id` in one transaction.
    pub fn save_draft(&self, video_id: &VideoId, draft: &VideoDraft) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let now = OffsetDateTime::now_utc().unix_timestamp();
        tx.execute(
            "INSERT INTO drafts (video_id, created_at, updated_at) VALUES (?1, ?2, ?2)
             ON CONFLICT(video_id) DO UPDATE SET updated_at = excluded.updated_at",
            params![video_id.as_str(), now],
        )
        .context("upserting draft row")?;
        tx.execute(
            "DELETE FROM draft_titles WHERE video_id = ?1",
            params![video_id.as_str()],
        )?;
        tx.execute(
            "DELETE FROM draft_thumbnails WHERE video_id = ?1",
            params![video_id.as_str()],
        )?;
        for (position, title) in draft.titles.iter().enumerate() {
            tx.execute(
                "INSERT INTO draft_titles (video_id, position, text) VALUES (?1, ?2, ?3)",
                params![video_id.as_str(), position as i64, title.text],
            )
            .context("inserting draft title")?;
        }
        for (position, thumbnail) in draft.thumbnails.iter().enumerate() {
            let kind: &'static str = thumbnail.kind().into();
            tx.execute(
                "INSERT INTO draft_thumbnails (video_id, position, kind, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    video_id.as_str(),
                    position as i64,
                    kind,
                    thumbnail.timestamp()
                ],
            )
            .context("inserting draft thumbnail")?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_drafts(&self) -> Result<Vec<DraftSummary>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT d.video_id,
                        (SELECT COUNT(*) FROM draft_titles t WHERE t.video_id = d.video_id),
                        (SELECT COUNT(*) FROM draft_thumbnails th WHERE th.video_id = d.video_id),
                        d.updated_at
                 FROM drafts d
                 ORDER BY d.updated_at DESC, d.video_id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(DraftSummary {
                    video_id: VideoId::from(row.get::<_, String>(0)?),
                    titles: row.get::<_, i64>(1)? as usize,
                    thumbnails: row.get::<_, i64>(2)? as usize,
                    updated_at: row.get(3)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
                .context("listing draft summaries")
        })
    }
}

pub fn init(storage: &StorageOptions) -> Result<DraftDatabase> {
    let db_path = &storage.database_path;
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    prepare_connection(&conn, storage)?;
    schema::apply(&conn)?;
    Ok(DraftDatabase {
        db_path: Arc::new(db_path.clone()),
        options: Arc::new(storage.clone()),
    })
}

fn prepare_connection(conn: &Connection, storage: &StorageOptions) -> Result<()> {
    conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)
        .context("enabling foreign keys")?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("setting journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("setting synchronous=NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        storage.wal_autocheckpoint.to_string(),
    )
    .context("setting wal_autocheckpoint")?;
    Ok(())
}

fn decode_thumbnail(kind: &str, timestamp: Option<f64>) -> Result<ThumbnailCandidate> {
    let kind = ThumbnailKind::from_str(kind)
        .map_err(|_| anyhow!("unknown thumbnail kind '{kind}' in draft store"))?;
    match (kind, timestamp) {
        (ThumbnailKind::Original, _) => Ok(ThumbnailCandidate::Original),
        (ThumbnailKind::CurrentFrame, _) => Ok(ThumbnailCandidate::CurrentFrame),
        (ThumbnailKind::AtTimestamp, Some(timestamp)) => Ok(ThumbnailCandidate::at(timestamp)),
        (ThumbnailKind::AtTimestamp, None) => Err(anyhow!("timestamp thumbnail without a time")),
    }
}
