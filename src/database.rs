use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info, instrument};

use crate::{
    error::StoreError,
    record::{MusicRecord, MusicRecordPatch, NewMusicRecord},
};
// Module Database contains all database functions for connecting and interacting with the DB

pub async fn connect_to_database(url: &str, max_connections: u32) -> Result<SqlitePool, StoreError> {
    // Configure database connection options
    let opts: SqliteConnectOptions = url.parse()?;
    let opts = opts.create_if_missing(true);

    let pool_options = if url.contains(":memory:") {
        // an in-memory database only lives as long as its connection
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections)
    };

    let pool = pool_options.connect_with(opts).await?;
    info!(url, "connected to the database");
    Ok(pool)
}

/// Applies the migrations embedded from `migrations/`
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    debug!("database schema is up to date");
    Ok(())
}

#[instrument(skip(pool), level = "trace")]
pub async fn get_all_records(pool: &SqlitePool) -> Result<Vec<MusicRecord>, StoreError> {
    let records = sqlx::query_as::<_, MusicRecord>(
        r#"
        SELECT id, title, artist, album, release_date, genre
        FROM music_library
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;
    debug!(count = records.len(), "fetched music records");
    Ok(records)
}

#[instrument(skip(pool), level = "trace")]
pub async fn get_record(pool: &SqlitePool, id: i64) -> Result<MusicRecord, StoreError> {
    sqlx::query_as::<_, MusicRecord>(
        r#"
        SELECT id, title, artist, album, release_date, genre
        FROM music_library
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound(id))
}

#[instrument(skip(pool), ret, level = "trace")]
pub async fn add_record(pool: &SqlitePool, record: &NewMusicRecord) -> Result<MusicRecord, StoreError> {
    let stored = sqlx::query_as::<_, MusicRecord>(
        r#"
        INSERT INTO music_library (title, artist, album, release_date, genre)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, title, artist, album, release_date, genre
        "#,
    )
    .bind(&record.title)
    .bind(&record.artist)
    .bind(&record.album)
    .bind(record.release_date)
    .bind(&record.genre)
    .fetch_one(pool)
    .await?;
    Ok(stored)
}

/// Overwrites only the fields present in `patch`, in one statement
#[instrument(skip(pool), ret, level = "trace")]
pub async fn update_record(
    pool: &SqlitePool,
    id: i64,
    patch: &MusicRecordPatch,
) -> Result<MusicRecord, StoreError> {
    sqlx::query_as::<_, MusicRecord>(
        r#"
        UPDATE music_library SET
            title = COALESCE(?, title),
            artist = COALESCE(?, artist),
            album = COALESCE(?, album),
            release_date = COALESCE(?, release_date),
            genre = COALESCE(?, genre)
        WHERE id = ?
        RETURNING id, title, artist, album, release_date, genre
        "#,
    )
    .bind(patch.title.as_deref())
    .bind(patch.artist.as_deref())
    .bind(patch.album.as_deref())
    .bind(patch.release_date)
    .bind(patch.genre.as_deref())
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound(id))
}

#[instrument(skip(pool), level = "trace")]
pub async fn delete_record(pool: &SqlitePool, id: i64) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM music_library WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    async fn test_pool() -> SqlitePool {
        let pool = connect_to_database("sqlite::memory:", 1)
            .await
            .expect("in-memory database");
        run_migrations(&pool).await.expect("migrations");
        pool
    }

    fn paranoid() -> NewMusicRecord {
        NewMusicRecord::new(
            "Paranoid",
            "Black Sabbath",
            "Paranoid",
            NaiveDate::from_ymd_opt(1970, 9, 18).unwrap(),
            "Metal",
        )
    }

    fn iron_lung() -> NewMusicRecord {
        NewMusicRecord::new(
            "My Iron Lung",
            "Radiohead",
            "The Bends",
            NaiveDate::from_ymd_opt(1995, 3, 13).unwrap(),
            "Rock",
        )
    }

    #[tokio::test]
    async fn add_then_get_returns_same_fields() {
        let pool = test_pool().await;

        let stored = add_record(&pool, &paranoid()).await.unwrap();
        assert_eq!(stored.id, 1);

        let fetched = get_record(&pool, stored.id).await.unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(fetched.title, "Paranoid");
        assert_eq!(fetched.release_date, NaiveDate::from_ymd_opt(1970, 9, 18).unwrap());
    }

    #[tokio::test]
    async fn list_tracks_creates_and_deletes() {
        let pool = test_pool().await;
        assert!(get_all_records(&pool).await.unwrap().is_empty());

        let first = add_record(&pool, &paranoid()).await.unwrap();
        let second = add_record(&pool, &iron_lung()).await.unwrap();
        add_record(&pool, &iron_lung()).await.unwrap();
        assert_ne!(first.id, second.id);

        delete_record(&pool, first.id).await.unwrap();
        assert!(matches!(
            delete_record(&pool, first.id).await,
            Err(StoreError::NotFound(_))
        ));

        let records = get_all_records(&pool).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|record| record.id != first.id));
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let pool = test_pool().await;

        assert!(matches!(get_record(&pool, 9999).await, Err(StoreError::NotFound(9999))));
        assert!(matches!(
            update_record(&pool, 9999, &MusicRecordPatch::default()).await,
            Err(StoreError::NotFound(9999))
        ));
        assert!(matches!(delete_record(&pool, 9999).await, Err(StoreError::NotFound(9999))));
    }

    #[tokio::test]
    async fn update_changes_only_supplied_fields() {
        let pool = test_pool().await;
        let stored = add_record(&pool, &paranoid()).await.unwrap();

        let patch = MusicRecordPatch {
            artist: Some("Ozzy".to_owned()),
            release_date: NaiveDate::from_ymd_opt(1971, 1, 1),
            ..Default::default()
        };
        let updated = update_record(&pool, stored.id, &patch).await.unwrap();

        assert_eq!(
            updated,
            MusicRecord {
                artist: "Ozzy".to_owned(),
                release_date: NaiveDate::from_ymd_opt(1971, 1, 1).unwrap(),
                ..stored
            }
        );
        assert_eq!(get_record(&pool, updated.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn empty_patch_leaves_record_alone() {
        let pool = test_pool().await;
        let stored = add_record(&pool, &iron_lung()).await.unwrap();

        let updated = update_record(&pool, stored.id, &MusicRecordPatch::default())
            .await
            .unwrap();
        assert_eq!(updated, stored);
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let pool = test_pool().await;
        let first = add_record(&pool, &paranoid()).await.unwrap();
        delete_record(&pool, first.id).await.unwrap();

        let second = add_record(&pool, &paranoid()).await.unwrap();
        assert!(second.id > first.id);
        assert!(matches!(get_record(&pool, first.id).await, Err(StoreError::NotFound(_))));
    }
}
