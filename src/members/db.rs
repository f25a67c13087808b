//! Member database operations
//!
//! Handles all database interactions for users and their photos. Reads go
//! straight to the pool; mutations each run inside a single transaction,
//! which is the unit-of-work commit for that request. Nothing here guards
//! against two requests interleaving between a handler's read and its
//! commit.

use crate::error::AppError;
use crate::members::models::{AppUser, MemberDto, MemberUpdateDto, Photo};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

/// How to order a member listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberOrder {
    /// Newest accounts first
    Created,
    /// Most recently active first (the default)
    LastActive,
}

/// Filter set for the paged member listing
///
/// The gender field is always populated by the time it reaches the
/// repository; the handler fills in the opposite-gender default before
/// querying. Age limits arrive pre-converted to date-of-birth bounds.
#[derive(Debug, Clone)]
pub struct MemberFilter {
    /// Caller's username, always excluded from results
    pub current_username: String,
    /// Gender to list
    pub gender: String,
    /// Oldest acceptable date of birth (inclusive)
    pub min_dob: NaiveDate,
    /// Youngest acceptable date of birth (inclusive)
    pub max_dob: NaiveDate,
    pub order_by: MemberOrder,
    /// 1-based page number
    pub page_number: i64,
    pub page_size: i64,
}

/// One page of results plus the counters the pagination header needs
#[derive(Debug, Clone)]
pub struct PagedList<T> {
    pub items: Vec<T>,
    pub current_page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

impl<T> PagedList<T> {
    /// Assemble a page, deriving the page count from the total
    pub fn new(items: Vec<T>, total_count: i64, page_number: i64, page_size: i64) -> Self {
        let total_pages = if total_count == 0 {
            0
        } else {
            (total_count + page_size - 1) / page_size
        };
        Self {
            items,
            current_page: page_number,
            page_size,
            total_count,
            total_pages,
        }
    }
}

/// Database connection pool for member operations
pub struct MemberDb {
    pool: SqlitePool,
}

impl MemberDb {
    /// Initialize database connection pool
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    ///
    /// # Returns
    /// * `Ok(MemberDb)` if successful
    /// * `Err(AppError)` if connection failed
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        // Ensure parent directory exists
        if let Some(parent) = PathBuf::from(db_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to create db directory: {}", e))
            })?;
        }

        // SQLite connection string format: sqlite://path/to/db.db
        let connection_string = if db_path.starts_with("sqlite:") {
            db_path.to_string()
        } else {
            format!("sqlite:{}", db_path)
        };

        let options = SqliteConnectOptions::from_str(&connection_string)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid database path: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to connect to database: {}", e))
            })?;

        info!("Connected to SQLite database at: {}", db_path);

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");

        let migration_sql = include_str!("../../migrations/001_create_members.sql");

        // Remove comments (lines starting with --) and normalize whitespace
        let mut cleaned_sql = String::new();
        for line in migration_sql.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("--") {
                continue;
            }
            // Remove inline comments (everything after --)
            let without_comments = if let Some(comment_pos) = trimmed.find("--") {
                &trimmed[..comment_pos]
            } else {
                trimmed
            };
            cleaned_sql.push_str(without_comments.trim());
            cleaned_sql.push(' ');
        }

        // Split by semicolon and filter out empty statements
        let statements: Vec<&str> = cleaned_sql
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::Internal(anyhow::anyhow!(
                        "Migration failed: {} - Statement: {}",
                        e,
                        statement.chars().take(100).collect::<String>()
                    ))
                })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Look up a user's recorded gender
    pub async fn get_user_gender(&self, username: &str) -> Result<Option<String>, AppError> {
        let gender: Option<String> =
            sqlx::query_scalar("SELECT gender FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Failed to fetch user gender: {}", e))
                })?;

        Ok(gender)
    }

    /// Fetch a user row by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<AppUser>, AppError> {
        let user = sqlx::query_as::<_, AppUser>(
            "SELECT id, username, known_as, gender, date_of_birth, city, country, \
             introduction, looking_for, interests, created, last_active \
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to fetch user: {}", e)))?;

        Ok(user)
    }

    /// Fetch all photos belonging to a user, main photo first
    pub async fn get_photos(&self, user_id: i64) -> Result<Vec<Photo>, AppError> {
        let photos = sqlx::query_as::<_, Photo>(
            "SELECT id, user_id, url, public_id, is_main FROM photos \
             WHERE user_id = ? ORDER BY is_main DESC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to fetch photos: {}", e)))?;

        Ok(photos)
    }

    /// Fetch photos for a set of users in one query
    async fn get_photos_for_users(&self, user_ids: &[i64]) -> Result<Vec<Photo>, AppError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; user_ids.len()].join(", ");
        let sql = format!(
            "SELECT id, user_id, url, public_id, is_main FROM photos \
             WHERE user_id IN ({}) ORDER BY is_main DESC, id ASC",
            placeholders
        );

        let mut query = sqlx::query_as::<_, Photo>(&sql);
        for id in user_ids {
            query = query.bind(*id);
        }

        let photos = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to fetch photos: {}", e)))?;

        Ok(photos)
    }

    /// Fetch a single member projection by username
    pub async fn get_member(&self, username: &str) -> Result<Option<MemberDto>, AppError> {
        let Some(user) = self.get_user_by_username(username).await? else {
            return Ok(None);
        };
        let photos = self.get_photos(user.id).await?;
        Ok(Some(MemberDto::project(&user, &photos)))
    }

    /// Paged member listing with filters applied
    ///
    /// Returns projections plus the counters needed for the pagination
    /// header. Two queries: a count over the filter, then the page itself;
    /// photos for the page are loaded in a single extra query.
    pub async fn list_members(
        &self,
        filter: &MemberFilter,
    ) -> Result<PagedList<MemberDto>, AppError> {
        const WHERE_CLAUSE: &str = "username != ? AND gender = ? \
             AND date_of_birth >= ? AND date_of_birth <= ?";

        let count_sql = format!("SELECT COUNT(*) FROM users WHERE {}", WHERE_CLAUSE);
        let total_count: i64 = sqlx::query_scalar(&count_sql)
            .bind(&filter.current_username)
            .bind(&filter.gender)
            .bind(filter.min_dob)
            .bind(filter.max_dob)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to count members: {}", e)))?;

        let order_clause = match filter.order_by {
            MemberOrder::Created => "created DESC",
            MemberOrder::LastActive => "last_active DESC",
        };
        let page_sql = format!(
            "SELECT id, username, known_as, gender, date_of_birth, city, country, \
             introduction, looking_for, interests, created, last_active \
             FROM users WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            WHERE_CLAUSE, order_clause
        );

        let offset = (filter.page_number - 1) * filter.page_size;
        let users = sqlx::query_as::<_, AppUser>(&page_sql)
            .bind(&filter.current_username)
            .bind(&filter.gender)
            .bind(filter.min_dob)
            .bind(filter.max_dob)
            .bind(filter.page_size)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to list members: {}", e)))?;

        let user_ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        let photos = self.get_photos_for_users(&user_ids).await?;

        let members = users
            .iter()
            .map(|user| {
                let own: Vec<Photo> = photos
                    .iter()
                    .filter(|p| p.user_id == user.id)
                    .cloned()
                    .collect();
                MemberDto::project(user, &own)
            })
            .collect();

        debug!(
            page = filter.page_number,
            page_size = filter.page_size,
            total = total_count,
            "Listed members"
        );

        Ok(PagedList::new(
            members,
            total_count,
            filter.page_number,
            filter.page_size,
        ))
    }

    /// Apply a partial profile update and commit
    pub async fn update_profile(
        &self,
        user_id: i64,
        update: &MemberUpdateDto,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query(
            "UPDATE users SET \
             introduction = COALESCE(?, introduction), \
             looking_for = COALESCE(?, looking_for), \
             interests = COALESCE(?, interests), \
             city = COALESCE(?, city), \
             country = COALESCE(?, country) \
             WHERE id = ?",
        )
        .bind(&update.introduction)
        .bind(&update.looking_for)
        .bind(&update.interests)
        .bind(&update.city)
        .bind(&update.country)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to update profile: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to commit update: {}", e)))?;

        debug!(user_id, "Updated profile");
        Ok(())
    }

    /// Insert a photo row and commit
    pub async fn add_photo(
        &self,
        user_id: i64,
        url: &str,
        public_id: Option<&str>,
        is_main: bool,
    ) -> Result<Photo, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let result = sqlx::query(
            "INSERT INTO photos (user_id, url, public_id, is_main) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(url)
        .bind(public_id)
        .bind(is_main)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to add photo: {}", e)))?;

        let photo_id = result.last_insert_rowid();

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to commit photo: {}", e)))?;

        debug!(user_id, photo_id, is_main, "Added photo");

        Ok(Photo {
            id: photo_id,
            user_id,
            url: url.to_string(),
            public_id: public_id.map(str::to_string),
            is_main,
        })
    }

    /// Clear the current main photo (if any) and flag the new one, in one commit
    pub async fn set_main_photo(&self, user_id: i64, photo_id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query("UPDATE photos SET is_main = 0 WHERE user_id = ? AND is_main = 1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to clear main photo: {}", e))
            })?;

        sqlx::query("UPDATE photos SET is_main = 1 WHERE id = ? AND user_id = ?")
            .bind(photo_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to set main photo: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to commit main photo change: {}", e))
        })?;

        debug!(user_id, photo_id, "Set main photo");
        Ok(())
    }

    /// Remove a photo row and commit
    pub async fn delete_photo(&self, photo_id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query("DELETE FROM photos WHERE id = ?")
            .bind(photo_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to delete photo: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to commit photo deletion: {}", e))
        })?;

        debug!(photo_id, "Deleted photo");
        Ok(())
    }

    /// Get the database pool (used by tests for seeding)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
