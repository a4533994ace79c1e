//! `PostgreSQL` storage backend.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate compiles
//! without a live database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use nimbus_core::{
    Coordinates, Email, ForecastDay, ForecastId, Location, LocationId, MAX_FORECAST_DAYS,
    NewLocation, SnapshotId, StoredForecastDay, UserId, Username, WeatherReading,
    WeatherSnapshot,
};

use super::{RepositoryError, Storage};
use crate::models::{NewUser, User};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            username,
            email,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    id: i32,
    user_id: Option<i32>,
    name: String,
    country: String,
    lat: f64,
    lon: f64,
    is_favorite: bool,
    created_at: DateTime<Utc>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Self {
            id: LocationId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            name: row.name,
            country: row.country,
            lat: row.lat,
            lon: row.lon,
            is_favorite: row.is_favorite,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SnapshotRow {
    id: i32,
    location_id: i32,
    temperature: f64,
    feels_like: f64,
    humidity: i32,
    pressure: f64,
    wind_speed: f64,
    wind_direction: Option<i32>,
    visibility: Option<f64>,
    description: String,
    icon: String,
    cloudiness: Option<i32>,
    uv_index: Option<f64>,
    observed_at: DateTime<Utc>,
}

impl From<SnapshotRow> for WeatherSnapshot {
    fn from(row: SnapshotRow) -> Self {
        Self {
            id: SnapshotId::new(row.id),
            location_id: LocationId::new(row.location_id),
            reading: WeatherReading {
                temperature: row.temperature,
                feels_like: row.feels_like,
                humidity: row.humidity,
                pressure: row.pressure,
                wind_speed: row.wind_speed,
                wind_direction: row.wind_direction,
                visibility: row.visibility,
                description: row.description,
                icon: row.icon,
                cloudiness: row.cloudiness,
                uv_index: row.uv_index,
            },
            timestamp: row.observed_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ForecastRow {
    id: i32,
    location_id: i32,
    date: NaiveDate,
    temp_high: f64,
    temp_low: f64,
    description: String,
    icon: String,
    humidity: i32,
    wind_speed: f64,
    precipitation: f64,
    precipitation_chance: i32,
}

impl From<ForecastRow> for StoredForecastDay {
    fn from(row: ForecastRow) -> Self {
        Self {
            id: ForecastId::new(row.id),
            location_id: LocationId::new(row.location_id),
            day: ForecastDay {
                date: row.date,
                temp_high: row.temp_high,
                temp_low: row.temp_low,
                description: row.description,
                icon: row.icon,
                humidity: row.humidity,
                wind_speed: row.wind_speed,
                precipitation: row.precipitation,
                precipitation_chance: row.precipitation_chance,
            },
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, created_at";
const LOCATION_COLUMNS: &str = "id, user_id, name, country, lat, lon, is_favorite, created_at";
const SNAPSHOT_COLUMNS: &str = "id, location_id, temperature, feels_like, humidity, pressure, \
     wind_speed, wind_direction, visibility, description, icon, cloudiness, uv_index, observed_at";
const FORECAST_COLUMNS: &str = "id, location_id, date, temp_high, temp_low, description, icon, \
     humidity, wind_speed, precipitation, precipitation_chance";

/// Matches within tolerance, nearest first, ties to the smallest id.
const NEAREST_LOCATION: &str = "SELECT id, user_id, name, country, lat, lon, is_favorite, created_at \
     FROM locations \
     WHERE abs(lat - $1) < $3 AND abs(lon - $2) < $3 \
     ORDER BY (lat - $1) * (lat - $1) + (lon - $2) * (lon - $2), id \
     LIMIT 1";

/// Advisory lock key for a coordinate bucket.
///
/// Every point that could match `coords` lies in this bucket or one of its
/// eight neighbours, so creators lock the whole 3x3 block in a fixed order.
fn bucket_keys(coords: Coordinates) -> Vec<i64> {
    let (lat_bucket, lon_bucket) = coords.bucket();
    let mut keys: Vec<i64> = (-1..=1)
        .flat_map(|dlat| {
            (-1..=1).map(move |dlon| {
                (i64::from(lat_bucket + dlat) << 32) ^ i64::from(lon_bucket + dlon)
            })
        })
        .collect();
    keys.sort_unstable();
    keys
}

fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Turn a foreign key violation on `location_id` into `NotFound`.
fn map_missing_location(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}

/// Lock a location row for the rest of the transaction.
///
/// Refreshes of the same location queue up here, so each one deletes the
/// rows its predecessor committed and the last writer wins.
async fn lock_location(
    tx: &mut Transaction<'_, Postgres>,
    id: LocationId,
) -> Result<(), RepositoryError> {
    sqlx::query_scalar::<_, i32>("SELECT id FROM locations WHERE id = $1 FOR UPDATE")
        .bind(id.as_i32())
        .fetch_optional(&mut **tx)
        .await?
        .map(|_| ())
        .ok_or(RepositoryError::NotFound)
}

// =============================================================================
// Repository
// =============================================================================

/// Storage backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "user"))?;

        row.try_into()
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Ok((row.user.try_into()?, row.password_hash)))
            .transpose()
    }

    async fn find_near(&self, query: Coordinates) -> Result<Option<Location>, RepositoryError> {
        let row = sqlx::query_as::<_, LocationRow>(NEAREST_LOCATION)
            .bind(query.lat())
            .bind(query.lon())
            .bind(nimbus_core::MATCH_THRESHOLD)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn resolve_or_create(&self, new: NewLocation) -> Result<Location, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for key in bucket_keys(new.coordinates) {
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(key)
                .execute(&mut *tx)
                .await?;
        }

        let existing = sqlx::query_as::<_, LocationRow>(NEAREST_LOCATION)
            .bind(new.coordinates.lat())
            .bind(new.coordinates.lon())
            .bind(nimbus_core::MATCH_THRESHOLD)
            .fetch_optional(&mut *tx)
            .await?;

        let row = match existing {
            Some(row) => row,
            None => {
                sqlx::query_as::<_, LocationRow>(&format!(
                    "INSERT INTO locations (user_id, name, country, lat, lon, is_favorite) \
                     VALUES ($1, $2, $3, $4, $5, $6) RETURNING {LOCATION_COLUMNS}"
                ))
                .bind(new.user_id.map(|id| id.as_i32()))
                .bind(&new.name)
                .bind(&new.country)
                .bind(new.coordinates.lat())
                .bind(new.coordinates.lon())
                .bind(new.is_favorite)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(row.into())
    }

    async fn location(&self, id: LocationId) -> Result<Option<Location>, RepositoryError> {
        let row = sqlx::query_as::<_, LocationRow>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn locations_owned_by(&self, owner: UserId) -> Result<Vec<Location>, RepositoryError> {
        let rows = sqlx::query_as::<_, LocationRow>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE user_id = $1 ORDER BY id"
        ))
        .bind(owner.as_i32())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn mark_favorite(
        &self,
        id: LocationId,
        owner: UserId,
    ) -> Result<Option<Location>, RepositoryError> {
        let row = sqlx::query_as::<_, LocationRow>(&format!(
            "UPDATE locations SET is_favorite = TRUE, user_id = $2 WHERE id = $1 \
             RETURNING {LOCATION_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn delete_owned_location(
        &self,
        id: LocationId,
        owner: UserId,
    ) -> Result<bool, RepositoryError> {
        // Snapshot and forecast rows go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM locations WHERE id = $1 AND user_id = $2")
            .bind(id.as_i32())
            .bind(owner.as_i32())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_snapshot(
        &self,
        location_id: LocationId,
        reading: WeatherReading,
    ) -> Result<WeatherSnapshot, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_location(&mut tx, location_id).await?;

        sqlx::query("DELETE FROM weather_snapshots WHERE location_id = $1")
            .bind(location_id.as_i32())
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, SnapshotRow>(&format!(
            "INSERT INTO weather_snapshots (location_id, temperature, feels_like, humidity, \
             pressure, wind_speed, wind_direction, visibility, description, icon, cloudiness, \
             uv_index) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {SNAPSHOT_COLUMNS}"
        ))
        .bind(location_id.as_i32())
        .bind(reading.temperature)
        .bind(reading.feels_like)
        .bind(reading.humidity)
        .bind(reading.pressure)
        .bind(reading.wind_speed)
        .bind(reading.wind_direction)
        .bind(reading.visibility)
        .bind(&reading.description)
        .bind(&reading.icon)
        .bind(reading.cloudiness)
        .bind(reading.uv_index)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_missing_location)?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn latest_snapshot(
        &self,
        location_id: LocationId,
    ) -> Result<Option<WeatherSnapshot>, RepositoryError> {
        let row = sqlx::query_as::<_, SnapshotRow>(&format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM weather_snapshots WHERE location_id = $1"
        ))
        .bind(location_id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn replace_forecast(
        &self,
        location_id: LocationId,
        days: Vec<ForecastDay>,
    ) -> Result<Vec<StoredForecastDay>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_location(&mut tx, location_id).await?;

        sqlx::query("DELETE FROM forecast_days WHERE location_id = $1")
            .bind(location_id.as_i32())
            .execute(&mut *tx)
            .await?;

        let mut stored = Vec::with_capacity(days.len().min(MAX_FORECAST_DAYS));
        for day in days.into_iter().take(MAX_FORECAST_DAYS) {
            let row = sqlx::query_as::<_, ForecastRow>(&format!(
                "INSERT INTO forecast_days (location_id, date, temp_high, temp_low, description, \
                 icon, humidity, wind_speed, precipitation, precipitation_chance) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {FORECAST_COLUMNS}"
            ))
            .bind(location_id.as_i32())
            .bind(day.date)
            .bind(day.temp_high)
            .bind(day.temp_low)
            .bind(&day.description)
            .bind(&day.icon)
            .bind(day.humidity)
            .bind(day.wind_speed)
            .bind(day.precipitation)
            .bind(day.precipitation_chance)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_missing_location)?;
            stored.push(row.into());
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn forecast(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<StoredForecastDay>, RepositoryError> {
        let rows = sqlx::query_as::<_, ForecastRow>(&format!(
            "SELECT {FORECAST_COLUMNS} FROM forecast_days WHERE location_id = $1 ORDER BY date"
        ))
        .bind(location_id.as_i32())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
