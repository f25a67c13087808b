//! Member data models
//!
//! Defines the persisted entities (users, photos) and their transport
//! projections (DTOs). Projections are hand-written; there is no mapping
//! framework in between.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A member account as stored in the database
#[derive(Debug, Clone, FromRow)]
pub struct AppUser {
    /// Unique identifier
    pub id: i64,
    /// Login name, unique across the system
    pub username: String,
    /// Display name
    pub known_as: String,
    /// Gender attribute, used for the default listing filter
    pub gender: String,
    /// Date of birth (ISO-8601 date)
    pub date_of_birth: NaiveDate,
    pub city: String,
    pub country: String,
    pub introduction: Option<String>,
    pub looking_for: Option<String>,
    pub interests: Option<String>,
    /// When the account was created (Unix timestamp)
    pub created: i64,
    /// Last recorded activity (Unix timestamp)
    pub last_active: i64,
}

/// A photo attached to a member
#[derive(Debug, Clone, FromRow)]
pub struct Photo {
    /// Unique identifier
    pub id: i64,
    /// Owning user's id
    pub user_id: i64,
    /// Public URL served to clients
    pub url: String,
    /// Identifier at the external storage service, if hosted there
    pub public_id: Option<String>,
    /// Whether this is the member's main (display) photo
    pub is_main: bool,
}

/// Photo projection for transport
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoDto {
    pub id: i64,
    pub url: String,
    pub is_main: bool,
}

impl From<&Photo> for PhotoDto {
    fn from(photo: &Photo) -> Self {
        Self {
            id: photo.id,
            url: photo.url.clone(),
            is_main: photo.is_main,
        }
    }
}

/// Member projection for transport
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub id: i64,
    pub username: String,
    /// URL of the main photo, if the member has one
    pub photo_url: Option<String>,
    /// Age in whole years, computed from date of birth
    pub age: i32,
    pub known_as: String,
    pub created: i64,
    pub last_active: i64,
    pub gender: String,
    pub introduction: Option<String>,
    pub looking_for: Option<String>,
    pub interests: Option<String>,
    pub city: String,
    pub country: String,
    pub photos: Vec<PhotoDto>,
}

impl MemberDto {
    /// Project a user and its photos into the transport shape
    pub fn project(user: &AppUser, photos: &[Photo]) -> Self {
        let photo_url = photos
            .iter()
            .find(|p| p.is_main)
            .map(|p| p.url.clone());

        Self {
            id: user.id,
            username: user.username.clone(),
            photo_url,
            age: age_in_years(user.date_of_birth, Utc::now().date_naive()),
            known_as: user.known_as.clone(),
            created: user.created,
            last_active: user.last_active,
            gender: user.gender.clone(),
            introduction: user.introduction.clone(),
            looking_for: user.looking_for.clone(),
            interests: user.interests.clone(),
            city: user.city.clone(),
            country: user.country.clone(),
            photos: photos.iter().map(PhotoDto::from).collect(),
        }
    }
}

/// Incoming partial update for the caller's own profile
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdateDto {
    pub introduction: Option<String>,
    pub looking_for: Option<String>,
    pub interests: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Age in whole years on the given day
///
/// Counts completed years: the year difference is reduced by one when the
/// birthday has not yet occurred this year.
pub fn age_in_years(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    let had_birthday = (today.month(), today.day()) >= (date_of_birth.month(), date_of_birth.day());
    if !had_birthday {
        age -= 1;
    }
    age
}
