//! Member domain module
//!
//! Entities, transport projections, and the SQLite-backed repository.

pub mod db;
pub mod models;

pub use db::{MemberDb, MemberFilter, MemberOrder, PagedList};
pub use models::{AppUser, MemberDto, MemberUpdateDto, Photo, PhotoDto};
