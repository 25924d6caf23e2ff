//! Video record persistence
//!
//! [`VideoRepository`] abstracts where records live. PostgreSQL is the production store;
//! the in-memory store backs tests and single-process setups without a database.

pub mod video;

pub use video::{
    create_video_repository, InMemoryVideoRepository, PostgresVideoRepository, VideoRepository,
};
