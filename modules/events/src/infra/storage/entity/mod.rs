//! SeaORM entities. Join tables carry composite primary keys so a link can
//! exist at most once.

pub mod event;
pub mod event_tag;
pub mod profile_tag;
pub mod tag;
pub mod user_profile;
