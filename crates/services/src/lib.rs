//! # services
//!
//! The Fomí client's state and synchronization layer: one injected
//! [`AppStore`] holding the session-scoped caches (current user, lists,
//! feed, follow set) and the mutation functions the screens call.
//!
//! The store mirrors backend state; it never owns it. Reads log and
//! swallow failures, leaving the previous cache in place. Writes are
//! pessimistic — backend first, local mirror second, typed error out —
//! with one deliberate exception: the like toggle is optimistic and rolls
//! itself back on failure.

mod discover;
mod feed;
mod lists;
mod profile;
mod review;
mod social;
mod store;

pub use feed::{annotate, FEED_LIMIT};
pub use lists::DEFAULT_LIST_NAME;
pub use review::PHOTO_BUCKET;
pub use store::{AppStore, StoreState};
