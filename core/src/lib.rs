//! In-memory todo store.
//!
//! # Overview
//! [`TodoStore`] holds every todo for the lifetime of the process and
//! serializes concurrent access behind a single readers-writer lock. It
//! knows nothing about HTTP or JSON; callers validate input first and map
//! "not found" results to their own error signalling.
//!
//! # Design
//! - Reads hand out owned copies, so a returned list never changes after
//!   the call returns.
//! - Listings are ordered by `created_at`, then insertion order.
//! - Not-found is `None` / `false`, never an error. Nothing else can fail.
//! - Time comes from an injectable [`Clock`] so ordering can be tested.

pub mod clock;
pub mod store;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use store::TodoStore;
pub use types::{Todo, UpdateTodo};
