//! State module for tracking crawl progress
//!
//! `RequestState` tracks a single queued request from enqueue to its final
//! outcome. It is persisted by the storage layer and drives resumption.

mod request_state;

pub use request_state::RequestState;
