//! Placement and dispatch engine for mediasort.
//!
//! This crate resolves candidates through a [`Resolver`](mediasort_core::Resolver),
//! formats their destinations and moves them into place, with a bounded
//! number of candidates in flight and per-candidate failure isolation.

mod conflict;
mod dispatcher;
mod placer;
mod progress;

pub use conflict::CollisionPolicy;
pub use dispatcher::Dispatcher;
pub use placer::{PlaceOutcome, Placer};
pub use progress::{CandidateFailure, CandidateReport, PassSummary};
