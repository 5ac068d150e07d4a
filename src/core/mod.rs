pub mod controller;
pub mod pattern;
pub mod pipeline;
pub mod predicate;
pub mod request;
pub mod response;
pub mod router;
pub mod routes;

pub use router::{DispatchOutcome, Router, RouterOptions};
