// Core library for the Wicket routing and negotiation engine
// Route matching, resolution, invocation, and content negotiation

pub mod constraint;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod invoker;
pub mod logging;
pub mod media;
pub mod module;
pub mod negotiation;
pub mod negotiator;
pub mod params;
pub mod processors;
pub mod resolver;
pub mod route;
pub mod route_cache;
pub mod segment;
pub mod status;
pub mod trie;

// Re-export commonly used types
pub use constraint::*;
pub use context::*;
pub use dispatcher::*;
pub use error::*;
pub use http::*;
pub use invoker::*;
pub use media::*;
pub use module::*;
pub use negotiation::*;
pub use negotiator::*;
pub use params::*;
pub use processors::*;
pub use resolver::*;
pub use route::*;
pub use route_cache::*;
pub use segment::*;
pub use status::*;
pub use trie::{MatchCandidate, RouteTrie};
