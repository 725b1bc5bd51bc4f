// Testing utilities for Wicket applications
// In-process test client, request builder, and response assertions

pub mod assertions;
pub mod test_client;

pub use assertions::*;
pub use test_client::*;
