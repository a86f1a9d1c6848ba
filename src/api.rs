//! HTTP handlers. Route closures wire real services and adapters into handler functions, and
//! the handler functions take their dependencies as parameters so tests can pass mocks.

pub mod swagger_main;
pub mod task;
pub mod user;
