//! Client composition: session state, event loop and collaborator seams

pub mod frame;
pub mod keys;
pub mod runner;
pub mod session;

pub use runner::ClientRunner;
pub use session::Session;
