pub mod resolver;

pub use resolver::{AccessControlled, VisibilityResolver};
