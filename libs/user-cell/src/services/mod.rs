pub mod cascade;
pub mod directory;

pub use directory::UserService;
