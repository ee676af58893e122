pub mod db;
pub mod memory;

pub use db::DbAdapter;
pub use memory::{ExampleSalon, InMemoryAdapter};
