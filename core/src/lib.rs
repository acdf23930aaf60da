pub mod command;
pub mod error;
pub mod manager;
pub mod reading;
pub mod repository;
pub mod store;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod topology;

pub use command::{Command, CommandKind, Verb};
pub use error::{CommandError, StoreError, ValidationError};
pub use manager::CommandManager;
pub use reading::{Reading, ReadingKind};
pub use store::{EntityStore, FieldValue, MemoryStore, Point};
pub use topology::{Entity, EntityKind, Plant, Position, Sensor};

pub static CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
