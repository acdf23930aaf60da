use sprout_core::store::MemoryStore;
use sprout_core::testing::FailingStore;
use sprout_core::{CommandManager, Position, Sensor};
use std::sync::Arc;

pub fn build_manager() -> Arc<CommandManager> {
    CommandManager::new(Arc::new(MemoryStore::new()))
}

/// Manager with position `P1` and sensor `S1` registered at it
pub async fn build_seeded_manager() -> Arc<CommandManager> {
    let manager = build_manager();
    manager
        .new_position(Position {
            id: "P1".to_owned(),
            name: "Kitchen".to_owned(),
            description: "north window".to_owned(),
        })
        .await
        .unwrap();
    manager
        .new_sensor(Sensor {
            id: "S1".to_owned(),
            position: "P1".to_owned(),
            ip: "10.0.0.1".to_owned(),
        })
        .await
        .unwrap();
    manager
}

pub fn build_failing_manager() -> Arc<CommandManager> {
    CommandManager::new(Arc::new(FailingStore))
}
