pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod sources;
pub mod storage;
pub mod stream;
pub mod utils;

#[cfg(test)]
mod testing;

// Driver modules (point to project root drivers via path attribute) / 驱动模块
#[path = "../drivers/mod.rs"]
pub mod drivers;

pub use error::{PushError, Result};

/// Build a registry with every driver factory registered / 创建已注册全部驱动的注册表
pub async fn registry_with_drivers(ctx: storage::DriverContext) -> storage::AgentRegistry {
    let registry = storage::AgentRegistry::new(ctx);
    drivers::register_all(&registry).await;
    registry
}
