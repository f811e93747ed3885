// Driver package / 驱动包
pub mod dropbox;
pub mod github;
pub mod local;

use crate::storage::AgentRegistry;

/// Register all drivers to AgentRegistry / 注册所有驱动
pub async fn register_all(registry: &AgentRegistry) {
    // Register GitHub driver / 注册GitHub驱动
    registry.register_factory(Box::new(github::GithubDriverFactory)).await;
    // Register Dropbox driver / 注册Dropbox驱动
    registry.register_factory(Box::new(dropbox::DropboxDriverFactory)).await;
    // Register local folder driver / 注册本地目录驱动
    registry.register_factory(Box::new(local::LocalDriverFactory)).await;
}
