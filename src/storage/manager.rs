use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use serde_json::Value;
use uuid::Uuid;

use super::{Agent, DriverContext, PushOutcome, Service, Uploader};
use crate::error::{PushError, Result};
use crate::models::ItemEntry;

/// Driver factory trait / 驱动工厂 trait
pub trait DriverFactory: Send + Sync {
    /// Service handled by this factory / 对应的服务
    fn service(&self) -> Service;

    /// Create the uploader from service options / 根据服务选项创建上传器
    fn create_uploader(&self, token: &str, options: &Value, ctx: &DriverContext) -> Result<Uploader>;
}

/// Registry of active push agents (passed explicitly, never global) / 推送代理注册表
#[derive(Clone)]
pub struct AgentRegistry {
    agents: Arc<RwLock<Vec<Arc<Agent>>>>,
    factories: Arc<RwLock<HashMap<Service, Arc<Box<dyn DriverFactory>>>>>,
    ctx: DriverContext,
}

impl AgentRegistry {
    pub fn new(ctx: DriverContext) -> Self {
        Self {
            agents: Arc::new(RwLock::new(Vec::new())),
            factories: Arc::new(RwLock::new(HashMap::new())),
            ctx,
        }
    }

    /// Register driver factory / 注册驱动工厂
    pub async fn register_factory(&self, factory: Box<dyn DriverFactory>) {
        let service = factory.service();
        let mut factories = self.factories.write().await;
        factories.insert(service, Arc::new(factory));
        tracing::debug!("Driver factory registered: {}", service);
    }

    /// Create an agent and add it to the registry / 创建代理并加入注册表
    pub async fn create(&self, service: Service, token: &str, options: Value) -> Result<Arc<Agent>> {
        let agent = Arc::new(self.build(service, token, &options).await?);
        self.agents.write().await.push(agent.clone());
        tracing::info!("Agent created: {} ({})", agent.name(), agent.id());
        Ok(agent)
    }

    /// Create an agent without registering it / 创建代理但不加入注册表
    pub async fn build(&self, service: Service, token: &str, options: &Value) -> Result<Agent> {
        let factory = {
            let factories = self.factories.read().await;
            factories
                .get(&service)
                .cloned()
                .ok_or_else(|| PushError::InvalidService(service.to_string()))?
        };
        let uploader = factory.create_uploader(token, options, &self.ctx)?;
        let dir = options.get("dir").and_then(Value::as_str).unwrap_or("/");
        Ok(Agent::new(service, dir, uploader).with_sources(self.ctx.sources.clone()))
    }

    /// Add an existing agent (ignored if already present) / 添加已有代理
    pub async fn add(&self, agent: Arc<Agent>) {
        let mut agents = self.agents.write().await;
        if !agents.iter().any(|a| a.id() == agent.id()) {
            agents.push(agent);
        }
    }

    /// Remove one agent / 移除代理
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut agents = self.agents.write().await;
        let before = agents.len();
        agents.retain(|a| a.id() != id);
        before != agents.len()
    }

    /// Remove every agent of `service`, or all agents for `None` / 按服务移除代理
    pub async fn remove_service(&self, service: Option<Service>) {
        match service {
            Some(service) => self.agents.write().await.retain(|a| a.service() != service),
            None => self.reset().await,
        }
    }

    pub async fn reset(&self) {
        self.agents.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.agents.read().await.is_empty()
    }

    pub async fn agents(&self) -> Vec<Arc<Agent>> {
        self.agents.read().await.clone()
    }

    /// Human readable agent list / 可读的代理列表
    pub async fn summary(&self) -> String {
        let agents = self.agents.read().await;
        agents
            .iter()
            .enumerate()
            .map(|(i, a)| format!("  # {}\t{}", i, a.name()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Push entries through every agent; empty when no agent is registered
    /// 通过所有代理推送，没有代理时返回空列表
    pub async fn push(&self, entries: &[ItemEntry]) -> Result<Vec<PushOutcome>> {
        let agents = self.agents().await;
        if agents.is_empty() {
            tracing::warn!("No push targets specified");
            return Ok(Vec::new());
        }
        let mut outcomes = Vec::with_capacity(agents.len());
        for agent in agents {
            outcomes.push(agent.push(entries).await?);
        }
        Ok(outcomes)
    }
}
