use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComponentStatus {
    Up,
    Down,
    Degraded,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub backend: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Components {
    pub app: ComponentHealth,
    pub token_store: ComponentHealth,
    pub rate_limiter: ComponentHealth,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub timestamp: String,
    pub version: String,
    pub components: Components,
}
