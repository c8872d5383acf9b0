//! Client for the optional Registry REST service: `register`, `search`,
//! `get`, `deregister`, `heartbeat`.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Request(String),

    #[error("registry returned an unexpected status: {0}")]
    UnexpectedStatus(u16),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Clone, Serialize)]
pub struct AgentRegistration {
    pub id: String,
    pub endpoint: String,
    pub name: String,
    #[serde(rename = "humanName")]
    pub human_name: String,
    #[serde(rename = "publicKey")]
    pub public_key: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentRecord {
    pub id: String,
    pub endpoint: String,
    pub name: String,
    #[serde(rename = "humanName")]
    pub human_name: String,
    #[serde(rename = "publicKey")]
    pub public_key: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

pub struct RegistryClient {
    base_url: String,
    http: reqwest::Client,
}

impl RegistryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub async fn register(&self, registration: &AgentRegistration) -> Result<String> {
        let url = format!("{}/agents", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(registration)
            .send()
            .await
            .map_err(|e| RegistryError::Request(e.to_string()))?;
        if response.status().as_u16() != 201 {
            return Err(RegistryError::UnexpectedStatus(response.status().as_u16()));
        }
        #[derive(Deserialize)]
        struct RegisterResponse {
            id: String,
        }
        let body: RegisterResponse = response.json().await.map_err(|e| RegistryError::Request(e.to_string()))?;
        Ok(body.id)
    }

    pub async fn get(&self, agent_id: &str) -> Result<Option<AgentRecord>> {
        let url = format!("{}/agents/{agent_id}", self.base_url);
        let response = self.http.get(&url).send().await.map_err(|e| RegistryError::Request(e.to_string()))?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RegistryError::UnexpectedStatus(response.status().as_u16()));
        }
        Ok(Some(response.json().await.map_err(|e| RegistryError::Request(e.to_string()))?))
    }

    pub async fn search(&self, capability: Option<&str>, name: Option<&str>) -> Result<Vec<AgentRecord>> {
        let url = format!("{}/agents", self.base_url);
        let mut query = Vec::new();
        if let Some(c) = capability {
            query.push(("capability", c));
        }
        if let Some(n) = name {
            query.push(("name", n));
        }
        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| RegistryError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RegistryError::UnexpectedStatus(response.status().as_u16()));
        }
        response.json().await.map_err(|e| RegistryError::Request(e.to_string()))
    }

    pub async fn deregister(&self, agent_id: &str) -> Result<()> {
        let url = format!("{}/agents/{agent_id}", self.base_url);
        let response = self.http.delete(&url).send().await.map_err(|e| RegistryError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RegistryError::UnexpectedStatus(response.status().as_u16()));
        }
        Ok(())
    }

    pub async fn heartbeat(&self, agent_id: &str) -> Result<()> {
        let url = format!("{}/agents/{agent_id}/heartbeat", self.base_url);
        let response = self.http.post(&url).send().await.map_err(|e| RegistryError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RegistryError::UnexpectedStatus(response.status().as_u16()));
        }
        Ok(())
    }
}
