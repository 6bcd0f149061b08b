use crate::core::error::ObchatError;
use crate::settings::ChatSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod client;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

/// A source file the backend consulted while answering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFileRef {
    pub repository: String,
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub line_range: Option<LineRange>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub commit_hash: Option<String>,
}

/// A successful analysis, normalized across the two wire formats.
#[derive(Debug, Clone, Default)]
pub struct AgentReply {
    pub analysis: String,
    pub conversation_id: Option<String>,
    pub search_summary: Option<String>,
    pub processing_time: Option<f64>,
    pub cost: Option<f64>,
    pub files: Vec<SourceFileRef>,
}

/// The external query interface the conversation dispatches through.
///
/// The production implementation is [`client::QueryClient`]; tests substitute
/// a scripted one.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn send_query(
        &self,
        query: &str,
        settings: &ChatSettings,
    ) -> Result<AgentReply, ObchatError>;
}

/// Everything the enhanced chat endpoint accepts.
#[derive(Debug, Clone)]
pub struct EnhancedQueryRequest {
    pub query: String,
    pub settings: ChatSettings,
    pub figma_urls: Vec<String>,
    pub lucid_diagram_ids: Vec<String>,
    pub max_visual_items: u32,
}

impl EnhancedQueryRequest {
    pub fn new(query: &str, settings: &ChatSettings, max_visual_items: u32) -> Self {
        EnhancedQueryRequest {
            query: query.to_string(),
            settings: settings.clone(),
            figma_urls: Vec::new(),
            lucid_diagram_ids: Vec::new(),
            max_visual_items,
        }
    }
}
