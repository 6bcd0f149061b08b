use crate::api::{AgentReply, EnhancedQueryRequest, QueryBackend, SourceFileRef};
use crate::config::Config;
use crate::core::error::ObchatError;
use crate::settings::{ChatSettings, ProficiencyLevel, UserRole};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const CHAT_ENDPOINT: &str = "api/v1/chat/message";

/// HTTP client for the onboarding assistant backend.
///
/// Speaks the multipart enhanced endpoint by default and the legacy JSON one
/// when the config asks for it. Requests carry an explicit timeout so a
/// stalled connection surfaces as a network failure instead of hanging.
pub struct QueryClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    legacy_api: bool,
    max_visual_items: u32,
}

impl QueryClient {
    pub fn new(config: &Config) -> Result<Self, ObchatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ObchatError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(QueryClient {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            legacy_api: config.legacy_api,
            max_visual_items: config.max_visual_items,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, CHAT_ENDPOINT)
    }

    async fn send_enhanced(
        &self,
        request: EnhancedQueryRequest,
    ) -> Result<AgentReply, ObchatError> {
        let form = enhanced_form(&request);

        let mut http_request = self.client.post(self.endpoint()).multipart(form);
        if let Some(token) = &self.auth_token {
            http_request = http_request.bearer_auth(token);
        }

        let response = http_request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, "enhanced query response");

        if !status.is_success() {
            return Err(ObchatError::Api(format!(
                "Backend returned status {}",
                status
            )));
        }

        parse_enhanced(&body)
    }

    async fn send_legacy(&self, query: &str, settings: &ChatSettings) -> Result<AgentReply, ObchatError> {
        let payload = LegacyChatRequest {
            message: query,
            include_figma: true,
            include_lucid: settings.include_lucid,
            include_wiki: settings.include_wiki,
            include_github: settings.include_github,
            expert_level: settings.proficiency_level,
            user_role: settings.user_role,
            max_visual_items: self.max_visual_items,
        };

        let mut http_request = self.client.post(self.endpoint()).json(&payload);
        if let Some(token) = &self.auth_token {
            http_request = http_request.bearer_auth(token);
        }

        let response = http_request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, "legacy query response");

        if !status.is_success() {
            return Err(ObchatError::Api(format!(
                "Backend returned status {}",
                status
            )));
        }

        parse_legacy(&body)
    }
}

#[async_trait]
impl QueryBackend for QueryClient {
    async fn send_query(
        &self,
        query: &str,
        settings: &ChatSettings,
    ) -> Result<AgentReply, ObchatError> {
        if self.legacy_api {
            self.send_legacy(query, settings).await
        } else {
            let request = EnhancedQueryRequest::new(query, settings, self.max_visual_items);
            self.send_enhanced(request).await
        }
    }
}

fn enhanced_form(request: &EnhancedQueryRequest) -> Form {
    let settings = &request.settings;
    let mut form = Form::new()
        .text("query", request.query.clone())
        .text("analysis_type", settings.analysis_type.as_str())
        .text("proficiency_level", settings.proficiency_level.as_str())
        .text("user_role", settings.user_role.as_str())
        .text("product_type", settings.product_type.as_str())
        .text("reasoning_focus", settings.reasoning_focus.as_str())
        .text(
            "include_screenshots",
            settings.include_screenshots.to_string(),
        )
        .text("include_lucid", settings.include_lucid.to_string())
        .text("include_wiki", settings.include_wiki.to_string())
        .text("include_github", settings.include_github.to_string())
        .text("max_visual_items", request.max_visual_items.to_string());

    if !request.figma_urls.is_empty() {
        form = form.text("figma_urls", request.figma_urls.join(","));
    }
    if !request.lucid_diagram_ids.is_empty() {
        form = form.text("lucid_diagram_ids", request.lucid_diagram_ids.join(","));
    }

    form
}

#[derive(Serialize)]
struct LegacyChatRequest<'a> {
    message: &'a str,
    include_figma: bool,
    include_lucid: bool,
    include_wiki: bool,
    include_github: bool,
    expert_level: ProficiencyLevel,
    user_role: UserRole,
    max_visual_items: u32,
}

#[derive(Debug, Deserialize)]
struct EnhancedQueryResponse {
    success: bool,
    #[serde(default)]
    analysis: String,
    #[serde(default)]
    processing_time: Option<f64>,
    #[serde(default)]
    cost: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyChatResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    search_summary: Option<String>,
    #[serde(default)]
    processing_time: Option<f64>,
    #[serde(default)]
    cost: Option<f64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    github_files: Vec<SourceFileRef>,
}

/// A 2xx response can still carry an application-level failure; both the
/// success flag and the error field are checked.
fn parse_enhanced(body: &str) -> Result<AgentReply, ObchatError> {
    let parsed: EnhancedQueryResponse = serde_json::from_str(body)?;

    if let Some(err) = parsed.error.filter(|e| !e.is_empty()) {
        return Err(ObchatError::Api(err));
    }
    if !parsed.success {
        return Err(ObchatError::Api(
            "Backend reported a failed analysis".to_string(),
        ));
    }

    Ok(AgentReply {
        analysis: parsed.analysis,
        conversation_id: None,
        search_summary: None,
        processing_time: parsed.processing_time,
        cost: parsed.cost,
        files: Vec::new(),
    })
}

fn parse_legacy(body: &str) -> Result<AgentReply, ObchatError> {
    let parsed: LegacyChatResponse = serde_json::from_str(body)?;

    if !parsed.success {
        return Err(ObchatError::Api(
            parsed
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "No response from backend".to_string()),
        ));
    }

    let message = match parsed.message.filter(|m| !m.is_empty()) {
        Some(message) => message,
        None => {
            return Err(ObchatError::Api("No response from backend".to_string()));
        }
    };

    Ok(AgentReply {
        analysis: message,
        conversation_id: parsed.conversation_id,
        search_summary: parsed.search_summary,
        processing_time: parsed.processing_time,
        cost: parsed.cost,
        files: parsed.github_files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::LineRange;

    #[test]
    fn enhanced_success_maps_to_reply() {
        let body = r#"{
            "success": true,
            "query": "How do I start?",
            "analysis_type": "general",
            "proficiency_level": "intermediate",
            "analysis": "Start from the dashboard.",
            "content_type": "text",
            "visual_items_processed": 0,
            "processing_time": 1.25,
            "cost": 0.002
        }"#;

        let reply = parse_enhanced(body).unwrap();
        assert_eq!(reply.analysis, "Start from the dashboard.");
        assert_eq!(reply.processing_time, Some(1.25));
        assert_eq!(reply.cost, Some(0.002));
        assert!(reply.files.is_empty());
    }

    #[test]
    fn enhanced_failure_uses_server_error_text() {
        let body = r#"{"success": false, "analysis": "", "error": "model overloaded"}"#;
        match parse_enhanced(body) {
            Err(ObchatError::Api(msg)) => assert_eq!(msg, "model overloaded"),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn enhanced_error_field_wins_even_when_success_is_true() {
        let body = r#"{"success": true, "analysis": "partial", "error": "index unavailable"}"#;
        match parse_enhanced(body) {
            Err(ObchatError::Api(msg)) => assert_eq!(msg, "index unavailable"),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn enhanced_failure_without_error_text_gets_a_fallback() {
        let body = r#"{"success": false}"#;
        match parse_enhanced(body) {
            Err(ObchatError::Api(msg)) => assert!(!msg.is_empty()),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn legacy_success_carries_metadata_and_files() {
        let body = r##"{
            "success": true,
            "message": "Welcome!",
            "conversation_id": "conv-42",
            "search_summary": "3 wiki pages",
            "processing_time": 0.8,
            "github_files": [
                {
                    "repository": "acme/docs",
                    "path": "guides/start.md",
                    "content": "# Getting started",
                    "line_range": {"start": 1, "end": 12},
                    "branch": "main"
                }
            ]
        }"##;

        let reply = parse_legacy(body).unwrap();
        assert_eq!(reply.analysis, "Welcome!");
        assert_eq!(reply.conversation_id.as_deref(), Some("conv-42"));
        assert_eq!(reply.search_summary.as_deref(), Some("3 wiki pages"));
        assert_eq!(reply.files.len(), 1);
        assert_eq!(reply.files[0].path, "guides/start.md");
        assert_eq!(
            reply.files[0].line_range,
            Some(LineRange { start: 1, end: 12 })
        );
        assert_eq!(reply.files[0].commit_hash, None);
    }

    #[test]
    fn legacy_failure_uses_server_error_text() {
        let body = r#"{"success": false, "error": "session expired"}"#;
        match parse_legacy(body) {
            Err(ObchatError::Api(msg)) => assert_eq!(msg, "session expired"),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn legacy_success_without_message_is_an_error() {
        let body = r#"{"success": true, "conversation_id": "conv-1"}"#;
        assert!(matches!(parse_legacy(body), Err(ObchatError::Api(_))));
    }

    #[test]
    fn malformed_body_is_a_serialization_error() {
        assert!(matches!(
            parse_legacy("<html>502</html>"),
            Err(ObchatError::Serialization(_))
        ));
    }

    #[test]
    fn legacy_request_serializes_settings_into_wire_fields() {
        let settings = ChatSettings {
            proficiency_level: ProficiencyLevel::Expert,
            include_wiki: false,
            ..Default::default()
        };
        let payload = LegacyChatRequest {
            message: "hi",
            include_figma: true,
            include_lucid: settings.include_lucid,
            include_wiki: settings.include_wiki,
            include_github: settings.include_github,
            expert_level: settings.proficiency_level,
            user_role: settings.user_role,
            max_visual_items: 1,
        };

        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["expert_level"], "expert");
        assert_eq!(json["user_role"], "engineer");
        assert_eq!(json["include_wiki"], false);
        assert_eq!(json["max_visual_items"], 1);
    }
}
