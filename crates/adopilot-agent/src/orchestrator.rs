//! One prompt, one tool round.
//!
//! `run` drives a prompt through a fixed sequence:
//! 1. classify the prompt and narrow the catalog to the matching tools
//! 2. first completion with those tools
//! 3. execute each requested tool call in order, truncating results
//! 4. second completion over the whole transcript, with the same tools
//!
//! The second completion is issued even when the model asked for no
//! tools. Any failure ends the run; nothing is retried.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use adopilot_core::config::AgentConfig;
use adopilot_core::types::{LlmResponse, Message, ToolCall, ToolDefinition, ToolDescriptor};
use adopilot_mcp::ToolServer;
use adopilot_providers::{LlmProvider, LlmRequestConfig};

use crate::catalog::ToolCatalog;
use crate::conversation::Conversation;
use crate::error::{AgentError, CompletionPhase};
use crate::intent::IntentClassifier;
use crate::toolset::{to_definitions, ToolSetBuilder};
use crate::truncate::ResultTruncator;

/// What a successful run produced.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// Text of the second completion. Empty when the model sent none.
    pub answer: String,
    /// Every message of the run, starting with the prompt.
    pub transcript: Vec<Message>,
    /// Categories the prompt was classified into. Empty in unfiltered mode.
    pub categories: BTreeSet<String>,
    /// Names of the tools offered to the model, in catalog order.
    pub tools_offered: Vec<String>,
}

impl RunOutcome {
    /// Number of tools the model called.
    pub fn tool_calls(&self) -> usize {
        self.transcript
            .iter()
            .filter(|m| matches!(m, Message::Tool { .. }))
            .count()
    }
}

pub struct ConversationOrchestrator {
    provider: Arc<dyn LlmProvider>,
    tool_server: Arc<dyn ToolServer>,
    catalog: Arc<ToolCatalog>,
    config: AgentConfig,
    request_config: LlmRequestConfig,
    truncator: ResultTruncator,
    all_tools: bool,
}

impl ConversationOrchestrator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tool_server: Arc<dyn ToolServer>,
        catalog: Arc<ToolCatalog>,
        config: AgentConfig,
    ) -> Self {
        let truncator = ResultTruncator::new(config.max_result_chars);
        Self {
            provider,
            tool_server,
            catalog,
            config,
            request_config: LlmRequestConfig::default(),
            truncator,
            all_tools: false,
        }
    }

    pub fn with_request_config(mut self, request_config: LlmRequestConfig) -> Self {
        self.request_config = request_config;
        self
    }

    /// Offer the whole catalog on every prompt instead of classifying.
    pub fn with_all_tools(mut self, all_tools: bool) -> Self {
        self.all_tools = all_tools;
        self
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Run a single prompt to its final answer.
    pub async fn run(&self, prompt: &str) -> Result<RunOutcome, AgentError> {
        let mut conversation = Conversation::new(prompt);

        let (categories, tools) = self.select_tools(prompt);
        let definitions = to_definitions(&tools);
        let tools_offered: Vec<String> = tools.into_iter().map(|t| t.name).collect();

        let first = self
            .complete(CompletionPhase::First, &conversation, &definitions)
            .await?;
        conversation.push_assistant(first.to_message());

        if first.has_tool_calls() {
            info!(count = first.tool_calls.len(), "model requested tool calls");
        } else {
            debug!("model requested no tool calls");
        }

        for call in &first.tool_calls {
            let content = self.dispatch(call).await?;
            if !conversation.push_tool_result(call, content) {
                debug!(call_id = %call.id, "duplicate tool call id, result dropped");
            }
        }

        let second = self
            .complete(CompletionPhase::Second, &conversation, &definitions)
            .await?;
        conversation.push_assistant(second.to_message());

        Ok(RunOutcome {
            answer: second.content.unwrap_or_default(),
            transcript: conversation.into_messages(),
            categories,
            tools_offered,
        })
    }

    fn select_tools(&self, prompt: &str) -> (BTreeSet<String>, Vec<ToolDescriptor>) {
        if self.all_tools {
            info!(total = self.catalog.len(), "offering the full catalog");
            return (BTreeSet::new(), self.catalog.tools().to_vec());
        }

        let categories = IntentClassifier::new(&self.config).classify(prompt);
        let tools = ToolSetBuilder::new(&self.config.categories).build(self.catalog.tools(), &categories);
        (categories, tools)
    }

    async fn complete(
        &self,
        phase: CompletionPhase,
        conversation: &Conversation,
        definitions: &[ToolDefinition],
    ) -> Result<LlmResponse, AgentError> {
        debug!(
            %phase,
            messages = conversation.len(),
            tools = definitions.len(),
            model = self.provider.model(),
            "requesting completion"
        );

        let response = self
            .provider
            .chat(conversation.messages(), definitions, &self.request_config)
            .await
            .map_err(|source| AgentError::Completion { phase, source })?;

        if let Some(usage) = &response.usage {
            debug!(
                %phase,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }
        Ok(response)
    }

    /// Decode, execute, and render one tool call.
    async fn dispatch(&self, call: &ToolCall) -> Result<String, AgentError> {
        let name = &call.function.name;
        let arguments = decode_arguments(call)?;

        info!(
            tool = %name,
            arguments = %serde_json::to_string_pretty(&arguments).unwrap_or_default(),
            "calling tool"
        );

        let result = self
            .tool_server
            .call_tool(name, arguments)
            .await
            .map_err(|e| AgentError::ToolExecution {
                tool: name.clone(),
                message: "tool server call failed".to_string(),
                source: Some(e),
            })?;

        let text = result.to_text();
        if result.is_error {
            return Err(AgentError::ToolExecution {
                tool: name.clone(),
                message: text,
                source: None,
            });
        }

        debug!(tool = %name, result_chars = text.chars().count(), "tool result");
        Ok(self.truncator.apply(name, &text))
    }
}

/// Parse a call's arguments. Only a JSON object is accepted.
fn decode_arguments(call: &ToolCall) -> Result<Map<String, Value>, AgentError> {
    serde_json::from_str::<Map<String, Value>>(&call.function.arguments).map_err(|source| {
        AgentError::ArgumentDecode {
            tool: call.function.name.clone(),
            call_id: call.id.clone(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use adopilot_core::config::CategoryConfig;
    use adopilot_mcp::{CallToolResult, McpError};
    use adopilot_providers::ProviderError;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::truncate::TRUNCATION_MARKER;

    // ── Mocks ──────────────────────────────────

    /// Replays canned responses and records what it was sent.
    struct MockProvider {
        responses: Mutex<Vec<Result<LlmResponse, ProviderError>>>,
        calls: Mutex<Vec<(Vec<Message>, Vec<ToolDefinition>)>>,
    }

    impl MockProvider {
        fn new(responses: Vec<Result<LlmResponse, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(Vec<Message>, Vec<ToolDefinition>)> {
            self.calls.lock().unwrap().clone()
        }

        fn offered(&self, index: usize) -> Vec<String> {
            self.calls()[index].1.iter().map(|d| d.function.name.clone()).collect()
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn chat(
            &self,
            messages: &[Message],
            tools: &[ToolDefinition],
            _config: &LlmRequestConfig,
        ) -> Result<LlmResponse, ProviderError> {
            self.calls.lock().unwrap().push((messages.to_vec(), tools.to_vec()));
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(LlmResponse::text("(no more responses)"))
            } else {
                responses.remove(0)
            }
        }

        fn model(&self) -> &str {
            "mock-model"
        }

        fn display_name(&self) -> &str {
            "MockProvider"
        }
    }

    /// Answers every call with the same result and records arguments.
    struct MockToolServer {
        result: Result<CallToolResult, ()>,
        calls: Mutex<Vec<(String, Map<String, Value>)>>,
    }

    impl MockToolServer {
        fn returning(result: CallToolResult) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(result),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                result: Err(()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, Map<String, Value>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ToolServer for MockToolServer {
        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
            Ok(vec![])
        }

        async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<CallToolResult, McpError> {
            self.calls.lock().unwrap().push((name.to_string(), arguments));
            self.result.clone().map_err(|_| McpError::Rpc {
                code: -32603,
                message: "connection to Azure DevOps failed".into(),
            })
        }
    }

    // ── Fixtures ───────────────────────────────

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, format!("{name} tool"), adopilot_core::types::empty_object_schema())
    }

    fn catalog() -> Arc<ToolCatalog> {
        Arc::new(ToolCatalog::from_descriptors(
            [
                "wit_get_work_item",
                "wit_my_work_items",
                "project_list",
                "team_list",
                "repo_list",
                "repo_list_pull_requests",
                "repo_get_pull_request",
                "wiki_list",
            ]
            .iter()
            .map(|n| descriptor(n))
            .collect(),
        ))
    }

    /// Category table without keyword overlaps.
    fn agent_config() -> AgentConfig {
        AgentConfig {
            max_result_chars: 10_000,
            default_categories: vec!["project".into(), "work_item".into()],
            categories: vec![
                CategoryConfig::new("work_item", "", &["work item", "task", "bug"], &["wit_get_work_item", "wit_my_work_items"]),
                CategoryConfig::new("project", "", &["team", "iteration"], &["project_list", "team_list"]),
                CategoryConfig::new("repository", "", &["repo"], &["repo_list"]),
                CategoryConfig::new("pull_request", "", &["pull request"], &["repo_list_pull_requests", "repo_get_pull_request"]),
                CategoryConfig::new("wiki", "", &["wiki"], &["wiki_list"]),
            ],
        }
    }

    fn orchestrator(provider: Arc<MockProvider>, server: Arc<MockToolServer>) -> ConversationOrchestrator {
        ConversationOrchestrator::new(provider, server, catalog(), agent_config())
    }

    fn tool_call_response(calls: Vec<ToolCall>) -> Result<LlmResponse, ProviderError> {
        Ok(LlmResponse {
            tool_calls: calls,
            finish_reason: Some("tool_calls".into()),
            ..Default::default()
        })
    }

    // ── Scenarios ──────────────────────────────

    #[tokio::test]
    async fn test_no_keyword_offers_default_tools() {
        let provider = MockProvider::new(vec![Ok(LlmResponse::text("thinking")), Ok(LlmResponse::text("Here are your projects"))]);
        let server = MockToolServer::returning(CallToolResult::text_result("unused"));
        let orch = orchestrator(provider.clone(), server.clone());

        let outcome = orch.run("List all projects").await.unwrap();

        let expected: BTreeSet<String> = ["project", "work_item"].iter().map(|s| s.to_string()).collect();
        assert_eq!(outcome.categories, expected);
        assert_eq!(
            provider.offered(0),
            vec!["wit_get_work_item", "wit_my_work_items", "project_list", "team_list"]
        );
        assert_eq!(outcome.answer, "Here are your projects");
    }

    #[tokio::test]
    async fn test_pull_request_prompt_offers_only_pr_tools() {
        let provider = MockProvider::new(vec![Ok(LlmResponse::text("a")), Ok(LlmResponse::text("b"))]);
        let server = MockToolServer::returning(CallToolResult::text_result("unused"));
        let orch = orchestrator(provider.clone(), server);

        let outcome = orch
            .run("List all active pull requests for project X and repository Y")
            .await
            .unwrap();

        // "repository" also contains the "repo" keyword.
        assert!(outcome.categories.contains("pull_request"));
        let offered = provider.offered(0);
        assert!(offered.contains(&"repo_list_pull_requests".to_string()));
        assert!(offered.contains(&"repo_get_pull_request".to_string()));
        assert!(!offered.contains(&"wiki_list".to_string()));
    }

    #[tokio::test]
    async fn test_pull_request_only_category() {
        let provider = MockProvider::new(vec![Ok(LlmResponse::text("a")), Ok(LlmResponse::text("b"))]);
        let server = MockToolServer::returning(CallToolResult::text_result("unused"));
        let orch = orchestrator(provider.clone(), server);

        let outcome = orch.run("List all active pull requests for project X").await.unwrap();

        assert_eq!(outcome.categories, BTreeSet::from(["pull_request".to_string()]));
        assert_eq!(provider.offered(0), vec!["repo_list_pull_requests", "repo_get_pull_request"]);
        assert_eq!(outcome.tools_offered, provider.offered(0));
    }

    #[tokio::test]
    async fn test_single_tool_call_round_trip() {
        let provider = MockProvider::new(vec![
            tool_call_response(vec![ToolCall::new("call_1", "wit_get_work_item", r#"{"id": 12345}"#)]),
            Ok(LlmResponse::text("Work item 12345 is a Bug titled 'Login fails'.")),
        ]);
        let server = MockToolServer::returning(CallToolResult::text_result(r#"{"id":12345,"fields":{"System.Title":"Login fails"}}"#));
        let orch = orchestrator(provider.clone(), server.clone());

        let outcome = orch.run("Get work item 12345").await.unwrap();

        let calls = server.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "wit_get_work_item");
        assert_eq!(Value::Object(calls[0].1.clone()), json!({ "id": 12345 }));

        // user, assistant(tool_calls), tool, assistant(answer)
        assert_eq!(outcome.transcript.len(), 4);
        match &outcome.transcript[2] {
            Message::Tool { tool_call_id, name, content } => {
                assert_eq!(tool_call_id, "call_1");
                assert_eq!(name, "wit_get_work_item");
                assert!(content.contains("Login fails"));
            }
            other => panic!("expected tool message, got {other:?}"),
        }

        let provider_calls = provider.calls();
        assert_eq!(provider_calls.len(), 2);
        // The second completion sees the tool result and the same tools.
        assert_eq!(provider_calls[1].0.len(), 3);
        assert_eq!(provider_calls[1].1, provider_calls[0].1);
        assert_eq!(outcome.answer, "Work item 12345 is a Bug titled 'Login fails'.");
        assert_eq!(outcome.tool_calls(), 1);
    }

    #[tokio::test]
    async fn test_large_result_truncated() {
        let provider = MockProvider::new(vec![
            tool_call_response(vec![ToolCall::new("call_1", "repo_list", "{}")]),
            Ok(LlmResponse::text("done")),
        ]);
        let server = MockToolServer::returning(CallToolResult::text_result("r".repeat(15_000)));
        let orch = orchestrator(provider.clone(), server);

        let outcome = orch.run("List repos").await.unwrap();

        match &outcome.transcript[2] {
            Message::Tool { content, .. } => {
                assert_eq!(content.chars().count(), 10_000 + TRUNCATION_MARKER.chars().count());
                assert!(content.starts_with(&"r".repeat(10_000)));
                assert!(content.ends_with(TRUNCATION_MARKER));
            }
            other => panic!("expected tool message, got {other:?}"),
        }
        // The truncated form is what the model sees.
        assert_eq!(provider.calls()[1].0[2], outcome.transcript[2]);
    }

    #[tokio::test]
    async fn test_tool_failure_aborts_without_second_completion() {
        let provider = MockProvider::new(vec![
            tool_call_response(vec![
                ToolCall::new("call_1", "wit_get_work_item", r#"{"id": 1}"#),
                ToolCall::new("call_2", "wit_get_work_item", r#"{"id": 2}"#),
            ]),
            Ok(LlmResponse::text("should not be requested")),
        ]);
        let server = MockToolServer::failing();
        let orch = orchestrator(provider.clone(), server.clone());

        let err = orch.run("Get work item 1 and 2").await.unwrap_err();

        assert!(matches!(
            err,
            AgentError::ToolExecution { ref tool, source: Some(McpError::Rpc { .. }), .. } if tool == "wit_get_work_item"
        ));
        assert_eq!(server.calls().len(), 1);
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_text_appears_once_in_chain() {
        use std::error::Error as _;

        let provider = MockProvider::new(vec![tool_call_response(vec![ToolCall::new(
            "call_1",
            "wit_get_work_item",
            r#"{"id": 1}"#,
        )])]);
        let orch = orchestrator(provider, MockToolServer::failing());

        let err = orch.run("Get work item 1").await.unwrap_err();

        assert_eq!(err.to_string(), "tool 'wit_get_work_item' failed: tool server call failed");
        let cause = err.source().expect("transport error kept as source").to_string();
        assert!(cause.contains("connection to Azure DevOps failed"));
        assert!(!err.to_string().contains("connection to Azure DevOps failed"));
    }

    #[tokio::test]
    async fn test_tool_error_payload_is_failure() {
        let provider = MockProvider::new(vec![
            tool_call_response(vec![ToolCall::new("call_1", "wit_get_work_item", r#"{"id": 99}"#)]),
            Ok(LlmResponse::text("unused")),
        ]);
        let server = MockToolServer::returning(CallToolResult {
            is_error: true,
            ..CallToolResult::text_result("Work item 99 does not exist")
        });
        let orch = orchestrator(provider.clone(), server);

        let err = orch.run("Get work item 99").await.unwrap_err();
        match err {
            AgentError::ToolExecution { message, source, .. } => {
                assert_eq!(message, "Work item 99 does not exist");
                assert!(source.is_none());
            }
            other => panic!("expected ToolExecution, got {other:?}"),
        }
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_arguments_abort_before_execution() {
        for raw in [r#"{"id": 12345"#, "", "[1, 2]", "null"] {
            let provider = MockProvider::new(vec![
                tool_call_response(vec![ToolCall::new("call_1", "wit_get_work_item", raw)]),
                Ok(LlmResponse::text("unused")),
            ]);
            let server = MockToolServer::returning(CallToolResult::text_result("unused"));
            let orch = orchestrator(provider.clone(), server.clone());

            let err = orch.run("Get work item 12345").await.unwrap_err();
            assert!(
                matches!(err, AgentError::ArgumentDecode { ref call_id, .. } if call_id == "call_1"),
                "arguments {raw:?} gave {err:?}"
            );
            assert!(server.calls().is_empty());
            assert_eq!(provider.calls().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_second_completion_always_sent() {
        let provider = MockProvider::new(vec![Ok(LlmResponse::text("first")), Ok(LlmResponse::text("second"))]);
        let server = MockToolServer::returning(CallToolResult::text_result("unused"));
        let orch = orchestrator(provider.clone(), server.clone());

        let outcome = orch.run("hello").await.unwrap();

        assert_eq!(provider.calls().len(), 2);
        assert!(server.calls().is_empty());
        assert_eq!(outcome.answer, "second");
        assert_eq!(outcome.transcript.len(), 3);
    }

    #[tokio::test]
    async fn test_multiple_calls_run_in_order() {
        let provider = MockProvider::new(vec![
            tool_call_response(vec![
                ToolCall::new("call_a", "project_list", "{}"),
                ToolCall::new("call_b", "team_list", r#"{"project": "Fabrikam"}"#),
            ]),
            Ok(LlmResponse::text("done")),
        ]);
        let server = MockToolServer::returning(CallToolResult::text_result("ok"));
        let orch = orchestrator(provider.clone(), server.clone());

        let outcome = orch.run("List teams").await.unwrap();

        let names: Vec<String> = server.calls().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["project_list", "team_list"]);
        let ids: Vec<&str> = outcome
            .transcript
            .iter()
            .filter_map(|m| match m {
                Message::Tool { tool_call_id, .. } => Some(tool_call_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["call_a", "call_b"]);
    }

    #[tokio::test]
    async fn test_first_completion_failure() {
        let provider = MockProvider::new(vec![Err(ProviderError::Status {
            status: 429,
            body: "rate limited".into(),
        })]);
        let server = MockToolServer::returning(CallToolResult::text_result("unused"));
        let orch = orchestrator(provider.clone(), server);

        let err = orch.run("List all projects").await.unwrap_err();
        match err {
            AgentError::Completion { phase, source } => {
                assert_eq!(phase, CompletionPhase::First);
                assert!(source.is_rate_limited());
            }
            other => panic!("expected Completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_second_completion_failure() {
        let provider = MockProvider::new(vec![Ok(LlmResponse::text("first")), Err(ProviderError::NoChoices)]);
        let server = MockToolServer::returning(CallToolResult::text_result("unused"));
        let orch = orchestrator(provider, server);

        let err = orch.run("hello").await.unwrap_err();
        assert!(matches!(err, AgentError::Completion { phase: CompletionPhase::Second, .. }));
    }

    #[tokio::test]
    async fn test_all_tools_mode_offers_whole_catalog() {
        let provider = MockProvider::new(vec![Ok(LlmResponse::text("a")), Ok(LlmResponse::text("b"))]);
        let server = MockToolServer::returning(CallToolResult::text_result("unused"));
        let orch = orchestrator(provider.clone(), server).with_all_tools(true);

        let outcome = orch.run("Show the wiki").await.unwrap();

        assert!(outcome.categories.is_empty());
        assert_eq!(provider.offered(0).len(), 8);
    }

    #[tokio::test]
    async fn test_missing_answer_is_empty_string() {
        let provider = MockProvider::new(vec![Ok(LlmResponse::text("a")), Ok(LlmResponse::default())]);
        let server = MockToolServer::returning(CallToolResult::text_result("unused"));
        let orch = orchestrator(provider, server);

        assert_eq!(orch.run("hello").await.unwrap().answer, "");
    }

    #[tokio::test]
    async fn test_runs_do_not_share_state() {
        let provider = MockProvider::new(vec![
            Ok(LlmResponse::text("1a")),
            Ok(LlmResponse::text("1b")),
            Ok(LlmResponse::text("2a")),
            Ok(LlmResponse::text("2b")),
        ]);
        let server = MockToolServer::returning(CallToolResult::text_result("unused"));
        let orch = orchestrator(provider.clone(), server);

        orch.run("first prompt").await.unwrap();
        let second = orch.run("second prompt").await.unwrap();

        assert_eq!(second.transcript[0], Message::user("second prompt"));
        assert_eq!(provider.calls()[2].0.len(), 1);
        assert_eq!(second.answer, "2b");
    }
}
