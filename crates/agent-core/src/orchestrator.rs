//! Conversation Orchestrator
//!
//! Drives the two-phase protocol for one user question:
//! `Start → Deciding → (Dispatching | Answering) → Finalizing → Done`.
//!
//! Phase 1 offers the tool catalog and asks the model to decide; phase 2
//! restates the question with the tool result in context and produces the
//! final answer. Every turn ends with a non-empty answer, whatever
//! combination of transport, parse, or tool failures occurred along the way.

use std::sync::Arc;

use crate::kb::{KbHit, KnowledgeProvider};
use crate::llm::LlmClient;
use crate::memory::MemoryProvider;
use crate::parser::{ModelReply, parse};
use crate::tool::{Dispatch, ToolRegistry};

/// System prompt for the phase-1 decision call
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful school assistant. \
    You can use tools to get information. If the user's question requires one \
    of the tools, respond with a JSON object describing which tool to call. \
    If not, respond directly to the user in natural language.";

/// Fixed fallback when no usable text could be produced
pub const EMPTY_RESPONSE_MESSAGE: &str = "I couldn't generate a response.";

/// Orchestrator configuration
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// System prompt prepended to the phase-1 decision call
    pub system_prompt: String,

    /// How many recent memory entries to pull into context
    pub memory_context_limit: usize,

    /// How many KB documents to retrieve per question
    pub kb_top_k: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            memory_context_limit: 10,
            kb_top_k: 3,
        }
    }
}

/// The unit of work for one user question.
///
/// Lives only for the duration of processing; only its user/assistant text
/// is persisted, by the memory provider.
struct Turn {
    question: String,
    context: Vec<String>,
    tool_result: Option<String>,
}

impl Turn {
    fn record_tool_result(&mut self, output: String) {
        self.context.push(format!("TOOL_RESULT: {output}"));
        self.tool_result = Some(output);
    }
}

/// The conversation orchestrator
pub struct Orchestrator {
    client: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    memory: Arc<dyn MemoryProvider>,
    kb: Arc<dyn KnowledgeProvider>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
        memory: Arc<dyn MemoryProvider>,
        kb: Arc<dyn KnowledgeProvider>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            client,
            tools,
            memory,
            kb,
            config,
        }
    }

    /// Process one user question to a final answer.
    ///
    /// Exactly one phase-1 call, at most one dispatch, at most one phase-2
    /// call. Never fails: failures degrade to fixed texts.
    pub async fn handle_question(&self, user_id: &str, question: &str) -> String {
        let mut turn = self.start(user_id, question).await;

        // Deciding: phase 1 with the tool catalog attached
        let prompt = format!("{}\n\nUser: {}", self.config.system_prompt, turn.question);
        let schemas = self.tools.schemas();
        let raw = match self.client.generate(&prompt, &turn.context, &schemas).await {
            Ok(raw) => raw,
            Err(failure) => {
                tracing::warn!(user_id, error = %failure, "phase-1 transport failure");
                return self.done(user_id, failure.user_message().to_string());
            }
        };

        let request = match parse(&raw, !schemas.is_empty()) {
            ModelReply::FunctionCall(request) => request,
            // Answering: model replied directly, phase 2 is skipped
            ModelReply::DirectText(text) => return self.done(user_id, text),
            ModelReply::ParseFailure => {
                tracing::debug!(user_id, "phase-1 output unparseable, degrading to direct text");
                return self.done(user_id, raw.trim().to_string());
            }
        };

        // Dispatching: at most one tool per turn
        tracing::debug!(function = %request.function, "dispatching tool");
        match self.tools.dispatch(&request.function, &request.arguments).await {
            Dispatch::Output(output) | Dispatch::Failed(output) => {
                turn.record_tool_result(output);
            }
            Dispatch::NoOp => {}
        }

        // Finalizing: phase 2 restates the question, no tool catalog, so the
        // output is always direct text even if the model emits JSON again
        let prompt = format!(
            "Answer the user's question clearly. Question: {}",
            turn.question
        );
        let final_text = match self.client.generate(&prompt, &turn.context, &[]).await {
            Ok(raw) => match parse(&raw, false) {
                ModelReply::DirectText(text) => text,
                _ => String::new(),
            },
            Err(failure) => {
                tracing::warn!(user_id, error = %failure, "phase-2 transport failure");
                failure.user_message().to_string()
            }
        };

        let final_text = if final_text.is_empty() {
            turn.tool_result
                .take()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| EMPTY_RESPONSE_MESSAGE.into())
        } else {
            final_text
        };

        self.done(user_id, final_text)
    }

    /// Assemble context from memory and KB, and persist the user's question
    /// immediately, independent of the turn's outcome.
    async fn start(&self, user_id: &str, question: &str) -> Turn {
        let mut context = match self
            .memory
            .get_context(user_id, self.config.memory_context_limit)
        {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "memory context unavailable");
                Vec::new()
            }
        };

        match self.kb.query(question, self.config.kb_top_k).await {
            Ok(hits) => context.extend(hits.iter().map(KbHit::context_line)),
            Err(e) => tracing::warn!(user_id, error = %e, "KB query failed"),
        }

        if let Err(e) = self.memory.append_user(user_id, question) {
            tracing::warn!(user_id, error = %e, "failed to persist user message");
        }

        Turn {
            question: question.to_string(),
            context,
            tool_result: None,
        }
    }

    /// Persist the final text as the assistant's turn and return it.
    /// The non-empty invariant is enforced here, once, for every exit path.
    fn done(&self, user_id: &str, text: String) -> String {
        let text = if text.trim().is_empty() {
            EMPTY_RESPONSE_MESSAGE.to_string()
        } else {
            text
        };

        if let Err(e) = self.memory.append_assistant(user_id, &text) {
            tracing::warn!(user_id, error = %e, "failed to persist assistant message");
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AgentError, Result};
    use crate::llm::TransportFailure;
    use crate::memory::InMemoryStore;
    use crate::tool::{ParameterSchema, Tool, ToolSchema};
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// One recorded call to the mock backend
    struct RecordedCall {
        prompt: String,
        context: Vec<String>,
        tools_offered: bool,
    }

    /// Scripted backend: pops one reply per generate call
    struct MockLlm {
        replies: Mutex<VecDeque<std::result::Result<String, TransportFailure>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl MockLlm {
        fn scripted(
            replies: impl IntoIterator<Item = std::result::Result<String, TransportFailure>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn call(&self, index: usize) -> (String, Vec<String>, bool) {
            let calls = self.calls.lock().unwrap();
            let call = &calls[index];
            (call.prompt.clone(), call.context.clone(), call.tools_offered)
        }
    }

    #[async_trait]
    impl LlmClient for MockLlm {
        async fn generate(
            &self,
            prompt: &str,
            context_lines: &[String],
            tools: &[ToolSchema],
        ) -> std::result::Result<String, TransportFailure> {
            self.calls.lock().unwrap().push(RecordedCall {
                prompt: prompt.to_string(),
                context: context_lines.to_vec(),
                tools_offered: !tools.is_empty(),
            });
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("mock backend called more times than scripted")
        }
    }

    struct WeatherStub {
        calls: AtomicUsize,
    }

    impl WeatherStub {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Tool for WeatherStub {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "get_weather".into(),
                description: "Get current weather for a city".into(),
                parameters: vec![ParameterSchema {
                    name: "city".into(),
                    param_type: "string".into(),
                    description: "City name".into(),
                    required: false,
                    default: Some(serde_json::json!("Moscow")),
                }],
            }
        }

        async fn execute(&self, arguments: &Map<String, Value>) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let city = arguments.get("city").and_then(Value::as_str).unwrap_or("?");
            Ok(format!(
                "Weather in {city}: Clear. Temp 18°C (feels 17°C), humidity 40%, wind 3 m/s."
            ))
        }
    }

    struct BrokenHomeworkStub;

    #[async_trait]
    impl Tool for BrokenHomeworkStub {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "get_homework_for_today".into(),
                description: "Read today's homework".into(),
                parameters: vec![],
            }
        }

        async fn execute(&self, _arguments: &Map<String, Value>) -> Result<String> {
            Err(AgentError::ToolExecution("sheet unreachable".into()))
        }
    }

    struct StubKb {
        hits: Vec<KbHit>,
    }

    #[async_trait]
    impl KnowledgeProvider for StubKb {
        async fn query(&self, _text: &str, top_k: usize) -> Result<Vec<KbHit>> {
            Ok(self.hits.iter().take(top_k).cloned().collect())
        }
    }

    fn orchestrator(
        client: Arc<MockLlm>,
        tools: ToolRegistry,
    ) -> (Orchestrator, Arc<InMemoryStore>) {
        let memory = Arc::new(InMemoryStore::new());
        let orch = Orchestrator::new(
            client,
            Arc::new(tools),
            memory.clone(),
            Arc::new(crate::kb::EmptyKb),
            OrchestratorConfig::default(),
        );
        (orch, memory)
    }

    fn weather_registry() -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        tools.register(WeatherStub::new());
        tools
    }

    #[tokio::test]
    async fn test_tool_call_runs_two_phases_and_persists_final_text() {
        let client = MockLlm::scripted([
            Ok(r#"{"function": "get_weather", "arguments": {"city": "Paris"}}"#.into()),
            Ok("It's clear and 18°C in Paris right now.".into()),
        ]);
        let (orch, memory) = orchestrator(client.clone(), weather_registry());

        let answer = orch.handle_question("u1", "What's the weather in Paris?").await;
        assert_eq!(answer, "It's clear and 18°C in Paris right now.");

        // Phase 1 offered tools, phase 2 did not
        assert_eq!(client.call_count(), 2);
        assert!(client.call(0).2);
        assert!(!client.call(1).2);

        // Tool output flowed into phase-2 context
        let (prompt2, context2, _) = client.call(1);
        assert!(prompt2.contains("Question: What's the weather in Paris?"));
        assert!(
            context2
                .iter()
                .any(|l| l.starts_with("TOOL_RESULT: Weather in Paris: Clear."))
        );

        // Persisted assistant turn equals the phase-2 text
        let stored = memory.get_context("u1", 10).unwrap();
        assert_eq!(
            stored,
            vec![
                "user: What's the weather in Paris?",
                "assistant: It's clear and 18°C in Paris right now.",
            ]
        );
    }

    #[tokio::test]
    async fn test_direct_answer_skips_phase_two() {
        let client = MockLlm::scripted([Ok("Just review chapter 3 tonight.".into())]);
        let (orch, memory) = orchestrator(client.clone(), weather_registry());

        let answer = orch.handle_question("u1", "What should I study?").await;
        assert_eq!(answer, "Just review chapter 3 tonight.");
        assert_eq!(client.call_count(), 1);

        let stored = memory.get_context("u1", 10).unwrap();
        assert_eq!(stored[1], "assistant: Just review chapter 3 tonight.");
    }

    #[tokio::test]
    async fn test_unparseable_output_degrades_to_trimmed_text() {
        let client = MockLlm::scripted([Ok("  blah {totally broken json} blah  ".into())]);
        let (orch, _memory) = orchestrator(client.clone(), weather_registry());

        let answer = orch.handle_question("u1", "hm?").await;
        assert_eq!(answer, "blah {totally broken json} blah");
        // Phase 2 never invoked
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_phase_one_timeout_yields_degraded_message() {
        let client = MockLlm::scripted([Err(TransportFailure::Timeout)]);
        let tools = weather_registry();
        let (orch, memory) = orchestrator(client.clone(), tools);

        let answer = orch.handle_question("u1", "weather?").await;
        assert_eq!(answer, "Request to LLM timed out. Please try again.");
        assert_eq!(client.call_count(), 1);

        // Question was still persisted, and so was the degraded answer
        let stored = memory.get_context("u1", 10).unwrap();
        assert_eq!(stored[0], "user: weather?");
        assert_eq!(stored[1], "assistant: Request to LLM timed out. Please try again.");
    }

    #[tokio::test]
    async fn test_tool_failure_flows_into_phase_two_as_error_line() {
        let client = MockLlm::scripted([
            Ok(r#"{"function": "get_homework_for_today", "arguments": {}}"#.into()),
            Ok("I couldn't reach the homework sheet, sorry.".into()),
        ]);
        let mut tools = ToolRegistry::new();
        tools.register(BrokenHomeworkStub);
        let (orch, _memory) = orchestrator(client.clone(), tools);

        let answer = orch.handle_question("u1", "homework today?").await;
        assert_eq!(answer, "I couldn't reach the homework sheet, sorry.");

        let (_, context2, _) = client.call(1);
        assert!(
            context2
                .iter()
                .any(|l| l.starts_with("TOOL_RESULT: Tool error: "))
        );
    }

    #[tokio::test]
    async fn test_empty_phase_two_falls_back_to_tool_result() {
        let client = MockLlm::scripted([
            Ok(r#"{"function": "get_weather", "arguments": {}}"#.into()),
            Ok("   ".into()),
        ]);
        let (orch, _memory) = orchestrator(client.clone(), weather_registry());

        let answer = orch.handle_question("u1", "weather?").await;
        // Default city filled in by the dispatcher
        assert!(answer.starts_with("Weather in Moscow: Clear."));
    }

    #[tokio::test]
    async fn test_unregistered_function_is_noop_and_phase_two_still_runs() {
        let client = MockLlm::scripted([
            Ok(r#"{"function": "get_stock_price", "arguments": {}}"#.into()),
            Ok("I don't have a tool for that, but here's what I know.".into()),
        ]);
        let (orch, _memory) = orchestrator(client.clone(), weather_registry());

        let answer = orch.handle_question("u1", "stock price?").await;
        assert_eq!(answer, "I don't have a tool for that, but here's what I know.");

        // No TOOL_RESULT line was appended
        let (_, context2, _) = client.call(1);
        assert!(!context2.iter().any(|l| l.starts_with("TOOL_RESULT:")));
    }

    #[tokio::test]
    async fn test_context_assembled_from_memory_then_kb() {
        let client = MockLlm::scripted([Ok("ok".into())]);
        let memory = Arc::new(InMemoryStore::new());
        memory.append_user("u1", "earlier question").unwrap();
        memory.append_assistant("u1", "earlier answer").unwrap();

        let kb = Arc::new(StubKb {
            hits: vec![KbHit {
                title: "Rules".into(),
                text: "No phones in class.".into(),
                score: 0.1,
            }],
        });

        let orch = Orchestrator::new(
            client.clone(),
            Arc::new(weather_registry()),
            memory,
            kb,
            OrchestratorConfig::default(),
        );

        orch.handle_question("u1", "next?").await;

        let (_, context, _) = client.call(0);
        assert_eq!(
            context,
            vec![
                "user: earlier question",
                "assistant: earlier answer",
                "KB: Rules: No phones in class.",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_direct_answer_becomes_fixed_message() {
        let client = MockLlm::scripted([Ok(String::new())]);
        let (orch, _memory) = orchestrator(client.clone(), weather_registry());

        let answer = orch.handle_question("u1", "?").await;
        assert_eq!(answer, EMPTY_RESPONSE_MESSAGE);
    }

    #[tokio::test]
    async fn test_phase_two_transport_failure_still_answers() {
        let client = MockLlm::scripted([
            Ok(r#"{"function": "get_weather", "arguments": {}}"#.into()),
            Err(TransportFailure::Unavailable("connection refused".into())),
        ]);
        let (orch, memory) = orchestrator(client.clone(), weather_registry());

        let answer = orch.handle_question("u1", "weather?").await;
        assert_eq!(answer, "LLM service unavailable.");

        let stored = memory.get_context("u1", 10).unwrap();
        assert_eq!(stored[1], "assistant: LLM service unavailable.");
    }
}
