use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use phia_agent::{AgentError, AgentEvent, ControllerConfig, StepController};
use phia_core::{
    ArgumentFormat, GenerateRequest, PhiaError, TextLlm, Tool, ToolError, ToolInput, ToolKind,
    ToolRegistry, Trajectory,
};
use phia_tools::FinishTool;

/// Replies from a fixed script and records every request it sees.
struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, PhiaError>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedLlm {
    fn new(replies: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_string())).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Err(PhiaError::LlmProvider(
                message.to_string(),
            ))])),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.prompt.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl TextLlm for ScriptedLlm {
    async fn generate(&self, request: GenerateRequest) -> Result<String, PhiaError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PhiaError::LlmProvider("script exhausted".to_string())))
    }
}

struct EchoTool;

#[async_trait::async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes its first argument."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Other
    }

    async fn invoke(&self, input: &ToolInput) -> Result<String, ToolError> {
        Ok(input.first_arg().unwrap_or_default().to_string())
    }
}

struct PanickingTool;

#[async_trait::async_trait]
impl Tool for PanickingTool {
    fn name(&self) -> &str {
        "tool_code"
    }

    fn description(&self) -> &str {
        "Crashes."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Code
    }

    async fn invoke(&self, _input: &ToolInput) -> Result<String, ToolError> {
        panic!("interpreter crashed")
    }
}

fn registry() -> ToolRegistry {
    ToolRegistry::new()
        .with_tool(Arc::new(EchoTool))
        .and_then(|tools| tools.with_tool(Arc::new(FinishTool)))
        .unwrap()
}

fn controller(llm: Arc<ScriptedLlm>, max_steps: usize) -> StepController {
    StepController::builder()
        .llm(llm)
        .tools(registry())
        .max_steps(max_steps)
        .build()
        .unwrap()
}

#[tokio::test]
async fn finish_on_first_call_returns_answer() {
    let llm = ScriptedLlm::new(vec!["[Thought]: Simple arithmetic.\n[Act]: finish('4')"]);
    let (answer, trajectory) = controller(llm.clone(), 10)
        .run("What is 2 + 2?")
        .await
        .unwrap();

    assert_eq!(answer, "4");
    assert_eq!(trajectory.len(), 1);
    assert!(trajectory.is_finished());
    let step = trajectory.last_step().unwrap();
    assert_eq!(step.thought.as_deref(), Some("Simple arithmetic."));
    assert_eq!(step.observation.as_deref(), Some("4"));
    assert_eq!(llm.prompts().len(), 1);
}

#[tokio::test]
async fn finish_label_routes_through_finish_tool() {
    let llm = ScriptedLlm::new(vec!["[Thought]: I know this.\n[Finish]: 4"]);
    let (answer, trajectory) = controller(llm, 10).run("What is 2 + 2?").await.unwrap();

    assert_eq!(answer, "4");
    let action = trajectory.last_step().unwrap().action.as_ref().unwrap();
    assert_eq!(action.tool_name, "finish");
    assert_eq!(action.args, vec!["4".to_string()]);
}

#[tokio::test]
async fn budget_exhaustion_forces_one_final_render() {
    let llm = ScriptedLlm::new(vec![
        "[Thought]: Look again.\n[Act]: echo('first')",
        "[Thought]: And again.\n[Act]: echo('second')",
        " The answer is 5. ",
    ]);
    let outcome = controller(llm.clone(), 2)
        .run_detailed("How many?")
        .await
        .unwrap();

    assert_eq!(outcome.answer, "The answer is 5.");
    assert!(outcome.forced_finish);
    assert_eq!(outcome.trajectory.len(), 2);
    assert!(!outcome.trajectory.is_finished());

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 3);
    assert_eq!(
        prompts.iter().filter(|p| p.ends_with("[Finish]: ")).count(),
        1
    );
    assert!(prompts[2].ends_with("[Finish]: "));
    assert!(prompts[2].contains("[Observe]: second"));

    assert!(outcome
        .events
        .contains(&AgentEvent::BudgetExhausted { steps: 2 }));
    assert_eq!(
        outcome.events.last(),
        Some(&AgentEvent::Finished {
            step_id: 2,
            forced: true
        })
    );
}

#[tokio::test]
async fn unknown_tool_becomes_error_observation() {
    let llm = ScriptedLlm::new(vec![
        "[Thought]: Try it.\n[Act]: nonexistent_tool('x')",
        "[Thought]: Give up.\n[Act]: finish('unknown')",
    ]);
    let outcome = controller(llm.clone(), 10)
        .run_detailed("Anything?")
        .await
        .unwrap();

    assert_eq!(outcome.answer, "unknown");
    assert_eq!(outcome.trajectory.len(), 2);
    let observation = outcome.trajectory.steps[0].observation.as_deref().unwrap();
    assert!(observation.starts_with("Error: tool not found: nonexistent_tool"));
    assert!(outcome.events.iter().any(|event| matches!(
        event,
        AgentEvent::ToolFailed { step_id: 1, tool, .. } if tool == "nonexistent_tool"
    )));
    assert!(llm.prompts()[1].contains("[Observe]: Error: tool not found"));
}

#[tokio::test]
async fn panicking_tool_still_appends_step() {
    let llm = ScriptedLlm::new(vec![
        "[Thought]: Run code.\n[Act]: ```tool_code\nprint(1)\n```",
        "[Finish]: could not compute",
    ]);
    let tools = registry().with_tool(Arc::new(PanickingTool)).unwrap();
    let controller = StepController::builder()
        .llm(llm)
        .tools(tools)
        .build()
        .unwrap();

    let (answer, trajectory) = controller.run("Average steps?").await.unwrap();
    assert_eq!(answer, "could not compute");
    assert_eq!(trajectory.len(), 2);
    let first = &trajectory.steps[0];
    assert_eq!(
        first.action.as_ref().map(|a| a.format),
        Some(ArgumentFormat::Markdown)
    );
    assert!(first
        .observation
        .as_deref()
        .unwrap()
        .contains("interpreter crashed"));
}

#[tokio::test]
async fn model_failure_propagates() {
    let llm = ScriptedLlm::failing("quota exceeded");
    let err = controller(llm, 10).run("Anything?").await.unwrap_err();
    assert!(matches!(err, AgentError::Model(PhiaError::LlmProvider(ref msg)) if msg == "quota exceeded"));
}

#[tokio::test]
async fn thought_without_action_goes_straight_to_forced_finish() {
    let llm = ScriptedLlm::new(vec!["[Thought]: I believe it is seven.", "[Finish]: 7"]);
    let outcome = controller(llm.clone(), 10)
        .run_detailed("Lucky number?")
        .await
        .unwrap();

    assert_eq!(outcome.answer, "7");
    assert!(outcome.forced_finish);
    assert_eq!(outcome.trajectory.len(), 1);
    let step = &outcome.trajectory.steps[0];
    assert_eq!(step.thought.as_deref(), Some("I believe it is seven."));
    assert!(step.action.is_none());
    assert!(llm.prompts()[1].ends_with("[Thought]: I believe it is seven.\n[Finish]: "));
}

#[tokio::test]
async fn unparseable_action_is_kept_verbatim() {
    let llm = ScriptedLlm::new(vec![
        "[Thought]: Hmm.\n[Act]: look at the data",
        "[Act]: finish('done')",
    ]);
    let (_, trajectory) = controller(llm, 10).run("Anything?").await.unwrap();

    let first = &trajectory.steps[0];
    let action = first.action.as_ref().unwrap();
    assert_eq!(action.format, ArgumentFormat::Verbatim);
    assert_eq!(action.render(), "look at the data");
    assert!(first
        .observation
        .as_deref()
        .unwrap()
        .starts_with("Error: could not parse action"));
}

#[tokio::test]
async fn overshooting_model_output_is_truncated_at_stop_marker() {
    let llm = ScriptedLlm::new(vec![
        "[Thought]: Echo.\n[Act]: echo('real')\n[Observe]: invented\n[Thought]: more",
        "[Act]: finish('real')",
    ]);
    let (_, trajectory) = controller(llm.clone(), 10).run("Echo?").await.unwrap();

    assert_eq!(trajectory.steps[0].observation.as_deref(), Some("real"));
    assert_eq!(
        llm.requests.lock().unwrap()[0].stop,
        vec!["[Observe]".to_string(), "[Question]".to_string()]
    );
}

#[tokio::test]
async fn question_prefix_and_exemplars_reach_the_prompt() {
    let llm = ScriptedLlm::new(vec!["[Finish]: ok"]);
    let exemplar = Trajectory::new("How many steps did I take yesterday?");
    let controller = StepController::builder()
        .llm(llm.clone())
        .tools(registry())
        .exemplars(vec![exemplar])
        .config(ControllerConfig::default().with_question_prefix("Answer briefly. "))
        .build()
        .unwrap();

    let (_, trajectory) = controller.run("Am I sleeping enough?").await.unwrap();
    assert_eq!(trajectory.input, "Answer briefly. Am I sleeping enough?");

    let prompt = &llm.prompts()[0];
    assert!(prompt.contains("[Question]: How many steps did I take yesterday?"));
    assert!(prompt.ends_with("[Question]: Answer briefly. Am I sleeping enough?\n"));
}

#[tokio::test]
async fn concurrent_runs_keep_separate_trajectories() {
    let llm = ScriptedLlm::new(vec!["[Finish]: a", "[Finish]: b"]);
    let controller = controller(llm, 10);

    let (first, second) = tokio::join!(controller.run("one"), controller.run("two"));
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_eq!(first.1.input, "one");
    assert_eq!(second.1.input, "two");
    assert_eq!(first.1.len(), 1);
    assert_eq!(second.1.len(), 1);
}

#[test]
fn builder_rejects_missing_backend_and_zero_budget() {
    let err = StepController::builder().build().unwrap_err();
    assert!(matches!(err, AgentError::Config(_)));

    let err = StepController::builder()
        .llm(ScriptedLlm::new(vec![]))
        .max_steps(0)
        .build()
        .unwrap_err();
    assert!(matches!(err, AgentError::Config(_)));
}

#[tokio::test]
async fn finish_with_answer_keyword_ends_in_one_call() {
    let llm = ScriptedLlm::new(vec!["[Thought]: Done.\n[Act]: finish(answer='4')"]);
    let (answer, trajectory) = controller(llm.clone(), 10).run("What is 2 + 2?").await.unwrap();

    assert_eq!(answer, "4");
    assert_eq!(trajectory.len(), 1);
    assert_eq!(trajectory.steps[0].observation.as_deref(), Some("4"));
    assert_eq!(llm.prompts().len(), 1);
}

#[tokio::test]
async fn narration_after_call_does_not_cost_a_step() {
    let llm = ScriptedLlm::new(vec![
        "[Thought]: Look it up.\n[Act]: echo('sleep')\nI will wait for results.",
        "[Act]: finish(Hello, world)",
    ]);
    let (answer, trajectory) = controller(llm, 10).run("Echo?").await.unwrap();

    assert_eq!(trajectory.steps[0].observation.as_deref(), Some("sleep"));
    assert_eq!(answer, "Hello, world");
    assert_eq!(trajectory.len(), 2);
}
