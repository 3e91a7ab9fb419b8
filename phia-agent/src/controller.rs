use std::sync::Arc;

use phia_core::{
    truncate_at_stop, Action, GenerateRequest, Step, TextLlm, ToolDescription, ToolKind,
    ToolRegistry, Trajectory,
};
use phia_prompt::{PromptRenderer, FINISH_LABEL};
use tracing::Instrument;

use crate::parse::{parse_model_output, ModelTurn};
use crate::{AgentError, AgentEvent, ControllerConfig};

const FALLBACK_FINISH_TOOL: &str = "finish";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerState {
    Running,
    /// The next render asks the model for a final answer only.
    AwaitingFinish,
    Done,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AgentOutcome {
    pub answer: String,
    pub trajectory: Trajectory,
    /// True when the answer came from the forced-finish render.
    pub forced_finish: bool,
    pub events: Vec<AgentEvent>,
}

/// Drives the Thought, Act, Observe loop for one question at a time.
///
/// Everything the loop needs is owned by the instance; `run` keeps its live
/// trajectory local, so a shared controller can answer questions concurrently.
#[derive(Clone)]
pub struct StepController {
    llm: Arc<dyn TextLlm>,
    tools: ToolRegistry,
    exemplars: Arc<[Trajectory]>,
    renderer: PromptRenderer,
    config: ControllerConfig,
}

impl std::fmt::Debug for StepController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepController")
            .field("tools", &self.tools)
            .field("exemplars", &self.exemplars.len())
            .field("config", &self.config)
            .finish()
    }
}

impl StepController {
    pub fn builder() -> StepControllerBuilder {
        StepControllerBuilder::default()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn exemplars(&self) -> &[Trajectory] {
        &self.exemplars
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub async fn run(&self, question: &str) -> Result<(String, Trajectory), AgentError> {
        let outcome = self.run_detailed(question).await?;
        Ok((outcome.answer, outcome.trajectory))
    }

    pub async fn run_detailed(&self, question: &str) -> Result<AgentOutcome, AgentError> {
        let span = tracing::info_span!(
            "phia_run",
            max_steps = self.config.max_steps,
            tools = self.tools.len(),
            exemplars = self.exemplars.len()
        );
        self.drive(question).instrument(span).await
    }

    async fn drive(&self, question: &str) -> Result<AgentOutcome, AgentError> {
        let descriptions = self.tools.describe_all();
        let mut trajectory = Trajectory::new(self.config.question_input(question));
        let mut events = Vec::new();
        let mut state = ControllerState::Running;
        let mut step_id: u32 = 0;
        let mut answer = String::new();
        let mut forced_finish = false;

        while state != ControllerState::Done {
            match state {
                ControllerState::Running => {
                    if trajectory.len() >= self.config.max_steps {
                        tracing::debug!(steps = trajectory.len(), "step budget exhausted");
                        events.push(AgentEvent::BudgetExhausted {
                            steps: trajectory.len(),
                        });
                        state = ControllerState::AwaitingFinish;
                        continue;
                    }

                    step_id += 1;
                    events.push(AgentEvent::StepStarted { step_id });
                    let text = self.generate(&descriptions, &trajectory, false).await?;
                    events.push(AgentEvent::ModelResponded { step_id });

                    let (step, next) = match parse_model_output(&text) {
                        ModelTurn::Act {
                            thought,
                            action: Ok(action),
                        } => {
                            let step = self.execute(step_id, thought, action, &mut events).await;
                            (step, ControllerState::Running)
                        }
                        ModelTurn::Act {
                            thought,
                            action: Err(err),
                        } => {
                            tracing::warn!(step_id, error = %err, "model emitted an unparseable action");
                            let step = Step::new(
                                thought,
                                Action::verbatim(err.raw.clone()),
                                Some(format!("Error: {err}")),
                            );
                            (step, ControllerState::Running)
                        }
                        ModelTurn::Finish { thought, answer } => {
                            let step = self.finish(step_id, thought, answer, &mut events).await;
                            (step, ControllerState::Running)
                        }
                        ModelTurn::Thought { thought } => {
                            tracing::debug!(step_id, "model produced a thought without an action");
                            (Step::dangling(thought), ControllerState::AwaitingFinish)
                        }
                    };

                    let finished = step.is_finished;
                    let final_answer = step.observation.clone();
                    trajectory.push(step).map_err(AgentError::Trajectory)?;

                    state = if finished {
                        answer = final_answer.unwrap_or_default();
                        events.push(AgentEvent::Finished {
                            step_id,
                            forced: false,
                        });
                        ControllerState::Done
                    } else {
                        next
                    };
                }
                ControllerState::AwaitingFinish => {
                    let text = self.generate(&descriptions, &trajectory, true).await?;
                    answer = forced_answer(&text);
                    forced_finish = true;
                    events.push(AgentEvent::Finished {
                        step_id,
                        forced: true,
                    });
                    state = ControllerState::Done;
                }
                ControllerState::Done => {}
            }
        }

        tracing::info!(steps = trajectory.len(), forced_finish, "run finished");
        Ok(AgentOutcome {
            answer,
            trajectory,
            forced_finish,
            events,
        })
    }

    async fn generate(
        &self,
        tools: &[ToolDescription],
        trajectory: &Trajectory,
        force_finish: bool,
    ) -> Result<String, AgentError> {
        let prompt = self
            .renderer
            .render(tools, &self.exemplars, trajectory, force_finish);
        let request = GenerateRequest::new(prompt.text, prompt.stop.clone());
        let text = self.llm.generate(request).await.map_err(AgentError::Model)?;
        Ok(truncate_at_stop(&text, &prompt.stop).to_string())
    }

    async fn execute(
        &self,
        step_id: u32,
        thought: Option<String>,
        action: Action,
        events: &mut Vec<AgentEvent>,
    ) -> Step {
        events.push(AgentEvent::ToolDispatched {
            step_id,
            tool: action.tool_name.clone(),
        });
        let kind = self.tools.lookup(&action.tool_name).map(|tool| tool.kind());

        match self.tools.dispatch(&action).await {
            Ok(answer) if matches!(kind, Ok(ToolKind::Finish)) => {
                Step::finish(thought, action, answer)
            }
            Ok(output) => Step::new(thought, action, Some(output)),
            Err(err) => {
                tracing::warn!(step_id, tool = %action.tool_name, error = %err, "tool dispatch failed");
                events.push(AgentEvent::ToolFailed {
                    step_id,
                    tool: action.tool_name.clone(),
                    error: err.to_string(),
                });
                Step::new(thought, action, Some(format!("Error: {err}")))
            }
        }
    }

    async fn finish(
        &self,
        step_id: u32,
        thought: Option<String>,
        answer: String,
        events: &mut Vec<AgentEvent>,
    ) -> Step {
        match self.tools.first_of_kind(ToolKind::Finish) {
            Some(tool) => {
                let action = Action::new(tool.name(), vec![answer]);
                self.execute(step_id, thought, action, events).await
            }
            None => {
                let action = Action::new(FALLBACK_FINISH_TOOL, vec![answer.clone()]);
                Step::finish(thought, action, answer)
            }
        }
    }
}

fn forced_answer(text: &str) -> String {
    let text = text.trim();
    let label = format!("{FINISH_LABEL}:");
    text.strip_prefix(label.as_str())
        .unwrap_or(text)
        .trim()
        .to_string()
}

#[derive(Default)]
pub struct StepControllerBuilder {
    llm: Option<Arc<dyn TextLlm>>,
    tools: ToolRegistry,
    exemplars: Vec<Trajectory>,
    renderer: Option<PromptRenderer>,
    config: ControllerConfig,
}

impl StepControllerBuilder {
    pub fn llm(mut self, llm: Arc<dyn TextLlm>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn exemplars(mut self, exemplars: Vec<Trajectory>) -> Self {
        self.exemplars = exemplars;
        self
    }

    pub fn renderer(mut self, renderer: PromptRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.config.max_steps = max_steps;
        self
    }

    pub fn build(self) -> Result<StepController, AgentError> {
        let llm = self
            .llm
            .ok_or_else(|| AgentError::Config("a model backend is required".to_string()))?;
        self.config.validate()?;
        Ok(StepController {
            llm,
            tools: self.tools,
            exemplars: self.exemplars.into(),
            renderer: self.renderer.unwrap_or_default(),
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::forced_answer;

    #[test]
    fn forced_answer_drops_repeated_label() {
        assert_eq!(forced_answer("  [Finish]: 42 steps\n"), "42 steps");
        assert_eq!(forced_answer("Just the answer "), "Just the answer");
    }
}
