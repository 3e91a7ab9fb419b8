use phia_core::{Step, ToolDescription, Trajectory};

use crate::preamble::DEFAULT_PREAMBLE;

pub const QUESTION_LABEL: &str = "[Question]";
pub const THOUGHT_LABEL: &str = "[Thought]";
pub const ACT_LABEL: &str = "[Act]";
pub const OBSERVE_LABEL: &str = "[Observe]";
pub const FINISH_LABEL: &str = "[Finish]";

const TOOLS_HEADING: &str = "Here is a list of available tools:";
const EXEMPLARS_HEADING: &str = "Here are examples of how different tasks can be solved with these tools. Never copy the answer directly, and instead use examples as a guide to solve a task:";
const CLOSING_GUIDANCE: &str = "Carefully consider examples of how different tasks can be solved with different tools and use them to answer my questions.
Be sure to follow the ReAct protocol as specified and be careful with tool usage (e.g., use only one tool at a time).
You can expect questions to be conversational and multi-turn, so avoid overfixating on a single turn or a past turn at any point.";
const LIVE_HEADING: &str =
    "Here is the question you need to solve and your current state toward solving it:";

/// Text to send to the model plus the markers generation should stop at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub text: String,
    pub stop: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptRenderer {
    preamble: String,
    stop_markers: Vec<String>,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PromptRenderer {
    pub fn builder() -> PromptRendererBuilder {
        PromptRendererBuilder {
            preamble: DEFAULT_PREAMBLE.to_string(),
            stop_markers: default_stop_markers(),
        }
    }

    pub fn stop_markers(&self) -> &[String] {
        &self.stop_markers
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// Pure function of its inputs: identical arguments give byte-identical text.
    pub fn render(
        &self,
        tools: &[ToolDescription],
        exemplars: &[Trajectory],
        live: &Trajectory,
        force_finish: bool,
    ) -> RenderedPrompt {
        let mut text = String::new();

        if !self.preamble.is_empty() {
            text.push_str(&self.preamble);
            if !self.preamble.ends_with('\n') {
                text.push('\n');
            }
            text.push('\n');
        }

        if !tools.is_empty() {
            text.push_str(TOOLS_HEADING);
            text.push('\n');
            for tool in tools {
                text.push_str(&format!(
                    "\nTool name: {}\nTool description: {}\n",
                    tool.name, tool.description
                ));
                if let Some(example) = &tool.example {
                    push_line(&mut text, &format!("  Tool example: {example}"));
                }
            }
            text.push('\n');
        }

        if !exemplars.is_empty() {
            text.push_str(EXEMPLARS_HEADING);
            text.push('\n');
            for exemplar in exemplars {
                text.push('\n');
                push_question(&mut text, &exemplar.input);
                for step in &exemplar.steps {
                    push_step(&mut text, step);
                }
            }
            text.push('\n');
        }

        text.push_str(CLOSING_GUIDANCE);
        text.push_str("\n\n");
        text.push_str(LIVE_HEADING);
        text.push('\n');
        push_question(&mut text, &live.input);
        for step in &live.steps {
            push_step(&mut text, step);
        }

        if force_finish {
            text.push_str(FINISH_LABEL);
            text.push_str(": ");
        }

        RenderedPrompt {
            text,
            stop: self.stop_markers.clone(),
        }
    }
}

pub struct PromptRendererBuilder {
    preamble: String,
    stop_markers: Vec<String>,
}

impl PromptRendererBuilder {
    pub fn preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    pub fn stop_markers(mut self, stop_markers: Vec<String>) -> Self {
        self.stop_markers = stop_markers;
        self
    }

    pub fn build(self) -> PromptRenderer {
        PromptRenderer {
            preamble: self.preamble,
            stop_markers: self.stop_markers,
        }
    }
}

pub fn default_stop_markers() -> Vec<String> {
    vec![OBSERVE_LABEL.to_string(), QUESTION_LABEL.to_string()]
}

fn push_line(text: &mut String, line: &str) {
    text.push_str(line);
    text.push('\n');
}

fn push_labeled(text: &mut String, label: &str, body: &str) {
    push_line(text, &format!("{label}: {body}"));
}

fn push_question(text: &mut String, input: &str) {
    push_labeled(text, QUESTION_LABEL, input);
}

fn push_step(text: &mut String, step: &Step) {
    if let Some(thought) = &step.thought {
        push_labeled(text, THOUGHT_LABEL, thought);
    }
    if let Some(action) = &step.action {
        push_labeled(text, ACT_LABEL, &action.render());
        if let Some(observation) = &step.observation {
            push_labeled(text, OBSERVE_LABEL, observation);
        }
    }
    if step.is_finished {
        if let Some(observation) = &step.observation {
            push_labeled(text, FINISH_LABEL, observation);
        }
    }
}
