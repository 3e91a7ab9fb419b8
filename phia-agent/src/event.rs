#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    StepStarted { step_id: u32 },
    ModelResponded { step_id: u32 },
    ToolDispatched { step_id: u32, tool: String },
    ToolFailed { step_id: u32, tool: String, error: String },
    BudgetExhausted { steps: usize },
    Finished { step_id: u32, forced: bool },
}

impl AgentEvent {
    pub fn step_id(&self) -> Option<u32> {
        match self {
            AgentEvent::StepStarted { step_id }
            | AgentEvent::ModelResponded { step_id }
            | AgentEvent::ToolDispatched { step_id, .. }
            | AgentEvent::ToolFailed { step_id, .. }
            | AgentEvent::Finished { step_id, .. } => Some(*step_id),
            AgentEvent::BudgetExhausted { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::Finished { .. })
    }
}
