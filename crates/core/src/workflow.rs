//! Banner creation workflow.
//!
//! A fixed, ordered list of steps with `completed` / `current` flags and the
//! [`BannerConfig`] being built. Step gating is an exhaustive mapping from
//! [`StepKind`] to a predicate over the config; unknown step ids fail closed.
//!
//! The workflow carries a generation counter. It is bumped on every reset and
//! every change of the current step, and async results carrying an
//! [`AsyncTicket`] from an older generation are rejected.

use serde::{Deserialize, Serialize};

use crate::config::{BannerConfig, ConfigPatch};
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Step kinds
// ---------------------------------------------------------------------------

/// The steps of the default banner workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    Columns,
    Background,
    Content,
    AiImage,
    AiText,
    Preview,
}

impl StepKind {
    /// Default workflow order.
    pub const ALL: [StepKind; 6] = [
        Self::Columns,
        Self::Background,
        Self::Content,
        Self::AiImage,
        Self::AiText,
        Self::Preview,
    ];

    /// Resolve a step id. Returns `None` for ids outside the default set.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "columns" => Some(Self::Columns),
            "background" => Some(Self::Background),
            "content" => Some(Self::Content),
            "ai-image" => Some(Self::AiImage),
            "ai-text" => Some(Self::AiText),
            "preview" => Some(Self::Preview),
            _ => None,
        }
    }

    /// Stable step id.
    pub fn id(self) -> &'static str {
        match self {
            Self::Columns => "columns",
            Self::Background => "background",
            Self::Content => "content",
            Self::AiImage => "ai-image",
            Self::AiText => "ai-text",
            Self::Preview => "preview",
        }
    }

    /// Human-readable label for the step.
    pub fn title(self) -> &'static str {
        match self {
            Self::Columns => "Select columns",
            Self::Background => "Select background",
            Self::Content => "Define content",
            Self::AiImage => "Generate product image with AI",
            Self::AiText => "Optimize text with AI",
            Self::Preview => "Preview and adjust",
        }
    }

    /// AI steps can be skipped.
    pub fn is_optional(self) -> bool {
        matches!(self, Self::AiImage | Self::AiText)
    }

    /// Whether `config` satisfies this step.
    pub fn is_satisfied_by(self, config: &BannerConfig) -> bool {
        match self {
            Self::Columns => config.columns > 0,
            // The type is an enum and always set; only the value can be blank.
            Self::Background => !config.background_value.trim().is_empty(),
            Self::Content => !config.content.is_empty(),
            Self::AiImage | Self::AiText => true,
            Self::Preview => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Steps and state
// ---------------------------------------------------------------------------

/// One stage of the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub current: bool,
    #[serde(default)]
    pub optional: bool,
}

impl WorkflowStep {
    /// A fresh (not completed, not current) step record.
    pub fn new(id: impl Into<String>, title: impl Into<String>, optional: bool) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed: false,
            current: false,
            optional,
        }
    }

    pub fn from_kind(kind: StepKind) -> Self {
        Self::new(kind.id(), kind.title(), kind.is_optional())
    }

    /// The step's kind, if its id is one of the default ids.
    pub fn kind(&self) -> Option<StepKind> {
        StepKind::from_id(&self.id)
    }
}

/// The default six-step list.
pub fn default_steps() -> Vec<WorkflowStep> {
    StepKind::ALL.into_iter().map(WorkflowStep::from_kind).collect()
}

/// Serializable snapshot of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub current_step: usize,
    pub steps: Vec<WorkflowStep>,
    pub config: BannerConfig,
}

impl WorkflowState {
    fn initial(steps: &[WorkflowStep], config: BannerConfig) -> Self {
        let steps = steps
            .iter()
            .enumerate()
            .map(|(index, step)| WorkflowStep {
                completed: false,
                current: index == 0,
                ..step.clone()
            })
            .collect();
        Self {
            current_step: 0,
            steps,
            config,
        }
    }
}

/// Proof of the workflow position an async request was issued from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncTicket {
    pub generation: u64,
    pub step_index: usize,
    pub step_id: String,
}

/// Completed-vs-total step counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Completion as a whole percentage (0–100).
    pub fn percent(self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u8
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// The banner creation workflow.
#[derive(Debug, Clone)]
pub struct BannerWorkflow {
    state: WorkflowState,
    seed_steps: Vec<WorkflowStep>,
    seed_config: BannerConfig,
    generation: u64,
}

impl BannerWorkflow {
    /// Default steps over a blank banner with `initial` laid on top.
    pub fn new(initial: ConfigPatch) -> Self {
        Self::from_parts(default_steps(), BannerConfig::seeded(initial))
    }

    /// A custom step list. Flags on the given steps are normalised.
    pub fn with_steps(steps: Vec<WorkflowStep>, seed: BannerConfig) -> Result<Self, CoreError> {
        if steps.is_empty() {
            return Err(CoreError::Validation(
                "A workflow needs at least one step".to_string(),
            ));
        }
        Ok(Self::from_parts(steps, seed))
    }

    /// Resume a previously saved snapshot. Reset goes back to `seed`.
    pub fn restore(state: WorkflowState, seed: BannerConfig) -> Result<Self, CoreError> {
        if state.steps.is_empty() || state.current_step >= state.steps.len() {
            return Err(CoreError::Validation(format!(
                "Current step {} is out of range for {} steps",
                state.current_step,
                state.steps.len()
            )));
        }
        Ok(Self {
            seed_steps: state.steps.clone(),
            seed_config: seed,
            state,
            generation: 0,
        })
    }

    fn from_parts(steps: Vec<WorkflowStep>, seed: BannerConfig) -> Self {
        Self {
            state: WorkflowState::initial(&steps, seed.clone()),
            seed_steps: steps,
            seed_config: seed,
            generation: 0,
        }
    }

    // ---- accessors ----

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn config(&self) -> &BannerConfig {
        &self.state.config
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.state.steps
    }

    pub fn current_index(&self) -> usize {
        self.state.current_step
    }

    /// The step record at `current_step`.
    pub fn current(&self) -> Option<&WorkflowStep> {
        self.state.steps.get(self.state.current_step)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_step_completed(&self, step_id: &str) -> bool {
        self.find(step_id)
            .map(|index| self.state.steps[index].completed)
            .unwrap_or(false)
    }

    pub fn is_current_step(&self, step_id: &str) -> bool {
        self.find(step_id)
            .map(|index| self.state.steps[index].current)
            .unwrap_or(false)
    }

    pub fn is_last_step(&self) -> bool {
        self.state.current_step + 1 >= self.state.steps.len()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.state.steps.iter().filter(|s| s.completed).count(),
            total: self.state.steps.len(),
        }
    }

    // ---- config ----

    /// Apply `patch` to the config (see [`BannerConfig::update_config`]).
    pub fn update_config(&mut self, patch: ConfigPatch) {
        self.state.config = self.state.config.update_config(patch);
    }

    // ---- transitions ----

    /// Complete the current step and move to the next one.
    ///
    /// No-op on the last step: it stays current and is only completed
    /// through [`mark_completed`](Self::mark_completed).
    pub fn advance(&mut self) {
        if self.is_last_step() {
            return;
        }
        let from = self.state.current_step;
        let to = from + 1;

        let step = &mut self.state.steps[from];
        step.completed = true;
        step.current = false;
        self.state.steps[to].current = true;
        self.state.current_step = to;
        self.generation += 1;
    }

    /// Move back one step. No-op on the first step.
    pub fn retreat(&mut self) {
        let from = self.state.current_step;
        let to = from.saturating_sub(1);
        if to == from {
            return;
        }
        self.move_to(to);
    }

    /// Jump to the step with `step_id`. Unknown ids leave the state unchanged.
    pub fn go_to(&mut self, step_id: &str) {
        let Some(target) = self.find(step_id) else {
            return;
        };
        if target == self.state.current_step {
            return;
        }
        self.move_to(target);
    }

    /// Mark a step completed without moving. Idempotent; unknown ids are ignored.
    pub fn mark_completed(&mut self, step_id: &str) {
        if let Some(index) = self.find(step_id) {
            self.state.steps[index].completed = true;
        }
    }

    /// Whether the current step's requirements are met.
    ///
    /// Optional steps always pass. Steps with ids outside [`StepKind`] fail.
    pub fn can_proceed(&self) -> bool {
        let Some(step) = self.current() else {
            return false;
        };
        if step.optional {
            return true;
        }
        match step.kind() {
            Some(kind) => kind.is_satisfied_by(&self.state.config),
            None => false,
        }
    }

    /// Back to the construction state, config included.
    pub fn reset(&mut self) {
        self.state = WorkflowState::initial(&self.seed_steps, self.seed_config.clone());
        self.generation += 1;
    }

    /// Start over on `seed`, which also becomes the new reset target.
    pub fn start_over(&mut self, seed: BannerConfig) {
        self.seed_config = seed;
        self.reset();
    }

    // ---- async results ----

    /// Capture the current position for an outgoing async request.
    pub fn ticket(&self) -> AsyncTicket {
        AsyncTicket {
            generation: self.generation,
            step_index: self.state.current_step,
            step_id: self
                .current()
                .map(|step| step.id.clone())
                .unwrap_or_default(),
        }
    }

    /// `Ok` if a result issued under `ticket` may still be applied.
    pub fn check_ticket(&self, ticket: &AsyncTicket) -> Result<(), CoreError> {
        if ticket.generation != self.generation {
            return Err(CoreError::Stale {
                issued: ticket.generation,
                current: self.generation,
            });
        }
        Ok(())
    }

    /// Fold an async result into the config if `ticket` is still valid.
    pub fn apply_async(&mut self, ticket: &AsyncTicket, patch: ConfigPatch) -> Result<(), CoreError> {
        self.check_ticket(ticket)?;
        self.update_config(patch);
        Ok(())
    }

    // ---- private helpers ----

    fn find(&self, step_id: &str) -> Option<usize> {
        self.state.steps.iter().position(|step| step.id == step_id)
    }

    fn move_to(&mut self, target: usize) {
        let from = self.state.current_step;
        self.state.steps[from].current = false;
        self.state.steps[target].current = true;
        self.state.current_step = target;
        self.generation += 1;
    }
}

impl Default for BannerWorkflow {
    fn default() -> Self {
        Self::new(ConfigPatch::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
