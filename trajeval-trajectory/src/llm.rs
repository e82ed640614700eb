//! LLM-as-judge for flat trajectories
//!
//! Renders a trajectory into a grading prompt and hands it to a
//! [`JudgeModel`]. The model call itself is supplied by the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

use trajeval_core::{
    EvaluatorResult, FewShotExample, JudgeModel, JudgeRequest, Message, Result,
    append_few_shot_examples, normalize_messages, render_template, run_single_evaluator,
};

/// Default grading prompt
///
/// Placeholders: `{outputs}`, `{inputs}`, `{reference_outputs}`, and
/// optionally `{rubric}` in custom prompts.
pub const DEFAULT_TRAJECTORY_PROMPT: &str = r#"You are an expert data labeler.
Your task is to grade the accuracy of an AI agent's internal trajectory.

<Rubric>
  An accurate trajectory:
  - Makes logical sense between steps
  - Shows clear progression
  - Is relatively efficient, though it does not need to be perfectly efficient
  - Is semantically equivalent to the provided reference trajectory, if present
</Rubric>

Grade the following trajectory:

<trajectory>
{outputs}
</trajectory>
{inputs}
{reference_outputs}
"#;

/// Render messages as role-tagged blocks for a judge prompt
pub fn messages_to_string(messages: &[Message]) -> String {
    messages.iter().map(format_message).collect::<Vec<_>>().join("\n\n")
}

fn format_message(message: &Message) -> String {
    let mut content = match &message.content {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    };

    if message.has_tool_calls() {
        let calls = message
            .tool_calls()
            .iter()
            .map(|call| {
                format!(
                    "<tool_call>\n<name>{}</name>\n<arguments>{}</arguments>\n</tool_call>",
                    call.name,
                    Value::Object(call.args.clone())
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        content = if content.is_empty() { calls } else { format!("{}\n{}", content, calls) };
    }

    if let Some(id) = &message.tool_call_id {
        content = format!(
            "<tool_result>\n<id>{}</id>\n<content>{}</content>\n</tool_result>",
            id, content
        );
    }

    format!("<{role}>\n{}\n</{role}>", content, role = message.role)
}

/// Judge settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryJudgeConfig {
    pub prompt: String,
    pub feedback_key: String,
    pub system: Option<String>,
    /// Score in `[0, 1]` instead of pass/fail
    pub continuous: bool,
    pub choices: Option<Vec<f64>>,
    pub use_reasoning: bool,
    /// Substituted for `{rubric}` in custom prompts
    pub rubric: Option<String>,
    /// Graded examples appended after the filled prompt
    pub few_shot_examples: Vec<FewShotExample>,
}

impl Default for TrajectoryJudgeConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_TRAJECTORY_PROMPT.to_string(),
            feedback_key: "trajectory_accuracy".to_string(),
            system: None,
            continuous: false,
            choices: None,
            use_reasoning: true,
            rubric: None,
            few_shot_examples: Vec::new(),
        }
    }
}

impl TrajectoryJudgeConfig {
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_feedback_key(mut self, key: impl Into<String>) -> Self {
        self.feedback_key = key.into();
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn continuous(mut self) -> Self {
        self.continuous = true;
        self
    }

    pub fn with_choices(mut self, choices: Vec<f64>) -> Self {
        self.choices = Some(choices);
        self
    }

    pub fn with_rubric(mut self, rubric: impl Into<String>) -> Self {
        self.rubric = Some(rubric.into());
        self
    }

    pub fn with_few_shot_examples(mut self, examples: Vec<FewShotExample>) -> Self {
        self.few_shot_examples = examples;
        self
    }
}

/// Grades a trajectory with an LLM judge
pub struct TrajectoryJudge {
    judge: Arc<dyn JudgeModel>,
    config: TrajectoryJudgeConfig,
}

impl TrajectoryJudge {
    pub fn new(judge: Arc<dyn JudgeModel>) -> Self {
        Self { judge, config: TrajectoryJudgeConfig::default() }
    }

    pub fn with_config(judge: Arc<dyn JudgeModel>, config: TrajectoryJudgeConfig) -> Self {
        Self { judge, config }
    }

    pub fn config(&self) -> &TrajectoryJudgeConfig {
        &self.config
    }

    /// Fill the prompt template
    pub fn render_prompt(
        &self,
        outputs: &Value,
        reference_outputs: Option<&Value>,
        inputs: Option<&Value>,
    ) -> Result<String> {
        let outputs = messages_to_string(&normalize_messages(Some(outputs))?);

        let reference = normalize_messages(reference_outputs)?;
        let reference = if reference.is_empty() {
            String::new()
        } else {
            format!(
                "\nUse the following trajectory as an example reference when grading:\n\
                 <reference_trajectory>\n{}\n</reference_trajectory>\n",
                messages_to_string(&reference)
            )
        };

        let inputs = match inputs {
            Some(inputs) => format!(
                "\nThe agent generated the trajectory from the following input:\n\
                 <input>\n{}\n</input>\n",
                inputs
            ),
            None => String::new(),
        };

        let rubric = self.config.rubric.as_deref().unwrap_or_default();
        let prompt = render_template(
            &self.config.prompt,
            &[
                ("outputs", &outputs),
                ("inputs", &inputs),
                ("reference_outputs", &reference),
                ("rubric", rubric),
            ],
        );
        Ok(append_few_shot_examples(prompt, &self.config.few_shot_examples))
    }

    /// Grade `outputs`, optionally against a reference trajectory
    pub async fn evaluate(
        &self,
        outputs: &Value,
        reference_outputs: Option<&Value>,
        inputs: Option<&Value>,
    ) -> Result<EvaluatorResult> {
        let prompt = self.render_prompt(outputs, reference_outputs, inputs)?;
        let request = JudgeRequest {
            system: self.config.system.clone(),
            prompt,
            continuous: self.config.continuous,
            choices: self.config.choices.clone(),
            use_reasoning: self.config.use_reasoning,
        };

        let key = &self.config.feedback_key;
        let run_name = format!("llm_as_{}_judge", key);
        run_single_evaluator(&run_name, key, async {
            self.judge.judge(request).instrument(trajeval_telemetry::judge_call_span(key)).await
        })
        .await
    }
}
