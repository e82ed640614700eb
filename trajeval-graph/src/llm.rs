//! LLM-as-judge for graph trajectories

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

use trajeval_core::{
    EvalError, EvaluatorResult, FewShotExample, JudgeModel, JudgeRequest, Result,
    append_few_shot_examples, render_template, run_single_evaluator,
};

use crate::snapshot::GraphTrajectory;

/// Default grading prompt, with `{thread}` and `{reference_outputs}` placeholders
pub const GRAPH_TRAJECTORY_ACCURACY_PROMPT: &str = r#"You are an expert data labeler.
Your task is to grade the accuracy of an AI agent's internal steps in resolving a user queries.

<Rubric>
  An accurate trajectory:
  - Makes logical sense between steps
  - Shows clear progression
  - Is relatively efficient, though it does not need to be perfectly efficient
  - Is semantically equivalent to the provided reference trajectory, if present
</Rubric>

<Instructions>
  Grade the following thread, evaluating whether the agent's overall steps are logical and relatively efficient.
  For the trajectory, "__start__" denotes an initial entrypoint to the agent, and "__interrupt__" corresponds to the agent
  interrupting to await additional data from another source ("human-in-the-loop").

  Steps containing a colon represent steps within subagents (e.g. "graph:step_name").
</Instructions>

<thread>
{thread}
</thread>

{reference_outputs}
"#;

/// Render rounds as `<input>`, `<trajectory>` and `<result>` blocks
///
/// Every round gets an input block; a missing or `null` input renders as `""`.
pub fn format_thread(inputs: &[Value], trajectory: &GraphTrajectory) -> String {
    let mut thread = String::new();
    for (i, steps) in trajectory.steps.iter().enumerate() {
        let input = match inputs.get(i) {
            None | Some(Value::Null) => Value::String(String::new()),
            Some(input) => input.clone(),
        };
        thread.push_str(&format!("\n<input>\n{}\n</input>\n", input));
        let steps = Value::from(steps.clone());
        thread.push_str(&format!("\n<trajectory>\n{}\n</trajectory>\n", steps));
        let result = trajectory.results.get(i).cloned().unwrap_or(Value::Null);
        thread.push_str(&format!("\n<result>\n{}\n</result>\n", result));
    }
    thread
}

/// Accept inputs as a list or as `{"inputs": [...]}`
fn input_list(inputs: &Value) -> Result<Vec<Value>> {
    match inputs {
        Value::Array(items) => Ok(items.clone()),
        Value::Object(map) => match map.get("inputs") {
            Some(Value::Array(items)) => Ok(items.clone()),
            _ => Err(EvalError::InputShape(
                "inputs must be an array or an object with an 'inputs' key".to_string(),
            )),
        },
        other => Err(EvalError::InputShape(format!(
            "inputs must be an array or an object with an 'inputs' key, got {}",
            other
        ))),
    }
}

fn trajectory_inputs(trajectory: &GraphTrajectory) -> Vec<Value> {
    trajectory.inputs.iter().flatten().cloned().map(Value::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphJudgeConfig {
    pub prompt: String,
    pub feedback_key: String,
    pub system: Option<String>,
    pub continuous: bool,
    pub choices: Option<Vec<f64>>,
    pub use_reasoning: bool,
    /// Graded examples appended after the filled prompt
    pub few_shot_examples: Vec<FewShotExample>,
}

impl Default for GraphJudgeConfig {
    fn default() -> Self {
        Self {
            prompt: GRAPH_TRAJECTORY_ACCURACY_PROMPT.to_string(),
            feedback_key: "graph_trajectory_accuracy".to_string(),
            system: None,
            continuous: false,
            choices: None,
            use_reasoning: true,
            few_shot_examples: Vec::new(),
        }
    }
}

impl GraphJudgeConfig {
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_feedback_key(mut self, key: impl Into<String>) -> Self {
        self.feedback_key = key.into();
        self
    }

    pub fn continuous(mut self) -> Self {
        self.continuous = true;
        self
    }

    pub fn with_few_shot_examples(mut self, examples: Vec<FewShotExample>) -> Self {
        self.few_shot_examples = examples;
        self
    }
}

/// Grades a graph trajectory with an LLM judge
pub struct GraphTrajectoryJudge {
    judge: Arc<dyn JudgeModel>,
    config: GraphJudgeConfig,
}

impl GraphTrajectoryJudge {
    pub fn new(judge: Arc<dyn JudgeModel>) -> Self {
        Self { judge, config: GraphJudgeConfig::default() }
    }

    pub fn with_config(judge: Arc<dyn JudgeModel>, config: GraphJudgeConfig) -> Self {
        Self { judge, config }
    }

    /// Fill the prompt template
    ///
    /// `inputs` defaults to the inputs carried by `outputs`. Inputs, results
    /// and steps must have one entry per round.
    pub fn render_prompt(
        &self,
        inputs: Option<&Value>,
        outputs: &GraphTrajectory,
        reference_outputs: Option<&GraphTrajectory>,
    ) -> Result<String> {
        let inputs = match inputs {
            Some(inputs) => input_list(inputs)?,
            None => trajectory_inputs(outputs),
        };
        if inputs.len() != outputs.results.len() {
            return Err(EvalError::InputShape(
                "Provided `inputs` and `results` within provided `outputs` \
                 must have the same length"
                    .to_string(),
            ));
        }
        if inputs.len() != outputs.steps.len() {
            return Err(EvalError::InputShape(
                "Provided `inputs` and `steps` within provided `outputs` \
                 must have the same length"
                    .to_string(),
            ));
        }

        let thread = format_thread(&inputs, outputs);
        let reference = match reference_outputs {
            Some(reference) => format!(
                "\nUse the following trajectory as an example reference when grading:\n\
                 <reference_thread>\n{}\n</reference_thread>\n",
                format_thread(&trajectory_inputs(reference), reference)
            ),
            None => String::new(),
        };

        let prompt = render_template(
            &self.config.prompt,
            &[("thread", &thread), ("reference_outputs", &reference)],
        );
        Ok(append_few_shot_examples(prompt, &self.config.few_shot_examples))
    }

    pub async fn evaluate(
        &self,
        inputs: Option<&Value>,
        outputs: &GraphTrajectory,
        reference_outputs: Option<&GraphTrajectory>,
    ) -> Result<EvaluatorResult> {
        let prompt = self.render_prompt(inputs, outputs, reference_outputs)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::RoundInput;
    use serde_json::json;
    use std::sync::Mutex;
    use trajeval_core::{Score, ScoreValue};

    #[derive(Default)]
    struct RecordingJudge {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl JudgeModel for RecordingJudge {
        async fn judge(&self, request: JudgeRequest) -> Result<ScoreValue> {
            self.prompts.lock().unwrap().push(request.prompt);
            Ok(ScoreValue::new(0.9).with_reasoning("logical"))
        }
    }

    fn trajectory() -> GraphTrajectory {
        let first = json!({"__start__": {"messages": [{"role": "user", "content": "hi"}]}});
        GraphTrajectory {
            inputs: Some(vec![RoundInput::Writes(first), RoundInput::Resuming]),
            results: vec![
                json!({}),
                json!({"messages": [{"role": "assistant", "content": "done"}]}),
            ],
            steps: vec![
                vec!["__start__".into(), "agent".into(), "tools".into(), "__interrupt__".into()],
                vec!["agent".into()],
            ],
        }
    }

    #[test]
    fn test_format_thread() {
        let t = trajectory();
        let thread = format_thread(&trajectory_inputs(&t), &t);
        assert!(thread.contains(
            "\n<trajectory>\n[\"__start__\",\"agent\",\"tools\",\"__interrupt__\"]\n</trajectory>\n"
        ));
        assert!(thread.contains("\n<input>\n\"__resuming__\"\n</input>\n"));
        assert!(thread.contains("\n<result>\n{}\n</result>\n"));
    }

    #[test]
    fn test_null_input_renders_as_empty_string() {
        let t = GraphTrajectory::from_steps([vec!["__start__", "agent"], vec!["agent"]]);
        let thread = format_thread(&[Value::Null, json!({"q": "next"})], &t);
        assert!(thread.starts_with("\n<input>\n\"\"\n</input>\n\n<trajectory>"));
        assert_eq!(thread.matches("<input>").count(), 2);
    }

    #[tokio::test]
    async fn test_evaluate_with_wrapped_inputs() {
        let judge = Arc::new(RecordingJudge::default());
        let grader = GraphTrajectoryJudge::new(judge.clone());
        let inputs = json!({"inputs": [{"q": "hi"}, "__resuming__"]});

        let result =
            grader.evaluate(Some(&inputs), &trajectory(), Some(&trajectory())).await.unwrap();
        assert_eq!(result.key, "graph_trajectory_accuracy");
        assert_eq!(result.score, Score::Number(0.9));

        let prompts = judge.prompts.lock().unwrap();
        assert!(prompts[0].contains("<reference_thread>"));
        assert!(prompts[0].contains("{\"q\":\"hi\"}"));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let grader = GraphTrajectoryJudge::new(Arc::new(RecordingJudge::default()));
        let one_input = json!([{"q": "hi"}]);
        let err = grader.render_prompt(Some(&one_input), &trajectory(), None).unwrap_err();
        assert!(matches!(err, EvalError::InputShape(_)));

        let unwrapped = json!({"turns": []});
        let err = grader.render_prompt(Some(&unwrapped), &trajectory(), None).unwrap_err();
        assert!(matches!(err, EvalError::InputShape(_)));
    }

    #[test]
    fn test_inputs_default_to_trajectory_inputs() {
        let grader = GraphTrajectoryJudge::new(Arc::new(RecordingJudge::default()));
        let prompt = grader.render_prompt(None, &trajectory(), None).unwrap();
        assert!(prompt.contains("<thread>\n\n<input>"));
        assert!(!prompt.contains("reference_thread"));
    }

    #[test]
    fn test_placeholders_inside_thread_are_kept() {
        let grader = GraphTrajectoryJudge::new(Arc::new(RecordingJudge::default()));
        let mut outputs = GraphTrajectory::from_steps([vec!["{reference_outputs}"]]);
        outputs.results = vec![json!({"note": "{thread}"})];
        let reference = GraphTrajectory::from_steps([vec!["__start__", "agent"]]);

        let prompt = grader
            .render_prompt(Some(&json!([null])), &outputs, Some(&reference))
            .unwrap();
        assert!(prompt.contains("<trajectory>\n[\"{reference_outputs}\"]\n</trajectory>"));
        assert!(prompt.contains("<result>\n{\"note\":\"{thread}\"}\n</result>"));
        assert_eq!(prompt.matches("<reference_thread>").count(), 1);
    }

    #[test]
    fn test_few_shot_examples_appended() {
        let config = GraphJudgeConfig::default().with_few_shot_examples(vec![
            FewShotExample::new(json!("hi"), json!({"steps": [["__start__", "agent"]]}), true),
        ]);
        let grader =
            GraphTrajectoryJudge::with_config(Arc::new(RecordingJudge::default()), config);
        let prompt = grader.render_prompt(None, &trajectory(), None).unwrap();
        assert!(prompt.find("</thread>").unwrap() < prompt.find("<examples>").unwrap());
        assert!(prompt.contains("<score>true</score>"));
    }
}
