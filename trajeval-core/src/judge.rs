//! LLM judge seam
//!
//! Judge adapters build a prompt and hand it to a [`JudgeModel`], which
//! returns a score with optional reasoning. Any text-completion model can act
//! as a judge through [`PromptedJudge`], which asks for a `SCORE:` /
//! `REASONING:` reply and parses it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{EvalError, Result};
use crate::result::{Score, ScoreValue};

/// A fully rendered judge request
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeRequest {
    /// Optional system message prepended to the conversation
    pub system: Option<String>,
    /// Rendered prompt
    pub prompt: String,
    /// Ask for a score in `[0, 1]` rather than pass/fail
    pub continuous: bool,
    /// Restrict the score to these values
    pub choices: Option<Vec<f64>>,
    /// Ask the model to explain its score
    pub use_reasoning: bool,
}

impl JudgeRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            continuous: false,
            choices: None,
            use_reasoning: true,
        }
    }
}

/// Scores a rendered prompt
#[async_trait]
pub trait JudgeModel: Send + Sync {
    async fn judge(&self, request: JudgeRequest) -> Result<ScoreValue>;
}

/// Fill `{name}` placeholders in a single left-to-right pass
///
/// Substituted text is never scanned again, so placeholder-like text inside a
/// value survives verbatim. Braces that do not name a known placeholder are
/// kept as written.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after_brace = &rest[open + 1..];
        let filled = values.iter().find_map(|(name, value)| {
            after_brace
                .strip_prefix(name)
                .and_then(|tail| tail.strip_prefix('}'))
                .map(|tail| (*value, tail))
        });
        match filled {
            Some((value, tail)) => {
                rendered.push_str(value);
                rest = tail;
            }
            None => {
                rendered.push('{');
                rest = after_brace;
            }
        }
    }

    rendered.push_str(rest);
    rendered
}

/// A graded example shown to the judge ahead of the real task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub inputs: Value,
    pub outputs: Value,
    pub score: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl FewShotExample {
    pub fn new(inputs: Value, outputs: Value, score: impl Into<Score>) -> Self {
        Self { inputs, outputs, score: score.into(), reasoning: None }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    fn render(&self) -> String {
        let mut block = format!(
            "<example>\n<input>{}</input>\n<output>{}</output>",
            self.inputs, self.outputs
        );
        if let Some(reasoning) = &self.reasoning {
            block.push_str(&format!("\n<reasoning>{}</reasoning>", reasoning));
        }
        let score = match self.score {
            Score::Bool(b) => b.to_string(),
            Score::Number(n) => n.to_string(),
        };
        block.push_str(&format!("\n<score>{}</score>\n</example>", score));
        block
    }
}

/// Append rendered examples to a filled prompt; no examples leaves it unchanged
pub fn append_few_shot_examples(prompt: String, examples: &[FewShotExample]) -> String {
    if examples.is_empty() {
        return prompt;
    }
    let rendered: Vec<String> = examples.iter().map(FewShotExample::render).collect();
    format!(
        "{}\n\nHere are some examples:\n<examples>\n{}\n</examples>",
        prompt,
        rendered.join("\n")
    )
}

/// Plain text completion
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Model name, for logging
    fn name(&self) -> &str;

    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String>;
}

const JUDGE_PREAMBLE: &str =
    "You are an evaluation judge. Be objective and consistent. \
     Always respond in the exact format requested.";

/// Judge backed by a text-completion model
pub struct PromptedJudge {
    model: Arc<dyn TextCompletion>,
}

impl PromptedJudge {
    pub fn new(model: Arc<dyn TextCompletion>) -> Self {
        Self { model }
    }

    fn format_instructions(request: &JudgeRequest) -> String {
        let score_line = match (&request.choices, request.continuous) {
            (Some(choices), _) => {
                let listed: Vec<String> = choices.iter().map(|c| c.to_string()).collect();
                format!("SCORE: [one of {}]", listed.join(", "))
            }
            (None, true) => "SCORE: [0.0-1.0]".to_string(),
            (None, false) => "SCORE: [true or false]".to_string(),
        };
        if request.use_reasoning {
            format!(
                "Respond in this format:\n{}\nREASONING: [Brief explanation of the score]",
                score_line
            )
        } else {
            format!("Respond in this format:\n{}", score_line)
        }
    }

    /// Parse a `SCORE:` / `REASONING:` reply
    pub fn parse_response(request: &JudgeRequest, response: &str) -> Result<ScoreValue> {
        let mut raw_score = None;
        let mut reasoning = None;

        for line in response.lines() {
            let line = line.trim();
            if let Some(s) = line.strip_prefix("SCORE:") {
                raw_score = Some(s.trim().to_string());
            } else if let Some(r) = line.strip_prefix("REASONING:") {
                reasoning = Some(r.trim().to_string());
            }
        }

        let raw_score = raw_score.ok_or_else(|| {
            EvalError::Judge(format!("no SCORE line in judge reply: {}", response))
        })?;
        let score = Self::parse_score(request, &raw_score)?;

        Ok(ScoreValue { score, reasoning: reasoning.filter(|_| request.use_reasoning) })
    }

    fn parse_score(request: &JudgeRequest, raw: &str) -> Result<Score> {
        if request.continuous || request.choices.is_some() {
            let value: f64 = raw
                .parse()
                .map_err(|_| EvalError::Judge(format!("judge score '{}' is not a number", raw)))?;
            if let Some(choices) = &request.choices {
                if !choices.iter().any(|c| (c - value).abs() < f64::EPSILON) {
                    return Err(EvalError::Judge(format!(
                        "judge score {} is not one of the allowed choices {:?}",
                        value, choices
                    )));
                }
            } else if !(0.0..=1.0).contains(&value) {
                return Err(EvalError::Judge(format!("judge score {} is outside [0, 1]", value)));
            }
            return Ok(Score::Number(value));
        }

        match raw.to_lowercase().as_str() {
            "true" | "yes" | "1" | "1.0" => Ok(Score::Bool(true)),
            "false" | "no" | "0" | "0.0" => Ok(Score::Bool(false)),
            other => Err(EvalError::Judge(format!("judge score '{}' is not a boolean", other))),
        }
    }
}

#[async_trait]
impl JudgeModel for PromptedJudge {
    async fn judge(&self, request: JudgeRequest) -> Result<ScoreValue> {
        let system = match &request.system {
            Some(system) => format!("{}\n\n{}", JUDGE_PREAMBLE, system),
            None => JUDGE_PREAMBLE.to_string(),
        };
        let prompt = format!("{}\n\n{}", request.prompt, Self::format_instructions(&request));

        tracing::debug!(model = self.model.name(), "calling judge model");
        let response = self.model.complete(Some(&system), &prompt).await?;
        if response.trim().is_empty() {
            return Err(EvalError::Judge("Empty response from judge".to_string()));
        }
        Self::parse_response(&request, &response)
    }
}
