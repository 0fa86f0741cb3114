//! The planner's structured output.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// `step_1`: what the workpad holds and whether the work is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkpadReview {
    pub workpad_summary: String,
    pub reasoning_steps: String,
    pub work_completion: String,
}

/// `step_2`: review of the reasoning and a second draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Review {
    pub review: String,
    pub reasoning_steps_draft_2: String,
}

/// `step_3`: draft instructions and their review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Drafting {
    pub draft_instructions: String,
    pub review: String,
}

/// `step_4`: alignment check and the instructions the chosen agent receives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentAlignment {
    pub agent_alignment: String,
    pub final_draft: String,
}

/// Planner output: four reasoning steps plus the next agent.
///
/// Serialized with the key `Agent` for the agent choice; every field is required and
/// unknown fields are rejected, matching [`DecisionArtifact::schema`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionArtifact {
    pub step_1: WorkpadReview,
    pub step_2: Review,
    #[serde(rename = "Agent")]
    pub agent: String,
    pub step_3: Drafting,
    pub step_4: AgentAlignment,
}

impl DecisionArtifact {
    /// Artifact directing `agent` with `final_draft`; the reasoning steps are left empty.
    pub fn new(agent: impl Into<String>, final_draft: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            step_4: AgentAlignment {
                agent_alignment: String::new(),
                final_draft: final_draft.into(),
            },
            ..Self::default()
        }
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text.trim())
    }

    /// Compact JSON text, as stored in the workpad.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// JSON Schema for the artifact: all properties required, no additional properties.
    pub fn schema() -> Value {
        fn text(description: &str) -> Value {
            json!({ "type": "string", "description": description })
        }
        fn object(description: &str, properties: &[(&str, Value)]) -> Value {
            let required: Vec<&str> = properties.iter().map(|(k, _)| *k).collect();
            let props: serde_json::Map<String, Value> = properties
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();
            json!({
                "type": "object",
                "properties": props,
                "required": required,
                "description": description,
                "additionalProperties": false,
            })
        }

        json!({
            "type": "object",
            "properties": {
                "step_1": object("First set of actions", &[
                    ("workpad_summary", text("Extractively summarize the workpad, including sources, as it relates to the requirements.")),
                    ("reasoning_steps", text("Given the workpad summary and the available agents, outline the reasoning steps for meeting the requirements.")),
                    ("work_completion", text("Given the workpad, decide whether there is enough information to deliver the final answer.")),
                ]),
                "step_2": object("Second set of actions", &[
                    ("review", text("Review your reasoning steps.")),
                    ("reasoning_steps_draft_2", text("A second draft of the reasoning steps with the amendments from the review.")),
                ]),
                "Agent": text("The agent to instruct next, named exactly as it appears in the agent registry."),
                "step_3": object("Third set of actions", &[
                    ("draft_instructions", text("Draft instructions for the agent, or the draft final answer, based on the workpad.")),
                    ("review", text("Review the draft.")),
                ]),
                "step_4": object("Final steps", &[
                    ("agent_alignment", text("Check that the draft matches the chosen agent's capabilities.")),
                    ("final_draft", text("The final instructions for the agent, or the final answer.")),
                ]),
            },
            "required": ["step_1", "step_2", "Agent", "step_3", "step_4"],
            "additionalProperties": false,
        })
    }
}

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("not JSON: {0}")]
    NotJson(#[from] serde_json::Error),
    #[error("no `Agent` field")]
    MissingAgent,
}

/// The parts of a planner reply that drive a run: the chosen agent and `step_4.final_draft`.
///
/// Read leniently: other keys may be missing or extra. Only unparseable JSON or a missing
/// `Agent` string is an error; a missing `final_draft` reads as `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub agent: String,
    pub final_draft: String,
}

impl Decision {
    pub fn read(text: &str) -> Result<Self, DecisionError> {
        let value: Value = serde_json::from_str(text.trim())?;
        let agent = value
            .get("Agent")
            .and_then(Value::as_str)
            .ok_or(DecisionError::MissingAgent)?;
        let final_draft = value
            .pointer("/step_4/final_draft")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(Self {
            agent: agent.to_string(),
            final_draft: final_draft.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "step_1": {"workpad_summary": "empty", "reasoning_steps": "search first", "work_completion": "no"},
        "step_2": {"review": "ok", "reasoning_steps_draft_2": "search first"},
        "Agent": "serper_agent",
        "step_3": {"draft_instructions": "search", "review": "fine"},
        "step_4": {"agent_alignment": "yes", "final_draft": "Search for the capital of France"}
    }"#;

    /// **Scenario**: an artifact with exactly the five fields survives serialize then parse.
    #[test]
    fn fixture_round_trips() {
        let parsed = DecisionArtifact::parse(FIXTURE).unwrap();
        assert_eq!(parsed.agent, "serper_agent");
        assert_eq!(parsed.step_4.final_draft, "Search for the capital of France");
        let json = parsed.to_json();
        assert!(json.contains("\"Agent\":\"serper_agent\""));
        assert_eq!(DecisionArtifact::parse(&json).unwrap(), parsed);
    }

    #[test]
    fn unknown_and_missing_fields_are_rejected() {
        let mut value: Value = serde_json::from_str(FIXTURE).unwrap();
        value["extra"] = json!("nope");
        assert!(DecisionArtifact::parse(&value.to_string()).is_err());

        let mut value: Value = serde_json::from_str(FIXTURE).unwrap();
        value.as_object_mut().unwrap().remove("step_3");
        assert!(DecisionArtifact::parse(&value.to_string()).is_err());

        let lower = FIXTURE.replace("\"Agent\"", "\"agent\"");
        assert!(DecisionArtifact::parse(&lower).is_err());
    }

    /// **Scenario**: extra keys and missing reasoning steps do not hide the agent or the draft.
    #[test]
    fn decision_reads_partial_replies() {
        let mut value: Value = serde_json::from_str(FIXTURE).unwrap();
        value.as_object_mut().unwrap().remove("step_2");
        value["notes"] = json!("extra");
        let decision = Decision::read(&value.to_string()).unwrap();
        assert_eq!(decision.agent, "serper_agent");
        assert_eq!(decision.final_draft, "Search for the capital of France");

        let bare = Decision::read(r#"{"Agent": "reporter_agent"}"#).unwrap();
        assert_eq!(bare.final_draft, "");
    }

    #[test]
    fn decision_needs_json_and_agent() {
        assert!(matches!(Decision::read("{not json"), Err(DecisionError::NotJson(_))));
        assert!(matches!(
            Decision::read(r#"{"step_4": {"final_draft": "x"}}"#),
            Err(DecisionError::MissingAgent)
        ));
        assert!(matches!(Decision::read(r#"{"Agent": 3}"#), Err(DecisionError::MissingAgent)));
    }

    #[test]
    fn schema_requires_every_field() {
        let schema = DecisionArtifact::schema();
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(schema["required"], json!(["step_1", "step_2", "Agent", "step_3", "step_4"]));
        assert_eq!(
            schema["properties"]["step_4"]["required"],
            json!(["agent_alignment", "final_draft"])
        );
        assert_eq!(schema["properties"]["step_1"]["additionalProperties"], json!(false));
    }
}
