//! Fixed instructions sent ahead of user text to the generative-text model.

use std::fmt;
use std::str::FromStr;

use rocket::request::FromParam;

pub const CHAT_INSTRUCTION: &str =
    "You are a helpful assistant for health-related queries, focusing on stroke prevention and general well-being.";

const FOOD_INSTRUCTION: &str = "You are an AI nutrition expert. Provide a healthy food diet plan for stroke prevention. Be concise and actionable.";
const EXERCISE_INSTRUCTION: &str = "You are an AI fitness coach. Suggest an exercise routine for stroke prevention. Emphasize safety and moderation.";
const MEDICAL_INSTRUCTION: &str = "You are an AI medical advisor. Provide general medical advice or considerations for stroke prevention. Always advise consulting a doctor.";

/// Message parts for a context-free chat turn.
pub fn chat_parts(message: &str) -> Vec<String> {
    vec![CHAT_INSTRUCTION.to_string(), format!("User: {message}")]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    Food,
    Exercise,
    Medical,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown plan type `{0}`")]
pub struct UnknownPlan(pub String);

impl PlanKind {
    pub const ALL: [PlanKind; 3] = [PlanKind::Food, PlanKind::Exercise, PlanKind::Medical];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanKind::Food => "food",
            PlanKind::Exercise => "exercise",
            PlanKind::Medical => "medical",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            PlanKind::Food => FOOD_INSTRUCTION,
            PlanKind::Exercise => EXERCISE_INSTRUCTION,
            PlanKind::Medical => MEDICAL_INSTRUCTION,
        }
    }

    pub fn parts(&self, input: &str) -> Vec<String> {
        vec![self.instruction().to_string(), format!("User Input: {input}")]
    }
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanKind {
    type Err = UnknownPlan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlanKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownPlan(s.to_string()))
    }
}

impl<'a> FromParam<'a> for PlanKind {
    type Error = UnknownPlan;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_plans_only() {
        assert_eq!("food".parse::<PlanKind>(), Ok(PlanKind::Food));
        assert_eq!("exercise".parse::<PlanKind>(), Ok(PlanKind::Exercise));
        assert_eq!("medical".parse::<PlanKind>(), Ok(PlanKind::Medical));
        assert!("Food".parse::<PlanKind>().is_err());
        assert!("sleep".parse::<PlanKind>().is_err());
    }

    #[test]
    fn each_plan_has_its_own_instruction() {
        let food = PlanKind::Food.instruction();
        let exercise = PlanKind::Exercise.instruction();
        let medical = PlanKind::Medical.instruction();
        assert_ne!(food, exercise);
        assert_ne!(exercise, medical);
        assert!(medical.contains("consulting a doctor"));
    }

    #[test]
    fn parts_put_instruction_first() {
        let parts = PlanKind::Exercise.parts("I walk daily");
        assert_eq!(parts, vec![EXERCISE_INSTRUCTION.to_string(), "User Input: I walk daily".to_string()]);
        assert_eq!(chat_parts("hi")[1], "User: hi");
    }
}
