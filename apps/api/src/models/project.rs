use serde::{Deserialize, Serialize};

/// A thesis project always carries exactly this many specific objectives.
pub const SPECIFIC_OBJECTIVE_COUNT: usize = 3;

/// Project record collected at the second wizard step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub topic: String,
    pub general_objective: String,
    /// Fixed-size and ordered; blank slots are rejected by validation, not by the type.
    pub specific_objectives: [String; SPECIFIC_OBJECTIVE_COUNT],
}

/// Partial edit of a `ProjectInfo`.
///
/// `specific_objectives` is a three-slot array so a client can rewrite one
/// objective (`[null, "…", null]`) without resending the others.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    pub topic: Option<String>,
    pub general_objective: Option<String>,
    pub specific_objectives: Option<[Option<String>; SPECIFIC_OBJECTIVE_COUNT]>,
}

/// Drafted objectives returned by the AI assist "suggest" operation.
///
/// Transient: merged into the project record, then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiSuggestion {
    pub general_objective: String,
    pub specific_objectives: Vec<String>,
}

impl AiSuggestion {
    /// Overwrites the general and specific objectives of `project` entirely.
    ///
    /// Extra objectives are ignored; missing ones leave blank slots for the user to fill.
    pub fn apply_to(self, project: &mut ProjectInfo) {
        project.general_objective = self.general_objective;
        let mut incoming = self.specific_objectives.into_iter();
        for slot in project.specific_objectives.iter_mut() {
            *slot = incoming.next().unwrap_or_default();
        }
    }
}
