pub mod project;
pub mod student;

pub use project::{AiSuggestion, ProjectInfo, ProjectPatch, SPECIFIC_OBJECTIVE_COUNT};
pub use student::{StudentInfo, StudentPatch};
