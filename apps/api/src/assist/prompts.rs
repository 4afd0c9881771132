// Prompt templates and response schemas for the AI assist operations.
// Placeholders are replaced before sending; see `assist::render_*`.

use serde_json::{json, Value};

/// Drafting is allowed some creativity.
pub const SUGGEST_TEMPERATURE: f64 = 0.7;

/// Rewriting should stay close to the student's own text.
pub const IMPROVE_TEMPERATURE: f64 = 0.4;

/// Suggest prompt. Replace `{major}` and `{topic}` before sending.
pub const SUGGEST_PROMPT_TEMPLATE: &str = r#"Je suis un étudiant en {major}.
Mon sujet de mémoire est : "{topic}".
Propose-moi un objectif général académique solide et 3 objectifs spécifiques pertinents pour ce travail.
Réponds uniquement au format JSON."#;

/// Improve prompt. Replace `{major}`, `{topic}`, `{general_objective}` and
/// `{specific_objectives}` (a JSON array) before sending.
pub const IMPROVE_PROMPT_TEMPLATE: &str = r#"Agis comme un expert académique et professeur de méthodologie de recherche.
Je suis étudiant en "{major}".
Voici mes ébauches pour mon mémoire :
- Sujet : "{topic}"
- Objectif Général : "{general_objective}"
- Objectifs Spécifiques : {specific_objectives}

Ta mission : Reformule et améliore ces textes pour qu'ils soient plus académiques, précis et professionnels.
Ne change pas le sens de mon travail, mais améliore le vocabulaire et la structure.
Si le sujet est mal formulé, propose une version plus proche d'un titre de mémoire.
Réponds uniquement au format JSON contenant les versions améliorées."#;

pub fn suggest_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "generalObjective": {
                "type": "STRING",
                "description": "Un objectif général académique concis et professionnel."
            },
            "specificObjectives": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Exactement 3 objectifs spécifiques opérationnels."
            }
        },
        "required": ["generalObjective", "specificObjectives"]
    })
}

pub fn improve_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "topic": {
                "type": "STRING",
                "description": "Le sujet du mémoire reformulé de manière académique."
            },
            "generalObjective": {
                "type": "STRING",
                "description": "L'objectif général amélioré."
            },
            "specificObjectives": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Les 3 objectifs spécifiques reformulés."
            }
        },
        "required": ["topic", "generalObjective", "specificObjectives"]
    })
}
