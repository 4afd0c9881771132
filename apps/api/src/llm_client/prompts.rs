// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// System instruction that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "Tu es un assistant académique précis et structuré. \
    Tu DOIS répondre uniquement avec un objet JSON valide. \
    N'ajoute aucun texte en dehors de l'objet JSON. \
    N'utilise pas de blocs de code markdown. \
    N'ajoute ni explication ni excuse.";
