// src/services/prompt.rs

/// Builds the instruction sent to the model for `topic`.
///
/// The topic is embedded verbatim. It is neither escaped nor trimmed, so a
/// topic can steer the model away from the instructions around it.
pub fn build_quiz_prompt(topic: &str) -> String {
    format!(
        r#"
        You are a quiz API. Return a raw JSON Array of 5 multiple-choice questions about: {topic}.

        Strict Rules:
        1. Return ONLY valid JSON.
        2. Do not use Markdown formatting (no ```json).
        3. The output must be a list of objects.

        JSON Structure:
        [
            {{
                "question": "Question text?",
                "options": ["A", "B", "C", "D"],
                "correctIndex": 0
            }}
        ]
        "#
    )
}
