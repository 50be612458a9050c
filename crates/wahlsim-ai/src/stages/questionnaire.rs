use tracing::info;
use wahlsim_core::{Persona, QuestionnaireResponseSet, ReferenceCorpora, schema};

use super::{Stage, StageError, run_stage};
use crate::StructuredClient;

const SYSTEM_PROMPT: &str = "\
Du bist die beschriebene Persona und füllst den Wahl-O-Mat aus.
Bleibe durchgehend in der Rolle und antworte konsistent zu ihrer politischen Einstellung.

Antworte ausschließlich mit einem JSON-Objekt gemäß dem vorgegebenen Schema. \
Kein Markdown, keine Erklärung.";

fn build_user_prompt(corpora: &ReferenceCorpora, persona: &Persona) -> String {
    format!(
        "PERSONA:\n\
         {persona}\n\
         \n\
         AKTUELLE NACHRICHTEN:\n\
         {news}\n\
         \n\
         PARTEIPROGRAMME (für Kontext):\n\
         {programs}\n\
         \n\
         THESEN:\n\
         {questions}\n\
         \n\
         ANFORDERUNGEN:\n\
         1. Beantworte ALLE {count} Thesen, jede question_id genau einmal\n\
         2. Pro These:\n\
         \x20  - stance: -1 (dagegen), 0 (neutral) oder 1 (dafür)\n\
         \x20  - justification: 20-500 Zeichen, aus Sicht der Persona\n\
         3. Bleibe konsistent zur politischen Einstellung der Persona\n\
         4. Berücksichtige aktuelle Entwicklungen",
        persona = persona.to_prompt_json(),
        news = corpora.news().trim(),
        programs = corpora.programs_text(),
        questions = corpora.questions().to_prompt_json(),
        count = corpora.questions().len(),
    )
}

/// Stage 2: the persona answers every question.
pub async fn answer_questionnaire(
    client: &StructuredClient,
    corpora: &ReferenceCorpora,
    persona: &Persona,
) -> Result<QuestionnaireResponseSet, StageError> {
    let answers = run_stage(
        client,
        Stage::Questionnaire,
        SYSTEM_PROMPT,
        &build_user_prompt(corpora, persona),
        &schema::questionnaire(),
        QuestionnaireResponseSet::from_value,
    )
    .await?;
    info!(answers = answers.answers().len(), "questionnaire answered");
    Ok(answers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, answers_json, persona_json, sample_corpora};
    use std::sync::Arc;
    use wahlsim_core::{GenerationConfig, Stance};

    fn persona() -> Persona {
        Persona::from_value(persona_json()).unwrap()
    }

    #[test]
    fn prompt_lists_questions_and_programs() {
        let prompt = build_user_prompt(&sample_corpora(), &persona());
        assert!(prompt.contains("Jonas Berger"));
        assert!(prompt.contains("These 35"));
        assert!(prompt.contains("## AFD\nProgramm der Partei AFD."));
        assert!(prompt.contains("ALLE 35 Thesen"));
    }

    #[tokio::test]
    async fn returns_all_answers() {
        let transport = Arc::new(ScriptedTransport::valid());
        let client = StructuredClient::new(transport, GenerationConfig::default());
        let answers = answer_questionnaire(&client, &sample_corpora(), &persona())
            .await
            .unwrap();
        assert_eq!(answers.answers().len(), 35);
        assert_eq!(answers.get(2).map(|a| a.stance()), Some(Stance::For));
    }

    #[tokio::test]
    async fn missing_question_is_a_validation_failure() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| {
            let mut value = answers_json();
            if let Some(answers) = value["answers"].as_array_mut() {
                answers.retain(|a| a["question_id"] != 17);
            }
            Ok(value.to_string())
        }));
        let client = StructuredClient::new(transport.clone(), GenerationConfig::default());
        let err = answer_questionnaire(&client, &sample_corpora(), &persona())
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Validation(_)));
        // Validation failures are not retried by the client.
        assert_eq!(transport.calls(), 1);
    }
}
