use tracing::info;
use wahlsim_core::{
    FinalDecision, MatchAssessment, Persona, QuestionnaireResponseSet, ReferenceCorpora, schema,
};

use super::{Stage, StageError, run_stage};
use crate::StructuredClient;

const SYSTEM_PROMPT: &str = "\
Du bist wieder die ursprüngliche Persona.
Triff auf Grundlage aller Informationen deine endgültige Wahlentscheidung, aus deiner \
eigenen Sicht und in deinen eigenen Worten.

Antworte ausschließlich mit einem JSON-Objekt gemäß dem vorgegebenen Schema. \
Kein Markdown, keine Erklärung.";

fn build_user_prompt(
    corpora: &ReferenceCorpora,
    persona: &Persona,
    answers: &QuestionnaireResponseSet,
    assessment: &MatchAssessment,
) -> String {
    format!(
        "PERSONA:\n\
         {persona}\n\
         \n\
         WAHLOMAT-ANTWORTEN:\n\
         {answers}\n\
         \n\
         PARTEI-MATCHES & ANALYSE:\n\
         {assessment}\n\
         \n\
         AKTUELLE NACHRICHTEN:\n\
         {news}\n\
         \n\
         PARTEIPROGRAMME:\n\
         {programs}\n\
         \n\
         ANFORDERUNGEN:\n\
         1. Wähle genau EINE party aus: {parties}\n\
         2. justification: 10-200 Wörter (50-1000 Zeichen), aus Sicht der Persona, \
         mit Bezug auf die Wahl-O-Mat-Ergebnisse UND aktuelle Entwicklungen\n\
         3. certainty: ganze Zahl von 0 bis 100 (Prozent)",
        persona = persona.to_prompt_json(),
        answers = answers.to_prompt_json(),
        assessment = assessment.to_prompt_json(),
        news = corpora.news().trim(),
        programs = corpora.programs_text(),
        parties = corpora.parties().joined(),
    )
}

/// Stage 4: the persona picks one party.
pub async fn final_choice(
    client: &StructuredClient,
    corpora: &ReferenceCorpora,
    persona: &Persona,
    answers: &QuestionnaireResponseSet,
    assessment: &MatchAssessment,
) -> Result<FinalDecision, StageError> {
    let parties = corpora.parties();
    let decision = run_stage(
        client,
        Stage::FinalChoice,
        SYSTEM_PROMPT,
        &build_user_prompt(corpora, persona, answers, assessment),
        &schema::final_choice(parties),
        |value| FinalDecision::from_value(value, parties),
    )
    .await?;
    info!(party = decision.party(), certainty = decision.certainty(), "final choice made");
    Ok(decision)
}
