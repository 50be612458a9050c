use tracing::info;
use wahlsim_core::{MatchAssessment, Persona, QuestionnaireResponseSet, ReferenceCorpora, schema};

use super::{Stage, StageError, run_stage};
use crate::StructuredClient;

const SYSTEM_PROMPT: &str = "\
Du bist ein neutraler Wahlexperte und Politikwissenschaftler.
Du vergleichst Wahl-O-Mat-Antworten mit den Positionen der Parteien und berechnest die \
Übereinstimmung.

Antworte ausschließlich mit einem JSON-Objekt gemäß dem vorgegebenen Schema. \
Kein Markdown, keine Erklärung.";

fn build_user_prompt(
    corpora: &ReferenceCorpora,
    persona: &Persona,
    answers: &QuestionnaireResponseSet,
) -> String {
    format!(
        "PERSONA:\n\
         {persona}\n\
         \n\
         WAHLOMAT-ANTWORTEN:\n\
         {answers}\n\
         \n\
         PARTEIPROGRAMME:\n\
         {programs}\n\
         \n\
         ANFORDERUNGEN:\n\
         1. Berechne für jede Partei einen Match-Wert von 0 bis 100 (Prozent):\n\
         \x20  - genau diese Schlüssel in matches: {parties}\n\
         \x20  - berücksichtige Positionen UND Begründungen\n\
         \x20  - runde auf 2 Dezimalstellen\n\
         2. Schreibe eine ausführliche analysis (20-400 Wörter, 100-2000 Zeichen):\n\
         \x20  - erkläre Übereinstimmungen und Unterschiede\n\
         \x20  - bleibe neutral und faktenbasiert",
        persona = persona.to_prompt_json(),
        answers = answers.to_prompt_json(),
        programs = corpora.programs_text(),
        parties = corpora.parties().joined(),
    )
}

/// Stage 3: score the persona's answers against every party.
pub async fn judge_matches(
    client: &StructuredClient,
    corpora: &ReferenceCorpora,
    persona: &Persona,
    answers: &QuestionnaireResponseSet,
) -> Result<MatchAssessment, StageError> {
    let parties = corpora.parties();
    let assessment = run_stage(
        client,
        Stage::Judge,
        SYSTEM_PROMPT,
        &build_user_prompt(corpora, persona, answers),
        &schema::judge(parties),
        |value| MatchAssessment::from_value(value, parties),
    )
    .await?;
    info!(top = assessment.top_party().unwrap_or("-"), "matches judged");
    Ok(assessment)
}
