use tracing::info;
use wahlsim_core::{Persona, ReferenceCorpora, VoterRecord, schema};

use super::{Stage, StageError, run_stage};
use crate::StructuredClient;

const SYSTEM_PROMPT: &str = "\
Du bist ein erfahrener Experte für Wählerprofile und Demografie.
Erstelle aus demografischen Umfragedaten eine realistische, detaillierte und in sich \
stimmige Persona einer wahlberechtigten Person in Deutschland.

Antworte ausschließlich mit einem JSON-Objekt gemäß dem vorgegebenen Schema. \
Kein Markdown, keine Erklärung.";

fn build_user_prompt(corpora: &ReferenceCorpora, voter: &VoterRecord) -> String {
    format!(
        "DEMOGRAFISCHE DATEN:\n\
         {voter}\n\
         \n\
         AKTUELLE NACHRICHTEN (für Kontext):\n\
         {news}\n\
         \n\
         ANFORDERUNGEN:\n\
         1. Erstelle eine konsistente, glaubwürdige Persona passend zu den Daten\n\
         2. Berücksichtige aktuelle politische Entwicklungen\n\
         3. Halte die Grenzen ein:\n\
         \x20  - age: 16-100 Jahre\n\
         \x20  - name, occupation, residence: 2-100 Zeichen\n\
         \x20  - description: 50-1000 Zeichen\n\
         \x20  - political_stance, voting_pattern: 20-500 Zeichen\n\
         \x20  - core_topics: 2-10 Einträge\n\
         \x20  - concerns, hopes: 1-10 Einträge",
        voter = voter.to_prompt_json(),
        news = corpora.news().trim(),
    )
}

/// Stage 1: demographic seed record to [`Persona`].
pub async fn generate_persona(
    client: &StructuredClient,
    corpora: &ReferenceCorpora,
    voter: &VoterRecord,
) -> Result<Persona, StageError> {
    let persona = run_stage(
        client,
        Stage::Persona,
        SYSTEM_PROMPT,
        &build_user_prompt(corpora, voter),
        &schema::persona(),
        Persona::from_value,
    )
    .await?;
    info!(name = persona.name(), age = persona.age(), "persona generated");
    Ok(persona)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, sample_corpora};
    use serde_json::json;
    use std::sync::Arc;
    use wahlsim_core::GenerationConfig;

    fn seed() -> VoterRecord {
        [
            ("age".to_string(), json!(34)),
            ("occupation".to_string(), json!("Lehrer")),
            ("region".to_string(), json!("Berlin")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn prompt_embeds_seed_and_news() {
        let prompt = build_user_prompt(&sample_corpora(), &seed());
        assert!(prompt.contains(r#""occupation":"Lehrer""#));
        assert!(prompt.contains("Nachrichten der Woche."));
        assert!(prompt.contains("   - age: 16-100 Jahre"));
    }

    #[tokio::test]
    async fn produces_validated_persona() {
        let transport = Arc::new(ScriptedTransport::new(|req, _| {
            assert!(req.user_prompt.contains("Berlin"));
            crate::testing::respond_valid(req)
        }));
        let client = StructuredClient::new(transport.clone(), GenerationConfig::default());
        let persona = generate_persona(&client, &sample_corpora(), &seed()).await.unwrap();
        assert_eq!(persona.age(), 34);
        assert_eq!(transport.schemas(), vec!["persona"]);
    }
}
