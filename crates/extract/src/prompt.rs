use crate::schema::RequestedLocale;

pub fn build_system_prompt(locale: RequestedLocale) -> String {
    let language_rules = match locale {
        RequestedLocale::Default => "- Write every description, the genre and the writing style notes in English.",
        RequestedLocale::Alternate => {
            "- Write every description, the genre and the writing style values in Arabic.\n\
             - Keep the JSON keys exactly as shown, in English.\n\
             - Keep character names as they appear in the text."
        }
    };

    format!(
        r#"Analyze the following text and identify all characters and their interactions with each other.
For each character provide: name and a brief description. For each pair of characters that interact, describe the interaction and rate its strength.
Also predict the genre of the text and summarize its writing style.

Return the data in JSON format with this structure:
{{
  "characters": [
    {{"name": "Character Name", "description": "Brief description"}}
  ],
  "interactions": [
    {{"source": "Character Name", "target": "Other Character Name", "description": "Brief description of their interaction", "strength": 5}}
  ],
  "genre": "Predicted genre",
  "writingStyle": {{"formality": "Level of formality", "approach": "Narrative approach", "notes": "Other notable features"}}
}}

RULES:
- "strength" is an integer from 1 to 10, where 10 is the strongest connection.
- "source" and "target" must match a character "name" exactly.
{language_rules}
- Output ONLY the JSON object, no markdown, no explanations."#
    )
}
