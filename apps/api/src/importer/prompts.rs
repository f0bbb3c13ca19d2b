// Import pipeline LLM prompt templates.

pub const IMPORT_EXTRACT_PROMPT: &str = r#"Extract the job application details from the job posting below.

SOURCE URL:
{url}

PAGE TEXT:
{page_text}

OUTPUT SCHEMA (return exactly this structure):
{
  "companyName": "string" | null,
  "jobTitle": "string" | null,
  "location": "string" | null,
  "sourceUrl": "string",
  "status": "applied" | "interview" | "rejected" | "closed" | null,
  "applyTime": "YYYY-MM-DD" | null,
  "softSkills": "comma-separated string" | null,
  "skills": "comma-separated string" | null
}

RULES:
1. sourceUrl must be exactly the SOURCE URL given above.
2. softSkills are interpersonal skills; skills are role-required technical skills.
3. softSkills and skills are single comma-separated strings, not arrays.
4. Use null for any value the posting does not state.
5. Return ONLY the JSON object — nothing else, no code fences."#;

/// Fills the import template with the canonical URL and sanitized page text.
pub fn build_import_prompt(url: &str, page_text: &str) -> String {
    IMPORT_EXTRACT_PROMPT
        .replace("{url}", url)
        .replace("{page_text}", page_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_url_and_text() {
        let prompt = build_import_prompt("https://acme.example/jobs/7", "Rust Engineer at Acme");
        assert!(prompt.contains("SOURCE URL:\nhttps://acme.example/jobs/7"));
        assert!(prompt.contains("PAGE TEXT:\nRust Engineer at Acme"));
        assert!(!prompt.contains("{url}"));
        assert!(!prompt.contains("{page_text}"));
    }

    #[test]
    fn test_prompt_names_every_extracted_field() {
        let prompt = build_import_prompt("u", "t");
        for field in [
            "companyName",
            "jobTitle",
            "location",
            "sourceUrl",
            "status",
            "applyTime",
            "softSkills",
            "skills",
        ] {
            assert!(prompt.contains(field), "missing {field}");
        }
        assert!(prompt.contains("null"));
    }
}
