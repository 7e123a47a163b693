// Analysis LLM prompt templates.

pub const ANALYSIS_SYSTEM: &str = "\
You are an expert in ATS (Applicant Tracking System) screening and resume review. \
You MUST respond with valid JSON only — no markdown fences, no explanations.";

/// The JSON shape the model is asked to return. Only `overallScore` and `ATS`
/// are enforced on the way back in.
pub const FEEDBACK_FORMAT: &str = r#"{
  "overallScore": number, // max 100
  "ATS": {
    "score": number, // rate based on ATS suitability
    "tips": [
      {
        "type": "good" | "improve",
        "tip": string // 3-4 tips
      }
    ]
  },
  "toneAndStyle": {
    "score": number, // max 100
    "tips": [
      {
        "type": "good" | "improve",
        "tip": string, // short title
        "explanation": string // detailed explanation
      }
    ] // 3-4 tips
  },
  "content": {
    "score": number, // max 100
    "tips": [{"type": "good" | "improve", "tip": string, "explanation": string}]
  },
  "structure": {
    "score": number, // max 100
    "tips": [{"type": "good" | "improve", "tip": string, "explanation": string}]
  },
  "skills": {
    "score": number, // max 100
    "tips": [{"type": "good" | "improve", "tip": string, "explanation": string}]
  }
}"#;

pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze and rate the attached resume and suggest how to improve it.

The rating can be low if the resume is weak. Be thorough and point out every mistake
or area for improvement; low scores are fine if there is a lot to improve.
Use the job description below, when provided, to make the feedback specific to the role.

JOB TITLE:
{job_title}

JOB DESCRIPTION:
{job_description}

OUTPUT SCHEMA (return exactly this structure):
{format}

RULES:
1. Every score is an integer from 0 to 100.
2. Return ONLY the JSON object — nothing else, no code fences."#;

/// Builds the instruction string sent alongside the uploaded resume.
pub fn prepare_instructions(job_title: &str, job_description: &str) -> String {
    fill_template(
        ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("{job_title}", or_not_provided(job_title)),
            ("{job_description}", or_not_provided(job_description)),
            ("{format}", FEEDBACK_FORMAT),
        ],
    )
}

/// Substitutes placeholders in a single left-to-right pass. Inserted values are
/// never scanned again, so user text containing `{...}` stays as written.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(placeholder, _)| tail.starts_with(placeholder)) {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn or_not_provided(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        "(not provided)"
    } else {
        value
    }
}
