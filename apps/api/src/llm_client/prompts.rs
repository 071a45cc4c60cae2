// Prompt templates for resume tailoring and cover letters.
// Placeholders use {name} syntax and are filled with `str::replace`.

use super::{GenerationRequest, PromptKind};

pub const RESUME_SYSTEM: &str = "You are an expert resume writer. \
    You return only the requested document in Markdown, with no commentary.";

pub const COVER_LETTER_SYSTEM: &str = "You are an expert cover letter writer. \
    You return only the requested letter in Markdown, with no commentary.";

pub const TAILORED_RESUME_PROMPT_TEMPLATE: &str = "\
Tailor the following master resume for a specific job posting.

MASTER RESUME:
{master_resume}

JOB DESCRIPTION:
{job_description}

INSTRUCTIONS:
1. Keep the same overall structure and Markdown format, including any HTML/CSS styling
2. Keep every job in the Professional Experience section; do not remove any
3. Rewrite each job's bullet points to emphasize skills relevant to the target role
4. Work keywords from the job description naturally into the bullet points
5. Adjust the Professional Summary to highlight the most relevant experience
6. Reorder Technical Skills so the most relevant come first
7. Keep all job dates, titles and companies exactly as they appear
8. Keep the resume ATS-friendly

Return ONLY the tailored resume in Markdown format, no explanations.";

pub const COVER_LETTER_PROMPT_TEMPLATE: &str = "\
Write a compelling cover letter for the following job application.

RESUME:
{resume}

JOB DESCRIPTION:
{job_description}

COMPANY: {company}
POSITION: {job_title}
{greeting_instruction}

INSTRUCTIONS:
1. Open with genuine enthusiasm for the specific role and company
2. Connect 2-3 key experiences from the resume to the job requirements
3. Show knowledge of the company or its industry
4. Close with a clear call to action
5. Keep it to 3-4 paragraphs in a professional, personable tone
6. Do not include placeholder text such as [Current Date], [Your Name] or [Company Address]
7. Do not include an address header; start directly with the greeting
8. Take the applicant's name from the resume and use it in the signature

Return ONLY the cover letter in Markdown format, no explanations.";

pub const CONNECTION_TEST_SYSTEM: &str = "You are a connectivity check.";
pub const CONNECTION_TEST_PROMPT: &str = "Reply with the single word OK.";

pub struct RenderedPrompt {
    pub system: &'static str,
    pub user: String,
}

impl RenderedPrompt {
    /// System and user text in one block, for backends without a system role.
    pub fn combined(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

pub fn render(request: &GenerationRequest) -> RenderedPrompt {
    match request.kind {
        PromptKind::TailoredResume => RenderedPrompt {
            system: RESUME_SYSTEM,
            user: TAILORED_RESUME_PROMPT_TEMPLATE
                .replace("{master_resume}", &request.resume)
                .replace("{job_description}", &request.job_description),
        },
        PromptKind::CoverLetter => {
            let greeting_instruction = match request.hiring_manager.as_deref() {
                Some(name) => format!("HIRING MANAGER: {name} (use 'Dear {name},' as the greeting)"),
                None => "HIRING MANAGER: Unknown (use 'Dear Hiring Manager,' as the greeting)"
                    .to_string(),
            };
            RenderedPrompt {
                system: COVER_LETTER_SYSTEM,
                user: COVER_LETTER_PROMPT_TEMPLATE
                    .replace("{company}", &request.company)
                    .replace("{job_title}", &request.job_title)
                    .replace("{greeting_instruction}", &greeting_instruction)
                    // Free text last, so braces inside it are never treated as placeholders.
                    .replace("{job_description}", &request.job_description)
                    .replace("{resume}", &request.resume),
            }
        }
        PromptKind::ConnectionTest => RenderedPrompt {
            system: CONNECTION_TEST_SYSTEM,
            user: CONNECTION_TEST_PROMPT.to_string(),
        },
    }
}
