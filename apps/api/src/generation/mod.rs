// Resume tailoring: AI-generated resume and cover letter for one job.
// All provider calls go through llm_client; nothing here talks to an API directly.

pub mod handlers;
pub mod tailor;
