// Prompt constants for the generator agents.
// JSON-only output is enforced with llm_client::prompts::json_system.

/// System prompt for job description generation.
pub const JD_SYSTEM: &str = "You are an expert HR professional and job description writer.";

/// JD prompt template. Replace `{role}`, `{skills}`, `{experience}`, `{budget}`
/// and `{company_info}` before sending.
pub const JD_PROMPT_TEMPLATE: &str = r#"Create a comprehensive job description based on the following requirements:

Role: {role}
Required Skills: {skills}
Experience Level: {experience}
Budget Range: {budget}
Company Info: {company_info}

Return a JSON object with this EXACT schema:
{
  "title": "Senior Backend Engineer",
  "department": "Engineering",
  "location": "Remote (US)",
  "job_type": "Full-time",
  "salary_range": "$150,000 - $180,000",
  "summary": "One paragraph describing the role and its impact.",
  "responsibilities": ["Design and operate core services"],
  "requirements": ["5+ years building production backends"],
  "preferred_qualifications": ["Experience with event-driven systems"],
  "benefits": ["Comprehensive health coverage"],
  "application_process": "How candidates apply and what happens next."
}

Make the job description compelling, inclusive, and optimized for attracting top talent.
Include competitive benefits and a clear application process."#;

/// System prompt for hiring checklist generation.
pub const CHECKLIST_SYSTEM: &str = "You are an expert HR hiring specialist.";

/// Checklist prompt template. Replace `{role}`, `{skills}`, `{experience}`,
/// `{timeline}` and `{company_info}` before sending.
pub const CHECKLIST_PROMPT_TEMPLATE: &str = r#"Create a comprehensive hiring checklist for the following role:

Role: {role}
Required Skills: {skills}
Experience Level: {experience}
Hiring Timeline: {timeline}
Company Info: {company_info}

Return a JSON object with this EXACT schema:
{
  "steps": [
    {"name": "Define role requirements", "description": "Align with the hiring manager", "timeline": "Week 1", "owner": "Hiring Manager"}
  ],
  "estimated_timeline": "6-8 weeks",
  "resources_needed": ["Applicant tracking system"],
  "success_metrics": ["Time to hire under 45 days"]
}

Include all stages from job posting to onboarding. Provide realistic timelines
and identify key resources needed at each stage. Focus on best practices for
attracting and evaluating diverse candidates."#;

/// System prompt for resume analysis. The analysis is free text.
pub const RESUME_ANALYSIS_SYSTEM: &str =
    "You are an experienced technical recruiter who assesses resumes candidly.";

/// Resume analysis template. Replace `{resume_text}` before sending.
pub const RESUME_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the following resume content and provide a comprehensive assessment:

{resume_text}

Please provide analysis in the following format:

## Summary
[Overall summary of the candidate]

## Skills Assessment
- Technical Skills: [list and assessment]
- Soft Skills: [list and assessment]

## Experience Level
[Years and quality of experience]

## Education
[Educational background assessment]

## Potential Roles
[Suggested roles this candidate would be good for]

## Recommendations
[Hiring recommendations and next steps]"#;
