//! Rule-based lead scoring
//!
//! Five capped categories add up to a 0..=100 total: contact info (20),
//! project value (30), urgency (25), engagement (15) and company size (10).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadflow_shared::{Lead, LeadGrade, LeadPriority, LeadScore, ScoreBreakdown};
use uuid::Uuid;

use super::LeadScorer;

const URGENCY_KEYWORDS: [&str; 12] = [
    "urgent",
    "asap",
    "immediately",
    "rush",
    "emergency",
    "deadline",
    "soon",
    "quickly",
    "fast",
    "priority",
    "time-sensitive",
    "hurry",
];

const PERSONAL_DOMAINS: [&str; 5] = [
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
];

const ENTERPRISE_DOMAINS: [&str; 10] = [
    ".gov",
    ".edu",
    ".org",
    "microsoft.com",
    "google.com",
    "amazon.com",
    "apple.com",
    "salesforce.com",
    "oracle.com",
    "ibm.com",
];

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("lead {0} cannot be scored: {1}")]
    Unscorable(Uuid, String),
    #[error("scoring backend unavailable: {0}")]
    Unavailable(String),
}

/// Signals pulled out of a lead before scoring
#[derive(Debug, Clone)]
struct ScoringCriteria {
    has_phone: bool,
    has_company: bool,
    email_domain: String,
    budget: String,
    project_type: String,
    timeline: String,
    hours_since_inquiry: f64,
    keywords: Vec<&'static str>,
    newsletter_opt_in: bool,
    allow_follow_up: bool,
    message_length: usize,
    company_domain: String,
    estimated_employees: u32,
}

impl ScoringCriteria {
    fn from_lead(lead: &Lead, now: DateTime<Utc>) -> Self {
        let message = lead.message.to_lowercase();
        let email_domain = lead.email_domain().to_lowercase();
        let company_domain = if lead.company.is_empty() {
            email_domain.clone()
        } else {
            let slug: String = lead
                .company
                .to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect();
            format!("{}.com", slug)
        };

        Self {
            has_phone: lead.phone.as_deref().is_some_and(|p| !p.trim().is_empty()),
            has_company: !lead.company.trim().is_empty(),
            email_domain,
            budget: lead.budget.clone().unwrap_or_default(),
            project_type: lead.project_type.clone().unwrap_or_default(),
            timeline: lead.timeline.clone().unwrap_or_default(),
            hours_since_inquiry: (now - lead.created_at).num_seconds().max(0) as f64 / 3600.0,
            keywords: URGENCY_KEYWORDS
                .into_iter()
                .filter(|k| message.contains(k))
                .collect(),
            newsletter_opt_in: lead.added_to_newsletter,
            allow_follow_up: lead.allow_follow_up,
            message_length: lead.message.chars().count(),
            company_domain,
            estimated_employees: estimate_employees(&lead.company),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeuristicLeadScorer;

impl HeuristicLeadScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score as of `now`; lead age feeds the urgency category
    pub fn score_at(&self, lead: &Lead, now: DateTime<Utc>) -> Result<LeadScore, ScoringError> {
        if lead.email.trim().is_empty() && lead.phone.is_none() {
            return Err(ScoringError::Unscorable(
                lead.id,
                "no contact channel".to_string(),
            ));
        }

        let criteria = ScoringCriteria::from_lead(lead, now);
        let breakdown = ScoreBreakdown {
            contact_info: score_contact_info(&criteria),
            project_value: score_project_value(&criteria),
            urgency: score_urgency(&criteria),
            engagement: score_engagement(&criteria),
            company_size: score_company_size(&criteria),
        };
        let total = breakdown.total().min(100);

        Ok(LeadScore {
            lead_id: lead.id,
            total,
            grade: grade(total),
            priority: priority(total, &criteria),
            recommendations: recommendations(total, &criteria),
            breakdown,
        })
    }
}

#[async_trait]
impl LeadScorer for HeuristicLeadScorer {
    async fn score(&self, lead: &Lead) -> Result<LeadScore, ScoringError> {
        self.score_at(lead, Utc::now())
    }
}

fn score_contact_info(c: &ScoringCriteria) -> u32 {
    let mut score = 0;
    if c.has_phone {
        score += 5;
    }
    if c.has_company {
        score += 10;
    }
    if !c.email_domain.is_empty() && !PERSONAL_DOMAINS.contains(&c.email_domain.as_str()) {
        score += 5;
    }
    score.min(20)
}

fn score_project_value(c: &ScoringCriteria) -> u32 {
    (score_budget(&c.budget) + score_project_type(&c.project_type) + score_timeline(&c.timeline))
        .min(30)
}

fn score_urgency(c: &ScoringCriteria) -> u32 {
    let mut score = if c.hours_since_inquiry <= 1.0 {
        15
    } else if c.hours_since_inquiry <= 4.0 {
        10
    } else if c.hours_since_inquiry <= 24.0 {
        5
    } else {
        0
    };
    score += c.keywords.len() as u32 * 2;
    score.min(25)
}

fn score_engagement(c: &ScoringCriteria) -> u32 {
    let mut score = 0;
    if c.newsletter_opt_in {
        score += 5;
    }
    if c.allow_follow_up {
        score += 5;
    }
    score += match c.message_length {
        n if n > 200 => 5,
        n if n > 100 => 3,
        n if n > 50 => 1,
        _ => 0,
    };
    score.min(15)
}

fn score_company_size(c: &ScoringCriteria) -> u32 {
    let mut score = 0;
    if ENTERPRISE_DOMAINS.iter().any(|d| c.company_domain.contains(d)) {
        score += 5;
    }
    score += match c.estimated_employees {
        n if n > 1000 => 5,
        n if n > 100 => 3,
        n if n > 10 => 1,
        _ => 0,
    };
    score.min(10)
}

fn score_budget(budget: &str) -> u32 {
    let budget = budget.to_lowercase();
    let mentions = |a: &str, b: &str| budget.contains(a) || budget.contains(b);

    if mentions("50,000", "50k") {
        15
    } else if mentions("25,000", "25k") {
        12
    } else if mentions("10,000", "10k") {
        10
    } else if mentions("5,000", "5k") {
        7
    } else if mentions("2,000", "2k") {
        5
    } else if mentions("1,000", "1k") {
        3
    } else {
        0
    }
}

fn score_project_type(project_type: &str) -> u32 {
    let kind = project_type.to_lowercase();
    let any = |words: &[&str]| words.iter().any(|w| kind.contains(w));

    if any(&["website development", "web application", "enterprise"]) {
        8
    } else if any(&["content strategy", "marketing campaign", "technical documentation"]) {
        6
    } else if any(&["content writing", "copywriting", "blog writing"]) {
        4
    } else if any(&["editing", "proofreading"]) {
        2
    } else {
        0
    }
}

fn score_timeline(timeline: &str) -> u32 {
    let timeline = timeline.to_lowercase();
    let any = |words: &[&str]| words.iter().any(|w| timeline.contains(w));

    if any(&["asap", "urgent", "immediately"]) {
        7
    } else if any(&["1 week", "one week"]) {
        6
    } else if any(&["2 week", "two week"]) {
        5
    } else if any(&["1 month", "one month"]) {
        4
    } else if any(&["2 month", "two month"]) {
        3
    } else {
        2
    }
}

fn estimate_employees(company: &str) -> u32 {
    let company = company.to_lowercase();
    let any = |words: &[&str]| words.iter().any(|w| company.contains(w));

    if any(&["corporation", "international", "global", "enterprises"]) {
        5000
    } else if any(&["solutions", "systems", "technologies"]) {
        500
    } else if any(&["group", "associates", "partners"]) {
        100
    } else if any(&["studio", "agency", "consulting"]) {
        25
    } else {
        10
    }
}

fn grade(total: u32) -> LeadGrade {
    match total {
        80.. => LeadGrade::A,
        60..=79 => LeadGrade::B,
        40..=59 => LeadGrade::C,
        _ => LeadGrade::D,
    }
}

fn priority(total: u32, c: &ScoringCriteria) -> LeadPriority {
    let time_sensitive = c
        .keywords
        .iter()
        .any(|k| matches!(*k, "urgent" | "asap" | "immediately"));
    if time_sensitive || c.hours_since_inquiry <= 1.0 {
        return LeadPriority::Urgent;
    }

    match total {
        80.. => LeadPriority::Urgent,
        60..=79 => LeadPriority::High,
        40..=59 => LeadPriority::Medium,
        _ => LeadPriority::Low,
    }
}

fn recommendations(total: u32, c: &ScoringCriteria) -> Vec<String> {
    let mut out = Vec::new();
    let mut push = |text: &str| out.push(text.to_string());

    if total >= 80 {
        push("Top priority lead - contact within 1 hour");
        push("Schedule a call immediately");
    } else if total >= 60 {
        push("High-value lead - contact within 4 hours");
        push("Prepare custom proposal");
    }

    if !c.has_phone {
        push("Request phone number for faster communication");
    }
    if !c.has_company {
        push("Ask about company details and team size");
    }
    if c.budget.is_empty() {
        push("Discuss budget range and project scope");
    }
    if c.message_length < 50 {
        push("Gather more project requirements and details");
    }
    if !c.newsletter_opt_in {
        push("Invite to newsletter for ongoing engagement");
    }
    if !c.keywords.is_empty() {
        push("Lead expressed urgency - prioritize response");
    }
    if c.hours_since_inquiry > 24.0 {
        push("Lead is aging - follow up with value-driven message");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn strong_lead() -> Lead {
        let mut lead = Lead::new("Grace Hopper", "grace@navy.gov");
        lead.company = "Global Systems Corporation".to_string();
        lead.phone = Some("+1 555 0100".to_string());
        lead.budget = Some("$50,000+".to_string());
        lead.project_type = Some("Enterprise documentation".to_string());
        lead.timeline = Some("ASAP".to_string());
        lead.message = "We need this urgent. ".repeat(12);
        lead.added_to_newsletter = true;
        lead.allow_follow_up = true;
        lead
    }

    #[test]
    fn test_strong_fresh_lead_grades_a() {
        let lead = strong_lead();
        let score = HeuristicLeadScorer::new().score_at(&lead, lead.created_at).unwrap();

        assert_eq!(score.breakdown.contact_info, 20);
        assert_eq!(score.breakdown.project_value, 30);
        assert_eq!(score.breakdown.urgency, 17);
        assert_eq!(score.breakdown.engagement, 15);
        assert_eq!(score.breakdown.company_size, 5);
        assert_eq!(score.total, 87);
        assert_eq!(score.grade, LeadGrade::A);
        assert_eq!(score.priority, LeadPriority::Urgent);
        assert!(score.recommendations[0].starts_with("Top priority"));
    }

    #[test]
    fn test_sparse_aging_lead() {
        let lead = Lead::new("Sam", "sam@gmail.com");
        let score = HeuristicLeadScorer::new()
            .score_at(&lead, lead.created_at + Duration::hours(48))
            .unwrap();

        // timeline default only
        assert_eq!(score.breakdown.project_value, 2);
        assert_eq!(score.breakdown.contact_info, 0);
        assert_eq!(score.breakdown.urgency, 0);
        assert_eq!(score.grade, LeadGrade::D);
        assert_eq!(score.priority, LeadPriority::Low);
        assert!(score
            .recommendations
            .iter()
            .any(|r| r.starts_with("Lead is aging")));
        assert!(score
            .recommendations
            .iter()
            .any(|r| r.starts_with("Discuss budget")));
    }

    #[test]
    fn test_total_is_bounded() {
        let lead = strong_lead();
        let score = HeuristicLeadScorer::new().score_at(&lead, lead.created_at).unwrap();
        assert!(score.total <= 100);
        assert_eq!(score.total, score.breakdown.total());
    }

    #[test]
    fn test_lead_without_contact_is_unscorable() {
        let lead = Lead::new("Nobody", " ");
        assert!(matches!(
            HeuristicLeadScorer::new().score_at(&lead, Utc::now()),
            Err(ScoringError::Unscorable(_, _))
        ));
    }
}
