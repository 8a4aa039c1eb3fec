//! Decision-maker scoring — how likely a contact is to control website
//! spend, from their job title and the size of their company.
//!
//! The ladder is an ordered table of (keyword group → score) rules evaluated
//! first-match-wins, so the ordering stays auditable and testable on its own.

/// Score for titles matching none of the ladder's keyword groups.
const BASELINE_SCORE: f64 = 0.2;

enum GroupScore {
    Fixed(f64),
    /// Score depends on company headcount.
    BySize(fn(i32) -> f64),
}

struct TitleRule {
    keywords: &'static [&'static str],
    score: GroupScore,
}

/// Ordered ladder: the first group with a keyword contained in the
/// (lowercased) title wins.
static TITLE_RULES: &[TitleRule] = &[
    // Executives: strong signal at small companies, weak at large ones —
    // CEOs of big companies rarely make website decisions.
    TitleRule {
        keywords: &["ceo", "founder", "owner", "president"],
        score: GroupScore::BySize(executive_score),
    },
    TitleRule {
        keywords: &["head of marketing", "marketing director", "vp marketing", "cmo"],
        score: GroupScore::Fixed(0.9),
    },
    TitleRule {
        keywords: &["head of growth", "growth director", "digital marketing"],
        score: GroupScore::Fixed(0.85),
    },
    TitleRule {
        keywords: &["marketing manager"],
        score: GroupScore::BySize(manager_score),
    },
    // Sales leadership is sometimes involved in website decisions.
    TitleRule {
        keywords: &["head of sales", "sales director", "vp sales"],
        score: GroupScore::Fixed(0.6),
    },
];

fn executive_score(company_size: i32) -> f64 {
    if company_size <= 50 {
        0.95
    } else if company_size <= 200 {
        0.75
    } else {
        0.4
    }
}

fn manager_score(company_size: i32) -> f64 {
    if company_size <= 100 {
        0.7
    } else {
        0.5
    }
}

/// Scores a job title's website-purchase authority, 0.0–1.0.
pub fn decision_maker_score(job_title: &str, company_size: i32) -> f64 {
    let title_lower = job_title.to_lowercase();

    for rule in TITLE_RULES {
        if rule.keywords.iter().any(|kw| title_lower.contains(kw)) {
            return match rule.score {
                GroupScore::Fixed(score) => score,
                GroupScore::BySize(f) => f(company_size),
            };
        }
    }

    BASELINE_SCORE
}

/// Job titles to target when searching for people at a company, tiered by
/// headcount: founders control website spend at small companies, marketing
/// leadership at larger ones. The tiers must stay aligned with the ladder
/// above for scoring consistency.
pub fn target_titles(employee_count: i32) -> &'static [&'static str] {
    if employee_count <= 50 {
        &["Founder", "CEO", "Co-Founder", "Owner"]
    } else if employee_count <= 200 {
        &[
            "Head of Marketing",
            "Marketing Director",
            "VP Marketing",
            "Founder",
            "CEO",
        ]
    } else {
        &[
            "Head of Marketing",
            "Marketing Director",
            "VP Marketing",
            "Chief Marketing Officer",
        ]
    }
}
