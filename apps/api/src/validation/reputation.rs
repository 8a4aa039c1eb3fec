//! Heuristic sender-side reputation for an address, independent of whether
//! the mailbox exists. Blended into decision-maker scores so obviously
//! personal or throwaway addresses rank below corporate ones.

const FREE_PROVIDERS: [&str; 4] = ["gmail.com", "yahoo.com", "hotmail.com", "outlook.com"];
const CORPORATE_KEYWORDS: [&str; 5] = ["corp", "inc", "llc", "ltd", "company"];
const SUSPICIOUS_RUNS: [&str; 3] = ["..", "++", "--"];

/// Scores an address in [0, 1] from domain and local-part shape alone.
pub fn reputation_score(email: &str) -> f64 {
    let mut score: f64 = 0.5;

    let email_lower = email.to_lowercase();
    let (local, domain) = match email_lower.split_once('@') {
        Some(parts) => parts,
        None => return 0.0,
    };

    if FREE_PROVIDERS.contains(&domain) {
        score -= 0.2;
    }
    if CORPORATE_KEYWORDS.iter().any(|kw| domain.contains(kw)) {
        score += 0.2;
    }
    if SUSPICIOUS_RUNS.iter().any(|run| email_lower.contains(run)) {
        score -= 0.3;
    }
    if local.contains('.') || local.contains('_') {
        score += 0.1;
    }

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_address_scores_baseline() {
        assert!((reputation_score("sarah@acme.io") - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_free_provider_penalized() {
        assert!((reputation_score("sarah@gmail.com") - 0.3).abs() < f64::EPSILON);
        assert!((reputation_score("sarah@outlook.com") - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_free_provider_match_is_exact_domain() {
        // A company domain that merely contains a provider name is not a
        // free mailbox.
        assert!((reputation_score("sarah@gmailhosting.com") - 0.5).abs() < f64::EPSILON);
        assert!((reputation_score("sarah@mail.gmail.com.example.org") - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_corporate_domain_rewarded() {
        // +0.2 corp keyword, +0.1 dotted local part
        assert!((reputation_score("sarah.johnson@techcorp.com") - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_suspicious_runs_penalized() {
        assert!(reputation_score("sarah..johnson@acme.io") < 0.5);
        assert!(reputation_score("a--b@acme.io") < 0.5);
    }

    #[test]
    fn test_score_is_clamped() {
        let score = reputation_score("a..b--c@gmail.com");
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_missing_at_sign_scores_zero() {
        assert!((reputation_score("not-an-email") - 0.0).abs() < f64::EPSILON);
    }
}
