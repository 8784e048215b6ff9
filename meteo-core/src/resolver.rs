//! Location resolution with interactive disambiguation.
//!
//! Flow: search (bounded by `max_search_results`) → zero: not found, one: done,
//! many: offer the first `max_elicitation_options` candidates and wait for a choice.

use tracing::{debug, error, info, warn};

use crate::{
    config::Limits,
    elicitation::{ElicitationOutcome, ElicitationRequest, Elicitor, LocationChoice},
    error::{Error, Result},
    model::{LocationCandidate, ResolvedLocation},
    provider::LocationSearch,
};

pub struct LocationResolver<'a> {
    search: &'a dyn LocationSearch,
    max_search_results: usize,
    max_options: usize,
}

impl<'a> LocationResolver<'a> {
    pub fn new(search: &'a dyn LocationSearch, limits: &Limits) -> Self {
        Self {
            search,
            max_search_results: limits.max_search_results,
            max_options: limits.max_elicitation_options.min(limits.max_search_results),
        }
    }

    /// Resolve `query` to exactly one location, asking `elicitor` when it is ambiguous.
    pub async fn resolve(&self, query: &str, elicitor: &dyn Elicitor) -> Result<ResolvedLocation> {
        info!(query, "resolving location");

        let mut candidates = self.search.search(query, self.max_search_results).await?;
        info!(query, results = candidates.len(), "location search returned");

        if candidates.len() <= 1 {
            let Some(only) = candidates.pop() else {
                error!(query, "no locations found");
                return Err(Error::NotFound { query: query.to_string() });
            };
            info!(name = %only.name, country = %only.country, "single location found");
            return Ok(only.into());
        }

        warn!(query, results = candidates.len(), "multiple locations found, asking user");
        candidates.truncate(self.max_options);

        let request = ElicitationRequest {
            message: disambiguation_message(query, &candidates),
            schema: LocationChoice::schema(),
        };
        let outcome = elicitor.elicit(request).await?;

        let position = match outcome {
            ElicitationOutcome::Accept(Some(payload)) => {
                serde_json::from_value::<LocationChoice>(payload)
                    .map_err(|e| {
                        error!(query, error = %e, "selection payload does not match schema");
                        Error::Selection(format!("invalid selection payload: {e}"))
                    })?
                    .selected_location_id
            }
            other => {
                error!(query, outcome = ?other, "location selection was cancelled or invalid");
                return Err(Error::Selection(
                    "location selection was cancelled or invalid".to_string(),
                ));
            }
        };
        debug!(query, position, "user selected option");

        let index = position
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .filter(|i| *i < candidates.len())
            .ok_or_else(|| {
                error!(query, position, offered = candidates.len(), "selection out of range");
                Error::Selection(format!(
                    "invalid location selection {position}; choose a number from 1 to {}",
                    candidates.len()
                ))
            })?;

        let chosen = candidates.swap_remove(index);
        info!(name = %chosen.name, country = %chosen.country, "location resolved");
        Ok(chosen.into())
    }
}

fn disambiguation_message(query: &str, offered: &[LocationCandidate]) -> String {
    let options: Vec<String> = offered
        .iter()
        .enumerate()
        .map(|(i, c)| {
            debug!(option = i + 1, name = %c.name, country = %c.country, "offering location");
            option_line(i + 1, c)
        })
        .collect();

    format!(
        "Multiple locations found for '{query}':\n\n{}\n\nPlease select the correct location:",
        options.join("\n")
    )
}

/// `"2. Springfield, Illinois, Sangamon, United States (pop. 116,250)"`
pub fn option_line(position: usize, c: &LocationCandidate) -> String {
    let mut admin = Vec::new();
    if let Some(a1) = c.admin1.as_deref().filter(|s| !s.is_empty()) {
        admin.push(a1);
    }
    if let Some(a2) = c
        .admin2
        .as_deref()
        .filter(|s| !s.is_empty() && c.admin1.as_deref() != Some(*s))
    {
        admin.push(a2);
    }

    let admin = if admin.is_empty() { String::new() } else { format!(", {}", admin.join(", ")) };
    let population = match c.population {
        Some(p) if p > 0 => format!(" (pop. {})", thousands(p)),
        _ => String::new(),
    };

    format!("{position}. {}{admin}, {}{population}", c.name, c.country)
}

fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub(crate) struct FakeSearch {
        pub results: Vec<LocationCandidate>,
        pub limits_seen: Mutex<Vec<usize>>,
    }

    impl FakeSearch {
        pub(crate) fn with(results: Vec<LocationCandidate>) -> Self {
            Self { results, ..Default::default() }
        }
    }

    #[async_trait]
    impl LocationSearch for FakeSearch {
        async fn search(&self, _query: &str, limit: usize) -> Result<Vec<LocationCandidate>> {
            self.limits_seen.lock().unwrap().push(limit);
            Ok(self.results.iter().take(limit).cloned().collect())
        }
    }

    /// Records every prompt and answers with a fixed outcome.
    pub(crate) struct RecordingElicitor {
        pub outcome: ElicitationOutcome,
        pub requests: Mutex<Vec<ElicitationRequest>>,
    }

    impl RecordingElicitor {
        pub(crate) fn new(outcome: ElicitationOutcome) -> Self {
            Self { outcome, requests: Mutex::new(Vec::new()) }
        }

        pub(crate) fn choosing(position: i64) -> Self {
            Self::new(ElicitationOutcome::Accept(Some(
                serde_json::json!({ "selected_location_id": position }),
            )))
        }

        pub(crate) fn prompts(&self) -> Vec<ElicitationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Elicitor for RecordingElicitor {
        async fn elicit(&self, request: ElicitationRequest) -> Result<ElicitationOutcome> {
            self.requests.lock().unwrap().push(request);
            Ok(self.outcome.clone())
        }
    }

    pub(crate) fn candidate(id: i64, name: &str, admin1: Option<&str>, lat: f64) -> LocationCandidate {
        LocationCandidate {
            id,
            name: name.to_string(),
            latitude: lat,
            longitude: -89.0,
            country: "United States".to_string(),
            admin1: admin1.map(str::to_string),
            admin2: None,
            timezone: "America/Chicago".to_string(),
            population: None,
            elevation: None,
        }
    }

    fn springfields() -> Vec<LocationCandidate> {
        vec![
            candidate(1, "Springfield", Some("Illinois"), 39.80),
            candidate(2, "Springfield", Some("Missouri"), 37.21),
            candidate(3, "Springfield", Some("Massachusetts"), 42.10),
        ]
    }

    fn many(n: i64) -> Vec<LocationCandidate> {
        (1..=n).map(|i| candidate(i, &format!("Place {i}"), None, i as f64)).collect()
    }

    #[tokio::test]
    async fn zero_candidates_is_not_found_without_prompt() {
        let search = FakeSearch::default();
        let elicitor = RecordingElicitor::choosing(1);
        let resolver = LocationResolver::new(&search, &Limits::default());

        let err = resolver.resolve("Atlantis", &elicitor).await.unwrap_err();

        assert!(matches!(err, Error::NotFound { ref query } if query == "Atlantis"));
        assert!(elicitor.prompts().is_empty());
    }

    #[tokio::test]
    async fn single_candidate_resolves_without_prompt() {
        let search = FakeSearch::with(vec![candidate(7, "Reykjavik", None, 64.13)]);
        let elicitor = RecordingElicitor::new(ElicitationOutcome::Cancel);
        let resolver = LocationResolver::new(&search, &Limits::default());

        let loc = resolver.resolve("Reykjavik", &elicitor).await.unwrap();

        assert_eq!(loc.id, 7);
        assert!(elicitor.prompts().is_empty());
    }

    #[tokio::test]
    async fn springfield_choice_two_returns_second_candidate() {
        let search = FakeSearch::with(springfields());
        let elicitor = RecordingElicitor::choosing(2);
        let resolver = LocationResolver::new(&search, &Limits::default());

        let loc = resolver.resolve("Springfield", &elicitor).await.unwrap();

        assert_eq!(loc.admin1.as_deref(), Some("Missouri"));
        assert_eq!(loc.latitude, 37.21);

        let prompts = elicitor.prompts();
        assert_eq!(prompts.len(), 1);
        let msg = &prompts[0].message;
        assert!(msg.starts_with("Multiple locations found for 'Springfield':"));
        assert!(msg.contains("1. Springfield, Illinois, United States"));
        assert!(msg.contains("2. Springfield, Missouri, United States"));
        assert!(msg.contains("3. Springfield, Massachusetts, United States"));
        assert!(msg.ends_with("Please select the correct location:"));
    }

    #[tokio::test]
    async fn search_uses_full_limit_but_prompt_lists_only_display_count() {
        let search = FakeSearch::with(many(12));
        let elicitor = RecordingElicitor::choosing(1);
        let resolver = LocationResolver::new(&search, &Limits::default());

        resolver.resolve("Place", &elicitor).await.unwrap();

        assert_eq!(*search.limits_seen.lock().unwrap(), vec![10]);
        let msg = &elicitor.prompts()[0].message;
        let numbered = msg.lines().filter(|l| l.starts_with(|c: char| c.is_ascii_digit())).count();
        assert_eq!(numbered, 5);
        assert!(msg.contains("5. Place 5"));
        assert!(!msg.contains("Place 6"));
    }

    #[tokio::test]
    async fn lenient_numeric_answers_select_the_matching_option() {
        let search = FakeSearch::with(springfields());
        let resolver = LocationResolver::new(&search, &Limits::default());

        for raw in [serde_json::json!(2.0), serde_json::json!("2")] {
            let elicitor = RecordingElicitor::new(ElicitationOutcome::Accept(Some(
                serde_json::json!({ "selected_location_id": raw }),
            )));
            let loc = resolver.resolve("Springfield", &elicitor).await.unwrap();
            assert_eq!(loc.admin1.as_deref(), Some("Missouri"), "{raw}");
        }

        for raw in [serde_json::json!(2.5), serde_json::json!("two")] {
            let elicitor = RecordingElicitor::new(ElicitationOutcome::Accept(Some(
                serde_json::json!({ "selected_location_id": raw }),
            )));
            let err = resolver.resolve("Springfield", &elicitor).await.unwrap_err();
            assert!(matches!(err, Error::Selection(_)), "{raw}");
        }
    }

    #[tokio::test]
    async fn last_offered_option_is_selectable() {
        let search = FakeSearch::with(many(8));
        let elicitor = RecordingElicitor::choosing(5);
        let resolver = LocationResolver::new(&search, &Limits::default());

        let loc = resolver.resolve("Place", &elicitor).await.unwrap();
        assert_eq!(loc.id, 5);
    }

    #[tokio::test]
    async fn selection_beyond_truncation_boundary_is_rejected() {
        let search = FakeSearch::with(many(8));
        let elicitor = RecordingElicitor::choosing(6);
        let resolver = LocationResolver::new(&search, &Limits::default());

        let err = resolver.resolve("Place", &elicitor).await.unwrap_err();
        assert!(matches!(err, Error::Selection(_)));
    }

    #[tokio::test]
    async fn zero_and_negative_selections_are_rejected() {
        let search = FakeSearch::with(springfields());
        let resolver = LocationResolver::new(&search, &Limits::default());

        for position in [0, -1] {
            let elicitor = RecordingElicitor::choosing(position);
            let err = resolver.resolve("Springfield", &elicitor).await.unwrap_err();
            assert!(matches!(err, Error::Selection(_)), "position {position}");
        }
    }

    #[tokio::test]
    async fn declined_cancelled_or_empty_answers_fail() {
        let search = FakeSearch::with(springfields());
        let resolver = LocationResolver::new(&search, &Limits::default());

        for outcome in [
            ElicitationOutcome::Decline,
            ElicitationOutcome::Cancel,
            ElicitationOutcome::Accept(None),
            ElicitationOutcome::Accept(Some(serde_json::json!({ "selected_location_id": "two" }))),
        ] {
            let elicitor = RecordingElicitor::new(outcome.clone());
            let err = resolver.resolve("Springfield", &elicitor).await.unwrap_err();
            assert!(matches!(err, Error::Selection(_)), "{outcome:?}");
        }
    }

    #[test]
    fn option_line_dedupes_admin_levels_and_formats_population() {
        let mut c = candidate(1, "Luxembourg", Some("Luxembourg"), 49.6);
        c.admin2 = Some("Luxembourg".into());
        c.country = "Luxembourg".into();
        c.population = Some(76684);
        assert_eq!(option_line(1, &c), "1. Luxembourg, Luxembourg, Luxembourg (pop. 76,684)");

        c.admin2 = Some("Canton de Luxembourg".into());
        c.population = Some(0);
        assert_eq!(
            option_line(3, &c),
            "3. Luxembourg, Luxembourg, Canton de Luxembourg, Luxembourg"
        );
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(7), "7");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(8_336_817), "8,336,817");
    }
}
