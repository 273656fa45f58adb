use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::{ChainLink, MediaEntry, MediaMatch, RecommendationChain},
    services::{dashboard::FAVORITE_MIN_RATING, metadata::MetadataProvider},
};

/// Upper bound on chain length regardless of what is requested
pub const MAX_CHAIN_STEPS: usize = 20;

/// Picks the title the chain starts from.
///
/// An explicit, non-blank seed wins. Otherwise: the most recently watched
/// entry rated 4.0 or higher, then the highest-rated entry, then the most
/// recently watched entry.
pub fn pick_seed(entries: &[MediaEntry], explicit: Option<&str>) -> Option<String> {
    if let Some(seed) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        return Some(seed.to_string());
    }

    let most_recent = |candidates: Vec<&MediaEntry>| -> Option<String> {
        candidates
            .into_iter()
            .filter(|e| e.watched_on.is_some())
            .max_by_key(|e| e.watched_on)
            .map(|e| e.title.clone())
    };

    let favorites: Vec<&MediaEntry> = entries
        .iter()
        .filter(|e| e.rating.is_some_and(|r| r.value() >= FAVORITE_MIN_RATING))
        .collect();
    if let Some(seed) = most_recent(favorites) {
        return Some(seed);
    }

    let mut highest: Option<&MediaEntry> = None;
    for entry in entries {
        if let Some(rating) = entry.rating {
            if highest.and_then(|h| h.rating).map_or(true, |top| rating > top) {
                highest = Some(entry);
            }
        }
    }
    if let Some(entry) = highest {
        return Some(entry.title.clone());
    }

    most_recent(entries.iter().collect()).or_else(|| entries.first().map(|e| e.title.clone()))
}

fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Follows the metadata API's recommendations outward from the seed.
///
/// Each link is the first recommendation for the previous link that is
/// neither already logged nor already in the chain. Lookup failures end the
/// chain early and keep the links found so far.
pub async fn build_chain(
    metadata: &dyn MetadataProvider,
    entries: &[MediaEntry],
    seed: Option<String>,
    steps: usize,
) -> AppResult<RecommendationChain> {
    let steps = steps.min(MAX_CHAIN_STEPS);
    let Some(seed_title) = seed else {
        return Ok(RecommendationChain {
            seed: None,
            links: Vec::new(),
        });
    };

    let mut seen: HashSet<String> = entries.iter().map(|e| title_key(&e.title)).collect();
    seen.insert(title_key(&seed_title));

    let mut links = Vec::new();
    if steps == 0 {
        return Ok(RecommendationChain {
            seed: Some(seed_title),
            links,
        });
    }

    let mut current: MediaMatch = match metadata.search(&seed_title).await {
        Ok(matches) => match matches.into_iter().next() {
            Some(found) => found,
            None => {
                tracing::info!(seed = %seed_title, "Seed not found in metadata catalogue");
                return Ok(RecommendationChain {
                    seed: Some(seed_title),
                    links,
                });
            }
        },
        Err(e) => {
            tracing::warn!(seed = %seed_title, error = %e, "Seed lookup failed");
            return Ok(RecommendationChain {
                seed: Some(seed_title),
                links,
            });
        }
    };
    seen.insert(title_key(&current.title));

    while links.len() < steps {
        let candidates = match metadata.recommendations(current.kind, current.id).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(
                    title = %current.title,
                    error = %e,
                    "Recommendation lookup failed, ending chain"
                );
                break;
            }
        };

        let Some(next) = candidates
            .into_iter()
            .find(|c| !seen.contains(&title_key(&c.title)))
        else {
            tracing::debug!(title = %current.title, "No unseen recommendation, ending chain");
            break;
        };

        seen.insert(title_key(&next.title));
        links.push(ChainLink {
            step: links.len() + 1,
            recommended_from: current.title.clone(),
            title: next.title.clone(),
            kind: next.kind,
            poster_url: next.poster_path.as_deref().map(|p| metadata.image_url(p)),
            release_date: next.release_date,
            overview: next.overview.clone(),
            vote_average: next.vote_average,
        });
        current = next;
    }

    tracing::info!(
        seed = %seed_title,
        links = links.len(),
        provider = metadata.name(),
        "Recommendation chain built"
    );

    Ok(RecommendationChain {
        seed: Some(seed_title),
        links,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{MediaKind, Rating};
    use crate::services::metadata::MockMetadataProvider;
    use chrono::NaiveDate;

    fn entry(title: &str, date: Option<(i32, u32, u32)>, rating: Option<f64>) -> MediaEntry {
        let mut e = MediaEntry::new(title, "c");
        e.watched_on = date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        e.rating = rating.and_then(Rating::new);
        e
    }

    fn item(id: u64, title: &str) -> MediaMatch {
        MediaMatch {
            kind: MediaKind::Movie,
            id,
            title: title.to_string(),
            poster_path: Some(format!("/{}.jpg", id)),
            release_date: None,
            overview: String::new(),
            vote_average: Some(7.0),
        }
    }

    #[test]
    fn test_seed_explicit_wins() {
        let entries = vec![entry("Dune", Some((2025, 1, 1)), Some(5.0))];
        assert_eq!(pick_seed(&entries, Some(" Arrival ")), Some("Arrival".to_string()));
        assert_eq!(pick_seed(&entries, Some("  ")), Some("Dune".to_string()));
    }

    #[test]
    fn test_seed_prefers_recent_favorite() {
        let entries = vec![
            entry("Parasite", Some((2024, 1, 1)), Some(5.0)),
            entry("Dune", Some((2025, 3, 1)), Some(4.0)),
            entry("Cats", Some((2025, 5, 1)), Some(1.0)),
        ];
        assert_eq!(pick_seed(&entries, None), Some("Dune".to_string()));
    }

    #[test]
    fn test_seed_falls_back_to_highest_then_recent() {
        let entries = vec![
            entry("Cats", Some((2025, 5, 1)), Some(1.0)),
            entry("Tenet", Some((2025, 1, 1)), Some(3.5)),
        ];
        assert_eq!(pick_seed(&entries, None), Some("Tenet".to_string()));

        let unrated = vec![
            entry("Old", Some((2020, 1, 1)), None),
            entry("New", Some((2025, 1, 1)), None),
        ];
        assert_eq!(pick_seed(&unrated, None), Some("New".to_string()));
        assert_eq!(pick_seed(&[], None), None);
    }

    #[tokio::test]
    async fn test_chain_skips_logged_and_repeated_titles() {
        let mut metadata = MockMetadataProvider::new();
        metadata
            .expect_search()
            .returning(|_| Ok(vec![item(1, "Parasite")]));
        metadata.expect_recommendations().returning(|_, id| {
            Ok(match id {
                1 => vec![item(2, "Dune"), item(3, "Burning")],
                3 => vec![item(1, "Parasite"), item(4, "Oldboy")],
                4 => vec![item(3, "Burning"), item(5, "The Handmaiden")],
                _ => Vec::new(),
            })
        });
        metadata
            .expect_image_url()
            .returning(|p| format!("https://img.test{}", p));
        metadata.expect_name().return_const("mock");

        let entries = vec![entry("Parasite", None, Some(5.0)), entry("dune", None, Some(3.0))];
        let chain = build_chain(&metadata, &entries, Some("Parasite".to_string()), 5)
            .await
            .unwrap();

        let titles: Vec<&str> = chain.links.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Burning", "Oldboy", "The Handmaiden"]);
        assert_eq!(chain.links[0].recommended_from, "Parasite");
        assert_eq!(chain.links[1].recommended_from, "Burning");
        assert_eq!(chain.links[2].step, 3);
        assert_eq!(
            chain.links[0].poster_url.as_deref(),
            Some("https://img.test/3.jpg")
        );
    }

    #[tokio::test]
    async fn test_chain_respects_step_limit() {
        let mut metadata = MockMetadataProvider::new();
        metadata.expect_search().returning(|_| Ok(vec![item(1, "Seed")]));
        metadata
            .expect_recommendations()
            .returning(|_, id| Ok(vec![item(id + 1, &format!("Title {}", id + 1))]));
        metadata.expect_image_url().returning(|p| p.to_string());
        metadata.expect_name().return_const("mock");

        let chain = build_chain(&metadata, &[], Some("Seed".to_string()), 2)
            .await
            .unwrap();
        assert_eq!(chain.links.len(), 2);
    }

    #[tokio::test]
    async fn test_chain_failure_keeps_partial_result() {
        let mut metadata = MockMetadataProvider::new();
        metadata.expect_search().returning(|_| Ok(vec![item(1, "Seed")]));
        metadata.expect_recommendations().returning(|_, id| {
            if id == 1 {
                Ok(vec![item(2, "First")])
            } else {
                Err(AppError::ExternalApi("rate limited".to_string()))
            }
        });
        metadata.expect_image_url().returning(|p| p.to_string());
        metadata.expect_name().return_const("mock");

        let chain = build_chain(&metadata, &[], Some("Seed".to_string()), 5)
            .await
            .unwrap();
        assert_eq!(chain.links.len(), 1);
        assert_eq!(chain.links[0].title, "First");
    }

    #[tokio::test]
    async fn test_unknown_seed_yields_empty_chain() {
        let mut metadata = MockMetadataProvider::new();
        metadata.expect_search().returning(|_| Ok(Vec::new()));

        let chain = build_chain(&metadata, &[], Some("Nothing".to_string()), 5)
            .await
            .unwrap();
        assert_eq!(chain.seed.as_deref(), Some("Nothing"));
        assert!(chain.links.is_empty());
    }

    #[tokio::test]
    async fn test_no_seed_makes_no_calls() {
        let metadata = MockMetadataProvider::new();
        let chain = build_chain(&metadata, &[], None, 5).await.unwrap();
        assert!(chain.seed.is_none());
        assert!(chain.links.is_empty());
    }
}
