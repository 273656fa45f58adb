use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::models::{Dashboard, DashboardStats, FavoriteName, MediaEntry, Period};

/// Minimum rating for an entry's cast to count toward favorites
pub const FAVORITE_MIN_RATING: f64 = 4.0;

/// Number of favorite names shown
pub const FAVORITE_LIMIT: usize = 7;

/// Builds the dashboard for the entries watched in `period`
pub fn build_dashboard(entries: &[MediaEntry], period: Period, today: NaiveDate) -> Dashboard {
    let selected: Vec<&MediaEntry> = entries
        .iter()
        .filter(|entry| period.includes(entry, today))
        .collect();

    Dashboard {
        period,
        stats: compute_stats(&selected),
        favorites: favorite_names(&selected),
        feed: review_feed(&selected),
    }
}

fn compute_stats(entries: &[&MediaEntry]) -> DashboardStats {
    let total_minutes: u64 = entries.iter().map(|e| e.running_time as u64).sum();

    let ratings: Vec<f64> = entries
        .iter()
        .filter_map(|e| e.rating.map(|r| r.value()))
        .collect();
    let average_rating = if ratings.is_empty() {
        None
    } else {
        let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
        Some((mean * 10.0).round() / 10.0)
    };

    // first entry wins ties
    let mut best: Option<&MediaEntry> = None;
    for entry in entries {
        if let Some(rating) = entry.rating {
            if best.and_then(|b| b.rating).map_or(true, |top| rating > top) {
                best = Some(entry);
            }
        }
    }

    DashboardStats {
        total_titles: entries.len(),
        total_minutes,
        hours: total_minutes / 60,
        minutes: total_minutes % 60,
        average_rating,
        best_title: best.map(|e| e.title.clone()),
    }
}

/// Cast/crew names most often credited on highly rated entries.
/// Equal counts keep the order in which names were first seen.
pub fn favorite_names(entries: &[&MediaEntry]) -> Vec<FavoriteName> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut next_seen = 0;

    for entry in entries {
        if !entry
            .rating
            .is_some_and(|r| r.value() >= FAVORITE_MIN_RATING)
        {
            continue;
        }
        for name in entry.cast_names() {
            let slot = counts.entry(name).or_insert_with(|| {
                next_seen += 1;
                (0, next_seen)
            });
            slot.0 += 1;
        }
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(name, (count, seen))| (name, count, seen))
        .collect();
    ranked.sort_by_key(|(_, count, seen)| (Reverse(*count), *seen));

    ranked
        .into_iter()
        .take(FAVORITE_LIMIT)
        .enumerate()
        .map(|(idx, (name, count, _))| FavoriteName {
            rank: idx + 1,
            name,
            count,
        })
        .collect()
}

/// Newest first; undated entries go last in sheet order
fn review_feed(entries: &[&MediaEntry]) -> Vec<MediaEntry> {
    let mut feed: Vec<MediaEntry> = entries.iter().map(|e| (*e).clone()).collect();
    feed.sort_by_key(|e| Reverse(e.watched_on));
    feed
}
