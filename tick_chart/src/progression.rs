// Derived progression series for a single discipline. Inputs are the
// date-ordered points of one bucket; only ranked sends contribute.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::PlottedPoint;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressPoint {
    pub date: NaiveDate,
    pub rank: usize,
}

fn ranked_sends(points: &[PlottedPoint]) -> impl Iterator<Item = (NaiveDate, usize)> + '_ {
    points
        .iter()
        .filter(|p| p.is_send())
        .filter_map(|p| Some((p.date, p.grade_rank?)))
}

/// Hardest rank sent so far, one entry per contributing point.
pub fn running_best(points: &[PlottedPoint]) -> Vec<ProgressPoint> {
    let mut best: Option<usize> = None;
    ranked_sends(points)
        .map(|(date, rank)| {
            let current = best.map_or(rank, |b| b.max(rank));
            best = Some(current);
            ProgressPoint {
                date,
                rank: current,
            }
        })
        .collect()
}

/// Hardest rank sent on each date, dates ascending.
pub fn best_per_date(points: &[PlottedPoint]) -> Vec<ProgressPoint> {
    let mut by_date: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for (date, rank) in ranked_sends(points) {
        let entry = by_date.entry(date).or_insert(rank);
        if rank > *entry {
            *entry = rank;
        }
    }
    by_date
        .into_iter()
        .map(|(date, rank)| ProgressPoint { date, rank })
        .collect()
}

/// Ranked sends per rank, ascending rank.
pub fn grade_counts(points: &[PlottedPoint]) -> Vec<(usize, usize)> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for (_, rank) in ranked_sends(points) {
        *counts.entry(rank).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RouteType, SendStyle};

    fn point(day: u32, rank: Option<usize>, send: Option<SendStyle>) -> PlottedPoint {
        PlottedPoint {
            date: NaiveDate::from_ymd_opt(2023, 6, day).unwrap(),
            route_type: RouteType::Sport,
            grade: String::new(),
            grade_rank: rank,
            protection: None,
            send_style: send,
            ascent_style: None,
            route: String::new(),
            row_index: day as usize,
        }
    }

    #[test]
    fn test_running_best_is_monotone() {
        let points = vec![
            point(1, Some(10), Some(SendStyle::Redpoint)),
            point(2, Some(8), Some(SendStyle::Flash)),
            point(3, None, Some(SendStyle::Onsight)),
            point(4, Some(14), None),
            point(5, Some(12), Some(SendStyle::Redpoint)),
        ];
        let ranks: Vec<usize> = running_best(&points).iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![10, 10, 12]);
    }

    #[test]
    fn test_best_per_date() {
        let mut points = vec![
            point(1, Some(10), Some(SendStyle::Redpoint)),
            point(1, Some(12), Some(SendStyle::Redpoint)),
            point(2, Some(9), Some(SendStyle::Flash)),
        ];
        points[1].row_index = 7;
        let best = best_per_date(&points);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].rank, 12);
        assert_eq!(best[1].rank, 9);
        assert!(best[0].date < best[1].date);
    }

    #[test]
    fn test_grade_counts() {
        let points = vec![
            point(1, Some(3), Some(SendStyle::Redpoint)),
            point(2, Some(1), Some(SendStyle::Flash)),
            point(3, Some(3), Some(SendStyle::Onsight)),
            point(4, Some(5), None),
        ];
        assert_eq!(grade_counts(&points), vec![(1, 1), (3, 2)]);
        assert!(grade_counts(&[]).is_empty());
    }
}
