// src/analysis.rs

//! Read-side aggregations over finalized responses.
//! Only completed attempts have responses, so incomplete ones never count.

use std::collections::{BTreeMap, HashMap};

use crate::models::{
    report::{
        AttemptScore, MyAnalysis, OverviewParams, ResultRow, StudentOverview, StudentReport,
        TopicAccuracy, TopicComparison,
    },
    user::User,
};

fn mean(correct: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { correct as f64 / total as f64 }
}

fn round_pct(fraction: f64) -> f64 {
    (fraction * 1000.0).round() / 10.0
}

/// Marks-weighted score of every attempt, oldest completion first.
pub fn attempt_scores(rows: &[ResultRow]) -> Vec<AttemptScore> {
    let mut by_attempt: BTreeMap<i64, AttemptScore> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.completed_at.is_some()) {
        let entry = by_attempt.entry(row.attempt_id).or_insert_with(|| AttemptScore {
            attempt_id: row.attempt_id,
            user_id: row.user_id,
            obtained: 0,
            maximum: 0,
            completed_at: row.completed_at,
        });
        entry.maximum += row.marks;
        if row.is_correct {
            entry.obtained += row.marks;
        }
    }

    let mut scores: Vec<AttemptScore> = by_attempt.into_values().collect();
    scores.sort_by(|a, b| {
        a.completed_at
            .cmp(&b.completed_at)
            .then(a.attempt_id.cmp(&b.attempt_id))
    });
    scores
}

pub fn overall_accuracy(rows: &[ResultRow]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    Some(mean(rows.iter().filter(|r| r.is_correct).count(), rows.len()))
}

fn topic_tally(rows: &[ResultRow]) -> BTreeMap<String, (usize, usize)> {
    let mut tally: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for row in rows {
        let entry = tally.entry(row.topic.clone()).or_default();
        entry.1 += 1;
        if row.is_correct {
            entry.0 += 1;
        }
    }
    tally
}

/// Mean correctness per topic, sorted by topic name.
pub fn topic_accuracy(rows: &[ResultRow]) -> Vec<TopicAccuracy> {
    topic_tally(rows)
        .into_iter()
        .map(|(topic, (correct, total))| TopicAccuracy {
            topic,
            accuracy: mean(correct, total),
        })
        .collect()
}

/// User vs class accuracy over the union of topics; a missing side reads 0.
pub fn compare_with_class(user_rows: &[ResultRow], all_rows: &[ResultRow]) -> Vec<TopicComparison> {
    let user: HashMap<String, f64> = topic_accuracy(user_rows)
        .into_iter()
        .map(|t| (t.topic, t.accuracy))
        .collect();
    let class: BTreeMap<String, f64> = topic_accuracy(all_rows)
        .into_iter()
        .map(|t| (t.topic, t.accuracy))
        .collect();

    let mut topics: Vec<&String> = class.keys().chain(user.keys()).collect();
    topics.sort();
    topics.dedup();

    topics
        .into_iter()
        .map(|topic| TopicComparison {
            topic: topic.clone(),
            user: user.get(topic).copied().unwrap_or(0.0),
            class: class.get(topic).copied().unwrap_or(0.0),
        })
        .collect()
}

pub fn my_analysis(rows: &[ResultRow]) -> MyAnalysis {
    MyAnalysis {
        last_score: attempt_scores(rows).pop(),
        overall_accuracy: overall_accuracy(rows),
        topics: topic_accuracy(rows),
    }
}

/// One row per user, including users with no attempts.
pub fn student_overview(users: &[User], rows: &[ResultRow]) -> Vec<StudentOverview> {
    let scores = attempt_scores(rows);

    users
        .iter()
        .map(|u| {
            let mine: Vec<&AttemptScore> = scores.iter().filter(|s| s.user_id == u.id).collect();
            let last = mine.last();
            let (correct, total) = rows
                .iter()
                .filter(|r| r.user_id == u.id)
                .fold((0, 0), |(c, t), r| (c + usize::from(r.is_correct), t + 1));

            StudentOverview {
                user_id: u.id,
                username: u.username.clone(),
                full_name: u.full_name.clone(),
                attempts: mine.len(),
                last_obtained: last.map(|s| s.obtained).unwrap_or(0),
                last_max: last.map(|s| s.maximum).unwrap_or(0),
                last_completed: last.and_then(|s| s.completed_at),
                accuracy: round_pct(mean(correct, total)),
            }
        })
        .collect()
}

/// Case-insensitive substring search on username or full name, plus a minimum attempt count.
pub fn filter_overview(rows: Vec<StudentOverview>, params: &OverviewParams) -> Vec<StudentOverview> {
    let needle = params
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let min_attempts = params.min_attempts.unwrap_or(0);

    rows.into_iter()
        .filter(|r| r.attempts >= min_attempts)
        .filter(|r| match &needle {
            Some(n) => r.username.to_lowercase().contains(n) || r.full_name.to_lowercase().contains(n),
            None => true,
        })
        .collect()
}

pub fn student_report(user: &User, all_rows: &[ResultRow]) -> StudentReport {
    let user_rows: Vec<ResultRow> = all_rows.iter().filter(|r| r.user_id == user.id).cloned().collect();

    StudentReport {
        user_id: user.id,
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        overall_accuracy: round_pct(overall_accuracy(&user_rows).unwrap_or(0.0)),
        topics: topic_accuracy(&user_rows),
        comparison: compare_with_class(&user_rows, all_rows),
        latest_attempt: attempt_scores(&user_rows).pop(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn row(attempt_id: i64, user_id: i64, topic: &str, marks: i64, is_correct: bool, minute: i64) -> ResultRow {
        ResultRow {
            attempt_id,
            user_id,
            username: format!("user{}", user_id),
            full_name: format!("User {}", user_id),
            question_id: attempt_id * 100 + marks,
            topic: topic.to_string(),
            marks,
            response: Some("A".to_string()),
            is_correct,
            completed_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)),
        }
    }

    fn user(id: i64, username: &str, full_name: &str) -> User {
        User {
            id,
            username: username.to_string(),
            full_name: full_name.to_string(),
            role: "student".to_string(),
        }
    }

    fn sample_rows() -> Vec<ResultRow> {
        vec![
            // user 1, attempt 10: 1 of 3 marks
            row(10, 1, "SQL", 1, true, 0),
            row(10, 1, "Web", 2, false, 0),
            // user 1, attempt 11 (later): 5 of 5
            row(11, 1, "SQL", 2, true, 30),
            row(11, 1, "Web", 3, true, 30),
            // user 2, attempt 12
            row(12, 2, "SQL", 1, false, 10),
            row(12, 2, "Python", 1, true, 10),
        ]
    }

    #[test]
    fn test_attempt_scores_are_marks_weighted() {
        let scores = attempt_scores(&sample_rows());
        assert_eq!(scores.len(), 3);
        assert_eq!((scores[0].attempt_id, scores[0].obtained, scores[0].maximum), (10, 1, 3));
        assert_eq!((scores[1].attempt_id, scores[1].obtained, scores[1].maximum), (12, 1, 2));
        assert_eq!((scores[2].attempt_id, scores[2].obtained, scores[2].maximum), (11, 5, 5));
    }

    #[test]
    fn test_topic_accuracy_and_overall() {
        let rows = sample_rows();
        let topics = topic_accuracy(&rows);
        assert_eq!(topics.iter().map(|t| t.topic.as_str()).collect::<Vec<_>>(), vec!["Python", "SQL", "Web"]);
        assert!((topics[1].accuracy - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(overall_accuracy(&rows), Some(4.0 / 6.0));
        assert_eq!(overall_accuracy(&[]), None);
    }

    #[test]
    fn test_compare_with_class_fills_missing_topics() {
        let rows = sample_rows();
        let user1: Vec<ResultRow> = rows.iter().filter(|r| r.user_id == 1).cloned().collect();
        let comparison = compare_with_class(&user1, &rows);

        let python = comparison.iter().find(|c| c.topic == "Python").unwrap();
        assert_eq!(python.user, 0.0);
        assert_eq!(python.class, 1.0);
        let web = comparison.iter().find(|c| c.topic == "Web").unwrap();
        assert_eq!(web.user, 0.5);
        assert_eq!(web.class, 0.5);
    }

    #[test]
    fn test_my_analysis_uses_latest_attempt() {
        let rows: Vec<ResultRow> = sample_rows().into_iter().filter(|r| r.user_id == 1).collect();
        let analysis = my_analysis(&rows);
        let last = analysis.last_score.unwrap();
        assert_eq!(last.attempt_id, 11);
        assert_eq!((last.obtained, last.maximum), (5, 5));
        assert_eq!(analysis.overall_accuracy, Some(0.75));
    }

    #[test]
    fn test_overview_includes_idle_users_and_filters() {
        let users = vec![user(1, "alice", "Alice Smith"), user(2, "bob", "Bob Jones"), user(3, "carol", "Carol King")];
        let overview = student_overview(&users, &sample_rows());

        assert_eq!(overview.len(), 3);
        assert_eq!(overview[0].attempts, 2);
        assert_eq!((overview[0].last_obtained, overview[0].last_max), (5, 5));
        assert_eq!(overview[0].accuracy, 75.0);
        assert_eq!(overview[1].accuracy, 50.0);
        assert_eq!(overview[2].attempts, 0);
        assert_eq!(overview[2].accuracy, 0.0);
        assert!(overview[2].last_completed.is_none());

        let params = OverviewParams { search: Some("JONES".to_string()), min_attempts: None };
        let found = filter_overview(overview.clone(), &params);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "bob");

        let params = OverviewParams { search: None, min_attempts: Some(1) };
        assert_eq!(filter_overview(overview, &params).len(), 2);
    }

    #[test]
    fn test_student_report() {
        let rows = sample_rows();
        let report = student_report(&user(2, "bob", "Bob Jones"), &rows);
        assert_eq!(report.overall_accuracy, 50.0);
        assert_eq!(report.topics.len(), 2);
        assert_eq!(report.comparison.len(), 3);
        assert_eq!(report.latest_attempt.unwrap().attempt_id, 12);
    }
}
