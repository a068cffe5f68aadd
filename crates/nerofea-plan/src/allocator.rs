//! Greedy study-plan allocator.
//!
//! The allocator is a heuristic, not a solver: no backtracking, no
//! rebalancing beyond "grab from whatever is left", and exactly one failure
//! class past input validation (nothing fits the time budget).

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use nerofea_core::{defaults, Difficulty, Error, Question, Result};

use crate::weights::topic_weight;

/// Canned study tips attached to every generated plan.
pub const STUDY_TIPS: [&str; 8] = [
    "Start with easy problems to build confidence",
    "Practice problems from the same topic together",
    "Review solutions and understand different approaches",
    "Time yourself to improve speed",
    "Focus on understanding patterns rather than memorizing solutions",
    "Take breaks between study sessions",
    "Use a whiteboard or paper for problem-solving",
    "Discuss problems with peers or mentors",
];

/// Parameters for plan generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub weeks: u32,
    pub hours_per_week: u32,
    pub difficulties: Vec<Difficulty>,
}

impl PlanRequest {
    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.weeks < 1 || self.weeks > defaults::PLAN_MAX_WEEKS {
            return Err(Error::InvalidInput(format!(
                "Weeks must be between 1 and {}",
                defaults::PLAN_MAX_WEEKS
            )));
        }
        if self.hours_per_week < 1 || self.hours_per_week > defaults::PLAN_MAX_HOURS_PER_WEEK {
            return Err(Error::InvalidInput(format!(
                "Hours per week must be between 1 and {}",
                defaults::PLAN_MAX_HOURS_PER_WEEK
            )));
        }
        if self.difficulties.is_empty() {
            return Err(Error::InvalidInput(
                "At least one difficulty is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Flat time budget in minutes.
    pub fn budget_minutes(&self) -> i64 {
        self.weeks as i64 * self.hours_per_week as i64 * 60
    }
}

/// One week of the generated schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekPlan {
    pub week: u32,
    pub questions: Vec<Question>,
    pub total_minutes: i64,
    pub total_hours: f64,
    /// Share of the weekly time budget actually filled, in percent.
    pub efficiency_pct: u32,
    pub difficulty_breakdown: BTreeMap<String, usize>,
    pub topic_breakdown: BTreeMap<String, usize>,
}

/// Share of each difficulty in the accepted question set, in percent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningProgression {
    pub easy_pct: u32,
    pub medium_pct: u32,
    pub hard_pct: u32,
}

/// The full generated plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub weeks: u32,
    pub hours_per_week: u32,
    pub difficulties: Vec<Difficulty>,
    pub total_questions: usize,
    pub total_minutes: i64,
    pub total_hours: f64,
    pub efficiency_pct: u32,
    pub unused_minutes: i64,
    pub estimated_completion: String,
    pub weekly_schedule: Vec<WeekPlan>,
    pub difficulty_breakdown: BTreeMap<String, usize>,
    pub topic_breakdown: BTreeMap<String, usize>,
    pub learning_progression: LearningProgression,
    pub study_tips: Vec<String>,
}

/// Learning value per minute: difficulty weight × topic weight ÷ estimated time.
pub fn efficiency_score(question: &Question) -> f64 {
    let minutes = if question.estimated_minutes > 0 {
        question.estimated_minutes
    } else {
        defaults::DEFAULT_QUESTION_MINUTES
    };
    question.difficulty.weight() * topic_weight(&question.topic) / minutes as f64
}

fn estimated_minutes(question: &Question) -> i64 {
    if question.estimated_minutes > 0 {
        question.estimated_minutes as i64
    } else {
        defaults::DEFAULT_QUESTION_MINUTES as i64
    }
}

/// Sort by efficiency descending and greedily accept questions until the
/// flat budget is exhausted.
fn select_within_budget(mut candidates: Vec<Question>, budget_minutes: i64) -> (Vec<Question>, i64) {
    candidates.sort_by(|a, b| {
        efficiency_score(b)
            .partial_cmp(&efficiency_score(a))
            .unwrap_or(Ordering::Equal)
    });

    let mut selected = Vec::new();
    let mut time_used = 0i64;
    for question in candidates {
        let minutes = estimated_minutes(&question);
        if time_used + minutes <= budget_minutes {
            time_used += minutes;
            selected.push(question);
        }
    }
    (selected, time_used)
}

fn difficulty_breakdown(questions: &[Question]) -> BTreeMap<String, usize> {
    let mut acc = BTreeMap::new();
    for q in questions {
        *acc.entry(q.difficulty.to_string()).or_insert(0) += 1;
    }
    acc
}

fn topic_breakdown(questions: &[Question]) -> BTreeMap<String, usize> {
    let mut acc = BTreeMap::new();
    for q in questions {
        *acc.entry(q.topic.clone()).or_insert(0) += 1;
    }
    acc
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Take up to `floor(min(want, available))` questions from the front of a pool.
fn take_from(pool: &mut Vec<Question>, want: f64) -> Vec<Question> {
    let count = want.min(pool.len() as f64).floor() as usize;
    pool.drain(..count).collect()
}

/// Spread the accepted set across weeks with a progressive difficulty ramp:
/// the first ~30% of weeks lean easy, the middle mixes, the tail leans hard.
/// Under-filled weeks grab from whatever is left.
fn distribute_across_weeks(
    selected: Vec<Question>,
    weeks: u32,
    hours_per_week: u32,
) -> Vec<WeekPlan> {
    let total = selected.len();
    let per_week = total.div_ceil(weeks as usize);

    let mut easy: Vec<Question> = Vec::new();
    let mut medium: Vec<Question> = Vec::new();
    let mut hard: Vec<Question> = Vec::new();
    for q in selected {
        match q.difficulty {
            Difficulty::Easy => easy.push(q),
            Difficulty::Medium => medium.push(q),
            Difficulty::Hard => hard.push(q),
        }
    }

    let early_end = (weeks as f64 * 0.3).ceil() as u32;
    let middle_end = (weeks as f64 * 0.7).ceil() as u32;

    let mut schedule = Vec::with_capacity(weeks as usize);
    for week in 1..=weeks {
        let mut questions = Vec::new();
        let quota = per_week as f64;

        if week <= early_end {
            questions.extend(take_from(&mut easy, quota * 0.7));
            questions.extend(take_from(&mut medium, quota * 0.3));
        } else if week <= middle_end {
            questions.extend(take_from(&mut easy, quota * 0.4));
            questions.extend(take_from(&mut medium, quota * 0.5));
            questions.extend(take_from(&mut hard, quota * 0.1));
        } else {
            questions.extend(take_from(&mut medium, quota * 0.6));
            questions.extend(take_from(&mut hard, quota * 0.4));
        }

        // Fill remaining slots from whatever is left, easiest first.
        for pool in [&mut easy, &mut medium, &mut hard] {
            if questions.len() >= per_week {
                break;
            }
            let still_open = per_week - questions.len();
            questions.extend(take_from(pool, still_open as f64));
        }

        let total_minutes: i64 = questions.iter().map(estimated_minutes).sum();
        let weekly_budget = hours_per_week as i64 * 60;
        let efficiency_pct = if total_minutes > 0 {
            ((total_minutes as f64 / weekly_budget as f64) * 100.0).round() as u32
        } else {
            0
        };

        schedule.push(WeekPlan {
            week,
            total_minutes,
            total_hours: round2(total_minutes as f64 / 60.0),
            efficiency_pct,
            difficulty_breakdown: difficulty_breakdown(&questions),
            topic_breakdown: topic_breakdown(&questions),
            questions,
        });
    }

    schedule
}

fn learning_progression(questions: &[Question]) -> LearningProgression {
    let total = questions.len();
    if total == 0 {
        return LearningProgression {
            easy_pct: 0,
            medium_pct: 0,
            hard_pct: 0,
        };
    }
    let count = |d: Difficulty| questions.iter().filter(|q| q.difficulty == d).count();
    let pct = |n: usize| ((n as f64 / total as f64) * 100.0).round() as u32;
    LearningProgression {
        easy_pct: pct(count(Difficulty::Easy)),
        medium_pct: pct(count(Difficulty::Medium)),
        hard_pct: pct(count(Difficulty::Hard)),
    }
}

/// Generate a study plan from the catalog and the requested time budget.
///
/// Never assigns more total estimated minutes than
/// `weeks × hours_per_week × 60`.
pub fn generate_plan(catalog: &[Question], request: &PlanRequest) -> Result<PlanSummary> {
    request.validate()?;

    let filtered: Vec<Question> = catalog
        .iter()
        .filter(|q| request.difficulties.contains(&q.difficulty))
        .cloned()
        .collect();

    if filtered.is_empty() {
        return Err(Error::Plan(
            "No questions found for selected difficulty levels.".to_string(),
        ));
    }

    let budget = request.budget_minutes();
    let (selected, time_used) = select_within_budget(filtered, budget);

    if selected.is_empty() {
        return Err(Error::Plan(
            "No questions fit within the time constraint. \
             Try increasing hours per week or number of weeks."
                .to_string(),
        ));
    }

    let difficulty_counts = difficulty_breakdown(&selected);
    let topic_counts = topic_breakdown(&selected);
    let progression = learning_progression(&selected);
    let total_questions = selected.len();
    let weekly_schedule =
        distribute_across_weeks(selected, request.weeks, request.hours_per_week);

    let avg_hours_per_week = round2(time_used as f64 / request.weeks as f64 / 60.0);

    Ok(PlanSummary {
        weeks: request.weeks,
        hours_per_week: request.hours_per_week,
        difficulties: request.difficulties.clone(),
        total_questions,
        total_minutes: time_used,
        total_hours: round2(time_used as f64 / 60.0),
        efficiency_pct: ((time_used as f64 / budget as f64) * 100.0).round() as u32,
        unused_minutes: budget - time_used,
        estimated_completion: format!("{} weeks ({}h/week)", request.weeks, avg_hours_per_week),
        weekly_schedule,
        difficulty_breakdown: difficulty_counts,
        topic_breakdown: topic_counts,
        learning_progression: progression,
        study_tips: STUDY_TIPS.iter().map(|s| s.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nerofea_core::new_v7;

    fn question(number: i32, difficulty: Difficulty, topic: &str, minutes: i32) -> Question {
        Question {
            id: new_v7(),
            number,
            title: format!("Problem {}", number),
            difficulty,
            topic: topic.to_string(),
            estimated_minutes: minutes,
            url: None,
            week: None,
        }
    }

    fn sample_catalog() -> Vec<Question> {
        vec![
            question(1, Difficulty::Easy, "Array", 15),
            question(2, Difficulty::Easy, "String", 15),
            question(3, Difficulty::Easy, "Linked List", 20),
            question(4, Difficulty::Easy, "Binary Tree", 15),
            question(5, Difficulty::Medium, "Array", 30),
            question(6, Difficulty::Medium, "Dynamic Programming", 40),
            question(7, Difficulty::Medium, "Graph", 35),
            question(8, Difficulty::Medium, "Binary Search", 30),
            question(9, Difficulty::Hard, "Dynamic Programming", 50),
            question(10, Difficulty::Hard, "Graph", 50),
        ]
    }

    fn all_difficulties() -> Vec<Difficulty> {
        vec![Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
    }

    #[test]
    fn test_budget_invariant_never_exceeded() {
        let catalog = sample_catalog();
        for (weeks, hours) in [(1, 1), (1, 2), (2, 1), (4, 2), (52, 168)] {
            let req = PlanRequest {
                weeks,
                hours_per_week: hours,
                difficulties: all_difficulties(),
            };
            match generate_plan(&catalog, &req) {
                Ok(plan) => {
                    assert!(
                        plan.total_minutes <= req.budget_minutes(),
                        "plan for {}w x {}h assigned {} min over budget {}",
                        weeks,
                        hours,
                        plan.total_minutes,
                        req.budget_minutes()
                    );
                    let scheduled: i64 =
                        plan.weekly_schedule.iter().map(|w| w.total_minutes).sum();
                    assert_eq!(scheduled, plan.total_minutes);
                }
                Err(Error::Plan(_)) => {} // nothing fit, acceptable for tiny budgets
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
    }

    #[test]
    fn test_rejects_out_of_range_weeks() {
        let catalog = sample_catalog();
        for weeks in [0, 53] {
            let req = PlanRequest {
                weeks,
                hours_per_week: 5,
                difficulties: all_difficulties(),
            };
            assert!(matches!(
                generate_plan(&catalog, &req),
                Err(Error::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_rejects_out_of_range_hours() {
        let catalog = sample_catalog();
        for hours in [0, 169] {
            let req = PlanRequest {
                weeks: 4,
                hours_per_week: hours,
                difficulties: all_difficulties(),
            };
            assert!(matches!(
                generate_plan(&catalog, &req),
                Err(Error::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_rejects_empty_difficulties() {
        let req = PlanRequest {
            weeks: 4,
            hours_per_week: 5,
            difficulties: vec![],
        };
        assert!(matches!(
            generate_plan(&sample_catalog(), &req),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_no_matching_difficulty_is_plan_error() {
        let catalog = vec![question(1, Difficulty::Easy, "Array", 15)];
        let req = PlanRequest {
            weeks: 2,
            hours_per_week: 5,
            difficulties: vec![Difficulty::Hard],
        };
        assert!(matches!(generate_plan(&catalog, &req), Err(Error::Plan(_))));
    }

    #[test]
    fn test_nothing_fits_is_plan_error() {
        // Single question needs 120 minutes; budget is 60.
        let catalog = vec![question(1, Difficulty::Hard, "Graph", 120)];
        let req = PlanRequest {
            weeks: 1,
            hours_per_week: 1,
            difficulties: vec![Difficulty::Hard],
        };
        match generate_plan(&catalog, &req) {
            Err(Error::Plan(msg)) => assert!(msg.contains("fit")),
            other => panic!("expected plan error, got {:?}", other.map(|p| p.total_questions)),
        }
    }

    #[test]
    fn test_every_selected_question_scheduled_exactly_once() {
        let catalog = sample_catalog();
        let req = PlanRequest {
            weeks: 3,
            hours_per_week: 3,
            difficulties: all_difficulties(),
        };
        let plan = generate_plan(&catalog, &req).unwrap();

        let mut scheduled: Vec<i32> = plan
            .weekly_schedule
            .iter()
            .flat_map(|w| w.questions.iter().map(|q| q.number))
            .collect();
        scheduled.sort_unstable();
        let before = scheduled.len();
        scheduled.dedup();
        assert_eq!(before, scheduled.len(), "no question may appear twice");
        assert_eq!(before, plan.total_questions);
    }

    #[test]
    fn test_week_numbers_cover_request() {
        let req = PlanRequest {
            weeks: 4,
            hours_per_week: 2,
            difficulties: all_difficulties(),
        };
        let plan = generate_plan(&sample_catalog(), &req).unwrap();
        let weeks: Vec<u32> = plan.weekly_schedule.iter().map(|w| w.week).collect();
        assert_eq!(weeks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_greedy_prefers_higher_efficiency() {
        // The DP question scores 2.0 * 1.5 / 30 = 0.1; the Stack question
        // 2.0 * 1.0 / 30 ≈ 0.067, so DP must be picked (and scheduled) first.
        let catalog = vec![
            question(1, Difficulty::Medium, "Stack", 30),
            question(2, Difficulty::Medium, "Dynamic Programming", 30),
        ];
        let req = PlanRequest {
            weeks: 1,
            hours_per_week: 1,
            difficulties: vec![Difficulty::Medium],
        };
        let plan = generate_plan(&catalog, &req).unwrap();
        assert_eq!(plan.total_questions, 2); // 60 minutes fits both
        let first = &plan.weekly_schedule[0].questions[0];
        assert_eq!(first.topic, "Dynamic Programming");
    }

    #[test]
    fn test_summary_breakdowns_match_totals() {
        let req = PlanRequest {
            weeks: 2,
            hours_per_week: 4,
            difficulties: all_difficulties(),
        };
        let plan = generate_plan(&sample_catalog(), &req).unwrap();

        let difficulty_total: usize = plan.difficulty_breakdown.values().sum();
        let topic_total: usize = plan.topic_breakdown.values().sum();
        assert_eq!(difficulty_total, plan.total_questions);
        assert_eq!(topic_total, plan.total_questions);
    }

    #[test]
    fn test_progression_percentages_bounded() {
        let req = PlanRequest {
            weeks: 2,
            hours_per_week: 4,
            difficulties: all_difficulties(),
        };
        let plan = generate_plan(&sample_catalog(), &req).unwrap();
        let p = &plan.learning_progression;
        for pct in [p.easy_pct, p.medium_pct, p.hard_pct] {
            assert!(pct <= 100);
        }
    }

    #[test]
    fn test_study_tips_attached() {
        let req = PlanRequest {
            weeks: 1,
            hours_per_week: 2,
            difficulties: all_difficulties(),
        };
        let plan = generate_plan(&sample_catalog(), &req).unwrap();
        assert_eq!(plan.study_tips.len(), STUDY_TIPS.len());
    }

    #[test]
    fn test_deterministic_for_identical_input() {
        let catalog = sample_catalog();
        let req = PlanRequest {
            weeks: 3,
            hours_per_week: 3,
            difficulties: all_difficulties(),
        };
        let a = generate_plan(&catalog, &req).unwrap();
        let b = generate_plan(&catalog, &req).unwrap();
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            serde_json::to_value(&b).unwrap()
        );
    }

    #[test]
    fn test_missing_estimate_assumes_default() {
        let q = question(1, Difficulty::Easy, "Array", 0);
        assert_eq!(estimated_minutes(&q), defaults::DEFAULT_QUESTION_MINUTES as i64);
    }
}
