use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveTime, Utc};
use pulse_analysis::{AnalysisError, AnalysisRequest};

use super::*;
use crate::specificity::check_specificity;

/// Replays scripted answers and records every prompt it was sent.
struct ScriptedAnalysis {
    answers: Mutex<VecDeque<Result<String, AnalysisError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAnalysis {
    fn new(answers: Vec<Result<String, AnalysisError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl AnalysisClient for ScriptedAnalysis {
    async fn complete(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AnalysisError::Timeout))
    }
}

fn composer() -> Composer {
    Composer::new(
        CreatorProfile {
            name: "Noam".to_owned(),
            partner_name: Some("Maya".to_owned()),
            patterns: vec!["couple_content".to_owned(), "music_content".to_owned()],
            language: "en".to_owned(),
        },
        PostingWindow {
            start: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        },
    )
}

fn trend(id: i64, headline: &str) -> TrendItem {
    TrendItem {
        id,
        fetched_at: Utc::now(),
        headline: headline.to_owned(),
        summary: String::new(),
        link: None,
        source: "feed".to_owned(),
        relevance_score: 60.0,
    }
}

fn input<'a>(trends: &'a [TrendItem], weights: &'a WeightSet) -> ComposeInput<'a> {
    ComposeInput {
        category: MessageCategory::Morning,
        analysis: Some("Duets perform best."),
        trends,
        weights,
        baseline_engagement: 200.0,
    }
}

fn json(ideas: &[(&str, &str)]) -> String {
    let items: Vec<serde_json::Value> = ideas
        .iter()
        .map(|(title, pattern)| serde_json::json!({"title": title, "pattern": pattern}))
        .collect();
    serde_json::to_string(&items).unwrap()
}

#[tokio::test]
async fn specific_idea_passes_unchanged() {
    let analysis = ScriptedAnalysis::new(vec![Ok(json(&[(
        "Film her reacting to the surprise you prepared",
        "couple_content",
    )]))]);
    let weights = WeightSet::new();
    let composition = composer().compose(&analysis, &input(&[], &weights)).await;

    assert_eq!(composition.origin, IdeaOrigin::Generated);
    assert_eq!(
        composition.idea.title,
        "Film her reacting to the surprise you prepared"
    );
    assert!(composition.body.contains("Film her reacting to the surprise you prepared"));
    assert_eq!(analysis.calls(), 1);
}

#[tokio::test]
async fn generic_reminder_is_replaced_before_dispatch() {
    let analysis = ScriptedAnalysis::new(vec![
        Ok("Don't forget to post today 😊".to_owned()),
        Ok("Don't forget to post today 😊".to_owned()),
    ]);
    let weights = WeightSet::new();
    let composition = composer().compose(&analysis, &input(&[], &weights)).await;

    assert_eq!(composition.origin, IdeaOrigin::Default);
    assert_eq!(composition.rejected, 2);
    assert_eq!(analysis.calls(), 2, "exactly one regeneration");
    assert!(!composition.body.contains("Don't forget to post today"));
    assert!(check_specificity(&composition.idea.text()).is_specific());
    assert!(composition.idea.description.contains("Maya"));
}

#[tokio::test]
async fn regeneration_is_used_when_it_passes() {
    let analysis = ScriptedAnalysis::new(vec![
        Ok(json(&[("Post something fun", "couple_content")])),
        Ok(json(&[("Record 3 takes of the chorus", "music_content")])),
    ]);
    let weights = WeightSet::new();
    let composition = composer().compose(&analysis, &input(&[], &weights)).await;

    assert_eq!(composition.origin, IdeaOrigin::Regenerated);
    assert_eq!(composition.idea.pattern, "music_content");
    let prompts = analysis.prompts.lock().unwrap();
    assert!(prompts[1].contains("- Post something fun"));
}

#[tokio::test]
async fn analysis_failure_goes_straight_to_default() {
    let analysis = ScriptedAnalysis::new(vec![Err(AnalysisError::Unavailable { status: 503 })]);
    let weights = WeightSet::new();
    let composition = composer().compose(&analysis, &input(&[], &weights)).await;

    assert_eq!(composition.origin, IdeaOrigin::Default);
    assert_eq!(analysis.calls(), 1);
    assert!(composition.body.starts_with("☀️"));
}

#[test]
fn weight_decides_and_ties_keep_order() {
    let mut weights = WeightSet::new();
    weights.set("music_content", 2.0);
    let candidates = vec![
        Candidate {
            title: "Record 3 takes of the bridge".to_owned(),
            pattern: Some("couple_content".to_owned()),
            ..Candidate::default()
        },
        Candidate {
            title: "Sing the chorus at 20:30 live".to_owned(),
            pattern: Some("music_content".to_owned()),
            ..Candidate::default()
        },
        Candidate {
            title: "Record 2 takes of the intro".to_owned(),
            pattern: Some("couple_content".to_owned()),
            ..Candidate::default()
        },
    ];
    let (ranked, rejected) = composer().rank(candidates, &input(&[], &weights));
    assert!(rejected.is_empty());
    let titles: Vec<&str> = ranked.iter().map(|s| s.idea.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Sing the chorus at 20:30 live",
            "Record 3 takes of the bridge",
            "Record 2 takes of the intro"
        ]
    );
    assert_eq!(ranked[0].idea.predicted_engagement, Some(400.0));
    assert_eq!(ranked[1].idea.predicted_engagement, Some(200.0));
}

#[test]
fn trend_mention_adds_bonus_and_links_trend() {
    let weights = WeightSet::new();
    let trends = [trend(7, "Acoustic covers are back"), trend(9, "Duet challenge explodes")];
    let candidates = vec![
        Candidate {
            title: "Record 3 takes of the bridge".to_owned(),
            ..Candidate::default()
        },
        Candidate {
            title: "Film a duet challenge with Maya in 30 seconds".to_owned(),
            ..Candidate::default()
        },
    ];
    let (ranked, _) = composer().rank(candidates, &input(&trends, &weights));
    assert_eq!(ranked[0].idea.trend_id, Some(9));
    assert!((ranked[0].score - (1.0 + TREND_BONUS)).abs() < f64::EPSILON);
    assert_eq!(ranked[0].idea.pattern, "couple_content", "default pattern");
    assert_eq!(ranked[1].idea.trend_id, None);

    let body = composer().render(MessageCategory::Morning, &ranked[0].idea, &trends);
    let duet = body.find("Duet challenge explodes").unwrap();
    let covers = body.find("Acoustic covers are back").unwrap();
    assert!(duet < covers, "matched trend is listed first");
}

#[tokio::test]
async fn ideas_respects_limit() {
    let analysis = ScriptedAnalysis::new(vec![Ok(json(&[
        ("Record 3 takes of the bridge", "music_content"),
        ("Record 2 takes of the intro", "music_content"),
        ("Record 4 takes of the outro", "music_content"),
    ]))]);
    let weights = WeightSet::new();
    let batch = composer().ideas(&analysis, &input(&[], &weights), 2).await;
    assert_eq!(batch.ideas.len(), 2);
    assert_eq!(batch.origin, IdeaOrigin::Generated);
}
