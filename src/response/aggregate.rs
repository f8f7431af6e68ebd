use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::survey::types::{Answer, Question, QuestionType, Response, Survey};

/// What to do with answers keyed by question ids the survey no longer has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleAnswerPolicy {
    Tolerate,
    Drop,
    #[default]
    Flag,
}

impl StaleAnswerPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tolerate => "tolerate",
            Self::Drop => "drop",
            Self::Flag => "flag",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub question_id: String,
    /// Label to count, labels taken verbatim from the stored answers.
    pub counts: BTreeMap<String, usize>,
    /// One per scalar answer, one per selected label for list answers.
    pub total_tallied: usize,
    pub responses_considered: usize,
    /// Set when the question id is not part of the survey any more.
    pub stale: bool,
}

impl Tally {
    fn empty(question_id: &str) -> Self {
        Self {
            question_id: question_id.to_string(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_tallied == 0
    }
}

/// Shown in place of the empty label an unanswered optional question stores.
pub const BLANK_LABEL: &str = "(no answer)";

pub fn shown_label(label: &str) -> &str {
    if label.is_empty() {
        BLANK_LABEL
    } else {
        label
    }
}

/// Scalar answers count once per response, the empty string included.
/// List answers count each distinct non-empty label.
pub fn aggregate(survey_id: &str, question_id: &str, responses: &[Response]) -> Tally {
    let mut tally = Tally::empty(question_id);
    for response in responses.iter().filter(|r| r.survey_id == survey_id) {
        tally.responses_considered += 1;
        match response.answer_for(question_id) {
            Some(Answer::Scalar(label)) => {
                *tally.counts.entry(label.clone()).or_insert(0) += 1;
                tally.total_tallied += 1;
            }
            Some(Answer::List(labels)) => {
                let distinct: BTreeSet<&String> = labels.iter().filter(|l| !l.is_empty()).collect();
                for label in distinct {
                    *tally.counts.entry(label.clone()).or_insert(0) += 1;
                    tally.total_tallied += 1;
                }
            }
            None => {}
        }
    }
    tally
}

/// Tally for one question of `survey`, applying `policy` when the id is stale.
pub fn aggregate_question(
    survey: &Survey,
    question_id: &str,
    responses: &[Response],
    policy: StaleAnswerPolicy,
) -> Tally {
    let known = survey.question(question_id).is_some();
    if !known && policy == StaleAnswerPolicy::Drop {
        return Tally::empty(question_id);
    }
    let mut tally = aggregate(&survey.id, question_id, responses);
    tally.stale = !known && policy == StaleAnswerPolicy::Flag;
    tally
}

/// Ordering key for RATING labels. Labels that are not integers sort as 0.
pub fn rating_sort_key(label: &str) -> i32 {
    label.trim().parse::<i32>().unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
    /// `label (p.p%)`
    pub display_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarEntry {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ChartView {
    Pie(Vec<PieSlice>),
    Bar(Vec<BarEntry>),
    Empty,
}

pub fn chart_view(question: &Question, tally: &Tally) -> ChartView {
    if tally.is_empty() || !question.question_type.is_visualizable() {
        return ChartView::Empty;
    }
    if question.question_type == QuestionType::Rating {
        let mut entries: Vec<BarEntry> = tally
            .counts
            .iter()
            .map(|(label, count)| BarEntry {
                label: label.clone(),
                count: *count,
            })
            .collect();
        entries.sort_by_key(|e| rating_sort_key(&e.label));
        return ChartView::Bar(entries);
    }

    let total = tally.total_tallied as f64;
    let listed = question
        .options
        .iter()
        .filter(|o| tally.counts.contains_key(*o));
    let unlisted = tally.counts.keys().filter(|k| !question.options.contains(*k));
    let slices = listed
        .chain(unlisted)
        .map(|label| {
            let count = tally.counts.get(label).copied().unwrap_or(0);
            let percentage = count as f64 / total * 100.0;
            PieSlice {
                label: label.clone(),
                count,
                percentage,
                display_label: format!("{} ({percentage:.1}%)", shown_label(label)),
            }
        })
        .collect();
    ChartView::Pie(slices)
}
