use crate::commands::reports::{DetailedReport, SummaryRow};

pub const SUMMARY_HEADER: [&str; 6] = [
    "Survey ID",
    "Survey Name",
    "Status",
    "Number of Questions",
    "Date Created",
    "Total Responses",
];

pub const SUMMARY_FILE_NAME: &str = "Survey_Summary_Report.csv";

/// Double-quotes a cell, doubling any quote inside it.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn line<I, S>(cells: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    cells
        .into_iter()
        .map(|c| quote(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn summary_csv(rows: &[SummaryRow]) -> String {
    let mut out = String::new();
    out.push_str(&SUMMARY_HEADER.join(","));
    out.push('\n');
    for row in rows {
        out.push_str(&line([
            row.survey_id.clone(),
            row.survey_name.clone(),
            row.status.to_string(),
            row.num_questions.to_string(),
            row.date_created.clone(),
            row.total_responses.to_string(),
        ]));
        out.push('\n');
    }
    out
}

/// Column titles as the header, one line per submission. Missing cells are
/// written empty.
pub fn detailed_csv(report: &DetailedReport) -> String {
    let mut out = line(report.columns.iter().map(|c| c.title.as_str()));
    out.push('\n');
    for row in &report.rows {
        out.push_str(&line(row.iter().map(|cell| cell.as_deref().unwrap_or(""))));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{detailed_csv, quote, summary_csv};
    use crate::commands::reports::{DetailedReport, ReportColumn, SummaryRow};
    use crate::survey::types::SurveyStatus;

    #[test]
    fn quotes_and_doubles_inner_quotes() {
        assert_eq!(quote(r#"say "hi", ok"#), r#""say ""hi"", ok""#);
        assert_eq!(quote(""), r#""""#);
    }

    #[test]
    fn summary_has_fixed_header_and_quoted_values() {
        let rows = vec![SummaryRow {
            survey_id: "s1".to_string(),
            survey_name: "Health, 2024".to_string(),
            status: SurveyStatus::Active,
            creator: "admin".to_string(),
            num_questions: 2,
            date_created: "2024-05-01".to_string(),
            total_responses: 7,
        }];
        let csv = summary_csv(&rows);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Survey ID,Survey Name,Status,Number of Questions,Date Created,Total Responses")
        );
        assert_eq!(
            lines.next(),
            Some(r#""s1","Health, 2024","Active","2","2024-05-01","7""#)
        );
    }

    #[test]
    fn detailed_uses_titles_and_blank_missing_cells() {
        let report = DetailedReport {
            survey_id: "s1".to_string(),
            survey_name: "S".to_string(),
            columns: vec![
                ReportColumn {
                    key: "Timestamp".to_string(),
                    title: "Submission Date".to_string(),
                },
                ReportColumn {
                    key: "Q1".to_string(),
                    title: "Pets?".to_string(),
                },
            ],
            rows: vec![
                vec![Some("2024-05-01 10:00:00".to_string()), Some("Cat, Dog".to_string())],
                vec![Some("2024-05-02 10:00:00".to_string()), None],
            ],
            stale_question_ids: Vec::new(),
            outdated_responses: 0,
        };
        assert_eq!(
            detailed_csv(&report),
            "\"Submission Date\",\"Pets?\"\n\"2024-05-01 10:00:00\",\"Cat, Dog\"\n\"2024-05-02 10:00:00\",\"\"\n"
        );
    }
}
