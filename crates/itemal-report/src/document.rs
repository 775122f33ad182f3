//! Annotated JSON / YAML documents.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};

use itemal_core::document::ExamDocument;
use itemal_core::model::Exam;

/// Document for an analyzed exam, stamped with the processing time.
pub fn annotated_document(exam: &Exam) -> ExamDocument {
    let mut doc = ExamDocument::from_exam(exam);
    doc.processed_timestamp = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
    doc
}

/// Serialize an analyzed exam to JSON, one document per line unless `pretty`.
pub fn generate_json(exam: &Exam, pretty: bool) -> Result<String> {
    let doc = annotated_document(exam);
    let mut json = if pretty {
        serde_json::to_string_pretty(&doc)
    } else {
        serde_json::to_string(&doc)
    }
    .with_context(|| format!("failed to serialize exam {}", exam.id))?;
    json.push('\n');
    Ok(json)
}

/// Serialize an analyzed exam to a YAML document.
pub fn generate_yaml(exam: &Exam) -> Result<String> {
    let yaml = serde_yaml::to_string(&annotated_document(exam))
        .with_context(|| format!("failed to serialize exam {}", exam.id))?;
    Ok(format!("---\n{yaml}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use itemal_core::model::{IdSequence, Options};

    const INPUT: &str = r#"{
        "examId": 77, "course": "PHYS 2", "instructor": "OKAFOR", "date": "090121",
        "options": {"isReverseOrder": true},
        "questionSets": [
            {"answerKey": [3, 1], "answerRange": 3,
             "responses": [
                {"group": "am", "answers": [[3, 1], [3, 2], [1, 1]]},
                {"group": "pm", "answers": [[3, 3], [2, 1], [3, 1]]}
             ]}
        ]
    }"#;

    fn analyzed() -> Exam {
        let mut exam = ExamDocument::from_json_str(INPUT)
            .unwrap()
            .into_exam(&mut IdSequence::new(), &Options::default())
            .unwrap();
        exam.reverse_answer_ordering_if_necessary();
        itemal_core::analyze(&mut exam).unwrap();
        exam
    }

    #[test]
    fn json_carries_statistics() {
        let json = generate_json(&analyzed(), false).unwrap();
        assert!(json.ends_with('\n'));
        assert_eq!(json.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["processedTimestamp"].is_string());
        assert_eq!(value["statisticalSummary"]["studentCount"], 6);
        assert_eq!(value["statisticalSummary"]["questionCount"], 2);
        let items = &value["questionSets"][0]["statisticalSummary"]["items"];
        assert_eq!(items.as_array().unwrap().len(), 2);
        assert_eq!(items[0]["questionNumber"], 1);
    }

    #[test]
    fn json_keeps_source_answer_numbering() {
        let json = generate_json(&analyzed(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let set = &value["questionSets"][0];
        assert_eq!(set["answerKey"], serde_json::json!([3, 1]));
        assert_eq!(set["responses"][0]["answers"][0], serde_json::json!([3, 1]));
        assert_eq!(set["responses"][1]["group"], "pm");
    }

    #[test]
    fn written_json_reads_back() {
        let exam = analyzed();
        let json = generate_json(&exam, true).unwrap();
        let reread = ExamDocument::from_json_str(&json)
            .unwrap()
            .into_exam(&mut IdSequence::new(), &Options::default())
            .unwrap();
        assert_eq!(reread.id, 77);
        assert_eq!(reread.group_ids(), exam.group_ids());
        assert!(reread.statistical_summary().is_none());
        assert_eq!(
            reread.sections()[0].groups()[0].answers(),
            &[vec![3, 1], vec![3, 2], vec![1, 1]]
        );
    }

    #[test]
    fn yaml_reads_back() {
        let yaml = generate_yaml(&analyzed()).unwrap();
        assert!(yaml.starts_with("---\n"));
        assert!(yaml.contains("processedTimestamp"));
        let doc = ExamDocument::from_yaml_str(&yaml).unwrap();
        assert_eq!(doc.exam_id, Some(77));
        assert_eq!(doc.question_sets.len(), 1);
    }
}
