//! CSV downloads for the blueprint page. Both files are UTF-8, comma separated, with a header row
//! even when there are no data rows.

use std::io;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;

use super::{Blueprint, TaggedQuestion};

pub const BLUEPRINT_FILE_NAME: &str = "Blueprint_Summary.csv";
pub const MAPPING_FILE_NAME: &str = "Question_Mapping.csv";

const BLUEPRINT_HEADERS: [&str; 5] = ["Unit", "1 Mark", "2 Marks", "3 Marks", "Total Marks"];
const MAPPING_HEADERS: [&str; 5] = ["Question", "Unit", "Difficulty", "Marks", "Type"];

fn to_csv<T: Serialize>(headers: &[&str], records: &[T]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv: {}", err.error()))
}

pub fn blueprint_csv(blueprint: &Blueprint) -> Result<Vec<u8>> {
    to_csv(&BLUEPRINT_HEADERS, &blueprint.rows).context("failed to write blueprint summary")
}

pub fn question_mapping_csv(questions: &[TaggedQuestion]) -> Result<Vec<u8>> {
    to_csv(&MAPPING_HEADERS, questions).context("failed to write question mapping")
}

/// Reads a question mapping in the same shape [`question_mapping_csv`] writes.
pub fn read_tagged_questions(reader: impl io::Read) -> Result<Vec<TaggedQuestion>> {
    ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize::<TaggedQuestion>()
        .enumerate()
        .map(|(index, record)| {
            record.with_context(|| format!("invalid question mapping on data row {}", index + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::blueprint::{Difficulty, Marks, QuestionType, aggregate};

    fn questions() -> Vec<TaggedQuestion> {
        vec![
            TaggedQuestion {
                question: "Q1".to_owned(),
                unit: "Unit 12: Sets".to_owned(),
                difficulty: Difficulty::Hots,
                marks: Marks::One,
                kind: QuestionType::Objective,
            },
            TaggedQuestion {
                question: "Q4(i)".to_owned(),
                unit: "Unit 10: Algebraic Expressions & Equations".to_owned(),
                difficulty: Difficulty::Easy,
                marks: Marks::Two,
                kind: QuestionType::Subjective,
            },
        ]
    }

    #[test]
    fn writes_blueprint_summary() {
        let csv = blueprint_csv(&aggregate(&questions())).unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "Unit,1 Mark,2 Marks,3 Marks,Total Marks\n\
             Unit 12: Sets,1,0,0,1\n\
             Unit 10: Algebraic Expressions & Equations,0,1,0,2\n"
        );
    }

    #[test]
    fn writes_question_mapping() {
        let csv = question_mapping_csv(&questions()).unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "Question,Unit,Difficulty,Marks,Type\n\
             Q1,Unit 12: Sets,HOTS,1,Objective\n\
             Q4(i),Unit 10: Algebraic Expressions & Equations,Easy,2,Subjective\n"
        );
    }

    #[test]
    fn empty_files_still_have_headers() {
        let csv = blueprint_csv(&Blueprint::default()).unwrap();
        assert_eq!(String::from_utf8(csv).unwrap(), "Unit,1 Mark,2 Marks,3 Marks,Total Marks\n");
    }

    #[test]
    fn reads_back_a_mapping() {
        let csv = question_mapping_csv(&questions()).unwrap();
        assert_eq!(read_tagged_questions(csv.as_slice()).unwrap(), questions());
    }

    #[test]
    fn reports_the_bad_row() {
        let input = "Question,Unit,Difficulty,Marks,Type\nQ1,U1,Easy,5,Objective\n";
        let err = read_tagged_questions(input.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("data row 1"), "{err:#}");
    }
}
