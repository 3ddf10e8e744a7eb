//! Exam blueprint: how many marks of each size every unit contributes to a question paper.

use itertools::Itertools;
use serde::Serialize;

pub use self::export::{
    BLUEPRINT_FILE_NAME, MAPPING_FILE_NAME, blueprint_csv, question_mapping_csv,
    read_tagged_questions,
};
pub use self::question::{
    DEFAULT_UNITS, Difficulty, Marks, QuestionSlot, QuestionType, SELECT_PLACEHOLDER,
    SlotSelection, SubPart, TaggedQuestion, paper_layout, tag_questions,
};

pub mod export;
pub mod question;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlueprintRow {
    #[serde(rename = "Unit")]
    pub unit: String,
    #[serde(rename = "1 Mark")]
    pub one_mark: usize,
    #[serde(rename = "2 Marks")]
    pub two_marks: usize,
    #[serde(rename = "3 Marks")]
    pub three_marks: usize,
    #[serde(rename = "Total Marks")]
    pub total_marks: usize,
}

impl BlueprintRow {
    fn new(unit: &str, one_mark: usize, two_marks: usize, three_marks: usize) -> Self {
        Self {
            unit: unit.to_owned(),
            one_mark,
            two_marks,
            three_marks,
            total_marks: one_mark + 2 * two_marks + 3 * three_marks,
        }
    }

    pub fn count(&self, marks: Marks) -> usize {
        match marks {
            Marks::One => self.one_mark,
            Marks::Two => self.two_marks,
            Marks::Three => self.three_marks,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Blueprint {
    pub rows: Vec<BlueprintRow>,
    pub total_marks: usize,
}

impl Blueprint {
    /// Nothing tagged yet. This is the normal starting state, not an error.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Counts questions per `(unit, marks)` and pivots marks into columns. Units appear in the order
/// they are first tagged; a marks size a unit never uses counts as zero.
pub fn aggregate(questions: &[TaggedQuestion]) -> Blueprint {
    let counts = questions
        .iter()
        .map(|question| (question.unit.as_str(), question.marks))
        .counts();

    let rows = questions
        .iter()
        .map(|question| question.unit.as_str())
        .unique()
        .map(|unit| {
            let count = |marks: Marks| counts.get(&(unit, marks)).copied().unwrap_or(0);
            BlueprintRow::new(unit, count(Marks::One), count(Marks::Two), count(Marks::Three))
        })
        .collect::<Vec<_>>();

    let total_marks = rows.iter().map(|row| row.total_marks).sum();
    Blueprint { rows, total_marks }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn tagged(question: &str, unit: &str, marks: Marks) -> TaggedQuestion {
        TaggedQuestion {
            question: question.to_owned(),
            unit: unit.to_owned(),
            difficulty: Difficulty::Medium,
            marks,
            kind: QuestionType::Subjective,
        }
    }

    #[test]
    fn pivots_marks_per_unit() {
        let questions = [
            tagged("Q4(i)", "U1", Marks::Two),
            tagged("Q5(i)", "U1", Marks::Two),
            tagged("Q4(ii)", "U2", Marks::Three),
        ];

        let blueprint = aggregate(&questions);

        assert_eq!(
            blueprint.rows,
            vec![
                BlueprintRow {
                    unit: "U1".to_owned(),
                    one_mark: 0,
                    two_marks: 2,
                    three_marks: 0,
                    total_marks: 4,
                },
                BlueprintRow {
                    unit: "U2".to_owned(),
                    one_mark: 0,
                    two_marks: 0,
                    three_marks: 1,
                    total_marks: 3,
                },
            ]
        );
        assert_eq!(blueprint.total_marks, 7);
    }

    #[test]
    fn empty_input_gives_empty_blueprint() {
        let blueprint = aggregate(&[]);
        assert!(blueprint.is_empty());
        assert_eq!(blueprint.total_marks, 0);
    }

    #[test]
    fn units_keep_first_appearance_order() {
        let questions = [
            tagged("Q1", "Unit 12: Sets", Marks::One),
            tagged("Q2", "Unit 8: Application of Percentages", Marks::One),
            tagged("Q3", "Unit 12: Sets", Marks::One),
        ];
        let units = aggregate(&questions)
            .rows
            .into_iter()
            .map(|row| row.unit)
            .collect::<Vec<_>>();
        assert_eq!(units, vec!["Unit 12: Sets", "Unit 8: Application of Percentages"]);
    }

    #[test]
    fn total_is_weighted_sum_of_counts() {
        let layout = paper_layout();
        let selections = layout
            .iter()
            .enumerate()
            .map(|(index, _)| SlotSelection {
                unit: DEFAULT_UNITS[index % DEFAULT_UNITS.len()].to_owned(),
                ..SlotSelection::default()
            })
            .collect::<Vec<_>>();
        let blueprint = aggregate(&tag_questions(&layout, &selections));

        let weighted = blueprint
            .rows
            .iter()
            .map(|row| Marks::ALL.iter().map(|m| m.value() * row.count(*m)).sum::<usize>())
            .sum::<usize>();
        assert_eq!(blueprint.total_marks, weighted);
        assert_eq!(blueprint.total_marks, 38);
        assert_eq!(blueprint.rows.len(), DEFAULT_UNITS.len());
    }
}
