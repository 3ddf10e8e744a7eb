use std::fmt;
use std::str::FromStr;

use anyhow::{Error, bail};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

/// Units offered by the tagging form, in display order.
pub const DEFAULT_UNITS: [&str; 6] = [
    "Unit 8: Application of Percentages",
    "Unit 9: Rational Numbers",
    "Unit 10: Algebraic Expressions & Equations",
    "Unit 11: Mensuration",
    "Unit 12: Sets",
    "Unit 13: Probability",
];

/// Unit value of a slot nobody has tagged yet. Such slots are left out of the blueprint.
pub const SELECT_PLACEHOLDER: &str = "Select";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    #[serde(rename = "HOTS")]
    Hots,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Medium, Self::Hots];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hots => "HOTS",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::ALL.into_iter().find(|d| d.as_str() == s.trim()) {
            Some(difficulty) => Ok(difficulty),
            None => bail!("unknown difficulty `{s}`"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Marks {
    One,
    Two,
    Three,
}

impl Marks {
    pub const ALL: [Marks; 3] = [Self::One, Self::Two, Self::Three];

    pub fn value(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl fmt::Display for Marks {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl FromStr for Marks {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Self::One),
            "2" => Ok(Self::Two),
            "3" => Ok(Self::Three),
            other => bail!("marks must be 1, 2 or 3, got `{other}`"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QuestionType {
    #[default]
    Objective,
    Subjective,
}

impl QuestionType {
    pub const ALL: [QuestionType; 2] = [Self::Objective, Self::Subjective];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Objective => "Objective",
            Self::Subjective => "Subjective",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::ALL.into_iter().find(|t| t.as_str() == s.trim()) {
            Some(kind) => Ok(kind),
            None => bail!("unknown question type `{s}`"),
        }
    }
}

/// One row of the question mapping. Field names double as the CSV headers.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaggedQuestion {
    pub question: String,
    pub unit: String,
    pub difficulty: Difficulty,
    #[serde_as(as = "DisplayFromStr")]
    pub marks: Marks,
    #[serde(rename = "Type")]
    pub kind: QuestionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubPart {
    First,
    Second,
}

impl SubPart {
    fn numeral(self) -> &'static str {
        match self {
            Self::First => "i",
            Self::Second => "ii",
        }
    }
}

/// A place on the paper that can be tagged: a whole question or one of its sub-questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionSlot {
    pub number: u8,
    pub part: Option<SubPart>,
    pub marks: Marks,
}

impl QuestionSlot {
    /// `Q1`, `Q4(i)`, `Q4(ii)`.
    pub fn label(&self) -> String {
        match self.part {
            None => format!("Q{}", self.number),
            Some(part) => format!("Q{}({})", self.number, part.numeral()),
        }
    }

    /// Form-field suffix, e.g. `q4_ii`.
    pub fn key(&self) -> String {
        match self.part {
            None => format!("q{}", self.number),
            Some(part) => format!("q{}_{}", self.number, part.numeral()),
        }
    }
}

/// Q1 to Q3 are single 1-mark questions; Q4 to Q10 each have a 2-mark (i) and a 3-mark (ii).
pub fn paper_layout() -> Vec<QuestionSlot> {
    let singles = (1..=3).map(|number| QuestionSlot {
        number,
        part: None,
        marks: Marks::One,
    });
    let split = (4..=10).flat_map(|number| {
        [
            QuestionSlot {
                number,
                part: Some(SubPart::First),
                marks: Marks::Two,
            },
            QuestionSlot {
                number,
                part: Some(SubPart::Second),
                marks: Marks::Three,
            },
        ]
    });
    singles.chain(split).collect()
}

/// What the user picked for one slot. The default is the untouched form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSelection {
    pub unit: String,
    pub difficulty: Difficulty,
    pub kind: QuestionType,
}

impl SlotSelection {
    pub fn is_tagged(&self) -> bool {
        let unit = self.unit.trim();
        !unit.is_empty() && unit != SELECT_PLACEHOLDER
    }
}

impl Default for SlotSelection {
    fn default() -> Self {
        Self {
            unit: SELECT_PLACEHOLDER.to_owned(),
            difficulty: Difficulty::default(),
            kind: QuestionType::default(),
        }
    }
}

/// Pairs each slot with its selection and keeps the tagged ones, in paper order. Marks always
/// come from the slot.
pub fn tag_questions(layout: &[QuestionSlot], selections: &[SlotSelection]) -> Vec<TaggedQuestion> {
    layout
        .iter()
        .zip(selections)
        .filter(|(_, selection)| selection.is_tagged())
        .map(|(slot, selection)| TaggedQuestion {
            question: slot.label(),
            unit: selection.unit.trim().to_owned(),
            difficulty: selection.difficulty,
            marks: slot.marks,
            kind: selection.kind,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test]
    fn layout_has_seventeen_slots_worth_thirty_eight_marks() {
        let layout = paper_layout();
        assert_eq!(layout.len(), 17);
        assert_eq!(layout.iter().map(|slot| slot.marks.value()).sum::<usize>(), 38);

        let labels = layout.iter().map(QuestionSlot::label).collect::<Vec<_>>();
        assert_eq!(&labels[..5], ["Q1", "Q2", "Q3", "Q4(i)", "Q4(ii)"]);
        assert_eq!(labels.last().map(String::as_str), Some("Q10(ii)"));
    }

    #[test]
    fn slot_keys_are_unique() {
        let layout = paper_layout();
        let mut keys = layout.iter().map(QuestionSlot::key).collect::<Vec<_>>();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), layout.len());
    }

    #[test]
    fn untagged_slots_are_skipped() {
        let layout = paper_layout();
        let mut selections = vec![SlotSelection::default(); layout.len()];
        selections[0].unit = DEFAULT_UNITS[0].to_owned();
        selections[4] = SlotSelection {
            unit: DEFAULT_UNITS[3].to_owned(),
            difficulty: Difficulty::Hots,
            kind: QuestionType::Subjective,
        };
        selections[5].unit = "  ".to_owned();

        let tagged = tag_questions(&layout, &selections);

        assert_eq!(
            tagged,
            vec![
                TaggedQuestion {
                    question: "Q1".to_owned(),
                    unit: DEFAULT_UNITS[0].to_owned(),
                    difficulty: Difficulty::Easy,
                    marks: Marks::One,
                    kind: QuestionType::Objective,
                },
                TaggedQuestion {
                    question: "Q4(ii)".to_owned(),
                    unit: DEFAULT_UNITS[3].to_owned(),
                    difficulty: Difficulty::Hots,
                    marks: Marks::Three,
                    kind: QuestionType::Subjective,
                },
            ]
        );
    }

    #[test_case("1", Marks::One ; "one")]
    #[test_case(" 3 ", Marks::Three ; "padded three")]
    fn parses_marks(s: &str, expected: Marks) {
        assert_eq!(s.parse::<Marks>().unwrap(), expected);
    }

    #[test_case("4")]
    #[test_case("two")]
    fn rejects_bad_marks(s: &str) {
        assert!(s.parse::<Marks>().is_err());
    }

    #[test]
    fn difficulty_round_trips_its_label() {
        for difficulty in Difficulty::ALL {
            assert_eq!(difficulty.to_string().parse::<Difficulty>().unwrap(), difficulty);
        }
        assert!("Hard".parse::<Difficulty>().is_err());
    }
}
