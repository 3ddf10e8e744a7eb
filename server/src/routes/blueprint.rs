use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, RawQuery, State};
use axum::http::header;
use axum::response::{Html, IntoResponse};
use itertools::Itertools;
use librollcall::blueprint::{
    self, BLUEPRINT_FILE_NAME, Blueprint, DEFAULT_UNITS, Difficulty, MAPPING_FILE_NAME,
    QuestionSlot, QuestionType, SELECT_PLACEHOLDER, SlotSelection, SubPart, TaggedQuestion,
    paper_layout, tag_questions,
};
use serde::Serialize;

use crate::templates::BLUEPRINT;
use crate::{AppError, AppState};

type Params = HashMap<String, String>;

/// Reads one selection per slot from fields named `unit_<key>`, `difficulty_<key>` and
/// `type_<key>`. Absent fields keep the untouched form state.
fn selections(layout: &[QuestionSlot], params: &Params) -> Result<Vec<SlotSelection>, AppError> {
    layout
        .iter()
        .map(|slot| -> Result<SlotSelection, AppError> {
            let key = slot.key();
            let field = |prefix: &str| params.get(&format!("{prefix}_{key}")).map(String::as_str);
            let mut selection = SlotSelection::default();
            if let Some(unit) = field("unit") {
                selection.unit = unit.to_owned();
            }
            if let Some(difficulty) = field("difficulty") {
                selection.difficulty = difficulty
                    .parse()
                    .map_err(|err| AppError::BadRequest(format!("{}: {err}", slot.label())))?;
            }
            if let Some(kind) = field("type") {
                selection.kind = kind
                    .parse()
                    .map_err(|err| AppError::BadRequest(format!("{}: {err}", slot.label())))?;
            }
            Ok(selection)
        })
        .collect()
}

type Tagging = (Vec<QuestionSlot>, Vec<SlotSelection>, Vec<TaggedQuestion>);

fn tagged_from(params: &Params) -> Result<Tagging, AppError> {
    let layout = paper_layout();
    let selections = selections(&layout, params)?;
    let tagged = tag_questions(&layout, &selections);
    Ok((layout, selections, tagged))
}

#[derive(Serialize)]
struct OptionView {
    value: String,
    selected: bool,
}

fn options<'a>(values: impl IntoIterator<Item = &'a str>, selected: &str) -> Vec<OptionView> {
    values
        .into_iter()
        .map(|value| OptionView {
            value: value.to_owned(),
            selected: value == selected,
        })
        .collect()
}

#[derive(Serialize)]
struct SlotView {
    key: String,
    heading: Option<String>,
    marks: usize,
    units: Vec<OptionView>,
    difficulties: Vec<OptionView>,
    kinds: Vec<OptionView>,
}

#[derive(Serialize)]
struct QuestionView {
    number: u8,
    slots: Vec<SlotView>,
}

#[derive(Serialize)]
struct SummaryRowView<'a> {
    unit: &'a str,
    one_mark: usize,
    two_marks: usize,
    three_marks: usize,
    total_marks: usize,
}

#[derive(Serialize)]
struct BlueprintView<'a> {
    questions: Vec<QuestionView>,
    mapping: &'a [TaggedQuestion],
    summary: Vec<SummaryRowView<'a>>,
    total_marks: usize,
    summary_href: String,
    mapping_href: String,
}

fn slot_view(slot: &QuestionSlot, selection: &SlotSelection) -> SlotView {
    let heading = slot.part.map(|part| {
        let numeral = match part {
            SubPart::First => "(i)",
            SubPart::Second => "(ii)",
        };
        format!("{numeral} – {} Marks", slot.marks)
    });
    SlotView {
        key: slot.key(),
        heading,
        marks: slot.marks.value(),
        units: options(
            std::iter::once(SELECT_PLACEHOLDER).chain(DEFAULT_UNITS),
            selection.unit.trim(),
        ),
        difficulties: options(
            Difficulty::ALL.map(Difficulty::as_str),
            selection.difficulty.as_str(),
        ),
        kinds: options(QuestionType::ALL.map(QuestionType::as_str), selection.kind.as_str()),
    }
}

fn summary_rows(blueprint: &Blueprint) -> Vec<SummaryRowView<'_>> {
    blueprint
        .rows
        .iter()
        .map(|row| SummaryRowView {
            unit: &row.unit,
            one_mark: row.one_mark,
            two_marks: row.two_marks,
            three_marks: row.three_marks,
            total_marks: row.total_marks,
        })
        .collect()
}

fn download_href(file_name: &str, query: Option<&str>) -> String {
    match query {
        Some(query) if !query.is_empty() => format!("/blueprint/{file_name}?{query}"),
        _ => format!("/blueprint/{file_name}"),
    }
}

pub async fn page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Params>,
    RawQuery(query): RawQuery,
) -> Result<Html<String>, AppError> {
    let (layout, selections, tagged) = tagged_from(&params)?;
    let blueprint = blueprint::aggregate(&tagged);

    let questions = layout
        .iter()
        .zip(&selections)
        .group_by(|(slot, _)| slot.number)
        .into_iter()
        .map(|(number, slots)| QuestionView {
            number,
            slots: slots
                .map(|(slot, selection)| slot_view(slot, selection))
                .collect(),
        })
        .collect();

    let view = BlueprintView {
        questions,
        mapping: &tagged,
        summary: summary_rows(&blueprint),
        total_marks: blueprint.total_marks,
        summary_href: download_href(BLUEPRINT_FILE_NAME, query.as_deref()),
        mapping_href: download_href(MAPPING_FILE_NAME, query.as_deref()),
    };
    Ok(state.templates.render(BLUEPRINT, &view)?)
}

fn csv_download(file_name: &str, body: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
}

pub async fn summary_csv(Query(params): Query<Params>) -> Result<impl IntoResponse, AppError> {
    let (_, _, tagged) = tagged_from(&params)?;
    let body = blueprint::blueprint_csv(&blueprint::aggregate(&tagged))?;
    Ok(csv_download(BLUEPRINT_FILE_NAME, body))
}

pub async fn mapping_csv(Query(params): Query<Params>) -> Result<impl IntoResponse, AppError> {
    let (_, _, tagged) = tagged_from(&params)?;
    let body = blueprint::question_mapping_csv(&tagged)?;
    Ok(csv_download(MAPPING_FILE_NAME, body))
}
