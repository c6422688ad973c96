//! Domain constants as one serializable table, so a form layer renders the
//! exact tokens the validator accepts.

use serde::Serialize;

use super::enums::{
    DayOfWeek, DurationType, FoodRelation, RecurrencePattern, FIRST_DAY_OF_MONTH,
    LAST_DAY_OF_MONTH,
};

#[derive(Debug, Serialize)]
pub struct TokenOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationOption {
    pub value: String,
    pub label: String,
    /// Recurrence patterns a form offers for this duration type.
    pub recurrence_options: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantsTable {
    pub duration_types: Vec<DurationOption>,
    pub recurrence_patterns: Vec<TokenOption>,
    pub food_relations: Vec<TokenOption>,
    pub days_of_week: Vec<TokenOption>,
    pub days_of_month: Vec<i64>,
}

fn options<'a, T, I>(items: I, value: fn(&T) -> &str, label: fn(&T) -> &str) -> Vec<TokenOption>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .map(|item| TokenOption {
            value: value(item).to_string(),
            label: label(item).to_string(),
        })
        .collect()
}

pub fn constants_table() -> ConstantsTable {
    ConstantsTable {
        duration_types: DurationType::ALL
            .iter()
            .map(|d| DurationOption {
                value: d.as_str().to_string(),
                label: d.label().to_string(),
                recurrence_options: RecurrencePattern::options_for(d)
                    .iter()
                    .map(|p| p.as_str().to_string())
                    .collect(),
            })
            .collect(),
        recurrence_patterns: options(
            RecurrencePattern::ALL,
            RecurrencePattern::as_str,
            RecurrencePattern::label,
        ),
        food_relations: options(FoodRelation::ALL, FoodRelation::as_str, FoodRelation::label),
        days_of_week: options(DayOfWeek::ALL, DayOfWeek::as_str, DayOfWeek::label),
        days_of_month: (FIRST_DAY_OF_MONTH..=LAST_DAY_OF_MONTH).collect(),
    }
}
