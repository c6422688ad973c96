use std::collections::BTreeSet;

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::enums::{DayOfWeek, DurationType, FoodRelation, RecurrencePattern};

/// Top-level keys the server assigns; client-sent values are discarded.
pub const SERVER_ASSIGNED_FIELDS: [&str; 3] = ["id", "userId", "createdAt"];

/// A count entered through a form: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(serde_json::Number),
    Text(String),
}

impl Amount {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Amount::Number(n) => n.as_f64(),
            Amount::Text(t) => t.trim().parse::<f64>().ok(),
        }
        .filter(|v| v.is_finite())
    }

    pub fn is_positive(&self) -> bool {
        self.as_f64().is_some_and(|v| v > 0.0)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount::Number(value.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duration {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<DurationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Amount>,
}

impl Duration {
    pub fn is_lifelong(&self) -> bool {
        self.kind == Some(DurationType::Lifelong)
    }

    /// Switch the course type; a lifelong course carries no length.
    pub fn set_kind(&mut self, kind: DurationType) {
        if kind == DurationType::Lifelong {
            self.value = None;
        }
        self.kind = Some(kind);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<RecurrencePattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_days: Option<Vec<DayOfWeek>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_dates: Option<Vec<i64>>,
}

impl Recurrence {
    pub fn toggle_day(&mut self, day: DayOfWeek) {
        toggle(self.specific_days.get_or_insert_with(Vec::new), day);
    }

    pub fn toggle_date(&mut self, date: i64) {
        toggle(self.specific_dates.get_or_insert_with(Vec::new), date);
    }
}

fn toggle<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if let Some(pos) = items.iter().position(|existing| *existing == item) {
        items.remove(pos);
    } else {
        items.push(item);
    }
}

/// One of the fixed daily slots (morning, noon, night).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_relation: Option<FoodRelation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTime {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_relation: Option<FoodRelation>,
}

impl CustomTime {
    pub fn new(time: impl Into<String>, food_relation: FoodRelation) -> Self {
        Self {
            id: generate_custom_time_id(),
            time: time.into(),
            food_relation: Some(food_relation),
        }
    }
}

/// `time_<unix millis>_<9 base36 chars>`, unique enough for list keys.
pub fn generate_custom_time_id() -> String {
    const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("time_{}_{suffix}", chrono::Utc::now().timestamp_millis())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("This time is already added")]
pub struct DuplicateTime;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dosage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning: Option<TimeSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noon: Option<TimeSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub night: Option<TimeSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_times: Option<Vec<CustomTime>>,
}

impl Dosage {
    pub fn slots(&self) -> [Option<&TimeSlot>; 3] {
        [self.morning.as_ref(), self.noon.as_ref(), self.night.as_ref()]
    }

    pub fn custom_times(&self) -> &[CustomTime] {
        self.custom_times.as_deref().unwrap_or_default()
    }

    /// At least one slot enabled, or at least one custom time.
    pub fn has_any_time(&self) -> bool {
        self.slots().iter().flatten().any(|slot| slot.enabled) || !self.custom_times().is_empty()
    }

    /// Append a custom dosing time. Blank times are ignored (`Ok(None)`);
    /// a time already on the list is rejected.
    pub fn add_custom_time(
        &mut self,
        time: &str,
        food_relation: FoodRelation,
    ) -> Result<Option<String>, DuplicateTime> {
        let time = time.trim();
        if time.is_empty() {
            return Ok(None);
        }
        let times = self.custom_times.get_or_insert_with(Vec::new);
        if times.iter().any(|existing| existing.time == time) {
            return Err(DuplicateTime);
        }
        let entry = CustomTime::new(time, food_relation);
        let id = entry.id.clone();
        times.push(entry);
        Ok(Some(id))
    }

    pub fn remove_custom_time(&mut self, id: &str) {
        if let Some(times) = self.custom_times.as_mut() {
            times.retain(|t| t.id != id);
        }
    }
}

/// Medicine payload as submitted by a caller.
///
/// Unknown top-level keys (`active`, `category`, ...) are kept in `extra`
/// and stored verbatim; the list filters match against them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineRecord {
    #[serde(
        default,
        deserialize_with = "text_or_absent",
        skip_serializing_if = "Option::is_none"
    )]
    pub medicine_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescription_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(
        default,
        deserialize_with = "shaped_or_malformed",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Duration>,
    #[serde(
        default,
        deserialize_with = "shaped_or_malformed",
        skip_serializing_if = "Option::is_none"
    )]
    pub recurrence: Option<Recurrence>,
    #[serde(
        default,
        deserialize_with = "shaped_or_malformed",
        skip_serializing_if = "Option::is_none"
    )]
    pub dosage: Option<Dosage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MedicineRecord {
    /// Drop client-supplied values for server-assigned keys.
    pub fn strip_server_fields(&mut self) {
        for key in SERVER_ASSIGNED_FIELDS {
            self.extra.remove(key);
        }
    }

    /// Lowercase keywords the store indexes for the `name` filter:
    /// the full trimmed name plus each whitespace-separated word.
    pub fn name_keywords(&self) -> BTreeSet<String> {
        let mut keywords = BTreeSet::new();
        let Some(name) = self.medicine_name.as_deref() else {
            return keywords;
        };
        let full = name.trim().to_lowercase();
        if full.is_empty() {
            return keywords;
        }
        keywords.extend(full.split_whitespace().map(str::to_string));
        keywords.insert(full);
        keywords
    }
}

/// Stand-in for a nested value whose JSON shape cannot be read.
///
/// The stand-in always fails validation under its own field, so a wrongly
/// shaped `duration`, `recurrence` or `dosage` is reported next to every
/// other violation instead of rejecting the body outright.
pub trait Malformed {
    fn malformed(raw: &Value) -> Self;
}

impl Malformed for Duration {
    fn malformed(raw: &Value) -> Self {
        Self {
            kind: Some(DurationType::Unrecognized(raw.to_string())),
            value: None,
        }
    }
}

impl Malformed for Recurrence {
    fn malformed(raw: &Value) -> Self {
        Self {
            pattern: Some(RecurrencePattern::Unrecognized(raw.to_string())),
            ..Self::default()
        }
    }
}

impl Malformed for Dosage {
    fn malformed(_raw: &Value) -> Self {
        Self::default()
    }
}

fn shaped_or_malformed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Malformed,
{
    let Some(raw) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match T::deserialize(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(_) => Ok(Some(T::malformed(&raw))),
    }
}

/// A non-string name reads as absent, which the validator reports.
fn text_or_absent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Ok(Some(text)),
        _ => Ok(None),
    }
}

/// A validated record on its way into the store.
#[derive(Debug, Clone)]
pub struct NewMedicine {
    pub user_id: String,
    pub created_at: String,
    pub record: MedicineRecord,
}

/// A persisted record as returned by the list operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMedicine {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
    #[serde(flatten)]
    pub record: MedicineRecord,
}
