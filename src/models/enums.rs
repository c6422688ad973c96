use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A wire token that is not a member of the expected closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized {kind} token: {value}")]
pub struct UnknownToken {
    pub kind: &'static str,
    pub value: String,
}

/// Collapse a token to a comparable form: case-insensitive, `_` ignored.
///
/// Lets the form-layer spellings (`specificDays`, `noRelation`, `lifelong`)
/// resolve to the canonical wire tokens (`SPECIFIC_DAYS`, `NO_RELATION`,
/// `LIFELONG`).
fn normalize(token: &str) -> String {
    token
        .trim()
        .chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Macro to generate a closed token set with as_str + label + FromStr.
///
/// Every generated enum carries an `Unrecognized(raw)` variant so that an
/// out-of-set value deserializes (and round-trips) instead of failing the
/// whole payload; the validator reports it as a field error.
macro_rules! token_enum {
    ($name:ident { $($variant:ident => $token:literal : $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Unrecognized(String),
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $token,)+
                    Self::Unrecognized(raw) => raw,
                }
            }

            pub fn label(&self) -> &str {
                match self {
                    $(Self::$variant => $label,)+
                    Self::Unrecognized(raw) => raw,
                }
            }

            pub fn is_recognized(&self) -> bool {
                !matches!(self, Self::Unrecognized(_))
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownToken;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize(s);
                $(
                    if wanted == normalize($token) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(UnknownToken {
                    kind: stringify!($name),
                    value: s.into(),
                })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(match raw.parse() {
                    Ok(value) => value,
                    Err(_) => Self::Unrecognized(raw),
                })
            }
        }
    };
}

token_enum!(DurationType {
    Days => "DAYS": "Days",
    Weeks => "WEEKS": "Weeks",
    Months => "MONTHS": "Months",
    Years => "YEARS": "Years",
    Lifelong => "LIFELONG": "Lifelong",
});

token_enum!(RecurrencePattern {
    Daily => "DAILY": "Daily",
    Alternate => "ALTERNATE": "Alternate days",
    Custom => "CUSTOM": "Every X days",
    Weekly => "WEEKLY": "Weekly",
    Biweekly => "BIWEEKLY": "Bi-weekly",
    Monthly => "MONTHLY": "Monthly",
    SpecificDays => "SPECIFIC_DAYS": "Specific days of week",
    SpecificDates => "SPECIFIC_DATES": "Specific dates of month",
});

token_enum!(FoodRelation {
    Before => "BEFORE": "Before food",
    After => "AFTER": "After food",
    NoRelation => "NO_RELATION": "No relation to food",
});

token_enum!(DayOfWeek {
    Sun => "sun": "Sun",
    Mon => "mon": "Mon",
    Tue => "tue": "Tue",
    Wed => "wed": "Wed",
    Thu => "thu": "Thu",
    Fri => "fri": "Fri",
    Sat => "sat": "Sat",
});

const SHORT_COURSE_OPTIONS: &[RecurrencePattern] = &[
    RecurrencePattern::Daily,
    RecurrencePattern::Alternate,
    RecurrencePattern::Custom,
];

const WEEKS_OPTIONS: &[RecurrencePattern] = &[
    RecurrencePattern::Daily,
    RecurrencePattern::Alternate,
    RecurrencePattern::Custom,
    RecurrencePattern::SpecificDays,
];

const LONG_COURSE_OPTIONS: &[RecurrencePattern] = &[
    RecurrencePattern::Daily,
    RecurrencePattern::Alternate,
    RecurrencePattern::Custom,
    RecurrencePattern::Weekly,
    RecurrencePattern::Biweekly,
    RecurrencePattern::SpecificDays,
    RecurrencePattern::SpecificDates,
];

const FALLBACK_OPTIONS: &[RecurrencePattern] = &[RecurrencePattern::Daily];

impl RecurrencePattern {
    /// Patterns a form offers for the chosen course length.
    ///
    /// Input guidance only; the validator accepts any recognized pattern
    /// with any duration type.
    pub fn options_for(duration: &DurationType) -> &'static [RecurrencePattern] {
        match duration {
            DurationType::Days => SHORT_COURSE_OPTIONS,
            DurationType::Weeks => WEEKS_OPTIONS,
            DurationType::Months | DurationType::Years => LONG_COURSE_OPTIONS,
            DurationType::Lifelong => Self::ALL,
            DurationType::Unrecognized(_) => FALLBACK_OPTIONS,
        }
    }
}

/// Lowest valid day-of-month for `SPECIFIC_DATES`.
pub const FIRST_DAY_OF_MONTH: i64 = 1;
/// Highest valid day-of-month for `SPECIFIC_DATES`.
pub const LAST_DAY_OF_MONTH: i64 = 31;
