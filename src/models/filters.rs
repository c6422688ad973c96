/// Equality/containment predicates for listing a caller's medicines.
///
/// Every field is optional; `None` means "do not filter on it".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MedicineFilter {
    /// Stored `active` must be exactly this boolean.
    pub active: Option<bool>,
    /// Lowercase keyword that must appear in the record's name index.
    pub name_keyword: Option<String>,
    /// Stored `category` must equal this string.
    pub category: Option<String>,
}

impl MedicineFilter {
    /// Build from raw query-string values.
    ///
    /// `active` is true only for the literal `"true"`; any other present
    /// value filters for `false`. Empty `name`/`category` are ignored.
    pub fn from_query(
        active: Option<&str>,
        name: Option<&str>,
        category: Option<&str>,
    ) -> Self {
        Self {
            active: active.map(|v| v == "true"),
            name_keyword: name
                .map(|n| n.trim().to_lowercase())
                .filter(|n| !n.is_empty()),
            category: category.filter(|c| !c.is_empty()).map(str::to_string),
        }
    }
}
