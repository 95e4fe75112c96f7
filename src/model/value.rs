use std::fmt;

/// Scalar kind of an MAE property, encoded in the first two characters of
/// its key: `b_` boolean, `i_` integer, `r_` real, `s_` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Bool,
    Int,
    Real,
    String,
}

impl PropertyKind {
    /// Determines the kind a property key is tagged with. Returns `None`
    /// for keys that do not carry one of the four recognized prefixes;
    /// matching is exact, with no case folding and no inference from the
    /// value itself.
    pub fn from_key(key: &str) -> Option<PropertyKind> {
        match key.get(..2) {
            Some("b_") => Some(PropertyKind::Bool),
            Some("i_") => Some(PropertyKind::Int),
            Some("r_") => Some(PropertyKind::Real),
            Some("s_") => Some(PropertyKind::String),
            _ => None,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            PropertyKind::Bool => "b_",
            PropertyKind::Int => "i_",
            PropertyKind::Real => "r_",
            PropertyKind::String => "s_",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKind::Bool => write!(f, "boolean"),
            PropertyKind::Int => write!(f, "integer"),
            PropertyKind::Real => write!(f, "real"),
            PropertyKind::String => write!(f, "string"),
        }
    }
}

/// A single typed property value at the top level of a structure record.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Real(f64),
    String(String),
}

impl Scalar {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Scalar::Bool(_) => PropertyKind::Bool,
            Scalar::Int(_) => PropertyKind::Int,
            Scalar::Real(_) => PropertyKind::Real,
            Scalar::String(_) => PropertyKind::String,
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Real(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

/// One named per-row property of the atom or bond table, as seen by
/// callers: a homogeneous list with `None` marking rows where the value
/// is undefined.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Bool(Vec<Option<bool>>),
    Int(Vec<Option<i64>>),
    Real(Vec<Option<f64>>),
    String(Vec<Option<String>>),
}

impl Column {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Column::Bool(_) => PropertyKind::Bool,
            Column::Int(_) => PropertyKind::Int,
            Column::Real(_) => PropertyKind::Real,
            Column::String(_) => PropertyKind::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Bool(values) => values.len(),
            Column::Int(values) => values.len(),
            Column::Real(values) => values.len(),
            Column::String(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Option<bool>>> for Column {
    fn from(values: Vec<Option<bool>>) -> Self {
        Column::Bool(values)
    }
}

impl From<Vec<Option<i64>>> for Column {
    fn from(values: Vec<Option<i64>>) -> Self {
        Column::Int(values)
    }
}

impl From<Vec<Option<f64>>> for Column {
    fn from(values: Vec<Option<f64>>) -> Self {
        Column::Real(values)
    }
}

impl From<Vec<Option<String>>> for Column {
    fn from(values: Vec<Option<String>>) -> Self {
        Column::String(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_key_recognizes_all_prefixes() {
        assert_eq!(
            PropertyKind::from_key("b_m_subgroup_shown"),
            Some(PropertyKind::Bool)
        );
        assert_eq!(PropertyKind::from_key("i_m_ct_format"), Some(PropertyKind::Int));
        assert_eq!(PropertyKind::from_key("r_m_x_coord"), Some(PropertyKind::Real));
        assert_eq!(PropertyKind::from_key("s_m_title"), Some(PropertyKind::String));
    }

    #[test]
    fn kind_from_key_rejects_unknown_prefixes() {
        assert_eq!(PropertyKind::from_key("x_foo"), None);
        assert_eq!(PropertyKind::from_key("m_atom"), None);
        assert_eq!(PropertyKind::from_key("I_upper"), None);
        assert_eq!(PropertyKind::from_key("i"), None);
        assert_eq!(PropertyKind::from_key(""), None);
        assert_eq!(PropertyKind::from_key("ri_wrong"), None);
    }

    #[test]
    fn kind_prefix_and_display() {
        assert_eq!(PropertyKind::Bool.prefix(), "b_");
        assert_eq!(PropertyKind::Int.prefix(), "i_");
        assert_eq!(PropertyKind::Real.prefix(), "r_");
        assert_eq!(PropertyKind::String.prefix(), "s_");

        assert_eq!(PropertyKind::Bool.to_string(), "boolean");
        assert_eq!(PropertyKind::Int.to_string(), "integer");
        assert_eq!(PropertyKind::Real.to_string(), "real");
        assert_eq!(PropertyKind::String.to_string(), "string");
    }

    #[test]
    fn scalar_reports_its_kind() {
        assert_eq!(Scalar::from(true).kind(), PropertyKind::Bool);
        assert_eq!(Scalar::from(3_i64).kind(), PropertyKind::Int);
        assert_eq!(Scalar::from(0.5).kind(), PropertyKind::Real);
        assert_eq!(Scalar::from("name").kind(), PropertyKind::String);
    }

    #[test]
    fn column_reports_kind_and_length() {
        let column = Column::Int(vec![Some(1), None, Some(3)]);
        assert_eq!(column.kind(), PropertyKind::Int);
        assert_eq!(column.len(), 3);
        assert!(!column.is_empty());

        let empty = Column::from(Vec::<Option<f64>>::new());
        assert_eq!(empty.kind(), PropertyKind::Real);
        assert!(empty.is_empty());
    }
}
