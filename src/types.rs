use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar representation chosen for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    Boolean,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    Long,
    Double,
    String,
    Base64,
    /// Raw structure, used when nothing narrower fits
    Json,
}

impl OutputType {
    pub const ALL: [OutputType; 7] = [
        OutputType::Boolean,
        OutputType::Integer,
        OutputType::Long,
        OutputType::Double,
        OutputType::String,
        OutputType::Base64,
        OutputType::Json,
    ];

    /// Join two observed types.
    ///
    /// Identical types stay put, the numeric chain Integer -> Long -> Double
    /// widens, and every other pairing gives up to `Json`. String and Base64
    /// are deliberately not joined to each other.
    pub fn merge(self, other: OutputType) -> OutputType {
        use OutputType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Integer, Long) | (Long, Integer) => Long,
            (Integer | Long, Double) | (Double, Integer | Long) => Double,
            _ => Json,
        }
    }

    /// `merge` lifted over "nothing observed yet"; `None` is the identity.
    pub fn merge_opt(a: Option<OutputType>, b: Option<OutputType>) -> Option<OutputType> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

/// What a path yields in one document: a single value or a collection, and
/// the type of those values (`None` while only nulls have been seen).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputKind {
    pub single: bool,
    #[serde(rename = "type")]
    pub output_type: Option<OutputType>,
}

impl OutputKind {
    pub fn single(output_type: Option<OutputType>) -> Self {
        OutputKind { single: true, output_type }
    }

    pub fn collection(output_type: Option<OutputType>) -> Self {
        OutputKind { single: false, output_type }
    }

    pub fn merge(self, other: OutputKind) -> OutputKind {
        OutputKind {
            single: self.single && other.single,
            output_type: OutputType::merge_opt(self.output_type, other.output_type),
        }
    }

    /// Concrete type for projection; never-observed columns become strings.
    pub fn resolved_type(&self) -> OutputType {
        self.output_type.unwrap_or(OutputType::String)
    }
}

/// Compute the kind of one value, delegating scalar classification to
/// `classify`.
///
/// Objects are always a single `Json`. Arrays unify the kinds of their
/// elements into a collection; an element that is itself a collection
/// turns the whole array into a collection of `Json`.
pub fn kind_of<F>(value: &Value, classify: &F) -> OutputKind
where
    F: Fn(&Value) -> Option<OutputType>,
{
    match value {
        Value::Object(_) => OutputKind::single(Some(OutputType::Json)),
        Value::Array(items) => {
            let mut element_type = None;
            for item in items {
                let kind = kind_of(item, classify);
                if !kind.single {
                    return OutputKind::collection(Some(OutputType::Json));
                }
                element_type = OutputType::merge_opt(element_type, kind.output_type);
            }
            OutputKind::collection(element_type)
        }
        scalar => OutputKind::single(classify(scalar)),
    }
}

/// One projected output value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Double(f64),
    String(String),
    Base64(String),
    Json(Value),
    List(Vec<Cell>),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Render the cell back into the document model.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Missing => Value::Null,
            Cell::Boolean(b) => Value::Bool(*b),
            Cell::Integer(i) => Value::from(*i),
            Cell::Long(l) => Value::from(*l),
            Cell::Double(d) => serde_json::Number::from_f64(*d)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::String(s) | Cell::Base64(s) => Value::String(s.clone()),
            Cell::Json(v) => v.clone(),
            Cell::List(items) => Value::Array(items.iter().map(Cell::to_json).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use OutputType::*;

    fn all_with_none() -> Vec<Option<OutputType>> {
        std::iter::once(None)
            .chain(OutputType::ALL.iter().copied().map(Some))
            .collect()
    }

    #[test]
    fn test_merge_table() {
        let expected = |a: OutputType, b: OutputType| -> OutputType {
            if a == b {
                return a;
            }
            match (a, b) {
                (Integer, Long) | (Long, Integer) => Long,
                (Integer, Double) | (Double, Integer) | (Long, Double) | (Double, Long) => Double,
                _ => Json,
            }
        };
        for a in OutputType::ALL {
            for b in OutputType::ALL {
                assert_eq!(a.merge(b), expected(a, b), "{:?} + {:?}", a, b);
            }
        }
        assert_eq!(String.merge(Base64), Json);
        assert_eq!(Boolean.merge(Integer), Json);
    }

    #[test]
    fn test_merge_laws() {
        let domain = all_with_none();
        for &a in &domain {
            assert_eq!(OutputType::merge_opt(a, a), a);
            assert_eq!(OutputType::merge_opt(None, a), a);
            for &b in &domain {
                assert_eq!(OutputType::merge_opt(a, b), OutputType::merge_opt(b, a));
                for &c in &domain {
                    assert_eq!(
                        OutputType::merge_opt(OutputType::merge_opt(a, b), c),
                        OutputType::merge_opt(a, OutputType::merge_opt(b, c)),
                        "{:?} {:?} {:?}",
                        a,
                        b,
                        c
                    );
                }
            }
        }
    }

    #[test]
    fn test_kind_merge_is_elementwise() {
        let a = OutputKind::single(Some(Integer));
        let b = OutputKind::collection(Some(Long));
        assert_eq!(a.merge(b), OutputKind::collection(Some(Long)));
        assert_eq!(a.merge(OutputKind::single(None)), a);
    }

    fn classify(v: &Value) -> Option<OutputType> {
        match v {
            Value::Bool(_) => Some(Boolean),
            Value::Number(n) if n.is_i64() => Some(Integer),
            Value::Number(_) => Some(Double),
            Value::String(_) => Some(String),
            _ => None,
        }
    }

    #[test]
    fn test_kind_of() {
        assert_eq!(kind_of(&json!(true), &classify), OutputKind::single(Some(Boolean)));
        assert_eq!(kind_of(&json!(null), &classify), OutputKind::single(None));
        assert_eq!(kind_of(&json!({"a": 1}), &classify), OutputKind::single(Some(Json)));
        assert_eq!(kind_of(&json!([1, 2.5]), &classify), OutputKind::collection(Some(Double)));
        assert_eq!(kind_of(&json!([]), &classify), OutputKind::collection(None));
        assert_eq!(kind_of(&json!([1, [2]]), &classify), OutputKind::collection(Some(Json)));
        assert_eq!(kind_of(&json!([{"a": 1}, 2]), &classify), OutputKind::collection(Some(Json)));
    }

    #[test]
    fn test_cell_to_json() {
        let cell = Cell::List(vec![Cell::Integer(1), Cell::Missing, Cell::String("x".into())]);
        assert_eq!(cell.to_json(), json!([1, null, "x"]));
        assert_eq!(Cell::Double(f64::NAN).to_json(), Value::Null);
    }
}
