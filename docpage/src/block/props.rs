use std::collections::BTreeMap;
use std::fmt;

/// Widget properties, ordered by name so output is deterministic.
pub type Props = BTreeMap<String, PropValue>;

/// A single attribute value on a component tag.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// `name="text"`, bare `name`, or `{json}` that parses as JSON.
    Literal(serde_json::Value),
    /// Any other `{expression}`, preserved verbatim.
    Expression(String),
}

impl PropValue {
    /// Classify the inside of a `{...}` attribute value.
    pub fn from_expression(expr: &str) -> Self {
        let expr = expr.trim();
        match serde_json::from_str::<serde_json::Value>(expr) {
            Ok(value) => PropValue::Literal(value),
            Err(_) => PropValue::Expression(expr.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Literal(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Literal(serde_json::Value::String(s)) => write!(f, "{:?}", s),
            PropValue::Literal(value) => write!(f, "{{{}}}", value),
            PropValue::Expression(expr) => write!(f, "{{{}}}", expr),
        }
    }
}

/// A named reference to an externally registered interactive widget.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetReference {
    pub name: String,
    pub props: Props,
}

impl fmt::Display for WidgetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (key, value) in &self.props {
            write!(f, " {}={}", key, value)?;
        }
        write!(f, " />")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_expressions_become_literals() {
        assert_eq!(
            PropValue::from_expression(" 3 "),
            PropValue::Literal(serde_json::json!(3))
        );
        assert_eq!(
            PropValue::from_expression("[1, 2]"),
            PropValue::Literal(serde_json::json!([1, 2]))
        );
    }

    #[test]
    fn other_expressions_are_kept_verbatim() {
        assert_eq!(
            PropValue::from_expression("() => setCount(c + 1)"),
            PropValue::Expression("() => setCount(c + 1)".into())
        );
    }

    #[test]
    fn display_reads_like_a_tag() {
        let mut props = Props::new();
        props.insert("initial".into(), PropValue::Literal(serde_json::json!(0)));
        props.insert("label".into(), PropValue::Literal(serde_json::json!("Clicks")));
        let widget = WidgetReference {
            name: "Counter".into(),
            props,
        };
        assert_eq!(widget.to_string(), "<Counter initial={0} label=\"Clicks\" />");
    }
}
