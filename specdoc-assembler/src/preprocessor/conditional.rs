use std::path::Path;

use crate::{
    Error,
    error::SourceLocation,
    model::{Condition, ElementId, IfEval, Location, Operation, Operator},
    preprocessor::state::AttributeStore,
};

#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub(crate) enum EvalValue {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl EvalValue {
    #[tracing::instrument(level = "trace", skip(attributes, render))]
    fn convert(
        raw: &str,
        attributes: &AttributeStore,
        render: &impl Fn(&[ElementId]) -> String,
    ) -> Self {
        // First we substitute any attributes in the string with their values
        let s = attributes.substitute(raw, render);
        let s = s.trim();

        // Try to parse as bool, f64, or evaluate as expression, otherwise return as string
        s.parse::<bool>()
            .map(EvalValue::Boolean)
            .or_else(|_| s.parse::<f64>().map(EvalValue::Number))
            .or_else(|_| evalexpr::eval_float(s).map(EvalValue::Number))
            .or_else(|_| {
                #[allow(clippy::cast_precision_loss)]
                evalexpr::eval_int(s)
                    .map(|v| v as f64)
                    .map(EvalValue::Number)
            })
            .unwrap_or_else(|_| EvalValue::String(Self::strip_quotes(s)))
    }

    fn strip_quotes(s: &str) -> String {
        ['\'', '"']
            .iter()
            .find_map(|quote| {
                s.strip_prefix(*quote)
                    .and_then(|inner| inner.strip_suffix(*quote))
            })
            .unwrap_or(s)
            .to_string()
    }
}

/// Whether the attributes an `ifdef`/`ifndef` names are set, combined by `operation`.
fn attributes_set(names: &[String], operation: Operation, attributes: &AttributeStore) -> bool {
    match operation {
        Operation::Or => names.iter().any(|name| attributes.is_set(name)),
        Operation::And => names.iter().all(|name| attributes.is_set(name)),
    }
}

/// Evaluate a conditional directive against the current attribute store.
pub(crate) fn evaluate(
    condition: &Condition,
    attributes: &AttributeStore,
    render: &impl Fn(&[ElementId]) -> String,
    file: &Path,
    location: Location,
) -> Result<bool, Error> {
    Ok(match condition {
        Condition::IfDef {
            attributes: names,
            operation,
        } => {
            if names.is_empty() {
                tracing::warn!("no attributes in conditional directive but expecting at least one");
                return Ok(false);
            }
            attributes_set(names, *operation, attributes)
        }
        Condition::IfNDef {
            attributes: names,
            operation,
        } => {
            if names.is_empty() {
                tracing::warn!("no attributes in conditional directive but expecting at least one");
                return Ok(true);
            }
            !attributes_set(names, *operation, attributes)
        }
        Condition::IfEval(ifeval) => evaluate_ifeval(ifeval, attributes, render, file, location)?,
    })
}

fn evaluate_ifeval(
    ifeval: &IfEval,
    attributes: &AttributeStore,
    render: &impl Fn(&[ElementId]) -> String,
    file: &Path,
    location: Location,
) -> Result<bool, Error> {
    for (side, operand) in [("left", &ifeval.left), ("right", &ifeval.right)] {
        if operand.trim().is_empty() {
            tracing::error!(side, "ifeval operand is empty");
            return Err(Error::InvalidIfEval {
                reason: format!("missing {side} operand"),
                location: SourceLocation::boxed(Some(file.to_path_buf()), location),
            });
        }
    }
    let left = EvalValue::convert(&ifeval.left, attributes, render);
    let right = EvalValue::convert(&ifeval.right, attributes, render);

    match (&left, &right) {
        (EvalValue::Number(_), EvalValue::Number(_))
        | (EvalValue::Boolean(_), EvalValue::Boolean(_))
        | (EvalValue::String(_), EvalValue::String(_)) => {}
        _ => {
            tracing::error!(?left, ?right, "cannot compare different types of values in ifeval directive");
            return Err(Error::InvalidIfEvalDirectiveMismatchedTypes(
                SourceLocation::boxed(Some(file.to_path_buf()), location),
            ));
        }
    }

    Ok(match ifeval.operator {
        Operator::Equal => left == right,
        Operator::NotEqual => left != right,
        Operator::LessThan => left < right,
        Operator::GreaterThan => left > right,
        Operator::LessThanOrEqual => left <= right,
        Operator::GreaterThanOrEqual => left >= right,
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::model::AttributeValue;

    fn store() -> AttributeStore {
        let mut store = AttributeStore::default();
        store.set("version".to_string(), AttributeValue::from("3"));
        store.set("backend".to_string(), AttributeValue::from("html5"));
        store.set("off".to_string(), AttributeValue::from(false));
        store
    }

    fn check(condition: &Condition) -> Result<bool, Error> {
        evaluate(
            condition,
            &store(),
            &|_: &[ElementId]| String::new(),
            Path::new("main.adoc"),
            Location::default(),
        )
    }

    fn ifdef(names: &[&str], operation: Operation) -> Condition {
        Condition::IfDef {
            attributes: names.iter().map(ToString::to_string).collect(),
            operation,
        }
    }

    #[rstest]
    #[case::set(ifdef(&["version"], Operation::And), true)]
    #[case::unset(ifdef(&["missing"], Operation::And), false)]
    #[case::false_is_unset(ifdef(&["off"], Operation::And), false)]
    #[case::any(ifdef(&["missing", "backend"], Operation::Or), true)]
    #[case::all(ifdef(&["missing", "backend"], Operation::And), false)]
    #[case::ifndef(Condition::ifndef("missing"), true)]
    fn test_ifdef(#[case] condition: Condition, #[case] expected: bool) -> Result<(), Error> {
        assert_eq!(check(&condition)?, expected);
        Ok(())
    }

    #[rstest]
    #[case::arithmetic("1 + 1", Operator::Equal, "2", true)]
    #[case::attribute_number("{version}", Operator::GreaterThanOrEqual, "2", true)]
    #[case::attribute_string("\"{backend}\"", Operator::Equal, "'html5'", true)]
    #[case::string_order("'a'", Operator::LessThan, "'b'", true)]
    #[case::boolean("true", Operator::NotEqual, "false", true)]
    fn test_ifeval(
        #[case] left: &str,
        #[case] operator: Operator,
        #[case] right: &str,
        #[case] expected: bool,
    ) -> Result<(), Error> {
        let condition = Condition::IfEval(IfEval::new(left, operator, right));
        assert_eq!(check(&condition)?, expected);
        Ok(())
    }

    #[test]
    fn test_ifeval_mismatched_types() {
        let condition = Condition::IfEval(IfEval::new("1", Operator::Equal, "'one'"));
        assert!(matches!(
            check(&condition),
            Err(Error::InvalidIfEvalDirectiveMismatchedTypes(_))
        ));
    }

    #[test]
    fn test_ifeval_missing_operand() {
        let condition = Condition::IfEval(IfEval::new(" ", Operator::Equal, "1"));
        assert!(matches!(check(&condition), Err(Error::InvalidIfEval { .. })));
    }
}
