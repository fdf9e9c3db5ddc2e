//! Directives: elements with no rendered output that change build state or
//! gate the survival of the content around them.

use serde::Serialize;

use super::{AttributeList, AttributeName, ElementId};

/// How several attribute names in one `ifdef`/`ifndef` combine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// `ifdef::a,b[]` - any of them.
    Or,
    /// `ifdef::a+b[]` - all of them.
    #[default]
    And,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
}

/// `ifeval::[left operator right]`, operands kept as written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct IfEval {
    pub left: String,
    pub operator: Operator,
    pub right: String,
}

impl IfEval {
    #[must_use]
    pub fn new(left: impl Into<String>, operator: Operator, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            operator,
            right: right.into(),
        }
    }
}

/// The condition of a block or inline conditional directive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "directive", rename_all = "lowercase")]
#[non_exhaustive]
pub enum Condition {
    IfDef {
        attributes: Vec<AttributeName>,
        operation: Operation,
    },
    IfNDef {
        attributes: Vec<AttributeName>,
        operation: Operation,
    },
    IfEval(IfEval),
}

impl Condition {
    #[must_use]
    pub fn ifdef(attribute: impl Into<String>) -> Self {
        Condition::IfDef {
            attributes: vec![attribute.into()],
            operation: Operation::default(),
        }
    }

    #[must_use]
    pub fn ifndef(attribute: impl Into<String>) -> Self {
        Condition::IfNDef {
            attributes: vec![attribute.into()],
            operation: Operation::default(),
        }
    }

    /// Attribute names an `endif::name[]` may use to close this condition.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeName] {
        match self {
            Condition::IfDef { attributes, .. } | Condition::IfNDef { attributes, .. } => {
                attributes
            }
            Condition::IfEval(_) => &[],
        }
    }
}

/// `:name: value`
#[derive(Clone, Debug, PartialEq, Serialize)]
#[non_exhaustive]
pub struct AttributeEntry {
    pub name: AttributeName,
    pub value: Vec<ElementId>,
}

/// `:name!:`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct AttributeReset {
    pub name: AttributeName,
}

/// `{name}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct AttributeReference {
    pub name: AttributeName,
}

/// `{counter:name[:seed]}` or, when `hidden`, `{counter2:name[:seed]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct CounterReference {
    pub name: AttributeName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    pub hidden: bool,
}

/// A block-start conditional: `ifdef::name[]`, `ifndef::name[]`, `ifeval::[...]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[non_exhaustive]
pub struct Conditional {
    pub condition: Condition,
}

/// `endif::[]` or `endif::name[]`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct EndIf {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeName>,
}

/// A single-line conditional with its own body: `ifdef::name[body]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[non_exhaustive]
pub struct InlineConditional {
    pub condition: Condition,
    pub children: Vec<ElementId>,
}

/// `include::path[attributes]`
#[derive(Clone, Debug, PartialEq, Serialize)]
#[non_exhaustive]
pub struct FileInclude {
    pub path: Vec<ElementId>,
    #[serde(skip_serializing_if = "AttributeList::is_empty")]
    pub attributes: AttributeList,
}
