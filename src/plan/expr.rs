use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal carried by a plan expression.
///
/// Object constants name a registered runtime object; they are resolved
/// against the context when the expression is evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Constant {
    Bool(bool),
    Int(i64),
    Real(f64),
    Object(String),
}

impl Default for Constant {
    fn default() -> Self {
        Self::Bool(false)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value}"),
            Self::Object(name) => f.write_str(name),
        }
    }
}

/// Symbolic condition/effect tree as emitted by the planner.
///
/// The planner's operator set is wider than what the executor can evaluate;
/// quantifiers, implications and arithmetic are carried through so the
/// expression compiler can reject them by name instead of silently dropping
/// a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ConditionExpr {
    Not {
        arg: Box<ConditionExpr>,
    },
    And {
        args: Vec<ConditionExpr>,
    },
    Or {
        args: Vec<ConditionExpr>,
    },
    Equals {
        lhs: Box<ConditionExpr>,
        rhs: Box<ConditionExpr>,
    },
    Le {
        lhs: Box<ConditionExpr>,
        rhs: Box<ConditionExpr>,
    },
    Lt {
        lhs: Box<ConditionExpr>,
        rhs: Box<ConditionExpr>,
    },
    Constant {
        value: Constant,
    },
    Parameter {
        name: String,
    },
    Fluent {
        name: String,
        #[serde(default)]
        args: Vec<ConditionExpr>,
    },
    Implies {
        lhs: Box<ConditionExpr>,
        rhs: Box<ConditionExpr>,
    },
    Iff {
        lhs: Box<ConditionExpr>,
        rhs: Box<ConditionExpr>,
    },
    Exists {
        variables: Vec<String>,
        body: Box<ConditionExpr>,
    },
    Forall {
        variables: Vec<String>,
        body: Box<ConditionExpr>,
    },
    Plus {
        args: Vec<ConditionExpr>,
    },
    Minus {
        lhs: Box<ConditionExpr>,
        rhs: Box<ConditionExpr>,
    },
    Times {
        args: Vec<ConditionExpr>,
    },
    Div {
        lhs: Box<ConditionExpr>,
        rhs: Box<ConditionExpr>,
    },
}

impl ConditionExpr {
    pub fn negate(arg: ConditionExpr) -> Self {
        Self::Not { arg: Box::new(arg) }
    }

    pub fn all(args: Vec<ConditionExpr>) -> Self {
        Self::And { args }
    }

    pub fn any(args: Vec<ConditionExpr>) -> Self {
        Self::Or { args }
    }

    pub fn equals(lhs: ConditionExpr, rhs: ConditionExpr) -> Self {
        Self::Equals {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn le(lhs: ConditionExpr, rhs: ConditionExpr) -> Self {
        Self::Le {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn lt(lhs: ConditionExpr, rhs: ConditionExpr) -> Self {
        Self::Lt {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self::Constant {
            value: Constant::Bool(value),
        }
    }

    pub fn int(value: i64) -> Self {
        Self::Constant {
            value: Constant::Int(value),
        }
    }

    pub fn real(value: f64) -> Self {
        Self::Constant {
            value: Constant::Real(value),
        }
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::Constant {
            value: Constant::Object(name.into()),
        }
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self::Parameter { name: name.into() }
    }

    pub fn fluent(name: impl Into<String>, args: Vec<ConditionExpr>) -> Self {
        Self::Fluent {
            name: name.into(),
            args,
        }
    }

    /// Operator name used in diagnostics.
    pub fn operator_name(&self) -> &'static str {
        match self {
            Self::Not { .. } => "Not",
            Self::And { .. } => "And",
            Self::Or { .. } => "Or",
            Self::Equals { .. } => "Equals",
            Self::Le { .. } => "Le",
            Self::Lt { .. } => "Lt",
            Self::Constant { .. } => "Constant",
            Self::Parameter { .. } => "Parameter",
            Self::Fluent { .. } => "Fluent",
            Self::Implies { .. } => "Implies",
            Self::Iff { .. } => "Iff",
            Self::Exists { .. } => "Exists",
            Self::Forall { .. } => "Forall",
            Self::Plus { .. } => "Plus",
            Self::Minus { .. } => "Minus",
            Self::Times { .. } => "Times",
            Self::Div { .. } => "Div",
        }
    }

    /// Names of every fluent referenced anywhere in the tree.
    pub fn fluent_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_fluents(&mut names);
        names
    }

    fn collect_fluents<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Fluent { name, args } => {
                names.push(name.as_str());
                for arg in args {
                    arg.collect_fluents(names);
                }
            }
            Self::Not { arg } => arg.collect_fluents(names),
            Self::And { args } | Self::Or { args } | Self::Plus { args } | Self::Times { args } => {
                for arg in args {
                    arg.collect_fluents(names);
                }
            }
            Self::Equals { lhs, rhs }
            | Self::Le { lhs, rhs }
            | Self::Lt { lhs, rhs }
            | Self::Implies { lhs, rhs }
            | Self::Iff { lhs, rhs }
            | Self::Minus { lhs, rhs }
            | Self::Div { lhs, rhs } => {
                lhs.collect_fluents(names);
                rhs.collect_fluents(names);
            }
            Self::Exists { body, .. } | Self::Forall { body, .. } => body.collect_fluents(names),
            Self::Constant { .. } | Self::Parameter { .. } => {}
        }
    }
}

impl fmt::Display for ConditionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Not { arg } => write!(f, "not {arg}"),
            Self::And { args } => write_joined(f, args, " and "),
            Self::Or { args } => write_joined(f, args, " or "),
            Self::Equals { lhs, rhs } => write!(f, "({lhs} == {rhs})"),
            Self::Le { lhs, rhs } => write!(f, "({lhs} <= {rhs})"),
            Self::Lt { lhs, rhs } => write!(f, "({lhs} < {rhs})"),
            Self::Constant { value } => write!(f, "{value}"),
            Self::Parameter { name } => write!(f, "?{name}"),
            Self::Fluent { name, args } => {
                write!(f, "{name}(")?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::Implies { lhs, rhs } => write!(f, "({lhs} -> {rhs})"),
            Self::Iff { lhs, rhs } => write!(f, "({lhs} <-> {rhs})"),
            Self::Exists { variables, body } => write!(f, "exists {} . {body}", variables.join(", ")),
            Self::Forall { variables, body } => write!(f, "forall {} . {body}", variables.join(", ")),
            Self::Plus { args } => write_joined(f, args, " + "),
            Self::Minus { lhs, rhs } => write!(f, "({lhs} - {rhs})"),
            Self::Times { args } => write_joined(f, args, " * "),
            Self::Div { lhs, rhs } => write!(f, "({lhs} / {rhs})"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, args: &[ConditionExpr], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (index, arg) in args.iter().enumerate() {
        if index > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{arg}")?;
    }
    f.write_str(")")
}

/// Effect of an action: after it applies, `fluent` must evaluate to `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub fluent: ConditionExpr,
    pub value: ConditionExpr,
}

impl Effect {
    pub fn new(fluent: ConditionExpr, value: ConditionExpr) -> Self {
        Self { fluent, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_expr_serde_uses_op_tag() {
        let expr = ConditionExpr::negate(ConditionExpr::fluent(
            "at",
            vec![ConditionExpr::param("robot")],
        ));

        let value = serde_json::to_value(&expr).unwrap();
        assert_eq!(value["op"], "not");
        assert_eq!(value["arg"]["op"], "fluent");
        assert_eq!(value["arg"]["args"][0]["name"], "robot");
    }

    #[test]
    fn constant_deserializes_untagged() {
        let parsed: Vec<Constant> = serde_json::from_str(r#"[true, 3, 2.5, "l1"]"#).unwrap();
        assert_eq!(parsed[0], Constant::Bool(true));
        assert_eq!(parsed[1], Constant::Int(3));
        assert_eq!(parsed[2], Constant::Real(2.5));
        assert_eq!(parsed[3], Constant::Object("l1".into()));
    }

    #[test]
    fn fluent_args_default_to_empty() {
        let parsed: ConditionExpr = serde_json::from_str(r#"{"op":"fluent","name":"light"}"#).unwrap();
        assert_eq!(parsed, ConditionExpr::fluent("light", Vec::new()));
    }

    #[test]
    fn display_renders_readable_condition() {
        let expr = ConditionExpr::all(vec![
            ConditionExpr::fluent("at", vec![ConditionExpr::param("l")]),
            ConditionExpr::le(ConditionExpr::int(1), ConditionExpr::real(2.5)),
        ]);
        assert_eq!(expr.to_string(), "(at(?l) and (1 <= 2.5))");
    }

    #[test]
    fn fluent_names_walks_nested_operators() {
        let expr = ConditionExpr::any(vec![
            ConditionExpr::negate(ConditionExpr::fluent("light", Vec::new())),
            ConditionExpr::equals(
                ConditionExpr::fluent("pos", vec![ConditionExpr::param("r")]),
                ConditionExpr::object("l2"),
            ),
        ]);
        assert_eq!(expr.fluent_names(), vec!["light", "pos"]);
    }
}
