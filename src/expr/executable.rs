use super::value::Value;
use crate::context::Context;
use crate::error::EvalError;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Le,
    Lt,
}

impl CompareOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Le => "<=",
            Self::Lt => "<",
        }
    }
}

/// Compiled condition tree, interpreted against a [`Context`].
///
/// Symbols are looked up at evaluation time so that a node's expressions
/// always observe the objects registered in the shared context.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutableExpr {
    Literal(Value),
    Symbol(String),
    Call {
        function: String,
        args: Vec<ExecutableExpr>,
    },
    Not(Box<ExecutableExpr>),
    And(Vec<ExecutableExpr>),
    Or(Vec<ExecutableExpr>),
    Compare {
        op: CompareOp,
        lhs: Box<ExecutableExpr>,
        rhs: Box<ExecutableExpr>,
    },
}

impl ExecutableExpr {
    pub fn eval(&self, ctx: &Context) -> Result<Value, EvalError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Symbol(name) => ctx
                .object(name)
                .cloned()
                .ok_or_else(|| EvalError::UnknownSymbol(name.clone())),
            Self::Call { function, args } => {
                let callable = ctx
                    .fluent(function)
                    .ok_or_else(|| EvalError::UnknownFunction(function.clone()))?;
                let values = args
                    .iter()
                    .map(|arg| arg.eval(ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                callable(&values).map_err(|err| EvalError::Callable {
                    name: function.clone(),
                    message: format!("{err:#}"),
                })
            }
            Self::Not(arg) => Ok(Value::Bool(!arg.eval(ctx)?.truthy())),
            Self::And(args) => {
                for arg in args {
                    if !arg.eval(ctx)?.truthy() {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            Self::Or(args) => {
                for arg in args {
                    if arg.eval(ctx)?.truthy() {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            Self::Compare { op, lhs, rhs } => {
                let lhs = lhs.eval(ctx)?;
                let rhs = rhs.eval(ctx)?;
                if *op == CompareOp::Eq {
                    return Ok(Value::Bool(lhs == rhs));
                }
                let ordering = lhs.compare(&rhs).ok_or_else(|| EvalError::TypeMismatch {
                    op: op.symbol(),
                    lhs: lhs.type_name().to_string(),
                    rhs: rhs.type_name().to_string(),
                })?;
                Ok(Value::Bool(match op {
                    CompareOp::Le => ordering != Ordering::Greater,
                    CompareOp::Lt | CompareOp::Eq => ordering == Ordering::Less,
                }))
            }
        }
    }

    /// Evaluates and reduces to a boolean.
    pub fn holds(&self, ctx: &Context) -> Result<bool, EvalError> {
        Ok(self.eval(ctx)?.truthy())
    }

    /// Function names called anywhere in the tree.
    pub fn functions(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(&mut |expr| {
            if let Self::Call { function, .. } = expr {
                names.push(function.as_str());
            }
        });
        names
    }

    /// Object names referenced anywhere in the tree.
    pub fn symbols(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(&mut |expr| {
            if let Self::Symbol(name) = expr {
                names.push(name.as_str());
            }
        });
        names
    }

    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        match self {
            Self::Call { args, .. } | Self::And(args) | Self::Or(args) => {
                args.iter().for_each(|arg| arg.walk(visit));
            }
            Self::Not(arg) => arg.walk(visit),
            Self::Compare { lhs, rhs, .. } => {
                lhs.walk(visit);
                rhs.walk(visit);
            }
            Self::Literal(_) | Self::Symbol(_) => {}
        }
    }
}

impl fmt::Display for ExecutableExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Symbol(name) => f.write_str(name),
            Self::Call { function, args } => {
                let rendered = args.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "{function}({})", rendered.join(", "))
            }
            Self::Not(arg) => write!(f, "not {arg}"),
            Self::And(args) | Self::Or(args) => {
                let sep = if matches!(self, Self::And(_)) {
                    " and "
                } else {
                    " or "
                };
                let rendered = args.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "({})", rendered.join(sep))
            }
            Self::Compare { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
        }
    }
}
