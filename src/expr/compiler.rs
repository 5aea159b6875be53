use super::executable::{CompareOp, ExecutableExpr};
use super::value::Value;
use crate::error::CompileError;
use crate::plan::{Constant, ConditionExpr};

/// Compiles a symbolic condition into an executable expression.
///
/// `bindings` maps each formal parameter of the owning action to the name of
/// the concrete object it is grounded to. Parameter references become
/// symbols naming that object, so the object itself is fetched from the
/// context at evaluation time.
pub fn compile(
    expr: &ConditionExpr,
    bindings: &[(String, String)],
) -> Result<ExecutableExpr, CompileError> {
    match expr {
        ConditionExpr::Constant { value } => Ok(match value {
            Constant::Object(name) => ExecutableExpr::Symbol(name.clone()),
            other => ExecutableExpr::Literal(Value::from_literal(other).unwrap_or_default()),
        }),
        ConditionExpr::Parameter { name } => bindings
            .iter()
            .find_map(|(formal, object)| (formal == name).then(|| object.clone()))
            .map(ExecutableExpr::Symbol)
            .ok_or_else(|| CompileError::UnknownParameter {
                parameter: name.clone(),
            }),
        ConditionExpr::Fluent { name, args } => Ok(ExecutableExpr::Call {
            function: name.clone(),
            args: compile_all(args, bindings)?,
        }),
        ConditionExpr::Not { arg } => Ok(ExecutableExpr::Not(Box::new(compile(arg, bindings)?))),
        ConditionExpr::And { args } => Ok(ExecutableExpr::And(compile_all(args, bindings)?)),
        ConditionExpr::Or { args } => Ok(ExecutableExpr::Or(compile_all(args, bindings)?)),
        ConditionExpr::Equals { lhs, rhs } => compare(CompareOp::Eq, lhs, rhs, bindings),
        ConditionExpr::Le { lhs, rhs } => compare(CompareOp::Le, lhs, rhs, bindings),
        ConditionExpr::Lt { lhs, rhs } => compare(CompareOp::Lt, lhs, rhs, bindings),
        unsupported => Err(CompileError::UnsupportedOperator {
            operator: unsupported.operator_name().to_string(),
        }),
    }
}

fn compile_all(
    args: &[ConditionExpr],
    bindings: &[(String, String)],
) -> Result<Vec<ExecutableExpr>, CompileError> {
    args.iter().map(|arg| compile(arg, bindings)).collect()
}

fn compare(
    op: CompareOp,
    lhs: &ConditionExpr,
    rhs: &ConditionExpr,
    bindings: &[(String, String)],
) -> Result<ExecutableExpr, CompileError> {
    Ok(ExecutableExpr::Compare {
        op,
        lhs: Box::new(compile(lhs, bindings)?),
        rhs: Box::new(compile(rhs, bindings)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    fn bindings() -> Vec<(String, String)> {
        vec![
            ("from".to_string(), "l1".to_string()),
            ("to".to_string(), "l2".to_string()),
        ]
    }

    #[test]
    fn parameters_become_symbols_of_bound_objects() {
        let expr = ConditionExpr::fluent("robot_at", vec![ConditionExpr::param("from")]);
        let compiled = compile(&expr, &bindings()).unwrap();
        assert_eq!(compiled, ExecutableExpr::Call {
            function: "robot_at".into(),
            args: vec![ExecutableExpr::Symbol("l1".into())],
        });
    }

    #[test]
    fn constants_map_to_literals_or_symbols() {
        assert_eq!(
            compile(&ConditionExpr::int(3), &[]).unwrap(),
            ExecutableExpr::Literal(Value::Int(3))
        );
        assert_eq!(
            compile(&ConditionExpr::object("dock"), &[]).unwrap(),
            ExecutableExpr::Symbol("dock".into())
        );
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let err = compile(&ConditionExpr::param("via"), &bindings()).unwrap_err();
        assert_eq!(err, CompileError::UnknownParameter {
            parameter: "via".into()
        });
    }

    #[test]
    fn unsupported_operator_fails_fast_even_when_nested() {
        let expr = ConditionExpr::all(vec![
            ConditionExpr::boolean(true),
            ConditionExpr::Exists {
                variables: vec!["x".into()],
                body: Box::new(ConditionExpr::boolean(true)),
            },
        ]);
        let err = compile(&expr, &[]).unwrap_err();
        assert_eq!(err, CompileError::UnsupportedOperator {
            operator: "Exists".into()
        });
    }

    #[test]
    fn compiled_condition_evaluates_against_context() {
        let ctx = Context::builder()
            .object("l1")
            .object("l2")
            .fluent("robot_at", |args| {
                Ok(Value::Bool(
                    args.first().map(ToString::to_string).as_deref() == Some("l1"),
                ))
            })
            .build();
        let expr = ConditionExpr::all(vec![
            ConditionExpr::fluent("robot_at", vec![ConditionExpr::param("from")]),
            ConditionExpr::negate(ConditionExpr::fluent("robot_at", vec![
                ConditionExpr::param("to"),
            ])),
            ConditionExpr::equals(ConditionExpr::param("to"), ConditionExpr::object("l2")),
        ]);
        let compiled = compile(&expr, &bindings()).unwrap();
        assert!(compiled.holds(&ctx).unwrap());
    }
}
