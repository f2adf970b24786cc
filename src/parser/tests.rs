#[cfg(test)]
mod tests {
    use crate::ast::{
        BinaryOperator, BoolOperator, CompareOperator, Expr, Literal, Statement,
    };
    use crate::lexer::tokenize;
    use crate::parser::{parse, parse_expression};

    fn parse_source(source: &str) -> Vec<Statement> {
        let tokens = tokenize(source).unwrap();
        parse(&tokens).unwrap().statements
    }

    #[test]
    fn test_simple_assignment() {
        let statements = parse_source("x = 42");

        match &statements[0] {
            Statement::Assign { targets, value } => {
                assert_eq!(targets.len(), 1);
                assert!(matches!(&targets[0], Expr::Name(name) if name == "x"));
                match value {
                    Expr::Literal(Literal::Int(i)) => assert_eq!(i.to_string(), "42"),
                    _ => panic!("Expected integer literal 42"),
                }
            }
            _ => panic!("Expected assignment"),
        }
    }

    #[test]
    fn test_chained_assignment() {
        let statements = parse_source("a = b = 1");

        match &statements[0] {
            Statement::Assign { targets, .. } => {
                assert_eq!(targets.len(), 2);
            }
            _ => panic!("Expected assignment"),
        }
    }

    #[test]
    fn test_tuple_assignment() {
        let statements = parse_source("a, b = 1, 2");

        match &statements[0] {
            Statement::Assign { targets, value } => {
                match &targets[0] {
                    Expr::Tuple(names) => assert_eq!(names.len(), 2),
                    _ => panic!("Expected tuple target"),
                }
                match value {
                    Expr::Tuple(items) => assert_eq!(items.len(), 2),
                    _ => panic!("Expected tuple value"),
                }
            }
            _ => panic!("Expected assignment"),
        }
    }

    #[test]
    fn test_trailing_comma_makes_singleton_tuple() {
        let statements = parse_source("t = 1,");

        match &statements[0] {
            Statement::Assign { value, .. } => match value {
                Expr::Tuple(items) => assert_eq!(items.len(), 1),
                _ => panic!("Expected singleton tuple"),
            },
            _ => panic!("Expected assignment"),
        }
    }

    #[test]
    fn test_augmented_assignment() {
        let statements = parse_source("x //= 3");

        match &statements[0] {
            Statement::AugAssign { name, op, .. } => {
                assert_eq!(name, "x");
                assert_eq!(*op, BinaryOperator::DoubleSlash);
            }
            _ => panic!("Expected augmented assignment"),
        }
    }

    #[test]
    fn test_invalid_assignment_target() {
        let tokens = tokenize("1 = 2").unwrap();
        let err = parse(&tokens).unwrap_err();
        assert!(err.message.contains("Invalid assignment target"));
    }

    #[test]
    fn test_function_definition_with_default() {
        let statements = parse_source("def f(x, y=10): return x + y");

        match &statements[0] {
            Statement::FunctionDef {
                name,
                parameters,
                body,
            } => {
                assert_eq!(name, "f");
                assert_eq!(parameters.len(), 2);
                assert_eq!(parameters[0].name, "x");
                assert!(parameters[0].default.is_none());
                assert_eq!(parameters[1].name, "y");
                assert!(parameters[1].default.is_some());
                assert_eq!(body.len(), 1);
            }
            _ => panic!("Expected function definition"),
        }
    }

    #[test]
    fn test_non_default_after_default_is_an_error() {
        let tokens = tokenize("def f(x=1, y): return x").unwrap();
        let err = parse(&tokens).unwrap_err();
        assert!(err.message.contains("default"));
    }

    #[test]
    fn test_indented_function_body() {
        let source = "def f(n):\n    m = n + 1\n    return m";
        let statements = parse_source(source);

        match &statements[0] {
            Statement::FunctionDef { body, .. } => assert_eq!(body.len(), 2),
            _ => panic!("Expected function definition"),
        }
    }

    #[test]
    fn test_if_elif_else() {
        let source = "if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3";
        let statements = parse_source(source);

        match &statements[0] {
            Statement::If {
                branches,
                else_body,
            } => {
                assert_eq!(branches.len(), 2);
                assert!(else_body.is_some());
            }
            _ => panic!("Expected if statement"),
        }
    }

    #[test]
    fn test_while_with_inline_flow_statement() {
        let source = "while True:\n    if done: break\n    continue";
        let statements = parse_source(source);

        match &statements[0] {
            Statement::While { body, .. } => {
                assert_eq!(body.len(), 2);
                assert!(matches!(body[1], Statement::Continue));
            }
            _ => panic!("Expected while statement"),
        }
    }

    #[test]
    fn test_semicolon_separated_statements() {
        let statements = parse_source("a = 1; b = 2; print(a)");
        assert_eq!(statements.len(), 3);
    }

    #[test]
    fn test_return_tuple() {
        let statements = parse_source("def f():\n    return 1, 2");

        match &statements[0] {
            Statement::FunctionDef { body, .. } => match &body[0] {
                Statement::Return { value: Some(expr) } => {
                    assert!(matches!(expr, Expr::Tuple(items) if items.len() == 2));
                }
                _ => panic!("Expected return with value"),
            },
            _ => panic!("Expected function definition"),
        }
    }

    #[test]
    fn test_call_with_keyword_arguments() {
        let statements = parse_source("f(1, y=2)");

        match &statements[0] {
            Statement::Expression(Expr::Call { function, args }) => {
                assert_eq!(function, "f");
                assert_eq!(args.len(), 2);
                assert!(args[0].name.is_none());
                assert_eq!(args[1].name.as_deref(), Some("y"));
            }
            _ => panic!("Expected call expression"),
        }
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        let statements = parse_source("1 + 2 * 3");

        match &statements[0] {
            Statement::Expression(Expr::Binary { op, right, .. }) => {
                assert_eq!(*op, BinaryOperator::Plus);
                assert!(matches!(
                    right.as_ref(),
                    Expr::Binary {
                        op: BinaryOperator::Star,
                        ..
                    }
                ));
            }
            _ => panic!("Expected binary expression"),
        }
    }

    #[test]
    fn test_comparison_chain() {
        let statements = parse_source("1 < x <= 3");

        match &statements[0] {
            Statement::Expression(Expr::Compare { comparisons, .. }) => {
                assert_eq!(comparisons.len(), 2);
                assert_eq!(comparisons[0].0, CompareOperator::Less);
                assert_eq!(comparisons[1].0, CompareOperator::LessEqual);
            }
            _ => panic!("Expected comparison"),
        }
    }

    #[test]
    fn test_bool_chain_collects_operands() {
        let statements = parse_source("a or b or c");

        match &statements[0] {
            Statement::Expression(Expr::BoolChain { op, operands }) => {
                assert_eq!(*op, BoolOperator::Or);
                assert_eq!(operands.len(), 3);
            }
            _ => panic!("Expected bool chain"),
        }
    }

    #[test]
    fn test_adjacent_string_literals_concatenate() {
        let statements = parse_source("\"a\" f\"b{x}\"");

        match &statements[0] {
            Statement::Expression(Expr::Str { parts }) => {
                assert_eq!(parts.len(), 2);
                assert!(!parts[0].interpolated);
                assert!(parts[1].interpolated);
            }
            _ => panic!("Expected string atom"),
        }
    }

    #[test]
    fn test_parse_expression_fragment() {
        assert!(matches!(
            parse_expression("1 + 2").unwrap(),
            Expr::Binary { .. }
        ));
        assert!(matches!(
            parse_expression("a, b").unwrap(),
            Expr::Tuple(items) if items.len() == 2
        ));
        // Surrounding layout is insignificant in a fragment.
        assert!(matches!(parse_expression("  x  ").unwrap(), Expr::Name(_)));
    }

    #[test]
    fn test_parse_expression_rejects_incomplete_input() {
        assert!(parse_expression("1 +").is_err());
        assert!(parse_expression("x 1").is_err());
    }

    #[test]
    fn test_only_names_can_be_called() {
        let tokens = tokenize("3(1)").unwrap();
        assert!(parse(&tokens).is_err());
    }
}
