//! Parser tests.

use pretty_assertions::assert_eq;

use crate::ast::*;
use crate::error::ParserError;
use crate::lexer::Scanner;
use crate::parser::Parser;

fn parse(source: &str) -> Vec<Stmt> {
    let tokens = Scanner::new(source).scan_tokens().unwrap();
    Parser::new(tokens).parse().unwrap().statements
}

fn kinds(source: &str) -> Vec<StmtKind> {
    parse(source).into_iter().map(|s| s.kind).collect()
}

fn single(source: &str) -> StmtKind {
    let mut all = kinds(source);
    assert_eq!(all.len(), 1, "expected one statement in {:?}", source);
    all.remove(0)
}

fn named(name: &str) -> VarRef {
    VarRef::Named(name.to_string())
}

fn number_of(kind: &StmtKind) -> f64 {
    match kind {
        StmtKind::Assign { value, .. } => match value.kind {
            ExprKind::Number(n) => n,
            ref other => panic!("expected number, got {:?}", other),
        },
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[test]
fn test_variable_names_are_normalised() {
    let StmtKind::Assign { target, .. } = single("My Heart is 5") else {
        panic!("expected assignment");
    };
    assert_eq!(target, named("my heart"));

    let StmtKind::Assign { target, .. } = single("Doctor Feelgood is 5") else {
        panic!("expected assignment");
    };
    assert_eq!(target, named("doctor feelgood"));
}

#[test]
fn test_poetic_numbers() {
    assert_eq!(number_of(&single("Rockstar is a big bad monster")), 1337.0);
    assert_eq!(number_of(&single("Tommy was shy")), 3.0);
    assert_eq!(number_of(&single("My dreams were ice. A life")), 3.14);
    assert_eq!(number_of(&single("My heart is a lover's dream.")), 165.0);
    assert_eq!(number_of(&single("Noise is a wrecking-ball")), 13.0);
}

#[test]
fn test_literal_assignment_takes_an_expression() {
    let StmtKind::Assign { value, .. } = single("X is 5 plus 3") else {
        panic!("expected assignment");
    };
    assert!(matches!(
        value.kind,
        ExprKind::Binary {
            operator: BinaryOp::Add,
            ..
        }
    ));
    let StmtKind::Assign { value, .. } = single("X is nothing") else {
        panic!("expected assignment");
    };
    assert_eq!(value.kind, ExprKind::Nothing);
}

#[test]
fn test_poetic_string() {
    let StmtKind::Assign { target, value } = single("Bob says hello, world") else {
        panic!("expected assignment");
    };
    assert_eq!(target, named("bob"));
    assert_eq!(value.kind, ExprKind::String("hello, world".to_string()));
}

#[test]
fn test_list_fold_collects_extra_operands() {
    let StmtKind::Assign { value, .. } = single("Let X be 1 with 2, 3, and 4") else {
        panic!("expected assignment");
    };
    let ExprKind::Binary { operator, extra, .. } = value.kind else {
        panic!("expected binary");
    };
    assert_eq!(operator, BinaryOp::Add);
    assert_eq!(extra.len(), 2);
}

#[test]
fn test_precedence_of_word_operators() {
    let StmtKind::Output(expr) = single("Say 1 plus 2 times 3 is 7") else {
        panic!("expected output");
    };
    let ExprKind::Binary { operator, left, .. } = expr.kind else {
        panic!("expected binary");
    };
    assert_eq!(operator, BinaryOp::Equal);
    let ExprKind::Binary { operator, right, .. } = left.kind else {
        panic!("expected addition");
    };
    assert_eq!(operator, BinaryOp::Add);
    assert!(matches!(
        right.kind,
        ExprKind::Binary {
            operator: BinaryOp::Multiply,
            ..
        }
    ));
}

#[test]
fn test_comparisons() {
    let StmtKind::While { condition, .. } = single("While your heart is as high as your soul\nSay 1") else {
        panic!("expected while");
    };
    assert!(matches!(
        condition.kind,
        ExprKind::Binary {
            operator: BinaryOp::GreaterEqual,
            ..
        }
    ));
}

#[test]
fn test_call_arguments_stop_before_comparison() {
    let StmtKind::If { condition, .. } = single("If Midnight taking my world, Fire is nothing\nSay 1") else {
        panic!("expected if");
    };
    let ExprKind::Binary { operator, left, .. } = condition.kind else {
        panic!("expected equality");
    };
    assert_eq!(operator, BinaryOp::Equal);
    let ExprKind::Call { callee, arguments } = left.kind else {
        panic!("expected call");
    };
    assert_eq!(callee, named("midnight"));
    assert_eq!(arguments.len(), 2);
}

#[test]
fn test_blank_line_closes_function_body() {
    let statements = kinds("Midnight takes your heart\nGive back your heart\n\nSay Midnight taking 1");
    assert_eq!(statements.len(), 2);
    let StmtKind::Function(decl) = &statements[0] else {
        panic!("expected function");
    };
    assert_eq!(decl.name, "midnight");
    assert_eq!(decl.params, vec!["your heart".to_string()]);
    assert_eq!(decl.body.len(), 1);
}

#[test]
fn test_if_else_blocks() {
    let statements = kinds("If X\nSay 1\nElse say 2\nSay 3\n\nSay 4");
    assert_eq!(statements.len(), 2);
    let StmtKind::If {
        then_branch,
        else_branch,
        ..
    } = &statements[0]
    else {
        panic!("expected if");
    };
    assert_eq!(then_branch.len(), 1);
    assert_eq!(else_branch.as_ref().map(Vec::len), Some(2));
}

#[test]
fn test_return_after_loop_body_belongs_to_function() {
    let source = "Eddy wants your dedication\nWhile X\nBuild X up\nGive X\n\nSay 1";
    let statements = kinds(source);
    assert_eq!(statements.len(), 2);
    let StmtKind::Function(decl) = &statements[0] else {
        panic!("expected function");
    };
    assert_eq!(decl.body.len(), 2);
    assert!(matches!(&decl.body[0].kind, StmtKind::While { body, .. } if body.len() == 1));
    assert!(matches!(decl.body[1].kind, StmtKind::Return(_)));
}

#[test]
fn test_leading_return_stays_in_branch() {
    let statements = kinds("Fact takes n\nIf n is 0\nGive back 1\n\nGive back n\n");
    let StmtKind::Function(decl) = &statements[0] else {
        panic!("expected function");
    };
    assert_eq!(decl.body.len(), 2);
    let StmtKind::If { then_branch, .. } = &decl.body[0].kind else {
        panic!("expected if");
    };
    assert_eq!(then_branch.len(), 1);
    assert!(matches!(then_branch[0].kind, StmtKind::Return(_)));
}

#[test]
fn test_increment_counts() {
    assert_eq!(
        single("Build my world up, up"),
        StmtKind::Increment {
            target: named("my world"),
            count: 2
        }
    );
    assert_eq!(
        single("Knock it down"),
        StmtKind::Decrement {
            target: VarRef::Pronoun("it".to_string()),
            count: 1
        }
    );
}

#[test]
fn test_turn_forms() {
    assert_eq!(
        single("Turn up X"),
        StmtKind::Round {
            target: named("x"),
            mode: RoundMode::Up
        }
    );
    assert_eq!(
        single("Turn X around"),
        StmtKind::Round {
            target: named("x"),
            mode: RoundMode::Nearest
        }
    );
}

#[test]
fn test_rock_forms() {
    let StmtKind::ArrayPush { target, items } = single("Rock 1, 2, 3 into arr") else {
        panic!("expected push");
    };
    assert_eq!(target, named("arr"));
    assert_eq!(items.len(), 3);

    let StmtKind::ArrayPush { target, items } = single("Rock the list with 4, 5") else {
        panic!("expected push");
    };
    assert_eq!(target, named("the list"));
    assert_eq!(items.len(), 2);

    let StmtKind::ArrayPush { items, .. } = single("Rock Jane into arr") else {
        panic!("expected push");
    };
    assert_eq!(items.len(), 1);

    assert_eq!(
        single("Rock arr"),
        StmtKind::ArrayPush {
            target: named("arr"),
            items: vec![]
        }
    );
}

#[test]
fn test_index_uses_additive_expression() {
    let StmtKind::Output(expr) = single("say arr at 1 + 1") else {
        panic!("expected output");
    };
    let ExprKind::Index { index, .. } = expr.kind else {
        panic!("expected index");
    };
    assert!(matches!(index.kind, ExprKind::Binary { .. }));
}

#[test]
fn test_transform_statements() {
    let StmtKind::Split {
        source,
        target,
        delimiter,
    } = single("Cut your cake with my knife")
    else {
        panic!("expected split");
    };
    assert_eq!(source.kind, ExprKind::Variable(named("your cake")));
    assert_eq!(target, None);
    assert!(delimiter.is_some());

    let StmtKind::Cast { target, radix, .. } = single("Cast \"aa\" into result with 16") else {
        panic!("expected cast");
    };
    assert_eq!(target, Some(named("result")));
    assert_eq!(radix.map(|r| r.kind), Some(ExprKind::Number(16.0)));
}

#[test]
fn test_return_forms() {
    for source in ["Give back X", "Give X back", "Send back X", "Return X", "Give X"] {
        let StmtKind::Return(value) = single(source) else {
            panic!("expected return in {:?}", source);
        };
        assert_eq!(value.kind, ExprKind::Variable(named("x")), "{}", source);
    }
}

#[test]
fn test_pronoun_parameter_is_rejected() {
    let tokens = Scanner::new("Midnight takes it\nSay 1").scan_tokens().unwrap();
    assert!(Parser::new(tokens).parse().is_err());
}

#[test]
fn test_loose_else_is_rejected() {
    let tokens = Scanner::new("Else\nSay 1").scan_tokens().unwrap();
    assert!(Parser::new(tokens).parse().is_err());
}

#[test]
fn test_literal_assignment_target() {
    for source in ["Put 1 into 2", "Let \"x\" be 3"] {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        let err = Parser::new(tokens).parse().unwrap_err();
        assert!(
            matches!(err, ParserError::InvalidAssignmentTarget(_)),
            "{}",
            source
        );
    }
}
