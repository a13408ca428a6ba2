use tempfile::tempdir;

use super::{path_str, read, serial};
use crate::ast::{CommandNode, IoMode, SimpleCommand};
use crate::executor::execute;
use crate::lexer::{lex, Operator, Token};
use crate::parser::parse_line;
use crate::types::{ExecStatus, ShellError};
use crate::word::Word;

fn word(text: &str) -> Token {
    Token::Word { text: text.to_string(), quoted: false }
}

fn simple(line: &str) -> SimpleCommand {
    match parse_line(line).unwrap() {
        Some(CommandNode::Simple(cmd)) => cmd,
        other => panic!("expected a simple command, got {:?}", other),
    }
}

#[test]
fn test_lex_operators() {
    let tokens = lex("a|b||c&&d&e;f<g>h>>i 2>j 2>>k &>l").unwrap();
    assert_eq!(
        tokens,
        vec![
            word("a"),
            Token::Operator(Operator::Pipe),
            word("b"),
            Token::Operator(Operator::Or),
            word("c"),
            Token::Operator(Operator::And),
            word("d"),
            Token::Operator(Operator::Parallel),
            word("e"),
            Token::Operator(Operator::Semicolon),
            word("f"),
            Token::Operator(Operator::RedirectIn),
            word("g"),
            Token::Operator(Operator::RedirectOut),
            word("h"),
            Token::Operator(Operator::RedirectAppend),
            word("i"),
            Token::Operator(Operator::RedirectError),
            word("j"),
            Token::Operator(Operator::RedirectErrorAppend),
            word("k"),
            Token::Operator(Operator::RedirectBoth),
            word("l"),
        ]
    );
}

#[test]
fn test_lex_quotes_and_escapes() {
    let tokens = lex(r#"echo 'a b' "c \"d\" \n" e\ f"#).unwrap();
    assert_eq!(
        tokens,
        vec![
            word("echo"),
            Token::Word { text: "a b".to_string(), quoted: true },
            Token::Word { text: "c \"d\" \\n".to_string(), quoted: true },
            Token::Word { text: "e f".to_string(), quoted: true },
        ]
    );
}

#[test]
fn test_lex_digit_words() {
    assert_eq!(lex("echo 2 12>x").unwrap(), vec![
        word("echo"),
        word("2"),
        word("12"),
        Token::Operator(Operator::RedirectOut),
        word("x"),
    ]);
}

#[test]
fn test_unterminated_quote() {
    assert!(matches!(lex("echo 'oops"), Err(ShellError::ParseError(_))));
}

#[test]
fn test_blank_line() {
    assert_eq!(parse_line("   ").unwrap(), None);
}

#[test]
fn test_precedence() {
    let node = parse_line("a | b && c ; d & e").unwrap().unwrap();
    let leaf = |name: &str| CommandNode::Simple(SimpleCommand::new(name));

    let expected = CommandNode::sequential(
        CommandNode::if_succeeded(CommandNode::pipe(leaf("a"), leaf("b")), leaf("c")),
        CommandNode::parallel(leaf("d"), leaf("e")),
    );
    assert_eq!(node, expected);
}

#[test]
fn test_left_associative() {
    let node = parse_line("a | b | c").unwrap().unwrap();
    let leaf = |name: &str| CommandNode::Simple(SimpleCommand::new(name));

    assert_eq!(
        node,
        CommandNode::pipe(CommandNode::pipe(leaf("a"), leaf("b")), leaf("c"))
    );
}

#[test]
fn test_trailing_semicolon() {
    assert_eq!(
        parse_line("true;").unwrap(),
        Some(CommandNode::Simple(SimpleCommand::new("true")))
    );
}

#[test]
fn test_syntax_errors() {
    for line in ["| a", "a |", "a &&", "a >", "; a", "a & ", "a > | b"] {
        assert!(
            matches!(parse_line(line), Err(ShellError::ParseError(_))),
            "{line:?} should not parse"
        );
    }
}

#[test]
fn test_assignment_verb() {
    let cmd = simple("NAME=some=value");
    assert_eq!(cmd.verb, Word::assignment("NAME", "some=value"));
    assert!(cmd.verb.is_assignment());

    assert!(!simple("'NAME=value'").verb.is_assignment());
    assert!(!simple("1X=value").verb.is_assignment());
    assert!(!simple("echo A=b").params[0].is_assignment());
}

#[test]
fn test_redirect_flags() {
    let cmd = simple("cmd < in > out 2> err");
    assert_eq!(cmd.input, Some(Word::new("in")));
    assert_eq!(cmd.output, Some(Word::new("out")));
    assert_eq!(cmd.error, Some(Word::new("err")));
    assert_eq!(cmd.io, IoMode::Overwrite);

    assert_eq!(simple("cmd >> out").io, IoMode::OutAppend);
    assert_eq!(simple("cmd 2>> err").io, IoMode::ErrAppend);
    assert_eq!(simple("cmd >> out 2>> err").io, IoMode::BothAppend);

    let both = simple("cmd arg &> all");
    assert_eq!(both.output, Some(Word::new("all")));
    assert_eq!(both.error, Some(Word::new("all")));
    assert_eq!(both.params, vec![Word::new("arg")]);
}

#[test]
fn test_parsed_line_runs() {
    let _guard = serial();
    let dir = tempdir().unwrap();
    let out = path_str(&dir.path().join("out"));

    let line = format!("echo abc | tr a-c x-z > {out} && echo done >> {out}");
    let node = parse_line(&line).unwrap().unwrap();
    assert_eq!(execute(&node), ExecStatus::SUCCESS);

    assert_eq!(read(&dir.path().join("out")), "xyz\ndone\n");
}
