use std::iter::Peekable;
use std::slice::Iter;

use crate::ast::{CommandNode, IoMode, SimpleCommand};
use crate::lexer::{lex, Operator, Token};
use crate::types::{Result, ShellError};
use crate::word::Word;

type Tokens<'a> = Peekable<Iter<'a, Token>>;

/// Lexes and parses one line. Blank input gives `None`.
pub fn parse_line(input: &str) -> Result<Option<CommandNode>> {
    parse(&lex(input)?)
}

/// Precedence, loosest first: `;`, `&`, `&&`/`||`, `|`. All left-associative.
pub fn parse(tokens: &[Token]) -> Result<Option<CommandNode>> {
    let mut iter = tokens.iter().peekable();
    if iter.peek().is_none() {
        return Ok(None);
    }
    let ast = parse_sequence(&mut iter)?;
    if let Some(token) = iter.next() {
        return Err(unexpected(Some(token)));
    }

    tracing::trace!(?ast, "parsed");
    Ok(Some(ast))
}

fn parse_sequence(tokens: &mut Tokens) -> Result<CommandNode> {
    let mut left = parse_parallel(tokens)?;
    while next_is(tokens, Operator::Semicolon) {
        tokens.next();
        if tokens.peek().is_none() {
            break;
        }
        let right = parse_parallel(tokens)?;
        left = CommandNode::sequential(left, right);
    }
    Ok(left)
}

fn parse_parallel(tokens: &mut Tokens) -> Result<CommandNode> {
    let mut left = parse_conditional(tokens)?;
    while next_is(tokens, Operator::Parallel) {
        tokens.next();
        let right = parse_conditional(tokens)?;
        left = CommandNode::parallel(left, right);
    }
    Ok(left)
}

fn parse_conditional(tokens: &mut Tokens) -> Result<CommandNode> {
    let mut left = parse_pipeline(tokens)?;
    loop {
        if next_is(tokens, Operator::And) {
            tokens.next();
            let right = parse_pipeline(tokens)?;
            left = CommandNode::if_succeeded(left, right);
        } else if next_is(tokens, Operator::Or) {
            tokens.next();
            let right = parse_pipeline(tokens)?;
            left = CommandNode::if_failed(left, right);
        } else {
            return Ok(left);
        }
    }
}

fn parse_pipeline(tokens: &mut Tokens) -> Result<CommandNode> {
    let mut left = parse_simple(tokens)?;
    while next_is(tokens, Operator::Pipe) {
        tokens.next();
        let right = parse_simple(tokens)?;
        left = CommandNode::pipe(left, right);
    }
    Ok(left)
}

fn parse_simple(tokens: &mut Tokens) -> Result<CommandNode> {
    let mut words: Vec<(String, bool)> = Vec::new();
    let mut input = None;
    let mut output = None;
    let mut error = None;
    let mut out_append = false;
    let mut err_append = false;

    while let Some(token) = tokens.peek() {
        match token {
            Token::Word { text, quoted } => {
                words.push((text.clone(), *quoted));
                tokens.next();
            }
            Token::Operator(op) => {
                let op = *op;
                match op {
                    Operator::RedirectIn => {
                        tokens.next();
                        input = Some(target(tokens)?);
                    }
                    Operator::RedirectOut | Operator::RedirectAppend => {
                        tokens.next();
                        output = Some(target(tokens)?);
                        out_append = op == Operator::RedirectAppend;
                    }
                    Operator::RedirectError | Operator::RedirectErrorAppend => {
                        tokens.next();
                        error = Some(target(tokens)?);
                        err_append = op == Operator::RedirectErrorAppend;
                    }
                    Operator::RedirectBoth => {
                        tokens.next();
                        let path = target(tokens)?;
                        output = Some(path.clone());
                        error = Some(path);
                        out_append = false;
                        err_append = false;
                    }
                    _ => break,
                }
            }
        }
    }

    let mut words = words.into_iter();
    let Some((verb, quoted)) = words.next() else {
        return Err(unexpected(tokens.peek().copied()));
    };

    let mut cmd = SimpleCommand::new(verb_word(verb, quoted))
        .args(words.map(|(text, _)| text))
        .io(IoMode::from_flags(out_append, err_append));
    cmd.input = input;
    cmd.output = output;
    cmd.error = error;
    Ok(CommandNode::Simple(cmd))
}

/// An unquoted `NAME=value` verb becomes the `NAME` `=` `value` word.
fn verb_word(text: String, quoted: bool) -> Word {
    if !quoted {
        if let Some((name, value)) = text.split_once('=') {
            if is_name(name) {
                return Word::assignment(name, value);
            }
        }
    }
    Word::new(text)
}

fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn target(tokens: &mut Tokens) -> Result<Word> {
    match tokens.next() {
        Some(Token::Word { text, .. }) => Ok(Word::new(text.clone())),
        other => Err(unexpected(other)),
    }
}

fn next_is(tokens: &mut Tokens, op: Operator) -> bool {
    matches!(tokens.peek(), Some(Token::Operator(next)) if *next == op)
}

fn unexpected(token: Option<&Token>) -> ShellError {
    match token {
        Some(Token::Operator(op)) => ShellError::ParseError(format!("unexpected {:?}", op)),
        Some(Token::Word { text, .. }) => ShellError::ParseError(format!("unexpected word '{}'", text)),
        None => ShellError::ParseError("unexpected end of input".to_string()),
    }
}
