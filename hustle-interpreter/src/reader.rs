//! Splits source text into tokens and feeds them to a [`Vm`].
//!
//! `[ ... ]` and `{ ... }` build an array and a quotation out of the cells read in between.
//! Inside them words are collected rather than run, except for parse words, which always run as
//! soon as they are read.

use crate::error::VmError;
use crate::primitives::data::{mark_stack, mark_to_array};
use crate::primitives::definition::array_to_quote;
use crate::vm::Vm;
use hustle_value::{Cell, Word};
use log::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Int(isize),
    Str(String),
    ArrayStart,
    ArrayEnd,
    QuoteStart,
    QuoteEnd,
    Symbol(String),
}

/// How reading a piece of source ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Every token was consumed.
    Done,
    /// `exit-bootstrap` was read at the top level; the rest of the source was skipped.
    ExitBootstrap,
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, VmError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' {
            chars.by_ref().find(|&c| c == '\n');
            continue;
        }
        if c == '\'' {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some('\'') => break,
                    Some(c) => text.push(c),
                    None => return Err(VmError::Syntax("unterminated string".to_string())),
                }
            }
            tokens.push(Token::Str(text));
            continue;
        }

        let mut word = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            word.push(c);
            chars.next();
        }
        tokens.push(classify(word));
    }

    Ok(tokens)
}

fn classify(word: String) -> Token {
    match word.as_str() {
        "[" => Token::ArrayStart,
        "]" => Token::ArrayEnd,
        "{" => Token::QuoteStart,
        "}" => Token::QuoteEnd,
        _ => match word.parse::<isize>() {
            Ok(value) => Token::Int(value),
            Err(_) => Token::Symbol(word),
        },
    }
}

/// Reads and runs `source`.
///
/// On error the data stack is left as is, including any marks of unfinished literals.
pub fn read_source(vm: &mut Vm, source: &str) -> Result<ReadOutcome, VmError> {
    let tokens = tokenize(source)?;
    // one entry per open literal: whether it is a quotation
    let mut open: Vec<bool> = Vec::new();

    for token in tokens {
        trace!("read {:?}", token);
        match token {
            Token::ArrayStart | Token::QuoteStart => {
                open.push(token == Token::QuoteStart);
                mark_stack(vm)?;
            }
            Token::ArrayEnd | Token::QuoteEnd => {
                let is_quote = token == Token::QuoteEnd;
                if open.pop() != Some(is_quote) {
                    return Err(VmError::Syntax(format!("unbalanced `{}`", if is_quote { "}" } else { "]" })));
                }
                mark_to_array(vm)?;
                if is_quote {
                    array_to_quote(vm)?;
                }
            }
            Token::Int(value) => vm.push(Cell::from_int(value))?,
            Token::Str(text) => {
                let string = vm.allocate_string(&text)?;
                vm.push(string.to_cell())?;
            }
            Token::Symbol(name) => {
                let word = vm.lookup_symbol(&name)?;
                if open.is_empty() && word == vm.globals.exit_bootstrap.cell() {
                    return Ok(ReadOutcome::ExitBootstrap);
                }
                let is_parse_word = word
                    .try_cast::<Word>()
                    .filter(|word| !word.is_null())
                    .map_or(false, |word| word.is_parse_word());
                if is_parse_word {
                    vm.call(word)?;
                } else if open.is_empty() {
                    vm.evaluate(word)?;
                } else {
                    vm.push(word)?;
                }
            }
        }
    }

    if !open.is_empty() {
        return Err(VmError::Syntax("unterminated literal".to_string()));
    }
    Ok(ReadOutcome::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::VmConfig;
    use hustle_gc::HeapConfig;
    use hustle_value::{Array, ByteString, Quotation};

    fn small_vm() -> Vm {
        Vm::new(VmConfig {
            stack_size: 64,
            call_frames: 64,
            heap: HeapConfig {
                region_size: 1 << 20,
                low_space_threshold: 1 << 12,
                stress: false,
            },
        })
        .unwrap()
    }

    #[test]
    fn tokens() {
        let tokens = tokenize("1 -2 'a b' [ { } ] dup # ignored 3\n-").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Int(1),
                Token::Int(-2),
                Token::Str("a b".to_string()),
                Token::ArrayStart,
                Token::QuoteStart,
                Token::QuoteEnd,
                Token::ArrayEnd,
                Token::Symbol("dup".to_string()),
                Token::Symbol("-".to_string()),
            ]
        );
    }

    #[test]
    fn unterminated_string() {
        assert!(matches!(tokenize("'abc"), Err(VmError::Syntax(_))));
    }

    #[test]
    fn evaluates_top_level_words() {
        let mut vm = small_vm();
        assert_eq!(read_source(&mut vm, "1 2 +").unwrap(), ReadOutcome::Done);
        assert_eq!(vm.pop_int().unwrap(), 3);
        assert!(vm.stack.is_empty());
    }

    #[test]
    fn array_literal_collects_words() {
        let mut vm = small_vm();
        read_source(&mut vm, "[ 1 dup 'x' ]").unwrap();
        let array = vm.pop_object::<Array>().unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array.get(0), Cell::from_int(1));
        assert_eq!(array.get(1), vm.lookup_symbol("dup").unwrap());
        assert_eq!(array.get(2).cast::<ByteString>().as_bytes(), b"x");
        assert!(vm.stack.is_empty());
    }

    #[test]
    fn quotation_literal_and_call() {
        let mut vm = small_vm();
        read_source(&mut vm, "4 { 1 + } call").unwrap();
        assert_eq!(vm.pop_int().unwrap(), 5);

        read_source(&mut vm, "{ }").unwrap();
        let quote = vm.pop_object::<Quotation>().unwrap();
        assert!(quote.definition.get().is_empty());
    }

    #[test]
    fn definitions_by_name() {
        let mut vm = small_vm();
        read_source(&mut vm, "'add3' { 3 + } def 5 add3").unwrap();
        assert_eq!(vm.pop_int().unwrap(), 8);
        assert!(vm.stack.is_empty());
    }

    #[test]
    fn parse_words_run_inside_literals() {
        let mut vm = small_vm();
        read_source(&mut vm, "'seven' { 7 } defp [ seven ]").unwrap();
        let array = vm.pop_object::<Array>().unwrap();
        assert_eq!(array.as_slice(), &[Cell::from_int(7)]);
    }

    #[test]
    fn exit_bootstrap_stops_reading() {
        let mut vm = small_vm();
        assert_eq!(read_source(&mut vm, "1 exit-bootstrap 2").unwrap(), ReadOutcome::ExitBootstrap);
        assert_eq!(vm.pop_int().unwrap(), 1);
        assert!(vm.stack.is_empty());
    }

    #[test]
    fn syntax_errors() {
        let mut vm = small_vm();
        assert!(matches!(read_source(&mut vm, "[ 1 }"), Err(VmError::Syntax(_))));
        vm.stack.clear();
        assert!(matches!(read_source(&mut vm, "{ 1"), Err(VmError::Syntax(_))));
        vm.stack.clear();
        assert_eq!(
            read_source(&mut vm, "no-such-word"),
            Err(VmError::SymbolNotFound("no-such-word".to_string()))
        );
    }
}
