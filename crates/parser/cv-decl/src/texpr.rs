//! Type expression syntax
//!
//! ```text
//! ty    := atom ("[" "]")*
//! atom  := "(" ty ("," ty)+ ")"
//!        | ident ("<" ty ("," ty)* ">")?
//! ```
#![allow(
    clippy::min_ident_chars,
    reason = "Ty is a conventional name in type system implementations"
)]

use std::fmt;

/// Unresolved type expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `Name` or `Name<A, B>`
    Name {
        /// Identifier as written
        name: String,
        /// Generic arguments
        args: Vec<TypeExpr>,
    },
    /// `(A, B)`
    Tuple(Vec<TypeExpr>),
    /// `T[]`
    Array(Box<TypeExpr>),
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |f: &mut fmt::Formatter<'_>, items: &[TypeExpr]| -> fmt::Result {
            for (position, item) in items.iter().enumerate() {
                if position > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        };
        match self {
            Self::Name { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    list(f, args)?;
                    write!(f, ">")?;
                }
                Ok(())
            }
            Self::Tuple(elements) => {
                write!(f, "(")?;
                list(f, elements)?;
                write!(f, ")")
            }
            Self::Array(element) => write!(f, "{element}[]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Punct(char),
}

fn tokenize(text: &str) -> Result<Vec<Token<'_>>, String> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some(&(start, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else if matches!(ch, '<' | '>' | ',' | '(' | ')' | '[' | ']') {
            tokens.push(Token::Punct(ch));
            chars.next();
        } else if ch.is_alphabetic() || ch == '_' {
            let mut end = start;
            while let Some(&(index, next)) = chars.peek() {
                if next.is_alphanumeric() || next == '_' || next == '.' {
                    end = index + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Ident(&text[start..end]));
        } else {
            return Err(format!("unexpected character `{ch}`"));
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expect(&mut self, punct: char) -> Result<(), String> {
        match self.bump() {
            Some(Token::Punct(found)) if found == punct => Ok(()),
            Some(Token::Punct(found)) => Err(format!("expected `{punct}`, found `{found}`")),
            Some(Token::Ident(found)) => Err(format!("expected `{punct}`, found `{found}`")),
            None => Err(format!("expected `{punct}`, found end of input")),
        }
    }

    fn eat(&mut self, punct: char) -> bool {
        if self.peek() == Some(Token::Punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn ty(&mut self) -> Result<TypeExpr, String> {
        let mut ty = self.atom()?;
        while self.eat('[') {
            self.expect(']')?;
            ty = TypeExpr::Array(Box::new(ty));
        }
        Ok(ty)
    }

    fn atom(&mut self) -> Result<TypeExpr, String> {
        match self.bump() {
            Some(Token::Punct('(')) => {
                let elements = self.list(')')?;
                if elements.len() < 2 {
                    return Err("a tuple needs at least two elements".to_owned());
                }
                Ok(TypeExpr::Tuple(elements))
            }
            Some(Token::Ident(name)) => {
                let args = if self.eat('<') { self.list('>')? } else { Vec::new() };
                Ok(TypeExpr::Name {
                    name: name.to_owned(),
                    args,
                })
            }
            Some(Token::Punct(found)) => Err(format!("expected a type, found `{found}`")),
            None => Err("expected a type, found end of input".to_owned()),
        }
    }

    fn list(&mut self, close: char) -> Result<Vec<TypeExpr>, String> {
        let mut items = vec![self.ty()?];
        while self.eat(',') {
            items.push(self.ty()?);
        }
        self.expect(close)?;
        Ok(items)
    }
}

/// Parse a complete type expression
pub fn parse_type_expr(text: &str) -> Result<TypeExpr, String> {
    let mut parser = Parser {
        tokens: tokenize(text)?,
        pos: 0,
    };
    let ty = parser.ty()?;
    match parser.peek() {
        None => Ok(ty),
        Some(Token::Ident(found)) => Err(format!("unexpected `{found}` after type")),
        Some(Token::Punct(found)) => Err(format!("unexpected `{found}` after type")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &str) -> TypeExpr {
        TypeExpr::Name {
            name: text.to_owned(),
            args: Vec::new(),
        }
    }

    #[test]
    fn test_parse_nested_generics() {
        let parsed = parse_type_expr("Dictionary<string, List<T>>").unwrap();
        assert_eq!(
            parsed,
            TypeExpr::Name {
                name: "Dictionary".to_owned(),
                args: vec![
                    name("string"),
                    TypeExpr::Name {
                        name: "List".to_owned(),
                        args: vec![name("T")],
                    },
                ],
            }
        );
    }

    #[test]
    fn test_parse_tuple_arrays() {
        let parsed = parse_type_expr("(int, string)[][]").unwrap();
        let tuple = TypeExpr::Tuple(vec![name("int"), name("string")]);
        assert_eq!(
            parsed,
            TypeExpr::Array(Box::new(TypeExpr::Array(Box::new(tuple))))
        );
        assert_eq!(parsed.to_string(), "(int, string)[][]");
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_type_expr("").is_err());
        assert!(parse_type_expr("List<int").is_err());
        assert!(parse_type_expr("(int)").is_err());
        assert!(parse_type_expr("int string").is_err());
        assert!(parse_type_expr("int?").is_err());
    }
}
