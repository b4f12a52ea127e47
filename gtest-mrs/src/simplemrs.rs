//! SimpleMRS decoder
//!
//! Accepts the bracketed serialization written by ACE into `result:mrs`:
//!
//! ```text
//! [ LTOP: h0 INDEX: e2 [ e SF: prop ]
//!   RELS: < [ _bark_v_1<4:10> LBL: h1 ARG0: e2 ARG1: x3 ] ... >
//!   HCONS: < h0 qeq h1 ... > ICONS: < > ]
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::mrs::{
    Arg, ElementaryPredication, HandleConstraint, IndividualConstraint, Mrs, ScopeRelation, Var, CARG_ROLE,
    LABEL_ROLE,
};
use crate::DecodeError;

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\A(?:(\s+)|("(?:[^"\\]|\\.)*")|([\[\]<>:])|([^\s\[\]<>:"]+))"#).expect("token regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    Open,
    Close,
    LAngle,
    RAngle,
    Colon,
    Str(String),
    Sym(String),
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    text: String,
    offset: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, DecodeError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let caps = TOKEN.captures(rest).ok_or_else(|| DecodeError::UnexpectedToken {
            found: rest.chars().take(16).collect(),
            offset: pos,
            expected: "a token",
        })?;
        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();

        let tok = if caps.get(1).is_some() {
            None
        } else if let Some(m) = caps.get(2) {
            let quoted = m.as_str();
            Some(Tok::Str(unquote(&quoted[1..quoted.len() - 1])))
        } else if let Some(m) = caps.get(3) {
            Some(match m.as_str() {
                "[" => Tok::Open,
                "]" => Tok::Close,
                "<" => Tok::LAngle,
                ">" => Tok::RAngle,
                _ => Tok::Colon,
            })
        } else {
            Some(Tok::Sym(whole.to_string()))
        };

        if let Some(tok) = tok {
            tokens.push(Token { tok, text: whole.to_string(), offset: pos });
        }
        pos += whole.len();
    }

    Ok(tokens)
}

fn unquote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Decode one SimpleMRS string
pub fn decode(input: &str) -> Result<Mrs, DecodeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::Empty);
    }
    if trimmed.starts_with('<') {
        return Err(DecodeError::Unsupported { format: "XML".to_string() });
    }
    if trimmed.to_lowercase().starts_with("dmrs") {
        return Err(DecodeError::Unsupported { format: "DMRS".to_string() });
    }

    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0, mrs: Mrs::default() };
    parser.mrs()?;

    if let Some(extra) = parser.tokens.get(parser.pos) {
        return Err(DecodeError::UnexpectedToken {
            found: extra.text.clone(),
            offset: extra.offset,
            expected: "end of input",
        });
    }
    Ok(parser.mrs)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    mrs: Mrs,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn next(&mut self, expected: &'static str) -> Result<Token, DecodeError> {
        let token = self.tokens.get(self.pos).cloned().ok_or(DecodeError::UnexpectedEnd { expected })?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, tok: Tok, expected: &'static str) -> Result<(), DecodeError> {
        let token = self.next(expected)?;
        if token.tok == tok {
            Ok(())
        } else {
            Err(unexpected(&token, expected))
        }
    }

    fn symbol(&mut self, expected: &'static str) -> Result<(String, usize), DecodeError> {
        let token = self.next(expected)?;
        match token.tok {
            Tok::Sym(s) => Ok((s, token.offset)),
            _ => Err(unexpected(&token, expected)),
        }
    }

    fn mrs(&mut self) -> Result<(), DecodeError> {
        self.expect(Tok::Open, "'['")?;
        if self.peek() == Some(&Tok::LAngle) {
            self.lnk()?;
        }
        if matches!(self.peek(), Some(Tok::Str(_))) {
            // surface string
            self.pos += 1;
        }

        loop {
            if self.peek() == Some(&Tok::Close) {
                self.pos += 1;
                return Ok(());
            }
            let (feature, offset) = self.symbol("a feature or ']'")?;
            self.expect(Tok::Colon, "':'")?;
            match feature.to_uppercase().as_str() {
                "LTOP" | "TOP" => self.mrs.top = Some(self.var()?),
                "INDEX" => self.mrs.index = Some(self.var()?),
                "RELS" => self.rels()?,
                "HCONS" => self.hcons()?,
                "ICONS" => self.icons()?,
                _ => {
                    return Err(DecodeError::UnexpectedToken {
                        found: feature,
                        offset,
                        expected: "LTOP, INDEX, RELS, HCONS or ICONS",
                    })
                }
            }
        }
    }

    fn lnk(&mut self) -> Result<String, DecodeError> {
        self.expect(Tok::LAngle, "'<'")?;
        let mut text = String::new();
        loop {
            let token = self.next("'>'")?;
            match token.tok {
                Tok::RAngle => return Ok(text),
                Tok::Open | Tok::Close | Tok::LAngle => return Err(unexpected(&token, "'>'")),
                _ => {
                    if !text.is_empty() && !matches!(token.tok, Tok::Colon) && !text.ends_with(':') {
                        text.push(' ');
                    }
                    text.push_str(&token.text);
                }
            }
        }
    }

    fn var(&mut self) -> Result<Var, DecodeError> {
        let (text, offset) = self.symbol("a variable")?;
        let var = Var::parse(&text).ok_or(DecodeError::InvalidVariable { found: text, offset })?;
        if self.peek() == Some(&Tok::Open) {
            self.properties(&var)?;
        }
        Ok(var)
    }

    fn properties(&mut self, var: &Var) -> Result<(), DecodeError> {
        self.expect(Tok::Open, "'['")?;
        // variable type, e.g. the `x` of `[ x PERS: 3 ]`
        self.symbol("a variable type")?;
        let props = self.mrs.properties.entry(var.clone()).or_default();
        loop {
            let token = self.tokens.get(self.pos).cloned().ok_or(DecodeError::UnexpectedEnd { expected: "']'" })?;
            self.pos += 1;
            match token.tok {
                Tok::Close => return Ok(()),
                Tok::Sym(name) => {
                    let colon = self.tokens.get(self.pos).cloned().ok_or(DecodeError::UnexpectedEnd { expected: "':'" })?;
                    if colon.tok != Tok::Colon {
                        return Err(unexpected(&colon, "':'"));
                    }
                    let value =
                        self.tokens.get(self.pos + 1).cloned().ok_or(DecodeError::UnexpectedEnd { expected: "a value" })?;
                    let value = match value.tok {
                        Tok::Sym(v) | Tok::Str(v) => v,
                        _ => return Err(unexpected(&value, "a value")),
                    };
                    self.pos += 2;
                    props.insert(name.to_uppercase(), value.to_lowercase());
                }
                _ => return Err(unexpected(&token, "a property or ']'")),
            }
        }
    }

    fn rels(&mut self) -> Result<(), DecodeError> {
        self.expect(Tok::LAngle, "'<'")?;
        loop {
            match self.peek() {
                Some(Tok::RAngle) => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => {
                    let ep = self.ep()?;
                    self.mrs.eps.push(ep);
                }
                None => return Err(DecodeError::UnexpectedEnd { expected: "'>'" }),
            }
        }
    }

    fn ep(&mut self) -> Result<ElementaryPredication, DecodeError> {
        self.expect(Tok::Open, "'['")?;
        let token = self.next("a predicate")?;
        let predicate = match token.tok {
            Tok::Sym(s) => s,
            Tok::Str(s) => format!("\"{}\"", s),
            _ => return Err(unexpected(&token, "a predicate")),
        };
        let lnk = if self.peek() == Some(&Tok::LAngle) { Some(self.lnk()?) } else { None };

        let mut ep = ElementaryPredication { predicate, lnk, label: None, args: Vec::new() };
        loop {
            if self.peek() == Some(&Tok::Close) {
                self.pos += 1;
                return Ok(ep);
            }
            let (role, _) = self.symbol("a role or ']'")?;
            let role = role.to_uppercase();
            self.expect(Tok::Colon, "':'")?;

            let value = match self.peek() {
                Some(Tok::Str(s)) => {
                    let s = s.clone();
                    self.pos += 1;
                    Arg::Const(s)
                }
                Some(Tok::Sym(s)) if role == CARG_ROLE && Var::parse(s).is_none() => {
                    let (s, _) = self.symbol("a value")?;
                    Arg::Const(s)
                }
                _ => Arg::Var(self.var()?),
            };

            if role == LABEL_ROLE {
                match value {
                    Arg::Var(v) => ep.label = Some(v),
                    Arg::Const(c) => {
                        return Err(DecodeError::InvalidVariable { found: c, offset: self.tokens[self.pos - 1].offset })
                    }
                }
            } else {
                ep.args.push((role, value));
            }
        }
    }

    fn hcons(&mut self) -> Result<(), DecodeError> {
        self.expect(Tok::LAngle, "'<'")?;
        while self.peek() != Some(&Tok::RAngle) {
            let hi = self.var()?;
            let (rel, offset) = self.symbol("qeq, lheq or outscopes")?;
            let relation = ScopeRelation::parse(&rel).ok_or(DecodeError::UnexpectedToken {
                found: rel,
                offset,
                expected: "qeq, lheq or outscopes",
            })?;
            let lo = self.var()?;
            self.mrs.hcons.push(HandleConstraint { hi, relation, lo });
        }
        self.pos += 1;
        Ok(())
    }

    fn icons(&mut self) -> Result<(), DecodeError> {
        self.expect(Tok::LAngle, "'<'")?;
        while self.peek() != Some(&Tok::RAngle) {
            let left = self.var()?;
            let (relation, _) = self.symbol("an individual constraint")?;
            let right = self.var()?;
            self.mrs.icons.push(IndividualConstraint { left, relation: relation.to_lowercase(), right });
        }
        self.pos += 1;
        Ok(())
    }
}

fn unexpected(token: &Token, expected: &'static str) -> DecodeError {
    DecodeError::UnexpectedToken { found: token.text.clone(), offset: token.offset, expected }
}
