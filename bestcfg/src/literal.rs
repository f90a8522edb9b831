use itertools::Itertools;
use serde::Serialize;
use serde::Serializer;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/*

# Config literal decoding

Tuning results store each trial's configuration as the textual repr of a dict, e.g.

  {'shared_buffers': '4GB', 'max_wal_size': np.str_('2GB'), 'jit': False, 'work_mem': int(64)}

This is not JSON: quotes may be single, scalars may be wrapped in numpy types, and simple constructor calls appear. We tokenize and parse this text directly. Nothing is ever evaluated: the only callables recognised are a fixed set of scalar constructors and numpy wrappers, and each one is applied as a pure conversion of an already-parsed literal.

*/

pub type DecodeResult<T> = Result<T, DecodeError>;

#[derive(Clone, Debug, PartialEq)]
pub struct DecodeError {
  /// Byte offset into the source text.
  pub offset: usize,
  pub reason: String,
}

impl Display for DecodeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} at offset {}", self.reason, self.offset)
  }
}

impl Error for DecodeError {}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
  List(Vec<ConfigValue>),
  Map(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
  /// Renders the value the way the source language's `str()` would, used for dict keys and `str(...)`.
  fn to_text(&self) -> String {
    match self {
      ConfigValue::Null => "None".to_string(),
      ConfigValue::Bool(true) => "True".to_string(),
      ConfigValue::Bool(false) => "False".to_string(),
      ConfigValue::Int(v) => v.to_string(),
      ConfigValue::Float(v) => float_text(*v),
      ConfigValue::Str(v) => v.clone(),
      ConfigValue::List(items) => format!("[{}]", items.iter().map(|v| v.repr()).join(", ")),
      ConfigValue::Map(entries) => format!(
        "{{{}}}",
        entries
          .iter()
          .map(|(k, v)| format!("'{}': {}", k, v.repr()))
          .join(", ")
      ),
    }
  }

  fn repr(&self) -> String {
    match self {
      ConfigValue::Str(v) => format!("'{}'", v),
      other => other.to_text(),
    }
  }

  fn truthy(&self) -> bool {
    match self {
      ConfigValue::Null => false,
      ConfigValue::Bool(v) => *v,
      ConfigValue::Int(v) => *v != 0,
      ConfigValue::Float(v) => *v != 0.0,
      ConfigValue::Str(v) => !v.is_empty(),
      ConfigValue::List(v) => !v.is_empty(),
      ConfigValue::Map(v) => !v.is_empty(),
    }
  }
}

/// Non-finite floats have no JSON number form, so they are written as their `str()` text.
impl Serialize for ConfigValue {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      ConfigValue::Null => serializer.serialize_unit(),
      ConfigValue::Bool(v) => serializer.serialize_bool(*v),
      ConfigValue::Int(v) => serializer.serialize_i64(*v),
      ConfigValue::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
      ConfigValue::Float(v) => serializer.serialize_str(&float_text(*v)),
      ConfigValue::Str(v) => serializer.serialize_str(v),
      ConfigValue::List(items) => items.serialize(serializer),
      ConfigValue::Map(entries) => entries.serialize(serializer),
    }
  }
}

pub(crate) fn float_text(v: f64) -> String {
  if v.is_nan() {
    "nan".to_string()
  } else if v.is_infinite() {
    (if v > 0.0 { "inf" } else { "-inf" }).to_string()
  } else if v.fract() == 0.0 && v.abs() < 1e16 {
    format!("{:.1}", v)
  } else {
    v.to_string()
  }
}

/// A decoded configuration mapping. Entries keep the order they appeared in the source text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectedConfig {
  entries: Vec<(String, ConfigValue)>,
}

impl SelectedConfig {
  pub fn new() -> Self {
    Self::default()
  }

  /// Later duplicates overwrite the earlier value but keep its position.
  pub fn insert(&mut self, key: String, value: ConfigValue) {
    match self.entries.iter_mut().find(|(k, _)| *k == key) {
      Some(entry) => entry.1 = value,
      None => self.entries.push((key, value)),
    }
  }

  pub fn get(&self, key: &str) -> Option<&ConfigValue> {
    self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn sorted(&self) -> BTreeMap<&str, &ConfigValue> {
    self.iter().collect()
  }
}

impl Serialize for SelectedConfig {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    self.sorted().serialize(serializer)
  }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
  LBrace,
  RBrace,
  LBracket,
  RBracket,
  LParen,
  RParen,
  Colon,
  Comma,
  Str(String),
  Int(i64),
  Float(f64),
  Ident(String),
}

impl Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Token::LBrace => f.write_str("'{'"),
      Token::RBrace => f.write_str("'}'"),
      Token::LBracket => f.write_str("'['"),
      Token::RBracket => f.write_str("']'"),
      Token::LParen => f.write_str("'('"),
      Token::RParen => f.write_str("')'"),
      Token::Colon => f.write_str("':'"),
      Token::Comma => f.write_str("','"),
      Token::Str(_) => f.write_str("string"),
      Token::Int(_) | Token::Float(_) => f.write_str("number"),
      Token::Ident(name) => write!(f, "name '{}'", name),
    }
  }
}

struct Lexer<'a> {
  src: &'a str,
  pos: usize,
}

impl<'a> Lexer<'a> {
  fn new(src: &'a str) -> Self {
    Self { src, pos: 0 }
  }

  fn err<T>(&self, offset: usize, reason: impl Into<String>) -> DecodeResult<T> {
    Err(DecodeError {
      offset,
      reason: reason.into(),
    })
  }

  fn peek_char(&self) -> Option<char> {
    self.src[self.pos..].chars().next()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek_char()?;
    self.pos += c.len_utf8();
    Some(c)
  }

  fn skip_whitespace(&mut self) {
    while let Some(c) = self.peek_char() {
      if !c.is_whitespace() {
        break;
      };
      self.bump();
    }
  }

  fn tokenize(mut self) -> DecodeResult<Vec<(usize, Token)>> {
    let mut tokens = Vec::new();
    loop {
      self.skip_whitespace();
      let start = self.pos;
      let Some(c) = self.peek_char() else {
        break;
      };
      let token = match c {
        '{' => self.single(Token::LBrace),
        '}' => self.single(Token::RBrace),
        '[' => self.single(Token::LBracket),
        ']' => self.single(Token::RBracket),
        '(' => self.single(Token::LParen),
        ')' => self.single(Token::RParen),
        ':' => self.single(Token::Colon),
        ',' => self.single(Token::Comma),
        '\'' | '"' => self.string()?,
        '0'..='9' | '.' | '-' | '+' => self.number()?,
        c if c.is_alphabetic() || c == '_' => self.ident(),
        c => return self.err(start, format!("unexpected character {:?}", c)),
      };
      tokens.push((start, token));
    }
    Ok(tokens)
  }

  fn single(&mut self, token: Token) -> Token {
    self.bump();
    token
  }

  fn string(&mut self) -> DecodeResult<Token> {
    let start = self.pos;
    let Some(quote) = self.bump() else {
      return self.err(start, "expected string");
    };
    let mut out = String::new();
    loop {
      match self.bump() {
        None => return self.err(start, "unterminated string"),
        Some(c) if c == quote => break,
        Some('\\') => match self.bump() {
          None => return self.err(start, "unterminated string"),
          Some('n') => out.push('\n'),
          Some('t') => out.push('\t'),
          Some('r') => out.push('\r'),
          Some('0') => out.push('\0'),
          Some(c @ ('\\' | '\'' | '"')) => out.push(c),
          // Unknown escapes are kept verbatim, as the source language does.
          Some(c) => {
            out.push('\\');
            out.push(c);
          }
        },
        Some(c) => out.push(c),
      }
    }
    Ok(Token::Str(out))
  }

  fn number(&mut self) -> DecodeResult<Token> {
    let start = self.pos;
    if matches!(self.peek_char(), Some('-' | '+')) {
      self.bump();
    }
    let mut is_float = false;
    while let Some(c) = self.peek_char() {
      match c {
        '0'..='9' | '_' => {}
        '.' => is_float = true,
        'e' | 'E' => {
          is_float = true;
          self.bump();
          if matches!(self.peek_char(), Some('-' | '+')) {
            self.bump();
          }
          continue;
        }
        _ => break,
      };
      self.bump();
    }
    let text: String = self.src[start..self.pos].chars().filter(|c| *c != '_').collect();
    if !is_float {
      if let Ok(v) = text.parse::<i64>() {
        return Ok(Token::Int(v));
      };
    };
    // Integers too large for i64 degrade to floats.
    match text.parse::<f64>() {
      Ok(v) => Ok(Token::Float(v)),
      Err(_) => self.err(start, format!("invalid number {:?}", text)),
    }
  }

  fn ident(&mut self) -> Token {
    let start = self.pos;
    while let Some(c) = self.peek_char() {
      if !(c.is_alphanumeric() || c == '_' || c == '.') {
        break;
      };
      self.bump();
    }
    Token::Ident(self.src[start..self.pos].to_string())
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Callable {
  Int,
  Float,
  Str,
  Bool,
  /// Numpy scalar wrapper whose value is passed through unchanged.
  Wrapper,
}

fn callable(name: &str) -> Option<Callable> {
  let bare = name
    .strip_prefix("np.")
    .or_else(|| name.strip_prefix("numpy."));
  match (bare, name) {
    (None, "int") => Some(Callable::Int),
    (None, "float") => Some(Callable::Float),
    (None, "str") => Some(Callable::Str),
    (None, "bool") => Some(Callable::Bool),
    (Some("str_" | "unicode_" | "bytes_"), _) => Some(Callable::Str),
    (Some("bool_" | "bool"), _) => Some(Callable::Bool),
    (
      Some(
        "int_" | "intc" | "int8" | "int16" | "int32" | "int64" | "uint8" | "uint16" | "uint32"
        | "uint64" | "longlong",
      ),
      _,
    ) => Some(Callable::Int),
    (Some("float_" | "float16" | "float32" | "float64" | "double" | "longdouble"), _) => {
      Some(Callable::Float)
    }
    (Some("array"), _) => Some(Callable::Wrapper),
    _ => None,
  }
}

const MAX_DEPTH: usize = 64;

struct Parser {
  tokens: Vec<(usize, Token)>,
  next: usize,
  end: usize,
  depth: usize,
}

impl Parser {
  fn offset(&self) -> usize {
    self
      .tokens
      .get(self.next)
      .map(|(o, _)| *o)
      .unwrap_or(self.end)
  }

  fn err<T>(&self, reason: impl Into<String>) -> DecodeResult<T> {
    Err(DecodeError {
      offset: self.offset(),
      reason: reason.into(),
    })
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.next).map(|(_, t)| t)
  }

  fn advance(&mut self) -> DecodeResult<Token> {
    match self.tokens.get(self.next) {
      Some((_, t)) => {
        let t = t.clone();
        self.next += 1;
        Ok(t)
      }
      None => self.err("unexpected end of input"),
    }
  }

  fn expect(&mut self, want: Token) -> DecodeResult<()> {
    let offset = self.offset();
    let got = self.advance()?;
    if got != want {
      return Err(DecodeError {
        offset,
        reason: format!("expected {}, found {}", want, got),
      });
    };
    Ok(())
  }

  /// Parses comma-separated items until `close`, allowing a trailing comma.
  fn items<T>(
    &mut self,
    close: Token,
    mut item: impl FnMut(&mut Self) -> DecodeResult<T>,
  ) -> DecodeResult<Vec<T>> {
    let mut out = Vec::new();
    loop {
      if self.peek() == Some(&close) {
        self.advance()?;
        return Ok(out);
      };
      out.push(item(self)?);
      match self.peek() {
        Some(Token::Comma) => {
          self.advance()?;
        }
        Some(t) if *t == close => {}
        Some(t) => return self.err(format!("expected ',' or {}, found {}", close, t)),
        None => return self.err("unexpected end of input"),
      };
    }
  }

  fn entry(&mut self) -> DecodeResult<(String, ConfigValue)> {
    let key = self.value()?;
    self.expect(Token::Colon)?;
    let value = self.value()?;
    Ok((key.to_text(), value))
  }

  fn value(&mut self) -> DecodeResult<ConfigValue> {
    if self.depth >= MAX_DEPTH {
      return self.err("nesting too deep");
    };
    self.depth += 1;
    let value = self.term();
    self.depth -= 1;
    value
  }

  fn term(&mut self) -> DecodeResult<ConfigValue> {
    let offset = self.offset();
    match self.advance()? {
      Token::LBrace => {
        let entries = self.items(Token::RBrace, Self::entry)?;
        Ok(ConfigValue::Map(entries.into_iter().collect()))
      }
      Token::LBracket => Ok(ConfigValue::List(self.items(Token::RBracket, Self::value)?)),
      Token::LParen => self.paren(),
      Token::Str(v) => Ok(ConfigValue::Str(v)),
      Token::Int(v) => Ok(ConfigValue::Int(v)),
      Token::Float(v) => Ok(ConfigValue::Float(v)),
      Token::Ident(name) => match name.as_str() {
        "True" => Ok(ConfigValue::Bool(true)),
        "False" => Ok(ConfigValue::Bool(false)),
        "None" => Ok(ConfigValue::Null),
        _ => self.call(offset, &name),
      },
      t => Err(DecodeError {
        offset,
        reason: format!("unexpected {}", t),
      }),
    }
  }

  /// Either a parenthesised expression or a tuple.
  fn paren(&mut self) -> DecodeResult<ConfigValue> {
    if self.peek() == Some(&Token::RParen) {
      self.advance()?;
      return Ok(ConfigValue::List(Vec::new()));
    };
    let first = self.value()?;
    match self.advance()? {
      Token::RParen => Ok(first),
      Token::Comma => {
        let mut items = vec![first];
        items.extend(self.items(Token::RParen, Self::value)?);
        Ok(ConfigValue::List(items))
      }
      t => self.err(format!("expected ',' or ')', found {}", t)),
    }
  }

  fn call(&mut self, offset: usize, name: &str) -> DecodeResult<ConfigValue> {
    let Some(callable) = callable(name) else {
      return Err(DecodeError {
        offset,
        reason: format!("name '{}' is not allowed", name),
      });
    };
    self.expect(Token::LParen)?;
    let arg = if self.peek() == Some(&Token::RParen) {
      None
    } else {
      Some(self.value()?)
    };
    if self.peek() == Some(&Token::Comma) {
      self.advance()?;
    };
    self.expect(Token::RParen)?;
    convert(callable, arg).map_err(|reason| DecodeError { offset, reason })
  }
}

fn convert(callable: Callable, arg: Option<ConfigValue>) -> Result<ConfigValue, String> {
  use ConfigValue as V;
  let Some(arg) = arg else {
    return Ok(match callable {
      Callable::Int => V::Int(0),
      Callable::Float => V::Float(0.0),
      Callable::Str => V::Str(String::new()),
      Callable::Bool => V::Bool(false),
      Callable::Wrapper => V::List(Vec::new()),
    });
  };
  match (callable, arg) {
    (Callable::Wrapper, v) => Ok(v),
    (Callable::Str, v) => Ok(V::Str(v.to_text())),
    (Callable::Bool, v) => Ok(V::Bool(v.truthy())),
    (Callable::Int, V::Int(v)) => Ok(V::Int(v)),
    (Callable::Int, V::Bool(v)) => Ok(V::Int(v as i64)),
    (Callable::Int, V::Float(v)) if v.is_finite() => Ok(V::Int(v.trunc() as i64)),
    (Callable::Int, V::Str(s)) => s
      .trim()
      .replace('_', "")
      .parse::<i64>()
      .map(V::Int)
      .map_err(|_| format!("invalid literal for int(): {:?}", s)),
    (Callable::Float, V::Float(v)) => Ok(V::Float(v)),
    (Callable::Float, V::Int(v)) => Ok(V::Float(v as f64)),
    (Callable::Float, V::Bool(v)) => Ok(V::Float(if v { 1.0 } else { 0.0 })),
    (Callable::Float, V::Str(s)) => parse_float_text(&s)
      .map(V::Float)
      .ok_or_else(|| format!("could not convert string to float: {:?}", s)),
    (c, v) => Err(format!("cannot apply {:?} to {}", c, v.repr())),
  }
}

fn parse_float_text(s: &str) -> Option<f64> {
  let t = s.trim().to_ascii_lowercase();
  let (sign, body) = match t.strip_prefix('-') {
    Some(rest) => (-1.0, rest),
    None => (1.0, t.strip_prefix('+').unwrap_or(&t)),
  };
  match body {
    "inf" | "infinity" => Some(sign * f64::INFINITY),
    "nan" => Some(f64::NAN),
    _ => t.replace('_', "").parse().ok(),
  }
}

/// Decodes a config field into a mapping. The top level must be a dict literal.
pub fn decode_config(src: &str) -> DecodeResult<SelectedConfig> {
  let tokens = Lexer::new(src).tokenize()?;
  let mut parser = Parser {
    tokens,
    next: 0,
    end: src.len(),
    depth: 0,
  };
  if parser.peek() != Some(&Token::LBrace) {
    return parser.err("config is not a mapping");
  };
  parser.advance()?;
  let entries = parser.items(Token::RBrace, Parser::entry)?;
  if parser.peek().is_some() {
    return parser.err("trailing characters after mapping");
  };
  let mut config = SelectedConfig::new();
  for (k, v) in entries {
    config.insert(k.trim().to_string(), v);
  }
  Ok(config)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_single_quoted_dict() {
    let cfg = decode_config("{'a': 1, 'b': 'x', 'c': 2.5, 'd': True, 'e': None}").unwrap();
    assert_eq!(cfg.len(), 5);
    assert_eq!(cfg.get("a"), Some(&ConfigValue::Int(1)));
    assert_eq!(cfg.get("b"), Some(&ConfigValue::Str("x".to_string())));
    assert_eq!(cfg.get("c"), Some(&ConfigValue::Float(2.5)));
    assert_eq!(cfg.get("d"), Some(&ConfigValue::Bool(true)));
    assert_eq!(cfg.get("e"), Some(&ConfigValue::Null));
  }

  #[test]
  fn test_keys_are_trimmed() {
    let cfg = decode_config("{' maxmemory ': '1gb', \"\\tappendonly\": 'yes'}").unwrap();
    let keys: Vec<_> = cfg.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["maxmemory", "appendonly"]);
  }

  #[test]
  fn test_numpy_wrapper_matches_plain_literal() {
    let wrapped = decode_config("{'policy': np.str_('allkeys-lru'), 'n': np.int64(5)}").unwrap();
    let plain = decode_config("{'policy': 'allkeys-lru', 'n': 5}").unwrap();
    assert_eq!(wrapped, plain);
  }

  #[test]
  fn test_scalar_constructors_match_plain_literal() {
    let cfg =
      decode_config("{'a': int(3.9), 'b': float('1e-3'), 'c': str(7), 'd': bool(0), 'e': int('12')}")
        .unwrap();
    let plain = decode_config("{'a': 3, 'b': 0.001, 'c': '7', 'd': False, 'e': 12}").unwrap();
    assert_eq!(cfg, plain);
  }

  #[test]
  fn test_float_constructor_special_values() {
    let cfg = decode_config("{'a': float('inf'), 'b': float('-inf')}").unwrap();
    assert_eq!(cfg.get("a"), Some(&ConfigValue::Float(f64::INFINITY)));
    assert_eq!(cfg.get("b"), Some(&ConfigValue::Float(f64::NEG_INFINITY)));
  }

  #[test]
  fn test_non_finite_floats_keep_their_text_in_json() {
    let cfg = decode_config("{'a': float('inf'), 'b': float('nan'), 'c': float('-inf'), 'd': [float('inf')]}")
      .unwrap();
    assert_eq!(
      serde_json::to_string(&cfg).unwrap(),
      r#"{"a":"inf","b":"nan","c":"-inf","d":["inf"]}"#
    );
  }

  #[test]
  fn test_deep_nesting_is_rejected() {
    let depth = 200_000;
    let src = format!("{{'a': {}{}}}", "[".repeat(depth), "]".repeat(depth));
    let err = decode_config(&src).unwrap_err();
    assert_eq!(err.reason, "nesting too deep");

    let ok = format!("{{'a': {}{}}}", "[".repeat(MAX_DEPTH - 2), "]".repeat(MAX_DEPTH - 2));
    assert!(decode_config(&ok).is_ok());
  }

  #[test]
  fn test_only_top_level_keys_are_trimmed() {
    let cfg = decode_config("{' outer ': {' inner ': 1}}").unwrap();
    let mut inner = BTreeMap::new();
    inner.insert(" inner ".to_string(), ConfigValue::Int(1));
    assert_eq!(cfg.get("outer"), Some(&ConfigValue::Map(inner)));
  }

  #[test]
  fn test_unknown_names_are_rejected() {
    let err = decode_config("{'a': __import__('os')}").unwrap_err();
    assert!(err.reason.contains("not allowed"), "{}", err);
    assert_eq!(err.offset, 6);
    assert!(decode_config("{'a': open('x')}").is_err());
    assert!(decode_config("{'a': os.system}").is_err());
  }

  #[test]
  fn test_nested_values_and_trailing_commas() {
    let cfg = decode_config("{'save': [900, 1,], 'pair': (1, 'x'), 'inner': {'k': -2},}").unwrap();
    assert_eq!(
      cfg.get("save"),
      Some(&ConfigValue::List(vec![ConfigValue::Int(900), ConfigValue::Int(1)]))
    );
    assert_eq!(
      cfg.get("pair"),
      Some(&ConfigValue::List(vec![
        ConfigValue::Int(1),
        ConfigValue::Str("x".to_string())
      ]))
    );
    let ConfigValue::Map(inner) = cfg.get("inner").unwrap() else {
      panic!("expected map");
    };
    assert_eq!(inner.get("k"), Some(&ConfigValue::Int(-2)));
  }

  #[test]
  fn test_escapes_and_quotes_inside_strings() {
    let cfg = decode_config(r#"{'a': 'it\'s', "b": "say \"hi\"", 'c': "x'y"}"#).unwrap();
    assert_eq!(cfg.get("a"), Some(&ConfigValue::Str("it's".to_string())));
    assert_eq!(cfg.get("b"), Some(&ConfigValue::Str("say \"hi\"".to_string())));
    assert_eq!(cfg.get("c"), Some(&ConfigValue::Str("x'y".to_string())));
  }

  #[test]
  fn test_duplicate_keys_keep_first_position() {
    let cfg = decode_config("{'a': 1, 'b': 2, 'a': 3}").unwrap();
    let entries: Vec<_> = cfg.iter().collect();
    assert_eq!(
      entries,
      vec![("a", &ConfigValue::Int(3)), ("b", &ConfigValue::Int(2))]
    );
  }

  #[test]
  fn test_non_mapping_and_malformed_inputs() {
    assert!(decode_config("[1, 2]").is_err());
    assert!(decode_config("").is_err());
    assert!(decode_config("{'a': 1").is_err());
    assert!(decode_config("{'a' 1}").is_err());
    assert!(decode_config("{'a': 'unterminated}").is_err());
    assert!(decode_config("{'a': 1} extra").is_err());
  }

  #[test]
  fn test_round_trip_through_sorted_json() {
    let cfg = decode_config("{'b': 2, 'a': 'x', 'c': False}").unwrap();
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(json, r#"{"a":"x","b":2,"c":false}"#);
    let back: BTreeMap<String, serde_json::Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), cfg.len());
    assert_eq!(back["b"], serde_json::json!(2));
  }

  #[test]
  fn test_large_integers_degrade_to_float() {
    let cfg = decode_config("{'a': 99999999999999999999}").unwrap();
    assert_eq!(cfg.get("a"), Some(&ConfigValue::Float(1e20)));
  }
}
