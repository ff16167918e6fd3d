//! Service Filter - LDAP 스타일 서비스 속성 필터
//!
//! 지원 문법:
//!
//! ```text
//! (key=value)      동등 비교 ('*' 와일드카드 허용)
//! (key=*)          속성 존재 여부
//! (key>=value)     이상
//! (key<=value)     이하
//! (key~=value)     근사 비교 (대소문자/공백 무시)
//! (&(..)(..))      AND
//! (|(..)(..))      OR
//! (!(..))          NOT
//! ```
//!
//! 값 안의 `(`, `)`, `*`, `\` 는 `\`로 이스케이프한다.

use super::reference::{lookup, Properties, PropertyValue};
use crate::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// 파싱된 서비스 필터
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceFilter {
    source: String,
    node: FilterNode,
}

#[derive(Debug, Clone, PartialEq)]
enum FilterNode {
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
    Not(Box<FilterNode>),
    Present(String),
    Equal(String, Pattern),
    Approx(String, String),
    GreaterEq(String, String),
    LessEq(String, String),
}

/// '*'로 분리된 값 조각. 조각이 하나면 와일드카드가 없는 값.
#[derive(Debug, Clone, PartialEq)]
struct Pattern {
    parts: Vec<String>,
}

impl ServiceFilter {
    /// 필터 문자열 파싱
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = Parser::new(source);
        let node = parser.parse_filter()?;
        parser.skip_ws();
        if !parser.at_end() {
            return Err(parser.error("trailing characters after filter"));
        }
        Ok(Self {
            source: source.trim().to_string(),
            node,
        })
    }

    /// 속성이 필터와 일치하는지 확인
    pub fn matches(&self, properties: &Properties) -> bool {
        self.node.matches(properties)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for ServiceFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ServiceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

// ============================================================================
// 매칭
// ============================================================================

impl FilterNode {
    fn matches(&self, properties: &Properties) -> bool {
        match self {
            Self::And(nodes) => nodes.iter().all(|n| n.matches(properties)),
            Self::Or(nodes) => nodes.iter().any(|n| n.matches(properties)),
            Self::Not(node) => !node.matches(properties),
            Self::Present(key) => lookup(properties, key).is_some(),
            Self::Equal(key, pattern) => {
                with_value(properties, key, |v| pattern.matches_value(v))
            }
            Self::Approx(key, value) => {
                let wanted = normalize(value);
                with_value(properties, key, |v| normalize(v) == wanted)
            }
            Self::GreaterEq(key, value) => {
                with_ordering(properties, key, value, |o| o != Ordering::Less)
            }
            Self::LessEq(key, value) => {
                with_ordering(properties, key, value, |o| o != Ordering::Greater)
            }
        }
    }
}

/// 속성 값(리스트면 각 원소)을 문자열로 비교
fn with_value(properties: &Properties, key: &str, test: impl Fn(&str) -> bool) -> bool {
    match lookup(properties, key) {
        Some(PropertyValue::List(items)) => items.iter().any(|item| test(item.as_str())),
        Some(PropertyValue::String(s)) => test(s.as_str()),
        Some(other) => test(&other.to_string()),
        None => false,
    }
}

fn with_ordering(
    properties: &Properties,
    key: &str,
    value: &str,
    test: impl Fn(Ordering) -> bool,
) -> bool {
    match lookup(properties, key) {
        Some(PropertyValue::Long(actual)) => match value.trim().parse::<i64>() {
            Ok(wanted) => test(actual.cmp(&wanted)),
            Err(_) => false,
        },
        Some(PropertyValue::List(items)) => items.iter().any(|item| test(item.as_str().cmp(value))),
        Some(other) => test(other.to_string().as_str().cmp(value)),
        None => false,
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

impl Pattern {
    fn matches_value(&self, value: &str) -> bool {
        if self.parts.len() == 1 {
            return if let Ok(wanted) = self.parts[0].trim().parse::<i64>() {
                value == self.parts[0] || value.parse::<i64>().map(|v| v == wanted).unwrap_or(false)
            } else if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
                value.eq_ignore_ascii_case(self.parts[0].trim())
            } else {
                value == self.parts[0]
            };
        }

        // 모든 자르기는 문자 경계에서 일어난다
        let first = &self.parts[0];
        let last = &self.parts[self.parts.len() - 1];
        let mut rest = match value
            .strip_prefix(first.as_str())
            .and_then(|rest| rest.strip_suffix(last.as_str()))
        {
            Some(rest) => rest,
            None => return false,
        };

        for middle in &self.parts[1..self.parts.len() - 1] {
            match rest.find(middle.as_str()) {
                Some(idx) => rest = &rest[idx + middle.len()..],
                None => return false,
            }
        }
        true
    }
}

// ============================================================================
// 파서
// ============================================================================

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::invalid_filter(self.source, format!("{} at position {}", message, self.pos))
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.error(&format!("expected '{}'", expected))),
        }
    }

    fn parse_filter(&mut self) -> Result<FilterNode> {
        self.skip_ws();
        self.expect('(')?;
        self.skip_ws();
        let node = match self.peek() {
            Some('&') => {
                self.pos += 1;
                FilterNode::And(self.parse_list()?)
            }
            Some('|') => {
                self.pos += 1;
                FilterNode::Or(self.parse_list()?)
            }
            Some('!') => {
                self.pos += 1;
                FilterNode::Not(Box::new(self.parse_filter()?))
            }
            Some(_) => self.parse_item()?,
            None => return Err(self.error("unexpected end of filter")),
        };
        self.skip_ws();
        self.expect(')')?;
        Ok(node)
    }

    fn parse_list(&mut self) -> Result<Vec<FilterNode>> {
        let mut nodes = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() != Some('(') {
                break;
            }
            nodes.push(self.parse_filter()?);
        }
        if nodes.is_empty() {
            return Err(self.error("empty filter list"));
        }
        Ok(nodes)
    }

    fn parse_item(&mut self) -> Result<FilterNode> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '=' | '<' | '>' | '~' | '(' | ')') {
                break;
            }
            self.pos += 1;
        }
        let key: String = self.chars[start..self.pos].iter().collect::<String>().trim().to_string();
        if key.is_empty() {
            return Err(self.error("missing attribute name"));
        }

        let op = match self.peek() {
            Some('=') => {
                self.pos += 1;
                '='
            }
            Some(c @ ('<' | '>' | '~')) => {
                self.pos += 1;
                self.expect('=')?;
                c
            }
            _ => return Err(self.error("expected operator")),
        };

        let parts = self.parse_value()?;
        match op {
            '=' if parts.len() == 2 && parts.iter().all(String::is_empty) => {
                Ok(FilterNode::Present(key))
            }
            '=' => Ok(FilterNode::Equal(key, Pattern { parts })),
            '~' => Ok(FilterNode::Approx(key, parts.join("*"))),
            '>' => Ok(FilterNode::GreaterEq(key, parts.join("*"))),
            _ => Ok(FilterNode::LessEq(key, parts.join("*"))),
        }
    }

    /// 이스케이프되지 않은 ')' 전까지 값을 읽고 '*' 기준으로 분리
    fn parse_value(&mut self) -> Result<Vec<String>> {
        let mut parts = vec![String::new()];
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated value")),
                Some(')') => break,
                Some('(') => return Err(self.error("unescaped '(' in value")),
                Some('\\') => {
                    self.pos += 1;
                    let escaped = self.peek().ok_or_else(|| self.error("dangling escape"))?;
                    if let Some(last) = parts.last_mut() {
                        last.push(escaped);
                    }
                    self.pos += 1;
                }
                Some('*') => {
                    parts.push(String::new());
                    self.pos += 1;
                }
                Some(c) => {
                    if let Some(last) = parts.last_mut() {
                        last.push(c);
                    }
                    self.pos += 1;
                }
            }
        }
        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, PropertyValue)]) -> Properties {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_simple_equality() {
        let filter = ServiceFilter::parse("(name=greeter)").unwrap();
        assert!(filter.matches(&props(&[("name", "greeter".into())])));
        assert!(!filter.matches(&props(&[("name", "other".into())])));
        assert!(!filter.matches(&Properties::new()));
    }

    #[test]
    fn test_object_class_list() {
        let filter = ServiceFilter::parse("(objectClass=com.example.Greeter)").unwrap();
        let classes = vec!["java.lang.Object".to_string(), "com.example.Greeter".to_string()];
        assert!(filter.matches(&props(&[("objectClass", classes.into())])));
    }

    #[test]
    fn test_presence_and_wildcard() {
        let present = ServiceFilter::parse("(lang=*)").unwrap();
        assert!(present.matches(&props(&[("lang", "en".into())])));
        assert!(!present.matches(&Properties::new()));

        let wildcard = ServiceFilter::parse("(name=gr*t*r)").unwrap();
        assert!(wildcard.matches(&props(&[("name", "greeter".into())])));
        assert!(!wildcard.matches(&props(&[("name", "grate".into())])));
    }

    #[test]
    fn test_wildcard_non_ascii_values() {
        let filter = ServiceFilter::parse("(name=a*x)").unwrap();
        assert!(!filter.matches(&props(&[("name", "aé".into())])));
        assert!(!filter.matches(&props(&[("name", "é".into())])));
        assert!(filter.matches(&props(&[("name", "aéx".into())])));

        let middle = ServiceFilter::parse("(name=*é*ß)").unwrap();
        assert!(middle.matches(&props(&[("name", "café straß".into())])));
        assert!(!middle.matches(&props(&[("name", "straße".into())])));

        let korean = ServiceFilter::parse("(greeting=안*요)").unwrap();
        assert!(korean.matches(&props(&[("greeting", "안녕하세요".into())])));
        assert!(!korean.matches(&props(&[("greeting", "안".into())])));
    }

    #[test]
    fn test_composites() {
        let filter = ServiceFilter::parse("(&(objectClass=Greeter)(|(lang=en)(lang=de))(!(beta=true)))").unwrap();
        let en = props(&[
            ("objectClass", "Greeter".into()),
            ("lang", "en".into()),
            ("beta", false.into()),
        ]);
        let beta = props(&[
            ("objectClass", "Greeter".into()),
            ("lang", "de".into()),
            ("beta", true.into()),
        ]);
        assert!(filter.matches(&en));
        assert!(!filter.matches(&beta));
    }

    #[test]
    fn test_numeric_ordering() {
        let filter = ServiceFilter::parse("(service.ranking>=10)").unwrap();
        assert!(filter.matches(&props(&[("service.ranking", 10i64.into())])));
        assert!(filter.matches(&props(&[("service.ranking", 42i64.into())])));
        assert!(!filter.matches(&props(&[("service.ranking", 9i64.into())])));

        let upper = ServiceFilter::parse("(service.ranking<=3)").unwrap();
        assert!(upper.matches(&props(&[("service.ranking", (-1i64).into())])));
    }

    #[test]
    fn test_escaped_value() {
        let filter = ServiceFilter::parse(r"(path=a\*b\)c)").unwrap();
        assert!(filter.matches(&props(&[("path", "a*b)c".into())])));
        assert!(!filter.matches(&props(&[("path", "aXb)c".into())])));
    }

    #[test]
    fn test_approx() {
        let filter = ServiceFilter::parse("(name~=Hello World)").unwrap();
        assert!(filter.matches(&props(&[("name", "helloworld".into())])));
    }

    #[test]
    fn test_invalid_filters() {
        for bad in ["", "name=x", "(name=x", "(=x)", "(&)", "(name=x))", "(name=(x))"] {
            let err = ServiceFilter::parse(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidFilter { .. }), "expected error for {:?}", bad);
        }
    }

    #[test]
    fn test_display_keeps_source() {
        let filter: ServiceFilter = " (name=x) ".parse().unwrap();
        assert_eq!(filter.to_string(), "(name=x)");
    }
}
