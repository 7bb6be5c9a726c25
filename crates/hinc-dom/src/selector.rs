//! Selector matching
//!
//! Picks a fragment out of a fetched page. Supported syntax:
//! - type, `*`, `#id` and `.class`
//! - attribute selectors `[a]`, `[a=v]`, `[a~=v]`, `[a|=v]`, `[a^=v]`, `[a$=v]`
//!   and `[a*=v]`, optionally with an `i` flag
//! - structural pseudo-classes (`:root`, `:empty`, `:first-child`,
//!   `:nth-child(An+B)` and friends) and `:not(<compound>)`
//! - descendant, child (`>`), adjacent (`+`) and general sibling (`~`)
//!   combinators, and comma-separated selector lists
//!
//! Matching runs right to left from the subject compound.

use crate::{DomTree, NodeData, NodeId};

/// Selector parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unsupported character {ch:?} at offset {offset}")]
    Unsupported { ch: char, offset: usize },

    #[error("missing name after {0:?}")]
    MissingName(char),

    #[error("unterminated {0:?} at offset {1}")]
    Unterminated(char, usize),

    #[error("unknown pseudo-class :{0}")]
    UnknownPseudoClass(String),

    #[error("invalid An+B expression {0:?}")]
    InvalidNth(String),
}

/// Parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<ComplexSelector>,
}

/// Compounds joined by combinators; `combinators[i]` sits between
/// `compounds[i]` and `compounds[i + 1]`, and the last compound is the subject
#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    NextSibling,
    /// `a ~ b`
    SubsequentSibling,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeSelector>,
    pseudo_classes: Vec<PseudoClass>,
}

/// Attribute selector
#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeSelector {
    name: String,
    matcher: Option<AttributeMatcher>,
    case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttributeMatcher {
    /// `[attr=value]`
    Exact(String),
    /// `[attr~=value]` - whitespace-separated list contains
    Contains(String),
    /// `[attr|=value]` - exact or prefix followed by a hyphen
    DashMatch(String),
    /// `[attr^=value]`
    Prefix(String),
    /// `[attr$=value]`
    Suffix(String),
    /// `[attr*=value]`
    Substring(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PseudoClass {
    Root,
    Empty,
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    NthChild(NthExpression),
    NthLastChild(NthExpression),
    NthOfType(NthExpression),
    NthLastOfType(NthExpression),
    Not(Box<Compound>),
}

/// An+B expression for `:nth-*` pseudo-classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NthExpression {
    a: i32,
    b: i32,
}

impl Selector {
    /// Parse a selector list such as `main > .note, #fallback`
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut parser = Parser::new(input, 0);
        let mut alternatives = vec![parser.complex()?];
        while parser.eat(',') {
            alternatives.push(parser.complex()?);
        }
        parser.expect_end()?;
        Ok(Self { alternatives })
    }

    /// Check whether `node` matches any alternative
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.alternatives.iter().any(|alt| alt.matches(tree, node))
    }

    /// First descendant of `scope` in document order that matches
    pub fn query_first(&self, tree: &DomTree, scope: NodeId) -> Option<NodeId> {
        tree.descendants(scope).find(|&id| self.matches(tree, id))
    }

    /// All matching descendants of `scope` in document order
    pub fn query_all(&self, tree: &DomTree, scope: NodeId) -> Vec<NodeId> {
        tree.descendants(scope).filter(|&id| self.matches(tree, id)).collect()
    }
}

impl ComplexSelector {
    fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        match self.compounds.len() {
            0 => false,
            n => self.matches_at(tree, n - 1, node),
        }
    }

    /// Match `compounds[index]` against `node`, then the rest of the chain
    /// to its left, backtracking over candidate ancestors and siblings
    fn matches_at(&self, tree: &DomTree, index: usize, node: NodeId) -> bool {
        if !self.compounds[index].matches(tree, node) {
            return false;
        }
        if index == 0 {
            return true;
        }

        let next = index - 1;
        match self.combinators[next] {
            Combinator::Descendant => tree
                .ancestors(node)
                .any(|ancestor| self.matches_at(tree, next, ancestor)),
            Combinator::Child => tree
                .parent(node)
                .is_some_and(|parent| self.matches_at(tree, next, parent)),
            Combinator::NextSibling => previous_element(tree, node)
                .is_some_and(|sibling| self.matches_at(tree, next, sibling)),
            Combinator::SubsequentSibling => {
                let mut cursor = previous_element(tree, node);
                while let Some(sibling) = cursor {
                    if self.matches_at(tree, next, sibling) {
                        return true;
                    }
                    cursor = previous_element(tree, sibling);
                }
                false
            }
        }
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
            && self.pseudo_classes.is_empty()
    }

    fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(tag) = tree.tag_name(node) else {
            return false;
        };
        if let Some(want) = &self.tag {
            if !tag.eq_ignore_ascii_case(want) {
                return false;
            }
        }
        if let Some(want) = &self.id {
            if tree.get_attribute(node, "id") != Some(want.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|class| tree.has_class(node, class))
            && self
                .attributes
                .iter()
                .all(|attr| attr.matches(tree.get_attribute(node, &attr.name)))
            && self
                .pseudo_classes
                .iter()
                .all(|pseudo| pseudo.matches(tree, node))
    }
}

impl AttributeSelector {
    fn matches(&self, value: Option<&str>) -> bool {
        let (Some(matcher), Some(value)) = (&self.matcher, value) else {
            return self.matcher.is_none() && value.is_some();
        };

        let value = self.fold(value);
        match matcher {
            AttributeMatcher::Exact(want) => value == self.fold(want),
            AttributeMatcher::Contains(want) => {
                let want = self.fold(want);
                value.split_ascii_whitespace().any(|word| word == want)
            }
            AttributeMatcher::DashMatch(want) => {
                let want = self.fold(want);
                value == want || value.starts_with(&format!("{want}-"))
            }
            // Empty operands never match for the substring forms
            AttributeMatcher::Prefix(want) => {
                !want.is_empty() && value.starts_with(&self.fold(want))
            }
            AttributeMatcher::Suffix(want) => !want.is_empty() && value.ends_with(&self.fold(want)),
            AttributeMatcher::Substring(want) => {
                !want.is_empty() && value.contains(&self.fold(want))
            }
        }
    }

    fn fold(&self, s: &str) -> String {
        if self.case_insensitive {
            s.to_ascii_lowercase()
        } else {
            s.to_string()
        }
    }
}

impl PseudoClass {
    fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        match self {
            PseudoClass::Root => tree.parent(node) == Some(tree.root()),
            PseudoClass::Empty => tree.children(node).all(|(_, child)| match &child.data {
                NodeData::Comment(_) => true,
                NodeData::Text(text) => text.is_empty(),
                _ => false,
            }),
            PseudoClass::FirstChild => previous_element(tree, node).is_none(),
            PseudoClass::LastChild => next_element(tree, node).is_none(),
            PseudoClass::OnlyChild => {
                previous_element(tree, node).is_none() && next_element(tree, node).is_none()
            }
            PseudoClass::FirstOfType => Position::of(tree, node).type_index == 1,
            PseudoClass::LastOfType => Position::of(tree, node).type_from_end() == 1,
            PseudoClass::OnlyOfType => Position::of(tree, node).type_count == 1,
            PseudoClass::NthChild(expr) => expr.matches(Position::of(tree, node).index),
            PseudoClass::NthLastChild(expr) => expr.matches(Position::of(tree, node).from_end()),
            PseudoClass::NthOfType(expr) => expr.matches(Position::of(tree, node).type_index),
            PseudoClass::NthLastOfType(expr) => {
                expr.matches(Position::of(tree, node).type_from_end())
            }
            PseudoClass::Not(inner) => !inner.matches(tree, node),
        }
    }
}

impl NthExpression {
    /// Parse `odd`, `even`, `3`, `n`, `-n+3`, `2n+1` and the like
    fn parse(input: &str) -> Option<Self> {
        let s: String = input
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        match s.as_str() {
            "odd" => return Some(Self { a: 2, b: 1 }),
            "even" => return Some(Self { a: 2, b: 0 }),
            _ => {}
        }

        let Some(n_pos) = s.find('n') else {
            return s.parse().ok().map(|b| Self { a: 0, b });
        };
        let a = match &s[..n_pos] {
            "" | "+" => 1,
            "-" => -1,
            coefficient => coefficient.parse().ok()?,
        };
        let offset = &s[n_pos + 1..];
        let b = if offset.is_empty() {
            0
        } else if offset.starts_with(['+', '-']) {
            offset.parse().ok()?
        } else {
            return None;
        };
        Some(Self { a, b })
    }

    /// Check whether the 1-based position `n` satisfies An+B for some n >= 0
    fn matches(&self, n: i32) -> bool {
        if self.a == 0 {
            return n == self.b;
        }
        let diff = n - self.b;
        if self.a > 0 {
            diff >= 0 && diff % self.a == 0
        } else {
            diff <= 0 && diff % self.a == 0
        }
    }
}

/// 1-based position of an element among its element siblings
struct Position {
    index: i32,
    count: i32,
    type_index: i32,
    type_count: i32,
}

impl Position {
    fn of(tree: &DomTree, node: NodeId) -> Self {
        let tag = tree.tag_name(node);
        let Some(parent) = tree.parent(node) else {
            return Self { index: 1, count: 1, type_index: 1, type_count: 1 };
        };

        let mut pos = Self { index: 0, count: 0, type_index: 0, type_count: 0 };
        let mut seen = false;
        for (sibling, child) in tree.children(parent) {
            if !child.is_element() {
                continue;
            }
            let same_type = tree.tag_name(sibling) == tag;
            pos.count += 1;
            if same_type {
                pos.type_count += 1;
            }
            if !seen {
                pos.index += 1;
                if same_type {
                    pos.type_index += 1;
                }
            }
            if sibling == node {
                seen = true;
            }
        }
        pos
    }

    fn from_end(&self) -> i32 {
        self.count - self.index + 1
    }

    fn type_from_end(&self) -> i32 {
        self.type_count - self.type_index + 1
    }
}

fn previous_element(tree: &DomTree, node: NodeId) -> Option<NodeId> {
    let mut cursor = tree.get(node)?.prev_sibling;
    while let Some(sibling) = tree.get(cursor) {
        if sibling.is_element() {
            return Some(cursor);
        }
        cursor = sibling.prev_sibling;
    }
    None
}

fn next_element(tree: &DomTree, node: NodeId) -> Option<NodeId> {
    let mut cursor = tree.get(node)?.next_sibling;
    while let Some(sibling) = tree.get(cursor) {
        if sibling.is_element() {
            return Some(cursor);
        }
        cursor = sibling.next_sibling;
    }
    None
}

/// Recursive-descent parser over the selector text
struct Parser<'a> {
    input: &'a str,
    pos: usize,
    /// Offset of `input` inside the text handed to `Selector::parse`
    base: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, base: usize) -> Self {
        Self { input, pos: 0, base }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, want: char) -> bool {
        if self.peek() == Some(want) {
            self.pos += want.len_utf8();
            true
        } else {
            false
        }
    }

    /// Skip whitespace, reporting whether any was consumed
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn unsupported(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => SelectorError::Unsupported { ch, offset: self.base + self.pos },
            None => SelectorError::Empty,
        }
    }

    fn expect_end(&self) -> Result<(), SelectorError> {
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.unsupported()),
        }
    }

    fn complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        self.skip_whitespace();
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();

        loop {
            let spaced = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if spaced => {
                    combinators.push(Combinator::Descendant);
                    compounds.push(self.compound()?);
                    continue;
                }
                Some(_) => return Err(self.unsupported()),
            };
            self.bump();
            self.skip_whitespace();
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }

        Ok(ComplexSelector { compounds, combinators })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();

        let universal = self.eat('*');
        if !universal && self.peek().is_some_and(is_name_char) {
            compound.tag = Some(self.name().to_ascii_lowercase());
        }

        while let Some(c) = self.peek() {
            match c {
                '#' | '.' => {
                    self.bump();
                    let name = self.name();
                    if name.is_empty() {
                        return Err(SelectorError::MissingName(c));
                    }
                    if c == '#' {
                        compound.id = Some(name.to_string());
                    } else {
                        compound.classes.push(name.to_string());
                    }
                }
                '[' => {
                    let attr = self.attribute()?;
                    compound.attributes.push(attr);
                }
                ':' => {
                    let pseudo = self.pseudo_class()?;
                    compound.pseudo_classes.push(pseudo);
                }
                _ => break,
            }
        }

        if compound.is_empty() && !universal {
            return Err(self.unsupported());
        }
        Ok(compound)
    }

    fn name(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        let open = self.base + self.pos;
        self.bump();
        self.skip_whitespace();

        let name = self.name().to_ascii_lowercase();
        if name.is_empty() {
            return Err(SelectorError::MissingName('['));
        }
        self.skip_whitespace();

        let operator = match self.peek() {
            Some(']') => None,
            Some('=') => Some('='),
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                self.bump();
                if self.peek() != Some('=') {
                    return Err(self.unsupported());
                }
                Some(c)
            }
            None => return Err(SelectorError::Unterminated('[', open)),
            Some(_) => return Err(self.unsupported()),
        };

        let mut matcher = None;
        let mut case_insensitive = false;
        if let Some(op) = operator {
            self.bump();
            self.skip_whitespace();
            let value = self.attribute_value(open)?;
            matcher = Some(match op {
                '~' => AttributeMatcher::Contains(value),
                '|' => AttributeMatcher::DashMatch(value),
                '^' => AttributeMatcher::Prefix(value),
                '$' => AttributeMatcher::Suffix(value),
                '*' => AttributeMatcher::Substring(value),
                _ => AttributeMatcher::Exact(value),
            });
            self.skip_whitespace();
            if self.peek().is_some_and(|c| c.eq_ignore_ascii_case(&'i')) {
                self.bump();
                case_insensitive = true;
                self.skip_whitespace();
            }
        }

        if !self.eat(']') {
            return match self.peek() {
                None => Err(SelectorError::Unterminated('[', open)),
                Some(_) => Err(self.unsupported()),
            };
        }
        Ok(AttributeSelector { name, matcher, case_insensitive })
    }

    fn attribute_value(&mut self, open: usize) -> Result<String, SelectorError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                let start = self.base + self.pos;
                self.bump();
                let body = self.pos;
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some(_) => {}
                        None => return Err(SelectorError::Unterminated(quote, start)),
                    }
                }
                Ok(self.input[body..self.pos - 1].to_string())
            }
            Some(c) if is_name_char(c) => Ok(self.name().to_string()),
            None => Err(SelectorError::Unterminated('[', open)),
            Some(_) => Err(self.unsupported()),
        }
    }

    fn pseudo_class(&mut self) -> Result<PseudoClass, SelectorError> {
        self.bump();
        if self.peek() == Some(':') {
            // Pseudo-elements never match an element node
            return Err(self.unsupported());
        }
        let name = self.name().to_ascii_lowercase();
        if name.is_empty() {
            return Err(SelectorError::MissingName(':'));
        }

        if !self.eat('(') {
            return match name.as_str() {
                "root" => Ok(PseudoClass::Root),
                "empty" => Ok(PseudoClass::Empty),
                "first-child" => Ok(PseudoClass::FirstChild),
                "last-child" => Ok(PseudoClass::LastChild),
                "only-child" => Ok(PseudoClass::OnlyChild),
                "first-of-type" => Ok(PseudoClass::FirstOfType),
                "last-of-type" => Ok(PseudoClass::LastOfType),
                "only-of-type" => Ok(PseudoClass::OnlyOfType),
                _ => Err(SelectorError::UnknownPseudoClass(name)),
            };
        }

        let open = self.base + self.pos - 1;
        let arg_start = self.pos;
        let mut depth = 0usize;
        loop {
            match self.bump() {
                Some('(') => depth += 1,
                Some(')') if depth == 0 => break,
                Some(')') => depth -= 1,
                Some(_) => {}
                None => return Err(SelectorError::Unterminated('(', open)),
            }
        }
        let arg = &self.input[arg_start..self.pos - 1];

        let nth = || {
            NthExpression::parse(arg).ok_or_else(|| SelectorError::InvalidNth(arg.to_string()))
        };
        match name.as_str() {
            "nth-child" => Ok(PseudoClass::NthChild(nth()?)),
            "nth-last-child" => Ok(PseudoClass::NthLastChild(nth()?)),
            "nth-of-type" => Ok(PseudoClass::NthOfType(nth()?)),
            "nth-last-of-type" => Ok(PseudoClass::NthLastOfType(nth()?)),
            "not" => {
                let mut inner = Parser::new(arg, self.base + arg_start);
                inner.skip_whitespace();
                let compound = inner.compound()?;
                inner.skip_whitespace();
                inner.expect_end()?;
                Ok(PseudoClass::Not(Box::new(compound)))
            }
            _ => Err(SelectorError::UnknownPseudoClass(name)),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `main > (h1, section.a > (p, p.lead[data-part=nav-primary]), aside)`
    fn sample() -> (DomTree, [NodeId; 6]) {
        let mut tree = DomTree::new();
        let main = tree.create_element("main");
        let h1 = tree.create_element("h1");
        let section = tree.create_element("section");
        let p1 = tree.create_element("p");
        let p2 = tree.create_element("p");
        let aside = tree.create_element("aside");
        tree.append_child(tree.root(), main);
        tree.append_child(main, h1);
        tree.append_child(main, section);
        tree.append_child(section, p1);
        tree.append_child(section, p2);
        tree.append_child(main, aside);
        tree.set_attribute(section, "class", "a");
        tree.set_attribute(p2, "class", "lead");
        tree.set_attribute(p2, "data-part", "nav-primary");
        (tree, [main, h1, section, p1, p2, aside])
    }

    #[test]
    fn test_parse_compound() {
        let sel = Selector::parse("div.note#main").unwrap();
        let compound = &sel.alternatives[0].compounds[0];
        assert_eq!(compound.tag.as_deref(), Some("div"));
        assert_eq!(compound.id.as_deref(), Some("main"));
        assert_eq!(compound.classes, vec!["note".to_string()]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
        assert_eq!(Selector::parse("a,"), Err(SelectorError::Empty));
        assert_eq!(Selector::parse("div >"), Err(SelectorError::Empty));
        assert_eq!(Selector::parse("#"), Err(SelectorError::MissingName('#')));
        assert!(matches!(
            Selector::parse("> p"),
            Err(SelectorError::Unsupported { ch: '>', offset: 0 })
        ));
        assert_eq!(Selector::parse("[id"), Err(SelectorError::Unterminated('[', 0)));
        assert_eq!(
            Selector::parse("p:hover"),
            Err(SelectorError::UnknownPseudoClass("hover".into()))
        );
        assert_eq!(
            Selector::parse("li:nth-child(x)"),
            Err(SelectorError::InvalidNth("x".into()))
        );
        assert!(Selector::parse("p::before").is_err());
    }

    #[test]
    fn test_descendant_match() {
        let (tree, [_, _, _, _, p, _]) = sample();

        assert!(Selector::parse("main p.lead").unwrap().matches(&tree, p));
        assert!(Selector::parse("main section p").unwrap().matches(&tree, p));
        assert!(!Selector::parse("section main p").unwrap().matches(&tree, p));
        let list = Selector::parse("aside p, .lead").unwrap();
        assert_eq!(list.query_first(&tree, tree.root()), Some(p));
    }

    #[test]
    fn test_child_and_sibling_combinators() {
        let (tree, [main, _, section, p1, p2, aside]) = sample();
        let first = |s: &str| Selector::parse(s).unwrap().query_first(&tree, tree.root());

        assert_eq!(first("main > section"), Some(section));
        assert_eq!(first("main > p"), None);
        assert_eq!(first("main>section>p"), Some(p1));
        assert_eq!(first("h1 + section"), Some(section));
        assert_eq!(first("h1 + aside"), None);
        assert_eq!(first("h1 ~ aside"), Some(aside));
        assert_eq!(first("p + p"), Some(p2));
        assert_eq!(first("main section > p ~ .lead"), Some(p2));
        assert_eq!(first(":root"), Some(main));
    }

    #[test]
    fn test_descendant_backtracks_past_nearest_ancestor() {
        let mut tree = DomTree::new();
        let outer = tree.create_element("div");
        let middle = tree.create_element("div");
        let inner = tree.create_element("div");
        let span = tree.create_element("span");
        tree.append_child(tree.root(), outer);
        tree.append_child(outer, middle);
        tree.append_child(middle, inner);
        tree.append_child(inner, span);
        tree.set_attribute(outer, "class", "x");

        // The nearest div is not a child of .x, the one above it is
        assert!(Selector::parse(".x > div span").unwrap().matches(&tree, span));
        assert!(!Selector::parse(".x > span").unwrap().matches(&tree, span));
    }

    #[test]
    fn test_attribute_selectors() {
        let (tree, [_, _, section, _, p2, _]) = sample();
        let first = |s: &str| Selector::parse(s).unwrap().query_first(&tree, tree.root());

        assert_eq!(first("[data-part]"), Some(p2));
        assert_eq!(first("[data-part=nav-primary]"), Some(p2));
        assert_eq!(first("[data-part=\"nav\"]"), None);
        assert_eq!(first("[data-part|=nav]"), Some(p2));
        assert_eq!(first("[data-part^='nav']"), Some(p2));
        assert_eq!(first("[data-part$=primary]"), Some(p2));
        assert_eq!(first("[data-part*=v-p]"), Some(p2));
        assert_eq!(first("[data-part^='']"), None);
        assert_eq!(first("[class~=a]"), Some(section));
        assert_eq!(first("[class=LEAD i]"), Some(p2));
        assert_eq!(first("[ class = 'lead' ]"), Some(p2));
    }

    #[test]
    fn test_structural_pseudo_classes() {
        let (tree, [main, h1, section, p1, p2, aside]) = sample();
        let all = |s: &str| Selector::parse(s).unwrap().query_all(&tree, tree.root());

        assert_eq!(all("main > :first-child"), vec![h1]);
        assert_eq!(all("main > :last-child"), vec![aside]);
        assert_eq!(all("p:first-of-type"), vec![p1]);
        assert_eq!(all("p:last-of-type"), vec![p2]);
        assert_eq!(all("main > :nth-child(2)"), vec![section]);
        assert_eq!(all("main > :nth-child(odd)"), vec![h1, aside]);
        assert_eq!(all("main > :nth-last-child(-n+2)"), vec![section, aside]);
        assert_eq!(all("p:not(.lead)"), vec![p1]);
        assert_eq!(all("h1:empty"), vec![h1]);
        assert_eq!(all(":only-child"), vec![main]);
    }

    #[test]
    fn test_nth_expression() {
        let parse = |s| NthExpression::parse(s).unwrap();
        assert_eq!(parse("odd"), NthExpression { a: 2, b: 1 });
        assert_eq!(parse("even"), NthExpression { a: 2, b: 0 });
        assert_eq!(parse("3"), NthExpression { a: 0, b: 3 });
        assert_eq!(parse("-n + 3"), NthExpression { a: -1, b: 3 });
        assert_eq!(parse("2n-1"), NthExpression { a: 2, b: -1 });
        assert!(NthExpression::parse("2n3").is_none());

        let first_three = parse("-n+3");
        assert!(first_three.matches(1) && first_three.matches(3));
        assert!(!first_three.matches(4));
        assert!(parse("3n").matches(6) && !parse("3n").matches(4));
    }
}
