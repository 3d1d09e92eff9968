//! Location-path parsing and evaluation.
//!
//! A query is parsed into a small AST and evaluated step by step:
//!
//! ```text
//! "//row[@kind='x']/cell"
//!
//! PathExpr
//! └─ LocationPath (absolute)
//!    ├─ Step descendant-or-self::node()
//!    ├─ Step child::row   [ Equals(@kind, "x") ]
//!    └─ Step child::cell
//! ```
//!
//! Each step maps every current node through its axis, keeps the nodes that
//! pass the node test, applies the predicates to that per-node candidate list
//! (so `[1]` means "first per parent", as in XPath), and finally sorts and
//! de-duplicates the union into document order.

use super::document::{Document, NodeKinds, NodeRef};
use crate::QueryError;

/// A parsed path query (possibly a `|` union of location paths).
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    branches: Vec<LocationPath>,
}

#[derive(Debug, Clone, PartialEq)]
struct LocationPath {
    absolute: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Attribute,
    SelfNode,
    Parent,
    Descendant,
    DescendantOrSelf,
}

#[derive(Debug, Clone, PartialEq)]
enum NodeTest {
    /// Element or attribute with this name (local unless prefixed).
    Name(String),
    /// Any node whose kind is in the set.
    Kinds(NodeKinds),
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Position(usize),
    Last,
    Exists(PathExpr),
    Equals { path: PathExpr, literal: String, negated: bool },
}

impl Axis {
    /// Kind of node a name test or `*` selects on this axis.
    fn principal(self) -> NodeKinds {
        match self {
            Axis::Attribute => NodeKinds::ATTRIBUTE,
            _ => NodeKinds::ELEMENT,
        }
    }

    fn from_name(name: &str) -> Option<Axis> {
        Some(match name {
            "child" => Axis::Child,
            "attribute" => Axis::Attribute,
            "self" => Axis::SelfNode,
            "parent" => Axis::Parent,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            _ => return None,
        })
    }

    fn nodes(self, doc: &Document, node: NodeRef) -> Vec<NodeRef> {
        match self {
            Axis::Child => doc.children(node).to_vec(),
            Axis::Attribute => doc.attributes(node).to_vec(),
            Axis::SelfNode => vec![node],
            Axis::Parent => doc.parent(node).into_iter().collect(),
            Axis::Descendant => doc.descendants(node),
            Axis::DescendantOrSelf => {
                let mut out = vec![node];
                out.extend(doc.descendants(node));
                out
            }
        }
    }
}

impl NodeTest {
    fn matches(&self, doc: &Document, node: NodeRef, axis: Axis) -> bool {
        match self {
            NodeTest::Kinds(kinds) => kinds.contains(doc.kind(node)),
            NodeTest::Name(name) => {
                doc.kind(node) == axis.principal()
                    && if name.contains(':') { doc.name(node) == name } else { doc.local_name(node) == name }
            }
        }
    }
}

impl Step {
    fn any(axis: Axis) -> Self {
        Step { axis, test: NodeTest::Kinds(NodeKinds::all()), predicates: Vec::new() }
    }

    fn apply(&self, doc: &Document, node: NodeRef) -> Vec<NodeRef> {
        let mut candidates: Vec<NodeRef> =
            self.axis.nodes(doc, node).into_iter().filter(|&n| self.test.matches(doc, n, self.axis)).collect();
        for predicate in &self.predicates {
            candidates = predicate.filter(doc, candidates);
        }
        candidates
    }
}

impl Predicate {
    fn filter(&self, doc: &Document, candidates: Vec<NodeRef>) -> Vec<NodeRef> {
        match self {
            // positions are 1-based; [0] matches nothing
            Predicate::Position(n) => candidates.get(n.wrapping_sub(1)).copied().into_iter().collect(),
            Predicate::Last => candidates.last().copied().into_iter().collect(),
            Predicate::Exists(path) => candidates.into_iter().filter(|&c| !path.evaluate(doc, c).is_empty()).collect(),
            Predicate::Equals { path, literal, negated } => candidates
                .into_iter()
                .filter(|&c| path.evaluate(doc, c).into_iter().any(|m| (doc.text_content(m) == *literal) != *negated))
                .collect(),
        }
    }
}

impl LocationPath {
    fn evaluate(&self, doc: &Document, context: NodeRef) -> Vec<NodeRef> {
        let mut current = vec![if self.absolute { doc.root() } else { context }];
        for step in &self.steps {
            let mut next = Vec::new();
            for &node in &current {
                next.extend(step.apply(doc, node));
            }
            next.sort();
            next.dedup();
            current = next;
        }
        current
    }
}

impl PathExpr {
    /// Parse a query string.
    pub fn parse(query: &str) -> Result<Self, QueryError> {
        let mut parser = PathParser { query, pos: 0 };
        parser.skip_ws();
        if parser.at_end() {
            syntax_error!(query, 0, "empty query");
        }

        let expr = parser.parse_union()?;
        parser.skip_ws();
        if let Some(c) = parser.peek() {
            syntax_error!(query, parser.pos, "unexpected '{c}'");
        }
        Ok(expr)
    }

    /// Matches relative to `context`, in document order, without duplicates.
    pub fn evaluate(&self, doc: &Document, context: NodeRef) -> Vec<NodeRef> {
        let mut out: Vec<NodeRef> = self.branches.iter().flat_map(|b| b.evaluate(doc, context)).collect();
        if self.branches.len() > 1 {
            out.sort();
            out.dedup();
        }
        out
    }
}

// --- Parser -------------------------------------------------------------------

struct PathParser<'q> {
    query: &'q str,
    pos: usize,
}

impl PathParser<'_> {
    fn rest(&self) -> &str {
        &self.query[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.query.len()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), QueryError> {
        self.skip_ws();
        if !self.eat(token) {
            syntax_error!(self.query, self.pos, "expected '{token}'");
        }
        Ok(())
    }

    fn parse_union(&mut self) -> Result<PathExpr, QueryError> {
        let mut branches = vec![self.parse_location()?];
        loop {
            self.skip_ws();
            if !self.eat("|") {
                break;
            }
            branches.push(self.parse_location()?);
        }
        Ok(PathExpr { branches })
    }

    fn parse_location(&mut self) -> Result<LocationPath, QueryError> {
        self.skip_ws();
        let mut steps = Vec::new();

        let absolute = if self.eat("//") {
            steps.push(Step::any(Axis::DescendantOrSelf));
            steps.push(self.parse_step()?);
            true
        } else if self.eat("/") {
            // a lone "/" selects the document node
            if self.at_step_start() {
                steps.push(self.parse_step()?);
            }
            true
        } else {
            steps.push(self.parse_step()?);
            false
        };

        loop {
            if self.eat("//") {
                steps.push(Step::any(Axis::DescendantOrSelf));
                steps.push(self.parse_step()?);
            } else if self.eat("/") {
                steps.push(self.parse_step()?);
            } else {
                break;
            }
        }

        Ok(LocationPath { absolute, steps })
    }

    fn at_step_start(&self) -> bool {
        matches!(self.peek(), Some(c) if c == '.' || c == '@' || c == '*' || is_name_start(c))
    }

    fn parse_step(&mut self) -> Result<Step, QueryError> {
        if self.eat("..") {
            return Ok(Step::any(Axis::Parent));
        }
        if self.eat(".") {
            return Ok(Step::any(Axis::SelfNode));
        }

        let axis = if self.eat("@") { Axis::Attribute } else { self.parse_axis()?.unwrap_or(Axis::Child) };
        let test = self.parse_node_test(axis)?;

        let mut predicates = Vec::new();
        loop {
            self.skip_ws();
            if !self.eat("[") {
                break;
            }
            predicates.push(self.parse_predicate()?);
            self.expect("]")?;
        }

        Ok(Step { axis, test, predicates })
    }

    /// `name::` axis prefix, if present.
    fn parse_axis(&mut self) -> Result<Option<Axis>, QueryError> {
        let start = self.pos;
        let Some(name) = self.parse_name() else {
            return Ok(None);
        };
        if !self.eat("::") {
            self.pos = start;
            return Ok(None);
        }
        match Axis::from_name(&name) {
            Some(axis) => Ok(Some(axis)),
            None => Err(QueryError::Unsupported { query: self.query.to_string(), reason: format!("axis '{name}'") }),
        }
    }

    fn parse_node_test(&mut self, axis: Axis) -> Result<NodeTest, QueryError> {
        if self.eat("*") {
            return Ok(NodeTest::Kinds(axis.principal()));
        }

        let start = self.pos;
        let Some(name) = self.parse_name() else {
            syntax_error!(self.query, start, "expected a node test");
        };

        if !self.eat("(") {
            return Ok(NodeTest::Name(name));
        }
        let kinds = match name.as_str() {
            "text" => NodeKinds::TEXT,
            "node" => NodeKinds::all(),
            _ => {
                return Err(QueryError::Unsupported {
                    query: self.query.to_string(),
                    reason: format!("function '{name}()'"),
                });
            }
        };
        self.expect(")")?;
        Ok(NodeTest::Kinds(kinds))
    }

    fn parse_predicate(&mut self) -> Result<Predicate, QueryError> {
        self.skip_ws();

        let digits: String = self.rest().chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            let start = self.pos;
            self.pos += digits.len();
            return match digits.parse::<usize>() {
                Ok(n) => Ok(Predicate::Position(n)),
                Err(_) => syntax_error!(self.query, start, "position out of range"),
            };
        }

        if self.eat("last()") {
            return Ok(Predicate::Last);
        }

        let path = self.parse_union()?;
        self.skip_ws();
        let negated = if self.eat("!=") {
            true
        } else if self.eat("=") {
            false
        } else {
            return Ok(Predicate::Exists(path));
        };

        let literal = self.parse_literal()?;
        Ok(Predicate::Equals { path, literal, negated })
    }

    fn parse_literal(&mut self) -> Result<String, QueryError> {
        self.skip_ws();
        let start = self.pos;
        match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.pos += 1;
                let Some(len) = self.rest().find(quote) else {
                    syntax_error!(self.query, start, "unterminated string literal");
                };
                let literal = self.rest()[..len].to_string();
                self.pos += len + 1;
                Ok(literal)
            }
            _ => {
                let literal: String =
                    self.rest().chars().take_while(|c| !c.is_whitespace() && *c != ']' && *c != '[').collect();
                if literal.is_empty() {
                    syntax_error!(self.query, start, "expected a literal");
                }
                self.pos += literal.len();
                Ok(literal)
            }
        }
    }

    fn parse_name(&mut self) -> Option<String> {
        let rest = self.rest();
        let mut chars = rest.char_indices().peekable();
        match chars.peek() {
            Some(&(_, c)) if is_name_start(c) => {}
            _ => return None,
        }

        let mut end = 0;
        while let Some((idx, c)) = chars.next() {
            if c == ':' {
                // "::" ends a name (axis separator); a single ':' joins a prefix
                match chars.peek() {
                    Some(&(_, next)) if is_name_start(next) => {}
                    _ => break,
                }
            } else if !is_name_char(c) {
                break;
            }
            end = idx + c.len_utf8();
        }

        let name = rest[..end].to_string();
        self.pos += end;
        Some(name)
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}
