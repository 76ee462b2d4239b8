//! Radix tree for one HTTP method.
//!
//! Static runs of a pattern are stored as byte prefixes and split on
//! divergence, classic radix style. Parameters (`:name`) and wildcards
//! (`*name`) never live among the static children: each node has one
//! dedicated slot for each.
//!
//! ```text
//! /users/new      root ── "/users/" ─┬─ "new"        (value)
//! /users/:id                         ├─ :id          (value)
//! /users/:id/keys                    │    └─ "/keys" (value)
//! /users/*rest                       └─ *rest        (value)
//! ```
//!
//! Lookup prefers static over param over wildcard at every node and
//! backtracks: a static branch that dead-ends deeper down falls back to the
//! param slot, then the wildcard slot, of the node where it branched.

use crate::error::RouteError;
use crate::params::Params;

// ── Pattern tokens ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Static(&'a str),
    Param(&'a str),
    Wildcard(&'a str),
}

/// Split a pattern into static runs, params and a trailing wildcard.
pub(crate) fn tokenize(pattern: &str) -> Result<Vec<Token<'_>>, RouteError> {
    let bytes = pattern.as_bytes();
    let mut tokens = Vec::new();
    let mut start = 0;

    while let Some(offset) = bytes[start..].iter().position(|&b| b == b':' || b == b'*') {
        let at = start + offset;
        if at > start {
            tokens.push(Token::Static(&pattern[start..at]));
        }
        if at == 0 || bytes[at - 1] != b'/' {
            return Err(RouteError::MisplacedParam(pattern.to_owned()));
        }

        let end = bytes[at..].iter()
            .position(|&b| b == b'/')
            .map_or(bytes.len(), |n| at + n);
        let name = &pattern[at + 1..end];
        if name.is_empty() {
            return Err(RouteError::EmptyParamName(pattern.to_owned()));
        }
        if name.contains([':', '*']) {
            return Err(RouteError::MisplacedParam(pattern.to_owned()));
        }

        if bytes[at] == b'*' {
            if end != bytes.len() {
                return Err(RouteError::WildcardNotLast(pattern.to_owned()));
            }
            tokens.push(Token::Wildcard(name));
            return Ok(tokens);
        }
        tokens.push(Token::Param(name));
        start = end;
    }

    if start < bytes.len() {
        tokens.push(Token::Static(&pattern[start..]));
    }
    Ok(tokens)
}

// ── Insertion errors ──────────────────────────────────────────────────────────

/// Why an insert was refused. The router adds method and pattern context.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum InsertError {
    Invalid(RouteError),
    Conflict { existing: String, new: String },
    Duplicate,
}

// ── Tree ──────────────────────────────────────────────────────────────────────

pub(crate) struct Tree<T> {
    root: Node<T>,
}

/// A successful lookup: the stored value and the bindings that led to it.
pub(crate) struct Match<'t, T> {
    pub value: &'t T,
    pub params: Params,
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self { root: Node::new(b"") }
    }

    /// Whether `insert(pattern, ..)` would succeed, without touching the tree.
    pub fn check(&self, pattern: &str) -> Result<(), InsertError> {
        let tokens = tokenize(pattern).map_err(InsertError::Invalid)?;

        let mut node = &self.root;
        for token in tokens {
            // once the walk leaves the existing tree, everything below is new
            let next = match token {
                Token::Static(lit) => node.existing_static(lit.as_bytes()),
                Token::Param(name) => match &node.param {
                    Some(p) if p.name != name => {
                        return Err(InsertError::Conflict {
                            existing: p.name.clone(),
                            new: name.to_owned(),
                        });
                    }
                    Some(p) => Some(&p.node),
                    None => None,
                },
                Token::Wildcard(name) => {
                    return match &node.wildcard {
                        Some(w) if w.name != name => Err(InsertError::Conflict {
                            existing: w.name.clone(),
                            new: name.to_owned(),
                        }),
                        Some(_) => Err(InsertError::Duplicate),
                        None => Ok(()),
                    };
                }
            };
            match next {
                Some(n) => node = n,
                None => return Ok(()),
            }
        }

        if node.value.is_some() {
            return Err(InsertError::Duplicate);
        }
        Ok(())
    }

    /// Insert `value` at `pattern`. A refused insert leaves the tree as it was.
    pub fn insert(&mut self, pattern: &str, value: T) -> Result<(), InsertError> {
        self.check(pattern)?;
        let tokens = tokenize(pattern).map_err(InsertError::Invalid)?;

        let mut node = &mut self.root;
        for token in tokens {
            match token {
                Token::Static(lit) => node = node.static_child(lit.as_bytes()),
                Token::Param(name) => node = node.param_child(name)?,
                // tokenize guarantees the wildcard is last
                Token::Wildcard(name) => return node.set_wildcard(name, value),
            }
        }

        if node.value.is_some() {
            return Err(InsertError::Duplicate);
        }
        node.value = Some(value);
        Ok(())
    }

    pub fn at(&self, path: &str) -> Option<Match<'_, T>> {
        let mut captured = Vec::new();
        let value = self.root.find(path, 0, &mut captured)?;
        Some(Match { value, params: captured.into_iter().collect() })
    }
}

impl<T> Default for Tree<T> {
    fn default() -> Self { Self::new() }
}

// ── Node ──────────────────────────────────────────────────────────────────────

struct Node<T> {
    prefix: Vec<u8>,
    /// First byte of each static child's prefix, parallel to `children`.
    indices: Vec<u8>,
    children: Vec<Node<T>>,
    param: Option<Box<ParamChild<T>>>,
    wildcard: Option<WildcardChild<T>>,
    value: Option<T>,
}

struct ParamChild<T> {
    name: String,
    node: Node<T>,
}

/// Terminal by construction: nothing can hang below a wildcard.
struct WildcardChild<T> {
    name: String,
    value: T,
}

impl<T> Node<T> {
    fn new(prefix: &[u8]) -> Self {
        Self {
            prefix: prefix.to_vec(),
            indices: Vec::new(),
            children: Vec::new(),
            param: None,
            wildcard: None,
            value: None,
        }
    }

    /// Walk (or grow) the static path `lit` below this node.
    fn static_child(&mut self, lit: &[u8]) -> &mut Node<T> {
        if lit.is_empty() {
            return self;
        }

        let Some(i) = self.indices.iter().position(|&b| b == lit[0]) else {
            self.indices.push(lit[0]);
            self.children.push(Node::new(lit));
            let last = self.children.len() - 1;
            return &mut self.children[last];
        };

        let child = &mut self.children[i];
        let common = common_prefix(&child.prefix, lit);
        if common < child.prefix.len() {
            child.split(common);
        }
        child.static_child(&lit[common..])
    }

    /// The node a static walk of `lit` ends on, if it exists already.
    /// `None` when inserting `lit` would split a node or add a child.
    fn existing_static(&self, lit: &[u8]) -> Option<&Node<T>> {
        if lit.is_empty() {
            return Some(self);
        }
        let i = self.indices.iter().position(|&b| b == lit[0])?;
        let child = &self.children[i];
        if !lit.starts_with(&child.prefix) {
            return None;
        }
        child.existing_static(&lit[child.prefix.len()..])
    }

    /// Keep `prefix[..at]` here and push everything else into a new child.
    fn split(&mut self, at: usize) {
        let tail = Node {
            prefix: self.prefix.split_off(at),
            indices: std::mem::take(&mut self.indices),
            children: std::mem::take(&mut self.children),
            param: self.param.take(),
            wildcard: self.wildcard.take(),
            value: self.value.take(),
        };
        self.indices = vec![tail.prefix[0]];
        self.children = vec![tail];
    }

    fn param_child(&mut self, name: &str) -> Result<&mut Node<T>, InsertError> {
        let param = self.param.get_or_insert_with(|| {
            Box::new(ParamChild { name: name.to_owned(), node: Node::new(b"") })
        });
        if param.name != name {
            return Err(InsertError::Conflict {
                existing: param.name.clone(),
                new: name.to_owned(),
            });
        }
        Ok(&mut param.node)
    }

    fn set_wildcard(&mut self, name: &str, value: T) -> Result<(), InsertError> {
        match &self.wildcard {
            Some(w) if w.name != name => Err(InsertError::Conflict {
                existing: w.name.clone(),
                new: name.to_owned(),
            }),
            Some(_) => Err(InsertError::Duplicate),
            None => {
                self.wildcard = Some(WildcardChild { name: name.to_owned(), value });
                Ok(())
            }
        }
    }

    /// Match `path[pos..]` below this node, whose own prefix is already
    /// consumed. On failure `params` is left exactly as it was passed in.
    ///
    /// Params and wildcards only hang off nodes whose full path ends in `/`,
    /// so every `str` slice taken here starts on a char boundary.
    fn find<'n, 'p>(
        &'n self,
        path: &'p str,
        pos: usize,
        params: &mut Vec<(&'n str, &'p str)>,
    ) -> Option<&'n T> {
        let rest = &path.as_bytes()[pos..];

        if rest.is_empty() {
            if let Some(value) = &self.value {
                return Some(value);
            }
        } else {
            if let Some(i) = self.indices.iter().position(|&b| b == rest[0]) {
                let child = &self.children[i];
                if rest.starts_with(&child.prefix) {
                    if let Some(value) = child.find(path, pos + child.prefix.len(), params) {
                        return Some(value);
                    }
                }
            }

            if let Some(param) = &self.param {
                let len = rest.iter().position(|&b| b == b'/').unwrap_or(rest.len());
                if len > 0 {
                    params.push((param.name.as_str(), &path[pos..pos + len]));
                    if let Some(value) = param.node.find(path, pos + len, params) {
                        return Some(value);
                    }
                    params.pop();
                }
            }
        }

        let wildcard = self.wildcard.as_ref()?;
        params.push((wildcard.name.as_str(), &path[pos..]));
        Some(&wildcard.value)
    }
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
