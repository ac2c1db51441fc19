//! Module for handling names according to the W3C [Namespaces in XML 1.1
//! (Second Edition)][spec] specification
//!
//! Two name types flow through the pipeline: [`LName`] is what the
//! tokenizer reads from the document (a prefix and a local part, no
//! namespace attached), and [`QName`] is what the resolver makes of it
//! once the namespace declarations in scope are known.
//!
//! [spec]: https://www.w3.org/TR/xml-names11
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::events::{Attribute, Content};

/// Namespace bound to the reserved `xml` prefix in every document,
/// regardless of what is declared in scope.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A lexical name as written in the document: an optional prefix and a
/// local part. Carries no namespace; resolution happens later.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct LName {
    /// The part before the `:`, if the name had one.
    pub prefix: Option<String>,
    /// The local part of the name.
    pub local: String,
}

impl LName {
    /// Creates an unprefixed lexical name.
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
        }
    }

    /// Creates a prefixed lexical name.
    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local: local.into(),
        }
    }
}

impl fmt::Display for LName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// A qualified name: local part, optional namespace, optional prefix.
///
/// The prefix is kept so consumers can reproduce the lexical form, but it
/// takes no part in name identity: two qualified names are equal when
/// their local parts and namespaces are equal.
#[derive(Clone, Debug, Eq)]
pub struct QName {
    /// The local part of the name.
    pub local: String,
    /// The namespace the name resolved to, if any.
    pub namespace: Option<String>,
    /// The prefix the document used, if any. Not part of name identity.
    pub prefix: Option<String>,
}

impl QName {
    /// Creates a name with no namespace and no prefix.
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            namespace: None,
            prefix: None,
        }
    }

    /// Creates a name in a namespace, with no prefix.
    pub fn namespaced(local: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            namespace: Some(namespace.into()),
            prefix: None,
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.local == other.local && self.namespace == other.namespace
    }
}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.local.hash(state);
        self.namespace.hash(state);
    }
}

impl From<&str> for QName {
    fn from(local: &str) -> Self {
        Self::new(local)
    }
}

impl From<String> for QName {
    fn from(local: String) -> Self {
        Self::new(local)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// One namespace scope: the default namespace and the prefix bindings
/// visible at some element.
///
/// A scope is a snapshot: deriving a child scope never mutates the
/// parent's, so popping an element restores its parent's view verbatim.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NsScope {
    default: Option<String>,
    prefixes: HashMap<String, String>,
}

impl NsScope {
    fn resolve(&self, name: &LName, use_default: bool) -> QName {
        match &name.prefix {
            // the `xml` prefix is bound by the XML spec itself
            Some(prefix) if prefix == "xml" => QName {
                local: name.local.clone(),
                namespace: Some(XML_NAMESPACE.to_string()),
                prefix: Some(prefix.clone()),
            },
            Some(prefix) => QName {
                local: name.local.clone(),
                // an unknown prefix resolves to no namespace, it is not an error
                namespace: self.prefixes.get(prefix).cloned(),
                prefix: Some(prefix.clone()),
            },
            None => QName {
                local: name.local.clone(),
                namespace: if use_default {
                    self.default.clone()
                } else {
                    None
                },
                prefix: None,
            },
        }
    }

    /// Resolves an element name. Unprefixed element names take the default
    /// namespace.
    pub fn resolve_element(&self, name: &LName) -> QName {
        self.resolve(name, true)
    }

    /// Resolves an attribute name. Unprefixed attribute names never take
    /// the default namespace.
    pub fn resolve_attribute(&self, name: &LName) -> QName {
        self.resolve(name, false)
    }
}

/// A stack of namespace scopes, one per currently open element.
///
/// The stack depth equals the element nesting depth at all times; an
/// implicit empty root scope applies while the stack is empty.
#[derive(Debug, Default)]
pub struct NamespaceResolver {
    scopes: Vec<NsScope>,
}

impl NamespaceResolver {
    /// The number of currently open elements.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Processes a start tag: absorbs the `xmlns` / `xmlns:prefix`
    /// attributes into a scope derived from the current one, resolves the
    /// element name and the remaining attributes against that new scope,
    /// and pushes it — unless the element is self-closing, in which case
    /// the scope would be popped right away and is not pushed at all.
    ///
    /// Attributes keep their document order. Unprefixed attributes are
    /// resolved without the default namespace.
    pub fn push(
        &mut self,
        name: &LName,
        attributes: Vec<(LName, Vec<Content>)>,
        self_closing: bool,
    ) -> (QName, Vec<Attribute>) {
        let mut scope = self.scopes.last().cloned().unwrap_or_default();
        let mut ordinary = Vec::new();
        for (attr_name, value) in attributes {
            let declares_prefix = attr_name.prefix.as_deref() == Some("xmlns");
            let declares_default = attr_name.prefix.is_none() && attr_name.local == "xmlns";
            if declares_prefix {
                scope
                    .prefixes
                    .insert(attr_name.local, Content::flatten_all(&value));
            } else if declares_default {
                let uri = Content::flatten_all(&value);
                // an empty default declaration removes the default namespace
                scope.default = if uri.is_empty() { None } else { Some(uri) };
            } else {
                ordinary.push((attr_name, value));
            }
        }
        let qname = scope.resolve_element(name);
        let attributes = ordinary
            .into_iter()
            .map(|(attr_name, value)| Attribute {
                name: scope.resolve_attribute(&attr_name),
                value,
            })
            .collect();
        if !self_closing {
            self.scopes.push(scope);
        }
        (qname, attributes)
    }

    /// Processes an end tag: resolves the name against the scope the
    /// matching start tag pushed, then pops that scope.
    pub fn pop(&mut self, name: &LName) -> QName {
        let scope = self.scopes.pop().unwrap_or_default();
        scope.resolve_element(name)
    }
}
