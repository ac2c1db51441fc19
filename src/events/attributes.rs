//! Parsing the attribute list of a single element.

use crate::errors::{Error, Result};
use crate::events::Attribute;
use crate::name::QName;

/// A small state-threading parser over the attributes of one element.
///
/// Starts out holding the element's full attribute list in document
/// order; every operation removes what it consumed. When the parser
/// given to [`tag`] returns, any attribute still unconsumed raises
/// [`Error::UnparsedAttributes`] — an element whose attributes are not
/// all parsed explicitly must call [`ignore_attrs`].
///
/// [`tag`]: crate::reader::EventReader::tag
/// [`ignore_attrs`]: Self::ignore_attrs
#[derive(Debug)]
pub struct AttrParser {
    remaining: Vec<Attribute>,
}

impl AttrParser {
    pub(crate) fn new(attributes: Vec<Attribute>) -> Self {
        Self {
            remaining: attributes,
        }
    }

    /// Scans the remaining attributes for the first one `pick` accepts,
    /// removes it and returns the picked value.
    pub fn optional_attr_with<T>(
        &mut self,
        mut pick: impl FnMut(&Attribute) -> Option<T>,
    ) -> Option<T> {
        let mut found = None;
        for (index, attribute) in self.remaining.iter().enumerate() {
            if let Some(value) = pick(attribute) {
                found = Some((index, value));
                break;
            }
        }
        let (index, value) = found?;
        self.remaining.remove(index);
        Some(value)
    }

    /// As [`optional_attr_with`], but raises an error with `msg` when no
    /// remaining attribute is accepted.
    ///
    /// [`optional_attr_with`]: Self::optional_attr_with
    pub fn require_attr_with<T>(
        &mut self,
        msg: &str,
        pick: impl FnMut(&Attribute) -> Option<T>,
    ) -> Result<T> {
        match self.optional_attr_with(pick) {
            Some(value) => Ok(value),
            None => Err(Error::Expected {
                msg: msg.to_string(),
                event: None,
            }),
        }
    }

    /// Removes the attribute with the given name and returns its
    /// flattened value, if present.
    pub fn optional_attr(&mut self, name: impl Into<QName>) -> Option<String> {
        let name = name.into();
        self.optional_attr_with(|attribute| {
            if attribute.name == name {
                Some(attribute.flat_value())
            } else {
                None
            }
        })
    }

    /// Removes the attribute with the given name and returns its
    /// flattened value; the attribute must be present.
    pub fn require_attr(&mut self, name: impl Into<QName>) -> Result<String> {
        let name = name.into();
        match self.optional_attr(name.clone()) {
            Some(value) => Ok(value),
            None => Err(Error::Expected {
                msg: format!("attribute {}", name),
                event: None,
            }),
        }
    }

    /// Discards every remaining attribute.
    pub fn ignore_attrs(&mut self) {
        self.remaining.clear();
    }

    /// Runs `inner`, then discards whatever it did not consume.
    pub fn skip_attrs<T>(&mut self, inner: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let value = inner(self)?;
        self.ignore_attrs();
        Ok(value)
    }

    /// Completion check: succeeds only if everything was consumed.
    pub(crate) fn finish(self) -> Result<()> {
        if self.remaining.is_empty() {
            Ok(())
        } else {
            Err(Error::UnparsedAttributes(self.remaining))
        }
    }
}
