//! # Type tags for covariant subscription matching.
//!
//! Every [`Event`](crate::Event) carries a [`Tag`]: a cheap, copyable identity
//! with a supertype relation. Subscribers registered for a tag receive events
//! whose tag is equal to it or descends from it, so a subscription to a base
//! tag taps the whole family.
//!
//! Tags are declared as `static` [`TagInfo`] records and wrap a `&'static`
//! reference to them. Identity is the address of the record, so two tags are
//! equal only when they point at the same declaration.
//!
//! ## Declaring a hierarchy
//! ```
//! use fluxgate::{Tag, TagInfo};
//!
//! static PRICED: TagInfo = TagInfo::new("priced");
//! static MARKET: TagInfo = TagInfo::new("market");
//! static QUOTE: TagInfo = TagInfo::child_of("quote", &MARKET).implementing(&[&PRICED]);
//!
//! assert!(QUOTE.tag().is_descendant_of(MARKET.tag()));
//! assert!(QUOTE.tag().is_descendant_of(fluxgate::ROOT.tag()));
//! ```
//!
//! Every parent chain terminates at [`ROOT`]: [`TagInfo::new`] parents the
//! tag directly under the root, and [`TagInfo::child_of`] chains through
//! tags that themselves end at the root. Subscribing to `ROOT.tag()` is the
//! typed way to match every event.

use std::fmt;
use std::hash::{Hash, Hasher};

/// The universal root tag. Every declared tag descends from it.
pub static ROOT: TagInfo = TagInfo {
    name: "event",
    parent: None,
    implements: &[],
};

/// Static metadata backing a [`Tag`].
///
/// Declare one `static` per event type and derive the [`Tag`] from it with
/// [`TagInfo::tag`]. The `parent` chain models single supertype inheritance;
/// `implements` lists interface-like tags the type satisfies directly.
pub struct TagInfo {
    name: &'static str,
    parent: Option<&'static TagInfo>,
    implements: &'static [&'static TagInfo],
}

impl TagInfo {
    /// A tag parented directly under [`ROOT`].
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            parent: None,
            implements: &[],
        }
    }

    /// A tag with an explicit parent.
    pub const fn child_of(name: &'static str, parent: &'static TagInfo) -> Self {
        Self {
            name,
            parent: Some(parent),
            implements: &[],
        }
    }

    /// Attaches directly-implemented interface tags, in declaration order.
    pub const fn implementing(mut self, implements: &'static [&'static TagInfo]) -> Self {
        self.implements = implements;
        self
    }

    /// The [`Tag`] identity of this record.
    pub const fn tag(&'static self) -> Tag {
        Tag(self)
    }
}

/// A runtime-resolvable event type identity.
///
/// `Copy` and pointer-sized; compare and hash by the address of the backing
/// [`TagInfo`].
#[derive(Clone, Copy)]
pub struct Tag(&'static TagInfo);

impl Tag {
    /// The declared tag name.
    pub fn name(self) -> &'static str {
        self.0.name
    }

    /// The immediate supertype, `None` for [`ROOT`].
    ///
    /// A tag declared without an explicit parent sits directly under the
    /// root, so every parent chain terminates there.
    pub fn parent(self) -> Option<Tag> {
        if std::ptr::eq(self.0, &ROOT) {
            return None;
        }
        match self.0.parent {
            Some(parent) => Some(Tag(parent)),
            None => Some(ROOT.tag()),
        }
    }

    /// Directly-implemented interface tags, in declaration order.
    pub fn implements(self) -> impl Iterator<Item = Tag> {
        self.0.implements.iter().copied().map(Tag)
    }

    /// Strict ancestors, from the immediate parent up to and including the
    /// root.
    pub fn ancestors(self) -> Ancestors {
        Ancestors {
            next: self.parent(),
        }
    }

    /// True when `self` equals `other` or `other` is an ancestor of `self`.
    pub fn is_descendant_of(self, other: Tag) -> bool {
        self == other || self.ancestors().any(|ancestor| ancestor == other)
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.0, state);
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tag").field(&self.0.name).finish()
    }
}

/// Iterator over strict ancestors of a [`Tag`], nearest first.
pub struct Ancestors {
    next: Option<Tag>,
}

impl Iterator for Ancestors {
    type Item = Tag;

    fn next(&mut self) -> Option<Tag> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}
