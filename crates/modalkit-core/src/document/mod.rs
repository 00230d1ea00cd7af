#![forbid(unsafe_code)]

//! Headless element tree.
//!
//! [`Document`] is a cheaply clonable, single-threaded handle to a tree of
//! elements rooted at a `body` node. It provides the platform primitives the
//! overlay layer needs and nothing more:
//!
//! - element creation, attach ([`Document::append_child`]) and detach/removal
//! - attributes, class lists and inline style properties
//! - layout bounds and a viewport with a scroll offset
//! - a single focused element
//! - selector queries and hit testing
//! - a reference-counted body scroll lock ([`ScrollLockGuard`])
//!
//! # Invariants
//!
//! 1. Node ids are never reused; a removed node's id stays dead forever, so a
//!    stale `NodeId` can be liveness-checked with [`Document::is_connected`].
//! 2. The focused element is always connected; removing (or detaching) the
//!    subtree containing it clears focus.
//! 3. A node has at most one parent; appending an attached node moves it.
//!
//! # Failure Modes
//!
//! Operations on unknown or removed ids are no-ops returning `false`/`None`.
//! Appending a node into its own subtree is refused.

mod scroll_lock;
pub mod selector;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::geometry::{Rect, Size};
pub use scroll_lock::ScrollLockGuard;
use scroll_lock::ScrollLockState;
use selector::{ElementView, SelectorError, SelectorList};

/// Identifier of an element in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Raw id value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Viewport scroll position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScrollOffset {
    pub x: u32,
    pub y: u32,
}

impl ScrollOffset {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug)]
struct Node {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attrs: AHashMap<String, String>,
    classes: Vec<String>,
    styles: AHashMap<String, String>,
    bounds: Rect,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            parent: None,
            children: Vec::new(),
            attrs: AHashMap::new(),
            classes: Vec::new(),
            styles: AHashMap::new(),
            bounds: Rect::default(),
        }
    }

    fn hides_subtree(&self) -> bool {
        self.attrs.contains_key("hidden")
            || self.styles.get("display").is_some_and(|v| v == "none")
            || self.styles.get("visibility").is_some_and(|v| v == "hidden")
    }

    fn z_index(&self) -> Option<i64> {
        self.styles.get("z-index").and_then(|v| v.parse().ok())
    }
}

impl ElementView for Node {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug)]
struct DocumentInner {
    nodes: AHashMap<NodeId, Node>,
    next_id: u64,
    body: NodeId,
    focused: Option<NodeId>,
    viewport: Size,
    scroll: ScrollOffset,
    live: bool,
    scroll_lock: ScrollLockState,
}

impl DocumentInner {
    fn alloc(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(tag));
        id
    }

    fn is_connected(&self, mut id: NodeId) -> bool {
        loop {
            if id == self.body {
                return self.nodes.contains_key(&id);
            }
            match self.nodes.get(&id).and_then(|n| n.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn contains(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return self.nodes.contains_key(&id);
            }
            match self.nodes.get(&id).and_then(|n| n.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn unlink(&mut self, id: NodeId) {
        let parent = self.nodes.get_mut(&id).and_then(|n| n.parent.take());
        if let Some(parent) = parent
            && let Some(p) = self.nodes.get_mut(&parent)
        {
            p.children.retain(|c| *c != id);
        }
    }

    fn descendants(&self, root: NodeId, out: &mut Vec<NodeId>) {
        if let Some(node) = self.nodes.get(&root) {
            for &child in &node.children {
                out.push(child);
                self.descendants(child, out);
            }
        }
    }

    fn is_rendered(&self, id: NodeId) -> bool {
        if !self.is_connected(id) {
            return false;
        }
        let mut cur = Some(id);
        while let Some(n) = cur {
            let Some(node) = self.nodes.get(&n) else {
                return false;
            };
            if node.hides_subtree() {
                return false;
            }
            cur = node.parent;
        }
        true
    }

    /// Focus is only valid on connected nodes.
    fn drop_stale_focus(&mut self) {
        if let Some(f) = self.focused
            && !self.is_connected(f)
        {
            self.focused = None;
        }
    }

    fn effective_z(&self, mut id: NodeId) -> i64 {
        loop {
            let Some(node) = self.nodes.get(&id) else {
                return 0;
            };
            if let Some(z) = node.z_index() {
                return z;
            }
            match node.parent {
                Some(parent) => id = parent,
                None => return 0,
            }
        }
    }
}

/// Shared handle to an element tree. Clones refer to the same tree.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Document")
            .field("nodes", &inner.nodes.len())
            .field("viewport", &inner.viewport)
            .field("live", &inner.live)
            .finish()
    }
}

impl Document {
    /// Create a live document with the given viewport.
    pub fn new(viewport: Size) -> Self {
        let mut inner = DocumentInner {
            nodes: AHashMap::new(),
            next_id: 1,
            body: NodeId(0),
            focused: None,
            viewport,
            scroll: ScrollOffset::default(),
            live: true,
            scroll_lock: ScrollLockState::default(),
        };
        let body = inner.alloc("body");
        inner.body = body;
        if let Some(node) = inner.nodes.get_mut(&body) {
            node.bounds = Rect::from_size(viewport);
        }
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// Create a document with no renderable surface.
    ///
    /// Element operations still work, but [`is_live`](Self::is_live) reports
    /// `false` so overlay layers can degrade instead of mounting.
    pub fn detached() -> Self {
        let doc = Self::new(Size::default());
        doc.inner.borrow_mut().live = false;
        doc
    }

    /// Whether the document backs a renderable surface.
    pub fn is_live(&self) -> bool {
        self.inner.borrow().live
    }

    /// Mark the surface as available or gone.
    pub fn set_live(&self, live: bool) {
        self.inner.borrow_mut().live = live;
    }

    /// Whether two handles refer to the same tree.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The root element.
    pub fn body(&self) -> NodeId {
        self.inner.borrow().body
    }

    // --- Tree ---

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner.borrow_mut().alloc(tag)
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    ///
    /// Returns `false` if either id is unknown or the move would create a cycle.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.nodes.contains_key(&parent)
            || !inner.nodes.contains_key(&child)
            || inner.contains(child, parent)
        {
            return false;
        }
        inner.unlink(child);
        if let Some(node) = inner.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(p) = inner.nodes.get_mut(&parent) {
            p.children.push(child);
        }
        true
    }

    /// Detach `id` from its parent, keeping the subtree alive.
    pub fn detach(&self, id: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.nodes.contains_key(&id) {
            return false;
        }
        inner.unlink(id);
        inner.drop_stale_focus();
        true
    }

    /// Remove `id` and its whole subtree. Their ids become permanently dead.
    pub fn remove(&self, id: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if id == inner.body || !inner.nodes.contains_key(&id) {
            return false;
        }
        inner.unlink(id);
        let mut doomed = vec![id];
        inner.descendants(id, &mut doomed);
        for node in doomed {
            inner.nodes.remove(&node);
        }
        inner.drop_stale_focus();
        true
    }

    /// Whether `id` exists (attached or not).
    pub fn exists(&self, id: NodeId) -> bool {
        self.inner.borrow().nodes.contains_key(&id)
    }

    /// Whether `id` is attached under the body.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.inner.borrow().is_connected(id)
    }

    /// Whether `id` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.inner.borrow().contains(ancestor, id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.inner.borrow().nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .nodes
            .get(&id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// All descendants of `root` in document (pre-)order, excluding `root`.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.inner.borrow().descendants(root, &mut out);
        out
    }

    pub fn tag(&self, id: NodeId) -> Option<String> {
        self.inner.borrow().nodes.get(&id).map(|n| n.tag.clone())
    }

    // --- Attributes, classes, styles ---

    pub fn set_attribute(&self, id: NodeId, name: &str, value: impl Into<String>) -> bool {
        match self.inner.borrow_mut().nodes.get_mut(&id) {
            Some(node) => {
                node.attrs.insert(name.to_string(), value.into());
                true
            }
            None => false,
        }
    }

    pub fn remove_attribute(&self, id: NodeId, name: &str) -> bool {
        self.inner
            .borrow_mut()
            .nodes
            .get_mut(&id)
            .is_some_and(|n| n.attrs.remove(name).is_some())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .nodes
            .get(&id)
            .and_then(|n| n.attrs.get(name).cloned())
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.inner
            .borrow()
            .nodes
            .get(&id)
            .is_some_and(|n| n.attrs.contains_key(name))
    }

    /// Add a class if not already present.
    pub fn add_class(&self, id: NodeId, class: &str) {
        if let Some(node) = self.inner.borrow_mut().nodes.get_mut(&id)
            && !class.is_empty()
            && !node.has_class(class)
        {
            node.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&self, id: NodeId, class: &str) {
        if let Some(node) = self.inner.borrow_mut().nodes.get_mut(&id) {
            node.classes.retain(|c| c != class);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.inner
            .borrow()
            .nodes
            .get(&id)
            .is_some_and(|n| n.has_class(class))
    }

    pub fn classes(&self, id: NodeId) -> Vec<String> {
        self.inner
            .borrow()
            .nodes
            .get(&id)
            .map(|n| n.classes.clone())
            .unwrap_or_default()
    }

    /// Set an inline style property (e.g. `"z-index"`, `"display"`).
    pub fn set_style(&self, id: NodeId, property: &str, value: impl Into<String>) {
        if let Some(node) = self.inner.borrow_mut().nodes.get_mut(&id) {
            node.styles.insert(property.to_string(), value.into());
        }
    }

    pub fn remove_style(&self, id: NodeId, property: &str) {
        if let Some(node) = self.inner.borrow_mut().nodes.get_mut(&id) {
            node.styles.remove(property);
        }
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<String> {
        self.inner
            .borrow()
            .nodes
            .get(&id)
            .and_then(|n| n.styles.get(property).cloned())
    }

    // --- Layout ---

    pub fn set_bounds(&self, id: NodeId, bounds: Rect) {
        if let Some(node) = self.inner.borrow_mut().nodes.get_mut(&id) {
            node.bounds = bounds;
        }
    }

    /// On-screen bounds of a connected element.
    pub fn bounds(&self, id: NodeId) -> Option<Rect> {
        let inner = self.inner.borrow();
        if !inner.is_connected(id) {
            return None;
        }
        inner.nodes.get(&id).map(|n| n.bounds)
    }

    /// Whether `id` is connected and neither it nor an ancestor is hidden.
    pub fn is_rendered(&self, id: NodeId) -> bool {
        self.inner.borrow().is_rendered(id)
    }

    pub fn viewport(&self) -> Size {
        self.inner.borrow().viewport
    }

    pub fn set_viewport(&self, viewport: Size) {
        let mut inner = self.inner.borrow_mut();
        inner.viewport = viewport;
        let body = inner.body;
        if let Some(node) = inner.nodes.get_mut(&body) {
            node.bounds = Rect::from_size(viewport);
        }
    }

    pub fn scroll_offset(&self) -> ScrollOffset {
        self.inner.borrow().scroll
    }

    pub fn scroll_to(&self, offset: ScrollOffset) {
        self.inner.borrow_mut().scroll = offset;
    }

    // --- Focus ---

    /// Focus `id`. Refused for unknown or disconnected elements.
    pub fn focus(&self, id: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.is_connected(id) {
            return false;
        }
        inner.focused = Some(id);
        true
    }

    /// Clear focus.
    pub fn blur(&self) {
        self.inner.borrow_mut().focused = None;
    }

    /// The focused element, if any.
    pub fn active_element(&self) -> Option<NodeId> {
        let inner = self.inner.borrow();
        inner.focused.filter(|f| inner.is_connected(*f))
    }

    // --- Queries ---

    /// Whether `id` matches `selector`.
    pub fn matches(&self, id: NodeId, selector: &SelectorList) -> bool {
        self.inner
            .borrow()
            .nodes
            .get(&id)
            .is_some_and(|n| selector.matches(n))
    }

    /// Descendants of `root` matching `selector`, in document order.
    pub fn query_all(&self, root: NodeId, selector: &SelectorList) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        let mut all = Vec::new();
        inner.descendants(root, &mut all);
        all.retain(|id| inner.nodes.get(id).is_some_and(|n| selector.matches(n)));
        all
    }

    /// First descendant of `root` matching the selector string.
    pub fn query_selector(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Option<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(self.query_all(root, &list).into_iter().next())
    }

    /// Topmost rendered element whose bounds contain `(x, y)`.
    ///
    /// Elements stack by their nearest `z-index` style, then by document
    /// order (later and deeper wins).
    pub fn hit_test(&self, x: u16, y: u16) -> Option<NodeId> {
        let inner = self.inner.borrow();
        let mut order = vec![inner.body];
        inner.descendants(inner.body, &mut order);
        order
            .into_iter()
            .enumerate()
            .filter(|(_, id)| {
                inner.is_rendered(*id)
                    && inner.nodes.get(id).is_some_and(|n| n.bounds.contains(x, y))
            })
            .max_by_key(|(pos, id)| (inner.effective_z(*id), *pos))
            .map(|(_, id)| id)
    }
}
