#![forbid(unsafe_code)]

//! Reference-counted body scroll lock.
//!
//! The first acquired lock records the viewport scroll offset and the body's
//! `overflow`/`position`/`top`/`width` styles, then pins the body with
//! `position: fixed; top: -<y>` so the page does not jump. Nested locks only
//! bump a depth counter. Releasing the last lock restores the recorded
//! styles and scrolls back to the recorded offset.
//!
//! # Invariants
//!
//! 1. Body styles are captured exactly once per outermost lock.
//! 2. Releasing an inner lock never unlocks while an outer lock is held.
//! 3. Each [`ScrollLockGuard`] releases at most once (explicitly or on drop).

use super::{Document, ScrollOffset};

const LOCKED_STYLES: [&str; 4] = ["overflow", "position", "top", "width"];

#[derive(Debug, Default)]
pub(super) struct ScrollLockState {
    depth: usize,
    saved_scroll: ScrollOffset,
    saved_styles: Vec<(&'static str, Option<String>)>,
}

/// RAII guard for one scroll lock. Dropping it releases the lock.
#[must_use = "dropping this guard releases the scroll lock"]
#[derive(Debug)]
pub struct ScrollLockGuard {
    document: Document,
    held: bool,
}

impl ScrollLockGuard {
    /// Release now instead of on drop.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if std::mem::take(&mut self.held) {
            self.document.release_scroll_lock();
        }
    }
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl Document {
    /// Acquire a scroll lock on the body.
    pub fn lock_scroll(&self) -> ScrollLockGuard {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        inner.scroll_lock.depth += 1;
        if inner.scroll_lock.depth == 1 {
            let body = inner.body;
            let scroll = inner.scroll;
            let saved: Vec<_> = match inner.nodes.get_mut(&body) {
                Some(node) => {
                    let saved = LOCKED_STYLES
                        .iter()
                        .map(|&p| (p, node.styles.get(p).cloned()))
                        .collect();
                    node.styles.insert("overflow".into(), "hidden".into());
                    node.styles.insert("position".into(), "fixed".into());
                    node.styles.insert("top".into(), format!("-{}", scroll.y));
                    node.styles.insert("width".into(), "100%".into());
                    saved
                }
                None => Vec::new(),
            };
            inner.scroll_lock.saved_scroll = scroll;
            inner.scroll_lock.saved_styles = saved;

            #[cfg(feature = "tracing")]
            tracing::debug!(scroll_y = scroll.y, "scroll lock engaged");
        }
        ScrollLockGuard {
            document: self.clone(),
            held: true,
        }
    }

    /// Number of scroll locks currently held.
    pub fn scroll_lock_depth(&self) -> usize {
        self.inner.borrow().scroll_lock.depth
    }

    /// Whether any scroll lock is held.
    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_lock_depth() > 0
    }

    fn release_scroll_lock(&self) {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        if inner.scroll_lock.depth == 0 {
            return;
        }
        inner.scroll_lock.depth -= 1;
        if inner.scroll_lock.depth > 0 {
            return;
        }
        let body = inner.body;
        let saved = std::mem::take(&mut inner.scroll_lock.saved_styles);
        if let Some(node) = inner.nodes.get_mut(&body) {
            for (property, value) in saved {
                match value {
                    Some(v) => node.styles.insert(property.to_string(), v),
                    None => node.styles.remove(property),
                };
            }
        }
        inner.scroll = inner.scroll_lock.saved_scroll;

        #[cfg(feature = "tracing")]
        tracing::debug!(scroll_y = inner.scroll.y, "scroll lock released");
    }
}

#[cfg(test)]
mod tests {
    use crate::document::{Document, ScrollOffset};
    use crate::geometry::Size;

    #[test]
    fn lock_pins_body_and_release_restores() {
        let d = Document::new(Size::new(80, 24));
        let body = d.body();
        d.set_style(body, "overflow", "auto");
        d.scroll_to(ScrollOffset::new(0, 120));

        let guard = d.lock_scroll();
        assert!(d.is_scroll_locked());
        assert_eq!(d.style(body, "overflow").as_deref(), Some("hidden"));
        assert_eq!(d.style(body, "position").as_deref(), Some("fixed"));
        assert_eq!(d.style(body, "top").as_deref(), Some("-120"));

        // Layout changes while fixed may reset the offset.
        d.scroll_to(ScrollOffset::new(0, 0));
        drop(guard);

        assert!(!d.is_scroll_locked());
        assert_eq!(d.style(body, "overflow").as_deref(), Some("auto"));
        assert_eq!(d.style(body, "position"), None);
        assert_eq!(d.style(body, "top"), None);
        assert_eq!(d.scroll_offset(), ScrollOffset::new(0, 120));
    }

    #[test]
    fn nested_locks_release_only_at_outermost() {
        let d = Document::new(Size::new(80, 24));
        let body = d.body();
        let outer = d.lock_scroll();
        let inner = d.lock_scroll();
        assert_eq!(d.scroll_lock_depth(), 2);

        inner.release();
        assert!(d.is_scroll_locked());
        assert_eq!(d.style(body, "position").as_deref(), Some("fixed"));

        drop(outer);
        assert!(!d.is_scroll_locked());
        assert_eq!(d.style(body, "position"), None);
    }

    #[test]
    fn out_of_order_release_keeps_lock() {
        let d = Document::new(Size::new(80, 24));
        let first = d.lock_scroll();
        let second = d.lock_scroll();
        drop(first);
        assert!(d.is_scroll_locked());
        drop(second);
        assert!(!d.is_scroll_locked());
    }
}
