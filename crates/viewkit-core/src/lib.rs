#![doc = r"Core view tree contracts and tag-based view recycling for viewkit."]

pub mod collections;
pub mod recycler;
pub mod walk;

pub use recycler::{recycle_views, RecyclerState, ViewRecycler};
pub use walk::walk_subviews;

use std::any::Any;
use std::fmt;

/// Recycling key attached to every view. [`UNTAGGED`] opts a view out of
/// tag-based reuse.
pub type Tag = i64;
pub type ViewId = usize;

pub const UNTAGGED: Tag = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    Missing { id: ViewId },
    TypeMismatch { id: ViewId, expected: &'static str },
    InvalidHierarchy { parent: ViewId, child: ViewId },
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::Missing { id } => write!(f, "view {id} missing"),
            ViewError::TypeMismatch { id, expected } => {
                write!(f, "view {id} type mismatch; expected {expected}")
            }
            ViewError::InvalidHierarchy { parent, child } => {
                write!(f, "attaching view {child} under {parent} would create a cycle")
            }
        }
    }
}

impl std::error::Error for ViewError {}

/// A visual element hosted by a [`ViewTree`].
///
/// Concrete view types carry their own state; the tree keeps the tag and the
/// parent/child links. The hooks fire when the tree attaches the view to a
/// parent or detaches it from one.
pub trait View: Any {
    fn attached(&mut self) {}
    fn detached(&mut self) {}
    fn debug_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl dyn View {
    pub fn as_any(&self) -> &dyn Any {
        self
    }

    pub fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Host view hierarchy consumed by the recycler.
pub trait ViewTree {
    fn create(&mut self, view: Box<dyn View>) -> ViewId;
    fn get(&self, id: ViewId) -> Result<&(dyn View + 'static), ViewError>;
    fn get_mut(&mut self, id: ViewId) -> Result<&mut (dyn View + 'static), ViewError>;
    fn tag(&self, id: ViewId) -> Result<Tag, ViewError>;
    fn set_tag(&mut self, id: ViewId, tag: Tag) -> Result<(), ViewError>;
    /// Direct children of `id`, in layout order.
    fn children(&self, id: ViewId) -> Result<Vec<ViewId>, ViewError>;
    fn parent(&self, id: ViewId) -> Result<Option<ViewId>, ViewError>;
    /// Attaches `child` as the last child of `parent`, moving it away from
    /// its current parent if it has one.
    fn append_child(&mut self, parent: ViewId, child: ViewId) -> Result<(), ViewError>;
    /// Detaches `id` from its parent. Views without a parent are left as is.
    fn remove_from_parent(&mut self, id: ViewId) -> Result<(), ViewError>;
}

struct ViewEntry {
    view: Box<dyn View>,
    tag: Tag,
    parent: Option<ViewId>,
    children: Vec<ViewId>, // FUTURE(no_std): replace Vec with arena-backed child list.
}

/// Arena-backed [`ViewTree`].
///
/// Detached views stay in the arena so they can be attached again; only
/// [`MemoryViewTree::remove`] destroys them.
#[derive(Default)]
pub struct MemoryViewTree {
    entries: Vec<Option<ViewEntry>>, // FUTURE(no_std): migrate to arena-backed view storage.
}

impl MemoryViewTree {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn entry(&self, id: ViewId) -> Result<&ViewEntry, ViewError> {
        self.entries
            .get(id)
            .and_then(|slot| slot.as_ref())
            .ok_or(ViewError::Missing { id })
    }

    fn entry_mut(&mut self, id: ViewId) -> Result<&mut ViewEntry, ViewError> {
        self.entries
            .get_mut(id)
            .and_then(|slot| slot.as_mut())
            .ok_or(ViewError::Missing { id })
    }

    pub fn with_view<V: View, R>(
        &mut self,
        id: ViewId,
        f: impl FnOnce(&mut V) -> R,
    ) -> Result<R, ViewError> {
        let typed = self
            .get_mut(id)?
            .as_any_mut()
            .downcast_mut::<V>()
            .ok_or(ViewError::TypeMismatch {
                id,
                expected: std::any::type_name::<V>(),
            })?;
        Ok(f(typed))
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.entry(id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attaches `child` under `parent` at `index`, clamped to the number of
    /// children the parent has once `child` has left its previous parent.
    pub fn insert_child(
        &mut self,
        parent: ViewId,
        index: usize,
        child: ViewId,
    ) -> Result<(), ViewError> {
        self.entry(parent)?;
        self.entry(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(ViewError::InvalidHierarchy { parent, child });
        }

        self.unlink(child)?;
        let siblings = &mut self.entry_mut(parent)?.children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);

        let entry = self.entry_mut(child)?;
        entry.parent = Some(parent);
        entry.view.attached();
        Ok(())
    }

    /// Destroys `id` and its whole subtree.
    pub fn remove(&mut self, id: ViewId) -> Result<(), ViewError> {
        let mut doomed = vec![id];
        walk_subviews(&*self, id, |child| doomed.push(child))?;
        self.unlink(id)?;
        for view_id in doomed {
            if let Some(slot) = self.entries.get_mut(view_id) {
                slot.take();
            }
        }
        Ok(())
    }

    pub fn dump_tree(&self, root: Option<ViewId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_view(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_view(&self, output: &mut String, id: ViewId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.entry(id) {
            Ok(entry) => {
                output.push_str(&format!(
                    "{}[{}] {} tag={}\n",
                    indent,
                    id,
                    entry.view.debug_name(),
                    entry.tag
                ));
                for child_id in &entry.children {
                    self.dump_view(output, *child_id, depth + 1);
                }
            }
            Err(_) => output.push_str(&format!("{}[{}] (missing)\n", indent, id)),
        }
    }

    fn is_ancestor_or_self(&self, ancestor: ViewId, id: ViewId) -> bool {
        let mut current = Some(id);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.entry(candidate).ok().and_then(|entry| entry.parent);
        }
        false
    }

    /// Clears the parent link of `id` on both sides and returns the former
    /// parent. Hooks are left to the caller.
    fn unlink(&mut self, id: ViewId) -> Result<Option<ViewId>, ViewError> {
        let parent = self.entry_mut(id)?.parent.take();
        if let Some(parent_id) = parent {
            if let Ok(parent_entry) = self.entry_mut(parent_id) {
                parent_entry.children.retain(|candidate| *candidate != id);
            }
        }
        Ok(parent)
    }
}

impl ViewTree for MemoryViewTree {
    fn create(&mut self, view: Box<dyn View>) -> ViewId {
        let id = self.entries.len();
        self.entries.push(Some(ViewEntry {
            view,
            tag: UNTAGGED,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    fn get(&self, id: ViewId) -> Result<&(dyn View + 'static), ViewError> {
        Ok(self.entry(id)?.view.as_ref())
    }

    fn get_mut(&mut self, id: ViewId) -> Result<&mut (dyn View + 'static), ViewError> {
        Ok(self.entry_mut(id)?.view.as_mut())
    }

    fn tag(&self, id: ViewId) -> Result<Tag, ViewError> {
        Ok(self.entry(id)?.tag)
    }

    fn set_tag(&mut self, id: ViewId, tag: Tag) -> Result<(), ViewError> {
        self.entry_mut(id)?.tag = tag;
        Ok(())
    }

    fn children(&self, id: ViewId) -> Result<Vec<ViewId>, ViewError> {
        Ok(self.entry(id)?.children.clone())
    }

    fn parent(&self, id: ViewId) -> Result<Option<ViewId>, ViewError> {
        Ok(self.entry(id)?.parent)
    }

    fn append_child(&mut self, parent: ViewId, child: ViewId) -> Result<(), ViewError> {
        self.insert_child(parent, usize::MAX, child)
    }

    fn remove_from_parent(&mut self, id: ViewId) -> Result<(), ViewError> {
        if self.unlink(id)?.is_some() {
            self.entry_mut(id)?.view.detached();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Panel;

    impl View for Panel {}

    #[derive(Default)]
    struct Label {
        text: String,
        attach_count: usize,
        detach_count: usize,
    }

    impl View for Label {
        fn attached(&mut self) {
            self.attach_count += 1;
        }

        fn detached(&mut self) {
            self.detach_count += 1;
        }
    }

    #[test]
    fn created_views_start_untagged_and_detached() {
        let mut tree = MemoryViewTree::new();
        let id = tree.create(Box::new(Panel));

        assert_eq!(tree.tag(id), Ok(UNTAGGED));
        assert_eq!(tree.parent(id), Ok(None));
        assert_eq!(tree.children(id), Ok(Vec::new()));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn removing_every_view_empties_the_tree() {
        let mut tree = MemoryViewTree::new();
        assert!(tree.is_empty());

        let root = tree.create(Box::new(Panel));
        let child = tree.create(Box::new(Panel));
        tree.append_child(root, child).expect("append");
        assert!(!tree.is_empty());

        tree.remove(root).expect("remove");
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn append_and_detach_update_both_sides() {
        let mut tree = MemoryViewTree::new();
        let root = tree.create(Box::new(Panel));
        let label = tree.create(Box::new(Label::default()));

        tree.append_child(root, label).expect("append");
        assert_eq!(tree.parent(label), Ok(Some(root)));
        assert_eq!(tree.children(root), Ok(vec![label]));

        tree.remove_from_parent(label).expect("detach");
        assert_eq!(tree.parent(label), Ok(None));
        assert_eq!(tree.children(root), Ok(Vec::new()));
        assert!(tree.contains(label));

        let (attached, detached) = tree
            .with_view::<Label, _>(label, |view| (view.attach_count, view.detach_count))
            .expect("label");
        assert_eq!((attached, detached), (1, 1));
    }

    #[test]
    fn detaching_a_parentless_view_is_a_no_op() {
        let mut tree = MemoryViewTree::new();
        let label = tree.create(Box::new(Label::default()));

        tree.remove_from_parent(label).expect("detach");

        let detached = tree
            .with_view::<Label, _>(label, |view| view.detach_count)
            .expect("label");
        assert_eq!(detached, 0);
    }

    #[test]
    fn appending_moves_view_between_parents() {
        let mut tree = MemoryViewTree::new();
        let first = tree.create(Box::new(Panel));
        let second = tree.create(Box::new(Panel));
        let label = tree.create(Box::new(Label::default()));

        tree.append_child(first, label).expect("append");
        tree.append_child(second, label).expect("move");

        assert_eq!(tree.children(first), Ok(Vec::new()));
        assert_eq!(tree.children(second), Ok(vec![label]));
        assert_eq!(tree.parent(label), Ok(Some(second)));
    }

    #[test]
    fn insert_child_clamps_index() {
        let mut tree = MemoryViewTree::new();
        let root = tree.create(Box::new(Panel));
        let a = tree.create(Box::new(Panel));
        let b = tree.create(Box::new(Panel));
        let c = tree.create(Box::new(Panel));

        tree.insert_child(root, 5, a).expect("insert a");
        tree.insert_child(root, 0, b).expect("insert b");
        tree.insert_child(root, 1, c).expect("insert c");

        assert_eq!(tree.children(root), Ok(vec![b, c, a]));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut tree = MemoryViewTree::new();
        let root = tree.create(Box::new(Panel));
        let child = tree.create(Box::new(Panel));
        tree.append_child(root, child).expect("append");

        assert_eq!(
            tree.append_child(child, root),
            Err(ViewError::InvalidHierarchy {
                parent: child,
                child: root
            })
        );
        assert_eq!(
            tree.append_child(root, root),
            Err(ViewError::InvalidHierarchy {
                parent: root,
                child: root
            })
        );
    }

    #[test]
    fn remove_destroys_subtree() {
        let mut tree = MemoryViewTree::new();
        let root = tree.create(Box::new(Panel));
        let child = tree.create(Box::new(Panel));
        let grandchild = tree.create(Box::new(Label::default()));
        tree.append_child(root, child).expect("append child");
        tree.append_child(child, grandchild).expect("append grandchild");

        tree.remove(child).expect("remove");

        assert!(!tree.contains(child));
        assert!(!tree.contains(grandchild));
        assert_eq!(tree.children(root), Ok(Vec::new()));
        assert_eq!(tree.tag(grandchild), Err(ViewError::Missing { id: grandchild }));
    }

    #[test]
    fn with_view_reports_type_mismatch() {
        let mut tree = MemoryViewTree::new();
        let panel = tree.create(Box::new(Panel));

        let result = tree.with_view::<Label, _>(panel, |label| label.text.clone());

        assert_eq!(
            result,
            Err(ViewError::TypeMismatch {
                id: panel,
                expected: std::any::type_name::<Label>(),
            })
        );
    }

    #[test]
    fn dump_tree_lists_tags() {
        let mut tree = MemoryViewTree::new();
        let root = tree.create(Box::new(Panel));
        let label = tree.create(Box::new(Label::default()));
        tree.set_tag(label, 7).expect("tag");
        tree.append_child(root, label).expect("append");

        let dump = tree.dump_tree(Some(root));

        assert!(dump.starts_with(&format!("[{root}] ")));
        assert!(dump.contains(&format!("  [{label}] ")));
        assert!(dump.contains("Label tag=7"));
        assert_eq!(tree.dump_tree(None), "(no root)\n");
    }

    #[test]
    fn errors_render_ids() {
        assert_eq!(ViewError::Missing { id: 4 }.to_string(), "view 4 missing");
        assert_eq!(
            ViewError::TypeMismatch {
                id: 2,
                expected: "Label"
            }
            .to_string(),
            "view 2 type mismatch; expected Label"
        );
    }
}
