use viewkit_core::{walk_subviews, MemoryViewTree, Tag, View, ViewId, ViewRecycler, ViewTree};

/// Container view with no state of its own.
#[derive(Debug, Default)]
pub struct PlainView;

impl View for PlainView {}

#[derive(Debug, Default)]
pub struct LabelView {
    pub text: String,
}

impl View for LabelView {}

#[derive(Debug, Default)]
pub struct ImageView {
    pub source: Option<String>,
}

impl View for ImageView {}

/// View that counts how often the tree attached and detached it.
#[derive(Debug, Default)]
pub struct LifecycleView {
    pub attached: usize,
    pub detached: usize,
}

impl View for LifecycleView {
    fn attached(&mut self) {
        self.attached += 1;
    }

    fn detached(&mut self) {
        self.detached += 1;
    }
}

/// A [`MemoryViewTree`] with a fixed root, plus shortcuts for building and
/// inspecting hierarchies in tests.
pub struct TestTree {
    tree: MemoryViewTree,
    root: ViewId,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    pub fn new() -> Self {
        let mut tree = MemoryViewTree::new();
        let root = tree.create(Box::new(PlainView));
        Self { tree, root }
    }

    pub fn root(&self) -> ViewId {
        self.root
    }

    pub fn tree(&self) -> &MemoryViewTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut MemoryViewTree {
        &mut self.tree
    }

    /// Creates a default `V` tagged with `tag` and appends it to `parent`.
    pub fn add<V: View + Default>(&mut self, parent: ViewId, tag: Tag) -> ViewId {
        let id = self.tree.create(Box::new(V::default()));
        self.tree.set_tag(id, tag).expect("new view must accept a tag");
        self.tree
            .append_child(parent, id)
            .expect("parent must exist in the test tree");
        id
    }

    pub fn add_to_root<V: View + Default>(&mut self, tag: Tag) -> ViewId {
        let root = self.root;
        self.add::<V>(root, tag)
    }

    /// Seeds a recycler from the current subviews of the root.
    pub fn recycler(&self) -> ViewRecycler {
        ViewRecycler::new(&self.tree, Some(self.root))
    }

    pub fn parent_of(&self, id: ViewId) -> Option<ViewId> {
        self.tree.parent(id).expect("view must exist in the test tree")
    }

    pub fn children_of(&self, id: ViewId) -> Vec<ViewId> {
        self.tree
            .children(id)
            .expect("view must exist in the test tree")
    }

    pub fn tag_of(&self, id: ViewId) -> Tag {
        self.tree.tag(id).expect("view must exist in the test tree")
    }

    pub fn is_attached(&self, id: ViewId) -> bool {
        self.parent_of(id).is_some()
    }

    /// Pre-order `(id, tag)` pairs for every view under the root.
    pub fn snapshot(&self) -> Vec<(ViewId, Tag)> {
        let mut views = Vec::new();
        walk_subviews(&self.tree, self.root, |id| views.push(id))
            .expect("root must exist in the test tree");
        views.into_iter().map(|id| (id, self.tag_of(id))).collect()
    }

    /// Tags of every view under the root, in pre-order.
    pub fn tags(&self) -> Vec<Tag> {
        self.snapshot().into_iter().map(|(_, tag)| tag).collect()
    }

    pub fn dump(&self) -> String {
        self.tree.dump_tree(Some(self.root))
    }

    pub fn assert_attached(&self, id: ViewId) {
        assert!(
            self.is_attached(id),
            "expected view {id} to be attached\n{}",
            self.dump()
        );
    }

    pub fn assert_detached(&self, id: ViewId) {
        assert!(
            !self.is_attached(id),
            "expected view {id} to be detached\n{}",
            self.dump()
        );
    }
}
