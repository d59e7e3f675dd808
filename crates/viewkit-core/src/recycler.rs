//! Tag-based view recycling for a single layout pass.
//!
//! A [`ViewRecycler`] is seeded from every subview of a root view. Subviews
//! with a non-zero tag are indexed by that tag and can be handed back by
//! [`ViewRecycler::make_view`]; untagged subviews are only tracked so that
//! [`ViewRecycler::purge_views`] can detach them. Anything not reclaimed by
//! the end of the pass is detached from its parent.
//!
//! If the source tree holds several views with the same tag, the one visited
//! last in pre-order wins the index entry. The views it shadows can no longer
//! be reclaimed by tag and are purged unless marked as recycled.

use std::fmt;

use crate::collections::map::{HashMap, HashSet}; // FUTURE(no_std): replace HashMap/HashSet with arena-backed maps.
use crate::{walk_subviews, Tag, View, ViewId, ViewTree, UNTAGGED};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecyclerState {
    /// Pools are live; views can be made and released.
    Active,
    /// Leftover views were detached and the pools emptied. Terminal.
    Purged,
}

/// Recycles views by tag during one layout pass.
pub struct ViewRecycler {
    views_by_tag: HashMap<Tag, ViewId>,
    untagged_views: HashSet<ViewId>,
    shadowed_views: HashSet<ViewId>,
    state: RecyclerState,
}

impl fmt::Debug for ViewRecycler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewRecycler")
            .field("views_by_tag", &self.views_by_tag)
            .field("untagged_views", &self.untagged_views)
            .field("shadowed_views", &self.shadowed_views)
            .field("state", &self.state)
            .finish()
    }
}

impl Default for ViewRecycler {
    fn default() -> Self {
        Self {
            views_by_tag: HashMap::new(),
            untagged_views: HashSet::new(),
            shadowed_views: HashSet::new(),
            state: RecyclerState::Active,
        }
    }
}

impl ViewRecycler {
    /// Retains all subviews of `root` for recycling. A missing root yields an
    /// empty recycler.
    pub fn new<A: ViewTree + ?Sized>(tree: &A, root: Option<ViewId>) -> Self {
        let mut recycler = Self::default();
        let Some(root) = root else {
            return recycler;
        };

        let walked = walk_subviews(tree, root, |id| match tree.tag(id) {
            Ok(UNTAGGED) => {
                recycler.untagged_views.insert(id);
            }
            Ok(tag) => {
                if let Some(previous) = recycler.views_by_tag.insert(tag, id) {
                    log::trace!("view {id} shadows view {previous} for tag {tag}");
                    recycler.shadowed_views.insert(previous);
                }
            }
            Err(err) => log::warn!("skipping subview {id}: {err}"),
        });
        if let Err(err) = walked {
            log::warn!("stopped collecting subviews of {root}: {err}");
        }

        log::debug!(
            "recycler seeded from view {root}: {} tagged, {} untagged",
            recycler.views_by_tag.len(),
            recycler.untagged_views.len()
        );
        recycler
    }

    pub fn state(&self) -> RecyclerState {
        self.state
    }

    pub fn is_purged(&self) -> bool {
        self.state == RecyclerState::Purged
    }

    pub fn tagged_count(&self) -> usize {
        self.views_by_tag.len()
    }

    pub fn untagged_count(&self) -> usize {
        self.untagged_views.len()
    }

    /// Returns `true` while `id` would still be detached by the next purge.
    pub fn is_pooled(&self, id: ViewId) -> bool {
        self.untagged_views.contains(&id)
            || self.shadowed_views.contains(&id)
            || self.views_by_tag.values().any(|view| *view == id)
    }

    /// Marks a view as recycled so that [`Self::purge_views`] leaves it in
    /// the hierarchy. Only needed for views reused without going through
    /// [`Self::make_view`]. Views that are not pooled are ignored.
    pub fn mark_view_as_recycled<A: ViewTree + ?Sized>(&mut self, tree: &A, id: ViewId) {
        self.untagged_views.remove(&id);
        self.shadowed_views.remove(&id);
        match tree.tag(id) {
            Ok(tag) if tag != UNTAGGED && self.views_by_tag.get(&tag) == Some(&id) => {
                self.views_by_tag.remove(&tag);
            }
            // Retagged since seeding, or gone from the tree: find it by id.
            _ => self.views_by_tag.retain(|_, view| *view != id),
        }
    }

    /// Recycles the view pooled under `tag` if it is a `T`, otherwise creates
    /// a fresh `T` carrying `tag`.
    ///
    /// A pooled view of another type is left in place and gets purged. Tag
    /// [`UNTAGGED`] never hits the pool. A recycled view that was retagged
    /// since seeding gets `tag` back.
    pub fn make_view<T, A>(&mut self, tree: &mut A, tag: Tag) -> ViewId
    where
        T: View + Default,
        A: ViewTree + ?Sized,
    {
        if let Some(&id) = self.views_by_tag.get(&tag) {
            let reusable = match tree.get(id) {
                Ok(view) if view.as_any().is::<T>() => true,
                Ok(view) => {
                    log::trace!(
                        "tag {tag} holds a {}, not a {}; creating a new view",
                        view.debug_name(),
                        std::any::type_name::<T>()
                    );
                    false
                }
                Err(err) => {
                    log::trace!("pooled view for tag {tag} is unavailable: {err}");
                    false
                }
            };
            if reusable {
                self.views_by_tag.remove(&tag);
                log::trace!("recycled view {id} for tag {tag}");
                if tree.tag(id).ok() != Some(tag) {
                    if let Err(err) = tree.set_tag(id, tag) {
                        log::warn!("failed to restore tag {tag} on view {id}: {err}");
                    }
                }
                return id;
            }
        }

        let id = tree.create(Box::new(T::default()));
        if let Err(err) = tree.set_tag(id, tag) {
            log::warn!("failed to tag new view {id} with {tag}: {err}");
        }
        id
    }

    /// Removes all unrecycled views from the hierarchy and empties the
    /// pools. Detach order is unspecified.
    pub fn purge_views<A: ViewTree + ?Sized>(&mut self, tree: &mut A) {
        let mut purged = 0usize;
        let leftovers = self
            .views_by_tag
            .drain()
            .map(|(_, id)| id)
            .chain(self.untagged_views.drain())
            .chain(self.shadowed_views.drain());
        for id in leftovers {
            match tree.remove_from_parent(id) {
                Ok(()) => purged += 1,
                Err(err) => log::warn!("could not purge view {id}: {err}"),
            }
        }
        if self.state == RecyclerState::Active {
            log::debug!("purged {purged} unrecycled views");
        }
        self.state = RecyclerState::Purged;
    }
}

/// Runs one recycling pass over the subviews of `root`: seeds a recycler,
/// hands it to `layout`, then purges whatever `layout` did not reclaim.
pub fn recycle_views<A, R>(
    tree: &mut A,
    root: Option<ViewId>,
    layout: impl FnOnce(&mut ViewRecycler, &mut A) -> R,
) -> R
where
    A: ViewTree + ?Sized,
{
    let mut recycler = ViewRecycler::new(&*tree, root);
    let result = layout(&mut recycler, &mut *tree);
    recycler.purge_views(tree);
    result
}

#[cfg(test)]
#[path = "tests/recycler_tests.rs"]
mod tests;
