use crate::{ViewError, ViewId, ViewTree};

/// Calls `visitor` for each transitive subview of `root`, in pre-order.
///
/// The root itself is not visited. Siblings are visited in the order the
/// tree reports them from [`ViewTree::children`], so repeated walks over an
/// unchanged tree produce the same sequence.
pub fn walk_subviews<A, F>(tree: &A, root: ViewId, mut visitor: F) -> Result<(), ViewError>
where
    A: ViewTree + ?Sized,
    F: FnMut(ViewId),
{
    let mut pending = tree.children(root)?; // FUTURE(no_std): replace Vec with bounded traversal stack.
    pending.reverse();
    while let Some(id) = pending.pop() {
        visitor(id);
        let children = tree.children(id)?;
        pending.extend(children.into_iter().rev());
    }
    Ok(())
}
