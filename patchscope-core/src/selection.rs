//! Selection protocol between the patch list and the presentation layer.
//!
//! The presentation layer owns the selection. These helpers only compare it
//! against the current patches and forward user picks upward; nothing here
//! stores or mutates a selection.
//!
//! Patches are correlated by new-file path. Descriptors are recreated on every
//! load, so identity would not survive moving to another commit, while the
//! path does. If two patches ever share a new path, the first one wins.

use crate::types::PatchDescriptor;

/// One row of the patch list as the presentation layer renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchRow<'a> {
    pub patch: &'a PatchDescriptor,
    pub is_selected: bool,
}

/// Whether `patch` is the selection target described by `selected`.
pub fn is_selected(patch: &PatchDescriptor, selected: Option<&PatchDescriptor>) -> bool {
    selected.is_some_and(|s| s.new_path() == patch.new_path())
}

/// Pairs each patch with its selection flag, in list order.
///
/// At most one row is flagged even if paths repeat.
pub fn mark_selection<'a>(
    patches: &'a [PatchDescriptor],
    selected: Option<&PatchDescriptor>,
) -> Vec<PatchRow<'a>> {
    let hit = find_selected(patches, selected);
    patches
        .iter()
        .enumerate()
        .map(|(i, patch)| PatchRow { patch, is_selected: hit == Some(i) })
        .collect()
}

/// Index of the row correlated with `selected`, if any.
pub fn find_selected(
    patches: &[PatchDescriptor],
    selected: Option<&PatchDescriptor>,
) -> Option<usize> {
    patches.iter().position(|p| is_selected(p, selected))
}

/// Forwards a user pick of row `index` to `on_patch_select`.
///
/// Out-of-range indices are ignored. Returns whether the callback ran.
pub fn report_selection<F>(patches: &[PatchDescriptor], index: usize, on_patch_select: F) -> bool
where
    F: FnOnce(&PatchDescriptor),
{
    match patches.get(index) {
        Some(patch) => {
            on_patch_select(patch);
            true
        }
        None => false,
    }
}
