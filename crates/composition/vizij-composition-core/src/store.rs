//! Asset graph store: the project's tree of assets.
//!
//! Folders own their direct children exclusively; moving an asset detaches it
//! from its old parent before attaching it to the new one. A move into a
//! folder that lives inside the moved asset is rejected.

use crate::asset::{Asset, AssetKind};
use crate::error::{CompositionError, Result};
use crate::ids::{AssetId, LayerId};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetStore {
    roots: Vec<Asset>,
}

fn find_in<'a>(list: &'a [Asset], id: &AssetId) -> Option<&'a Asset> {
    for asset in list {
        if &asset.id == id {
            return Some(asset);
        }
        if let Some(found) = find_in(asset.children(), id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(list: &'a mut [Asset], id: &AssetId) -> Option<&'a mut Asset> {
    for asset in list.iter_mut() {
        if &asset.id == id {
            return Some(asset);
        }
        if let AssetKind::Folder { children, .. } = &mut asset.kind {
            if let Some(found) = find_in_mut(children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn detach_from(list: &mut Vec<Asset>, id: &AssetId) -> Option<Asset> {
    if let Some(i) = list.iter().position(|a| &a.id == id) {
        return Some(list.remove(i));
    }
    for asset in list.iter_mut() {
        if let Some(children) = asset.children_mut() {
            if let Some(found) = detach_from(children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn path_in(list: &[Asset], id: &AssetId, path: &mut Vec<AssetId>) -> bool {
    for asset in list {
        path.push(asset.id.clone());
        if &asset.id == id || path_in(asset.children(), id, path) {
            return true;
        }
        path.pop();
    }
    false
}

fn collect_preorder<'a>(list: &'a [Asset], out: &mut Vec<&'a Asset>) {
    for asset in list {
        out.push(asset);
        collect_preorder(asset.children(), out);
    }
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_assets(roots: Vec<Asset>) -> Self {
        Self { roots }
    }

    /// Top-level assets.
    pub fn assets(&self) -> &[Asset] {
        &self.roots
    }

    pub fn into_assets(self) -> Vec<Asset> {
        self.roots
    }

    pub fn find(&self, id: &AssetId) -> Option<&Asset> {
        find_in(&self.roots, id)
    }

    pub fn find_mut(&mut self, id: &AssetId) -> Option<&mut Asset> {
        find_in_mut(&mut self.roots, id)
    }

    pub fn require(&self, id: &AssetId) -> Result<&Asset> {
        self.find(id)
            .ok_or_else(|| CompositionError::AssetNotFound(id.clone()))
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.find(id).is_some()
    }

    /// Ids from the root down to `id` (inclusive).
    pub fn path_to(&self, id: &AssetId) -> Option<Vec<AssetId>> {
        let mut path = Vec::new();
        path_in(&self.roots, id, &mut path).then_some(path)
    }

    /// Every asset, depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        let mut out = Vec::new();
        collect_preorder(&self.roots, &mut out);
        out.into_iter()
    }

    fn folder_children(&mut self, folder: &AssetId) -> Result<&mut Vec<Asset>> {
        let asset = self
            .find_mut(folder)
            .ok_or_else(|| CompositionError::AssetNotFound(folder.clone()))?;
        if let AssetKind::Folder { expanded, .. } = &mut asset.kind {
            *expanded = true;
        }
        asset
            .children_mut()
            .ok_or_else(|| CompositionError::NotAFolder(folder.clone()))
    }

    /// Append `asset` to a folder, or to the root when `parent` is `None`.
    pub fn add(&mut self, asset: Asset, parent: Option<&AssetId>) -> Result<()> {
        match parent {
            None => self.roots.push(asset),
            Some(folder) => self.folder_children(folder)?.push(asset),
        }
        Ok(())
    }

    /// Detach an asset (and its subtree) from wherever it sits.
    pub fn remove(&mut self, id: &AssetId) -> Result<Asset> {
        detach_from(&mut self.roots, id).ok_or_else(|| CompositionError::AssetNotFound(id.clone()))
    }

    /// Relocate an asset under another folder, or to the root with `None`.
    /// Fails with [`CompositionError::Cycle`] if the destination is the asset itself or lies inside it.
    pub fn move_to(&mut self, id: &AssetId, new_parent: Option<&AssetId>) -> Result<()> {
        if !self.contains(id) {
            return Err(CompositionError::AssetNotFound(id.clone()));
        }
        if let Some(dest) = new_parent {
            let chain = self
                .path_to(dest)
                .ok_or_else(|| CompositionError::AssetNotFound(dest.clone()))?;
            if chain.contains(id) {
                log::debug!("rejecting move of asset {id} into {dest}: would form a cycle");
                return Err(CompositionError::Cycle {
                    item: id.to_string(),
                    target: dest.to_string(),
                });
            }
            if !self.find(dest).is_some_and(Asset::is_folder) {
                return Err(CompositionError::NotAFolder(dest.clone()));
            }
        }
        let asset = self.remove(id)?;
        self.add(asset, new_parent)
    }

    /// First composition found depth-first (pre-order).
    pub fn find_first_composition(&self) -> Option<&Asset> {
        self.iter().find(|a| a.as_composition().is_some())
    }

    /// (composition, layer) pairs whose layer shows `asset` as its source or clip.
    pub fn referencing_layers(&self, asset: &AssetId) -> Vec<(AssetId, LayerId)> {
        let mut out = Vec::new();
        for a in self.iter() {
            let Some(comp) = a.as_composition() else {
                continue;
            };
            for layer in comp.layers() {
                let via_clip = layer
                    .animated_layer_fields
                    .as_ref()
                    .is_some_and(|f| &f.clip_asset_id == asset);
                if &layer.source_asset_id == asset || via_clip {
                    out.push((a.id.clone(), layer.id.clone()));
                }
            }
        }
        out
    }
}
