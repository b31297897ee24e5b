//! Content registry: immutable block and item descriptors referenced by
//! stable numeric ids.
//!
//! Content is loaded from JSON catalogs. The builtin catalog is embedded in
//! the crate; additional catalogs (fixtures, mods) can be appended through
//! [`ContentRegistry::load_catalog_from_str`].

use std::fmt;

use bevy::prelude::Resource;
use bitflags::bitflags;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Builtin content catalog shipped with the crate.
pub const BUILTIN_BLOCK_CATALOG: &str = include_str!("data/block_catalog.json");

/// Identifier for a registered item type (ore yields and the like).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u16);

impl ItemId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a registered block type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u16);

impl BlockId {
    /// The empty block; every catalog must register it first.
    pub const AIR: BlockId = BlockId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    /// Capability tags declared by block types. Single-bit values double as
    /// query keys for the per-chunk flag sets.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct BlockFlags: u32 {
        const CORE = 1 << 0;
        const STORAGE = 1 << 1;
        const GENERATOR = 1 << 2;
        const BATTERY = 1 << 3;
        const TURRET = 1 << 4;
        const FACTORY = 1 << 5;
        const REPAIR = 1 << 6;
        const EXTRACTOR = 1 << 7;
    }
}

/// Immutable descriptor for a resource item.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
}

/// Immutable descriptor for a block type.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub name: String,
    pub flags: BlockFlags,
    /// Contribution to the owning team's aggregate unit cap while placed.
    pub unit_cap_modifier: i32,
    /// Edge length in tiles; blocks larger than 1 occupy a square footprint.
    pub size: u8,
    pub rotate: bool,
    /// Item yielded when this block is used as a tile overlay (ore deposits).
    pub item_drop: Option<ItemId>,
    /// Whether placing this block creates mutable build state on the tile.
    /// False for air and floor-type blocks.
    pub has_building: bool,
}

#[derive(Debug, Error)]
pub enum ContentCatalogError {
    #[error("failed to parse content catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("item id {id} arrived out of sequence (expected {expected})")]
    ItemIdOutOfSequence { id: u16, expected: u16 },
    #[error("block id {id} arrived out of sequence (expected {expected})")]
    BlockIdOutOfSequence { id: u16, expected: u16 },
    #[error("unknown capability flag '{flag}' in block '{block}'")]
    UnknownFlag { block: String, flag: String },
    #[error("block '{block}' drops unknown item '{item}'")]
    UnknownItemDrop { block: String, item: String },
}

#[derive(Debug, Clone, Deserialize)]
struct ItemCatalogEntry {
    id: u16,
    name: String,
}

fn default_block_size() -> u8 {
    1
}

#[derive(Debug, Clone, Deserialize)]
struct BlockCatalogEntry {
    id: u16,
    name: String,
    #[serde(default)]
    flags: Vec<String>,
    #[serde(default)]
    unit_cap_modifier: i32,
    #[serde(default = "default_block_size")]
    size: u8,
    #[serde(default)]
    rotate: bool,
    #[serde(default)]
    item_drop: Option<String>,
    #[serde(default)]
    building: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentCatalog {
    #[serde(default)]
    items: Vec<ItemCatalogEntry>,
    #[serde(default)]
    blocks: Vec<BlockCatalogEntry>,
}

fn parse_flag(block: &str, flag: &str) -> Result<BlockFlags, ContentCatalogError> {
    match flag {
        "core" => Ok(BlockFlags::CORE),
        "storage" => Ok(BlockFlags::STORAGE),
        "generator" => Ok(BlockFlags::GENERATOR),
        "battery" => Ok(BlockFlags::BATTERY),
        "turret" => Ok(BlockFlags::TURRET),
        "factory" => Ok(BlockFlags::FACTORY),
        "repair" => Ok(BlockFlags::REPAIR),
        "extractor" => Ok(BlockFlags::EXTRACTOR),
        other => Err(ContentCatalogError::UnknownFlag {
            block: block.to_string(),
            flag: other.to_string(),
        }),
    }
}

/// Registry of blocks and items recognised by the simulation, indexable by
/// their stable numeric ids.
#[derive(Resource, Debug, Clone, Default)]
pub struct ContentRegistry {
    items: Vec<Item>,
    blocks: Vec<Block>,
}

impl ContentRegistry {
    /// Registry populated from the embedded builtin catalog.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        let added = registry
            .load_catalog_from_str(BUILTIN_BLOCK_CATALOG)
            .expect("builtin block catalog should parse");
        info!(
            entries = added,
            items = registry.items.len(),
            blocks = registry.blocks.len(),
            "loaded builtin content catalog"
        );
        registry
    }

    /// Appends the items and blocks defined in a JSON catalog.
    ///
    /// Ids must continue the registry's current sequences so that presence
    /// tables can stay densely keyed. Returns the number of entries added.
    pub fn load_catalog_from_str(
        &mut self,
        catalog: &str,
    ) -> Result<usize, ContentCatalogError> {
        let parsed: ContentCatalog = serde_json::from_str(catalog)?;
        let mut added = 0;

        for entry in parsed.items {
            let expected = self.items.len() as u16;
            if entry.id != expected {
                return Err(ContentCatalogError::ItemIdOutOfSequence {
                    id: entry.id,
                    expected,
                });
            }
            self.items.push(Item {
                id: ItemId(entry.id),
                name: entry.name,
            });
            added += 1;
        }

        for entry in parsed.blocks {
            let expected = self.blocks.len() as u16;
            if entry.id != expected {
                return Err(ContentCatalogError::BlockIdOutOfSequence {
                    id: entry.id,
                    expected,
                });
            }
            let mut flags = BlockFlags::empty();
            for flag in &entry.flags {
                flags |= parse_flag(&entry.name, flag)?;
            }
            let item_drop = match &entry.item_drop {
                Some(item) => Some(
                    self.item_by_name(item)
                        .ok_or_else(|| ContentCatalogError::UnknownItemDrop {
                            block: entry.name.clone(),
                            item: item.clone(),
                        })?
                        .id,
                ),
                None => None,
            };
            self.blocks.push(Block {
                id: BlockId(entry.id),
                name: entry.name,
                flags,
                unit_cap_modifier: entry.unit_cap_modifier,
                size: entry.size,
                rotate: entry.rotate,
                item_drop,
                has_building: entry.building,
            });
            added += 1;
        }

        Ok(added)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.index())
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    pub fn item_by_name(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn block_by_name(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.name == name)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }
}
