//! Memory layout of the entity table and entity records
//!
//! This module centralizes every offset used to read entities out of the
//! target process. The offsets only hold for one build of the game, so they
//! are plain data (`TableLayout`, `EntityLayout`) that the config file can
//! replace without touching the readers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::error::{Error, Result};

/// Lowest address a game pointer may hold. Anything below is the
/// never-mapped low-memory region.
pub const GUARD_THRESHOLD: u64 = 0x10000;

/// Positions with any component at or beyond this magnitude are garbage reads.
pub const POSITION_BOUND: f32 = 1_000_000.0;

/// Default cap for string reads
pub const DEFAULT_STRING_LEN: usize = 50;

/// Check whether a dereferenced value looks like a usable pointer.
pub fn is_plausible_pointer(value: u64) -> bool {
    value != 0 && value >= GUARD_THRESHOLD
}

/// Parse a hex address string (with or without 0x prefix)
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u64::from_str_radix(digits, 16)
        .map_err(|e| Error::Config(format!("Invalid hex address '{}': {}", s, e)))
}

/// Entity table constants
pub mod table {
    /// Module-relative offset of the pointer to the entity table
    pub const BASE_OFFSET: u64 = 0x01E7_AF20;
    /// Distance between consecutive slots
    pub const STRIDE: u64 = 0x18;
    /// Hard cap on slots walked per scan
    pub const MAX_ENTRIES: usize = 100;
    /// Valid slots required before a gap is treated as the end of the table
    pub const MIN_VALID_BEFORE_STOP: usize = 10;
}

/// Entity record offsets
pub mod entity {
    pub const CLASS_NAME_PTR: u64 = 0x18;
    pub const CLASS_NAME_VALUE: u64 = 0xA4;
    pub const INSTANCE_NAME_PTR: u64 = 0x08;
    pub const INSTANCE_NAME_VALUE: u64 = 0x00;

    pub const HEALTH: u64 = 0x8C4;

    pub const POS_X: u64 = 0x6C8;
    pub const POS_Y: u64 = 0x6CC;
    pub const POS_Z: u64 = 0x6D0;

    // cos and sin are not adjacent
    pub const ROT_COS: u64 = 0x6D4;
    pub const ROT_SIN: u64 = 0x6E0;

    pub const ALERTNESS: u64 = 0xF44;
}

/// Location of the entity table inside the main module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLayout {
    #[serde(with = "hex_offset")]
    pub base_offset: u64,
    #[serde(with = "hex_offset")]
    pub stride: u64,
    pub max_entries: usize,
    pub min_valid_before_stop: usize,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            base_offset: table::BASE_OFFSET,
            stride: table::STRIDE,
            max_entries: table::MAX_ENTRIES,
            min_valid_before_stop: table::MIN_VALID_BEFORE_STOP,
        }
    }
}

impl TableLayout {
    /// Address of the `index`-th slot for a table starting at `table_base`
    pub fn slot_address(&self, table_base: u64, index: usize) -> u64 {
        table_base.wrapping_add(index as u64 * self.stride)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stride == 0 {
            return Err(Error::Config("table stride must be non-zero".into()));
        }
        if self.max_entries == 0 {
            return Err(Error::Config("table max_entries must be non-zero".into()));
        }
        Ok(())
    }
}

/// How a field's address is derived from the entity address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Resolution {
    /// `entity + offset`
    Direct {
        #[serde(with = "hex_offset")]
        offset: u64,
    },
    /// `*(entity + pointer_offset) + value_offset`
    Indirect {
        #[serde(with = "hex_offset")]
        pointer_offset: u64,
        #[serde(with = "hex_offset")]
        value_offset: u64,
    },
}

/// Primitive stored at a field's address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldKind {
    /// 32-bit float
    Float,
    /// 16-bit signed integer
    Short,
    /// NUL-terminated string, bounded by `EntityLayout::string_max_len`
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub resolution: Resolution,
}

impl FieldSpec {
    pub const fn direct(offset: u64, kind: FieldKind) -> Self {
        Self {
            resolution: Resolution::Direct { offset },
            kind,
        }
    }

    pub const fn indirect(pointer_offset: u64, value_offset: u64, kind: FieldKind) -> Self {
        Self {
            resolution: Resolution::Indirect {
                pointer_offset,
                value_offset,
            },
            kind,
        }
    }
}

/// Logical fields of an entity record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum EntityField {
    ClassName,
    InstanceName,
    Health,
    X,
    Y,
    Z,
    RotCos,
    RotSin,
    Alertness,
}

impl EntityField {
    /// The primitive the decoder expects for this field
    pub fn expected_kind(self) -> FieldKind {
        match self {
            Self::ClassName | Self::InstanceName => FieldKind::String,
            Self::Alertness => FieldKind::Short,
            _ => FieldKind::Float,
        }
    }
}

/// Field table for one entity record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityLayout {
    pub string_max_len: usize,
    pub class_name: FieldSpec,
    pub instance_name: FieldSpec,
    pub health: FieldSpec,
    pub x: FieldSpec,
    pub y: FieldSpec,
    pub z: FieldSpec,
    pub rot_cos: FieldSpec,
    pub rot_sin: FieldSpec,
    pub alertness: FieldSpec,
}

impl Default for EntityLayout {
    fn default() -> Self {
        use FieldKind::{Float, Short, String};

        Self {
            string_max_len: DEFAULT_STRING_LEN,
            class_name: FieldSpec::indirect(entity::CLASS_NAME_PTR, entity::CLASS_NAME_VALUE, String),
            instance_name: FieldSpec::indirect(
                entity::INSTANCE_NAME_PTR,
                entity::INSTANCE_NAME_VALUE,
                String,
            ),
            health: FieldSpec::direct(entity::HEALTH, Float),
            x: FieldSpec::direct(entity::POS_X, Float),
            y: FieldSpec::direct(entity::POS_Y, Float),
            z: FieldSpec::direct(entity::POS_Z, Float),
            rot_cos: FieldSpec::direct(entity::ROT_COS, Float),
            rot_sin: FieldSpec::direct(entity::ROT_SIN, Float),
            alertness: FieldSpec::direct(entity::ALERTNESS, Short),
        }
    }
}

impl EntityLayout {
    /// Look up the spec of a logical field
    pub fn spec(&self, field: EntityField) -> &FieldSpec {
        match field {
            EntityField::ClassName => &self.class_name,
            EntityField::InstanceName => &self.instance_name,
            EntityField::Health => &self.health,
            EntityField::X => &self.x,
            EntityField::Y => &self.y,
            EntityField::Z => &self.z,
            EntityField::RotCos => &self.rot_cos,
            EntityField::RotSin => &self.rot_sin,
            EntityField::Alertness => &self.alertness,
        }
    }

    /// Reject layouts whose field kinds the decoder cannot interpret
    pub fn validate(&self) -> Result<()> {
        use strum::IntoEnumIterator;

        if self.string_max_len == 0 {
            return Err(Error::Config("string_max_len must be non-zero".into()));
        }

        for field in EntityField::iter() {
            let kind = self.spec(field).kind;
            if kind != field.expected_kind() {
                return Err(Error::Config(format!(
                    "field '{}' must be of kind '{}', got '{}'",
                    field,
                    field.expected_kind(),
                    kind
                )));
            }
        }
        Ok(())
    }
}

/// Offsets serialize as `"0x..."` strings and accept either hex strings or integers.
mod hex_offset {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{:X}", value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Int(value) => Ok(value),
            Raw::Text(text) => super::parse_hex_address(&text).map_err(D::Error::custom),
        }
    }
}
