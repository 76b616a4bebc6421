//! Entity record decoder.
//!
//! Every field is read independently through its `FieldSpec`. A failed read
//! only drops that field; the record is dropped when it has no usable
//! ground position.

use tracing::trace;

use crate::entity::{EntityCategory, EntityRecord, Position, classify};
use crate::memory::ReadMemory;
use crate::memory::layout::{
    EntityField, EntityLayout, FieldKind, FieldSpec, Resolution, is_plausible_pointer,
};
use crate::transform::Rotation;

/// A value read through a `FieldSpec`
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f32),
    Short(i16),
    Text(String),
}

impl FieldValue {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Self::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Resolve the address a field lives at, following one pointer for
/// indirect fields. `None` if that pointer is unreadable or implausible.
pub fn resolve_field_address<R: ReadMemory + ?Sized>(
    reader: &R,
    entity: u64,
    resolution: &Resolution,
) -> Option<u64> {
    match *resolution {
        Resolution::Direct { offset } => Some(entity.wrapping_add(offset)),
        Resolution::Indirect {
            pointer_offset,
            value_offset,
        } => {
            let pointer = reader.read_pointer(entity.wrapping_add(pointer_offset)).ok()?;
            is_plausible_pointer(pointer).then(|| pointer.wrapping_add(value_offset))
        }
    }
}

/// Read one field of the entity at `entity`.
pub fn read_field<R: ReadMemory + ?Sized>(
    reader: &R,
    entity: u64,
    spec: &FieldSpec,
    string_max_len: usize,
) -> Option<FieldValue> {
    let address = resolve_field_address(reader, entity, &spec.resolution)?;

    let value = match spec.kind {
        FieldKind::Float => reader.read_f32(address).map(FieldValue::Float),
        FieldKind::Short => reader.read_i16(address).map(FieldValue::Short),
        FieldKind::String => reader
            .read_cstring(address, string_max_len)
            .map(FieldValue::Text),
    };

    value
        .inspect_err(|e| trace!("Field read failed at {:#x}: {}", address, e))
        .ok()
}

pub struct EntityFieldDecoder<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
    layout: &'a EntityLayout,
}

impl<'a, R: ReadMemory + ?Sized> EntityFieldDecoder<'a, R> {
    pub fn new(reader: &'a R, layout: &'a EntityLayout) -> Self {
        Self { reader, layout }
    }

    fn field(&self, address: u64, field: EntityField) -> Option<FieldValue> {
        read_field(
            self.reader,
            address,
            self.layout.spec(field),
            self.layout.string_max_len,
        )
    }

    fn float(&self, address: u64, field: EntityField) -> Option<f32> {
        self.field(address, field).and_then(|v| v.as_f32())
    }

    fn text(&self, address: u64, field: EntityField) -> String {
        self.field(address, field)
            .and_then(FieldValue::into_text)
            .unwrap_or_default()
    }

    /// Decode the entity at `address`.
    ///
    /// Returns `None` if x or y is unreadable or the position is implausible.
    /// The category is left as `Object`; `decode_classified` fills it in.
    pub fn decode(&self, address: u64) -> Option<EntityRecord> {
        if !is_plausible_pointer(address) {
            return None;
        }

        let x = self.float(address, EntityField::X)?;
        let y = self.float(address, EntityField::Y)?;
        let z = self.float(address, EntityField::Z).unwrap_or(0.0);

        let position = Position::new(x, y, z);
        if !position.is_plausible() {
            trace!("Entity {:#x} has implausible position {:?}", address, position);
            return None;
        }

        let rotation = match (
            self.float(address, EntityField::RotCos),
            self.float(address, EntityField::RotSin),
        ) {
            (Some(cos), Some(sin)) => Some(Rotation::new(cos, sin)),
            _ => None,
        }
        .filter(|rotation| {
            let plausible = rotation.is_plausible();
            if !plausible {
                trace!("Entity {:#x} has implausible rotation {:?}", address, rotation);
            }
            plausible
        });

        Some(EntityRecord {
            address,
            position,
            rotation,
            category: EntityCategory::Object,
            health: self.float(address, EntityField::Health).unwrap_or(0.0),
            class_name: self.text(address, EntityField::ClassName),
            instance_name: self.text(address, EntityField::InstanceName),
            alertness: self
                .field(address, EntityField::Alertness)
                .and_then(|v| v.as_i16()),
        })
    }

    /// Decode and classify the entity at `address`.
    pub fn decode_classified(&self, address: u64) -> Option<EntityRecord> {
        let mut record = self.decode(address)?;
        record.category = classify(&record.class_name, &record.instance_name, record.health);
        Some(record)
    }
}
