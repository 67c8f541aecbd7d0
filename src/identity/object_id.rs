//! Stable 128-bit object identity.
//!
//! Grounded on `original_source/include/igesio/common/id_generator.h`:
//! an `ObjectID` is a pair of 64-bit words (`prefix`, `suffix`) rather
//! than one `u128`, because callers read the suffix's sub-fields
//! (entity type, sequence number, timestamp, random bits) far more
//! often than they treat the ID as a single scalar — see
//! `DESIGN.md` / `SPEC_FULL.md` Open Question 1.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The kind of object an [`ObjectID`] was minted for.
///
/// Mirrors `original_source`'s `ObjectType` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ObjectKind {
    /// An entity constructed from a Directory-Entry/Parameter-Data
    /// pair read out of an IGES file.
    EntityFromIges = 1,
    /// An entity created programmatically, with no IGES provenance.
    EntityNew = 2,
    /// A graphics-only auxiliary object (e.g. a display list entry).
    EntityGraphics = 3,
    /// The root object representing one IGES file / model.
    IgesData = 4,
    /// A group of models treated as one unit.
    Assembly = 5,
}

/// A stable, process-wide unique identifier.
///
/// Two IDs are equal iff both 64-bit words are equal. `ObjectID::unset()`
/// is the sentinel "no reference" value (`prefix == 0 && suffix == 0`);
/// no generated ID ever equals it because `prefix` always carries a
/// nonzero [`ObjectKind`] tag in its low byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectID {
    prefix: u64,
    suffix: u64,
}

impl ObjectID {
    pub(crate) fn new(prefix: u64, suffix: u64) -> Self {
        Self { prefix, suffix }
    }

    /// The sentinel "no reference" value.
    pub const fn unset() -> Self {
        Self { prefix: 0, suffix: 0 }
    }

    /// Whether this is a real, generated ID (as opposed to the unset
    /// sentinel).
    pub fn is_set(&self) -> bool {
        *self != Self::unset()
    }

    /// The raw prefix word.
    pub fn prefix(&self) -> u64 {
        self.prefix
    }

    /// The raw suffix word.
    pub fn suffix(&self) -> u64 {
        self.suffix
    }

    /// The object kind encoded in the low byte of the prefix. `None`
    /// for the unset sentinel or a value produced outside this crate.
    pub fn kind(&self) -> Option<ObjectKind> {
        match self.prefix & 0xff {
            1 => Some(ObjectKind::EntityFromIges),
            2 => Some(ObjectKind::EntityNew),
            3 => Some(ObjectKind::EntityGraphics),
            4 => Some(ObjectKind::IgesData),
            5 => Some(ObjectKind::Assembly),
            _ => None,
        }
    }

    /// For `EntityFromIges`: the owning model's small integer ID.
    /// Packed into the high 56 bits of `prefix`.
    pub fn iges_model_id(&self) -> Option<i32> {
        match self.kind()? {
            ObjectKind::EntityFromIges => Some(((self.prefix >> 8) & 0xffff_ffff) as i32),
            _ => None,
        }
    }

    /// For `EntityFromIges`: the source Directory-Entry sequence
    /// number. Packed into the remaining bits of `prefix`.
    pub fn de_sequence_number(&self) -> Option<u32> {
        match self.kind()? {
            ObjectKind::EntityFromIges => Some((self.prefix >> 40) as u32),
            _ => None,
        }
    }

    /// For entity kinds (`EntityFromIges`, `EntityNew`,
    /// `EntityGraphics`): the IGES entity-type number, packed into the
    /// top 16 bits of `suffix`.
    pub fn entity_type(&self) -> Option<u16> {
        match self.kind()? {
            ObjectKind::EntityFromIges | ObjectKind::EntityNew | ObjectKind::EntityGraphics => {
                Some((self.suffix >> 48) as u16)
            }
            _ => None,
        }
    }

    /// UTC creation timestamp in milliseconds since the epoch, packed
    /// into the middle 40 bits of `suffix`.
    pub fn timestamp_millis(&self) -> i64 {
        ((self.suffix >> 8) & 0xff_ffff_ffff) as i64
    }

    fn pack_suffix(entity_type: Option<u16>, timestamp_millis: i64, random: u8) -> u64 {
        let ty = entity_type.unwrap_or(0) as u64;
        let ts = (timestamp_millis as u64) & 0xff_ffff_ffff;
        (ty << 48) | (ts << 8) | (random as u64)
    }

    pub(crate) fn for_entity_from_iges(
        iges_model_id: i32,
        de_sequence_number: u32,
        entity_type: u16,
    ) -> Self {
        let prefix = (ObjectKind::EntityFromIges as u64)
            | ((iges_model_id as u32 as u64) << 8)
            | ((de_sequence_number as u64) << 40);
        let now = Utc::now().timestamp_millis();
        let suffix = Self::pack_suffix(Some(entity_type), now, 0);
        Self::new(prefix, suffix)
    }

    pub(crate) fn for_entity_new(entity_type: u16, random: u8) -> Self {
        let prefix = ObjectKind::EntityNew as u64;
        let now = Utc::now().timestamp_millis();
        let suffix = Self::pack_suffix(Some(entity_type), now, random);
        Self::new(prefix, suffix)
    }

    pub(crate) fn for_entity_graphics(entity_type: u16, random: u8) -> Self {
        let prefix = ObjectKind::EntityGraphics as u64;
        let now = Utc::now().timestamp_millis();
        let suffix = Self::pack_suffix(Some(entity_type), now, random);
        Self::new(prefix, suffix)
    }

    pub(crate) fn for_iges_data(random: u8) -> Self {
        let prefix = ObjectKind::IgesData as u64;
        let now = Utc::now().timestamp_millis();
        let suffix = Self::pack_suffix(None, now, random);
        Self::new(prefix, suffix)
    }

    pub(crate) fn for_assembly(random: u8) -> Self {
        let prefix = ObjectKind::Assembly as u64;
        let now = Utc::now().timestamp_millis();
        let suffix = Self::pack_suffix(None, now, random);
        Self::new(prefix, suffix)
    }
}

impl Default for ObjectID {
    fn default() -> Self {
        Self::unset()
    }
}

impl fmt::Display for ObjectID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_set() {
            return write!(f, "ObjectID(unset)");
        }
        match self.kind() {
            Some(ObjectKind::EntityFromIges) => write!(
                f,
                "ObjectID(iges-entity model={} de_seq={} type={})",
                self.iges_model_id().unwrap_or_default(),
                self.de_sequence_number().unwrap_or_default(),
                self.entity_type().unwrap_or_default(),
            ),
            Some(ObjectKind::EntityNew) | Some(ObjectKind::EntityGraphics) => write!(
                f,
                "ObjectID(entity type={} ts={})",
                self.entity_type().unwrap_or_default(),
                self.timestamp_millis(),
            ),
            _ => write!(f, "ObjectID(data ts={})", self.timestamp_millis()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_is_not_set() {
        assert!(!ObjectID::unset().is_set());
    }

    #[test]
    fn entity_from_iges_roundtrips_fields() {
        let id = ObjectID::for_entity_from_iges(3, 17, 126);
        assert_eq!(id.kind(), Some(ObjectKind::EntityFromIges));
        assert_eq!(id.iges_model_id(), Some(3));
        assert_eq!(id.de_sequence_number(), Some(17));
        assert_eq!(id.entity_type(), Some(126));
    }

    #[test]
    fn equality_is_word_equality() {
        let a = ObjectID::new(1, 2);
        let b = ObjectID::new(1, 2);
        let c = ObjectID::new(1, 3);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
