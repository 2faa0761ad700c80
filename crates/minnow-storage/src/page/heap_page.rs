//! Heap page format for fixed-width tuples.
//!
//! A heap page is a fixed-size block holding as many tuples of one schema
//! as fit, plus an occupancy bitmap with one bit per slot.
//!
//! # Page Layout
//!
//! ```text
//! +----------------------+
//! |  Occupancy bitmap    |  ceil(num_slots / 8) bytes
//! |  bit i = byte i/8,   |  LSB first within each byte
//! |  position i % 8      |
//! +----------------------+
//! |  [slot 0]            |  tuple_size bytes each, fields in
//! |  [slot 1]            |  schema order
//! |    ...               |
//! |  [slot n-1]          |
//! +----------------------+
//! |  zero padding        |  page_size - header - n * tuple_size
//! +----------------------+
//! ```
//!
//! `num_slots` is the largest count for which one bit of header plus one
//! tuple per slot still fits in the page. There is no header beyond the
//! bitmap. Free slots are zero-filled when the page is written.

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use minnow_common::constants::BITS_PER_BYTE;
use minnow_common::error::{DbError, DbResult};
use minnow_common::types::{HeapPageId, RecordId, Schema, TransactionId, Tuple};

/// Returns how many tuples of `tuple_size` bytes fit in a page.
#[inline]
#[must_use]
pub const fn slots_per_page(page_size: usize, tuple_size: usize) -> usize {
    (page_size * BITS_PER_BYTE) / (tuple_size * BITS_PER_BYTE + 1)
}

/// Returns the bitmap size in bytes for `num_slots` slots.
#[inline]
#[must_use]
pub const fn header_size(num_slots: usize) -> usize {
    num_slots.div_ceil(BITS_PER_BYTE)
}

/// An in-memory heap page.
///
/// The slot vector is the source of truth for occupancy: slot `i` holds
/// `Some(tuple)` exactly when bit `i` of the serialized bitmap is set.
#[derive(Debug, Clone)]
pub struct HeapPage {
    page_id: HeapPageId,
    schema: Arc<Schema>,
    page_size: usize,
    slots: Vec<Option<Tuple>>,
    dirtier: Option<TransactionId>,
}

impl HeapPage {
    /// Creates a page with every slot free.
    pub fn empty(page_id: HeapPageId, schema: Arc<Schema>, page_size: usize) -> DbResult<Self> {
        let num_slots = slots_per_page(page_size, schema.size());
        if num_slots == 0 {
            return Err(DbError::configuration(format!(
                "page size {page_size} cannot hold a tuple of {} bytes",
                schema.size()
            )));
        }
        Ok(Self {
            page_id,
            schema,
            page_size,
            slots: vec![None; num_slots],
            dirtier: None,
        })
    }

    /// Decodes a page image. The page size is the length of `data`.
    pub fn from_bytes(page_id: HeapPageId, schema: Arc<Schema>, data: &[u8]) -> DbResult<Self> {
        let tuple_size = schema.size();
        let num_slots = slots_per_page(data.len(), tuple_size);
        if num_slots == 0 {
            return Err(DbError::corrupted(
                page_id,
                format!("{} bytes cannot hold a {tuple_size}-byte tuple", data.len()),
            ));
        }

        let header_len = header_size(num_slots);
        let (header, mut body) = data.split_at(header_len);
        let mut slots = Vec::with_capacity(num_slots);
        for slot in 0..num_slots {
            let mut image = &body[..tuple_size];
            body = &body[tuple_size..];
            if header[slot / BITS_PER_BYTE] & (1 << (slot % BITS_PER_BYTE)) == 0 {
                slots.push(None);
                continue;
            }
            let fields = schema
                .types()
                .map(|ty| ty.parse(&mut image, page_id))
                .collect::<DbResult<Vec<_>>>()?;
            let mut tuple = Tuple::new(schema.clone(), fields)?;
            tuple.set_record_id(Some(RecordId::new(page_id, slot)));
            slots.push(Some(tuple));
        }

        Ok(Self {
            page_id,
            schema,
            page_size: data.len(),
            slots,
            dirtier: None,
        })
    }

    /// Encodes the page into exactly `page_size` bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let tuple_size = self.schema.size();
        let mut buf = BytesMut::with_capacity(self.page_size);

        let mut header = vec![0u8; header_size(self.slots.len())];
        for (slot, _) in self.slots.iter().enumerate().filter(|(_, t)| t.is_some()) {
            header[slot / BITS_PER_BYTE] |= 1 << (slot % BITS_PER_BYTE);
        }
        buf.put_slice(&header);

        for slot in &self.slots {
            match slot {
                Some(tuple) => tuple.fields().iter().for_each(|f| f.serialize(&mut buf)),
                None => buf.put_bytes(0, tuple_size),
            }
        }

        buf.put_bytes(0, self.page_size - buf.len());
        buf.freeze()
    }

    /// Returns the page identifier.
    #[inline]
    #[must_use]
    pub fn page_id(&self) -> HeapPageId {
        self.page_id
    }

    /// Returns the schema of stored tuples.
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the total number of slots.
    #[inline]
    #[must_use]
    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of free slots.
    #[must_use]
    pub fn num_empty_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    /// Returns true if no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Returns true if `slot` holds a tuple.
    #[must_use]
    pub fn is_slot_used(&self, slot: usize) -> bool {
        matches!(self.slots.get(slot), Some(Some(_)))
    }

    /// Stores `tuple` in the lowest free slot and assigns its record id.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> DbResult<RecordId> {
        if !tuple.schema().same_types(&self.schema) {
            return Err(DbError::schema_mismatch(&self.schema, tuple.schema()));
        }
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(DbError::PageFull {
                page_id: self.page_id,
            })?;
        let record_id = RecordId::new(self.page_id, slot);
        tuple.set_record_id(Some(record_id));
        self.slots[slot] = Some(tuple);
        Ok(record_id)
    }

    /// Frees the slot named by the tuple's record id.
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> DbResult<()> {
        let record_id = tuple.record_id().ok_or(DbError::MissingRecordId)?;
        if record_id.page_id() != self.page_id {
            return Err(DbError::RecordNotOnPage {
                page_id: self.page_id,
                slot: record_id.slot(),
            });
        }
        match self.slots.get_mut(record_id.slot()) {
            Some(entry) if entry.is_some() => {
                *entry = None;
                Ok(())
            }
            _ => Err(DbError::SlotNotOccupied {
                page_id: self.page_id,
                slot: record_id.slot(),
            }),
        }
    }

    /// Iterates over stored tuples in ascending slot order.
    pub fn tuples(&self) -> impl Iterator<Item = &Tuple> + '_ {
        self.slots.iter().flatten()
    }

    /// Records which transaction dirtied the page, or clears it.
    #[inline]
    pub fn mark_dirty(&mut self, dirtier: Option<TransactionId>) {
        self.dirtier = dirtier;
    }

    /// Returns the transaction that last dirtied the page.
    #[inline]
    #[must_use]
    pub fn dirtier(&self) -> Option<TransactionId> {
        self.dirtier
    }

    /// Returns true if the page has unflushed changes.
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirtier.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minnow_common::types::{Field, TableId, Type};

    const PAGE: usize = 64;

    fn int_schema() -> Arc<Schema> {
        Arc::new(Schema::from_types(vec![Type::Int, Type::Int]).unwrap())
    }

    fn pid() -> HeapPageId {
        HeapPageId::new(TableId::new(9), 0)
    }

    fn row(schema: &Arc<Schema>, a: i32, b: i32) -> Tuple {
        Tuple::new(schema.clone(), vec![Field::Int(a), Field::Int(b)]).unwrap()
    }

    #[test]
    fn test_slot_arithmetic() {
        // 64 * 8 / (8 * 8 + 1) = 512 / 65
        assert_eq!(slots_per_page(PAGE, 8), 7);
        assert_eq!(header_size(7), 1);
        assert_eq!(header_size(9), 2);
        assert_eq!(slots_per_page(4096, 136), 30);
    }

    #[test]
    fn test_insert_fills_lowest_slot() {
        let schema = int_schema();
        let mut page = HeapPage::empty(pid(), schema.clone(), PAGE).unwrap();
        assert_eq!(page.num_slots(), 7);
        assert!(page.is_empty());

        let r0 = page.insert_tuple(row(&schema, 1, 1)).unwrap();
        let r1 = page.insert_tuple(row(&schema, 2, 2)).unwrap();
        assert_eq!((r0.slot(), r1.slot()), (0, 1));

        let first = page.tuples().next().unwrap().clone();
        page.delete_tuple(&first).unwrap();
        let r2 = page.insert_tuple(row(&schema, 3, 3)).unwrap();
        assert_eq!(r2.slot(), 0);
        assert_eq!(page.num_empty_slots(), 5);
    }

    #[test]
    fn test_full_page() {
        let schema = int_schema();
        let mut page = HeapPage::empty(pid(), schema.clone(), PAGE).unwrap();
        for i in 0..7 {
            page.insert_tuple(row(&schema, i, i)).unwrap();
        }
        let err = page.insert_tuple(row(&schema, 8, 8)).unwrap_err();
        assert!(matches!(err, DbError::PageFull { .. }));
    }

    #[test]
    fn test_bitmap_is_lsb_first() {
        let schema = int_schema();
        let mut page = HeapPage::empty(pid(), schema.clone(), PAGE).unwrap();
        for i in 0..3 {
            page.insert_tuple(row(&schema, i, i)).unwrap();
        }
        let second = page.tuples().nth(1).unwrap().clone();
        page.delete_tuple(&second).unwrap();

        let bytes = page.to_bytes();
        assert_eq!(bytes.len(), PAGE);
        assert_eq!(bytes[0], 0b0000_0101);
        // slot 0 starts right after the one-byte header
        assert_eq!(&bytes[1..9], &[0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[17..25], &[0, 0, 0, 2, 0, 0, 0, 2]);
        // freed slot 1 is zero-filled
        assert!(bytes[9..17].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_roundtrip_preserves_slots() {
        let schema = Arc::new(Schema::from_types(vec![Type::Int, Type::Text]).unwrap());
        let mut page = HeapPage::empty(pid(), schema.clone(), 4096).unwrap();
        let tuple = Tuple::new(schema.clone(), vec![Field::Int(-7), Field::text("heap")]).unwrap();
        let rid = page.insert_tuple(tuple.clone()).unwrap();

        let decoded = HeapPage::from_bytes(pid(), schema, &page.to_bytes()).unwrap();
        assert!(decoded.is_slot_used(rid.slot()));
        let stored = decoded.tuples().next().unwrap();
        assert_eq!(stored.fields(), tuple.fields());
        assert_eq!(stored.record_id(), Some(rid));
        assert_eq!(decoded.num_empty_slots(), decoded.num_slots() - 1);
    }

    #[test]
    fn test_delete_errors() {
        let schema = int_schema();
        let mut page = HeapPage::empty(pid(), schema.clone(), PAGE).unwrap();

        let unsaved = row(&schema, 1, 1);
        assert!(matches!(page.delete_tuple(&unsaved), Err(DbError::MissingRecordId)));

        page.insert_tuple(row(&schema, 1, 1)).unwrap();
        let stored = page.tuples().next().unwrap().clone();
        page.delete_tuple(&stored).unwrap();
        assert!(matches!(
            page.delete_tuple(&stored),
            Err(DbError::SlotNotOccupied { slot: 0, .. })
        ));

        let mut elsewhere = row(&schema, 1, 1);
        elsewhere.set_record_id(Some(RecordId::new(pid().next(), 0)));
        assert!(matches!(
            page.delete_tuple(&elsewhere),
            Err(DbError::RecordNotOnPage { .. })
        ));
    }

    #[test]
    fn test_insert_rejects_other_schema() {
        let mut page = HeapPage::empty(pid(), int_schema(), PAGE).unwrap();
        let other = Arc::new(Schema::from_types(vec![Type::Int]).unwrap());
        let tuple = Tuple::new(other, vec![Field::Int(1)]).unwrap();
        assert!(matches!(
            page.insert_tuple(tuple),
            Err(DbError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_dirty_tracking() {
        let mut page = HeapPage::empty(pid(), int_schema(), PAGE).unwrap();
        assert!(!page.is_dirty());
        let tid = TransactionId::new(5);
        page.mark_dirty(Some(tid));
        assert_eq!(page.dirtier(), Some(tid));
        page.mark_dirty(None);
        assert!(!page.is_dirty());
    }

    #[test]
    fn test_page_too_small() {
        let schema = Arc::new(Schema::from_types(vec![Type::Text]).unwrap());
        assert!(HeapPage::empty(pid(), schema.clone(), PAGE).is_err());
        assert!(HeapPage::from_bytes(pid(), schema, &[0u8; PAGE]).is_err());
    }
}
