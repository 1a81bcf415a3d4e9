// Lilt, an interpreter for a small Scheme-like Lisp dialect.
// Copyright (C) 2026 the Lilt contributors

// Lilt is licensed under the terms of the MIT License. See the top
// level LICENSE file for the license text.

// <>

// src/symtab.rs

// The symbol pool: associates symbol names with stable internal ids.
// Every name is stored exactly once, in a bump-allocated entry zone
// that outlives all values referring to it; two probe maps provide
// lookup in each direction.

// <>

use std::alloc;
use std::mem;
use std::ptr;
use std::slice;

use crate::core::SYM_NONE;

const CHUNK_SIZE: usize = 16 * 1024;

/// Interns symbol names, handing out sequential u32 ids
///
/// Entries have the form `{id: u32, len: u16, name: [u8; len]}` and
/// live in append-only chunks, so a returned name reference stays
/// valid for the life of the table. The maps hold pointers to
/// entries, open-addressed with linear probing.
pub struct SymbolTable {
    // pointers to entries, keyed by id hash / name hash
    id_to_nm: Vec<*mut u8>,
    nm_to_id: Vec<*mut u8>,

    // occupied map slots; kept under half of map_len
    load: usize,

    chunks: Vec<Chunk>,

    next_id: u32,
}

struct Chunk {
    base: *mut u8,
    used: usize,
    capacity: usize,
}

impl SymbolTable {
    const U32S: usize = mem::size_of::<u32>();
    const U16S: usize = mem::size_of::<u16>();

    pub fn new(approx_cap: usize) -> Self {
        let map_len = (approx_cap * 2).max(61);

        Self {
            id_to_nm: vec![ptr::null_mut(); map_len],
            nm_to_id: vec![ptr::null_mut(); map_len],
            load: 0,
            chunks: vec![Chunk::new(CHUNK_SIZE)],
            next_id: 0,
        }
    }

    /// Returns the unique id for a symbol name, interning the name if
    /// it has not been seen before
    pub fn get_id(&mut self, name: &str) -> u32 {
        if let Some(id) = self.lookup_by_name(name) {
            return id;
        }

        if (self.load + 1) * 2 >= self.id_to_nm.len() {
            self.resize(self.id_to_nm.len() * 2);
        }

        let ins_id = self.next_id;
        self.direct_insert(ins_id, name.as_bytes());
        self.next_id += 1;

        assert!(self.next_id < SYM_NONE);

        ins_id
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<u32> {
        let name = name.as_bytes();
        let tgt = Self::hash_name(name) % self.nm_to_id.len();

        Self::find_slot(&self.nm_to_id, tgt, |p| Self::e_name_slice(p) == name)
            .map(|entry| unsafe { ptr::read(entry as *const u32) })
    }

    pub fn lookup_by_id(&self, id: u32) -> Option<&str> {
        let tgt = Self::hash_id(id) % self.id_to_nm.len();

        Self::find_slot(&self.id_to_nm, tgt, |p| unsafe {
            ptr::read(p as *const u32) == id
        })
        .map(|entry| unsafe { std::str::from_utf8_unchecked(Self::e_name_slice(entry)) })
    }

    /// Number of interned symbols
    pub fn len(&self) -> usize {
        self.next_id as usize
    }

    pub fn is_empty(&self) -> bool {
        self.next_id == 0
    }

    fn direct_insert(&mut self, id: u32, name: &[u8]) {
        let nlen = name.len();
        let elen = nlen + Self::U32S + Self::U16S;

        assert!(nlen <= u16::MAX.into());

        // reserve space in the entry zone for this entry
        if self.chunks.last().unwrap().remaining() < elen {
            self.chunks.push(Chunk::new(CHUNK_SIZE.max(elen)));
        }
        let chunk = self.chunks.last_mut().unwrap();
        let eptr = unsafe { chunk.base.add(chunk.used) };
        chunk.used += elen;

        // fill entry with id and name
        unsafe {
            ptr::write_unaligned(eptr as *mut u32, id);
            ptr::write_unaligned(eptr.add(Self::U32S) as *mut u16, nlen as u16);
            slice::from_raw_parts_mut(eptr.add(Self::U32S + Self::U16S), nlen)
                .copy_from_slice(name);
        }

        // place the entry pointer in both maps
        let id_tgt = Self::hash_id(id) % self.id_to_nm.len();
        let id_slot = Self::probe(&self.id_to_nm, id_tgt);
        self.id_to_nm[id_slot] = eptr;

        let nm_tgt = Self::hash_name(name) % self.nm_to_id.len();
        let nm_slot = Self::probe(&self.nm_to_id, nm_tgt);
        self.nm_to_id[nm_slot] = eptr;

        self.load += 1;
    }

    /// Rebuilds both maps at a new size; entries stay where they are
    fn resize(&mut self, new_len: usize) {
        let mut id_map = vec![ptr::null_mut(); new_len];
        let mut nm_map = vec![ptr::null_mut(); new_len];

        for chunk in &self.chunks {
            let mut zcur = chunk.base;
            let zend = unsafe { chunk.base.add(chunk.used) };

            // step through entries from start to end
            while zcur < zend {
                let cur_id = unsafe { ptr::read_unaligned(zcur as *const u32) };
                let cur_name = Self::e_name_slice(zcur);

                let id_slot = Self::probe(&id_map, Self::hash_id(cur_id) % new_len);
                id_map[id_slot] = zcur;

                let nm_slot = Self::probe(&nm_map, Self::hash_name(cur_name) % new_len);
                nm_map[nm_slot] = zcur;

                zcur = unsafe { zcur.add(Self::U32S + Self::U16S + cur_name.len()) };
            }
        }

        self.id_to_nm = id_map;
        self.nm_to_id = nm_map;
    }

    fn find_slot(map: &[*mut u8], tgt: usize, foundp: impl Fn(*mut u8) -> bool) -> Option<*mut u8> {
        let len = map.len();
        let mut csn = tgt;

        loop {
            let cur = map[csn];

            if cur.is_null() {
                return None;
            } else if foundp(cur) {
                return Some(cur);
            }

            csn += 1;
            csn %= len;

            if csn == tgt {
                panic!("symbol map rollover");
            }
        }
    }

    /// Checks slots from the target until an empty one is found
    fn probe(map: &[*mut u8], mut tgt: usize) -> usize {
        while !map[tgt].is_null() {
            tgt += 1;

            if tgt >= map.len() {
                tgt = 0;
            }
        }

        tgt
    }

    fn e_name_slice<'a>(entry: *const u8) -> &'a [u8] {
        unsafe {
            slice::from_raw_parts(
                entry.add(Self::U32S + Self::U16S),
                ptr::read_unaligned(entry.add(Self::U32S) as *const u16) as usize,
            )
        }
    }

    fn hash_id(id: u32) -> usize {
        id as usize
    }

    fn hash_name(name: &[u8]) -> usize {
        let mut acc: usize = 1;
        for b in name {
            acc = acc.wrapping_add(acc << 5).wrapping_add(*b as usize)
        }
        acc
    }
}

impl Chunk {
    fn new(capacity: usize) -> Self {
        let base = unsafe {
            let layout = alloc::Layout::from_size_align(capacity, 8).unwrap();
            let ptr = alloc::alloc(layout);
            if ptr.is_null() {
                alloc::handle_alloc_error(layout);
            }
            ptr
        };

        Chunk {
            base,
            used: 0,
            capacity,
        }
    }

    fn remaining(&self) -> usize {
        self.capacity - self.used
    }
}

impl Drop for SymbolTable {
    fn drop(&mut self) {
        for chunk in &self.chunks {
            unsafe {
                let layout = alloc::Layout::from_size_align_unchecked(chunk.capacity, 8);
                alloc::dealloc(chunk.base, layout);
            }
        }
    }
}
