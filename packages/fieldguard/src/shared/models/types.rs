//! Closed type model and per-module layout oracle
//!
//! The engine never inspects front-end type systems directly. Everything it
//! needs reduces to four type shapes (Scalar, Pointer, Struct, Array) and a
//! per-module layout table answering size / field-count / field-offset
//! questions. "Points to a struct, possibly through arrays" is one recursive
//! resolver over this model.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Unique identifier for types in the [`TypeTable`]
pub type TypeId = u32;

/// Unique identifier for translation units / modules
pub type ModuleId = u32;

/// Structural shape of a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    /// Integer/float/other single-value type of a known byte size
    Scalar { size: u64 },

    /// Pointer, optionally with a known pointee
    Pointer { pointee: Option<TypeId> },

    /// Struct with an optional stable name and ordered field types
    Struct {
        name: Option<String>,
        fields: Vec<TypeId>,
    },

    /// Fixed-size array
    Array { elem: TypeId, count: u64 },
}

/// Graph-wide table of type descriptors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeTable {
    types: Vec<TypeKind>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: TypeKind) -> TypeId {
        let id = self.types.len() as TypeId;
        self.types.push(kind);
        id
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeKind> {
        self.types.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate all `(id, kind)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeKind)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, k)| (i as TypeId, k))
    }

    /// Resolve "points to a struct, possibly through arrays".
    ///
    /// Follows one pointer indirection, then strips any number of array
    /// wrappers; returns the struct's type id if one is reached.
    pub fn strip_to_struct(&self, id: TypeId) -> Option<TypeId> {
        let pointee = match self.get(id)? {
            TypeKind::Pointer { pointee } => (*pointee)?,
            _ => return None,
        };
        self.strip_arrays_to_struct(pointee)
    }

    /// Strip array wrappers from a value type down to a struct, if any.
    pub fn strip_arrays_to_struct(&self, id: TypeId) -> Option<TypeId> {
        let mut cur = id;
        loop {
            match self.get(cur)? {
                TypeKind::Array { elem, .. } => cur = *elem,
                TypeKind::Struct { .. } => return Some(cur),
                _ => return None,
            }
        }
    }

    /// Element type behind a pointer, with array wrappers stripped.
    pub fn pointee_base(&self, id: TypeId) -> Option<TypeId> {
        let pointee = match self.get(id)? {
            TypeKind::Pointer { pointee } => (*pointee)?,
            _ => return None,
        };
        let mut cur = pointee;
        while let Some(TypeKind::Array { elem, .. }) = self.get(cur) {
            cur = *elem;
        }
        Some(cur)
    }

    /// Declared name of a struct type, normalized; `None` for anonymous
    /// structs or non-struct ids.
    pub fn declared_struct_name(&self, id: TypeId) -> Option<&str> {
        match self.get(id)? {
            TypeKind::Struct {
                name: Some(name), ..
            } if !name.is_empty() => Some(normalize_struct_name(name)),
            _ => None,
        }
    }

    /// Field count of a struct type (0 for non-structs).
    pub fn field_count(&self, id: TypeId) -> usize {
        match self.get(id) {
            Some(TypeKind::Struct { fields, .. }) => fields.len(),
            _ => 0,
        }
    }
}

/// Strip a clone suffix (`struct.foo.123` -> `struct.foo`) so per-unit copies
/// of one struct share a single shortcut group. Anything after the last dot
/// goes, unless that dot is the one ending the `struct.`/`union.` prefix.
pub fn normalize_struct_name(name: &str) -> &str {
    for prefix in ["struct.", "union."] {
        if let Some(rest) = name.strip_prefix(prefix) {
            if let Some(pos) = rest.rfind('.') {
                return &name[..prefix.len() + pos];
            }
            return name;
        }
    }
    name
}

/// Concrete layout of one struct within a module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructLayout {
    /// Total size in bytes, including padding
    pub size: u64,
    /// Byte offset of each declared field, in declaration order
    pub field_offsets: Vec<u64>,
}

/// Layout rules of one translation unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleLayout {
    pub pointer_size: u64,
    /// Struct layouts keyed by [`TypeId`]; structs absent here have no
    /// provable layout in this module.
    pub struct_layouts: FxHashMap<TypeId, StructLayout>,
}

impl ModuleLayout {
    pub fn new(pointer_size: u64) -> Self {
        Self {
            pointer_size,
            struct_layouts: FxHashMap::default(),
        }
    }

    pub fn struct_layout(&self, id: TypeId) -> Option<&StructLayout> {
        self.struct_layouts.get(&id)
    }

    /// Byte size of an arbitrary type under this module's rules.
    ///
    /// Returns `None` when any component lacks layout information; callers
    /// treat that as "offset unresolved" rather than an error.
    pub fn type_size(&self, types: &TypeTable, id: TypeId) -> Option<u64> {
        match types.get(id)? {
            TypeKind::Scalar { size } => Some(*size),
            TypeKind::Pointer { .. } => Some(self.pointer_size),
            TypeKind::Array { elem, count } => {
                self.type_size(types, *elem).map(|s| s * count)
            }
            TypeKind::Struct { .. } => self.struct_layout(id).map(|l| l.size),
        }
    }

    /// Byte offset of field `idx` of struct `id` (declaration order).
    pub fn field_offset(&self, id: TypeId, idx: usize) -> Option<u64> {
        self.struct_layout(id)
            .and_then(|l| l.field_offsets.get(idx).copied())
    }
}

/// Per-module type/layout oracle consumed from the front-end
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutOracle {
    modules: FxHashMap<ModuleId, ModuleLayout>,
}

impl LayoutOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: ModuleId, layout: ModuleLayout) {
        self.modules.insert(module, layout);
    }

    /// Layout of a module; `None` degrades the caller to variant handling.
    pub fn module(&self, module: ModuleId) -> Option<&ModuleLayout> {
        self.modules.get(&module)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// First module-agnostic layout for a struct. Struct layouts agree
    /// across modules that define them, so any hit is usable for reporting.
    pub fn find_struct_layout(&self, id: TypeId) -> Option<&StructLayout> {
        self.modules.values().find_map(|m| m.struct_layout(id))
    }

    /// Byte size of a type under any module that can resolve it.
    pub fn find_type_size(&self, types: &TypeTable, id: TypeId) -> Option<u64> {
        self.modules.values().find_map(|m| m.type_size(types, id))
    }
}
