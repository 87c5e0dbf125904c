//! Report rendering
//!
//! Two formats over one classification: a detailed listing that interleaves
//! struct field boundaries with the classified offsets, and a terse legacy
//! listing (name, ratio, protectable offsets) consumed by downstream
//! hardening scripts.

use std::fmt::Write as _;

use crate::shared::models::{GlobalVar, TypeId, TypeKind, ValueFlowGraph};

use super::super::domain::VariableClassification;

/// Short printable form of a type.
fn format_type(graph: &ValueFlowGraph, id: TypeId) -> String {
    match graph.types.get(id) {
        Some(TypeKind::Scalar { size }) => format!("i{}", size * 8),
        Some(TypeKind::Pointer { .. }) => "ptr".to_string(),
        Some(TypeKind::Array { elem, count }) => {
            format!("[{} x {}]", count, format_type(graph, *elem))
        }
        Some(TypeKind::Struct {
            name: Some(name), ..
        }) if !name.is_empty() => name.clone(),
        Some(TypeKind::Struct { fields, .. }) => format!("{{ {} fields }}", fields.len()),
        None => "<unknown>".to_string(),
    }
}

pub fn render_detailed(
    graph: &ValueFlowGraph,
    gv: &GlobalVar,
    cls: &VariableClassification,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "GV Name: {}", gv.name);
    match gv.ty {
        Some(ty) => {
            let _ = writeln!(out, "GV Type: {}", format_type(graph, ty));
        }
        None => {
            let _ = writeln!(out, "GV Type: <unknown>");
        }
    }

    // arrays report like their element type, ignoring element index
    let elem = gv.ty.map(|ty| strip_arrays(graph, ty));
    match elem {
        Some(st) if matches!(graph.types.get(st), Some(TypeKind::Struct { .. })) => {
            match graph.layouts.find_struct_layout(st) {
                Some(layout) => {
                    let _ = writeln!(
                        out,
                        "Elem Struct Fields Num: {}",
                        layout.field_offsets.len()
                    );
                    let total_size = gv
                        .ty
                        .and_then(|ty| graph.layouts.find_type_size(&graph.types, ty))
                        .unwrap_or(layout.size);
                    render_struct_body(&mut out, cls, layout, total_size);
                }
                // no provable layout, so no boundary lines
                None => render_offsets(&mut out, cls),
            }
            let _ = writeln!(out, "Protectable Ratio: {}", cls.ratio());
        }
        Some(t)
            if matches!(
                graph.types.get(t),
                Some(TypeKind::Scalar { .. } | TypeKind::Pointer { .. })
            ) =>
        {
            render_offsets(&mut out, cls);
            let _ = writeln!(out, "Protectable Ratio: {}", cls.ratio());
        }
        _ => {
            let special = gv
                .ty
                .map(|ty| format_type(graph, ty))
                .unwrap_or_else(|| "<unknown>".to_string());
            let _ = writeln!(out, "Special GV element type: {special}");
        }
    }
    out
}

fn strip_arrays(graph: &ValueFlowGraph, id: TypeId) -> TypeId {
    let mut cur = id;
    while let Some(TypeKind::Array { elem, .. }) = graph.types.get(cur) {
        cur = *elem;
    }
    cur
}

/// Interleave struct field boundaries ("splitters") with classified offsets.
/// On equal offsets the boundary line prints before the offset line.
fn render_struct_body(
    out: &mut String,
    cls: &VariableClassification,
    layout: &crate::shared::models::StructLayout,
    total_size: u64,
) {
    let mut splitters: Vec<i64> = layout.field_offsets.iter().map(|&o| o as i64).collect();
    splitters.push(total_size as i64);

    enum Entry {
        Boundary(usize),
        Offset(i64),
    }
    let mut seq: Vec<(i64, u8, Entry)> = splitters
        .iter()
        .enumerate()
        .map(|(idx, &off)| (off, 0, Entry::Boundary(idx)))
        .collect();
    seq.extend(cls.fields.keys().map(|&off| (off, 1, Entry::Offset(off))));
    seq.sort_by_key(|&(off, rank, _)| (off, rank));

    let last = splitters.len() - 1;
    for (off, _, entry) in seq {
        match entry {
            Entry::Boundary(idx) if idx == last => {
                let _ = writeln!(out, "Struct Boundary Size: {total_size}");
            }
            Entry::Boundary(idx) => {
                let _ = writeln!(out, "Idx: {idx}; Offset: {off}");
            }
            Entry::Offset(off) => {
                if let Some(field) = cls.fields.get(&off) {
                    let _ = writeln!(
                        out,
                        "\tbyteOffset: {} [{}];\tAliasNum: {}",
                        off,
                        field.status.label(),
                        field.alias_count
                    );
                }
            }
        }
    }
}

fn render_offsets(out: &mut String, cls: &VariableClassification) {
    for (off, field) in &cls.fields {
        let _ = writeln!(
            out,
            "\tbyteOffset: {} [{}];\tAliasNum: {}",
            off,
            field.status.label(),
            field.alias_count
        );
    }
}

pub fn render_legacy(cls: &VariableClassification) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", cls.name);
    let _ = writeln!(out, "{}", cls.ratio());
    for off in cls.protectable_offsets() {
        let _ = writeln!(out, "{off}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::classification::domain::{FieldClass, FieldStatus};
    use crate::shared::models::{
        ModuleLayout, NodeId, SourceRef, StructLayout, TypeKind,
    };

    fn classification(fields: &[(i64, FieldStatus, usize)]) -> VariableClassification {
        VariableClassification {
            target: 0 as NodeId,
            name: "gv".into(),
            fields: fields
                .iter()
                .map(|&(off, status, alias_count)| {
                    (off, FieldClass { status, alias_count })
                })
                .collect(),
        }
    }

    #[test]
    fn test_legacy_lists_name_ratio_and_protectable_offsets() {
        let cls = classification(&[
            (0, FieldStatus::Protect, 3),
            (8, FieldStatus::Written, 1),
        ]);
        assert_eq!(render_legacy(&cls), "gv\n1/2\n0\n");
    }

    #[test]
    fn test_detailed_interleaves_boundaries_before_offsets() {
        let mut g = ValueFlowGraph::new();
        let i64t = g.types.add(TypeKind::Scalar { size: 8 });
        let st = g.types.add(TypeKind::Struct {
            name: Some("struct.cfg".into()),
            fields: vec![i64t, i64t],
        });
        let mut ml = ModuleLayout::new(8);
        ml.struct_layouts.insert(
            st,
            StructLayout {
                size: 16,
                field_offsets: vec![0, 8],
            },
        );
        g.layouts.insert(0, ml);
        let node = g.add_node(None, SourceRef::named("gv"));
        let gv = GlobalVar {
            node,
            name: "gv".into(),
            ty: Some(st),
            is_constant: false,
            section: None,
        };
        let cls = classification(&[
            (0, FieldStatus::Protect, 2),
            (8, FieldStatus::Written, 1),
        ]);

        let text = render_detailed(&g, &gv, &cls);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "GV Name: gv");
        assert_eq!(lines[1], "GV Type: struct.cfg");
        assert_eq!(lines[2], "Elem Struct Fields Num: 2");
        // boundary for field 0 precedes the offset-0 alias line
        assert_eq!(lines[3], "Idx: 0; Offset: 0");
        assert!(lines[4].starts_with("\tbyteOffset: 0 [Protect]"));
        assert_eq!(lines[5], "Idx: 1; Offset: 8");
        assert!(lines[6].starts_with("\tbyteOffset: 8 [Written]"));
        assert_eq!(lines[7], "Struct Boundary Size: 16");
        assert_eq!(lines[8], "Protectable Ratio: 1/2");
    }

    #[test]
    fn test_detailed_special_type_skips_offset_listing() {
        let g = {
            let mut g = ValueFlowGraph::new();
            g.add_node(None, SourceRef::named("weird"));
            g
        };
        let gv = GlobalVar {
            node: 0,
            name: "weird".into(),
            ty: None,
            is_constant: false,
            section: None,
        };
        let cls = classification(&[(0, FieldStatus::Written, 1)]);

        let text = render_detailed(&g, &gv, &cls);
        assert!(text.contains("Special GV element type: <unknown>"));
        assert!(!text.contains("byteOffset"));
        assert!(!text.contains("Protectable Ratio"));
    }

    #[test]
    fn test_detailed_scalar_lists_offsets_directly() {
        let mut g = ValueFlowGraph::new();
        let i64t = g.types.add(TypeKind::Scalar { size: 8 });
        let node = g.add_node(None, SourceRef::named("counter"));
        let gv = GlobalVar {
            node,
            name: "counter".into(),
            ty: Some(i64t),
            is_constant: false,
            section: None,
        };
        let cls = VariableClassification {
            target: node,
            name: "counter".into(),
            fields: [(
                0,
                FieldClass {
                    status: FieldStatus::Written,
                    alias_count: 4,
                },
            )]
            .into_iter()
            .collect(),
        };

        let text = render_detailed(&g, &gv, &cls);
        assert!(text.contains("GV Type: i64"));
        assert!(text.contains("\tbyteOffset: 0 [Written];\tAliasNum: 4"));
        assert!(text.contains("Protectable Ratio: 0/1"));
    }
}
