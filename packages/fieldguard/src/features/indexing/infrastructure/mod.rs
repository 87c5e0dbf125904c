//! Index construction passes

pub mod bridging;
pub mod byte_offsets;
pub mod call_summary;
pub mod cast_sites;
pub mod hot_nodes;
pub mod phi_select;
pub mod struct_naming;

pub use bridging::setup_bridging;
pub use byte_offsets::{collect_byte_offsets, OffsetBuild};
pub use call_summary::{read_call_graph, setup_call_summary, RawCallGraph};
pub use cast_sites::process_cast_sites;
pub use hot_nodes::detect_hot_elements;
pub use phi_select::setup_phi_select;
pub use struct_naming::resolve_anonymous_structs;
