pub mod field_helper;
pub mod merkle_tree_helper;
