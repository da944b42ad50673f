pub mod genomic_index;
pub mod interval_tree;
pub mod rle_vec;
