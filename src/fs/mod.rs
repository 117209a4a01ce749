pub mod listing;
pub mod pager;
pub mod path;
pub mod tree;
