pub mod bplus_tree;
pub mod config;
pub mod cursor;
pub mod pager;
pub mod table;
