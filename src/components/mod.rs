pub mod column_list;
pub mod contents;
pub mod dialog;
pub mod path_input;
pub mod status_bar;
pub mod text_view;
pub mod tree;
