mod label_table;
mod media;
mod source;

pub use label_table::{
    parse_label_table, read_label_table, LabelIndex, LabelRecord, LabelTable,
};
pub use media::{file_name_of, is_plain_name, list_class_dirs, list_media_files, ExtensionFilter};
pub use source::SourceLocator;
