//! SQL project file reading

mod sqlproj_parser;

pub use sqlproj_parser::{parse_sqlproj, SqlCmdVariable, SqlProject};
