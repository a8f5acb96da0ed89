use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod auto_pairs;
pub mod comment;
pub mod completion;
pub mod config;
pub mod document;
pub mod editor;
pub mod highlight;
pub mod history;
pub mod indent;
pub mod input;
pub mod position;
pub mod scanner;
pub mod scheduler;
pub mod selection;
pub mod transaction;
pub mod worker;

pub type Tendril = SmartString<LazyCompact>;
