pub mod issue;
pub mod label_set;
