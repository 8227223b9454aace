pub mod jql;
